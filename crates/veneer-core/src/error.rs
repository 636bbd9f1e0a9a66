use thiserror::Error;

/// Errors surfaced by component construction and redraw helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No element was supplied and the `render` hook produced none.
    #[error("component type `{component}` has no placement element: none supplied and render produced none")]
    MissingElement { component: String },
    /// `redraw_by` named a property that was never declared on the component.
    #[error("no reactive property named `{0}`")]
    UnknownProperty(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
