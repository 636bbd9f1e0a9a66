//! # Components
//!
//! A [`Component`] owns a placement element, reactive properties, relations
//! and an event emitter. It never redraws itself directly: property writes
//! mark it dirty and its [`Scheduler`] redraws it on the next frame.
//!
//! ```rust
//! use std::rc::Rc;
//! use veneer_core::*;
//!
//! let host = Rc::new(HeadlessHost::new());
//! let sched = Scheduler::new(host.clone());
//! let doc = Document::new();
//!
//! let c = Component::new(ComponentOptions::default().scheduler(sched.clone())).unwrap();
//! c.set_parent_element(Some(doc.body().clone()));
//! assert_eq!(sched.dirty_len(), 1);
//!
//! host.run_frame();
//! assert_eq!(c.element().parent().as_ref(), Some(doc.body()));
//! ```
//!
//! ## Types and hooks
//!
//! Behaviour is layered with [`ComponentType`]s instead of inheritance. A type
//! carries an optional initializer and optional hooks, and may derive from
//! another type:
//!
//! ```rust
//! use veneer_core::*;
//!
//! let base = ComponentType::base();
//! let button = base
//!     .inherits("Button")
//!     .with_init(|c| {
//!         c.prop("label", String::from("OK"));
//!     })
//!     .with_oninit(|c| {
//!         c.emit("ready", &());
//!     });
//!
//! let b = button.create(ComponentOptions::default()).unwrap();
//! assert!(b.property::<String>("label").is_some());
//! # Scheduler::main().reset();
//! ```
//!
//! Construction sets up the base state, runs initializers from the base type
//! down to the constructed type, then runs `oninit` once for the constructed
//! type only. Hooks resolve per call: an instance override (`set_onredraw`,
//! ...) wins over the most-derived type that defines the hook, which wins over
//! its bases; with no definition the hook is a no-op (`render` defaults to a
//! fresh `div`).

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::events::{ListenerId, Registry};
use crate::prop::{Prop, PropSlot, PropValue, RedrawValues};
use crate::relation::{Relation, same_relation};
use crate::{Element, Scheduler};

pub type Hook = Rc<dyn Fn(&Component)>;
pub type RenderHook = Rc<dyn Fn() -> Option<Element>>;
pub type Listener = Rc<dyn Fn(&dyn Any)>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Default)]
struct Hooks {
    render: Option<RenderHook>,
    oninit: Option<Hook>,
    onredraw: Option<Hook>,
    onappend: Option<Hook>,
    onremove: Option<Hook>,
}

/// Construction input. Without an element, the type's `render` hook supplies
/// one; without a scheduler, [`Scheduler::main`] is used.
#[derive(Clone, Default)]
pub struct ComponentOptions {
    pub element: Option<Element>,
    pub scheduler: Option<Rc<Scheduler>>,
}

impl ComponentOptions {
    pub fn element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    pub fn scheduler(mut self, scheduler: Rc<Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }
}

impl fmt::Debug for ComponentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentOptions")
            .field("element", &self.element)
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct ComponentType(Rc<TypeInner>);

struct TypeInner {
    name: String,
    base: Option<ComponentType>,
    // shared by every handle and subtype; later definitions reach them all
    init: RefCell<Option<Hook>>,
    hooks: RefCell<Hooks>,
}

impl ComponentType {
    pub fn base() -> Self {
        Self::derive("Component", None)
    }

    /// A new type deriving from this one.
    pub fn inherits(&self, name: impl Into<String>) -> Self {
        Self::derive(name.into(), Some(self.clone()))
    }

    fn derive(name: impl Into<String>, base: Option<ComponentType>) -> Self {
        Self(Rc::new(TypeInner {
            name: name.into(),
            base,
            init: RefCell::new(None),
            hooks: RefCell::new(Hooks::default()),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn base_type(&self) -> Option<&ComponentType> {
        self.0.base.as_ref()
    }

    pub fn ptr_eq(&self, other: &ComponentType) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether this type is `other` or derives from it.
    pub fn is_a(&self, other: &ComponentType) -> bool {
        std::iter::successors(Some(self), |t| t.base_type()).any(|t| t.ptr_eq(other))
    }

    // Definitions mutate the type in place, so subtypes derived earlier and
    // components constructed later both see them.

    pub fn set_init(&self, init: impl Fn(&Component) + 'static) {
        *self.0.init.borrow_mut() = Some(Rc::new(init));
    }

    pub fn set_render(&self, render: impl Fn() -> Option<Element> + 'static) {
        self.0.hooks.borrow_mut().render = Some(Rc::new(render));
    }

    pub fn set_oninit(&self, hook: impl Fn(&Component) + 'static) {
        self.0.hooks.borrow_mut().oninit = Some(Rc::new(hook));
    }

    pub fn set_onredraw(&self, hook: impl Fn(&Component) + 'static) {
        self.0.hooks.borrow_mut().onredraw = Some(Rc::new(hook));
    }

    pub fn set_onappend(&self, hook: impl Fn(&Component) + 'static) {
        self.0.hooks.borrow_mut().onappend = Some(Rc::new(hook));
    }

    pub fn set_onremove(&self, hook: impl Fn(&Component) + 'static) {
        self.0.hooks.borrow_mut().onremove = Some(Rc::new(hook));
    }

    pub fn with_init(self, init: impl Fn(&Component) + 'static) -> Self {
        self.set_init(init);
        self
    }

    pub fn with_render(self, render: impl Fn() -> Option<Element> + 'static) -> Self {
        self.set_render(render);
        self
    }

    pub fn with_oninit(self, hook: impl Fn(&Component) + 'static) -> Self {
        self.set_oninit(hook);
        self
    }

    pub fn with_onredraw(self, hook: impl Fn(&Component) + 'static) -> Self {
        self.set_onredraw(hook);
        self
    }

    pub fn with_onappend(self, hook: impl Fn(&Component) + 'static) -> Self {
        self.set_onappend(hook);
        self
    }

    pub fn with_onremove(self, hook: impl Fn(&Component) + 'static) -> Self {
        self.set_onremove(hook);
        self
    }

    pub fn create(&self, options: ComponentOptions) -> Result<Component> {
        let component = self.allocate(options)?;
        self.construct(&component, true);
        Ok(component)
    }

    fn allocate(&self, options: ComponentOptions) -> Result<Component> {
        let element = match options.element {
            Some(element) => element,
            None => self.render()?,
        };
        let scheduler = options.scheduler.unwrap_or_else(Scheduler::main);
        let parent = element.parent();
        let inner = Rc::new_cyclic(|owner| ComponentInner {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            ty: self.clone(),
            scheduler,
            element: Prop::new(owner.clone(), element),
            parent_element: Prop::new(owner.clone(), parent),
            relations: RefCell::new(Vec::new()),
            props: RefCell::new(HashMap::new()),
            cache: RefCell::new(HashMap::new()),
            listeners: RefCell::new(Registry::new()),
            overrides: RefCell::new(Hooks::default()),
        });
        Ok(Component(inner))
    }

    fn render(&self) -> Result<Element> {
        match self.find_hook(|h| h.render.clone()) {
            Some(render) => render().ok_or_else(|| Error::MissingElement {
                component: self.0.name.clone(),
            }),
            None => Ok(Element::new("div")),
        }
    }

    // `leaf` is true only for the type actually being constructed.
    fn construct(&self, component: &Component, leaf: bool) {
        if let Some(base) = &self.0.base {
            base.construct(component, false);
        }
        let init = self.0.init.borrow().clone();
        if let Some(init) = init {
            init(component);
        }
        if leaf && let Some(oninit) = self.find_hook(|h| h.oninit.clone()) {
            oninit(component);
        }
    }

    fn find_hook<T>(&self, pick: impl Fn(&Hooks) -> Option<T>) -> Option<T> {
        std::iter::successors(Some(self), |t| t.base_type())
            .find_map(|t| pick(&t.0.hooks.borrow()))
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<&str> = std::iter::successors(Some(self), |t| t.base_type())
            .map(ComponentType::name)
            .collect();
        f.debug_tuple("ComponentType").field(&chain).finish()
    }
}

#[derive(Clone)]
pub struct Component(Rc<ComponentInner>);

pub(crate) struct ComponentInner {
    id: u64,
    ty: ComponentType,
    scheduler: Rc<Scheduler>,
    element: Prop<Element>,
    parent_element: Prop<Option<Element>>,
    relations: RefCell<Vec<Rc<dyn Relation>>>,
    props: RefCell<HashMap<String, Rc<dyn PropSlot>>>,
    // last values observed by `redraw_by`
    cache: RefCell<HashMap<String, Box<dyn PropValue>>>,
    listeners: RefCell<Registry<String, Listener>>,
    overrides: RefCell<Hooks>,
}

impl Component {
    /// Constructs a plain component of the base type.
    pub fn new(options: ComponentOptions) -> Result<Self> {
        ComponentType::base().create(options)
    }

    pub(crate) fn from_inner(inner: Rc<ComponentInner>) -> Self {
        Self(inner)
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn component_type(&self) -> &ComponentType {
        &self.0.ty
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.0.scheduler
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // --- placement ---

    pub fn element(&self) -> Element {
        self.0.element.get()
    }

    /// Swaps the placement element; marks the component dirty if it changed.
    pub fn set_element(&self, element: Element) -> bool {
        self.0.element.set(element)
    }

    /// Where the element should be placed on the next redraw; `None` detaches.
    pub fn parent_element(&self) -> Option<Element> {
        self.0.parent_element.get()
    }

    pub fn set_parent_element(&self, parent: Option<Element>) -> bool {
        self.0.parent_element.set(parent)
    }

    // --- properties ---

    /// Declares a reactive property. Redeclaring a name replaces the old slot
    /// for `redraw_by` lookups.
    pub fn prop<T: Clone + PartialEq + 'static>(&self, name: impl Into<String>, initial: T) -> Prop<T> {
        let prop = Prop::new(Rc::downgrade(&self.0), initial);
        self.register(name.into(), prop.clone());
        prop
    }

    /// Declares a property whose values pass through `converter(new, previous)`.
    /// The initial value is converted against `default`.
    pub fn prop_with<T: Clone + PartialEq + 'static>(
        &self,
        name: impl Into<String>,
        initial: T,
        default: T,
        converter: impl Fn(T, &T) -> T + 'static,
    ) -> Prop<T> {
        let prop = Prop::with_converter(Rc::downgrade(&self.0), initial, default, converter);
        self.register(name.into(), prop.clone());
        prop
    }

    /// A previously declared property, if `name` exists and holds a `T`.
    pub fn property<T: Clone + PartialEq + 'static>(&self, name: &str) -> Option<Prop<T>> {
        let slot = self.0.props.borrow().get(name).cloned()?;
        PropSlot::as_any(&*slot).downcast_ref::<Prop<T>>().cloned()
    }

    fn register<T: Clone + PartialEq + 'static>(&self, name: String, prop: Prop<T>) {
        let slot: Rc<dyn PropSlot> = Rc::new(prop);
        if self.0.props.borrow_mut().insert(name.clone(), slot).is_some() {
            log::warn!(
                "prop: `{}` redeclared on {} #{}; replacing",
                name,
                self.0.ty.name(),
                self.0.id
            );
        }
    }

    // --- relations ---

    /// Attaches `relation` unless it is already attached. Returns whether it
    /// was added.
    pub fn add_relation(&self, relation: Rc<dyn Relation>) -> bool {
        let mut relations = self.0.relations.borrow_mut();
        if relations.iter().any(|r| same_relation(r, &relation)) {
            return false;
        }
        relations.push(relation);
        true
    }

    pub fn remove_relation(&self, relation: &Rc<dyn Relation>) -> bool {
        let mut relations = self.0.relations.borrow_mut();
        let before = relations.len();
        relations.retain(|r| !same_relation(r, relation));
        relations.len() != before
    }

    /// Attached relations in attachment order.
    pub fn relations(&self) -> Vec<Rc<dyn Relation>> {
        self.0.relations.borrow().clone()
    }

    // --- events ---

    pub fn on(&self, event: impl Into<String>, listener: impl Fn(&dyn Any) + 'static) -> ListenerId {
        self.0
            .listeners
            .borrow_mut()
            .add(event.into(), Rc::new(listener) as Listener)
    }

    /// Removes one listener registered for `event`.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.0.listeners.borrow_mut();
        if listeners.topic_of(id).map(String::as_str) != Some(event) {
            return false;
        }
        listeners.remove(id).is_some()
    }

    /// Removes the listeners of `event`, or every listener when `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        let mut listeners = self.0.listeners.borrow_mut();
        match event {
            Some(event) => {
                listeners.remove_topic(event);
            }
            None => listeners.clear(),
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.0.listeners.borrow().count(event)
    }

    /// Calls the listeners of `event` synchronously in registration order.
    /// Returns how many ran.
    pub fn emit(&self, event: &str, payload: &dyn Any) -> usize {
        let listeners = self.0.listeners.borrow().snapshot(event);
        for listener in &listeners {
            listener(payload);
        }
        listeners.len()
    }

    // --- hooks ---

    pub fn set_onredraw(&self, hook: impl Fn(&Component) + 'static) {
        self.0.overrides.borrow_mut().onredraw = Some(Rc::new(hook));
    }

    pub fn set_onappend(&self, hook: impl Fn(&Component) + 'static) {
        self.0.overrides.borrow_mut().onappend = Some(Rc::new(hook));
    }

    pub fn set_onremove(&self, hook: impl Fn(&Component) + 'static) {
        self.0.overrides.borrow_mut().onremove = Some(Rc::new(hook));
    }

    fn run_hook(&self, pick: impl Fn(&Hooks) -> Option<Hook>) {
        let overridden = pick(&*self.0.overrides.borrow());
        if let Some(hook) = overridden.or_else(|| self.0.ty.find_hook(&pick)) {
            hook(self);
        }
    }

    // --- redraw ---

    pub fn mark_dirty(&self) {
        self.0.scheduler.mark_dirty(self);
    }

    /// Runs `onredraw`, then moves the element to match `parent_element`.
    pub fn redraw(&self) {
        self.run_hook(|h| h.onredraw.clone());

        let element = self.element();
        let actual = element.parent();
        match self.parent_element() {
            Some(parent) if actual.as_ref() != Some(&parent) => {
                self.run_hook(|h| h.onappend.clone());
                parent.append_child(&element);
            }
            None if actual.is_some() => {
                self.run_hook(|h| h.onremove.clone());
                element.remove();
            }
            _ => {}
        }
    }

    /// Calls `callback` with the current values of the named properties if any
    /// of them differs from what the previous `redraw_by` saw. Only changed
    /// entries are re-cached. Returns whether the callback ran.
    pub fn redraw_by(
        &self,
        names: &[&str],
        callback: impl FnOnce(&Component, &RedrawValues),
    ) -> Result<bool> {
        let slots = {
            let props = self.0.props.borrow();
            names
                .iter()
                .map(|name| {
                    props
                        .get(*name)
                        .cloned()
                        .ok_or_else(|| Error::UnknownProperty((*name).to_string()))
                })
                .collect::<Result<Vec<_>>>()?
        };
        let values: Vec<Box<dyn PropValue>> = slots.iter().map(|s| s.read()).collect();

        let mut changed = false;
        {
            let mut cache = self.0.cache.borrow_mut();
            for (name, value) in names.iter().zip(&values) {
                let seen = cache
                    .get(*name)
                    .is_some_and(|cached| cached.eq_value(&**value));
                if !seen {
                    cache.insert((*name).to_string(), (**value).clone_value());
                    changed = true;
                }
            }
        }

        if changed {
            callback(self, &RedrawValues::new(values));
        }
        Ok(changed)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.0.id)
            .field("type", &self.0.ty.name())
            .field("element", &self.0.element)
            .field("relations", &self.0.relations.borrow().len())
            .finish()
    }
}
