#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    use crate::*;

    fn setup() -> (Rc<HeadlessHost>, Rc<Scheduler>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let host = Rc::new(HeadlessHost::new());
        let sched = Scheduler::new(host.clone());
        (host, sched)
    }

    fn component(sched: &Rc<Scheduler>) -> Component {
        Component::new(ComponentOptions::default().scheduler(sched.clone())).unwrap()
    }

    /// Records the id of every component whose `onredraw` runs.
    fn record_redraws(c: &Component, log: &Rc<RefCell<Vec<u64>>>) {
        let log = log.clone();
        c.set_onredraw(move |c| log.borrow_mut().push(c.id()));
    }

    // --- element accessors ---

    #[test]
    fn test_component_keeps_given_element() {
        let (_host, sched) = setup();
        let e = Element::new("div");
        let c = Component::new(
            ComponentOptions::default()
                .element(e.clone())
                .scheduler(sched),
        )
        .unwrap();
        assert_eq!(c.element(), e);
    }

    #[test]
    fn test_parent_element_starts_at_actual_parent() {
        let (_host, sched) = setup();
        let p = Element::new("div");
        let e = Element::new("div");
        p.append_child(&e);
        let c = Component::new(ComponentOptions::default().element(e).scheduler(sched)).unwrap();
        assert_eq!(c.parent_element(), Some(p));
    }

    #[test]
    fn test_set_element_marks_dirty_only_on_change() {
        let (_host, sched) = setup();
        let c = component(&sched);
        assert!(!c.set_element(c.element()));
        assert_eq!(sched.dirty_len(), 0);
        assert!(c.set_element(Element::new("span")));
        assert_eq!(sched.dirty_len(), 1);
        assert_eq!(c.element().tag(), "span");
    }

    // --- relations ---

    #[test]
    fn test_add_relation_appends_once() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let r = relation(|_| {});
        assert!(c.add_relation(r.clone()));
        assert!(!c.add_relation(r.clone()));
        assert_eq!(c.relations().len(), 1);
    }

    #[test]
    fn test_remove_relation() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let r0 = relation(|_| {});
        let r1 = relation(|_| {});
        c.add_relation(r0.clone());
        c.add_relation(r1.clone());
        assert!(c.remove_relation(&r0));
        assert!(!c.remove_relation(&r0));
        let left = c.relations();
        assert_eq!(left.len(), 1);
        assert!(Rc::ptr_eq(&left[0], &r1));
    }

    #[test]
    fn test_relation_shared_between_components() {
        let (host, sched) = setup();
        let a = component(&sched);
        let b = component(&sched);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let r = relation(move |c| s.borrow_mut().push(c.id()));
        a.add_relation(r.clone());
        b.add_relation(r);

        a.mark_dirty();
        b.mark_dirty();
        host.run_frame();
        assert_eq!(*seen.borrow(), vec![a.id(), b.id()]);
    }

    // --- events ---

    #[test]
    fn test_emit_calls_listener_with_payload() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let got = Rc::new(Cell::new(None));
        let g = got.clone();
        c.on("test", move |payload| {
            g.set(payload.downcast_ref::<(i32, i32)>().copied());
        });
        assert_eq!(c.emit("test", &(0, 1)), 1);
        assert_eq!(got.get(), Some((0, 1)));
    }

    #[test]
    fn test_emit_runs_in_registration_order() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            c.on("test", move |_| order.borrow_mut().push(i));
        }
        c.emit("test", &());
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_off_removes_one_listener() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let a = c.on("test", |_| {});
        c.on("test", |_| {});
        assert!(!c.off("other", a));
        assert!(c.off("test", a));
        assert!(!c.off("test", a));
        assert_eq!(c.listener_count("test"), 1);
    }

    #[test]
    fn test_remove_all_listeners_of_type() {
        let (_host, sched) = setup();
        let c = component(&sched);
        c.on("test", |_| {});
        c.on("test", |_| {});
        c.on("test2", |_| {});
        c.remove_all_listeners(Some("test"));
        assert_eq!(c.listener_count("test"), 0);
        assert_eq!(c.listener_count("test2"), 1);
    }

    #[test]
    fn test_remove_all_listeners() {
        let (_host, sched) = setup();
        let c = component(&sched);
        c.on("test", |_| {});
        c.on("test", |_| {});
        c.on("test2", |_| {});
        c.remove_all_listeners(None);
        assert_eq!(c.listener_count("test"), 0);
        assert_eq!(c.listener_count("test2"), 0);
        assert_eq!(c.emit("test", &()), 0);
    }

    #[test]
    fn test_listener_may_unregister_during_emit() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let calls = Rc::new(Cell::new(0));
        let k = calls.clone();
        let c2 = c.clone();
        c.on("test", move |_| {
            k.set(k.get() + 1);
            c2.remove_all_listeners(None);
        });
        let k = calls.clone();
        c.on("test", move |_| k.set(k.get() + 1));
        // snapshot: both run this time, none next time
        assert_eq!(c.emit("test", &()), 2);
        assert_eq!(calls.get(), 2);
        assert_eq!(c.emit("test", &()), 0);
    }

    // --- redraw ---

    #[test]
    fn test_redraw_calls_onredraw() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let called = Rc::new(Cell::new(false));
        let k = called.clone();
        c.set_onredraw(move |_| k.set(true));
        c.redraw();
        assert!(called.get());
    }

    #[test]
    fn test_redraw_appends_element() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let p = Element::new("div");
        let attached_in_hook = Rc::new(Cell::new(None));
        let k = attached_in_hook.clone();
        c.set_onappend(move |c| k.set(Some(c.element().parent().is_some())));

        c.set_parent_element(Some(p.clone()));
        c.redraw();

        // onappend runs before the element is inserted
        assert_eq!(attached_in_hook.get(), Some(false));
        assert_eq!(c.element().parent(), Some(p));
    }

    #[test]
    fn test_redraw_removes_element() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let p = Element::new("div");
        p.append_child(&c.element());
        let attached_in_hook = Rc::new(Cell::new(None));
        let k = attached_in_hook.clone();
        c.set_onremove(move |c| k.set(Some(c.element().parent().is_some())));

        c.set_parent_element(None);
        c.redraw();

        assert_eq!(attached_in_hook.get(), Some(true));
        assert!(c.element().parent().is_none());
        assert!(p.children().is_empty());
    }

    #[test]
    fn test_redraw_detaches_exactly_once() {
        let (host, sched) = setup();
        let p = Element::new("div");
        let e = Element::new("div");
        p.append_child(&e);
        let c = Component::new(
            ComponentOptions::default()
                .element(e)
                .scheduler(sched.clone()),
        )
        .unwrap();
        let removes = Rc::new(Cell::new(0));
        let k = removes.clone();
        c.set_onremove(move |_| k.set(k.get() + 1));

        c.set_parent_element(None);
        host.run_frame();
        c.mark_dirty();
        host.run_frame();

        assert_eq!(removes.get(), 1);
        assert!(c.element().parent().is_none());
    }

    #[test]
    fn test_redraw_without_placement_change() {
        let (_host, sched) = setup();
        let p = Element::new("div");
        let e = Element::new("div");
        p.append_child(&e);
        // built from an attached element: desired and actual parent agree
        let c = Component::new(ComponentOptions::default().element(e).scheduler(sched)).unwrap();
        let hooks = Rc::new(Cell::new(0));
        let k = hooks.clone();
        c.set_onappend(move |_| k.set(k.get() + 1));
        let k = hooks.clone();
        c.set_onremove(move |_| k.set(k.get() + 1));

        c.redraw();
        assert_eq!(hooks.get(), 0);
        assert_eq!(c.element().parent(), Some(p.clone()));

        c.set_parent_element(Some(p.clone()));
        c.redraw();
        assert_eq!(hooks.get(), 0);
        assert_eq!(p.children(), vec![c.element()]);
    }

    #[test]
    fn test_redraw_detaches_element_attached_behind_its_back() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let p = Element::new("div");
        p.append_child(&c.element());
        let removes = Rc::new(Cell::new(0));
        let k = removes.clone();
        c.set_onremove(move |_| k.set(k.get() + 1));

        // parent_element is still `None`, so redraw reconciles to detached
        c.redraw();
        assert_eq!(removes.get(), 1);
        assert!(c.element().parent().is_none());
    }

    #[test]
    fn test_redraw_moves_between_parents() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let p0 = Element::new("div");
        let p1 = Element::new("div");
        p0.append_child(&c.element());
        c.set_parent_element(Some(p1.clone()));
        c.redraw();
        assert!(p0.children().is_empty());
        assert_eq!(p1.children(), vec![c.element()]);
    }

    // --- redraw_by ---

    #[test]
    fn test_redraw_by_passes_current_values() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let a = c.prop("a", 0);
        let b = c.prop("b", 0);
        a.set(1);
        let got = Rc::new(Cell::new(None));
        let k = got.clone();
        let ran = c
            .redraw_by(&["a", "b"], move |c, v| {
                assert_eq!(v.len(), 2);
                let a = c.property::<i32>("a").unwrap().get();
                assert_eq!(v.get::<i32>(0), Some(&a));
                k.set(Some((*v.get::<i32>(0).unwrap(), *v.get::<i32>(1).unwrap())));
            })
            .unwrap();
        assert!(ran);
        assert_eq!(got.get(), Some((1, 0)));
        assert_eq!(b.get(), 0);
    }

    #[test]
    fn test_redraw_by_skips_unchanged() {
        let (_host, sched) = setup();
        let c = component(&sched);
        c.prop("a", 0);
        assert!(c.redraw_by(&["a"], |_, _| {}).unwrap());

        let called = Rc::new(Cell::new(false));
        let k = called.clone();
        assert!(!c.redraw_by(&["a"], move |_, _| k.set(true)).unwrap());
        assert!(!called.get());
    }

    #[test]
    fn test_redraw_by_caches_only_changed_values() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let a = c.prop("a", 0);
        let b = c.prop("b", 0);
        assert!(c.redraw_by(&["a", "b"], |_, _| {}).unwrap());

        a.set(1);
        assert!(c.redraw_by(&["a", "b"], |_, _| {}).unwrap());
        assert!(!c.redraw_by(&["a", "b"], |_, _| {}).unwrap());

        // `b` alone still sees its original cached value
        b.set(2);
        b.set(0);
        assert!(!c.redraw_by(&["b"], |_, _| {}).unwrap());
    }

    #[test]
    fn test_redraw_by_unknown_property() {
        let (_host, sched) = setup();
        let c = component(&sched);
        c.prop("a", 0);
        let err = c.redraw_by(&["a", "nope"], |_, _| {}).unwrap_err();
        assert_eq!(err, Error::UnknownProperty("nope".into()));
        // nothing was cached by the failed call
        assert!(c.redraw_by(&["a"], |_, _| {}).unwrap());
    }

    // --- props ---

    #[test]
    fn test_prop_equal_value_is_noop() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let x = c.prop("x", 3);
        assert!(!x.set(3));
        assert_eq!(sched.dirty_len(), 0);
        assert!(sched.pending_frame().is_none());
    }

    #[test]
    fn test_prop_set_schedules_one_frame() {
        let (host, sched) = setup();
        let c = component(&sched);
        let x = c.prop("x", 0);

        assert!(x.set(5));
        assert_eq!(sched.dirty_components(), vec![c.clone()]);
        assert!(sched.pending_frame().is_some());
        assert_eq!(host.pending_frames(), 1);

        assert_eq!(host.run_frame(), 1);
        assert_eq!(sched.dirty_len(), 0);
        assert!(sched.pending_frame().is_none());
        assert_eq!(x.get(), 5);
    }

    #[test]
    fn test_prop_with_converter() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let clamp = |v: i32, _prev: &i32| v.clamp(0, 10);
        let x = c.prop_with("x", 42, 0, clamp);
        assert_eq!(x.get(), 10);
        assert!(x.set(-3));
        assert_eq!(x.get(), 0);
    }

    #[test]
    fn test_prop_redeclare_replaces_lookup() {
        let (_host, sched) = setup();
        let c = component(&sched);
        c.prop("x", 1);
        c.prop("x", String::from("two"));
        assert!(c.property::<i32>("x").is_none());
        assert_eq!(c.property::<String>("x").unwrap().get(), "two");
    }

    #[test]
    fn test_prop_owner() {
        let (_host, sched) = setup();
        let c = component(&sched);
        let x = c.prop("x", 0u8);
        assert_eq!(x.owner(), Some(c));
    }

    // --- construction ---

    #[test]
    fn test_render_called_without_element() {
        let (_host, sched) = setup();
        let rendered = Rc::new(Cell::new(0));
        let k = rendered.clone();
        let ty = ComponentType::base().inherits("Panel").with_render(move || {
            k.set(k.get() + 1);
            Some(Element::new("section"))
        });
        let c = ty
            .create(ComponentOptions::default().scheduler(sched.clone()))
            .unwrap();
        assert_eq!(rendered.get(), 1);
        assert_eq!(c.element().tag(), "section");

        ty.create(
            ComponentOptions::default()
                .element(Element::new("div"))
                .scheduler(sched),
        )
        .unwrap();
        assert_eq!(rendered.get(), 1);
    }

    #[test]
    fn test_default_render_makes_div() {
        let (_host, sched) = setup();
        let c = component(&sched);
        assert_eq!(c.element().tag(), "div");
        assert!(c.element().parent().is_none());
    }

    #[test]
    fn test_render_without_element_fails() {
        let (_host, sched) = setup();
        let ty = ComponentType::base().inherits("Broken").with_render(|| None);
        let err = ty
            .create(ComponentOptions::default().scheduler(sched))
            .unwrap_err();
        assert_eq!(
            err,
            Error::MissingElement {
                component: "Broken".into()
            }
        );
    }

    #[test]
    fn test_oninit_called_on_initialization() {
        let (_host, sched) = setup();
        let called = Rc::new(Cell::new(0));
        let k = called.clone();
        let ty = ComponentType::base()
            .inherits("C")
            .with_oninit(move |_| k.set(k.get() + 1));
        ty.create(ComponentOptions::default().scheduler(sched))
            .unwrap();
        assert_eq!(called.get(), 1);
    }

    #[test]
    fn test_oninit_runs_once_for_leaf_type() {
        let (_host, sched) = setup();
        let inits = Rc::new(RefCell::new(Vec::new()));
        let k = inits.clone();
        let a = ComponentType::base()
            .inherits("A")
            .with_oninit(move |c| k.borrow_mut().push(c.component_type().name().to_string()));
        let b = a.inherits("B");
        let k = inits.clone();
        let c = b
            .inherits("C")
            .with_oninit(move |c| k.borrow_mut().push(format!("{}!", c.component_type().name())));

        b.create(ComponentOptions::default().scheduler(sched.clone()))
            .unwrap();
        c.create(ComponentOptions::default().scheduler(sched))
            .unwrap();

        // B inherits A's hook; C overrides it. Neither fires for intermediate levels.
        assert_eq!(*inits.borrow(), vec!["B".to_string(), "C!".to_string()]);
    }

    #[test]
    fn test_initializers_run_base_first() {
        let (_host, sched) = setup();
        let order = Rc::new(RefCell::new(Vec::new()));
        let k = order.clone();
        let a = ComponentType::base()
            .inherits("A")
            .with_init(move |_| k.borrow_mut().push("A"));
        let k = order.clone();
        let b = a.inherits("B").with_init(move |_| k.borrow_mut().push("B"));
        let k = order.clone();
        let b = b.with_oninit(move |_| k.borrow_mut().push("oninit"));

        b.create(ComponentOptions::default().scheduler(sched))
            .unwrap();
        assert_eq!(*order.borrow(), vec!["A", "B", "oninit"]);
    }

    #[test]
    fn test_base_hooks_defined_after_deriving_reach_subtypes() {
        let (_host, sched) = setup();
        let a = ComponentType::base().inherits("A");
        let b = a.inherits("B");
        let inits = Rc::new(Cell::new(0));
        let k = inits.clone();
        let a = a.with_init(move |_| k.set(k.get() + 1));
        let redraws = Rc::new(RefCell::new(Vec::new()));
        let k = redraws.clone();
        a.set_onredraw(move |c| k.borrow_mut().push(c.component_type().name().to_string()));

        let c = b
            .create(ComponentOptions::default().scheduler(sched))
            .unwrap();
        assert_eq!(inits.get(), 1);
        assert!(b.is_a(&a));
        assert!(c.component_type().base_type().unwrap().ptr_eq(&a));

        c.redraw();
        assert_eq!(*redraws.borrow(), vec!["B".to_string()]);
    }

    #[test]
    fn test_subtype_hook_defined_later_overrides_base() {
        let (_host, sched) = setup();
        let a = ComponentType::base().inherits("A");
        let b = a.inherits("B");
        let which = Rc::new(RefCell::new(Vec::new()));
        let k = which.clone();
        a.set_onredraw(move |_| k.borrow_mut().push("A"));
        let c = b
            .create(ComponentOptions::default().scheduler(sched))
            .unwrap();
        c.redraw();

        let k = which.clone();
        b.set_onredraw(move |_| k.borrow_mut().push("B"));
        c.redraw();
        assert_eq!(*which.borrow(), vec!["A", "B"]);
    }

    #[test]
    fn test_inherits_is_a() {
        let base = ComponentType::base();
        let a = base.inherits("A");
        let b = a.inherits("B");
        assert!(b.is_a(&a));
        assert!(b.is_a(&base));
        assert!(!a.is_a(&b));
    }

    #[test]
    fn test_instance_hook_wins_over_type_hook() {
        let (_host, sched) = setup();
        let which = Rc::new(RefCell::new(Vec::new()));
        let k = which.clone();
        let ty = ComponentType::base()
            .inherits("T")
            .with_onredraw(move |_| k.borrow_mut().push("type"));
        let c0 = ty
            .create(ComponentOptions::default().scheduler(sched.clone()))
            .unwrap();
        let c1 = ty
            .create(ComponentOptions::default().scheduler(sched))
            .unwrap();
        let k = which.clone();
        c1.set_onredraw(move |_| k.borrow_mut().push("instance"));

        c0.redraw();
        c1.redraw();
        assert_eq!(*which.borrow(), vec!["type", "instance"]);
    }

    // --- scheduler ---

    #[test]
    fn test_mark_dirty_redraws_on_frame() {
        let (host, sched) = setup();
        let c = component(&sched);
        let log = Rc::new(RefCell::new(Vec::new()));
        record_redraws(&c, &log);

        c.mark_dirty();
        assert!(log.borrow().is_empty());
        host.run_frame();
        assert_eq!(*log.borrow(), vec![c.id()]);
    }

    #[test]
    fn test_mark_dirty_does_not_add_twice() {
        let (_host, sched) = setup();
        let c0 = component(&sched);
        let c1 = component(&sched);
        c0.mark_dirty();
        c1.mark_dirty();
        c1.mark_dirty();
        c0.mark_dirty();
        assert_eq!(sched.dirty_components(), vec![c0, c1]);
    }

    #[test]
    fn test_repeated_marking_redraws_once() {
        let (host, sched) = setup();
        let c = component(&sched);
        let log = Rc::new(RefCell::new(Vec::new()));
        record_redraws(&c, &log);

        for _ in 0..5 {
            c.mark_dirty();
        }
        assert_eq!(host.pending_frames(), 1);
        host.run_frame();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_relation_chain_redraws_in_order() {
        let (host, sched) = setup();
        let c0 = component(&sched);
        let c1 = component(&sched);
        let c2 = component(&sched);
        let t1 = c1.clone();
        c0.add_relation(relation(move |_| t1.mark_dirty()));
        let t2 = c2.clone();
        c1.add_relation(relation(move |_| t2.mark_dirty()));

        let log = Rc::new(RefCell::new(Vec::new()));
        for c in [&c0, &c1, &c2] {
            record_redraws(c, &log);
        }

        c0.mark_dirty();
        host.run_frame();
        assert_eq!(*log.borrow(), vec![c0.id(), c1.id(), c2.id()]);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_relations_run_once_per_frame() {
        let (host, sched) = setup();
        let a = component(&sched);
        let b = component(&sched);
        let runs = Rc::new(Cell::new(0));
        let k = runs.clone();
        a.add_relation(relation(move |_| k.set(k.get() + 1)));
        // b dirties a again after a was already walked
        let back = a.clone();
        b.add_relation(relation(move |_| back.mark_dirty()));

        let log = Rc::new(RefCell::new(Vec::new()));
        record_redraws(&a, &log);
        record_redraws(&b, &log);

        a.mark_dirty();
        b.mark_dirty();
        host.run_frame();
        assert_eq!(runs.get(), 1);
        assert_eq!(*log.borrow(), vec![a.id(), b.id()]);
    }

    #[test]
    fn test_relations_run_in_attachment_order() {
        let (host, sched) = setup();
        let c = component(&sched);
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            c.add_relation(relation(move |_| order.borrow_mut().push(i)));
        }
        c.mark_dirty();
        host.run_frame();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_mark_dirty_during_redraw_waits_for_next_frame() {
        let (host, sched) = setup();
        let a = component(&sched);
        let b = component(&sched);
        let log = Rc::new(RefCell::new(Vec::new()));
        record_redraws(&b, &log);
        let l = log.clone();
        let other = b.clone();
        a.set_onredraw(move |a| {
            l.borrow_mut().push(a.id());
            other.mark_dirty();
        });

        a.mark_dirty();
        host.run_frame();
        assert_eq!(*log.borrow(), vec![a.id()]);
        assert_eq!(sched.dirty_components(), vec![b.clone()]);
        assert!(sched.pending_frame().is_some());

        host.run_frame();
        assert_eq!(*log.borrow(), vec![a.id(), b.id()]);
    }

    #[test]
    fn test_self_marking_during_redraw_next_frame() {
        let (host, sched) = setup();
        let c = component(&sched);
        let count = Rc::new(Cell::new(0));
        let k = count.clone();
        c.set_onredraw(move |c| {
            k.set(k.get() + 1);
            if k.get() == 1 {
                c.mark_dirty();
            }
        });
        c.mark_dirty();
        host.run_frame();
        assert_eq!(count.get(), 1);
        host.run_frame();
        assert_eq!(count.get(), 2);
        assert!(sched.pending_frame().is_none());
    }

    #[test]
    fn test_fallback_timer_without_animation_frame() {
        let host = Rc::new(HeadlessHost::without_animation_frame());
        let sched = Scheduler::new(host.clone());
        let c = component(&sched);
        let log = Rc::new(RefCell::new(Vec::new()));
        record_redraws(&c, &log);

        c.mark_dirty();
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.pending_timers(), 1);

        host.advance(Duration::from_millis(16));
        assert!(log.borrow().is_empty());
        host.advance(Duration::from_millis(1));
        assert_eq!(log.borrow().len(), 1);
        assert!(sched.pending_frame().is_none());
    }

    #[test]
    fn test_fallback_interval_is_configurable() {
        let host = Rc::new(HeadlessHost::without_animation_frame());
        let sched = Scheduler::with_options(
            host.clone(),
            SchedulerOptions {
                fallback_interval: Duration::from_millis(5),
            },
        );
        let c = component(&sched);
        c.mark_dirty();
        host.advance(Duration::from_millis(5));
        assert_eq!(sched.dirty_len(), 0);
    }

    #[test]
    fn test_reset_cancels_pending_frame() {
        let (host, sched) = setup();
        let c = component(&sched);
        let log = Rc::new(RefCell::new(Vec::new()));
        record_redraws(&c, &log);

        c.mark_dirty();
        sched.reset();
        assert_eq!(sched.dirty_len(), 0);
        assert!(sched.pending_frame().is_none());
        assert_eq!(host.run_frame(), 0);
        assert!(log.borrow().is_empty());

        // a fresh marking arms a fresh frame
        c.mark_dirty();
        assert_eq!(host.run_frame(), 1);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_flush_runs_pending_frame() {
        let (host, sched) = setup();
        let c = component(&sched);
        let log = Rc::new(RefCell::new(Vec::new()));
        record_redraws(&c, &log);

        assert!(!sched.flush());
        c.mark_dirty();
        assert!(sched.flush());
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(host.run_frame(), 0);
    }

    #[test]
    fn test_main_marks_dirty_component() {
        Scheduler::reset_main();
        let c = Component::new(ComponentOptions::default()).unwrap();
        assert!(Rc::ptr_eq(c.scheduler(), &Scheduler::main()));
        c.mark_dirty();
        assert_eq!(Scheduler::main().dirty_components(), vec![c]);
        assert!(Scheduler::main().pending_frame().is_some());
        Scheduler::reset_main();
    }

    #[test]
    fn test_install_main() {
        let (host, sched) = setup();
        let prev = Scheduler::install_main(sched.clone());
        let c = Component::new(ComponentOptions::default()).unwrap();
        c.mark_dirty();
        assert_eq!(sched.dirty_len(), 1);
        assert_eq!(host.run_frame(), 1);

        Scheduler::reset_main();
        if let Some(prev) = prev {
            prev.reset();
        }
        assert!(!Rc::ptr_eq(&Scheduler::main(), &sched));
        Scheduler::reset_main();
    }

    #[test]
    fn test_main_host_drives_default_components() {
        Scheduler::reset_main();
        let host = Scheduler::main_host().unwrap();
        let c = Component::new(ComponentOptions::default()).unwrap();
        let redrawn = Rc::new(Cell::new(false));
        let k = redrawn.clone();
        c.set_onredraw(move |_| k.set(true));

        c.prop("x", 0).set(1);
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.run_frame(), 1);
        assert!(redrawn.get());
        Scheduler::reset_main();
    }

    #[test]
    fn test_main_host_absent_after_install() {
        let (_host, sched) = setup();
        Scheduler::install_main(sched);
        assert!(Scheduler::main_host().is_none());
        Scheduler::reset_main();
        assert!(Scheduler::main_host().is_some());
        Scheduler::reset_main();
    }

    // --- elements ---

    #[test]
    fn test_append_child_moves_element() {
        let p0 = Element::new("div");
        let p1 = Element::new("div");
        let e = Element::new("span");
        p0.append_child(&e);
        p1.append_child(&e);
        assert!(p0.children().is_empty());
        assert_eq!(e.parent(), Some(p1));
    }

    #[test]
    fn test_append_child_refuses_cycles() {
        let outer = Element::new("div");
        let inner = Element::new("div");
        outer.append_child(&inner);
        inner.append_child(&outer);
        assert!(outer.parent().is_none());
        assert_eq!(inner.parent(), Some(outer));
    }

    #[test]
    fn test_query_selectors() {
        let doc = Document::new();
        let list = Element::new("ul");
        let item = Element::new("li");
        item.set_id("first");
        item.add_class("selected");
        list.append_child(&item);
        doc.body().append_child(&list);

        assert_eq!(doc.query("li"), Some(item.clone()));
        assert_eq!(doc.query("#first"), Some(item.clone()));
        assert_eq!(doc.query(".selected"), Some(item));
        assert_eq!(doc.query("body"), Some(doc.body().clone()));
        assert!(doc.query("#missing").is_none());
        assert!(doc.query("").is_none());
    }

    #[test]
    fn test_dispatch_bubbles_to_ancestors() {
        let doc = Document::new();
        let e = Element::new("div");
        doc.body().append_child(&e);
        let order = Rc::new(RefCell::new(Vec::new()));
        for (name, el) in [("root", doc.root()), ("body", doc.body()), ("el", &e)] {
            let order = order.clone();
            el.add_event_listener(EventKind::MouseDown, move |_| order.borrow_mut().push(name));
        }
        e.dispatch_event(&InputEvent::mouse(EventKind::MouseDown, Vec2::ZERO));
        assert_eq!(*order.borrow(), vec!["el", "body", "root"]);
    }

    #[test]
    fn test_dispatch_passes_event_through() {
        let e = Element::new("div");
        let seen = Rc::new(RefCell::new(None));
        let k = seen.clone();
        e.add_event_listener(EventKind::MouseDown, move |ev| {
            *k.borrow_mut() = Some(ev.clone());
        });
        let shift = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        let ev = InputEvent::mouse(EventKind::MouseDown, Vec2::new(3.0, 4.0)).with_modifiers(shift);
        e.dispatch_event(&ev);
        let got = seen.borrow().clone().unwrap();
        assert!(got.modifiers.shift);
        assert!(!got.modifiers.ctrl);
        assert_eq!(got, ev);
    }

    #[test]
    fn test_remove_event_listener() {
        let e = Element::new("div");
        let hits = Rc::new(Cell::new(0));
        let k = hits.clone();
        let id = e.add_event_listener(EventKind::MouseUp, move |_| k.set(k.get() + 1));
        assert_eq!(e.listener_count(EventKind::MouseUp), 1);
        assert!(e.remove_event_listener(id));
        assert!(!e.remove_event_listener(id));
        e.dispatch_event(&InputEvent::mouse(EventKind::MouseUp, Vec2::ZERO));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_scroll_extent() {
        let m = Metrics {
            scroll_size: Size::new(300.0, 500.0),
            client_size: Size::new(280.0, 200.0),
            ..Metrics::default()
        };
        assert_eq!(m.scroll_extent(), Size::new(20.0, 300.0));
    }

    // --- host ---

    #[test]
    fn test_frame_requested_during_frame_runs_next_frame() {
        let host = Rc::new(HeadlessHost::new());
        let runs = Rc::new(Cell::new(0));
        let (h, k) = (host.clone(), runs.clone());
        host.request_animation_frame(Box::new(move || {
            k.set(k.get() + 1);
            let k = k.clone();
            h.request_animation_frame(Box::new(move || k.set(k.get() + 1)));
        }));
        assert_eq!(host.run_frame(), 1);
        assert_eq!(runs.get(), 1);
        assert_eq!(host.run_frame(), 1);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_timers_run_in_deadline_order() {
        let host = HeadlessHost::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (name, ms) in [("late", 10), ("early", 2), ("tie", 2)] {
            let order = order.clone();
            host.set_timeout(
                Box::new(move || order.borrow_mut().push(name)),
                Duration::from_millis(ms),
            );
        }
        let k = order.clone();
        let cancelled = host.set_timeout(
            Box::new(move || k.borrow_mut().push("cleared")),
            Duration::ZERO,
        );
        host.clear_timeout(cancelled);

        assert_eq!(host.advance(Duration::from_millis(10)), 3);
        assert_eq!(*order.borrow(), vec!["early", "tie", "late"]);
        assert_eq!(host.now(), Duration::from_millis(10));
    }
}
