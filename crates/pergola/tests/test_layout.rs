//! Integration tests for the relative layout engine and its resize-driven
//! recomputation.

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pergola::{
        BindOpts, Core, Error, EventType, Expanse, Orientation, Payload, Place, Rect, Value,
        WidgetKind, testing::TestToolkit,
    };

    /// A core whose root window measures 400x300.
    fn setup() -> (Core, TestToolkit) {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let tk = TestToolkit::new();
        let core = Core::new(tk.clone()).unwrap();
        tk.set_measured(core.root(), Expanse::new(400, 300));
        (core, tk)
    }

    fn resize(core: &mut Core, size: Expanse) {
        let root = core.root();
        core.dispatch(root, &EventType::resize(), Payload::Resize(size))
            .unwrap();
    }

    #[test]
    fn right_reservation_computes_half_width() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        core.place_relative(frame, Place::new().x_edges(0.0, 50.0))
            .unwrap();
        assert_eq!(tk.last_place(frame), Some(Rect::new(0, 0, 200, 300)));
    }

    #[test]
    fn center_x_overrides_offsets() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        core.place_relative(
            frame,
            Place::new()
                .fixed(None, None, Some(100), Some(50))
                .offset(30.0, 0.0)
                .center(true, false),
        )
        .unwrap();
        let rect = tk.last_place(frame).unwrap();
        assert_eq!(rect.x(), 150);
    }

    #[test]
    fn constraint_violation_rejected_before_any_geometry() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        let err = core
            .place_relative(frame, Place::new().offset(100.0, 0.0).x_edges(1.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, Error::Constraint(_)));
        assert_eq!(tk.place_count(frame), 0);
    }

    #[test]
    fn duplicate_resize_notifications_coalesce_to_one_pass() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        core.place_relative(frame, Place::new()).unwrap();
        assert_eq!(tk.place_count(frame), 1);

        resize(&mut core, Expanse::new(400, 300));
        assert_eq!(tk.place_count(frame), 2);

        // Identical size: the filter cancels the dispatch, no second pass.
        resize(&mut core, Expanse::new(400, 300));
        assert_eq!(tk.place_count(frame), 2);

        tk.set_measured(core.root(), Expanse::new(500, 300));
        resize(&mut core, Expanse::new(500, 300));
        assert_eq!(tk.place_count(frame), 3);
        assert_eq!(tk.last_place(frame), Some(Rect::new(0, 0, 500, 300)));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        let place = Place::new().offset(10.0, 10.0).x_edges(0.0, 20.0).y_edges(0.0, 5.0);
        core.place_relative(frame, place.clone()).unwrap();
        let first = tk.last_place(frame).unwrap();
        core.place_relative(frame, place).unwrap();
        assert_eq!(tk.last_place(frame), Some(first));
        assert_eq!(tk.place_count(frame), 2);
    }

    #[test]
    fn children_of_fixed_containers_are_still_recomputed() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        let label = core.add(frame, WidgetKind::Label).unwrap();
        core.place_relative(
            frame,
            Place::new().fixed(Some(10), Some(10), Some(200), Some(100)),
        )
        .unwrap();
        tk.set_measured(frame, Expanse::new(200, 100));
        core.place_relative(label, Place::new().x_edges(0.0, 50.0))
            .unwrap();

        let frames = tk.place_count(frame);
        let labels = tk.place_count(label);
        resize(&mut core, Expanse::new(400, 300));
        // The container's geometry is fixed, but both it and its child get
        // exactly one recomputation in the pass.
        assert_eq!(tk.place_count(frame), frames + 1);
        assert_eq!(tk.place_count(label), labels + 1);
        assert_eq!(tk.last_place(label), Some(Rect::new(0, 0, 100, 100)));
    }

    #[test]
    fn attached_scrollbars_reserve_thickness_and_auto_place() {
        let (mut core, tk) = setup();
        let canvas = core.add(core.root(), WidgetKind::Canvas).unwrap();
        let vbar = core
            .add(
                core.root(),
                WidgetKind::Scrollbar {
                    orientation: Orientation::Vertical,
                    thickness: 16,
                },
            )
            .unwrap();
        let hbar = core
            .add(
                core.root(),
                WidgetKind::Scrollbar {
                    orientation: Orientation::Horizontal,
                    thickness: 12,
                },
            )
            .unwrap();
        core.place_relative(
            canvas,
            Place::new().scrollbars(Some(vbar), Some(hbar), true),
        )
        .unwrap();

        assert_eq!(tk.last_place(canvas), Some(Rect::new(0, 0, 384, 288)));
        // Bars sit flush against the computed rectangle.
        assert_eq!(tk.last_place(vbar), Some(Rect::new(384, 0, 16, 288)));
        assert_eq!(tk.last_place(hbar), Some(Rect::new(0, 288, 384, 12)));
    }

    #[test]
    fn forgotten_widget_is_skipped_by_later_passes() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        core.place_relative(frame, Place::new()).unwrap();
        core.place_forget(frame).unwrap();

        let before = tk.place_count(frame);
        resize(&mut core, Expanse::new(400, 300));
        assert_eq!(tk.place_count(frame), before);
    }

    #[test]
    fn relative_update_hooks_fire_in_order_with_geometry() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        let log: Rc<RefCell<Vec<(&str, Payload)>>> = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        core.bind(
            frame,
            EventType::relative_update(),
            BindOpts::new().arg_mode(pergola::ArgMode::Raw),
            move |_, arg| {
                if let pergola::event::Arg::Raw(p) = arg {
                    l.borrow_mut().push(("update", p));
                }
                Ok(Value::None)
            },
        )
        .unwrap();
        let l = log.clone();
        core.bind(
            frame,
            EventType::relative_update_after(),
            BindOpts::new().arg_mode(pergola::ArgMode::Raw),
            move |_, arg| {
                if let pergola::event::Arg::Raw(p) = arg {
                    l.borrow_mut().push(("after", p));
                }
                Ok(Value::None)
            },
        )
        .unwrap();

        core.place_relative(frame, Place::new()).unwrap();
        let rect = tk.last_place(frame).unwrap();
        let recorded = log.borrow();
        assert_eq!(
            *recorded,
            vec![
                ("update", Payload::Geometry(rect)),
                ("after", Payload::Geometry(rect)),
            ]
        );
    }

    #[test]
    fn internal_hooks_never_bind_natively() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        core.bind(
            frame,
            EventType::relative_update(),
            BindOpts::new(),
            |_, _| Ok(Value::None),
        )
        .unwrap();
        assert_eq!(tk.binding_count(frame), 0);
        assert_eq!(core.subscription_count(frame), 1);
    }

    #[test]
    fn reentrant_relayout_coalesces_to_one_followup_pass() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        let root = core.root();
        core.bind(
            frame,
            EventType::relative_update(),
            BindOpts::new(),
            move |core, _| {
                // A composite widget that always asks for another pass.
                core.update_dynamic_widgets(root)?;
                Ok(Value::None)
            },
        )
        .unwrap();
        core.place_relative(frame, Place::new()).unwrap();
        let before = tk.place_count(frame);

        resize(&mut core, Expanse::new(400, 300));
        // One triggered pass plus exactly one coalesced follow-up.
        assert_eq!(tk.place_count(frame), before + 2);
    }

    #[test]
    fn destroyed_subtree_is_excluded_from_later_passes() {
        let (mut core, tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        let label = core.add(frame, WidgetKind::Label).unwrap();
        core.place_relative(frame, Place::new()).unwrap();
        tk.set_measured(frame, Expanse::new(400, 300));
        core.place_relative(label, Place::new()).unwrap();

        core.destroy(frame).unwrap();
        let (f, l) = (tk.place_count(frame), tk.place_count(label));
        resize(&mut core, Expanse::new(400, 300));
        assert_eq!(tk.place_count(frame), f);
        assert_eq!(tk.place_count(label), l);
    }

    #[test]
    fn mixing_fixed_and_percentage_axes() {
        let (mut core, tk) = setup();
        let entry = core.add(core.root(), WidgetKind::Entry).unwrap();
        core.place_relative(
            entry,
            Place::new()
                .fixed(None, Some(20), None, Some(24))
                .offset(10.0, 0.0)
                .x_edges(0.0, 10.0),
        )
        .unwrap();
        // x from percentages, y fixed; width from percentages, height fixed.
        assert_eq!(tk.last_place(entry), Some(Rect::new(40, 20, 280, 24)));
    }

    #[test]
    fn root_window_cannot_be_placed_relatively() {
        let (mut core, _tk) = setup();
        let root = core.root();
        assert!(core.place_relative(root, Place::new()).is_err());
    }

    #[test]
    fn place_on_destroyed_widget_fails() {
        let (mut core, _tk) = setup();
        let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
        core.destroy(frame).unwrap();
        let err = core.place_relative(frame, Place::new()).unwrap_err();
        assert!(matches!(err, Error::UseAfterDestroy(_)));
    }
}
