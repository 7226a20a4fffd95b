//! Property tests for layout determinism and dispatch ordering.

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pergola::{
        BindOpts, Core, EventType, Expanse, Payload, Place, Value, WidgetKind, resolve,
        testing::TestToolkit,
    };
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn resolve_is_deterministic_and_idempotent(
            w in 1u32..2000,
            h in 1u32..2000,
            xo in 0.0f64..50.0,
            xl in 0.0f64..50.0,
            xr in 0.0f64..50.0,
            yo in 0.0f64..50.0,
            yu in 0.0f64..50.0,
            yd in 0.0f64..50.0,
            stick_right in any::<bool>(),
            center_y in any::<bool>(),
        ) {
            let place = Place::new()
                .offset(xo, yo)
                .x_edges(xl, xr)
                .y_edges(yu, yd)
                .stick(stick_right, false)
                .center(false, center_y);
            prop_assert!(place.validate().is_ok());
            let a = resolve(Expanse::new(w, h), &place, 0, 0);
            let b = resolve(Expanse::new(w, h), &place, 0, 0);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn dispatch_order_is_non_increasing_priority_with_stable_ties(
            priorities in proptest::collection::vec(-100i32..100, 1..20)
        ) {
            let tk = TestToolkit::new();
            let mut core = Core::new(tk).unwrap();
            let frame = core.add(core.root(), WidgetKind::Frame).unwrap();
            let et = EventType::new("<Key>");

            let log: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
            for (index, priority) in priorities.iter().enumerate() {
                let log = log.clone();
                core.bind(frame, et.clone(), BindOpts::new().priority(*priority), move |_, _| {
                    log.borrow_mut().push(index);
                    Ok(Value::None)
                })
                .unwrap();
            }
            core.dispatch(frame, &et, Payload::None).unwrap();

            // Expected order: indices stably sorted by descending priority.
            let mut expected: Vec<usize> = (0..priorities.len()).collect();
            expected.sort_by_key(|i| std::cmp::Reverse(priorities[*i]));
            prop_assert_eq!(&*log.borrow(), &expected);
        }
    }
}
