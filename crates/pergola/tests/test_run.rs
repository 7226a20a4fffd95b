//! Integration tests for the run loop and the background wake helper.

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        rc::Rc,
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        thread,
        time::Duration,
    };

    use pergola::{
        BindOpts, EventType, Looper, NativeEvent, Payload, RunLoop, Value, WidgetKind,
        testing::TestToolkit,
    };

    fn setup() -> RunLoop {
        let tk = TestToolkit::new();
        let core = pergola::Core::new(tk).unwrap();
        RunLoop::new(core)
    }

    #[test]
    fn widget_events_route_into_dispatch() {
        let mut rl = setup();
        let frame = {
            let core = rl.core_mut();
            core.add(core.root(), WidgetKind::Frame).unwrap()
        };
        let ran = Rc::new(RefCell::new(false));
        let flag = ran.clone();
        rl.core_mut()
            .bind(frame, EventType::new("<Key>"), BindOpts::new(), move |_, _| {
                *flag.borrow_mut() = true;
                Ok(Value::None)
            })
            .unwrap();

        let more = rl
            .step(NativeEvent::Widget {
                widget: frame,
                event_type: EventType::new("<Key>"),
                payload: Payload::Key("q".into()),
            })
            .unwrap();
        assert!(more);
        assert!(*ran.borrow());
    }

    #[test]
    fn timer_events_fire_tasks() {
        let mut rl = setup();
        let root = rl.core().root();
        let ran = Rc::new(RefCell::new(false));
        let flag = ran.clone();
        let task = rl
            .core_mut()
            .schedule(root, Duration::from_millis(10), false, false, move |_| {
                *flag.borrow_mut() = true;
                Ok(())
            })
            .unwrap();

        rl.step(NativeEvent::Timer(task)).unwrap();
        assert!(*ran.borrow());
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut rl = setup();
        assert!(!rl.step(NativeEvent::Quit).unwrap());
    }

    #[test]
    fn looper_marshals_work_onto_the_ui_thread() {
        let mut rl = setup();
        let mut looper = Looper::new(rl.sender());

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        looper.schedule(Duration::from_millis(10), move |_core| {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        // Give the helper thread time to deliver, then stop the loop after
        // the queued work has been processed.
        thread::sleep(Duration::from_millis(200));
        rl.sender().send(NativeEvent::Quit).unwrap();
        rl.run().unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}
