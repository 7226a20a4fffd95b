//! Test double for the toolkit boundary.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
    time::Duration,
};

use crate::{
    backend::{Anchor, TimerHandle, Toolkit},
    error::{Error, Result},
    event::EventType,
    geom::{Expanse, Rect},
    id::{TaskId, WidgetId},
    widget::WidgetKind,
};

/// Recorded state behind a [`TestToolkit`].
#[derive(Default)]
struct ToolkitLog {
    /// Created widgets with their kind names.
    created: Vec<(WidgetId, String)>,
    /// Currently bound (widget, event-type) pairs.
    bound: Vec<(WidgetId, String)>,
    /// Released bindings.
    unbound: Vec<(WidgetId, String)>,
    /// Every place call, in order.
    places: Vec<(WidgetId, Rect, Anchor)>,
    /// Destroyed widgets.
    destroyed: Vec<WidgetId>,
    /// Armed timers with their delays, in order.
    timers: Vec<(TaskId, Duration)>,
    /// Canceled timer handles.
    canceled_timers: Vec<TimerHandle>,
    /// Scripted measured sizes.
    sizes: HashMap<WidgetId, Expanse>,
    /// Event types this toolkit refuses to bind.
    rejected: HashSet<String>,
    /// Timer handle counter.
    next_timer: u64,
}

/// A recording toolkit for tests. Cloning shares the underlying log, so a
/// test keeps one clone while the core owns the other.
///
/// The double enforces the single-binding contract: a second native bind for
/// the same (widget, event-type) pair fails.
#[derive(Clone, Default)]
pub struct TestToolkit {
    /// Shared recorded state.
    log: Rc<RefCell<ToolkitLog>>,
}

impl TestToolkit {
    /// A fresh toolkit with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the measured size the toolkit reports for a widget.
    pub fn set_measured(&self, widget: WidgetId, size: Expanse) {
        self.log.borrow_mut().sizes.insert(widget, size);
    }

    /// Make future binds of an event type fail, for any widget.
    pub fn reject_bind(&self, event_type: &str) {
        self.log.borrow_mut().rejected.insert(event_type.to_string());
    }

    /// Number of place calls issued for a widget.
    pub fn place_count(&self, widget: WidgetId) -> usize {
        self.log
            .borrow()
            .places
            .iter()
            .filter(|(w, _, _)| *w == widget)
            .count()
    }

    /// The most recent placed rect for a widget.
    pub fn last_place(&self, widget: WidgetId) -> Option<Rect> {
        self.log
            .borrow()
            .places
            .iter()
            .rev()
            .find(|(w, _, _)| *w == widget)
            .map(|(_, r, _)| *r)
    }

    /// Number of currently live native bindings for a widget.
    pub fn binding_count(&self, widget: WidgetId) -> usize {
        self.log
            .borrow()
            .bound
            .iter()
            .filter(|(w, _)| *w == widget)
            .count()
    }

    /// Delays of every armed timer, in arming order.
    pub fn timer_delays(&self) -> Vec<Duration> {
        self.log.borrow().timers.iter().map(|(_, d)| *d).collect()
    }

    /// Number of canceled timers.
    pub fn canceled_timer_count(&self) -> usize {
        self.log.borrow().canceled_timers.len()
    }

    /// True if the widget's native side has been destroyed.
    pub fn is_destroyed(&self, widget: WidgetId) -> bool {
        self.log.borrow().destroyed.contains(&widget)
    }
}

impl Toolkit for TestToolkit {
    fn create(
        &mut self,
        widget: WidgetId,
        kind: &WidgetKind,
        _parent: Option<WidgetId>,
    ) -> Result<()> {
        self.log
            .borrow_mut()
            .created
            .push((widget, kind.name().to_string()));
        Ok(())
    }

    fn bind(&mut self, widget: WidgetId, kind: &WidgetKind, event_type: &EventType) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if log.rejected.contains(event_type.as_str()) {
            return Err(Error::Bind {
                widget_kind: kind.name(),
                event_type: event_type.to_string(),
                reason: "unsupported event type".into(),
            });
        }
        let pair = (widget, event_type.to_string());
        if log.bound.contains(&pair) {
            return Err(Error::Bind {
                widget_kind: kind.name(),
                event_type: event_type.to_string(),
                reason: "pair already bound".into(),
            });
        }
        log.bound.push(pair);
        Ok(())
    }

    fn unbind(&mut self, widget: WidgetId, event_type: &EventType) {
        let mut log = self.log.borrow_mut();
        let pair = (widget, event_type.to_string());
        log.bound.retain(|p| *p != pair);
        log.unbound.push(pair);
    }

    fn after(&mut self, delay: Duration, task: TaskId) -> TimerHandle {
        let mut log = self.log.borrow_mut();
        log.next_timer += 1;
        let handle = TimerHandle(log.next_timer);
        log.timers.push((task, delay));
        handle
    }

    fn after_cancel(&mut self, handle: TimerHandle) {
        self.log.borrow_mut().canceled_timers.push(handle);
    }

    fn measured(&self, widget: WidgetId) -> Expanse {
        self.log
            .borrow()
            .sizes
            .get(&widget)
            .copied()
            .unwrap_or_default()
    }

    fn place(&mut self, widget: WidgetId, rect: Rect, anchor: Anchor) {
        self.log.borrow_mut().places.push((widget, rect, anchor));
    }

    fn destroy(&mut self, widget: WidgetId) {
        let mut log = self.log.borrow_mut();
        log.bound.retain(|(w, _)| *w != widget);
        log.destroyed.push(widget);
    }
}
