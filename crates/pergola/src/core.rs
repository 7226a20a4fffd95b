//! The widget arena and its registry, owned by and scoped to the root
//! window.
//!
//! `Core` owns every widget record in a flat slotmap arena, addressed by
//! opaque [`WidgetId`]. Relationships are ids rather than strong references,
//! so destruction order is explicit: a destroyed node is unlinked from its
//! parent before its own teardown completes, and an in-flight dispatch that
//! finds its record gone aborts instead of touching freed state.

use std::time::{Duration, Instant};

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::{
    backend::{Anchor, Toolkit},
    error::{Error, Result},
    event::{
        Arg, ArgMode, BindOpts, BindingId, EventRecord, EventType, Filtered, Payload,
        Subscriptions, Value,
    },
    geom::Rect,
    id::{TaskId, WidgetId},
    layout::{self, Place},
    sched::{self, Task},
    widget::{WidgetKind, WidgetNode},
};

/// The arena, dispatch engine, task scheduler, and layout driver. One `Core`
/// exists per root window and dies with it.
pub struct Core {
    /// Widget storage arena.
    nodes: SlotMap<WidgetId, WidgetNode>,
    /// Scheduled task storage.
    tasks: SlotMap<TaskId, Task>,
    /// The root window.
    root: WidgetId,
    /// The native toolkit boundary.
    toolkit: Box<dyn Toolkit>,
    /// Registration serial counter for subscription ordering and handles.
    next_serial: u64,
    /// True while a layout pass is running.
    layout_in_flight: bool,
    /// Root of the single pending pass queued during an in-flight pass.
    pending_layout: Option<WidgetId>,
}

impl Core {
    /// Construct a core with its root window.
    pub fn new(toolkit: impl Toolkit + 'static) -> Result<Self> {
        let mut toolkit: Box<dyn Toolkit> = Box::new(toolkit);
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(WidgetNode::new(WidgetKind::Window, None));
        toolkit.create(root, &WidgetKind::Window, None)?;
        Ok(Self {
            nodes,
            tasks: SlotMap::with_key(),
            root,
            toolkit,
            next_serial: 0,
            layout_in_flight: false,
            pending_layout: None,
        })
    }

    /// The root window id.
    pub fn root(&self) -> WidgetId {
        self.root
    }

    /// True if the widget is live in the arena.
    pub fn is_live(&self, widget: WidgetId) -> bool {
        self.nodes.contains_key(widget)
    }

    /// The widget's kind.
    pub fn kind(&self, widget: WidgetId) -> Result<&WidgetKind> {
        self.nodes
            .get(widget)
            .map(|n| &n.kind)
            .ok_or(Error::UseAfterDestroy(widget))
    }

    /// The widget's parent, if any.
    pub fn parent_of(&self, widget: WidgetId) -> Result<Option<WidgetId>> {
        self.nodes
            .get(widget)
            .map(|n| n.parent)
            .ok_or(Error::UseAfterDestroy(widget))
    }

    /// The widget's children, in creation order.
    pub fn children_of(&self, widget: WidgetId) -> Result<&[WidgetId]> {
        self.nodes
            .get(widget)
            .map(|n| n.children.as_slice())
            .ok_or(Error::UseAfterDestroy(widget))
    }

    /// Geometry from the widget's most recent layout computation.
    pub fn rect_of(&self, widget: WidgetId) -> Result<Rect> {
        self.nodes
            .get(widget)
            .map(|n| n.rect)
            .ok_or(Error::UseAfterDestroy(widget))
    }

    /// Number of live subscriptions across all event types for a widget.
    /// Zero for a torn-down widget.
    pub fn subscription_count(&self, widget: WidgetId) -> usize {
        self.nodes
            .get(widget)
            .map(|n| n.subs.values().map(Subscriptions::len).sum())
            .unwrap_or(0)
    }

    // ------------------------------------------------------------------
    // Construction and teardown
    // ------------------------------------------------------------------

    /// Create a widget under a parent. The parent must be a container kind.
    pub fn add(&mut self, parent: WidgetId, kind: WidgetKind) -> Result<WidgetId> {
        let parent_kind = self
            .nodes
            .get(parent)
            .map(|n| n.kind.clone())
            .ok_or(Error::UseAfterDestroy(parent))?;
        if !parent_kind.is_container() {
            return Err(Error::InvalidWidgetKind {
                kind: kind.name(),
                parent_kind: parent_kind.name(),
            });
        }
        let id = self.nodes.insert(WidgetNode::new(kind.clone(), Some(parent)));
        if let Err(e) = self.toolkit.create(id, &kind, Some(parent)) {
            self.nodes.remove(id);
            return Err(e);
        }
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(id);
        }
        trace!(?id, kind = kind.name(), ?parent, "widget created");
        Ok(id)
    }

    /// Destroy a widget and its subtree. The node is unlinked from its
    /// parent first, then the subtree is torn down children-first: tasks
    /// canceled, native bindings released, records cleared. Any dispatch in
    /// flight detects the cleared records and aborts.
    pub fn destroy(&mut self, widget: WidgetId) -> Result<()> {
        if !self.nodes.contains_key(widget) {
            return Err(Error::UseAfterDestroy(widget));
        }
        let parent = self.nodes.get(widget).and_then(|n| n.parent);
        if let Some(parent) = parent
            && let Some(p) = self.nodes.get_mut(parent)
        {
            p.children.retain(|c| *c != widget);
        }
        let mut order = Vec::new();
        self.subtree_postorder(widget, &mut order);
        for id in order {
            let tasks = match self.nodes.get_mut(id) {
                Some(node) => std::mem::take(&mut node.tasks),
                None => continue,
            };
            for t in tasks {
                if let Some(task) = self.tasks.remove(t)
                    && let Some(h) = task.handle
                {
                    self.toolkit.after_cancel(h);
                }
            }
            self.unbind_all(id);
            self.toolkit.destroy(id);
            self.nodes.remove(id);
            trace!(?id, "widget destroyed");
        }
        Ok(())
    }

    /// Collect a subtree children-first.
    fn subtree_postorder(&self, id: WidgetId, out: &mut Vec<WidgetId>) {
        if let Some(node) = self.nodes.get(id) {
            for child in &node.children {
                self.subtree_postorder(*child, out);
            }
            out.push(id);
        }
    }

    // ------------------------------------------------------------------
    // Event dispatch
    // ------------------------------------------------------------------

    /// Subscribe a callback to an event type on a widget.
    ///
    /// The first subscription for a (widget, event-type) pair creates the
    /// single native binding for that pair; a toolkit that does not support
    /// the event type for this widget kind fails here, fatally. The record
    /// is inserted preserving descending priority with stable ties.
    pub fn bind<F>(
        &mut self,
        widget: WidgetId,
        event_type: EventType,
        opts: BindOpts,
        callback: F,
    ) -> Result<BindingId>
    where
        F: FnMut(&mut Self, Arg) -> Result<Value> + 'static,
    {
        let callback_name = std::any::type_name::<F>().to_string();
        let node = self
            .nodes
            .get(widget)
            .ok_or(Error::UseAfterDestroy(widget))?;
        let needs_native =
            !event_type.is_internal() && !node.subs.contains_key(&event_type);
        if needs_native {
            let kind = node.kind.clone();
            self.toolkit.bind(widget, &kind, &event_type)?;
        }
        let serial = self.next_serial;
        self.next_serial += 1;
        let record = EventRecord {
            widget,
            event_type: event_type.clone(),
            priority: opts.priority,
            arg_mode: opts.arg_mode,
            callback: Some(Box::new(callback)),
            callback_name,
            filter: opts.filter,
            payload: Payload::None,
            value: Value::None,
            canceled: false,
            force_return: opts.force_return,
            after_triggered: opts.after_triggered,
            serial,
        };
        if let Some(node) = self.nodes.get_mut(widget) {
            node.subs.entry(event_type.clone()).or_default().insert(record);
        }
        trace!(?widget, %event_type, serial, priority = opts.priority, "subscription added");
        Ok(BindingId {
            widget,
            event_type,
            serial,
        })
    }

    /// Cancel one subscription. Dropping the last record for a pair releases
    /// the native binding. A handle for a torn-down widget is a no-op.
    pub fn unbind(&mut self, binding: &BindingId) {
        let Some(node) = self.nodes.get_mut(binding.widget) else {
            return;
        };
        if let Some(subs) = node.subs.get_mut(&binding.event_type) {
            subs.remove(binding.serial);
            if subs.is_empty() {
                node.subs.remove(&binding.event_type);
                if !binding.event_type.is_internal() {
                    self.toolkit.unbind(binding.widget, &binding.event_type);
                }
            }
        }
    }

    /// Enable or disable one subscription without removing it. A disabled
    /// record is skipped by dispatch; the native binding stays in place.
    pub fn set_binding_enabled(&mut self, binding: &BindingId, enabled: bool) {
        if let Some(rec) = self
            .nodes
            .get_mut(binding.widget)
            .and_then(|n| n.subs.get_mut(&binding.event_type))
            .and_then(|s| s.get_mut(binding.serial))
        {
            rec.canceled = !enabled;
        }
    }

    /// Release every native binding for a widget and drop its subscription
    /// lists. A dispatch attempted afterwards returns immediately.
    pub fn unbind_all(&mut self, widget: WidgetId) {
        let Some(node) = self.nodes.get_mut(widget) else {
            return;
        };
        let types: Vec<EventType> = node.subs.drain().map(|(t, _)| t).collect();
        for t in &types {
            if !t.is_internal() {
                self.toolkit.unbind(widget, t);
            }
        }
    }

    /// Fan an event out to the widget's subscription list for the type.
    ///
    /// Records run strictly one at a time in descending priority order. A
    /// filter returning [`Filtered::Cancel`] aborts the whole dispatch and
    /// the dispatcher returns as if nothing happened. A callback error is
    /// wrapped with its subscription's full diagnostic context and
    /// propagated, never swallowed. Destruction of the widget during a
    /// callback aborts the loop.
    pub fn dispatch(
        &mut self,
        widget: WidgetId,
        event_type: &EventType,
        payload: Payload,
    ) -> Result<Value> {
        let Some(node) = self.nodes.get(widget) else {
            trace!(?widget, %event_type, "dispatch on torn-down widget ignored");
            return Ok(Value::None);
        };
        let widget_kind = node.kind.name();
        let serials = match node.subs.get(event_type) {
            Some(subs) => subs.serials(),
            None => return Ok(Value::None),
        };

        let mut last = Value::None;
        for serial in serials {
            // Re-fetch each iteration: the previous callback may have torn
            // down the widget or cleared its subscriptions.
            let Some(node) = self.nodes.get_mut(widget) else {
                debug!(?widget, %event_type, "widget destroyed mid-dispatch, aborting");
                return Ok(last);
            };
            let Some(subs) = node.subs.get_mut(event_type) else {
                debug!(?widget, %event_type, "subscriptions cleared mid-dispatch, aborting");
                return Ok(last);
            };
            let Some(record) = subs.get_mut(serial) else {
                continue;
            };
            if record.canceled {
                continue;
            }

            record.payload = payload.clone();
            let view = record.view(widget_kind);
            if let Some(filter) = record.filter.as_mut() {
                match filter(&payload, &view) {
                    Filtered::Value(v) => record.value = v,
                    Filtered::Cancel => {
                        trace!(?widget, %event_type, serial, "dispatch canceled by filter");
                        return Ok(Value::None);
                    }
                }
            }

            let arg = match record.arg_mode {
                ArgMode::NoArgs => Arg::None,
                ArgMode::Raw => Arg::Raw(payload.clone()),
                ArgMode::Structured => Arg::Event(record.view(widget_kind)),
            };
            let Some(mut cb) = record.callback.take() else {
                // Slot empty: this record is already running further up the
                // stack. Skip rather than re-enter.
                continue;
            };
            let callback_name = record.callback_name.clone();
            let priority = record.priority;
            let payload_desc = format!("{:?}", record.payload);
            let value_desc = format!("{:?}", record.value);

            let result = cb(self, arg);

            let destroyed = !self.nodes.contains_key(widget);
            if !destroyed
                && let Some(rec) = self
                    .nodes
                    .get_mut(widget)
                    .and_then(|n| n.subs.get_mut(event_type))
                    .and_then(|s| s.get_mut(serial))
                && rec.callback.is_none()
            {
                rec.callback = Some(cb);
            }

            let value = match result {
                Ok(v) => v,
                Err(e) => {
                    return Err(Error::EventExecutor {
                        callback: callback_name,
                        widget_kind,
                        event_type: event_type.to_string(),
                        priority,
                        payload: payload_desc,
                        value: value_desc,
                        source: Box::new(e),
                    });
                }
            };

            if destroyed {
                debug!(?widget, %event_type, "widget destroyed mid-dispatch, aborting");
                return Ok(value);
            }

            if let Some(rec) = self
                .nodes
                .get_mut(widget)
                .and_then(|n| n.subs.get_mut(event_type))
                .and_then(|s| s.get_mut(serial))
                && rec.after_triggered.is_some()
            {
                let view = rec.view(widget_kind);
                if let Some(hook) = rec.after_triggered.as_mut() {
                    hook(&view, &value);
                }
            }

            last = value;
        }

        // A forced return declared by the final record wins over the last
        // callback's value.
        if let Some(forced) = self
            .nodes
            .get(widget)
            .and_then(|n| n.subs.get(event_type))
            .and_then(|s| s.last_serial().and_then(|serial| s.get(serial)))
            .and_then(|r| r.force_return.clone())
        {
            return Ok(forced);
        }
        Ok(last)
    }

    // ------------------------------------------------------------------
    // Task scheduling
    // ------------------------------------------------------------------

    /// Schedule a deferred callback on the UI loop after `delay`.
    ///
    /// `repeat` re-arms the task after each fire. `dynamic` keeps a
    /// repeating task on cadence by subtracting the callback's own running
    /// time from the next delay, saturating at zero. The task dies with its
    /// owner.
    pub fn schedule<F>(
        &mut self,
        owner: WidgetId,
        delay: Duration,
        repeat: bool,
        dynamic: bool,
        callback: F,
    ) -> Result<TaskId>
    where
        F: FnMut(&mut Self) -> Result<()> + 'static,
    {
        if !self.nodes.contains_key(owner) {
            return Err(Error::UseAfterDestroy(owner));
        }
        let id = self.tasks.insert(Task {
            owner,
            delay,
            repeat,
            dynamic,
            callback: Some(Box::new(callback)),
            handle: None,
        });
        let handle = self.toolkit.after(delay, id);
        if let Some(t) = self.tasks.get_mut(id) {
            t.handle = Some(handle);
        }
        if let Some(n) = self.nodes.get_mut(owner) {
            n.tasks.push(id);
        }
        trace!(?id, ?owner, ?delay, repeat, dynamic, "task scheduled");
        Ok(id)
    }

    /// Cancel a task. Best-effort: a no-op for an unknown or already-fired
    /// one-shot task, and a fire already in the event channel still
    /// delivers once (the callback is gone by then, so nothing runs).
    pub fn cancel_task(&mut self, task: TaskId) {
        if let Some(t) = self.tasks.remove(task) {
            if let Some(h) = t.handle {
                self.toolkit.after_cancel(h);
            }
            if let Some(n) = self.nodes.get_mut(t.owner) {
                n.tasks.retain(|x| *x != task);
            }
        }
    }

    /// Fire a task whose timer has elapsed. Called by the run loop.
    pub fn fire_task(&mut self, task: TaskId) -> Result<()> {
        let (mut cb, owner, delay, repeat, dynamic) = {
            let Some(t) = self.tasks.get_mut(task) else {
                // Cancel raced an already-fired timer.
                return Ok(());
            };
            t.handle = None;
            let Some(cb) = t.callback.take() else {
                return Ok(());
            };
            (cb, t.owner, t.delay, t.repeat, t.dynamic)
        };

        let start = Instant::now();
        let result = cb(self);
        let elapsed = start.elapsed();

        if self.tasks.contains_key(task) {
            if repeat && self.nodes.contains_key(owner) {
                let next = sched::rearm_delay(delay, elapsed, dynamic);
                let handle = self.toolkit.after(next, task);
                if let Some(t) = self.tasks.get_mut(task) {
                    t.callback = Some(cb);
                    t.handle = Some(handle);
                }
                trace!(?task, ?next, "task re-armed");
            } else {
                self.cancel_task(task);
            }
        }
        result
    }

    // ------------------------------------------------------------------
    // Relative layout
    // ------------------------------------------------------------------

    /// Create or update a widget's relative placement constraint and place
    /// it immediately.
    ///
    /// Constraint validation runs before any geometry is computed. The
    /// first relative placement under a toplevel installs that window's
    /// resize-driven layout hook, whose filter cancels the dispatch when
    /// the newly measured size equals the last-seen size.
    pub fn place_relative(&mut self, widget: WidgetId, place: Place) -> Result<()> {
        place.validate()?;
        let node = self
            .nodes
            .get_mut(widget)
            .ok_or(Error::UseAfterDestroy(widget))?;
        if node.parent.is_none() {
            return Err(Error::Internal(
                "the root window cannot be placed relatively".into(),
            ));
        }
        node.place = Some(place);
        node.placed = true;
        self.ensure_resize_hook(widget)?;
        self.layout_widget(widget)
    }

    /// Remove a widget from display. The constraint is retained; the widget
    /// is skipped by layout passes until placed again.
    pub fn place_forget(&mut self, widget: WidgetId) -> Result<()> {
        let node = self
            .nodes
            .get_mut(widget)
            .ok_or(Error::UseAfterDestroy(widget))?;
        node.placed = false;
        Ok(())
    }

    /// Install the resize-driven layout hook on the widget's nearest window
    /// ancestor, once.
    fn ensure_resize_hook(&mut self, widget: WidgetId) -> Result<()> {
        let mut cur = widget;
        let win = loop {
            let node = self.nodes.get(cur).ok_or(Error::UseAfterDestroy(cur))?;
            if matches!(node.kind, WidgetKind::Window) {
                break cur;
            }
            match node.parent {
                Some(p) => cur = p,
                None => break cur,
            }
        };
        if self.nodes.get(win).is_none_or(|n| n.resize_hook) {
            return Ok(());
        }
        let mut last_seen = None;
        let opts = BindOpts::new()
            .arg_mode(ArgMode::Raw)
            .filter(move |payload, _| match payload {
                Payload::Resize(size) if last_seen == Some(*size) => Filtered::Cancel,
                Payload::Resize(size) => {
                    last_seen = Some(*size);
                    Filtered::Value(Value::None)
                }
                _ => Filtered::Value(Value::None),
            });
        self.bind(win, EventType::resize(), opts, move |core, _| {
            core.update_dynamic_widgets(win)?;
            Ok(Value::None)
        })?;
        if let Some(n) = self.nodes.get_mut(win) {
            n.resize_hook = true;
        }
        Ok(())
    }

    /// Recompute geometry for every live, placed descendant of `root` that
    /// owns a constraint, including children of containers whose own
    /// geometry is fixed.
    ///
    /// Re-entrant calls coalesce: a pass requested while one is in flight
    /// queues at most one pending pass, which runs immediately after the
    /// current one completes.
    pub fn update_dynamic_widgets(&mut self, root: WidgetId) -> Result<()> {
        if self.layout_in_flight {
            trace!(?root, "layout pass queued behind in-flight pass");
            self.pending_layout = Some(root);
            return Ok(());
        }
        self.layout_in_flight = true;
        let mut result = self.layout_pass(root);
        // Run the single queued follow-up pass, if a subscriber requested
        // one. Requests made during the follow-up itself are dropped, which
        // bounds a subscriber that asks for relayout on every update.
        if result.is_ok()
            && let Some(queued) = self.pending_layout.take()
        {
            result = self.layout_pass(queued);
        }
        if self.pending_layout.take().is_some() {
            trace!("relayout requested during follow-up pass dropped");
        }
        self.layout_in_flight = false;
        result
    }

    /// One recursive layout pass over the subtree at `root`, parents before
    /// children.
    fn layout_pass(&mut self, root: WidgetId) -> Result<()> {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                // Torn down mid-pass; its subtree went with it.
                continue;
            };
            let children = node.children.clone();
            self.layout_widget(id)?;
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        Ok(())
    }

    /// Compute and apply geometry for one widget: exactly one native place
    /// call, then auto-placement of attached scrollbars flush to the new
    /// rect, then the `relative_update` and `relative_update_after`
    /// dispatches carrying the geometry.
    fn layout_widget(&mut self, id: WidgetId) -> Result<()> {
        let (place, parent) = {
            let Some(node) = self.nodes.get(id) else {
                return Ok(());
            };
            if !node.placed {
                return Ok(());
            }
            let (Some(place), Some(parent)) = (node.place.clone(), node.parent) else {
                return Ok(());
            };
            (place, parent)
        };

        let parent_size = self.toolkit.measured(parent);
        let (vbar_thickness, hbar_thickness) = if place.auto_place_bars {
            (
                place.vbar.map_or(0, |b| self.bar_thickness(b)),
                place.hbar.map_or(0, |b| self.bar_thickness(b)),
            )
        } else {
            (0, 0)
        };

        let rect = layout::resolve(parent_size, &place, vbar_thickness, hbar_thickness);
        self.toolkit.place(id, rect, Anchor::NorthWest);
        if let Some(node) = self.nodes.get_mut(id) {
            node.rect = rect;
        }
        trace!(?id, ?rect, "widget placed");

        if place.auto_place_bars {
            if let Some(vb) = place.vbar {
                let t = self.bar_thickness(vb);
                let vrect = Rect::new(rect.x() + rect.w as i32, rect.y(), t, rect.h);
                self.toolkit.place(vb, vrect, Anchor::NorthWest);
                if let Some(n) = self.nodes.get_mut(vb) {
                    n.rect = vrect;
                }
            }
            if let Some(hb) = place.hbar {
                let t = self.bar_thickness(hb);
                let hrect = Rect::new(rect.x(), rect.y() + rect.h as i32, rect.w, t);
                self.toolkit.place(hb, hrect, Anchor::NorthWest);
                if let Some(n) = self.nodes.get_mut(hb) {
                    n.rect = hrect;
                }
            }
        }

        self.dispatch(id, &EventType::relative_update(), Payload::Geometry(rect))?;
        self.dispatch(id, &EventType::relative_update_after(), Payload::Geometry(rect))?;
        Ok(())
    }

    /// Thickness of an attached scrollbar, zero if it is gone or not a
    /// scrollbar.
    fn bar_thickness(&self, bar: WidgetId) -> u32 {
        self.nodes.get(bar).map_or(0, |n| n.kind.thickness())
    }
}
