//! Event dispatch core: subscription records, payloads, and the ordered
//! per-(widget, event-type) subscription list.
//!
//! Every widget shares one dispatch engine. A single native binding exists
//! per (widget, event-type) pair; the bound dispatcher fans out to an
//! ordered list of subscription records. Higher-priority records run first
//! and can veto the rest of the dispatch by returning [`Filtered::Cancel`]
//! from their filter.

use std::fmt;

use crate::{
    core::Core,
    error::Result,
    geom::{Expanse, Point, Rect},
    id::WidgetId,
};

/// An event-type name, in the native toolkit's vocabulary. The well-known
/// names used by the layout engine have constructors; arbitrary native
/// sequences (e.g. `"<Button-1>"`) pass through [`EventType::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventType(String);

impl EventType {
    /// An arbitrary native event-type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Native resize notification for a container.
    pub fn resize() -> Self {
        Self("resize".into())
    }

    /// Fired after the layout engine places a widget, carrying the new
    /// geometry. Composite widgets re-derive internal state here.
    pub fn relative_update() -> Self {
        Self("relative_update".into())
    }

    /// Fired after attached scrollbars have been placed, with the same
    /// geometry payload, for second-pass consumers.
    pub fn relative_update_after() -> Self {
        Self("relative_update_after".into())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for event types synthesized by the layout engine rather than
    /// delivered by the native toolkit. Internal types never get a native
    /// binding.
    pub fn is_internal(&self) -> bool {
        self.0 == "relative_update" || self.0 == "relative_update_after"
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Raw native arguments delivered with an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    /// No arguments.
    #[default]
    None,
    /// Newly measured size of a container.
    Resize(Expanse),
    /// Absolute geometry computed by the layout engine.
    Geometry(Rect),
    /// Key symbol.
    Key(String),
    /// Pointer position and button.
    Mouse {
        /// Pointer position in widget coordinates.
        pos: Point,
        /// Button number.
        button: u8,
    },
    /// Timer fire.
    Timer,
}

/// A value computed by a filter or returned by a callback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// No value.
    #[default]
    None,
    /// Boolean, used by validation-style native callbacks.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// String value.
    Str(String),
    /// Geometry value.
    Geometry(Rect),
}

/// Result of a filter (decrypt) function. `Cancel` aborts the entire
/// in-progress dispatch: no further records on the list run, and the
/// dispatcher returns as if nothing happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filtered {
    /// A decrypted value, stored on the record and passed to the callback.
    Value(Value),
    /// Abort the dispatch.
    Cancel,
}

/// The argument shape a callback receives, chosen explicitly at subscribe
/// time rather than inferred from the callback's arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArgMode {
    /// Callback receives no event data.
    #[default]
    NoArgs,
    /// Callback receives the raw native payload.
    Raw,
    /// Callback receives a structured [`EventView`] snapshot.
    Structured,
}

/// Immutable snapshot of a subscription record at dispatch time, handed to
/// `Structured`-mode callbacks and to after-triggered hooks.
#[derive(Debug, Clone)]
pub struct EventView {
    /// Owning widget.
    pub widget: WidgetId,
    /// Kind name of the owning widget.
    pub widget_kind: &'static str,
    /// Event type being dispatched.
    pub event_type: EventType,
    /// Subscription priority.
    pub priority: i32,
    /// Raw native args for this dispatch.
    pub payload: Payload,
    /// Current decrypted value.
    pub value: Value,
}

/// The argument actually passed to a callback, built per [`ArgMode`].
#[derive(Debug, Clone)]
pub enum Arg {
    /// No event data.
    None,
    /// Raw native payload.
    Raw(Payload),
    /// Structured snapshot.
    Event(EventView),
}

/// A subscriber callback. Runs on the UI thread with exclusive access to the
/// core.
pub type Callback = Box<dyn FnMut(&mut Core, Arg) -> Result<Value>>;

/// A filter (decrypt) function, run before the callback on every dispatch.
pub type FilterFn = Box<dyn FnMut(&Payload, &EventView) -> Filtered>;

/// An after-triggered hook, run with the record snapshot and the callback's
/// result.
pub type AfterTriggered = Box<dyn FnMut(&EventView, &Value)>;

/// Handle for one subscription, returned by `Core::bind`. Pass to
/// `Core::unbind` to cancel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingId {
    /// Widget the subscription is attached to.
    pub(crate) widget: WidgetId,
    /// Event type the subscription is attached to.
    pub(crate) event_type: EventType,
    /// Registration serial, unique within the core.
    pub(crate) serial: u64,
}

impl BindingId {
    /// The widget this binding is attached to.
    pub fn widget(&self) -> WidgetId {
        self.widget
    }

    /// The event type this binding is attached to.
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }
}

/// Options for a subscription. Priority defaults to 0; higher runs first.
#[derive(Default)]
pub struct BindOpts {
    /// Dispatch priority.
    pub(crate) priority: i32,
    /// Argument shape for the callback.
    pub(crate) arg_mode: ArgMode,
    /// Optional filter run before the callback.
    pub(crate) filter: Option<FilterFn>,
    /// Fixed value the dispatcher returns when this is the final record.
    pub(crate) force_return: Option<Value>,
    /// Hook run after the callback with its result.
    pub(crate) after_triggered: Option<AfterTriggered>,
}

impl BindOpts {
    /// Default options: priority 0, no args, no filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatch priority. Higher priorities run first.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the argument shape passed to the callback.
    pub fn arg_mode(mut self, mode: ArgMode) -> Self {
        self.arg_mode = mode;
        self
    }

    /// Set a filter run before the callback on every dispatch. Returning
    /// [`Filtered::Cancel`] aborts the dispatch.
    pub fn filter(mut self, f: impl FnMut(&Payload, &EventView) -> Filtered + 'static) -> Self {
        self.filter = Some(Box::new(f));
        self
    }

    /// Force a fixed dispatcher return value when this record is last on the
    /// list. Needed for native callbacks that must answer true/false.
    pub fn force_return(mut self, value: Value) -> Self {
        self.force_return = Some(value);
        self
    }

    /// Set a hook invoked after the callback with (snapshot, result).
    pub fn after_triggered(mut self, f: impl FnMut(&EventView, &Value) + 'static) -> Self {
        self.after_triggered = Some(Box::new(f));
        self
    }
}

/// One subscription: a mutable per-dispatch record. `widget` and
/// `event_type` are immutable after construction; `payload`, `value` and
/// `canceled` mutate once per dispatch cycle.
pub(crate) struct EventRecord {
    /// Owning widget.
    pub(crate) widget: WidgetId,
    /// Event type, fixed at bind time.
    pub(crate) event_type: EventType,
    /// Dispatch priority, higher first.
    pub(crate) priority: i32,
    /// Argument shape for the callback.
    pub(crate) arg_mode: ArgMode,
    /// The subscriber callback. Taken out of the slot for the duration of an
    /// invocation; a re-entrant dispatch that reaches the same record finds
    /// the slot empty and skips it.
    pub(crate) callback: Option<Callback>,
    /// Qualified name of the callback, for diagnostics.
    pub(crate) callback_name: String,
    /// Optional filter run before the callback.
    pub(crate) filter: Option<FilterFn>,
    /// Raw native args from the most recent dispatch.
    pub(crate) payload: Payload,
    /// Decrypted value from the most recent dispatch.
    pub(crate) value: Value,
    /// Set when the subscription has been canceled via its handle.
    pub(crate) canceled: bool,
    /// Fixed dispatcher return value when this record is last.
    pub(crate) force_return: Option<Value>,
    /// Hook run after the callback.
    pub(crate) after_triggered: Option<AfterTriggered>,
    /// Registration serial, unique within the core.
    pub(crate) serial: u64,
}

impl EventRecord {
    /// Build a snapshot of this record for callbacks and hooks.
    pub(crate) fn view(&self, widget_kind: &'static str) -> EventView {
        EventView {
            widget: self.widget,
            widget_kind,
            event_type: self.event_type.clone(),
            priority: self.priority,
            payload: self.payload.clone(),
            value: self.value.clone(),
        }
    }
}

/// Ordered subscription list for one (widget, event-type) pair. Always
/// sorted by descending priority; ties keep registration order. Order is
/// maintained by insertion position, so the invariant holds by construction.
#[derive(Default)]
pub(crate) struct Subscriptions {
    /// Records in dispatch order.
    records: Vec<EventRecord>,
}

impl Subscriptions {
    /// Insert a record, keeping descending priority and stable tie order:
    /// the record goes immediately before the first existing record of
    /// strictly lower priority.
    pub(crate) fn insert(&mut self, record: EventRecord) {
        let at = self
            .records
            .iter()
            .position(|r| r.priority < record.priority)
            .unwrap_or(self.records.len());
        self.records.insert(at, record);
    }

    /// Remove the record with the given serial. Returns true if found.
    pub(crate) fn remove(&mut self, serial: u64) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.serial != serial);
        self.records.len() != before
    }

    /// Number of live records.
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records remain.
    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serials in dispatch order. Dispatch iterates serials rather than
    /// records so a callback that mutates the list mid-flight cannot
    /// invalidate the traversal.
    pub(crate) fn serials(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.serial).collect()
    }

    /// Mutable access to a record by serial.
    pub(crate) fn get_mut(&mut self, serial: u64) -> Option<&mut EventRecord> {
        self.records.iter_mut().find(|r| r.serial == serial)
    }

    /// Shared access to a record by serial.
    pub(crate) fn get(&self, serial: u64) -> Option<&EventRecord> {
        self.records.iter().find(|r| r.serial == serial)
    }

    /// The serial of the final record in dispatch order, if any.
    pub(crate) fn last_serial(&self) -> Option<u64> {
        self.records.last().map(|r| r.serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A record with an inert callback, for ordering tests.
    fn rec(widget: WidgetId, priority: i32, serial: u64) -> EventRecord {
        EventRecord {
            widget,
            event_type: EventType::resize(),
            priority,
            arg_mode: ArgMode::NoArgs,
            callback: Some(Box::new(|_, _| Ok(Value::None))),
            callback_name: "test".into(),
            filter: None,
            payload: Payload::None,
            value: Value::None,
            canceled: false,
            force_return: None,
            after_triggered: None,
            serial,
        }
    }

    #[test]
    fn insert_orders_by_descending_priority() {
        let mut subs = Subscriptions::default();
        let w = WidgetId::default();
        subs.insert(rec(w, 0, 1));
        subs.insert(rec(w, 10, 2));
        subs.insert(rec(w, 5, 3));
        assert_eq!(subs.serials(), vec![2, 3, 1]);
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        let mut subs = Subscriptions::default();
        let w = WidgetId::default();
        subs.insert(rec(w, 5, 1));
        subs.insert(rec(w, 5, 2));
        subs.insert(rec(w, 5, 3));
        subs.insert(rec(w, 7, 4));
        assert_eq!(subs.serials(), vec![4, 1, 2, 3]);
    }

    #[test]
    fn remove_by_serial() {
        let mut subs = Subscriptions::default();
        let w = WidgetId::default();
        subs.insert(rec(w, 1, 1));
        subs.insert(rec(w, 2, 2));
        assert!(subs.remove(1));
        assert!(!subs.remove(1));
        assert_eq!(subs.len(), 1);
        assert_eq!(subs.last_serial(), Some(2));
    }
}
