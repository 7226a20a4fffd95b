//! The native toolkit boundary.
//!
//! Everything the core needs from the windowing system goes through the
//! [`Toolkit`] trait: widget creation, one native bind per (widget,
//! event-type) pair, single-shot timers, measured-size queries, and the one
//! placement primitive the layout engine uses. Alternate native layout
//! managers are deliberately not represented here.

use std::time::Duration;

use crate::{
    error::Result,
    event::EventType,
    geom::{Expanse, Rect},
    id::{TaskId, WidgetId},
    widget::WidgetKind,
};

/// Placement anchor for the native place primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Anchor the rect by its top-left corner.
    #[default]
    NorthWest,
    /// Anchor by the top-right corner.
    NorthEast,
    /// Anchor by the bottom-left corner.
    SouthWest,
    /// Anchor by the bottom-right corner.
    SouthEast,
    /// Anchor by the center.
    Center,
}

/// Opaque handle for an armed native timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// The native windowing toolkit, as consumed by this core.
///
/// The core calls `bind` at most once per (widget, event-type) pair, and
/// `place` is the only placement primitive it ever uses. `measured` reflects
/// the toolkit's last completed layout pass, not any pending geometry.
pub trait Toolkit {
    /// Create the native widget backing an arena node.
    fn create(&mut self, widget: WidgetId, kind: &WidgetKind, parent: Option<WidgetId>)
    -> Result<()>;

    /// Bind the dispatcher as the single native callback for a (widget,
    /// event-type) pair. An event type the toolkit does not support for this
    /// widget kind fails with [`crate::error::Error::Bind`]; the failure is
    /// fatal and never retried.
    fn bind(&mut self, widget: WidgetId, kind: &WidgetKind, event_type: &EventType) -> Result<()>;

    /// Release the native callback for a pair.
    fn unbind(&mut self, widget: WidgetId, event_type: &EventType);

    /// Arm a single-shot timer that delivers the task id back to the run
    /// loop after `delay`.
    fn after(&mut self, delay: Duration, task: TaskId) -> TimerHandle;

    /// Cancel an armed timer. Best-effort: a timer that has already fired
    /// into the event channel still delivers.
    fn after_cancel(&mut self, handle: TimerHandle);

    /// The widget's currently measured size, per the toolkit's last
    /// completed layout pass.
    fn measured(&self, widget: WidgetId) -> Expanse;

    /// Place a widget at an absolute rect within its parent.
    fn place(&mut self, widget: WidgetId, rect: Rect, anchor: Anchor);

    /// Destroy the native widget.
    fn destroy(&mut self, widget: WidgetId);
}
