//! Pergola: the event-dispatch and relative-layout core of a desktop widget
//! toolkit.
//!
//! Pergola sits between application code and a native windowing toolkit. It
//! provides two tightly coupled engines shared by every widget:
//!
//! - a priority-ordered, cancelable event dispatch core: one native binding
//!   per (widget, event-type) pair fans out to an ordered subscription list,
//!   and a high-priority subscriber's filter can veto the rest of the
//!   dispatch;
//! - a percentage-based relative layout engine that recomputes absolute
//!   pixel geometry for a whole widget subtree whenever a container is
//!   resized, with the recomputation itself triggered and filtered through
//!   the dispatch core.
//!
//! Widgets live in a flat arena owned by the root window and are addressed
//! by opaque [`WidgetId`]. The native toolkit is consumed through the
//! [`Toolkit`] trait and never leaks past it.
//!
//! # Quick start
//!
//! The main entry points are:
//! - [`Core`] - the arena, dispatch engine, scheduler, and layout driver
//! - [`Place`] - a widget's relative placement constraint
//! - [`RunLoop`] - the single-threaded blocking loop that drives everything

#![warn(missing_docs)]

/// The native toolkit boundary.
pub mod backend;
/// Core error types.
pub mod error;
/// Event dispatch types.
pub mod event;
/// Pixel geometry primitives.
pub mod geom;
/// Relative layout constraints and geometry computation.
pub mod layout;
/// Run loop and background wake helper.
pub mod run;
/// Widget kinds.
pub mod widget;

/// The arena and its engines.
mod core;
/// Arena id types.
mod id;
/// Deferred task records.
mod sched;
/// Toolkit test double.
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::{
    backend::{Anchor, TimerHandle, Toolkit},
    core::Core,
    error::{Error, Result},
    event::{Arg, ArgMode, BindOpts, BindingId, EventType, EventView, Filtered, Payload, Value},
    geom::{Expanse, Point, Rect},
    id::{TaskId, WidgetId},
    layout::{Place, resolve},
    run::{Looper, NativeEvent, RunLoop},
    sched::TaskCallback,
    widget::{Orientation, WidgetKind},
};
