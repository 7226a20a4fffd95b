use std::{result::Result as StdResult, sync::mpsc};

use thiserror::Error;

use crate::id::WidgetId;

/// Result type for pergola operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type. Every variant is fail-fast: nothing here is retried. The
/// one recovered condition in the crate, a filter returning the cancel
/// variant, is ordinary control flow rather than an error.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    /// A widget was constructed under a parent that cannot hold children of
    /// that kind.
    #[error("invalid widget kind: cannot create {kind} under {parent_kind}")]
    InvalidWidgetKind {
        /// Kind of the widget being created.
        kind: &'static str,
        /// Kind of the intended parent.
        parent_kind: &'static str,
    },

    /// The native toolkit refused a bind call. Surfaced at subscribe time.
    #[error("bind {event_type} on {widget_kind} failed: {reason}")]
    Bind {
        /// Kind of the widget being bound.
        widget_kind: &'static str,
        /// Event type name passed to the toolkit.
        event_type: String,
        /// Toolkit-reported failure reason.
        reason: String,
    },

    /// A subscriber callback failed during dispatch. Carries the full
    /// diagnostic context of the failing subscription.
    #[error(
        "event callback {callback} failed: widget={widget_kind} event={event_type} \
         priority={priority} args={payload} value={value}: {source}"
    )]
    EventExecutor {
        /// Qualified name of the bound callback.
        callback: String,
        /// Kind of the widget that owns the subscription.
        widget_kind: &'static str,
        /// Event type being dispatched.
        event_type: String,
        /// Priority of the failing subscription.
        priority: i32,
        /// Raw native args at the time of failure.
        payload: String,
        /// Decrypted value at the time of failure.
        value: String,
        /// The underlying callback error.
        #[source]
        source: Box<Error>,
    },

    /// A layout constraint failed validation. Raised before any geometry is
    /// computed.
    #[error("constraint: {0}")]
    Constraint(String),

    /// An operation was attempted on a widget that has been torn down.
    #[error("use after destroy: {0:?}")]
    UseAfterDestroy(WidgetId),

    /// Internal invariant failure.
    #[error("internal: {0}")]
    Internal(String),

    /// Run loop failure.
    #[error("runloop: {0}")]
    RunLoop(String),
}

impl From<mpsc::RecvError> for Error {
    fn from(e: mpsc::RecvError) -> Self {
        Self::RunLoop(e.to_string())
    }
}
