//! Deferred and repeating task records.
//!
//! A task wraps the toolkit's single-shot timer. Repeating tasks re-arm
//! themselves after each fire; dynamic tasks subtract the callback's own
//! running time from the nominal delay so a periodic loop stays
//! approximately on cadence. The firing driver lives on the core; this
//! module holds the record and the pure re-arm computation.

use std::time::Duration;

use crate::{backend::TimerHandle, core::Core, error::Result, id::WidgetId};

/// A deferred task callback. Runs on the UI thread with exclusive access to
/// the core.
pub type TaskCallback = Box<dyn FnMut(&mut Core) -> Result<()>>;

/// A scheduled task record.
pub(crate) struct Task {
    /// Widget whose teardown cancels this task.
    pub(crate) owner: WidgetId,
    /// Nominal delay between fires.
    pub(crate) delay: Duration,
    /// Re-arm after each fire.
    pub(crate) repeat: bool,
    /// Subtract callback running time from the next delay.
    pub(crate) dynamic: bool,
    /// The callback. Taken out of the slot for the duration of a fire.
    pub(crate) callback: Option<TaskCallback>,
    /// Handle for the currently armed native timer, if any.
    pub(crate) handle: Option<TimerHandle>,
}

/// The delay for the next arming of a repeating task. Dynamic tasks stay on
/// cadence by subtracting the elapsed callback time, saturating at zero.
pub(crate) fn rearm_delay(nominal: Duration, elapsed: Duration, dynamic: bool) -> Duration {
    if dynamic {
        nominal.saturating_sub(elapsed)
    } else {
        nominal
    }
}
