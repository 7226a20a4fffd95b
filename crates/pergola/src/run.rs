//! The UI run loop and the background wake helper.
//!
//! Everything in the core executes on one thread, driven by a blocking loop
//! over an event channel. Deferred execution means scheduling a future
//! callback on that same loop, never spawning a thread. The one permitted
//! auxiliary thread is the [`Looper`], which only ever sends work into the
//! channel; it never touches widget or layout state directly.

use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    sync::{Arc, Mutex, mpsc},
    thread,
    time::{Duration, Instant},
};

use tracing::trace;

use crate::{
    core::Core,
    error::Result,
    event::{EventType, Payload},
    id::{TaskId, WidgetId},
};

/// Work marshaled onto the UI thread from elsewhere.
pub type Work = Box<dyn FnOnce(&mut Core) -> Result<()> + Send>;

/// An envelope delivered to the run loop.
pub enum NativeEvent {
    /// A native widget event to dispatch.
    Widget {
        /// Target widget.
        widget: WidgetId,
        /// Event type.
        event_type: EventType,
        /// Raw native args.
        payload: Payload,
    },
    /// A timer fire for a scheduled task.
    Timer(TaskId),
    /// Marshaled work from another thread.
    Work(Work),
    /// Stop the loop.
    Quit,
}

/// The single-threaded blocking loop that owns the core and routes events
/// into dispatch and task firing.
pub struct RunLoop {
    /// The core, owned for the lifetime of the loop.
    core: Core,
    /// Event receiver.
    rx: mpsc::Receiver<NativeEvent>,
    /// Event sender, cloned out to event sources.
    tx: mpsc::Sender<NativeEvent>,
}

impl RunLoop {
    /// Construct a run loop around a core.
    pub fn new(core: Core) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { core, rx, tx }
    }

    /// A sender for delivering events into the loop.
    pub fn sender(&self) -> mpsc::Sender<NativeEvent> {
        self.tx.clone()
    }

    /// Shared access to the core.
    pub fn core(&self) -> &Core {
        &self.core
    }

    /// Exclusive access to the core.
    pub fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    /// Consume the loop, returning the core.
    pub fn into_core(self) -> Core {
        self.core
    }

    /// Process events until [`NativeEvent::Quit`] arrives or every sender
    /// disconnects. Errors are fail-fast: the first dispatch or task error
    /// stops the loop and propagates.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let event = self.rx.recv()?;
            if !self.handle(event)? {
                trace!("run loop stopped");
                return Ok(());
            }
        }
    }

    /// Process a single already-received event. Returns false on quit.
    pub fn step(&mut self, event: NativeEvent) -> Result<bool> {
        self.handle(event)
    }

    /// Route one event.
    fn handle(&mut self, event: NativeEvent) -> Result<bool> {
        match event {
            NativeEvent::Widget {
                widget,
                event_type,
                payload,
            } => {
                self.core.dispatch(widget, &event_type, payload)?;
            }
            NativeEvent::Timer(task) => {
                self.core.fire_task(task)?;
            }
            NativeEvent::Work(work) => {
                work(&mut self.core)?;
            }
            NativeEvent::Quit => return Ok(false),
        }
        Ok(true)
    }
}

/// A wake scheduled for a future instant.
struct Wake {
    /// When to deliver.
    time: Instant,
    /// Work to send into the loop.
    work: Work,
}

impl PartialEq for Wake {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time
    }
}

impl Eq for Wake {}

/// Reverse order so the soonest wake is at the top of the heap.
impl PartialOrd for Wake {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reverse order so the soonest wake is at the top of the heap.
impl Ord for Wake {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.cmp(&self.time)
    }
}

/// Pending wakes shared with the helper thread.
#[derive(Default)]
struct WakeHeap {
    /// Wakes ordered soonest-first.
    wakes: BinaryHeap<Wake>,
}

impl WakeHeap {
    /// Add a wake relative to an explicit time base.
    fn add_at(&mut self, now: Instant, delay: Duration, work: Work) {
        self.wakes.push(Wake {
            time: now + delay,
            work,
        });
    }

    /// Wait time until the soonest wake: None when idle, zero when overdue.
    fn current_wait(&self, now: Instant) -> Option<Duration> {
        self.wakes.peek().map(|top| {
            top.time
                .checked_duration_since(now)
                .unwrap_or(Duration::ZERO)
        })
    }

    /// Remove and return every due wake.
    fn collect(&mut self, now: Instant) -> Vec<Work> {
        let mut due = Vec::new();
        while let Some(top) = self.wakes.pop() {
            if top.time <= now {
                due.push(top.work);
            } else {
                self.wakes.push(top);
                break;
            }
        }
        due
    }
}

/// The background polling helper: a single thread that parks until the next
/// scheduled wake and sends the due work into the run loop channel. It holds
/// no widget state and performs no dispatch of its own.
pub struct Looper {
    /// Helper thread handle, spawned lazily on first schedule.
    handle: Option<thread::JoinHandle<()>>,
    /// Wake heap shared with the helper thread.
    pending: Arc<Mutex<WakeHeap>>,
    /// Run loop sender.
    tx: mpsc::Sender<NativeEvent>,
}

impl Looper {
    /// Construct a looper feeding the given run loop sender.
    pub fn new(tx: mpsc::Sender<NativeEvent>) -> Self {
        Self {
            handle: None,
            pending: Arc::new(Mutex::new(WakeHeap::default())),
            tx,
        }
    }

    /// Schedule work to be marshaled onto the UI thread after `delay`.
    pub fn schedule<F>(&mut self, delay: Duration, work: F)
    where
        F: FnOnce(&mut Core) -> Result<()> + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap();
        pending.add_at(Instant::now(), delay, Box::new(work));
        drop(pending);
        if let Some(h) = self.handle.as_mut() {
            h.thread().unpark();
        } else {
            let pending = self.pending.clone();
            let tx = self.tx.clone();
            self.handle = Some(thread::spawn(move || {
                loop {
                    // Taking the wait time in its own statement releases the
                    // lock before parking.
                    let wait = pending.lock().unwrap().current_wait(Instant::now());
                    if let Some(d) = wait {
                        thread::park_timeout(d);
                    } else {
                        thread::park();
                    }
                    let due = pending.lock().unwrap().collect(Instant::now());
                    for work in due {
                        if tx.send(NativeEvent::Work(work)).is_err() {
                            return;
                        }
                    }
                }
            }));
        }
    }
}
