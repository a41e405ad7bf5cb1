//! Coalescing rate limiter for persistence calls.
//!
//! At most one callback is started per cool-down window. The first request in an idle period runs
//! right away, the next one is parked until the window ends, and any further request made while
//! one is parked is answered with `Ok(None)` without running.
//!
//! Nothing here owns a real timer: [`DebouncedScheduler::poll`] must be called periodically (for
//! example each frame, or after sleeping until [`DebouncedScheduler::deadline`]) and compares the
//! injected [`Clock`] against the running deadline.

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};
use futures::task::{Spawn, SpawnExt};
use log::{trace, warn};
use parking_lot::Mutex;
use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

pub type UpdateFuture<T, E> = BoxFuture<'static, Result<T, E>>;
pub type UpdateCallback<T, E> = Box<dyn FnOnce() -> UpdateFuture<T, E> + Send>;
pub type DefaultCallback<T, E> = Arc<dyn Fn() -> UpdateFuture<T, E> + Send + Sync>;
/// Settles with `Ok(Some(_))` once the callback finished, `Ok(None)` if the request was dropped.
pub type UpdateHandle<T, E> = BoxFuture<'static, Result<Option<T>, UpdateError<E>>>;

/// A queued update that was withdrawn before it started.
#[derive(Error, Debug)]
#[error("queued update was cancelled")]
pub struct TimeoutError {
    #[source]
    pub cause: Option<Box<dyn Error + Send + Sync>>,
}

#[derive(Error, Debug)]
pub enum UpdateError<E> {
    #[error(transparent)]
    Cancelled(#[from] TimeoutError),
    #[error("update failed: {0}")]
    Failed(E),
    /// The scheduler was dropped, or the executor refused the task, before the update ran.
    #[error("update abandoned before it could run")]
    Abandoned,
}

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock {
            origin: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    /// Time passed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// No timer running, nothing queued.
    Idle,
    /// Timer running, nothing queued.
    Waiting,
    /// Timer running, one update queued.
    Pending,
}

enum Phase<T, E> {
    Idle,
    Waiting {
        deadline: Instant,
    },
    Pending {
        deadline: Instant,
        queued: QueuedUpdate<T, E>,
    },
}

struct QueuedUpdate<T, E> {
    callback: UpdateCallback<T, E>,
    reply: oneshot::Sender<Result<T, UpdateError<E>>>,
}

/// One instance per persisted object; unrelated objects must not share a scheduler.
///
/// A queued callback starts when the cool-down ends even if the previous one is still running,
/// so a callback slower than the cool-down can finish after the next one.
pub struct DebouncedScheduler<T, E, C, S> {
    cooldown: Duration,
    clock: C,
    spawner: S,
    default_callback: DefaultCallback<T, E>,
    phase: Phase<T, E>,
}

impl<T, E, C, S> DebouncedScheduler<T, E, C, S>
where
    T: Send + 'static,
    E: Send + 'static,
    C: Clock,
    S: Spawn,
{
    pub fn new(
        cooldown: Duration,
        clock: C,
        spawner: S,
        default_callback: DefaultCallback<T, E>,
    ) -> Self {
        DebouncedScheduler {
            cooldown,
            clock,
            spawner,
            default_callback,
            phase: Phase::Idle,
        }
    }

    /// Request a run of the default callback.
    pub fn update(&mut self) -> UpdateHandle<T, E> {
        let callback = self.default_callback.clone();
        self.update_with(Box::new(move || callback()))
    }

    pub fn update_with(&mut self, callback: UpdateCallback<T, E>) -> UpdateHandle<T, E> {
        let now = self.clock.now();
        self.fire_expired(now);
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {
                trace!("Scheduler: idle, running update now");
                self.phase = Phase::Waiting {
                    deadline: now + self.cooldown,
                };
                let (reply, rx) = oneshot::channel();
                self.dispatch(callback, reply);
                settle(rx)
            }
            Phase::Waiting { deadline } => {
                trace!("Scheduler: waiting, queueing update");
                let (reply, rx) = oneshot::channel();
                self.phase = Phase::Pending {
                    deadline,
                    queued: QueuedUpdate { callback, reply },
                };
                settle(rx)
            }
            pending @ Phase::Pending { .. } => {
                trace!("Scheduler: update already queued, dropping request");
                self.phase = pending;
                future::ready(Ok(None)).boxed()
            }
        }
    }

    /// Fire the timer if its deadline has passed.
    pub fn poll(&mut self) {
        let now = self.clock.now();
        self.fire_expired(now);
    }

    /// Reject the queued update, if any. A running timer is left alone.
    pub fn cancel_update(&mut self, cause: Option<Box<dyn Error + Send + Sync>>) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Pending { deadline, queued } => {
                trace!("Scheduler: cancelling queued update");
                self.phase = Phase::Waiting { deadline };
                let _ = queued.reply.send(Err(TimeoutError { cause }.into()));
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        match self.phase {
            Phase::Idle => SchedulerPhase::Idle,
            Phase::Waiting { .. } => SchedulerPhase::Waiting,
            Phase::Pending { .. } => SchedulerPhase::Pending,
        }
    }

    /// When the running timer expires, `None` when idle.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Idle => None,
            Phase::Waiting { deadline } | Phase::Pending { deadline, .. } => Some(deadline),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn fire_expired(&mut self, now: Instant) {
        self.phase = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Waiting { deadline } if now >= deadline => {
                trace!("Scheduler: timer expired, idle");
                Phase::Idle
            }
            Phase::Pending { deadline, queued } if now >= deadline => {
                trace!("Scheduler: timer expired, running queued update");
                self.dispatch(queued.callback, queued.reply);
                Phase::Waiting {
                    deadline: now + self.cooldown,
                }
            }
            other => other,
        };
    }

    /// Start the callback and forward its outcome to `reply`.
    fn dispatch(
        &self,
        callback: UpdateCallback<T, E>,
        reply: oneshot::Sender<Result<T, UpdateError<E>>>,
    ) {
        let update = callback();
        let task = async move {
            let result = update.await.map_err(UpdateError::Failed);
            let _ = reply.send(result);
        };
        if let Err(e) = self.spawner.spawn(task) {
            warn!("Scheduler: could not spawn update: {e}");
        }
    }
}

fn settle<T, E>(rx: oneshot::Receiver<Result<T, UpdateError<E>>>) -> UpdateHandle<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    rx.map(|reply| match reply {
        Ok(result) => result.map(Some),
        Err(oneshot::Canceled) => Err(UpdateError::Abandoned),
    })
    .boxed()
}
