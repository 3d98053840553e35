//! Periodic tasks that move the service forward in time.
//!
//! The [`Scheduler`] owns two independent timelines:
//!
//! - **Status tick**: ask the [`StatusSource`] for a delta, apply it with
//!   [`StateStore::advance`], broadcast `NETWORK_UPDATE`.
//! - **Event tick**: poll the [`EventSource`]; when it yields an event,
//!   [`StateStore::append_event`] it and broadcast `AUDIT_EVENT` carrying
//!   only that event.
//!
//! Each timeline is its own Tokio task with its own cancel switch. The
//! first tick fires one full period after spawn; missed ticks are delayed
//! rather than bursted. Every tick body runs inside a failure boundary:
//! a source error or a panic is logged and the next tick runs as usual.
//!
//! Delivery is delegated to a [`Broadcaster`], so this crate has no
//! knowledge of sockets or observers.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use beacon_types::{AuditEvent, NetworkStatus, ServerMessage};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::source::{EventSource, SourceError, StatusSource};
use crate::store::StateStore;

/// Fan-out target for scheduler output.
///
/// Implementations must not block: the call happens on the tick path.
pub trait Broadcaster: Send + Sync {
    /// Deliver `message` to every live observer, best effort.
    ///
    /// Returns the number of observers that accepted the message.
    fn broadcast(&self, message: &ServerMessage) -> usize;
}

/// A broadcaster with no observers.
pub struct NoOpBroadcaster;

impl Broadcaster for NoOpBroadcaster {
    fn broadcast(&self, _message: &ServerMessage) -> usize {
        0
    }
}

/// Errors that abort a single tick. The task itself keeps running.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The data source failed.
    #[error("source error: {source}")]
    Source {
        /// The underlying source error.
        #[from]
        source: SourceError,
    },

    /// The tick body panicked.
    #[error("tick panicked: {message}")]
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
}

/// Drives the store from the configured sources.
#[derive(Clone)]
pub struct Scheduler {
    store: Arc<StateStore>,
    broadcaster: Arc<dyn Broadcaster>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler over `store` that publishes through
    /// `broadcaster`.
    pub const fn new(
        store: Arc<StateStore>,
        broadcaster: Arc<dyn Broadcaster>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            broadcaster,
            config,
        }
    }

    /// Run one status tick.
    pub fn status_tick(&self, source: &mut dyn StatusSource) -> Result<NetworkStatus, TickError> {
        let current = self.store.network_status();
        let delta = source.next_delta(&current)?;
        let status = self.store.advance(delta);

        let delivered = self
            .broadcaster
            .broadcast(&ServerMessage::NetworkUpdate(status.clone()));
        debug!(
            block_height = status.block_height,
            tps = status.tps,
            peers = status.peers,
            delivered,
            "Status tick"
        );

        Ok(status)
    }

    /// Run one event tick. Returns the recorded event, if any.
    pub fn event_tick(&self, source: &mut dyn EventSource) -> Result<Option<AuditEvent>, TickError> {
        let Some(event) = source.poll_event()? else {
            return Ok(None);
        };

        self.store.append_event(event.clone());
        let delivered = self
            .broadcaster
            .broadcast(&ServerMessage::AuditEvent(event.clone()));
        info!(
            event_id = %event.id,
            direction = ?event.direction,
            status = ?event.status,
            source = event.source,
            target = event.target,
            delivered,
            "Audit event recorded"
        );

        Ok(Some(event))
    }

    /// Start both periodic tasks on the current Tokio runtime.
    pub fn spawn(
        &self,
        mut status_source: Box<dyn StatusSource>,
        mut event_source: Box<dyn EventSource>,
    ) -> SchedulerHandle {
        let status = {
            let scheduler = self.clone();
            PeriodicTask::spawn("status", self.config.status_interval(), move || {
                scheduler
                    .status_tick(status_source.as_mut())
                    .map(|_status| ())
            })
        };

        let events = {
            let scheduler = self.clone();
            PeriodicTask::spawn("events", self.config.event_interval(), move || {
                scheduler.event_tick(event_source.as_mut()).map(|_event| ())
            })
        };

        info!(
            status_interval_ms = self.config.status_interval_ms,
            event_interval_ms = self.config.event_interval_ms,
            "Scheduler started"
        );

        SchedulerHandle { status, events }
    }
}

/// Handles to both periodic tasks.
#[derive(Debug)]
pub struct SchedulerHandle {
    status: PeriodicTask,
    events: PeriodicTask,
}

impl SchedulerHandle {
    /// The status tick task.
    pub const fn status(&self) -> &PeriodicTask {
        &self.status
    }

    /// The event tick task.
    pub const fn events(&self) -> &PeriodicTask {
        &self.events
    }

    /// Cancel both tasks and wait for them to exit.
    pub async fn shutdown(self) {
        self.status.cancel();
        self.events.cancel();
        self.status.join().await;
        self.events.join().await;
        info!("Scheduler stopped");
    }
}

/// One cancellable periodic task.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    cancel: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl PeriodicTask {
    fn spawn<F>(name: &'static str, period: Duration, tick: F) -> Self
    where
        F: FnMut() -> Result<(), TickError> + Send + 'static,
    {
        let (cancel, cancelled) = watch::channel(false);
        let join = tokio::spawn(run_periodic(name, period, cancelled, tick));
        Self { name, cancel, join }
    }

    /// Task name used in logs.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Ask the task to stop after its current tick.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to exit.
    pub async fn join(self) {
        if let Err(e) = self.join.await {
            warn!(task = self.name, error = %e, "Periodic task ended abnormally");
        }
    }
}

async fn run_periodic<F>(
    name: &'static str,
    period: Duration,
    mut cancelled: watch::Receiver<bool>,
    mut tick: F,
) where
    F: FnMut() -> Result<(), TickError>,
{
    // interval_at panics on a zero period
    let period = period.max(Duration::from_millis(1));
    let first = Instant::now()
        .checked_add(period)
        .unwrap_or_else(Instant::now);
    let mut interval = time::interval_at(first, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(
        task = name,
        period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
        "Periodic task started"
    );

    loop {
        tokio::select! {
            biased;
            changed = cancelled.changed() => {
                if changed.is_err() || *cancelled.borrow() {
                    break;
                }
            }
            _ = interval.tick() => {
                if let Err(e) = run_guarded(&mut tick) {
                    warn!(task = name, error = %e, "Tick failed, continuing on next tick");
                }
            }
        }
    }

    debug!(task = name, "Periodic task stopped");
}

fn run_guarded<F>(tick: &mut F) -> Result<(), TickError>
where
    F: FnMut() -> Result<(), TickError>,
{
    panic::catch_unwind(AssertUnwindSafe(tick)).unwrap_or_else(|payload| {
        Err(TickError::Panicked {
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::num::NonZeroU64;
    use std::sync::Mutex;

    use super::*;
    use crate::config::EventConfig;
    use crate::source::SyntheticEvents;
    use crate::store::StatusDelta;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<ServerMessage>>,
    }

    impl Recorder {
        fn count(&self, kind: &str) -> usize {
            self.messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.kind() == kind)
                .count()
        }

        fn all(&self) -> Vec<ServerMessage> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl Broadcaster for Recorder {
        fn broadcast(&self, message: &ServerMessage) -> usize {
            self.messages.lock().unwrap().push(message.clone());
            1
        }
    }

    struct FixedStep;

    impl StatusSource for FixedStep {
        fn next_delta(&mut self, current: &NetworkStatus) -> Result<StatusDelta, SourceError> {
            Ok(StatusDelta {
                height_increment: NonZeroU64::MIN,
                tps: 1000,
                peers: current.peers,
            })
        }
    }

    /// Fails on every other call, starting with the first.
    #[derive(Default)]
    struct Flaky {
        succeed_next: bool,
    }

    impl StatusSource for Flaky {
        fn next_delta(&mut self, current: &NetworkStatus) -> Result<StatusDelta, SourceError> {
            let succeed = self.succeed_next;
            self.succeed_next = !succeed;
            if !succeed {
                return Err(SourceError::Unavailable(String::from("feed offline")));
            }
            FixedStep.next_delta(current)
        }
    }

    /// Panics on the first call only.
    #[derive(Default)]
    struct PanicsOnce {
        called: bool,
    }

    impl StatusSource for PanicsOnce {
        fn next_delta(&mut self, current: &NetworkStatus) -> Result<StatusDelta, SourceError> {
            if !self.called {
                self.called = true;
                panic!("bad tick");
            }
            FixedStep.next_delta(current)
        }
    }

    struct NoEvents;

    impl EventSource for NoEvents {
        fn poll_event(&mut self) -> Result<Option<AuditEvent>, SourceError> {
            Ok(None)
        }
    }

    struct BrokenEvents;

    impl EventSource for BrokenEvents {
        fn poll_event(&mut self) -> Result<Option<AuditEvent>, SourceError> {
            Err(SourceError::Unavailable(String::from("no feed")))
        }
    }

    fn every_tick_events() -> SyntheticEvents {
        let config = EventConfig {
            probability: 1.0,
            ..EventConfig::default()
        };
        SyntheticEvents::seeded(&config, "hybrid", 9)
    }

    fn fixture() -> (Arc<StateStore>, Arc<Recorder>, Scheduler) {
        let store = Arc::new(StateStore::default());
        let recorder = Arc::new(Recorder::default());
        let scheduler = Scheduler::new(
            Arc::clone(&store),
            Arc::clone(&recorder) as Arc<dyn Broadcaster>,
            SchedulerConfig::default(),
        );
        (store, recorder, scheduler)
    }

    async fn sleep_ms(ms: u64) {
        time::sleep(Duration::from_millis(ms)).await;
    }

    // -----------------------------------------------------------------------
    // Single ticks
    // -----------------------------------------------------------------------

    #[test]
    fn status_tick_advances_then_broadcasts_new_status() {
        let (store, recorder, scheduler) = fixture();
        let status = scheduler.status_tick(&mut FixedStep).unwrap();

        assert_eq!(status.block_height, 2_847_694);
        assert_eq!(store.network_status(), status);
        assert_eq!(recorder.all(), vec![ServerMessage::NetworkUpdate(status)]);
    }

    #[test]
    fn ticks_still_mutate_with_nobody_listening() {
        let store = Arc::new(StateStore::default());
        let scheduler = Scheduler::new(
            Arc::clone(&store),
            Arc::new(NoOpBroadcaster),
            SchedulerConfig::default(),
        );
        scheduler.status_tick(&mut FixedStep).unwrap();
        scheduler.event_tick(&mut every_tick_events()).unwrap();
        assert_eq!(store.network_status().block_height, 2_847_694);
        assert_eq!(store.audit_len(), 1);
    }

    #[test]
    fn event_tick_appends_and_broadcasts_single_event() {
        let (store, recorder, scheduler) = fixture();
        let event = scheduler
            .event_tick(&mut every_tick_events())
            .unwrap()
            .unwrap();

        assert_eq!(store.audit_events(), vec![event.clone()]);
        assert_eq!(recorder.all(), vec![ServerMessage::AuditEvent(event)]);
    }

    #[test]
    fn quiet_event_tick_changes_nothing() {
        let (store, recorder, scheduler) = fixture();
        assert!(scheduler.event_tick(&mut NoEvents).unwrap().is_none());
        assert!(store.audit_events().is_empty());
        assert!(recorder.all().is_empty());
    }

    #[test]
    fn failed_event_tick_leaves_store_untouched() {
        let (store, recorder, scheduler) = fixture();
        let err = scheduler.event_tick(&mut BrokenEvents).unwrap_err();
        assert!(matches!(err, TickError::Source { .. }));
        assert_eq!(store.audit_len(), 0);
        assert!(recorder.all().is_empty());
    }

    #[test]
    fn guarded_tick_turns_panic_into_error() {
        let mut tick = || -> Result<(), TickError> { panic!("boom") };
        let err = run_guarded(&mut tick).unwrap_err();
        assert!(matches!(err, TickError::Panicked { ref message } if message == "boom"));
    }

    // -----------------------------------------------------------------------
    // Spawned timelines
    // -----------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn first_status_tick_fires_after_one_period() {
        let (store, recorder, scheduler) = fixture();
        let handle = scheduler.spawn(Box::new(FixedStep), Box::new(NoEvents));

        sleep_ms(4_999).await;
        assert_eq!(recorder.count("NETWORK_UPDATE"), 0);

        sleep_ms(2).await;
        assert_eq!(recorder.count("NETWORK_UPDATE"), 1);
        assert_eq!(store.network_status().block_height, 2_847_694);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cadences_are_independent() {
        let (store, recorder, scheduler) = fixture();
        let handle = scheduler.spawn(Box::new(FixedStep), Box::new(every_tick_events()));

        sleep_ms(30_500).await;
        assert_eq!(recorder.count("NETWORK_UPDATE"), 6);
        assert_eq!(recorder.count("AUDIT_EVENT"), 3);
        assert_eq!(store.audit_len(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failing_ticks_do_not_stop_the_task() {
        let (store, recorder, scheduler) = fixture();
        let handle = scheduler.spawn(Box::new(Flaky::default()), Box::new(BrokenEvents));

        sleep_ms(20_500).await;
        // ticks 1 and 3 fail, 2 and 4 succeed
        assert_eq!(recorder.count("NETWORK_UPDATE"), 2);
        assert_eq!(store.network_status().block_height, 2_847_695);
        assert!(!handle.status().is_finished());
        assert!(!handle.events().is_finished());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_tick_does_not_stop_the_task() {
        let (_store, recorder, scheduler) = fixture();
        let handle = scheduler.spawn(Box::new(PanicsOnce::default()), Box::new(NoEvents));

        sleep_ms(15_500).await;
        assert_eq!(recorder.count("NETWORK_UPDATE"), 2);
        assert!(!handle.status().is_finished());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_both_tasks() {
        let (_store, recorder, scheduler) = fixture();
        let handle = scheduler.spawn(Box::new(FixedStep), Box::new(every_tick_events()));

        sleep_ms(10_500).await;
        let before = recorder.all().len();
        handle.shutdown().await;

        sleep_ms(60_000).await;
        assert_eq!(recorder.all().len(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_one_task_leaves_the_other_running() {
        let (_store, recorder, scheduler) = fixture();
        let handle = scheduler.spawn(Box::new(FixedStep), Box::new(every_tick_events()));

        handle.events().cancel();
        sleep_ms(20_500).await;

        assert_eq!(recorder.count("AUDIT_EVENT"), 0);
        assert_eq!(recorder.count("NETWORK_UPDATE"), 4);
        assert!(handle.events().is_finished());
        assert!(!handle.status().is_finished());

        handle.shutdown().await;
    }
}
