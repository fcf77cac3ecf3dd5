//! Controller task lifecycle.
//!
//! Each controller runs as one tokio task that reacts to two sources: its own
//! periodic timer and its subscription to the shared camera event channel.
//! Starting a controller returns a [`Subscription`] owned by the caller.
//! Cancelling it ends the task; dropping it also releases the controller.
//!
//! ```text
//! MovementDetector ──broadcast──┐
//!                               ├──► select! ──► controller.on_camera_changed()
//! interval(tick_interval) ──────┘          └───► controller.tick()
//! CancellationToken ───────────────────────────► exit
//! ```
//!
//! The task never touches renderer state on exit. Restoring the renderer
//! happens synchronously through [`TimedController::shutdown`], called by the
//! controller's `stop()` and again when the subscription is dropped.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::camera::CameraSnapshot;

/// Shortest timer period a controller task will use.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Errors starting a controller task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// Called outside a tokio runtime.
    #[error("no tokio runtime is available to run the {0} controller")]
    NoRuntime(&'static str),

    /// The controller already has a live task.
    #[error("the {0} controller is already running")]
    AlreadyRunning(&'static str),
}

/// A controller driven by a timer and camera events.
///
/// Implementations use interior mutability; every method takes `&self` and
/// must not block.
pub trait TimedController: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Period of the evaluation timer.
    fn tick_interval(&self) -> Duration;

    /// Periodic evaluation.
    fn tick(&self);

    /// Camera-changed notification.
    fn on_camera_changed(&self, snapshot: &CameraSnapshot);

    /// Release every renderer override. Must be idempotent.
    fn shutdown(&self);
}

/// Caller-owned handle to a running controller task.
///
/// Dropping the subscription cancels the task and calls
/// [`TimedController::shutdown`], so the renderer is restored and the
/// controller can be started again.
pub struct Subscription {
    name: &'static str,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
    controller: Arc<dyn TimedController>,
}

impl Subscription {
    /// Name of the controller this subscription drives.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Signal the task to stop. Returns immediately and leaves the renderer
    /// untouched until the subscription is dropped.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the task is still running and has not been cancelled.
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled() && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the task and wait for it to exit.
    pub async fn join(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(
                    controller = self.name,
                    error = %e,
                    "Controller task ended abnormally"
                );
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
        self.controller.shutdown();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.name)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

/// Spawn the task that drives `controller`.
///
/// Must be called from within a tokio runtime; the task runs on that
/// runtime. A lagging event receiver is logged and skips ahead. A closed
/// event channel leaves the timer running.
pub fn spawn_controller<C: TimedController>(
    controller: Arc<C>,
    mut events: broadcast::Receiver<CameraSnapshot>,
) -> Result<Subscription, RuntimeError> {
    let name = controller.name();
    let handle = Handle::try_current().map_err(|_| RuntimeError::NoRuntime(name))?;

    let token = CancellationToken::new();
    let task_token = token.clone();
    let period = controller.tick_interval().max(MIN_TICK_INTERVAL);
    let owner: Arc<dyn TimedController> = controller.clone();

    let task = handle.spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events_closed = false;

        tracing::debug!(
            controller = name,
            period_ms = period.as_millis() as u64,
            "Controller task started"
        );

        loop {
            tokio::select! {
                biased;

                _ = task_token.cancelled() => break,

                _ = ticker.tick() => controller.tick(),

                event = events.recv(), if !events_closed => match event {
                    Ok(snapshot) => controller.on_camera_changed(&snapshot),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            controller = name,
                            skipped,
                            "Camera events lagged, skipping ahead"
                        );
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!(controller = name, "Camera event source closed");
                        events_closed = true;
                    }
                },
            }
        }

        tracing::debug!(controller = name, "Controller task stopped");
    });

    Ok(Subscription {
        name,
        token,
        task: Some(task),
        controller: owner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Cartesian3;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingController {
        ticks: AtomicUsize,
        events: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    impl CountingController {
        fn ticks(&self) -> usize {
            self.ticks.load(Ordering::SeqCst)
        }

        fn events(&self) -> usize {
            self.events.load(Ordering::SeqCst)
        }
    }

    impl TimedController for CountingController {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn tick_interval(&self) -> Duration {
            Duration::from_millis(100)
        }

        fn tick(&self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }

        fn on_camera_changed(&self, _snapshot: &CameraSnapshot) {
            self.events.fetch_add(1, Ordering::SeqCst);
        }

        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn snapshot() -> CameraSnapshot {
        CameraSnapshot::at(Cartesian3::new(0.0, 0.0, 6_400_000.0), 1_000.0)
    }

    #[test]
    fn test_spawn_without_runtime_fails() {
        let (_tx, rx) = broadcast::channel(4);
        let result = spawn_controller(Arc::new(CountingController::default()), rx);
        assert_eq!(result.unwrap_err(), RuntimeError::NoRuntime("counting"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_drives_ticks() {
        let controller = Arc::new(CountingController::default());
        let (_tx, rx) = broadcast::channel(4);
        let sub = spawn_controller(Arc::clone(&controller), rx).unwrap();

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!((3..=4).contains(&controller.ticks()), "ticks = {}", controller.ticks());
        assert!(sub.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_are_delivered() {
        let controller = Arc::new(CountingController::default());
        let (tx, rx) = broadcast::channel(4);
        let _sub = spawn_controller(Arc::clone(&controller), rx).unwrap();

        tx.send(snapshot()).unwrap();
        tx.send(snapshot()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(controller.events(), 2);
        assert_eq!(controller.ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_task() {
        let controller = Arc::new(CountingController::default());
        let (_tx, rx) = broadcast::channel(4);
        let sub = spawn_controller(Arc::clone(&controller), rx).unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        sub.cancel();
        assert!(!sub.is_active());

        let ticks = controller.ticks();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(controller.ticks(), ticks);
        assert_eq!(controller.shutdowns.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task_and_shuts_down() {
        let controller = Arc::new(CountingController::default());
        let (_tx, rx) = broadcast::channel(4);
        let sub = spawn_controller(Arc::clone(&controller), rx).unwrap();
        drop(sub);
        assert_eq!(controller.shutdowns.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(controller.ticks(), 0);
        assert_eq!(controller.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_waits_for_exit() {
        let controller = Arc::new(CountingController::default());
        let (_tx, rx) = broadcast::channel(4);
        let sub = spawn_controller(Arc::clone(&controller), rx).unwrap();

        sub.join().await;
        // Task is gone: the controller is only referenced here.
        assert_eq!(Arc::strong_count(&controller), 1);
        assert_eq!(controller.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_keeps_timer_running() {
        let controller = Arc::new(CountingController::default());
        let (tx, rx) = broadcast::channel(4);
        let _sub = spawn_controller(Arc::clone(&controller), rx).unwrap();
        drop(tx);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(controller.ticks() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lagged_receiver_skips_ahead() {
        let controller = Arc::new(CountingController::default());
        let (tx, rx) = broadcast::channel(2);
        let _sub = spawn_controller(Arc::clone(&controller), rx).unwrap();

        // The task has not been polled yet, so the receiver overflows.
        for _ in 0..5 {
            tx.send(snapshot()).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(controller.events(), 2);
    }
}
