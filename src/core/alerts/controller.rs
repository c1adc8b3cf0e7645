// Alert controller - show, auto-hide and dismiss the banner.
//
// Hidden --trigger--> Visible --(timeout | dismiss)--> Hidden
// Visible --trigger--> Visible (message replaced, timer reset)
// any --close--> Hidden, and every later trigger is refused

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};

use super::model::AlertState;
use crate::core::error::MonitorError;

pub struct AlertController {
    sender: Arc<watch::Sender<AlertState>>,
    /// One-shot auto-hide for the visible alert
    pending: Option<JoinHandle<()>>,
    next_id: u64,
    closed: bool,
}

impl AlertController {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AlertState::hidden());
        Self {
            sender: Arc::new(sender),
            pending: None,
            next_id: 0,
            closed: false,
        }
    }

    /// Read-only view pushed on show and hide.
    pub fn subscribe(&self) -> watch::Receiver<AlertState> {
        self.sender.subscribe()
    }

    pub fn state(&self) -> AlertState {
        self.sender.borrow().clone()
    }

    /// Show `message` for `duration_ms`, replacing any visible alert.
    /// Returns the new alert id. State is untouched on error.
    pub fn trigger(&mut self, message: impl Into<String>, duration_ms: u64) -> Result<u64, MonitorError> {
        if self.closed {
            return Err(MonitorError::AlertsClosed);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| MonitorError::SchedulerUnavailable)?;
        let expires_at = Instant::now()
            .checked_add(Duration::from_millis(duration_ms))
            .ok_or(MonitorError::InvalidDuration(duration_ms))?;

        self.cancel_pending();
        self.next_id += 1;
        let id = self.next_id;
        let message = message.into();

        log::info!("Alert {} shown for {}ms: {}", id, duration_ms, message);
        self.sender.send_replace(AlertState {
            id,
            visible: true,
            message,
            expires_at: Some(expires_at),
        });

        let sender = Arc::clone(&self.sender);
        self.pending = Some(runtime.spawn(async move {
            time::sleep_until(expires_at).await;
            // A replacement alert owns the banner now; leave it alone
            let hidden = sender.send_if_modified(|state| {
                if state.visible && state.id == id {
                    state.hide();
                    true
                } else {
                    false
                }
            });
            if hidden {
                log::debug!("Alert {} expired", id);
            }
        }));

        Ok(id)
    }

    /// Hide immediately. Returns false (and publishes nothing) if already hidden.
    pub fn dismiss(&mut self) -> bool {
        self.cancel_pending();
        let hidden = self.sender.send_if_modified(|state| {
            if state.visible {
                state.hide();
                true
            } else {
                false
            }
        });
        if hidden {
            log::info!("Alert dismissed");
        }
        hidden
    }

    /// Hide any banner and refuse further triggers. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            log::debug!("Alert controller closed");
        }
        self.dismiss();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl Default for AlertController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AlertController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_trigger_then_auto_hide() {
        let mut controller = AlertController::new();
        let id = controller.trigger("Check inhaler", 5000).unwrap();

        let state = controller.state();
        assert_eq!(state.id, id);
        assert!(state.visible);
        assert_eq!(state.message, "Check inhaler");
        assert_eq!(state.remaining(), Some(Duration::from_millis(5000)));

        time::sleep(Duration::from_millis(4999)).await;
        assert!(controller.state().visible);

        time::sleep(Duration::from_millis(2)).await;
        let state = controller.state();
        assert!(!state.visible);
        assert_eq!(state.id, id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_resets_auto_hide() {
        let mut controller = AlertController::new();
        let mut rx = controller.subscribe();
        let start = Instant::now();

        controller.trigger("A", 1000).unwrap();
        time::sleep(Duration::from_millis(10)).await;
        controller.trigger("B", 1000).unwrap();

        time::sleep_until(start + Duration::from_millis(1005)).await;
        let state = controller.state();
        assert!(state.visible, "stale timer from the replaced alert must not hide B");
        assert_eq!(state.message, "B");

        while rx.borrow_and_update().visible {
            rx.changed().await.unwrap();
        }
        let hidden_after = start.elapsed();
        assert!(hidden_after >= Duration::from_millis(1010));
        assert!(hidden_after < Duration::from_millis(1012));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_pending_hide() {
        let mut controller = AlertController::new();
        controller.trigger("A", 1000).unwrap();
        time::sleep(Duration::from_millis(100)).await;

        assert!(controller.dismiss());
        assert!(!controller.state().visible);

        controller.trigger("B", 5000).unwrap();
        time::sleep(Duration::from_millis(1500)).await;
        let state = controller.state();
        assert!(state.visible);
        assert_eq!(state.message, "B");
    }

    #[tokio::test]
    async fn test_dismiss_when_hidden_is_noop() {
        let mut controller = AlertController::new();
        let rx = controller.subscribe();

        assert!(!controller.dismiss());
        assert!(!controller.dismiss());
        assert_eq!(controller.state(), AlertState::hidden());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let mut controller = AlertController::new();
        let first = controller.trigger("A", 1000).unwrap();
        let second = controller.trigger("B", 1000).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_trigger_without_runtime_fails() {
        let mut controller = AlertController::new();
        let result = controller.trigger("A", 1000);
        assert!(matches!(result, Err(MonitorError::SchedulerUnavailable)));
        assert_eq!(controller.state(), AlertState::hidden());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_hides_and_refuses_triggers() {
        let mut controller = AlertController::new();
        controller.trigger("A", 1000).unwrap();

        controller.close();
        controller.close();
        assert!(controller.is_closed());
        assert!(!controller.state().visible);

        let result = controller.trigger("B", 1000);
        assert!(matches!(result, Err(MonitorError::AlertsClosed)));
        time::sleep(Duration::from_millis(2000)).await;
        let state = controller.state();
        assert!(!state.visible);
        assert_eq!(state.id, 1);
    }

    #[tokio::test]
    async fn test_long_duration_stays_visible() {
        let mut controller = AlertController::new();
        let id = controller.trigger("A", u64::MAX).unwrap();

        let state = controller.state();
        assert_eq!(state.id, id);
        assert!(state.visible);
        assert!(state.remaining().is_some());
        assert!(controller.dismiss());
    }
}
