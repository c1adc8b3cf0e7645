use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::alerts::{AlertController, AlertEvent, AlertKind, AlertState, EscalationEngine};
use super::config::MonitorSettings;
use super::error::MonitorError;
use super::feedback::{CuePlayer, FeedbackEmitter, FeedbackKind};
use super::model::VitalsFrame;
use super::risk::RiskClassifier;
use super::simulator::{SimulatorHandle, VitalsSimulator};

/// Wires the vitals feed, alert banner and sound feedback together.
///
/// The presentation layer talks to this type only: it subscribes to
/// [`vitals`](Self::vitals) and [`alerts`](Self::alerts) and forwards user
/// commands.
pub struct MonitorCoordinator {
    simulator: SimulatorHandle,
    alerts: Arc<Mutex<AlertController>>,
    feedback: Arc<FeedbackEmitter>,
    alert_duration_ms: u64,
    escalation: Option<JoinHandle<()>>,
}

impl MonitorCoordinator {
    /// Start the monitor on the current tokio runtime.
    pub fn start(settings: &MonitorSettings, player: Box<dyn CuePlayer>) -> Result<Self, MonitorError> {
        Self::start_with_rng(settings, player, StdRng::from_entropy())
    }

    pub fn start_with_rng<R>(
        settings: &MonitorSettings,
        player: Box<dyn CuePlayer>,
        rng: R,
    ) -> Result<Self, MonitorError>
    where
        R: Rng + Send + 'static,
    {
        let classifier = RiskClassifier::new(settings.thresholds.clone());
        let simulator = VitalsSimulator::new(classifier).start_with_rng(settings.tick_interval(), rng)?;

        let alerts = Arc::new(Mutex::new(AlertController::new()));
        let feedback = Arc::new(FeedbackEmitter::new(player, settings.sound_enabled));

        // The simulator start above proved a runtime is reachable
        let escalation = settings.alert_on_escalation.then(|| {
            tokio::spawn(watch_escalations(
                simulator.subscribe(),
                Arc::clone(&alerts),
                Arc::clone(&feedback),
                settings.alert_duration_ms,
            ))
        });

        Ok(Self {
            simulator,
            alerts,
            feedback,
            alert_duration_ms: settings.alert_duration_ms,
            escalation,
        })
    }

    pub fn vitals(&self) -> watch::Receiver<VitalsFrame> {
        self.simulator.subscribe()
    }

    pub fn alerts(&self) -> watch::Receiver<AlertState> {
        lock(&self.alerts).subscribe()
    }

    pub fn current_vitals(&self) -> VitalsFrame {
        self.simulator.current()
    }

    pub fn alert_state(&self) -> AlertState {
        lock(&self.alerts).state()
    }

    pub fn is_running(&self) -> bool {
        self.simulator.is_running()
    }

    /// "Simulate high-risk scenario": alert cue plus the preset banner.
    pub fn simulate_high_risk(&self) -> Result<u64, MonitorError> {
        let event = AlertEvent {
            kind: AlertKind::HighRiskSimulation,
            message: AlertKind::HighRiskSimulation
                .preset_message()
                .unwrap_or_default()
                .to_string(),
        };
        raise(&self.alerts, &self.feedback, event, self.alert_duration_ms)
    }

    pub fn dismiss_alert(&self) -> bool {
        lock(&self.alerts).dismiss()
    }

    /// Sound for a UI interaction (click, confirmation, ...)
    pub fn interact(&self, kind: FeedbackKind) -> bool {
        self.feedback.emit(kind)
    }

    pub fn toggle_sound(&self) -> bool {
        self.feedback.toggle()
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.feedback.set_enabled(enabled);
    }

    pub fn sound_enabled(&self) -> bool {
        self.feedback.is_enabled()
    }

    /// Stop ticking, stop watching for escalations and take down any banner.
    /// Safe to call repeatedly. A watcher caught mid-raise on another worker
    /// finds the controller closed and cannot show its alert.
    pub fn shutdown(&mut self) {
        self.simulator.stop();
        if let Some(task) = self.escalation.take() {
            task.abort();
        }
        lock(&self.alerts).close();
    }
}

impl Drop for MonitorCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn lock(alerts: &Mutex<AlertController>) -> std::sync::MutexGuard<'_, AlertController> {
    alerts.lock().unwrap_or_else(PoisonError::into_inner)
}

fn raise(
    alerts: &Mutex<AlertController>,
    feedback: &FeedbackEmitter,
    event: AlertEvent,
    duration_ms: u64,
) -> Result<u64, MonitorError> {
    if lock(alerts).is_closed() {
        return Err(MonitorError::AlertsClosed);
    }
    feedback.emit(FeedbackKind::Alert);
    log::info!("Raising {} alert", event.kind.display_name());
    // Checked again under the lock: shutdown may have closed it meanwhile
    lock(alerts).trigger(event.message, duration_ms)
}

async fn watch_escalations(
    mut frames: watch::Receiver<VitalsFrame>,
    alerts: Arc<Mutex<AlertController>>,
    feedback: Arc<FeedbackEmitter>,
    duration_ms: u64,
) {
    let mut engine = EscalationEngine::new();
    while frames.changed().await.is_ok() {
        let snapshot = frames.borrow_and_update().snapshot.clone();
        if let Some(event) = engine.evaluate(&snapshot) {
            match raise(&alerts, &feedback, event, duration_ms) {
                Ok(_) => {}
                Err(MonitorError::AlertsClosed) => break,
                Err(e) => log::warn!("Could not raise escalation alert: {}", e),
            }
        }
    }
    log::debug!("Escalation watcher finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AudioError;
    use crate::core::feedback::Cue;
    use crate::core::risk::thresholds::LowerLimit;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingPlayer {
        played: Arc<Mutex<Vec<FeedbackKind>>>,
    }

    impl RecordingPlayer {
        fn kinds(&self) -> Vec<FeedbackKind> {
            self.played.lock().unwrap().clone()
        }
    }

    impl CuePlayer for RecordingPlayer {
        fn play(&self, cue: &Cue) -> Result<(), AudioError> {
            self.played.lock().unwrap().push(cue.kind);
            Ok(())
        }
    }

    fn start(settings: &MonitorSettings, player: &RecordingPlayer) -> MonitorCoordinator {
        MonitorCoordinator::start_with_rng(settings, Box::new(player.clone()), StdRng::seed_from_u64(11))
            .unwrap()
    }

    /// Every reading counts as High physiological risk
    fn always_high() -> MonitorSettings {
        let mut settings = MonitorSettings::default();
        settings.thresholds.spo2 = LowerLimit {
            high_below: 101.0,
            medium_below: 101.0,
        };
        settings.alert_duration_ms = 60_000;
        settings
    }

    async fn wait_ticks(rx: &mut watch::Receiver<VitalsFrame>, count: usize) {
        for _ in 0..count {
            rx.changed().await.unwrap();
            rx.borrow_and_update();
        }
        // let the escalation watcher see the last frame
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulate_high_risk() {
        let player = RecordingPlayer::default();
        let coordinator = start(&MonitorSettings::default(), &player);

        let id = coordinator.simulate_high_risk().unwrap();
        let state = coordinator.alert_state();
        assert_eq!(state.id, id);
        assert!(state.visible);
        assert_eq!(state.message, "System Alert: High-risk scenario simulation active.");
        assert_eq!(player.kinds(), vec![FeedbackKind::Alert]);

        tokio::time::sleep(Duration::from_millis(5001)).await;
        assert!(!coordinator.alert_state().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulation_alert_without_sound() {
        let player = RecordingPlayer::default();
        let settings = MonitorSettings {
            sound_enabled: false,
            ..MonitorSettings::default()
        };
        let coordinator = start(&settings, &player);

        coordinator.simulate_high_risk().unwrap();
        assert!(coordinator.alert_state().visible);
        assert!(player.kinds().is_empty());
        assert!(!coordinator.interact(FeedbackKind::Click));
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalation_raises_single_alert() {
        let player = RecordingPlayer::default();
        let coordinator = start(&always_high(), &player);
        let mut vitals = coordinator.vitals();

        wait_ticks(&mut vitals, 3).await;

        let state = coordinator.alert_state();
        assert!(state.visible);
        assert_eq!(state.id, 1);
        assert!(state.message.starts_with("High physiological risk: Low SpO2"));
        assert_eq!(player.kinds(), vec![FeedbackKind::Alert]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalation_can_be_disabled() {
        let player = RecordingPlayer::default();
        let settings = MonitorSettings {
            alert_on_escalation: false,
            ..always_high()
        };
        let coordinator = start(&settings, &player);
        let mut vitals = coordinator.vitals();

        wait_ticks(&mut vitals, 2).await;

        assert_eq!(coordinator.current_vitals().snapshot.physio_risk(), crate::core::model::RiskLevel::High);
        assert_eq!(coordinator.alert_state(), AlertState::hidden());
        assert!(player.kinds().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent() {
        let player = RecordingPlayer::default();
        let mut coordinator = start(&MonitorSettings::default(), &player);
        let mut vitals = coordinator.vitals();
        wait_ticks(&mut vitals, 1).await;
        coordinator.simulate_high_risk().unwrap();

        coordinator.shutdown();
        coordinator.shutdown();

        assert!(!coordinator.is_running());
        assert!(!coordinator.alert_state().visible);
        let frozen = coordinator.current_vitals().sequence;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(coordinator.current_vitals().sequence, frozen);
    }

    /// Blocks inside `play` until the test releases it
    struct GatedPlayer {
        entered: Mutex<std::sync::mpsc::Sender<()>>,
        release: Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl CuePlayer for GatedPlayer {
        fn play(&self, _cue: &Cue) -> Result<(), AudioError> {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_beats_escalation_in_flight() {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel();
        let player = GatedPlayer {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let settings = MonitorSettings {
            tick_interval_secs: 1,
            ..always_high()
        };
        let mut coordinator =
            MonitorCoordinator::start_with_rng(&settings, Box::new(player), StdRng::seed_from_u64(3)).unwrap();

        // The watcher is now inside raise(), between the cue and the trigger
        tokio::task::spawn_blocking(move || entered_rx.recv_timeout(Duration::from_secs(10)))
            .await
            .unwrap()
            .unwrap();

        coordinator.shutdown();
        assert!(!coordinator.alert_state().visible);
        release_tx.send(()).unwrap();
        drop(release_tx);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let state = coordinator.alert_state();
        assert!(!state.visible);
        assert_eq!(state.id, 0);
        assert!(matches!(coordinator.simulate_high_risk(), Err(MonitorError::AlertsClosed)));
    }

    #[tokio::test]
    async fn test_toggle_sound() {
        let player = RecordingPlayer::default();
        let coordinator = start(&MonitorSettings::default(), &player);

        assert!(!coordinator.toggle_sound());
        assert!(!coordinator.sound_enabled());
        assert!(coordinator.toggle_sound());
        assert_eq!(player.kinds(), vec![FeedbackKind::Success]);

        coordinator.set_sound_enabled(false);
        assert!(!coordinator.interact(FeedbackKind::Click));
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let result = MonitorCoordinator::start(&MonitorSettings::default(), Box::new(RecordingPlayer::default()));
        assert!(matches!(result, Err(MonitorError::SchedulerUnavailable)));
    }
}
