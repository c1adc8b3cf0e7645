// Simulated vitals feed.
//
// Owns the current `SensorSnapshot`, perturbs it on a fixed period and
// republishes it through a watch channel. Only SpO2 walks; heart rate and
// PM2.5 are redrawn fresh every tick, and the remaining readings never move.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::error::MonitorError;
use super::model::{RespiratorySound, SensorSnapshot, VitalsFrame};
use super::risk::RiskClassifier;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(5);

const SPO2_STEP: f64 = 0.1;
const HEART_RATE_RANGE: (u32, u32) = (72, 77);
const PM25_RANGE: (f64, f64) = (10.0, 15.0);

type Publisher = Arc<Mutex<Option<watch::Sender<VitalsFrame>>>>;

#[derive(Debug, Clone, Default)]
pub struct VitalsSimulator {
    classifier: RiskClassifier,
}

impl VitalsSimulator {
    pub fn new(classifier: RiskClassifier) -> Self {
        Self { classifier }
    }

    /// Baseline readings shown before the first tick.
    pub fn initialize() -> SensorSnapshot {
        SensorSnapshot::from_readings(98.0, 72, 16, RespiratorySound::Normal, 24.5, 48.0, 12.0)
    }

    /// Produce the next snapshot from `previous`. Infallible.
    pub fn tick<R: Rng + ?Sized>(&self, previous: &SensorSnapshot, rng: &mut R) -> SensorSnapshot {
        let step = if rng.gen_bool(0.5) { SPO2_STEP } else { -SPO2_STEP };
        let spo2 = round_tenth(previous.spo2 + step).clamp(0.0, 100.0);
        let heart_rate = rng.gen_range(HEART_RATE_RANGE.0..=HEART_RATE_RANGE.1);
        let pm25 = round_tenth(rng.gen_range(PM25_RANGE.0..=PM25_RANGE.1));

        let mut next = SensorSnapshot::from_readings(
            spo2,
            heart_rate,
            previous.breathing_rate,
            previous.respiratory_sounds,
            previous.temperature,
            previous.humidity,
            pm25,
        );
        next.apply_assessment(self.classifier.classify(&next));
        next
    }

    /// Arm the recurring tick on the current tokio runtime.
    pub fn start(self, period: Duration) -> Result<SimulatorHandle, MonitorError> {
        self.start_with_rng(period, StdRng::from_entropy())
    }

    /// Same as [`start`](Self::start) with a caller-supplied RNG (seeded in tests).
    pub fn start_with_rng<R>(self, period: Duration, mut rng: R) -> Result<SimulatorHandle, MonitorError>
    where
        R: Rng + Send + 'static,
    {
        if period.is_zero() {
            return Err(MonitorError::InvalidPeriod(period));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| MonitorError::SchedulerUnavailable)?;
        let first_tick = Instant::now()
            .checked_add(period)
            .ok_or(MonitorError::InvalidPeriod(period))?;

        // Frame 0 carries the configured classification, same as every tick
        let mut snapshot = Self::initialize();
        snapshot.apply_assessment(self.classifier.classify(&snapshot));
        let baseline = VitalsFrame::baseline(snapshot);
        let (tx, receiver) = watch::channel(baseline.clone());
        let publisher: Publisher = Arc::new(Mutex::new(Some(tx)));
        let task_publisher = Arc::clone(&publisher);

        let task = runtime.spawn(async move {
            let mut interval = time::interval_at(first_tick, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut frame = baseline;

            loop {
                interval.tick().await;
                let next = frame.next(self.tick(&frame.snapshot, &mut rng));

                // Publish under the lock so stop() can never be overtaken
                {
                    let guard = task_publisher.lock().unwrap_or_else(PoisonError::into_inner);
                    let Some(tx) = guard.as_ref() else {
                        break;
                    };
                    tx.send_replace(next.clone());
                }

                log::debug!(
                    "Tick {}: SpO2 {:.1}%, HR {} bpm, PM2.5 {:.1} ({} / {})",
                    next.sequence,
                    next.snapshot.spo2,
                    next.snapshot.heart_rate,
                    next.snapshot.pm25,
                    next.snapshot.physio_risk(),
                    next.snapshot.env_risk()
                );
                frame = next;
            }
        });

        log::info!("Vitals simulator started with a {:?} period", period);
        Ok(SimulatorHandle {
            publisher,
            receiver,
            task,
        })
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Owned start/stop handle for a running simulator. Dropping it stops the feed.
#[derive(Debug)]
pub struct SimulatorHandle {
    publisher: Publisher,
    receiver: watch::Receiver<VitalsFrame>,
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    /// Read-only view pushed on every tick.
    pub fn subscribe(&self) -> watch::Receiver<VitalsFrame> {
        self.receiver.clone()
    }

    pub fn current(&self) -> VitalsFrame {
        self.receiver.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.publisher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop ticking. Idempotent; no frame is published after this returns.
    pub fn stop(&self) {
        let sender = self
            .publisher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.task.abort();
        if sender.is_some() {
            log::info!("Vitals simulator stopped");
        }
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
