use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::{
    alerts::AlertState,
    config::ConfigManager,
    coordinator::MonitorCoordinator,
    error::MonitorError,
    feedback::{CuePlayer, FeedbackKind, NullPlayer, RodioPlayer},
    model::VitalsFrame,
};

const CONFIG_DIR_VAR: &str = "ASTHMA_MONITOR_CONFIG_DIR";

/// Line commands accepted on stdin
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    SimulateAlert,
    Dismiss,
    ToggleSound,
    Click,
    Status,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let word = line.trim().to_lowercase();
        let command = match word.as_str() {
            "" => return None,
            "alert" | "simulate" => Self::SimulateAlert,
            "dismiss" => Self::Dismiss,
            "sound" => Self::ToggleSound,
            "click" => Self::Click,
            "status" => Self::Status,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(word),
        };
        Some(command)
    }
}

const HELP: &str = "commands: alert, dismiss, sound, click, status, quit";

/// Headless console front end: logs every frame and alert change and reads
/// commands from stdin until `quit`, EOF or Ctrl-C.
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Could not start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_console()) {
        log::error!("Monitor failed to start: {}", e);
        std::process::exit(1);
    }
}

async fn run_console() -> Result<(), MonitorError> {
    let config_dir = std::env::var_os(CONFIG_DIR_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let config_manager = ConfigManager::new(&config_dir);
    let settings = config_manager.load();
    log::info!("Settings: {:?}", config_manager.path());

    let player: Box<dyn CuePlayer> = match RodioPlayer::spawn() {
        Ok(player) => Box::new(player),
        Err(e) => {
            log::warn!("Falling back to silent feedback: {}", e);
            Box::new(NullPlayer)
        }
    };

    let mut coordinator = MonitorCoordinator::start(&settings, player)?;
    let mut vitals = coordinator.vitals();
    let mut alerts = coordinator.alerts();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    log_frame(&vitals.borrow_and_update());
    log::info!("{}", HELP);

    loop {
        tokio::select! {
            changed = vitals.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = vitals.borrow_and_update().clone();
                log_frame(&frame);
            }
            changed = alerts.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = alerts.borrow_and_update().clone();
                log_alert(&state);
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        log::warn!("stdin closed: {}", e);
                        break;
                    }
                };
                match Command::parse(&line) {
                    Some(Command::Quit) => break,
                    Some(command) => handle(&coordinator, command),
                    None => {}
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    coordinator.shutdown();
    log::info!("Monitor stopped");
    Ok(())
}

fn handle(coordinator: &MonitorCoordinator, command: Command) {
    match command {
        Command::SimulateAlert => {
            if let Err(e) = coordinator.simulate_high_risk() {
                log::warn!("Could not raise alert: {}", e);
            }
        }
        Command::Dismiss => {
            coordinator.interact(FeedbackKind::Click);
            if !coordinator.dismiss_alert() {
                log::info!("No alert to dismiss");
            }
        }
        Command::ToggleSound => {
            coordinator.toggle_sound();
        }
        Command::Click => {
            coordinator.interact(FeedbackKind::Click);
        }
        Command::Status => log_frame(&coordinator.current_vitals()),
        Command::Unknown(word) => log::warn!("Unknown command {:?}; {}", word, HELP),
        Command::Quit => {}
    }
}

fn log_frame(frame: &VitalsFrame) {
    let s = &frame.snapshot;
    log::info!(
        "[{}] #{} SpO2 {:.1}% | HR {} bpm | RR {} | Sounds {} | {:.1}°C {:.0}% | PM2.5 {:.1} | physio {} {:?} | env {} {:?}",
        frame.synced_at.format("%H:%M:%S"),
        frame.sequence,
        s.spo2,
        s.heart_rate,
        s.breathing_rate,
        s.respiratory_sounds,
        s.temperature,
        s.humidity,
        s.pm25,
        s.physio_risk(),
        s.physio_triggers(),
        s.env_risk(),
        s.env_triggers()
    );
}

fn log_alert(state: &AlertState) {
    if state.visible {
        log::warn!("ALERT #{}: {}", state.id, state.message);
    } else {
        log::info!("Alert #{} cleared", state.id);
    }
}
