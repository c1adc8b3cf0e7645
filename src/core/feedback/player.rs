// Cue players: rodio output on a dedicated audio thread, and a silent player.

use std::sync::mpsc;
use std::thread;

use rodio::source::SineWave;
use rodio::{OutputStreamBuilder, Source};

use super::{Cue, CuePlayer, Tone};
use crate::core::error::AudioError;

/// Plays cues through the default output device.
///
/// The output stream lives on its own thread so `play` only queues the cue.
/// If the device cannot be opened the thread exits and every later `play`
/// reports `BackendUnavailable`.
pub struct RodioPlayer {
    queue: mpsc::Sender<Cue>,
}

impl RodioPlayer {
    pub fn spawn() -> Result<Self, AudioError> {
        let (queue, cues) = mpsc::channel::<Cue>();
        thread::Builder::new()
            .name("audio-feedback".to_string())
            .spawn(move || run_output(cues))
            .map_err(|e| AudioError::BackendUnavailable(e.to_string()))?;
        Ok(Self { queue })
    }
}

impl CuePlayer for RodioPlayer {
    fn play(&self, cue: &Cue) -> Result<(), AudioError> {
        self.queue
            .send(cue.clone())
            .map_err(|_| AudioError::BackendUnavailable("audio thread has exited".to_string()))
    }
}

fn run_output(cues: mpsc::Receiver<Cue>) {
    let stream = match OutputStreamBuilder::open_default_stream() {
        Ok(stream) => stream,
        Err(e) => {
            log::warn!("No audio output device, sound feedback disabled: {}", e);
            return;
        }
    };

    for cue in cues {
        for tone in &cue.tones {
            stream.mixer().add(tone_source(tone));
        }
    }
    log::debug!("Audio feedback thread finished");
}

fn tone_source(tone: &Tone) -> impl Source + Send + 'static {
    SineWave::new(tone.frequency_hz)
        .take_duration(tone.duration)
        .amplify(tone.gain)
        .delay(tone.offset)
}

/// Accepts every cue and plays nothing. For headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPlayer;

impl CuePlayer for NullPlayer {
    fn play(&self, cue: &Cue) -> Result<(), AudioError> {
        log::trace!("Muted cue {:?}", cue.kind);
        Ok(())
    }
}
