//! The looping alarm sound.
//!
//! The output device is opened once, when the sound is created, and held until
//! it is dropped. `start` and `stop` only play and pause the sink, so calling
//! either twice in a row does nothing the second time.

use std::{fs::File, io::BufReader, path::Path, time::Duration};

use log::{debug, info};
use rodio::{source::SineWave, Decoder, OutputStream, Sink, Source};

use crate::error::AudioError;

pub trait AlertSound {
    /// starts (or resumes) looped playback
    fn start(&mut self);
    /// pauses playback, resuming later may continue mid track
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

impl<S: AlertSound + ?Sized> AlertSound for Box<S> {
    fn start(&mut self) {
        (**self).start();
    }

    fn stop(&mut self) {
        (**self).stop();
    }

    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
}

pub struct RodioAlert {
    // dropped before the stream so nothing plays into a closed device
    sink: Sink,
    _stream: OutputStream,
}

impl std::fmt::Debug for RodioAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioAlert")
            .field("playing", &self.is_playing())
            .finish_non_exhaustive()
    }
}

impl RodioAlert {
    /// Opens the default output device and queues `sound` (or a built in beep)
    /// to repeat forever, paused, at `volume` percent.
    pub fn open(sound: Option<&Path>, volume: f32) -> Result<Self, AudioError> {
        let stream = rodio::OutputStreamBuilder::open_default_stream()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        sink.set_volume(volume / 100.0);
        match sound {
            Some(path) => {
                let file = File::open(path).map_err(|source| AudioError::File {
                    path: path.to_path_buf(),
                    source,
                })?;
                // create source that repeatedly plays the sound
                let input = Decoder::new(BufReader::new(file))?.repeat_infinite();
                sink.append(input);
                info!("loaded alarm sound {}", path.display());
            }
            None => {
                sink.append(beep());
                info!("no alarm sound configured, using the built in beep");
            }
        }
        Ok(Self {
            sink,
            _stream: stream,
        })
    }
}

fn beep() -> impl Source + Send + 'static {
    SineWave::new(880.0)
        .take_duration(Duration::from_millis(250))
        .amplify(0.3)
        .delay(Duration::from_millis(250))
        .repeat_infinite()
}

impl AlertSound for RodioAlert {
    fn start(&mut self) {
        if self.sink.is_paused() {
            debug!("alarm sound playing");
            self.sink.play();
        }
    }

    fn stop(&mut self) {
        if !self.sink.is_paused() {
            debug!("alarm sound paused");
            self.sink.pause();
        }
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused()
    }
}

/// Stand in for when no audio device could be opened. Keeps track of whether
/// it would be playing so the rest of the engine behaves the same.
#[derive(Debug, Default)]
pub struct SilentAlert {
    playing: bool,
}

impl AlertSound for SilentAlert {
    fn start(&mut self) {
        if !self.playing {
            debug!("alarm would be ringing now, but there is no audio device");
        }
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
