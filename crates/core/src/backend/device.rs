use std::{fs::File, io::BufReader};

use ::rodio::{mixer::Mixer, Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::{AudioBackend, PlaybackMode, Session, SessionSpec};
use crate::{AudioError, ResolvedResource, Result};

/// Plays through the default output device.
///
/// The [`OutputStream`] must outlive the backend; hosts keep it on the thread
/// that opened it and hand the backend to the execution context.
#[derive(Clone)]
pub struct RodioBackend {
    mixer: Mixer,
}

impl RodioBackend {
    pub fn open_default() -> Result<(OutputStream, Self)> {
        let stream = OutputStreamBuilder::open_default_stream().map_err(AudioError::backend)?;
        let backend = Self {
            mixer: stream.mixer().clone(),
        };
        Ok((stream, backend))
    }
}

impl AudioBackend for RodioBackend {
    fn open(&self, resource: &ResolvedResource, spec: SessionSpec) -> Result<Box<dyn Session>> {
        let file = File::open(&resource.locator)?;
        let source = Decoder::new(BufReader::new(file)).map_err(AudioError::backend)?;

        let sink = Sink::connect_new(&self.mixer);
        sink.set_volume(spec.volume);
        match spec.mode {
            PlaybackMode::Looping => sink.append(source.repeat_infinite()),
            PlaybackMode::Once => sink.append(source),
        }
        Ok(Box::new(RodioSession { sink }))
    }
}

struct RodioSession {
    sink: Sink,
}

impl Session for RodioSession {
    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn detach(self: Box<Self>) {
        self.sink.detach();
    }
}
