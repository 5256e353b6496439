//! Media backend seam.
//!
//! Backends are only ever called from the designated execution context. A
//! [`Session`] is released by dropping it; [`ActiveBgm`] stops the session
//! first so every exit path (replace, disable, shutdown) goes through one
//! place.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::{ResolvedResource, ResourceKey, Result};

#[cfg(feature = "rodio")]
mod device;
#[cfg(feature = "rodio")]
pub use device::RodioBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// Repeat indefinitely until stopped.
    Looping,
    /// Play once, then release.
    Once,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSpec {
    pub mode: PlaybackMode,
    pub volume: f32,
}

/// A live playback instance.
pub trait Session: Send {
    fn set_volume(&mut self, volume: f32);

    fn stop(&mut self);

    /// Hands the session to the backend, which releases it when playback
    /// ends naturally or fails.
    fn detach(self: Box<Self>);
}

pub trait AudioBackend: Send + Sync {
    /// Creates and starts a session for `resource`.
    fn open(&self, resource: &ResolvedResource, spec: SessionSpec) -> Result<Box<dyn Session>>;
}

/// The single background-music session, tagged with the key it plays.
pub struct ActiveBgm {
    key: ResourceKey,
    session: Box<dyn Session>,
}

impl ActiveBgm {
    pub fn new(key: ResourceKey, session: Box<dyn Session>) -> Self {
        Self { key, session }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.session.set_volume(volume);
    }
}

impl Drop for ActiveBgm {
    fn drop(&mut self) {
        self.session.stop();
        tracing::debug!(key = %self.key, "released music session");
    }
}

impl std::fmt::Debug for ActiveBgm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveBgm").field("key", &self.key).finish()
    }
}

/// Headless backend that only reports session lifetimes through `tracing`.
#[derive(Debug, Default)]
pub struct LogBackend {
    next_id: AtomicU64,
}

impl LogBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for LogBackend {
    fn open(&self, resource: &ResolvedResource, spec: SessionSpec) -> Result<Box<dyn Session>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            id,
            locator = %resource.locator.display(),
            mode = ?spec.mode,
            volume = spec.volume,
            "session started"
        );
        Ok(Box::new(LogSession { id, stopped: false }))
    }
}

struct LogSession {
    id: u64,
    stopped: bool,
}

impl Session for LogSession {
    fn set_volume(&mut self, volume: f32) {
        tracing::info!(id = self.id, volume, "session volume changed");
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            tracing::info!(id = self.id, "session stopped");
        }
    }

    fn detach(self: Box<Self>) {
        tracing::debug!(id = self.id, "one-shot session detached");
    }
}


#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{recording::*, *};

    fn resource(key: &str) -> ResolvedResource {
        ResolvedResource {
            key: ResourceKey::new(key),
            locator: PathBuf::from(format!("{}.mp3", key.trim_start_matches('/'))),
        }
    }

    #[test]
    fn dropping_active_bgm_stops_the_session() {
        let backend = RecordingBackend::default();
        let spec = SessionSpec {
            mode: PlaybackMode::Looping,
            volume: 0.35,
        };
        let session = backend.open(&resource("/audio/bgm/idle"), spec).unwrap();
        let active = ActiveBgm::new(ResourceKey::new("/audio/bgm/idle"), session);
        assert_eq!(active.key().as_str(), "/audio/bgm/idle");

        drop(active);
        assert_eq!(backend.count(|e| matches!(e, Event::Stopped { id: 0 })), 1);
    }

    #[test]
    fn log_backend_opens_sessions() {
        let backend = LogBackend::new();
        let spec = SessionSpec {
            mode: PlaybackMode::Once,
            volume: 0.7,
        };
        let session = backend.open(&resource("/audio/sfx/hit"), spec).unwrap();
        session.detach();
    }
}
