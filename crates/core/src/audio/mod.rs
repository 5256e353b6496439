use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::{
    backend::{ActiveBgm, AudioBackend, PlaybackMode, SessionSpec},
    AudioConfig, BgmTrack, DirectorySource, Gains, Gate, ResolvedResource, ResourceKey,
    ResourceResolver, ResourceSource, Result, Sfx, TrackSelector,
};

/// What a playback request did at the call site.
///
/// Requests are fire-and-forget: `Submitted` only means the work reached the
/// execution context, not that a session is audible yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    Submitted,
    /// Audio is switched off; nothing was resolved or scheduled.
    Disabled,
    /// Blank key, or the key is already the live music track.
    Ignored,
    /// No candidate resource exists for the request.
    Unresolved,
    /// The execution context refused the work.
    ContextUnavailable,
}

/// Serialisable snapshot of the service state.
#[derive(Debug, Clone, Serialize)]
pub struct AudioStatus {
    pub enabled: bool,
    pub current: Option<ResourceKey>,
    pub bgm_volume: f32,
    pub sfx_volume: f32,
    pub sessions_started: u64,
    pub failures: u64,
    pub battle_cursor: usize,
}

/// State touched by tasks running on the execution context.
///
/// `bgm` and `current` are written only on the context. Callers on other
/// threads read `current`, which is never held across a backend call.
struct Shared {
    backend: Arc<dyn AudioBackend>,
    gains: Gains,
    enabled: AtomicBool,
    bgm: Mutex<Option<ActiveBgm>>,
    current: RwLock<Option<ResourceKey>>,
    sessions_started: AtomicU64,
    failures: AtomicU64,
}

impl Shared {
    fn current_key(&self) -> Option<ResourceKey> {
        self.current.read().clone()
    }

    /// Replaces the music session with one playing `resource`. The old
    /// session is released before the new one is opened; if opening fails
    /// the slot stays empty. No lock is held while the backend opens.
    fn start_bgm(&self, key: ResourceKey, resource: &ResolvedResource) -> Result<()> {
        if !self.enabled.load(Ordering::Acquire) {
            return Ok(());
        }
        if self.current_key().as_ref() == Some(&key) {
            return Ok(());
        }
        self.release_bgm();

        let spec = SessionSpec {
            mode: PlaybackMode::Looping,
            volume: self.gains.bgm(),
        };
        let session = self.backend.open(resource, spec)?;
        tracing::info!(key = %key, volume = spec.volume, "music started");
        *self.bgm.lock() = Some(ActiveBgm::new(key.clone(), session));
        *self.current.write() = Some(key);
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn release_bgm(&self) -> Option<ResourceKey> {
        self.current.write().take();
        let released = self.bgm.lock().take();
        released.map(|active| active.key().clone())
    }

    fn start_effect(&self, resource: &ResolvedResource) -> Result<()> {
        if !self.enabled.load(Ordering::Acquire) {
            return Ok(());
        }
        let spec = SessionSpec {
            mode: PlaybackMode::Once,
            volume: self.gains.sfx(),
        };
        self.backend.open(resource, spec)?.detach();
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn stop_bgm(&self) {
        if let Some(key) = self.release_bgm() {
            tracing::info!(key = %key, "music stopped");
        }
    }

    fn apply_bgm_volume(&self) {
        let volume = self.gains.bgm();
        if let Some(active) = self.bgm.lock().as_mut() {
            active.set_volume(volume);
        }
    }

    /// Backend failures end here: audio is best-effort and never reaches the
    /// caller.
    fn absorb(&self, what: &'static str, outcome: Result<()>) {
        if let Err(err) = outcome {
            self.failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(what, %err, "audio playback failed");
        }
    }
}

/// Background-music and sound-effect orchestrator.
///
/// One instance is created by the host and shared by reference. Requests may
/// come from any thread; every backend mutation runs through the [`Gate`].
pub struct AudioService {
    gate: Gate,
    resolver: Arc<ResourceResolver>,
    selector: TrackSelector,
    shared: Arc<Shared>,
    initialized: AtomicBool,
}

impl AudioService {
    /// Creates a service resolving against the configured asset directory.
    pub fn new(config: &AudioConfig, gate: Gate, backend: Arc<dyn AudioBackend>) -> Self {
        let source = Arc::new(DirectorySource::new(config.asset_root.clone()));
        Self::with_source(config, source, gate, backend)
    }

    /// Creates a service resolving against an arbitrary resource source.
    pub fn with_source(
        config: &AudioConfig,
        source: Arc<dyn ResourceSource>,
        gate: Gate,
        backend: Arc<dyn AudioBackend>,
    ) -> Self {
        let resolver = Arc::new(ResourceResolver::with_extensions(
            source,
            config.extensions.clone(),
        ));
        Self {
            gate,
            selector: TrackSelector::new(Arc::clone(&resolver)),
            resolver,
            shared: Arc::new(Shared {
                backend,
                gains: Gains::new(config.bgm_volume, config.sfx_volume),
                enabled: AtomicBool::new(config.enabled),
                bgm: Mutex::new(None),
                current: RwLock::new(None),
                sessions_started: AtomicU64::new(0),
                failures: AtomicU64::new(0),
            }),
            initialized: AtomicBool::new(false),
        }
    }

    /// Lifecycle hook for the host's startup path. Safe to call repeatedly.
    pub fn init(&self) {
        if !self.initialized.swap(true, Ordering::AcqRel) {
            tracing::info!(
                enabled = self.is_enabled(),
                extensions = ?self.resolver.extensions(),
                "audio service initialised"
            );
        }
    }

    /// Disables audio and releases the music session.
    pub fn shutdown(&self) {
        tracing::info!("audio service shutting down");
        self.set_enabled(false);
    }

    /// Disabling stops the music; re-enabling does not resume it.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::Release);
        if !enabled {
            self.stop_bgm();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Acquire)
    }

    /// Stores the clamped music gain and applies it to the live session.
    /// Returns the gain actually stored.
    pub fn set_bgm_volume(&self, volume: f32) -> f32 {
        let stored = self.shared.gains.set_bgm(volume);
        let shared = Arc::clone(&self.shared);
        self.dispatch(move || shared.apply_bgm_volume());
        stored
    }

    /// Stores the clamped effects gain for effects started from now on.
    pub fn set_sfx_volume(&self, volume: f32) -> f32 {
        self.shared.gains.set_sfx(volume)
    }

    pub fn play_bgm(&self, track: BgmTrack) -> Dispatch {
        self.play_bgm_base(track.key())
    }

    /// Plays a music track by logical base name.
    ///
    /// Requesting the live track again does nothing. A key that does not
    /// resolve leaves the current track playing.
    pub fn play_bgm_base(&self, key: impl Into<ResourceKey>) -> Dispatch {
        if !self.is_enabled() {
            return Dispatch::Disabled;
        }
        let key = key.into();
        if key.is_blank() || self.shared.current_key().as_ref() == Some(&key) {
            return Dispatch::Ignored;
        }
        let Some(resource) = self.resolver.resolve(&key) else {
            tracing::debug!(key = %key, "music not found, keeping current track");
            return Dispatch::Unresolved;
        };

        let shared = Arc::clone(&self.shared);
        self.dispatch(move || {
            let outcome = shared.start_bgm(key, &resource);
            shared.absorb("music", outcome);
        })
    }

    /// Chapter idle theme, falling back to the generic idle track.
    pub fn play_idle_for(&self, chapter: i32) -> Dispatch {
        if !self.is_enabled() {
            return Dispatch::Disabled;
        }
        self.play_bgm_base(self.selector.idle_for(chapter))
    }

    /// Boss theme when `boss` is set and one exists, otherwise the next
    /// generic battle theme.
    pub fn play_battle_for(&self, chapter: i32, enemy: Option<&str>, boss: bool) -> Dispatch {
        if !self.is_enabled() {
            return Dispatch::Disabled;
        }
        match self.selector.battle_for(chapter, enemy, boss) {
            Some(key) => self.play_bgm_base(key),
            None => Dispatch::Unresolved,
        }
    }

    pub fn play_sfx(&self, sfx: Sfx) -> Dispatch {
        self.play_effect(sfx.key())
    }

    /// Starts an independent one-shot effect at the current effects gain.
    pub fn play_effect(&self, key: impl Into<ResourceKey>) -> Dispatch {
        if !self.is_enabled() {
            return Dispatch::Disabled;
        }
        let key = key.into();
        let Some(resource) = self.resolver.resolve(&key) else {
            return Dispatch::Unresolved;
        };

        let shared = Arc::clone(&self.shared);
        self.dispatch(move || {
            let outcome = shared.start_effect(&resource);
            shared.absorb("effect", outcome);
        })
    }

    /// Releases the music session, if any.
    pub fn stop_bgm(&self) -> Dispatch {
        let shared = Arc::clone(&self.shared);
        self.dispatch(move || shared.stop_bgm())
    }

    /// Key of the live music session as last observed.
    pub fn current_track(&self) -> Option<ResourceKey> {
        self.shared.current_key()
    }

    pub fn status(&self) -> AudioStatus {
        AudioStatus {
            enabled: self.is_enabled(),
            current: self.current_track(),
            bgm_volume: self.shared.gains.bgm(),
            sfx_volume: self.shared.gains.sfx(),
            sessions_started: self.shared.sessions_started.load(Ordering::Relaxed),
            failures: self.shared.failures.load(Ordering::Relaxed),
            battle_cursor: self.selector.cycle().position(),
        }
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn resolver(&self) -> &ResourceResolver {
        &self.resolver
    }

    fn dispatch<F>(&self, op: F) -> Dispatch
    where
        F: FnOnce() + Send + 'static,
    {
        match self.gate.run(op) {
            Ok(()) => Dispatch::Submitted,
            Err(err) => {
                tracing::warn!(%err, "audio request dropped");
                Dispatch::ContextUnavailable
            }
        }
    }
}

impl std::fmt::Debug for AudioService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioService")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
