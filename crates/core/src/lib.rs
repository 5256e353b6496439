//! Audio orchestration core for the interactive fiction client.
//!
//! Game logic asks for music by intent (idle, battle, boss) or by name, and
//! for fire-and-forget sound effects. The crate decides which track should be
//! audible, resolves logical names to concrete resources, and keeps exactly
//! one background-music session alive. Every backend mutation is confined to
//! a single execution context reached through [`Gate`].

pub mod assets;
pub mod audio;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod gate;
pub mod selection;
pub mod volume;

pub use assets::{DirectorySource, MemorySource, ResolvedResource, ResourceResolver, ResourceSource};
pub use audio::{AudioService, AudioStatus, Dispatch};
pub use backend::{ActiveBgm, AudioBackend, LogBackend, PlaybackMode, Session, SessionSpec};
pub use catalog::{BgmTrack, ResourceKey, Sfx};
pub use config::{AppConfig, AudioConfig};
pub use error::{AudioError, Result};
pub use gate::{ContextThread, ExecutionContext, Gate, InlineContext, Task};
pub use selection::{sanitize_name, BattleCycle, TrackSelector};
pub use volume::Gains;

#[cfg(feature = "rodio")]
pub use backend::RodioBackend;
