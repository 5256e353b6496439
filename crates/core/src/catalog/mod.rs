//! Logical resource names and the fixed track/effect catalogs.
//!
//! Base names never carry a file extension; the resolver appends the
//! configured candidates. The namespace is a packaging convention only:
//! music lives under [`BGM_DIR`], effects under [`SFX_DIR`].

use std::{borrow::Borrow, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

pub const BGM_DIR: &str = "/audio/bgm";
pub const SFX_DIR: &str = "/audio/sfx";

/// Generic battle themes rotated by [`BattleCycle`](crate::BattleCycle).
pub const BATTLE_CYCLE: [&str; 3] = [
    "/audio/bgm/battle1",
    "/audio/bgm/battle2",
    "/audio/bgm/battle3",
];

/// Immutable logical base path, compared by value.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(Arc<str>);

impl ResourceKey {
    pub fn new(base: impl AsRef<str>) -> Self {
        Self(Arc::from(base.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank keys are never resolved or played.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn chapter_idle(chapter: i32) -> Self {
        Self::new(format!("{BGM_DIR}/idle_ch{chapter}"))
    }

    pub fn chapter_boss(chapter: i32) -> Self {
        Self::new(format!("{BGM_DIR}/boss_ch{chapter}"))
    }

    /// `name` must already be sanitized.
    pub fn named_boss(name: &str) -> Self {
        Self::new(format!("{BGM_DIR}/boss_{name}"))
    }
}

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({:?})", &*self.0)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ResourceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceKey {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// Background music tracks known to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BgmTrack {
    Idle,
    Battle,
}

impl BgmTrack {
    pub fn resource_base(self) -> &'static str {
        match self {
            BgmTrack::Idle => "/audio/bgm/idle",
            BgmTrack::Battle => "/audio/bgm/battle",
        }
    }

    pub fn key(self) -> ResourceKey {
        ResourceKey::new(self.resource_base())
    }
}

/// One-shot sound effects known to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sfx {
    Hit,
}

impl Sfx {
    pub fn resource_base(self) -> &'static str {
        match self {
            Sfx::Hit => "/audio/sfx/hit",
        }
    }

    pub fn key(self) -> ResourceKey {
        ResourceKey::new(self.resource_base())
    }
}
