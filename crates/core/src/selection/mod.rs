use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::{catalog::BATTLE_CYCLE, BgmTrack, ResourceKey, ResourceResolver};

/// Turns an enemy display name into a resource-friendly key fragment.
///
/// Returns `None` for absent or blank names, which disables the name-based
/// boss fallback.
pub fn sanitize_name(name: Option<&str>) -> Option<String> {
    let trimmed = name?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut in_whitespace = false;
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => out.push('_'),
            other => out.push(other),
        }
    }
    Some(out)
}

/// Fixed list of generic battle themes plus a rotating start cursor.
#[derive(Debug)]
pub struct BattleCycle {
    entries: Vec<ResourceKey>,
    cursor: AtomicUsize,
}

impl Default for BattleCycle {
    fn default() -> Self {
        Self::new(BATTLE_CYCLE.iter().map(|base| ResourceKey::new(base)).collect())
    }
}

impl BattleCycle {
    pub fn new(entries: Vec<ResourceKey>) -> Self {
        Self {
            entries,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn entries(&self) -> &[ResourceKey] {
        &self.entries
    }

    /// Position the next [`advance`](Self::advance) will start from.
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    /// Reads the cursor and moves it one step, wrapping at the list length.
    /// Returns the position that was read.
    pub fn advance(&self) -> usize {
        let len = self.entries.len();
        if len == 0 {
            return 0;
        }
        match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
        {
            Ok(previous) | Err(previous) => previous,
        }
    }

    /// Entries in probe order starting at `start`, wrapping once.
    pub fn rotation(&self, start: usize) -> impl Iterator<Item = &ResourceKey> + '_ {
        let len = self.entries.len();
        (0..len).map(move |i| &self.entries[(start + i) % len])
    }
}

/// Decides which base name should be audible for a given game state.
///
/// Every call re-checks existence through the resolver, so themes added at
/// runtime take part in later decisions.
#[derive(Debug)]
pub struct TrackSelector {
    resolver: Arc<ResourceResolver>,
    cycle: BattleCycle,
}

impl TrackSelector {
    pub fn new(resolver: Arc<ResourceResolver>) -> Self {
        Self::with_cycle(resolver, BattleCycle::default())
    }

    pub fn with_cycle(resolver: Arc<ResourceResolver>, cycle: BattleCycle) -> Self {
        Self { resolver, cycle }
    }

    pub fn cycle(&self) -> &BattleCycle {
        &self.cycle
    }

    /// Chapter idle theme if it exists, else the generic idle track.
    ///
    /// The generic key is returned even if it does not resolve; playback of
    /// an unresolved key is a no-op.
    pub fn idle_for(&self, chapter: i32) -> ResourceKey {
        if chapter > 0 {
            let key = ResourceKey::chapter_idle(chapter);
            if self.resolver.exists(&key) {
                return key;
            }
            tracing::debug!(chapter, "no chapter idle theme, using generic idle");
        }
        BgmTrack::Idle.key()
    }

    /// Boss chain (chapter boss, then named boss) followed by the generic
    /// rotation. `None` means nothing in the chain exists.
    pub fn battle_for(&self, chapter: i32, enemy: Option<&str>, boss: bool) -> Option<ResourceKey> {
        if boss {
            if let Some(key) = self.boss_for(chapter, enemy) {
                return Some(key);
            }
            tracing::debug!(chapter, enemy, "no boss theme, falling back to rotation");
        }
        self.next_battle()
    }

    fn boss_for(&self, chapter: i32, enemy: Option<&str>) -> Option<ResourceKey> {
        if chapter > 0 {
            let key = ResourceKey::chapter_boss(chapter);
            if self.resolver.exists(&key) {
                return Some(key);
            }
        }
        let key = ResourceKey::named_boss(&sanitize_name(enemy)?);
        self.resolver.exists(&key).then_some(key)
    }

    /// Advances the rotation exactly once and returns the first existing
    /// theme from the start position, else the generic battle track if it
    /// exists.
    pub fn next_battle(&self) -> Option<ResourceKey> {
        let start = self.cycle.advance();
        if let Some(key) = self
            .cycle
            .rotation(start)
            .find(|key| self.resolver.exists(key))
        {
            return Some(key.clone());
        }
        let fallback = BgmTrack::Battle.key();
        self.resolver.exists(&fallback).then_some(fallback)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::MemorySource;

    fn selector_with(entries: &[&str]) -> (Arc<MemorySource>, TrackSelector) {
        let source = Arc::new(MemorySource::with_entries(entries.iter().copied()));
        let resolver = Arc::new(ResourceResolver::new(source.clone()));
        (source, TrackSelector::new(resolver))
    }

    #[test]
    fn sanitizes_enemy_names() {
        assert_eq!(sanitize_name(Some("Iron Golem")).as_deref(), Some("Iron_Golem"));
        assert_eq!(
            sanitize_name(Some("  Lord \t of   Ash  ")).as_deref(),
            Some("Lord_of_Ash")
        );
        assert_eq!(sanitize_name(Some("a/b\\c:d*e?f\"g<h>i|j")).as_deref(), Some("a_b_c_d_e_f_g_h_i_j"));
        assert_eq!(sanitize_name(Some("검은 기사")).as_deref(), Some("검은_기사"));
        assert_eq!(sanitize_name(Some("   ")), None);
        assert_eq!(sanitize_name(None), None);
    }

    #[test]
    fn idle_prefers_chapter_theme() {
        let (source, selector) = selector_with(&["audio/bgm/idle.mp3"]);
        assert_eq!(selector.idle_for(2), BgmTrack::Idle.key());

        source.insert("audio/bgm/idle_ch2.ogg");
        assert_eq!(selector.idle_for(2), ResourceKey::chapter_idle(2));
        assert_eq!(selector.idle_for(0), BgmTrack::Idle.key());
    }

    #[test]
    fn chapter_boss_beats_named_boss() {
        let (_, selector) = selector_with(&[
            "audio/bgm/boss_ch3.mp3",
            "audio/bgm/boss_Iron_Golem.mp3",
            "audio/bgm/battle1.mp3",
        ]);
        assert_eq!(
            selector.battle_for(3, Some("Iron Golem"), true),
            Some(ResourceKey::chapter_boss(3))
        );
    }

    #[test]
    fn named_boss_uses_sanitized_name() {
        let (_, selector) = selector_with(&["audio/bgm/boss_Iron_Golem.wav", "audio/bgm/battle1.mp3"]);
        assert_eq!(
            selector.battle_for(3, Some("Iron Golem"), true),
            Some(ResourceKey::new("/audio/bgm/boss_Iron_Golem"))
        );
    }

    #[test]
    fn blank_enemy_skips_named_boss() {
        let (_, selector) = selector_with(&["audio/bgm/boss_.mp3", "audio/bgm/battle2.mp3"]);
        assert_eq!(
            selector.battle_for(0, Some("  "), true),
            Some(ResourceKey::new("/audio/bgm/battle2"))
        );
    }

    #[test]
    fn non_boss_ignores_boss_themes() {
        let (_, selector) = selector_with(&["audio/bgm/boss_ch1.mp3", "audio/bgm/battle3.mp3"]);
        assert_eq!(
            selector.battle_for(1, Some("Slime"), false),
            Some(ResourceKey::new("/audio/bgm/battle3"))
        );
    }

    #[test]
    fn rotation_is_fair() {
        let (_, selector) = selector_with(&[
            "audio/bgm/battle1.mp3",
            "audio/bgm/battle2.mp3",
            "audio/bgm/battle3.mp3",
        ]);
        let n = 10;
        let mut visits: HashMap<ResourceKey, usize> = HashMap::new();
        for _ in 0..n {
            *visits.entry(selector.next_battle().unwrap()).or_default() += 1;
        }
        assert_eq!(visits.len(), 3);
        assert!(visits.values().all(|&count| count == n / 3 || count == n / 3 + 1));
        assert_eq!(selector.cycle().position(), n % 3);
    }

    #[test]
    fn cursor_advances_even_when_nothing_resolves() {
        let (source, selector) = selector_with(&[]);
        for _ in 0..4 {
            assert_eq!(selector.next_battle(), None);
        }
        assert_eq!(selector.cycle().position(), 4 % 3);

        source.insert("audio/bgm/battle.ogg");
        assert_eq!(selector.next_battle(), Some(BgmTrack::Battle.key()));
        assert_eq!(selector.cycle().position(), 5 % 3);
    }

    #[test]
    fn missing_theme_is_skipped_without_stalling_rotation() {
        let (_, selector) = selector_with(&["audio/bgm/battle1.mp3", "audio/bgm/battle3.mp3"]);
        let picks: Vec<_> = (0..3).map(|_| selector.next_battle().unwrap()).collect();
        assert_eq!(
            picks,
            vec![
                ResourceKey::new("/audio/bgm/battle1"),
                ResourceKey::new("/audio/bgm/battle3"),
                ResourceKey::new("/audio/bgm/battle3"),
            ]
        );
    }

    #[test]
    fn empty_cycle_falls_back_to_generic_battle() {
        let source = Arc::new(MemorySource::with_entries(["audio/bgm/battle.mp3"]));
        let resolver = Arc::new(ResourceResolver::new(source));
        let selector = TrackSelector::with_cycle(resolver, BattleCycle::new(Vec::new()));
        assert_eq!(selector.next_battle(), Some(BgmTrack::Battle.key()));
    }
}
