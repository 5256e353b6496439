use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::RwLock;

use crate::{config::DEFAULT_EXTENSIONS, ResourceKey};

/// Something that can tell whether a concrete candidate (base name plus
/// extension, without leading slash) exists, and where.
pub trait ResourceSource: Send + Sync {
    fn locate(&self, candidate: &str) -> Option<PathBuf>;
}

/// Resources stored as regular files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceSource for DirectorySource {
    fn locate(&self, candidate: &str) -> Option<PathBuf> {
        let path = self.root.join(candidate);
        path.is_file().then_some(path)
    }
}

/// Resources registered at runtime by name. Entries may be added or removed
/// at any point, which is how late-arriving assets are modelled.
#[derive(Debug, Default)]
pub struct MemorySource {
    entries: RwLock<HashSet<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Self::new();
        for entry in entries {
            source.insert(entry);
        }
        source
    }

    /// Registers `candidate`; a leading `/` is ignored.
    pub fn insert(&self, candidate: impl Into<String>) {
        let candidate = candidate.into();
        self.entries
            .write()
            .insert(candidate.trim_start_matches('/').to_string());
    }

    pub fn remove(&self, candidate: &str) -> bool {
        self.entries.write().remove(candidate.trim_start_matches('/'))
    }
}

impl ResourceSource for MemorySource {
    fn locate(&self, candidate: &str) -> Option<PathBuf> {
        self.entries
            .read()
            .contains(candidate)
            .then(|| PathBuf::from(candidate))
    }
}

/// Concrete, loadable locator bound to the key it was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    pub key: ResourceKey,
    pub locator: PathBuf,
}

/// Maps logical base names to concrete resources.
///
/// Successful lookups are cached for the lifetime of the resolver and the
/// first stored binding wins if two threads race on the same key. Misses are
/// never cached, so an asset that appears later is found on the next call.
pub struct ResourceResolver {
    source: Arc<dyn ResourceSource>,
    extensions: Vec<String>,
    resolved: RwLock<HashMap<ResourceKey, Arc<ResolvedResource>>>,
}

impl ResourceResolver {
    pub fn new(source: Arc<dyn ResourceSource>) -> Self {
        Self::with_extensions(
            source,
            DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        )
    }

    pub fn with_extensions(source: Arc<dyn ResourceSource>, extensions: Vec<String>) -> Self {
        Self {
            source,
            extensions,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn resolve(&self, key: &ResourceKey) -> Option<Arc<ResolvedResource>> {
        if key.is_blank() {
            return None;
        }
        if let Some(hit) = self.resolved.read().get(key) {
            return Some(Arc::clone(hit));
        }

        let found = self.probe(key)?;
        let mut resolved = self.resolved.write();
        let entry = resolved
            .entry(key.clone())
            .or_insert_with(|| Arc::new(found));
        tracing::debug!(key = %key, locator = ?entry.locator, "resolved audio resource");
        Some(Arc::clone(entry))
    }

    pub fn exists(&self, key: &ResourceKey) -> bool {
        self.resolve(key).is_some()
    }

    /// Number of keys with a cached binding.
    pub fn cached(&self) -> usize {
        self.resolved.read().len()
    }

    fn probe(&self, key: &ResourceKey) -> Option<ResolvedResource> {
        let stem = key.as_str().trim_start_matches('/');
        self.extensions.iter().find_map(|ext| {
            self.source
                .locate(&format!("{stem}{ext}"))
                .map(|locator| ResolvedResource {
                    key: key.clone(),
                    locator,
                })
        })
    }
}

impl std::fmt::Debug for ResourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceResolver")
            .field("extensions", &self.extensions)
            .field("cached", &self.cached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSource {
        inner: MemorySource,
        probes: AtomicUsize,
    }

    impl ResourceSource for CountingSource {
        fn locate(&self, candidate: &str) -> Option<PathBuf> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.inner.locate(candidate)
        }
    }

    fn resolver_over(source: Arc<MemorySource>) -> ResourceResolver {
        ResourceResolver::new(source)
    }

    #[test]
    fn first_matching_extension_wins() {
        let source = Arc::new(MemorySource::with_entries([
            "audio/bgm/idle.ogg",
            "audio/bgm/idle.wav",
        ]));
        let resolver = resolver_over(source);

        let found = resolver.resolve(&ResourceKey::new("/audio/bgm/idle")).unwrap();
        assert_eq!(found.locator, PathBuf::from("audio/bgm/idle.wav"));
    }

    #[test]
    fn repeated_resolution_returns_the_same_resource() {
        let source = Arc::new(MemorySource::with_entries(["audio/sfx/hit.mp3"]));
        let resolver = resolver_over(source.clone());
        let key = ResourceKey::new("/audio/sfx/hit");

        let first = resolver.resolve(&key).unwrap();
        source.remove("audio/sfx/hit.mp3");
        let second = resolver.resolve(&key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn misses_are_not_cached() {
        let source = Arc::new(MemorySource::new());
        let resolver = resolver_over(source.clone());
        let key = ResourceKey::new("/audio/bgm/idle_ch9");

        assert!(resolver.resolve(&key).is_none());
        assert!(resolver.resolve(&key).is_none());
        assert_eq!(resolver.cached(), 0);

        source.insert("/audio/bgm/idle_ch9.m4a");
        let found = resolver.resolve(&key).unwrap();
        assert_eq!(found.key, key);
        assert_eq!(resolver.cached(), 1);
    }

    #[test]
    fn cached_hits_skip_the_source() {
        let source = Arc::new(CountingSource {
            inner: MemorySource::with_entries(["audio/bgm/battle1.mp3"]),
            probes: AtomicUsize::new(0),
        });
        let resolver = ResourceResolver::new(source.clone());
        let key = ResourceKey::new("/audio/bgm/battle1");

        resolver.resolve(&key).unwrap();
        let after_first = source.probes.load(Ordering::SeqCst);
        for _ in 0..5 {
            resolver.resolve(&key).unwrap();
        }
        assert_eq!(source.probes.load(Ordering::SeqCst), after_first);
    }

    #[test]
    fn concurrent_resolution_agrees_on_one_binding() {
        let source = Arc::new(MemorySource::with_entries(["audio/bgm/idle.mp3"]));
        let resolver = Arc::new(resolver_over(source));
        let key = ResourceKey::new("/audio/bgm/idle");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                let key = key.clone();
                std::thread::spawn(move || resolver.resolve(&key).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let reference = resolver.resolve(&key).unwrap();
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &reference)));
    }

    #[test]
    fn blank_keys_never_resolve() {
        let source = Arc::new(MemorySource::with_entries([".mp3"]));
        let resolver = resolver_over(source);
        assert!(resolver.resolve(&ResourceKey::new("")).is_none());
        assert!(resolver.resolve(&ResourceKey::new("   ")).is_none());
    }

    #[test]
    fn directory_source_only_accepts_files() {
        let root = std::env::temp_dir().join(format!("tale-audio-assets-{}", std::process::id()));
        let bgm = root.join("audio/bgm");
        std::fs::create_dir_all(bgm.join("idle.ogg")).unwrap();
        std::fs::write(bgm.join("battle.ogg"), b"OggS").unwrap();

        let resolver = ResourceResolver::new(Arc::new(DirectorySource::new(&root)));
        assert!(resolver.resolve(&ResourceKey::new("/audio/bgm/idle")).is_none());
        let battle = resolver.resolve(&ResourceKey::new("/audio/bgm/battle")).unwrap();
        assert_eq!(battle.locator, bgm.join("battle.ogg"));

        let _ = std::fs::remove_dir_all(&root);
    }
}
