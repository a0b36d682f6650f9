//! Bounded least-recently-used cache of compiled patterns.
//!
//! Lookup, insertion and eviction all happen under one mutex so recency
//! order stays consistent when several threads compile at once. Matching
//! itself never touches the cache: callers get an `Arc` to an immutable
//! [`CompiledPattern`] and scan without further locking.

use std::num::NonZero;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use lru::LruCache;
use tracing::{debug, trace};

use super::parser::PatternError;
use super::scan::CompiledPattern;

/// Capacity of the process-wide cache unless configured otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Memoizes [`CompiledPattern::new`] by pattern text.
#[derive(Debug)]
pub struct PatternCache {
    inner: Mutex<CacheInner>,
}

#[derive(Debug)]
struct CacheInner {
    entries: LruCache<String, Arc<CompiledPattern>>,
    /// Number of times a pattern had to be parsed (hits do not count).
    parses: usize,
}

impl PatternCache {
    /// Create an empty cache holding at most `capacity` patterns (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZero::new(capacity).unwrap_or(NonZero::<usize>::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                parses: 0,
            }),
        }
    }

    /// Return the compiled form of `pattern`, parsing it only on a miss.
    ///
    /// A hit marks the entry as most recently used. Patterns that fail to
    /// parse are not cached.
    pub fn compile(&self, pattern: &str) -> Result<Arc<CompiledPattern>, PatternError> {
        let mut inner = self.lock();

        if let Some(compiled) = inner.entries.get(pattern) {
            trace!(pattern, "pattern cache hit");
            return Ok(Arc::clone(compiled));
        }

        inner.parses += 1;
        let compiled = match CompiledPattern::new(pattern) {
            Ok(compiled) => Arc::new(compiled),
            Err(err) => {
                debug!(pattern, error = %err, "pattern failed to parse");
                return Err(err);
            }
        };
        debug!(pattern, tree = %compiled.matcher(), "compiled pattern");

        // The key was just missed, so anything handed back is an eviction.
        if let Some((evicted, _)) = inner
            .entries
            .push(pattern.to_string(), Arc::clone(&compiled))
        {
            debug!(pattern = %evicted, "evicted least recently used pattern");
        }
        Ok(compiled)
    }

    /// Whether `pattern` is currently cached. Does not affect recency.
    pub fn contains(&self, pattern: &str) -> bool {
        self.lock().entries.contains(pattern)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().entries.cap().get()
    }

    /// How many times [`compile`](Self::compile) has had to run the parser.
    pub fn parse_count(&self) -> usize {
        self.lock().parses
    }

    /// Drop every cached pattern. The parse counter is kept.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // Entries are only replaced wholesale, so a panic elsewhere cannot
        // leave a half-written entry behind.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

static GLOBAL_CACHE: OnceLock<PatternCache> = OnceLock::new();

/// Create the process-wide cache with the given capacity.
///
/// Returns `false` if the cache already exists (it was initialized earlier
/// or has already been used), in which case its capacity is unchanged.
pub fn init_global_cache(capacity: usize) -> bool {
    let installed = GLOBAL_CACHE.set(PatternCache::new(capacity)).is_ok();
    if !installed {
        debug!(capacity, "global pattern cache already initialized");
    }
    installed
}

/// The process-wide cache, created with [`DEFAULT_CACHE_CAPACITY`] on first use.
pub fn global_cache() -> &'static PatternCache {
    GLOBAL_CACHE.get_or_init(PatternCache::default)
}
