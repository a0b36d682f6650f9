//! A line-oriented pattern engine with capture groups and backreferences.
//!
//! # Example
//!
//! ```rust
//! use deepgrep::{find_all_matches, matches_anywhere};
//!
//! let found = find_all_matches("abc 123 def 456", r"\d+").unwrap();
//! assert_eq!(found, vec!["123", "456"]);
//!
//! assert!(matches_anywhere("say hello hello", r"(\w+) \1").unwrap());
//! assert!(find_all_matches("oops", "(unclosed").is_err());
//! ```

use std::sync::Arc;

pub mod pattern;

pub use pattern::{
    CompiledPattern, DEFAULT_CACHE_CAPACITY, Matcher, PatternCache, PatternError, global_cache,
    init_global_cache,
};

/// Compile `pattern` through the process-wide cache.
pub fn compile(pattern: &str) -> Result<Arc<CompiledPattern>, PatternError> {
    global_cache().compile(pattern)
}

/// All non-overlapping, longest-at-each-start matches of `pattern` in `line`.
pub fn find_all_matches(line: &str, pattern: &str) -> Result<Vec<String>, PatternError> {
    Ok(compile(pattern)?.find_all(line))
}

/// Whether `pattern` matches anywhere in `line`.
pub fn matches_anywhere(line: &str, pattern: &str) -> Result<bool, PatternError> {
    Ok(compile(pattern)?.is_match(line))
}
