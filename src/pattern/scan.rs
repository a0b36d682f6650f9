//! Scan driver: run a compiled pattern across a line.

use super::ast::{GroupId, Matcher};
use super::matcher::eval;
use super::parser::{PatternError, parse_with_groups};
use super::state::MatchState;

/// A parsed pattern, ready to be matched against any number of lines.
///
/// The tree is never modified after construction, so one instance can be
/// shared (usually behind an `Arc`) by concurrent scans.
#[derive(Debug)]
pub struct CompiledPattern {
    source: String,
    matcher: Matcher,
    group_count: GroupId,
}

impl CompiledPattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let parsed = parse_with_groups(pattern)?;
        Ok(Self {
            source: pattern.to_string(),
            matcher: parsed.matcher,
            group_count: parsed.group_count,
        })
    }

    /// The pattern text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Number of capture groups in the pattern.
    pub fn group_count(&self) -> GroupId {
        self.group_count
    }

    /// True when the pattern text starts with `^`, in which case only offset
    /// 0 is tried by [`is_match`](Self::is_match).
    pub fn is_anchored_start(&self) -> bool {
        self.source.starts_with('^')
    }

    /// All non-overlapping matches in `line`, left to right.
    ///
    /// At each start offset the longest reachable match is taken; the scan
    /// then resumes at its end, or one past the start for an empty match.
    /// Offsets run up to and including `line`'s length, so a zero-width
    /// pattern can also match at the very end.
    pub fn find_all(&self, line: &str) -> Vec<String> {
        let chars: Vec<char> = line.chars().collect();
        let mut matches = Vec::new();
        let mut start = 0usize;
        while start <= chars.len() {
            match self.longest_at(&chars, start) {
                Some(end) => {
                    matches.push(chars[start..end].iter().collect());
                    start = end.max(start + 1);
                }
                None => start += 1,
            }
        }
        matches
    }

    /// Whether the pattern matches anywhere in `line`.
    pub fn is_match(&self, line: &str) -> bool {
        let chars: Vec<char> = line.chars().collect();
        if self.is_anchored_start() {
            return self.matches_at(&chars, 0);
        }
        (0..=chars.len()).any(|start| self.matches_at(&chars, start))
    }

    fn matches_at(&self, chars: &[char], start: usize) -> bool {
        !eval(&self.matcher, chars, &MatchState::start(start)).is_empty()
    }

    /// Furthest end position reachable from `start`, if any path succeeds.
    fn longest_at(&self, chars: &[char], start: usize) -> Option<usize> {
        eval(&self.matcher, chars, &MatchState::start(start))
            .iter()
            .map(MatchState::position)
            .max()
    }
}
