//! Match state: how far one matching path has consumed the line, and what
//! each capture group holds along that path.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::ast::GroupId;

/// The set of states reachable after applying a matcher.
pub type StateSet = HashSet<MatchState>;

/// One path through a match.
///
/// States are values: matchers derive new states with [`advance`](Self::advance)
/// and [`with_group`](Self::with_group) and never modify an existing one.
/// Two states are equal (and hash equally) when both the position and the
/// captured groups agree, so set-based deduplication keeps paths that reach
/// the same position with different captures apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchState {
    pos: usize,
    groups: BTreeMap<GroupId, Arc<str>>,
}

impl MatchState {
    /// A fresh state at `pos` with no groups captured.
    pub fn start(pos: usize) -> Self {
        Self {
            pos,
            groups: BTreeMap::new(),
        }
    }

    /// Character offset into the line.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Text most recently captured by group `id` on this path.
    pub fn group(&self, id: GroupId) -> Option<&str> {
        self.groups.get(&id).map(|text| &**text)
    }

    /// Captured groups on this path, in group-id order.
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &str)> {
        self.groups.iter().map(|(id, text)| (*id, &**text))
    }

    /// The same state moved forward by `n` characters.
    pub fn advance(&self, n: usize) -> Self {
        Self {
            pos: self.pos + n,
            groups: self.groups.clone(),
        }
    }

    /// The same state with group `id` set (or overwritten) to `text`.
    pub fn with_group(&self, id: GroupId, text: &str) -> Self {
        let mut groups = self.groups.clone();
        groups.insert(id, Arc::from(text));
        Self {
            pos: self.pos,
            groups,
        }
    }
}
