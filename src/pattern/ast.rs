//! Matcher tree types for compiled patterns.

use std::fmt;

use itertools::Itertools;

/// Identifier of a capture group. Groups are numbered from 1 in the order
/// their opening parentheses appear in the pattern.
pub type GroupId = u32;

/// One node of a compiled pattern.
///
/// The tree is immutable once built; per-match data lives in
/// [`MatchState`](super::state::MatchState) values, never in the nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    Literal(char),
    Digit,                       // \d
    Word,                        // \w
    AnyChar,                     // .
    CharClass(CharClass),        // [...] / [^...]
    AnchorStart,                 // ^
    AnchorEnd,                   // $
    Sequence(Vec<Matcher>),
    Alternation(Box<Matcher>, Box<Matcher>),
    Optional(Box<Matcher>),      // ?
    Plus(Box<Matcher>),          // +
    Star(Box<Matcher>),          // *
    Bounded(Box<Matcher>, Repeat),
    CaptureGroup(Box<Matcher>, GroupId),
    Backreference(GroupId),
}

/// A literal set of characters, optionally negated. Ranges are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub negated: bool,
    pub chars: Vec<char>,
}

/// Bounds of a `{n}`, `{n,}` or `{n,m}` quantifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
    pub min: usize,
    /// `None` means unbounded (`{n,}`).
    pub max: Option<usize>,
}

impl Repeat {
    pub fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }
}

/// Characters that must be escaped to be read back as literals.
const META: &[char] = &[
    '\\', '^', '$', '.', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}',
];

fn write_literal(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    // A digit after a backslash would read back as a backreference, and
    // `\d`/`\w` as classes, so those stay unescaped.
    if META.contains(&c) {
        write!(f, "\\{c}")
    } else {
        write!(f, "{c}")
    }
}

impl Matcher {
    /// True for nodes that need parentheses when a quantifier is applied.
    fn needs_group_for_quantifier(&self) -> bool {
        matches!(
            self,
            Self::Sequence(_)
                | Self::Alternation(..)
                | Self::Optional(_)
                | Self::Plus(_)
                | Self::Star(_)
                | Self::Bounded(..)
        )
    }

    fn fmt_quantified(&self, f: &mut fmt::Formatter<'_>, suffix: &str) -> fmt::Result {
        if self.needs_group_for_quantifier() {
            // Only reachable for hand-built trees: the parser always wraps
            // compound operands in a capture group.
            write!(f, "({self}){suffix}")
        } else {
            write!(f, "{self}{suffix}")
        }
    }
}

/// Renders the canonical pattern text of a tree.
///
/// Capture groups render as `(...)`; a tree produced by the parser renders to
/// a string that parses back to an equal tree.
impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(c) => write_literal(f, *c),
            Self::Digit => write!(f, "\\d"),
            Self::Word => write!(f, "\\w"),
            Self::AnyChar => write!(f, "."),
            Self::CharClass(class) => {
                let caret = if class.negated { "^" } else { "" };
                write!(f, "[{caret}{}]", class.chars.iter().join(""))
            }
            Self::AnchorStart => write!(f, "^"),
            Self::AnchorEnd => write!(f, "$"),
            Self::Sequence(nodes) => {
                for node in nodes {
                    match node {
                        Self::Alternation(..) => write!(f, "({node})")?,
                        _ => write!(f, "{node}")?,
                    }
                }
                Ok(())
            }
            Self::Alternation(left, right) => write!(f, "{left}|{right}"),
            Self::Optional(inner) => inner.fmt_quantified(f, "?"),
            Self::Plus(inner) => inner.fmt_quantified(f, "+"),
            Self::Star(inner) => inner.fmt_quantified(f, "*"),
            Self::Bounded(inner, repeat) => {
                let suffix = match repeat.max {
                    Some(max) if max == repeat.min => format!("{{{}}}", repeat.min),
                    Some(max) => format!("{{{},{}}}", repeat.min, max),
                    None => format!("{{{},}}", repeat.min),
                };
                inner.fmt_quantified(f, &suffix)
            }
            Self::CaptureGroup(inner, _) => write!(f, "({inner})"),
            Self::Backreference(id) => write!(f, "\\{id}"),
        }
    }
}
