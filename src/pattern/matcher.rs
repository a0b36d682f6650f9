//! Matcher evaluation: apply a [`Matcher`] tree to a line from a given state.
//!
//! All positions are **character** (not byte) indices into the line.
//!
//! Every node maps `(line, state)` to the *set* of states it can end in.
//! Failure is an empty set, never an error. Alternation explores both
//! branches and repetition collects every reachable repetition count, so the
//! caller sees all end positions and can pick the longest.

use super::ast::{GroupId, Matcher, Repeat};
use super::char_class::{class_matches, is_digit, is_word};
use super::state::{MatchState, StateSet};

/// Evaluate `matcher` against `line` starting from `state`.
pub fn eval(matcher: &Matcher, line: &[char], state: &MatchState) -> StateSet {
    match matcher {
        Matcher::Literal(c) => single_char(line, state, |ch| ch == *c),
        Matcher::Digit => single_char(line, state, is_digit),
        Matcher::Word => single_char(line, state, is_word),
        Matcher::AnyChar => single_char(line, state, |_| true),
        Matcher::CharClass(class) => single_char(line, state, |ch| class_matches(class, ch)),
        Matcher::AnchorStart => zero_width(state, state.position() == 0),
        Matcher::AnchorEnd => zero_width(state, state.position() == line.len()),
        Matcher::Sequence(nodes) => eval_sequence(nodes, line, state),
        Matcher::Alternation(left, right) => {
            let mut states = eval(left, line, state);
            states.extend(eval(right, line, state));
            states
        }
        Matcher::Optional(inner) => {
            let mut states = eval(inner, line, state);
            states.insert(state.clone());
            states
        }
        Matcher::Plus(inner) => {
            let first = eval(inner, line, state);
            closure(inner, line, first.clone(), first)
        }
        Matcher::Star(inner) => {
            let seed = StateSet::from([state.clone()]);
            closure(inner, line, seed.clone(), seed)
        }
        Matcher::Bounded(inner, repeat) => eval_bounded(inner, *repeat, line, state),
        Matcher::CaptureGroup(inner, id) => eval_capture(inner, *id, line, state),
        Matcher::Backreference(id) => eval_backreference(*id, line, state),
    }
}

// ─── Leaves ─────────────────────────────────────────────────────────────────

fn single_char(line: &[char], state: &MatchState, accept: impl Fn(char) -> bool) -> StateSet {
    match line.get(state.position()) {
        Some(&ch) if accept(ch) => StateSet::from([state.advance(1)]),
        _ => StateSet::new(),
    }
}

fn zero_width(state: &MatchState, ok: bool) -> StateSet {
    if ok {
        StateSet::from([state.clone()])
    } else {
        StateSet::new()
    }
}

fn eval_backreference(id: GroupId, line: &[char], state: &MatchState) -> StateSet {
    let Some(text) = state.group(id) else {
        return StateSet::new();
    };
    let rest = line.get(state.position()..).unwrap_or_default();
    let mut len = 0usize;
    for expected in text.chars() {
        if rest.get(len) != Some(&expected) {
            return StateSet::new();
        }
        len += 1;
    }
    StateSet::from([state.advance(len)])
}

// ─── Combinators ────────────────────────────────────────────────────────────

/// Apply `matcher` to every state in `states` and union the results.
fn step<'a>(
    matcher: &Matcher,
    line: &[char],
    states: impl IntoIterator<Item = &'a MatchState>,
) -> StateSet {
    let mut next = StateSet::new();
    for s in states {
        next.extend(eval(matcher, line, s));
    }
    next
}

fn eval_sequence(nodes: &[Matcher], line: &[char], state: &MatchState) -> StateSet {
    let mut states = StateSet::from([state.clone()]);
    for node in nodes {
        states = step(node, line, &states);
        if states.is_empty() {
            break;
        }
    }
    states
}

/// Fixed-point iteration for unbounded repetition.
///
/// Repeatedly applies `matcher` to the newest states in `frontier`, adding
/// anything not yet in `reached`, until an application discovers nothing new.
/// Terminates because a line admits only finitely many distinct states.
fn closure(
    matcher: &Matcher,
    line: &[char],
    mut frontier: StateSet,
    mut reached: StateSet,
) -> StateSet {
    while !frontier.is_empty() {
        frontier = step(matcher, line, &frontier)
            .into_iter()
            .filter(|s| !reached.contains(s))
            .collect();
        reached.extend(frontier.iter().cloned());
    }
    reached
}

fn eval_bounded(inner: &Matcher, repeat: Repeat, line: &[char], state: &MatchState) -> StateSet {
    // Mandatory repetitions. Paths are kept as a list; duplicates collapse at the end.
    let mut paths = vec![state.clone()];
    for _ in 0..repeat.min {
        paths = paths.iter().flat_map(|s| eval(inner, line, s)).collect();
        if paths.is_empty() {
            return StateSet::new();
        }
    }

    match repeat.max {
        None => {
            let seed: StateSet = paths.into_iter().collect();
            closure(inner, line, seed.clone(), seed)
        }
        Some(max) => {
            let mut accepted: StateSet = paths.into_iter().collect();
            let mut frontier = accepted.clone();
            for _ in repeat.min..max {
                // Stop as soon as a round adds nothing: zero-width repeats
                // would otherwise spin through all remaining rounds.
                frontier = step(inner, line, &frontier)
                    .into_iter()
                    .filter(|s| !accepted.contains(s))
                    .collect();
                if frontier.is_empty() {
                    break;
                }
                accepted.extend(frontier.iter().cloned());
            }
            accepted
        }
    }
}

fn eval_capture(inner: &Matcher, id: GroupId, line: &[char], state: &MatchState) -> StateSet {
    let start = state.position();
    eval(inner, line, state)
        .into_iter()
        .map(|end| {
            let text: String = line[start..end.position()].iter().collect();
            end.with_group(id, &text)
        })
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────────────
