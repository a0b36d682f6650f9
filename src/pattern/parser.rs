//! Recursive descent parser for pattern strings.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expression := term ('|' term)*
//! term       := factor+
//! factor     := atom quantifier?
//! quantifier := '?' | '+' | '*' | '{' digits (',' digits?)? '}'
//! atom       := '^' | '$' | '.' | '\' escape | '[' class ']' | '(' expression ')' | literal
//! ```

use phf::{Map, phf_map};

use super::ast::{CharClass, GroupId, Matcher, Repeat};

/// Errors that can occur while parsing a pattern.
///
/// Every variant records the cursor position (in characters) at which the
/// parser gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Input left over where an atom or the end of the pattern was expected,
    /// e.g. an unbalanced `)`.
    UnexpectedChar { ch: char, pos: usize },
    /// A term with no factors: `a|`, `|a`, `()`, or an empty pattern.
    EmptyTerm { found: Option<char>, pos: usize },
    /// A `\` at the very end of the pattern.
    DanglingEscape { pos: usize },
    /// `[` without a closing `]`.
    UnterminatedClass { pos: usize },
    /// `(` without a closing `)`.
    UnclosedGroup { pos: usize },
    /// `{` not followed by `n}`, `n,}` or `n,m}`.
    MalformedQuantifier { found: Option<char>, pos: usize },
    /// `{n,m}` with `m < n`.
    InvalidRepeatRange { min: usize, max: usize, pos: usize },
}

impl PatternError {
    /// Cursor position at which parsing failed.
    pub fn position(&self) -> usize {
        match self {
            Self::UnexpectedChar { pos, .. }
            | Self::EmptyTerm { pos, .. }
            | Self::DanglingEscape { pos }
            | Self::UnterminatedClass { pos }
            | Self::UnclosedGroup { pos }
            | Self::MalformedQuantifier { pos, .. }
            | Self::InvalidRepeatRange { pos, .. } => *pos,
        }
    }

    /// The character that triggered the error, or `None` at end of pattern.
    pub fn offending_char(&self) -> Option<char> {
        match self {
            Self::UnexpectedChar { ch, .. } => Some(*ch),
            Self::EmptyTerm { found, .. } | Self::MalformedQuantifier { found, .. } => *found,
            Self::DanglingEscape { .. } => Some('\\'),
            Self::InvalidRepeatRange { .. } => Some('}'),
            Self::UnterminatedClass { .. } | Self::UnclosedGroup { .. } => None,
        }
    }
}

fn describe(found: Option<char>) -> String {
    match found {
        Some(c) => format!("{c:?}"),
        None => "end of pattern".to_string(),
    }
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedChar { ch, pos } => {
                write!(f, "Unexpected character {ch:?} at position {pos}")
            }
            Self::EmptyTerm { found, pos } => write!(
                f,
                "Expected term at position {pos}, found {}",
                describe(*found)
            ),
            Self::DanglingEscape { pos } => {
                write!(f, "Dangling backslash at end of pattern (position {pos})")
            }
            Self::UnterminatedClass { pos } => {
                write!(f, "Unterminated character class at position {pos}")
            }
            Self::UnclosedGroup { pos } => write!(f, "Unclosed group '(' at position {pos}"),
            Self::MalformedQuantifier { found, pos } => write!(
                f,
                "Malformed quantifier at position {pos}: expected {{n}}, {{n,}} or {{n,m}}, found {}",
                describe(*found)
            ),
            Self::InvalidRepeatRange { min, max, pos } => write!(
                f,
                "Invalid quantifier range {{{min},{max}}} at position {pos}"
            ),
        }
    }
}

impl std::error::Error for PatternError {}

/// Escapes that stand for a character class rather than a literal.
const ESCAPE_CLASSES: Map<char, Matcher> = phf_map! {
    'd' => Matcher::Digit,
    'w' => Matcher::Word,
};

/// Output of a successful parse.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub(crate) matcher: Matcher,
    /// Number of capture groups opened by the pattern.
    pub(crate) group_count: GroupId,
}

/// Parse a pattern string into a [`Matcher`] tree.
pub fn parse(pattern: &str) -> Result<Matcher, PatternError> {
    parse_with_groups(pattern).map(|parsed| parsed.matcher)
}

/// Parse a pattern string, also reporting how many capture groups it opened.
pub(crate) fn parse_with_groups(pattern: &str) -> Result<Parsed, PatternError> {
    let mut parser = Parser {
        chars: pattern.chars().collect(),
        pos: 0,
        next_group: 1,
    };
    let matcher = parser.parse_pattern()?;
    Ok(Parsed {
        matcher,
        group_count: parser.next_group - 1,
    })
}

/// Cursor over the pattern text.
struct Parser {
    chars: Vec<char>,
    pos: usize,
    next_group: GroupId,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn parse_pattern(&mut self) -> Result<Matcher, PatternError> {
        let expr = self.parse_expression()?;
        match self.peek() {
            None => Ok(expr),
            Some(ch) => Err(PatternError::UnexpectedChar { ch, pos: self.pos }),
        }
    }

    /// `a|b|c` becomes `Alternation(Alternation(a, b), c)`.
    fn parse_expression(&mut self) -> Result<Matcher, PatternError> {
        let mut left = self.parse_term()?;
        while self.peek() == Some('|') {
            self.bump();
            let right = self.parse_term()?;
            left = Matcher::Alternation(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Matcher, PatternError> {
        let mut factors = Vec::new();
        while let Some(ch) = self.peek() {
            if ch == ')' || ch == '|' {
                break;
            }
            factors.push(self.parse_factor()?);
        }
        match factors.len() {
            0 => Err(PatternError::EmptyTerm {
                found: self.peek(),
                pos: self.pos,
            }),
            1 => Ok(factors.remove(0)),
            _ => Ok(Matcher::Sequence(factors)),
        }
    }

    fn parse_factor(&mut self) -> Result<Matcher, PatternError> {
        let atom = self.parse_atom()?;
        let quantified = match self.peek() {
            Some('?') => Matcher::Optional(Box::new(atom)),
            Some('+') => Matcher::Plus(Box::new(atom)),
            Some('*') => Matcher::Star(Box::new(atom)),
            Some('{') => {
                self.bump();
                let repeat = self.parse_repeat()?;
                return Ok(Matcher::Bounded(Box::new(atom), repeat));
            }
            _ => return Ok(atom),
        };
        self.bump();
        Ok(quantified)
    }

    /// Parse the body of `{n}`, `{n,}` or `{n,m}` (the `{` has been consumed).
    fn parse_repeat(&mut self) -> Result<Repeat, PatternError> {
        let min = self.parse_number()?;
        let repeat = match self.bump() {
            Some('}') => return Ok(Repeat::exactly(min)),
            Some(',') if self.peek() == Some('}') => Repeat::at_least(min),
            Some(',') => {
                let max = self.parse_number()?;
                if max < min {
                    return Err(PatternError::InvalidRepeatRange {
                        min,
                        max,
                        pos: self.pos,
                    });
                }
                Repeat::between(min, max)
            }
            found => {
                return Err(PatternError::MalformedQuantifier {
                    found,
                    pos: self.pos.saturating_sub(usize::from(found.is_some())),
                });
            }
        };
        match self.bump() {
            Some('}') => Ok(repeat),
            found => Err(PatternError::MalformedQuantifier {
                found,
                pos: self.pos.saturating_sub(usize::from(found.is_some())),
            }),
        }
    }

    fn parse_number(&mut self) -> Result<usize, PatternError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<usize>()
            .map_err(|_| PatternError::MalformedQuantifier {
                found: self.peek(),
                pos: self.pos,
            })
    }

    fn parse_atom(&mut self) -> Result<Matcher, PatternError> {
        let pos = self.pos;
        let Some(ch) = self.bump() else {
            return Err(PatternError::EmptyTerm { found: None, pos });
        };
        match ch {
            '^' => Ok(Matcher::AnchorStart),
            '$' => Ok(Matcher::AnchorEnd),
            '.' => Ok(Matcher::AnyChar),
            '\\' => self.parse_escape(),
            '[' => self.parse_class(),
            '(' => self.parse_group(),
            c => Ok(Matcher::Literal(c)),
        }
    }

    /// `\d`, `\w`, `\<digit>` (backreference), or an escaped literal.
    fn parse_escape(&mut self) -> Result<Matcher, PatternError> {
        let Some(ch) = self.bump() else {
            return Err(PatternError::DanglingEscape {
                pos: self.pos.saturating_sub(1),
            });
        };
        if let Some(id) = ch.to_digit(10) {
            return Ok(Matcher::Backreference(id));
        }
        Ok(ESCAPE_CLASSES
            .get(&ch)
            .cloned()
            .unwrap_or(Matcher::Literal(ch)))
    }

    /// `[abc]` or `[^abc]` (the `[` has been consumed). No ranges.
    fn parse_class(&mut self) -> Result<Matcher, PatternError> {
        let negated = self.peek() == Some('^');
        if negated {
            self.bump();
        }
        let mut chars = Vec::new();
        loop {
            match self.bump() {
                Some(']') => break,
                Some(c) => chars.push(c),
                None => return Err(PatternError::UnterminatedClass { pos: self.pos }),
            }
        }
        Ok(Matcher::CharClass(CharClass { negated, chars }))
    }

    /// `( expression )` (the `(` has been consumed). Group ids are handed out
    /// as opening parentheses are seen, so `((a)b)` numbers the outer group 1.
    fn parse_group(&mut self) -> Result<Matcher, PatternError> {
        let id = self.next_group;
        self.next_group += 1;
        let expr = self.parse_expression()?;
        match self.bump() {
            Some(')') => Ok(Matcher::CaptureGroup(Box::new(expr), id)),
            _ => Err(PatternError::UnclosedGroup { pos: self.pos }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(s: &str) -> Matcher {
        parse(s).expect("parse should succeed")
    }
    fn parse_err(s: &str) -> PatternError {
        parse(s).expect_err("parse should fail")
    }

    fn lit(c: char) -> Matcher {
        Matcher::Literal(c)
    }

    // --- Atoms ---

    #[test]
    fn single_literal_is_not_wrapped() {
        assert_eq!(parse_ok("a"), lit('a'));
    }

    #[test]
    fn literals_form_a_sequence() {
        assert_eq!(
            parse_ok("abc"),
            Matcher::Sequence(vec![lit('a'), lit('b'), lit('c')])
        );
    }

    #[test]
    fn anchors_and_dot() {
        assert_eq!(
            parse_ok("^.$"),
            Matcher::Sequence(vec![Matcher::AnchorStart, Matcher::AnyChar, Matcher::AnchorEnd])
        );
    }

    #[test]
    fn escapes() {
        assert_eq!(parse_ok("\\d"), Matcher::Digit);
        assert_eq!(parse_ok("\\w"), Matcher::Word);
        assert_eq!(parse_ok("\\."), lit('.'));
        assert_eq!(parse_ok("\\\\"), lit('\\'));
        assert_eq!(parse_ok("\\3"), Matcher::Backreference(3));
    }

    #[test]
    fn char_class() {
        assert_eq!(
            parse_ok("[abc]"),
            Matcher::CharClass(CharClass {
                negated: false,
                chars: vec!['a', 'b', 'c'],
            })
        );
    }

    #[test]
    fn negated_char_class_has_no_ranges() {
        assert_eq!(
            parse_ok("[^a-c]"),
            Matcher::CharClass(CharClass {
                negated: true,
                chars: vec!['a', '-', 'c'],
            })
        );
    }

    #[test]
    fn metachars_lose_meaning_inside_class() {
        match parse_ok("[.*(]") {
            Matcher::CharClass(class) => assert_eq!(class.chars, vec!['.', '*', '(']),
            other => panic!("expected CharClass, got {other:?}"),
        }
    }

    // --- Quantifiers ---

    #[test]
    fn simple_quantifiers() {
        assert_eq!(parse_ok("a?"), Matcher::Optional(Box::new(lit('a'))));
        assert_eq!(parse_ok("a+"), Matcher::Plus(Box::new(lit('a'))));
        assert_eq!(parse_ok("a*"), Matcher::Star(Box::new(lit('a'))));
    }

    #[test]
    fn quantifier_binds_to_previous_atom_only() {
        assert_eq!(
            parse_ok("ab+"),
            Matcher::Sequence(vec![lit('a'), Matcher::Plus(Box::new(lit('b')))])
        );
    }

    #[test]
    fn second_quantifier_is_a_literal() {
        assert_eq!(
            parse_ok("a*?"),
            Matcher::Sequence(vec![Matcher::Star(Box::new(lit('a'))), lit('?')])
        );
    }

    #[test]
    fn bounded_quantifiers() {
        let bounded = |r| Matcher::Bounded(Box::new(lit('a')), r);
        assert_eq!(parse_ok("a{3}"), bounded(Repeat::exactly(3)));
        assert_eq!(parse_ok("a{3,}"), bounded(Repeat::at_least(3)));
        assert_eq!(parse_ok("a{2,5}"), bounded(Repeat::between(2, 5)));
    }

    #[test]
    fn leading_quantifier_char_is_literal() {
        assert_eq!(parse_ok("*"), lit('*'));
        assert_eq!(parse_ok("{"), lit('{'));
    }

    // --- Alternation and groups ---

    #[test]
    fn alternation_is_left_biased() {
        assert_eq!(
            parse_ok("a|b|c"),
            Matcher::Alternation(
                Box::new(Matcher::Alternation(Box::new(lit('a')), Box::new(lit('b')))),
                Box::new(lit('c'))
            )
        );
    }

    #[test]
    fn alternation_has_lowest_precedence() {
        assert_eq!(
            parse_ok("ab|c"),
            Matcher::Alternation(
                Box::new(Matcher::Sequence(vec![lit('a'), lit('b')])),
                Box::new(lit('c'))
            )
        );
    }

    #[test]
    fn groups_are_numbered_by_opening_paren() {
        let parsed = parse_with_groups("((a)(b))").unwrap();
        assert_eq!(parsed.group_count, 3);
        assert_eq!(
            parsed.matcher,
            Matcher::CaptureGroup(
                Box::new(Matcher::Sequence(vec![
                    Matcher::CaptureGroup(Box::new(lit('a')), 2),
                    Matcher::CaptureGroup(Box::new(lit('b')), 3),
                ])),
                1
            )
        );
    }

    #[test]
    fn quantified_group() {
        assert_eq!(
            parse_ok("(ab)+"),
            Matcher::Plus(Box::new(Matcher::CaptureGroup(
                Box::new(Matcher::Sequence(vec![lit('a'), lit('b')])),
                1
            )))
        );
    }

    // --- Rendering ---

    #[test]
    fn rendering_parses_back_to_the_same_tree() {
        for pattern in [
            "abc",
            "^a.b$",
            "(\\w+)\\s+\\1|foo(bar)?|a.*b+",
            "[^xy]{2,}",
            "a\\.b\\(c\\)",
            "(a|b)*c{3}",
            "x{1,4}?",
        ] {
            let tree = parse_ok(pattern);
            assert_eq!(parse_ok(&tree.to_string()), tree, "pattern {pattern}");
        }
    }

    // --- Errors ---

    #[test]
    fn empty_pattern() {
        assert_eq!(
            parse_err(""),
            PatternError::EmptyTerm {
                found: None,
                pos: 0
            }
        );
    }

    #[test]
    fn empty_alternative() {
        assert_eq!(
            parse_err("a|"),
            PatternError::EmptyTerm {
                found: None,
                pos: 2
            }
        );
        assert_eq!(
            parse_err("|a"),
            PatternError::EmptyTerm {
                found: Some('|'),
                pos: 0
            }
        );
    }

    #[test]
    fn empty_group() {
        assert_eq!(
            parse_err("()"),
            PatternError::EmptyTerm {
                found: Some(')'),
                pos: 1
            }
        );
    }

    #[test]
    fn unbalanced_close_paren() {
        let err = parse_err("ab)");
        assert_eq!(err, PatternError::UnexpectedChar { ch: ')', pos: 2 });
        assert_eq!(err.offending_char(), Some(')'));
        assert_eq!(err.position(), 2);
    }

    #[test]
    fn dangling_escape() {
        assert_eq!(parse_err("ab\\"), PatternError::DanglingEscape { pos: 2 });
    }

    #[test]
    fn unterminated_class() {
        assert_eq!(parse_err("[abc"), PatternError::UnterminatedClass { pos: 4 });
    }

    #[test]
    fn unclosed_group() {
        assert_eq!(parse_err("(ab"), PatternError::UnclosedGroup { pos: 3 });
    }

    #[test]
    fn malformed_quantifiers() {
        assert!(matches!(
            parse_err("a{"),
            PatternError::MalformedQuantifier { found: None, .. }
        ));
        assert!(matches!(
            parse_err("a{,3}"),
            PatternError::MalformedQuantifier {
                found: Some(','),
                ..
            }
        ));
        assert!(matches!(
            parse_err("a{x}"),
            PatternError::MalformedQuantifier {
                found: Some('x'),
                ..
            }
        ));
        assert!(matches!(
            parse_err("a{2"),
            PatternError::MalformedQuantifier { found: None, .. }
        ));
        assert!(matches!(
            parse_err("a{2,3"),
            PatternError::MalformedQuantifier { found: None, .. }
        ));
        assert!(matches!(
            parse_err("a{1,2,3}"),
            PatternError::MalformedQuantifier {
                found: Some(','),
                ..
            }
        ));
    }

    #[test]
    fn inverted_repeat_range() {
        assert!(matches!(
            parse_err("a{5,2}"),
            PatternError::InvalidRepeatRange { min: 5, max: 2, .. }
        ));
    }

    #[test]
    fn error_messages_name_the_position() {
        assert_eq!(
            parse_err("ab)").to_string(),
            "Unexpected character ')' at position 2"
        );
        assert_eq!(
            parse_err("(ab").to_string(),
            "Unclosed group '(' at position 3"
        );
    }
}
