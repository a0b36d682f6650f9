//! Single-character predicates used by the leaf matchers.

use super::ast::CharClass;

/// `\d`: an ASCII decimal digit.
pub fn is_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

/// `\w`: an alphanumeric character or underscore.
pub fn is_word(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Test whether `ch` is accepted by a `[...]` class, honouring negation.
pub fn class_matches(class: &CharClass, ch: char) -> bool {
    let member = class.chars.contains(&ch);
    member != class.negated
}
