//! Pattern matching engine.
//!
//! Patterns are parsed into a tree of [`Matcher`] nodes. Evaluating a node
//! yields the set of every state it can end in, so alternation and
//! repetition explore all paths and captures stay per path. That is what
//! makes backreferences work without a separate backtracking engine.
//!
//! # Pattern syntax
//!
//! | Token        | Meaning                                          |
//! |--------------|--------------------------------------------------|
//! | `c`          | The literal character `c`                        |
//! | `.`          | Any character                                    |
//! | `\d`         | An ASCII digit                                   |
//! | `\w`         | An alphanumeric character or `_`                 |
//! | `\N`         | Backreference to group N (a single digit)        |
//! | `\c`         | Any other escaped character, literally           |
//! | `[abc]`      | One of the listed characters (no ranges)         |
//! | `[^abc]`     | Any character not listed                         |
//! | `^` / `$`    | Start / end of line                              |
//! | `(…)`        | Capture group, numbered by its opening paren     |
//! | `X\|Y`       | Alternation                                      |
//! | `X?`         | Zero or one                                      |
//! | `X+`         | One or more                                      |
//! | `X*`         | Zero or more                                     |
//! | `X{n}`       | Exactly n                                        |
//! | `X{n,}`      | At least n                                       |
//! | `X{n,m}`     | Between n and m                                  |

pub mod ast;
pub mod cache;
pub mod char_class;
pub mod matcher;
pub mod parser;
pub mod scan;
pub mod state;

pub use ast::{CharClass, GroupId, Matcher, Repeat};
pub use cache::{DEFAULT_CACHE_CAPACITY, PatternCache, global_cache, init_global_cache};
pub use parser::{PatternError, parse};
pub use scan::CompiledPattern;
pub use state::{MatchState, StateSet};
