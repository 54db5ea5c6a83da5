#![deny(missing_docs)]
//! Glob pattern matching with configurable dialects.
//!
//! Patterns are compiled once into a [`Pattern`] and can then be matched against any number of
//! paths. The syntax supported by a pattern, and the way its wildcards treat path separators
//! and hidden files, is controlled by [`Options`]. Presets mirror the behavior of common
//! matchers:
//!
//! - [`Options::default`]: `**` crosses directories, `*` stays within one path component.
//! - [`Options::bash`] and [`Options::zsh`]: shell style matching with ksh pattern lists such
//!   as `+(a|b)` and `!(*.o)`.
//! - [`Options::posix`] and [`Options::fnmatch`]: the C library `fnmatch` function.
//! - [`Options::go`]: the `path.Match` function of Go.
//! - [`Options::vscode`]: editor style globs with `{a,b}` brace expansion.
//!
//! ```
//! use extglob::{Options, Pattern};
//!
//! let pattern = Pattern::new("**/*.{rs,toml}", Options::vscode()).unwrap();
//! assert!(pattern.matches("crates/extglob/Cargo.toml"));
//! assert!(!pattern.matches("README.md"));
//! ```

pub mod brace_expansion;
mod options;
mod pattern;

pub use options::{
    Dialect, EmptyRangeBehavior, FnmatchFlags, Options, ParseDialectError, RangeNegationCharacter,
    UnclosedBracketBehavior, WildcardBehavior,
};
pub use pattern::{
    compile, CharacterClass, ClassName, InvalidPatternError, Pattern, PatternErrorKind,
    Quantifier, Section,
};
