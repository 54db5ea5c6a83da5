//! Configuration that controls how patterns are parsed and matched.
//!
//! [`Options`] is a plain value. The dialect presets ([`Options::bash`], [`Options::go`], ...)
//! are pure constructors that return a fresh value which can be tweaked further before a
//! pattern is compiled.

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};
use thiserror::Error;

/// Controls how far `*` and `**` are allowed to reach.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WildcardBehavior {
    /// A single `*` already matches across path separators.
    SingleStarMatchesFullPath,

    /// `*` stays within a path component, `**` matches across path separators.
    #[default]
    DoubleStarMatchesFullPath,

    /// Wildcards never match a path separator. A repeated `*` is the same as a single one.
    PathComponentsOnly,
}

/// The character(s) that negate a bracket expression when they directly follow the `[`.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeNegationCharacter {
    /// `[!abc]`
    #[default]
    ExclamationMark,
    /// `[^abc]`
    Caret,
    /// Both `[!abc]` and `[^abc]`.
    Both,
}

impl RangeNegationCharacter {
    /// Returns true if `character` negates a bracket expression.
    pub fn is_negation(self, character: char) -> bool {
        match self {
            RangeNegationCharacter::ExclamationMark => character == '!',
            RangeNegationCharacter::Caret => character == '^',
            RangeNegationCharacter::Both => character == '!' || character == '^',
        }
    }
}

/// How an empty bracket expression (`[]`) is treated.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyRangeBehavior {
    /// The empty bracket expression is dropped from the pattern.
    Allow,

    /// Compilation fails with [`crate::PatternErrorKind::RangeIsEmpty`].
    #[default]
    Error,

    /// A `]` directly after the opening bracket (or the negation character) is a member of
    /// the expression instead of closing it, so `[]a]` matches `]` or `a`.
    TreatClosingBracketAsCharacter,
}

/// How a bracket expression without a closing `]` is treated.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnclosedBracketBehavior {
    /// Compilation fails with [`crate::PatternErrorKind::RangeNotClosed`].
    #[default]
    Error,

    /// The `[` is a literal character and parsing continues right after it.
    TreatAsLiteral,
}

/// Options that control how a pattern is parsed and matched.
///
/// Options are deserializable (all fields optional, kebab-case keys) so that they can be read
/// from a configuration file:
///
/// ```
/// # use extglob::{Options, WildcardBehavior};
/// let options: Options = serde_json::from_str(r#"{ "wildcard-behavior": "path-components-only" }"#).unwrap();
/// assert_eq!(options.wildcard_behavior, WildcardBehavior::PathComponentsOnly);
/// assert!(options.supports_pattern_lists);
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    /// How far wildcards reach. Path level wildcards are allowed unless this is
    /// [`WildcardBehavior::PathComponentsOnly`].
    ///
    /// Has no effect when `path_separator` is `None`.
    pub wildcard_behavior: WildcardBehavior,

    /// The path separator. `None` disables all special handling of separators (the equivalent
    /// of calling `fnmatch` without `FNM_PATHNAME`).
    pub path_separator: Option<char>,

    /// Characters that are also treated as separators in the matched text (never in the
    /// pattern). Useful to match `\` separated Windows paths with `/` patterns.
    pub additional_path_separators: Vec<char>,

    /// When true `\` escapes the next character. When false a backslash is an ordinary
    /// character (`FNM_NOESCAPE`).
    pub supports_escaped_characters: bool,

    /// When true `?`, `*` and bracket expressions never match a `.` at the start of the text
    /// or directly after a path separator (`FNM_PERIOD`).
    pub requires_explicit_leading_periods: bool,

    /// When true a single trailing separator in the text is ignored if the pattern does not
    /// match it explicitly, so `foo*` matches both `foo_file` and `foo_dir/`.
    pub matches_trailing_path_separator: bool,

    /// When true a pattern also matches text that continues with a path separator after the
    /// matched part, so `foo*` matches `foobar/frobozz` (`FNM_LEADING_DIR`).
    pub match_leading_directories: bool,

    /// The character that negates a bracket expression.
    pub range_negation_character: RangeNegationCharacter,

    /// How `[]` is handled.
    pub empty_range_behavior: EmptyRangeBehavior,

    /// How a `[` without a matching `]` is handled.
    pub unclosed_bracket_behavior: UnclosedBracketBehavior,

    /// Allows `-` as a literal member when it is the first or last member of a bracket
    /// expression (`[-a]`, `[a-]`). When false these fail to compile.
    pub supports_range_separator_at_beginning_and_end: bool,

    /// Recognize the ksh pattern lists `?(..)`, `*(..)`, `+(..)`, `@(..)` and `!(..)`
    /// (`FNM_EXTMATCH`).
    pub supports_pattern_lists: bool,

    /// Expand `{a,b}` groups into alternative patterns before parsing.
    pub supports_brace_expansion: bool,

    /// When true a trailing `/**` needs at least one more path component, so `foo/**` does not
    /// match `foo`. A `/**/` in the middle of a pattern can always match zero directories.
    pub trailing_path_wildcard_requires_component: bool,

    /// Compare characters against bracket ranges by their base letter as well, so `[a-z]`
    /// matches `ä`. This is a canonical decomposition, not locale collation.
    pub diacritic_insensitive_ranges: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            wildcard_behavior: WildcardBehavior::DoubleStarMatchesFullPath,
            path_separator: Some('/'),
            additional_path_separators: Vec::new(),
            supports_escaped_characters: true,
            requires_explicit_leading_periods: true,
            matches_trailing_path_separator: true,
            match_leading_directories: false,
            range_negation_character: RangeNegationCharacter::ExclamationMark,
            empty_range_behavior: EmptyRangeBehavior::Error,
            unclosed_bracket_behavior: UnclosedBracketBehavior::Error,
            supports_range_separator_at_beginning_and_end: true,
            supports_pattern_lists: true,
            supports_brace_expansion: false,
            trailing_path_wildcard_requires_component: true,
            diacritic_insensitive_ranges: false,
        }
    }
}

impl Options {
    /// Options that mimic [`filepath.Match`](https://pkg.go.dev/path/filepath#Match) in Go.
    pub fn go() -> Self {
        Self {
            wildcard_behavior: WildcardBehavior::PathComponentsOnly,
            requires_explicit_leading_periods: false,
            matches_trailing_path_separator: false,
            range_negation_character: RangeNegationCharacter::Caret,
            empty_range_behavior: EmptyRangeBehavior::Error,
            supports_range_separator_at_beginning_and_end: false,
            supports_pattern_lists: false,
            ..Self::default()
        }
    }

    /// Options that mimic bash pattern matching (`[[ $x == pattern ]]`, `case`) with
    /// `shopt -s extglob`.
    ///
    /// Bash does not give `/` any special meaning when matching strings, so there is no path
    /// separator. Malformed brackets are treated as literal text.
    pub fn bash() -> Self {
        Self {
            path_separator: None,
            requires_explicit_leading_periods: false,
            matches_trailing_path_separator: false,
            range_negation_character: RangeNegationCharacter::Both,
            empty_range_behavior: EmptyRangeBehavior::TreatClosingBracketAsCharacter,
            unclosed_bracket_behavior: UnclosedBracketBehavior::TreatAsLiteral,
            supports_pattern_lists: true,
            ..Self::default()
        }
    }

    /// Options that mimic zsh with `setopt kshglob`.
    pub fn zsh() -> Self {
        Self {
            supports_pattern_lists: true,
            range_negation_character: RangeNegationCharacter::Both,
            ..Self::default()
        }
    }

    /// Options that mimic [POSIX glob](https://man7.org/linux/man-pages/man7/glob.7.html):
    /// `fnmatch` with `FNM_PATHNAME | FNM_PERIOD`.
    pub fn posix() -> Self {
        Self::fnmatch(FnmatchFlags::PATHNAME.with(FnmatchFlags::PERIOD))
    }

    /// Options that mimic [`fnmatch(3)`](https://man7.org/linux/man-pages/man3/fnmatch.3.html)
    /// called with the given flags.
    pub fn fnmatch(flags: FnmatchFlags) -> Self {
        Self {
            wildcard_behavior: WildcardBehavior::PathComponentsOnly,
            path_separator: flags.contains(FnmatchFlags::PATHNAME).then_some('/'),
            supports_escaped_characters: !flags.contains(FnmatchFlags::NOESCAPE),
            requires_explicit_leading_periods: flags.contains(FnmatchFlags::PERIOD),
            matches_trailing_path_separator: false,
            match_leading_directories: flags.contains(FnmatchFlags::LEADING_DIR),
            range_negation_character: RangeNegationCharacter::Both,
            empty_range_behavior: EmptyRangeBehavior::TreatClosingBracketAsCharacter,
            unclosed_bracket_behavior: UnclosedBracketBehavior::TreatAsLiteral,
            supports_pattern_lists: flags.contains(FnmatchFlags::EXTMATCH),
            ..Self::default()
        }
    }

    /// Same as [`Options::fnmatch`] but takes the raw glibc `FNM_*` bits.
    pub fn fnmatch_from_bits(bits: i32) -> Self {
        Self::fnmatch(FnmatchFlags::from_bits(bits))
    }

    /// Options that mimic the glob patterns used by
    /// [Visual Studio Code](https://code.visualstudio.com/docs/editor/glob-patterns).
    pub fn vscode() -> Self {
        Self {
            additional_path_separators: vec!['\\'],
            requires_explicit_leading_periods: false,
            range_negation_character: RangeNegationCharacter::Both,
            empty_range_behavior: EmptyRangeBehavior::TreatClosingBracketAsCharacter,
            supports_pattern_lists: false,
            supports_brace_expansion: true,
            trailing_path_wildcard_requires_component: false,
            ..Self::default()
        }
    }

    /// Returns true if `character` separates path components in matched text.
    pub fn is_path_separator(&self, character: char) -> bool {
        self.path_separator == Some(character) || self.additional_path_separators.contains(&character)
    }

    /// Returns true if `**` may match across path separators.
    pub fn allows_path_level_wildcards(&self) -> bool {
        self.wildcard_behavior != WildcardBehavior::PathComponentsOnly
    }
}

const PATHNAME_MASK: i32 = 1 << 0;
const NOESCAPE_MASK: i32 = 1 << 1;
const PERIOD_MASK: i32 = 1 << 2;
const LEADING_DIR_MASK: i32 = 1 << 3;
const EXTMATCH_MASK: i32 = 1 << 5;

/// The `FNM_*` flags of `fnmatch(3)`, using the glibc bit values.
///
/// Unknown bits are ignored.
#[derive(Copy, Clone, Eq, PartialEq, Default, Hash)]
#[repr(transparent)]
pub struct FnmatchFlags(i32);

impl FnmatchFlags {
    /// `FNM_PATHNAME`: wildcards and brackets never match `/`.
    pub const PATHNAME: Self = Self(PATHNAME_MASK);
    /// `FNM_NOESCAPE`: a backslash is an ordinary character.
    pub const NOESCAPE: Self = Self(NOESCAPE_MASK);
    /// `FNM_PERIOD`: a leading `.` must be matched explicitly.
    pub const PERIOD: Self = Self(PERIOD_MASK);
    /// `FNM_LEADING_DIR`: ignore a `/` and everything after it once the pattern matched.
    pub const LEADING_DIR: Self = Self(LEADING_DIR_MASK);
    /// `FNM_EXTMATCH`: enable ksh pattern lists.
    pub const EXTMATCH: Self = Self(EXTMATCH_MASK);

    /// Constructs flags from the raw bits.
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits & (PATHNAME_MASK | NOESCAPE_MASK | PERIOD_MASK | LEADING_DIR_MASK | EXTMATCH_MASK))
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// Returns a copy with the flags in `other` set as well.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns true if all the flags in `other` are set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Debug for FnmatchFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnmatchFlags")
            .field("pathname", &self.contains(Self::PATHNAME))
            .field("noescape", &self.contains(Self::NOESCAPE))
            .field("period", &self.contains(Self::PERIOD))
            .field("leading_dir", &self.contains(Self::LEADING_DIR))
            .field("extmatch", &self.contains(Self::EXTMATCH))
            .finish()
    }
}

/// A named set of [`Options`] reproducing a specific tool.
#[allow(missing_docs)]
#[derive(EnumIter, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Dialect {
    Default,
    Posix,
    Fnmatch,
    Bash,
    Zsh,
    Go,
    Vscode,
}

impl Dialect {
    /// Returns a string representation of the dialect.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Iterate over all dialects.
    pub fn all() -> impl Iterator<Item = Self> {
        Dialect::iter()
    }
}

impl From<Dialect> for &'static str {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Default => "default",
            Dialect::Posix => "posix",
            Dialect::Fnmatch => "fnmatch",
            Dialect::Bash => "bash",
            Dialect::Zsh => "zsh",
            Dialect::Go => "go",
            Dialect::Vscode => "vscode",
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that can occur when parsing a dialect from a string.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub struct ParseDialectError {
    /// The string that could not be parsed.
    pub string: String,
}

impl Display for ParseDialectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a known glob dialect. Valid dialects are {}",
            self.string,
            Dialect::all().map(|d| format!("'{d}'")).join(", ")
        )
    }
}

impl FromStr for Dialect {
    type Err = ParseDialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::all()
            .find(|dialect| dialect.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseDialectError {
                string: s.to_owned(),
            })
    }
}

impl From<Dialect> for Options {
    fn from(dialect: Dialect) -> Self {
        match dialect {
            Dialect::Default => Options::default(),
            Dialect::Posix => Options::posix(),
            Dialect::Fnmatch => Options::fnmatch(FnmatchFlags::default()),
            Dialect::Bash => Options::bash(),
            Dialect::Zsh => Options::zsh(),
            Dialect::Go => Options::go(),
            Dialect::Vscode => Options::vscode(),
        }
    }
}
