//! Compiled glob patterns.

mod character_class;
mod matcher;
mod parse;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub use character_class::{CharacterClass, ClassName};
pub use parse::{InvalidPatternError, PatternErrorKind};

use crate::brace_expansion;
use crate::options::Options;
use matcher::Matcher;
use parse::Parser;

/// How often the alternatives of a pattern list may occur.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Quantifier {
    /// `@(..)`
    ExactlyOne,
    /// `?(..)`
    ZeroOrOne,
    /// `*(..)`
    ZeroOrMore,
    /// `+(..)`
    OneOrMore,
    /// `!(..)`: anything that none of the alternatives match
    Negated,
}

/// One parsed unit of a pattern.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Section {
    /// Matches one path separator.
    PathSeparator,

    /// Matches the exact text.
    Constant(String),

    /// `?`: any single character except a path separator.
    SingleCharacter,

    /// A bracket expression: a single character (never a path separator) that is, or with
    /// `negated` is not, a member of any of the classes.
    OneOf {
        /// The members of the expression.
        members: Vec<CharacterClass>,
        /// True for `[!..]`.
        negated: bool,
    },

    /// `*`: zero or more characters within a path component.
    ComponentWildcard,

    /// `**`: zero or more characters, including path separators.
    PathWildcard,

    /// A ksh pattern list such as `+(a|b*)`.
    PatternList {
        /// How often the alternatives may occur.
        quantifier: Quantifier,
        /// The `|` separated sub patterns.
        alternatives: Vec<Vec<Section>>,
    },
}

/// A compiled glob pattern.
///
/// A pattern is immutable once compiled and can be shared between threads and matched
/// concurrently.
///
/// ```
/// # use extglob::{Options, Pattern};
/// let pattern = Pattern::new("src/**/*.@(rs|toml)", Options::default()).unwrap();
/// assert!(pattern.matches("src/lib.rs"));
/// assert!(pattern.matches("src/pattern/mod.rs"));
/// assert!(!pattern.matches("src/lib.py"));
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Pattern {
    source: String,
    alternatives: Vec<Vec<Section>>,
    options: Options,
}

/// Compiles a pattern string with the given options.
///
/// # Errors
/// Returns an [`InvalidPatternError`] if the pattern (or any of its brace expanded
/// alternatives) is malformed under the given options.
pub fn compile(pattern: &str, options: Options) -> Result<Pattern, InvalidPatternError> {
    Pattern::new(pattern, options)
}

impl Pattern {
    /// Compiles a pattern string with the given options.
    ///
    /// # Errors
    /// Returns an [`InvalidPatternError`] if the pattern (or any of its brace expanded
    /// alternatives) is malformed under the given options.
    pub fn new(pattern: &str, options: Options) -> Result<Self, InvalidPatternError> {
        let expanded = if options.supports_brace_expansion {
            brace_expansion::expand(pattern, options.supports_escaped_characters)
        } else {
            vec![pattern.to_owned()]
        };

        let alternatives = expanded
            .iter()
            .map(|alternative| Parser::new(alternative, &options).parse())
            .collect::<Result<Vec<_>, _>>()?;

        tracing::trace!(
            "compiled glob pattern '{}' into {} alternative(s)",
            pattern,
            alternatives.len()
        );

        Ok(Self {
            source: pattern.to_owned(),
            alternatives,
            options,
        })
    }

    /// Returns true if the whole `candidate` matches the pattern.
    ///
    /// Matching never fails. It succeeds if any of the brace expanded alternatives matches,
    /// and (with [`Options::matches_trailing_path_separator`]) retries once without a single
    /// trailing path separator.
    pub fn matches(&self, candidate: &str) -> bool {
        let text: Vec<char> = candidate.chars().collect();
        let matcher = Matcher::new(&text, &self.options);

        if self
            .alternatives
            .iter()
            .any(|sections| matcher.matches(sections, text.len()))
        {
            return true;
        }

        match text.last() {
            Some(&last)
                if self.options.matches_trailing_path_separator
                    && self.options.is_path_separator(last) =>
            {
                self.alternatives
                    .iter()
                    .any(|sections| matcher.matches(sections, text.len() - 1))
            }
            _ => false,
        }
    }

    /// The alternatives of the pattern, more than one when brace expansion produced them.
    pub fn alternatives(&self) -> &[Vec<Section>] {
        &self.alternatives
    }

    /// The options the pattern was compiled with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The string the pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for Pattern {
    type Err = InvalidPatternError;

    /// Compiles the pattern with the default options.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pattern::new(s, Options::default())
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

impl AsRef<str> for Pattern {
    fn as_ref(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("[a-c]", "b", true)]
    #[case("[a-c]", "d", false)]
    #[case("[a-c]", "B", false)]
    #[case("[a-c]", "", false)]
    #[case("[!a-c]", "d", true)]
    #[case("[!a-c]", "a", false)]
    #[case("abc", "abc", true)]
    #[case("abc", "abcd", false)]
    #[case("abc", "ab", false)]
    #[case("a?c", "abc", true)]
    #[case("a?c", "a/c", false)]
    #[case("a?c", "ac", false)]
    #[case("*.txt", "notes.txt", true)]
    #[case("*.txt", "dir/notes.txt", false)]
    #[case("**/*.txt", "dir/notes.txt", true)]
    #[case("**/*.txt", "notes.txt", true)]
    #[case("**/*.generated.swift", "Target/Generated/Mock.generated.swift", true)]
    #[case("**/AutoMockable*.swift", "Target/AutoMockable/Sources/AutoMockable.generated.swift", true)]
    #[case("dir/**/*.swift", "dir/File.swift", true)]
    #[case("dir/**/File.swift", "dir/File.swift", true)]
    #[case("foo/File**/*.swift", "dir/File.swift", false)]
    #[case("a/**/b", "a/x/y/b", true)]
    #[case("a/**/b", "a/b", true)]
    #[case("a/**/b", "ab", false)]
    #[case("a/**/b", "a/xb", false)]
    #[case("a*", "abc/", true)]
    #[case("**dirB2", "dirB1/dirB2/", true)]
    #[case("*", ".hidden", false)]
    #[case(".*", ".hidden", true)]
    #[case("*/?idden", "dir/.idden", false)]
    #[case("*/[.]idden", "dir/.idden", false)]
    #[case("*/.idden", "dir/.idden", true)]
    #[case("!(foo)", "foo", false)]
    #[case("!(foo)", "foobar", true)]
    #[case("*(f*(o))", "fofo", true)]
    #[case("*(f*(o))", "ffo", true)]
    #[case("*(f*(o))", "foooofo", true)]
    #[case("*(f*(o))", "xfoooofof", false)]
    #[case("+(a|bc)", "abca", true)]
    #[case("+(a|bc)", "abcb", false)]
    #[case("+(x*)", "xa/xb", false)]
    #[case("@(x*)/b", "xa/b", true)]
    #[case("a[X-]b", "a-b", true)]
    #[case("a[X-]b", "aXb", true)]
    #[case("foo/**", "foo/bar/baz", true)]
    #[case("foo/**", "foo", false)]
    #[case("foo/**", "foo/", false)]
    fn test_matches(#[case] pattern: &str, #[case] candidate: &str, #[case] expected: bool) {
        let pattern: Pattern = pattern.parse().unwrap();
        assert_eq!(
            pattern.matches(candidate),
            expected,
            "'{candidate}' against '{pattern}'"
        );
    }

    #[test]
    fn test_trailing_separator_tolerance() {
        let options = Options {
            matches_trailing_path_separator: false,
            ..Options::default()
        };
        assert!(!Pattern::new("a*", options).unwrap().matches("abc/"));
    }

    #[test]
    fn test_path_components_only() {
        let options = Options {
            wildcard_behavior: crate::WildcardBehavior::PathComponentsOnly,
            ..Options::default()
        };
        let pattern = Pattern::new("**/.build", options.clone()).unwrap();
        assert!(!pattern.matches("Target/Other/.build"));
        assert!(Pattern::new("*/.build", options).unwrap().matches("Target/.build"));
    }

    #[test]
    fn test_single_star_matches_full_path() {
        let options = Options {
            wildcard_behavior: crate::WildcardBehavior::SingleStarMatchesFullPath,
            ..Options::default()
        };
        let pattern = Pattern::new("src/*.rs", options).unwrap();
        assert!(pattern.matches("src/pattern/mod.rs"));
    }

    #[test]
    fn test_brace_expansion() {
        let options = Options {
            supports_brace_expansion: true,
            ..Options::default()
        };
        let pattern = Pattern::new("*.{js,ts}", options).unwrap();
        assert_eq!(pattern.alternatives().len(), 2);
        assert!(pattern.matches("index.js"));
        assert!(pattern.matches("index.ts"));
        assert!(!pattern.matches("index.rs"));

        // Without brace expansion the braces are literal.
        let pattern: Pattern = "*.{js,ts}".parse().unwrap();
        assert!(pattern.matches("index.{js,ts}"));
    }

    #[test]
    fn test_brace_expansion_error_reports_alternative() {
        let options = Options {
            supports_brace_expansion: true,
            ..Options::default()
        };
        let err = Pattern::new("{a,[b}", options).unwrap_err();
        assert_eq!(err.pattern, "[b");
        assert_matches!(err.kind, PatternErrorKind::RangeNotClosed);
    }

    #[test]
    fn test_long_candidate() {
        let pattern: Pattern = "*/A*".parse().unwrap();
        assert!(!pattern.matches(&"a".repeat(9999)));

        let pattern: Pattern = "**a".parse().unwrap();
        assert!(pattern.matches(&"a".repeat(9999)));
    }

    #[test]
    fn test_long_repetition() {
        let pattern: Pattern = "+(a|b)".parse().unwrap();
        assert!(pattern.matches(&"ab".repeat(5000)));

        let pattern: Pattern = "+(a|b)c".parse().unwrap();
        assert!(!pattern.matches(&"a".repeat(10000)));
    }

    #[test]
    fn test_display_and_as_str() {
        let pattern = compile("src/**", Options::default()).unwrap();
        assert_eq!(pattern.to_string(), "src/**");
        assert_eq!(pattern.as_str(), "src/**");
        assert_eq!(pattern.options(), &Options::default());
    }

    #[test]
    fn test_pattern_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pattern>();
    }
}
