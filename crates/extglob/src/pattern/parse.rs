use std::error::Error;
use std::fmt::{Display, Formatter};

use thiserror::Error;

use super::{CharacterClass, ClassName, Quantifier, Section};
use crate::options::{EmptyRangeBehavior, Options, UnclosedBracketBehavior, WildcardBehavior};

/// An error that occurred while compiling a pattern string.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InvalidPatternError {
    /// The pattern that failed to compile. When brace expansion is enabled this is the expanded
    /// alternative that contained the error.
    pub pattern: String,

    /// Byte offset into `pattern` where the error was detected. For unterminated constructs
    /// this is the offset of the opening character.
    pub location: usize,

    /// The type of error that occurred
    pub kind: PatternErrorKind,
}

impl Display for InvalidPatternError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid glob pattern '{}' at offset {}: {}",
            &self.pattern, self.location, &self.kind
        )
    }
}

impl Error for InvalidPatternError {}

impl InvalidPatternError {
    /// Create a new error
    pub fn new(pattern: impl Into<String>, location: usize, kind: PatternErrorKind) -> Self {
        Self {
            pattern: pattern.into(),
            location,
            kind,
        }
    }
}

/// The type of error that occurred when compiling a pattern.
#[derive(Debug, Eq, PartialEq, Clone, Error)]
pub enum PatternErrorKind {
    /// A bracket expression or range was not terminated (ie `[a-` or `[abc`)
    #[error("bracket expression is not closed")]
    RangeNotClosed,

    /// A bracket expression without members (ie `[]`)
    #[error("bracket expression is empty")]
    RangeIsEmpty,

    /// A `-` without a lower bound (ie `[-c]`) while that is not allowed
    #[error("range is missing a lower bound")]
    RangeMissingBounds,

    /// A range whose lower bound is greater than its upper bound (ie `[z-a]`)
    #[error("range bounds are out of order")]
    RangeBoundsAreOutOfOrder,

    /// The pattern ends with an escape character
    #[error("the pattern ends with an unterminated escape")]
    InvalidEscapeCharacter,

    /// A named class (ie `[:alpha:]`) with an unknown name
    #[error("'{0}' is not a known character class")]
    InvalidNamedCharacterClass(String),

    /// A pattern list without its closing `)`
    #[error("pattern list is not closed")]
    PatternListNotClosed,

    /// A pattern list without any content (ie `@()`)
    #[error("pattern list is empty")]
    EmptyPatternList,

    /// A collating symbol or equivalence class that names more than one character
    #[error("multi-character collating element '{0}' is not supported")]
    MultiCharacterCollatingElement(String),
}

/// A character read from the pattern together with its byte offset.
#[derive(Debug, Clone, Copy)]
struct Token {
    offset: usize,
    character: char,
    escaped: bool,
}

enum Bracket {
    Closed {
        members: Vec<CharacterClass>,
        negated: bool,
    },
    Unclosed,
}

/// Compiles a single pattern string (already brace expanded) into sections.
pub(crate) struct Parser<'a> {
    pattern: &'a str,
    characters: Vec<(usize, char)>,
    position: usize,
    options: &'a Options,
}

impl<'a> Parser<'a> {
    pub fn new(pattern: &'a str, options: &'a Options) -> Self {
        Self {
            pattern,
            characters: pattern.char_indices().collect(),
            position: 0,
            options,
        }
    }

    pub fn parse(mut self) -> Result<Vec<Section>, InvalidPatternError> {
        let (sections, _) = self.parse_sequence(false)?;
        Ok(sections)
    }

    fn error(&self, location: usize, kind: PatternErrorKind) -> InvalidPatternError {
        InvalidPatternError::new(self.pattern, location, kind)
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, distance: usize) -> Option<char> {
        self.characters
            .get(self.position + distance)
            .map(|&(_, character)| character)
    }

    fn offset(&self) -> usize {
        self.characters
            .get(self.position)
            .map_or(self.pattern.len(), |&(offset, _)| offset)
    }

    /// Reads the next character, resolving an escape sequence into a single token.
    fn next_token(&mut self) -> Result<Option<Token>, InvalidPatternError> {
        let Some(&(offset, character)) = self.characters.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;

        if self.options.supports_escaped_characters && character == '\\' {
            let Some(&(_, escaped)) = self.characters.get(self.position) else {
                return Err(self.error(offset, PatternErrorKind::InvalidEscapeCharacter));
            };
            self.position += 1;
            return Ok(Some(Token {
                offset,
                character: escaped,
                escaped: true,
            }));
        }

        Ok(Some(Token {
            offset,
            character,
            escaped: false,
        }))
    }

    /// Parses sections until the end of the pattern or, inside a pattern list, until an
    /// unescaped `|` or `)`. Returns the delimiter that ended the sequence.
    fn parse_sequence(
        &mut self,
        in_pattern_list: bool,
    ) -> Result<(Vec<Section>, Option<char>), InvalidPatternError> {
        let mut sections = Vec::new();

        loop {
            if in_pattern_list {
                if let Some(delimiter @ ('|' | ')')) = self.peek() {
                    self.position += 1;
                    return Ok((sections, Some(delimiter)));
                }
            }

            let Some(token) = self.next_token()? else {
                return Ok((sections, None));
            };

            if token.escaped {
                push_constant(&mut sections, token.character);
                continue;
            }

            match token.character {
                '*' if self.starts_pattern_list() => {
                    let section = self.parse_pattern_list(token.offset, Quantifier::ZeroOrMore)?;
                    sections.push(section);
                }
                '?' if self.starts_pattern_list() => {
                    let section = self.parse_pattern_list(token.offset, Quantifier::ZeroOrOne)?;
                    sections.push(section);
                }
                '+' if self.starts_pattern_list() => {
                    let section = self.parse_pattern_list(token.offset, Quantifier::OneOrMore)?;
                    sections.push(section);
                }
                '@' if self.starts_pattern_list() => {
                    let section = self.parse_pattern_list(token.offset, Quantifier::ExactlyOne)?;
                    sections.push(section);
                }
                '!' if self.starts_pattern_list() => {
                    let section = self.parse_pattern_list(token.offset, Quantifier::Negated)?;
                    sections.push(section);
                }
                '*' => self.push_wildcard(&mut sections),
                '?' => sections.push(Section::SingleCharacter),
                '[' => self.parse_bracket(token.offset, &mut sections)?,
                character if Some(character) == self.options.path_separator => {
                    sections.push(Section::PathSeparator);
                }
                character => push_constant(&mut sections, character),
            }
        }
    }

    fn starts_pattern_list(&self) -> bool {
        self.options.supports_pattern_lists && self.peek() == Some('(')
    }

    fn push_wildcard(&self, sections: &mut Vec<Section>) {
        match sections.last_mut() {
            Some(last @ Section::ComponentWildcard) => {
                if self.options.wildcard_behavior == WildcardBehavior::DoubleStarMatchesFullPath {
                    *last = Section::PathWildcard;
                }
            }
            Some(Section::PathWildcard) => {}
            _ => sections.push(
                if self.options.wildcard_behavior == WildcardBehavior::SingleStarMatchesFullPath {
                    Section::PathWildcard
                } else {
                    Section::ComponentWildcard
                },
            ),
        }
    }

    fn parse_pattern_list(
        &mut self,
        sigil_offset: usize,
        quantifier: Quantifier,
    ) -> Result<Section, InvalidPatternError> {
        // Skip the opening parenthesis.
        self.position += 1;

        let mut alternatives = Vec::new();
        loop {
            let (sections, delimiter) = self.parse_sequence(true)?;
            alternatives.push(sections);
            match delimiter {
                Some('|') => {}
                Some(_) => break,
                None => {
                    return Err(self.error(sigil_offset, PatternErrorKind::PatternListNotClosed))
                }
            }
        }

        if alternatives.len() == 1 && alternatives[0].is_empty() {
            return Err(self.error(sigil_offset, PatternErrorKind::EmptyPatternList));
        }

        Ok(Section::PatternList {
            quantifier,
            alternatives,
        })
    }

    fn parse_bracket(
        &mut self,
        open: usize,
        sections: &mut Vec<Section>,
    ) -> Result<(), InvalidPatternError> {
        let checkpoint = self.position;
        match self.parse_bracket_members()? {
            Bracket::Closed { members, negated } if members.is_empty() => {
                match self.options.empty_range_behavior {
                    EmptyRangeBehavior::Error => {
                        return Err(self.error(open, PatternErrorKind::RangeIsEmpty))
                    }
                    EmptyRangeBehavior::Allow
                    | EmptyRangeBehavior::TreatClosingBracketAsCharacter => {
                        tracing::trace!(
                            "dropping empty bracket expression (negated: {negated}) at offset {open}"
                        );
                    }
                }
            }
            Bracket::Closed { members, negated } => {
                sections.push(Section::OneOf { members, negated });
            }
            Bracket::Unclosed => match self.options.unclosed_bracket_behavior {
                UnclosedBracketBehavior::Error => {
                    return Err(self.error(open, PatternErrorKind::RangeNotClosed))
                }
                UnclosedBracketBehavior::TreatAsLiteral => {
                    self.position = checkpoint;
                    push_constant(sections, '[');
                }
            },
        }
        Ok(())
    }

    fn parse_bracket_members(&mut self) -> Result<Bracket, InvalidPatternError> {
        let negated = match self.peek() {
            Some(character) if self.options.range_negation_character.is_negation(character) => {
                self.position += 1;
                true
            }
            _ => false,
        };

        let mut members = Vec::new();
        let mut first = true;
        loop {
            let Some(token) = self.next_token()? else {
                return Ok(Bracket::Unclosed);
            };
            let is_first = std::mem::replace(&mut first, false);

            if !token.escaped {
                match token.character {
                    ']' if !(is_first
                        && self.options.empty_range_behavior
                            == EmptyRangeBehavior::TreatClosingBracketAsCharacter) =>
                    {
                        return Ok(Bracket::Closed { members, negated });
                    }
                    '[' if self.peek() == Some(':') => {
                        match self.parse_bracket_class(token.offset)? {
                            Some(member) => members.push(member),
                            None => return Ok(Bracket::Unclosed),
                        }
                        continue;
                    }
                    '-' => {
                        // A dash that does not follow a member that could start a range.
                        if !self.options.supports_range_separator_at_beginning_and_end {
                            return Err(self.error(token.offset, PatternErrorKind::RangeMissingBounds));
                        }
                        members.push(CharacterClass::single('-'));
                        continue;
                    }
                    _ => {}
                }
            }

            let Some(lower) = self.bracket_character(&token)? else {
                return Ok(Bracket::Unclosed);
            };
            if self.peek() != Some('-') {
                members.push(CharacterClass::single(lower));
                continue;
            }

            match self.peek_at(1) {
                None => return Ok(Bracket::Unclosed),
                Some(']') => {
                    if !self.options.supports_range_separator_at_beginning_and_end {
                        return Err(self.error(self.offset(), PatternErrorKind::RangeNotClosed));
                    }
                    self.position += 1;
                    members.push(CharacterClass::single(lower));
                    members.push(CharacterClass::single('-'));
                }
                Some(_) => {
                    self.position += 1;
                    let Some(upper) = self.next_token()? else {
                        return Ok(Bracket::Unclosed);
                    };
                    let Some(upper) = self.bracket_character(&upper)? else {
                        return Ok(Bracket::Unclosed);
                    };
                    if lower > upper {
                        return Err(
                            self.error(token.offset, PatternErrorKind::RangeBoundsAreOutOfOrder)
                        );
                    }
                    members.push(CharacterClass::Range(lower, upper));
                }
            }
        }
    }

    /// The character a bracket member stands for. Resolves a collating element `[.x.]` or
    /// `[=x=]`, returns `None` if its terminator is missing.
    fn bracket_character(&mut self, token: &Token) -> Result<Option<char>, InvalidPatternError> {
        if token.escaped || token.character != '[' || !matches!(self.peek(), Some('.' | '=')) {
            return Ok(Some(token.character));
        }
        let Some(content) = self.bracket_class_content() else {
            return Ok(None);
        };

        // Collating symbols and equivalence classes have no locale semantics here, a single
        // character stands for itself.
        let mut characters = content.chars();
        match (characters.next(), characters.next()) {
            (Some(character), None) => Ok(Some(character)),
            _ => Err(self.error(
                token.offset,
                PatternErrorKind::MultiCharacterCollatingElement(content),
            )),
        }
    }

    /// Parses `[:name:]` after the opening `[` was consumed. Returns `None` if the terminator
    /// is missing.
    fn parse_bracket_class(
        &mut self,
        open: usize,
    ) -> Result<Option<CharacterClass>, InvalidPatternError> {
        let Some(content) = self.bracket_class_content() else {
            return Ok(None);
        };
        match ClassName::from_name(&content) {
            Some(name) => Ok(Some(CharacterClass::Named(name))),
            None => Err(self.error(open, PatternErrorKind::InvalidNamedCharacterClass(content))),
        }
    }

    /// Consumes `kx..xk]` where `k` is the delimiter at the current position and returns the
    /// text between the delimiters.
    fn bracket_class_content(&mut self) -> Option<String> {
        let kind = self.peek()?;
        let content_start = self.position + 1;
        let length = self.characters[content_start..]
            .windows(2)
            .position(|pair| pair[0].1 == kind && pair[1].1 == ']')?;

        let content = self.characters[content_start..content_start + length]
            .iter()
            .map(|&(_, character)| character)
            .collect();
        self.position = content_start + length + 2;
        Some(content)
    }
}

fn push_constant(sections: &mut Vec<Section>, character: char) {
    if let Some(Section::Constant(constant)) = sections.last_mut() {
        constant.push(character);
    } else {
        sections.push(Section::Constant(character.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RangeNegationCharacter;
    use assert_matches::assert_matches;
    use rstest::rstest;

    fn parse(pattern: &str, options: &Options) -> Result<Vec<Section>, InvalidPatternError> {
        Parser::new(pattern, options).parse()
    }

    fn constant(text: &str) -> Section {
        Section::Constant(text.to_owned())
    }

    #[test]
    fn test_constants_are_merged() {
        let sections = parse("ab\\*c/d", &Options::default()).unwrap();
        assert_eq!(
            sections,
            vec![constant("ab*c"), Section::PathSeparator, constant("d")]
        );
    }

    #[test]
    fn test_escaped_separator_is_a_constant() {
        let sections = parse("a\\/b", &Options::default()).unwrap();
        assert_eq!(sections, vec![constant("a/b")]);
    }

    #[rstest]
    #[case(WildcardBehavior::DoubleStarMatchesFullPath, vec![Section::PathWildcard])]
    #[case(WildcardBehavior::PathComponentsOnly, vec![Section::ComponentWildcard])]
    #[case(WildcardBehavior::SingleStarMatchesFullPath, vec![Section::PathWildcard])]
    fn test_repeated_wildcards(#[case] behavior: WildcardBehavior, #[case] expected: Vec<Section>) {
        let options = Options {
            wildcard_behavior: behavior,
            ..Options::default()
        };
        assert_eq!(parse("***", &options).unwrap(), expected);
    }

    #[test]
    fn test_bracket_members() {
        let sections = parse("[!a-c[:digit:]x-]", &Options::default()).unwrap();
        assert_eq!(
            sections,
            vec![Section::OneOf {
                members: vec![
                    CharacterClass::Range('a', 'c'),
                    CharacterClass::Named(ClassName::Digit),
                    CharacterClass::single('x'),
                    CharacterClass::single('-'),
                ],
                negated: true,
            }]
        );
    }

    #[test]
    fn test_caret_is_literal_without_caret_negation() {
        let sections = parse("[^a]", &Options::default()).unwrap();
        assert_eq!(
            sections,
            vec![Section::OneOf {
                members: vec![CharacterClass::single('^'), CharacterClass::single('a')],
                negated: false,
            }]
        );

        let options = Options {
            range_negation_character: RangeNegationCharacter::Caret,
            ..Options::default()
        };
        assert_matches!(
            parse("[^a]", &options).unwrap().as_slice(),
            [Section::OneOf { negated: true, .. }]
        );
    }

    #[test]
    fn test_leading_closing_bracket() {
        let options = Options::bash();
        let sections = parse("[]-]", &options).unwrap();
        assert_eq!(
            sections,
            vec![Section::OneOf {
                members: vec![CharacterClass::single(']'), CharacterClass::single('-')],
                negated: false,
            }]
        );
    }

    #[test]
    fn test_pattern_lists() {
        let sections = parse("a@(b|*(c))d", &Options::default()).unwrap();
        assert_eq!(
            sections,
            vec![
                constant("a"),
                Section::PatternList {
                    quantifier: Quantifier::ExactlyOne,
                    alternatives: vec![
                        vec![constant("b")],
                        vec![Section::PatternList {
                            quantifier: Quantifier::ZeroOrMore,
                            alternatives: vec![vec![constant("c")]],
                        }],
                    ],
                },
                constant("d"),
            ]
        );
    }

    #[test]
    fn test_pattern_list_characters_are_constants_without_support() {
        let sections = parse("@(a|b)", &Options::go()).unwrap();
        assert_eq!(sections, vec![constant("@(a|b)")]);
    }

    #[test]
    fn test_unclosed_bracket_as_literal() {
        let sections = parse("ab[c-", &Options::bash()).unwrap();
        assert_eq!(sections, vec![constant("ab[c-")]);
    }

    #[test]
    fn test_empty_range_allowed() {
        let options = Options {
            empty_range_behavior: EmptyRangeBehavior::Allow,
            ..Options::default()
        };
        assert_eq!(parse("a[]b", &options).unwrap(), vec![constant("ab")]);
    }

    #[rstest]
    #[case("[", 0, PatternErrorKind::RangeNotClosed)]
    #[case("a/b[", 3, PatternErrorKind::RangeNotClosed)]
    #[case("[^bc", 0, PatternErrorKind::RangeNotClosed)]
    #[case("[]a]", 0, PatternErrorKind::RangeIsEmpty)]
    #[case("[-]", 1, PatternErrorKind::RangeMissingBounds)]
    #[case("[-x]", 1, PatternErrorKind::RangeMissingBounds)]
    #[case("[a-b-c]", 4, PatternErrorKind::RangeMissingBounds)]
    #[case("[x-]", 2, PatternErrorKind::RangeNotClosed)]
    #[case("[z-a]", 1, PatternErrorKind::RangeBoundsAreOutOfOrder)]
    #[case("ab\\", 2, PatternErrorKind::InvalidEscapeCharacter)]
    fn test_go_errors(
        #[case] pattern: &str,
        #[case] location: usize,
        #[case] kind: PatternErrorKind,
    ) {
        let err = parse(pattern, &Options::go()).unwrap_err();
        assert_eq!(err, InvalidPatternError::new(pattern, location, kind));
    }

    #[rstest]
    #[case("[[:foo:]]", PatternErrorKind::InvalidNamedCharacterClass("foo".to_owned()))]
    #[case("x@(a|b", PatternErrorKind::PatternListNotClosed)]
    #[case("x@()", PatternErrorKind::EmptyPatternList)]
    #[case("[[.ch.]]", PatternErrorKind::MultiCharacterCollatingElement("ch".to_owned()))]
    fn test_errors(#[case] pattern: &str, #[case] kind: PatternErrorKind) {
        let err = parse(pattern, &Options::default()).unwrap_err();
        assert_eq!(err.kind, kind);
    }

    #[test]
    fn test_pattern_list_error_points_at_sigil() {
        let err = parse("abc*(d|e", &Options::default()).unwrap_err();
        assert_eq!(err.location, 3);
        assert_eq!(
            err.to_string(),
            "invalid glob pattern 'abc*(d|e' at offset 3: pattern list is not closed"
        );
    }

    #[test]
    fn test_collating_elements() {
        let sections = parse("[[.a.][=b=]]", &Options::default()).unwrap();
        assert_eq!(
            sections,
            vec![Section::OneOf {
                members: vec![CharacterClass::single('a'), CharacterClass::single('b')],
                negated: false,
            }]
        );
    }

    #[rstest]
    #[case("[[.a.]-c]")]
    #[case("[a-[.c.]]")]
    #[case("[[=a=]-[=c=]]")]
    fn test_collating_elements_as_range_bounds(#[case] pattern: &str) {
        let sections = parse(pattern, &Options::default()).unwrap();
        assert_eq!(
            sections,
            vec![Section::OneOf {
                members: vec![CharacterClass::Range('a', 'c')],
                negated: false,
            }]
        );
    }

    #[test]
    fn test_empty_alternative_is_allowed() {
        assert_matches!(
            parse("@(a|)", &Options::default()).unwrap().as_slice(),
            [Section::PatternList { alternatives, .. }] if alternatives.len() == 2
        );
    }
}
