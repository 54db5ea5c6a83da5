use std::fmt::{self, Display, Formatter};

use unicode_normalization::UnicodeNormalization;

/// A single member of a bracket expression.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CharacterClass {
    /// An inclusive range of characters. A single character `a` is stored as `a..=a`.
    Range(char, char),

    /// A POSIX named class such as `[:alpha:]`.
    Named(ClassName),
}

impl CharacterClass {
    /// A class that matches exactly one character.
    pub fn single(character: char) -> Self {
        CharacterClass::Range(character, character)
    }

    /// Returns true if the character is a member of this class.
    ///
    /// With `diacritic_insensitive` a character also matches a range when its base letter
    /// (the first code point of its canonical decomposition) falls into the range.
    pub fn contains(&self, character: char, diacritic_insensitive: bool) -> bool {
        match *self {
            CharacterClass::Range(lower, upper) => {
                (lower..=upper).contains(&character)
                    || (diacritic_insensitive && (lower..=upper).contains(&base_letter(character)))
            }
            CharacterClass::Named(name) => name.contains(character),
        }
    }
}

fn base_letter(character: char) -> char {
    std::iter::once(character).nfd().next().unwrap_or(character)
}

/// The named character classes of POSIX bracket expressions.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ClassName {
    /// `alnum`: letters and digits
    AlphaNumeric,
    /// `alpha`: letters
    Alpha,
    /// `blank`: space and tab
    Blank,
    /// `cntrl`: control characters
    Control,
    /// `digit`: `0` to `9`
    Digit,
    /// `graph`: printable characters except space
    Graph,
    /// `lower`: lowercase letters
    Lower,
    /// `print`: printable characters including space
    Printable,
    /// `punct`: printable characters that are neither letters, digits nor space
    Punctuation,
    /// `space`: whitespace
    Space,
    /// `upper`: uppercase letters
    Upper,
    /// `xdigit`: hexadecimal digits
    HexDigit,
}

impl ClassName {
    /// Looks up a class by the name used between `[:` and `:]`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "alnum" => ClassName::AlphaNumeric,
            "alpha" => ClassName::Alpha,
            "blank" => ClassName::Blank,
            "cntrl" => ClassName::Control,
            "digit" => ClassName::Digit,
            "graph" => ClassName::Graph,
            "lower" => ClassName::Lower,
            "print" => ClassName::Printable,
            "punct" => ClassName::Punctuation,
            "space" => ClassName::Space,
            "upper" => ClassName::Upper,
            "xdigit" => ClassName::HexDigit,
            _ => return None,
        })
    }

    /// The name of the class as written in a pattern.
    pub fn as_str(self) -> &'static str {
        match self {
            ClassName::AlphaNumeric => "alnum",
            ClassName::Alpha => "alpha",
            ClassName::Blank => "blank",
            ClassName::Control => "cntrl",
            ClassName::Digit => "digit",
            ClassName::Graph => "graph",
            ClassName::Lower => "lower",
            ClassName::Printable => "print",
            ClassName::Punctuation => "punct",
            ClassName::Space => "space",
            ClassName::Upper => "upper",
            ClassName::HexDigit => "xdigit",
        }
    }

    /// Returns true if the character belongs to the class.
    pub fn contains(self, character: char) -> bool {
        match self {
            ClassName::AlphaNumeric => character.is_alphanumeric(),
            ClassName::Alpha => character.is_alphabetic(),
            ClassName::Blank => character == ' ' || character == '\t',
            ClassName::Control => character.is_control(),
            ClassName::Digit => character.is_ascii_digit(),
            ClassName::Graph => !character.is_control() && !character.is_whitespace(),
            ClassName::Lower => character.is_lowercase(),
            ClassName::Printable => !character.is_control(),
            ClassName::Punctuation => {
                character.is_ascii_punctuation()
                    || (!character.is_ascii()
                        && !character.is_alphanumeric()
                        && !character.is_whitespace()
                        && !character.is_control())
            }
            ClassName::Space => character.is_whitespace(),
            ClassName::Upper => character.is_uppercase(),
            ClassName::HexDigit => character.is_ascii_hexdigit(),
        }
    }
}

impl Display for ClassName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[:{}:]", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ClassName::Alpha, 'ē', true)]
    #[case(ClassName::Alpha, '9', false)]
    #[case(ClassName::Digit, '7', true)]
    #[case(ClassName::Digit, 'x', false)]
    #[case(ClassName::Blank, '\t', true)]
    #[case(ClassName::Blank, '\n', false)]
    #[case(ClassName::Space, '\n', true)]
    #[case(ClassName::Punctuation, '&', true)]
    #[case(ClassName::Punctuation, 'a', false)]
    #[case(ClassName::HexDigit, 'F', true)]
    #[case(ClassName::HexDigit, 'g', false)]
    #[case(ClassName::Graph, ' ', false)]
    #[case(ClassName::Printable, ' ', true)]
    #[case(ClassName::Control, '\u{7}', true)]
    fn test_named_classes(#[case] name: ClassName, #[case] character: char, #[case] expected: bool) {
        assert_eq!(name.contains(character), expected);
        assert_eq!(ClassName::from_name(name.as_str()), Some(name));
    }

    #[test]
    fn test_diacritic_insensitive_range() {
        let range = CharacterClass::Range('a', 'z');
        assert!(!range.contains('ä', false));
        assert!(range.contains('ä', true));
        assert!(range.contains('ü', true));
        assert!(!range.contains('Ä', true));
        assert!(!CharacterClass::single('a').contains('b', true));
    }
}
