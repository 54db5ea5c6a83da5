//! Matching behavior of the `fnmatch(3)` presets, checked against glibc.

use extglob::{FnmatchFlags, Options, Pattern};
use rstest::rstest;

const NONE: FnmatchFlags = FnmatchFlags::from_bits(0);
const PATHNAME: FnmatchFlags = FnmatchFlags::PATHNAME;
const PERIOD: FnmatchFlags = FnmatchFlags::PERIOD;
const PATHNAME_PERIOD: FnmatchFlags = FnmatchFlags::PATHNAME.with(FnmatchFlags::PERIOD);
const PATHNAME_LEADING_DIR: FnmatchFlags = FnmatchFlags::PATHNAME.with(FnmatchFlags::LEADING_DIR);

#[rstest]
#[case("*", ".foo", NONE, true)]
#[case("a*", "a/b", NONE, true)]
#[case("a*", "a/b", PATHNAME, false)]
#[case("*/b", "a/b", PATHNAME, true)]
#[case("a?b", "a/b", PATHNAME, false)]
#[case("a[/]b", "a/b", PATHNAME, false)]
#[case("*", ".foo", PERIOD, false)]
#[case("?foo", ".foo", PERIOD, false)]
#[case("[.]foo", ".foo", PERIOD, false)]
#[case(".*", ".foo", PERIOD, true)]
#[case("a/*", "a/.b", PERIOD, true)]
#[case("*/*", "a/.b", PATHNAME_PERIOD, false)]
#[case("a/.*", "a/.b", PATHNAME_PERIOD, true)]
#[case("\\*", "*", NONE, true)]
#[case("\\*", "x", NONE, false)]
#[case("\\*", "\\x", FnmatchFlags::NOESCAPE, true)]
#[case("\\*", "*", FnmatchFlags::NOESCAPE, false)]
#[case("foo", "foo/bar", PATHNAME_LEADING_DIR, true)]
#[case("foo", "foobar", PATHNAME_LEADING_DIR, false)]
#[case("*", "foo/bar", PATHNAME_LEADING_DIR, true)]
#[case("*x", "ax/b", PATHNAME_LEADING_DIR, true)]
#[case("+(a|b)", "ab", FnmatchFlags::EXTMATCH, true)]
#[case("!(x)", "y", FnmatchFlags::EXTMATCH, true)]
#[case("+(a|b)", "+(a|b)", NONE, true)]
#[case("[]]", "]", NONE, true)]
#[case("[!]]", "]", NONE, false)]
#[case("[!]]", "x", NONE, true)]
#[case("[[:digit:]]", "5", NONE, true)]
#[case("[[:alpha:][:digit:]]", "a", NONE, true)]
#[case("[[.a.]]", "a", NONE, true)]
#[case("[[.a.]-c]", "b", NONE, true)]
#[case("[[.a.]-c]", "-", NONE, false)]
#[case("[a-[.c.]]", "b", NONE, true)]
#[case("[a-[.c.]]", "d", NONE, false)]
#[case("[ab", "[ab", NONE, true)]
fn test_fnmatch(
    #[case] pattern: &str,
    #[case] text: &str,
    #[case] flags: FnmatchFlags,
    #[case] expected: bool,
) {
    let pattern = Pattern::new(pattern, Options::fnmatch(flags)).unwrap();
    assert_eq!(
        pattern.matches(text),
        expected,
        "'{text}' against '{pattern}' with {flags:?}"
    );
}

#[test]
fn test_posix_is_pathname_and_period() {
    assert_eq!(Options::posix(), Options::fnmatch_from_bits(1 | 4));
    assert_eq!(Options::posix(), Options::fnmatch(PATHNAME_PERIOD));
}
