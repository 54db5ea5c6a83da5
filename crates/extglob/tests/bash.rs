//! Matching behavior of the bash preset, checked against `[[ text == pattern ]]` with
//! `shopt -s extglob`.

use extglob::{Options, Pattern};
use rstest::rstest;

#[rstest]
#[case("a*", "abc", true)]
#[case("*.c", "foo.c", true)]
#[case("a*", "a/b", true)]
#[case("*", ".profile", true)]
#[case("[^a]", "b", true)]
#[case("[!a]", "a", false)]
#[case("a[]]b", "a]b", true)]
#[case("[a-", "[a-", true)]
#[case("[[:alpha:]]*", "x1", true)]
#[case("!(foo)b*", "foobar", false)]
#[case("!(foo)b*", "fbar", true)]
#[case("*(f*(o))", "foooofof", true)]
#[case("*(f*(o))", "foooofofx", false)]
#[case("@(a|b)", "b", true)]
#[case("@(a|b)", "ab", false)]
#[case("+(a|b)", "abba", true)]
#[case("+(a|b)", "", false)]
#[case("*(a|b)", "", true)]
#[case("?(a|b)c", "c", true)]
#[case("?(a|b)c", "ac", true)]
#[case("?(a|b)c", "abc", false)]
#[case("!(*.c)", "foo.c", false)]
#[case("!(*.c)", "foo.h", true)]
#[case("@(!(z*)|*x)", "abc", true)]
#[case("@(!(z*)|*x)", "zoox", true)]
#[case("@(!(z*)|*x)", "zoo", false)]
#[case("!(*.*).!(*.*)", "moo.cow", true)]
#[case("!(*.*).!(*.*)", "mad.moo.cow", false)]
fn test_bash(#[case] pattern: &str, #[case] text: &str, #[case] expected: bool) {
    let pattern = Pattern::new(pattern, Options::bash()).unwrap();
    assert_eq!(pattern.matches(text), expected, "'{text}' against '{pattern}'");
}
