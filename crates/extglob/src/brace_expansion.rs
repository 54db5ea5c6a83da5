//! Expansion of `{a,b}` groups into multiple pattern strings.
//!
//! Brace expansion is a preprocessing step: `*.{js,ts}` becomes the two patterns `*.js` and
//! `*.ts` which are then compiled independently. Groups nest (`{a,{b,c}}`) and a pattern may
//! contain several groups, which expand to every combination.

/// Expands the brace groups of `pattern`.
///
/// Returns the pattern unchanged (as the only element) if it contains no complete group. An
/// unclosed `{` is literal, as is a `}` that has no opening brace. A group with a single
/// alternative (`{x}`) still expands and loses its braces. When `supports_escaped_characters`
/// is true, escaped braces and commas are literal and escapes are kept in the output so the
/// parser still sees them.
///
/// ```
/// # use extglob::brace_expansion::expand;
/// assert_eq!(expand("{a,b}/{c,d}", true), vec!["a/c", "a/d", "b/c", "b/d"]);
/// assert_eq!(expand("a{b", true), vec!["a{b"]);
/// ```
pub fn expand(pattern: &str, supports_escaped_characters: bool) -> Vec<String> {
    let Some(group) = find_brace_group(pattern, supports_escaped_characters) else {
        return vec![pattern.to_owned()];
    };

    let mut results = Vec::new();
    for alternative in &group.alternatives {
        for expanded in expand(alternative, supports_escaped_characters) {
            let combined = format!("{}{}{}", group.prefix, expanded, group.suffix);
            results.extend(expand(&combined, supports_escaped_characters));
        }
    }
    results
}

struct BraceGroup<'a> {
    prefix: String,
    alternatives: Vec<String>,
    suffix: &'a str,
}

/// Finds the first top level group.
fn find_brace_group(pattern: &str, supports_escaped_characters: bool) -> Option<BraceGroup<'_>> {
    let mut prefix = String::new();
    let mut alternatives = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut characters = pattern.char_indices();

    while let Some((offset, character)) = characters.next() {
        if supports_escaped_characters && character == '\\' {
            let target = if depth > 0 { &mut current } else { &mut prefix };
            target.push('\\');
            if let Some((_, escaped)) = characters.next() {
                target.push(escaped);
            }
            continue;
        }

        match character {
            '{' => {
                if depth > 0 {
                    current.push(character);
                }
                depth += 1;
            }
            '}' if depth == 0 => prefix.push(character),
            '}' => {
                depth -= 1;
                if depth == 0 {
                    alternatives.push(current);
                    return Some(BraceGroup {
                        prefix,
                        alternatives,
                        suffix: &pattern[offset + character.len_utf8()..],
                    });
                }
                current.push(character);
            }
            ',' if depth == 1 => alternatives.push(std::mem::take(&mut current)),
            _ if depth > 0 => current.push(character),
            _ => prefix.push(character),
        }
    }

    None
}
