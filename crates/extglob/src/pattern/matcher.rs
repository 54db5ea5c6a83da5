//! Backtracking matcher for compiled sections.
//!
//! The matcher works on a window `[start, end)` of the candidate's characters. Fixed length
//! sections are consumed from both ends of the window in a loop, so recursion only happens at
//! wildcards and pattern lists and its depth is bounded by the pattern, not by the candidate.
//! Positions are absolute so the leading period rule can look at the character before the
//! window.

use std::collections::HashSet;

use super::{CharacterClass, Quantifier, Section};
use crate::options::Options;

#[derive(Clone, Copy)]
pub(crate) struct Matcher<'a> {
    text: &'a [char],
    options: &'a Options,
}

impl<'a> Matcher<'a> {
    pub fn new(text: &'a [char], options: &'a Options) -> Self {
        Self { text, options }
    }

    /// Matches the sections against `text[..end]`.
    pub fn matches(&self, sections: &[Section], end: usize) -> bool {
        self.reduce(sections, 0, end, self.options.match_leading_directories)
    }

    fn is_separator(&self, position: usize) -> bool {
        self.options.is_path_separator(self.text[position])
    }

    fn at_segment_start(&self, position: usize) -> bool {
        position == 0 || self.is_separator(position - 1)
    }

    /// True if the character at `position` is a `.` that wildcards must not match.
    fn is_protected_period(&self, position: usize) -> bool {
        self.options.requires_explicit_leading_periods
            && self.text[position] == '.'
            && self.at_segment_start(position)
    }

    fn is_member(&self, members: &[CharacterClass], negated: bool, position: usize) -> bool {
        let character = self.text[position];
        members
            .iter()
            .any(|member| member.contains(character, self.options.diacritic_insensitive_ranges))
            != negated
    }

    /// Whether a single character section matches the character at `position`.
    fn matches_single(&self, section: &Section, position: usize) -> bool {
        if self.is_separator(position) || self.is_protected_period(position) {
            return false;
        }
        match section {
            Section::SingleCharacter => true,
            Section::OneOf { members, negated } => self.is_member(members, *negated, position),
            _ => false,
        }
    }

    fn matches_constant_at(&self, constant: &str, start: usize, end: usize) -> Option<usize> {
        let mut position = start;
        for character in constant.chars() {
            if position >= end || self.text[position] != character {
                return None;
            }
            position += 1;
        }
        Some(position)
    }

    fn matches_constant_before(&self, constant: &str, start: usize, end: usize) -> Option<usize> {
        let mut position = end;
        for character in constant.chars().rev() {
            if position <= start || self.text[position - 1] != character {
                return None;
            }
            position -= 1;
        }
        Some(position)
    }

    /// Matches the sections exactly against the window, ignoring leading directories.
    fn matches_window(&self, sections: &[Section], start: usize, end: usize) -> bool {
        self.reduce(sections, start, end, false)
    }

    fn reduce(
        &self,
        mut sections: &[Section],
        mut start: usize,
        mut end: usize,
        leading_directories: bool,
    ) -> bool {
        loop {
            // Fixed length sections at the front.
            match sections.first() {
                None => {
                    return start == end || (leading_directories && self.is_separator(start));
                }
                Some(Section::PathSeparator) => {
                    if sections.get(1) == Some(&Section::PathWildcard) {
                        return self.reduce_separator_and_path_wildcard(
                            sections,
                            start,
                            end,
                            leading_directories,
                        );
                    }
                    if start < end && self.is_separator(start) {
                        start += 1;
                        sections = &sections[1..];
                        continue;
                    }
                    return false;
                }
                Some(Section::Constant(constant)) => {
                    match self.matches_constant_at(constant, start, end) {
                        Some(next) => {
                            start = next;
                            sections = &sections[1..];
                            continue;
                        }
                        None => return false,
                    }
                }
                Some(section @ (Section::SingleCharacter | Section::OneOf { .. })) => {
                    if start < end && self.matches_single(section, start) {
                        start += 1;
                        sections = &sections[1..];
                        continue;
                    }
                    return false;
                }
                Some(_) => {}
            }

            // Fixed length sections at the back. With leading directories the end of the
            // window is not anchored.
            if !leading_directories {
                let count = sections.len();
                match &sections[count - 1] {
                    Section::PathSeparator => {
                        let ends_with_separator = start < end && self.is_separator(end - 1);
                        if self.zero_directory_suffix(sections, start) {
                            if !ends_with_separator {
                                sections = &sections[..count - 2];
                                continue;
                            }
                            if self.reduce(&sections[..count - 2], start, end, false) {
                                return true;
                            }
                        }
                        if ends_with_separator {
                            end -= 1;
                            sections = &sections[..count - 1];
                            continue;
                        }
                        return false;
                    }
                    Section::Constant(constant) => {
                        match self.matches_constant_before(constant, start, end) {
                            Some(previous) => {
                                end = previous;
                                sections = &sections[..count - 1];
                                continue;
                            }
                            None => return false,
                        }
                    }
                    section @ (Section::SingleCharacter | Section::OneOf { .. }) => {
                        if start < end && self.matches_single(section, end - 1) {
                            end -= 1;
                            sections = &sections[..count - 1];
                            continue;
                        }
                        return false;
                    }
                    _ => {}
                }
            }

            // A wildcard or a pattern list at the front.
            let rest = &sections[1..];
            return match &sections[0] {
                Section::ComponentWildcard => {
                    self.reduce_component_wildcard(rest, start, end, leading_directories)
                }
                Section::PathWildcard => {
                    self.reduce_path_wildcard(rest, start, end, leading_directories)
                }
                Section::PatternList {
                    quantifier,
                    alternatives,
                } => self.reduce_pattern_list(
                    *quantifier,
                    alternatives,
                    rest,
                    start,
                    end,
                    leading_directories,
                ),
                _ => false,
            };
        }
    }

    /// True if the sections end in `**/` that may match nothing: either `/**/` or a leading
    /// `**/` at the start of a path segment.
    fn zero_directory_suffix(&self, sections: &[Section], start: usize) -> bool {
        match sections {
            [Section::PathWildcard, Section::PathSeparator] => {
                self.at_segment_start(start)
            }
            [.., Section::PathSeparator, Section::PathWildcard, Section::PathSeparator] => true,
            _ => false,
        }
    }

    /// `sections` starts with a path separator followed by a path wildcard.
    fn reduce_separator_and_path_wildcard(
        &self,
        sections: &[Section],
        start: usize,
        end: usize,
        leading_directories: bool,
    ) -> bool {
        let starts_with_separator = start < end && self.is_separator(start);

        if sections.len() == 2 {
            return if self.options.trailing_path_wildcard_requires_component {
                starts_with_separator && end - start >= 2
            } else {
                start == end || starts_with_separator
            };
        }

        // `/**/` may match a single separator.
        if sections[2] == Section::PathSeparator
            && self.reduce(&sections[2..], start, end, leading_directories)
        {
            return true;
        }

        starts_with_separator && self.reduce(&sections[1..], start + 1, end, leading_directories)
    }

    fn reduce_component_wildcard(
        &self,
        rest: &[Section],
        start: usize,
        end: usize,
        leading_directories: bool,
    ) -> bool {
        if start < end && self.is_protected_period(start) {
            return false;
        }

        if rest.is_empty() {
            return leading_directories || (start..end).all(|position| !self.is_separator(position));
        }

        let mut position = start;
        loop {
            if self.reduce(rest, position, end, leading_directories) {
                return true;
            }
            if position == end || self.is_separator(position) {
                return false;
            }
            position += 1;
        }
    }

    fn reduce_path_wildcard(
        &self,
        rest: &[Section],
        start: usize,
        end: usize,
        leading_directories: bool,
    ) -> bool {
        if rest.is_empty() {
            return true;
        }

        // A leading `**/` may match zero directories.
        if rest[0] == Section::PathSeparator
            && self.at_segment_start(start)
            && self.reduce(&rest[1..], start, end, leading_directories)
        {
            return true;
        }

        (start..=end).any(|position| self.reduce(rest, position, end, leading_directories))
    }

    fn reduce_pattern_list(
        &self,
        quantifier: Quantifier,
        alternatives: &[Vec<Section>],
        rest: &[Section],
        start: usize,
        end: usize,
        leading_directories: bool,
    ) -> bool {
        match quantifier {
            Quantifier::ExactlyOne => continuations(*self, alternatives, start, end)
                .any(|next| self.reduce(rest, next, end, leading_directories)),
            Quantifier::ZeroOrOne => {
                continuations(*self, alternatives, start, end)
                    .any(|next| self.reduce(rest, next, end, leading_directories))
                    || self.reduce(rest, start, end, leading_directories)
            }
            Quantifier::ZeroOrMore | Quantifier::OneOrMore => {
                if quantifier == Quantifier::ZeroOrMore
                    && self.reduce(rest, start, end, leading_directories)
                {
                    return true;
                }
                self.reduce_repetition(alternatives, rest, start, end, leading_directories)
            }
            Quantifier::Negated => {
                let limit = (start..end)
                    .find(|&position| self.is_separator(position))
                    .unwrap_or(end);
                (start..=limit).rev().any(|next| {
                    !alternatives
                        .iter()
                        .any(|alternative| self.matches_window(alternative, start, next))
                        && self.reduce(rest, next, end, leading_directories)
                })
            }
        }
    }

    /// One or more non-empty occurrences of the alternatives followed by `rest`.
    ///
    /// Every position reachable after an occurrence is explored once, which keeps nested
    /// repetitions from revisiting the same split over and over.
    fn reduce_repetition(
        &self,
        alternatives: &[Vec<Section>],
        rest: &[Section],
        start: usize,
        end: usize,
        leading_directories: bool,
    ) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![start];

        while let Some(position) = pending.pop() {
            for next in continuations(*self, alternatives, position, end) {
                if next == position || !visited.insert(next) {
                    continue;
                }
                if self.reduce(rest, next, end, leading_directories) {
                    return true;
                }
                pending.push(next);
            }
        }

        false
    }
}

/// Every position `e` such that an alternative matches `[start, e)`. Each alternative yields
/// its longest match first.
fn continuations<'s>(
    matcher: Matcher<'s>,
    alternatives: &'s [Vec<Section>],
    start: usize,
    end: usize,
) -> impl Iterator<Item = usize> + 's {
    alternatives.iter().flat_map(move |alternative| {
        let (lowest, highest) = match fixed_length(alternative) {
            Some(length) => (start + length, start + length),
            None if crosses_separators(alternative, matcher.options) => (start, end),
            None => (
                start,
                (start..end)
                    .find(|&position| matcher.is_separator(position))
                    .unwrap_or(end),
            ),
        };
        (lowest..=highest.min(end))
            .rev()
            .filter(move |&next| matcher.matches_window(alternative, start, next))
    })
}

/// The number of characters the sections match, if it does not depend on the candidate.
fn fixed_length(sections: &[Section]) -> Option<usize> {
    sections.iter().try_fold(0, |length, section| {
        let section_length = match section {
            Section::Constant(constant) => constant.chars().count(),
            Section::PathSeparator | Section::SingleCharacter | Section::OneOf { .. } => 1,
            Section::PatternList {
                quantifier: Quantifier::ExactlyOne,
                alternatives,
            } => {
                let (first, rest) = alternatives.split_first()?;
                let first = fixed_length(first)?;
                if !rest
                    .iter()
                    .all(|alternative| fixed_length(alternative) == Some(first))
                {
                    return None;
                }
                first
            }
            Section::ComponentWildcard | Section::PathWildcard | Section::PatternList { .. } => {
                return None
            }
        };
        Some(length + section_length)
    })
}

/// False if a match of the sections can never contain a path separator.
fn crosses_separators(sections: &[Section], options: &Options) -> bool {
    sections.iter().any(|section| match section {
        Section::PathSeparator | Section::PathWildcard => true,
        Section::Constant(constant) => constant
            .chars()
            .any(|character| options.is_path_separator(character)),
        Section::PatternList { alternatives, .. } => alternatives
            .iter()
            .any(|alternative| crosses_separators(alternative, options)),
        Section::SingleCharacter | Section::OneOf { .. } | Section::ComponentWildcard => false,
    })
}
