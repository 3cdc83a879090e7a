//! Data description entry grammar.
//!
//! One sentence of copybook text (`LEVEL NAME clauses...`, period already
//! removed) becomes a [`Clause`]. Optional clauses may appear in any order
//! and are matched case-insensitively; words that are not understood are
//! skipped rather than rejected.

use tracing::{debug, warn};

use crate::picture::Usage;

/// Level number of a condition name.
pub const CONDITION_LEVEL: u8 = 88;
/// Level number of a RENAMES entry.
pub const RENAMES_LEVEL: u8 = 66;
/// Level number of an independent elementary item.
pub const INDEPENDENT_LEVEL: u8 = 77;

/// What kind of entry a clause describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    /// Item with a PICTURE (or a picture-less COMP-1/COMP-2 item).
    ElementaryField,
    /// Item without a PICTURE; its extent comes from subordinate items.
    GroupField,
    /// Level 88 condition name.
    ConditionName,
    /// Level 66 RENAMES entry.
    Renames,
}

/// A parsed data description entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// 1-based source line where the entry starts.
    pub line: usize,
    /// Level number (01-49, 66, 77, 88).
    pub level: u8,
    /// Data name, `FILLER` when omitted.
    pub name: String,
    /// Entry kind.
    pub kind: ClauseKind,
    /// PICTURE string as written.
    pub picture: Option<String>,
    /// USAGE, DISPLAY when absent.
    pub usage: Usage,
    /// OCCURS count (the maximum for `OCCURS n TO m`).
    pub occurs: Option<u32>,
    /// OCCURS DEPENDING ON object.
    pub depending_on: Option<String>,
    /// REDEFINES target.
    pub redefines: Option<String>,
    /// VALUE literal(s), quotes removed, joined by a space.
    pub value: Option<String>,
    /// Individual VALUE literals; ranges read `low THRU high`.
    pub values: Vec<String>,
}

impl Clause {
    /// Whether this is a level 88 condition name.
    pub fn is_condition_name(&self) -> bool {
        self.kind == ClauseKind::ConditionName
    }

    /// Nesting depth used by the hierarchy builder. Level 77 items are
    /// independent records and nest like level 01.
    pub fn depth(&self) -> u8 {
        if self.level == INDEPENDENT_LEVEL {
            1
        } else {
            self.level
        }
    }
}

/// Whether a level number can appear in a data description.
pub fn is_valid_level(level: u8) -> bool {
    matches!(level, 1..=49 | RENAMES_LEVEL | INDEPENDENT_LEVEL | CONDITION_LEVEL)
}

/// Parse one sentence into a clause.
///
/// Returns `None` (after logging) when the sentence has no usable level
/// number or nothing after it.
pub fn parse_clause(sentence: &str, line: usize) -> Option<Clause> {
    let words = split_words(sentence);
    let mut cursor = WordCursor::new(&words);

    let level_word = cursor.next()?;
    let level = match level_word.parse::<u8>() {
        Ok(level) if level_word.len() == 2 && is_valid_level(level) => level,
        _ => {
            warn!(line, entry = sentence, "skipping entry without a valid level number");
            return None;
        }
    };

    let name = match cursor.peek() {
        Some(word) if is_data_name(word) && !is_clause_keyword(word) => {
            cursor.advance();
            word.to_string()
        }
        Some(_) => "FILLER".to_string(),
        None => {
            warn!(line, entry = sentence, "skipping entry without a data name");
            return None;
        }
    };

    let mut clause = Clause {
        line,
        level,
        name,
        kind: ClauseKind::GroupField,
        picture: None,
        usage: Usage::Display,
        occurs: None,
        depending_on: None,
        redefines: None,
        value: None,
        values: Vec::new(),
    };

    if level == CONDITION_LEVEL {
        parse_condition_clauses(&mut cursor, &mut clause);
        clause.kind = ClauseKind::ConditionName;
        return Some(clause);
    }

    parse_item_clauses(&mut cursor, &mut clause);

    clause.kind = if level == RENAMES_LEVEL {
        ClauseKind::Renames
    } else if clause.picture.is_some() || clause.usage.fixed_size().is_some() {
        ClauseKind::ElementaryField
    } else {
        ClauseKind::GroupField
    };

    Some(clause)
}

/// Level 88 entries only carry VALUE; everything else is ignored.
fn parse_condition_clauses(cursor: &mut WordCursor<'_>, clause: &mut Clause) {
    while let Some(word) = cursor.next() {
        if matches_any(word, &["VALUE", "VALUES"]) {
            parse_values(cursor, clause);
        }
    }
}

fn parse_item_clauses(cursor: &mut WordCursor<'_>, clause: &mut Clause) {
    while let Some(word) = cursor.next() {
        let upper = word.to_ascii_uppercase();
        match upper.as_str() {
            "PIC" | "PICTURE" => {
                cursor.skip_if("IS");
                clause.picture = cursor.next().map(str::to_string);
            }
            "USAGE" => {
                cursor.skip_if("IS");
                match cursor.next() {
                    Some(keyword) => match Usage::from_keyword(keyword) {
                        Some(usage) => clause.usage = usage,
                        None => warn!(
                            line = clause.line,
                            name = %clause.name,
                            keyword,
                            "unrecognized USAGE, using DISPLAY"
                        ),
                    },
                    None => warn!(line = clause.line, name = %clause.name, "USAGE without keyword"),
                }
            }
            "OCCURS" => parse_occurs(cursor, clause),
            "DEPENDING" => {
                cursor.skip_if("ON");
                clause.depending_on = cursor.next().map(str::to_string);
            }
            "INDEXED" => {
                cursor.skip_if("BY");
                cursor.skip_names();
            }
            "ASCENDING" | "DESCENDING" => {
                cursor.skip_if("KEY");
                cursor.skip_if("IS");
                cursor.skip_names();
            }
            "REDEFINES" => {
                clause.redefines = cursor.next().map(str::to_string);
            }
            "VALUE" | "VALUES" => parse_values(cursor, clause),
            _ => match Usage::from_keyword(&upper) {
                Some(usage) => clause.usage = usage,
                None => debug!(line = clause.line, word, "ignoring clause word"),
            },
        }
    }
}

/// `OCCURS n [TO m] [TIMES]`.
fn parse_occurs(cursor: &mut WordCursor<'_>, clause: &mut Clause) {
    let Some(count) = cursor.peek().and_then(|w| w.parse::<u32>().ok()) else {
        warn!(line = clause.line, name = %clause.name, "OCCURS without a count, ignoring");
        return;
    };
    cursor.advance();
    let mut times = count;

    if cursor.skip_if("TO") {
        match cursor.peek().and_then(|w| w.parse::<u32>().ok()) {
            Some(max) => {
                cursor.advance();
                times = max;
            }
            None => warn!(line = clause.line, name = %clause.name, "OCCURS TO without a maximum"),
        }
    }
    cursor.skip_if("TIMES");

    clause.occurs = Some(times);
}

/// `VALUE [IS] literal...` and `VALUES [ARE] literal...`, with THRU ranges.
fn parse_values(cursor: &mut WordCursor<'_>, clause: &mut Clause) {
    cursor.skip_if("IS");
    cursor.skip_if("ARE");

    while let Some(word) = cursor.peek() {
        if is_clause_keyword(word) {
            break;
        }
        cursor.advance();

        if matches_any(word, &["THRU", "THROUGH"]) {
            if let (Some(low), Some(high)) = (clause.values.pop(), cursor.next()) {
                clause.values.push(format!("{} THRU {}", low, strip_quotes(high)));
            }
            continue;
        }
        clause.values.push(strip_quotes(word).to_string());
    }

    if !clause.values.is_empty() {
        clause.value = Some(clause.values.join(" "));
    }
}

/// Remove one pair of surrounding quotes, if present.
pub fn strip_quotes(literal: &str) -> &str {
    for quote in ['\'', '"'] {
        if literal.len() >= 2 && literal.starts_with(quote) && literal.ends_with(quote) {
            return &literal[1..literal.len() - 1];
        }
    }
    literal
}

/// Split a sentence into words. Quoted literals stay whole (including
/// doubled quotes), and a comma or semicolon followed by a space separates
/// words like whitespace does.
pub fn split_words(sentence: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut chars = sentence.char_indices().peekable();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;

    while let Some((idx, ch)) = chars.next() {
        if let Some(q) = quote {
            if ch == q {
                if chars.peek().map(|&(_, c)| c) == Some(q) {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            continue;
        }

        let separator = ch.is_whitespace()
            || ((ch == ',' || ch == ';')
                && chars.peek().map_or(true, |&(_, c)| c.is_whitespace()));

        if separator {
            if let Some(s) = start.take() {
                words.push(&sentence[s..idx]);
            }
            continue;
        }

        if start.is_none() {
            start = Some(idx);
        }
        if ch == '\'' || ch == '"' {
            quote = Some(ch);
        }
    }

    if let Some(s) = start {
        words.push(&sentence[s..]);
    }
    words
}

pub(crate) fn is_data_name(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_alphabetic())
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Words that start a clause and therefore can never be a data name or a
/// VALUE literal.
pub(crate) fn is_clause_keyword(word: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "PIC",
        "PICTURE",
        "USAGE",
        "OCCURS",
        "REDEFINES",
        "VALUE",
        "VALUES",
        "SIGN",
        "JUST",
        "JUSTIFIED",
        "SYNC",
        "SYNCHRONIZED",
        "BLANK",
        "EXTERNAL",
        "GLOBAL",
        "INDEXED",
        "DEPENDING",
        "ASCENDING",
        "DESCENDING",
        "RENAMES",
    ];
    matches_any(word, KEYWORDS) || Usage::from_keyword(word).is_some()
}

fn matches_any(word: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| word.eq_ignore_ascii_case(k))
}

/// Cursor over the words of one sentence.
struct WordCursor<'a> {
    words: &'a [&'a str],
    pos: usize,
}

impl<'a> WordCursor<'a> {
    fn new(words: &'a [&'a str]) -> Self {
        Self { words, pos: 0 }
    }

    fn peek(&self) -> Option<&'a str> {
        self.words.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn next(&mut self) -> Option<&'a str> {
        let word = self.peek();
        if word.is_some() {
            self.advance();
        }
        word
    }

    /// Consume the next word if it is `keyword`.
    fn skip_if(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(word) if word.eq_ignore_ascii_case(keyword) => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    /// Consume data names up to the next clause keyword.
    fn skip_names(&mut self) {
        while let Some(word) = self.peek() {
            if is_clause_keyword(word) || !is_data_name(word) {
                break;
            }
            self.advance();
        }
    }
}
