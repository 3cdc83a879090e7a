//! Copybook tokenizer.
//!
//! Turns raw source lines into an ordered list of [`Clause`]s, one per data
//! description entry. An entry may span several physical lines: lines that
//! do not open with a level number continue the pending entry, and an entry
//! ends at a period followed by whitespace or the end of the text. A line
//! that opens with digits but no data name (the rest of a numeric VALUE
//! list) also continues an unterminated entry. Comment
//! lines are skipped but scanned for a `REC LEN : n` directive.

pub mod clause;
pub mod source;

pub use clause::{
    is_valid_level, parse_clause, split_words, strip_quotes, Clause, ClauseKind, CONDITION_LEVEL,
    INDEPENDENT_LEVEL, RENAMES_LEVEL,
};
pub use source::{record_length_directive, starts_with_level, SourceFormat, SourceLine};

use tracing::{debug, warn};

use clause::{is_clause_keyword, is_data_name};

/// Tokenizer output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    /// Entries in source order, condition names included.
    pub clauses: Vec<Clause>,
    /// Record length declared by a `REC LEN` comment directive.
    pub record_length: Option<u32>,
}

/// Tokenize copybook lines.
pub fn tokenize<S: AsRef<str>>(lines: &[S], format: SourceFormat) -> Tokens {
    let mut tokenizer = Tokenizer::new();
    for (idx, line) in lines.iter().enumerate() {
        tokenizer.feed(idx + 1, SourceLine::classify(line.as_ref(), format));
    }
    tokenizer.finish()
}

/// Incremental tokenizer state.
#[derive(Debug, Default)]
struct Tokenizer {
    tokens: Tokens,
    /// Text of the entry being accumulated.
    pending: String,
    /// Line where the pending entry started.
    pending_line: usize,
}

impl Tokenizer {
    fn new() -> Self {
        Self::default()
    }

    fn feed(&mut self, line_number: usize, line: SourceLine<'_>) {
        match line {
            SourceLine::Blank => {}
            SourceLine::Comment(text) => {
                if let Some(length) = record_length_directive(text) {
                    self.tokens.record_length = Some(length);
                }
            }
            SourceLine::Code(code) => {
                let pending = !self.pending.trim().is_empty();
                let literals = pending && starts_with_level(code) && continues_literals(code);
                if literals {
                    debug!(line = line_number, "numeric literals continue the pending entry");
                }
                if starts_with_level(code) && !literals {
                    if pending {
                        warn!(
                            line = self.pending_line,
                            "entry not terminated by a period before the next level number"
                        );
                        self.flush();
                    }
                    self.pending_line = line_number;
                    self.pending.push_str(code);
                } else if !pending {
                    warn!(line = line_number, text = code, "skipping text outside a data entry");
                    return;
                } else {
                    self.pending.push(' ');
                    self.pending.push_str(code);
                }
                self.drain_sentences();
            }
        }
    }

    /// Emit every complete sentence at the front of the pending text.
    fn drain_sentences(&mut self) {
        while let Some(end) = sentence_end(&self.pending) {
            let sentence: String = self.pending[..end].to_string();
            self.pending = self.pending[end + 1..].trim_start().to_string();
            self.emit(&sentence);
        }
    }

    /// Emit the pending text as an entry even without a closing period.
    fn flush(&mut self) {
        let sentence = std::mem::take(&mut self.pending);
        self.emit(sentence.trim());
    }

    fn emit(&mut self, sentence: &str) {
        if let Some(clause) = parse_clause(sentence, self.pending_line) {
            self.tokens.clauses.push(clause);
        }
    }

    fn finish(mut self) -> Tokens {
        if !self.pending.trim().is_empty() {
            warn!(line = self.pending_line, "last entry not terminated by a period");
            self.flush();
        }
        self.tokens
    }
}

/// Whether a line opening with a level-like number is really more literals:
/// its second word is neither a data name nor a clause keyword.
fn continues_literals(code: &str) -> bool {
    let words = split_words(code);
    match words.get(1).map(|word| word.trim_end_matches('.')) {
        Some(word) if !word.is_empty() => !is_data_name(word) && !is_clause_keyword(word),
        _ => false,
    }
}

/// Byte index of the first sentence-ending period: outside quotes and
/// followed by whitespace or the end of the text.
fn sentence_end(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '\'' || ch == '"' => quote = Some(ch),
            None if ch == '.' => {
                if chars.peek().map_or(true, |&(_, next)| next.is_whitespace()) {
                    return Some(idx);
                }
            }
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::Usage;

    fn free(lines: &[&str]) -> Tokens {
        tokenize(lines, SourceFormat::Free)
    }

    #[test]
    fn test_one_entry_per_line() {
        let tokens = free(&[
            "       01 REC-A.",
            "          05 FIELD-A PIC X(5).",
            "          05 FIELD-B PIC 9(3).",
        ]);
        let names: Vec<&str> = tokens.clauses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["REC-A", "FIELD-A", "FIELD-B"]);
        assert_eq!(tokens.clauses[2].line, 3);
    }

    #[test]
    fn test_blank_and_comment_lines_skipped() {
        let tokens = free(&["", "   * header comment", "01 REC-A PIC X(10).", "   "]);
        assert_eq!(tokens.clauses.len(), 1);
        assert_eq!(tokens.record_length, None);
    }

    #[test]
    fn test_continuation_lines() {
        let tokens = free(&[
            "05 AMOUNT",
            "     PIC S9(7)V99",
            "     COMP-3.",
            "05 NEXT-FIELD PIC X.",
        ]);
        assert_eq!(tokens.clauses.len(), 2);
        let amount = &tokens.clauses[0];
        assert_eq!(amount.picture.as_deref(), Some("S9(7)V99"));
        assert_eq!(amount.usage, Usage::Comp3);
        assert_eq!(amount.line, 1);
        assert_eq!(tokens.clauses[1].line, 4);
    }

    #[test]
    fn test_several_entries_on_one_line() {
        let tokens = free(&["01 REC-A. 05 FIELD-A PIC X(5). 05 FIELD-B PIC 9(3)."]);
        assert_eq!(tokens.clauses.len(), 3);
        assert_eq!(tokens.clauses[1].picture.as_deref(), Some("X(5)"));
    }

    #[test]
    fn test_period_inside_picture_and_literal() {
        let tokens = free(&["05 PRICE PIC ZZ9.99.", "05 NOTE PIC X(6) VALUE 'A. B.'."]);
        assert_eq!(tokens.clauses.len(), 2);
        assert_eq!(tokens.clauses[0].picture.as_deref(), Some("ZZ9.99"));
        assert_eq!(tokens.clauses[1].value.as_deref(), Some("A. B."));
    }

    #[test]
    fn test_missing_period_is_tolerated() {
        let tokens = free(&["05 FIELD-A PIC X(5)", "05 FIELD-B PIC X(2)"]);
        assert_eq!(tokens.clauses.len(), 2);
        assert_eq!(tokens.clauses[0].picture.as_deref(), Some("X(5)"));
        assert_eq!(tokens.clauses[1].picture.as_deref(), Some("X(2)"));
    }

    #[test]
    fn test_bad_lines_do_not_abort() {
        let tokens = free(&[
            "stray text before anything",
            "01 REC-A.",
            "AB CD EF.",
            "XX BROKEN PIC X.",
            "   05 GOOD PIC X(2).",
        ]);
        let names: Vec<&str> = tokens.clauses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["REC-A", "GOOD"]);
    }

    #[test]
    fn test_value_list_continues_on_numeric_line() {
        let tokens = free(&[
            "01 REC.",
            "   05 MONTH PIC 9(2).",
            "      88 VALID-MONTH VALUE 01 02 03",
            "                           04 05 06.",
            "   05 NEXT-F PIC X(3).",
        ]);
        let names: Vec<&str> = tokens.clauses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["REC", "MONTH", "VALID-MONTH", "NEXT-F"]);
        assert_eq!(tokens.clauses[2].values, vec!["01", "02", "03", "04", "05", "06"]);
        assert_eq!(tokens.clauses[3].level, 5);
    }

    #[test]
    fn test_unnamed_entry_still_starts_a_new_entry() {
        let tokens = free(&["05 A PIC X(2)", "05 PIC X(3).", "05 B."]);
        let names: Vec<&str> = tokens.clauses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "FILLER", "B"]);
        assert_eq!(tokens.clauses[1].picture.as_deref(), Some("X(3)"));
    }

    #[test]
    fn test_record_length_directive() {
        let tokens = free(&["* REC LEN : 120", "01 REC-A PIC X(100)."]);
        assert_eq!(tokens.record_length, Some(120));
    }

    #[test]
    fn test_condition_names_are_tokenized() {
        let tokens = free(&["05 STATUS PIC X(2).", "   88 STATUS-OK VALUE 'OK'."]);
        assert_eq!(tokens.clauses.len(), 2);
        assert!(tokens.clauses[1].is_condition_name());
    }

    #[test]
    fn test_fixed_format() {
        let lines = [
            "000100 01  CUSTOMER-REC.                                                    CUST0001",
            "000200*    REC LEN : 40",
            "000300     05  CUST-ID      PIC 9(6).                                       CUST0003",
            "000400     05  CUST-NAME    PIC X(30).",
        ];
        let tokens = tokenize(&lines, SourceFormat::Fixed);
        let names: Vec<&str> = tokens.clauses.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["CUSTOMER-REC", "CUST-ID", "CUST-NAME"]);
        assert_eq!(tokens.record_length, Some(40));
    }
}
