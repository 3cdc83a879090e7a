//! Copybook source lines and format handling.
//!
//! Copybooks arrive either in free format (statements anywhere on the line,
//! `*` as the first non-blank character marks a comment) or in traditional
//! fixed format (columns 1-6 sequence area, column 7 indicator, columns
//! 8-72 code).

/// Copybook source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    /// Free format: the whole line is code.
    #[default]
    Free,
    /// Fixed format (columns 1-6: sequence, 7: indicator, 8-72: code, 73-80: ignored).
    Fixed,
}

/// Classification of one physical source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLine<'a> {
    /// Nothing but whitespace.
    Blank,
    /// A comment; carries the comment text after the indicator.
    Comment(&'a str),
    /// Code content, trimmed.
    Code(&'a str),
}

impl<'a> SourceLine<'a> {
    /// Classify a raw line under the given format.
    pub fn classify(line: &'a str, format: SourceFormat) -> Self {
        match format {
            SourceFormat::Free => classify_free(line),
            SourceFormat::Fixed => classify_fixed(line),
        }
    }
}

fn classify_free(line: &str) -> SourceLine<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        SourceLine::Blank
    } else if let Some(comment) = trimmed.strip_prefix('*') {
        SourceLine::Comment(comment)
    } else {
        SourceLine::Code(trimmed)
    }
}

fn classify_fixed(line: &str) -> SourceLine<'_> {
    // Column positions are counted in characters, not bytes.
    let byte_at = |col: usize| {
        line.char_indices()
            .nth(col)
            .map(|(idx, _)| idx)
            .unwrap_or(line.len())
    };

    let indicator_at = byte_at(6);
    let code_start = byte_at(7);
    let code_end = byte_at(72);

    let indicator = line[indicator_at..].chars().next();
    let code = &line[code_start.min(code_end)..code_end];

    match indicator {
        Some('*') | Some('/') => SourceLine::Comment(code),
        _ if code.trim().is_empty() => SourceLine::Blank,
        _ => SourceLine::Code(code.trim()),
    }
}

/// Read a `REC LEN : <n>` directive from comment text.
///
/// Matching ignores case and spacing, so `*REC LEN: 200` and
/// `* rec len : 200` are equivalent.
pub fn record_length_directive(comment: &str) -> Option<u32> {
    let compact: String = comment
        .trim_start_matches('*')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    let rest = compact.strip_prefix("RECLEN:")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Whether a code line opens a new data description entry.
///
/// Entries begin with a two-digit level number followed by whitespace, a
/// period or the end of the line.
pub fn starts_with_level(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes
            .get(2)
            .map_or(true, |b| b.is_ascii_whitespace() || *b == b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_format_lines() {
        assert_eq!(SourceLine::classify("   ", SourceFormat::Free), SourceLine::Blank);
        assert_eq!(
            SourceLine::classify("   * a comment", SourceFormat::Free),
            SourceLine::Comment(" a comment")
        );
        assert_eq!(
            SourceLine::classify("  05 FIELD-A PIC X(5).  ", SourceFormat::Free),
            SourceLine::Code("05 FIELD-A PIC X(5).")
        );
    }

    #[test]
    fn test_fixed_format_lines() {
        let line = "000100     05 FIELD-A PIC X(5).                                         CUST0001";
        assert_eq!(
            SourceLine::classify(line, SourceFormat::Fixed),
            SourceLine::Code("05 FIELD-A PIC X(5).")
        );

        let comment = "000200* REC LEN : 80";
        assert_eq!(
            SourceLine::classify(comment, SourceFormat::Fixed),
            SourceLine::Comment(" REC LEN : 80")
        );

        assert_eq!(SourceLine::classify("000300", SourceFormat::Fixed), SourceLine::Blank);
    }

    #[test]
    fn test_record_length_directive() {
        assert_eq!(record_length_directive(" REC LEN : 200"), Some(200));
        assert_eq!(record_length_directive("rec len: 80 bytes"), Some(80));
        assert_eq!(record_length_directive("**REC LEN :1200"), Some(1200));
        assert_eq!(record_length_directive(" RECORD LENGTH 200"), None);
        assert_eq!(record_length_directive(" REC LEN : none"), None);
    }

    #[test]
    fn test_starts_with_level() {
        assert!(starts_with_level("01 REC-A."));
        assert!(starts_with_level("05\tFIELD"));
        assert!(starts_with_level("01"));
        assert!(!starts_with_level("PIC X(5)."));
        assert!(!starts_with_level("1 REC-A."));
        assert!(!starts_with_level("100 TIMES."));
    }
}
