//! PICTURE and USAGE analysis.
//!
//! [`analyze`] turns a PICTURE string and a USAGE into everything the layout
//! resolver needs to know about an elementary item: its category, sign and
//! decimal attributes, character count and the number of bytes it occupies
//! in a record. The function is total: malformed repeat counts degrade to a
//! single character instead of failing.

use std::fmt;

/// Storage encoding of a data item (USAGE clause).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Usage {
    /// DISPLAY (default): one byte per character.
    #[default]
    Display,
    /// COMP / COMPUTATIONAL.
    Comp,
    /// COMP-1: single precision float.
    Comp1,
    /// COMP-2: double precision float.
    Comp2,
    /// COMP-3: packed decimal.
    Comp3,
    /// COMP-4: binary.
    Comp4,
    /// COMP-5: native binary.
    Comp5,
    /// BINARY.
    Binary,
    /// PACKED-DECIMAL.
    PackedDecimal,
}

impl Usage {
    /// Recognize a USAGE keyword, case-insensitively.
    ///
    /// The `COMPUTATIONAL` spellings are accepted as aliases of `COMP`.
    pub fn from_keyword(word: &str) -> Option<Self> {
        let usage = match word.to_ascii_uppercase().as_str() {
            "DISPLAY" => Usage::Display,
            "COMP" | "COMPUTATIONAL" => Usage::Comp,
            "COMP-1" | "COMPUTATIONAL-1" => Usage::Comp1,
            "COMP-2" | "COMPUTATIONAL-2" => Usage::Comp2,
            "COMP-3" | "COMPUTATIONAL-3" => Usage::Comp3,
            "COMP-4" | "COMPUTATIONAL-4" => Usage::Comp4,
            "COMP-5" | "COMPUTATIONAL-5" => Usage::Comp5,
            "BINARY" => Usage::Binary,
            "PACKED-DECIMAL" => Usage::PackedDecimal,
            _ => return None,
        };
        Some(usage)
    }

    /// Canonical keyword for this usage.
    pub fn keyword(self) -> &'static str {
        match self {
            Usage::Display => "DISPLAY",
            Usage::Comp => "COMP",
            Usage::Comp1 => "COMP-1",
            Usage::Comp2 => "COMP-2",
            Usage::Comp3 => "COMP-3",
            Usage::Comp4 => "COMP-4",
            Usage::Comp5 => "COMP-5",
            Usage::Binary => "BINARY",
            Usage::PackedDecimal => "PACKED-DECIMAL",
        }
    }

    /// Binary integer encodings (halfword/fullword/doubleword).
    pub fn is_binary(self) -> bool {
        matches!(self, Usage::Comp | Usage::Comp4 | Usage::Comp5 | Usage::Binary)
    }

    /// Packed decimal encodings.
    pub fn is_packed(self) -> bool {
        matches!(self, Usage::Comp3 | Usage::PackedDecimal)
    }

    /// Fixed-size floating point items, which need no PICTURE.
    pub fn fixed_size(self) -> Option<u32> {
        match self {
            Usage::Comp1 => Some(4),
            Usage::Comp2 => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Classification of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Group item (no PICTURE, extent derived from children).
    Group,
    /// Numeric (PIC 9).
    Numeric,
    /// Alphanumeric (PIC X), also the fallback category.
    Alphanumeric,
    /// Alphabetic (PIC A).
    Alphabetic,
}

impl Category {
    /// Upper-case name used in serialized layouts.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Group => "GROUP",
            Category::Numeric => "NUMERIC",
            Category::Alphanumeric => "ALPHANUMERIC",
            Category::Alphabetic => "ALPHABETIC",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything derived from a (PICTURE, USAGE) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureInfo {
    /// Category of the item.
    pub category: Category,
    /// PICTURE contains `S`.
    pub signed: bool,
    /// PICTURE contains `V`.
    pub decimal: bool,
    /// Characters after the first `V`.
    pub decimal_places: u32,
    /// Character positions described by the PICTURE (at least 1).
    pub character_length: u32,
    /// Count of `9` positions.
    pub digits: u32,
    /// Bytes occupied in the record under the given USAGE.
    pub physical_length: u32,
}

impl PictureInfo {
    /// Attributes of a group item: no length contribution of its own.
    pub fn group() -> Self {
        Self {
            category: Category::Group,
            signed: false,
            decimal: false,
            decimal_places: 0,
            character_length: 0,
            digits: 0,
            physical_length: 0,
        }
    }

    /// Attributes of a picture-less COMP-1/COMP-2 item.
    pub fn floating(size: u32) -> Self {
        Self {
            category: Category::Numeric,
            signed: true,
            decimal: false,
            decimal_places: 0,
            character_length: 0,
            digits: 0,
            physical_length: size,
        }
    }

    /// Analyze an optional picture: `None` yields group attributes unless
    /// the usage is a fixed-size float.
    pub fn for_item(picture: Option<&str>, usage: Usage) -> Self {
        match (picture, usage.fixed_size()) {
            (Some(pic), _) => analyze(pic, usage),
            (None, Some(size)) => Self::floating(size),
            (None, None) => Self::group(),
        }
    }
}

/// Analyze a PICTURE string under a USAGE.
pub fn analyze(picture: &str, usage: Usage) -> PictureInfo {
    let upper = picture.trim().to_ascii_uppercase();
    let symbols = scan_symbols(&upper);

    let has = |c: char| symbols.iter().any(|s| s.symbol == c);
    let signed = has('S');
    let decimal = has('V');

    let character_length = count_characters(&symbols).max(1);
    let decimal_places = match symbols.iter().position(|s| s.symbol == 'V') {
        Some(idx) => count_characters(&symbols[idx + 1..]),
        None => 0,
    };
    let digits = symbols
        .iter()
        .filter(|s| s.symbol == '9')
        .fold(0u32, |acc, s| acc.saturating_add(s.count));

    let category = if has('9') {
        Category::Numeric
    } else if has('X') {
        Category::Alphanumeric
    } else if has('A') {
        Category::Alphabetic
    } else {
        Category::Alphanumeric
    };

    PictureInfo {
        category,
        signed,
        decimal,
        decimal_places,
        character_length,
        digits,
        physical_length: physical_length(usage, character_length, digits),
    }
}

/// Bytes occupied by an item with the given character and digit counts.
pub fn physical_length(usage: Usage, character_length: u32, digits: u32) -> u32 {
    match usage {
        Usage::Display => character_length,
        u if u.is_packed() => digits.saturating_add(2) / 2,
        u if u.is_binary() => match digits {
            0..=4 => 2,
            5..=9 => 4,
            _ => 8,
        },
        Usage::Comp1 => 4,
        Usage::Comp2 => 8,
        _ => character_length,
    }
}

/// One PICTURE symbol with its repeat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Symbol {
    symbol: char,
    count: u32,
    /// Written with parentheses, so the count applies whatever the symbol.
    repeated: bool,
}

/// Split a PICTURE into symbols, expanding `c(n)` repeat counts.
///
/// A malformed repeat (missing `)`, empty, non-numeric, zero or overflowing)
/// is read as a single occurrence of the symbol. An unclosed `(` consumes
/// nothing beyond itself so the rest of the picture is still scanned.
fn scan_symbols(picture: &str) -> Vec<Symbol> {
    let chars: Vec<char> = picture.chars().filter(|c| !c.is_whitespace()).collect();
    let mut symbols = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let symbol = chars[i];
        if symbol == '(' || symbol == ')' {
            i += 1;
            continue;
        }

        if chars.get(i + 1) == Some(&'(') {
            match chars[i + 2..].iter().position(|&c| c == ')') {
                Some(len) => {
                    let text: String = chars[i + 2..i + 2 + len].iter().collect();
                    let count = text.parse::<u32>().ok().filter(|&n| n > 0);
                    symbols.push(Symbol {
                        symbol,
                        count: count.unwrap_or(1),
                        repeated: true,
                    });
                    i += len + 3;
                }
                None => {
                    symbols.push(Symbol {
                        symbol,
                        count: 1,
                        repeated: true,
                    });
                    i += 2;
                }
            }
            continue;
        }

        symbols.push(Symbol {
            symbol,
            count: 1,
            repeated: false,
        });
        i += 1;
    }

    symbols
}

/// Character positions: every repeat count plus one per bare X, 9, A or Z.
fn count_characters(symbols: &[Symbol]) -> u32 {
    symbols.iter().fold(0u32, |acc, s| {
        let n = if s.repeated || matches!(s.symbol, 'X' | '9' | 'A' | 'Z') {
            s.count
        } else {
            0
        };
        acc.saturating_add(n)
    })
}
