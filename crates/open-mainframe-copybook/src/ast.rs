//! Resolved copybook layout types.
//!
//! These are plain values produced once per parse. Positions are 1-based
//! and inclusive; `length == end - start + 1` holds for every item (an empty
//! group has length 0 and `end == start - 1`).

use crate::lexer::INDEPENDENT_LEVEL;
use crate::picture::{Category, Usage};

/// A level 88 condition name attached to the field it refines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionName {
    /// The condition name.
    pub name: String,
    /// Literal values; ranges read `low THRU high`.
    pub values: Vec<String>,
}

/// A data item with its resolved position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Level number.
    pub level: u8,
    /// Data name (`FILLER` when unnamed).
    pub name: String,
    /// PICTURE string as written; `None` for groups.
    pub picture: Option<String>,
    /// Storage encoding.
    pub usage: Usage,
    /// First byte (1-based).
    pub start: u32,
    /// Last byte (inclusive).
    pub end: u32,
    /// Bytes occupied, all occurrences included.
    pub length: u32,
    /// Classification.
    pub category: Category,
    /// Signed numeric.
    pub signed: bool,
    /// Has an implied decimal point.
    pub decimal: bool,
    /// Digits after the implied decimal point.
    pub decimal_places: u32,
    /// OCCURS count, 0 for a scalar.
    pub occurs: u32,
    /// REDEFINES target.
    pub redefines: Option<String>,
    /// VALUE literal.
    pub value: Option<String>,
    /// Subordinate items (empty for elementary and OCCURS items).
    pub children: Vec<Field>,
    /// One entry per occurrence (OCCURS items only).
    pub elements: Vec<ArrayElement>,
    /// Level 88 condition names; never part of the physical layout.
    pub conditions: Vec<ConditionName>,
}

impl Field {
    /// Whether this item has no PICTURE of its own.
    pub fn is_group(&self) -> bool {
        self.category == Category::Group
    }

    /// Level 01 or 77 item, which starts a record of its own.
    pub fn is_record(&self) -> bool {
        self.level == 1 || self.level == INDEPENDENT_LEVEL
    }

    /// Whether this item repeats.
    pub fn is_table(&self) -> bool {
        self.occurs > 0
    }

    /// Numeric category.
    pub fn is_numeric(&self) -> bool {
        self.category == Category::Numeric
    }

    /// Length of one occurrence (the whole length for scalars).
    pub fn occurrence_length(&self) -> u32 {
        if self.occurs > 0 {
            self.length / self.occurs
        } else {
            self.length
        }
    }

    /// Find a descendant (or this field) by name, case-insensitively.
    /// OCCURS items are searched through their retained children only, so
    /// materialized tables expose just the table field itself.
    pub fn find(&self, name: &str) -> Option<&Field> {
        if self.name.eq_ignore_ascii_case(name) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Depth-first iterator over this field and all retained descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Field> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let field = stack.pop()?;
            stack.extend(field.children.iter().rev());
            Some(field)
        })
    }
}

/// One occurrence of an OCCURS item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayElement {
    /// Occurrence number (1-based).
    pub index: u32,
    /// First byte of this occurrence.
    pub start: u32,
    /// Last byte of this occurrence.
    pub end: u32,
    /// Length of one occurrence.
    pub length: u32,
    /// Every elementary item inside this occurrence.
    pub fields: Vec<FieldPosition>,
}

/// Position of an elementary item inside one table occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPosition {
    /// Data name; nested table items carry subscripts, e.g. `CELL(2,3)`.
    pub name: String,
    /// First byte (absolute record position).
    pub start: u32,
    /// Last byte.
    pub end: u32,
    /// Bytes occupied.
    pub length: u32,
    /// PICTURE string.
    pub picture: Option<String>,
    /// Classification.
    pub category: Category,
}

/// A named record shape over the record buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    /// Record (or variant) name.
    pub name: String,
    /// Name of the record this one overlays.
    pub redefines: Option<String>,
    /// Fields making up the record.
    pub fields: Vec<Field>,
    /// First byte; always 1 since all layouts share one buffer.
    pub start: u32,
    /// Record length in bytes.
    pub length: u32,
    /// Discriminator values selecting this variant.
    pub record_type_values: Vec<String>,
}

/// Result of parsing one copybook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    /// Name of the copybook source.
    pub source_name: String,
    /// Record length: the longest layout, or a declared `REC LEN`.
    pub total_length: u32,
    /// Top-level items in source order.
    pub fields: Vec<Field>,
    /// Record layouts.
    pub layouts: Vec<RecordLayout>,
}

impl ParseResult {
    /// Find a field by name anywhere in the top-level forest.
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find_map(|field| field.find(name))
    }

    /// Find a record layout by name.
    pub fn layout(&self, name: &str) -> Option<&RecordLayout> {
        self.layouts
            .iter()
            .find(|layout| layout.name.eq_ignore_ascii_case(name))
    }

    /// Number of fields in the forest, tables counted once.
    pub fn field_count(&self) -> usize {
        self.fields.iter().map(|field| field.walk().count()).sum()
    }
}
