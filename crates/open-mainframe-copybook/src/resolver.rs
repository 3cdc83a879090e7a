//! Physical layout resolver.
//!
//! Walks the roots of the [`Hierarchy`] with a byte cursor and assigns
//! positions bottom-up. Every level 01 or 77 record starts again at byte 1;
//! loose items of a fragment without a record continue from the previous
//! one.
//!
//!
//! - an elementary item takes its physical length from the PICTURE/USAGE
//!   analysis (times its OCCURS count) and advances the cursor;
//! - a group spans its children; an OCCURS group repeats that span and the
//!   cursor skips every occurrence;
//! - an item with REDEFINES is laid out from the recorded start of its
//!   target, and the cursor is restored afterwards so the overlay never
//!   extends the record. A target that cannot be found overlays from
//!   position 1.
//!
//! Once positions are settled, every OCCURS item is materialized: its
//! children are replaced by one [`ArrayElement`] per occurrence.

use std::collections::HashMap;

use tracing::warn;

use crate::ast::{ArrayElement, Field, FieldPosition};
use crate::hierarchy::{Hierarchy, NodeId};
use crate::picture::PictureInfo;

/// Resolve positions for every root, in source order.
pub fn resolve(hierarchy: &Hierarchy) -> Vec<Field> {
    let mut resolver = Resolver::new(hierarchy);
    hierarchy
        .roots()
        .iter()
        .map(|&root| resolver.resolve_root(root))
        .map(materialize)
        .collect()
}

struct Resolver<'h> {
    hierarchy: &'h Hierarchy,
    /// Next free byte (1-based).
    cursor: u32,
    /// Start position of every finalized item, by upper-case name.
    starts: HashMap<String, u32>,
}

impl<'h> Resolver<'h> {
    fn new(hierarchy: &'h Hierarchy) -> Self {
        Self {
            hierarchy,
            cursor: 1,
            starts: HashMap::new(),
        }
    }

    fn resolve_root(&mut self, root: NodeId) -> Field {
        if self.hierarchy.node(root).clause.depth() == 1 {
            self.cursor = 1;
        }
        self.lay_out(root)
    }

    fn lay_out(&mut self, id: NodeId) -> Field {
        let hierarchy = self.hierarchy;
        let node = hierarchy.node(id);
        let clause = &node.clause;

        let saved = self.cursor;
        if let Some(target) = &clause.redefines {
            self.cursor = self.target_start(target, &clause.name);
        }

        let info = PictureInfo::for_item(clause.picture.as_deref(), clause.usage);
        let occurs = clause.occurs.unwrap_or(0);

        let (start, length, children) = if node.is_elementary() {
            let start = self.cursor;
            let length = info.physical_length.saturating_mul(occurs.max(1));
            self.cursor = start.saturating_add(length);
            (start, length, Vec::new())
        } else {
            let first = self.cursor;
            let children: Vec<Field> = node.children.iter().map(|&child| self.lay_out(child)).collect();
            let span_start = children.iter().map(|c| c.start).min();
            let span_end = children.iter().map(|c| c.end).max();

            match (span_start, span_end) {
                (Some(start), Some(end)) => {
                    let single = end.saturating_add(1).saturating_sub(start);
                    if occurs > 0 {
                        let length = single.saturating_mul(occurs);
                        self.cursor = start.saturating_add(length);
                        (start, length, children)
                    } else {
                        (start, single, children)
                    }
                }
                _ => (first, 0, children),
            }
        };

        if clause.redefines.is_some() {
            self.cursor = saved;
        }
        self.starts.insert(clause.name.to_ascii_uppercase(), start);

        Field {
            level: clause.level,
            name: clause.name.clone(),
            picture: clause.picture.clone(),
            usage: clause.usage,
            start,
            end: last_byte(start, length),
            length,
            category: info.category,
            signed: info.signed,
            decimal: info.decimal,
            decimal_places: info.decimal_places,
            occurs,
            redefines: clause.redefines.clone(),
            value: clause.value.clone(),
            children,
            elements: Vec::new(),
            conditions: node.conditions.clone(),
        }
    }

    /// Start of a REDEFINES target among the items finalized so far.
    fn target_start(&self, target: &str, name: &str) -> u32 {
        match self.starts.get(&target.to_ascii_uppercase()) {
            Some(&start) => start,
            None => {
                warn!(item = name, target, "REDEFINES target not found, overlaying from position 1");
                1
            }
        }
    }
}

/// Last byte of a span; `start - 1` for an empty span.
fn last_byte(start: u32, length: u32) -> u32 {
    start.saturating_add(length).saturating_sub(1)
}

/// Replace the children of OCCURS items with array elements.
fn materialize(mut field: Field) -> Field {
    if field.is_table() {
        field.elements = expand(&field);
        field.children.clear();
    } else {
        let children = std::mem::take(&mut field.children);
        field.children = children.into_iter().map(materialize).collect();
    }
    field
}

/// Upper bound on the elements or item positions listed for one table.
const MAX_POSITIONS: u64 = 1_000_000;

/// One array element per occurrence of `table`.
///
/// Tables past [`MAX_POSITIONS`] keep their resolved extent but are listed
/// sparsely: elements without item positions, or no elements at all when
/// the occurrences alone exceed the bound.
fn expand(table: &Field) -> Vec<ArrayElement> {
    let single = table.occurrence_length();
    let per_occurrence = if table.children.is_empty() {
        u64::from(!table.is_group())
    } else {
        table.children.iter().map(position_count).fold(0, u64::saturating_add)
    };
    let total = per_occurrence.saturating_mul(u64::from(table.occurs));
    if u64::from(table.occurs) > MAX_POSITIONS {
        warn!(table = %table.name, occurs = table.occurs, "table too large to list its elements");
        return Vec::new();
    }
    let list_items = total <= MAX_POSITIONS;
    if !list_items {
        warn!(
            table = %table.name,
            positions = total,
            "table too large to list item positions; elements carry offsets only"
        );
    }

    (0..table.occurs)
        .map(|k| {
            let shift = k.saturating_mul(single);
            let start = table.start.saturating_add(shift);
            let mut fields = Vec::new();

            if list_items && table.children.is_empty() && !table.is_group() {
                fields.push(position(table, table.name.clone(), start, single));
            } else if list_items {
                for child in &table.children {
                    flatten(child, shift, &[], &mut fields);
                }
            }

            ArrayElement {
                index: k + 1,
                start,
                end: last_byte(start, single),
                length: single,
                fields,
            }
        })
        .collect()
}

/// Number of item positions `field` contributes, occurrences included.
fn position_count(field: &Field) -> u64 {
    let inner = if field.children.is_empty() {
        u64::from(!field.is_group())
    } else {
        field.children.iter().map(position_count).fold(0, u64::saturating_add)
    };
    inner.saturating_mul(u64::from(field.occurs.max(1)))
}

/// Collect the elementary items under `field`, shifted by `shift` bytes.
/// Nested tables repeat their items with subscripted names.
fn flatten(field: &Field, shift: u32, subscripts: &[u32], out: &mut Vec<FieldPosition>) {
    let single = field.occurrence_length();

    for j in 0..field.occurs.max(1) {
        let mut subs = subscripts.to_vec();
        if field.is_table() {
            subs.push(j + 1);
        }
        let offset = shift.saturating_add(j.saturating_mul(single));

        if field.children.is_empty() {
            if !field.is_group() {
                let name = subscripted(&field.name, &subs);
                out.push(position(field, name, field.start.saturating_add(offset), single));
            }
        } else {
            for child in &field.children {
                flatten(child, offset, &subs, out);
            }
        }
    }
}

fn position(field: &Field, name: String, start: u32, length: u32) -> FieldPosition {
    FieldPosition {
        name,
        start,
        end: last_byte(start, length),
        length,
        picture: field.picture.clone(),
        category: field.category,
    }
}

fn subscripted(name: &str, subscripts: &[u32]) -> String {
    if subscripts.is_empty() {
        return name.to_string();
    }
    let subs: Vec<String> = subscripts.iter().map(u32::to_string).collect();
    format!("{}({})", name, subs.join(","))
}
