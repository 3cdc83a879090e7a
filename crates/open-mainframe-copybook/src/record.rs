//! Record layout extraction.
//!
//! Every level 01/77 record becomes a [`RecordLayout`] starting at position
//! 1, since all records of a copybook share one buffer. Items of a fragment
//! declared outside any record are gathered into one implicit record. A
//! record that starts with a type code (an elementary field carrying
//! condition names) followed by a REDEFINES family also yields one layout
//! per family member, so each record variant can be read on its own.

use tracing::{debug, warn};

use crate::ast::{Field, RecordLayout};

/// Build the record layouts for the resolved roots.
///
/// `declared` is the record length from a `REC LEN` directive. With
/// `cap_redefines`, a redefining record's layout length never exceeds the
/// longest earlier record (or `declared`, if larger). Consecutive items
/// outside any level 01/77 record form one implicit record named after the
/// first of them.
pub fn extract(roots: &[Field], declared: Option<u32>, cap_redefines: bool) -> Vec<RecordLayout> {
    let mut layouts = Vec::new();
    let mut base = declared.unwrap_or(0);
    let mut loose: Vec<Field> = Vec::new();

    for root in roots {
        if !root.is_record() {
            loose.push(root.clone());
            continue;
        }
        if let Some(layout) = implicit_record(&mut loose) {
            base = base.max(layout.length);
            layouts.push(layout);
        }

        let mut length = root.length;
        if cap_redefines && root.redefines.is_some() && base > 0 && length > base {
            warn!(
                record = %root.name,
                length,
                base,
                "redefining record is longer than the record it overlays; capping"
            );
            length = base;
        }
        if root.redefines.is_none() {
            base = base.max(root.length);
        }

        let fields = if root.is_group() {
            root.children.clone()
        } else {
            vec![root.clone()]
        };
        layouts.push(RecordLayout {
            name: root.name.clone(),
            redefines: root.redefines.clone(),
            fields,
            start: 1,
            length,
            record_type_values: Vec::new(),
        });
        layouts.extend(variants(root));
    }
    layouts.extend(implicit_record(&mut loose));
    layouts
}

/// Layout for items declared outside any record, draining `loose`.
fn implicit_record(loose: &mut Vec<Field>) -> Option<RecordLayout> {
    let first = loose.first()?;
    let name = first.name.clone();
    debug!(record = %name, items = loose.len(), "items outside a record form an implicit record");
    let fields = std::mem::take(loose);
    let length = fields.iter().map(|field| field.end).max().unwrap_or(0);
    Some(RecordLayout {
        name,
        redefines: None,
        fields,
        start: 1,
        length,
        record_type_values: Vec::new(),
    })
}

/// Overall record length: the longest layout, unless a declared length
/// covers it.
pub fn total_length(layouts: &[RecordLayout], declared: Option<u32>) -> u32 {
    let computed = layouts.iter().map(|layout| layout.length).max().unwrap_or(0);
    match declared {
        Some(length) if length >= computed => length,
        Some(length) => {
            warn!(declared = length, computed, "REC LEN directive shorter than the layout; ignoring it");
            computed
        }
        None => computed,
    }
}

/// Variant layouts of a record selected by a leading type code.
fn variants(root: &Field) -> Vec<RecordLayout> {
    let children = &root.children;
    let Some(code) = children.first() else {
        return Vec::new();
    };
    if code.is_group() || code.conditions.is_empty() {
        return Vec::new();
    }
    let Some(family) = redefines_family(children) else {
        return Vec::new();
    };

    let paired = code.conditions.len() == family.len();
    let all_values: Vec<String> = code
        .conditions
        .iter()
        .flat_map(|condition| condition.values.iter().cloned())
        .collect();
    debug!(record = %root.name, code = %code.name, variants = family.len(), "record variants");

    family
        .iter()
        .enumerate()
        .map(|(position, &member)| {
            let fields: Vec<Field> = children
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx == member || !family.contains(idx))
                .map(|(_, field)| field.clone())
                .collect();
            let length = fields.iter().map(|field| field.end).max().unwrap_or(0);
            let record_type_values = if paired {
                code.conditions[position].values.clone()
            } else {
                all_values.clone()
            };
            RecordLayout {
                name: children[member].name.clone(),
                redefines: children[member].redefines.clone(),
                fields,
                start: 1,
                length,
                record_type_values,
            }
        })
        .collect()
}

/// Indices of the first REDEFINES family after the type code: the base item
/// followed by every sibling redefining it.
fn redefines_family(children: &[Field]) -> Option<Vec<usize>> {
    children.iter().enumerate().skip(1).find_map(|(idx, child)| {
        let target = child.redefines.as_deref()?;
        let base = children[1..idx]
            .iter()
            .position(|sibling| sibling.name.eq_ignore_ascii_case(target))?
            + 1;
        let mut family = vec![base];
        family.extend(children.iter().enumerate().skip(base + 1).filter_map(|(i, sibling)| {
            sibling
                .redefines
                .as_deref()
                .filter(|t| t.eq_ignore_ascii_case(target))
                .map(|_| i)
        }));
        Some(family)
    })
}
