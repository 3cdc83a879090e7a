//! JSON document written for a parsed copybook.
//!
//! The core crate exposes plain values; these serde types fix the public
//! schema. Optional attributes are omitted when absent, and condition names
//! never appear since they occupy no bytes in the record.

use serde::Serialize;

use open_mainframe_copybook::{
    ArrayElement, Category, Field, FieldPosition, ParseResult, RecordLayout,
};

/// Top-level document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopybookOutput {
    pub file_name: String,
    pub total_length: u32,
    pub fields: Vec<FieldOutput>,
    pub record_layouts: Vec<LayoutOutput>,
}

/// One data item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOutput {
    pub level: u8,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub start_position: u32,
    pub end_position: u32,
    pub length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<&'static str>,
    pub usage: &'static str,
    pub signed: bool,
    pub numeric: bool,
    pub decimal: bool,
    pub decimal_places: u32,
    pub occurs_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redefines: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub array_elements: Vec<ElementOutput>,
}

/// One occurrence of a table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementOutput {
    pub index: u32,
    pub start_position: u32,
    pub end_position: u32,
    pub length: u32,
    pub fields: Vec<PositionOutput>,
}

/// An elementary item inside a table occurrence.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionOutput {
    pub name: String,
    pub start_position: u32,
    pub end_position: u32,
    pub length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<&'static str>,
}

/// One record layout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOutput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redefines: Option<String>,
    pub fields: Vec<FieldOutput>,
    pub start_position: u32,
    pub length: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub record_type_values: Vec<String>,
}

impl From<&ParseResult> for CopybookOutput {
    fn from(result: &ParseResult) -> Self {
        Self {
            file_name: result.source_name.clone(),
            total_length: result.total_length,
            fields: result.fields.iter().map(FieldOutput::from).collect(),
            record_layouts: result.layouts.iter().map(LayoutOutput::from).collect(),
        }
    }
}

impl From<&Field> for FieldOutput {
    fn from(field: &Field) -> Self {
        Self {
            level: field.level,
            name: field.name.clone(),
            picture: field.picture.clone(),
            start_position: field.start,
            end_position: field.end,
            length: field.length,
            data_type: data_type(field.category, field.signed),
            usage: field.usage.keyword(),
            signed: field.signed,
            numeric: field.is_numeric(),
            decimal: field.decimal,
            decimal_places: field.decimal_places,
            occurs_count: field.occurs,
            redefines: field.redefines.clone(),
            value: field.value.clone(),
            children: field.children.iter().map(FieldOutput::from).collect(),
            array_elements: field.elements.iter().map(ElementOutput::from).collect(),
        }
    }
}

impl From<&ArrayElement> for ElementOutput {
    fn from(element: &ArrayElement) -> Self {
        Self {
            index: element.index,
            start_position: element.start,
            end_position: element.end,
            length: element.length,
            fields: element.fields.iter().map(PositionOutput::from).collect(),
        }
    }
}

impl From<&FieldPosition> for PositionOutput {
    fn from(position: &FieldPosition) -> Self {
        Self {
            name: position.name.clone(),
            start_position: position.start,
            end_position: position.end,
            length: position.length,
            picture: position.picture.clone(),
            data_type: data_type(position.category, false),
        }
    }
}

impl From<&RecordLayout> for LayoutOutput {
    fn from(layout: &RecordLayout) -> Self {
        Self {
            name: layout.name.clone(),
            redefines: layout.redefines.clone(),
            fields: layout.fields.iter().map(FieldOutput::from).collect(),
            start_position: layout.start,
            length: layout.length,
            record_type_values: layout.record_type_values.clone(),
        }
    }
}

/// Serialized data type; groups have none.
fn data_type(category: Category, signed: bool) -> Option<&'static str> {
    match category {
        Category::Group => None,
        Category::Numeric if signed => Some("SIGNED_NUMERIC"),
        other => Some(other.as_str()),
    }
}

/// Render the document as JSON.
pub fn to_json(result: &ParseResult, pretty: bool) -> serde_json::Result<String> {
    let output = CopybookOutput::from(result);
    if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
}
