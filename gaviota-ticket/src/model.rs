//! Ticket template model and data records
//!
//! A ticket is described twice: a [`TicketModel`] says what each line is
//! and how it is formatted, a [`DataRecord`] carries the concrete values.
//! Templates are static (typically deserialized once from a bundled JSON
//! resource); data comes from the caller per print.

use gaviota_printer::Alignment;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of ticket line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    /// Vertical whitespace (feed lines)
    Empty,
    /// Decorative divider built from a repeated token
    Separator,
    /// One text value on its own line
    SimpleText,
    /// 1-4 text fields spread across the line (item/qty/price rows)
    MultiColumnText,
    /// Raster image (photo, logo)
    Image,
    /// Kitchen row: long-form name plus an optional trailing field
    KitchenLine,
}

impl LineType {
    /// Decorative lines are subject to adjacent-duplicate collapsing
    pub fn is_decorative(&self) -> bool {
        matches!(self, LineType::Empty | LineType::Separator)
    }
}

fn default_font_scale() -> u8 {
    1
}

/// Static description of one ticket line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineTemplate {
    /// Data record key this line resolves against
    pub key: String,
    #[serde(rename = "type")]
    pub line_type: LineType,
    /// Whether `key` maps to a sequence of rows instead of a single value
    #[serde(default)]
    pub multiline: bool,
    #[serde(default = "default_font_scale")]
    pub font_width: u8,
    #[serde(default = "default_font_scale")]
    pub font_height: u8,
    #[serde(default)]
    pub align: Alignment,
    #[serde(default)]
    pub bold: bool,
    /// Inverse (white-on-black) printing
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub margin: usize,
    #[serde(default)]
    pub right_margin: usize,
    /// Separator glyph, repeated to fill the line
    #[serde(default)]
    pub token: Option<String>,
    /// Feed count for empty lines
    #[serde(default)]
    pub feed: Option<u8>,
}

impl LineTemplate {
    /// Template with default formatting (1x1 font, left aligned, no
    /// margins)
    pub fn new(key: impl Into<String>, line_type: LineType) -> Self {
        Self {
            key: key.into(),
            line_type,
            multiline: false,
            font_width: 1,
            font_height: 1,
            align: Alignment::Left,
            bold: false,
            background: false,
            margin: 0,
            right_margin: 0,
            token: None,
            feed: None,
        }
    }
}

/// Ordered line templates for one ticket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketModel(pub Vec<LineTemplate>);

impl TicketModel {
    /// Deserialize a model from its JSON resource form
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineTemplate> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Concrete value for one template key
#[derive(Debug, Clone)]
pub enum TicketValue {
    /// Scalar text
    Text(String),
    /// Repeated rows, each an ordered list of fields
    Rows(Vec<Vec<String>>),
    /// Decoded image payload
    Image(DynamicImage),
}

impl TicketValue {
    /// Human-readable shape name, used in diagnostics
    pub fn shape(&self) -> &'static str {
        match self {
            TicketValue::Text(_) => "text",
            TicketValue::Rows(_) => "rows",
            TicketValue::Image(_) => "image",
        }
    }
}

/// Key-value data for one ticket print
#[derive(Debug, Clone, Default)]
pub struct DataRecord {
    values: HashMap<String, TicketValue>,
}

impl DataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values
            .insert(key.into(), TicketValue::Text(value.into()));
        self
    }

    pub fn insert_rows(&mut self, key: impl Into<String>, rows: Vec<Vec<String>>) -> &mut Self {
        self.values.insert(key.into(), TicketValue::Rows(rows));
        self
    }

    pub fn insert_image(&mut self, key: impl Into<String>, image: DynamicImage) -> &mut Self {
        self.values.insert(key.into(), TicketValue::Image(image));
        self
    }

    pub fn get(&self, key: &str) -> Option<&TicketValue> {
        self.values.get(key)
    }
}
