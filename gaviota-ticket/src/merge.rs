//! Template-data merge engine
//!
//! Resolves a [`TicketModel`] against a [`DataRecord`] into the ordered
//! [`RenderableLine`]s a ticket actually prints: multiline templates
//! expand into one line per row, over-long item names split into
//! continuation lines, empty payloads are dropped, and adjacent
//! decorative duplicates collapse so a missing data field never leaves a
//! doubled divider or blank line behind.

use crate::model::{DataRecord, LineTemplate, LineType, TicketModel, TicketValue};
use gaviota_printer::Alignment;
use image::{DynamicImage, GenericImageView};
use thiserror::Error;
use tracing::warn;

/// Default separator glyph when a template does not name one
const DEFAULT_SEPARATOR_TOKEN: &str = "-";

/// Margin applied to generated continuation lines
const CONTINUATION_MARGIN: usize = 4;

/// Validation problem scoped to a single template
///
/// Diagnostics never abort the ticket; the offending template is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeDiagnostic {
    #[error("value for '{key}' has the wrong shape: expected {expected}, found {found}")]
    ShapeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Formatting attributes copied from the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStyle {
    pub font_width: u8,
    pub font_height: u8,
    pub align: Alignment,
    pub bold: bool,
    pub background: bool,
    pub margin: usize,
    pub right_margin: usize,
}

impl LineStyle {
    fn from_template(template: &LineTemplate) -> Self {
        Self {
            font_width: template.font_width,
            font_height: template.font_height,
            align: template.align,
            bold: template.bold,
            background: template.background,
            margin: template.margin,
            right_margin: template.right_margin,
        }
    }
}

/// Resolved payload of a renderable line
#[derive(Debug, Clone)]
pub enum LinePayload {
    Text(String),
    Fields(Vec<String>),
    Image(DynamicImage),
    Feed(u8),
}

impl LinePayload {
    pub fn is_empty(&self) -> bool {
        match self {
            LinePayload::Text(text) => text.is_empty(),
            LinePayload::Fields(fields) => {
                fields.is_empty() || fields.iter().all(|f| f.is_empty())
            }
            LinePayload::Image(image) => image.width() == 0 || image.height() == 0,
            LinePayload::Feed(n) => *n == 0,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            LinePayload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_fields(&self) -> Option<&[String]> {
        match self {
            LinePayload::Fields(fields) => Some(fields),
            _ => None,
        }
    }
}

/// One concrete, ready-to-render ticket line
#[derive(Debug, Clone)]
pub struct RenderableLine {
    pub key: String,
    pub line_type: LineType,
    pub payload: LinePayload,
    pub style: LineStyle,
}

/// Merge result: the printable lines plus per-template diagnostics
#[derive(Debug, Default)]
pub struct MergedTicket {
    pub lines: Vec<RenderableLine>,
    pub diagnostics: Vec<MergeDiagnostic>,
}

/// Template-data merger for one device class
///
/// `max_line_chars` is the device's per-column character budget, used to
/// decide when an item name needs a continuation line.
pub struct TicketMerger {
    max_line_chars: usize,
}

impl TicketMerger {
    pub fn new(max_line_chars: usize) -> Self {
        Self { max_line_chars }
    }

    /// Resolve every template in model order against the data record
    pub fn merge(&self, model: &TicketModel, data: &DataRecord) -> MergedTicket {
        let mut merged = MergedTicket::default();

        for template in model.iter() {
            // Absent key: the template simply does not print
            let Some(value) = data.get(&template.key) else {
                continue;
            };
            self.merge_template(template, value, &mut merged);
        }

        merged.lines.retain(|line| !line.payload.is_empty());
        collapse_adjacent_duplicates(&mut merged.lines, LineType::Separator);
        collapse_adjacent_duplicates(&mut merged.lines, LineType::Empty);

        merged
    }

    fn merge_template(&self, template: &LineTemplate, value: &TicketValue, out: &mut MergedTicket) {
        if template.multiline {
            let TicketValue::Rows(rows) = value else {
                out.diagnostics
                    .push(shape_mismatch(template, "rows", value));
                return;
            };
            for row in rows {
                self.merge_row(template, row, out);
            }
            return;
        }

        let payload = match (template.line_type, value) {
            (LineType::Image, TicketValue::Image(image)) => LinePayload::Image(image.clone()),
            (LineType::Image, other) => {
                out.diagnostics.push(shape_mismatch(template, "image", other));
                return;
            }
            (LineType::Empty, TicketValue::Text(text)) => {
                // The scalar gates presence; a numeric value overrides the
                // template's feed count
                let feed = text
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .or(template.feed)
                    .unwrap_or(1);
                LinePayload::Feed(feed)
            }
            (LineType::Separator, TicketValue::Text(_)) => LinePayload::Text(
                template
                    .token
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SEPARATOR_TOKEN.to_string()),
            ),
            (_, TicketValue::Text(text)) => LinePayload::Text(text.clone()),
            (_, other) => {
                out.diagnostics.push(shape_mismatch(template, "text", other));
                return;
            }
        };

        out.lines.push(RenderableLine {
            key: template.key.clone(),
            line_type: template.line_type,
            payload,
            style: LineStyle::from_template(template),
        });
    }

    /// Expand one data row of a multiline template
    fn merge_row(&self, template: &LineTemplate, row: &[String], out: &mut MergedTicket) {
        let style = LineStyle::from_template(template);

        // Kitchen rows attach their fields untouched; the renderer owns
        // the two-field indent layout
        if template.line_type == LineType::KitchenLine {
            out.lines.push(RenderableLine {
                key: template.key.clone(),
                line_type: template.line_type,
                payload: LinePayload::Fields(row.to_vec()),
                style,
            });
            return;
        }

        let mut fields = row.to_vec();
        let mut overflow = String::new();
        if fields.len() == 4 && fields[1].chars().count() > self.max_line_chars {
            overflow = self.split_long_name(&mut fields[1]);
        }

        out.lines.push(RenderableLine {
            key: template.key.clone(),
            line_type: template.line_type,
            payload: LinePayload::Fields(fields),
            style,
        });

        if !overflow.is_empty() {
            out.lines.push(self.continuation_line(template, &overflow));
        }
    }

    /// Keep a bounded prefix of a long item name in place, returning the
    /// words that spill over
    fn split_long_name(&self, name: &mut String) -> String {
        let words: Vec<&str> = name.split(' ').filter(|w| !w.is_empty()).collect();
        let Some(first) = words.first() else {
            return String::new();
        };

        let mut kept = format!("{} ", first);
        let mut overflow = String::new();
        for word in &words[1..] {
            if kept.chars().count() + word.chars().count() < self.max_line_chars {
                kept.push_str(word);
                kept.push(' ');
            } else {
                overflow.push_str(word);
                overflow.push(' ');
            }
        }

        *name = kept;
        overflow
    }

    /// Continuation line carrying the overflow words of a split name
    fn continuation_line(&self, template: &LineTemplate, overflow: &str) -> RenderableLine {
        let bounded: String = overflow.chars().take(self.max_line_chars).collect();
        RenderableLine {
            key: template.key.clone(),
            line_type: LineType::SimpleText,
            payload: LinePayload::Text(format!(" {}", bounded)),
            style: LineStyle {
                font_width: 1,
                font_height: 1,
                align: Alignment::Left,
                bold: false,
                background: false,
                margin: CONTINUATION_MARGIN,
                right_margin: 0,
            },
        }
    }
}

fn shape_mismatch(
    template: &LineTemplate,
    expected: &'static str,
    found: &TicketValue,
) -> MergeDiagnostic {
    let diagnostic = MergeDiagnostic::ShapeMismatch {
        key: template.key.clone(),
        expected,
        found: found.shape(),
    };
    warn!(key = %template.key, expected, found = found.shape(), "Template skipped");
    diagnostic
}

/// Remove the later line of each adjacent same-type decorative pair
///
/// Reversed scan: `old_position` tracks the most recently seen matching
/// line; an exactly-adjacent earlier match deletes the tracked one. Lines
/// of other types in between keep both occurrences. A run of three
/// collapses once per merge, not to a single line.
fn collapse_adjacent_duplicates(lines: &mut Vec<RenderableLine>, line_type: LineType) {
    if lines.is_empty() {
        return;
    }

    let mut old_position = lines.len() - 1;
    for index in (0..lines.len()).rev() {
        if lines[index].line_type == line_type {
            if index + 1 == old_position {
                lines.remove(old_position);
            } else {
                old_position = index;
            }
        }
    }
}
