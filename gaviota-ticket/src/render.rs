//! Line renderer
//!
//! Turns each [`RenderableLine`] into the ordered [`PrintCommand`]s the
//! device layer consumes. A malformed line yields a diagnostic and is
//! skipped; the rest of the ticket still prints.

use crate::layout::{compute_column_spacing, fill_background, pad_for_alignment, wrap_long_line};
use crate::merge::{LinePayload, LineStyle, RenderableLine};
use crate::model::LineType;
use gaviota_printer::{Alignment, PrintCommand, RasterImage};
use image::GenericImageView;
use thiserror::Error;
use tracing::warn;

/// Trailing zone reserved for price columns, in characters at font 1
const PRICE_ZONE_CHARS: usize = 13;

/// Images scale to this device-unit width, aspect preserved
const IMAGE_TARGET_WIDTH: u32 = 500;

/// Per-line rendering problem; the line is dropped, rendering continues
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderDiagnostic {
    #[error("line '{key}' has no usable payload for {line_type:?}")]
    PayloadMismatch { key: String, line_type: LineType },

    #[error("line '{key}' has {count} columns; only 1 to 4 are printable")]
    ColumnCount { key: String, count: usize },
}

/// Renderer for one device width
pub struct LineRenderer {
    width_chars: usize,
    price_zone: usize,
}

impl LineRenderer {
    /// `width_chars` is the ticket width in characters at font scale 1
    pub fn new(width_chars: usize) -> Self {
        Self {
            width_chars,
            price_zone: PRICE_ZONE_CHARS,
        }
    }

    /// Override the trailing price-zone width
    pub fn with_price_zone(width_chars: usize, price_zone: usize) -> Self {
        Self {
            width_chars,
            price_zone,
        }
    }

    /// Render every line, skipping malformed ones
    pub fn render(&self, lines: &[RenderableLine]) -> Vec<PrintCommand> {
        let mut commands = Vec::new();
        for line in lines {
            match self.render_line(line) {
                Ok(line_commands) => commands.extend(line_commands),
                Err(diagnostic) => {
                    warn!(key = %line.key, error = %diagnostic, "Line skipped");
                }
            }
        }
        commands
    }

    /// Render one line to its command sequence
    pub fn render_line(&self, line: &RenderableLine) -> Result<Vec<PrintCommand>, RenderDiagnostic> {
        match (line.line_type, &line.payload) {
            (LineType::Empty, LinePayload::Feed(n)) => Ok(vec![PrintCommand::FeedLines(*n)]),
            (LineType::Separator, LinePayload::Text(token)) => {
                self.separator_commands(line, token)
            }
            (LineType::SimpleText, LinePayload::Text(text)) => {
                let mut commands = self.simple_text_commands(text, &line.style, false, None);
                commands.push(PrintCommand::FeedLines(1));
                Ok(commands)
            }
            (LineType::MultiColumnText, LinePayload::Fields(fields)) => {
                self.multi_column_commands(line, fields)
            }
            (LineType::Image, LinePayload::Image(image)) => self.image_commands(line, image),
            (LineType::KitchenLine, LinePayload::Fields(fields)) => {
                self.kitchen_commands(line, fields)
            }
            _ => Err(self.payload_mismatch(line)),
        }
    }

    fn payload_mismatch(&self, line: &RenderableLine) -> RenderDiagnostic {
        RenderDiagnostic::PayloadMismatch {
            key: line.key.clone(),
            line_type: line.line_type,
        }
    }

    /// Divider: the token repeated to fill the line at the current font
    fn separator_commands(
        &self,
        line: &RenderableLine,
        token: &str,
    ) -> Result<Vec<PrintCommand>, RenderDiagnostic> {
        if token.is_empty() {
            return Err(self.payload_mismatch(line));
        }
        let font_width = line.style.font_width.max(1) as usize;
        let text: String = token
            .chars()
            .cycle()
            .take(self.width_chars / font_width)
            .collect();

        Ok(vec![
            PrintCommand::AlignText(Alignment::Center),
            PrintCommand::SetTextStyle {
                bold: line.style.bold,
                inverse: false,
            },
            PrintCommand::SetFontSize {
                width: line.style.font_width,
                height: line.style.font_height,
            },
            PrintCommand::AppendText(text),
            PrintCommand::FeedLines(1),
        ])
    }

    /// One aligned text block without its trailing feed
    ///
    /// `trailing_margin` moves the left-alignment margin behind the text
    /// (used by inner price columns); `left_indent` overrides the
    /// continuation indent for wrapped text.
    fn simple_text_commands(
        &self,
        text: &str,
        style: &LineStyle,
        trailing_margin: bool,
        left_indent: Option<usize>,
    ) -> Vec<PrintCommand> {
        if text.is_empty() {
            return Vec::new();
        }

        let font_width = style.font_width.max(1) as usize;
        let line_chars = self.width_chars / font_width;
        let max_text_len = line_chars.saturating_sub(2 * style.margin);

        // Text with embedded line breaks is already managed by the caller
        let mut text = text.to_string();
        if text.chars().count() > max_text_len && !text.contains('\n') {
            let indent = match left_indent {
                Some(indent) if indent < max_text_len => indent,
                _ => style.margin,
            };
            text = wrap_long_line(&text, max_text_len, indent, style.align).join("\n");
        }

        text = pad_for_alignment(&text, style.margin, style.align, trailing_margin);
        if style.background {
            text = fill_background(&text, line_chars);
        }

        vec![
            PrintCommand::AlignText(style.align),
            PrintCommand::SetTextStyle {
                bold: style.bold,
                inverse: style.background,
            },
            PrintCommand::SetFontSize {
                width: style.font_width,
                height: style.font_height,
            },
            PrintCommand::AppendText(text),
        ]
    }

    /// 1-4 fields spread across the line, one feed for the whole row
    fn multi_column_commands(
        &self,
        line: &RenderableLine,
        fields: &[String],
    ) -> Result<Vec<PrintCommand>, RenderDiagnostic> {
        let style = &line.style;
        let font_width = style.font_width.max(1) as usize;
        let line_chars = self.width_chars / font_width;

        // Columns never carry the background band
        let column_style = LineStyle {
            background: false,
            ..style.clone()
        };

        let lengths: Vec<usize> = fields.iter().map(|f| f.chars().count()).collect();
        let gaps = compute_column_spacing(
            &lengths,
            line_chars,
            style.margin,
            style.right_margin,
            self.price_zone / font_width,
        );

        let mut commands = Vec::new();
        match fields {
            [first] => {
                let text = format!("{}{}", first, " ".repeat(gaps[0]));
                commands.extend(self.simple_text_commands(&text, &column_style, false, None));
            }
            [first, second] => {
                let left = format!("{}{}", first, " ".repeat(gaps[0]));
                let right = format!("{}{}", second, " ".repeat(style.right_margin));
                commands.extend(self.simple_text_commands(&left, &column_style, false, None));
                commands.extend(self.simple_text_commands(&right, &column_style, false, None));
            }
            [first, second, third] => {
                let quantity = format!("{}{}", " ".repeat(gaps[0]), second);
                let price = format!(
                    "{}{}{}",
                    " ".repeat(gaps[1]),
                    third,
                    " ".repeat(style.right_margin)
                );
                commands.extend(self.simple_text_commands(first, &column_style, false, None));
                commands.extend(self.simple_text_commands(&quantity, &column_style, false, None));
                commands.extend(self.simple_text_commands(&price, &column_style, false, None));
            }
            [first, second, third, fourth] => {
                let quantity = format!("{}{}", " ".repeat(gaps[0]), second);
                let unit_price = format!("{}{}", " ".repeat(gaps[1]), third);
                let total = format!("{}{}", " ".repeat(gaps[2]), fourth);
                commands.extend(self.simple_text_commands(first, &column_style, false, None));
                commands.extend(self.simple_text_commands(&quantity, &column_style, true, None));
                commands.extend(self.simple_text_commands(&unit_price, &column_style, false, None));
                commands.extend(self.simple_text_commands(&total, &column_style, false, None));
            }
            _ => {
                return Err(RenderDiagnostic::ColumnCount {
                    key: line.key.clone(),
                    count: fields.len(),
                });
            }
        }

        commands.push(PrintCommand::FeedLines(1));
        Ok(commands)
    }

    /// Kitchen row: long-form first field, optional second field after one
    /// space, wrapped text aligned past the first field
    fn kitchen_commands(
        &self,
        line: &RenderableLine,
        fields: &[String],
    ) -> Result<Vec<PrintCommand>, RenderDiagnostic> {
        let Some(first) = fields.first() else {
            return Err(self.payload_mismatch(line));
        };

        let left_indent = first.chars().count() + line.style.margin + 1;
        let mut text = first.clone();
        if let Some(second) = fields.get(1) {
            text.push(' ');
            text.push_str(second);
        }

        let mut commands = self.simple_text_commands(&text, &line.style, false, Some(left_indent));
        commands.push(PrintCommand::FeedLines(1));
        Ok(commands)
    }

    /// Photo/logo scaled to the fixed device width, aspect preserved
    fn image_commands(
        &self,
        line: &RenderableLine,
        image: &image::DynamicImage,
    ) -> Result<Vec<PrintCommand>, RenderDiagnostic> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(self.payload_mismatch(line));
        }

        let scale = IMAGE_TARGET_WIDTH as f32 / width as f32;
        let new_width = IMAGE_TARGET_WIDTH;
        let new_height = ((height as f32 * scale).round() as u32).max(1);

        let resized = image.resize_exact(new_width, new_height, image::imageops::FilterType::Nearest);

        Ok(vec![PrintCommand::AddImage {
            image: RasterImage::from_image(&resized),
            x: 0,
            y: 0,
            width: new_width,
            height: new_height,
        }])
    }
}
