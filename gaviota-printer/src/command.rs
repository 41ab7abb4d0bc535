//! Print command primitives
//!
//! A print job is an ordered list of [`PrintCommand`]s. The order is
//! significant end-to-end: the ESC/POS translation emits bytes in exactly
//! the order the commands were appended.

#[cfg(feature = "image")]
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Horizontal text alignment
///
/// Shared with the ticket template model, hence serde-able.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Paper cut mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutMode {
    /// Full cut
    Full,
    /// Partial cut (leave a small connection)
    Partial,
}

/// Primitive instruction consumed by a device driver
#[derive(Debug, Clone, PartialEq)]
pub enum PrintCommand {
    /// Set alignment for subsequent text
    AlignText(Alignment),
    /// Set bold / inverse (white-on-black) style for subsequent text
    SetTextStyle { bold: bool, inverse: bool },
    /// Set font scale (1..=8 in each axis, clamped at translation)
    SetFontSize { width: u8, height: u8 },
    /// Append text to the current line; may contain embedded newlines
    AppendText(String),
    /// Print and feed n lines
    FeedLines(u8),
    /// Print a raster image at the given device coordinates
    AddImage {
        image: RasterImage,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Drawer kick pulse
    Pulse { millis: u16 },
    /// Cut the paper
    Cut(CutMode),
}

impl PrintCommand {
    /// Drawer pulse with the standard 100ms kick
    pub fn drawer_pulse() -> Self {
        PrintCommand::Pulse { millis: 100 }
    }
}

/// 1-bit row-packed raster image
///
/// Rows are packed MSB-first, `row_bytes()` bytes per row. A set bit
/// prints black.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// Build a raster from packed rows.
    ///
    /// `data` must hold exactly `ceil(width/8) * height` bytes; excess is
    /// truncated, missing bytes are zero-filled (white).
    pub fn from_packed(width: u32, height: u32, mut data: Vec<u8>) -> Self {
        let expected = (width.div_ceil(8) * height) as usize;
        data.resize(expected, 0);
        Self {
            width,
            height,
            data,
        }
    }

    /// Convert a decoded image to a 1-bit raster.
    ///
    /// Transparent pixels (alpha < 128) stay white; opaque pixels print
    /// black when their luminance is below 128.
    #[cfg(feature = "image")]
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let row_bytes = width.div_ceil(8);
        let mut data = vec![0u8; (row_bytes * height) as usize];

        for y in 0..height {
            for x in 0..width {
                let pixel = rgba.get_pixel(x, y);
                let alpha = pixel[3];
                if alpha < 128 {
                    continue;
                }
                let luma = (0.299 * pixel[0] as f32
                    + 0.587 * pixel[1] as f32
                    + 0.114 * pixel[2] as f32) as u8;
                if luma < 128 {
                    let idx = (y * row_bytes + x / 8) as usize;
                    data[idx] |= 1 << (7 - (x % 8));
                }
            }
        }

        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Packed bytes per row
    pub fn row_bytes(&self) -> u32 {
        self.width.div_ceil(8)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
