//! ESC/POS translation
//!
//! Turns an ordered [`PrintCommand`] list into the byte stream a thermal
//! printer consumes. Command order is preserved bit-for-bit; the final
//! buffer is converted to Windows-1252 so accented text survives the wire.

use crate::command::{Alignment, CutMode, PrintCommand};
use crate::encoding::convert_to_cp1252;
use tracing::warn;

/// Translate commands to a ready-to-send ESC/POS byte stream
///
/// The stream starts with printer init (ESC @) and Windows-1252 code page
/// selection (ESC t 16).
pub fn encode_commands(commands: &[PrintCommand]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4096);

    // Initialize printer (ESC @), select Windows-1252 (ESC t 16)
    buf.extend_from_slice(&[0x1B, 0x40]);
    buf.extend_from_slice(&[0x1B, 0x74, 16]);

    for command in commands {
        encode_command(command, &mut buf);
    }

    convert_to_cp1252(&buf)
}

/// Append the byte sequence for one command
pub fn encode_command(command: &PrintCommand, buf: &mut Vec<u8>) {
    match command {
        PrintCommand::AlignText(align) => {
            // ESC a n
            let n = match align {
                Alignment::Left => 0x00,
                Alignment::Center => 0x01,
                Alignment::Right => 0x02,
            };
            buf.extend_from_slice(&[0x1B, 0x61, n]);
        }
        PrintCommand::SetTextStyle { bold, inverse } => {
            // ESC E n - emphasis, GS B n - reverse white/black
            buf.extend_from_slice(&[0x1B, 0x45, u8::from(*bold)]);
            buf.extend_from_slice(&[0x1D, 0x42, u8::from(*inverse)]);
        }
        PrintCommand::SetFontSize { width, height } => {
            // GS ! n - upper nibble width, lower nibble height, 0-based
            let w = (*width).clamp(1, 8) - 1;
            let h = (*height).clamp(1, 8) - 1;
            buf.extend_from_slice(&[0x1D, 0x21, (w << 4) | h]);
        }
        PrintCommand::AppendText(text) => {
            buf.extend_from_slice(text.as_bytes());
        }
        PrintCommand::FeedLines(n) => {
            // ESC d n - print and feed n lines
            buf.extend_from_slice(&[0x1B, 0x64, *n]);
        }
        PrintCommand::AddImage { image, x, y, .. } => {
            if image.is_empty() {
                warn!("skipping zero-sized raster image");
                return;
            }
            if *x != 0 || *y != 0 {
                // Raster graphics print at the current position; offsets
                // are not representable in GS v 0
                warn!(x, y, "image offset ignored by raster translation");
            }

            // Center align for image
            buf.extend_from_slice(&[0x1B, 0x61, 0x01]);

            // GS v 0 m xL xH yL yH
            let x_bytes = image.row_bytes();
            let height = image.height();
            buf.extend_from_slice(&[0x1D, 0x76, 0x30, 0x00]);
            buf.push(x_bytes as u8);
            buf.push((x_bytes >> 8) as u8);
            buf.push(height as u8);
            buf.push((height >> 8) as u8);
            buf.extend_from_slice(image.data());

            // Newline after image
            buf.push(0x0A);
        }
        PrintCommand::Pulse { millis } => {
            // ESC p m t1 t2 - pulse on pin 2; t1 is in 2ms units
            let t1 = (millis / 2).clamp(1, 255) as u8;
            buf.extend_from_slice(&[0x1B, 0x70, 0x00, t1, 250]);
        }
        PrintCommand::Cut(mode) => {
            // GS V m
            let m = match mode {
                CutMode::Full => 0x00,
                CutMode::Partial => 0x01,
            };
            buf.extend_from_slice(&[0x1D, 0x56, m]);
        }
    }
}
