//! Windows-1252 encoding utilities for Western-European thermal printers
//!
//! Receipt text goes to the device in the Windows-1252 code page
//! (selected with ESC t 16), which carries accented characters and the
//! Euro sign at 0x80. This module provides:
//! - Fixed-width helpers for layout (width, truncate, pad)
//! - Converting UTF-8 to Windows-1252 while preserving ESC/POS commands

/// Character width of a string as printed
///
/// Windows-1252 is a single-byte encoding, so the printed width equals
/// the character count.
pub fn text_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to fit within a printed width
pub fn truncate_text(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to a specific printed width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_text(s: &str, width: usize, align_right: bool) -> String {
    let current_width = text_width(s);
    if current_width >= width {
        return truncate_text(s, width);
    }
    let spaces = width - current_width;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Convert mixed UTF-8 content (with ESC/POS commands) to Windows-1252
///
/// ASCII bytes (0x00-0x7F) pass through exactly as is, which protects
/// ESC/POS commands from being corrupted. Only bytes >= 0x80 are treated
/// as UTF-8 sequences and re-encoded to Windows-1252.
pub fn convert_to_cp1252(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len());

    let mut buffer = Vec::new();
    for &b in bytes {
        if b < 128 {
            // ASCII byte (command or ASCII text)
            flush_buffer(&mut buffer, &mut result);
            result.push(b);
        } else {
            // Non-ASCII byte (part of a UTF-8 sequence)
            buffer.push(b);
        }
    }
    flush_buffer(&mut buffer, &mut result);

    result
}

/// Flush the non-ASCII buffer, converting UTF-8 to Windows-1252
fn flush_buffer(buffer: &mut Vec<u8>, result: &mut Vec<u8>) {
    if buffer.is_empty() {
        return;
    }

    let s = String::from_utf8_lossy(buffer);
    for c in s.chars() {
        let encoded = &mut [0u8; 4];
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(encoded));
        if had_errors {
            // Unmappable character: print a placeholder rather than
            // letting the encoder emit a multi-byte escape
            result.push(b'?');
        } else {
            result.extend_from_slice(&bytes);
        }
    }
    buffer.clear();
}
