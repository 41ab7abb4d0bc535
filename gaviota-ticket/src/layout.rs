//! Column layout utility
//!
//! Pure fixed-width arithmetic for the character grid: word wrap,
//! alignment padding, multi-column gap computation, and background fill.
//! Every function is total - degenerate inputs produce unpadded or empty
//! output instead of errors.

use gaviota_printer::Alignment;

/// Greedy word wrap for text wider than one line
///
/// Whole words are appended while they fit; a word wider than `max_width`
/// is hard-split at the `max_width - 1` boundary. Continuation lines (all
/// but the first) are left-padded by `continuation_indent` spaces when the
/// alignment is left. Re-wrapping any produced line at the same width
/// returns it unchanged.
pub fn wrap_long_line(
    text: &str,
    max_width: usize,
    continuation_indent: usize,
    align: Alignment,
) -> Vec<String> {
    if max_width == 0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let current_len = current.chars().count();
        let word_len = word.chars().count();

        if current_len + word_len + 1 < max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else if word_len < max_width {
            lines.push(current);
            current = word.to_string();
        } else {
            // Hard-split an oversized word across full lines
            let mut remaining: Vec<char> = word.chars().collect();
            while remaining.len() > max_width {
                let head_len = current.chars().count();
                let mut offset = max_width
                    .saturating_sub(head_len + 1)
                    .min(remaining.len());
                if offset == 0 && current.is_empty() {
                    // guarantee progress at degenerate widths
                    offset = 1;
                }
                let head: String = remaining.drain(..offset).collect();
                if current.is_empty() {
                    lines.push(head);
                } else {
                    lines.push(format!("{} {}", current, head));
                    current = String::new();
                }
            }
            current = remaining.into_iter().collect();
        }
    }
    lines.push(current);

    let indent = match align {
        Alignment::Left => continuation_indent,
        _ => 0,
    };
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.clone()
            } else {
                format!("{}{}", " ".repeat(indent), line)
            }
        })
        .collect()
}

/// Apply margin padding for an alignment
///
/// Left alignment puts the margin ahead of the text, or behind it when
/// `trailing` is set (continuation columns). Right alignment always pads
/// behind. Centered text is left untouched - the device centers it.
pub fn pad_for_alignment(text: &str, margin: usize, align: Alignment, trailing: bool) -> String {
    let pad = " ".repeat(margin);
    match align {
        Alignment::Left => {
            if trailing {
                format!("{}{}", text, pad)
            } else {
                format!("{}{}", pad, text)
            }
        }
        Alignment::Right => format!("{}{}", text, pad),
        Alignment::Center => text.to_string(),
    }
}

/// Compute the filler gaps for a 1-4 column row
///
/// Returns one gap per pair of adjacent fields (for a single field, the
/// trailing fill). The last column right-aligns its value inside
/// `price_zone` characters; 4-column rows additionally split that zone so
/// the third field sits between the second and fourth. The row then fills
/// `total_chars` exactly; when the fields are too wide every gap clamps
/// to a minimum of 1 and the row is allowed to overflow.
pub fn compute_column_spacing(
    field_lengths: &[usize],
    total_chars: usize,
    margin: usize,
    right_margin: usize,
    price_zone: usize,
) -> Vec<usize> {
    let sum: usize = field_lengths.iter().sum();

    match field_lengths {
        [first] => {
            vec![
                total_chars
                    .saturating_sub(2 * margin + first)
                    .max(1),
            ]
        }
        [_, _] => {
            vec![
                total_chars
                    .saturating_sub(2 * margin + right_margin + sum)
                    .max(1),
            ]
        }
        [_, _, last] => {
            let inter_price = price_zone.saturating_sub(*last).max(1);
            let gap = total_chars
                .saturating_sub(sum + inter_price + 3 * margin + right_margin)
                .max(1);
            vec![gap, inter_price]
        }
        [_, _, _, last] => {
            let inter_price = price_zone.saturating_sub(*last).max(1);
            let gap = total_chars
                .saturating_sub(sum + 1 + 4 * margin + right_margin + inter_price)
                .max(1);
            let front = (inter_price / 2).max(1);
            let back = inter_price + 1 - front;
            vec![gap, front, back]
        }
        _ => Vec::new(),
    }
}

/// Center each sub-line inside an inverse-printed band
///
/// Every `\n`-separated line gets half the slack as leading spaces and is
/// padded (or truncated) to exactly `width`, so the background band spans
/// the full line.
pub fn fill_background(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    text.split('\n')
        .map(|line| {
            let len = gaviota_printer::text_width(line);
            let padding = if width > len { (width - len) / 2 } else { 0 };
            let padded = format!("{}{}", " ".repeat(padding), line);
            gaviota_printer::pad_text(&padded, width, false)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_short_text_is_untouched() {
        let lines = wrap_long_line("Merry Christmas", 48, 0, Alignment::Left);
        assert_eq!(lines, vec!["Merry Christmas"]);
    }

    #[test]
    fn test_wrap_breaks_on_word_boundaries() {
        let lines = wrap_long_line("one two three four five", 10, 0, Alignment::Left);
        for line in &lines {
            assert!(line.chars().count() <= 10, "line too wide: {:?}", line);
            assert!(!line.starts_with(' '));
        }
        assert_eq!(
            lines.join(" ").split_whitespace().collect::<Vec<_>>(),
            vec!["one", "two", "three", "four", "five"]
        );
    }

    #[test]
    fn test_wrap_indents_continuation_lines_when_left() {
        let lines = wrap_long_line("alpha beta gamma delta", 12, 3, Alignment::Left);
        assert!(lines.len() > 1);
        assert!(!lines[0].starts_with(' '));
        for line in &lines[1..] {
            assert!(line.starts_with("   "));
        }

        let centered = wrap_long_line("alpha beta gamma delta", 12, 3, Alignment::Center);
        for line in &centered[1..] {
            assert!(!line.starts_with(' '));
        }
    }

    #[test]
    fn test_wrap_hard_splits_oversized_words() {
        let lines = wrap_long_line("abcdefghijklmnop", 6, 0, Alignment::Left);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.chars().count() <= 6);
        }
        assert_eq!(lines.concat(), "abcdefghijklmnop");
    }

    #[test]
    fn test_wrap_is_idempotent_on_its_own_output() {
        let text = "a fairly long greeting that needs wrapping over lines";
        let lines = wrap_long_line(text, 14, 0, Alignment::Left);
        for line in &lines {
            assert_eq!(
                wrap_long_line(line, 14, 0, Alignment::Left),
                vec![line.clone()]
            );
        }
    }

    #[test]
    fn test_wrap_degenerate_inputs() {
        assert_eq!(wrap_long_line("", 10, 0, Alignment::Left), vec![""]);
        assert_eq!(
            wrap_long_line("whatever text", 0, 0, Alignment::Left),
            vec!["whatever text"]
        );
    }

    #[test]
    fn test_pad_for_alignment() {
        assert_eq!(pad_for_alignment("hi", 2, Alignment::Left, false), "  hi");
        assert_eq!(pad_for_alignment("hi", 2, Alignment::Left, true), "hi  ");
        assert_eq!(pad_for_alignment("hi", 2, Alignment::Right, false), "hi  ");
        assert_eq!(pad_for_alignment("hi", 2, Alignment::Center, false), "hi");
        assert_eq!(pad_for_alignment("hi", 0, Alignment::Left, false), "hi");
    }

    #[test]
    fn test_single_column_fills_line() {
        let gaps = compute_column_spacing(&[5], 48, 1, 1, 13);
        assert_eq!(gaps, vec![48 - 2 - 5]);
    }

    #[test]
    fn test_two_column_gap_fills_line() {
        let gaps = compute_column_spacing(&[10, 6], 48, 1, 1, 13);
        // fields + gap + both margins + right margin == 48
        assert_eq!(10 + 6 + gaps[0] + 2 * 1 + 1, 48);
    }

    #[test]
    fn test_three_column_row_sums_to_width() {
        let lengths = [12, 2, 5];
        let gaps = compute_column_spacing(&lengths, 48, 1, 1, 13);
        assert_eq!(gaps.len(), 2);
        // price right-aligns inside the 13-char zone
        assert_eq!(gaps[1] + lengths[2], 13);
        let sum: usize = lengths.iter().sum::<usize>() + gaps.iter().sum::<usize>();
        assert_eq!(sum + 3 * 1 + 1, 48);
    }

    #[test]
    fn test_four_column_row_sums_to_width() {
        // a typical item row: Coffee 2 1.50 3.00 at width 48
        let lengths = [6, 1, 4, 4];
        let gaps = compute_column_spacing(&lengths, 48, 1, 1, 13);
        assert_eq!(gaps.len(), 3);
        let sum: usize = lengths.iter().sum::<usize>() + gaps.iter().sum::<usize>();
        assert_eq!(sum + 4 * 1 + 1, 48);
        // third field sits inside the split price zone
        assert!(gaps[1] < gaps[2]);
    }

    #[test]
    fn test_gaps_clamp_to_one_on_overflow() {
        let gaps = compute_column_spacing(&[30, 10, 12], 40, 1, 1, 13);
        assert!(gaps.iter().all(|&g| g >= 1));
    }

    #[test]
    fn test_fill_background_centers_and_pads() {
        assert_eq!(fill_background("hi", 8), "   hi   ");
        assert_eq!(fill_background("hey", 8), "  hey   ");
        assert_eq!(fill_background("a\nbb", 4), " a  \n bb ");
        // wider than the band: truncated, never overflowing
        assert_eq!(fill_background("abcdefgh", 4), "abcd");
        assert_eq!(fill_background("x", 0), "x");
    }
}
