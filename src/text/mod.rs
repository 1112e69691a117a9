//! # Text Layout
//!
//! Line breaking and text measurement.
//!
//! Every paragraph on a quotation is measured before it is placed, and the
//! page-break decision depends on the measured line count. Measuring and
//! drawing therefore go through the same [`TextLayout::break_into_lines`]
//! call so the two can never disagree.

use crate::font::{FontContext, StandardFont};
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    /// The text on this line, without trailing whitespace.
    pub text: String,
    /// Width of the line in points.
    pub width: f64,
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character position. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields byte offsets of the start of the next segment.
    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        let mut char_idx = 0;
        for (byte_idx, _) in text.char_indices() {
            map[byte_idx] = char_idx;
            char_idx += 1;
        }
        map[text.len()] = char_idx;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TextLayout;

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break a string into lines that fit within `max_width` points.
    ///
    /// Greedy: each line takes as many words as fit. Explicit newlines always
    /// break. A single word wider than the line is split at the character
    /// that overflows.
    pub fn break_into_lines(
        &self,
        font_context: &FontContext,
        text: &str,
        max_width: f64,
        font_size: f64,
        font: StandardFont,
    ) -> Vec<BrokenLine> {
        if text.is_empty() {
            return vec![BrokenLine {
                text: String::new(),
                width: 0.0,
            }];
        }

        let chars: Vec<char> = text.chars().collect();
        let char_widths: Vec<f64> = chars
            .iter()
            .map(|&ch| font_context.char_width(ch, font, font_size))
            .collect();
        let break_opps = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        let end = if is_newline(chars[i - 1]) { i - 1 } else { i };
                        lines.push(self.make_line(&chars[line_start..end], &char_widths[line_start..end]));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => {
                        last_break_point = Some(i - 1);
                    }
                    None => {}
                }
            }

            if is_newline(ch) {
                continue;
            }

            let char_width = char_widths[i];
            // Trailing spaces may hang past the edge; they are trimmed anyway
            if ch.is_whitespace() {
                line_width += char_width;
                continue;
            }
            if line_width + char_width > max_width && line_start < i {
                if let Some(bp) = last_break_point.filter(|&bp| bp >= line_start) {
                    // bp is the last char on this line (the break is *after* it)
                    lines.push(self.make_line(&chars[line_start..=bp], &char_widths[line_start..=bp]));
                    line_start = bp + 1;
                    line_width = char_widths[line_start..=i].iter().sum();
                    last_break_point = None;
                    continue;
                }

                // No break point on this line: split the word here
                lines.push(self.make_line(&chars[line_start..i], &char_widths[line_start..i]));
                line_start = i;
                line_width = char_width;
                last_break_point = None;
                continue;
            }

            line_width += char_width;
        }

        if line_start < chars.len() {
            let tail: Vec<char> = chars[line_start..]
                .iter()
                .copied()
                .filter(|c| !is_newline(*c))
                .collect();
            let tail_widths: Vec<f64> = chars[line_start..]
                .iter()
                .zip(&char_widths[line_start..])
                .filter(|(c, _)| !is_newline(**c))
                .map(|(_, w)| *w)
                .collect();
            lines.push(self.make_line(&tail, &tail_widths));
        }

        lines
    }

    /// Create a BrokenLine, dropping trailing whitespace from text and width.
    fn make_line(&self, chars: &[char], widths: &[f64]) -> BrokenLine {
        let mut end = chars.len();
        while end > 0 && chars[end - 1].is_whitespace() {
            end -= 1;
        }
        BrokenLine {
            text: chars[..end].iter().collect(),
            width: widths[..end].iter().sum(),
        }
    }

    /// Measure the width of a single-line string in points.
    pub fn measure_width(
        &self,
        font_context: &FontContext,
        text: &str,
        font_size: f64,
        font: StandardFont,
    ) -> f64 {
        font_context.measure_string(text, font, font_size)
    }
}
