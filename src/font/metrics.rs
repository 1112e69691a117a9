//! Advance widths for the standard Helvetica faces.
//!
//! Values are the AFM widths (1/1000 em) for the printable ASCII range
//! 0x20..=0x7E. Anything outside that range that WinAnsi can still encode
//! falls back to a per-face default, except the bullet which the layout
//! uses constantly and therefore gets its real width.

/// Width table for one standard font face.
pub struct StandardFontMetrics {
    ascii: &'static [u16; 95],
    bullet: u16,
    default: u16,
}

impl StandardFontMetrics {
    /// Advance width of `ch` in points at `font_size`.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let units = match ch {
            ' '..='~' => self.ascii[ch as usize - 0x20],
            '\u{2022}' => self.bullet,
            '\u{00A0}' => self.ascii[0],
            _ => self.default,
        };
        units as f64 * font_size / 1000.0
    }

    /// Width of a whole string in points.
    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }
}

#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    333, 333, 584, 584, 584, 611, 975,
    // A-Z
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    333, 278, 333, 584, 556, 333,
    // a-z
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    // { | } ~
    389, 280, 389, 584,
];

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_ASCII,
    bullet: 350,
    default: 556,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_BOLD_ASCII,
    bullet: 350,
    default: 611,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_width() {
        assert!((HELVETICA.char_width(' ', 12.0) - 3.336).abs() < 1e-9);
    }

    #[test]
    fn test_table_lookups() {
        assert_eq!(HELVETICA.char_width('A', 1000.0), 667.0);
        assert_eq!(HELVETICA.char_width('~', 1000.0), 584.0);
        assert_eq!(HELVETICA_BOLD.char_width('m', 1000.0), 889.0);
        assert_eq!(HELVETICA.char_width('\u{2022}', 1000.0), 350.0);
    }

    #[test]
    fn test_measure_string_sums() {
        let w = HELVETICA.measure_string("ab", 10.0, 0.0);
        assert!((w - 11.12).abs() < 1e-9);
    }
}
