//! # Style
//!
//! The handful of visual properties the quotation layout needs: colors,
//! stroke settings, text styles and alignment. Everything is fixed by the
//! house style, so there is no cascade; each block picks a [`TextStyle`]
//! constant and goes.

use crate::font::StandardFont;

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };
    /// Letterhead blue, rgb(0, 82, 156).
    pub const BRAND_BLUE: Color = Color {
        r: 0.0,
        g: 82.0 / 255.0,
        b: 156.0 / 255.0,
    };
    /// Letterhead orange, rgb(255, 102, 0).
    pub const BRAND_ORANGE: Color = Color {
        r: 1.0,
        g: 102.0 / 255.0,
        b: 0.0,
    };
    /// Address grey, rgb(60, 60, 60).
    pub const GREY: Color = Color {
        r: 60.0 / 255.0,
        g: 60.0 / 255.0,
        b: 60.0 / 255.0,
    };
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Line color and width (millimetres) for borders and rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub const fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// Horizontal anchoring of a text run relative to its `x` coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Font, size (points) and color for a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    pub size: f64,
    pub color: Color,
}

impl TextStyle {
    pub const fn regular(size: f64) -> Self {
        Self {
            font: StandardFont::Helvetica,
            size,
            color: Color::BLACK,
        }
    }

    pub const fn bold(size: f64) -> Self {
        Self {
            font: StandardFont::HelveticaBold,
            size,
            color: Color::BLACK,
        }
    }

    pub const fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }
}
