//! # Page Frame
//!
//! The letterhead drawn at the start of every page: two nested borders, the
//! logo and company address in the header band, a double rule under the
//! header and the boxed contact line at the bottom. The frame is stateless
//! and knows nothing about page numbers; those are stamped once the page
//! count is final.

use std::sync::Arc;

use crate::assets::ResolvedImage;
use crate::config::{Letterhead, PageGeometry};
use crate::style::{Color, Stroke, TextAlign, TextStyle};

use super::{image, line, rect, LayoutElement, Typesetter, PT_TO_MM};

const OUTER_BORDER: Stroke = Stroke::new(Color::BRAND_BLUE, 1.2);
const INNER_BORDER: Stroke = Stroke::new(Color::BRAND_ORANGE, 0.8);
const FOOTER_BOX: Stroke = Stroke::new(Color::BLACK, 0.3);
const HEADER_RULE: Stroke = Stroke::new(Color::BRAND_BLUE, 0.5);
const HEADER_RULE_ACCENT: Stroke = Stroke::new(Color::BRAND_ORANGE, 0.3);

const LOGO_X: f64 = 15.0;
const LOGO_Y: f64 = 12.0;
const LOGO_WIDTH: f64 = 70.0;
const LOGO_HEIGHT: f64 = 25.0;

const COMPANY_NAME_Y: f64 = 18.0;
const ADDRESS_Y: f64 = 24.0;
const ADDRESS_LINE_FACTOR: f64 = 1.4;
const RULE_Y: f64 = 42.0;
const RULE_ACCENT_Y: f64 = 43.0;

/// Build the frame elements for one page.
pub fn draw_page_frame(
    ts: &Typesetter,
    page: &PageGeometry,
    letterhead: &Letterhead,
    logo: Option<&Arc<ResolvedImage>>,
) -> Vec<LayoutElement> {
    let mut elements = Vec::new();
    let (w, h) = (page.width, page.height);
    let margin = page.margin;

    elements.push(rect(5.0, 5.0, w - 10.0, h - 10.0, None, Some(OUTER_BORDER)));
    elements.push(rect(7.0, 7.0, w - 14.0, h - 14.0, None, Some(INNER_BORDER)));

    // Contact box in the footer band
    let box_x = margin + 10.0;
    let box_y = h - page.footer_band;
    elements.push(rect(box_x, box_y, w - margin * 2.0 - 20.0, 8.0, None, Some(FOOTER_BOX)));
    elements.push(ts.text(
        w / 2.0,
        box_y + 5.5,
        &letterhead.contact_line,
        TextStyle::bold(8.0),
        TextAlign::Center,
    ));

    if let Some(logo) = logo {
        elements.push(image(LOGO_X, LOGO_Y, LOGO_WIDTH, LOGO_HEIGHT, logo));
    }

    let right = page.right_edge();
    elements.push(ts.text(
        right,
        COMPANY_NAME_Y,
        &letterhead.header_name,
        TextStyle::bold(11.0).with_color(Color::BRAND_BLUE),
        TextAlign::Right,
    ));

    let address_style = TextStyle::regular(9.0).with_color(Color::GREY);
    let address_pitch = address_style.size * ADDRESS_LINE_FACTOR * PT_TO_MM;
    for (i, address_line) in letterhead.address_lines.iter().enumerate() {
        elements.push(ts.text(
            right,
            ADDRESS_Y + i as f64 * address_pitch,
            address_line,
            address_style,
            TextAlign::Right,
        ));
    }

    elements.push(line(margin, RULE_Y, right, RULE_Y, HEADER_RULE));
    elements.push(line(margin, RULE_ACCENT_Y, right, RULE_ACCENT_Y, HEADER_RULE_ACCENT));

    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DrawCommand;

    fn texts(elements: &[LayoutElement]) -> Vec<&str> {
        elements
            .iter()
            .filter_map(|e| match &e.draw {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_frame_without_logo() {
        let elements = draw_page_frame(
            &Typesetter::new(),
            &PageGeometry::default(),
            &Letterhead::default(),
            None,
        );
        assert!(!elements.iter().any(|e| matches!(e.draw, DrawCommand::Image { .. })));
        let texts = texts(&elements);
        assert!(texts.contains(&"RAISE LAB EQUIPMENT"));
        assert!(texts.contains(&"Telangana 500040"));
        assert!(texts.iter().any(|t| t.starts_with("Write us:")));
    }

    #[test]
    fn test_borders_are_nested() {
        let elements = draw_page_frame(
            &Typesetter::new(),
            &PageGeometry::default(),
            &Letterhead::default(),
            None,
        );
        let outer = &elements[0];
        let inner = &elements[1];
        assert_eq!((outer.x, outer.y, outer.width, outer.height), (5.0, 5.0, 200.0, 287.0));
        assert_eq!((inner.x, inner.y, inner.width, inner.height), (7.0, 7.0, 196.0, 283.0));
    }

    #[test]
    fn test_company_name_is_right_aligned() {
        let ts = Typesetter::new();
        let elements = draw_page_frame(&ts, &PageGeometry::default(), &Letterhead::default(), None);
        let name = elements
            .iter()
            .find(|e| matches!(&e.draw, DrawCommand::Text { text, .. } if text == "RAISE LAB EQUIPMENT"))
            .unwrap();
        assert!((name.x + name.width - 195.0).abs() < 1e-9);
    }

    #[test]
    fn test_logo_is_drawn_when_present() {
        let logo = Arc::new(ResolvedImage {
            source: "logo".into(),
            jpeg: vec![0xFF, 0xD8],
            width_px: 280,
            height_px: 100,
        });
        let elements = draw_page_frame(
            &Typesetter::new(),
            &PageGeometry::default(),
            &Letterhead::default(),
            Some(&logo),
        );
        let img = elements
            .iter()
            .find(|e| matches!(e.draw, DrawCommand::Image { .. }))
            .unwrap();
        assert_eq!((img.x, img.y, img.width, img.height), (15.0, 12.0, 70.0, 25.0));
    }
}
