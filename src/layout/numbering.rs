//! Page numbers, stamped once every page exists.

use crate::config::PageGeometry;
use crate::style::{TextAlign, TextStyle};

use super::{LayoutPage, Typesetter};

/// Distance of the page-number baseline from the bottom edge.
const NUMBER_OFFSET: f64 = 8.0;

/// Add `Page i of N` to the bottom-right corner of every page.
pub fn stamp_page_numbers(pages: &mut [LayoutPage], ts: &Typesetter, geometry: &PageGeometry) {
    let total = pages.len();
    let style = TextStyle::regular(8.0);
    for (i, page) in pages.iter_mut().enumerate() {
        let label = format!("Page {} of {}", i + 1, total);
        page.elements.push(ts.text(
            geometry.right_edge(),
            page.height - NUMBER_OFFSET,
            &label,
            style,
            TextAlign::Right,
        ));
    }
}
