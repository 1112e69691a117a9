//! # Line Item Layout
//!
//! One catalog item renders as: title block, description, image with
//! features (wide or tall arrangement), specifications and the commercial
//! offer table. Each block reserves its space with
//! [`Flow::ensure_space`] before drawing.

use crate::format::format_price;
use crate::model::{Currency, ImageFormat, LineItem, Spec};
use crate::style::{Color, Stroke, TextAlign, TextStyle};

use super::table::{Cell, ColumnWidth, Row, Table, VerticalAlign};
use super::{image, Flow};

const HEADING: TextStyle = TextStyle::bold(10.0);
const BODY: TextStyle = TextStyle::regular(9.0);

const BULLET: &str = "\u{2022}";
const BULLET_INDENT: f64 = 3.0;
const TEXT_INDENT: f64 = 8.0;
const SPEC_VALUE_INDENT: f64 = 55.0;

const DESCRIPTION_PITCH: f64 = 5.0;
const FEATURE_PITCH: f64 = 4.5;
const SPEC_PITCH: f64 = 5.0;

const HEADING_RESERVE: f64 = 20.0;
const HEADING_GAP: f64 = 6.0;
const SECTION_GAP: f64 = 5.0;

const MAX_IMAGE_HEIGHT: f64 = 80.0;
const IMAGE_GAP: f64 = 10.0;
const TALL_FEATURE_SHARE: f64 = 0.5;
const TALL_IMAGE_SHARE: f64 = 0.4;

const COMMERCIAL_RESERVE: f64 = 40.0;
const TABLE_GAP: f64 = 10.0;

/// Lay out one item starting at the cursor.
pub fn layout_item(flow: &mut Flow<'_>, item: &LineItem, currency: Currency) {
    layout_title(flow, item);
    layout_description(flow, item);
    match item.image_format {
        ImageFormat::Wide => layout_wide(flow, item),
        ImageFormat::Tall => layout_tall(flow, item),
    }
    if let Some(specs) = &item.specs {
        layout_specs(flow, specs);
    }
    layout_commercial_offer(flow, item, currency);
}

fn layout_title(flow: &mut Flow<'_>, item: &LineItem) {
    flow.ensure_space(HEADING_RESERVE);
    let center = flow.geometry().width / 2.0;

    let y = flow.y();
    flow.text(
        center,
        y,
        "Technical & Commercial Offer",
        TextStyle::bold(14.0).with_color(Color::BRAND_BLUE),
        TextAlign::Center,
    );
    flow.advance(7.0);

    let y = flow.y();
    flow.text(
        center,
        y,
        &format!("For {}", item.name),
        TextStyle::bold(12.0),
        TextAlign::Center,
    );
    flow.advance(12.0);
}

fn layout_description(flow: &mut Flow<'_>, item: &LineItem) {
    let margin = flow.geometry().margin;
    heading(flow, "Description:");

    let lines = flow.wrap(&item.description, &BODY, flow.geometry().content_width());
    flow.ensure_space(lines.len() as f64 * DESCRIPTION_PITCH);
    flow.place_lines(&lines, margin, BODY, DESCRIPTION_PITCH);
    flow.advance(SECTION_GAP);
}

/// Section heading with its 20mm reservation and the gap below it.
fn heading(flow: &mut Flow<'_>, title: &str) {
    flow.ensure_space(HEADING_RESERVE);
    let margin = flow.geometry().margin;
    let y = flow.y();
    flow.text(margin, y, title, HEADING, TextAlign::Left);
    flow.advance(HEADING_GAP);
}

/// Draw one bullet with its wrapped lines at the cursor and advance past it.
fn bullet_item(flow: &mut Flow<'_>, lines: &[String], bullet_x: f64, text_x: f64, pitch: f64) {
    let y = flow.y();
    flow.text(bullet_x, y, BULLET, BODY, TextAlign::Left);
    flow.place_lines(lines, text_x, BODY, pitch);
}

/// Image centered on the page, full-width feature list below.
fn layout_wide(flow: &mut Flow<'_>, item: &LineItem) {
    let page_width = flow.geometry().width;
    let margin = flow.geometry().margin;
    let content_width = flow.geometry().content_width();

    if let Some(img) = flow.images.item(&item.id).cloned() {
        let (w, h) = img.fit_within(content_width - 10.0, MAX_IMAGE_HEIGHT);
        flow.ensure_space(h + IMAGE_GAP);
        let x = (page_width - w) / 2.0;
        let y = flow.y();
        flow.push(image(x, y, w, h, &img));
        flow.advance(h + IMAGE_GAP);
    }

    heading(flow, "FEATURES:");
    for feature in item.effective_features() {
        let lines = flow.wrap(&feature, &BODY, content_width - 10.0);
        flow.ensure_space(lines.len() as f64 * FEATURE_PITCH + 2.0);
        bullet_item(
            flow,
            &lines,
            margin + BULLET_INDENT,
            margin + TEXT_INDENT,
            FEATURE_PITCH,
        );
    }
    flow.advance(SECTION_GAP);
}

/// Features in a left column, image in a right column, reserved as one block.
fn layout_tall(flow: &mut Flow<'_>, item: &LineItem) {
    let margin = flow.geometry().margin;
    let right = flow.geometry().right_edge();
    let content_width = flow.geometry().content_width();
    let feature_width = content_width * TALL_FEATURE_SHARE;

    let wrapped: Vec<Vec<String>> = item
        .effective_features()
        .iter()
        .map(|f| flow.wrap(f, &BODY, feature_width))
        .collect();
    let features_height = HEADING_GAP
        + wrapped
            .iter()
            .map(|lines| lines.len() as f64 * FEATURE_PITCH)
            .sum::<f64>();

    let picture = flow.images.item(&item.id).cloned().map(|img| {
        let (w, h) = img.fit_within(content_width * TALL_IMAGE_SHARE, MAX_IMAGE_HEIGHT);
        (img, w, h)
    });
    let image_height = picture.as_ref().map_or(0.0, |(_, _, h)| *h);

    flow.ensure_space(features_height.max(image_height) + IMAGE_GAP);

    let y = flow.y();
    flow.text(margin, y, "FEATURES:", HEADING, TextAlign::Left);
    flow.advance(HEADING_GAP);

    let start_page = flow.page_index();
    let features_top = flow.y();

    if let Some((img, w, h)) = &picture {
        flow.push(image(right - w, features_top, *w, *h, img));
    }

    for lines in &wrapped {
        // Only triggers when the column is taller than a whole page
        flow.ensure_space(lines.len() as f64 * FEATURE_PITCH);
        bullet_item(
            flow,
            lines,
            margin + BULLET_INDENT,
            margin + TEXT_INDENT,
            FEATURE_PITCH,
        );
    }

    let features_end = flow.y();
    let image_end = match &picture {
        Some((_, _, h)) if flow.page_index() == start_page => features_top + h + IMAGE_GAP,
        _ => features_top,
    };
    let column_end = if flow.page_index() == start_page {
        features_end.max(image_end)
    } else {
        features_end
    };
    flow.set_y(column_end + SECTION_GAP);
}

/// `: value`, unless the value already carries its own colon.
fn spec_value(value: &str) -> String {
    if value.starts_with(':') {
        value.to_string()
    } else {
        format!(": {}", value)
    }
}

fn layout_specs(flow: &mut Flow<'_>, specs: &[Spec]) {
    let margin = flow.geometry().margin;
    let value_width = flow.geometry().content_width() - SPEC_VALUE_INDENT;
    let key_style = TextStyle::bold(9.0);

    heading(flow, "Specifications:");
    for spec in specs {
        let lines = flow.wrap(&spec_value(&spec.value), &BODY, value_width);
        flow.ensure_space((lines.len() as f64 * SPEC_PITCH).max(6.0));

        let y = flow.y();
        flow.text(margin + BULLET_INDENT, y, BULLET, BODY, TextAlign::Left);
        flow.text(margin + TEXT_INDENT, y, &spec.key, key_style, TextAlign::Left);
        flow.place_lines(&lines, margin + SPEC_VALUE_INDENT, BODY, SPEC_PITCH);
    }
    flow.advance(SECTION_GAP);
}

/// Description cell text: item name, then the add-ons as bullets.
pub fn commercial_description(item: &LineItem) -> String {
    let mut text = item.name.clone();
    if !item.addons().is_empty() {
        text.push_str("\n\nStandard Accessories:");
        for addon in item.addons() {
            text.push_str(&format!("\n{} {}", BULLET, addon.name));
        }
    }
    text
}

pub fn commercial_table(item: &LineItem, currency: Currency) -> Table {
    let head_style = TextStyle::bold(10.0).with_color(Color::WHITE);
    let body_style = TextStyle::regular(10.0);
    let head = |text: &str| Cell::new(text, head_style).align(TextAlign::Center).valign(VerticalAlign::Middle);
    let body = |text: String, style: TextStyle, align: TextAlign| {
        Cell::new(text, style)
            .align(align)
            .valign(VerticalAlign::Middle)
            .padding(4.0)
    };

    Table {
        columns: vec![
            ColumnWidth::Fixed(15.0),
            ColumnWidth::Auto,
            ColumnWidth::Fixed(15.0),
            ColumnWidth::Fixed(50.0),
        ],
        rows: vec![
            Row::new(vec![
                head("S.No"),
                head("Description"),
                head("Qty"),
                head(&format!("Price ({})", currency.code())),
            ])
            .fill(Color::BRAND_BLUE),
            Row::new(vec![
                body("01".to_string(), body_style, TextAlign::Center),
                body(commercial_description(item), body_style, TextAlign::Left),
                body("1".to_string(), body_style, TextAlign::Center),
                body(
                    format_price(item.total_price(), currency),
                    TextStyle::bold(11.0),
                    TextAlign::Center,
                ),
            ]),
        ],
        border: Stroke::new(Color::BLACK, 0.2),
    }
}

fn layout_commercial_offer(flow: &mut Flow<'_>, item: &LineItem, currency: Currency) {
    let margin = flow.geometry().margin;
    let width = flow.geometry().content_width();
    let table = commercial_table(item, currency);
    let table_height = table.measure(&flow.typesetter, width);

    flow.ensure_space(COMMERCIAL_RESERVE.max(HEADING_GAP + table_height));

    let y = flow.y();
    flow.text(margin, y, "Commercial Offer:", TextStyle::bold(11.0), TextAlign::Left);
    flow.advance(HEADING_GAP);

    let (elements, height) = table.draw(&flow.typesetter, margin, flow.y(), width);
    for element in elements {
        flow.push(element);
    }
    flow.advance(height + TABLE_GAP);
}
