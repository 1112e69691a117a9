//! The bill-to box at the top of page 1.

use chrono::NaiveDate;

use crate::format::{creation_date, format_date, validity_date};
use crate::model::QuotationRequest;
use crate::style::{Color, Stroke, TextStyle};

use super::table::{Cell, ColumnWidth, Row, Table, VerticalAlign};
use super::Flow;

const QUOTE_COLUMN_WIDTH: f64 = 80.0;
const MIN_HEIGHT: f64 = 30.0;
const SPACE_AFTER: f64 = 12.0;

/// Customer on the left, quote number, date and validity on the right.
pub fn bill_to_table(request: &QuotationRequest, today: NaiveDate, default_validity_days: i64) -> Table {
    let quotation = &request.quotation;
    let style = TextStyle::bold(10.0);

    let mut to = format!("To\n{}", quotation.customer_name);
    if let Some(address) = quotation.customer_address.as_deref().filter(|a| !a.is_empty()) {
        to.push('\n');
        to.push_str(address);
    }

    let created = creation_date(quotation, today);
    let valid_until = validity_date(quotation, request.validity.as_ref(), today, default_validity_days);
    let meta = format!(
        "Quote No :  {}\nDate         :  {}\nValidity    :  {}",
        quotation.quotation_number,
        format_date(created),
        format_date(valid_until)
    );

    Table {
        columns: vec![ColumnWidth::Auto, ColumnWidth::Fixed(QUOTE_COLUMN_WIDTH)],
        rows: vec![Row::new(vec![
            Cell::new(to, style).padding(5.0),
            Cell::new(meta, style)
                .padding(6.0)
                .valign(VerticalAlign::Middle),
        ])
        .min_height(MIN_HEIGHT)],
        border: Stroke::new(Color::BLACK, 0.3),
    }
}

pub fn layout_bill_to(flow: &mut Flow<'_>, request: &QuotationRequest, today: NaiveDate) {
    let table = bill_to_table(request, today, flow.config.default_validity_days);
    let x = flow.geometry().margin;
    let width = flow.geometry().content_width();
    let (elements, height) = table.draw(&flow.typesetter, x, flow.y(), width);
    for element in elements {
        flow.push(element);
    }
    flow.advance(height + SPACE_AFTER);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageSet;
    use crate::config::ComposerConfig;
    use crate::model::Quotation;

    fn request() -> QuotationRequest {
        serde_json::from_value(serde_json::json!({
            "quotation": {
                "quotation_number": "RLE/2024/001",
                "customer_name": "Acme Labs",
                "customer_address": "Plot 4, Genome Valley",
                "created_at": "2024-01-01"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_bill_to_contents() {
        let table = bill_to_table(&request(), NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), 30);
        let cells = &table.rows[0].cells;
        assert_eq!(cells[0].text, "To\nAcme Labs\nPlot 4, Genome Valley");
        assert!(cells[1].text.contains("RLE/2024/001"));
        assert!(cells[1].text.contains("01-01-2024"));
        assert!(cells[1].text.contains("31-01-2024"));
    }

    #[test]
    fn test_bill_to_without_address() {
        let mut req = request();
        req.quotation = Quotation {
            customer_address: None,
            ..req.quotation
        };
        let table = bill_to_table(&req, NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(), 30);
        assert_eq!(table.rows[0].cells[0].text, "To\nAcme Labs");
    }

    #[test]
    fn test_cursor_continues_below_box() {
        let mut config = ComposerConfig::default();
        config.assets.logo = None;
        let images = ImageSet::new();
        let mut flow = Flow::new(&config, &images);
        layout_bill_to(&mut flow, &request(), NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        // Three short lines stay inside the 30mm minimum
        assert!((flow.y() - (50.0 + 30.0 + 12.0)).abs() < 1e-9);
    }
}
