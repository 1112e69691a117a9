//! Terms and conditions page and the signature block.

use crate::model::{QuotationRequest, Term};
use crate::style::{TextAlign, TextStyle};

use super::Flow;

const TERM_PITCH: f64 = 5.0;
const TERM_GAP: f64 = 3.0;
const TEXT_INDENT: f64 = 5.0;
const SIGNATURE_RESERVE: f64 = 40.0;

/// Drop a leading `"3. "` style number from a term title.
pub fn strip_numbering(title: &str) -> &str {
    let digits = title.len() - title.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return title;
    }
    match title[digits..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => title,
    }
}

/// Start a fresh page and list every term as a wrapped bullet.
pub fn layout_terms(flow: &mut Flow<'_>, terms: &[Term]) {
    let top = flow.geometry().terms_top_offset;
    flow.start_page_at(top);

    let margin = flow.geometry().margin;
    let body = TextStyle::regular(9.0);
    let wrap_width = flow.geometry().content_width() - TEXT_INDENT;

    let y = flow.y();
    flow.text(margin, y, "Terms And Conditions:", TextStyle::bold(12.0), TextAlign::Left);
    flow.advance(10.0);

    for term in terms {
        let full = format!("{}: {}", strip_numbering(&term.title), term.text);
        let lines = flow.wrap(&full, &body, wrap_width);
        flow.ensure_space(lines.len() as f64 * TERM_PITCH + TERM_GAP);

        let y = flow.y();
        flow.text(margin, y, "\u{2022}", body, TextAlign::Left);
        flow.place_lines(&lines, margin + TEXT_INDENT, body, TERM_PITCH);
        flow.advance(TERM_GAP);
    }
}

/// Right-aligned sign-off under the terms.
pub fn layout_signature(flow: &mut Flow<'_>, request: &QuotationRequest) {
    let letterhead = &flow.config.letterhead;
    let company = request
        .settings
        .company_name
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(letterhead.signature_company.as_str())
        .to_string();
    let signatory = request
        .user
        .full_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| letterhead.fallback_signatory.clone());
    let phone = request
        .user
        .phone
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(letterhead.fallback_phone.as_str())
        .to_string();

    flow.ensure_space(SIGNATURE_RESERVE);
    flow.advance(15.0);
    let right = flow.geometry().right_edge();
    let bold = TextStyle::bold(10.0);

    let y = flow.y();
    flow.text(right, y, &format!("From {}", company), bold, TextAlign::Right);
    flow.advance(6.0);

    let y = flow.y();
    flow.text(right, y, &signatory, bold, TextAlign::Right);
    flow.advance(6.0);

    let y = flow.y();
    flow.text(
        right,
        y,
        &format!("Contact: {}", phone),
        TextStyle::regular(9.0),
        TextAlign::Right,
    );
}
