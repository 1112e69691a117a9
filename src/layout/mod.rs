//! # Page-Aware Layout Engine
//!
//! Turns a [`QuotationRequest`] into a list of fixed-size pages of absolutely
//! positioned draw commands.
//!
//! The engine never builds a tall canvas and slices it afterwards. It keeps
//! a cursor on the current page and, before every discrete block, asks
//! whether the block still fits above the content-bottom limit. If it does
//! not, a new page is opened (frame redrawn, cursor reset) and the block is
//! placed there. Every block is measured with the same line wrapper that
//! draws it, so the check and the result always agree.
//!
//! The document is produced in phases:
//!
//! ```text
//! FirstPageHeader -> Items -> TermsAndSignature -> Numbering -> Done
//! ```
//!
//! All coordinates are millimetres from the top-left corner of the page.
//! Text elements are anchored on their baseline. Font sizes stay in points.

pub mod bill_to;
pub mod frame;
pub mod item;
pub mod numbering;
pub mod page_break;
pub mod table;
pub mod terms;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::assets::{ImageSet, ResolvedImage};
use crate::config::{ComposerConfig, PageGeometry};
use crate::font::FontContext;
use crate::model::QuotationRequest;
use crate::style::{Color, Stroke, TextAlign, TextStyle};
use crate::text::TextLayout;

use self::page_break::{decide_break, BreakDecision};

/// Points per millimetre.
pub const MM_TO_PT: f64 = 72.0 / 25.4;

/// Millimetres per point.
pub const PT_TO_MM: f64 = 25.4 / 72.0;

/// A fully laid-out page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    /// Every text run on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|el| match &el.draw {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    pub fn image_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|el| matches!(el.draw, DrawCommand::Image { .. }))
            .count()
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone)]
pub struct LayoutElement {
    /// Left edge. For text this is after alignment has been applied.
    pub x: f64,
    /// Top edge, or the baseline for text.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
}

/// What to actually draw for this element.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// A rectangle covering the element box.
    Rect {
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    /// A straight line from `(x, y)` to `(x + width, y + height)`.
    Line { stroke: Stroke },
    /// A single line of text starting at `(x, y)` on the baseline.
    Text { text: String, style: TextStyle },
    /// An image stretched over the element box.
    Image { image: Arc<ResolvedImage> },
}

/// Measures and wraps text in millimetres.
#[derive(Debug, Default, Clone, Copy)]
pub struct Typesetter {
    font_context: FontContext,
    text_layout: TextLayout,
}

impl Typesetter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `text` into lines no wider than `max_width` mm.
    pub fn wrap(&self, text: &str, style: &TextStyle, max_width: f64) -> Vec<String> {
        self.text_layout
            .break_into_lines(
                &self.font_context,
                text,
                max_width * MM_TO_PT,
                style.size,
                style.font,
            )
            .into_iter()
            .map(|line| line.text)
            .collect()
    }

    /// Width of a single line in mm.
    pub fn width(&self, text: &str, style: &TextStyle) -> f64 {
        self.text_layout
            .measure_width(&self.font_context, text, style.size, style.font)
            * PT_TO_MM
    }

    /// A text element whose anchor is `x` under the given alignment.
    pub fn text(
        &self,
        x: f64,
        baseline: f64,
        text: &str,
        style: TextStyle,
        align: TextAlign,
    ) -> LayoutElement {
        let width = self.width(text, &style);
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        LayoutElement {
            x: left,
            y: baseline,
            width,
            height: style.size * PT_TO_MM,
            draw: DrawCommand::Text {
                text: text.to_string(),
                style,
            },
        }
    }
}

/// A horizontal or vertical rule.
pub(crate) fn line(x1: f64, y1: f64, x2: f64, y2: f64, stroke: Stroke) -> LayoutElement {
    LayoutElement {
        x: x1,
        y: y1,
        width: x2 - x1,
        height: y2 - y1,
        draw: DrawCommand::Line { stroke },
    }
}

pub(crate) fn rect(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    fill: Option<Color>,
    stroke: Option<Stroke>,
) -> LayoutElement {
    LayoutElement {
        x,
        y,
        width,
        height,
        draw: DrawCommand::Rect { fill, stroke },
    }
}

pub(crate) fn image(x: f64, y: f64, width: f64, height: f64, image: &Arc<ResolvedImage>) -> LayoutElement {
    LayoutElement {
        x,
        y,
        width,
        height,
        draw: DrawCommand::Image {
            image: Arc::clone(image),
        },
    }
}

/// Tracks where we are on the current page during layout.
#[derive(Debug)]
struct PageCursor {
    y: f64,
    /// Where content started on this page.
    page_top: f64,
    elements: Vec<LayoutElement>,
}

/// The page-by-page writer shared by every layout phase.
pub struct Flow<'a> {
    pub(crate) config: &'a ComposerConfig,
    pub(crate) images: &'a ImageSet,
    pub(crate) typesetter: Typesetter,
    pages: Vec<LayoutPage>,
    cursor: PageCursor,
}

impl<'a> Flow<'a> {
    /// Open the first page, frame included, with the cursor at the top offset.
    pub fn new(config: &'a ComposerConfig, images: &'a ImageSet) -> Self {
        let mut flow = Self {
            config,
            images,
            typesetter: Typesetter::new(),
            pages: Vec::new(),
            cursor: PageCursor {
                y: config.page.top_offset,
                page_top: config.page.top_offset,
                elements: Vec::new(),
            },
        };
        flow.draw_frame();
        flow
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.config.page
    }

    /// Current vertical position.
    pub fn y(&self) -> f64 {
        self.cursor.y
    }

    pub fn set_y(&mut self, y: f64) {
        self.cursor.y = y;
    }

    pub fn advance(&mut self, dy: f64) {
        self.cursor.y += dy;
    }

    /// Zero-based index of the page being written.
    pub fn page_index(&self) -> usize {
        self.pages.len()
    }

    /// Space left above the content-bottom limit.
    pub fn remaining_height(&self) -> f64 {
        (self.config.page.content_bottom() - self.cursor.y).max(0.0)
    }

    /// Room a fresh page offers below the regular top offset.
    fn page_capacity(&self) -> f64 {
        self.config.page.content_bottom() - self.config.page.top_offset
    }

    /// True while nothing has advanced the cursor on this page.
    pub fn at_page_top(&self) -> bool {
        self.cursor.y <= self.cursor.page_top + 1e-6
    }

    pub fn push(&mut self, element: LayoutElement) {
        self.cursor.elements.push(element);
    }

    fn draw_frame(&mut self) {
        let elements = frame::draw_page_frame(
            &self.typesetter,
            &self.config.page,
            &self.config.letterhead,
            self.images.logo(),
        );
        self.cursor.elements.extend(elements);
    }

    /// Close the current page and open a new one with the cursor at `top`.
    pub fn start_page_at(&mut self, top: f64) {
        let finished = std::mem::take(&mut self.cursor.elements);
        self.pages.push(LayoutPage {
            width: self.config.page.width,
            height: self.config.page.height,
            elements: finished,
        });
        self.cursor.y = top;
        self.cursor.page_top = top;
        self.draw_frame();
        log::debug!("page {} started at y={:.1}", self.pages.len() + 1, top);
    }

    /// Close the current page and open a new one at the regular top offset.
    pub fn start_page(&mut self) {
        self.start_page_at(self.config.page.top_offset);
    }

    /// Make sure `height` mm fit below the cursor, breaking the page if not.
    ///
    /// A block that does not fit on a page that is still empty is placed
    /// anyway; another page would not give it more room. Returns whether a
    /// new page was started.
    pub fn ensure_space(&mut self, height: f64) -> bool {
        if self.cursor.y + height <= self.config.page.content_bottom() || self.at_page_top() {
            return false;
        }
        log::debug!(
            "{:.1}mm block does not fit at y={:.1}, breaking page {}",
            height,
            self.cursor.y,
            self.pages.len() + 1
        );
        self.start_page();
        true
    }

    /// Draw a text run at an explicit position without moving the cursor.
    pub fn text(&mut self, x: f64, y: f64, text: &str, style: TextStyle, align: TextAlign) {
        let element = self.typesetter.text(x, y, text, style, align);
        self.push(element);
    }

    pub fn wrap(&self, text: &str, style: &TextStyle, max_width: f64) -> Vec<String> {
        self.typesetter.wrap(text, style, max_width)
    }

    /// Draw wrapped lines starting at the cursor, `pitch` mm apart, and
    /// advance past them.
    ///
    /// Lines that would cross the content-bottom limit continue on the next
    /// page. This only happens for paragraphs taller than a page, since
    /// callers reserve space for the whole block first.
    pub fn place_lines(&mut self, lines: &[String], x: f64, style: TextStyle, pitch: f64) {
        let mut rest = lines;
        while !rest.is_empty() {
            let heights = vec![pitch; rest.len()];
            let decision = decide_break(
                self.remaining_height(),
                self.page_capacity(),
                &heights,
            );
            let count = match decision {
                BreakDecision::Place => rest.len(),
                BreakDecision::Split {
                    items_on_current_page,
                } => items_on_current_page,
                BreakDecision::MoveToNextPage if self.at_page_top() => 1,
                BreakDecision::MoveToNextPage => {
                    self.start_page();
                    continue;
                }
            };

            for line in &rest[..count] {
                let y = self.cursor.y;
                self.text(x, y, line, style, TextAlign::Left);
                self.cursor.y += pitch;
            }
            rest = &rest[count..];
            if !rest.is_empty() {
                self.start_page();
            }
        }
    }

    /// Close the last page and hand back every page written.
    pub fn finish(mut self) -> Vec<LayoutPage> {
        let last = std::mem::take(&mut self.cursor.elements);
        self.pages.push(LayoutPage {
            width: self.config.page.width,
            height: self.config.page.height,
            elements: last,
        });
        self.pages
    }
}

/// Where the engine is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    FirstPageHeader,
    Items(usize),
    TermsAndSignature,
    Numbering,
    Done,
}

/// The main layout engine.
pub struct LayoutEngine<'a> {
    config: &'a ComposerConfig,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a ComposerConfig) -> Self {
        Self { config }
    }

    /// Lay out a whole quotation. `today` stands in for a missing creation date.
    pub fn layout(
        &self,
        request: &QuotationRequest,
        images: &ImageSet,
        today: NaiveDate,
    ) -> Vec<LayoutPage> {
        let mut flow = Some(Flow::new(self.config, images));
        let mut pages = Vec::new();
        let mut phase = Phase::FirstPageHeader;

        while phase != Phase::Done {
            phase = match (phase, flow.as_mut()) {
                (Phase::FirstPageHeader, Some(flow)) => {
                    bill_to::layout_bill_to(flow, request, today);
                    Phase::Items(0)
                }
                (Phase::Items(index), Some(flow)) => match request.items.get(index) {
                    Some(line_item) => {
                        if index > 0 {
                            flow.start_page();
                        }
                        item::layout_item(flow, line_item, request.currency);
                        Phase::Items(index + 1)
                    }
                    None => Phase::TermsAndSignature,
                },
                (Phase::TermsAndSignature, Some(flow)) => {
                    terms::layout_terms(flow, &request.effective_terms());
                    terms::layout_signature(flow, request);
                    Phase::Numbering
                }
                (Phase::Numbering, _) => {
                    if let Some(flow) = flow.take() {
                        pages = flow.finish();
                    }
                    numbering::stamp_page_numbers(&mut pages, &Typesetter::new(), &self.config.page);
                    Phase::Done
                }
                _ => Phase::Done,
            };
        }

        log::debug!(
            "laid out {} item(s) on {} page(s)",
            request.items.len(),
            pages.len()
        );
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ComposerConfig {
        let mut config = ComposerConfig::default();
        config.assets.logo = None;
        config
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {}", i)).collect()
    }

    #[test]
    fn test_new_flow_starts_at_top_offset_with_frame() {
        let config = config();
        let images = ImageSet::new();
        let flow = Flow::new(&config, &images);
        assert_eq!(flow.y(), 50.0);
        assert!(flow.at_page_top());
        let pages = flow.finish();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains_text("RAISE LAB EQUIPMENT"));
    }

    #[test]
    fn test_ensure_space_breaks_when_block_overflows() {
        let config = config();
        let images = ImageSet::new();
        let mut flow = Flow::new(&config, &images);
        flow.set_y(260.0);
        assert!(!flow.ensure_space(12.0));
        assert!(flow.ensure_space(12.1));
        assert_eq!(flow.page_index(), 1);
        assert_eq!(flow.y(), 50.0);
    }

    #[test]
    fn test_ensure_space_never_breaks_an_empty_page() {
        let config = config();
        let images = ImageSet::new();
        let mut flow = Flow::new(&config, &images);
        assert!(!flow.ensure_space(500.0));
        assert_eq!(flow.page_index(), 0);
    }

    #[test]
    fn test_place_lines_advances_by_pitch() {
        let config = config();
        let images = ImageSet::new();
        let mut flow = Flow::new(&config, &images);
        flow.advance(10.0);
        flow.place_lines(&lines(4), 15.0, TextStyle::regular(9.0), 5.0);
        assert!((flow.y() - 80.0).abs() < 1e-9);
        assert_eq!(flow.page_index(), 0);
    }

    #[test]
    fn test_place_lines_splits_paragraph_taller_than_a_page() {
        let config = config();
        let images = ImageSet::new();
        let mut flow = Flow::new(&config, &images);
        flow.advance(100.0);
        // 60 lines x 5mm = 300mm, more than one page can hold
        flow.place_lines(&lines(60), 15.0, TextStyle::regular(9.0), 5.0);
        let pages = flow.finish();
        assert!(pages.len() >= 2);
        let bottom = config.page.content_bottom();
        for page in &pages {
            for el in &page.elements {
                if let DrawCommand::Text { text, .. } = &el.draw {
                    if text.starts_with("line ") {
                        assert!(el.y + 5.0 <= bottom + 1e-6, "{} overflows at {}", text, el.y);
                    }
                }
            }
        }
        let placed: usize = pages
            .iter()
            .map(|p| p.texts().filter(|t| t.starts_with("line ")).count())
            .sum();
        assert_eq!(placed, 60);
    }

    #[test]
    fn test_text_alignment() {
        let ts = Typesetter::new();
        let style = TextStyle::regular(10.0);
        let width = ts.width("Total", &style);
        let right = ts.text(195.0, 20.0, "Total", style, TextAlign::Right);
        assert!((right.x + width - 195.0).abs() < 1e-9);
        let center = ts.text(105.0, 20.0, "Total", style, TextAlign::Center);
        assert!((center.x + width / 2.0 - 105.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_respects_width_in_mm() {
        let ts = Typesetter::new();
        let style = TextStyle::regular(9.0);
        let text = "Accurate method for determining the strength of antibiotic material";
        for line in ts.wrap(text, &style, 40.0) {
            assert!(ts.width(&line, &style) <= 40.0 + 1e-9);
        }
    }
}
