//! Bordered grid tables.
//!
//! Both tables on a quotation (the bill-to box and the commercial offer)
//! are small grids with one or two rows. A table is measured first, so the
//! caller can reserve its full height with one space check, then drawn at
//! the cursor.

use crate::style::{Color, Stroke, TextAlign, TextStyle};

use super::{rect, LayoutElement, Typesetter, PT_TO_MM};

/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.15;

/// Default inner padding of a cell, in mm.
pub const DEFAULT_CELL_PADDING: f64 = 1.76;

/// Column sizing. `Auto` columns share whatever the fixed ones leave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    Fixed(f64),
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerticalAlign {
    #[default]
    Top,
    Middle,
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub text: String,
    pub style: TextStyle,
    pub align: TextAlign,
    pub valign: VerticalAlign,
    pub padding: f64,
}

impl Cell {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            align: TextAlign::Left,
            valign: VerticalAlign::Top,
            padding: DEFAULT_CELL_PADDING,
        }
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    pub fn valign(mut self, valign: VerticalAlign) -> Self {
        self.valign = valign;
        self
    }

    pub fn padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    fn line_height(&self) -> f64 {
        self.style.size * PT_TO_MM * LINE_HEIGHT_FACTOR
    }

    fn lines(&self, ts: &Typesetter, width: f64) -> Vec<String> {
        ts.wrap(&self.text, &self.style, (width - self.padding * 2.0).max(1.0))
    }

    fn height(&self, ts: &Typesetter, width: f64) -> f64 {
        self.lines(ts, width).len() as f64 * self.line_height() + self.padding * 2.0
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub fill: Option<Color>,
    pub min_height: f64,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            fill: None,
            min_height: 0.0,
        }
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn min_height(mut self, height: f64) -> Self {
        self.min_height = height;
        self
    }

    fn height(&self, ts: &Typesetter, widths: &[f64]) -> f64 {
        self.cells
            .iter()
            .zip(widths)
            .map(|(cell, &w)| cell.height(ts, w))
            .fold(self.min_height, f64::max)
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<ColumnWidth>,
    pub rows: Vec<Row>,
    pub border: Stroke,
}

/// Resolve column widths against the table width.
pub fn resolve_column_widths(columns: &[ColumnWidth], total_width: f64) -> Vec<f64> {
    let fixed: f64 = columns
        .iter()
        .map(|c| match c {
            ColumnWidth::Fixed(w) => *w,
            ColumnWidth::Auto => 0.0,
        })
        .sum();
    let auto_count = columns.iter().filter(|c| **c == ColumnWidth::Auto).count();
    let auto_width = if auto_count > 0 {
        ((total_width - fixed) / auto_count as f64).max(0.0)
    } else {
        0.0
    };

    columns
        .iter()
        .map(|c| match c {
            ColumnWidth::Fixed(w) => *w,
            ColumnWidth::Auto => auto_width,
        })
        .collect()
}

impl Table {
    /// Total height of all rows when drawn `width` mm wide.
    pub fn measure(&self, ts: &Typesetter, width: f64) -> f64 {
        let widths = resolve_column_widths(&self.columns, width);
        self.rows.iter().map(|row| row.height(ts, &widths)).sum()
    }

    /// Draw the table with its top-left corner at `(x, y)`.
    ///
    /// Returns the elements and the table height.
    pub fn draw(&self, ts: &Typesetter, x: f64, y: f64, width: f64) -> (Vec<LayoutElement>, f64) {
        let widths = resolve_column_widths(&self.columns, width);
        let mut elements = Vec::new();
        let mut row_y = y;

        for row in &self.rows {
            let row_height = row.height(ts, &widths);
            let mut cell_x = x;

            for (cell, &cell_width) in row.cells.iter().zip(&widths) {
                elements.push(rect(
                    cell_x,
                    row_y,
                    cell_width,
                    row_height,
                    row.fill,
                    Some(self.border),
                ));
                self.draw_cell_text(ts, cell, cell_x, row_y, cell_width, row_height, &mut elements);
                cell_x += cell_width;
            }
            row_y += row_height;
        }

        (elements, row_y - y)
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_cell_text(
        &self,
        ts: &Typesetter,
        cell: &Cell,
        x: f64,
        y: f64,
        width: f64,
        row_height: f64,
        elements: &mut Vec<LayoutElement>,
    ) {
        let lines = cell.lines(ts, width);
        let line_height = cell.line_height();
        let text_height = lines.len() as f64 * line_height;
        let text_top = match cell.valign {
            VerticalAlign::Top => y + cell.padding,
            VerticalAlign::Middle => y + (row_height - text_height) / 2.0,
        };
        let anchor = match cell.align {
            TextAlign::Left => x + cell.padding,
            TextAlign::Center => x + width / 2.0,
            TextAlign::Right => x + width - cell.padding,
        };
        // Baselines sit one descent above the bottom of each line box
        let descent = cell.style.size * PT_TO_MM * 0.2;

        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let baseline = text_top + (i + 1) as f64 * line_height - descent;
            elements.push(ts.text(anchor, baseline, line, cell.style, cell.align));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DrawCommand;

    fn border() -> Stroke {
        Stroke::new(Color::BLACK, 0.2)
    }

    #[test]
    fn test_auto_column_takes_the_rest() {
        let widths = resolve_column_widths(
            &[
                ColumnWidth::Fixed(15.0),
                ColumnWidth::Auto,
                ColumnWidth::Fixed(15.0),
                ColumnWidth::Fixed(50.0),
            ],
            180.0,
        );
        assert_eq!(widths, vec![15.0, 100.0, 15.0, 50.0]);
    }

    #[test]
    fn test_min_height_applies() {
        let table = Table {
            columns: vec![ColumnWidth::Auto],
            rows: vec![Row::new(vec![Cell::new("short", TextStyle::bold(10.0))]).min_height(30.0)],
            border: border(),
        };
        assert_eq!(table.measure(&Typesetter::new(), 100.0), 30.0);
    }

    #[test]
    fn test_row_height_follows_tallest_cell() {
        let ts = Typesetter::new();
        let style = TextStyle::regular(10.0);
        let table = Table {
            columns: vec![ColumnWidth::Fixed(40.0), ColumnWidth::Fixed(40.0)],
            rows: vec![Row::new(vec![
                Cell::new("one", style).padding(4.0),
                Cell::new("one\ntwo\nthree", style).padding(4.0),
            ])],
            border: border(),
        };
        let line = 10.0 * PT_TO_MM * LINE_HEIGHT_FACTOR;
        assert!((table.measure(&ts, 80.0) - (3.0 * line + 8.0)).abs() < 1e-9);
    }

    #[test]
    fn test_draw_matches_measure() {
        let ts = Typesetter::new();
        let table = Table {
            columns: vec![ColumnWidth::Fixed(15.0), ColumnWidth::Auto],
            rows: vec![
                Row::new(vec![
                    Cell::new("S.No", TextStyle::bold(10.0)),
                    Cell::new("Description", TextStyle::bold(10.0)),
                ])
                .fill(Color::BRAND_BLUE),
                Row::new(vec![
                    Cell::new("01", TextStyle::regular(10.0)).valign(VerticalAlign::Middle),
                    Cell::new("A long product name that needs wrapping in a narrow column", TextStyle::regular(10.0)),
                ]),
            ],
            border: border(),
        };
        let measured = table.measure(&ts, 60.0);
        let (elements, drawn) = table.draw(&ts, 15.0, 100.0, 60.0);
        assert!((measured - drawn).abs() < 1e-9);
        let rects = elements
            .iter()
            .filter(|e| matches!(e.draw, DrawCommand::Rect { .. }))
            .count();
        assert_eq!(rects, 4);
        for el in &elements {
            assert!(el.y >= 100.0 && el.y <= 100.0 + drawn);
        }
    }

    #[test]
    fn test_centered_cell_text() {
        let ts = Typesetter::new();
        let style = TextStyle::regular(10.0);
        let table = Table {
            columns: vec![ColumnWidth::Fixed(50.0)],
            rows: vec![Row::new(vec![Cell::new("1", style).align(TextAlign::Center)])],
            border: border(),
        };
        let (elements, _) = table.draw(&ts, 0.0, 0.0, 50.0);
        let text = elements
            .iter()
            .find(|e| matches!(e.draw, DrawCommand::Text { .. }))
            .unwrap();
        assert!((text.x + text.width / 2.0 - 25.0).abs() < 1e-9);
    }
}
