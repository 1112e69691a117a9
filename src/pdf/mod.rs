//! # PDF Serializer
//!
//! Takes the laid-out pages from the layout engine and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. A quotation only needs two
//! standard fonts, JPEG images, straight lines and rectangles, so the
//! subset of the format involved is small and we write the raw bytes
//! ourselves.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, images, pages, content streams)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Layout coordinates are millimetres from the top-left corner; PDF user
//! space is points from the bottom-left. Everything is converted here.
//! Output contains no timestamps, so identical input gives identical bytes.

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::assets::ResolvedImage;
use crate::font::StandardFont;
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, MM_TO_PT};
use crate::style::Color;

/// Document information written to the Info dictionary.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Default)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    font_objects: Vec<(StandardFont, usize)>,
    /// Each distinct image once, as /Im0, /Im1, ...
    image_objects: Vec<(Arc<ResolvedImage>, usize)>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn image_index(&self, image: &Arc<ResolvedImage>) -> Option<usize> {
        self.image_objects
            .iter()
            .position(|(known, _)| Arc::ptr_eq(known, image))
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], metadata: &Metadata) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = fonts, images, then page objects and content streams
        builder.push(vec![]);
        builder.push(vec![]);
        builder.push(vec![]);

        self.register_fonts(&mut builder, pages);
        self.register_images(&mut builder, pages);

        let mut page_obj_ids: Vec<usize> = Vec::new();

        for page in pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = builder.push(content_data);

            let font_resources = self.build_font_resource_dict(&builder.font_objects);
            let xobject_resources = self.build_xobject_resource_dict(page, &builder);
            let resources = if xobject_resources.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!(
                    "/Font << {} >> /XObject << {} >>",
                    font_resources, xobject_resources
                )
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width * MM_TO_PT,
                page.height * MM_TO_PT,
                content_obj_id,
                resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        // Write Catalog (object 1)
        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        // Write Pages tree (object 2)
        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        // Info dictionary (metadata)
        let info_obj_id = if metadata.title.is_some()
            || metadata.author.is_some()
            || metadata.subject.is_some()
        {
            let mut info = String::from("<< ");
            if let Some(ref title) = metadata.title {
                let _ = write!(info, "/Title ({}) ", Self::encode_text(title));
            }
            if let Some(ref author) = metadata.author {
                let _ = write!(info, "/Author ({}) ", Self::encode_text(author));
            }
            if let Some(ref subject) = metadata.subject {
                let _ = write!(info, "/Subject ({}) ", Self::encode_text(subject));
            }
            info.push_str("/Producer (quotation-composer) >>");
            Some(builder.push(info.into_bytes()))
        } else {
            None
        };

        self.serialize(&builder, info_obj_id)
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, builder);
        }
        stream
    }

    /// Write a single layout element as PDF operators.
    fn write_element(
        &self,
        stream: &mut String,
        element: &LayoutElement,
        page_height: f64,
        builder: &PdfBuilder,
    ) {
        let k = MM_TO_PT;
        match &element.draw {
            DrawCommand::Rect { fill, stroke } => {
                let x = element.x * k;
                let y = (page_height - element.y - element.height) * k;
                let w = element.width * k;
                let h = element.height * k;

                if let Some(bg) = fill {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        bg.r, bg.g, bg.b, x, y, w, h
                    );
                }
                if let Some(border) = stroke {
                    let _ = write!(
                        stream,
                        "q\n{}{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                        Self::stroke_color(&border.color),
                        border.width * k,
                        x,
                        y,
                        w,
                        h
                    );
                }
            }

            DrawCommand::Line { stroke } => {
                let x1 = element.x * k;
                let y1 = (page_height - element.y) * k;
                let x2 = (element.x + element.width) * k;
                let y2 = (page_height - element.y - element.height) * k;
                let _ = write!(
                    stream,
                    "q\n{}{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    Self::stroke_color(&stroke.color),
                    stroke.width * k,
                    x1,
                    y1,
                    x2,
                    y2
                );
            }

            DrawCommand::Text { text, style } => {
                if text.is_empty() {
                    return;
                }
                let _ = write!(
                    stream,
                    "BT\n{:.3} {:.3} {:.3} rg\n/{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                    style.color.r,
                    style.color.g,
                    style.color.b,
                    style.font.resource_name(),
                    style.size,
                    element.x * k,
                    (page_height - element.y) * k,
                    Self::encode_text(text)
                );
            }

            DrawCommand::Image { image } => {
                let x = element.x * k;
                let y = (page_height - element.y - element.height) * k;
                if let Some(idx) = builder.image_index(image) {
                    let _ = write!(
                        stream,
                        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                        element.width * k,
                        element.height * k,
                        x,
                        y,
                        idx
                    );
                }
            }
        }
    }

    fn stroke_color(color: &Color) -> String {
        format!("{:.3} {:.3} {:.3} RG\n", color.r, color.g, color.b)
    }

    /// Register the standard fonts actually used across all pages.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        let mut fonts: Vec<StandardFont> = pages
            .iter()
            .flat_map(|p| &p.elements)
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { style, .. } => Some(style.font),
                _ => None,
            })
            .collect();

        // Sort for deterministic ordering, then dedup
        fonts.sort();
        fonts.dedup();

        // Always have at least Helvetica
        if fonts.is_empty() {
            fonts.push(StandardFont::Helvetica);
        }

        for font in fonts {
            let font_dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                 /Encoding /WinAnsiEncoding >>",
                font.pdf_name()
            );
            let obj_id = builder.push(font_dict.into_bytes());
            builder.font_objects.push((font, obj_id));
        }
    }

    /// Write every distinct image once, in order of first appearance.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for element in pages.iter().flat_map(|p| &p.elements) {
            if let DrawCommand::Image { image } = &element.draw {
                if builder.image_index(image).is_none() {
                    let obj_id = Self::write_image_xobject(builder, image);
                    builder.image_objects.push((Arc::clone(image), obj_id));
                }
            }
        }
    }

    /// Prefetched images are baseline RGB JPEGs and go in unchanged.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &ResolvedImage) -> usize {
        let mut obj_data: Vec<u8> = Vec::new();
        let _ = write!(
            obj_data,
            "<< /Type /XObject /Subtype /Image \
             /Width {} /Height {} \
             /ColorSpace /DeviceRGB \
             /BitsPerComponent 8 \
             /Filter /DCTDecode \
             /Length {} >>\nstream\n",
            image.width_px,
            image.height_px,
            image.jpeg.len()
        );
        obj_data.extend_from_slice(&image.jpeg);
        obj_data.extend_from_slice(b"\nendstream");
        builder.push(obj_data)
    }

    fn build_font_resource_dict(&self, font_objects: &[(StandardFont, usize)]) -> String {
        font_objects
            .iter()
            .map(|(font, obj_id)| format!("/{} {} 0 R", font.resource_name(), obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the /XObject resource dict entries for the images on one page.
    fn build_xobject_resource_dict(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut entries: Vec<(usize, usize)> = page
            .elements
            .iter()
            .filter_map(|el| match &el.draw {
                DrawCommand::Image { image } => builder
                    .image_index(image)
                    .map(|idx| (idx, builder.image_objects[idx].1)),
                _ => None,
            })
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);
        entries.dedup();
        entries
            .iter()
            .map(|(idx, obj_id)| format!("/Im{} {} 0 R", idx, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Encode text as the body of a PDF literal string in WinAnsiEncoding.
    fn encode_text(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    // Octal escape for bytes outside the printable range
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// holds smart quotes, bullets, dashes and the like.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82), // Single low-9 quotation mark
            0x0192 => Some(0x83), // Latin small letter f with hook
            0x201E => Some(0x84), // Double low-9 quotation mark
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86), // Dagger
            0x2021 => Some(0x87), // Double dagger
            0x02C6 => Some(0x88), // Modifier letter circumflex accent
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A), // Latin capital letter S with caron
            0x2039 => Some(0x8B), // Single left-pointing angle quotation
            0x0152 => Some(0x8C), // Latin capital ligature OE
            0x017D => Some(0x8E), // Latin capital letter Z with caron
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98), // Small tilde
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A), // Latin small letter s with caron
            0x203A => Some(0x9B), // Single right-pointing angle quotation
            0x0153 => Some(0x9C), // Latin small ligature oe
            0x017E => Some(0x9E), // Latin small letter z with caron
            0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        // Header
        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let header = format!("{} 0 obj\n", i);
            output.extend_from_slice(header.as_bytes());
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R",
            builder.objects.len()
        );
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Typesetter;
    use crate::style::{Stroke, TextAlign, TextStyle};

    fn blank_page(elements: Vec<LayoutElement>) -> LayoutPage {
        LayoutPage {
            width: 210.0,
            height: 297.0,
            elements,
        }
    }

    fn text_element(text: &str, style: TextStyle) -> LayoutElement {
        Typesetter::new().text(15.0, 60.0, text, style, TextAlign::Left)
    }

    fn image_element(image: &Arc<ResolvedImage>) -> LayoutElement {
        LayoutElement {
            x: 15.0,
            y: 12.0,
            width: 70.0,
            height: 25.0,
            draw: DrawCommand::Image {
                image: Arc::clone(image),
            },
        }
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_encode_text_escapes() {
        assert_eq!(PdfWriter::encode_text("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(PdfWriter::encode_text("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_encode_text_winansi() {
        assert_eq!(PdfWriter::encode_text("\u{2022} Stand"), "\\225 Stand");
        assert_eq!(PdfWriter::encode_text("\u{20B9}"), "?");
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let bytes = PdfWriter::new().write(&[blank_page(vec![])], &Metadata::default());

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
        assert!(bytes.windows(4).any(|w| w == b"xref"));
        assert!(bytes.windows(7).any(|w| w == b"trailer"));
        assert!(bytes.windows(14).any(|w| w == b"/BaseFont /Hel"));
    }

    #[test]
    fn test_a4_media_box_in_points() {
        let bytes = PdfWriter::new().write(&[blank_page(vec![])], &Metadata::default());
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/MediaBox [0 0 595.28 841.89]"));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let metadata = Metadata {
            title: Some("RLE/2024/001".to_string()),
            author: Some("Sales Team".to_string()),
            subject: None,
        };
        let bytes = PdfWriter::new().write(&[blank_page(vec![])], &metadata);
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("/Title (RLE/2024/001)"));
        assert!(text.contains("/Author (Sales Team)"));
        assert!(text.contains("/Info"));
    }

    #[test]
    fn test_subject_alone_writes_info_dict() {
        let metadata = Metadata {
            title: None,
            author: None,
            subject: Some("Quotation for Acme Pharma".to_string()),
        };
        let bytes = PdfWriter::new().write(&[blank_page(vec![])], &metadata);
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("/Subject (Quotation for Acme Pharma)"));
        assert!(text.contains("/Info"));
        assert!(!text.contains("/Title"));
    }

    #[test]
    fn test_no_metadata_omits_info_dict() {
        let bytes = PdfWriter::new().write(&[blank_page(vec![])], &Metadata::default());
        assert!(!String::from_utf8_lossy(&bytes).contains("/Info"));
    }

    #[test]
    fn test_bold_font_registered_separately() {
        let pages = vec![blank_page(vec![
            text_element("A", TextStyle::regular(12.0)),
            text_element("A", TextStyle::bold(12.0)),
        ])];
        let bytes = PdfWriter::new().write(&pages, &Metadata::default());
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/BaseFont /Helvetica-Bold "));
        assert!(text.contains("/F1 ") && text.contains("/F2 "));
    }

    #[test]
    fn test_shared_image_written_once() {
        let logo = Arc::new(ResolvedImage {
            source: "logo".into(),
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width_px: 280,
            height_px: 100,
        });
        let pages = vec![
            blank_page(vec![image_element(&logo)]),
            blank_page(vec![image_element(&logo)]),
        ];
        let bytes = PdfWriter::new().write(&pages, &Metadata::default());

        assert_eq!(count(&bytes, b"/Subtype /Image"), 1);
        assert_eq!(count(&bytes, b"/DCTDecode"), 1);
        assert_eq!(count(&bytes, b"/XObject << /Im0"), 2);
    }

    #[test]
    fn test_output_is_deterministic() {
        let pages = vec![blank_page(vec![
            text_element("Quotation", TextStyle::bold(14.0)),
            LayoutElement {
                x: 5.0,
                y: 5.0,
                width: 200.0,
                height: 287.0,
                draw: DrawCommand::Rect {
                    fill: None,
                    stroke: Some(Stroke::new(Color::BRAND_BLUE, 1.2)),
                },
            },
        ])];
        let a = PdfWriter::new().write(&pages, &Metadata::default());
        let b = PdfWriter::new().write(&pages, &Metadata::default());
        assert_eq!(a, b);
    }
}
