//! # Asset Prefetcher
//!
//! Fetches every image a quotation needs before layout starts: one per line
//! item that has an `image_url`, plus the letterhead logo. All fetches run
//! concurrently and the composer waits for every one of them to settle, so
//! layout only ever sees the final image map and can treat each picture as a
//! fixed rectangle with a known aspect ratio.
//!
//! Every image is normalized the same way: decoded, downscaled when wider
//! than the configured limit, flattened onto white and re-encoded as JPEG.
//! The PDF writer can then embed all of them with DCTDecode.
//!
//! A failure never aborts the document. The item is simply laid out without
//! its picture, and the reason goes to the log.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageFormat as DecodedFormat, Rgb, RgbImage};
use rayon::prelude::*;

use crate::config::AssetConfig;
use crate::error::AssetError;
use crate::model::LineItem;

/// A prefetched, normalized image ready for layout and PDF embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    /// The reference it was loaded from. Also identifies it in the PDF.
    pub source: String,
    /// Baseline JPEG bytes, embedded as-is.
    pub jpeg: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl ResolvedImage {
    /// Largest (width, height) with this aspect ratio that fits the box.
    pub fn fit_within(&self, max_width: f64, max_height: f64) -> (f64, f64) {
        let ratio = (max_width / self.width_px as f64).min(max_height / self.height_px as f64);
        (self.width_px as f64 * ratio, self.height_px as f64 * ratio)
    }
}

/// Images available to the layout engine for one document.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    /// Item id -> image.
    items: HashMap<String, Arc<ResolvedImage>>,
    logo: Option<Arc<ResolvedImage>>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(&self, item_id: &str) -> Option<&Arc<ResolvedImage>> {
        self.items.get(item_id)
    }

    pub fn logo(&self) -> Option<&Arc<ResolvedImage>> {
        self.logo.as_ref()
    }

    pub fn insert_item(&mut self, item_id: &str, image: ResolvedImage) {
        self.items.insert(item_id.to_string(), Arc::new(image));
    }

    pub fn set_logo(&mut self, image: ResolvedImage) {
        self.logo = Some(Arc::new(image));
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Where image bytes come from.
///
/// The default source understands data URIs, HTTP(S) URLs, explicit file
/// paths and raw base64. Callers with their own storage implement this.
pub trait AssetSource: Sync {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError>;
}

/// Resolves references from data URIs, the network and the local disk.
#[derive(Debug, Clone)]
pub struct DefaultAssetSource {
    max_download_bytes: u64,
}

impl DefaultAssetSource {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            max_download_bytes: config.max_download_bytes,
        }
    }

    fn fetch_http(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = ureq::get(url).call().map_err(|e| AssetError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_download_bytes)
            .read_to_end(&mut bytes)
            .map_err(|e| AssetError::Http {
                url: url.to_string(),
                message: format!("failed to read response: {}", e),
            })?;
        Ok(bytes)
    }
}

impl Default for DefaultAssetSource {
    fn default() -> Self {
        Self::new(&AssetConfig::default())
    }
}

impl AssetSource for DefaultAssetSource {
    fn fetch(&self, src: &str) -> Result<Vec<u8>, AssetError> {
        // Data URI: data:image/png;base64,iVBOR...
        if src.starts_with("data:image/") {
            let comma_pos = src.find(',').ok_or(AssetError::InvalidDataUri)?;
            return base64_decode(&src[comma_pos + 1..]);
        }

        if src.starts_with("http://") || src.starts_with("https://") {
            return self.fetch_http(src);
        }

        // Only explicit path prefixes: base64 payloads may contain '/'
        if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
            return std::fs::read(src).map_err(|e| AssetError::Read {
                path: src.to_string(),
                source: e,
            });
        }

        base64_decode(src)
    }
}

fn base64_decode(input: &str) -> Result<Vec<u8>, AssetError> {
    use base64::Engine;
    Ok(base64::engine::general_purpose::STANDARD.decode(input.trim())?)
}

/// Detect the format from magic bytes. Anything else is rejected early so a
/// broken upload produces a clear log line instead of a decoder error.
fn detect_format(data: &[u8]) -> Result<DecodedFormat, AssetError> {
    if data.len() < 4 {
        return Err(AssetError::TooShort);
    }
    if is_jpeg(data) {
        Ok(DecodedFormat::Jpeg)
    } else if is_png(data) {
        Ok(DecodedFormat::Png)
    } else if is_webp(data) {
        Ok(DecodedFormat::WebP)
    } else {
        Err(AssetError::UnsupportedFormat)
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// Decode, bound the width, flatten transparency and re-encode as JPEG.
pub fn normalize_image(
    source: &str,
    data: &[u8],
    config: &AssetConfig,
) -> Result<ResolvedImage, AssetError> {
    let format = detect_format(data)?;
    let decoded = image::load_from_memory_with_format(data, format).map_err(AssetError::Decode)?;

    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(AssetError::EmptyImage);
    }

    let max_width = config.max_image_width_px.max(1);
    let decoded = if width > max_width {
        let scaled_height = ((height as f64 * max_width as f64 / width as f64).round() as u32).max(1);
        decoded.resize_exact(max_width, scaled_height, image::imageops::FilterType::Triangle)
    } else {
        decoded
    };

    let rgb = flatten_onto_white(&decoded);
    let (width_px, height_px) = rgb.dimensions();

    let mut jpeg = Vec::new();
    let quality = config.jpeg_quality.clamp(1, 100);
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut Cursor::new(&mut jpeg), quality)
        .encode(rgb.as_raw(), width_px, height_px, image::ColorType::Rgb8)
        .map_err(AssetError::Encode)?;

    Ok(ResolvedImage {
        source: source.to_string(),
        jpeg,
        width_px,
        height_px,
    })
}

fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let alpha = p[3] as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

/// Fetch and normalize a single reference.
pub fn load_image(
    source: &dyn AssetSource,
    reference: &str,
    config: &AssetConfig,
) -> Result<ResolvedImage, AssetError> {
    let bytes = source.fetch(reference)?;
    normalize_image(reference, &bytes, config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot<'a> {
    Logo,
    Item(&'a str),
}

/// Resolve every item image and the logo concurrently.
///
/// Returns once all fetches have settled. Failed entries are logged and left
/// out of the set.
pub fn prefetch(
    items: &[LineItem],
    config: &AssetConfig,
    source: &dyn AssetSource,
) -> ImageSet {
    let mut jobs: Vec<(Slot<'_>, &str)> = Vec::new();
    if let Some(logo) = config.logo.as_deref().filter(|l| !l.is_empty()) {
        jobs.push((Slot::Logo, logo));
    }
    for item in items {
        if let Some(url) = item.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
            jobs.push((Slot::Item(&item.id), url));
        }
    }

    let results: Vec<(Slot<'_>, Result<ResolvedImage, AssetError>)> = jobs
        .par_iter()
        .map(|&(slot, reference)| (slot, load_image(source, reference, config)))
        .collect();

    let mut set = ImageSet::new();
    for (slot, result) in results {
        match (slot, result) {
            (Slot::Logo, Ok(image)) => set.set_logo(image),
            (Slot::Item(id), Ok(image)) => set.insert_item(id, image),
            (Slot::Logo, Err(e)) => {
                log::warn!("Could not load quotation logo: {}", e);
            }
            (Slot::Item(id), Err(e)) => {
                log::warn!("Could not load item image for {}: {}", id, e);
            }
        }
    }

    log::debug!(
        "prefetched {} item image(s), logo {}",
        set.item_count(),
        if set.logo().is_some() { "present" } else { "absent" }
    );
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
            .unwrap();
        buf
    }

    fn data_uri(bytes: &[u8]) -> String {
        use base64::Engine;
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    struct FailingSource;

    impl AssetSource for FailingSource {
        fn fetch(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
            Err(AssetError::Http {
                url: reference.to_string(),
                message: "unreachable".to_string(),
            })
        }
    }

    #[test]
    fn test_is_jpeg() {
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_jpeg(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_jpeg(&[0xFF]));
    }

    #[test]
    fn test_is_png() {
        assert!(is_png(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(!is_png(&[0xFF, 0xD8, 0xFF, 0xE0]));
        assert!(!is_png(&[0x89, 0x50]));
    }

    #[test]
    fn test_invalid_data_uri() {
        let result = DefaultAssetSource::default().fetch("data:image/png;base64");
        assert!(matches!(result, Err(AssetError::InvalidDataUri)));
    }

    #[test]
    fn test_too_short_data() {
        let result = normalize_image("x", &[0x00, 0x01], &AssetConfig::default());
        assert!(matches!(result, Err(AssetError::TooShort)));
    }

    #[test]
    fn test_unsupported_format() {
        let result = normalize_image("x", &[0x00, 0x01, 0x02, 0x03, 0x04], &AssetConfig::default());
        assert!(matches!(result, Err(AssetError::UnsupportedFormat)));
    }

    #[test]
    fn test_png_reencoded_as_jpeg() {
        let resolved = normalize_image("p", &png_bytes(4, 2, [255, 0, 0, 255]), &AssetConfig::default())
            .unwrap();
        assert!(resolved.jpeg.starts_with(&[0xFF, 0xD8]));
        assert_eq!((resolved.width_px, resolved.height_px), (4, 2));
    }

    #[test]
    fn test_wide_images_are_downscaled() {
        let config = AssetConfig {
            max_image_width_px: 100,
            ..Default::default()
        };
        let resolved = normalize_image("p", &png_bytes(400, 200, [0, 0, 255, 255]), &config).unwrap();
        assert_eq!(resolved.width_px, 100);
        assert_eq!(resolved.height_px, 50);
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 0])));
        let flat = flatten_onto_white(&img);
        assert_eq!(flat.get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        let img = ResolvedImage {
            source: "s".into(),
            jpeg: vec![],
            width_px: 800,
            height_px: 400,
        };
        let (w, h) = img.fit_within(170.0, 80.0);
        assert!((w - 160.0).abs() < 1e-9);
        assert!((h - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_prefetch_keys_by_item_id() {
        let uri = data_uri(&png_bytes(3, 3, [0, 255, 0, 255]));
        let items = vec![
            LineItem {
                id: "with-image".into(),
                image_url: Some(uri),
                ..Default::default()
            },
            LineItem {
                id: "without".into(),
                ..Default::default()
            },
        ];
        let config = AssetConfig {
            logo: None,
            ..Default::default()
        };
        let set = prefetch(&items, &config, &DefaultAssetSource::new(&config));
        assert!(set.item("with-image").is_some());
        assert!(set.item("without").is_none());
        assert!(set.logo().is_none());
    }

    #[test]
    fn test_prefetch_failures_are_not_fatal() {
        let items = vec![LineItem {
            id: "a".into(),
            image_url: Some("https://example.invalid/a.png".into()),
            ..Default::default()
        }];
        let set = prefetch(&items, &AssetConfig::default(), &FailingSource);
        assert_eq!(set.item_count(), 0);
        assert!(set.logo().is_none());
    }
}
