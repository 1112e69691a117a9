//! # Composer Configuration
//!
//! House-style constants and asset options. Every field has a default, so an
//! empty JSON object (or no config at all) reproduces the standard letterhead
//! on A4. Lengths are millimetres; font sizes elsewhere are points.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ComposerError;

/// Top-level configuration for a [`QuotationComposer`](crate::QuotationComposer).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub page: PageGeometry,
    pub letterhead: Letterhead,
    pub assets: AssetConfig,
    /// Validity used when neither the request nor the quotation carries one.
    pub default_validity_days: i64,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            letterhead: Letterhead::default(),
            assets: AssetConfig::default(),
            default_validity_days: 30,
        }
    }
}

impl ComposerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ComposerError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(json: &str) -> Result<Self, ComposerError> {
        let mut config: ComposerConfig = serde_json::from_str(json)?;
        if config.default_validity_days <= 0 {
            config.default_validity_days = 30;
        }
        Ok(config)
    }
}

/// Page size and the fixed vertical bands of the letterhead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    /// Left/right content margin.
    pub margin: f64,
    /// Where content starts below the header on every page.
    pub top_offset: f64,
    /// Where the terms heading starts on its page.
    pub terms_top_offset: f64,
    /// Space reserved at the bottom for the contact box.
    pub footer_band: f64,
    /// Extra gap kept between content and the footer band.
    pub bottom_gap: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        // A4 portrait
        Self {
            width: 210.0,
            height: 297.0,
            margin: 15.0,
            top_offset: 50.0,
            terms_top_offset: 55.0,
            footer_band: 20.0,
            bottom_gap: 5.0,
        }
    }
}

impl PageGeometry {
    /// The lowest y coordinate content may reach.
    pub fn content_bottom(&self) -> f64 {
        self.height - self.footer_band - self.bottom_gap
    }

    pub fn content_width(&self) -> f64 {
        self.width - self.margin * 2.0
    }

    pub fn right_edge(&self) -> f64 {
        self.width - self.margin
    }
}

/// Fixed letterhead text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Letterhead {
    /// Company name in the top-right header.
    pub header_name: String,
    pub address_lines: Vec<String>,
    /// Line printed in the bottom contact box.
    pub contact_line: String,
    /// Signature company when the request settings carry none.
    pub signature_company: String,
    /// Signatory when the author has no name.
    pub fallback_signatory: String,
    /// Phone printed when the author has none.
    pub fallback_phone: String,
}

impl Default for Letterhead {
    fn default() -> Self {
        Self {
            header_name: "RAISE LAB EQUIPMENT".to_string(),
            address_lines: vec![
                "C-6, B1, Industrial Park, Moula Ali,".to_string(),
                "Hyderabad, Secunderabad,".to_string(),
                "Telangana 500040".to_string(),
            ],
            contact_line: "Write us: info@raiselabequip.com / sales@raiselabequip.com | Contact: +91 91777 70365"
                .to_string(),
            signature_company: "Raise Lab Equipment".to_string(),
            fallback_signatory: "SALES TEAM".to_string(),
            fallback_phone: "+91 91777 70365".to_string(),
        }
    }
}

/// Options for the image prefetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Logo drawn in the header of every page. Missing or broken logos are skipped.
    pub logo: Option<String>,
    /// Images wider than this are downscaled before embedding.
    pub max_image_width_px: u32,
    /// JPEG quality (1-100) used when re-encoding.
    pub jpeg_quality: u8,
    /// Upper bound on a single HTTP download.
    pub max_download_bytes: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            logo: Some("./quotation-logo.jpg".to_string()),
            max_image_width_px: 800,
            jpeg_quality: 85,
            max_download_bytes: 20 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let page = PageGeometry::default();
        assert_eq!(page.content_bottom(), 272.0);
        assert_eq!(page.content_width(), 180.0);
        assert_eq!(page.right_edge(), 195.0);
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = ComposerConfig::from_json("{}").unwrap();
        assert_eq!(config.default_validity_days, 30);
        assert_eq!(config.assets.max_image_width_px, 800);
        assert_eq!(config.letterhead.header_name, "RAISE LAB EQUIPMENT");
    }

    #[test]
    fn test_partial_override() {
        let config = ComposerConfig::from_json(
            r#"{ "assets": { "logo": null, "jpeg_quality": 70 }, "default_validity_days": 45 }"#,
        )
        .unwrap();
        assert!(config.assets.logo.is_none());
        assert_eq!(config.assets.jpeg_quality, 70);
        assert_eq!(config.assets.max_image_width_px, 800);
        assert_eq!(config.default_validity_days, 45);
    }

    #[test]
    fn test_new_matches_house_style() {
        let config = ComposerConfig::new();
        assert_eq!(config.default_validity_days, 30);
        assert_eq!(config.page.top_offset, 50.0);
    }
}
