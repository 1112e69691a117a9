//! # Quotation Composer
//!
//! Turns a sales quotation (customer, line items, terms, salesperson) into a
//! multi-page letterhead PDF.
//!
//! The page is the unit of layout. Every block is measured before it is
//! drawn and the engine decides, block by block, whether it still fits above
//! the footer band or has to move to a fresh page. Nothing is rendered onto
//! a long canvas and cut up afterwards, so no block is ever clipped by a
//! page boundary.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    — Quotation, line items, terms, profile
//!       ↓
//!   [assets]   — Concurrent image prefetch and normalization
//!       ↓
//!   [layout]   — Page frame, item flow, terms, page numbers
//!       ↓
//!   [pdf]      — Serialize to PDF bytes
//! ```

pub mod assets;
pub mod config;
pub mod error;
pub mod font;
pub mod format;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod style;
pub mod text;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use assets::{AssetSource, DefaultAssetSource, ImageSet};
use config::ComposerConfig;
use error::ComposerError;
use layout::{LayoutEngine, LayoutPage};
use model::QuotationRequest;
use pdf::{Metadata, PdfWriter};

/// A finished quotation document.
#[derive(Debug, Clone)]
pub struct ComposedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Suggested download name, `<quotation_number>_Quotation.pdf`.
    pub file_name: String,
}

impl ComposedDocument {
    /// Write the PDF into `dir` under its suggested file name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ComposerError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Composes quotation PDFs with a fixed configuration and asset source.
pub struct QuotationComposer {
    config: ComposerConfig,
    source: Box<dyn AssetSource + Send>,
    today: Option<NaiveDate>,
}

impl Default for QuotationComposer {
    fn default() -> Self {
        Self::new(ComposerConfig::default())
    }
}

impl QuotationComposer {
    pub fn new(config: ComposerConfig) -> Self {
        let source = DefaultAssetSource::new(&config.assets);
        Self {
            config,
            source: Box::new(source),
            today: None,
        }
    }

    /// Fetch images from somewhere other than data URIs, HTTP and disk.
    pub fn with_source(mut self, source: impl AssetSource + Send + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Pin the date used when a quotation has no creation date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Resolve every image the request refers to.
    pub fn prefetch(&self, request: &QuotationRequest) -> ImageSet {
        assets::prefetch(&request.items, &self.config.assets, self.source.as_ref())
    }

    /// Prefetch images and lay the quotation out into pages.
    pub fn layout(&self, request: &QuotationRequest) -> Vec<LayoutPage> {
        let images = self.prefetch(request);
        LayoutEngine::new(&self.config).layout(request, &images, self.today())
    }

    /// Compose the complete PDF.
    pub fn compose(&self, request: &QuotationRequest) -> Result<ComposedDocument, ComposerError> {
        let pages = self.layout(request);
        if pages.is_empty() {
            return Err(ComposerError::RenderError(
                "layout produced no pages".to_string(),
            ));
        }

        let metadata = Metadata {
            title: Some(request.quotation.quotation_number.clone()),
            author: request.user.full_name.clone().filter(|n| !n.is_empty()),
            subject: Some(format!("Quotation for {}", request.quotation.customer_name)),
        };
        let bytes = PdfWriter::new().write(&pages, &metadata);

        log::info!(
            "composed quotation {}: {} page(s), {} bytes",
            request.quotation.quotation_number,
            pages.len(),
            bytes.len()
        );

        Ok(ComposedDocument {
            bytes,
            page_count: pages.len(),
            file_name: request.file_name(),
        })
    }

    /// Compose from a JSON-encoded [`QuotationRequest`].
    pub fn compose_json(&self, json: &str) -> Result<ComposedDocument, ComposerError> {
        let request: QuotationRequest = serde_json::from_str(json)?;
        self.compose(&request)
    }
}

/// Compose a JSON quotation request with the default configuration.
pub fn compose_json(json: &str) -> Result<ComposedDocument, ComposerError> {
    QuotationComposer::default().compose_json(json)
}
