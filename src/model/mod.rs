//! # Quotation Model
//!
//! The input representation for the composer. Everything here is plain data
//! handed over by the surrounding application after it has fetched and
//! authorized it; the composer never goes back for more.
//!
//! Field names follow the records the sales application stores, so a
//! quotation row, its line items and the user profile can be serialized
//! straight into a [`QuotationRequest`].

use serde::{Deserialize, Serialize};

/// Everything needed to compose one quotation document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationRequest {
    pub quotation: Quotation,

    /// Line items in page order. Item 0 shares page 1 with the bill-to block.
    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default)]
    pub settings: CompanySettings,

    /// The salesperson who authored the quotation.
    #[serde(default)]
    pub user: UserProfile,

    /// Custom terms. `None` or empty means the built-in default set.
    #[serde(default, alias = "selectedTerms")]
    pub terms: Option<Vec<Term>>,

    #[serde(default)]
    pub currency: Currency,

    /// Validity chosen at export time, takes precedence over the stored one.
    #[serde(default, alias = "validityData")]
    pub validity: Option<ValidityOverride>,
}

impl QuotationRequest {
    /// The terms that will actually be printed.
    pub fn effective_terms(&self) -> Vec<Term> {
        match &self.terms {
            Some(terms) if !terms.is_empty() => terms.clone(),
            _ => default_terms(),
        }
    }

    /// File name offered for download: `<quotation_number>_Quotation.pdf`.
    pub fn file_name(&self) -> String {
        format!("{}_Quotation.pdf", self.quotation.quotation_number)
    }
}

/// The quotation header record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quotation {
    #[serde(default)]
    pub id: String,
    pub quotation_number: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_address: Option<String>,
    /// Creation timestamp: `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Stored validity date: `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    pub validity_date: Option<String>,
    /// Stored validity as an offset in days from creation.
    #[serde(default)]
    pub validity_days: Option<i64>,
}

/// Validity picked in the export dialog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidityOverride {
    #[serde(default, alias = "validityDate")]
    pub validity_date: Option<String>,
    #[serde(default, alias = "validityDays")]
    pub validity_days: Option<i64>,
}

/// Output currency. Only affects labels and number grouping; no conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    /// Code shown in the price column header.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
        }
    }
}

/// One catalog product inside a quotation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price before add-ons.
    pub price: f64,
    #[serde(default, alias = "selectedAddons")]
    pub selected_addons: Option<Vec<Addon>>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_format: ImageFormat,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub specs: Option<Vec<Spec>>,
}

impl LineItem {
    /// Unit price plus every selected add-on.
    pub fn total_price(&self) -> f64 {
        let addons: f64 = self.addons().iter().map(|a| a.price).sum();
        self.price + addons
    }

    pub fn addons(&self) -> &[Addon] {
        self.selected_addons.as_deref().unwrap_or(&[])
    }

    /// Features to print, falling back to the stock list when none are set.
    pub fn effective_features(&self) -> Vec<String> {
        match &self.features {
            Some(features) if !features.is_empty() => features.clone(),
            _ => DEFAULT_FEATURES.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// An optional accessory sold with an item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Addon {
    pub name: String,
    #[serde(default)]
    pub price: f64,
}

/// A key/value specification line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spec {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// How an item's image sits relative to its feature list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Image centered under the description, features full width below it.
    #[default]
    Wide,
    /// Features in a left column, image in a right column.
    Tall,
}

/// Company-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanySettings {
    #[serde(default)]
    pub company_name: Option<String>,
}

/// Profile of the authoring salesperson.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A single terms-and-conditions entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub title: String,
    pub text: String,
}

impl Term {
    pub fn new(title: &str, text: &str) -> Self {
        Self {
            title: title.to_string(),
            text: text.to_string(),
        }
    }
}

/// Printed for items whose feature list is missing or empty.
pub const DEFAULT_FEATURES: [&str; 11] = [
    "Accurate method for determining the strength of antibiotic material",
    "Microprocessor based design",
    "Average of Vertical diameter & Horizontal diameter of inhibited zone",
    "Magnified image of inhibited zone is clearly visible on the prism Screen",
    "Calibration facility with certified coins",
    "Inbuilt thermal printer",
    "Parallel printer port & RS 232 port for taking Test Printer Report",
    "Password protection for Real Time Clock",
    "Membrane Keypad for easy operation",
    "Complies to cGMP (MOC-stainless steel -304 & Stainless Steel-316)",
    "IQ/OQ Documentation",
];

/// The standard terms printed when the caller supplies none.
pub fn default_terms() -> Vec<Term> {
    vec![
        Term::new("Packaging & Forwarding", "Extra As Applicable"),
        Term::new("Freight", "To Pay / Extra as applicable"),
        Term::new(
            "DELIVERY",
            "We deliver the order in 3-4 Weeks from the date of receipt of purchase order",
        ),
        Term::new("INSTALLATION", "Fees extra as applicable"),
        Term::new(
            "PAYMENT",
            "100% payment at the time of proforma invoice prior to dispatch.",
        ),
        Term::new("WARRANTY", "One year warranty from the date of dispatch"),
        Term::new(
            "GOVERNING LAW",
            "These Terms and Conditions and any action related hereto shall be governed, controlled, interpreted and defined by and under the laws of the State of Telangana",
        ),
        Term::new(
            "MODIFICATION",
            "Any modification of these Terms and Conditions shall be valid only if it is in writing and signed by the authorized representatives of both Supplier and Customer.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_price_adds_addons() {
        let item = LineItem {
            price: 1000.0,
            selected_addons: Some(vec![
                Addon { name: "Stand".into(), price: 250.5 },
                Addon { name: "Printer".into(), price: 99.25 },
            ]),
            ..Default::default()
        };
        assert!((item.total_price() - 1349.75).abs() < 1e-9);
    }

    #[test]
    fn test_features_fall_back_when_empty() {
        let mut item = LineItem::default();
        assert_eq!(item.effective_features().len(), 11);
        item.features = Some(vec![]);
        assert_eq!(item.effective_features()[0], DEFAULT_FEATURES[0]);
        item.features = Some(vec!["Own feature".into()]);
        assert_eq!(item.effective_features(), vec!["Own feature".to_string()]);
    }

    #[test]
    fn test_request_deserializes_app_field_names() {
        let json = r#"{
            "quotation": { "quotation_number": "Q-7", "customer_name": "Acme" },
            "items": [{
                "id": "i1", "name": "Zone Reader", "price": 10,
                "selectedAddons": [{ "name": "Stand", "price": 2 }],
                "image_format": "tall"
            }],
            "currency": "USD",
            "selectedTerms": [{ "title": "1. Freight", "text": "Extra" }],
            "validityData": { "validityDays": 15 }
        }"#;
        let req: QuotationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.currency, Currency::Usd);
        assert_eq!(req.items[0].image_format, ImageFormat::Tall);
        assert_eq!(req.items[0].addons().len(), 1);
        assert_eq!(req.validity.as_ref().unwrap().validity_days, Some(15));
        assert_eq!(req.effective_terms().len(), 1);
    }

    #[test]
    fn test_defaults() {
        let json = r#"{ "quotation": { "quotation_number": "Q-1", "customer_name": "A" } }"#;
        let req: QuotationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.currency, Currency::Inr);
        assert!(req.items.is_empty());
        assert_eq!(req.effective_terms().len(), 8);
        assert_eq!(req.file_name(), "Q-1_Quotation.pdf");
    }
}
