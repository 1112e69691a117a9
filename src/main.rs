//! # Quotation Composer CLI
//!
//! Usage:
//!   quotation-composer request.json
//!   quotation-composer request.json -o out.pdf --logo ./logo.png
//!   cat request.json | quotation-composer -o out.pdf
//!   quotation-composer --example > request.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use quotation_composer::config::ComposerConfig;
use quotation_composer::error::ComposerError;
use quotation_composer::QuotationComposer;

#[derive(Parser, Debug)]
#[command(name = "quotation-composer", version, about = "Compose letterhead quotation PDFs")]
struct Cli {
    /// Quotation request JSON. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Output file. Defaults to `<quotation_number>_Quotation.pdf`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Composer configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Logo reference (file path, URL or data URI) overriding the config.
    #[arg(long)]
    logo: Option<String>,

    /// Print an example request and exit.
    #[arg(long)]
    example: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.example {
        print!("{}", example_request_json());
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ComposerError> {
    let mut config = match &cli.config {
        Some(path) => ComposerConfig::from_json_file(path)?,
        None => ComposerConfig::default(),
    };
    if let Some(logo) = &cli.logo {
        config.assets.logo = Some(logo.clone());
    }

    let input = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let document = QuotationComposer::new(config).compose_json(&input)?;
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&document.file_name));
    fs::write(&output_path, &document.bytes)?;

    eprintln!(
        "✓ Written {} pages ({} bytes) to {}",
        document.page_count,
        document.bytes.len(),
        output_path.display()
    );
    Ok(())
}

fn example_request_json() -> &'static str {
    r##"{
  "quotation": {
    "id": "7f1c2b9e",
    "quotation_number": "RLE/2024/001",
    "customer_name": "Acme Pharma Pvt Ltd",
    "customer_address": "Plot 12, Genome Valley,\nShamirpet, Hyderabad 500078",
    "created_at": "2024-01-01T10:30:00Z"
  },
  "items": [
    {
      "id": "item-1",
      "name": "Antibiotic Zone Reader",
      "description": "Automated reader for measuring zones of inhibition in antibiotic potency assays, with magnified projection and printed reports.",
      "price": 185000,
      "selectedAddons": [
        { "name": "Thermal printer roll (pack of 10)", "price": 1500 },
        { "name": "Calibration coin set", "price": 4500 }
      ],
      "image_format": "wide",
      "specs": [
        { "key": "Power Supply", "value": "230V AC, 50Hz" },
        { "key": "Display", "value": "Prism screen with 10x magnification" }
      ]
    },
    {
      "id": "item-2",
      "name": "Laminar Air Flow Cabinet",
      "description": "Horizontal laminar air flow cabinet with HEPA filtration for aseptic work.",
      "price": 95000,
      "image_format": "tall",
      "features": [
        "HEPA filter with 99.97% efficiency at 0.3 micron",
        "UV germicidal lamp with timer",
        "Stainless steel 304 work table"
      ]
    }
  ],
  "settings": { "company_name": "Raise Lab Equipment" },
  "user": { "full_name": "Sales Team", "phone": "+91 91777 70365" },
  "currency": "INR",
  "validityData": { "validityDays": 45 }
}
"##
}
