//! Utilities for turning quotation documents into professional PDFs.
//!
//! This crate provides the full quotation pipeline: a typed document model,
//! pure totals calculation, a URL-safe codec that lets the whole document
//! travel as a query parameter, a deterministic HTML renderer, and an export
//! service that captures the rendered page as an A4 PDF through a headless
//! chrome(ium) session.
//!
//! # Example
//!
//! ```rust
//! use bigdecimal::BigDecimal;
//! use quotation_pdf::{calc, codec, LineItemBuilder, QuotationDocumentBuilder};
//!
//! let doc = QuotationDocumentBuilder::default()
//!     .add_item(
//!         LineItemBuilder::default()
//!             .label("Pump")
//!             .description("Circulation pump")
//!             .quantity(BigDecimal::from(2))
//!             .unit_price(BigDecimal::from(120))
//!             .taxed(true)
//!             .build()
//!             .unwrap(),
//!     )
//!     .tax_rate_percent(BigDecimal::from(20))
//!     .build()
//!     .unwrap();
//!
//! let totals = calc::totals(&doc.items, &doc.tax_rate_percent, &doc.carriage);
//! assert_eq!(totals.grand_total, BigDecimal::from(288));
//!
//! let token = codec::encode(&doc).unwrap();
//! assert_eq!(codec::decode(&token).unwrap(), doc);
//! ```

pub mod calc;
pub mod codec;
pub mod error;
pub mod export;
pub mod quotation;
pub mod render;
pub mod wire;

pub use error::Error;
pub use export::{
    start_chromedriver, CaptureBackend, ExportConfig, ExportedPdf, Exporter, WebDriverCapture,
};
pub use quotation::{
    Company, CompanyBuilder, Customer, CustomerBuilder, LineItem, LineItemBuilder,
    QuotationDocument, QuotationDocumentBuilder, QuoteMeta, QuoteMetaBuilder, DEFAULT_CURRENCY,
};
