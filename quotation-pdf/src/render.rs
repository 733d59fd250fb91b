//! Deterministic mapping from a quotation document to a printable A4 page.
//!
//! Split in two layers: [`PageModel::build`] carries every business-display
//! rule (column order, taxed markers, row shading parity, totals panel order,
//! carriage/discount labeling, currency formatting) as plain data, and
//! [`render`] feeds that model through an embedded minijinja template. The
//! same input always yields the same output; nothing here mutates the
//! document.

use bigdecimal::{BigDecimal, RoundingMode};
use minijinja::context;
use serde::Serialize;

use crate::calc::Totals;
use crate::error::{AddContext, Error};
use crate::quotation::QuotationDocument;

const TEMPLATE_NAME: &str = "quotation.html";
const TEMPLATE_SOURCE: &str = include_str!("../templates/quotation.html");

/// One label/value pair in the metadata panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaRow {
    pub label: String,
    pub value: String,
}

/// One line item row, fully formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRow {
    pub quantity: String,
    pub code: String,
    pub label: String,
    pub description: String,
    /// Literal "X" when the item is taxed, empty otherwise.
    pub tax_marker: String,
    pub unit_price: String,
    pub line_total: String,
    /// Zero-based index parity: even rows unshaded, odd rows shaded.
    pub shaded: bool,
}

/// One line of the totals panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsRow {
    pub label: String,
    pub value: String,
    pub emphasized: bool,
}

/// Everything the template needs, precomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageModel {
    pub company_name: String,
    pub company_address_lines: Vec<String>,
    pub company_contact_lines: Vec<String>,
    pub meta_rows: Vec<MetaRow>,
    pub customer_name: String,
    pub customer_company: Option<String>,
    pub customer_address_lines: Vec<String>,
    pub customer_contact_lines: Vec<String>,
    pub rows: Vec<ItemRow>,
    pub totals_rows: Vec<TotalsRow>,
    pub terms: Vec<String>,
    pub acceptance_note: Option<String>,
    pub footer_note: Option<String>,
    pub contact_email: Option<String>,
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*b as char);
    }
    out
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "EUR" => Some("\u{20ac}"),
        "GBP" => Some("\u{a3}"),
        "USD" => Some("$"),
        _ => None,
    }
}

/// Format a monetary amount with thousands grouping and fixed two-decimal
/// precision, rounding half-up. Currencies without a known symbol render
/// with their ISO code as prefix.
pub fn format_amount(value: &BigDecimal, currency: &str) -> String {
    let scaled = value.with_scale_round(2, RoundingMode::HalfUp);
    let text = scaled.to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    // A tiny negative that rounds to zero drops its sign.
    let sign = if unsigned.bytes().all(|b| matches!(b, b'0' | b'.')) {
        ""
    } else {
        sign
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));
    let amount = format!("{}.{}", group_thousands(int_part), frac_part);
    match currency_symbol(currency) {
        Some(symbol) => format!("{sign}{symbol}{amount}"),
        None => format!("{sign}{} {amount}", currency.to_ascii_uppercase()),
    }
}

fn plain_number(value: &BigDecimal) -> String {
    value.clone().normalized().to_string()
}

fn contact_lines(email: &Option<String>, phone: &Option<String>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(email) = email {
        lines.push(format!("Email: {email}"));
    }
    if let Some(phone) = phone {
        lines.push(format!("Tel: {phone}"));
    }
    lines
}

impl PageModel {
    pub fn build(document: &QuotationDocument, totals: &Totals) -> PageModel {
        let currency = document.currency.as_str();

        let mut company_contact_lines =
            contact_lines(&document.company.email, &document.company.phone);
        if let Some(vat) = &document.company.tax_registration_id {
            company_contact_lines.push(format!("VAT Reg No: {vat}"));
        }

        let mut meta_rows = Vec::new();
        if let Some(account_ref) = &document.meta.account_ref_no {
            meta_rows.push(MetaRow {
                label: "Account Ref".to_string(),
                value: account_ref.clone(),
            });
        }
        if let Some(order_no) = &document.meta.customer_order_no {
            meta_rows.push(MetaRow {
                label: "Customer Order No".to_string(),
                value: order_no.clone(),
            });
        }
        meta_rows.push(MetaRow {
            label: "Quotation No".to_string(),
            value: document.meta.quotation_number.clone(),
        });
        meta_rows.push(MetaRow {
            label: "Date".to_string(),
            value: document.meta.quotation_date.clone().unwrap_or_default(),
        });
        if let Some(valid_until) = &document.meta.valid_until {
            meta_rows.push(MetaRow {
                label: "Valid Until".to_string(),
                value: valid_until.clone(),
            });
        }

        let rows = document
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| ItemRow {
                quantity: plain_number(&item.quantity),
                code: item.code.clone().unwrap_or_default(),
                label: item.label.clone(),
                description: item.description.clone(),
                tax_marker: if item.is_taxed() {
                    "X".to_string()
                } else {
                    String::new()
                },
                unit_price: format_amount(&item.unit_price, currency),
                line_total: format_amount(&item.line_total(), currency),
                shaded: index % 2 == 1,
            })
            .collect();

        let carriage_label = if document.carriage < BigDecimal::from(0) {
            "Discount"
        } else {
            "Carriage"
        };
        let totals_rows = vec![
            TotalsRow {
                label: "Sub-Total".to_string(),
                value: format_amount(&totals.subtotal, currency),
                emphasized: false,
            },
            TotalsRow {
                label: "Taxable amount".to_string(),
                value: format_amount(&totals.taxable_subtotal, currency),
                emphasized: false,
            },
            TotalsRow {
                label: "Tax Rate".to_string(),
                value: format!("{}%", plain_number(&document.tax_rate_percent)),
                emphasized: false,
            },
            TotalsRow {
                label: "Tax Due".to_string(),
                value: format_amount(&totals.tax, currency),
                emphasized: false,
            },
            TotalsRow {
                label: carriage_label.to_string(),
                value: format_amount(&document.carriage, currency),
                emphasized: false,
            },
            TotalsRow {
                label: "Grand Total".to_string(),
                value: format_amount(&totals.grand_total, currency),
                emphasized: true,
            },
        ];

        PageModel {
            company_name: document.company.name.clone(),
            company_address_lines: document.company.address_lines.clone(),
            company_contact_lines,
            meta_rows,
            customer_name: document.customer.name.clone(),
            customer_company: document.customer.company.clone(),
            customer_address_lines: document.customer.address_lines.clone(),
            customer_contact_lines: contact_lines(
                &document.customer.email,
                &document.customer.phone,
            ),
            rows,
            totals_rows,
            terms: document.terms.clone(),
            acceptance_note: document.acceptance_note.clone(),
            footer_note: document.footer_note.clone(),
            contact_email: document.contact_email.clone(),
        }
    }
}

fn template_env() -> Result<minijinja::Environment<'static>, minijinja::Error> {
    let mut env = minijinja::Environment::new();
    env.add_template(TEMPLATE_NAME, TEMPLATE_SOURCE)?;
    Ok(env)
}

/// Render a document and its computed totals to the printable HTML page.
pub fn render(document: &QuotationDocument, totals: &Totals) -> Result<String, Error> {
    let page = PageModel::build(document, totals);
    let env = template_env()
        .map_err(Error::from)
        .add_context("setting up templating environment")?;
    let template = env
        .get_template(TEMPLATE_NAME)
        .map_err(Error::from)
        .add_context("loading quotation template")?;
    template
        .render(context! { page => page })
        .map_err(Error::from)
        .add_context("rendering quotation page")
}
