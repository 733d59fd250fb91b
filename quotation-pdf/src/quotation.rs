//! Quotation domain types and serialization helpers.
//!
//! This module defines the structures representing a quotation document:
//! issuing company, quote metadata, customer, and line items. Monetary
//! fields use [`BigDecimal`] with custom serde helpers that serialize as
//! strings but accept either JSON numbers or strings on input, so existing
//! callers sending plain numbers keep working. Builders are derived for
//! constructing instances.

use bigdecimal::BigDecimal;
use derive_builder::Builder;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Currency applied when a document does not carry one.
pub const DEFAULT_CURRENCY: &str = "EUR";

fn serialize_decimal<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => {
            BigDecimal::from_str(s.trim()).map_err(serde::de::Error::custom)
        }
        serde_json::Value::Number(n) => {
            BigDecimal::from_str(&n.to_string()).map_err(serde::de::Error::custom)
        }
        other => Err(serde::de::Error::custom(format!(
            "expected a number or numeric string, got {other}"
        ))),
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// The issuing company shown in the header block.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub name: String,
    pub address_lines: Vec<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_registration_id: Option<String>,
}

/// Quote metadata shown in the right-aligned panel of the header.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteMeta {
    pub account_ref_no: Option<String>,
    pub customer_order_no: Option<String>,
    /// Unique reference for the quote. Must be resolved before PDF export;
    /// the exporter synthesizes one when the caller supplies none.
    pub quotation_number: String,
    pub quotation_date: Option<String>,
    pub valid_until: Option<String>,
}

/// The customer the quote is addressed to, boxed separately from the company.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    pub name: String,
    pub company: Option<String>,
    pub address_lines: Vec<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A single quotation row: quantity, unit price, and a derived taxability
/// flag sourced from either an explicit boolean or a one-character marker.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    pub label: String,
    pub code: Option<String>,
    pub description: String,
    #[serde(
        serialize_with = "serialize_decimal",
        deserialize_with = "deserialize_decimal"
    )]
    pub quantity: BigDecimal,
    #[serde(
        serialize_with = "serialize_decimal",
        deserialize_with = "deserialize_decimal"
    )]
    pub unit_price: BigDecimal,
    /// Explicit taxability flag. Takes precedence over [`LineItem::tax_marker`].
    pub taxed: Option<bool>,
    /// Legacy one-character marker; the item is taxed when this equals "X"
    /// case-insensitively.
    pub tax_marker: Option<String>,
}

/// The central entity: immutable input to rendering and export.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(strip_option, into), pattern = "owned", default)]
#[serde(rename_all = "camelCase", default)]
pub struct QuotationDocument {
    pub company: Company,
    pub meta: QuoteMeta,
    pub customer: Customer,
    /// Display order is insertion order, preserved end-to-end.
    pub items: Vec<LineItem>,
    #[serde(
        serialize_with = "serialize_decimal",
        deserialize_with = "deserialize_decimal"
    )]
    pub tax_rate_percent: BigDecimal,
    /// Signed adjustment: displayed as "Carriage" when non-negative and
    /// "Discount" when negative. The value itself is never negated.
    #[serde(
        serialize_with = "serialize_decimal",
        deserialize_with = "deserialize_decimal"
    )]
    pub carriage: BigDecimal,
    #[serde(default = "default_currency")]
    #[builder(default = "default_currency()")]
    pub currency: String,
    pub terms: Vec<String>,
    pub acceptance_note: Option<String>,
    pub footer_note: Option<String>,
    pub contact_email: Option<String>,
}

impl LineItem {
    /// Derived taxability, recomputed on every call and never stored back.
    /// The explicit `taxed` flag wins; otherwise the marker must equal "X"
    /// case-insensitively.
    pub fn is_taxed(&self) -> bool {
        match self.taxed {
            Some(flag) => flag,
            None => self
                .tax_marker
                .as_deref()
                .map(|m| m.trim().eq_ignore_ascii_case("x"))
                .unwrap_or(false),
        }
    }

    /// Effective line total, always `quantity * unit_price`.
    pub fn line_total(&self) -> BigDecimal {
        &self.quantity * &self.unit_price
    }
}

impl QuotationDocumentBuilder {
    /// Append a [`LineItem`] to the builder's internal list.
    pub fn add_item(self, item: LineItem) -> Self {
        match self.items {
            Some(mut items) => {
                items.push(item);
                Self {
                    items: Some(items),
                    ..self
                }
            }
            None => Self {
                items: Some(vec![item]),
                ..self
            },
        }
    }
}
