//! Boundary mapping between wire-level JSON and the canonical document shape.
//!
//! The export endpoint historically accepted two naming schemes for the same
//! payload: full camelCase field names and short aliases that keep tokens and
//! hand-written requests compact. The canonical internal representation uses
//! full names only; alias rewriting happens here, once, before typed
//! deserialization. When both an alias and its full name are present for the
//! same logical field, the full name wins and the alias is dropped.

use serde_json::{Map, Value};

/// `(alias, full name)` pairs for the top-level document object.
const DOCUMENT_ALIASES: &[(&str, &str)] = &[
    ("co", "company"),
    ("cu", "customer"),
    ("mt", "meta"),
    ("it", "items"),
    ("tr", "taxRatePercent"),
    ("cg", "carriage"),
    ("cur", "currency"),
    ("tm", "terms"),
    ("an", "acceptanceNote"),
    ("fn", "footerNote"),
    ("ce", "contactEmail"),
];

const COMPANY_ALIASES: &[(&str, &str)] = &[
    ("n", "name"),
    ("a", "addressLines"),
    ("e", "email"),
    ("p", "phone"),
    ("vat", "taxRegistrationId"),
];

const META_ALIASES: &[(&str, &str)] = &[
    ("ar", "accountRefNo"),
    ("con", "customerOrderNo"),
    ("qn", "quotationNumber"),
    ("qd", "quotationDate"),
    ("vu", "validUntil"),
];

const CUSTOMER_ALIASES: &[(&str, &str)] = &[
    ("n", "name"),
    ("co", "company"),
    ("a", "addressLines"),
    ("e", "email"),
    ("p", "phone"),
];

const ITEM_ALIASES: &[(&str, &str)] = &[
    ("l", "label"),
    ("c", "code"),
    ("d", "description"),
    ("q", "quantity"),
    ("up", "unitPrice"),
    ("t", "taxed"),
    ("x", "taxMarker"),
];

fn apply(obj: &mut Map<String, Value>, table: &[(&str, &str)]) {
    for (alias, full) in table {
        if let Some(value) = obj.remove(*alias) {
            // Full name wins when both are present.
            obj.entry(full.to_string()).or_insert(value);
        }
    }
}

/// Rewrite known short aliases to full field names, in place.
///
/// Non-object values pass through untouched; the caller decides whether a
/// non-object body is an error.
pub fn normalize_aliases(value: &mut Value) {
    let Some(body) = value.as_object_mut() else {
        return;
    };
    apply(body, DOCUMENT_ALIASES);

    if let Some(company) = body.get_mut("company").and_then(Value::as_object_mut) {
        apply(company, COMPANY_ALIASES);
    }
    if let Some(meta) = body.get_mut("meta").and_then(Value::as_object_mut) {
        apply(meta, META_ALIASES);
    }
    if let Some(customer) = body.get_mut("customer").and_then(Value::as_object_mut) {
        apply(customer, CUSTOMER_ALIASES);
    }
    if let Some(items) = body.get_mut("items").and_then(Value::as_array_mut) {
        for item in items {
            if let Some(item) = item.as_object_mut() {
                apply(item, ITEM_ALIASES);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn aliases_rewrite_to_full_names() {
        let mut body = json!({
            "cu": {"n": "Jane", "a": ["1 Dock Rd"]},
            "mt": {"qn": "Q-1", "ar": "ACC-9"},
            "it": [{"l": "Pump", "q": 2, "up": 120, "x": "X"}],
            "tr": 20,
            "cg": -20,
        });
        normalize_aliases(&mut body);
        assert_eq!(body["customer"]["name"], "Jane");
        assert_eq!(body["meta"]["quotationNumber"], "Q-1");
        assert_eq!(body["meta"]["accountRefNo"], "ACC-9");
        assert_eq!(body["items"][0]["label"], "Pump");
        assert_eq!(body["items"][0]["taxMarker"], "X");
        assert_eq!(body["taxRatePercent"], 20);
        assert_eq!(body["carriage"], -20);
        assert!(body.get("cu").is_none());
        assert!(body.get("it").is_none());
    }

    #[test]
    fn full_name_wins_when_both_present() {
        let mut body = json!({
            "currency": "GBP",
            "cur": "USD",
            "it": [{"quantity": 5, "q": 1}],
        });
        normalize_aliases(&mut body);
        assert_eq!(body["currency"], "GBP");
        assert_eq!(body["items"][0]["quantity"], 5);
        assert!(body.get("cur").is_none());
    }

    #[test]
    fn non_objects_pass_through() {
        let mut body = json!([1, 2, 3]);
        normalize_aliases(&mut body);
        assert_eq!(body, json!([1, 2, 3]));
    }
}
