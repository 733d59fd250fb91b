//! Pure money and tax arithmetic over line items.
//!
//! Totals are never stored on the document; they are recomputed here at
//! render and export time so no derived figure can drift from its inputs.
//! All arithmetic is [`BigDecimal`], so grouping and rounding happen only at
//! display time.

use bigdecimal::BigDecimal;

use crate::quotation::LineItem;

/// Computed totals for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub subtotal: BigDecimal,
    pub taxable_subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub grand_total: BigDecimal,
}

/// Sum of `quantity * unit_price` over all items. Negative quantities and
/// prices flow through unvalidated; credit lines are legitimate.
pub fn subtotal(items: &[LineItem]) -> BigDecimal {
    items.iter().map(LineItem::line_total).sum()
}

/// Sum restricted to items whose derived taxability is true.
pub fn taxable_subtotal(items: &[LineItem]) -> BigDecimal {
    items
        .iter()
        .filter(|item| item.is_taxed())
        .map(LineItem::line_total)
        .sum()
}

/// Compute all totals: `tax = taxable_subtotal * rate / 100` and
/// `grand_total = subtotal + tax + carriage`.
pub fn totals(items: &[LineItem], tax_rate_percent: &BigDecimal, carriage: &BigDecimal) -> Totals {
    let subtotal = subtotal(items);
    let taxable_subtotal = taxable_subtotal(items);
    let tax = &taxable_subtotal * tax_rate_percent / BigDecimal::from(100);
    let grand_total = &subtotal + &tax + carriage;
    Totals {
        subtotal,
        taxable_subtotal,
        tax,
        grand_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quotation::LineItemBuilder;
    use std::str::FromStr;

    fn item(quantity: i32, unit_price: i32, taxed: bool) -> LineItem {
        LineItemBuilder::default()
            .label("part")
            .description("a part")
            .quantity(BigDecimal::from(quantity))
            .unit_price(BigDecimal::from(unit_price))
            .taxed(taxed)
            .build()
            .unwrap()
    }

    // qty 2 @ 120 taxed, qty 3 @ 35 untaxed, 20% tax, no carriage.
    #[test]
    fn two_item_quote_with_mixed_taxability() {
        let items = vec![item(2, 120, true), item(3, 35, false)];
        let t = totals(&items, &BigDecimal::from(20), &BigDecimal::from(0));
        assert_eq!(t.subtotal, BigDecimal::from(345));
        assert_eq!(t.taxable_subtotal, BigDecimal::from(240));
        assert_eq!(t.tax, BigDecimal::from(48));
        assert_eq!(t.grand_total, BigDecimal::from(393));
    }

    #[test]
    fn negative_carriage_reduces_grand_total() {
        let items = vec![item(2, 120, true), item(3, 35, false)];
        let t = totals(&items, &BigDecimal::from(20), &BigDecimal::from(-20));
        assert_eq!(t.grand_total, BigDecimal::from(373));
    }

    #[test]
    fn empty_items_yield_zero_totals_plus_carriage() {
        let carriage = BigDecimal::from(15);
        let t = totals(&[], &BigDecimal::from(20), &carriage);
        assert_eq!(t.subtotal, BigDecimal::from(0));
        assert_eq!(t.taxable_subtotal, BigDecimal::from(0));
        assert_eq!(t.tax, BigDecimal::from(0));
        assert_eq!(t.grand_total, carriage);
    }

    #[test]
    fn taxable_subtotal_never_exceeds_subtotal_for_non_negative_items() {
        let items = vec![item(1, 10, true), item(4, 25, false), item(2, 7, true)];
        assert!(subtotal(&items) >= taxable_subtotal(&items));
    }

    #[test]
    fn negative_quantities_and_prices_flow_through() {
        let items = vec![item(-1, 100, true), item(2, -50, false)];
        let t = totals(&items, &BigDecimal::from(10), &BigDecimal::from(0));
        assert_eq!(t.subtotal, BigDecimal::from(-200));
        assert_eq!(t.taxable_subtotal, BigDecimal::from(-100));
        assert_eq!(t.tax, BigDecimal::from(-10));
        assert_eq!(t.grand_total, BigDecimal::from(-210));
    }

    #[test]
    fn fractional_rates_stay_exact() {
        let items = vec![item(1, 100, true)];
        let t = totals(
            &items,
            &BigDecimal::from_str("12.5").unwrap(),
            &BigDecimal::from(0),
        );
        assert_eq!(t.tax, BigDecimal::from_str("12.5").unwrap());
    }

    #[test]
    fn totals_are_idempotent() {
        let items = vec![item(2, 120, true), item(3, 35, false)];
        let rate = BigDecimal::from(20);
        let carriage = BigDecimal::from(-20);
        assert_eq!(
            totals(&items, &rate, &carriage),
            totals(&items, &rate, &carriage)
        );
    }
}
