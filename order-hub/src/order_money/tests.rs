use super::*;
use shared::order::{ItemStage, LineItemStatus};

fn line(key: &str, price: f64, quantity: u32) -> LineItem {
    LineItem {
        line_key: key.to_string(),
        menu_item_id: 1,
        name: "Item".to_string(),
        station: "kitchen".to_string(),
        price,
        quantity,
        status: LineItemStatus::Live(ItemStage::Opened),
        ticket_id: None,
        added_at: 0,
        updated_at: 0,
    }
}

fn order_with_rates(tax_rate: f64, service_rate: f64) -> OrderAggregate {
    let mut order = OrderAggregate::new("o-1".to_string());
    order.tax_rate = tax_rate;
    order.service_rate = service_rate;
    order
}

#[test]
fn test_to_decimal_precision() {
    // Classic floating point problem: 0.1 + 0.2 != 0.3
    let a = 0.1_f64;
    let b = 0.2_f64;
    assert_ne!(a + b, 0.3);

    let sum_dec = to_decimal(a) + to_decimal(b);
    assert_eq!(to_f64(sum_dec), 0.3);
}

#[test]
fn test_accumulation_precision() {
    let mut total = Decimal::ZERO;
    for _ in 0..1000 {
        total += to_decimal(0.01);
    }
    assert_eq!(to_f64(total), 10.0);
}

#[test]
fn test_non_finite_becomes_zero() {
    assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
}

#[test]
fn test_rounding_is_half_away_from_zero() {
    assert_eq!(to_f64(Decimal::new(1005, 3)), 1.01);
    assert_eq!(to_f64(Decimal::new(-1005, 3)), -1.01);
}

#[test]
fn test_line_total() {
    assert_eq!(to_f64(line_total(&line("a", 10.99, 3))), 32.97);
}

#[test]
fn test_totals_with_tax_and_service() {
    let mut order = order_with_rates(10.0, 5.0);
    order.items.push(line("a1", 9.50, 1));
    order.items.push(line("a2", 4.25, 2));
    recalculate_totals(&mut order);

    assert_eq!(order.totals.net, 18.0);
    assert_eq!(order.totals.tax, 1.8);
    assert_eq!(order.totals.service, 0.9);
    assert_eq!(order.totals.tip, 0.0);
    assert_eq!(order.totals.gross, 20.7);
}

#[test]
fn test_removed_lines_do_not_count() {
    let mut order = order_with_rates(10.0, 0.0);
    order.items.push(line("a1", 9.50, 1));
    order.items.push(line("a2", 20.0, 1));
    order.item_mut("a2").unwrap().remove(1);
    recalculate_totals(&mut order);

    assert_eq!(order.totals.net, 9.5);
    assert_eq!(order.totals.tax, 0.95);
    assert_eq!(order.totals.gross, 10.45);
}

#[test]
fn test_tax_rounding() {
    // 3.33 * 7% = 0.2331 -> 0.23
    let mut order = order_with_rates(7.0, 0.0);
    order.items.push(line("a1", 3.33, 1));
    recalculate_totals(&mut order);
    assert_eq!(order.totals.tax, 0.23);
    assert_eq!(order.totals.gross, 3.56);
}

#[test]
fn test_frozen_totals_only_follow_tip() {
    let mut order = order_with_rates(10.0, 0.0);
    order.items.push(line("a1", 10.0, 1));
    recalculate_totals(&mut order);
    order.totals_frozen = true;

    order.items.push(line("a2", 50.0, 1));
    add_tip(&mut order, 2.5);

    assert_eq!(order.totals.net, 10.0);
    assert_eq!(order.totals.tax, 1.0);
    assert_eq!(order.totals.tip, 2.5);
    assert_eq!(order.totals.gross, 13.5);
}

#[test]
fn test_tip_accumulates() {
    let mut order = order_with_rates(0.0, 0.0);
    order.items.push(line("a1", 10.0, 1));
    add_tip(&mut order, 0.1);
    add_tip(&mut order, 0.2);
    assert_eq!(order.totals.tip, 0.3);
    assert_eq!(order.totals.gross, 10.3);
}

#[test]
fn test_validate_quantity() {
    assert!(validate_quantity(1).is_ok());
    assert!(validate_quantity(MAX_QUANTITY).is_ok());
    assert!(validate_quantity(0).is_err());
    assert!(validate_quantity(MAX_QUANTITY + 1).is_err());
}

#[test]
fn test_validate_price() {
    assert!(validate_price(0.0).is_ok());
    assert!(validate_price(9.5).is_ok());
    assert!(validate_price(-1.0).is_err());
    assert!(validate_price(f64::NAN).is_err());
    assert!(validate_price(MAX_PRICE + 1.0).is_err());
}

#[test]
fn test_validate_tip() {
    assert!(validate_tip(5.0).is_ok());
    assert!(validate_tip(0.0).is_ok());
    assert!(validate_tip(-2.0).is_err());
    assert!(validate_tip(f64::INFINITY).is_err());
    assert!(validate_tip(MAX_TIP + 1.0).is_err());
}
