use l2_order_book::{
    count_accepted, BookRegistry, Decimal, Delta, InstrumentId, LimitsStore, Order, OrderBook,
    OrderSide, Position, PriceLevel, RejectReason, RiskConfig, RiskDecision, RiskGate, RiskLimits,
    Side,
};
use rstest::rstest;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn scenario_limits() -> RiskLimits {
    RiskLimits::new(dec!(10), dec!(100), dec!(1), dec!(50), dec!(20))
}

#[test]
/// Walk the bid side through insert-above, insert-below and delete-top.
fn test_top_of_book_change_workflow() {
    let mut order_book = OrderBook::new("BTCUSDT");

    // Empty side, first level becomes the top
    let change = order_book
        .apply(Delta::upsert(Side::Bid, dec!(100.00), dec!(5)))
        .unwrap();
    assert!(change.changed, "First level should change the top");
    assert_eq!(
        order_book.best(Side::Bid),
        Some(PriceLevel::new(dec!(100.00), dec!(5)))
    );

    // A worse bid leaves the top alone
    let change = order_book
        .apply(Delta::upsert(Side::Bid, dec!(99.00), dec!(3)))
        .unwrap();
    assert!(!change.changed, "Lower bid should not change the top");
    assert_eq!(
        order_book.best(Side::Bid),
        Some(PriceLevel::new(dec!(100.00), dec!(5)))
    );

    // Removing the top promotes the next level
    let change = order_book
        .apply(Delta::delete(Side::Bid, dec!(100.00)))
        .unwrap();
    assert!(change.changed, "Deleting the top should change it");
    assert_eq!(change.new_best(), Some(PriceLevel::new(dec!(99.00), dec!(3))));
    assert_eq!(
        order_book.best(Side::Bid),
        Some(PriceLevel::new(dec!(99.00), dec!(3)))
    );
}

#[test]
/// Deleting a level that is not there is tolerated and reports no change.
fn test_delete_of_absent_level_is_noop() {
    let mut order_book = OrderBook::new("BTCUSDT");
    order_book
        .apply(Delta::upsert(Side::Ask, dec!(101), dec!(2)))
        .unwrap();
    let before = order_book.depth(Side::Ask, usize::MAX);

    let change = order_book
        .apply(Delta::delete(Side::Ask, dec!(105)))
        .unwrap();

    assert!(!change.changed);
    assert_eq!(change.new_best_price, Some(dec!(101)));
    assert_eq!(order_book.depth(Side::Ask, usize::MAX), before);
}

#[test]
/// An upsert with zero quantity behaves like a delete.
fn test_zero_quantity_upsert_equals_delete() {
    let seed = [
        Delta::upsert(Side::Ask, dec!(101), dec!(2)),
        Delta::upsert(Side::Ask, dec!(102), dec!(4)),
    ];

    let mut via_upsert = OrderBook::new("X");
    let mut via_delete = OrderBook::new("X");
    via_upsert.apply_all(seed).unwrap();
    via_delete.apply_all(seed).unwrap();

    let upsert_change = via_upsert
        .apply(Delta::upsert(Side::Ask, dec!(101), dec!(0)))
        .unwrap();
    let delete_change = via_delete
        .apply(Delta::delete(Side::Ask, dec!(101)))
        .unwrap();

    assert_eq!(upsert_change, delete_change);
    assert_eq!(
        via_upsert.depth(Side::Ask, usize::MAX),
        via_delete.depth(Side::Ask, usize::MAX)
    );
}

#[test]
/// Depth is best-first on both sides and truncated to the requested size.
fn test_depth_ordering_and_truncation() {
    let mut order_book = OrderBook::new("BTCUSDT");
    for (price, quantity) in [(dec!(99.5), dec!(1)), (dec!(99.7), dec!(2)), (dec!(99.6), dec!(3))] {
        order_book
            .apply(Delta::upsert(Side::Bid, price, quantity))
            .unwrap();
    }
    for (price, quantity) in [(dec!(100.3), dec!(1)), (dec!(100.1), dec!(2))] {
        order_book
            .apply(Delta::upsert(Side::Ask, price, quantity))
            .unwrap();
    }

    assert_eq!(
        order_book.depth(Side::Bid, 2),
        vec![
            PriceLevel::new(dec!(99.7), dec!(2)),
            PriceLevel::new(dec!(99.6), dec!(3)),
        ]
    );
    assert_eq!(
        order_book.depth(Side::Ask, 10),
        vec![
            PriceLevel::new(dec!(100.1), dec!(2)),
            PriceLevel::new(dec!(100.3), dec!(1)),
        ]
    );
    assert!(order_book.depth(Side::Ask, 0).is_empty());

    // The snapshot is detached from later updates
    let snapshot = order_book.depth(Side::Bid, 3);
    order_book
        .apply(Delta::delete(Side::Bid, dec!(99.7)))
        .unwrap();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(order_book.depth(Side::Bid, 3).len(), 2);
}

#[test]
/// Prices that differ only in scale address the same level.
fn test_decimal_precision() {
    let mut order_book = OrderBook::new("BTCUSDT");
    let levels = [
        (dec!(100.00), dec!(1)),
        (dec!(100.01), dec!(2)),
        (dec!(99.99), dec!(3)),
    ];
    for (price, quantity) in levels {
        order_book
            .apply(Delta::upsert(Side::Bid, price, quantity))
            .unwrap();
    }
    assert_eq!(order_book.best(Side::Bid).map(|l| l.price), Some(dec!(100.01)));

    order_book
        .apply(Delta::upsert(Side::Bid, dec!(100), dec!(7)))
        .unwrap();
    assert_eq!(order_book.level_count(Side::Bid), 3);
    assert_eq!(order_book.quantity_at(Side::Bid, dec!(100.000)), Some(dec!(7)));
}

#[test]
/// Crossing updates stay applied and are reported through the registry.
fn test_crossed_book_is_surfaced_not_corrected() {
    let mut registry = BookRegistry::new();
    let id = InstrumentId::new("BTCUSDT");
    registry.subscribe(id.clone()).unwrap();

    registry
        .apply(&id, Delta::upsert(Side::Ask, dec!(100), dec!(1)))
        .unwrap();
    let change = registry
        .apply(&id, Delta::upsert(Side::Bid, dec!(101), dec!(1)))
        .unwrap();

    let warning = change.crossed.expect("book should be reported crossed");
    assert_eq!(warning.best_bid, dec!(101));
    assert_eq!(warning.best_ask, dec!(100));

    let book = registry.book(&id).unwrap();
    assert_eq!(book.best(Side::Bid).map(|l| l.price), Some(dec!(101)));
    assert_eq!(book.spread(), Some(dec!(-1)));

    // Lifting the offending ask uncrosses the book
    let change = registry
        .apply(&id, Delta::delete(Side::Ask, dec!(100)))
        .unwrap();
    assert!(change.crossed.is_none());
}

#[test]
/// Snapshot followed by incremental deltas, the usual feed start-up sequence.
fn test_snapshot_then_deltas() {
    let mut registry = BookRegistry::new();
    let id = InstrumentId::new("BTCUSDT");
    registry.subscribe(id.clone()).unwrap();

    let bids: Vec<_> = (1..=20)
        .map(|i| PriceLevel::new(dec!(20000) - Decimal::from(i), Decimal::from(i)))
        .collect();
    let asks: Vec<_> = (1..=20)
        .map(|i| PriceLevel::new(dec!(20000) + Decimal::from(i), Decimal::from(i)))
        .collect();

    let crossed = registry.load_snapshot(&id, &bids, &asks).unwrap();
    assert!(crossed.is_none());

    let book = registry.book(&id).unwrap();
    assert_eq!(book.level_count(Side::Bid), 20);
    assert_eq!(book.best(Side::Ask), Some(PriceLevel::new(dec!(20001), dec!(1))));
    assert_eq!(book.mid_price(), Some(dec!(20000)));

    let change = registry
        .apply(&id, Delta::upsert(Side::Ask, dec!(20000.5), dec!(0.25)))
        .unwrap();
    assert!(change.changed);
    assert_eq!(change.side, Side::Ask);
    assert_eq!(registry.book(&id).map(|b| b.update_id()), Some(2));
}

#[test]
/// Position limit breach: 15 + 10 = 25 > 20.
fn test_position_limit_scenario() {
    let order = Order::new("BTCUSDT", OrderSide::Buy, dec!(50), dec!(10));
    let position = Position::new("BTCUSDT", dec!(15));

    assert_eq!(
        RiskGate::new().validate(&order, &position, &scenario_limits()),
        RiskDecision::Reject(RejectReason::PositionLimitExceeded)
    );
}

#[rstest]
#[case::price_and_quantity_both_bad(dec!(5), dec!(1000), RejectReason::PriceOutOfBounds)]
#[case::price_above_max(dec!(100.01), dec!(10), RejectReason::PriceOutOfBounds)]
#[case::quantity_below_min(dec!(50), dec!(0.5), RejectReason::QuantityOutOfBounds)]
#[case::quantity_above_max(dec!(50), dec!(51), RejectReason::QuantityOutOfBounds)]
#[case::quantity_and_position_both_bad(dec!(50), dec!(60), RejectReason::QuantityOutOfBounds)]
fn test_rejection_order(
    #[case] price: Decimal,
    #[case] quantity: Decimal,
    #[case] expected: RejectReason,
) {
    let order = Order::new("BTCUSDT", OrderSide::Buy, price, quantity);
    let position = Position::new("BTCUSDT", dec!(15));

    assert_eq!(
        RiskGate::new().validate(&order, &position, &scenario_limits()),
        RiskDecision::Reject(expected)
    );
}

#[test]
/// Validation is deterministic and leaves its inputs untouched.
fn test_validate_is_pure() {
    let gate = RiskGate::new();
    let order = Order::new("BTCUSDT", OrderSide::Sell, dec!(42), dec!(7));
    let position = Position::new("BTCUSDT", dec!(-10));
    let limits = scenario_limits();

    let first = gate.validate(&order, &position, &limits);
    let second = gate.validate(&order, &position, &limits);

    assert_eq!(first, second);
    assert_eq!(first, RiskDecision::Accept);
    assert_eq!(position, Position::new("BTCUSDT", dec!(-10)));
    assert_eq!(limits, scenario_limits());
}

#[test]
/// Every order in a batch sees the same position snapshot.
fn test_batch_uses_fixed_snapshot() {
    let gate = RiskGate::new();
    let position = Position::new("BTCUSDT", dec!(15));
    let orders: Vec<_> = (0..4)
        .map(|_| Order::new("BTCUSDT", OrderSide::Buy, dec!(50), dec!(5)))
        .collect();

    let results = gate.validate_batch(&orders, &position, &scenario_limits());

    // Accumulating would reject everything after the first order
    assert_eq!(results.len(), orders.len());
    assert!(results.iter().all(|(_, decision)| decision.is_accept()));
    assert_eq!(count_accepted(&results), 4);
    for ((echoed, _), original) in results.iter().zip(&orders) {
        assert_eq!(echoed, original);
    }
}

#[test]
/// Orders are checked against store limits and unknown instruments fail closed.
fn test_gate_with_limits_store() {
    let config = RiskConfig::from_toml_str(
        r#"
        [instruments.BTCUSDT]
        min_price = "10"
        max_price = "100"
        min_quantity = "1"
        max_quantity = "50"
        max_position_size = "20"
        "#,
    )
    .unwrap();
    let store = LimitsStore::from_config(config);
    let gate = RiskGate::new();

    let order = Order::new("BTCUSDT", OrderSide::Buy, dec!(50), dec!(10));
    assert_eq!(
        gate.check(&order, &Position::flat("BTCUSDT"), &store),
        RiskDecision::Accept
    );

    let unknown = Order::new("DOGEUSDT", OrderSide::Buy, dec!(50), dec!(10));
    assert_eq!(
        gate.check(&unknown, &Position::flat("DOGEUSDT"), &store),
        RiskDecision::Reject(RejectReason::NoLimits)
    );
}

#[test]
/// Many threads validate against a shared store while it is being reloaded.
fn test_concurrent_validation_smoke_test() {
    use std::thread;

    let store = Arc::new(LimitsStore::new());
    store.set(InstrumentId::new("BTCUSDT"), scenario_limits());
    let gate = RiskGate::new();

    let mut thread_handles = vec![];
    for thread_id in 0..4 {
        let store_clone = Arc::clone(&store);
        thread_handles.push(thread::spawn(move || {
            let mut position = Position::flat("BTCUSDT");
            let mut accepted = 0;
            for order_index in 0..1000 {
                let side = if (thread_id + order_index) % 2 == 0 {
                    OrderSide::Buy
                } else {
                    OrderSide::Sell
                };
                let order = Order::new("BTCUSDT", side, dec!(50), dec!(1));
                if gate.check(&order, &position, &store_clone).is_accept() {
                    position.apply_fill(order.side, order.quantity);
                    accepted += 1;
                }
            }
            accepted
        }));
    }

    // Writer reloading the same limits repeatedly
    for _ in 0..100 {
        store.set(InstrumentId::new("BTCUSDT"), scenario_limits());
    }

    for handle in thread_handles {
        let accepted = handle.join().unwrap();
        assert_eq!(accepted, 1000, "Alternating unit orders never breach the limit");
    }
}
