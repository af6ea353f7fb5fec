//! Integration tests for the trade-up engine.
//!
//! These tests drive the public API end to end: generation under each
//! strategy, the amortization surface, caching, and the boundary cases
//! around infeasible inputs.

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use tradeup_engine::{
    amortization_table, config_hash, CancelToken, Customer, EngineConfig, EngineError, FeeSet,
    InventoryItem, LoanTerms, OfferSet, RiskTables, SearchStrategyKind, TradeUpEngine,
};

/// The baseline customer from the product scenarios.
fn baseline_customer() -> Customer {
    Customer {
        customer_id: "CUST-BASE".to_string(),
        current_monthly_payment: dec!(5000),
        vehicle_equity: dec!(30000),
        outstanding_balance: dec!(70000),
        current_car_price: dec!(100000),
        risk_profile_name: "A".to_string(),
        risk_profile_index: 2,
    }
}

fn car(car_id: i64, price: Decimal) -> InventoryItem {
    InventoryItem {
        car_id,
        model: format!("Model {car_id}"),
        sales_price: price,
        region: None,
        kilometers: None,
        color: None,
        has_promotion: false,
    }
}

fn engine() -> TradeUpEngine {
    TradeUpEngine::new(RiskTables::builtin())
}

fn generate(engine: &TradeUpEngine, config: &EngineConfig) -> OfferSet {
    engine
        .generate(
            &baseline_customer(),
            &[car(1, dec!(150000))],
            config,
            &CancelToken::new(),
        )
        .expect("generation succeeds")
}

#[test]
fn test_baseline_hierarchical_feasibility() {
    let result = generate(&engine(), &EngineConfig::default());

    assert!(result.summary.total_offers >= 1, "expected at least one offer");

    for offer in result.iter_offers() {
        // Accounting identity: the financed total plus the applied equity
        // covers the car price and every financed fee. GPS stays out.
        assert_eq!(
            offer.loan_amount + offer.effective_equity,
            offer.new_car_price
                + offer.service_fee_amount
                + offer.kavak_total_amount
                + offer.insurance_amount
        );
        // Phase 1 of the ladder won: no subsidy was spent.
        assert_eq!(offer.fees_applied.cac_bonus, Decimal::ZERO);
        assert!(offer.npv >= dec!(5000));
    }
}

#[test]
fn test_gps_is_deducted_from_equity_never_financed() {
    let mut config = EngineConfig::default();
    config.strategy = SearchStrategyKind::Custom;
    config.include_kavak_total = false;
    config.fees = FeeSet {
        service_fee_pct: Decimal::ZERO,
        insurance_amount: Some(Decimal::ZERO),
        ..FeeSet::default()
    };

    let result = generate(&engine(), &config);
    let offer = result
        .iter_offers()
        .find(|offer| offer.term_months == 36)
        .expect("a 36-month offer");

    let gps_install_with_tax = dec!(750) * dec!(1.16);
    assert_eq!(offer.gps_install_fee, gps_install_with_tax);
    // With no financed fees the loan plus equity is exactly the price; the
    // GPS installation shows up only as an equity deduction.
    assert_eq!(offer.loan_amount + offer.effective_equity, dec!(150000));
    assert_eq!(
        offer.effective_equity,
        dec!(30000) + offer.fees_applied.cac_bonus - offer.cxa_amount - gps_install_with_tax
    );
    assert_eq!(offer.kavak_total_amount, Decimal::ZERO);
    assert_eq!(offer.insurance_amount, Decimal::ZERO);
}

#[test]
fn test_range_validation_rejected_at_the_api() {
    let mut config = EngineConfig::default();
    config.strategy = SearchStrategyKind::Range;
    config.range.service_fee_step = Decimal::ZERO;
    let result = engine().generate(
        &baseline_customer(),
        &[car(1, dec!(150000))],
        &config,
        &CancelToken::new(),
    );
    assert!(matches!(result, Err(EngineError::InvalidRange { .. })));

    let mut reversed = EngineConfig::default();
    reversed.strategy = SearchStrategyKind::Range;
    reversed.range.service_fee_range = (dec!(5), dec!(0));
    let result = engine().generate(
        &baseline_customer(),
        &[car(1, dec!(150000))],
        &reversed,
        &CancelToken::new(),
    );
    assert!(matches!(result, Err(EngineError::InvalidRange { .. })));
}

fn small_range_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.strategy = SearchStrategyKind::Range;
    config.range.service_fee_range = (dec!(0), dec!(2));
    config.range.service_fee_step = dec!(1);
    config.range.cxa_range = (dec!(0), dec!(2));
    config.range.cxa_step = dec!(1);
    config.range.cac_bonus_range = (dec!(0), dec!(5000));
    config.range.cac_bonus_step = dec!(2500);
    config
}

#[test]
fn test_range_early_stop_counts_one_combination() {
    let mut config = small_range_config();
    config.range.early_stop_on_offers = 1;

    let result = generate(&engine(), &config);
    assert_eq!(result.summary.combinations_tested, Some(1));
    assert!(result.summary.total_offers >= 1);
}

#[test]
fn test_range_results_are_reproducible_across_engines() {
    let mut config = small_range_config();
    config.range.max_combinations_to_test = 10;
    config.range.early_stop_on_offers = 1_000_000;

    // Fresh engines so the comparison is about the sweep, not the cache.
    let first = generate(&engine(), &config);
    let second = generate(&engine(), &config);
    assert_eq!(first, second);
}

#[test]
fn test_range_offers_carry_parameters_and_respect_cap() {
    let mut config = small_range_config();
    config.range.max_offers_per_tier = 2;
    config.range.early_stop_on_offers = 1_000_000;

    let result = generate(&engine(), &config);
    for group in &result.offers_by_tier {
        assert!(group.offers.len() <= 2);
        for offer in &group.offers {
            assert!(offer.parameter_combination.is_some());
        }
    }
}

#[test]
fn test_amortization_table_scenario() {
    let rate = dec!(0.18);
    let loan = dec!(134332.46);
    let monthly =
        tradeup_engine::algorithms::level_payment(rate / dec!(12), 72, loan).unwrap();

    let table = amortization_table(&LoanTerms {
        loan_amount: loan,
        monthly_payment: monthly,
        term_months: 72,
        annual_rate: rate,
    })
    .expect("valid parameters");

    assert_eq!(table.len(), 72);
    assert_eq!(table[0].interest, (loan * rate / dec!(12)).round_dp(2));
    let last = table.last().unwrap();
    assert!(last.ending_balance.abs() <= dec!(0.01));
}

#[test]
fn test_amortization_table_rejects_invalid_offer_figures() {
    let result = amortization_table(&LoanTerms {
        loan_amount: dec!(0),
        monthly_payment: dec!(1000),
        term_months: 24,
        annual_rate: dec!(0.12),
    });
    assert!(matches!(result, Err(EngineError::InvalidLoanParams { .. })));
}

#[test]
fn test_empty_inventory_yields_empty_success() {
    let result = engine()
        .generate(
            &baseline_customer(),
            &[],
            &EngineConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();
    assert!(result.is_empty());
    assert!(!result.summary.cancelled);
}

#[test]
fn test_all_cars_cheaper_yields_empty_success() {
    let inventory = vec![car(1, dec!(90000)), car(2, dec!(100000))];
    let result = engine()
        .generate(
            &baseline_customer(),
            &inventory,
            &EngineConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_unreachable_npv_threshold_yields_empty_success() {
    let mut config = EngineConfig::default();
    config.min_npv_threshold = dec!(1000000000);
    let result = generate(&engine(), &config);
    assert!(result.is_empty());
}

#[test]
fn test_kavak_total_flag_lowers_every_matching_payment() {
    let with_kt = generate(&engine(), &EngineConfig::default());

    let mut config = EngineConfig::default();
    config.include_kavak_total = false;
    let without_kt = generate(&engine(), &config);

    assert!(without_kt
        .iter_offers()
        .all(|offer| offer.kavak_total_amount == Decimal::ZERO));

    let mut compared = 0;
    for offer in without_kt.iter_offers() {
        if let Some(paired) = with_kt
            .iter_offers()
            .find(|o| o.car_id == offer.car_id && o.term_months == offer.term_months)
        {
            assert!(offer.monthly_payment < paired.monthly_payment);
            compared += 1;
        }
    }
    assert!(compared > 0, "no comparable (car, term) pairs");
}

#[test]
fn test_tier_partition_is_exclusive_and_total() {
    let mut config = small_range_config();
    config.range.early_stop_on_offers = 1_000_000;
    let result = generate(&engine(), &config);

    let mut seen = std::collections::HashSet::new();
    for group in &result.offers_by_tier {
        for offer in &group.offers {
            assert_eq!(offer.tier, Some(group.tier));
            assert!(
                seen.insert((offer.car_id, offer.term_months)),
                "offer appeared in more than one place"
            );
            assert!(offer.npv_rank_within_tier.is_some());
        }
    }
}

#[test]
fn test_cache_serves_identical_results_within_ttl() {
    let engine = engine();
    let config = EngineConfig::default();
    let first = generate(&engine, &config);
    let second = generate(&engine, &config);

    assert_eq!(first, second);
    let payments_first: Vec<Decimal> =
        first.iter_offers().map(|o| o.monthly_payment).collect();
    let payments_second: Vec<Decimal> =
        second.iter_offers().map(|o| o.monthly_payment).collect();
    assert_eq!(payments_first, payments_second);
}

#[test]
fn test_config_hash_distinguishes_strategies() {
    let hierarchical = EngineConfig::default();
    let mut custom = EngineConfig::default();
    custom.strategy = SearchStrategyKind::Custom;

    let hash_h = config_hash(&hierarchical).unwrap();
    let hash_c = config_hash(&custom).unwrap();
    assert_ne!(hash_h, hash_c);

    // Same config re-parsed from its canonical form hashes identically.
    let canonical = tradeup_engine::canonical_config_json(&hierarchical).unwrap();
    let reparsed: EngineConfig = serde_json::from_str(&canonical).unwrap();
    assert_eq!(config_hash(&reparsed).unwrap(), hash_h);
}

#[test]
fn test_term_priority_changes_iteration_but_not_membership() {
    let mut shorter = EngineConfig::default();
    shorter.term_priority = tradeup_engine::TermPriority::ShorterFirst;
    let mut longer = EngineConfig::default();
    longer.term_priority = tradeup_engine::TermPriority::LongerFirst;

    let a = generate(&engine(), &shorter);
    let b = generate(&engine(), &longer);

    // Hierarchical stops on the same winning phase either way, so the same
    // (car, term) pairs survive; only discovery order may differ.
    let mut keys_a: Vec<(i64, u32)> =
        a.iter_offers().map(|o| (o.car_id, o.term_months)).collect();
    let mut keys_b: Vec<(i64, u32)> =
        b.iter_offers().map(|o| (o.car_id, o.term_months)).collect();
    keys_a.sort_unstable();
    keys_b.sort_unstable();
    assert_eq!(keys_a, keys_b);
}
