//! Offer search strategies.
//!
//! Three strategies drive the evaluator over the candidate space:
//!
//! | Strategy | Behavior |
//! |---|---|
//! | `hierarchical` | Concession ladder, stops at the first phase with offers |
//! | `custom` | Single sweep with the configured fee set |
//! | `range` | Grid sweep (or differential evolution) over fee parameters |
//!
//! Every strategy shares the same inner loop: iterate inventory in caller
//! order, terms in `term_priority` order, evaluate each candidate, and keep
//! offers whose NPV clears the configured threshold. Sweeps are sequential
//! and deterministic so results are reproducible.

pub mod custom;
pub mod hierarchical;
pub mod range;

pub use custom::CustomParameterSearch;
pub use hierarchical::HierarchicalSearch;
pub use range::RangeOptimizationSearch;

use rust_decimal::Decimal;

use crate::evaluator::evaluate_offer;
use crate::types::offer::Offer;
use crate::types::{
    CancelToken, Customer, EngineConfig, EngineResult, FeeSet, InventoryItem, RiskTables,
    SearchStrategyKind, TierBoundaries,
};

/// Everything a strategy needs for one generation run.
pub struct SearchContext<'a> {
    pub customer: &'a Customer,
    pub inventory: &'a [InventoryItem],
    /// Annual base rate for the customer's risk profile.
    pub base_rate: Decimal,
    pub config: &'a EngineConfig,
    /// The customer's current monthly payment.
    pub current_payment: Decimal,
    pub tiers: &'a TierBoundaries,
    pub tables: &'a RiskTables,
    pub cancel: &'a CancelToken,
}

/// Raw result of a strategy run, before finalization.
#[derive(Debug, Default)]
pub struct StrategyOutcome {
    /// NPV-filtered offers in discovery order.
    pub offers: Vec<Offer>,
    /// Grid combinations evaluated (range mode only).
    pub combinations_tested: Option<u64>,
    /// Set when the run was interrupted cooperatively.
    pub cancelled: bool,
}

impl StrategyOutcome {
    fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Self::default()
        }
    }
}

/// A search strategy over the (vehicle, term, fee) candidate space.
pub trait SearchStrategy {
    /// Run the search and return raw NPV-filtered offers.
    fn run(&self, ctx: &SearchContext<'_>) -> EngineResult<StrategyOutcome>;
}

/// Select the strategy implementation for a configuration.
pub fn strategy_for(kind: SearchStrategyKind) -> Box<dyn SearchStrategy> {
    match kind {
        SearchStrategyKind::Hierarchical => Box::new(HierarchicalSearch),
        SearchStrategyKind::Custom => Box::new(CustomParameterSearch),
        SearchStrategyKind::Range => Box::new(RangeOptimizationSearch),
    }
}

/// Result of one fee-set sweep over inventory x terms.
pub(crate) struct SweepResult {
    pub offers: Vec<Offer>,
    pub cancelled: bool,
}

/// Sweep the full candidate space with one fee set, keeping offers whose
/// NPV clears the threshold. Cancellation is checked at the top of each
/// inventory row.
pub(crate) fn run_search_phase(ctx: &SearchContext<'_>, fees: &FeeSet) -> SweepResult {
    let term_order = ctx.config.term_priority.term_order();
    let mut offers = Vec::new();

    for car in ctx.inventory {
        if ctx.cancel.is_cancelled() {
            return SweepResult {
                offers,
                cancelled: true,
            };
        }
        for &term in term_order {
            let candidate = evaluate_offer(
                ctx.customer,
                car,
                term,
                ctx.base_rate,
                fees,
                ctx.tiers,
                ctx.tables,
            );
            if let Some(offer) = candidate {
                if offer.npv >= ctx.config.min_npv_threshold {
                    offers.push(offer);
                }
            }
        }
    }

    SweepResult {
        offers,
        cancelled: false,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rust_decimal_macros::dec;

    pub fn customer() -> Customer {
        Customer {
            customer_id: "CUST-001".to_string(),
            current_monthly_payment: dec!(8000),
            vehicle_equity: dec!(50000),
            outstanding_balance: dec!(80000),
            current_car_price: dec!(130000),
            risk_profile_name: "A".to_string(),
            risk_profile_index: 2,
        }
    }

    pub fn inventory() -> Vec<InventoryItem> {
        vec![
            InventoryItem {
                car_id: 1,
                model: "Hatch".to_string(),
                sales_price: dec!(185000),
                region: None,
                kilometers: None,
                color: None,
                has_promotion: false,
            },
            InventoryItem {
                car_id: 2,
                model: "Sedan".to_string(),
                sales_price: dec!(210000),
                region: None,
                kilometers: None,
                color: None,
                has_promotion: false,
            },
        ]
    }

    pub struct Fixture {
        pub customer: Customer,
        pub inventory: Vec<InventoryItem>,
        pub config: EngineConfig,
        pub tables: RiskTables,
        pub cancel: CancelToken,
    }

    impl Fixture {
        pub fn new(config: EngineConfig) -> Self {
            Self {
                customer: customer(),
                inventory: inventory(),
                config,
                tables: RiskTables::builtin(),
                cancel: CancelToken::new(),
            }
        }

        pub fn context(&self) -> SearchContext<'_> {
            SearchContext {
                customer: &self.customer,
                inventory: &self.inventory,
                base_rate: self.tables.interest_rate("A").unwrap(),
                config: &self.config,
                current_payment: self.customer.current_monthly_payment,
                tiers: &self.config.tiers,
                tables: &self.tables,
                cancel: &self.cancel,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Fixture;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sweep_respects_npv_threshold() {
        let mut config = EngineConfig::default();
        config.min_npv_threshold = dec!(0);
        let fixture = Fixture::new(config);
        let ctx = fixture.context();

        let all = run_search_phase(&ctx, &FeeSet::default());
        assert!(!all.cancelled);
        assert!(!all.offers.is_empty());

        let mut blocked = fixture.config.clone();
        blocked.min_npv_threshold = dec!(100000000);
        let fixture_blocked = Fixture::new(blocked);
        let none = run_search_phase(&fixture_blocked.context(), &FeeSet::default());
        assert!(none.offers.is_empty());
    }

    #[test]
    fn test_sweep_cancellation_stops_at_row_boundary() {
        let fixture = Fixture::new(EngineConfig::default());
        fixture.cancel.cancel();
        let result = run_search_phase(&fixture.context(), &FeeSet::default());
        assert!(result.cancelled);
        assert!(result.offers.is_empty());
    }

    #[test]
    fn test_strategy_dispatch() {
        // Each kind resolves to a runnable implementation.
        for kind in [
            SearchStrategyKind::Hierarchical,
            SearchStrategyKind::Custom,
            SearchStrategyKind::Range,
        ] {
            let _strategy = strategy_for(kind);
        }
    }
}
