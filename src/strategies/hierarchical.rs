//! Hierarchical concession ladder.
//!
//! Phases are tried in order and the search stops at the first phase that
//! yields at least one surviving offer. The ladder never spends subsidy it
//! does not need: a customer reachable at max profit is never offered
//! subsidized terms.
//!
//! | Phase | Service fee | CXA | CAC bonus |
//! |---|---|---|---|
//! | 1 Max profit | default | default | 0 |
//! | 2 Level 1 | 0 | default | 0 |
//! | 2 Level 2 | 0 | default | `MAX_CAC_BONUS` |
//! | 2 Level 3 | 0 | 0 | `MAX_CAC_BONUS` |
//!
//! Kavak-Total follows the `include_kavak_total` flag in every phase.

use rust_decimal::Decimal;

use super::{run_search_phase, SearchContext, SearchStrategy, StrategyOutcome};
use crate::types::{EngineResult, FeeSet, MAX_CAC_BONUS};

/// The two-phase concession ladder with first-success stopping.
pub struct HierarchicalSearch;

impl HierarchicalSearch {
    /// The ladder's fee sets in application order.
    fn phases(ctx: &SearchContext<'_>) -> [(&'static str, FeeSet); 4] {
        let baseline = ctx
            .config
            .fees
            .with_kavak_total(ctx.config.include_kavak_total);

        let max_profit = FeeSet {
            cac_bonus: Decimal::ZERO,
            ..baseline.clone()
        };
        let level_1 = FeeSet {
            service_fee_pct: Decimal::ZERO,
            ..max_profit.clone()
        };
        let level_2 = FeeSet {
            cac_bonus: MAX_CAC_BONUS,
            ..level_1.clone()
        };
        let level_3 = FeeSet {
            cxa_pct: Decimal::ZERO,
            ..level_2.clone()
        };

        [
            ("phase 1 (max profit)", max_profit),
            ("phase 2 level 1 (no service fee)", level_1),
            ("phase 2 level 2 (CAC bonus)", level_2),
            ("phase 2 level 3 (no CXA)", level_3),
        ]
    }
}

impl SearchStrategy for HierarchicalSearch {
    fn run(&self, ctx: &SearchContext<'_>) -> EngineResult<StrategyOutcome> {
        for (label, fees) in Self::phases(ctx) {
            log::info!(
                "hierarchical search: {} for customer {}",
                label,
                ctx.customer.customer_id
            );
            let sweep = run_search_phase(ctx, &fees);
            if sweep.cancelled {
                return Ok(StrategyOutcome::cancelled());
            }
            if !sweep.offers.is_empty() {
                log::info!(
                    "hierarchical search: {} found {} offers, stopping",
                    label,
                    sweep.offers.len()
                );
                return Ok(StrategyOutcome {
                    offers: sweep.offers,
                    combinations_tested: None,
                    cancelled: false,
                });
            }
        }

        log::info!(
            "hierarchical search: no offers at any subsidy level for customer {}",
            ctx.customer.customer_id
        );
        Ok(StrategyOutcome::default())
    }
}
