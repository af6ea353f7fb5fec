//! Custom-parameter search.
//!
//! A single sweep over inventory x terms with the fee set taken verbatim
//! from the engine configuration. No stopping rules beyond the NPV filter.

use super::{run_search_phase, SearchContext, SearchStrategy, StrategyOutcome};
use crate::types::EngineResult;

/// Single evaluation pass with a caller-supplied fee set.
pub struct CustomParameterSearch;

impl SearchStrategy for CustomParameterSearch {
    fn run(&self, ctx: &SearchContext<'_>) -> EngineResult<StrategyOutcome> {
        let fees = ctx
            .config
            .fees
            .with_kavak_total(ctx.config.include_kavak_total);
        log::info!(
            "custom search for customer {}: service {}%, CXA {}%, CAC {}",
            ctx.customer.customer_id,
            fees.service_fee_pct * rust_decimal_macros::dec!(100),
            fees.cxa_pct * rust_decimal_macros::dec!(100),
            fees.cac_bonus
        );

        let sweep = run_search_phase(ctx, &fees);
        if sweep.cancelled {
            return Ok(StrategyOutcome::cancelled());
        }
        log::info!("custom search complete: {} offers", sweep.offers.len());
        Ok(StrategyOutcome {
            offers: sweep.offers,
            combinations_tested: None,
            cancelled: false,
        })
    }
}
