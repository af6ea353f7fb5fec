//! Range-optimization search.
//!
//! Sweeps fee-parameter combinations instead of a single fee set. Two
//! sub-modes:
//!
//! - **Exhaustive**: enumerate the Cartesian product of the configured
//!   `[min, max, step]` grids in the stable nested order service-fee,
//!   CXA, CAC (inclusive endpoints, values rounded to 4 decimals). Stops
//!   at a combination boundary once either `max_combinations_to_test` or
//!   `early_stop_on_offers` is reached.
//! - **Smart**: differential evolution over the same 3-d box minimizing
//!   the negated best NPV, then one final sweep at the best point snapped
//!   to the step grid.
//!
//! Percent-valued parameters travel the grid in percent units and are
//! divided by 100 when fee sets are built; offers report the grid point
//! they came from.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{run_search_phase, SearchContext, SearchStrategy, StrategyOutcome};
use crate::types::offer::{Offer, ParameterCombination};
use crate::types::{DecimalExt, EngineResult, FeeSet, RangeParams, RangeSearchMethod};

/// Seed for the smart-mode optimizer; fixed so runs are reproducible.
const SMART_SEED: u64 = 0x7472_6164_6575_7021;

/// Differential evolution population size.
const POPULATION: usize = 15;

/// Differential weight (F) for mutation.
const DIFFERENTIAL_WEIGHT: f64 = 0.8;

/// Crossover probability (CR).
const CROSSOVER_RATE: f64 = 0.9;

/// Objective penalty when a candidate point yields no valid offers.
const NO_OFFER_PENALTY: f64 = 1e9;

/// Combinatorial sweep over (service fee %, CXA %, CAC bonus).
pub struct RangeOptimizationSearch;

impl SearchStrategy for RangeOptimizationSearch {
    fn run(&self, ctx: &SearchContext<'_>) -> EngineResult<StrategyOutcome> {
        let params = &ctx.config.range;
        params.validate()?;

        match params.search_method {
            RangeSearchMethod::Exhaustive => Ok(exhaustive_search(ctx, params)),
            RangeSearchMethod::Smart => Ok(smart_search(ctx, params)),
        }
    }
}

/// Inclusive grid of values from `range.0` to `range.1` in `step`
/// increments, rounded to 4 decimals.
fn grid_values(range: (Decimal, Decimal), step: Decimal) -> Vec<Decimal> {
    let mut values = Vec::new();
    let mut value = range.0;
    while value <= range.1 {
        values.push(value.round_grid());
        value += step;
    }
    values
}

/// Build the fee set for one grid point. Percent parameters arrive in
/// percent units.
fn fee_set_for(
    ctx: &SearchContext<'_>,
    service_fee_pct: Decimal,
    cxa_pct: Decimal,
    cac_bonus: Decimal,
) -> FeeSet {
    let base = ctx
        .config
        .fees
        .with_kavak_total(ctx.config.include_kavak_total);
    FeeSet {
        service_fee_pct: service_fee_pct / dec!(100),
        cxa_pct: cxa_pct / dec!(100),
        cac_bonus,
        ..base
    }
}

/// Tag sweep results with the grid point that produced them.
fn attach_parameters(
    offers: Vec<Offer>,
    service_fee_pct: Decimal,
    cxa_pct: Decimal,
    cac_bonus: Decimal,
) -> Vec<Offer> {
    offers
        .into_iter()
        .map(|mut offer| {
            offer.parameter_combination = Some(ParameterCombination {
                service_fee_pct,
                cxa_pct,
                cac_bonus,
            });
            offer
        })
        .collect()
}

fn exhaustive_search(ctx: &SearchContext<'_>, params: &RangeParams) -> StrategyOutcome {
    let service_values = grid_values(params.service_fee_range, params.service_fee_step);
    let cxa_values = grid_values(params.cxa_range, params.cxa_step);
    let cac_values = grid_values(params.cac_bonus_range, params.cac_bonus_step);

    let total_combinations = service_values.len() * cxa_values.len() * cac_values.len();
    log::info!(
        "range search: {} x {} x {} = {} combinations (cap {}, early stop at {} offers)",
        service_values.len(),
        cxa_values.len(),
        cac_values.len(),
        total_combinations,
        params.max_combinations_to_test,
        params.early_stop_on_offers
    );

    let mut all_offers = Vec::new();
    let mut combinations_tested = 0u64;
    let mut valid_offers_found = 0u64;

    'search: for &service_fee_pct in &service_values {
        for &cxa_pct in &cxa_values {
            for &cac_bonus in &cac_values {
                if ctx.cancel.is_cancelled() {
                    return StrategyOutcome::cancelled();
                }
                combinations_tested += 1;

                let fees = fee_set_for(ctx, service_fee_pct, cxa_pct, cac_bonus);
                let sweep = run_search_phase(ctx, &fees);
                if sweep.cancelled {
                    return StrategyOutcome::cancelled();
                }

                valid_offers_found += sweep.offers.len() as u64;
                all_offers.extend(attach_parameters(
                    sweep.offers,
                    service_fee_pct,
                    cxa_pct,
                    cac_bonus,
                ));

                if combinations_tested >= params.max_combinations_to_test {
                    log::info!(
                        "range search: stopping at combination cap ({combinations_tested})"
                    );
                    break 'search;
                }
                if valid_offers_found >= params.early_stop_on_offers {
                    log::info!(
                        "range search: found enough offers ({valid_offers_found}), stopping"
                    );
                    break 'search;
                }
            }
        }
    }

    log::info!(
        "range search complete: {combinations_tested}/{total_combinations} combinations, {valid_offers_found} offers"
    );

    StrategyOutcome {
        offers: all_offers,
        combinations_tested: Some(combinations_tested),
        cancelled: false,
    }
}

/// The negated best NPV at one parameter point, or the penalty when the
/// point yields nothing.
fn objective(ctx: &SearchContext<'_>, point: [f64; 3]) -> f64 {
    let Some(fees) = point_fee_set(ctx, point) else {
        return NO_OFFER_PENALTY;
    };
    let sweep = run_search_phase(ctx, &fees);
    let best = sweep
        .offers
        .iter()
        .map(|offer| offer.npv)
        .max()
        .and_then(|npv| npv.to_f64());
    match best {
        Some(npv) => -npv,
        None => NO_OFFER_PENALTY,
    }
}

fn point_fee_set(ctx: &SearchContext<'_>, point: [f64; 3]) -> Option<FeeSet> {
    let service = Decimal::from_f64_retain(point[0])?.round_grid();
    let cxa = Decimal::from_f64_retain(point[1])?.round_grid();
    let cac = Decimal::from_f64_retain(point[2])?.round_grid();
    Some(fee_set_for(ctx, service, cxa, cac))
}

/// Snap an optimizer coordinate onto the configured step grid, clamped to
/// the range bounds.
fn snap_to_grid(value: f64, range: (Decimal, Decimal), step: Decimal) -> Decimal {
    let value = Decimal::from_f64_retain(value).unwrap_or(range.0);
    let steps = (value / step).round();
    (steps * step).clamp(range.0, range.1).round_grid()
}

fn smart_search(ctx: &SearchContext<'_>, params: &RangeParams) -> StrategyOutcome {
    let bounds: [(f64, f64); 3] = [
        (
            params.service_fee_range.0.to_f64().unwrap_or(0.0),
            params.service_fee_range.1.to_f64().unwrap_or(0.0),
        ),
        (
            params.cxa_range.0.to_f64().unwrap_or(0.0),
            params.cxa_range.1.to_f64().unwrap_or(0.0),
        ),
        (
            params.cac_bonus_range.0.to_f64().unwrap_or(0.0),
            params.cac_bonus_range.1.to_f64().unwrap_or(0.0),
        ),
    ];

    let mut rng = StdRng::seed_from_u64(SMART_SEED);
    let sample = |rng: &mut StdRng, dim: usize| {
        let (lo, hi) = bounds[dim];
        if hi > lo {
            rng.gen_range(lo..=hi)
        } else {
            lo
        }
    };

    let mut evaluations = 0u64;
    let mut population: Vec<[f64; 3]> = (0..POPULATION)
        .map(|_| [sample(&mut rng, 0), sample(&mut rng, 1), sample(&mut rng, 2)])
        .collect();
    let mut costs: Vec<f64> = Vec::with_capacity(POPULATION);
    for point in &population {
        if ctx.cancel.is_cancelled() {
            return StrategyOutcome::cancelled();
        }
        evaluations += 1;
        costs.push(objective(ctx, *point));
    }

    for _generation in 0..params.smart_max_iter {
        if ctx.cancel.is_cancelled() {
            return StrategyOutcome::cancelled();
        }
        for i in 0..POPULATION {
            // Three distinct partners, none equal to the target index.
            let mut partners = [0usize; 3];
            let mut chosen = 0;
            while chosen < 3 {
                let candidate = rng.gen_range(0..POPULATION);
                if candidate != i && !partners[..chosen].contains(&candidate) {
                    partners[chosen] = candidate;
                    chosen += 1;
                }
            }
            let [a, b, c] = partners.map(|p| population[p]);

            let forced_dim = rng.gen_range(0..3);
            let mut trial = population[i];
            for dim in 0..3 {
                if dim == forced_dim || rng.gen::<f64>() < CROSSOVER_RATE {
                    let mutated = a[dim] + DIFFERENTIAL_WEIGHT * (b[dim] - c[dim]);
                    trial[dim] = mutated.clamp(bounds[dim].0, bounds[dim].1);
                }
            }

            evaluations += 1;
            let trial_cost = objective(ctx, trial);
            if trial_cost <= costs[i] {
                population[i] = trial;
                costs[i] = trial_cost;
            }
        }
    }

    let best_index = costs
        .iter()
        .enumerate()
        .min_by(|(_, x), (_, y)| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(index, _)| index)
        .unwrap_or(0);
    let best = population[best_index];

    let service = snap_to_grid(best[0], params.service_fee_range, params.service_fee_step);
    let cxa = snap_to_grid(best[1], params.cxa_range, params.cxa_step);
    let cac = snap_to_grid(best[2], params.cac_bonus_range, params.cac_bonus_step);
    log::info!(
        "smart range search: best point service {service}%, CXA {cxa}%, CAC {cac} after {evaluations} evaluations"
    );

    let fees = fee_set_for(ctx, service, cxa, cac);
    let sweep = run_search_phase(ctx, &fees);
    if sweep.cancelled {
        return StrategyOutcome::cancelled();
    }
    evaluations += 1;

    StrategyOutcome {
        offers: attach_parameters(sweep.offers, service, cxa, cac),
        combinations_tested: Some(evaluations),
        cancelled: false,
    }
}
