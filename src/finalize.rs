//! Offer finalization.
//!
//! Turns a strategy's raw offer list into the ranked, tier-grouped result:
//!
//! 1. Recompute the payment delta from the reported monthly payment
//!    (defensive; the evaluator already set it)
//! 2. Assign tiers by first-matching boundary, dropping offers outside
//!    every tier
//! 3. Deduplicate by (car, term), keeping the highest-NPV offer
//! 4. Dense-rank within each tier by NPV descending
//! 5. Cap each tier when a cap is given
//! 6. Emit tiers in priority order, NPV descending within
//!
//! Sorting is stable, so NPV ties keep their discovery order.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::types::offer::{Offer, TierOffers};
use crate::types::{Tier, TierBoundaries};

/// Finalize raw strategy output into ranked tier groups.
pub fn finalize_offers(
    offers: Vec<Offer>,
    current_monthly_payment: Decimal,
    tiers: &TierBoundaries,
    max_offers_per_tier: Option<usize>,
) -> Vec<TierOffers> {
    // Recompute deltas and assign tiers; drop offers outside every tier.
    let mut classified: Vec<Offer> = Vec::with_capacity(offers.len());
    for mut offer in offers {
        let Some(ratio) = offer.monthly_payment.checked_div(current_monthly_payment) else {
            continue;
        };
        offer.payment_delta = ratio - Decimal::ONE;
        match tiers.classify(offer.payment_delta) {
            Some(tier) => {
                offer.tier = Some(tier);
                classified.push(offer);
            }
            None => continue,
        }
    }

    // Deduplicate by (car, term), keeping the highest NPV in place so NPV
    // ties stay in discovery order.
    let mut index_by_key: HashMap<(i64, u32), usize> = HashMap::new();
    let mut deduped: Vec<Offer> = Vec::with_capacity(classified.len());
    for offer in classified {
        let key = (offer.car_id, offer.term_months);
        match index_by_key.get(&key) {
            Some(&existing) => {
                if offer.npv > deduped[existing].npv {
                    deduped[existing] = offer;
                }
            }
            None => {
                index_by_key.insert(key, deduped.len());
                deduped.push(offer);
            }
        }
    }

    // Group per tier, rank, cap.
    let mut groups = Vec::new();
    for tier in Tier::ALL {
        let mut group: Vec<Offer> = deduped
            .iter()
            .filter(|offer| offer.tier == Some(tier))
            .cloned()
            .collect();
        if group.is_empty() {
            continue;
        }

        group.sort_by(|a, b| b.npv.cmp(&a.npv));
        assign_dense_ranks(&mut group);
        if let Some(cap) = max_offers_per_tier {
            group.truncate(cap);
        }

        groups.push(TierOffers {
            tier,
            offers: group,
        });
    }

    groups
}

/// Dense NPV rank: equal NPVs share a rank, the next distinct NPV takes
/// the next consecutive rank. Input must already be NPV-descending.
fn assign_dense_ranks(offers: &mut [Offer]) {
    let mut rank = 0u32;
    let mut previous_npv: Option<Decimal> = None;
    for offer in offers.iter_mut() {
        if previous_npv != Some(offer.npv) {
            rank += 1;
            previous_npv = Some(offer.npv);
        }
        offer.npv_rank_within_tier = Some(rank);
    }
}
