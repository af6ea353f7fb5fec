//! Offer output types.
//!
//! An [`Offer`] is a fully-costed trade-up proposal; the finalizer stamps
//! its tier and rank. [`OfferSet`] is the engine's complete result:
//! tier-grouped offers plus a run summary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::config::FeeSet;
use super::Tier;

/// The fee-range point that produced a range-mode offer.
///
/// Percent values are expressed in percent units, matching the configured
/// ranges (`service_fee_pct = 2.5` means 2.5%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterCombination {
    pub service_fee_pct: Decimal,
    pub cxa_pct: Decimal,
    pub cac_bonus: Decimal,
}

/// A single fully-costed trade-up offer.
///
/// Monetary fields are rounded to cents at construction; every hard filter
/// runs on unrounded intermediates first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Inventory identifier of the proposed car.
    pub car_id: i64,
    /// Model display name of the proposed car.
    pub car_model: String,
    /// Sales price of the proposed car.
    pub new_car_price: Decimal,

    /// Loan term in months.
    pub term_months: u32,
    /// Total monthly payment under the bucket method.
    pub monthly_payment: Decimal,
    /// Signed ratio `monthly_payment / current_payment - 1`.
    pub payment_delta: Decimal,

    /// Total financed principal (main loan plus financed fees).
    pub loan_amount: Decimal,
    /// Equity after CAC bonus, CXA and GPS installation.
    pub effective_equity: Decimal,

    /// CXA charge deducted from equity.
    pub cxa_amount: Decimal,
    /// Financed service fee.
    pub service_fee_amount: Decimal,
    /// Financed Kavak-Total amount.
    pub kavak_total_amount: Decimal,
    /// Financed insurance amount.
    pub insurance_amount: Decimal,
    /// GPS installation fee with tax, paid upfront from equity.
    pub gps_install_fee: Decimal,
    /// GPS monthly fee with tax, added flat to the payment.
    pub gps_monthly_fee: Decimal,

    /// Annual rate actually applied, including the term premium.
    pub interest_rate: Decimal,
    /// Net present value of the lender's interest stream.
    pub npv: Decimal,

    /// The fee set that produced this offer.
    pub fees_applied: FeeSet,
    /// Range-mode parameter point, when applicable.
    #[serde(default)]
    pub parameter_combination: Option<ParameterCombination>,

    /// Tier assigned by the finalizer.
    #[serde(default)]
    pub tier: Option<Tier>,
    /// Dense NPV rank within the tier, assigned by the finalizer.
    #[serde(default)]
    pub npv_rank_within_tier: Option<u32>,
}

/// Offers belonging to one tier, NPV-descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierOffers {
    pub tier: Tier,
    pub offers: Vec<Offer>,
}

/// Run statistics reported alongside the offers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Total offers across all tiers.
    pub total_offers: usize,
    /// Offer count per tier, in tier priority order.
    pub offers_per_tier: Vec<(Tier, usize)>,
    /// Grid combinations evaluated (range mode only).
    #[serde(default)]
    pub combinations_tested: Option<u64>,
    /// Whether the run was cut short by cooperative cancellation.
    #[serde(default)]
    pub cancelled: bool,
}

/// The finalized result of one `generate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferSet {
    /// Tier groups in priority order; empty tiers are omitted.
    pub offers_by_tier: Vec<TierOffers>,
    pub summary: GenerationSummary,
}

impl OfferSet {
    /// An empty result, optionally flagged as cancelled.
    pub fn empty(cancelled: bool) -> Self {
        Self {
            offers_by_tier: Vec::new(),
            summary: GenerationSummary {
                cancelled,
                ..GenerationSummary::default()
            },
        }
    }

    /// Build the result set from finalized tier groups.
    pub fn from_tiers(
        offers_by_tier: Vec<TierOffers>,
        combinations_tested: Option<u64>,
    ) -> Self {
        let offers_per_tier: Vec<(Tier, usize)> = offers_by_tier
            .iter()
            .map(|group| (group.tier, group.offers.len()))
            .collect();
        let total_offers = offers_per_tier.iter().map(|(_, n)| n).sum();
        Self {
            offers_by_tier,
            summary: GenerationSummary {
                total_offers,
                offers_per_tier,
                combinations_tested,
                cancelled: false,
            },
        }
    }

    /// Whether the set carries no offers at all.
    pub fn is_empty(&self) -> bool {
        self.summary.total_offers == 0
    }

    /// Iterate every offer across tiers in emission order.
    pub fn iter_offers(&self) -> impl Iterator<Item = &Offer> {
        self.offers_by_tier.iter().flat_map(|group| group.offers.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_offer(car_id: i64, npv: Decimal) -> Offer {
        Offer {
            car_id,
            car_model: "Sedan".to_string(),
            new_car_price: dec!(150000),
            term_months: 60,
            monthly_payment: dec!(5500),
            payment_delta: dec!(0.10),
            loan_amount: dec!(120000),
            effective_equity: dec!(30000),
            cxa_amount: dec!(6000),
            service_fee_amount: dec!(7500),
            kavak_total_amount: dec!(25000),
            insurance_amount: dec!(10999),
            gps_install_fee: dec!(870),
            gps_monthly_fee: dec!(406),
            interest_rate: dec!(0.185),
            npv,
            fees_applied: FeeSet::default(),
            parameter_combination: None,
            tier: Some(Tier::Upgrade),
            npv_rank_within_tier: Some(1),
        }
    }

    #[test]
    fn test_from_tiers_summary_counts() {
        let set = OfferSet::from_tiers(
            vec![
                TierOffers {
                    tier: Tier::Refresh,
                    offers: vec![sample_offer(1, dec!(9000))],
                },
                TierOffers {
                    tier: Tier::Upgrade,
                    offers: vec![sample_offer(2, dec!(8000)), sample_offer(3, dec!(7000))],
                },
            ],
            Some(12),
        );
        assert_eq!(set.summary.total_offers, 3);
        assert_eq!(
            set.summary.offers_per_tier,
            vec![(Tier::Refresh, 1), (Tier::Upgrade, 2)]
        );
        assert_eq!(set.summary.combinations_tested, Some(12));
        assert!(!set.summary.cancelled);
        assert_eq!(set.iter_offers().count(), 3);
    }

    #[test]
    fn test_empty_cancelled() {
        let set = OfferSet::empty(true);
        assert!(set.is_empty());
        assert!(set.summary.cancelled);
        assert!(set.summary.combinations_tested.is_none());
    }

    #[test]
    fn test_offer_serde_roundtrip() {
        let offer = sample_offer(7, dec!(12345.67));
        let json = serde_json::to_string(&offer).unwrap();
        let back: Offer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, offer);
    }
}
