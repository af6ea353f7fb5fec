//! Engine configuration.
//!
//! Everything the host can tune lives here as explicit typed fields with
//! documented defaults; there are no open maps. Serde defaults let hosts
//! supply partial JSON, and unknown fields (such as a persisted
//! `last_updated` stamp) are ignored on load and never enter the config
//! hash.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{EngineError, EngineResult, Tier};

/// Which search strategy drives offer generation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchStrategyKind {
    /// Two-phase concession ladder with first-success stopping.
    #[default]
    Hierarchical,
    /// Single sweep with the configured fee set.
    Custom,
    /// Combinatorial sweep over fee-parameter ranges.
    Range,
}

/// Order in which loan terms are tried.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TermPriority {
    /// Longest affordable terms first, 60 ahead of 72.
    #[default]
    Standard,
    /// Ascending term length.
    ShorterFirst,
    /// Descending term length.
    LongerFirst,
}

impl TermPriority {
    /// The term iteration order this priority selects.
    pub fn term_order(self) -> &'static [u32] {
        match self {
            TermPriority::Standard => &[60, 72, 48, 36, 24, 12],
            TermPriority::ShorterFirst => &[12, 24, 36, 48, 60, 72],
            TermPriority::LongerFirst => &[72, 60, 48, 36, 24, 12],
        }
    }
}

/// Sub-mode of the range-optimization strategy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RangeSearchMethod {
    /// Enumerate the full parameter grid.
    #[default]
    Exhaustive,
    /// Differential evolution over the parameter box.
    Smart,
}

/// A closed signed interval on the payment-delta ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl DeltaRange {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Whether the delta falls inside the interval (inclusive).
    pub fn contains(&self, delta: Decimal) -> bool {
        self.min <= delta && delta <= self.max
    }
}

/// Named payment-delta tier intervals.
///
/// Classification iterates `refresh`, `upgrade`, `max_upgrade` in that
/// order; when intervals overlap the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBoundaries {
    #[serde(default = "default_refresh_range")]
    pub refresh: DeltaRange,
    #[serde(default = "default_upgrade_range")]
    pub upgrade: DeltaRange,
    #[serde(default = "default_max_upgrade_range")]
    pub max_upgrade: DeltaRange,
}

fn default_refresh_range() -> DeltaRange {
    DeltaRange::new(dec!(-0.05), dec!(0.05))
}

fn default_upgrade_range() -> DeltaRange {
    DeltaRange::new(dec!(0.0501), dec!(0.25))
}

fn default_max_upgrade_range() -> DeltaRange {
    DeltaRange::new(dec!(0.2501), dec!(1.0))
}

impl Default for TierBoundaries {
    fn default() -> Self {
        Self {
            refresh: default_refresh_range(),
            upgrade: default_upgrade_range(),
            max_upgrade: default_max_upgrade_range(),
        }
    }
}

impl TierBoundaries {
    /// The tier intervals in classification order.
    pub fn ordered(&self) -> [(Tier, DeltaRange); 3] {
        [
            (Tier::Refresh, self.refresh),
            (Tier::Upgrade, self.upgrade),
            (Tier::MaxUpgrade, self.max_upgrade),
        ]
    }

    /// Classify a payment delta into a tier, first match wins.
    pub fn classify(&self, delta: Decimal) -> Option<Tier> {
        self.ordered()
            .into_iter()
            .find(|(_, range)| range.contains(delta))
            .map(|(tier, _)| tier)
    }

    /// Reject structurally inverted intervals.
    pub fn validate(&self) -> EngineResult<()> {
        for (tier, range) in self.ordered() {
            if range.min > range.max {
                return Err(EngineError::invalid_config(format!(
                    "tier {tier} interval is inverted: [{}, {}]",
                    range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

/// The fee parameters an evaluation runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSet {
    /// Service fee as a fraction of the car price, financed.
    #[serde(default = "default_service_fee_pct")]
    pub service_fee_pct: Decimal,

    /// CXA as a fraction of the car price, deducted from equity upfront.
    #[serde(default = "default_cxa_pct")]
    pub cxa_pct: Decimal,

    /// CAC bonus added to equity, absolute.
    #[serde(default = "default_cac_bonus")]
    pub cac_bonus: Decimal,

    /// Kavak-Total add-on, absolute, financed. Zeroed when the engine flag
    /// disables it.
    #[serde(default = "default_kavak_total_amount")]
    pub kavak_total_amount: Decimal,

    /// Insurance override. `None` falls back to the risk-profile table.
    #[serde(default)]
    pub insurance_amount: Option<Decimal>,

    /// GPS installation fee before tax, one-time, never financed.
    #[serde(default = "default_gps_installation_fee")]
    pub gps_installation_fee: Decimal,

    /// GPS monthly fee before tax, added to every monthly payment.
    #[serde(default = "default_gps_monthly_fee")]
    pub gps_monthly_fee: Decimal,
}

fn default_service_fee_pct() -> Decimal {
    dec!(0.05)
}

fn default_cxa_pct() -> Decimal {
    dec!(0.04)
}

fn default_cac_bonus() -> Decimal {
    dec!(5000)
}

fn default_kavak_total_amount() -> Decimal {
    dec!(25000)
}

fn default_gps_installation_fee() -> Decimal {
    dec!(750)
}

fn default_gps_monthly_fee() -> Decimal {
    dec!(350)
}

impl Default for FeeSet {
    fn default() -> Self {
        Self {
            service_fee_pct: default_service_fee_pct(),
            cxa_pct: default_cxa_pct(),
            cac_bonus: default_cac_bonus(),
            kavak_total_amount: default_kavak_total_amount(),
            insurance_amount: None,
            gps_installation_fee: default_gps_installation_fee(),
            gps_monthly_fee: default_gps_monthly_fee(),
        }
    }
}

impl FeeSet {
    /// Copy with the Kavak-Total amount zeroed unless the flag keeps it.
    pub fn with_kavak_total(&self, include: bool) -> FeeSet {
        FeeSet {
            kavak_total_amount: if include {
                self.kavak_total_amount
            } else {
                Decimal::ZERO
            },
            ..self.clone()
        }
    }
}

/// Parameter ranges and stopping limits for the range strategy.
///
/// Percent-valued ranges are expressed in percent units (a service fee
/// range of `[0, 5]` means 0%..5%); the sweep divides by 100 when building
/// fee sets, matching how the offers report their parameter combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeParams {
    #[serde(default = "default_service_fee_range")]
    pub service_fee_range: (Decimal, Decimal),
    #[serde(default = "default_pct_step")]
    pub service_fee_step: Decimal,

    #[serde(default = "default_cxa_range")]
    pub cxa_range: (Decimal, Decimal),
    #[serde(default = "default_pct_step")]
    pub cxa_step: Decimal,

    #[serde(default = "default_cac_bonus_range")]
    pub cac_bonus_range: (Decimal, Decimal),
    #[serde(default = "default_cac_bonus_step")]
    pub cac_bonus_step: Decimal,

    /// Per-tier cap applied by the finalizer in range mode.
    #[serde(default = "default_max_offers_per_tier")]
    pub max_offers_per_tier: usize,

    /// Hard cap on grid combinations evaluated.
    #[serde(default = "default_max_combinations_to_test")]
    pub max_combinations_to_test: u64,

    /// Stop once this many offers survived the NPV filter.
    #[serde(default = "default_early_stop_on_offers")]
    pub early_stop_on_offers: u64,

    /// Exhaustive grid or differential evolution.
    #[serde(default)]
    pub search_method: RangeSearchMethod,

    /// Generation budget for the smart optimizer.
    #[serde(default = "default_smart_max_iter")]
    pub smart_max_iter: u32,
}

fn default_service_fee_range() -> (Decimal, Decimal) {
    (dec!(0), dec!(5))
}

fn default_cxa_range() -> (Decimal, Decimal) {
    (dec!(0), dec!(4))
}

fn default_cac_bonus_range() -> (Decimal, Decimal) {
    (dec!(0), dec!(10000))
}

fn default_pct_step() -> Decimal {
    dec!(0.1)
}

fn default_cac_bonus_step() -> Decimal {
    dec!(100)
}

fn default_max_offers_per_tier() -> usize {
    50
}

fn default_max_combinations_to_test() -> u64 {
    1000
}

fn default_early_stop_on_offers() -> u64 {
    100
}

fn default_smart_max_iter() -> u32 {
    30
}

impl Default for RangeParams {
    fn default() -> Self {
        Self {
            service_fee_range: default_service_fee_range(),
            service_fee_step: default_pct_step(),
            cxa_range: default_cxa_range(),
            cxa_step: default_pct_step(),
            cac_bonus_range: default_cac_bonus_range(),
            cac_bonus_step: default_cac_bonus_step(),
            max_offers_per_tier: default_max_offers_per_tier(),
            max_combinations_to_test: default_max_combinations_to_test(),
            early_stop_on_offers: default_early_stop_on_offers(),
            search_method: RangeSearchMethod::default(),
            smart_max_iter: default_smart_max_iter(),
        }
    }
}

impl RangeParams {
    /// Validate one `[start, end]` + step triple.
    fn validate_range(
        parameter: &str,
        range: (Decimal, Decimal),
        step: Decimal,
    ) -> EngineResult<()> {
        if step <= Decimal::ZERO {
            return Err(EngineError::invalid_range(parameter, "step must be positive"));
        }
        if range.1 < range.0 {
            return Err(EngineError::invalid_range(
                parameter,
                "bounds must be in ascending order",
            ));
        }
        Ok(())
    }

    /// Validate all three parameter ranges.
    pub fn validate(&self) -> EngineResult<()> {
        Self::validate_range("service_fee_range", self.service_fee_range, self.service_fee_step)?;
        Self::validate_range("cxa_range", self.cxa_range, self.cxa_step)?;
        Self::validate_range("cac_bonus_range", self.cac_bonus_range, self.cac_bonus_step)?;
        Ok(())
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Strategy selector.
    #[serde(default)]
    pub strategy: SearchStrategyKind,

    /// Whether Kavak-Total is financed into offers.
    #[serde(default = "default_true")]
    pub include_kavak_total: bool,

    /// Offers below this NPV are discarded.
    #[serde(default = "default_min_npv_threshold")]
    pub min_npv_threshold: Decimal,

    /// Term iteration order.
    #[serde(default)]
    pub term_priority: TermPriority,

    /// Payment-delta tier intervals.
    #[serde(default)]
    pub tiers: TierBoundaries,

    /// Fee set for custom mode and the hierarchical baseline.
    #[serde(default)]
    pub fees: FeeSet,

    /// Range-strategy parameters.
    #[serde(default)]
    pub range: RangeParams,
}

fn default_true() -> bool {
    true
}

fn default_min_npv_threshold() -> Decimal {
    dec!(5000)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategyKind::default(),
            include_kavak_total: true,
            min_npv_threshold: default_min_npv_threshold(),
            term_priority: TermPriority::default(),
            tiers: TierBoundaries::default(),
            fees: FeeSet::default(),
            range: RangeParams::default(),
        }
    }
}

impl EngineConfig {
    /// Copy with every decimal normalized (trailing zeros stripped) so
    /// numerically identical configurations serialize, and therefore hash,
    /// identically.
    pub fn canonicalized(&self) -> EngineConfig {
        fn norm_range(range: DeltaRange) -> DeltaRange {
            DeltaRange::new(range.min.normalize(), range.max.normalize())
        }

        EngineConfig {
            strategy: self.strategy,
            include_kavak_total: self.include_kavak_total,
            min_npv_threshold: self.min_npv_threshold.normalize(),
            term_priority: self.term_priority,
            tiers: TierBoundaries {
                refresh: norm_range(self.tiers.refresh),
                upgrade: norm_range(self.tiers.upgrade),
                max_upgrade: norm_range(self.tiers.max_upgrade),
            },
            fees: FeeSet {
                service_fee_pct: self.fees.service_fee_pct.normalize(),
                cxa_pct: self.fees.cxa_pct.normalize(),
                cac_bonus: self.fees.cac_bonus.normalize(),
                kavak_total_amount: self.fees.kavak_total_amount.normalize(),
                insurance_amount: self.fees.insurance_amount.map(|amount| amount.normalize()),
                gps_installation_fee: self.fees.gps_installation_fee.normalize(),
                gps_monthly_fee: self.fees.gps_monthly_fee.normalize(),
            },
            range: RangeParams {
                service_fee_range: (
                    self.range.service_fee_range.0.normalize(),
                    self.range.service_fee_range.1.normalize(),
                ),
                service_fee_step: self.range.service_fee_step.normalize(),
                cxa_range: (
                    self.range.cxa_range.0.normalize(),
                    self.range.cxa_range.1.normalize(),
                ),
                cxa_step: self.range.cxa_step.normalize(),
                cac_bonus_range: (
                    self.range.cac_bonus_range.0.normalize(),
                    self.range.cac_bonus_range.1.normalize(),
                ),
                cac_bonus_step: self.range.cac_bonus_step.normalize(),
                max_offers_per_tier: self.range.max_offers_per_tier,
                max_combinations_to_test: self.range.max_combinations_to_test,
                early_stop_on_offers: self.range.early_stop_on_offers,
                search_method: self.range.search_method,
                smart_max_iter: self.range.smart_max_iter,
            },
        }
    }

    /// Structural validation shared by every strategy.
    pub fn validate(&self) -> EngineResult<()> {
        self.tiers.validate()?;
        if self.strategy == SearchStrategyKind::Range
            && self.range.search_method == RangeSearchMethod::Smart
            && self.range.smart_max_iter == 0
        {
            return Err(EngineError::invalid_config(
                "smart_max_iter must be positive in smart range mode",
            ));
        }
        Ok(())
    }
}
