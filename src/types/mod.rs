//! Type definitions for the trade-up engine.
//!
//! This module contains all the core data structures used throughout
//! the offer generation pipeline.
//!
//! # Module Organization
//!
//! - `customer` - Customer and inventory records (the engine's inputs)
//! - `risk` - Risk-profile tables (rates, down payments, insurance)
//! - `config` - Engine configuration, fee sets, tier boundaries
//! - `offer` - Generated offers and the finalized result set

pub mod config;
pub mod customer;
pub mod offer;
pub mod risk;

pub use config::{
    DeltaRange, EngineConfig, FeeSet, RangeParams, RangeSearchMethod, SearchStrategyKind,
    TermPriority, TierBoundaries,
};
pub use customer::{risk_profile_index, Customer, InventoryItem};
pub use offer::{GenerationSummary, Offer, OfferSet, ParameterCombination, TierOffers};
pub use risk::RiskTables;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strum::{Display, EnumString};
use thiserror::Error;

/// Value-added tax rate applied to interest and GPS charges.
pub const IVA_RATE: Decimal = dec!(0.16);

/// Maximum CAC bonus the concession ladder may spend.
pub const MAX_CAC_BONUS: Decimal = dec!(10000);

/// Insurance is always amortized over this fixed horizon, regardless of term.
pub const INSURANCE_TERM_MONTHS: u32 = 12;

/// Payment-change tier an offer lands in.
///
/// Ordering is the tier priority used for result ordering and for
/// first-match classification: `Refresh < Upgrade < MaxUpgrade`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Payment stays close to the current one.
    #[strum(serialize = "Refresh")]
    Refresh,
    /// Moderate payment increase.
    #[strum(serialize = "Upgrade")]
    Upgrade,
    /// Large payment increase.
    #[strum(serialize = "Max Upgrade")]
    MaxUpgrade,
}

impl Tier {
    /// All tiers in priority order.
    pub const ALL: [Tier; 3] = [Tier::Refresh, Tier::Upgrade, Tier::MaxUpgrade];
}

/// Common error type for engine operations.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum EngineError {
    #[error("Invalid customer: {message}")]
    InvalidCustomer { message: String, field: Option<String> },

    #[error("Invalid range for {parameter}: {message}")]
    InvalidRange { parameter: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid loan parameters: {message}")]
    InvalidLoanParams { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl EngineError {
    pub fn invalid_customer(message: impl Into<String>) -> Self {
        EngineError::InvalidCustomer {
            message: message.into(),
            field: None,
        }
    }

    pub fn invalid_customer_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        EngineError::InvalidCustomer {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn invalid_range(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvalidRange {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn invalid_loan_params(message: impl Into<String>) -> Self {
        EngineError::InvalidLoanParams {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        EngineError::Serialization {
            message: message.into(),
        }
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Cooperative cancellation signal.
///
/// Strategies check it at the top of each inventory row and at each
/// combination boundary in range mode. A cancelled run returns an empty
/// result flagged in the summary and is never written to the cache.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Decimal extension trait for financial calculations.
pub trait DecimalExt {
    /// Round to 2 decimal places (cents) using banker's rounding.
    fn round_money(self) -> Decimal;
    /// Round to 4 decimal places (range-grid precision).
    fn round_grid(self) -> Decimal;
}

impl DecimalExt for Decimal {
    fn round_money(self) -> Decimal {
        self.round_dp(2)
    }

    fn round_grid(self) -> Decimal {
        self.round_dp(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_display_names() {
        assert_eq!(Tier::Refresh.to_string(), "Refresh");
        assert_eq!(Tier::Upgrade.to_string(), "Upgrade");
        assert_eq!(Tier::MaxUpgrade.to_string(), "Max Upgrade");
    }

    #[test]
    fn test_tier_priority_order() {
        assert!(Tier::Refresh < Tier::Upgrade);
        assert!(Tier::Upgrade < Tier::MaxUpgrade);
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_decimal_ext() {
        assert_eq!(dec!(10.125).round_money(), dec!(10.12)); // Banker's rounding
        assert_eq!(dec!(10.126).round_money(), dec!(10.13));
        assert_eq!(dec!(0.123456).round_grid(), dec!(0.1235));
    }
}
