//! Main trade-up engine.
//!
//! This module provides the primary entry point for offer generation.
//! The engine validates inputs, consults the offer cache, dispatches the
//! configured search strategy, and finalizes the result.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tradeup_engine::{TradeUpEngine, RiskTables, EngineConfig, CancelToken};
//!
//! let engine = TradeUpEngine::new(RiskTables::builtin());
//! let offers = engine.generate(&customer, &inventory, &EngineConfig::default(), &CancelToken::new())?;
//! println!("{} offers", offers.summary.total_offers);
//! ```

use std::sync::Arc;

use crate::cache::{config_hash, OfferCache};
use crate::finalize::finalize_offers;
use crate::strategies::{strategy_for, SearchContext};
use crate::types::offer::OfferSet;
use crate::types::{
    risk_profile_index, CancelToken, Customer, EngineConfig, EngineResult, EngineError,
    InventoryItem, RiskTables, SearchStrategyKind,
};

/// The offer generation engine.
///
/// Holds the read-only risk tables and the shared offer cache; everything
/// else arrives per request. Cheap to share behind an `Arc` across
/// concurrent requests.
pub struct TradeUpEngine {
    tables: Arc<RiskTables>,
    cache: OfferCache,
}

impl TradeUpEngine {
    /// Engine with injected risk tables and the default in-memory cache.
    pub fn new(tables: RiskTables) -> Self {
        Self {
            tables: Arc::new(tables),
            cache: OfferCache::in_memory(),
        }
    }

    /// Engine with a caller-provided cache (custom TTL or backend).
    pub fn with_cache(tables: RiskTables, cache: OfferCache) -> Self {
        Self {
            tables: Arc::new(tables),
            cache,
        }
    }

    /// The risk tables this engine prices against.
    pub fn tables(&self) -> &RiskTables {
        &self.tables
    }

    /// Generate all trade-up offers for one customer.
    ///
    /// Validates the customer and configuration, serves cached results when
    /// the same (customer, configuration) pair was generated within the
    /// cache TTL, and otherwise runs the configured strategy and finalizer.
    ///
    /// Infeasibility is not an error: an empty offer set is a successful
    /// result. Cancellation returns an empty set flagged in the summary and
    /// skips the cache write.
    ///
    /// # Errors
    ///
    /// - `InvalidCustomer` for non-positive payment or price, or a risk
    ///   profile outside the closed set or the injected tables
    /// - `InvalidConfig` for structurally contradictory configuration
    /// - `InvalidRange` from range-mode parameter validation
    pub fn generate(
        &self,
        customer: &Customer,
        inventory: &[InventoryItem],
        config: &EngineConfig,
        cancel: &CancelToken,
    ) -> EngineResult<OfferSet> {
        let start = std::time::Instant::now();
        log::info!(
            "generating offers for customer {} over {} cars ({} strategy)",
            customer.customer_id,
            inventory.len(),
            config.strategy
        );

        self.validate_customer(customer)?;
        config.validate()?;

        let hash = config_hash(config)?;
        if let Some(cached) = self.cache.get(&customer.customer_id, &hash) {
            log::info!(
                "cache hit for customer {} (config {})",
                customer.customer_id,
                &hash[..12]
            );
            return Ok(cached);
        }

        let base_rate = self
            .tables
            .interest_rate(&customer.risk_profile_name)
            .ok_or_else(|| {
                EngineError::invalid_customer_field(
                    format!("no interest rate for risk profile {}", customer.risk_profile_name),
                    "risk_profile_name",
                )
            })?;

        let ctx = SearchContext {
            customer,
            inventory,
            base_rate,
            config,
            current_payment: customer.current_monthly_payment,
            tiers: &config.tiers,
            tables: &self.tables,
            cancel,
        };

        let outcome = strategy_for(config.strategy).run(&ctx)?;
        if outcome.cancelled {
            log::info!("generation cancelled for customer {}", customer.customer_id);
            return Ok(OfferSet::empty(true));
        }

        let per_tier_cap = match config.strategy {
            SearchStrategyKind::Range => Some(config.range.max_offers_per_tier),
            _ => None,
        };
        let groups = finalize_offers(
            outcome.offers,
            customer.current_monthly_payment,
            &config.tiers,
            per_tier_cap,
        );
        let offer_set = OfferSet::from_tiers(groups, outcome.combinations_tested);

        self.cache.put(&customer.customer_id, &hash, &offer_set);
        log::info!(
            "generated {} offers for customer {} in {}ms",
            offer_set.summary.total_offers,
            customer.customer_id,
            start.elapsed().as_millis()
        );
        Ok(offer_set)
    }

    fn validate_customer(&self, customer: &Customer) -> EngineResult<()> {
        if customer.current_monthly_payment <= rust_decimal::Decimal::ZERO {
            return Err(EngineError::invalid_customer_field(
                "current_monthly_payment must be positive",
                "current_monthly_payment",
            ));
        }
        if customer.current_car_price <= rust_decimal::Decimal::ZERO {
            return Err(EngineError::invalid_customer_field(
                "current_car_price must be positive",
                "current_car_price",
            ));
        }
        if risk_profile_index(&customer.risk_profile_name).is_none() {
            return Err(EngineError::invalid_customer_field(
                format!("unknown risk profile {}", customer.risk_profile_name),
                "risk_profile_name",
            ));
        }
        if self
            .tables
            .interest_rate(&customer.risk_profile_name)
            .is_none()
        {
            return Err(EngineError::invalid_customer_field(
                format!(
                    "risk profile {} missing from interest rate table",
                    customer.risk_profile_name
                ),
                "risk_profile_name",
            ));
        }
        if !self.tables.covers_risk_index(customer.risk_profile_index) {
            return Err(EngineError::invalid_customer_field(
                format!(
                    "risk index {} outside the down payment table",
                    customer.risk_profile_index
                ),
                "risk_profile_index",
            ));
        }
        Ok(())
    }
}

/// Get engine version information.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get engine build information.
pub fn engine_info() -> EngineInfo {
    EngineInfo {
        version: env!("CARGO_PKG_VERSION"),
        name: env!("CARGO_PKG_NAME"),
    }
}

/// Engine build information.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub version: &'static str,
    pub name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn customer() -> Customer {
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

    fn inventory() -> Vec<InventoryItem> {
        vec![InventoryItem {
            car_id: 1,
            model: "Hatch".to_string(),
            sales_price: dec!(185000),
            region: None,
            kilometers: None,
            color: None,
            has_promotion: false,
        }]
    }

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.contains('.'));
    }

    #[test]
    fn test_engine_info() {
        let info = engine_info();
        assert_eq!(info.name, "tradeup-engine");
    }

    #[test]
    fn test_rejects_nonpositive_payment() {
        let engine = TradeUpEngine::new(RiskTables::builtin());
        let mut bad = customer();
        bad.current_monthly_payment = dec!(0);
        let result = engine.generate(&bad, &inventory(), &EngineConfig::default(), &CancelToken::new());
        assert!(matches!(result, Err(EngineError::InvalidCustomer { .. })));
    }

    #[test]
    fn test_rejects_unknown_risk_profile() {
        let engine = TradeUpEngine::new(RiskTables::builtin());
        let mut bad = customer();
        bad.risk_profile_name = "NOT_A_PROFILE".to_string();
        let result = engine.generate(&bad, &inventory(), &EngineConfig::default(), &CancelToken::new());
        assert!(matches!(result, Err(EngineError::InvalidCustomer { .. })));
    }

    #[test]
    fn test_rejects_out_of_table_risk_index() {
        let engine = TradeUpEngine::new(RiskTables::builtin());
        let mut bad = customer();
        bad.risk_profile_index = 99;
        let result = engine.generate(&bad, &inventory(), &EngineConfig::default(), &CancelToken::new());
        assert!(matches!(result, Err(EngineError::InvalidCustomer { .. })));
    }

    #[test]
    fn test_empty_inventory_is_empty_success() {
        let engine = TradeUpEngine::new(RiskTables::builtin());
        let result = engine
            .generate(&customer(), &[], &EngineConfig::default(), &CancelToken::new())
            .unwrap();
        assert!(result.is_empty());
        assert!(!result.summary.cancelled);
    }

    #[test]
    fn test_cancelled_run_is_flagged_and_uncached() {
        let engine = TradeUpEngine::new(RiskTables::builtin());
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = engine
            .generate(&customer(), &inventory(), &EngineConfig::default(), &cancel)
            .unwrap();
        assert!(result.summary.cancelled);
        assert!(result.is_empty());

        // A later live run is not served the cancelled result.
        let live = engine
            .generate(&customer(), &inventory(), &EngineConfig::default(), &CancelToken::new())
            .unwrap();
        assert!(!live.summary.cancelled);
        assert!(!live.is_empty());
    }
}
