//! # Trade-Up Engine
//!
//! A pure Rust offer generation engine for vehicle trade-up financing.
//! Given a customer's loan and equity position plus an inventory of
//! replacement vehicles, it searches the feasible space of (vehicle, loan
//! term, fee parameters) and returns ranked offers partitioned into
//! payment-change tiers, filtered by a minimum NPV threshold.
//!
//! ## Features
//!
//! - **Pure functions** - Strategies and the evaluator never block or
//!   suspend; sweeps are sequential and deterministic
//! - **Precise math** - Uses `rust_decimal` for exact money calculations
//!   (no floating point); rounding to cents happens only at reporting
//!   boundaries
//! - **Typed configuration** - Explicit fields with documented defaults
//!   and a canonical JSON form for hashing and persistence
//! - **Best-effort caching** - Results keyed by (customer, config hash)
//!   with TTL; cache trouble never fails a request
//!
//! ## Architecture
//!
//! ```text
//! Request -> validate customer/config
//!         -> cache lookup (customer_id, sha256(canonical config))
//!         -> strategy (hierarchical | custom | range)
//!              -> evaluator per (car, term, fee set)
//!                   -> bucket-method payment + NPV
//!         -> finalizer (tiers, dedup, rank, cap, order)
//!         -> cache write -> OfferSet
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tradeup_engine::prelude::*;
//!
//! let engine = TradeUpEngine::new(RiskTables::builtin());
//! let offers = engine.generate(
//!     &customer,
//!     &inventory,
//!     &EngineConfig::default(),
//!     &CancelToken::new(),
//! )?;
//!
//! for group in &offers.offers_by_tier {
//!     println!("{}: {} offers", group.tier, group.offers.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod algorithms;
pub mod cache;
pub mod engine;
pub mod evaluator;
pub mod finalize;
pub mod strategies;
pub mod types;

// Re-export commonly used types
pub use types::{
    // Input records
    Customer, InventoryItem, RiskTables,

    // Configuration
    DeltaRange, EngineConfig, FeeSet, RangeParams, RangeSearchMethod, SearchStrategyKind,
    TermPriority, TierBoundaries,

    // Results
    GenerationSummary, Offer, OfferSet, ParameterCombination, Tier, TierOffers,

    // Common types
    CancelToken, DecimalExt, EngineError, EngineResult,

    // Constants
    INSURANCE_TERM_MONTHS, IVA_RATE, MAX_CAC_BONUS,
};

// Re-export engine entry points
pub use engine::{engine_info, engine_version, EngineInfo, TradeUpEngine};

// Re-export calculation surface used by hosts
pub use algorithms::{amortization_table, AmortizationRow, LoanTerms};
pub use cache::{
    canonical_config_json, config_hash, CacheBackend, CacheError, InMemoryBackend, OfferCache,
};

/// Prelude module for convenient imports.
pub mod prelude {
    //! Commonly used types and traits.
    //!
    //! ```rust,ignore
    //! use tradeup_engine::prelude::*;
    //! ```

    pub use crate::types::{
        CancelToken, Customer, DecimalExt, EngineConfig, EngineError, EngineResult, FeeSet,
        InventoryItem, OfferSet, RiskTables, SearchStrategyKind, Tier, TierBoundaries,
    };

    pub use crate::algorithms::{amortization_table, LoanTerms};
    pub use crate::cache::{config_hash, OfferCache};
    pub use crate::engine::TradeUpEngine;

    pub use rust_decimal::Decimal;
    pub use rust_decimal_macros::dec;
}
