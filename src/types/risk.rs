//! Risk-profile tables.
//!
//! Three process-wide lookup tables drive pricing: annual interest rate by
//! risk profile name, minimum down-payment fraction by (risk index, term),
//! and the insurance amount by risk profile name. They are loaded once at
//! startup and injected into the engine as a read-only dependency so tests
//! can substitute fixtures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::customer::RISK_PROFILE_COUNT;

/// Contract loan terms, in months.
pub const CONTRACT_TERMS: [u32; 6] = [12, 24, 36, 48, 60, 72];

/// Read-only pricing tables keyed by risk profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTables {
    /// Annual base interest rate by risk profile name.
    interest_rates: HashMap<String, Decimal>,

    /// Minimum down-payment fraction, indexed by risk index then term.
    min_down_payment: Vec<HashMap<u32, Decimal>>,

    /// Insurance amount by risk profile name.
    insurance: HashMap<String, Decimal>,
}

impl RiskTables {
    /// Build tables from host-loaded data.
    pub fn new(
        interest_rates: HashMap<String, Decimal>,
        min_down_payment: Vec<HashMap<u32, Decimal>>,
        insurance: HashMap<String, Decimal>,
    ) -> Self {
        Self {
            interest_rates,
            min_down_payment,
            insurance,
        }
    }

    /// Production-shaped builtin tables.
    ///
    /// Rates rise with risk index from 15.5% annual; the required down
    /// payment rises with both risk and term; insurance rises by risk band.
    /// Hosts with warehouse-backed tables inject them through [`Self::new`].
    pub fn builtin() -> Self {
        let names: [&str; RISK_PROFILE_COUNT] = [
            "AAA", "AA", "A", "A1", "A2", "B", "C1", "C2", "C3", "D1", "D2", "D3", "E1", "E2",
            "E3", "E4", "E5", "F1", "F2", "F3", "F4", "B_SB", "C1_SB", "C2_SB", "E5_SB", "Z",
        ];

        let mut interest_rates = HashMap::new();
        let mut insurance = HashMap::new();
        let mut min_down_payment = Vec::with_capacity(RISK_PROFILE_COUNT);

        for (index, name) in names.iter().enumerate() {
            let idx = Decimal::from(index as u32);
            interest_rates.insert(name.to_string(), dec!(0.155) + idx * dec!(0.01));

            let premium = match index {
                0..=5 => dec!(10999),
                6..=11 => dec!(11999),
                12..=16 => dec!(12999),
                _ => dec!(13999),
            };
            insurance.insert(name.to_string(), premium);

            let mut by_term = HashMap::new();
            for (slot, term) in CONTRACT_TERMS.iter().enumerate() {
                let term_step = Decimal::from(slot as u32) * dec!(0.01);
                by_term.insert(*term, dec!(0.10) + idx * dec!(0.005) + term_step);
            }
            min_down_payment.push(by_term);
        }

        // Legacy aliases share the first three grades' pricing.
        for (alias, canonical) in [("Low", "AAA"), ("Medium", "AA"), ("High", "A")] {
            let rate = interest_rates[canonical];
            let premium = insurance[canonical];
            interest_rates.insert(alias.to_string(), rate);
            insurance.insert(alias.to_string(), premium);
        }

        Self {
            interest_rates,
            min_down_payment,
            insurance,
        }
    }

    /// Annual base rate for a risk profile name.
    pub fn interest_rate(&self, risk_profile_name: &str) -> Option<Decimal> {
        self.interest_rates.get(risk_profile_name).copied()
    }

    /// Minimum down-payment fraction for a (risk index, term) pair.
    pub fn min_down_payment(&self, risk_index: usize, term_months: u32) -> Option<Decimal> {
        self.min_down_payment
            .get(risk_index)
            .and_then(|by_term| by_term.get(&term_months))
            .copied()
    }

    /// Insurance amount for a risk profile name.
    pub fn insurance_amount(&self, risk_profile_name: &str) -> Option<Decimal> {
        self.insurance.get(risk_profile_name).copied()
    }

    /// Whether the tables cover the given risk index at all contract terms.
    pub fn covers_risk_index(&self, risk_index: usize) -> bool {
        self.min_down_payment.len() > risk_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_all_profiles() {
        let tables = RiskTables::builtin();
        for name in ["AAA", "A", "B_SB", "Z", "Low", "Medium", "High"] {
            assert!(tables.interest_rate(name).is_some(), "missing rate for {name}");
            assert!(tables.insurance_amount(name).is_some(), "missing insurance for {name}");
        }
        for index in 0..RISK_PROFILE_COUNT {
            for term in CONTRACT_TERMS {
                assert!(tables.min_down_payment(index, term).is_some());
            }
        }
    }

    #[test]
    fn test_builtin_rates_rise_with_risk() {
        let tables = RiskTables::builtin();
        assert!(tables.interest_rate("Z").unwrap() > tables.interest_rate("AAA").unwrap());
        assert_eq!(tables.interest_rate("A").unwrap(), dec!(0.175));
    }

    #[test]
    fn test_builtin_down_payment_rises_with_term() {
        let tables = RiskTables::builtin();
        let dp_12 = tables.min_down_payment(2, 12).unwrap();
        let dp_72 = tables.min_down_payment(2, 72).unwrap();
        assert!(dp_72 > dp_12);
        assert_eq!(tables.min_down_payment(2, 60).unwrap(), dec!(0.15));
    }

    #[test]
    fn test_unknown_lookups() {
        let tables = RiskTables::builtin();
        assert!(tables.interest_rate("NOPE").is_none());
        assert!(tables.min_down_payment(99, 36).is_none());
        assert!(tables.min_down_payment(2, 13).is_none());
    }

    #[test]
    fn test_alias_pricing_matches_canonical() {
        let tables = RiskTables::builtin();
        assert_eq!(tables.interest_rate("High"), tables.interest_rate("A"));
        assert_eq!(tables.insurance_amount("Low"), tables.insurance_amount("AAA"));
    }
}
