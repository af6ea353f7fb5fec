//! Input records for offer generation.
//!
//! These structures represent the customer and inventory data handed in by
//! the host. They are immutable within a request; the engine never mutates
//! them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer's current loan and equity position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer identifier (cache key component).
    pub customer_id: String,

    /// Current monthly loan payment. Must be positive.
    pub current_monthly_payment: Decimal,

    /// Equity in the current vehicle. May be zero or negative.
    #[serde(default)]
    pub vehicle_equity: Decimal,

    /// Remaining balance on the current loan.
    #[serde(default)]
    pub outstanding_balance: Decimal,

    /// Price of the customer's current vehicle. Must be positive.
    pub current_car_price: Decimal,

    /// Risk profile name from the closed profile set.
    pub risk_profile_name: String,

    /// Index of the risk profile in the down-payment table.
    pub risk_profile_index: usize,
}

/// A replacement vehicle from inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique car identifier.
    pub car_id: i64,

    /// Model display name.
    pub model: String,

    /// Sales price. Must be positive.
    pub sales_price: Decimal,

    /// Region the car is listed in.
    #[serde(default)]
    pub region: Option<String>,

    /// Odometer reading.
    #[serde(default)]
    pub kilometers: Option<u32>,

    /// Exterior color.
    #[serde(default)]
    pub color: Option<String>,

    /// Whether the listing carries an active promotion.
    #[serde(default)]
    pub has_promotion: bool,
}

/// Map a risk profile name onto its table index.
///
/// The profile set is closed; unknown names return `None` and the
/// customer is rejected as invalid. `Low`/`Medium`/`High` are legacy
/// aliases for the first three letter grades.
pub fn risk_profile_index(name: &str) -> Option<usize> {
    let index = match name {
        "Low" | "AAA" => 0,
        "Medium" | "AA" => 1,
        "High" | "A" => 2,
        "A1" => 3,
        "A2" => 4,
        "B" => 5,
        "C1" => 6,
        "C2" => 7,
        "C3" => 8,
        "D1" => 9,
        "D2" => 10,
        "D3" => 11,
        "E1" => 12,
        "E2" => 13,
        "E3" => 14,
        "E4" => 15,
        "E5" => 16,
        "F1" => 17,
        "F2" => 18,
        "F3" => 19,
        "F4" => 20,
        "B_SB" => 21,
        "C1_SB" => 22,
        "C2_SB" => 23,
        "E5_SB" => 24,
        "Z" => 25,
        _ => return None,
    };
    Some(index)
}

/// Number of risk profile indices in the closed set.
pub const RISK_PROFILE_COUNT: usize = 26;
