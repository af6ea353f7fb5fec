//! Financial calculation algorithms.
//!
//! - `amortization` - Level-payment primitives, NPV, amortization tables
//! - `payment` - Bucket-method monthly payment and loan NPV stream

pub mod amortization;
pub mod payment;

pub use amortization::{
    amortization_table, interest_for_period, level_payment, npv, principal_for_period,
    AmortizationRow, LoanTerms,
};
pub use payment::{loan_npv, monthly_payment, PaymentInputs};
