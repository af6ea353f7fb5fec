//! Bucket-method payment calculation.
//!
//! Each financed component is amortized independently and the per-period
//! amounts are summed. The accounting convention keeps value-added tax
//! explicit: the principal split runs at the tax-grossed monthly rate
//! `annual * (1 + IVA) / 12`, the interest split runs at the base monthly
//! rate `annual / 12` and is then multiplied by `(1 + IVA)`. The two
//! together reproduce a single PMT at the tax-grossed rate, but keep the
//! tax visible per component.
//!
//! Buckets: main loan, service fee and Kavak-Total amortize over the loan
//! term; insurance always amortizes over a fixed 12-month horizon. The GPS
//! monthly fee (with tax) is added flat to every month and is never
//! financed.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::amortization::{interest_for_period, npv, principal_for_period};
use crate::types::{INSURANCE_TERM_MONTHS, IVA_RATE};

/// Inputs to the bucket-method payment calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentInputs {
    /// Main loan principal (car price minus effective equity).
    pub loan_principal: Decimal,
    /// Annual base rate, term premium already applied.
    pub annual_rate: Decimal,
    /// Loan term in months.
    pub term_months: u32,
    /// Financed service fee amount.
    pub service_fee_amount: Decimal,
    /// Financed Kavak-Total amount.
    pub kavak_total_amount: Decimal,
    /// Financed insurance amount (12-month horizon).
    pub insurance_amount: Decimal,
    /// GPS monthly fee with tax, added flat.
    pub gps_monthly_with_tax: Decimal,
}

impl PaymentInputs {
    /// The financed buckets as (amount, horizon) pairs.
    fn buckets(&self) -> [(Decimal, u32); 4] {
        [
            (self.loan_principal, self.term_months),
            (self.service_fee_amount, self.term_months),
            (self.kavak_total_amount, self.term_months),
            (self.insurance_amount, INSURANCE_TERM_MONTHS),
        ]
    }
}

/// First-month payment of one bucket under the two-rate convention.
fn bucket_payment(amount: Decimal, horizon: u32, annual_rate: Decimal) -> Option<Decimal> {
    if amount.is_zero() || horizon == 0 {
        return Some(Decimal::ZERO);
    }
    let gross = Decimal::ONE + IVA_RATE;
    let rate_principal = annual_rate * gross / dec!(12);
    let rate_interest = annual_rate / dec!(12);

    let principal = principal_for_period(rate_principal, 1, horizon, amount)?;
    let interest = interest_for_period(rate_interest, 1, horizon, amount)?.checked_mul(gross)?;
    principal.checked_add(interest)
}

/// Total monthly payment across all buckets plus the flat GPS fee.
///
/// Zero buckets and zero rates contribute zero; `None` signals arithmetic
/// breakdown and the candidate offer is dropped.
pub fn monthly_payment(inputs: &PaymentInputs) -> Option<Decimal> {
    let mut total = inputs.gps_monthly_with_tax;
    for (amount, horizon) in inputs.buckets() {
        total = total.checked_add(bucket_payment(amount, horizon, inputs.annual_rate)?)?;
    }
    Some(total)
}

/// Net present value of the lender's interest cash-flow stream.
///
/// The stream sums the scheduled interest of every financed bucket per
/// period (insurance contributes only through month 12), computed and
/// discounted at the base monthly rate without tax, with period 0 carrying
/// no flow. Non-positive financing yields zero.
pub fn loan_npv(inputs: &PaymentInputs) -> Option<Decimal> {
    let total_financed = inputs.loan_principal
        + inputs.service_fee_amount
        + inputs.kavak_total_amount
        + inputs.insurance_amount;
    if total_financed <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    let rate_interest = inputs.annual_rate / dec!(12);
    let horizon = inputs.term_months.max(INSURANCE_TERM_MONTHS);

    let mut stream = Vec::with_capacity(horizon as usize + 1);
    stream.push(Decimal::ZERO);
    for period in 1..=horizon {
        let mut flow = Decimal::ZERO;
        for (amount, bucket_horizon) in inputs.buckets() {
            if amount.is_zero() {
                continue;
            }
            flow = flow
                .checked_add(interest_for_period(rate_interest, period, bucket_horizon, amount)?)?;
        }
        stream.push(flow);
    }

    npv(rate_interest, &stream)
}
