//! Loan amortization primitives.
//!
//! Standard level-payment amortization for a fixed-rate loan:
//!
//! ```text
//! P = pv * r / (1 - (1+r)^-n)        (r = 0 degenerates to pv / n)
//! interest_k  = balance_{k-1} * r
//! principal_k = P - interest_k
//! ```
//!
//! All functions return `Option<Decimal>`: `None` signals arithmetic
//! breakdown (overflow, vanishing discount denominator) from a pathological
//! parameter combination. Callers drop the candidate and move on. A zero
//! present value yields zero splits, never a division by zero. Negative
//! rates are accepted numerically.
//!
//! Amounts are positive for lender inflows. No rounding happens here;
//! reporting boundaries round to cents.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::offer::Offer;
use crate::types::{DecimalExt, EngineError, EngineResult};

/// Compute `base^exp` by binary exponentiation with overflow checks.
fn checked_pow(base: Decimal, exp: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut current = base;
    let mut remaining = exp;

    while remaining > 0 {
        if remaining % 2 == 1 {
            result = result.checked_mul(current)?;
        }
        remaining /= 2;
        if remaining > 0 {
            current = current.checked_mul(current)?;
        }
    }

    Some(result)
}

/// `(1 + rate)^-periods`, or `None` when the growth factor vanishes.
fn discount_factor(rate_per_period: Decimal, periods: u32) -> Option<Decimal> {
    let growth = checked_pow(Decimal::ONE + rate_per_period, periods)?;
    if growth.is_zero() {
        return None;
    }
    Decimal::ONE.checked_div(growth)
}

/// The constant periodic payment for a level-payment loan.
pub fn level_payment(
    rate_per_period: Decimal,
    total_periods: u32,
    present_value: Decimal,
) -> Option<Decimal> {
    if present_value.is_zero() || total_periods == 0 {
        return Some(Decimal::ZERO);
    }
    if rate_per_period.is_zero() {
        return present_value.checked_div(Decimal::from(total_periods));
    }

    let denominator = Decimal::ONE - discount_factor(rate_per_period, total_periods)?;
    if denominator.is_zero() {
        return None;
    }
    present_value.checked_mul(rate_per_period)?.checked_div(denominator)
}

/// Outstanding balance after `periods_elapsed` scheduled payments.
fn balance_after(
    rate_per_period: Decimal,
    periods_elapsed: u32,
    total_periods: u32,
    present_value: Decimal,
) -> Option<Decimal> {
    if rate_per_period.is_zero() {
        let principal_per_period = present_value.checked_div(Decimal::from(total_periods))?;
        return present_value
            .checked_sub(principal_per_period.checked_mul(Decimal::from(periods_elapsed))?);
    }

    // balance_k = pv*(1+r)^k - P*((1+r)^k - 1)/r
    let payment = level_payment(rate_per_period, total_periods, present_value)?;
    let growth = checked_pow(Decimal::ONE + rate_per_period, periods_elapsed)?;
    let accumulated = payment
        .checked_mul(growth - Decimal::ONE)?
        .checked_div(rate_per_period)?;
    present_value.checked_mul(growth)?.checked_sub(accumulated)
}

/// Interest portion of the scheduled payment in `period_index` (1-based).
pub fn interest_for_period(
    rate_per_period: Decimal,
    period_index: u32,
    total_periods: u32,
    present_value: Decimal,
) -> Option<Decimal> {
    if present_value.is_zero() || period_index == 0 || period_index > total_periods {
        return Some(Decimal::ZERO);
    }
    let balance = balance_after(rate_per_period, period_index - 1, total_periods, present_value)?;
    balance.checked_mul(rate_per_period)
}

/// Principal portion of the scheduled payment in `period_index` (1-based).
pub fn principal_for_period(
    rate_per_period: Decimal,
    period_index: u32,
    total_periods: u32,
    present_value: Decimal,
) -> Option<Decimal> {
    if present_value.is_zero() || period_index == 0 || period_index > total_periods {
        return Some(Decimal::ZERO);
    }
    let payment = level_payment(rate_per_period, total_periods, present_value)?;
    let interest = interest_for_period(rate_per_period, period_index, total_periods, present_value)?;
    payment.checked_sub(interest)
}

/// Net present value of a cash-flow stream.
///
/// `cashflows[0]` is at period 0 (undiscounted); element `k` is discounted
/// by `(1+rate)^k`.
pub fn npv(rate_per_period: Decimal, cashflows: &[Decimal]) -> Option<Decimal> {
    let mut total = Decimal::ZERO;
    for (period, cashflow) in cashflows.iter().enumerate() {
        let factor = discount_factor(rate_per_period, period as u32)?;
        total = total.checked_add(cashflow.checked_mul(factor)?)?;
    }
    Some(total)
}

/// The loan figures an amortization table is generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub loan_amount: Decimal,
    pub monthly_payment: Decimal,
    pub term_months: u32,
    /// Annual rate; the table accrues at `annual_rate / 12`.
    pub annual_rate: Decimal,
}

impl From<&Offer> for LoanTerms {
    fn from(offer: &Offer) -> Self {
        Self {
            loan_amount: offer.loan_amount,
            monthly_payment: offer.monthly_payment,
            term_months: offer.term_months,
            annual_rate: offer.interest_rate,
        }
    }
}

/// Single amortization table row. Values are rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Payment number (1-indexed).
    pub month: u32,
    /// Balance before this payment.
    pub beginning_balance: Decimal,
    /// Total payment this month; the final one may be truncated.
    pub payment: Decimal,
    /// Principal portion.
    pub principal: Decimal,
    /// Interest portion.
    pub interest: Decimal,
    /// Balance after this payment.
    pub ending_balance: Decimal,
}

/// Generate the month-by-month amortization table for a loan.
///
/// Emits up to `term_months` rows and stops early once the balance reaches
/// zero. The final payment is truncated so principal never exceeds the
/// remaining balance. The running balance stays unrounded; each row's
/// reported values are rounded to cents.
///
/// # Errors
///
/// `InvalidLoanParams` when `loan_amount <= 0`, `monthly_payment <= 0` or
/// `term_months == 0`.
pub fn amortization_table(terms: &LoanTerms) -> EngineResult<Vec<AmortizationRow>> {
    if terms.loan_amount <= Decimal::ZERO {
        return Err(EngineError::invalid_loan_params("loan_amount must be positive"));
    }
    if terms.monthly_payment <= Decimal::ZERO {
        return Err(EngineError::invalid_loan_params("monthly_payment must be positive"));
    }
    if terms.term_months == 0 {
        return Err(EngineError::invalid_loan_params("term_months must be positive"));
    }

    let monthly_rate = terms.annual_rate / dec!(12);
    let mut table = Vec::with_capacity(terms.term_months as usize);
    let mut balance = terms.loan_amount;

    for month in 1..=terms.term_months {
        let interest = balance * monthly_rate;
        let mut principal = terms.monthly_payment - interest;
        let payment = if principal > balance {
            principal = balance;
            balance + interest
        } else {
            terms.monthly_payment
        };

        let beginning_balance = balance;
        balance = (balance - principal).max(Decimal::ZERO);

        table.push(AmortizationRow {
            month,
            beginning_balance: beginning_balance.round_money(),
            payment: payment.round_money(),
            principal: principal.round_money(),
            interest: interest.round_money(),
            ending_balance: balance.round_money(),
        });

        if balance.is_zero() {
            break;
        }
    }

    Ok(table)
}
