//! Per-candidate offer evaluation.
//!
//! Given (customer, car, term, fee set), apply the hard business filters in
//! order and return either a fully-costed [`Offer`] or nothing. The checks
//! run on unrounded intermediates; monetary fields are rounded to cents
//! only when the offer is emitted.
//!
//! Ordered checks:
//!
//! 1. Price filter: the new car must cost more than the current one
//! 2. Effective equity after CAC bonus, CXA and GPS installation
//! 3. Positive main-loan principal
//! 4. Fee amounts (insurance falls back to the risk-profile table)
//! 5. Total financed amount
//! 6. Minimum down-payment requirement
//! 7. Term-premium interest rate
//! 8. Bucket-method monthly payment
//! 9. Payment delta inside at least one tier interval
//! 10. NPV of the interest stream
//!
//! Arithmetic breakdown at any step silently rejects the candidate; the
//! surrounding sweep continues.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::algorithms::payment::{loan_npv, monthly_payment, PaymentInputs};
use crate::types::offer::Offer;
use crate::types::{Customer, DecimalExt, FeeSet, InventoryItem, RiskTables, TierBoundaries, IVA_RATE};

/// Rate premium applied to long terms.
pub fn term_premium(term_months: u32) -> Decimal {
    match term_months {
        60 => dec!(0.01),
        72 => dec!(0.015),
        _ => Decimal::ZERO,
    }
}

/// Evaluate a single (customer, car, term, fee set) candidate.
pub fn evaluate_offer(
    customer: &Customer,
    car: &InventoryItem,
    term_months: u32,
    base_rate: Decimal,
    fees: &FeeSet,
    tiers: &TierBoundaries,
    tables: &RiskTables,
) -> Option<Offer> {
    // 1. Hard filter: the trade-up must move the customer up in price.
    if car.sales_price <= customer.current_car_price {
        return None;
    }

    // 2. Upfront charges deducted from equity, never financed.
    let gross = Decimal::ONE + IVA_RATE;
    let gps_install_with_tax = fees.gps_installation_fee.checked_mul(gross)?;
    let gps_monthly_with_tax = fees.gps_monthly_fee.checked_mul(gross)?;
    let cxa_amount = car.sales_price.checked_mul(fees.cxa_pct)?;

    let effective_equity =
        customer.vehicle_equity + fees.cac_bonus - cxa_amount - gps_install_with_tax;

    // 3. Main loan principal after applying effective equity.
    let loan_principal_needed = car.sales_price - effective_equity;
    if loan_principal_needed <= Decimal::ZERO {
        return None;
    }

    // 4. Financed fee amounts.
    let service_fee_amount = car.sales_price.checked_mul(fees.service_fee_pct)?;
    let kavak_total_amount = fees.kavak_total_amount;
    let insurance_amount = fees
        .insurance_amount
        .or_else(|| tables.insurance_amount(&customer.risk_profile_name))?;

    // 5. Everything the lender finances.
    let total_financed =
        loan_principal_needed + service_fee_amount + kavak_total_amount + insurance_amount;

    // 6. Down-payment requirement against effective equity.
    let required_pct = tables.min_down_payment(customer.risk_profile_index, term_months)?;
    if effective_equity < car.sales_price.checked_mul(required_pct)? {
        return None;
    }

    // 7. Term-dependent rate.
    let final_rate = base_rate + term_premium(term_months);

    // 8. Bucket-method payment.
    let inputs = PaymentInputs {
        loan_principal: loan_principal_needed,
        annual_rate: final_rate,
        term_months,
        service_fee_amount,
        kavak_total_amount,
        insurance_amount,
        gps_monthly_with_tax,
    };
    let payment = monthly_payment(&inputs)?;

    // 9. Payment delta must land in some tier.
    let payment_delta = payment.checked_div(customer.current_monthly_payment)? - Decimal::ONE;
    tiers.classify(payment_delta)?;

    // 10. Lender NPV of the interest stream.
    let npv = loan_npv(&inputs)?;

    Some(Offer {
        car_id: car.car_id,
        car_model: car.model.clone(),
        new_car_price: car.sales_price,
        term_months,
        monthly_payment: payment.round_money(),
        payment_delta,
        loan_amount: total_financed.round_money(),
        effective_equity: effective_equity.round_money(),
        cxa_amount: cxa_amount.round_money(),
        service_fee_amount: service_fee_amount.round_money(),
        kavak_total_amount: kavak_total_amount.round_money(),
        insurance_amount: insurance_amount.round_money(),
        gps_install_fee: gps_install_with_tax.round_money(),
        gps_monthly_fee: gps_monthly_with_tax.round_money(),
        interest_rate: final_rate,
        npv: npv.round_money(),
        fees_applied: fees.clone(),
        parameter_combination: None,
        tier: None,
        npv_rank_within_tier: None,
    })
}
