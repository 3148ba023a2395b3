//! Currency conversion over a rate table

use crate::core::error::ConversionError;
use crate::core::rates::RateTable;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Currencies shown on the rates screen, in display order.
pub const MAIN_CURRENCIES: [&str; 10] = [
    "EUR", "IDR", "SGD", "MYR", "JPY", "GBP", "AUD", "CNY", "HKD", "KRW",
];

/// Converts amounts between currencies by routing through the pivot currency.
#[derive(Debug, Clone, Copy)]
pub struct ConversionEngine<'a> {
    rates: &'a RateTable,
}

impl<'a> ConversionEngine<'a> {
    pub fn new(rates: &'a RateTable) -> Self {
        Self { rates }
    }

    /// Converts `amount` from one currency to another, rounded to cents.
    ///
    /// Codes are case-insensitive. Fails with
    /// [`ConversionError::UnsupportedCurrency`] when either code has no rate.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, ConversionError> {
        let from = normalize_code(from);
        let to = normalize_code(to);

        let (Some(from_rate), Some(to_rate)) = (self.rates.get(&from), self.rates.get(&to)) else {
            return Err(ConversionError::UnsupportedCurrency);
        };

        let in_pivot = amount / from_rate;
        Ok(round_half_even(in_pivot * to_rate, 2))
    }

    /// Main currencies present in the table, with their rates.
    pub fn snapshot(&self) -> Vec<(&'static str, f64)> {
        MAIN_CURRENCIES
            .iter()
            .filter_map(|code| self.rates.get(code).map(|rate| (*code, rate)))
            .collect()
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Rounds to `dp` decimal places, ties to even, on the exact binary value.
pub fn round_half_even(value: f64, dp: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(dp))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| {
            let factor = 10f64.powi(dp as i32);
            (value * factor).round_ties_even() / factor
        })
}

/// Formats a number with `decimals` places and comma-grouped thousands.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }

    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}
