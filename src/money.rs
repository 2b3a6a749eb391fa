//! Conversion between stored cents and the decimal units exposed over the API.

/// Convert a decimal amount (e.g. `12.5`) to cents, rounding to the nearest cent.
pub fn to_cents(amount: f64) -> Result<i32, String> {
    if !amount.is_finite() {
        return Err("Price must be a finite number".to_string());
    }
    if amount < 0.0 {
        return Err("Price cannot be negative".to_string());
    }
    let cents = (amount * 100.0).round();
    if cents > f64::from(i32::MAX) {
        return Err("Price is too large".to_string());
    }
    Ok(cents as i32)
}

pub fn from_cents(cents: i32) -> f64 {
    f64::from(cents) / 100.0
}

pub fn from_cents_total(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Format cents as a receipt amount, e.g. `R$ 50.00`.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}R$ {}.{:02}", abs / 100, abs % 100)
}
