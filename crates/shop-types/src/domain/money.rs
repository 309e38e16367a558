/// Converts a decimal euro amount to whole cents, rounding half away from zero.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Formats cents the way the shop prints prices, e.g. `12,50 €`.
pub fn format_eur(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}{},{:02} €", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_and_formats() {
        assert_eq!(to_cents(10.0), 1000);
        assert_eq!(to_cents(5.5), 550);
        assert_eq!(to_cents(14.95), 1495);
        assert_eq!(format_eur(2550), "25,50 €");
        assert_eq!(format_eur(5), "0,05 €");
        assert_eq!(format_eur(-120), "-1,20 €");
    }
}
