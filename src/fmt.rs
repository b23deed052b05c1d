/// Format an amount the Argentine way, currency first: `ARS 1.234,56`.
pub fn money(val: f64, currency: &str) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    let sign = if negative { "-" } else { "" };
    format!("{sign}{currency} {grouped},{dec_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56, "ARS"), "ARS 1.234,56");
        assert_eq!(money(-500.0, "ARS"), "-ARS 500,00");
        assert_eq!(money(0.0, "USD"), "USD 0,00");
        assert_eq!(money(1000000.99, "ARS"), "ARS 1.000.000,99");
        assert_eq!(money(42.1, "ARS"), "ARS 42,10");
    }
}
