//! Rendering of values and balances.
//!
//! Formatting honours the display conventions learned for each currency:
//! thousand grouping, decimal separator, precision, and symbol placement.
//! Digits beyond the shown precision are truncated, not rounded. In `full`
//! mode enough fractional digits are emitted for the text to lex back to
//! the exact stored amount, which is what canonical re-emission relies on.

use crate::amount::U;
use crate::balance::Balance;
use crate::currency::Currency;
use crate::ledger::Ledger;
use crate::Value;

/// Format a scaled amount using a currency's display conventions.
///
/// With no currency the amount is rendered bare: no grouping, no symbol,
/// and fractional digits only in `full` mode.
#[must_use]
pub fn format_amount(amount: i64, currency: Option<&Currency>, full: bool) -> String {
    let blank = Currency::new("");
    let currency = currency.unwrap_or(&blank);

    const U128: u128 = U as u128;
    let negative = amount < 0;
    let wide = i128::from(amount).unsigned_abs();
    let int_part = wide / U128;
    let frac_part = (wide % U128) as u32;

    let precision = currency.precision.min(8);
    let shown = if full {
        precision.max(significant_digits(frac_part))
    } else {
        precision
    };

    // The sign sticks to the digits, not to the symbol: `$-12.50` lexes
    // back (the `$` keeps the token in currency-then-amount form) where
    // `-$12.50` would not.
    let mut digits = String::new();
    if negative {
        digits.push('-');
    }
    digits.push_str(&group_digits(&int_part.to_string(), &currency.thousand));
    if shown > 0 {
        let frac = format!("{frac_part:08}");
        digits.push_str(currency.decimal_or_default());
        digits.push_str(&frac[..shown as usize]);
    }

    if currency.name.is_empty() {
        return digits;
    }
    let mut out = String::new();
    if currency.prefix {
        out.push_str(&currency.name);
        if currency.space {
            out.push(' ');
        }
        out.push_str(&digits);
    } else {
        out.push_str(&digits);
        if currency.space {
            out.push(' ');
        }
        out.push_str(&currency.name);
    }
    out
}

/// Number of fractional digits needed to represent `frac` exactly.
fn significant_digits(mut frac: u32) -> u32 {
    if frac == 0 {
        return 0;
    }
    let mut digits = 8;
    while frac % 10 == 0 {
        frac /= 10;
        digits -= 1;
    }
    digits
}

/// Insert a thousand separator every three digits, counting from the right.
fn group_digits(digits: &str, thousand: &str) -> String {
    if thousand.is_empty() {
        return digits.to_string();
    }
    let mut out = String::new();
    let len = digits.len();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(thousand);
        }
        out.push(ch);
    }
    out
}

impl Ledger {
    /// Render a value with its currency's display conventions.
    #[must_use]
    pub fn format_value(&self, value: Value, full: bool) -> String {
        format_amount(value.amount, Some(self.currency(value.currency)), full)
    }

    /// Render a balance as comma-separated per-currency values, `0` when
    /// empty.
    #[must_use]
    pub fn format_balance(&self, balance: &Balance) -> String {
        if balance.is_empty() {
            return "0".to_string();
        }
        balance
            .iter()
            .map(|(currency, amount)| {
                format_amount(amount, Some(self.currency(currency)), false)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyId;

    struct Case {
        amount: i64,
        precision: u32,
        thousand: &'static str,
        decimal: &'static str,
        name: &'static str,
        prefix: bool,
        space: bool,
        want: &'static str,
    }

    fn currency(case: &Case) -> Currency {
        let mut c = Currency::new(case.name);
        c.precision = case.precision;
        c.thousand = case.thousand.to_string();
        c.decimal = case.decimal.to_string();
        c.prefix = case.prefix;
        c.space = case.space;
        c
    }

    #[test]
    fn test_format_amount_table() {
        let cases = [
            Case { amount: 0, precision: 0, thousand: "", decimal: "", name: "", prefix: false, space: false, want: "0" },
            Case { amount: U, precision: 0, thousand: "", decimal: "", name: "", prefix: false, space: false, want: "1" },
            Case { amount: U, precision: 1, thousand: "", decimal: "", name: "", prefix: false, space: false, want: "1.0" },
            Case { amount: U, precision: 3, thousand: "", decimal: "", name: "", prefix: false, space: false, want: "1.000" },
            Case { amount: U, precision: 3, thousand: "", decimal: "'", name: "", prefix: false, space: false, want: "1'000" },
            Case { amount: 123_450_000, precision: 0, thousand: "", decimal: "'", name: "", prefix: false, space: false, want: "1" },
            Case { amount: 123_450_000, precision: 2, thousand: "", decimal: ",", name: "", prefix: false, space: false, want: "1,23" },
            Case { amount: 23_450_000, precision: 2, thousand: "", decimal: "", name: "", prefix: false, space: false, want: "0.23" },
            Case { amount: 9876 * U + 23_450_000, precision: 2, thousand: "", decimal: "", name: "", prefix: false, space: false, want: "9876.23" },
            Case { amount: 9876 * U + 23_456_000, precision: 2, thousand: ",", decimal: "", name: "", prefix: false, space: false, want: "9,876.23" },
            Case { amount: 12_000 * U + 99_999_000, precision: 0, thousand: ",", decimal: "", name: "", prefix: false, space: false, want: "12,000" },
            Case { amount: 10 * U, precision: 0, thousand: ",", decimal: "", name: "", prefix: false, space: false, want: "10" },
            Case { amount: 100 * U, precision: 0, thousand: ",", decimal: "", name: "", prefix: false, space: false, want: "100" },
            Case { amount: 1_000 * U, precision: 0, thousand: ",", decimal: "", name: "", prefix: false, space: false, want: "1,000" },
            Case { amount: 10_000 * U, precision: 0, thousand: "", decimal: "", name: "", prefix: false, space: false, want: "10000" },
            Case { amount: 100_000 * U, precision: 0, thousand: ".", decimal: "", name: "", prefix: false, space: false, want: "100.000" },
            Case { amount: 1_000_000 * U, precision: 0, thousand: " ", decimal: "", name: "", prefix: false, space: false, want: "1 000 000" },
            Case { amount: 23 * U + 45_000_000, precision: 2, thousand: "", decimal: ",", name: "€", prefix: false, space: false, want: "23,45€" },
            Case { amount: 23 * U + 45_000_000, precision: 2, thousand: "", decimal: ",", name: "EUR", prefix: false, space: true, want: "23,45 EUR" },
            Case { amount: 23 * U + 45_000_000, precision: 2, thousand: "", decimal: ".", name: "USD", prefix: true, space: true, want: "USD 23.45" },
            Case { amount: 23 * U + 45_000_000, precision: 2, thousand: "", decimal: ".", name: "$", prefix: true, space: false, want: "$23.45" },
        ];
        for case in &cases {
            let c = currency(case);
            assert_eq!(
                format_amount(case.amount, Some(&c), false),
                case.want,
                "amount {}",
                case.amount
            );
        }
    }

    #[test]
    fn test_format_amount_negative() {
        let mut c = Currency::new("$");
        c.prefix = true;
        c.precision = 2;
        c.decimal = ".".to_string();
        assert_eq!(format_amount(-1_250_000_000, Some(&c), false), "$-12.50");

        let mut eur = Currency::new("EUR");
        eur.precision = 2;
        eur.decimal = ",".to_string();
        eur.space = true;
        assert_eq!(format_amount(-1_250_000_000, Some(&eur), false), "-12,50 EUR");
    }

    #[test]
    fn test_format_amount_full_extends_precision() {
        let mut c = Currency::new("X");
        c.precision = 2;
        c.decimal = ".".to_string();
        c.space = true;
        // 1.2345 shows as 1.23 normally but 1.2345 in full mode
        assert_eq!(format_amount(123_450_000, Some(&c), false), "1.23 X");
        assert_eq!(format_amount(123_450_000, Some(&c), true), "1.2345 X");
        // full mode still pads to the declared precision
        assert_eq!(format_amount(150_000_000, Some(&c), true), "1.50 X");
        // integral amounts gain no decimals beyond the precision
        assert_eq!(format_amount(2 * U, Some(&c), true), "2.00 X");
    }

    #[test]
    fn test_format_amount_bare() {
        assert_eq!(format_amount(0, None, false), "0");
        assert_eq!(format_amount(3 * U, None, false), "3");
        assert_eq!(format_amount(U / 2, None, true), "0.5");
    }

    #[test]
    fn test_format_balance() {
        let mut ledger = Ledger::new();
        let (eur, _) = ledger.ensure_currency("EUR");
        ledger.currency_mut(eur).precision = 2;
        ledger.currency_mut(eur).decimal = ".".to_string();
        ledger.currency_mut(eur).space = true;

        let mut balance = Balance::new();
        assert_eq!(ledger.format_balance(&balance), "0");
        balance.add_amount(eur, 5 * U);
        assert_eq!(ledger.format_balance(&balance), "5.00 EUR");
        balance.add_amount(CurrencyId::new(0), 0);
        assert_eq!(ledger.format_balance(&balance), "5.00 EUR");
    }
}
