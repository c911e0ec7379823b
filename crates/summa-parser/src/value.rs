//! The value lexer.
//!
//! A value token couples digits with a currency symbol, in either order,
//! with or without a space between them: `$12.50`, `1.234,56 EUR`,
//! `-90 EUR`, `1000`. While accumulating the amount the lexer *learns* the
//! currency's display conventions - prefix vs suffix, spacing, thousand and
//! decimal separators, precision - and refines the interned currency as it
//! goes.
//!
//! The tricky part is that `.` and `,` are ambiguous inside a single token:
//! `1.234` could be one-point-two-three-four or one thousand two hundred
//! and thirty-four. Classification is resolved *within* the token where
//! possible (a repeated separator must be the thousands sign; two different
//! separators order themselves), deferred against the currency's known
//! conventions otherwise, and rejected when genuinely ambiguous.

use summa_core::{Ledger, Value, MAX_PRECISION};
use thiserror::Error;

/// Characters allowed in the digits part when the amount comes first.
const AMOUNT_THEN_CURRENCY: &str = "-+0123456789.,_'";
/// Characters allowed in the digits part when the currency comes first.
const CURRENCY_THEN_AMOUNT: &str = "-+0123456789.,_";

/// A rejected value token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A symbol with no digits at all.
    #[error("currency without amount")]
    CurrencyWithoutAmount,
    /// `=` or `@` ended up inside the currency symbol.
    #[error("invalid character in currency")]
    InvalidCurrencyChar,
    /// A sign with nothing after it.
    #[error("empty amount")]
    EmptyAmount,
    /// Trailing separator, as in `12.`.
    #[error("amount must end with a digit")]
    TrailingNonDigit,
    /// A separator in front of any digit.
    #[error("wrong position for punctuation mark '{0}'")]
    LeadingSeparator(char),
    /// A sign in the middle of the digits.
    #[error("wrong punctuation mark '{0}'")]
    SignSeparator(char),
    /// A thousands separator off the every-three-digits grid.
    #[error("wrong position for thousand sign '{0}'")]
    ThousandPosition(String),
    /// Two decimal separators.
    #[error("more than one decimal sign '{0}'")]
    RepeatedDecimal(String),
    /// A third separator that matches neither known sign.
    #[error("unknown punctuation '{0}' (thousand='{1}', decimal='{2}')")]
    UnknownSeparator(char, String, String),
    /// A lone separator that could be either thousands or decimal.
    #[error("punctuation '{0}' can be a thousand or a decimal")]
    AmbiguousSeparator(String),
    /// More fractional digits than the fixed-point scale can hold.
    #[error("too many decimal positions")]
    TooManyDecimals,
    /// The amount does not fit the 64-bit fixed-point range.
    #[error("amount out of range")]
    AmountOutOfRange,
}

/// A successfully lexed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexedValue {
    /// The parsed value.
    pub value: Value,
    /// Whether this token mentioned its currency for the first time.
    pub new_currency: bool,
}

/// A token split into its digits and symbol halves.
pub(crate) struct TokenParts<'a> {
    pub amount: &'a str,
    pub symbol: &'a str,
    pub prefix: bool,
    pub space: bool,
}

/// Split a token into amount and currency symbol without touching the
/// ledger. The first character decides the order: a digit or sign means
/// amount-then-currency, anything else currency-then-amount.
pub(crate) fn split_token(token: &str) -> Result<TokenParts<'_>, ValueError> {
    let first = token.chars().next().ok_or(ValueError::EmptyAmount)?;
    let parts = if first.is_ascii_digit() || first == '-' || first == '+' {
        match token.char_indices().find(|(_, c)| !AMOUNT_THEN_CURRENCY.contains(*c)) {
            Some((i, boundary)) => TokenParts {
                amount: &token[..i],
                symbol: token[i..].trim(),
                prefix: false,
                space: boundary.is_whitespace(),
            },
            None => TokenParts {
                amount: token,
                symbol: "",
                prefix: false,
                space: false,
            },
        }
    } else {
        let (i, boundary) = token
            .char_indices()
            .rev()
            .find(|(_, c)| !CURRENCY_THEN_AMOUNT.contains(*c))
            .ok_or(ValueError::CurrencyWithoutAmount)?;
        let amount = &token[i + boundary.len_utf8()..];
        if amount.is_empty() {
            return Err(ValueError::CurrencyWithoutAmount);
        }
        TokenParts {
            amount,
            symbol: token[..i + boundary.len_utf8()].trim(),
            prefix: true,
            space: boundary.is_whitespace(),
        }
    };
    if parts.symbol.contains(['=', '@']) {
        return Err(ValueError::InvalidCurrencyChar);
    }
    Ok(parts)
}

/// Lex a value token against a ledger's currency table.
///
/// Interns the symbol (the empty symbol maps to the ledger's default
/// currency, creating it on first use) and refines the currency's display
/// conventions from what the token shows. `Ok(None)` is returned for an
/// empty token, which posting syntax uses for an amount left to inference.
pub fn lex_value(ledger: &mut Ledger, token: &str) -> Result<Option<LexedValue>, ValueError> {
    if token.is_empty() {
        return Ok(None);
    }
    let parts = split_token(token)?;

    let (currency_id, new_currency) = ledger.ensure_currency(parts.symbol);
    if new_currency {
        let currency = ledger.currency_mut(currency_id);
        currency.prefix = parts.prefix;
        currency.space = parts.space;
    }

    let mut amount = parts.amount;
    let mut sign: i64 = 1;
    if let Some(rest) = amount.strip_prefix('-') {
        sign = -1;
        amount = rest;
    } else if let Some(rest) = amount.strip_prefix('+') {
        amount = rest;
    }
    if amount.is_empty() {
        return Err(ValueError::EmptyAmount);
    }
    if !amount.ends_with(|c: char| c.is_ascii_digit()) {
        return Err(ValueError::TrailingNonDigit);
    }

    let currency = ledger.currency_mut(currency_id);
    let mut acc: i128 = 0;
    // A lone separator at position <= 3 cannot be classified yet; it is
    // held tentative until later evidence in the same token resolves it.
    let mut tentative: Option<(char, usize)> = None;
    let mut thousand_pos: Option<usize> = None;
    let mut decimal_pos: Option<usize> = None;

    for (i, c) in amount.char_indices() {
        if let Some(digit) = c.to_digit(10) {
            acc = acc * 10 + i128::from(digit);
            continue;
        }
        if i == 0 {
            return Err(ValueError::LeadingSeparator(c));
        }
        if c == '-' || c == '+' {
            return Err(ValueError::SignSeparator(c));
        }
        let cs = c.to_string();

        // Seen this tentative before: decimals cannot repeat, so both
        // occurrences are retroactively thousands separators.
        if let Some((p, pos)) = tentative {
            if p == c {
                currency.thousand = cs.clone();
                thousand_pos = Some(pos);
                tentative = None;
            }
        }

        // Known thousands sign, or inferable by elimination.
        if currency.thousand == cs
            || (currency.thousand.is_empty()
                && !currency.decimal.is_empty()
                && currency.decimal != cs)
        {
            currency.thousand = cs;
            let misplaced = match thousand_pos {
                None => i > 3,
                Some(previous) => i - previous != 4,
            };
            if misplaced || decimal_pos.is_some() {
                return Err(ValueError::ThousandPosition(currency.thousand.clone()));
            }
            thousand_pos = Some(i);
            continue;
        }

        // A second, different separator: the earlier tentative must be the
        // thousands sign and this one the decimal.
        if let Some((p, pos)) = tentative {
            if p != c {
                currency.thousand = p.to_string();
                currency.decimal = cs.clone();
                thousand_pos = Some(pos);
                tentative = None;
            }
        }

        // Known decimal sign, or inferable by elimination.
        if currency.decimal == cs
            || (currency.decimal.is_empty()
                && !currency.thousand.is_empty()
                && currency.thousand != cs)
        {
            currency.decimal = cs;
            if decimal_pos.is_some() {
                return Err(ValueError::RepeatedDecimal(currency.decimal.clone()));
            }
            if let Some(previous) = thousand_pos {
                if i - previous != 4 {
                    return Err(ValueError::ThousandPosition(currency.thousand.clone()));
                }
            }
            decimal_pos = Some(i);
            continue;
        }

        if !currency.decimal.is_empty() && !currency.thousand.is_empty() {
            return Err(ValueError::UnknownSeparator(
                c,
                currency.thousand.clone(),
                currency.decimal.clone(),
            ));
        }

        // Nothing known about this currency: a separator more than three
        // digits in must be the decimal; closer to the front it stays
        // tentative.
        if i > 3 {
            currency.decimal = cs;
            decimal_pos = Some(i);
        } else {
            tentative = Some((c, i));
        }
    }

    // A surviving tentative not followed by exactly three digits cannot be
    // a thousands sign, so it is the decimal.
    if let Some((p, pos)) = tentative {
        if amount.len() - pos != 4 {
            currency.decimal = p.to_string();
            decimal_pos = Some(pos);
            tentative = None;
        }
    }
    if let Some((p, _)) = tentative {
        return Err(ValueError::AmbiguousSeparator(p.to_string()));
    }

    let shift = match decimal_pos {
        None => MAX_PRECISION,
        Some(pos) => {
            let fraction_digits = (amount.len() - pos - 1) as u32;
            if fraction_digits > MAX_PRECISION {
                return Err(ValueError::TooManyDecimals);
            }
            if new_currency {
                currency.precision = fraction_digits;
            }
            MAX_PRECISION - fraction_digits
        }
    };
    for _ in 0..shift {
        acc *= 10;
    }
    acc *= i128::from(sign);
    let amount_scaled = i64::try_from(acc).map_err(|_| ValueError::AmountOutOfRange)?;

    // A currency with a known thousands sign but no decimal yet gets the
    // conventional counterpart, so later tokens are unambiguous.
    if currency.decimal.is_empty() && !currency.thousand.is_empty() {
        currency.decimal = if currency.thousand == "." { "," } else { "." }.to_string();
    }

    Ok(Some(LexedValue {
        value: Value::new(amount_scaled, currency_id),
        new_currency,
    }))
}
