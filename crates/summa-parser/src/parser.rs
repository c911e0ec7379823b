//! The line-oriented journal parser.
//!
//! Each scanned line is classified by indentation and first word, then
//! dispatched: directives (`include`, `P`, `D`, `commodity`, `account`) and
//! transaction openers live at column zero, postings are indented under
//! their transaction, and comment lines attach to whatever entity the
//! previous line declared.
//!
//! Most per-line problems are recorded in the [`Diagnostics`] sink and the
//! parser keeps going. Fatal are: unreadable files, out-of-order
//! transactions or prices, re-declared accounts and commodities, and a
//! non-indented line that is neither a directive nor a date.

use std::path::Path;

use summa_core::{
    mul_scaled, AccountId, CurrencyId, Ledger, Price, Split, SplitId, Transaction, TransactionId,
    Value,
};

use crate::date::parse_date;
use crate::diagnostics::Diagnostics;
use crate::error::ParseError;
use crate::scanner::{Scanner, SourceLine};
use crate::value::{lex_value, split_token};

/// What the previous line declared, for comment attachment and posting
/// continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastEntity {
    None,
    Include,
    Account(AccountId),
    DefaultCurrency,
    Commodity(CurrencyId),
    Price(usize),
    Transaction(TransactionId),
    Split(SplitId),
}

/// Read a journal file (and everything it includes) into a raw ledger.
///
/// The ledger still needs completion afterwards: transactions are not yet
/// balanced and no derived data is populated.
pub fn parse_journal(
    ledger: &mut Ledger,
    diags: &mut Diagnostics,
    path: &Path,
) -> Result<(), ParseError> {
    tracing::debug!(path = %path.display(), "parsing journal");
    let mut scanner = Scanner::new();
    scanner.push(path)?;
    let mut parser = Parser {
        ledger,
        diags,
        last: LastEntity::None,
    };
    while let Some(line) = scanner.next_line()? {
        parser.handle_line(&mut scanner, &line)?;
    }
    Ok(())
}

struct Parser<'a> {
    ledger: &'a mut Ledger,
    diags: &'a mut Diagnostics,
    last: LastEntity,
}

impl Parser<'_> {
    fn handle_line(&mut self, scanner: &mut Scanner, line: &SourceLine) -> Result<(), ParseError> {
        let file = line.file_name();
        let file = file.as_str();
        let number = line.number;

        let indented = line.text.starts_with(' ') || line.text.starts_with('\t');
        let mut text = line.text.trim();
        if text.is_empty() {
            return Ok(());
        }

        if let Some(rest) = text
            .strip_prefix('*')
            .or_else(|| text.strip_prefix('#'))
            .or_else(|| text.strip_prefix(';'))
        {
            let comment = rest.trim();
            if indented {
                self.attach_comment(file, number, comment);
            } else {
                tracing::debug!(file, line = number, "file comment: {comment}");
            }
            return Ok(());
        }

        let mut comment = "";
        if let Some(i) = text.find(';') {
            comment = text[i + 1..].trim();
            text = text[..i].trim();
        }

        let (word, rest) = first_word(text);

        if !indented {
            match word {
                "include" => {
                    scanner.push(Path::new(rest))?;
                    self.last = LastEntity::Include;
                    return Ok(());
                }
                "P" => return self.parse_price(file, number, rest, comment),
                "D" => return self.parse_default_currency(file, number, rest),
                "commodity" => return self.parse_commodity(file, number, rest, comment),
                "account" => return self.parse_account(file, number, rest, comment),
                _ => {}
            }
            if let Some(time) = parse_date(word) {
                if let Some(previous) = self.ledger.transactions.last() {
                    if previous.time > time {
                        return Err(ParseError::Chronology {
                            file: file.to_string(),
                            line: number,
                            what: "transaction",
                        });
                    }
                }
                let id = TransactionId::new(self.ledger.transactions.len());
                self.ledger
                    .transactions
                    .push(Transaction::new(id, time, rest));
                self.last = LastEntity::Transaction(id);
                if !comment.is_empty() {
                    self.attach_comment(file, number, comment);
                }
                return Ok(());
            }
            // A column-zero line that is neither a directive nor a date is
            // a structural failure, not a skippable one.
            return Err(ParseError::Syntax {
                file: file.to_string(),
                line: number,
                message: format!("expected directive or date: \"{text}\""),
            });
        }

        if matches!(
            self.last,
            LastEntity::Transaction(_) | LastEntity::Split(_)
        ) {
            return self.parse_posting(file, number, text, comment);
        }
        self.diags
            .reject(file, number, format!("unexpected indented line: \"{text}\""))
    }

    fn parse_price(
        &mut self,
        file: &str,
        number: u32,
        rest: &str,
        comment: &str,
    ) -> Result<(), ParseError> {
        let (date_word, rest) = first_word(rest);
        let Some(time) = parse_date(date_word) else {
            return self
                .diags
                .reject(file, number, format!("invalid date \"{date_word}\""));
        };
        if let Some(previous) = self.ledger.prices.last() {
            if previous.time > time {
                return Err(ParseError::Chronology {
                    file: file.to_string(),
                    line: number,
                    what: "price",
                });
            }
        }
        let (currency_word, rest) = first_word(rest);
        let (base, new_currency) = self.ledger.ensure_currency(currency_word);
        if new_currency {
            self.warn_undefined_currency(file, number, base);
        }
        let value = match lex_value(self.ledger, rest) {
            Ok(Some(lexed)) => {
                if lexed.new_currency {
                    self.warn_undefined_currency(file, number, lexed.value.currency);
                }
                lexed.value
            }
            Ok(None) => return self.diags.reject(file, number, "price without a value"),
            Err(e) => return self.diags.reject(file, number, e.to_string()),
        };
        let index = self.ledger.prices.len();
        self.ledger.prices.push(Price::new(time, base, value));
        self.last = LastEntity::Price(index);
        if !comment.is_empty() {
            self.attach_comment(file, number, comment);
        }
        Ok(())
    }

    fn parse_default_currency(
        &mut self,
        file: &str,
        number: u32,
        rest: &str,
    ) -> Result<(), ParseError> {
        match lex_value(self.ledger, rest) {
            Ok(Some(lexed)) => {
                self.ledger.default_currency = Some(lexed.value.currency);
                self.last = LastEntity::DefaultCurrency;
                Ok(())
            }
            Ok(None) => self.diags.reject(file, number, "D directive without a value"),
            Err(e) => self.diags.reject(file, number, e.to_string()),
        }
    }

    fn parse_commodity(
        &mut self,
        file: &str,
        number: u32,
        rest: &str,
        comment: &str,
    ) -> Result<(), ParseError> {
        // The value itself is thrown away; the directive exists for the
        // formatting its example value teaches the lexer.
        let already_declared = match split_token(rest) {
            Ok(parts) => {
                !parts.symbol.is_empty()
                    && self.ledger.currencies.iter().any(|c| c.name == parts.symbol)
            }
            Err(_) => false,
        };
        match lex_value(self.ledger, rest) {
            Ok(Some(lexed)) => {
                self.last = LastEntity::Commodity(lexed.value.currency);
                if !comment.is_empty() {
                    self.attach_comment(file, number, comment);
                }
                Ok(())
            }
            Ok(None) => self
                .diags
                .reject(file, number, "commodity directive without a value"),
            Err(e) if already_declared => Err(ParseError::Duplicate {
                file: file.to_string(),
                line: number,
                what: format!("commodity re-declared with incompatible formatting: {e}"),
            }),
            Err(e) => self.diags.reject(file, number, e.to_string()),
        }
    }

    fn parse_account(
        &mut self,
        file: &str,
        number: u32,
        rest: &str,
        comment: &str,
    ) -> Result<(), ParseError> {
        if rest.is_empty() {
            return self
                .diags
                .reject(file, number, "account directive without a name");
        }
        let (id, new_account) = self.ledger.ensure_account(rest);
        if !new_account {
            return Err(ParseError::Duplicate {
                file: file.to_string(),
                line: number,
                what: format!("account {rest} already defined"),
            });
        }
        self.last = LastEntity::Account(id);
        if !comment.is_empty() {
            self.attach_comment(file, number, comment);
        }
        Ok(())
    }

    fn parse_posting(
        &mut self,
        file: &str,
        number: u32,
        text: &str,
        comment: &str,
    ) -> Result<(), ParseError> {
        let transaction = match self.last {
            LastEntity::Transaction(id) => id,
            LastEntity::Split(id) => self.ledger.split(id).transaction,
            _ => return self.diags.reject(file, number, "posting outside a transaction"),
        };

        // Two consecutive spaces end the account name; spaces inside the
        // name itself are allowed.
        let (account_name, value_region) = match text.find("  ") {
            Some(i) if i > 0 => (&text[..i], Some(&text[i + 2..])),
            _ => (text, None),
        };
        let (account, new_account) = self.ledger.ensure_account(account_name);
        if new_account {
            let full_name = self.ledger.full_name(account);
            self.diags
                .warn(file, number, format!("undefined account {full_name}"));
        }

        let previous_last = self.last;
        let split_id = SplitId::new(self.ledger.splits.len());
        self.ledger
            .splits
            .push(Split::new(split_id, transaction, account));
        self.last = LastEntity::Split(split_id);
        if !comment.is_empty() {
            self.attach_comment(file, number, comment);
        }

        if let Some(region) = value_region {
            if let Err(message) = self.parse_posting_values(file, number, split_id, region) {
                self.discard_split(split_id, previous_last);
                return self.diags.reject(file, number, message);
            }
        }

        self.ledger
            .transaction_mut(transaction)
            .splits
            .push(split_id);
        Ok(())
    }

    /// Parse the `value [@|@@ price] [= assertion]` tail of a posting.
    /// Returns the rejection message on failure so the caller can drop the
    /// half-built split.
    fn parse_posting_values(
        &mut self,
        file: &str,
        number: u32,
        split_id: SplitId,
        region: &str,
    ) -> Result<(), String> {
        let mut value_end = region.len();
        let mut price: Option<(bool, usize, usize)> = None;
        if let Some(j) = region.find("@@") {
            if j > 0 {
                value_end = j;
                price = Some((true, j + 2, region.len()));
            }
        } else if let Some(j) = region.find('@') {
            if j > 0 {
                value_end = j;
                price = Some((false, j + 1, region.len()));
            }
        }
        let mut assertion: Option<(usize, usize)> = None;
        if let Some(k) = region.find('=') {
            assertion = Some((k + 1, region.len()));
            match &mut price {
                Some((_, start, end)) => *end = k.max(*start),
                None => value_end = value_end.min(k),
            }
        }

        let mut value = None;
        match lex_value(self.ledger, region[..value_end].trim()) {
            Ok(None) => {}
            Ok(Some(lexed)) => {
                if lexed.new_currency {
                    self.warn_undefined_currency(file, number, lexed.value.currency);
                }
                value = Some(lexed.value);
            }
            Err(e) => return Err(e.to_string()),
        }
        self.ledger.split_mut(split_id).value = value;

        if let Some((total, start, end)) = price {
            match lex_value(self.ledger, region[start..end].trim()) {
                Ok(Some(lexed)) => {
                    if lexed.new_currency {
                        self.warn_undefined_currency(file, number, lexed.value.currency);
                    }
                    // `@` is per unit; it is multiplied out here so the
                    // side table always holds the total.
                    let amount = if total {
                        lexed.value.amount
                    } else {
                        mul_scaled(value.map_or(0, |v| v.amount), lexed.value.amount)
                    };
                    self.ledger
                        .split_prices
                        .insert(split_id, Value::new(amount, lexed.value.currency));
                }
                Ok(None) => return Err("price annotation without a value".to_string()),
                Err(e) => return Err(e.to_string()),
            }
        }

        if let Some((start, end)) = assertion {
            match lex_value(self.ledger, region[start..end].trim()) {
                Ok(Some(lexed)) => {
                    if lexed.new_currency {
                        self.warn_undefined_currency(file, number, lexed.value.currency);
                    }
                    self.ledger.assertions.insert(split_id, lexed.value);
                }
                Ok(None) => return Err("balance assertion without a value".to_string()),
                Err(e) => return Err(e.to_string()),
            }
        }
        Ok(())
    }

    /// Drop a half-built split after a rejected posting line.
    fn discard_split(&mut self, split_id: SplitId, previous_last: LastEntity) {
        self.ledger.split_prices.remove(&split_id);
        self.ledger.assertions.remove(&split_id);
        self.ledger.splits.pop();
        self.last = previous_last;
    }

    fn warn_undefined_currency(&mut self, file: &str, number: u32, id: CurrencyId) {
        let name = self.ledger.currency(id).name.clone();
        if !name.is_empty() {
            self.diags
                .warn(file, number, format!("undefined currency {name}"));
        }
    }

    /// Attach a comment to the last declared entity, routing recognized
    /// `name:value` tags to structured fields.
    fn attach_comment(&mut self, file: &str, number: u32, comment: &str) {
        let tag = parse_tag(comment);
        match self.last {
            LastEntity::Account(id) => {
                if let Some(("code", value)) = tag {
                    self.ledger.account_mut(id).code = Some(value.to_string());
                    return;
                }
                self.ledger.account_mut(id).comments.push(comment.to_string());
            }
            LastEntity::Commodity(id) => {
                if let Some(("isin", value)) = tag {
                    self.ledger.currency_mut(id).isin = Some(value.to_string());
                    return;
                }
                self.ledger.currency_mut(id).comments.push(comment.to_string());
            }
            LastEntity::Split(id) => {
                if let Some(("date", value)) = tag {
                    match parse_date(value) {
                        Some(time) => self.ledger.split_mut(id).time = Some(time),
                        None => {
                            self.diags
                                .warn(file, number, format!("invalid date: {value}"));
                        }
                    }
                    return;
                }
                self.ledger.split_mut(id).comments.push(comment.to_string());
            }
            LastEntity::Transaction(id) => {
                self.ledger
                    .transaction_mut(id)
                    .comments
                    .push(comment.to_string());
            }
            LastEntity::Price(index) => {
                self.ledger.prices[index].comments.push(comment.to_string());
            }
            LastEntity::None | LastEntity::Include | LastEntity::DefaultCurrency => {
                self.diags
                    .warn(file, number, format!("stray indented comment: \"{comment}\""));
            }
        }
    }
}

/// Split off the first space-delimited word; the remainder is trimmed.
fn first_word(s: &str) -> (&str, &str) {
    match s.find(' ') {
        Some(i) if i > 0 => (&s[..i], s[i + 1..].trim()),
        _ => (s, ""),
    }
}

/// A leading `name:value` tag in a comment, with `name` all lowercase.
fn parse_tag(comment: &str) -> Option<(&str, &str)> {
    let colon = comment.find(':')?;
    let name = &comment[..colon];
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_lowercase()) {
        return None;
    }
    Some((name, comment[colon + 1..].trim()))
}
