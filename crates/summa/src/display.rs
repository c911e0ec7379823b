//! Canonical journal re-emission.
//!
//! Writes a completed ledger back out as journal text: accounts first,
//! then commodities with a sample value carrying their learned format,
//! then transactions and prices merged in time order. The output is not
//! byte-identical to the input, but parsing and completing it again yields
//! a structurally equal ledger.

use std::io::{self, Write};

use summa_core::format::format_amount;
use summa_core::{Ledger, U};

/// Write the canonical textual form of a ledger.
pub fn emit(ledger: &Ledger, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "; Accounts:")?;
    for &id in &ledger.account_order {
        let account = ledger.account(id);
        write!(out, "account {}", ledger.full_name(id))?;
        let mut comments: Vec<String> = Vec::new();
        if let Some(code) = &account.code {
            comments.push(format!("code:{code}"));
        }
        comments.extend(account.comments.iter().cloned());
        write_comments(out, &comments)?;
    }

    writeln!(out)?;
    writeln!(out, "; Commodities:")?;
    for currency in &ledger.currencies {
        if currency.name.is_empty() {
            continue;
        }
        let sample = format_amount(1_000_000 * U, Some(currency), false);
        write!(out, "commodity {sample}")?;
        let mut comments: Vec<String> = Vec::new();
        if let Some(isin) = &currency.isin {
            comments.push(format!("isin:{isin}"));
        }
        comments.extend(currency.comments.iter().cloned());
        write_comments(out, &comments)?;
    }
    if let Some(default) = ledger.default_currency {
        let sample = format_amount(U, Some(ledger.currency(default)), false);
        writeln!(out, "D {sample}")?;
    }

    writeln!(out)?;
    writeln!(out, "; Transactions and prices:")?;
    let mut next_transaction = 0;
    let mut next_price = 0;
    while next_transaction < ledger.transactions.len() || next_price < ledger.prices.len() {
        let transaction_first = match (
            ledger.transactions.get(next_transaction),
            ledger.prices.get(next_price),
        ) {
            (Some(t), Some(p)) => t.time <= p.time,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if transaction_first {
            let txn = &ledger.transactions[next_transaction];
            next_transaction += 1;
            write!(
                out,
                "{} {}",
                txn.time.format("%Y-%m-%d/%H:%M"),
                txn.description
            )?;
            write_comments(out, &txn.comments)?;
            for &sid in &txn.splits {
                let split = ledger.split(sid);
                write!(out, "  {:<50}", ledger.full_name(split.account))?;
                if let Some(value) = split.value {
                    write!(out, "  {}", ledger.format_value(value, true))?;
                }
                if let Some(price) = ledger.split_prices.get(&sid) {
                    write!(out, " @@ {}", ledger.format_value(*price, true))?;
                }
                if let Some(assertion) = ledger.assertions.get(&sid) {
                    write!(out, " = {}", ledger.format_value(*assertion, true))?;
                }
                let mut comments: Vec<String> = Vec::new();
                if ledger.split_time(sid) != txn.time {
                    comments.push(format!(
                        "date:{}",
                        ledger.split_time(sid).format("%Y-%m-%d/%H:%M")
                    ));
                }
                comments.extend(split.comments.iter().cloned());
                write_comments(out, &comments)?;
            }
        } else {
            let price = &ledger.prices[next_price];
            next_price += 1;
            write!(
                out,
                "P {} {} {}",
                price.time.format("%Y-%m-%d/%H:%M"),
                ledger.currency(price.currency).name,
                ledger.format_value(price.value, true)
            )?;
            write_comments(out, &price.comments)?;
        }
    }
    Ok(())
}

/// Finish the current line, inlining the first comment and indenting the
/// rest under it.
fn write_comments(out: &mut dyn Write, comments: &[String]) -> io::Result<()> {
    match comments.split_first() {
        Some((first, rest)) => {
            writeln!(out, " ; {first}")?;
            for comment in rest {
                writeln!(out, "\t; {comment}")?;
            }
            Ok(())
        }
        None => writeln!(out),
    }
}
