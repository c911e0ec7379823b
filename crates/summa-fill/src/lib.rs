//! The ledger completion engine.
//!
//! After parsing, a ledger is a pile of raw facts: transactions whose
//! postings may lack amounts, assertions that have not been checked, and
//! accounts with no derived data. [`fill`] turns that into the finished
//! model:
//!
//! - links the account tree and orders accounts parents-first (pass A);
//! - sorts transactions and builds per-account split timelines (pass B);
//! - runs a fixed-point loop that balances every transaction, infers
//!   missing amounts (from the transaction residual or from a downstream
//!   balance assertion), verifies assertions and materializes running
//!   balances (pass C);
//! - synthesizes cross-currency prices from split prices (pass D);
//! - re-sorts the price list (pass E);
//! - splices compensating transfer-account splits for postings whose
//!   effective time differs from their transaction's (pass F).
//!
//! The pass C loop couples two kinds of cursors: a transaction can only be
//! balanced once its missing posting is known, but that posting may be
//! pinned down by an assertion *later* in the account's timeline, which in
//! turn needs every earlier split's value. Each round attempts all pending
//! transactions and advances every account cursor as far as it can; a full
//! round without progress is a deadlock and reported as a balance error.
//!
//! `fill` is idempotent: running it again on its own output changes
//! nothing and adds no entities.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use thiserror::Error;

use summa_core::format::format_amount;
use summa_core::{
    ratio_scaled, AccountId, Balance, CurrencyId, Ledger, NaiveDateTime, Price, Split, SplitId,
    TransactionId, Value,
};

/// Fully-qualified name of the distinguished transfer account.
pub const TRANSFER_ACCOUNT: &str = "Assets:Transfer account";

/// A completion failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillError {
    /// A transaction that cannot be balanced.
    #[error("transaction \"{transaction}\": {message}")]
    Balance {
        /// Time and description of the offending transaction.
        transaction: String,
        /// What went wrong.
        message: String,
    },

    /// A balance assertion that does not hold.
    #[error("account {account}: balance assertion failed: expected {expected}, found {actual}")]
    Assertion {
        /// Fully-qualified account name.
        account: String,
        /// The asserted amount, rendered.
        expected: String,
        /// The actual running balance in the asserted currency, rendered.
        actual: String,
    },
}

/// Complete a freshly parsed ledger in place.
pub fn fill(ledger: &mut Ledger) -> Result<(), FillError> {
    build_tree(ledger);
    sort_transactions(ledger);
    build_timelines(ledger);
    run_completion(ledger)?;
    synthesize_split_prices(ledger);
    ledger.prices.sort_by_key(|p| p.time);
    splice_transfer_splits(ledger);
    Ok(())
}

// --- pass A: account tree -----------------------------------------------

/// Rebuild parent/child links, levels and the pre-order account listing,
/// and clear every derived split timeline.
fn build_tree(ledger: &mut Ledger) {
    for account in &mut ledger.accounts {
        account.children.clear();
        account.splits.clear();
    }
    // Parents are always created before their children, so one forward
    // walk settles the levels.
    for index in 0..ledger.accounts.len() {
        let id = AccountId::new(index);
        match ledger.accounts[index].parent {
            Some(parent) => {
                let parent_level = ledger.accounts[parent.index()].level;
                ledger.accounts[parent.index()].children.push(id);
                ledger.accounts[index].level = parent_level + 1;
            }
            None => ledger.accounts[index].level = 0,
        }
    }
    rebuild_order(ledger);
}

/// Recompute the pre-order account listing: roots in creation order, each
/// followed by its whole subtree.
fn rebuild_order(ledger: &mut Ledger) {
    fn visit(ledger: &Ledger, id: AccountId, order: &mut Vec<AccountId>) {
        order.push(id);
        for &child in &ledger.account(id).children {
            visit(ledger, child, order);
        }
    }
    let mut order = Vec::with_capacity(ledger.accounts.len());
    for account in &ledger.accounts {
        if account.is_root() {
            visit(ledger, account.id, &mut order);
        }
    }
    ledger.account_order = order;
}

// --- pass B: ordering and timelines -------------------------------------

/// Stable-sort the transaction arena by time, renumbering ids and fixing
/// every split's back-pointer.
fn sort_transactions(ledger: &mut Ledger) {
    ledger.transactions.sort_by_key(|t| t.time);
    let mut remap = vec![0usize; ledger.transactions.len()];
    for (new_index, txn) in ledger.transactions.iter().enumerate() {
        remap[txn.id.index()] = new_index;
    }
    for (new_index, txn) in ledger.transactions.iter_mut().enumerate() {
        txn.id = TransactionId::new(new_index);
    }
    for split in &mut ledger.splits {
        split.transaction = TransactionId::new(remap[split.transaction.index()]);
    }
}

/// Append every split to its account's timeline and sort each timeline by
/// effective time.
fn build_timelines(ledger: &mut Ledger) {
    let assignments: Vec<(SplitId, AccountId)> = ledger
        .transactions
        .iter()
        .flat_map(|t| t.splits.iter().map(|&sid| (sid, ledger.split(sid).account)))
        .collect();
    for (sid, account) in assignments {
        ledger.accounts[account.index()].splits.push(sid);
    }
    for index in 0..ledger.accounts.len() {
        let mut timeline = std::mem::take(&mut ledger.accounts[index].splits);
        timeline.sort_by_key(|&sid| ledger.split_time(sid));
        ledger.accounts[index].splits = timeline;
    }
}

// --- pass C: the fixed-point loop ---------------------------------------

enum Step {
    Advanced,
    Paused,
}

struct AccountCursor {
    position: usize,
    running: Balance,
}

fn run_completion(ledger: &mut Ledger) -> Result<(), FillError> {
    let mut pending: Vec<bool> = vec![true; ledger.transactions.len()];
    let mut cursors: Vec<AccountCursor> = ledger
        .accounts
        .iter()
        .map(|a| AccountCursor {
            position: 0,
            running: a.start_balance.clone(),
        })
        .collect();

    loop {
        let mut progress = false;

        for index in 0..pending.len() {
            if !pending[index] {
                continue;
            }
            match transaction_step(ledger, TransactionId::new(index))? {
                Step::Advanced => {
                    pending[index] = false;
                    progress = true;
                }
                Step::Paused => {}
            }
        }

        for index in 0..cursors.len() {
            progress |= account_step(ledger, AccountId::new(index), &mut cursors[index])?;
        }

        let transactions_done = pending.iter().all(|&p| !p);
        let accounts_done = cursors
            .iter()
            .enumerate()
            .all(|(i, c)| c.position >= ledger.accounts[i].splits.len());
        if transactions_done && accounts_done {
            return Ok(());
        }
        if !progress {
            let stuck = pending
                .iter()
                .position(|&p| p)
                .map_or_else(TransactionId::default, TransactionId::new);
            return Err(balance_error(
                ledger,
                stuck,
                "cannot balance: no further inference possible",
            ));
        }
    }
}

/// Try to balance one transaction. Advancing may fill the single missing
/// posting or synthesize an automatic price pair; pausing leaves the
/// transaction for a later round, once an assertion has pinned a value
/// down.
fn transaction_step(ledger: &mut Ledger, id: TransactionId) -> Result<Step, FillError> {
    let split_ids = ledger.transaction(id).splits.clone();
    let mut residual = Balance::new();
    let mut missing: Vec<SplitId> = Vec::new();
    for &sid in &split_ids {
        match ledger.effective_value(sid) {
            Some(value) => residual.add(value),
            None => missing.push(sid),
        }
    }

    match (missing.len(), residual.len()) {
        (0, 0) => Ok(Step::Advanced),
        (1, 1) => {
            if let Some((currency, amount)) = residual.single() {
                ledger.split_mut(missing[0]).value = Some(Value::new(-amount, currency));
            }
            Ok(Step::Advanced)
        }
        (1, n) if n >= 2 => {
            if ledger.assertions.contains_key(&missing[0]) {
                // The account step can still infer this posting from its
                // assertion.
                Ok(Step::Paused)
            } else {
                Err(balance_error(ledger, id, "cannot balance: multiple currencies"))
            }
        }
        (0, 1) => Err(balance_error(ledger, id, "transaction does not balance")),
        (0, 2) => {
            synthesize_price_pair(ledger, id, &residual);
            Ok(Step::Advanced)
        }
        (0, _) => Err(balance_error(
            ledger,
            id,
            "not able to balance transactions with 3 or more currencies",
        )),
        _ => Ok(Step::Paused),
    }
}

/// A two-currency residual is an implicit exchange: record the rate in
/// both directions at the transaction's time.
fn synthesize_price_pair(ledger: &mut Ledger, id: TransactionId, residual: &Balance) {
    let entries: Vec<(CurrencyId, i64)> = residual.iter().collect();
    let (first, first_amount) = entries[0];
    let (second, second_amount) = entries[1];
    let time = ledger.transaction(id).time;
    push_automatic_price(
        ledger,
        time,
        first,
        Value::new(ratio_scaled(-second_amount, first_amount), second),
    );
    push_automatic_price(
        ledger,
        time,
        second,
        Value::new(ratio_scaled(-first_amount, second_amount), first),
    );
}

/// Push an automatic price unless an identical one already exists, which
/// keeps repeated completion from duplicating them.
fn push_automatic_price(ledger: &mut Ledger, time: NaiveDateTime, base: CurrencyId, value: Value) {
    let exists = ledger
        .prices
        .iter()
        .any(|p| p.time == time && p.currency == base && p.value == value && p.is_automatic());
    if !exists {
        tracing::debug!(%base, "synthesizing automatic price");
        ledger.prices.push(Price::automatic(time, base, value));
    }
}

/// Advance one account's cursor as far as possible, carrying the running
/// balance, applying assertions, and snapshotting per-split balances.
fn account_step(
    ledger: &mut Ledger,
    id: AccountId,
    cursor: &mut AccountCursor,
) -> Result<bool, FillError> {
    let mut progress = false;
    loop {
        let sid = {
            let timeline = &ledger.account(id).splits;
            if cursor.position >= timeline.len() {
                break;
            }
            timeline[cursor.position]
        };
        let value = ledger.split(sid).value;
        let assertion = ledger.assertions.get(&sid).copied();
        if value.is_none() && assertion.is_none() {
            // Nothing known yet; the transaction step may fill this in a
            // later round.
            break;
        }
        if let Some(value) = value {
            cursor.running.add(value);
        }
        if let Some(asserted) = assertion {
            let current = cursor.running.get(asserted.currency);
            if value.is_none() {
                let inferred = asserted.amount - current;
                ledger.split_mut(sid).value = Some(Value::new(inferred, asserted.currency));
                cursor.running.add_amount(asserted.currency, inferred);
            } else if current != asserted.amount {
                return Err(assertion_error(ledger, id, asserted, current));
            }
        }
        ledger.split_mut(sid).balance = cursor.running.clone();
        cursor.position += 1;
        progress = true;
    }
    Ok(progress)
}

// --- pass D: prices from split prices -----------------------------------

/// Every split price is an observed exchange: record the per-unit rate in
/// both directions at the split's effective time.
fn synthesize_split_prices(ledger: &mut Ledger) {
    for index in 0..ledger.splits.len() {
        let sid = SplitId::new(index);
        let Some(total) = ledger.split_prices.get(&sid).copied() else {
            continue;
        };
        let Some(value) = ledger.split(sid).value else {
            continue;
        };
        if value.amount == 0 || total.amount == 0 || value.currency == total.currency {
            continue;
        }
        let time = ledger.split_time(sid);
        push_automatic_price(
            ledger,
            time,
            value.currency,
            Value::new(ratio_scaled(total.amount, value.amount), total.currency),
        );
        push_automatic_price(
            ledger,
            time,
            total.currency,
            Value::new(ratio_scaled(value.amount, total.amount), value.currency),
        );
    }
}

// --- pass F: transfer-account splicing ----------------------------------

/// A posting whose effective time differs from its transaction's would
/// unbalance the day it lands on. Two compensating splits on the transfer
/// account carry the amount between the two instants.
fn splice_transfer_splits(ledger: &mut Ledger) {
    if ledger.transfer_account.is_none() {
        ledger.transfer_account = ledger.account_by_name(TRANSFER_ACCOUNT);
    }

    struct Pair {
        transaction: TransactionId,
        split_time: NaiveDateTime,
        transaction_time: NaiveDateTime,
        value: Value,
    }
    let mut needed: Vec<Pair> = Vec::new();
    for txn in &ledger.transactions {
        for &sid in &txn.splits {
            let split = ledger.split(sid);
            if Some(split.account) == ledger.transfer_account {
                continue;
            }
            let Some(time) = split.time else { continue };
            if time == txn.time {
                continue;
            }
            let Some(value) = split.value else { continue };
            needed.push(Pair {
                transaction: txn.id,
                split_time: time,
                transaction_time: txn.time,
                value,
            });
        }
    }
    if needed.is_empty() && ledger.transfer_account.is_none() {
        return;
    }

    let transfer = match ledger.transfer_account {
        Some(id) => id,
        None => {
            let (id, _) = ledger.ensure_account(TRANSFER_ACCOUNT);
            ledger.transfer_account = Some(id);
            rebuild_order(ledger);
            id
        }
    };

    for pair in needed {
        if has_transfer_leg(ledger, transfer, pair.transaction, pair.split_time, -pair.value)
            && has_transfer_leg(
                ledger,
                transfer,
                pair.transaction,
                pair.transaction_time,
                pair.value,
            )
        {
            continue;
        }
        append_transfer_leg(ledger, transfer, pair.transaction, pair.split_time, -pair.value);
        append_transfer_leg(
            ledger,
            transfer,
            pair.transaction,
            pair.transaction_time,
            pair.value,
        );
    }

    let mut timeline = std::mem::take(&mut ledger.accounts[transfer.index()].splits);
    timeline.sort_by_key(|&sid| ledger.split_time(sid));
    ledger.accounts[transfer.index()].splits = timeline.clone();

    let mut running = ledger.account(transfer).start_balance.clone();
    for sid in timeline {
        if let Some(value) = ledger.split(sid).value {
            running.add(value);
        }
        ledger.split_mut(sid).balance = running.clone();
    }
}

fn has_transfer_leg(
    ledger: &Ledger,
    transfer: AccountId,
    transaction: TransactionId,
    time: NaiveDateTime,
    value: Value,
) -> bool {
    ledger.transaction(transaction).splits.iter().any(|&sid| {
        let split = ledger.split(sid);
        split.account == transfer
            && ledger.split_time(sid) == time
            && split.value == Some(value)
    })
}

fn append_transfer_leg(
    ledger: &mut Ledger,
    transfer: AccountId,
    transaction: TransactionId,
    time: NaiveDateTime,
    value: Value,
) {
    let sid = SplitId::new(ledger.splits.len());
    let mut split = Split::with_value(sid, transaction, transfer, value);
    split.time = Some(time);
    ledger.splits.push(split);
    ledger.transaction_mut(transaction).splits.push(sid);
    ledger.accounts[transfer.index()].splits.push(sid);
}

// --- error helpers -------------------------------------------------------

fn balance_error(ledger: &Ledger, id: TransactionId, message: &str) -> FillError {
    let transaction = ledger
        .transactions
        .get(id.index())
        .map_or_else(String::new, |t| {
            format!("{} {}", t.time.format("%Y-%m-%d"), t.description)
        });
    FillError::Balance {
        transaction,
        message: message.to_string(),
    }
}

fn assertion_error(ledger: &Ledger, id: AccountId, asserted: Value, current: i64) -> FillError {
    let currency = ledger.currency(asserted.currency);
    FillError::Assertion {
        account: ledger.full_name(id),
        expected: format_amount(asserted.amount, Some(currency), true),
        actual: format_amount(current, Some(currency), true),
    }
}
