//! End-to-end scenarios through the public `open` entry point.

use summa::{open, open_strict, parse_date, Error, Severity, Value, U};
use tempfile::TempDir;

fn journal(content: &str) -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.journal");
    std::fs::write(&path, content).unwrap();
    let url = format!("ledger://{}", path.display());
    (dir, url)
}

#[test]
fn simple_two_posting_transaction() {
    let (_dir, url) = journal("2020-01-15 lunch\n  Expenses:Food   $12.50\n  Assets:Cash\n");
    let book = open(&url).unwrap();
    let ledger = &book.ledger;

    assert_eq!(ledger.transactions.len(), 1);
    let txn = &ledger.transactions[0];
    assert_eq!(txn.time, parse_date("2020-01-15").unwrap());
    assert_eq!(txn.description, "lunch");
    assert_eq!(txn.splits.len(), 2);

    let dollar = ledger.currency_by_name("$").unwrap();
    let currency = ledger.currency(dollar);
    assert!(currency.prefix);
    assert!(!currency.space);
    assert_eq!(currency.precision, 2);
    assert_eq!(ledger.currencies.len(), 1);

    let cash = ledger.account_by_name("Assets:Cash").unwrap();
    let cash_split = ledger.split(txn.splits[1]);
    assert_eq!(cash_split.account, cash);
    assert_eq!(cash_split.value, Some(Value::new(-1_250_000_000, dollar)));

    assert_eq!(
        ledger.format_balance(&ledger.balance(cash, None)),
        "$-12.50"
    );
    let food = ledger.account_by_name("Expenses:Food").unwrap();
    assert_eq!(ledger.format_balance(&ledger.balance(food, None)), "$12.50");
}

#[test]
fn locale_inference() {
    let (_dir, url) = journal("2021-03-01 test\n  A  1.234,56 EUR\n  B  -1.234,56 EUR\n");
    let book = open(&url).unwrap();
    let ledger = &book.ledger;

    let eur = ledger.currency_by_name("EUR").unwrap();
    let currency = ledger.currency(eur);
    assert_eq!(currency.thousand, ".");
    assert_eq!(currency.decimal, ",");
    assert_eq!(currency.precision, 2);
    assert!(!currency.prefix);
    assert!(currency.space);

    let first = ledger.split(ledger.transactions[0].splits[0]);
    assert_eq!(first.value.unwrap().amount, 123_456 * 1_000_000);
}

#[test]
fn implicit_cross_currency_price() {
    let (_dir, url) = journal("2022-06-01 fx\n  Assets:USD   $100\n  Assets:EUR   -90 EUR\n");
    let book = open(&url).unwrap();
    let ledger = &book.ledger;

    let dollar = ledger.currency_by_name("$").unwrap();
    let eur = ledger.currency_by_name("EUR").unwrap();
    let when = parse_date("2022-06-01").unwrap();

    let automatic: Vec<_> = ledger.prices.iter().filter(|p| p.is_automatic()).collect();
    assert_eq!(automatic.len(), 2);
    assert!(automatic.iter().all(|p| p.time == when));

    let dollar_price = automatic.iter().find(|p| p.currency == dollar).unwrap();
    assert_eq!(dollar_price.value, Value::new(9 * U / 10, eur));

    let eur_price = automatic.iter().find(|p| p.currency == eur).unwrap();
    assert_eq!(eur_price.value, Value::new(111_111_111, dollar));
}

#[test]
fn balance_assertion_fills_missing_amount() {
    let (_dir, url) = journal("2023-01-01 open\n  Assets:Cash    = $50\n  Equity:Open\n");
    let book = open(&url).unwrap();
    let ledger = &book.ledger;

    let dollar = ledger.currency_by_name("$").unwrap();
    let txn = &ledger.transactions[0];
    assert_eq!(
        ledger.split(txn.splits[0]).value,
        Some(Value::new(50 * U, dollar))
    );
    assert_eq!(
        ledger.split(txn.splits[1]).value,
        Some(Value::new(-50 * U, dollar))
    );
}

#[test]
fn chronology_violation_cites_the_line() {
    let (_dir, url) = journal("2022-01-02 a\n  A  $1\n2022-01-01 b\n  A  $1\n");
    match open(&url) {
        Err(Error::Chronology { line, what, .. }) => {
            assert_eq!(line, 3);
            assert_eq!(what, "transaction");
        }
        other => panic!("expected chronology error, got {other:?}", other = other.err()),
    }
}

#[test]
fn interpolated_conversion() {
    let (_dir, url) = journal("P 2023-01-01 X 10 Y\nP 2023-12-31 X 20 Y\n");
    let book = open(&url).unwrap();
    let ledger = &book.ledger;

    let x = ledger.currency_by_name("X").unwrap();
    let y = ledger.currency_by_name("Y").unwrap();
    let got = ledger
        .convert(Value::new(U, x), parse_date("2023-07-02").unwrap(), y)
        .unwrap();
    assert_eq!(got.currency, y);
    assert!(
        (got.amount - 15 * U).abs() <= 1,
        "expected about 15, got {}",
        got.amount
    );
}

#[test]
fn convert_identity_needs_no_prices() {
    let (_dir, url) = journal("2020-01-01 a\n  A  5 X\n  B  -5 X\n");
    let book = open(&url).unwrap();
    let ledger = &book.ledger;
    let x = ledger.currency_by_name("X").unwrap();
    let v = Value::new(7 * U, x);
    assert_eq!(
        ledger.convert(v, parse_date("2024-01-01").unwrap(), x).unwrap(),
        v
    );
}

#[test]
fn lenient_open_collects_diagnostics() {
    let (_dir, url) = journal("2020-01-15 x\n  A   12.\n  B   $5\n  C   $-5\n");
    let book = open(&url).unwrap();
    assert!(book.diagnostics.has_rejections());
    assert!(book
        .diagnostics
        .entries()
        .iter()
        .any(|d| d.severity == Severity::Error && d.line == 2));
    // the rejected posting is gone, the rest of the transaction balances
    assert_eq!(book.ledger.transactions[0].splits.len(), 2);
}

#[test]
fn strict_open_fails_fast() {
    let (_dir, url) = journal("2020-01-15 x\n  A   12.\n  B   $5\n  C   $-5\n");
    match open_strict(&url) {
        Err(Error::Syntax { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected syntax error, got {other:?}", other = other.err()),
    }
}

#[test]
fn unbalanced_transaction_fails_open() {
    let (_dir, url) = journal("2020-01-01 bad\n  A   $10\n  B   $-9\n");
    assert!(matches!(open(&url), Err(Error::Balance { .. })));
}

#[test]
fn assertion_violation_fails_open() {
    let (_dir, url) = journal(
        "2020-01-01 a\n  Assets:Cash   $10\n  Equity\n\
         2020-01-02 b\n  Assets:Cash   $5 = $99\n  Equity\n",
    );
    match open(&url) {
        Err(Error::Assertion { account, .. }) => assert_eq!(account, "Assets:Cash"),
        other => panic!("expected assertion error, got {other:?}", other = other.err()),
    }
}

#[test]
fn missing_journal_is_io_error() {
    assert!(matches!(
        open("ledger:///no/such/file.journal"),
        Err(Error::Io { .. })
    ));
}

#[test]
fn unknown_scheme_is_rejected() {
    assert!(matches!(
        open("warehouse:///tmp/x"),
        Err(Error::UnknownScheme { .. })
    ));
}

#[test]
fn missing_scheme_uses_the_journal_driver() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.journal");
    std::fs::write(&path, "2020-01-01 a\n  A  5 X\n  B  -5 X\n").unwrap();
    let book = open(path.to_str().unwrap()).unwrap();
    assert_eq!(book.ledger.transactions.len(), 1);
}

#[test]
fn includes_report_true_origin() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.journal"), "not a directive\n").unwrap();
    let main = dir.path().join("main.journal");
    std::fs::write(&main, "include bad.journal\n").unwrap();

    match open(&format!("ledger://{}", main.display())) {
        Err(Error::Syntax { file, line, .. }) => {
            assert!(file.ends_with("bad.journal"));
            assert_eq!(line, 1);
        }
        other => panic!("expected syntax error, got {other:?}", other = other.err()),
    }
}

#[test]
fn transactions_in_interval_is_inclusive() {
    let (_dir, url) = journal(
        "2020-01-01 a\n  A  1 X\n  B  -1 X\n\
         2020-01-15 b\n  A  1 X\n  B  -1 X\n\
         2020-01-31 c\n  A  1 X\n  B  -1 X\n",
    );
    let book = open(&url).unwrap();
    let got = book.ledger.transactions_in_interval(
        parse_date("2020-01-01").unwrap(),
        parse_date("2020-01-15").unwrap(),
    );
    assert_eq!(got.len(), 2);
}

#[test]
fn transactions_in_account_are_deduplicated() {
    let (_dir, url) = journal(
        "2020-01-01 move\n  Assets:Cash  $10\n  Assets:Cash  $-4\n  Equity  $-6\n\
         2020-01-02 other\n  Expenses  $1\n  Equity\n",
    );
    let book = open(&url).unwrap();
    let ledger = &book.ledger;
    let cash = ledger.account_by_name("Assets:Cash").unwrap();
    assert_eq!(ledger.transactions_in_account(cash).len(), 1);
    let equity = ledger.account_by_name("Equity").unwrap();
    assert_eq!(ledger.transactions_in_account(equity).len(), 2);
}

#[test]
fn balance_at_a_point_in_time() {
    let (_dir, url) = journal(
        "2020-01-01 a\n  Assets:Cash  $10\n  Equity\n\
         2020-02-01 b\n  Assets:Cash  $5\n  Equity\n",
    );
    let book = open(&url).unwrap();
    let ledger = &book.ledger;
    let cash = ledger.account_by_name("Assets:Cash").unwrap();
    let dollar = ledger.currency_by_name("$").unwrap();

    let mid = ledger.balance(cash, Some(parse_date("2020-01-20").unwrap()));
    assert_eq!(mid.get(dollar), 10 * U);

    let early = ledger.balance(cash, Some(parse_date("2019-12-31").unwrap()));
    assert!(early.is_empty());

    let latest = ledger.balance(cash, None);
    assert_eq!(latest.get(dollar), 15 * U);
}
