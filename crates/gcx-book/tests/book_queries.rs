//! Loading and lookups on a complete book.

use gcx_book::{Book, BookConfig, ElementRef, Owned, OwnerKind};
use gcx_book::slots::find_slot;
use gcx_types::{CmdtyCurrId, Guid, SlotValue};
use rust_decimal_macros::dec;

const FIXTURE: &str = include_str!("fixtures/sample.gnucash");

fn book() -> Book {
    Book::from_bytes(FIXTURE.as_bytes().to_vec(), BookConfig::default()).unwrap()
}

fn g(hex: &str) -> Guid {
    Guid::parse(hex).unwrap()
}

const ROOT: &str = "a0000000000000000000000000000001";
const CHECKING: &str = "a0000000000000000000000000000003";
const BROKERAGE: &str = "a0000000000000000000000000000004";
const INCOME: &str = "a0000000000000000000000000000005";
const INVOICE: &str = "1a000000000000000000000000000001";
const CUSTOMER: &str = "c1000000000000000000000000000001";

#[test]
fn reference_book_loads_cleanly() {
    let book = book();
    let report = book.report();
    assert!(report.is_clean(), "{report:?}");
    assert_eq!(report.commodities_without_xcode, 2);
    assert_eq!(book.id(), Some(g("0b000000000000000000000000000001")));
    assert_eq!(book.declared_counts().get("book"), Some(1));
    assert_eq!(book.declared_counts().get("account"), Some(5));

    let index = book.index();
    assert_eq!(index.commodities.len(), 3);
    assert_eq!(index.accounts.len(), 5);
    assert_eq!(index.transactions.len(), 2);
    assert_eq!(index.prices.len(), 3);
    assert_eq!(index.template_accounts.len(), 1);
    assert_eq!(index.template_transactions.len(), 1);
    assert_eq!(index.scheduled.len(), 1);
    assert_eq!(index.budgets.len(), 1);
}

#[test]
fn xcode_map_points_back_to_the_same_commodity() {
    let book = book();
    let index = book.index();
    for commodity in index.commodities.values() {
        if let Some(xcode) = &commodity.xcode {
            let found = index.commodity_by_xcode(xcode).unwrap();
            assert_eq!(found.id, commodity.id);
        }
    }
    let acme = index.commodity_by_xcode("US0000000001").unwrap();
    assert_eq!(acme.id, CmdtyCurrId::security("NASDAQ", "ACME"));
    assert_eq!(acme.fraction, Some(10000));
    assert!(acme.get_quotes);
}

#[test]
fn account_tree_and_balances() {
    let book = book();
    let index = book.index();
    assert_eq!(index.root_account().map(|a| a.id), Some(g(ROOT)));
    assert_eq!(index.full_name(&g(CHECKING)).as_deref(), Some("Assets:Checking"));

    let mut top: Vec<&str> = index.top_level_accounts().iter().map(|a| a.name.as_str()).collect();
    top.sort_unstable();
    assert_eq!(top, ["Assets", "Income"]);

    assert_eq!(index.balance(&g(CHECKING)), dec!(1250));
    assert_eq!(index.balance(&g(INCOME)), dec!(-1250));
    assert_eq!(index.subtree_balance(&g(ROOT)), dec!(0));
    assert_eq!(index.balance(&g(BROKERAGE)), dec!(0));
    assert_eq!(book.balance_in_default_currency(&g(CHECKING)), Some(dec!(1250)));

    let checking = index.accounts.get(&g(CHECKING)).unwrap();
    assert_eq!(checking.description.as_deref(), Some("Main & only"));
    assert_eq!(
        find_slot(&checking.slots, "notes"),
        Some(&SlotValue::String("Joint account".into()))
    );
}

#[test]
fn prices_resolve_through_the_latest_quotes() {
    let book = book();
    let acme = CmdtyCurrId::security("NASDAQ", "ACME");
    let usd = CmdtyCurrId::currency("USD");
    let eur = CmdtyCurrId::currency("EUR");

    assert_eq!(book.default_currency(), Some(&eur));
    assert_eq!(book.resolve_price(&acme, Some(&usd)), Some(dec!(125)));
    assert_eq!(book.resolve_price(&acme, None), Some(dec!(112.5)));
    assert_eq!(book.resolve_price(&eur, Some(&acme)), None);

    let table = book.currency_table();
    assert!(!table.is_stale());
    assert_eq!(table.factor(&eur), Some(dec!(1)));
    assert_eq!(table.factor(&usd), Some(dec!(0.9)));
    assert_eq!(table.factor(&acme), Some(dec!(112.5)));
}

#[test]
fn configured_currency_overrides_the_guess() {
    let config = BookConfig {
        default_currency: Some("USD".into()),
        ..BookConfig::default()
    };
    let book = Book::from_bytes(FIXTURE.as_bytes().to_vec(), config).unwrap();
    let acme = CmdtyCurrId::security("NASDAQ", "ACME");
    assert_eq!(book.default_currency(), Some(&CmdtyCurrId::currency("USD")));
    assert_eq!(book.resolve_price(&acme, None), Some(dec!(125)));
}

#[test]
fn invoice_links_entries_owner_and_posting() {
    let book = book();
    let index = book.index();
    let invoice = index.invoices.get(&g(INVOICE)).unwrap();

    assert_eq!(invoice.entries, vec![g("1e000000000000000000000000000001")]);
    assert_eq!(invoice.notes.as_deref(), Some("Thanks & see you"));
    assert!(invoice.is_posted());
    assert_eq!(index.invoice_amount(invoice), Some(dec!(250)));

    let direct = invoice.direct_owner(index).unwrap();
    assert_eq!(direct.kind(), OwnerKind::Job);
    assert_eq!(direct.name(), "Website");
    let billed = invoice.billed_party(index).unwrap();
    assert_eq!(billed.kind(), OwnerKind::Customer);
    assert_eq!(billed.name(), "Acme <Retail>");
    assert_eq!(index.invoices_of(&g(CUSTOMER)).len(), 1);

    let posting = index.transactions.get(&g("7a000000000000000000000000000002")).unwrap();
    assert_eq!(posting.invoice, Some(invoice.guid));
    assert_eq!(posting.imbalance(), dec!(0));
}

#[test]
fn empty_string_slot_is_loaded_as_empty_text() {
    let book = book();
    let opening = book
        .index()
        .transactions
        .get(&g("7a000000000000000000000000000001"))
        .unwrap();
    assert_eq!(opening.description, "Opening balance");
    assert_eq!(find_slot(&opening.slots, "notes"), Some(&SlotValue::String(String::new())));
    assert_eq!(opening.splits.len(), 2);
}

#[test]
fn templates_are_kept_apart_from_the_ledger() {
    let book = book();
    let index = book.index();
    let template_account = g("0d000000000000000000000000000001");
    assert!(index.accounts.get(&template_account).is_none());
    assert!(index.template_accounts.contains(&template_account));

    let sx = index.scheduled.get(&g("0c000000000000000000000000000001")).unwrap();
    assert_eq!(sx.template_account, Some(template_account));

    let txn = index
        .template_transactions
        .get(&g("7a000000000000000000000000000009"))
        .unwrap();
    assert!(matches!(txn.origin, ElementRef::Nested { pos: 1, .. }));
    assert!(book.element(txn.origin).is_some_and(|el| el.name == "gnc:transaction"));
}

#[test]
fn parties_and_terms() {
    let book = book();
    let index = book.index();
    let employee = index.employees.iter().next().unwrap();
    assert_eq!(employee.display_name(), "J. Doe");
    assert_eq!(employee.username, "jdoe");
    let vendor = index.vendors.iter().next().unwrap();
    assert_eq!(vendor.name, "Paper Supplies");
    let job = index.jobs.iter().next().unwrap();
    assert_eq!(job.owner_ref().kind, OwnerKind::Customer);

    let vat = index.tax_tables.iter().next().unwrap();
    assert_eq!(vat.entries.len(), 1);
    assert_eq!(vat.entries[0].amount, dec!(19));
    let net30 = index.bill_terms.iter().next().unwrap();
    assert_eq!(net30.name, "Net30");
}

#[test]
fn load_report_serializes_for_tooling() {
    let book = book();
    let json = serde_json::to_value(book.report()).unwrap();
    assert_eq!(json["commodities_without_xcode"], 2);
    assert_eq!(json["commodity_map_divergent"], false);
    assert!(json["skipped"].as_array().is_some_and(Vec::is_empty));
}
