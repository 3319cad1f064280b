//! End-to-end scenario over the in-memory repositories:
//! invoice -> journal posting -> payment -> aging -> period close ->
//! year-end.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use keystone_core::arap::{
    generate_aging_report, standard_buckets, ArapService, Counterparty, CounterpartyKind,
    CreateInvoiceInput, InvoiceLine, InvoiceStatus, Payment, PaymentMethod,
};
use keystone_core::currency::{effective_rate, Currency, CurrencyService, ExchangeRate};
use keystone_core::event::{AuditContext, MemorySink};
use keystone_core::fiscal::{FiscalPeriod, FiscalService, FiscalYear, PeriodStatus};
use keystone_core::ledger::{
    account_balance, Account, AccountType, EntryStatus, JournalEntry, JournalLine, LedgerError,
    LedgerService,
};
use keystone_core::store::MemoryLedger;
use keystone_core::tax::{
    CalculationMethod, ProductType, TaxJurisdiction, TaxRate, TaxType,
};
use keystone_shared::config::CoreConfig;
use keystone_shared::types::{
    AccountId, CounterpartyId, FiscalPeriodId, FiscalYearId, JurisdictionId, Money, TaxRateId,
    TenantId, UserId,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn money(s: &str) -> Money {
    Money::parse(s, 2).unwrap()
}

fn ctx() -> AuditContext {
    AuditContext {
        tenant_id: TenantId::new(),
        user_id: UserId::new(),
    }
}

struct Engine {
    journal: MemoryLedger,
    periods: MemoryLedger,
    accounts: MemoryLedger,
    invoices: MemoryLedger,
    payments: MemoryLedger,
    sink: MemorySink,
    year_id: FiscalYearId,
    period_ids: Vec<FiscalPeriodId>,
    cash: AccountId,
    receivable: AccountId,
    revenue: AccountId,
    tax_payable: AccountId,
    expense: AccountId,
    retained: AccountId,
}

fn account(accounts: &mut MemoryLedger, code: &str, account_type: AccountType) -> AccountId {
    use keystone_core::store::AccountRepository;
    let account = Account {
        id: AccountId::new(),
        tenant_id: TenantId::new(),
        code: code.to_string(),
        name: code.to_string(),
        account_type,
        is_active: true,
    };
    let id = account.id;
    accounts.insert_account(account).unwrap();
    id
}

fn setup() -> Engine {
    let journal = MemoryLedger::new();
    let mut periods = MemoryLedger::new();
    let mut accounts = MemoryLedger::new();

    let year_id = FiscalYearId::new();
    let quarters: Vec<FiscalPeriod> = (0i32..4)
        .map(|q| {
            let start = date(2026, u32::try_from(q * 3 + 1).unwrap(), 1);
            let end = match q {
                0 => date(2026, 3, 31),
                1 => date(2026, 6, 30),
                2 => date(2026, 9, 30),
                _ => date(2026, 12, 31),
            };
            FiscalPeriod {
                id: FiscalPeriodId::new(),
                fiscal_year_id: year_id,
                period_number: q + 1,
                name: format!("Q{} 2026", q + 1),
                start_date: start,
                end_date: end,
                status: PeriodStatus::Open,
            }
        })
        .collect();
    let period_ids = quarters.iter().map(|p| p.id).collect();
    let year = FiscalYear {
        id: year_id,
        tenant_id: TenantId::new(),
        name: "FY2026".to_string(),
        start_date: date(2026, 1, 1),
        end_date: date(2026, 12, 31),
    };
    FiscalService::open_year(&mut periods, &year, quarters).unwrap();

    let cash = account(&mut accounts, "1000", AccountType::Asset);
    let receivable = account(&mut accounts, "1100", AccountType::Asset);
    let revenue = account(&mut accounts, "4000", AccountType::Revenue);
    let tax_payable = account(&mut accounts, "2200", AccountType::Liability);
    let expense = account(&mut accounts, "5000", AccountType::Expense);
    let retained = account(&mut accounts, "3900", AccountType::Equity);

    Engine {
        journal,
        periods,
        accounts,
        invoices: MemoryLedger::new(),
        payments: MemoryLedger::new(),
        sink: MemorySink::new(),
        year_id,
        period_ids,
        cash,
        receivable,
        revenue,
        tax_payable,
        expense,
        retained,
    }
}

fn california() -> TaxJurisdiction {
    let id = JurisdictionId::new();
    TaxJurisdiction {
        id,
        code: "US-CA".to_string(),
        name: "California".to_string(),
        rates: vec![TaxRate {
            id: TaxRateId::new(),
            jurisdiction_id: id,
            tax_type: TaxType::Sales,
            name: "CA state sales tax".to_string(),
            method: CalculationMethod::Percentage { rate: dec!(8.25) },
            applies_to: None,
            effective_from: date(2020, 1, 1),
            effective_to: None,
            min_taxable: None,
            max_taxable: None,
        }],
    }
}

fn post_entry(
    engine: &mut Engine,
    entry_date: NaiveDate,
    lines: Vec<JournalLine>,
) -> JournalEntry {
    let mut entry = JournalEntry::draft(TenantId::new(), entry_date, "scenario", UserId::new());
    entry.lines = lines;
    let entry = LedgerService::create_draft(&mut engine.journal, entry).unwrap();
    LedgerService::post(
        &mut engine.journal,
        &engine.periods,
        &engine.sink,
        entry.id,
        &ctx(),
    )
    .unwrap()
}

#[test]
fn invoice_to_year_end_flow() {
    let mut engine = setup();
    let config = CoreConfig::default();
    assert_eq!(config.ledger.default_scale, 2);
    let jurisdictions = vec![california()];

    // 1. Invoice a customer: 1000.00 of goods plus 8.25% sales tax
    let customer = Counterparty {
        id: CounterpartyId::new(),
        tenant_id: TenantId::new(),
        kind: CounterpartyKind::Customer,
        name: "Acme Retail".to_string(),
    };
    let invoice = ArapService::create_invoice(
        &mut engine.invoices,
        &engine.sink,
        CreateInvoiceInput {
            tenant_id: customer.tenant_id,
            counterparty_id: customer.id,
            counterparty_kind: customer.kind,
            number: "INV-2026-001".to_string(),
            invoice_date: date(2026, 2, 1),
            due_date: date(2026, 3, 3),
            currency: config.ledger.base_currency.clone(),
            lines: vec![InvoiceLine {
                description: "Widgets".to_string(),
                quantity: dec!(10),
                unit_price: money("100.00"),
                tax_codes: vec!["US-CA".to_string()],
                product_type: ProductType::Goods,
            }],
            created_by: UserId::new(),
        },
        |code| jurisdictions.iter().find(|j| j.code == code),
        &ctx(),
    )
    .unwrap();
    assert_eq!(invoice.total_amount, money("1082.50"));

    // 2. The matching journal entry: AR against revenue and tax payable
    let (receivable, revenue, tax_payable) = (engine.receivable, engine.revenue, engine.tax_payable);
    post_entry(
        &mut engine,
        date(2026, 2, 1),
        vec![
            JournalLine::debit(receivable, money("1082.50")),
            JournalLine::credit(revenue, money("1000.00")),
            JournalLine::credit(tax_payable, money("82.50")),
        ],
    );

    // 3. An expense during the year
    let (expense, cash) = (engine.expense, engine.cash);
    post_entry(
        &mut engine,
        date(2026, 5, 12),
        vec![
            JournalLine::debit(expense, money("400.00")),
            JournalLine::credit(cash, money("400.00")),
        ],
    );

    // 4. Aging as of mid-April: invoice due 2026-03-03 is 43 days overdue
    let report = generate_aging_report(
        &engine.invoices,
        date(2026, 4, 15),
        &standard_buckets(),
        config.ledger.default_scale,
    )
    .unwrap();
    let bucket_31_60 = report.buckets.iter().find(|b| b.label == "31-60").unwrap();
    assert_eq!(bucket_31_60.invoice_count, 1);
    assert_eq!(bucket_31_60.balance_total, money("1082.50"));

    // 5. The customer pays in full; cash replaces the receivable
    let payment = ArapService::record_payment(
        &mut engine.payments,
        Payment::new(
            TenantId::new(),
            invoice.counterparty_id,
            date(2026, 4, 20),
            "USD",
            money("1082.50"),
            PaymentMethod::BankTransfer {
                reference: Some("WIRE-4411".to_string()),
            },
            UserId::new(),
        ),
    )
    .unwrap();
    let (paid_invoice, _) = ArapService::apply_payment(
        &mut engine.invoices,
        &mut engine.payments,
        &engine.sink,
        payment.id,
        invoice.id,
        money("1082.50"),
        &ctx(),
    )
    .unwrap();
    assert_eq!(paid_invoice.status, InvoiceStatus::Paid);
    assert!(paid_invoice.balance_amount.is_zero());

    let (cash, receivable) = (engine.cash, engine.receivable);
    post_entry(
        &mut engine,
        date(2026, 4, 20),
        vec![
            JournalLine::debit(cash, money("1082.50")),
            JournalLine::credit(receivable, money("1082.50")),
        ],
    );

    // 6. Balances derived purely from posted history
    let receivable_balance = account_balance(
        &engine.journal,
        &engine.accounts,
        engine.receivable,
        date(2026, 12, 31),
    )
    .unwrap();
    assert!(receivable_balance.balance.is_zero());
    let revenue_balance = account_balance(
        &engine.journal,
        &engine.accounts,
        engine.revenue,
        date(2026, 12, 31),
    )
    .unwrap();
    assert_eq!(revenue_balance.balance, money("1000.00"));

    // 7. Close Q1-Q3, then run year-end
    for id in engine.period_ids[..3].to_vec() {
        FiscalService::close_period(&engine.journal, &mut engine.periods, &engine.sink, id, &ctx())
            .unwrap();
    }
    let result = FiscalService::process_year_end(
        &mut engine.journal,
        &mut engine.periods,
        &engine.accounts,
        &engine.sink,
        engine.year_id,
        engine.retained,
        &ctx(),
    )
    .unwrap();

    // Net income 600.00 lands in retained earnings; the final period closes
    assert_eq!(result.net_income, money("600.00"));
    assert_eq!(result.closed_period.status, PeriodStatus::Closed);
    let retained_balance = account_balance(
        &engine.journal,
        &engine.accounts,
        engine.retained,
        date(2026, 12, 31),
    )
    .unwrap();
    assert_eq!(retained_balance.balance, money("600.00"));

    // 8. The closed year rejects any further posting
    let mut late = JournalEntry::draft(TenantId::new(), date(2026, 11, 5), "late", UserId::new());
    late.lines = vec![
        JournalLine::debit(engine.cash, money("10.00")),
        JournalLine::credit(engine.revenue, money("10.00")),
    ];
    let late = LedgerService::create_draft(&mut engine.journal, late).unwrap();
    let rejected = LedgerService::post(
        &mut engine.journal,
        &engine.periods,
        &engine.sink,
        late.id,
        &ctx(),
    );
    assert!(matches!(rejected, Err(LedgerError::PeriodClosed { .. })));
}

#[test]
fn reversal_restores_balances() {
    let mut engine = setup();

    let (expense, cash) = (engine.expense, engine.cash);
    let posted = post_entry(
        &mut engine,
        date(2026, 2, 10),
        vec![
            JournalLine::debit(expense, money("250.00")),
            JournalLine::credit(cash, money("250.00")),
        ],
    );
    let reversal = LedgerService::reverse(
        &mut engine.journal,
        &engine.periods,
        &engine.sink,
        posted.id,
        "entered twice",
        date(2026, 2, 11),
        &ctx(),
    )
    .unwrap();
    assert_eq!(reversal.status, EntryStatus::Posted);

    let expense_balance = account_balance(
        &engine.journal,
        &engine.accounts,
        engine.expense,
        date(2026, 12, 31),
    )
    .unwrap();
    assert!(expense_balance.balance.is_zero());
    let cash_balance = account_balance(
        &engine.journal,
        &engine.accounts,
        engine.cash,
        date(2026, 12, 31),
    )
    .unwrap();
    assert!(cash_balance.balance.is_zero());
}

#[test]
fn multi_currency_invoice_amounts_convert_to_base() {
    // Conversion sits outside the invoice itself: the AR subledger keeps
    // the document currency, the journal keeps the functional currency.
    let usd = Currency::base("USD", 2);
    let eur = Currency::new("EUR", 2);
    let rates =
        vec![ExchangeRate::new("EUR", "USD", dec!(1.0870), date(2026, 1, 1), None).unwrap()];
    let lookup = |from: &str, to: &str, d: NaiveDate| {
        effective_rate(&rates, from, to, d).map(|r| r.rate)
    };

    let eur_total = money("920.00");
    let functional =
        CurrencyService::convert(eur_total, &eur, &usd, date(2026, 2, 1), &lookup).unwrap();
    assert_eq!(functional.to_string(), "1000.04");

    // And the back-conversion uses the reciprocal within one minor unit
    let back = CurrencyService::convert(functional, &usd, &eur, date(2026, 2, 1), &lookup).unwrap();
    let drift = back.checked_sub(eur_total).unwrap().abs();
    assert!(drift <= Money::from_minor_units(1, 2));
}
