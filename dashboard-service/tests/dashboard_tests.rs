// Dashboard aggregation tests against the in-memory ledger repository.

use std::sync::Arc;

use audit_service::AuditService;
use common::model::account::{BankRef, CategoryRef, CurrencyRef};
use common::model::transaction::FlowKind;
use common::model::user::{Actor, Role};
use dashboard_service::DashboardService;
use ledger_service::{
    AccountService, InMemoryLedgerRepository, LedgerRepository, LedgerService, NewAccount,
    NewTransaction,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn actor() -> Actor {
    Actor::new(Uuid::new_v4(), "teller@example.org", Role::Acct)
}

fn new_account(name: &str, number: &str, category: &str, bank: &str, code: &str) -> NewAccount {
    NewAccount {
        name: name.to_string(),
        account_number: number.to_string(),
        bank: BankRef {
            id: Uuid::new_v4(),
            name: bank.to_string(),
        },
        currency: CurrencyRef {
            id: Uuid::new_v4(),
            code: code.to_string(),
        },
        category: CategoryRef {
            id: Uuid::new_v4(),
            name: category.to_string(),
        },
        opening_balance: None,
    }
}

fn setup() -> (Arc<LedgerService>, AccountService, DashboardService) {
    let repo: Arc<dyn LedgerRepository> = Arc::new(InMemoryLedgerRepository::new());
    let audit = Arc::new(AuditService::new());
    let ledger = Arc::new(LedgerService::new(Arc::clone(&repo), audit));
    let accounts = AccountService::new(Arc::clone(&repo));
    let dashboard = DashboardService::new(repo);
    (ledger, accounts, dashboard)
}

async fn post(
    ledger: &LedgerService,
    account_id: Uuid,
    kind: FlowKind,
    amount: rust_decimal::Decimal,
    actor: &Actor,
) {
    ledger
        .post(
            NewTransaction {
                account_id,
                kind,
                amount,
                description: None,
            },
            actor,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_flow_summary_spans_first_and_last_snapshot() {
    let (ledger, accounts, dashboard) = setup();
    let actor = actor();
    let mut input = new_account("Operations", "ACC-001", "project", "First National", "USD");
    input.opening_balance = Some(dec!(100));
    let account = accounts.create(input, &actor).await.unwrap();

    post(&ledger, account.id, FlowKind::Inflow, dec!(50.00), &actor).await;
    post(&ledger, account.id, FlowKind::Outflow, dec!(20.00), &actor).await;

    let grouped = dashboard.all_accounts_grouped().await.unwrap();
    let summaries = &grouped["project"]["First National"]["USD"];
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.id, account.id);
    assert_eq!(summary.inflow, dec!(50.00));
    assert_eq!(summary.outflow, dec!(20.00));
    // First transaction's previous snapshot, last transaction's current
    assert_eq!(summary.previous_balance, dec!(100));
    assert_eq!(summary.current_balance, dec!(130.00));
}

#[tokio::test]
async fn test_account_without_transactions_uses_stored_balance() {
    let (_, accounts, dashboard) = setup();
    let actor = actor();
    let mut input = new_account("Idle", "ACC-002", "secretariat", "Metro Bank", "EUR");
    input.opening_balance = Some(dec!(40));
    accounts.create(input, &actor).await.unwrap();

    let grouped = dashboard.all_accounts_grouped().await.unwrap();
    let summary = &grouped["secretariat"]["Metro Bank"]["EUR"][0];
    assert_eq!(summary.previous_balance, dec!(40));
    assert_eq!(summary.current_balance, dec!(40));
    assert_eq!(summary.inflow, dec!(0));
    assert_eq!(summary.outflow, dec!(0));
}

#[tokio::test]
async fn test_grouping_keys_follow_reference_data() {
    let (_, accounts, dashboard) = setup();
    let actor = actor();

    accounts
        .create(
            new_account("P1", "ACC-003", "project", "First National", "USD"),
            &actor,
        )
        .await
        .unwrap();
    accounts
        .create(
            new_account("P2", "ACC-004", "project", "First National", "USD"),
            &actor,
        )
        .await
        .unwrap();
    accounts
        .create(
            new_account("S1", "ACC-005", "secretariat", "Metro Bank", "EUR"),
            &actor,
        )
        .await
        .unwrap();

    let grouped = dashboard.all_accounts_grouped().await.unwrap();
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped["project"]["First National"]["USD"].len(), 2);
    assert_eq!(grouped["secretariat"]["Metro Bank"]["EUR"].len(), 1);
}

#[tokio::test]
async fn test_category_filter() {
    let (_, accounts, dashboard) = setup();
    let actor = actor();
    accounts
        .create(
            new_account("P1", "ACC-006", "project", "First National", "USD"),
            &actor,
        )
        .await
        .unwrap();
    accounts
        .create(
            new_account("S1", "ACC-007", "secretariat", "Metro Bank", "EUR"),
            &actor,
        )
        .await
        .unwrap();

    let grouped = dashboard.accounts_grouped_by_category("project").await.unwrap();
    assert_eq!(grouped.len(), 1);
    assert!(grouped.contains_key("project"));
    assert_eq!(grouped["project"]["First National"]["USD"].len(), 1);

    // Unknown category resolves to an empty subtree, not an error
    let empty = dashboard.accounts_grouped_by_category("missing").await.unwrap();
    assert_eq!(empty.len(), 1);
    assert!(empty["missing"].is_empty());
}
