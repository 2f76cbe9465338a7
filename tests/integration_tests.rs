// Cross-crate integration tests over the fully wired in-memory state.

use api_gateway::AppState;
use audit_service::MutationEvent;
use common::error::Error;
use common::model::account::{BankRef, CategoryRef, CurrencyRef};
use common::model::audit::{AuditAction, EntityKind};
use common::model::transaction::FlowKind;
use common::model::user::{Actor, Role};
use common::pagination::PageQuery;
use ledger_service::{NewAccount, NewTransaction, TransactionPatch};
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

fn actor() -> Actor {
    Actor::new(Uuid::new_v4(), "teller@example.org", Role::Acct)
}

fn new_account(name: &str, number: &str) -> NewAccount {
    NewAccount {
        name: name.to_string(),
        account_number: number.to_string(),
        bank: BankRef {
            id: Uuid::new_v4(),
            name: "First National".to_string(),
        },
        currency: CurrencyRef {
            id: Uuid::new_v4(),
            code: "USD".to_string(),
        },
        category: CategoryRef {
            id: Uuid::new_v4(),
            name: "project".to_string(),
        },
        opening_balance: None,
    }
}

#[tokio::test]
async fn test_every_successful_mutation_audits_exactly_once() {
    let state = AppState::in_memory();
    let actor = actor();

    // Account creation is observed through the dispatcher
    let account = state
        .accounts
        .create(new_account("Operations", "ACC-100"), &actor)
        .await
        .unwrap();
    let event = MutationEvent::new(EntityKind::Account, AuditAction::Create, account.id)
        .with_actor(&actor)
        .with_response(json!({"name": account.name, "accountNumber": account.account_number}));
    assert!(state.dispatcher.record(event).await.is_recorded());

    // Post, correct, remove: the ledger audits each one itself
    let posted = state
        .ledger
        .post(
            NewTransaction {
                account_id: account.id,
                kind: FlowKind::Inflow,
                amount: dec!(60.00),
                description: Some("seed".to_string()),
            },
            &actor,
        )
        .await
        .unwrap();
    state
        .ledger
        .update(
            posted.transaction.id,
            TransactionPatch {
                description: Some("seed funding".to_string()),
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();
    state.ledger.remove(posted.transaction.id, &actor).await.unwrap();

    // A rejected mutation leaves no trace
    let rejected = state
        .ledger
        .post(
            NewTransaction {
                account_id: account.id,
                kind: FlowKind::Outflow,
                amount: dec!(999.00),
                description: None,
            },
            &actor,
        )
        .await;
    assert!(matches!(rejected, Err(Error::InsufficientFunds(_))));

    let trail = state.audit.find_all(PageQuery::default()).await.unwrap();
    assert_eq!(trail.total, 4);

    let actions: Vec<AuditAction> = trail.items.iter().map(|e| e.action).collect();
    // Newest first
    assert_eq!(
        actions,
        vec![
            AuditAction::Delete,
            AuditAction::Update,
            AuditAction::Create,
            AuditAction::Create,
        ]
    );
    assert!(trail.items.iter().all(|e| e.created_by == Some(actor.id)));
}

#[tokio::test]
async fn test_ledger_feeds_the_dashboard() {
    let state = AppState::in_memory();
    let actor = actor();
    let mut input = new_account("Field office", "ACC-101");
    input.opening_balance = Some(dec!(100));
    let account = state.accounts.create(input, &actor).await.unwrap();

    state
        .ledger
        .post(
            NewTransaction {
                account_id: account.id,
                kind: FlowKind::Inflow,
                amount: dec!(50.00),
                description: None,
            },
            &actor,
        )
        .await
        .unwrap();
    state
        .ledger
        .post(
            NewTransaction {
                account_id: account.id,
                kind: FlowKind::Outflow,
                amount: dec!(20.00),
                description: None,
            },
            &actor,
        )
        .await
        .unwrap();

    let grouped = state.dashboard.all_accounts_grouped().await.unwrap();
    let summary = &grouped["project"]["First National"]["USD"][0];
    assert_eq!(summary.inflow, dec!(50.00));
    assert_eq!(summary.outflow, dec!(20.00));
    assert_eq!(summary.previous_balance, dec!(100));
    assert_eq!(summary.current_balance, dec!(130.00));

    // The account's stored balance agrees with the last snapshot
    let stored = state.ledger.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, dec!(130.00));
}

#[tokio::test]
async fn test_audit_trail_reads_across_services() {
    let state = AppState::in_memory();
    let teller = actor();
    let account = state
        .accounts
        .create(new_account("Shared", "ACC-102"), &teller)
        .await
        .unwrap();
    let posted = state
        .ledger
        .post(
            NewTransaction {
                account_id: account.id,
                kind: FlowKind::Inflow,
                amount: dec!(10.00),
                description: None,
            },
            &teller,
        )
        .await
        .unwrap();

    let by_entity = state
        .audit
        .find_by_entity(
            EntityKind::Transaction,
            posted.transaction.id,
            PageQuery::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_entity.total, 1);
    assert_eq!(
        by_entity.items[0].description.as_deref(),
        Some("Created inflow transaction of 10.00 for account Shared")
    );

    let by_user = state
        .audit
        .find_by_user(teller.id, PageQuery::default())
        .await
        .unwrap();
    assert_eq!(by_user.total, 1);
}
