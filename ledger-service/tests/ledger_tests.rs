// Ledger behavior tests against the in-memory repository.

use std::sync::Arc;

use audit_service::AuditService;
use common::error::Error;
use common::model::account::{BankRef, CategoryRef, CurrencyRef};
use common::model::audit::{AuditAction, EntityKind};
use common::model::transaction::FlowKind;
use common::model::user::{Actor, Role};
use common::pagination::PageQuery;
use futures::future::join_all;
use ledger_service::{
    AccountService, InMemoryLedgerRepository, LedgerRepository, LedgerService, NewAccount,
    NewTransaction, TransactionPatch,
};
use rust_decimal_macros::dec;
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
            name: "Operations".to_string(),
        },
        opening_balance: None,
    }
}

fn setup() -> (Arc<LedgerService>, AccountService, Arc<AuditService>) {
    let repo: Arc<dyn LedgerRepository> = Arc::new(InMemoryLedgerRepository::new());
    let audit = Arc::new(AuditService::new());
    let ledger = Arc::new(LedgerService::new(Arc::clone(&repo), Arc::clone(&audit)));
    let accounts = AccountService::new(repo);
    (ledger, accounts, audit)
}

fn post_input(account_id: Uuid, kind: FlowKind, amount: rust_decimal::Decimal) -> NewTransaction {
    NewTransaction {
        account_id,
        kind,
        amount,
        description: None,
    }
}

#[tokio::test]
async fn test_inflow_credits_balance() {
    let (ledger, accounts, _) = setup();
    let actor = actor();
    let account = accounts
        .create(new_account("Operations", "ACC-001"), &actor)
        .await
        .unwrap();

    let view = ledger
        .post(
            post_input(account.id, FlowKind::Inflow, dec!(100.00)),
            &actor,
        )
        .await
        .unwrap();

    assert_eq!(view.transaction.previous_balance, dec!(0));
    assert_eq!(view.transaction.current_balance, dec!(100.00));
    assert_eq!(view.transaction.created_by, actor.id);
    assert!(view.transaction.chain_is_consistent());
    assert_eq!(view.account.name, "Operations");

    let stored = ledger.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, dec!(100.00));
}

#[tokio::test]
async fn test_overdraft_is_rejected_without_side_effects() {
    let (ledger, accounts, audit) = setup();
    let actor = actor();
    let mut input = new_account("Petty cash", "ACC-002");
    input.opening_balance = Some(dec!(100));
    let account = accounts.create(input, &actor).await.unwrap();

    let result = ledger
        .post(
            post_input(account.id, FlowKind::Outflow, dec!(150.00)),
            &actor,
        )
        .await;
    assert!(matches!(result, Err(Error::InsufficientFunds(_))));

    // Balance untouched, nothing posted, nothing audited
    let stored = ledger.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, dec!(100));
    let page = ledger.find_all(PageQuery::default()).await.unwrap();
    assert_eq!(page.total, 0);
    let trail = audit.find_all(PageQuery::default()).await.unwrap();
    assert_eq!(trail.total, 0);
}

#[tokio::test]
async fn test_snapshot_chain_across_posts() {
    let (ledger, accounts, _) = setup();
    let actor = actor();
    let mut input = new_account("Field office", "ACC-003");
    input.opening_balance = Some(dec!(100));
    let account = accounts.create(input, &actor).await.unwrap();

    let t1 = ledger
        .post(
            post_input(account.id, FlowKind::Outflow, dec!(40.00)),
            &actor,
        )
        .await
        .unwrap();
    assert_eq!(t1.transaction.previous_balance, dec!(100));
    assert_eq!(t1.transaction.current_balance, dec!(60.00));

    let t2 = ledger
        .post(
            post_input(account.id, FlowKind::Inflow, dec!(10.00)),
            &actor,
        )
        .await
        .unwrap();
    assert_eq!(t2.transaction.previous_balance, dec!(60.00));
    assert_eq!(t2.transaction.current_balance, dec!(70.00));

    let stored = ledger.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, dec!(70.00));
}

#[tokio::test]
async fn test_amount_validation() {
    let (ledger, accounts, _) = setup();
    let actor = actor();
    let account = accounts
        .create(new_account("Validation", "ACC-004"), &actor)
        .await
        .unwrap();

    for bad in [dec!(0), dec!(-5), dec!(1.005)] {
        let result = ledger
            .post(post_input(account.id, FlowKind::Inflow, bad), &actor)
            .await;
        assert!(
            matches!(result, Err(Error::ValidationError(_))),
            "amount {} should be rejected",
            bad
        );
    }
}

#[tokio::test]
async fn test_post_against_unknown_account() {
    let (ledger, _, _) = setup();
    let result = ledger
        .post(
            post_input(Uuid::new_v4(), FlowKind::Inflow, dec!(10.00)),
            &actor(),
        )
        .await;
    assert!(matches!(result, Err(Error::AccountNotFound(_))));
}

#[tokio::test]
async fn test_update_changes_description_and_audits_the_diff() {
    let (ledger, accounts, audit) = setup();
    let actor = actor();
    let account = accounts
        .create(new_account("Corrections", "ACC-005"), &actor)
        .await
        .unwrap();
    let posted = ledger
        .post(
            NewTransaction {
                account_id: account.id,
                kind: FlowKind::Inflow,
                amount: dec!(25.00),
                description: Some("grant".to_string()),
            },
            &actor,
        )
        .await
        .unwrap();

    let updated = ledger
        .update(
            posted.transaction.id,
            TransactionPatch {
                description: Some("quarterly grant".to_string()),
                ..Default::default()
            },
            &actor,
        )
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("quarterly grant"));
    // Snapshots survive the correction untouched
    assert_eq!(updated.previous_balance, posted.transaction.previous_balance);
    assert_eq!(updated.current_balance, posted.transaction.current_balance);

    let trail = audit
        .find_by_entity(
            EntityKind::Transaction,
            posted.transaction.id,
            PageQuery::default(),
        )
        .await
        .unwrap();
    let update_entry = trail
        .items
        .iter()
        .find(|e| e.action == AuditAction::Update)
        .expect("update entry recorded");
    assert_eq!(update_entry.field_changed.as_deref(), Some("description"));
    assert_eq!(update_entry.old_value.as_deref(), Some("grant"));
    assert_eq!(update_entry.new_value.as_deref(), Some("quarterly grant"));
}

#[tokio::test]
async fn test_update_rejects_balance_affecting_fields() {
    let (ledger, accounts, audit) = setup();
    let actor = actor();
    let account = accounts
        .create(new_account("Frozen", "ACC-006"), &actor)
        .await
        .unwrap();
    let posted = ledger
        .post(
            NewTransaction {
                account_id: account.id,
                kind: FlowKind::Inflow,
                amount: dec!(25.00),
                description: Some("original".to_string()),
            },
            &actor,
        )
        .await
        .unwrap();

    let amount_patch = TransactionPatch {
        amount: Some(dec!(30.00)),
        ..Default::default()
    };
    assert!(matches!(
        ledger.update(posted.transaction.id, amount_patch, &actor).await,
        Err(Error::ValidationError(_))
    ));

    let kind_patch = TransactionPatch {
        kind: Some(FlowKind::Outflow),
        ..Default::default()
    };
    assert!(matches!(
        ledger.update(posted.transaction.id, kind_patch, &actor).await,
        Err(Error::ValidationError(_))
    ));

    // The rejected patches left the transaction exactly as posted
    let stored = ledger.find_one(posted.transaction.id).await.unwrap();
    assert_eq!(stored.transaction.kind, FlowKind::Inflow);
    assert_eq!(stored.transaction.amount, dec!(25.00));
    assert_eq!(stored.transaction.description.as_deref(), Some("original"));
    assert_eq!(stored.transaction.current_balance, dec!(25.00));

    // Balance untouched, and no UPDATE entry joined the CREATE
    let balance = ledger.get_account(account.id).await.unwrap().unwrap().balance;
    assert_eq!(balance, dec!(25.00));
    let trail = audit
        .find_by_entity(
            EntityKind::Transaction,
            posted.transaction.id,
            PageQuery::default(),
        )
        .await
        .unwrap();
    assert_eq!(trail.total, 1);
    assert_eq!(trail.items[0].action, AuditAction::Create);

    // Echoing the stored values back is not a change and is not audited
    let echo = TransactionPatch {
        kind: Some(FlowKind::Inflow),
        amount: Some(dec!(25.00)),
        description: None,
    };
    let unchanged = ledger
        .update(posted.transaction.id, echo, &actor)
        .await
        .unwrap();
    assert_eq!(unchanged.amount, dec!(25.00));
    let trail = audit
        .find_by_entity(
            EntityKind::Transaction,
            posted.transaction.id,
            PageQuery::default(),
        )
        .await
        .unwrap();
    assert_eq!(trail.total, 1);
}

#[tokio::test]
async fn test_remove_only_latest_and_restore_balance() {
    let (ledger, accounts, audit) = setup();
    let actor = actor();
    let mut input = new_account("Removals", "ACC-007");
    input.opening_balance = Some(dec!(50));
    let account = accounts.create(input, &actor).await.unwrap();

    let t1 = ledger
        .post(
            post_input(account.id, FlowKind::Inflow, dec!(20.00)),
            &actor,
        )
        .await
        .unwrap();
    let t2 = ledger
        .post(
            post_input(account.id, FlowKind::Outflow, dec!(30.00)),
            &actor,
        )
        .await
        .unwrap();

    // Removing anything but the latest breaks the chain
    assert!(matches!(
        ledger.remove(t1.transaction.id, &actor).await,
        Err(Error::Conflict(_))
    ));

    ledger.remove(t2.transaction.id, &actor).await.unwrap();
    let stored = ledger.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, t2.transaction.previous_balance);
    assert!(matches!(
        ledger.find_one(t2.transaction.id).await,
        Err(Error::TransactionNotFound(_))
    ));

    // After removal t1 is the latest and becomes removable
    ledger.remove(t1.transaction.id, &actor).await.unwrap();
    let stored = ledger.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, dec!(50));

    let deletes = audit
        .find_by_entity(
            EntityKind::Transaction,
            t2.transaction.id,
            PageQuery::default(),
        )
        .await
        .unwrap();
    assert!(deletes
        .items
        .iter()
        .any(|e| e.action == AuditAction::Delete));
}

#[tokio::test]
async fn test_listing_is_newest_first_and_denormalized() {
    let (ledger, accounts, _) = setup();
    let actor = actor();
    let account = accounts
        .create(new_account("History", "ACC-008"), &actor)
        .await
        .unwrap();

    let mut ids = Vec::new();
    for amount in [dec!(1.00), dec!(2.00), dec!(3.00)] {
        let view = ledger
            .post(post_input(account.id, FlowKind::Inflow, amount), &actor)
            .await
            .unwrap();
        ids.push(view.transaction.id);
    }

    let page = ledger.find_all(PageQuery::default()).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items[0].transaction.id, ids[2]);
    assert_eq!(page.items[2].transaction.id, ids[0]);
    assert!(page.items.iter().all(|v| v.account.name == "History"));
}

#[tokio::test]
async fn test_pagination_metadata() {
    let (ledger, accounts, _) = setup();
    let actor = actor();
    let account = accounts
        .create(new_account("Pages", "ACC-009"), &actor)
        .await
        .unwrap();
    for _ in 0..3 {
        ledger
            .post(
                post_input(account.id, FlowKind::Inflow, dec!(1.00)),
                &actor,
            )
            .await
            .unwrap();
    }

    let query = PageQuery {
        limit: Some(2),
        page: Some(2),
        ..Default::default()
    };
    let page = ledger.find_all(query).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.page, 2);
    assert_eq!(page.limit, 2);
    assert_eq!(page.total_pages(), 2);
}

#[tokio::test]
async fn test_concurrent_posts_serialize_per_account() {
    let (ledger, accounts, _) = setup();
    let actor = actor();
    let account = accounts
        .create(new_account("Contended", "ACC-010"), &actor)
        .await
        .unwrap();

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            let actor = actor.clone();
            let account_id = account.id;
            tokio::spawn(async move {
                ledger
                    .post(
                        post_input(account_id, FlowKind::Inflow, dec!(1.00)),
                        &actor,
                    )
                    .await
            })
        })
        .collect();

    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let stored = ledger.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.balance, dec!(10.00));

    // The chain must be gapless regardless of arrival order
    let chain = ledger
        .repository()
        .transactions_for_account(account.id)
        .await
        .unwrap();
    assert_eq!(chain.len(), 10);
    assert_eq!(chain[0].previous_balance, dec!(0));
    for pair in chain.windows(2) {
        assert_eq!(pair[1].previous_balance, pair[0].current_balance);
    }
    assert_eq!(chain[9].current_balance, dec!(10.00));
}

#[tokio::test]
async fn test_concurrent_posts_on_disjoint_accounts() {
    let (ledger, accounts, _) = setup();
    let actor = actor();
    let a = accounts
        .create(new_account("Left", "ACC-011"), &actor)
        .await
        .unwrap();
    let b = accounts
        .create(new_account("Right", "ACC-012"), &actor)
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for account_id in [a.id, b.id] {
        for _ in 0..5 {
            let ledger = Arc::clone(&ledger);
            let actor = actor.clone();
            tasks.push(tokio::spawn(async move {
                ledger
                    .post(
                        post_input(account_id, FlowKind::Inflow, dec!(2.00)),
                        &actor,
                    )
                    .await
            }));
        }
    }

    for result in join_all(tasks).await {
        result.unwrap().unwrap();
    }

    for id in [a.id, b.id] {
        let stored = ledger.get_account(id).await.unwrap().unwrap();
        assert_eq!(stored.balance, dec!(10.00));
    }
}

#[tokio::test]
async fn test_post_emits_one_create_audit_entry() {
    let (ledger, accounts, audit) = setup();
    let actor = actor();
    let account = accounts
        .create(new_account("Audited", "ACC-013"), &actor)
        .await
        .unwrap();
    let view = ledger
        .post(
            post_input(account.id, FlowKind::Inflow, dec!(75.50)),
            &actor,
        )
        .await
        .unwrap();

    let trail = audit
        .find_by_entity(
            EntityKind::Transaction,
            view.transaction.id,
            PageQuery::default(),
        )
        .await
        .unwrap();
    assert_eq!(trail.total, 1);
    let entry = &trail.items[0];
    assert_eq!(entry.action, AuditAction::Create);
    assert_eq!(entry.created_by, Some(actor.id));
    assert_eq!(
        entry.description.as_deref(),
        Some("Created inflow transaction of 75.50 for account Audited")
    );
}

#[tokio::test]
async fn test_account_creation_rules() {
    let (_, accounts, _) = setup();
    let actor = actor();

    accounts
        .create(new_account("Original", "ACC-014"), &actor)
        .await
        .unwrap();
    assert!(matches!(
        accounts
            .create(new_account("Duplicate", "ACC-014"), &actor)
            .await,
        Err(Error::Conflict(_))
    ));

    assert!(matches!(
        accounts.create(new_account("", "ACC-015"), &actor).await,
        Err(Error::ValidationError(_))
    ));

    let mut negative = new_account("Negative", "ACC-016");
    negative.opening_balance = Some(dec!(-1));
    assert!(matches!(
        accounts.create(negative, &actor).await,
        Err(Error::ValidationError(_))
    ));
}
