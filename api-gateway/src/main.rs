//! API gateway for the ledger core

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use audit_service::{AuditService, PostgresAuditRepository};
use ledger_service::{LedgerRepository, LedgerServiceConfig, PostgresLedgerRepository};

use api_gateway::api;
use api_gateway::api::account::{create_account, get_account, list_accounts};
use api_gateway::api::audit::{
    get_audit_log, list_audit_logs, list_audit_logs_by_entity, list_audit_logs_by_user,
};
use api_gateway::api::dashboard::{get_grouped_accounts, get_grouped_accounts_by_category};
use api_gateway::api::transaction::{
    delete_transaction, get_transaction, list_transactions, post_transaction, update_transaction,
};
use api_gateway::config::AppConfig;
use api_gateway::AppState;

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Transaction routes
        api::transaction::post_transaction,
        api::transaction::list_transactions,
        api::transaction::get_transaction,
        api::transaction::update_transaction,
        api::transaction::delete_transaction,
        // Audit routes
        api::audit::list_audit_logs,
        api::audit::get_audit_log,
        api::audit::list_audit_logs_by_entity,
        api::audit::list_audit_logs_by_user,
        // Account routes
        api::account::create_account,
        api::account::get_account,
        api::account::list_accounts,
        // Dashboard routes
        api::dashboard::get_grouped_accounts,
        api::dashboard::get_grouped_accounts_by_category,
    ),
    components(
        schemas(
            api::transaction::CreateTransactionRequest,
            api::transaction::UpdateTransactionRequest,
            api::account::CreateAccountRequest,
            api::response::MessageResponse,
            common::model::account::Account,
            common::model::account::AccountSummary,
            common::model::account::BankRef,
            common::model::account::CurrencyRef,
            common::model::account::CategoryRef,
            common::model::transaction::Transaction,
            common::model::transaction::TransactionView,
            common::model::transaction::FlowKind,
            common::model::audit::AuditEntry,
            common::model::audit::AuditAction,
            common::model::audit::EntityKind,
            dashboard_service::AccountFlowSummary,
        )
    ),
    tags(
        (name = "transaction", description = "Transaction ledger"),
        (name = "audit", description = "Audit trail"),
        (name = "account", description = "Account reference data"),
        (name = "dashboard", description = "Derived account views")
    )
)]
struct ApiDoc;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

async fn build_state(config: &AppConfig) -> common::error::Result<Arc<AppState>> {
    let state = match &config.database_url {
        Some(_) => {
            let db = LedgerServiceConfig::from_env();
            let ledger_repo: Arc<dyn LedgerRepository> =
                Arc::new(PostgresLedgerRepository::with_config(&db).await?);
            let audit = Arc::new(AuditService::with_repo(Arc::new(
                PostgresAuditRepository::new(Some(db.database_url.clone())).await?,
            )));
            AppState::new(ledger_repo, audit)
        }
        None => {
            info!("DATABASE_URL not set, using in-memory repositories");
            AppState::in_memory()
        }
    };
    Ok(Arc::new(state))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::new();
    if let Some(port) = args.port {
        config.port = port;
    }

    let state = build_state(&config).await?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/api/v1/transactions",
            post(post_transaction).get(list_transactions),
        )
        .route(
            "/api/v1/transactions/:id",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
        .route("/api/v1/audit-logs", get(list_audit_logs))
        .route("/api/v1/audit-logs/:id", get(get_audit_log))
        .route(
            "/api/v1/audit-logs/entity/:entity_type/:entity_id",
            get(list_audit_logs_by_entity),
        )
        .route("/api/v1/audit-logs/user/:user_id", get(list_audit_logs_by_user))
        .route("/api/v1/accounts", post(create_account).get(list_accounts))
        .route("/api/v1/accounts/:id", get(get_account))
        .route("/api/v1/dashboard/accounts", get(get_grouped_accounts))
        .route(
            "/api/v1/dashboard/accounts/:category",
            get(get_grouped_accounts_by_category),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("API gateway listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping gateway");
}
