use clap::Parser;
use miette::{IntoDiagnostic, Result};
use shiftpay::application::payout::PayoutEngine;
use shiftpay::domain::ports::{
    ApplicationStoreBox, EventStoreBox, LedgerStoreBox, WalletStoreBox,
};
use shiftpay::infrastructure::in_memory::{
    InMemoryApplicationStore, InMemoryEventStore, InMemoryLedgerStore, InMemoryWalletStore,
};
use shiftpay::interfaces::http::router::{AppState, create_router};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// PostgreSQL connection URL (optional). If provided, uses the
    /// persistent store; otherwise state is kept in memory.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let engine = match cli.database_url {
        #[cfg(feature = "storage-postgres")]
        Some(url) => {
            use shiftpay::infrastructure::postgres::PgStore;

            let store = PgStore::connect(&url).await.into_diagnostic()?;
            store.migrate().await.into_diagnostic()?;

            // One store implements every port; boxed per trait.
            let events: EventStoreBox = Box::new(store.clone());
            let applications: ApplicationStoreBox = Box::new(store.clone());
            let wallets: WalletStoreBox = Box::new(store.clone());
            let ledger: LedgerStoreBox = Box::new(store);

            PayoutEngine::new(events, applications, wallets, ledger)
        }
        #[cfg(not(feature = "storage-postgres"))]
        Some(_) => {
            return Err(miette::miette!(
                "built without the storage-postgres feature; --database-url is unavailable"
            ));
        }
        None => {
            let events: EventStoreBox = Box::new(InMemoryEventStore::new());
            let applications: ApplicationStoreBox = Box::new(InMemoryApplicationStore::new());
            let wallets: WalletStoreBox = Box::new(InMemoryWalletStore::new());
            let ledger: LedgerStoreBox = Box::new(InMemoryLedgerStore::new());

            PayoutEngine::new(events, applications, wallets, ledger)
        }
    };

    let app = create_router(AppState {
        engine: Arc::new(engine),
    });

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .into_diagnostic()?;
    tracing::info!(addr = %cli.listen, "listening");
    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}
