use axum_test::TestServer;
use rust_decimal::Decimal;
use shiftpay::application::payout::PayoutEngine;
use shiftpay::infrastructure::in_memory::{
    InMemoryApplicationStore, InMemoryEventStore, InMemoryLedgerStore, InMemoryWalletStore,
};
use shiftpay::interfaces::http::router::{AppState, create_router};
use std::sync::Arc;
use uuid::Uuid;

/// An in-process app over in-memory stores. The store handles share
/// state with the engine, so tests can seed and inspect directly.
pub struct TestApp {
    pub server: TestServer,
    pub engine: Arc<PayoutEngine>,
    pub events: InMemoryEventStore,
    pub applications: InMemoryApplicationStore,
    pub wallets: InMemoryWalletStore,
    pub ledger: InMemoryLedgerStore,
}

pub fn spawn_app() -> TestApp {
    let events = InMemoryEventStore::new();
    let applications = InMemoryApplicationStore::new();
    let wallets = InMemoryWalletStore::new();
    let ledger = InMemoryLedgerStore::new();

    let engine = Arc::new(PayoutEngine::new(
        Box::new(events.clone()),
        Box::new(applications.clone()),
        Box::new(wallets.clone()),
        Box::new(ledger.clone()),
    ));

    let server = TestServer::new(create_router(AppState {
        engine: engine.clone(),
    }))
    .expect("failed to build test server");

    TestApp {
        server,
        engine,
        events,
        applications,
        wallets,
        ledger,
    }
}

impl TestApp {
    /// Seeds an event with one clocked-out application and returns
    /// (event id, application id, worker id).
    pub async fn seed_worked_event(&self, salary: Decimal) -> (Uuid, Uuid, Uuid) {
        let event = self
            .engine
            .create_event(Uuid::new_v4(), Some(salary))
            .await
            .unwrap();
        let worker_id = Uuid::new_v4();
        let application = self.engine.apply(event.id, worker_id).await.unwrap();
        self.engine.clock_in(application.id).await.unwrap();
        self.engine.clock_out(application.id).await.unwrap();
        (event.id, application.id, worker_id)
    }
}
