use crate::domain::application::{Application, ApplicationStatus};
use crate::domain::event::{Event, EventStatus};
use crate::domain::ports::{ApplicationStore, EventStore, LedgerStore, WalletStore};
use crate::domain::wallet::{Amount, Wallet, WalletTransaction};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory event store.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access. `Clone`
/// shares the underlying map, so tests can keep a handle while the
/// engine owns a boxed copy.
#[derive(Default, Clone)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<HashMap<Uuid, Event>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: Event) -> Result<()> {
        let mut events = self.events.write().await;
        events.insert(event.id, event);
        Ok(())
    }

    async fn get(&self, event_id: Uuid) -> Result<Option<Event>> {
        let events = self.events.read().await;
        Ok(events.get(&event_id).cloned())
    }

    async fn finish_if_open(&self, event_id: Uuid, finished_at: DateTime<Utc>) -> Result<bool> {
        // Check and transition under one write lock so only a single
        // caller can observe the open state.
        let mut events = self.events.write().await;
        match events.get_mut(&event_id) {
            Some(event) if !event.is_finished() => {
                event.status = EventStatus::Finished;
                event.finished_at = Some(finished_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// A thread-safe in-memory application store.
#[derive(Default, Clone)]
pub struct InMemoryApplicationStore {
    applications: Arc<RwLock<HashMap<Uuid, Application>>>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn insert(&self, application: Application) -> Result<()> {
        let mut applications = self.applications.write().await;
        let duplicate = applications
            .values()
            .any(|a| a.event_id == application.event_id && a.worker_id == application.worker_id);
        if duplicate {
            return Err(PayoutError::ValidationError(
                "Worker already applied to this event".to_string(),
            ));
        }
        applications.insert(application.id, application);
        Ok(())
    }

    async fn get(&self, application_id: Uuid) -> Result<Option<Application>> {
        let applications = self.applications.read().await;
        Ok(applications.get(&application_id).cloned())
    }

    async fn update(&self, application: Application) -> Result<()> {
        let mut applications = self.applications.write().await;
        applications.insert(application.id, application);
        Ok(())
    }

    async fn clocked_out_for_event(&self, event_id: Uuid) -> Result<Vec<Application>> {
        let applications = self.applications.read().await;
        let mut eligible: Vec<Application> = applications
            .values()
            .filter(|a| a.event_id == event_id && a.is_payable())
            .cloned()
            .collect();
        // HashMap iteration order is arbitrary; return a stable order.
        eligible.sort_by_key(|a| a.created_at);
        Ok(eligible)
    }

    async fn set_status(&self, application_id: Uuid, status: ApplicationStatus) -> Result<()> {
        let mut applications = self.applications.write().await;
        let application = applications
            .get_mut(&application_id)
            .ok_or(PayoutError::ApplicationNotFound(application_id))?;
        application.status = status;
        Ok(())
    }
}

/// A thread-safe in-memory wallet store keyed by worker.
#[derive(Default, Clone)]
pub struct InMemoryWalletStore {
    wallets: Arc<RwLock<HashMap<Uuid, Wallet>>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn get_by_worker(&self, worker_id: Uuid) -> Result<Option<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.get(&worker_id).cloned())
    }

    async fn get_or_create(&self, worker_id: Uuid) -> Result<Wallet> {
        let mut wallets = self.wallets.write().await;
        let wallet = wallets
            .entry(worker_id)
            .or_insert_with(|| Wallet::new(worker_id));
        Ok(wallet.clone())
    }

    async fn credit(&self, wallet_id: Uuid, amount: Amount) -> Result<Wallet> {
        // The increment happens under the write lock, never
        // read-modify-write at the caller.
        let mut wallets = self.wallets.write().await;
        let wallet = wallets
            .values_mut()
            .find(|w| w.id == wallet_id)
            .ok_or_else(|| PayoutError::StoreError(format!("unknown wallet {wallet_id}")))?;
        wallet.credit(amount);
        Ok(wallet.clone())
    }

    async fn debit(&self, wallet_id: Uuid, amount: Amount) -> Result<Wallet> {
        let mut wallets = self.wallets.write().await;
        let wallet = wallets
            .values_mut()
            .find(|w| w.id == wallet_id)
            .ok_or_else(|| PayoutError::StoreError(format!("unknown wallet {wallet_id}")))?;
        wallet.debit(amount)?;
        Ok(wallet.clone())
    }
}

/// A thread-safe in-memory append-only ledger.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    entries: Arc<RwLock<Vec<WalletTransaction>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append_once(&self, entry: WalletTransaction) -> Result<bool> {
        // Dedup check and append share the write lock, so concurrent
        // appends for the same (wallet, event) admit exactly one entry.
        let mut entries = self.entries.write().await;
        if let Some(event_id) = entry.event_id() {
            let exists = entries
                .iter()
                .any(|e| e.wallet_id == entry.wallet_id && e.event_id() == Some(event_id));
            if exists {
                return Ok(false);
            }
        }
        entries.push(entry);
        Ok(true)
    }

    async fn for_wallet(&self, wallet_id: Uuid) -> Result<Vec<WalletTransaction>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.wallet_id == wallet_id)
            .cloned()
            .collect())
    }

    async fn for_event(&self, event_id: Uuid) -> Result<Vec<WalletTransaction>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.event_id() == Some(event_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wallet::Balance;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_event_store_finish_if_open() {
        let store = InMemoryEventStore::new();
        let event = Event::new(Uuid::new_v4(), Some(dec!(10)));
        let event_id = event.id;
        store.insert(event).await.unwrap();

        assert!(store.finish_if_open(event_id, Utc::now()).await.unwrap());
        // Second transition loses.
        assert!(!store.finish_if_open(event_id, Utc::now()).await.unwrap());
        assert!(!store.finish_if_open(Uuid::new_v4(), Utc::now()).await.unwrap());

        let event = store.get(event_id).await.unwrap().unwrap();
        assert!(event.is_finished());
        assert!(event.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_application_store_uniqueness() {
        let store = InMemoryApplicationStore::new();
        let event_id = Uuid::new_v4();
        let worker_id = Uuid::new_v4();

        store
            .insert(Application::new(event_id, worker_id))
            .await
            .unwrap();
        let result = store.insert(Application::new(event_id, worker_id)).await;
        assert!(matches!(result, Err(PayoutError::ValidationError(_))));

        // Same worker on a different event is fine.
        store
            .insert(Application::new(Uuid::new_v4(), worker_id))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_application_store_eligibility_filter() {
        let store = InMemoryApplicationStore::new();
        let event_id = Uuid::new_v4();

        let mut clocked = Application::new(event_id, Uuid::new_v4());
        clocked.record_clock_out(Utc::now());
        store.insert(clocked.clone()).await.unwrap();
        store
            .insert(Application::new(event_id, Uuid::new_v4()))
            .await
            .unwrap();

        let eligible = store.clocked_out_for_event(event_id).await.unwrap();
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, clocked.id);
    }

    #[tokio::test]
    async fn test_wallet_store_lazy_creation_and_credit() {
        let store = InMemoryWalletStore::new();
        let worker_id = Uuid::new_v4();

        assert!(store.get_by_worker(worker_id).await.unwrap().is_none());

        let wallet = store.get_or_create(worker_id).await.unwrap();
        assert_eq!(wallet.balance, Balance::ZERO);
        // Idempotent: same wallet back.
        let again = store.get_or_create(worker_id).await.unwrap();
        assert_eq!(again.id, wallet.id);

        let updated = store
            .credit(wallet.id, Amount::new(dec!(25)).unwrap())
            .await
            .unwrap();
        assert_eq!(updated.balance, Balance::new(dec!(25)));
    }

    #[tokio::test]
    async fn test_wallet_store_debit_guard() {
        let store = InMemoryWalletStore::new();
        let wallet = store.get_or_create(Uuid::new_v4()).await.unwrap();
        store
            .credit(wallet.id, Amount::new(dec!(10)).unwrap())
            .await
            .unwrap();

        let result = store.debit(wallet.id, Amount::new(dec!(20)).unwrap()).await;
        assert!(matches!(result, Err(PayoutError::ValidationError(_))));

        let updated = store
            .debit(wallet.id, Amount::new(dec!(10)).unwrap())
            .await
            .unwrap();
        assert_eq!(updated.balance, Balance::ZERO);
    }

    #[tokio::test]
    async fn test_ledger_append_once_dedupes_event_credits() {
        let store = InMemoryLedgerStore::new();
        let wallet_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let amount = Amount::new(dec!(5)).unwrap();

        assert!(
            store
                .append_once(WalletTransaction::event_payout(wallet_id, amount, event_id))
                .await
                .unwrap()
        );
        assert!(
            !store
                .append_once(WalletTransaction::event_payout(wallet_id, amount, event_id))
                .await
                .unwrap()
        );
        // Withdrawals are never deduped.
        assert!(
            store
                .append_once(WalletTransaction::withdrawal(wallet_id, amount))
                .await
                .unwrap()
        );
        assert!(
            store
                .append_once(WalletTransaction::withdrawal(wallet_id, amount))
                .await
                .unwrap()
        );

        assert_eq!(store.for_event(event_id).await.unwrap().len(), 1);
        assert_eq!(store.for_wallet(wallet_id).await.unwrap().len(), 3);
    }
}
