use super::application::{Application, ApplicationStatus};
use super::event::Event;
use super::wallet::{Amount, Wallet, WalletTransaction};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: Event) -> Result<()>;
    async fn get(&self, event_id: Uuid) -> Result<Option<Event>>;
    /// Conditionally transitions the event to finished, stamping
    /// `finished_at`. Returns false if the event was already finished,
    /// so exactly one of any set of concurrent callers wins.
    async fn finish_if_open(&self, event_id: Uuid, finished_at: DateTime<Utc>) -> Result<bool>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Rejects a second application for the same (event, worker) pair.
    async fn insert(&self, application: Application) -> Result<()>;
    async fn get(&self, application_id: Uuid) -> Result<Option<Application>>;
    async fn update(&self, application: Application) -> Result<()>;
    /// The payout eligibility set: applications for the event that
    /// carry clock-out proof, in store order.
    async fn clocked_out_for_event(&self, event_id: Uuid) -> Result<Vec<Application>>;
    async fn set_status(&self, application_id: Uuid, status: ApplicationStatus) -> Result<()>;
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn get_by_worker(&self, worker_id: Uuid) -> Result<Option<Wallet>>;
    /// Returns the worker's wallet, creating an empty one if absent.
    async fn get_or_create(&self, worker_id: Uuid) -> Result<Wallet>;
    /// Increments the balance inside the store (never read-modify-write
    /// at the caller) and returns the updated wallet.
    async fn credit(&self, wallet_id: Uuid, amount: Amount) -> Result<Wallet>;
    /// Decrements the balance iff it covers `amount`; fails with a
    /// validation error otherwise.
    async fn debit(&self, wallet_id: Uuid, amount: Amount) -> Result<Wallet>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Appends the entry. Event-sourced entries are keyed by
    /// (wallet, event): if one already exists the append is skipped and
    /// false is returned. Withdrawal entries always append.
    async fn append_once(&self, entry: WalletTransaction) -> Result<bool>;
    async fn for_wallet(&self, wallet_id: Uuid) -> Result<Vec<WalletTransaction>>;
    async fn for_event(&self, event_id: Uuid) -> Result<Vec<WalletTransaction>>;
}

pub type EventStoreBox = Box<dyn EventStore>;
pub type ApplicationStoreBox = Box<dyn ApplicationStore>;
pub type WalletStoreBox = Box<dyn WalletStore>;
pub type LedgerStoreBox = Box<dyn LedgerStore>;
