use crate::domain::application::{Application, ApplicationStatus};
use crate::domain::event::Event;
use crate::domain::ports::{
    ApplicationStoreBox, EventStoreBox, LedgerStoreBox, WalletStoreBox,
};
use crate::domain::wallet::{Amount, Wallet, WalletTransaction};
use crate::error::{PayoutError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// One (application, worker) pair credited by a finish call.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PayoutReceipt {
    pub application_id: Uuid,
    pub worker_id: Uuid,
}

/// The outcome of a finish call: which pairs this call paid.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct PayoutSummary {
    pub event_id: Uuid,
    pub processed: Vec<PayoutReceipt>,
}

/// The main entry point for the payout application.
///
/// `PayoutEngine` owns the storage backends and settles event payroll.
/// Credits within one finish call are applied strictly sequentially by
/// awaiting each storage operation before the next.
pub struct PayoutEngine {
    events: EventStoreBox,
    applications: ApplicationStoreBox,
    wallets: WalletStoreBox,
    ledger: LedgerStoreBox,
}

impl PayoutEngine {
    pub fn new(
        events: EventStoreBox,
        applications: ApplicationStoreBox,
        wallets: WalletStoreBox,
        ledger: LedgerStoreBox,
    ) -> Self {
        Self {
            events,
            applications,
            wallets,
            ledger,
        }
    }

    /// Settles payroll for an event exactly once.
    ///
    /// Workers with clock-out proof are credited the event's salary, one
    /// at a time; their applications transition to finished; finally the
    /// event itself is conditionally transitioned to finished. Only the
    /// caller whose conditional transition lands reports success, so two
    /// racing finish calls cannot both claim the event. A failure before
    /// the terminal transition leaves the event open; re-invoking skips
    /// workers whose (event, wallet) ledger entry already exists.
    pub async fn finish_event(&self, event_id: Uuid) -> Result<PayoutSummary> {
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or(PayoutError::EventNotFound(event_id))?;
        if event.is_finished() {
            return Err(PayoutError::AlreadyFinished(event_id));
        }

        let eligible = self.applications.clocked_out_for_event(event_id).await?;
        let amount = event.payout_amount();

        let mut processed = Vec::with_capacity(eligible.len());
        for application in eligible {
            let credited = self
                .credit_for_event(application.worker_id, amount, event_id)
                .await?;
            if credited {
                tracing::info!(
                    event = %event_id,
                    worker = %application.worker_id,
                    amount = %amount.value(),
                    "worker credited"
                );
                processed.push(PayoutReceipt {
                    application_id: application.id,
                    worker_id: application.worker_id,
                });
            } else {
                tracing::debug!(
                    event = %event_id,
                    worker = %application.worker_id,
                    "credit already applied, skipping"
                );
            }
            self.applications
                .set_status(application.id, ApplicationStatus::Finished)
                .await?;
        }

        if !self.events.finish_if_open(event_id, Utc::now()).await? {
            // A concurrent caller claimed the event; its credits and
            // ours were deduplicated at the ledger.
            return Err(PayoutError::AlreadyFinished(event_id));
        }
        tracing::info!(event = %event_id, workers = processed.len(), "event finished");

        Ok(PayoutSummary {
            event_id,
            processed,
        })
    }

    /// Credits a worker's wallet for an event. Returns false when the
    /// (event, wallet) ledger entry already exists, i.e. a prior attempt
    /// applied this credit.
    async fn credit_for_event(
        &self,
        worker_id: Uuid,
        amount: Amount,
        event_id: Uuid,
    ) -> Result<bool> {
        let wallet = self.wallets.get_or_create(worker_id).await?;
        let entry = WalletTransaction::event_payout(wallet.id, amount, event_id);
        if !self.ledger.append_once(entry).await? {
            return Ok(false);
        }
        self.wallets.credit(wallet.id, amount).await?;
        Ok(true)
    }

    /// Withdraws funds from a worker's wallet and records the debit.
    pub async fn withdraw(&self, worker_id: Uuid, amount: Decimal) -> Result<Wallet> {
        let amount = Amount::new(amount)?;
        if amount.is_zero() {
            return Err(PayoutError::ValidationError(
                "Withdrawal amount must be positive".to_string(),
            ));
        }
        let wallet = self
            .wallets
            .get_by_worker(worker_id)
            .await?
            .ok_or(PayoutError::WalletNotFound(worker_id))?;
        let wallet = self.wallets.debit(wallet.id, amount).await?;
        self.ledger
            .append_once(WalletTransaction::withdrawal(wallet.id, amount))
            .await?;
        tracing::info!(worker = %worker_id, amount = %amount.value(), "withdrawal recorded");
        Ok(wallet)
    }

    /// A worker's wallet together with its ledger entries.
    pub async fn wallet_statement(
        &self,
        worker_id: Uuid,
    ) -> Result<(Wallet, Vec<WalletTransaction>)> {
        let wallet = self
            .wallets
            .get_by_worker(worker_id)
            .await?
            .ok_or(PayoutError::WalletNotFound(worker_id))?;
        let transactions = self.ledger.for_wallet(wallet.id).await?;
        Ok((wallet, transactions))
    }

    pub async fn create_event(
        &self,
        creator_id: Uuid,
        salary: Option<Decimal>,
    ) -> Result<Event> {
        let event = Event::new(creator_id, salary);
        self.events.insert(event.clone()).await?;
        Ok(event)
    }

    pub async fn get_event(&self, event_id: Uuid) -> Result<Event> {
        self.events
            .get(event_id)
            .await?
            .ok_or(PayoutError::EventNotFound(event_id))
    }

    /// Registers a worker's application to an open event.
    pub async fn apply(&self, event_id: Uuid, worker_id: Uuid) -> Result<Application> {
        let event = self.get_event(event_id).await?;
        if event.is_finished() {
            return Err(PayoutError::AlreadyFinished(event_id));
        }
        let application = Application::new(event_id, worker_id);
        self.applications.insert(application.clone()).await?;
        Ok(application)
    }

    pub async fn clock_in(&self, application_id: Uuid) -> Result<Application> {
        let mut application = self
            .applications
            .get(application_id)
            .await?
            .ok_or(PayoutError::ApplicationNotFound(application_id))?;
        application.record_clock_in(Utc::now());
        self.applications.update(application.clone()).await?;
        Ok(application)
    }

    pub async fn clock_out(&self, application_id: Uuid) -> Result<Application> {
        let mut application = self
            .applications
            .get(application_id)
            .await?
            .ok_or(PayoutError::ApplicationNotFound(application_id))?;
        application.record_clock_out(Utc::now());
        self.applications.update(application.clone()).await?;
        Ok(application)
    }
}
