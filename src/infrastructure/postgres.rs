use crate::domain::application::{Application, ApplicationStatus};
use crate::domain::event::{Event, EventStatus};
use crate::domain::ports::{ApplicationStore, EventStore, LedgerStore, WalletStore};
use crate::domain::wallet::{Amount, Balance, TransactionSource, Wallet, WalletTransaction};
use crate::error::{PayoutError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Executor, Row};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id UUID PRIMARY KEY,
    creator_id UUID NOT NULL,
    salary NUMERIC,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    finished_at TIMESTAMPTZ
);
CREATE TABLE IF NOT EXISTS applications (
    id UUID PRIMARY KEY,
    event_id UUID NOT NULL REFERENCES events (id),
    worker_id UUID NOT NULL,
    status TEXT NOT NULL,
    clock_in TIMESTAMPTZ,
    clock_out TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL,
    UNIQUE (event_id, worker_id)
);
CREATE TABLE IF NOT EXISTS wallets (
    id UUID NOT NULL UNIQUE,
    worker_id UUID PRIMARY KEY,
    balance NUMERIC NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
CREATE TABLE IF NOT EXISTS wallet_transactions (
    id UUID PRIMARY KEY,
    wallet_id UUID NOT NULL REFERENCES wallets (id),
    amount NUMERIC NOT NULL,
    source_event_id UUID,
    source_withdrawal_id UUID,
    created_at TIMESTAMPTZ NOT NULL,
    CHECK ((source_event_id IS NULL) <> (source_withdrawal_id IS NULL))
);
CREATE UNIQUE INDEX IF NOT EXISTS wallet_transactions_event_once
    ON wallet_transactions (wallet_id, source_event_id)
    WHERE source_event_id IS NOT NULL;
"#;

/// A persistent store implementation backed by PostgreSQL.
///
/// One struct implements every port, sharing a connection pool.
/// `Clone` shares the pool, so the same store can be boxed once per
/// port. The conditional finish, the balance increment, and the ledger
/// dedup all run server-side, so concurrent workflow invocations against
/// the same rows stay consistent.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(8).connect(url).await?;
        Ok(Self { pool })
    }

    /// Creates the tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        self.pool.execute(SCHEMA).await?;
        Ok(())
    }
}

fn event_from_row(row: &PgRow) -> Result<Event> {
    let status: String = row.try_get("status")?;
    Ok(Event {
        id: row.try_get("id")?,
        creator_id: row.try_get("creator_id")?,
        salary: row.try_get::<Option<Decimal>, _>("salary")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        finished_at: row.try_get("finished_at")?,
    })
}

fn application_from_row(row: &PgRow) -> Result<Application> {
    let status: String = row.try_get("status")?;
    Ok(Application {
        id: row.try_get("id")?,
        event_id: row.try_get("event_id")?,
        worker_id: row.try_get("worker_id")?,
        status: status.parse()?,
        clock_in: row.try_get("clock_in")?,
        clock_out: row.try_get("clock_out")?,
        created_at: row.try_get("created_at")?,
    })
}

fn wallet_from_row(row: &PgRow) -> Result<Wallet> {
    Ok(Wallet {
        id: row.try_get("id")?,
        worker_id: row.try_get("worker_id")?,
        balance: Balance::new(row.try_get("balance")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<WalletTransaction> {
    let source = source_from_columns(
        row.try_get("source_event_id")?,
        row.try_get("source_withdrawal_id")?,
    )?;
    Ok(WalletTransaction {
        id: row.try_get("id")?,
        wallet_id: row.try_get("wallet_id")?,
        amount: Amount::new(row.try_get("amount")?)?,
        source,
        created_at: row.try_get("created_at")?,
    })
}

fn source_columns(source: TransactionSource) -> (Option<Uuid>, Option<Uuid>) {
    match source {
        TransactionSource::Event { event_id } => (Some(event_id), None),
        TransactionSource::Withdrawal { withdrawal_id } => (None, Some(withdrawal_id)),
    }
}

fn source_from_columns(
    event_id: Option<Uuid>,
    withdrawal_id: Option<Uuid>,
) -> Result<TransactionSource> {
    match (event_id, withdrawal_id) {
        (Some(event_id), None) => Ok(TransactionSource::Event { event_id }),
        (None, Some(withdrawal_id)) => Ok(TransactionSource::Withdrawal { withdrawal_id }),
        _ => Err(PayoutError::StoreError(
            "ledger entry must reference exactly one source".to_string(),
        )),
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn insert(&self, event: Event) -> Result<()> {
        sqlx::query(
            "INSERT INTO events (id, creator_id, salary, status, created_at, finished_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(event.id)
        .bind(event.creator_id)
        .bind(event.salary)
        .bind(event.status.as_str())
        .bind(event.created_at)
        .bind(event.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, event_id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn finish_if_open(&self, event_id: Uuid, finished_at: DateTime<Utc>) -> Result<bool> {
        // Single conditional update: of any set of concurrent callers,
        // exactly one sees a row affected.
        let result = sqlx::query(
            "UPDATE events SET status = $2, finished_at = $3
             WHERE id = $1 AND status <> $2",
        )
        .bind(event_id)
        .bind(EventStatus::Finished.as_str())
        .bind(finished_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert(&self, application: Application) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO applications
                 (id, event_id, worker_id, status, clock_in, clock_out, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (event_id, worker_id) DO NOTHING",
        )
        .bind(application.id)
        .bind(application.event_id)
        .bind(application.worker_id)
        .bind(application.status.as_str())
        .bind(application.clock_in)
        .bind(application.clock_out)
        .bind(application.created_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(PayoutError::ValidationError(
                "Worker already applied to this event".to_string(),
            ));
        }
        Ok(())
    }

    async fn get(&self, application_id: Uuid) -> Result<Option<Application>> {
        let row = sqlx::query("SELECT * FROM applications WHERE id = $1")
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(application_from_row).transpose()
    }

    async fn update(&self, application: Application) -> Result<()> {
        sqlx::query(
            "UPDATE applications
             SET status = $2, clock_in = $3, clock_out = $4
             WHERE id = $1",
        )
        .bind(application.id)
        .bind(application.status.as_str())
        .bind(application.clock_in)
        .bind(application.clock_out)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clocked_out_for_event(&self, event_id: Uuid) -> Result<Vec<Application>> {
        let rows = sqlx::query(
            "SELECT * FROM applications
             WHERE event_id = $1 AND clock_out IS NOT NULL
             ORDER BY created_at",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(application_from_row).collect()
    }

    async fn set_status(&self, application_id: Uuid, status: ApplicationStatus) -> Result<()> {
        let result = sqlx::query("UPDATE applications SET status = $2 WHERE id = $1")
            .bind(application_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(PayoutError::ApplicationNotFound(application_id));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletStore for PgStore {
    async fn get_by_worker(&self, worker_id: Uuid) -> Result<Option<Wallet>> {
        let row = sqlx::query("SELECT * FROM wallets WHERE worker_id = $1")
            .bind(worker_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(wallet_from_row).transpose()
    }

    async fn get_or_create(&self, worker_id: Uuid) -> Result<Wallet> {
        let wallet = Wallet::new(worker_id);
        sqlx::query(
            "INSERT INTO wallets (id, worker_id, balance, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (worker_id) DO NOTHING",
        )
        .bind(wallet.id)
        .bind(wallet.worker_id)
        .bind(wallet.balance.value())
        .bind(wallet.created_at)
        .bind(wallet.updated_at)
        .execute(&self.pool)
        .await?;
        self.get_by_worker(worker_id)
            .await?
            .ok_or_else(|| PayoutError::StoreError(format!("wallet for {worker_id} vanished")))
    }

    async fn credit(&self, wallet_id: Uuid, amount: Amount) -> Result<Wallet> {
        // Increment in place; never fetch-compute-store.
        let row = sqlx::query(
            "UPDATE wallets SET balance = balance + $2, updated_at = $3
             WHERE id = $1
             RETURNING *",
        )
        .bind(wallet_id)
        .bind(amount.value())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PayoutError::StoreError(format!("unknown wallet {wallet_id}")))?;
        wallet_from_row(&row)
    }

    async fn debit(&self, wallet_id: Uuid, amount: Amount) -> Result<Wallet> {
        let row = sqlx::query(
            "UPDATE wallets SET balance = balance - $2, updated_at = $3
             WHERE id = $1 AND balance >= $2
             RETURNING *",
        )
        .bind(wallet_id)
        .bind(amount.value())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PayoutError::ValidationError("Insufficient funds".to_string()))?;
        wallet_from_row(&row)
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn append_once(&self, entry: WalletTransaction) -> Result<bool> {
        let (source_event_id, source_withdrawal_id) = source_columns(entry.source);
        // The partial unique index on (wallet_id, source_event_id)
        // swallows a duplicate event credit into zero rows affected.
        let result = sqlx::query(
            "INSERT INTO wallet_transactions
                 (id, wallet_id, amount, source_event_id, source_withdrawal_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT DO NOTHING",
        )
        .bind(entry.id)
        .bind(entry.wallet_id)
        .bind(entry.amount.value())
        .bind(source_event_id)
        .bind(source_withdrawal_id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn for_wallet(&self, wallet_id: Uuid) -> Result<Vec<WalletTransaction>> {
        let rows = sqlx::query(
            "SELECT * FROM wallet_transactions WHERE wallet_id = $1 ORDER BY created_at",
        )
        .bind(wallet_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    async fn for_event(&self, event_id: Uuid) -> Result<Vec<WalletTransaction>> {
        let rows = sqlx::query(
            "SELECT * FROM wallet_transactions WHERE source_event_id = $1 ORDER BY created_at",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(transaction_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_column_round_trip() {
        let event_id = Uuid::new_v4();
        let (ev, wd) = source_columns(TransactionSource::Event { event_id });
        assert_eq!(ev, Some(event_id));
        assert!(wd.is_none());
        assert_eq!(
            source_from_columns(ev, wd).unwrap(),
            TransactionSource::Event { event_id }
        );

        let withdrawal_id = Uuid::new_v4();
        let (ev, wd) = source_columns(TransactionSource::Withdrawal { withdrawal_id });
        assert_eq!(
            source_from_columns(ev, wd).unwrap(),
            TransactionSource::Withdrawal { withdrawal_id }
        );
    }

    #[test]
    fn test_source_columns_must_be_exclusive() {
        assert!(source_from_columns(None, None).is_err());
        assert!(source_from_columns(Some(Uuid::new_v4()), Some(Uuid::new_v4())).is_err());
    }
}
