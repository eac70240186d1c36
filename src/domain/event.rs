use crate::domain::wallet::Amount;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Posted,
    Finished,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Posted => "posted",
            EventStatus::Finished => "finished",
        }
    }
}

impl FromStr for EventStatus {
    type Err = crate::error::PayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EventStatus::Pending),
            "posted" => Ok(EventStatus::Posted),
            "finished" => Ok(EventStatus::Finished),
            other => Err(crate::error::PayoutError::ValidationError(format!(
                "unknown event status: {other}"
            ))),
        }
    }
}

/// A shift posted by a hotel. `salary` is the fixed per-worker payout.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Event {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub salary: Option<Decimal>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(creator_id: Uuid, salary: Option<Decimal>) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator_id,
            salary,
            status: EventStatus::Pending,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Finished is terminal: no further payouts may be issued.
    pub fn is_finished(&self) -> bool {
        self.status == EventStatus::Finished
    }

    /// The per-worker payout. A missing or negative salary pays zero
    /// rather than failing the event.
    pub fn payout_amount(&self) -> Amount {
        self.salary
            .and_then(|salary| Amount::new(salary).ok())
            .unwrap_or(Amount::ZERO)
    }
}
