use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Accepted,
    Rejected,
    Finished,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Finished => "finished",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = crate::error::PayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(ApplicationStatus::Applied),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "finished" => Ok(ApplicationStatus::Finished),
            other => Err(crate::error::PayoutError::ValidationError(format!(
                "unknown application status: {other}"
            ))),
        }
    }
}

/// A worker's application to work an event. At most one per
/// (event, worker) pair; the stores enforce the uniqueness.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Application {
    pub id: Uuid,
    pub event_id: Uuid,
    pub worker_id: Uuid,
    pub status: ApplicationStatus,
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn new(event_id: Uuid, worker_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            worker_id,
            status: ApplicationStatus::Applied,
            clock_in: None,
            clock_out: None,
            created_at: Utc::now(),
        }
    }

    /// Only applications with recorded clock-out proof qualify for payout.
    pub fn is_payable(&self) -> bool {
        self.clock_out.is_some()
    }

    pub fn record_clock_in(&mut self, at: DateTime<Utc>) {
        self.clock_in = Some(at);
    }

    pub fn record_clock_out(&mut self, at: DateTime<Utc>) {
        self.clock_out = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_application_not_payable() {
        let application = Application::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(application.status, ApplicationStatus::Applied);
        assert!(!application.is_payable());
    }

    #[test]
    fn test_clock_out_makes_payable() {
        let mut application = Application::new(Uuid::new_v4(), Uuid::new_v4());
        application.record_clock_in(Utc::now());
        assert!(!application.is_payable());

        application.record_clock_out(Utc::now());
        assert!(application.is_payable());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ApplicationStatus::Applied,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Finished,
        ] {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
    }
}
