use crate::error::PayoutError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};
use uuid::Uuid;

/// A worker's running wallet balance.
///
/// Wrapper around `rust_decimal::Decimal` so balance arithmetic stays
/// type-safe and cannot be confused with raw payout amounts.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

/// A non-negative monetary amount moved by a single ledger operation.
///
/// Zero is allowed: an event with a missing salary still settles its
/// eligible workers with zero-amount entries.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, PayoutError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PayoutError::ValidationError(
                "Amount must not be negative".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PayoutError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A worker's wallet. One per worker, created lazily at first credit.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Wallet {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub balance: Balance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(worker_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            worker_id,
            balance: Balance::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds funds to the balance.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount.into();
        self.updated_at = Utc::now();
    }

    /// Removes funds if the balance covers the amount.
    pub fn debit(&mut self, amount: Amount) -> Result<(), PayoutError> {
        if self.balance >= amount.into() {
            self.balance -= amount.into();
            self.updated_at = Utc::now();
            Ok(())
        } else {
            Err(PayoutError::ValidationError(
                "Insufficient funds".to_string(),
            ))
        }
    }
}

/// The origin of a ledger entry. Exactly one of the two; the enum makes
/// a both-or-neither entry unrepresentable.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase", tag = "source")]
pub enum TransactionSource {
    Event { event_id: Uuid },
    Withdrawal { withdrawal_id: Uuid },
}

/// An immutable, append-only wallet ledger entry.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub amount: Amount,
    pub source: TransactionSource,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// An entry crediting a wallet with an event payout.
    pub fn event_payout(wallet_id: Uuid, amount: Amount, event_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            amount,
            source: TransactionSource::Event { event_id },
            created_at: Utc::now(),
        }
    }

    /// An entry recording a withdrawal from a wallet.
    pub fn withdrawal(wallet_id: Uuid, amount: Amount) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            amount,
            source: TransactionSource::Withdrawal {
                withdrawal_id: Uuid::new_v4(),
            },
            created_at: Utc::now(),
        }
    }

    /// The event this entry pays out, if it is an event credit.
    pub fn event_id(&self) -> Option<Uuid> {
        match self.source {
            TransactionSource::Event { event_id } => Some(event_id),
            TransactionSource::Withdrawal { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balance_arithmetic() {
        let b1 = Balance::new(dec!(10.0));
        let b2 = Balance::new(dec!(5.0));
        assert_eq!(b1 + b2, Balance::new(dec!(15.0)));
        assert_eq!(b1 - b2, Balance::new(dec!(5.0)));
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(Amount::new(dec!(0.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(PayoutError::ValidationError(_))
        ));
    }

    #[test]
    fn test_wallet_credit() {
        let mut wallet = Wallet::new(Uuid::new_v4());
        wallet.credit(Amount::new(dec!(500000)).unwrap());
        assert_eq!(wallet.balance, Balance::new(dec!(500000)));
    }

    #[test]
    fn test_wallet_debit_success() {
        let mut wallet = Wallet::new(Uuid::new_v4());
        wallet.credit(Amount::new(dec!(10.0)).unwrap());

        let result = wallet.debit(Amount::new(dec!(4.0)).unwrap());
        assert!(result.is_ok());
        assert_eq!(wallet.balance, Balance::new(dec!(6.0)));
    }

    #[test]
    fn test_wallet_debit_insufficient() {
        let mut wallet = Wallet::new(Uuid::new_v4());
        wallet.credit(Amount::new(dec!(10.0)).unwrap());

        let result = wallet.debit(Amount::new(dec!(11.0)).unwrap());
        assert!(matches!(result, Err(PayoutError::ValidationError(_))));
        assert_eq!(wallet.balance, Balance::new(dec!(10.0)));
    }

    #[test]
    fn test_transaction_source_is_exclusive() {
        let wallet_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let credit =
            WalletTransaction::event_payout(wallet_id, Amount::new(dec!(1.0)).unwrap(), event_id);
        assert_eq!(credit.event_id(), Some(event_id));

        let debit = WalletTransaction::withdrawal(wallet_id, Amount::new(dec!(1.0)).unwrap());
        assert_eq!(debit.event_id(), None);
    }
}
