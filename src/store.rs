use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::decimal::Money;
use crate::errors::{CreditError, Result};
use crate::state::{Credit, Installment};
use crate::types::{ActorId, CreditId, CreditStatus, InstallmentId, InstallmentStatus};

/// persistence boundary for credits and installments
///
/// every call is a suspension point; the engine issues independent updates
/// concurrently and awaits them all before returning. implementations map
/// their native failures to [`CreditError::Store`].
#[async_trait]
pub trait CreditStore: Send + Sync {
    /// load a credit together with its installments
    async fn find_credit(&self, id: CreditId) -> Result<Option<Credit>>;

    /// resolve an installment and its parent credit id
    async fn find_installment(&self, id: InstallmentId)
        -> Result<Option<(CreditId, Installment)>>;

    /// all credit ids, for the list projection
    async fn list_credit_ids(&self) -> Result<Vec<CreditId>>;

    /// write back a corrected installment status
    async fn update_installment_status(
        &self,
        id: InstallmentId,
        status: InstallmentStatus,
    ) -> Result<()>;

    /// write back the credit status and closure date
    async fn update_credit_status_and_closure(
        &self,
        id: CreditId,
        status: CreditStatus,
        end_date: Option<NaiveDate>,
    ) -> Result<()>;

    /// record a full payment on an installment
    async fn apply_installment_payment(
        &self,
        id: InstallmentId,
        paid_amount: Money,
        paid_at: DateTime<Utc>,
        actor: ActorId,
    ) -> Result<()>;

    /// decrement the credit's outstanding balance, floored at zero
    async fn decrement_credit_balance(&self, id: CreditId, amount: Money) -> Result<Money>;
}

/// in-memory credit store
///
/// intended for tests/dev. counts writes so idempotence is observable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    credits: RwLock<HashMap<CreditId, Credit>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// seed a credit, returning its id
    pub fn insert_credit(&self, credit: Credit) -> CreditId {
        let id = credit.credit_id;
        self.lock_write().insert(id, credit);
        id
    }

    /// number of mutating store calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<CreditId, Credit>> {
        self.credits.read().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<CreditId, Credit>> {
        self.credits.write().unwrap_or_else(|e| e.into_inner())
    }

    fn with_installment<T>(
        &self,
        id: InstallmentId,
        f: impl FnOnce(&mut Installment) -> T,
    ) -> Result<T> {
        let mut credits = self.lock_write();
        let ins = credits
            .values_mut()
            .flat_map(|c| c.installments.iter_mut())
            .find(|i| i.installment_id == id)
            .ok_or(CreditError::InstallmentNotFound { id })?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(f(ins))
    }
}

#[async_trait]
impl CreditStore for MemoryStore {
    async fn find_credit(&self, id: CreditId) -> Result<Option<Credit>> {
        Ok(self.lock_read().get(&id).cloned())
    }

    async fn find_installment(
        &self,
        id: InstallmentId,
    ) -> Result<Option<(CreditId, Installment)>> {
        let credits = self.lock_read();
        Ok(credits.values().find_map(|c| {
            c.installment(id).map(|i| (c.credit_id, i.clone()))
        }))
    }

    async fn list_credit_ids(&self) -> Result<Vec<CreditId>> {
        Ok(self.lock_read().keys().copied().collect())
    }

    async fn update_installment_status(
        &self,
        id: InstallmentId,
        status: InstallmentStatus,
    ) -> Result<()> {
        self.with_installment(id, |ins| ins.status = status)
    }

    async fn update_credit_status_and_closure(
        &self,
        id: CreditId,
        status: CreditStatus,
        end_date: Option<NaiveDate>,
    ) -> Result<()> {
        let mut credits = self.lock_write();
        let credit = credits
            .get_mut(&id)
            .ok_or(CreditError::CreditNotFound { id })?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        credit.status = status;
        credit.end_date = end_date;
        Ok(())
    }

    async fn apply_installment_payment(
        &self,
        id: InstallmentId,
        paid_amount: Money,
        paid_at: DateTime<Utc>,
        actor: ActorId,
    ) -> Result<()> {
        self.with_installment(id, |ins| {
            ins.amount_paid = paid_amount;
            ins.status = InstallmentStatus::Paid;
            ins.paid_at = Some(paid_at);
            ins.paid_by = Some(actor);
        })
    }

    async fn decrement_credit_balance(&self, id: CreditId, amount: Money) -> Result<Money> {
        let mut credits = self.lock_write();
        let credit = credits
            .get_mut(&id)
            .ok_or(CreditError::CreditNotFound { id })?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        credit.outstanding_balance = (credit.outstanding_balance - amount).max(Money::ZERO);
        Ok(credit.outstanding_balance)
    }
}
