use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::StatusEngine;
use crate::errors::{CreditError, Result};
use crate::events::Event;
use crate::projection::{CreditHeader, InstallmentView};
use crate::store::CreditStore;
use crate::types::{ActorId, InstallmentId};

/// result of a payment command: the updated installment and its parent
/// credit, ready for the caller to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub installment: InstallmentView,
    pub credit: CreditHeader,
    /// true when the installment was already fully paid and nothing was
    /// applied; the command is an idempotent no-op in that case
    pub already_paid: bool,
    pub events: Vec<Event>,
}

impl<S: CreditStore> StatusEngine<S> {
    /// mark one installment as fully paid and reconcile the parent credit
    ///
    /// sets `amount_paid = amount_due`, the paid timestamp, and the paying
    /// actor, decrements the parent's outstanding balance (floored at zero),
    /// then runs a recomputation pass so the credit's derived status reflects
    /// the payment. the balance decrement completes before recalculation
    /// reads it.
    ///
    /// re-paying an installment that is already fully paid applies nothing
    /// and returns the current state with `already_paid` set, so a blind
    /// retry can never double-decrement the balance.
    pub async fn pay_installment_in_full(
        &self,
        installment_id: InstallmentId,
        actor_id: ActorId,
        time: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        let (credit_id, installment) = self
            .store()
            .find_installment(installment_id)
            .await?
            .ok_or(CreditError::InstallmentNotFound { id: installment_id })?;

        if installment.is_paid() {
            debug!(%installment_id, "installment already paid, no-op");
            let credit = self
                .store()
                .find_credit(credit_id)
                .await?
                .ok_or(CreditError::CreditNotFound { id: credit_id })?;
            return Ok(PaymentReceipt {
                installment: InstallmentView::from(&installment),
                credit: CreditHeader::from(&credit),
                already_paid: true,
                events: Vec::new(),
            });
        }

        let now = time.now();
        let amount = installment.amount_due;

        self.store()
            .apply_installment_payment(installment_id, amount, now, actor_id)
            .await?;
        self.store()
            .decrement_credit_balance(credit_id, amount)
            .await?;

        // balance is updated, safe to reconcile derived state
        let outcome = self.recalculate(credit_id, time).await?;

        let mut events = vec![Event::InstallmentPaid {
            credit_id,
            installment_id,
            amount,
            paid_by: actor_id,
            timestamp: now,
        }];
        events.extend(outcome.events);

        let credit = self
            .store()
            .find_credit(credit_id)
            .await?
            .ok_or(CreditError::CreditNotFound { id: credit_id })?;
        let installment = credit
            .installment(installment_id)
            .ok_or(CreditError::OrphanInstallment {
                id: installment_id,
                credit_id,
            })?;

        info!(
            %credit_id,
            %installment_id,
            amount = %amount,
            status = ?credit.status,
            "installment paid in full"
        );

        Ok(PaymentReceipt {
            installment: InstallmentView::from(installment),
            credit: CreditHeader::from(&credit),
            already_paid: false,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::state::{Credit, Installment};
    use crate::store::MemoryStore;
    use crate::types::{CreditStatus, InstallmentStatus};
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use uuid::Uuid;

    fn fixed_time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap(),
        ))
    }

    fn overdue_credit() -> Credit {
        let today = Utc
            .with_ymd_and_hms(2025, 6, 15, 0, 0, 0)
            .unwrap()
            .date_naive();
        Credit::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::from_major(300),
            Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            vec![Installment::new(1, today - Duration::days(5), Money::from_major(300))],
        )
    }

    #[tokio::test]
    async fn test_pay_unknown_installment() {
        let engine = StatusEngine::new(MemoryStore::new());
        let missing = Uuid::new_v4();

        let err = engine
            .pay_installment_in_full(missing, Uuid::new_v4(), &fixed_time())
            .await
            .unwrap_err();
        assert!(matches!(err, CreditError::InstallmentNotFound { id } if id == missing));
    }

    #[tokio::test]
    async fn test_paying_last_installment_closes_credit() {
        let store = MemoryStore::new();
        let credit = overdue_credit();
        let installment_id = credit.installments[0].installment_id;
        let credit_id = store.insert_credit(credit);
        let engine = StatusEngine::new(store);
        let time = fixed_time();
        let actor = Uuid::new_v4();

        let receipt = engine
            .pay_installment_in_full(installment_id, actor, &time)
            .await
            .unwrap();

        assert!(!receipt.already_paid);
        assert_eq!(receipt.installment.status, InstallmentStatus::Paid);
        assert_eq!(receipt.installment.amount_paid, Money::from_major(300));
        assert!(receipt.installment.paid_at.is_some());
        assert_eq!(receipt.credit.outstanding_balance, Money::ZERO);
        assert_eq!(receipt.credit.status, CreditStatus::Closed);
        assert_eq!(receipt.credit.end_date, Some(time.now().date_naive()));

        let stored = engine.store().find_credit(credit_id).await.unwrap().unwrap();
        assert_eq!(stored.installments[0].paid_by, Some(actor));
    }

    #[tokio::test]
    async fn test_repeat_payment_is_a_noop() {
        let store = MemoryStore::new();
        let credit = overdue_credit();
        let installment_id = credit.installments[0].installment_id;
        let credit_id = store.insert_credit(credit);
        let engine = StatusEngine::new(store);
        let time = fixed_time();

        engine
            .pay_installment_in_full(installment_id, Uuid::new_v4(), &time)
            .await
            .unwrap();
        let writes_after_first = engine.store().write_count();

        let receipt = engine
            .pay_installment_in_full(installment_id, Uuid::new_v4(), &time)
            .await
            .unwrap();

        assert!(receipt.already_paid);
        assert!(receipt.events.is_empty());
        // no double decrement, no extra writes
        assert_eq!(receipt.credit.outstanding_balance, Money::ZERO);
        assert_eq!(engine.store().write_count(), writes_after_first);

        let stored = engine.store().find_credit(credit_id).await.unwrap().unwrap();
        assert_eq!(stored.outstanding_balance, Money::ZERO);
    }

    #[tokio::test]
    async fn test_paying_overdue_leaves_future_installment_pending() {
        // two installments of 100: one overdue, one future; paying the
        // overdue one takes the credit from Delinquent back to Active
        let today = Utc
            .with_ymd_and_hms(2025, 6, 15, 0, 0, 0)
            .unwrap()
            .date_naive();
        let credit = Credit::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::from_major(200),
            Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            vec![
                Installment::new(1, today - Duration::days(5), Money::from_major(100)),
                Installment::new(2, today + Duration::days(25), Money::from_major(100)),
            ],
        );
        let overdue_id = credit.installments[0].installment_id;
        let store = MemoryStore::new();
        let credit_id = store.insert_credit(credit);
        let engine = StatusEngine::new(store);
        let time = fixed_time();

        let outcome = engine.recalculate(credit_id, &time).await.unwrap();
        assert_eq!(outcome.status, CreditStatus::Delinquent);

        let receipt = engine
            .pay_installment_in_full(overdue_id, Uuid::new_v4(), &time)
            .await
            .unwrap();

        assert_eq!(receipt.credit.outstanding_balance, Money::from_major(100));
        assert_eq!(receipt.credit.status, CreditStatus::Active);

        let stored = engine.store().find_credit(credit_id).await.unwrap().unwrap();
        assert_eq!(stored.installments[1].status, InstallmentStatus::Pending);
    }
}
