use futures::future::{try_join_all, BoxFuture};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CreditError, Result};
use crate::events::{Event, EventLog};
use crate::status::plan_recalculation;
use crate::store::CreditStore;
use crate::types::{CreditId, CreditStatus};

/// result of one recomputation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecalcOutcome {
    pub credit_id: CreditId,
    /// final credit status after the pass
    pub status: CreditStatus,
    /// number of store writes the pass issued; zero when storage already
    /// matched the derived state
    pub writes: usize,
    pub events: Vec<Event>,
}

/// derives and persists credit/installment status
///
/// stored statuses are treated as caches: every pass recomputes them from the
/// payment facts and the current date, then writes back only the rows whose
/// stored value differs. updates within a pass are independent and issued
/// concurrently; there is no transaction around them, so a failed pass can
/// leave some rows corrected and others not. a later pass converges on the
/// same derived state.
pub struct StatusEngine<S> {
    store: S,
}

impl<S: CreditStore> StatusEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// recompute and persist the derived status of a credit and its
    /// installments as of the provider's current date
    pub async fn recalculate(
        &self,
        credit_id: CreditId,
        time: &SafeTimeProvider,
    ) -> Result<RecalcOutcome> {
        let credit = self
            .store
            .find_credit(credit_id)
            .await?
            .ok_or(CreditError::CreditNotFound { id: credit_id })?;

        let now = time.now();
        let today = now.date_naive();
        let plan = plan_recalculation(&credit, today);

        let mut events = EventLog::new();
        let mut pending: Vec<BoxFuture<'_, Result<()>>> = Vec::new();

        for write in &plan.installment_writes {
            events.emit(Event::InstallmentStatusChanged {
                credit_id,
                installment_id: write.installment_id,
                old_status: write.old_status,
                new_status: write.new_status,
                timestamp: now,
            });
            pending.push(
                self.store
                    .update_installment_status(write.installment_id, write.new_status),
            );
        }

        if let Some(write) = &plan.credit_write {
            if write.new_status != write.old_status {
                events.emit(Event::CreditStatusChanged {
                    credit_id,
                    old_status: write.old_status,
                    new_status: write.new_status,
                    timestamp: now,
                });
            }
            if write.new_status == CreditStatus::Closed && credit.end_date.is_none() {
                events.emit(Event::CreditClosed {
                    credit_id,
                    end_date: today,
                    timestamp: now,
                });
            }
            pending.push(self.store.update_credit_status_and_closure(
                credit_id,
                write.new_status,
                write.end_date,
            ));
        }

        try_join_all(pending).await?;

        debug!(
            credit_id = %credit_id,
            status = ?plan.status,
            writes = plan.write_count(),
            "recalculated credit"
        );

        Ok(RecalcOutcome {
            credit_id,
            status: plan.status,
            writes: plan.write_count(),
            events: events.take_events(),
        })
    }
}
