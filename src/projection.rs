//! caller-facing read models
//!
//! projections never trust stored status: every view runs a recomputation
//! pass first, so the labels the caller renders are fresh as of today

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::try_join_all;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::engine::StatusEngine;
use crate::errors::{CreditError, Result};
use crate::state::{Credit, Installment};
use crate::store::CreditStore;
use crate::types::{ClientId, CreditId, CreditStatus, InstallmentId, InstallmentStatus, SaleId};

/// installment as rendered to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentView {
    pub installment_id: InstallmentId,
    pub number: u32,
    pub due_date: NaiveDate,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<&Installment> for InstallmentView {
    fn from(ins: &Installment) -> Self {
        Self {
            installment_id: ins.installment_id,
            number: ins.number,
            due_date: ins.due_date,
            amount_due: ins.amount_due,
            amount_paid: ins.amount_paid,
            status: ins.status,
            paid_at: ins.paid_at,
        }
    }
}

/// compact credit header returned by the payment command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditHeader {
    pub credit_id: CreditId,
    pub outstanding_balance: Money,
    pub status: CreditStatus,
    pub end_date: Option<NaiveDate>,
}

impl From<&Credit> for CreditHeader {
    fn from(credit: &Credit) -> Self {
        Self {
            credit_id: credit.credit_id,
            outstanding_balance: credit.outstanding_balance,
            status: credit.status,
            end_date: credit.end_date,
        }
    }
}

/// one row of the credit list view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditSummary {
    pub credit_id: CreditId,
    pub sale_id: SaleId,
    pub client_id: ClientId,
    pub outstanding_balance: Money,
    pub status: CreditStatus,
    /// unpaid installment with the earliest due date, None when all paid
    pub next_installment: Option<InstallmentView>,
}

/// full credit with all installments, ordered by number ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditDetail {
    pub credit_id: CreditId,
    pub sale_id: SaleId,
    pub client_id: ClientId,
    pub total_amount: Money,
    pub outstanding_balance: Money,
    pub status: CreditStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<NaiveDate>,
    pub installments: Vec<InstallmentView>,
}

impl<S: CreditStore> StatusEngine<S> {
    /// list view: one freshly recalculated summary per credit
    ///
    /// recalculations are credit-scoped and independent, so the fan-out runs
    /// them concurrently
    pub async fn list_credits(&self, time: &SafeTimeProvider) -> Result<Vec<CreditSummary>> {
        let ids = self.store().list_credit_ids().await?;
        try_join_all(ids.into_iter().map(|id| self.credit_summary(id, time))).await
    }

    /// one row of the list view
    pub async fn credit_summary(
        &self,
        credit_id: CreditId,
        time: &SafeTimeProvider,
    ) -> Result<CreditSummary> {
        self.recalculate(credit_id, time).await?;
        let credit = self.fresh_credit(credit_id).await?;

        Ok(CreditSummary {
            credit_id: credit.credit_id,
            sale_id: credit.sale_id,
            client_id: credit.client_id,
            outstanding_balance: credit.outstanding_balance,
            status: credit.status,
            next_installment: credit.next_unpaid().map(InstallmentView::from),
        })
    }

    /// detail view: the full credit with recomputed installment statuses
    pub async fn credit_detail(
        &self,
        credit_id: CreditId,
        time: &SafeTimeProvider,
    ) -> Result<CreditDetail> {
        self.recalculate(credit_id, time).await?;
        let credit = self.fresh_credit(credit_id).await?;

        Ok(CreditDetail {
            credit_id: credit.credit_id,
            sale_id: credit.sale_id,
            client_id: credit.client_id,
            total_amount: credit.total_amount,
            outstanding_balance: credit.outstanding_balance,
            status: credit.status,
            start_date: credit.start_date,
            end_date: credit.end_date,
            installments: credit.installments.iter().map(InstallmentView::from).collect(),
        })
    }

    async fn fresh_credit(&self, credit_id: CreditId) -> Result<Credit> {
        self.store()
            .find_credit(credit_id)
            .await?
            .ok_or(CreditError::CreditNotFound { id: credit_id })
    }
}
