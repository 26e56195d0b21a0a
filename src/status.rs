//! pure status derivation for credits and installments
//!
//! stored status fields are caches of the functions in this module; the
//! engine recomputes them on every read and persists only the differences.
//! nothing here performs I/O, so every rule is unit-testable with a fixed
//! `today`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::Credit;
use crate::types::{CreditId, CreditStatus, InstallmentId, InstallmentStatus};

/// paid check over the three stored signals
///
/// an installment counts as paid when any signal says so: the paid timestamp
/// is set, the stored status is already Paid, or the paid amount covers the
/// amount due. amounts arrive as options so that malformed stored values
/// (NaN/infinity rejected by [`Money::from_f64`]) simply fail the numeric
/// check instead of poisoning the result.
pub fn is_paid(
    paid_at_set: bool,
    stored_status: InstallmentStatus,
    amount_paid: Option<Money>,
    amount_due: Option<Money>,
) -> bool {
    if paid_at_set || stored_status == InstallmentStatus::Paid {
        return true;
    }
    match (amount_paid, amount_due) {
        (Some(paid), Some(due)) => paid >= due,
        _ => false,
    }
}

/// derive an installment's status from its due date and paid state
///
/// date-only comparison: an installment due today is still Pending, it only
/// turns Overdue the day after
pub fn installment_status(due_date: NaiveDate, paid: bool, today: NaiveDate) -> InstallmentStatus {
    if paid {
        InstallmentStatus::Paid
    } else if due_date < today {
        InstallmentStatus::Overdue
    } else {
        InstallmentStatus::Pending
    }
}

/// derive a credit's status from its balance and its overdue installments
pub fn credit_status(outstanding_balance: Money, has_overdue_unpaid: bool) -> CreditStatus {
    if outstanding_balance <= Money::ZERO {
        CreditStatus::Closed
    } else if has_overdue_unpaid {
        CreditStatus::Delinquent
    } else {
        CreditStatus::Active
    }
}

/// one installment whose derived status differs from storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentWrite {
    pub installment_id: InstallmentId,
    pub old_status: InstallmentStatus,
    pub new_status: InstallmentStatus,
}

/// credit header update, issued when the status changed or closure fields
/// need to be set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditWrite {
    pub old_status: CreditStatus,
    pub new_status: CreditStatus,
    /// final closure date: pre-existing value preserved, today's date when
    /// closing for the first time, None otherwise
    pub end_date: Option<NaiveDate>,
}

/// write plan produced by one recomputation pass
///
/// applying the plan to the same stored state yields an empty plan on the
/// next pass, which is what makes recalculation idempotent at the storage
/// layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalcPlan {
    pub credit_id: CreditId,
    /// final derived credit status, whether or not it needed a write
    pub status: CreditStatus,
    pub installment_writes: Vec<InstallmentWrite>,
    pub credit_write: Option<CreditWrite>,
}

impl RecalcPlan {
    /// total number of store writes this plan will issue
    pub fn write_count(&self) -> usize {
        self.installment_writes.len() + usize::from(self.credit_write.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.write_count() == 0
    }
}

/// compute the write plan for one credit as of `today`
///
/// a credit with no installments is classified by balance alone; Delinquent
/// is unreachable without an overdue unpaid installment
pub fn plan_recalculation(credit: &Credit, today: NaiveDate) -> RecalcPlan {
    let mut installment_writes = Vec::new();
    let mut has_overdue_unpaid = false;

    for ins in &credit.installments {
        let paid = ins.is_paid();
        let derived = installment_status(ins.due_date, paid, today);

        if derived == InstallmentStatus::Overdue {
            has_overdue_unpaid = true;
        }

        if derived != ins.status {
            installment_writes.push(InstallmentWrite {
                installment_id: ins.installment_id,
                old_status: ins.status,
                new_status: derived,
            });
        }
    }

    let derived = credit_status(credit.outstanding_balance, has_overdue_unpaid);

    // write when the status changed, or when closing without a closure date;
    // a pre-existing end_date is never overwritten
    let closing_unset = derived == CreditStatus::Closed && credit.end_date.is_none();
    let credit_write = if derived != credit.status || closing_unset {
        let end_date = credit.end_date.or(if derived == CreditStatus::Closed {
            Some(today)
        } else {
            None
        });
        Some(CreditWrite {
            old_status: credit.status,
            new_status: derived,
            end_date,
        })
    } else {
        None
    };

    RecalcPlan {
        credit_id: credit.credit_id,
        status: derived,
        installment_writes,
        credit_write,
    }
}
