use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{
    ActorId, ClientId, CreditId, CreditStatus, InstallmentId, InstallmentStatus, SaleId,
};

/// credit granted on a sale, paid off through installments
///
/// the stored `status` is a cache of a pure function over the balance and the
/// installments; the engine recomputes it on every read and writes it back
/// only when it differs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credit {
    pub credit_id: CreditId,
    pub sale_id: SaleId,
    pub client_id: ClientId,

    // balances
    pub total_amount: Money,
    pub outstanding_balance: Money,

    // status
    pub status: CreditStatus,

    // dates
    pub start_date: DateTime<Utc>,
    /// set exactly once when the credit closes, never cleared afterwards
    pub end_date: Option<NaiveDate>,

    /// exclusively owned, ordered by installment number
    pub installments: Vec<Installment>,
}

/// one scheduled partial payment within a credit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub installment_id: InstallmentId,
    /// 1-based position within the credit, assigned at creation
    pub number: u32,
    /// date-only semantics, no time component
    pub due_date: NaiveDate,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_by: Option<ActorId>,
}

impl Credit {
    /// create a new credit with its installment schedule
    pub fn new(
        sale_id: SaleId,
        client_id: ClientId,
        total_amount: Money,
        start_date: DateTime<Utc>,
        installments: Vec<Installment>,
    ) -> Self {
        let mut installments = installments;
        installments.sort_by_key(|i| i.number);

        Self {
            credit_id: Uuid::new_v4(),
            sale_id,
            client_id,
            total_amount,
            outstanding_balance: total_amount,
            status: CreditStatus::Active,
            start_date,
            end_date: None,
            installments,
        }
    }

    /// look up an installment by id
    pub fn installment(&self, id: InstallmentId) -> Option<&Installment> {
        self.installments.iter().find(|i| i.installment_id == id)
    }

    /// unpaid installment with the earliest due date, if any remain
    pub fn next_unpaid(&self) -> Option<&Installment> {
        self.installments
            .iter()
            .filter(|i| !i.is_paid())
            .min_by_key(|i| i.due_date)
    }

    /// check if the credit is settled by balance alone
    pub fn is_settled(&self) -> bool {
        self.outstanding_balance <= Money::ZERO
    }
}

impl Installment {
    /// create an unpaid installment
    pub fn new(number: u32, due_date: NaiveDate, amount_due: Money) -> Self {
        Self {
            installment_id: Uuid::new_v4(),
            number,
            due_date,
            amount_due,
            amount_paid: Money::ZERO,
            status: InstallmentStatus::Pending,
            paid_at: None,
            paid_by: None,
        }
    }

    /// whether this installment counts as fully paid
    ///
    /// any of three stored signals is sufficient: an explicit paid timestamp,
    /// an already-stored Paid status, or the paid amount covering the amount
    /// due (see [`crate::status::is_paid`])
    pub fn is_paid(&self) -> bool {
        crate::status::is_paid(
            self.paid_at.is_some(),
            self.status,
            Some(self.amount_paid),
            Some(self.amount_due),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn due(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_installments_sorted_by_number() {
        let credit = Credit::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::from_major(300),
            Utc::now(),
            vec![
                Installment::new(3, due(2025, 3, 1), Money::from_major(100)),
                Installment::new(1, due(2025, 1, 1), Money::from_major(100)),
                Installment::new(2, due(2025, 2, 1), Money::from_major(100)),
            ],
        );

        let numbers: Vec<u32> = credit.installments.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_next_unpaid_earliest_due_date() {
        let mut paid = Installment::new(1, due(2025, 1, 1), Money::from_major(100));
        paid.status = InstallmentStatus::Paid;

        let credit = Credit::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Money::from_major(300),
            Utc::now(),
            vec![
                paid,
                Installment::new(2, due(2025, 2, 1), Money::from_major(100)),
                Installment::new(3, due(2025, 3, 1), Money::from_major(100)),
            ],
        );

        assert_eq!(credit.next_unpaid().unwrap().number, 2);
    }

    #[test]
    fn test_is_paid_from_any_signal() {
        let mut ins = Installment::new(1, due(2025, 1, 1), Money::from_major(100));
        assert!(!ins.is_paid());

        ins.paid_at = Some(Utc::now());
        assert!(ins.is_paid());

        let mut ins = Installment::new(1, due(2025, 1, 1), Money::from_major(100));
        ins.status = InstallmentStatus::Paid;
        assert!(ins.is_paid());

        let mut ins = Installment::new(1, due(2025, 1, 1), Money::from_major(100));
        ins.amount_paid = Money::from_major(100);
        assert!(ins.is_paid());
    }
}
