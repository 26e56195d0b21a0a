use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a credit
pub type CreditId = Uuid;

/// unique identifier for an installment
pub type InstallmentId = Uuid;

/// reference to the originating sale/invoice
pub type SaleId = Uuid;

/// reference to the client the credit was granted to
pub type ClientId = Uuid;

/// identity of the user performing a command, for audit attribution
pub type ActorId = Uuid;

/// credit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditStatus {
    /// open, no installment currently overdue
    Active,
    /// at least one unpaid installment past its due date
    Delinquent,
    /// outstanding balance fully paid off
    Closed,
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallmentStatus {
    /// unpaid, due today or later
    Pending,
    /// unpaid, due date already passed
    Overdue,
    /// fully paid
    Paid,
}
