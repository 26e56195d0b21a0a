use thiserror::Error;

use crate::types::{CreditId, InstallmentId};

#[derive(Error, Debug)]
pub enum CreditError {
    #[error("credit not found: {id}")]
    CreditNotFound {
        id: CreditId,
    },

    #[error("installment not found: {id}")]
    InstallmentNotFound {
        id: InstallmentId,
    },

    #[error("installment {id} has no parent credit {credit_id}")]
    OrphanInstallment {
        id: InstallmentId,
        credit_id: CreditId,
    },

    #[error("store failure: {message}")]
    Store {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, CreditError>;
