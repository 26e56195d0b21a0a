pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod payment;
pub mod projection;
pub mod state;
pub mod status;
pub mod store;
pub mod types;

// re-export key types
pub use decimal::Money;
pub use engine::{RecalcOutcome, StatusEngine};
pub use errors::{CreditError, Result};
pub use events::{Event, EventLog};
pub use payment::PaymentReceipt;
pub use projection::{CreditDetail, CreditHeader, CreditSummary, InstallmentView};
pub use state::{Credit, Installment};
pub use status::{credit_status, installment_status, plan_recalculation, RecalcPlan};
pub use store::{CreditStore, MemoryStore};
pub use types::{
    ActorId, ClientId, CreditId, CreditStatus, InstallmentId, InstallmentStatus, SaleId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
