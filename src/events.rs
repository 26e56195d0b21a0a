use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{ActorId, CreditId, CreditStatus, InstallmentId, InstallmentStatus};

/// all events that can be emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// an installment's derived status differed from storage and was corrected
    InstallmentStatusChanged {
        credit_id: CreditId,
        installment_id: InstallmentId,
        old_status: InstallmentStatus,
        new_status: InstallmentStatus,
        timestamp: DateTime<Utc>,
    },
    InstallmentPaid {
        credit_id: CreditId,
        installment_id: InstallmentId,
        amount: Money,
        paid_by: ActorId,
        timestamp: DateTime<Utc>,
    },
    CreditStatusChanged {
        credit_id: CreditId,
        old_status: CreditStatus,
        new_status: CreditStatus,
        timestamp: DateTime<Utc>,
    },
    /// outstanding balance reached zero and the closure date was assigned
    CreditClosed {
        credit_id: CreditId,
        end_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
}

/// event sink for collecting events during operations
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
