//! Door-side ticket checks: classifying a scanned token and deciding whether
//! a ticket may be checked in.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Ticket, TicketDetails, TicketStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum AccessCheck {
    Invalid {
        message: String,
    },
    Used {
        message: String,
        customer: Option<String>,
        used_at: Option<DateTime<Utc>>,
    },
    Expired {
        message: String,
        customer: Option<String>,
    },
    Valid {
        ticket: ValidTicket,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidTicket {
    pub id: i32,
    pub customer_name: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl AccessCheck {
    pub fn status(&self) -> &'static str {
        match self {
            AccessCheck::Invalid { .. } => "invalid",
            AccessCheck::Used { .. } => "used",
            AccessCheck::Expired { .. } => "expired",
            AccessCheck::Valid { .. } => "valid",
        }
    }
}

/// Classify a looked-up ticket. Order matters: a used ticket reports `used`
/// even once its validity has passed.
pub fn classify(ticket: Option<&TicketDetails>, now: DateTime<Utc>) -> AccessCheck {
    let Some(ticket) = ticket else {
        return AccessCheck::Invalid {
            message: "Ticket not found".to_string(),
        };
    };

    match ticket.status() {
        Some(TicketStatus::Used) => {
            return AccessCheck::Used {
                message: "Ticket already used".to_string(),
                customer: ticket.customer_name.clone(),
                used_at: ticket.used_at,
            };
        }
        Some(TicketStatus::Active) => {}
        Some(TicketStatus::Cancelled) | None => {
            return AccessCheck::Invalid {
                message: "Ticket invalid or cancelled".to_string(),
            };
        }
    }

    if ticket.valid_until.is_some_and(|until| now > until) {
        return AccessCheck::Expired {
            message: "QR code expired".to_string(),
            customer: ticket.customer_name.clone(),
        };
    }

    AccessCheck::Valid {
        ticket: ValidTicket {
            id: ticket.id,
            customer_name: ticket.customer_name.clone(),
            ticket_type: ticket.ticket_type_name.clone(),
            valid_until: ticket.valid_until,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInRefusal {
    AlreadyUsed,
    NotActive,
    Expired,
}

impl CheckInRefusal {
    pub fn message(self) -> &'static str {
        match self {
            CheckInRefusal::AlreadyUsed => "Ticket already used",
            CheckInRefusal::NotActive => "Only active tickets can be checked in",
            CheckInRefusal::Expired => "Ticket expired",
        }
    }
}

pub fn ensure_can_check_in(ticket: &Ticket, now: DateTime<Utc>) -> Result<(), CheckInRefusal> {
    match ticket.status() {
        Some(TicketStatus::Active) => {}
        Some(TicketStatus::Used) => return Err(CheckInRefusal::AlreadyUsed),
        Some(TicketStatus::Cancelled) | None => return Err(CheckInRefusal::NotActive),
    }
    if ticket.is_expired_at(now) {
        return Err(CheckInRefusal::Expired);
    }
    Ok(())
}
