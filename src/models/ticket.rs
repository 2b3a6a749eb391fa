use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Cancelled,
    Used,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Active => "active",
            TicketStatus::Cancelled => "cancelled",
            TicketStatus::Used => "used",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TicketStatus::Active),
            "cancelled" => Some(TicketStatus::Cancelled),
            "used" => Some(TicketStatus::Used),
            _ => None,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Dinheiro,
    Pix,
    Cartao,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Dinheiro,
        PaymentMethod::Pix,
        PaymentMethod::Cartao,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Dinheiro => "dinheiro",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Cartao => "cartao",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dinheiro" => Some(PaymentMethod::Dinheiro),
            "pix" => Some(PaymentMethod::Pix),
            "cartao" => Some(PaymentMethod::Cartao),
            _ => None,
        }
    }

    /// Label printed on receipts.
    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Dinheiro => "Dinheiro",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Cartao => "Cartão",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Ticket {
    pub id: i32,
    pub customer_id: i32,
    pub ticket_type_id: i32,
    pub price: i32,
    pub payment_method: String,
    pub status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub printed_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub qr_token: String,
    pub valid_until: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn status(&self) -> Option<TicketStatus> {
        TicketStatus::parse(&self.status)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| now > until)
    }
}

/// A ticket joined with its customer and ticket type.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketDetails {
    pub id: i32,
    pub customer_id: i32,
    pub ticket_type_id: i32,
    pub ticket_type_name: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub price: i32,
    pub payment_method: String,
    pub status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub printed_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub qr_token: String,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TicketDetails {
    pub fn status(&self) -> Option<TicketStatus> {
        TicketStatus::parse(&self.status)
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        PaymentMethod::parse(&self.payment_method)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: i32,
    pub customer_id: i32,
    pub ticket_type_id: i32,
    pub price: f64,
    pub payment_method: String,
    pub status: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub printed_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub qr_token: String,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ticket> for TicketView {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            customer_id: t.customer_id,
            ticket_type_id: t.ticket_type_id,
            price: money::from_cents(t.price),
            payment_method: t.payment_method,
            status: t.status,
            cancelled_at: t.cancelled_at,
            cancellation_reason: t.cancellation_reason,
            printed_at: t.printed_at,
            used_at: t.used_at,
            qr_token: t.qr_token,
            valid_until: t.valid_until,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListingView {
    pub id: i32,
    pub customer_id: i32,
    pub ticket_type_id: i32,
    pub ticket_type_name: Option<String>,
    pub customer_name: Option<String>,
    pub price: f64,
    pub status: String,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub printed_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
}

impl From<TicketDetails> for TicketListingView {
    fn from(t: TicketDetails) -> Self {
        Self {
            id: t.id,
            customer_id: t.customer_id,
            ticket_type_id: t.ticket_type_id,
            ticket_type_name: t.ticket_type_name,
            customer_name: t.customer_name,
            price: money::from_cents(t.price),
            status: t.status,
            payment_method: t.payment_method,
            created_at: t.created_at,
            cancelled_at: t.cancelled_at,
            cancellation_reason: t.cancellation_reason,
            printed_at: t.printed_at,
            used_at: t.used_at,
        }
    }
}
