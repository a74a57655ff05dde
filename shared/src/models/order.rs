//! Purchase order models and lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchase order sent to a supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    /// Order number (e.g., "PO-2025-0042")
    pub order_number: String,
    pub vendor: Option<String>,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub qst: Decimal,
    pub total: Decimal,
    pub expected_at: Option<NaiveDate>,
    pub received_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    /// Linked inventory item; None until linked or created on first receipt
    pub item_id: Option<Uuid>,
    pub description: String,
    pub sku: Option<String>,
    pub quantity: Decimal,
    /// Purchase-unit token (e.g., "kg", "cs")
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub quantity_received: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PurchaseOrderLine {
    pub fn is_fully_received(&self) -> bool {
        self.quantity_received >= self.quantity
    }
}

/// Status of a purchase order in its lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    PendingApproval,
    Approved,
    Sent,
    Confirmed,
    PartiallyReceived,
    Received,
    Cancelled,
    Closed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::PendingApproval => "pending_approval",
            OrderStatus::Approved => "approved",
            OrderStatus::Sent => "sent",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::PartiallyReceived => "partially_received",
            OrderStatus::Received => "received",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Closed => "closed",
        }
    }

    /// States before any goods have been fully received; only these may
    /// be cancelled
    pub fn is_pre_received(&self) -> bool {
        matches!(
            self,
            OrderStatus::Draft
                | OrderStatus::PendingApproval
                | OrderStatus::Approved
                | OrderStatus::Sent
                | OrderStatus::Confirmed
                | OrderStatus::PartiallyReceived
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Closed)
    }

    /// Goods may only be received against these states
    pub fn can_receive(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::PartiallyReceived)
    }

    /// The explicit transition table. Anything not listed is invalid.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (*self, next) {
            (Draft, PendingApproval)
            | (PendingApproval, Approved)
            | (Approved, Sent)
            | (Sent, Confirmed)
            | (Confirmed, PartiallyReceived)
            | (Confirmed, Received)
            | (PartiallyReceived, Received)
            | (Received, Closed) => true,
            (from, Cancelled) => from.is_pre_received(),
            _ => false,
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OrderStatus::Draft),
            "pending_approval" => Ok(OrderStatus::PendingApproval),
            "approved" => Ok(OrderStatus::Approved),
            "sent" => Ok(OrderStatus::Sent),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "partially_received" => Ok(OrderStatus::PartiallyReceived),
            "received" => Ok(OrderStatus::Received),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "closed" => Ok(OrderStatus::Closed),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Computed money columns of an order. Always derived from the lines,
/// never accepted from callers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub gst: Decimal,
    pub qst: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Québec compound sales tax: GST (TPS) 5% on the subtotal, then
    /// QST (TVQ) 9.975% on the GST-inclusive amount, each rounded to cents.
    pub fn from_lines(lines: &[PurchaseOrderLine]) -> Self {
        let subtotal: Decimal = lines.iter().map(|l| l.quantity * l.unit_price).sum();
        let gst = round2(subtotal * gst_rate());
        let qst = round2((subtotal + gst) * qst_rate());
        let total = round2(subtotal + gst + qst);
        Self {
            subtotal,
            gst,
            qst,
            total,
        }
    }
}

fn gst_rate() -> Decimal {
    // 5%
    Decimal::new(5, 2)
}

fn qst_rate() -> Decimal {
    // 9.975%
    Decimal::new(9975, 5)
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Generate an order number
pub fn generate_order_number(year: i32, sequence: i32) -> String {
    format!("PO-{}-{:04}", year, sequence)
}
