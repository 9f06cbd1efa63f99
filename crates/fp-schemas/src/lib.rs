//! Shared domain types for the FlashPrint workspace.
//!
//! Enum spellings match the database columns and the JSON wire format
//! (`PAYMENT_CONFIRMED`, `BW`, `Hostel`, ...). No business logic lives here
//! beyond string round-tripping and the order pipeline ordering.

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    PaymentConfirmed,
    Printing,
    ReadyForDelivery,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::PaymentConfirmed,
        OrderStatus::Printing,
        OrderStatus::ReadyForDelivery,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Fulfillment sequence. CANCELLED is a side-exit and not part of it.
    pub const PIPELINE: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::PaymentConfirmed,
        OrderStatus::Printing,
        OrderStatus::ReadyForDelivery,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    /// Statuses counted as "pending" work on dashboards.
    pub const AWAITING_PRINT: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::PaymentConfirmed,
        OrderStatus::Printing,
    ];

    pub const AWAITING_DELIVERY: [OrderStatus; 2] =
        [OrderStatus::ReadyForDelivery, OrderStatus::OutForDelivery];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::PaymentConfirmed => "PAYMENT_CONFIRMED",
            OrderStatus::Printing => "PRINTING",
            OrderStatus::ReadyForDelivery => "READY_FOR_DELIVERY",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PAYMENT_CONFIRMED" => Ok(OrderStatus::PaymentConfirmed),
            "PRINTING" => Ok(OrderStatus::Printing),
            "READY_FOR_DELIVERY" => Ok(OrderStatus::ReadyForDelivery),
            "OUT_FOR_DELIVERY" => Ok(OrderStatus::OutForDelivery),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(anyhow!("invalid order status: {}", other)),
        }
    }

    /// Human label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::PaymentConfirmed => "Payment Confirmed",
            OrderStatus::Printing => "Printing",
            OrderStatus::ReadyForDelivery => "Ready for Delivery",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Position in [`OrderStatus::PIPELINE`]; `None` for CANCELLED.
    pub fn pipeline_rank(&self) -> Option<usize> {
        Self::PIPELINE.iter().position(|s| s == self)
    }

    /// DELIVERED and CANCELLED end the lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// True when `to` moves the order forward through the pipeline, or
    /// cancels an order that has not finished yet.
    ///
    /// Nothing refuses a non-forward move; admins can set any status. This is
    /// only used to flag unusual corrections in logs.
    pub fn is_forward_move(&self, to: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if to == OrderStatus::Cancelled {
            return true;
        }
        match (self.pipeline_rank(), to.pipeline_rank()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PaymentStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "COMPLETED" => Ok(PaymentStatus::Completed),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(anyhow!("invalid payment status: {}", other)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UserRole
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    Faculty,
    Others,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "STUDENT",
            UserRole::Faculty => "FACULTY",
            UserRole::Others => "OTHERS",
            UserRole::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "STUDENT" => Ok(UserRole::Student),
            "FACULTY" => Ok(UserRole::Faculty),
            "OTHERS" => Ok(UserRole::Others),
            "ADMIN" => Ok(UserRole::Admin),
            other => Err(anyhow!("invalid user role: {}", other)),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Print options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintType {
    Bw,
    Color,
}

impl PrintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintType::Bw => "BW",
            PrintType::Color => "COLOR",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "BW" => Ok(PrintType::Bw),
            "COLOR" => Ok(PrintType::Color),
            other => Err(anyhow!("invalid print type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
}

impl PaperSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::A3 => "A3",
            PaperSize::A5 => "A5",
            PaperSize::Letter => "LETTER",
            PaperSize::Legal => "LEGAL",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "A4" => Ok(PaperSize::A4),
            "A3" => Ok(PaperSize::A3),
            "A5" => Ok(PaperSize::A5),
            "LETTER" => Ok(PaperSize::Letter),
            "LEGAL" => Ok(PaperSize::Legal),
            other => Err(anyhow!("invalid paper size: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintSide {
    Single,
    Double,
}

impl PrintSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintSide::Single => "SINGLE",
            PrintSide::Double => "DOUBLE",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "SINGLE" => Ok(PrintSide::Single),
            "DOUBLE" => Ok(PrintSide::Double),
            other => Err(anyhow!("invalid print side: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    Hostel,
    Department,
    Custom,
}

impl AddressType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressType::Hostel => "Hostel",
            AddressType::Department => "Department",
            AddressType::Custom => "Custom",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "Hostel" => Ok(AddressType::Hostel),
            "Department" => Ok(AddressType::Department),
            "Custom" => Ok(AddressType::Custom),
            other => Err(anyhow!("invalid address type: {}", other)),
        }
    }
}

/// Location fields shared by a user's saved address and the snapshot copied
/// onto each order at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    #[serde(rename = "type")]
    pub address_type: Option<AddressType>,
    pub hostel_name: Option<String>,
    pub room_number: Option<String>,
    pub department_name: Option<String>,
    pub cabin_number: Option<String>,
    pub building_name: Option<String>,
    pub floor_number: Option<String>,
    pub landmark: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub location: DeliveryAddress,
    pub updated_at_utc: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at_utc: DateTime<Utc>,
}

/// Customer fields embedded in order detail responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// UPI transaction reference supplied by the customer.
    pub payment_id: Option<String>,
    pub total_paise: i64,
    pub delivery_address: DeliveryAddress,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub paid_at_utc: Option<DateTime<Utc>>,
    pub delivered_at_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub file_name: String,
    pub file_url: String,
    pub page_count: i32,
    pub copies: i32,
    pub print_type: PrintType,
    pub paper_size: PaperSize,
    pub print_side: PrintSide,
    pub page_range: Option<String>,
    pub price_paise: i64,
}

/// One row of the append-only status log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub changed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub changed_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyExpense {
    pub id: Uuid,
    pub date: NaiveDate,
    pub category: String,
    pub amount_paise: i64,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}
