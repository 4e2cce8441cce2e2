use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::booking::Location;

/// Order fulfillment states. Forward-only chain; `cancelled` is the escape
/// hatch from any non-terminal state. `delivered` and `cancelled` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Paid,
    ReadyToShip,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Paid => "paid",
            OrderStatus::ReadyToShip => "ready_to_ship",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "paid" => Ok(OrderStatus::Paid),
            "ready_to_ship" => Ok(OrderStatus::ReadyToShip),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(AppError::Validation("Invalid status value".into())),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    fn successor(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Paid),
            OrderStatus::Paid => Some(OrderStatus::ReadyToShip),
            OrderStatus::ReadyToShip => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.successor() == Some(next) || next == OrderStatus::Cancelled
    }
}

/// One ordered line. `name` and `price` are snapshots taken at order time;
/// later catalog edits never reach them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

/// Database row for an order line.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: String,
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id,
            name: row.name,
            price: row.price,
            quantity: row.quantity,
        }
    }
}

/// Flat database row — for query_as.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: String,
    pub user_id: String,
    pub subtotal: i64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub status: String,
    pub payment_method: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Order as sent to clients. `subtotal` is computed once at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub owner_user_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: i64,
    pub shipping_address: Location,
    pub status: OrderStatus,
    pub payment_method: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Order {
    pub fn from_rows(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Self, AppError> {
        Ok(Self {
            status: OrderStatus::parse(&row.status)?,
            id: row.id,
            owner_user_id: row.user_id,
            items: items.into_iter().map(OrderItem::from).collect(),
            subtotal: row.subtotal,
            shipping_address: Location {
                address: row.address,
                city: row.city,
                state: row.state,
                pincode: row.pincode,
            },
            payment_method: row.payment_method,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One requested line in a new order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: String,
    /// Defaults to 1 when omitted.
    pub quantity: Option<i64>,
}

/// Payload for placing an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub items: Vec<OrderItemInput>,
    pub shipping_address: Location,
    pub payment_method: Option<String>,
}
