use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::order::{
    CreateOrderPayload, Order, OrderItem, OrderItemRow, OrderRow, OrderStatus,
};
use crate::models::product;
use crate::{validation, AppState};

/// Place an order. Runs inside one database transaction: the header and item
/// snapshots are written, then each product's stock is taken through the
/// conditional decrement. If any item cannot be covered the transaction is
/// dropped whole — no partial order, no net stock change.
pub async fn create_order(
    state: &AppState,
    session_token: &str,
    payload: CreateOrderPayload,
) -> Result<Order, AppError> {
    let session = crate::auth::guard::validate_session(state, session_token)?;

    if payload.items.is_empty() {
        return Err(AppError::Validation("At least one item is required".into()));
    }
    validation::validate_location(&payload.shipping_address)?;

    let payment_method = payload.payment_method.unwrap_or_else(|| "cod".to_string());
    let order_id = uuid::Uuid::new_v4().to_string();

    let mut tx = state.db.begin().await?;

    // Snapshot pass, in caller-supplied item order
    let mut subtotal: i64 = 0;
    let mut lines: Vec<OrderItem> = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let quantity = item.quantity.unwrap_or(1);
        validation::validate_quantity(quantity)?;

        let row = product::get_product(&mut *tx, &item.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", item.product_id)))?;

        if row.stock < quantity {
            return Err(AppError::InsufficientStock(format!(
                "Insufficient stock for {}",
                row.name
            )));
        }

        subtotal += row.price * quantity;
        lines.push(OrderItem {
            product_id: row.id,
            name: row.name,
            price: row.price,
            quantity,
        });
    }

    sqlx::query(
        "INSERT INTO orders (id, user_id, subtotal, address, city, state, pincode, payment_method)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&order_id)
    .bind(&session.user_id)
    .bind(subtotal)
    .bind(&payload.shipping_address.address)
    .bind(&payload.shipping_address.city)
    .bind(&payload.shipping_address.state)
    .bind(&payload.shipping_address.pincode)
    .bind(&payment_method)
    .execute(&mut *tx)
    .await?;

    for line in &lines {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, name, price, quantity)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&order_id)
        .bind(&line.product_id)
        .bind(&line.name)
        .bind(line.price)
        .bind(line.quantity)
        .execute(&mut *tx)
        .await?;

        // The conditional decrement is the authority on availability; the
        // read above only shapes the error message for the sequential case.
        let taken = product::decrement_if_available(&mut *tx, &line.product_id, line.quantity).await?;
        if !taken {
            return Err(AppError::InsufficientStock(format!(
                "Insufficient stock for {}",
                line.name
            )));
        }
    }

    tx.commit().await?;

    crate::audit::log_activity(
        &state.db,
        Some(&session.user_id),
        "ORDER_CREATE",
        &format!("Order {} placed", order_id),
        Some(&serde_json::json!({ "subtotal": subtotal, "items": lines.len() })),
    )
    .await;

    crate::log_info!(
        "ORDER",
        "Order placed",
        serde_json::json!({ "orderId": order_id, "subtotal": subtotal })
    );

    fetch_order(&state.db, &order_id).await
}

/// Orders of the calling user, newest first.
pub async fn my_orders(state: &AppState, session_token: &str) -> Result<Vec<Order>, AppError> {
    let session = crate::auth::guard::validate_session(state, session_token)?;

    let rows = sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(&session.user_id)
    .fetch_all(&state.db)
    .await?;

    assemble(&state.db, rows).await
}

/// All orders (Admin only).
pub async fn admin_list_orders(
    state: &AppState,
    session_token: &str,
) -> Result<Vec<Order>, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;

    let rows =
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC, id DESC")
            .fetch_all(&state.db)
            .await?;

    assemble(&state.db, rows).await
}

/// One order by id (Admin only).
pub async fn admin_get_order(
    state: &AppState,
    session_token: &str,
    order_id: &str,
) -> Result<Order, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;
    fetch_order(&state.db, order_id).await
}

/// Advance an order along its fulfillment chain (Admin only). Moving to
/// `cancelled` puts every item's stock back, in the same transaction as the
/// status change; terminality of `cancelled` means that happens at most once.
pub async fn transition_order(
    state: &AppState,
    session_token: &str,
    order_id: &str,
    new_status: &str,
) -> Result<Order, AppError> {
    let session = crate::auth::guard::validate_admin(state, session_token)?;

    let new_status = OrderStatus::parse(new_status)?;
    let current = fetch_order(&state.db, order_id).await?.status;

    if current.is_terminal() {
        return Err(AppError::TerminalState(format!(
            "Order is {} and accepts no further transition",
            current.as_str()
        )));
    }
    if !current.can_transition_to(new_status) {
        return Err(AppError::InvalidTransition(format!(
            "Cannot move order from {} to {}",
            current.as_str(),
            new_status.as_str()
        )));
    }

    let mut tx = state.db.begin().await?;

    sqlx::query("UPDATE orders SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(new_status.as_str())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

    if new_status == OrderStatus::Cancelled {
        let items: Vec<(String, i64)> = sqlx::query_as(
            "SELECT product_id, quantity FROM order_items WHERE order_id = ?",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        for (product_id, quantity) in items {
            product::increment_stock(&mut *tx, &product_id, quantity).await?;
        }
    }

    tx.commit().await?;

    crate::audit::log_activity(
        &state.db,
        Some(&session.user_id),
        "ORDER_TRANSITION",
        &format!(
            "Order {} moved {} -> {}",
            order_id,
            current.as_str(),
            new_status.as_str()
        ),
        None,
    )
    .await;

    fetch_order(&state.db, order_id).await
}

async fn fetch_order(db: &SqlitePool, order_id: &str) -> Result<Order, AppError> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ?")
        .bind(order_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    let items = sqlx::query_as::<_, OrderItemRow>(
        "SELECT * FROM order_items WHERE order_id = ? ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(db)
    .await?;

    Order::from_rows(row, items)
}

async fn assemble(db: &SqlitePool, rows: Vec<OrderRow>) -> Result<Vec<Order>, AppError> {
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT * FROM order_items WHERE order_id = ? ORDER BY id ASC",
        )
        .bind(&row.id)
        .fetch_all(db)
        .await?;
        orders.push(Order::from_rows(row, items)?);
    }
    Ok(orders)
}
