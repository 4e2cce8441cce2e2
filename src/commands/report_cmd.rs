use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::AppState;

/// Dashboard overview numbers. `revenue` mirrors `totalSales`; the client
/// reads both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_sales: i64,
    pub total_orders: i64,
    pub new_bookings: i64,
    pub low_stock_items: i64,
    pub revenue: i64,
}

/// Aggregate dashboard query (Admin only). Cancelled orders are excluded
/// from sales; "new" bookings are the pending ones.
pub async fn overview(state: &AppState, session_token: &str) -> Result<Overview, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;

    let (total_sales, total_orders): (i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(subtotal), 0), COUNT(id)
         FROM orders
         WHERE status != 'cancelled'",
    )
    .fetch_one(&state.db)
    .await?;

    let (new_bookings,): (i64,) =
        sqlx::query_as("SELECT COUNT(id) FROM bookings WHERE status = 'pending'")
            .fetch_one(&state.db)
            .await?;

    let threshold = crate::config::get_config().inventory.low_stock_threshold;
    let (low_stock_items,): (i64,) =
        sqlx::query_as("SELECT COUNT(id) FROM products WHERE stock <= ?")
            .bind(threshold)
            .fetch_one(&state.db)
            .await?;

    Ok(Overview {
        total_sales,
        total_orders,
        new_bookings,
        low_stock_items,
        revenue: total_sales,
    })
}
