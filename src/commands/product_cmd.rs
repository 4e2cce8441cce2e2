use crate::errors::AppError;
use crate::models::product::{
    Category, CreateProductPayload, Product, ProductRow, UpdateProductPayload,
};
use crate::AppState;

/// Browse the catalog. Public read; filters are optional and combinable.
pub async fn list_products(
    state: &AppState,
    category: Option<&str>,
    featured: Option<bool>,
    search: Option<&str>,
) -> Result<Vec<Product>, AppError> {
    let mut qb = sqlx::QueryBuilder::new("SELECT * FROM products WHERE 1=1");

    if let Some(raw) = category {
        let category = Category::parse(raw)?;
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(featured) = featured {
        qb.push(" AND featured = ").push_bind(featured);
    }
    if let Some(term) = search {
        let like = format!("%{}%", term.to_lowercase());
        qb.push(" AND (LOWER(name) LIKE ")
            .push_bind(like.clone())
            .push(" OR LOWER(description) LIKE ")
            .push_bind(like)
            .push(")");
    }
    qb.push(" ORDER BY name ASC");

    let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&state.db).await?;
    rows.into_iter().map(Product::try_from).collect()
}

/// One product by id. Public read.
pub async fn get_product_detail(state: &AppState, product_id: &str) -> Result<Product, AppError> {
    let row = crate::models::product::get_product(&state.db, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;
    Product::try_from(row)
}

/// Add a catalog product (Admin only).
pub async fn create_product(
    state: &AppState,
    session_token: &str,
    payload: CreateProductPayload,
) -> Result<Product, AppError> {
    let session = crate::auth::guard::validate_admin(state, session_token)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Product name must not be empty".into()));
    }
    if payload.price < 0 {
        return Err(AppError::Validation("Price must not be negative".into()));
    }
    if payload.stock < 0 {
        return Err(AppError::Validation("Stock must not be negative".into()));
    }

    let product_id = uuid::Uuid::new_v4().to_string();
    let specifications = payload
        .specifications
        .map(|v| v.to_string());
    let tags = payload.tags.map(|v| serde_json::to_string(&v)).transpose()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let images = payload.images.map(|v| serde_json::to_string(&v)).transpose()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let result = sqlx::query(
        "INSERT INTO products (id, name, description, category, price, stock, sku,
                               specifications, featured, tags, images)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&product_id)
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.category.as_str())
    .bind(payload.price)
    .bind(payload.stock)
    .bind(&payload.sku)
    .bind(&specifications)
    .bind(payload.featured)
    .bind(&tags)
    .bind(&images)
    .execute(&state.db)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Err(AppError::Validation("SKU already exists".into()));
        }
        Err(e) => return Err(e.into()),
    }

    crate::audit::log_activity(
        &state.db,
        Some(&session.user_id),
        "PRODUCT_CREATE",
        &format!("Product {} added to catalog", product_id),
        None,
    )
    .await;

    get_product_detail(state, &product_id).await
}

/// Replace the editable fields of a product (Admin only). Stock is not among
/// them — it moves only through orders and explicit adjustments.
pub async fn update_product(
    state: &AppState,
    session_token: &str,
    product_id: &str,
    payload: UpdateProductPayload,
) -> Result<Product, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Product name must not be empty".into()));
    }
    if payload.price < 0 {
        return Err(AppError::Validation("Price must not be negative".into()));
    }

    let specifications = payload.specifications.map(|v| v.to_string());
    let tags = payload.tags.map(|v| serde_json::to_string(&v)).transpose()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let images = payload.images.map(|v| serde_json::to_string(&v)).transpose()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let result = sqlx::query(
        "UPDATE products SET
            name = ?, description = ?, category = ?, price = ?, sku = ?,
            specifications = ?, featured = ?, tags = ?, images = ?,
            updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
    )
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.category.as_str())
    .bind(payload.price)
    .bind(&payload.sku)
    .bind(&specifications)
    .bind(payload.featured)
    .bind(&tags)
    .bind(&images)
    .bind(product_id)
    .execute(&state.db)
    .await;

    match result {
        Ok(r) if r.rows_affected() == 0 => {
            Err(AppError::NotFound(format!("Product {} not found", product_id)))
        }
        Ok(_) => get_product_detail(state, product_id).await,
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            Err(AppError::Validation("SKU already exists".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Manual stock correction (Admin only). Negative deltas go through the
/// conditional decrement, so stock can never be adjusted below zero.
pub async fn adjust_stock(
    state: &AppState,
    session_token: &str,
    product_id: &str,
    delta: i64,
    reason: Option<&str>,
) -> Result<Product, AppError> {
    let session = crate::auth::guard::validate_admin(state, session_token)?;

    if delta == 0 {
        return Err(AppError::Validation("Adjustment must not be zero".into()));
    }

    // Existence first so a bad id reads as NotFound, not InsufficientStock
    let row = crate::models::product::get_product(&state.db, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found", product_id)))?;

    if delta > 0 {
        crate::models::product::increment_stock(&state.db, product_id, delta).await?;
    } else {
        let taken =
            crate::models::product::decrement_if_available(&state.db, product_id, -delta).await?;
        if !taken {
            return Err(AppError::InsufficientStock(format!(
                "Cannot remove {} units of {}: only {} in stock",
                -delta, row.name, row.stock
            )));
        }
    }

    crate::audit::log_activity(
        &state.db,
        Some(&session.user_id),
        "STOCK_ADJUST",
        &format!("Stock of {} adjusted by {}", product_id, delta),
        Some(&serde_json::json!({ "reason": reason })),
    )
    .await;

    get_product_detail(state, product_id).await
}

/// Remove a product from the catalog (Admin only). Order snapshots are
/// copies, so past orders keep their lines.
pub async fn delete_product(
    state: &AppState,
    session_token: &str,
    product_id: &str,
) -> Result<(), AppError> {
    let session = crate::auth::guard::validate_admin(state, session_token)?;

    let result = sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(product_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Product {} not found", product_id)));
    }

    crate::audit::log_activity(
        &state.db,
        Some(&session.user_id),
        "PRODUCT_DELETE",
        &format!("Product {} removed from catalog", product_id),
        None,
    )
    .await;

    Ok(())
}

/// Products at or below the low-stock threshold (Admin only).
pub async fn low_stock_products(
    state: &AppState,
    session_token: &str,
) -> Result<Vec<Product>, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;

    let threshold = crate::config::get_config().inventory.low_stock_threshold;
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT * FROM products WHERE stock <= ? ORDER BY stock ASC, name ASC",
    )
    .bind(threshold)
    .fetch_all(&state.db)
    .await?;

    rows.into_iter().map(Product::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::test_util::{login_as, seed_product, stock_of, test_state};

    fn payload(name: &str, sku: Option<&str>) -> CreateProductPayload {
        CreateProductPayload {
            name: name.into(),
            description: "A sturdy fabric grow bag".into(),
            category: Category::Containers,
            price: 299,
            stock: 20,
            sku: sku.map(String::from),
            specifications: Some(serde_json::json!({ "capacity": "40L" })),
            featured: true,
            tags: Some(vec!["bags".into(), "outdoor".into()]),
            images: None,
        }
    }

    #[tokio::test]
    async fn create_and_browse() {
        let state = test_state().await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        let product = create_product(&state, &admin, payload("Grow bag", Some("GB-40")))
            .await
            .unwrap();
        assert_eq!(product.category, Category::Containers);
        assert_eq!(product.specifications["capacity"], "40L");
        assert_eq!(product.tags, vec!["bags", "outdoor"]);

        let all = list_products(&state, None, None, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            list_products(&state, Some("containers"), None, None).await.unwrap().len(),
            1
        );
        assert_eq!(
            list_products(&state, Some("pest-management"), None, None).await.unwrap().len(),
            0
        );
        assert_eq!(
            list_products(&state, None, Some(true), Some("grow")).await.unwrap().len(),
            1
        );
        assert!(list_products(&state, Some("bogus"), None, None).await.is_err());
    }

    #[tokio::test]
    async fn sku_must_be_unique() {
        let state = test_state().await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        create_product(&state, &admin, payload("Grow bag", Some("GB-40"))).await.unwrap();
        let err = create_product(&state, &admin, payload("Other bag", Some("GB-40")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        // Missing SKU is fine, repeatedly
        create_product(&state, &admin, payload("Bag A", None)).await.unwrap();
        create_product(&state, &admin, payload("Bag B", None)).await.unwrap();
    }

    #[tokio::test]
    async fn update_cannot_touch_stock() {
        let state = test_state().await;
        let (_, admin) = login_as(&state, Role::Admin).await;
        let id = seed_product(&state, "Grow bag", 299, 7).await;

        let updated = update_product(
            &state,
            &admin,
            &id,
            UpdateProductPayload {
                name: "Grow bag XL".into(),
                description: "Bigger".into(),
                category: Category::Containers,
                price: 399,
                sku: None,
                specifications: None,
                featured: false,
                tags: None,
                images: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.price, 399);
        assert_eq!(updated.stock, 7);
    }

    #[tokio::test]
    async fn stock_adjustments_respect_the_floor() {
        let state = test_state().await;
        let (_, admin) = login_as(&state, Role::Admin).await;
        let id = seed_product(&state, "Grow bag", 299, 5).await;

        adjust_stock(&state, &admin, &id, 10, Some("restock")).await.unwrap();
        assert_eq!(stock_of(&state, &id).await, 15);

        adjust_stock(&state, &admin, &id, -15, Some("damaged")).await.unwrap();
        assert_eq!(stock_of(&state, &id).await, 0);

        let err = adjust_stock(&state, &admin, &id, -1, None).await.unwrap_err();
        assert_eq!(err.kind(), "insufficient_stock");
        assert_eq!(stock_of(&state, &id).await, 0);
    }

    #[tokio::test]
    async fn low_stock_uses_the_threshold() {
        let state = test_state().await;
        let (_, admin) = login_as(&state, Role::Admin).await;
        seed_product(&state, "Plenty", 100, 50).await;
        seed_product(&state, "Scarce", 100, 10).await;
        seed_product(&state, "Gone", 100, 0).await;

        let low = low_stock_products(&state, &admin).await.unwrap();
        let names: Vec<_> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Gone", "Scarce"]);
    }

    #[tokio::test]
    async fn admin_only_writes() {
        let state = test_state().await;
        let (_, customer) = login_as(&state, Role::Customer).await;

        let err = create_product(&state, &customer, payload("Grow bag", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "forbidden");

        let err = low_stock_products(&state, &customer).await.unwrap_err();
        assert_eq!(err.kind(), "forbidden");
    }
}
