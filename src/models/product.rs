use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Closed catalog category set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Containers,
    GrowingMedia,
    IrrigationTech,
    VerticalGardening,
    PestManagement,
    MonitoringTools,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Containers => "containers",
            Category::GrowingMedia => "growing-media",
            Category::IrrigationTech => "irrigation-tech",
            Category::VerticalGardening => "vertical-gardening",
            Category::PestManagement => "pest-management",
            Category::MonitoringTools => "monitoring-tools",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "containers" => Ok(Category::Containers),
            "growing-media" => Ok(Category::GrowingMedia),
            "irrigation-tech" => Ok(Category::IrrigationTech),
            "vertical-gardening" => Ok(Category::VerticalGardening),
            "pest-management" => Ok(Category::PestManagement),
            "monitoring-tools" => Ok(Category::MonitoringTools),
            other => Err(AppError::Validation(format!("Unknown category '{}'", other))),
        }
    }
}

/// Database row — JSON columns kept as raw text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: i64,
    pub stock: i64,
    pub sku: Option<String>,
    pub specifications: Option<String>,
    pub featured: bool,
    pub tags: Option<String>,
    pub images: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Catalog product as sent to clients. Prices are whole INR.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: i64,
    pub stock: i64,
    pub sku: Option<String>,
    pub specifications: serde_json::Value,
    pub featured: bool,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = AppError;

    fn try_from(row: ProductRow) -> Result<Self, AppError> {
        Ok(Self {
            category: Category::parse(&row.category)?,
            specifications: parse_json_column(row.specifications.as_deref(), serde_json::json!({}))?,
            tags: parse_string_list(row.tags.as_deref())?,
            images: parse_string_list(row.images.as_deref())?,
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            sku: row.sku,
            featured: row.featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_json_column(
    raw: Option<&str>,
    default: serde_json::Value,
) -> Result<serde_json::Value, AppError> {
    match raw {
        None => Ok(default),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| AppError::Internal(format!("corrupt JSON column: {}", e))),
    }
}

fn parse_string_list(raw: Option<&str>) -> Result<Vec<String>, AppError> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| AppError::Internal(format!("corrupt JSON column: {}", e))),
    }
}

/// Payload for creating a catalog product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: i64,
    #[serde(default)]
    pub stock: i64,
    pub sku: Option<String>,
    pub specifications: Option<serde_json::Value>,
    #[serde(default)]
    pub featured: bool,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

/// Payload for updating a catalog product. Stock is deliberately absent:
/// stock moves only through orders and explicit adjustments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: i64,
    pub sku: Option<String>,
    pub specifications: Option<serde_json::Value>,
    pub featured: bool,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

/// Look up one product by id.
pub async fn get_product<'e, E>(executor: E, product_id: &str) -> Result<Option<ProductRow>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(executor)
        .await
}

/// Atomic conditional decrement: succeeds only when the row still holds at
/// least `quantity` units. This is the sole legal way to take stock; a
/// read-modify-write at the application layer would reintroduce the oversell
/// race.
pub async fn decrement_if_available<'e, E>(
    executor: E,
    product_id: &str,
    quantity: i64,
) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let result = sqlx::query(
        "UPDATE products
         SET stock = stock - ?1, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?2 AND stock >= ?1",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Give stock back (compensation path and cancellation restock).
pub async fn increment_stock<'e, E>(
    executor: E,
    product_id: &str,
    quantity: i64,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "UPDATE products
         SET stock = stock + ?1, updated_at = CURRENT_TIMESTAMP
         WHERE id = ?2",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(executor)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trip() {
        for name in [
            "containers",
            "growing-media",
            "irrigation-tech",
            "vertical-gardening",
            "pest-management",
            "monitoring-tools",
        ] {
            assert_eq!(Category::parse(name).unwrap().as_str(), name);
        }
        assert!(Category::parse("furniture").is_err());
    }

    #[test]
    fn row_conversion_defaults_empty_collections() {
        let row = ProductRow {
            id: "p1".into(),
            name: "Grow bag".into(),
            description: "40L fabric grow bag".into(),
            category: "containers".into(),
            price: 299,
            stock: 12,
            sku: None,
            specifications: None,
            featured: false,
            tags: None,
            images: None,
            created_at: None,
            updated_at: None,
        };
        let product = Product::try_from(row).unwrap();
        assert!(product.tags.is_empty());
        assert!(product.images.is_empty());
        assert_eq!(product.specifications, serde_json::json!({}));
    }
}
