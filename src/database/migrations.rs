use sqlx::SqlitePool;

/// Run all database migrations (CREATE TABLE IF NOT EXISTS + indexes).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // ═══════════════════════════════════════
    // TABLE: users
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id            TEXT     PRIMARY KEY,
            name          TEXT     NOT NULL,
            email         TEXT     NOT NULL UNIQUE,
            password_hash TEXT     NOT NULL,
            role          TEXT     NOT NULL DEFAULT 'customer'
                          CHECK(role IN ('customer', 'admin')),
            phone         TEXT,
            created_at    DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: products
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id             TEXT     PRIMARY KEY,
            name           TEXT     NOT NULL,
            description    TEXT     NOT NULL,
            category       TEXT     NOT NULL CHECK(category IN (
                               'containers', 'growing-media', 'irrigation-tech',
                               'vertical-gardening', 'pest-management', 'monitoring-tools')),
            price          INTEGER  NOT NULL CHECK(price >= 0),
            stock          INTEGER  NOT NULL DEFAULT 0 CHECK(stock >= 0),
            sku            TEXT,
            specifications TEXT,
            featured       INTEGER  NOT NULL DEFAULT 0,
            tags           TEXT,
            images         TEXT,
            created_at     DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at     DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    // SKU is unique only where present
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_products_sku
         ON products(sku) WHERE sku IS NOT NULL",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_featured ON products(featured)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: bookings
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS bookings (
            id                  TEXT     PRIMARY KEY,
            user_id             TEXT     NOT NULL REFERENCES users(id),
            rooftop_size_sq_ft  INTEGER  NOT NULL CHECK(rooftop_size_sq_ft > 0),
            system_type         TEXT     NOT NULL CHECK(system_type IN ('soil', 'hydro')),
            address             TEXT     NOT NULL,
            city                TEXT     NOT NULL,
            state               TEXT     NOT NULL,
            pincode             TEXT     NOT NULL,
            estimated_price_inr INTEGER  NOT NULL CHECK(estimated_price_inr >= 0),
            video               TEXT,
            images              TEXT,
            status              TEXT     NOT NULL DEFAULT 'pending'
                                CHECK(status IN ('pending', 'approved', 'designing',
                                                 'installation', 'maintenance',
                                                 'completed', 'rejected')),
            site_visit_date     TEXT,
            assigned_staff_id   TEXT     REFERENCES users(id) ON DELETE SET NULL,
            notes               TEXT,
            created_at          DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at          DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: maintenance_visits
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS maintenance_visits (
            id                INTEGER  PRIMARY KEY AUTOINCREMENT,
            booking_id        TEXT     NOT NULL REFERENCES bookings(id) ON DELETE CASCADE,
            seq               INTEGER  NOT NULL,
            date              TEXT     NOT NULL,
            completed         INTEGER  NOT NULL DEFAULT 0,
            notes             TEXT,
            staff_assigned_id TEXT     REFERENCES users(id) ON DELETE SET NULL,
            UNIQUE(booking_id, seq)
        )",
    )
    .execute(pool)
    .await?;

    // ═══════════════════════════════════════
    // TABLE: orders
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id             TEXT     PRIMARY KEY,
            user_id        TEXT     NOT NULL REFERENCES users(id),
            subtotal       INTEGER  NOT NULL CHECK(subtotal >= 0),
            address        TEXT     NOT NULL,
            city           TEXT     NOT NULL,
            state          TEXT     NOT NULL,
            pincode        TEXT     NOT NULL,
            status         TEXT     NOT NULL DEFAULT 'pending'
                           CHECK(status IN ('pending', 'confirmed', 'paid',
                                            'ready_to_ship', 'shipped',
                                            'delivered', 'cancelled')),
            payment_method TEXT     NOT NULL DEFAULT 'cod',
            created_at     DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at     DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: order_items
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS order_items (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            order_id   TEXT    NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            product_id TEXT    NOT NULL,
            name       TEXT    NOT NULL,
            price      INTEGER NOT NULL CHECK(price >= 0),
            quantity   INTEGER NOT NULL CHECK(quantity >= 1)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id)")
        .execute(pool)
        .await?;

    // ═══════════════════════════════════════
    // TABLE: activity_logs
    // ═══════════════════════════════════════
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS activity_logs (
            id          INTEGER  PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT     REFERENCES users(id) ON DELETE SET NULL,
            action      TEXT     NOT NULL,
            description TEXT     NOT NULL,
            metadata    TEXT,
            created_at  DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_activity_logs_created ON activity_logs(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}
