use std::collections::HashMap;

use async_trait::async_trait;
use common::{OrderId, OrderStatus, ProductId};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};

use crate::{
    ChangePlan, Charges, NewOrder, Order, OrderItem, Result, ShippingAddress, ShippingDetails,
    ShippingWrite, StatusWrite, StoreError, store::OrderStore,
};

const ORDER_COLUMNS: &str = r#"
    id, status, total, discount, tax, delivery_charge, extra_delivery_charge, net_total,
    recipient_name, street, city, state, zip, country, phone, email,
    payment_method, payment_info,
    shipping_method, shipping_terms, shipment_date, delivery_date,
    coupon_code, created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, order_id, product_id, quantity, price, selected_color, selected_size,
    created_at, updated_at
"#;

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status
            .parse()
            .map_err(|e: common::ParseStatusError| StoreError::Decode(e.to_string()))?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            status,
            charges: Charges {
                total: row.try_get("total")?,
                discount: row.try_get("discount")?,
                tax: row.try_get("tax")?,
                delivery_charge: row.try_get("delivery_charge")?,
                extra_delivery_charge: row.try_get("extra_delivery_charge")?,
                net_total: row.try_get("net_total")?,
            },
            address: ShippingAddress {
                recipient_name: row.try_get("recipient_name")?,
                street: row.try_get("street")?,
                city: row.try_get("city")?,
                state: row.try_get("state")?,
                zip: row.try_get("zip")?,
                country: row.try_get("country")?,
                phone: row.try_get("phone")?,
                email: row.try_get("email")?,
            },
            payment_method: row.try_get("payment_method")?,
            payment_info: row.try_get("payment_info")?,
            shipping: ShippingDetails {
                shipping_method: row.try_get("shipping_method")?,
                shipping_terms: row.try_get("shipping_terms")?,
                shipment_date: row.try_get("shipment_date")?,
                delivery_date: row.try_get("delivery_date")?,
            },
            coupon_code: row.try_get("coupon_code")?,
            items,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: row.try_get("id")?,
            product_id: row.try_get::<Option<i64>, _>("product_id")?.map(ProductId::new),
            quantity: row.try_get("quantity")?,
            price: row.try_get("price")?,
            selected_color: row.try_get("selected_color")?,
            selected_size: row.try_get("selected_size")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Loads one order with its items on the given connection.
    async fn fetch_order(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&mut *conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id ASC"
        ))
        .bind(id.as_i64())
        .fetch_all(&mut *conn)
        .await?;

        let items = item_rows
            .iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        Self::row_to_order(&row, items).map(Some)
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_order(&self, new: NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (
                status, total, discount, tax, delivery_charge, extra_delivery_charge, net_total,
                recipient_name, street, city, state, zip, country, phone, email,
                payment_method, payment_info, coupon_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING id
            "#,
        )
        .bind(OrderStatus::Pending.as_str())
        .bind(new.charges.total)
        .bind(new.charges.discount)
        .bind(new.charges.tax)
        .bind(new.charges.delivery_charge)
        .bind(new.charges.extra_delivery_charge)
        .bind(new.charges.net_total)
        .bind(&new.address.recipient_name)
        .bind(&new.address.street)
        .bind(&new.address.city)
        .bind(&new.address.state)
        .bind(&new.address.zip)
        .bind(&new.address.country)
        .bind(&new.address.phone)
        .bind(&new.address.email)
        .bind(&new.payment_method)
        .bind(&new.payment_info)
        .bind(&new.coupon_code)
        .fetch_one(&mut *tx)
        .await?;

        for item in &new.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price, selected_color, selected_size)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id.as_i64())
            .bind(item.quantity)
            .bind(item.price)
            .bind(&item.selected_color)
            .bind(&item.selected_size)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                // A dangling product reference violates the foreign key
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return StoreError::product_not_found(item.product_id);
                }
                StoreError::Database(e)
            })?;
        }

        let order = Self::fetch_order(&mut tx, OrderId::new(order_id))
            .await?
            .ok_or_else(|| StoreError::order_not_found(order_id))?;

        tx.commit()
            .await
            .map_err(|err| StoreError::commit_failed(err.into()))?;
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_order(&mut conn, id).await
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        // Both reads see one snapshot, so every listed order has its items.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&mut *tx)
        .await?;

        let order_ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let item_rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) \
             ORDER BY order_id ASC, id ASC"
        ))
        .bind(&order_ids)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let mut items_by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for row in &item_rows {
            let order_id: i64 = row.try_get("order_id")?;
            items_by_order
                .entry(order_id)
                .or_default()
                .push(Self::row_to_item(row)?);
        }

        rows.iter()
            .map(|row| {
                let id: i64 = row.try_get("id")?;
                let items = items_by_order.remove(&id).unwrap_or_default();
                Self::row_to_order(row, items)
            })
            .collect()
    }

    async fn update_status(
        &self,
        id: OrderId,
        write: StatusWrite,
        plan: ChangePlan<'_>,
    ) -> Result<Order> {
        // Start a transaction; dropping it without commit rolls back
        let mut tx = self.pool.begin().await?;

        let current = Self::fetch_order(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::order_not_found(id))?;

        for adjustment in plan(&current)? {
            let result = sqlx::query(
                "UPDATE products SET stock = stock - $1, updated_at = NOW() WHERE id = $2",
            )
            .bind(adjustment.amount)
            .bind(adjustment.product_id.as_i64())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(StoreError::product_not_found(adjustment.product_id));
            }
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $1,
                payment_method = COALESCE($2, payment_method),
                payment_info = $3,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(write.status.as_str())
        .bind(&write.payment_method)
        .bind(&write.payment_info)
        .bind(id.as_i64())
        .execute(&mut *tx)
        .await?;

        let order = Self::fetch_order(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::order_not_found(id))?;

        tx.commit()
            .await
            .map_err(|err| StoreError::commit_failed(err.into()))?;
        Ok(order)
    }

    async fn update_shipping(&self, id: OrderId, write: ShippingWrite) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET shipping_method = $1,
                shipping_terms = $2,
                shipment_date = $3,
                delivery_date = $4,
                updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&write.shipping_method)
        .bind(&write.shipping_terms)
        .bind(write.shipment_date)
        .bind(write.delivery_date)
        .bind(id.as_i64())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::order_not_found(id));
        }

        let order = Self::fetch_order(&mut tx, id)
            .await?
            .ok_or_else(|| StoreError::order_not_found(id))?;

        tx.commit()
            .await
            .map_err(|err| StoreError::commit_failed(err.into()))?;
        Ok(order)
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        // Items go with the order through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::order_not_found(id));
        }
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        // The pool replaces broken connections on demand; a ping forces one
        // to be established before the next attempt.
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
