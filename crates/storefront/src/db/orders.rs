//! Order repository.
//!
//! Two implementations sit behind [`OrderRepository`]: [`PgOrderRepository`]
//! writes to `storefront.order`/`storefront.order_line`, and
//! [`InMemoryOrderRepository`] keeps orders for the life of the process.
//! Queries are checked at runtime (`sqlx::query`), so building the crate
//! never needs a live database.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use spicehub_core::checkout::{OrderNumber, ShippingAddress};
use spicehub_core::{CartLine, OrderId, OrderStatus, OrderTotals, PlacedOrder, ShippingMethod};

use super::RepositoryError;

/// An order as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOrder {
    pub id: OrderId,
    pub status: OrderStatus,
    pub order: PlacedOrder,
}

/// Persistence for placed orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Store a newly placed order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number is taken.
    async fn insert(&self, order: &PlacedOrder) -> Result<OrderId, RepositoryError>;

    /// Look an order up by its customer-facing number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails or the stored row is invalid.
    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<StoredOrder>, RepositoryError>;
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// `PostgreSQL`-backed order repository.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: &PlacedOrder) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let address = &order.shipping_address;

        let row = sqlx::query(
            r"
            INSERT INTO storefront.order (
                order_number, placed_at, email, phone,
                first_name, last_name, address, apartment,
                city, province, postal_code, country,
                shipping_method, subtotal, shipping, tax, total,
                notes, payment_method, card_last_four
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING id
            ",
        )
        .bind(order.number.as_str())
        .bind(order.placed_at)
        .bind(&order.email)
        .bind(order.phone.as_deref())
        .bind(&address.first_name)
        .bind(&address.last_name)
        .bind(&address.address)
        .bind(address.apartment.as_deref())
        .bind(&address.city)
        .bind(&address.province)
        .bind(&address.postal_code)
        .bind(&address.country)
        .bind(order.shipping_method.id())
        .bind(order.totals.subtotal)
        .bind(order.totals.shipping)
        .bind(order.totals.tax)
        .bind(order.totals.total)
        .bind(order.notes.as_deref())
        .bind(&order.payment_method)
        .bind(order.card_last_four.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, &order.number))?;

        let id: i32 = row.try_get("id")?;

        for (position, line) in order.lines.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| RepositoryError::DataCorruption("too many order lines".to_string()))?;
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!("quantity out of range for {}", line.id))
            })?;

            sqlx::query(
                r"
                INSERT INTO storefront.order_line (
                    order_id, position, product_id, name, unit_price,
                    original_price, quantity, image, weight
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(id)
            .bind(position)
            .bind(line.id.as_str())
            .bind(&line.name)
            .bind(line.price)
            .bind(line.original_price)
            .bind(quantity)
            .bind(&line.image)
            .bind(line.weight.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = id, order_number = %order.number, "Order stored");
        Ok(OrderId::new(id))
    }

    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<StoredOrder>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, order_number, status, placed_at, email, phone,
                   first_name, last_name, address, apartment,
                   city, province, postal_code, country,
                   shipping_method, subtotal, shipping, tax, total,
                   notes, payment_method, card_last_four
            FROM storefront.order
            WHERE order_number = $1
            ",
        )
        .bind(number.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let id: i32 = row.try_get("id")?;
        let line_rows = sqlx::query(
            r"
            SELECT product_id, name, unit_price, original_price, quantity, image, weight
            FROM storefront.order_line
            WHERE order_id = $1
            ORDER BY position
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let lines = line_rows
            .iter()
            .map(line_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(StoredOrder {
            id: OrderId::new(id),
            status: row.try_get("status")?,
            order: order_from_row(&row, lines)?,
        }))
    }
}

fn map_insert_error(err: sqlx::Error, number: &OrderNumber) -> RepositoryError {
    if matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation()) {
        RepositoryError::Conflict(format!("order number {number} already exists"))
    } else {
        RepositoryError::Database(err)
    }
}

fn order_from_row(row: &PgRow, lines: Vec<CartLine>) -> Result<PlacedOrder, RepositoryError> {
    let shipping_id: String = row.try_get("shipping_method")?;
    let shipping_method = shipping_id.parse::<ShippingMethod>().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid shipping method in database: {e}"))
    })?;
    let placed_at: DateTime<Utc> = row.try_get("placed_at")?;
    let order_number: String = row.try_get("order_number")?;

    Ok(PlacedOrder {
        number: OrderNumber::from(order_number),
        placed_at,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        shipping_address: ShippingAddress {
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            address: row.try_get("address")?,
            apartment: row.try_get("apartment")?,
            city: row.try_get("city")?,
            province: row.try_get("province")?,
            postal_code: row.try_get("postal_code")?,
            country: row.try_get("country")?,
        },
        shipping_method,
        lines,
        totals: OrderTotals {
            subtotal: row.try_get("subtotal")?,
            shipping: row.try_get("shipping")?,
            tax: row.try_get("tax")?,
            total: row.try_get("total")?,
        },
        notes: row.try_get("notes")?,
        payment_method: row.try_get("payment_method")?,
        card_last_four: row.try_get("card_last_four")?,
    })
}

fn line_from_row(row: &PgRow) -> Result<CartLine, RepositoryError> {
    let product_id: String = row.try_get("product_id")?;
    let quantity: i32 = row.try_get("quantity")?;
    let quantity = u32::try_from(quantity).map_err(|_| {
        RepositoryError::DataCorruption(format!("negative quantity for {product_id}"))
    })?;
    let original_price: Option<Decimal> = row.try_get("original_price")?;

    Ok(CartLine {
        id: product_id.into(),
        name: row.try_get("name")?,
        price: row.try_get("unit_price")?,
        original_price,
        quantity,
        image: row.try_get("image")?,
        weight: row.try_get("weight")?,
    })
}

// =============================================================================
// In-memory
// =============================================================================

/// Process-local order repository, used when no database is configured.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<StoredOrder>>,
}

impl InMemoryOrderRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &PlacedOrder) -> Result<OrderId, RepositoryError> {
        let mut orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);

        if orders.iter().any(|stored| stored.order.number == order.number) {
            return Err(RepositoryError::Conflict(format!(
                "order number {} already exists",
                order.number
            )));
        }

        let next = i32::try_from(orders.len() + 1)
            .map_err(|_| RepositoryError::Conflict("order table is full".to_string()))?;
        let id = OrderId::new(next);
        orders.push(StoredOrder {
            id,
            status: OrderStatus::Placed,
            order: order.clone(),
        });
        drop(orders);

        tracing::info!(order_id = next, order_number = %order.number, "Order stored in memory");
        Ok(id)
    }

    async fn find_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<StoredOrder>, RepositoryError> {
        let orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(orders
            .iter()
            .find(|stored| &stored.order.number == number)
            .cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use spicehub_core::{CartStore, Checkout, MemoryStorage};

    use super::*;

    fn placed_order(millis: i64) -> PlacedOrder {
        let mut cart = CartStore::new(MemoryStorage::new());
        cart.add_to_cart(
            CartLine::new("masala1", "Garam Masala", Decimal::new(1299, 2), "/img/masala.jpg")
                .with_quantity(3),
        );
        let mut checkout = Checkout::begin(&cart).unwrap();
        checkout.set_field("email", "priya@spicehub.ca").unwrap();
        checkout.advance().unwrap();
        checkout.advance().unwrap();

        let placed_at = Utc.timestamp_millis_opt(millis).single().unwrap();
        checkout.place_order(&mut cart, placed_at).unwrap().clone()
    }

    #[tokio::test]
    async fn test_in_memory_insert_and_find() {
        let repo = InMemoryOrderRepository::new();
        let order = placed_order(1_718_000_123_456);

        let id = repo.insert(&order).await.unwrap();
        assert_eq!(id, OrderId::new(1));
        assert_eq!(repo.len(), 1);

        let stored = repo.find_by_number(&order.number).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Placed);
        assert_eq!(stored.order, order);
    }

    #[tokio::test]
    async fn test_in_memory_rejects_duplicate_number() {
        let repo = InMemoryOrderRepository::new();
        let order = placed_order(1_718_000_123_456);

        repo.insert(&order).await.unwrap();
        let err = repo.insert(&order).await.unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_find_missing() {
        let repo = InMemoryOrderRepository::new();
        let missing = OrderNumber::from("SPH-00000000".to_string());
        assert!(repo.find_by_number(&missing).await.unwrap().is_none());
        assert!(repo.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires PostgreSQL (DATABASE_URL)"]
    async fn test_pg_round_trip_keeps_exact_totals(pool: PgPool) {
        let repo = PgOrderRepository::new(pool);
        let order = placed_order(1_718_000_654_321);
        // 38.97 * 0.13 carries four decimal places.
        assert_eq!(order.totals.tax, Decimal::new(50661, 4));

        let id = repo.insert(&order).await.unwrap();
        let stored = repo.find_by_number(&order.number).await.unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.order.totals, order.totals);
        assert_eq!(stored.order, order);
    }
}
