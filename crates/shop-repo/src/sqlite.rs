use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use shop_types::domain::cancel_token::CancelToken;
use shop_types::domain::order::{NewOrder, Order, OrderId, OrderLine, OrderStatus, ShippingInfo};
use shop_types::ports::order_repository::{OrderRepository, RepoError};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;

pub struct SqliteRepo {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct DbOrder {
    id: i64,
    email: String,
    status: String,
    created_at: String,
    shipping_name: Option<String>,
    shipping_address: Option<String>,
    shipping_phone: Option<String>,
}

#[derive(FromRow)]
struct DbOrderLine {
    id: i64,
    order_id: i64,
    ean: Option<String>,
    description: String,
    quantity: i64,
    unit_price_cents: i64,
}

#[derive(FromRow)]
struct DbCancelToken {
    id: i64,
    order_id: i64,
    token: String,
    created_at: String,
}

const ORDER_COLUMNS: &str =
    "id, email, status, created_at, shipping_name, shipping_address, shipping_phone";
const LINE_COLUMNS: &str = "id, order_id, ean, description, quantity, unit_price_cents";

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

// Fixed width so that text ordering in SQL matches time ordering.
fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl DbOrder {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, RepoError> {
        let status = OrderStatus::from_str(&self.status).map_err(db_err)?;
        Ok(Order {
            id: self.id,
            email: self.email,
            status,
            created_at: parse_ts(&self.created_at)?,
            shipping: ShippingInfo {
                name: self.shipping_name,
                address: self.shipping_address,
                phone: self.shipping_phone,
            },
            lines,
        })
    }
}

impl DbOrderLine {
    fn into_line(self) -> Result<OrderLine, RepoError> {
        Ok(OrderLine {
            id: self.id,
            order_id: self.order_id,
            ean: self.ean,
            description: self.description,
            quantity: u32::try_from(self.quantity).map_err(db_err)?,
            unit_price_cents: self.unit_price_cents,
        })
    }
}

impl DbCancelToken {
    fn into_token(self) -> Result<CancelToken, RepoError> {
        Ok(CancelToken {
            id: self.id,
            order_id: self.order_id,
            token: self.token,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_shop.sql");
        for statement in ddl.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }
        tracing::debug!(url = database_url, "sqlite schema ready");

        Ok(Self { pool })
    }

    async fn lines_for(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepoError> {
        let rows: Vec<DbOrderLine> = sqlx::query_as(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ? ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbOrderLine::into_line).collect()
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: NewOrder) -> Result<Order, RepoError> {
        let created_at = Utc::now().trunc_subsecs(6);
        let status = OrderStatus::Open;

        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let id = sqlx::query(
            "INSERT INTO orders
                (email, status, created_at, shipping_name, shipping_address, shipping_phone)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.email)
        .bind(status.as_str())
        .bind(format_ts(created_at))
        .bind(&order.shipping.name)
        .bind(&order.shipping.address)
        .bind(&order.shipping.phone)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        let mut lines = Vec::with_capacity(order.lines.len());
        for line in order.lines {
            let line_id = sqlx::query(
                "INSERT INTO order_lines (order_id, ean, description, quantity, unit_price_cents)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&line.ean)
            .bind(&line.description)
            .bind(line.quantity as i64)
            .bind(line.unit_price_cents)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .last_insert_rowid();
            lines.push(OrderLine {
                id: line_id,
                order_id: id,
                ean: line.ean,
                description: line.description,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            });
        }

        tx.commit().await.map_err(db_err)?;

        Ok(Order {
            id,
            email: order.email,
            status,
            created_at,
            shipping: order.shipping,
            lines,
        })
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        match row {
            Some(r) => {
                let lines = self.lines_for(id).await?;
                Ok(Some(r.into_order(lines)?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let line_rows: Vec<DbOrderLine> = sqlx::query_as(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines ORDER BY order_id, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for row in line_rows {
            let line = row.into_line()?;
            by_order.entry(line.order_id).or_default().push(line);
        }

        rows.into_iter()
            .map(|r| {
                let lines = by_order.remove(&r.id).unwrap_or_default();
                r.into_order(lines)
            })
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        let updated = sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: OrderId) -> Result<bool, RepoError> {
        // Lines and tokens go with the order via ON DELETE CASCADE.
        let res = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected() > 0)
    }

    async fn issue_cancel_token(
        &self,
        order_id: OrderId,
        token: String,
    ) -> Result<CancelToken, RepoError> {
        let created_at = Utc::now().trunc_subsecs(6);
        let id = sqlx::query(
            "INSERT INTO cancel_tokens (order_id, token, created_at) VALUES (?, ?, ?)",
        )
        .bind(order_id)
        .bind(&token)
        .bind(format_ts(created_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();
        Ok(CancelToken {
            id,
            order_id,
            token,
            created_at,
        })
    }

    async fn cancel_tokens(&self, order_id: OrderId) -> Result<Vec<CancelToken>, RepoError> {
        let rows: Vec<DbCancelToken> = sqlx::query_as(
            "SELECT id, order_id, token, created_at FROM cancel_tokens
             WHERE order_id = ? ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbCancelToken::into_token).collect()
    }
}

#[cfg(test)]
impl SqliteRepo {
    pub(crate) async fn count_rows(&self, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap();
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_types::domain::order::NewOrderLine;

    async fn repo() -> (tempfile::TempDir, SqliteRepo) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("shop.db").display());
        let repo = SqliteRepo::new(&url).await.unwrap();
        (dir, repo)
    }

    fn line(qty: u32) -> NewOrderLine {
        NewOrderLine {
            ean: None,
            description: "Buch".into(),
            quantity: qty,
            unit_price_cents: 100,
        }
    }

    #[tokio::test]
    async fn failing_line_rolls_back_whole_order() {
        let (_dir, repo) = repo().await;
        // Bypasses NewOrder::new so the second line trips the CHECK constraint.
        let order = NewOrder {
            email: "a@b.com".into(),
            lines: vec![line(1), line(0)],
            shipping: ShippingInfo::default(),
        };
        assert!(repo.create(order).await.is_err());
        assert_eq!(repo.count_rows("orders").await, 0);
        assert_eq!(repo.count_rows("order_lines").await, 0);
    }

    #[tokio::test]
    async fn delete_cascades_to_lines_and_tokens() {
        let (_dir, repo) = repo().await;
        let order = NewOrder {
            email: "a@b.com".into(),
            lines: vec![line(1), line(2)],
            shipping: ShippingInfo::default(),
        };
        let created = repo.create(order).await.unwrap();
        repo.issue_cancel_token(created.id, "tok".into()).await.unwrap();
        assert_eq!(repo.count_rows("order_lines").await, 2);

        assert!(repo.delete(created.id).await.unwrap());
        assert_eq!(repo.count_rows("order_lines").await, 0);
        assert_eq!(repo.count_rows("cancel_tokens").await, 0);
    }

    #[tokio::test]
    async fn token_for_unknown_order_is_rejected() {
        let (_dir, repo) = repo().await;
        assert!(repo.issue_cancel_token(404, "tok".into()).await.is_err());
    }
}
