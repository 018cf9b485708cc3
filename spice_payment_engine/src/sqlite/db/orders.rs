use log::{debug, trace};
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderNsu, PaymentConfirmation},
    traits::OrderStoreError,
};

/// Inserts the order into the database, returning `false` in the second parameter if the order already exists.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), OrderStoreError> {
    let inserted = match fetch_order_by_nsu(&order.order_nsu, conn).await? {
        Some(order) => (order, false),
        None => {
            let order = insert_order(order, conn).await?;
            debug!("🗃️ Order [{}] inserted with id {}", order.order_nsu, order.id);
            (order, true)
        },
    };
    Ok(inserted)
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    if !order.status.is_pending() {
        return Err(OrderStoreError::InvalidOrder(format!(
            "Order {} must be created in a pending status, not {}",
            order.order_nsu, order.status
        )));
    }
    if order.total_amount.value() < 0 {
        return Err(OrderStoreError::InvalidOrder(format!("Order {} has a negative total", order.order_nsu)));
    }
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_nsu,
                customer_name,
                customer_email,
                customer_phone,
                items,
                total_amount,
                payment_method,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *;
        "#,
    )
    .bind(order.order_nsu)
    .bind(order.customer_name)
    .bind(order.customer_email)
    .bind(order.customer_phone)
    .bind(Json(order.items))
    .bind(order.total_amount.value())
    .bind(order.payment_method)
    .bind(order.status)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_nsu(
    order_nsu: &OrderNsu,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_nsu = $1").bind(order_nsu.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches all orders in one of the pending statuses, ordered by `created_at` in descending order.
pub async fn fetch_pending_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
        SELECT * FROM orders
        WHERE status IN ('pending', 'pending_pix', 'pending_boleto')
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} pending orders fetched", orders.len());
    Ok(orders)
}

/// The compare-and-set that moves an order to `paid`.
///
/// The pending-status predicate and the write happen in one statement, so concurrent callers cannot both succeed.
/// `transaction_ref` is only overwritten when the confirmation carries one.
pub async fn confirm_if_pending(
    order_nsu: &OrderNsu,
    confirmation: &PaymentConfirmation,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET
            status = 'paid',
            paid_amount = $1,
            confirmation_mode = $2,
            confirmation_source = $3,
            transaction_ref = COALESCE($4, transaction_ref),
            payment_method = COALESCE($5, payment_method),
            updated_at = CURRENT_TIMESTAMP
        WHERE order_nsu = $6 AND status IN ('pending', 'pending_pix', 'pending_boleto')
        RETURNING *;
        "#,
    )
    .bind(confirmation.amount.value())
    .bind(confirmation.mode)
    .bind(confirmation.source.as_str())
    .bind(confirmation.transaction_ref.as_deref())
    .bind(confirmation.payment_method)
    .bind(order_nsu.as_str())
    .fetch_optional(conn)
    .await?;
    match &order {
        Some(o) => trace!("🗃️ Order {} marked as paid via {}", o.order_nsu, confirmation.source),
        None => trace!("🗃️ No pending order {order_nsu} to confirm"),
    }
    Ok(order)
}
