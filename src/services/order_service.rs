use std::collections::HashMap;

use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::orders::{CreateOrderRequest, OrderItemInput},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProductCol, Entity as Products, Model as ProductModel},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    models::{Order, OrderItem, ProductSummary, UserSummary},
    services::normalize_email,
    state::AppState,
};

const SHIPPING_MIN_DAYS: i32 = 2;
const SHIPPING_MAX_DAYS: i32 = 3;
const INITIAL_STATUS: &str = "PENDING";
const GUEST_NAME: &str = "Guest";

// Bounded retry for server-generated order numbers; a collision rolls the
// whole transaction back and a fresh number is tried.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

const EMPTY_ORDER: &str = "Order contains no items";
const INVALID_ITEMS: &str = "Order items are not valid";
const UNAVAILABLE_ITEMS: &str = "One or more items are no longer available";

/// One normalized order line with name and price captured from the current
/// product row, never from the client.
#[derive(Debug)]
struct LineItem {
    product_id: Uuid,
    product_name: String,
    quantity: i32,
    price: i64,
    subtotal: i64,
}

/// Everything about the order row that is fixed before the insert attempt;
/// the order number may vary between retries.
#[derive(Debug)]
struct OrderDraft {
    customer_name: String,
    customer_email: String,
    user_id: Option<Uuid>,
    total: i64,
    item_count: i32,
}

pub async fn create_order(state: &AppState, payload: CreateOrderRequest) -> AppResult<Order> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest(EMPTY_ORDER.to_string()));
    }

    let product_ids = referenced_product_ids(&payload.items);
    if product_ids.is_empty() {
        return Err(AppError::BadRequest(INVALID_ITEMS.to_string()));
    }

    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProductCol::Id.is_in(product_ids.iter().copied()))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    // All-or-nothing: one missing product rejects the whole order.
    if products.len() != product_ids.len() {
        return Err(AppError::BadRequest(UNAVAILABLE_ITEMS.to_string()));
    }

    let lines = build_line_items(&payload.items, &products)?;
    let (total, item_count) = order_totals(&lines);

    let customer_email = payload
        .customer_email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| normalize_email(&state.config.guest_email));

    let existing_user = Users::find()
        .filter(UserCol::Email.eq(customer_email.as_str()))
        .one(&state.orm)
        .await?;

    let customer_name = payload
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| existing_user.as_ref().map(|u| u.name.clone()))
        .unwrap_or_else(|| GUEST_NAME.to_string());

    let client_number = payload
        .order_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_uppercase);

    let draft = OrderDraft {
        customer_name,
        customer_email,
        user_id: existing_user.as_ref().map(|u| u.id),
        total,
        item_count,
    };

    let mut attempts = 0;
    let order_id = loop {
        let order_number = client_number
            .clone()
            .unwrap_or_else(generate_order_number);

        let txn = state.orm.begin().await?;
        match insert_order(&txn, &order_number, &draft, &lines).await {
            Ok(id) => {
                txn.commit().await?;
                break id;
            }
            Err(err) => {
                // A failed statement poisons the transaction; roll back
                // before deciding whether to retry.
                txn.rollback().await.ok();
                if is_order_number_conflict(&err) {
                    if client_number.is_some() {
                        return Err(AppError::Conflict(
                            "Order number already exists".to_string(),
                        ));
                    }
                    attempts += 1;
                    if attempts < ORDER_NUMBER_ATTEMPTS {
                        continue;
                    }
                }
                return Err(err.into());
            }
        }
    };

    let order = load_order(&state.orm, order_id).await?;
    order.ok_or_else(|| AppError::Internal(anyhow::anyhow!("created order not found")))
}

pub async fn list_orders_by_email(state: &AppState, customer_email: &str) -> AppResult<Vec<Order>> {
    let orders = Orders::find()
        .filter(OrderCol::CustomerEmail.eq(customer_email))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    hydrate_orders(&state.orm, orders).await
}

/// Re-fetch a persisted order with its items, product summaries and linked
/// user, as returned on the wire.
pub async fn load_order(orm: &OrmConn, id: Uuid) -> AppResult<Option<Order>> {
    let order = Orders::find_by_id(id).one(orm).await?;
    let Some(order) = order else {
        return Ok(None);
    };
    let mut hydrated = hydrate_orders(orm, vec![order]).await?;
    Ok(hydrated.pop())
}

fn referenced_product_ids(items: &[OrderItemInput]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = Vec::new();
    for item in items {
        if item.product_id.is_nil() {
            continue;
        }
        if !ids.contains(&item.product_id) {
            ids.push(item.product_id);
        }
    }
    ids
}

fn build_line_items(
    items: &[OrderItemInput],
    products: &HashMap<Uuid, ProductModel>,
) -> AppResult<Vec<LineItem>> {
    items
        .iter()
        .map(|item| {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| AppError::BadRequest(UNAVAILABLE_ITEMS.to_string()))?;
            let quantity = item.quantity.max(1);
            Ok(LineItem {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity,
                price: product.price,
                subtotal: product.price * quantity as i64,
            })
        })
        .collect()
}

fn order_totals(lines: &[LineItem]) -> (i64, i32) {
    let total = lines.iter().map(|l| l.subtotal).sum();
    let item_count = lines.iter().map(|l| l.quantity).sum();
    (total, item_count)
}

/// Current time plus a random suffix. Uniqueness is only astronomically
/// likely; the unique constraint on `orders.order_number` is what actually
/// enforces it.
fn generate_order_number() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}

fn is_order_number_conflict(err: &DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(msg)) if msg.contains("order_number")
    )
}

async fn insert_order(
    txn: &DatabaseTransaction,
    order_number: &str,
    draft: &OrderDraft,
    lines: &[LineItem],
) -> Result<Uuid, DbErr> {
    let estimated_delivery = Utc::now() + Duration::days(SHIPPING_MAX_DAYS as i64);

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number.to_string()),
        customer_name: Set(draft.customer_name.clone()),
        customer_email: Set(draft.customer_email.clone()),
        user_id: Set(draft.user_id),
        total: Set(draft.total),
        item_count: Set(draft.item_count),
        status: Set(INITIAL_STATUS.to_string()),
        shipping_min_days: Set(SHIPPING_MIN_DAYS),
        shipping_max_days: Set(SHIPPING_MAX_DAYS),
        estimated_delivery: Set(estimated_delivery.into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(txn)
    .await?;

    for line in lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            product_name: Set(line.product_name.clone()),
            quantity: Set(line.quantity),
            price: Set(line.price),
            subtotal: Set(line.subtotal),
            created_at: NotSet,
        }
        .insert(txn)
        .await?;
    }

    Ok(order.id)
}

async fn hydrate_orders(orm: &OrmConn, orders: Vec<OrderModel>) -> AppResult<Vec<Order>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(orm)
        .await?;

    let product_ids: Vec<Uuid> = {
        let mut ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        ids.sort();
        ids.dedup();
        ids
    };
    let products: HashMap<Uuid, ProductSummary> = Products::find()
        .filter(ProductCol::Id.is_in(product_ids))
        .all(orm)
        .await?
        .into_iter()
        .map(|p| {
            (
                p.id,
                ProductSummary {
                    id: p.id,
                    name: p.name,
                    image: p.image,
                },
            )
        })
        .collect();

    let user_ids: Vec<Uuid> = {
        let mut ids: Vec<Uuid> = orders.iter().filter_map(|o| o.user_id).collect();
        ids.sort();
        ids.dedup();
        ids
    };
    let users: HashMap<Uuid, UserModel> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(order_item_from_entity(item, &products));
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            let user = order.user_id.and_then(|id| {
                users.get(&id).map(|u| UserSummary {
                    id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                })
            });
            order_from_entity(order, user, items)
        })
        .collect())
}

fn order_from_entity(model: OrderModel, user: Option<UserSummary>, items: Vec<OrderItem>) -> Order {
    Order {
        id: model.id,
        order_number: model.order_number,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        user_id: model.user_id,
        total: model.total,
        item_count: model.item_count,
        status: model.status,
        shipping_min_days: model.shipping_min_days,
        shipping_max_days: model.shipping_max_days,
        estimated_delivery: model.estimated_delivery.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        user,
        items,
    }
}

fn order_item_from_entity(
    model: OrderItemModel,
    products: &HashMap<Uuid, ProductSummary>,
) -> OrderItem {
    let product = products.get(&model.product_id).map(|p| ProductSummary {
        id: p.id,
        name: p.name.clone(),
        image: p.image.clone(),
    });
    OrderItem {
        id: model.id,
        product_id: model.product_id,
        product_name: model.product_name,
        quantity: model.quantity,
        price: model.price,
        subtotal: model.subtotal,
        product,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: Uuid, name: &str, price: i64) -> ProductModel {
        let now = Utc::now();
        ProductModel {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: String::new(),
            price,
            original_price: None,
            image: "/placeholder.png".to_string(),
            is_offer: false,
            in_stock: true,
            category_id: Uuid::new_v4(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn input(product_id: Uuid, quantity: i32) -> OrderItemInput {
        serde_json::from_value(serde_json::json!({
            "productId": product_id,
            "quantity": quantity,
        }))
        .expect("item input")
    }

    #[test]
    fn totals_sum_subtotals_and_quantities() {
        let id = Uuid::new_v4();
        let mut products = HashMap::new();
        products.insert(id, product(id, "Resistor Kit", 100));

        let lines = build_line_items(&[input(id, 2)], &products).expect("lines");
        let (total, item_count) = order_totals(&lines);

        assert_eq!(total, 200);
        assert_eq!(item_count, 2);
        assert_eq!(lines[0].subtotal, 200);
    }

    #[test]
    fn line_price_comes_from_the_product_row() {
        let id = Uuid::new_v4();
        let mut products = HashMap::new();
        products.insert(id, product(id, "Multimeter", 850));

        let lines = build_line_items(&[input(id, 1)], &products).expect("lines");
        assert_eq!(lines[0].price, 850);
        assert_eq!(lines[0].product_name, "Multimeter");
    }

    #[test]
    fn duplicate_product_ids_stay_separate_lines() {
        let id = Uuid::new_v4();
        let mut products = HashMap::new();
        products.insert(id, product(id, "Capacitor Set", 45));

        let lines = build_line_items(&[input(id, 1), input(id, 3)], &products).expect("lines");
        let (total, item_count) = order_totals(&lines);

        assert_eq!(lines.len(), 2);
        assert_eq!(total, 45 * 4);
        assert_eq!(item_count, 4);
    }

    #[test]
    fn missing_product_rejects_the_whole_order() {
        let known = Uuid::new_v4();
        let mut products = HashMap::new();
        products.insert(known, product(known, "Arduino Uno R3", 320));

        let result = build_line_items(&[input(known, 1), input(Uuid::new_v4(), 1)], &products);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn referenced_ids_are_deduplicated_and_nil_filtered() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let items = vec![input(a, 1), input(b, 1), input(a, 2), input(Uuid::nil(), 1)];

        let ids = referenced_product_ids(&items);
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn generated_order_numbers_are_uppercase_with_time_prefix() {
        let number = generate_order_number();
        assert!(number.starts_with("ORD-"));
        assert_eq!(number, number.to_uppercase());

        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 6);
    }
}
