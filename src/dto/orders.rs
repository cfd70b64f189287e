use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Order;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: Uuid,
    /// Defaults to 1; anything non-numeric or below 1 is coerced, not
    /// rejected.
    #[serde(default = "default_quantity", deserialize_with = "coerce_quantity")]
    #[schema(value_type = i32)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub order_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderHistoryQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order: Order,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
}

fn default_quantity() -> i32 {
    1
}

fn coerce_quantity<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(quantity_from_value(value.as_ref()))
}

/// Floor at 1: numbers truncate, numeric strings parse, anything else falls
/// back to a single unit.
fn quantity_from_value(value: Option<&Value>) -> i32 {
    let raw = match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(1),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(1),
        _ => 1,
    };
    raw.clamp(1, i32::MAX as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> OrderItemInput {
        serde_json::from_value(value).expect("item should deserialize")
    }

    #[test]
    fn quantity_defaults_to_one_when_absent() {
        let item = parse(json!({ "productId": Uuid::new_v4() }));
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn quantity_is_floored_at_one() {
        let id = Uuid::new_v4();
        assert_eq!(parse(json!({ "productId": id, "quantity": 0 })).quantity, 1);
        assert_eq!(parse(json!({ "productId": id, "quantity": -4 })).quantity, 1);
    }

    #[test]
    fn non_numeric_quantity_is_coerced() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse(json!({ "productId": id, "quantity": null })).quantity,
            1
        );
        assert_eq!(
            parse(json!({ "productId": id, "quantity": "abc" })).quantity,
            1
        );
        assert_eq!(
            parse(json!({ "productId": id, "quantity": "3" })).quantity,
            3
        );
        assert_eq!(
            parse(json!({ "productId": id, "quantity": 2.9 })).quantity,
            2
        );
    }
}
