//! Payload Normalizer
//!
//! Each platform sends a slightly different JSON shape, and the same
//! platform is not even consistent with itself across webhook versions.
//! This module flattens all of them into one `IncomingOrder`. Pure
//! functions, no I/O.

use serde_json::Value;

use super::IngestError;
use crate::db::models::Platform;

/// Platform-neutral view of an incoming order
#[derive(Debug, Clone)]
pub struct IncomingOrder {
    pub platform: Platform,
    pub external_order_id: String,
    pub external_order_number: String,
    pub restaurant_id: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub discount: f64,
    pub total: f64,
    pub estimated_minutes: i64,
    /// Raw body preserved verbatim for audit
    pub raw_payload: String,
    pub lines: Vec<IncomingLine>,
}

#[derive(Debug, Clone)]
pub struct IncomingLine {
    pub external_item_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

/// Normalize a parsed webhook payload. Fails only on a non-object payload
/// or a missing order id / restaurant id; everything else gets a default.
pub fn normalize(
    platform: Platform,
    payload: &Value,
    raw_body: &str,
) -> Result<IncomingOrder, IngestError> {
    if !payload.is_object() {
        return Err(IngestError::BadPayload("payload is not a JSON object".into()));
    }
    match platform {
        Platform::Swiggy => normalize_swiggy(payload, raw_body),
        Platform::Zomato => normalize_zomato(payload, raw_body),
        Platform::Rapido => normalize_rapido(payload, raw_body),
    }
}

fn normalize_swiggy(payload: &Value, raw_body: &str) -> Result<IncomingOrder, IngestError> {
    let external_order_id = str_at(payload, &["order_id", "orderId"])
        .ok_or_else(|| IngestError::BadPayload("missing order id".into()))?;
    let restaurant_id = str_at(payload, &["restaurant_id", "restaurantId"])
        .ok_or_else(|| IngestError::BadPayload("missing restaurant id".into()))?;
    let external_order_number = str_at(payload, &["order_number", "orderNumber"])
        .unwrap_or_else(|| external_order_id.clone());

    let lines = payload
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| IncomingLine {
                    external_item_id: str_at(item, &["id", "item_id"]).unwrap_or_default(),
                    name: str_at(item, &["name", "item_name"])
                        .unwrap_or_else(|| "Unknown Item".into()),
                    quantity: int_at(item, &["quantity"]).unwrap_or(1),
                    price: num_at(item, &["price", "total_price"]).unwrap_or(0.0),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(IncomingOrder {
        platform: Platform::Swiggy,
        external_order_id,
        external_order_number,
        restaurant_id,
        customer_name: str_at(payload, &["customer.name", "customerName"]),
        customer_phone: str_at(payload, &["customer.phone", "customerPhone"]),
        customer_address: str_at(payload, &["delivery_address.full_address", "deliveryAddress"]),
        subtotal: num_at(payload, &["subtotal", "item_total"]).unwrap_or(0.0),
        tax: num_at(payload, &["tax", "taxes.total"]).unwrap_or(0.0),
        delivery_fee: num_at(payload, &["delivery_fee", "delivery_charges"]).unwrap_or(0.0),
        discount: num_at(payload, &["discount"]).unwrap_or(0.0),
        total: num_at(payload, &["total", "order_total"]).unwrap_or(0.0),
        estimated_minutes: int_at(payload, &["estimated_delivery_time"]).unwrap_or(30),
        raw_payload: raw_body.to_string(),
        lines,
    })
}

fn normalize_zomato(payload: &Value, raw_body: &str) -> Result<IncomingOrder, IngestError> {
    let external_order_id = str_at(payload, &["order_id", "id"])
        .ok_or_else(|| IngestError::BadPayload("missing order id".into()))?;
    let restaurant_id = str_at(payload, &["restaurant_id", "res_id"])
        .ok_or_else(|| IngestError::BadPayload("missing restaurant id".into()))?;
    let external_order_number = str_at(payload, &["order_number", "display_id"])
        .unwrap_or_else(|| external_order_id.clone());

    let items = payload
        .get("items")
        .or_else(|| payload.get("order_items"))
        .and_then(Value::as_array);
    let lines = items
        .map(|items| {
            items
                .iter()
                .map(|item| IncomingLine {
                    external_item_id: str_at(item, &["item_id", "id"]).unwrap_or_default(),
                    name: str_at(item, &["name"]).unwrap_or_else(|| "Unknown Item".into()),
                    quantity: int_at(item, &["quantity"]).unwrap_or(1),
                    price: num_at(item, &["price", "total"]).unwrap_or(0.0),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(IncomingOrder {
        platform: Platform::Zomato,
        external_order_id,
        external_order_number,
        restaurant_id,
        customer_name: str_at(payload, &["customer.name"]),
        customer_phone: str_at(payload, &["customer.phone"]),
        customer_address: str_at(payload, &["delivery.address.full_address"]),
        subtotal: num_at(payload, &["order_subtotal", "subtotal"]).unwrap_or(0.0),
        tax: num_at(payload, &["tax"]).unwrap_or(0.0),
        delivery_fee: num_at(payload, &["delivery_charge"]).unwrap_or(0.0),
        discount: num_at(payload, &["discount"]).unwrap_or(0.0),
        total: num_at(payload, &["order_total", "total"]).unwrap_or(0.0),
        estimated_minutes: int_at(payload, &["delivery_time"]).unwrap_or(30),
        raw_payload: raw_body.to_string(),
        lines,
    })
}

fn normalize_rapido(payload: &Value, raw_body: &str) -> Result<IncomingOrder, IngestError> {
    let external_order_id = str_at(payload, &["order_id", "orderId"])
        .ok_or_else(|| IngestError::BadPayload("missing order id".into()))?;
    let restaurant_id = str_at(payload, &["restaurant_id", "merchant_id"])
        .ok_or_else(|| IngestError::BadPayload("missing restaurant id".into()))?;
    let external_order_number = str_at(payload, &["order_number", "orderNumber"])
        .unwrap_or_else(|| external_order_id.clone());

    let lines = payload
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| IncomingLine {
                    external_item_id: str_at(item, &["id", "item_id"]).unwrap_or_default(),
                    name: str_at(item, &["name"]).unwrap_or_else(|| "Unknown Item".into()),
                    quantity: int_at(item, &["quantity"]).unwrap_or(1),
                    price: num_at(item, &["price"]).unwrap_or(0.0),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(IncomingOrder {
        platform: Platform::Rapido,
        external_order_id,
        external_order_number,
        restaurant_id,
        customer_name: str_at(payload, &["customer_name", "customer.name"]),
        customer_phone: str_at(payload, &["customer_phone", "customer.phone"]),
        customer_address: str_at(payload, &["delivery_address", "address"]),
        subtotal: num_at(payload, &["subtotal"]).unwrap_or(0.0),
        tax: num_at(payload, &["tax"]).unwrap_or(0.0),
        delivery_fee: num_at(payload, &["delivery_fee"]).unwrap_or(0.0),
        discount: num_at(payload, &["discount"]).unwrap_or(0.0),
        total: num_at(payload, &["total"]).unwrap_or(0.0),
        estimated_minutes: int_at(payload, &["estimated_time"]).unwrap_or(30),
        raw_payload: raw_body.to_string(),
        lines,
    })
}

/// Walk dotted paths in order, return the first string hit. Numeric ids
/// are stringified since platforms flip between the two.
fn str_at(value: &Value, paths: &[&str]) -> Option<String> {
    for path in paths {
        match walk(value, path) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn num_at(value: &Value, paths: &[&str]) -> Option<f64> {
    for path in paths {
        match walk(value, path) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(parsed) = s.parse::<f64>() {
                    return Some(parsed);
                }
            }
            _ => {}
        }
    }
    None
}

fn int_at(value: &Value, paths: &[&str]) -> Option<i64> {
    num_at(value, paths).map(|n| n as i64)
}

fn walk<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_swiggy_snake_case_variant() {
        let payload = json!({
            "order_id": "SW123",
            "order_number": "1042",
            "restaurant_id": "rest-1",
            "customer": { "name": "Asha", "phone": "9999" },
            "delivery_address": { "full_address": "12 MG Road" },
            "items": [
                { "id": "I1", "name": "Paneer Tikka", "quantity": 2, "price": 125.0 }
            ],
            "subtotal": 250.0,
            "tax": 12.5,
            "delivery_fee": 30.0,
            "total": 292.5
        });
        let order = normalize(Platform::Swiggy, &payload, "{}").unwrap();
        assert_eq!(order.external_order_id, "SW123");
        assert_eq!(order.external_order_number, "1042");
        assert_eq!(order.restaurant_id, "rest-1");
        assert_eq!(order.customer_name.as_deref(), Some("Asha"));
        assert_eq!(order.customer_address.as_deref(), Some("12 MG Road"));
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].quantity, 2);
        assert_eq!(order.estimated_minutes, 30);
    }

    #[test]
    fn test_swiggy_camel_case_variant() {
        let payload = json!({
            "orderId": 998877,
            "orderNumber": "77",
            "restaurantId": "rest-1",
            "customerName": "Ravi",
            "deliveryAddress": "4 Brigade Road",
            "items": [
                { "item_id": "I2", "item_name": "Dosa", "total_price": 80 }
            ],
            "item_total": 80,
            "order_total": 95
        });
        let order = normalize(Platform::Swiggy, &payload, "{}").unwrap();
        assert_eq!(order.external_order_id, "998877");
        assert_eq!(order.customer_name.as_deref(), Some("Ravi"));
        assert_eq!(order.subtotal, 80.0);
        assert_eq!(order.total, 95.0);
        assert_eq!(order.lines[0].external_item_id, "I2");
        assert_eq!(order.lines[0].name, "Dosa");
        assert_eq!(order.lines[0].quantity, 1);
        assert_eq!(order.lines[0].price, 80.0);
    }

    #[test]
    fn test_zomato_order_items_and_res_id() {
        let payload = json!({
            "id": "Z55",
            "display_id": "Z-55",
            "res_id": "res-9",
            "order_items": [
                { "id": "ZI1", "name": "Biryani", "quantity": 1, "total": 220 }
            ],
            "order_subtotal": 220,
            "delivery_charge": 25,
            "order_total": 245,
            "delivery_time": 40
        });
        let order = normalize(Platform::Zomato, &payload, "{}").unwrap();
        assert_eq!(order.external_order_id, "Z55");
        assert_eq!(order.external_order_number, "Z-55");
        assert_eq!(order.restaurant_id, "res-9");
        assert_eq!(order.delivery_fee, 25.0);
        assert_eq!(order.estimated_minutes, 40);
        assert_eq!(order.lines[0].price, 220.0);
    }

    #[test]
    fn test_rapido_merchant_id() {
        let payload = json!({
            "orderId": "R1",
            "merchant_id": "m-3",
            "customer_name": "Devi",
            "address": "7 Koramangala",
            "items": [],
            "total": 150,
            "estimated_time": 15
        });
        let order = normalize(Platform::Rapido, &payload, "{}").unwrap();
        assert_eq!(order.restaurant_id, "m-3");
        assert_eq!(order.customer_address.as_deref(), Some("7 Koramangala"));
        assert_eq!(order.estimated_minutes, 15);
        assert!(order.lines.is_empty());
    }

    #[test]
    fn test_missing_order_id_rejected() {
        let payload = json!({ "restaurant_id": "rest-1" });
        let err = normalize(Platform::Swiggy, &payload, "{}").unwrap_err();
        assert!(matches!(err, IngestError::BadPayload(_)));
    }

    #[test]
    fn test_missing_restaurant_id_rejected() {
        let payload = json!({ "order_id": "X" });
        let err = normalize(Platform::Zomato, &payload, "{}").unwrap_err();
        assert!(matches!(err, IngestError::BadPayload(_)));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = normalize(Platform::Swiggy, &json!([1, 2]), "[1,2]").unwrap_err();
        assert!(matches!(err, IngestError::BadPayload(_)));
    }

    #[test]
    fn test_order_number_falls_back_to_order_id() {
        let payload = json!({ "order_id": "SW9", "restaurant_id": "rest-1" });
        let order = normalize(Platform::Swiggy, &payload, "{}").unwrap();
        assert_eq!(order.external_order_number, "SW9");
    }
}
