use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::Value;
use std::collections::HashMap;

/// Convert a serde_json::Value to a DynamoDB AttributeValue
pub fn to_attr(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(arr) => AttributeValue::L(arr.into_iter().map(to_attr).collect()),
        Value::Object(obj) => {
            AttributeValue::M(obj.into_iter().map(|(k, v)| (k, to_attr(v))).collect())
        }
    }
}

/// Convert a DynamoDB AttributeValue to a serde_json::Value
pub fn from_attr(attr: AttributeValue) -> Value {
    match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::N(n) => parse_number(&n),
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::L(arr) => Value::Array(arr.into_iter().map(from_attr).collect()),
        AttributeValue::M(obj) => {
            Value::Object(obj.into_iter().map(|(k, v)| (k, from_attr(v))).collect())
        }
        AttributeValue::Ss(set) => Value::Array(set.into_iter().map(Value::String).collect()),
        AttributeValue::Ns(set) => Value::Array(set.iter().map(|n| parse_number(n)).collect()),
        _ => Value::Null,
    }
}

fn parse_number(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::Number(i.into());
    }
    n.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Convert a JSON object into a DynamoDB item map. Non-object values yield
/// an empty item; callers only pass serialized record structs.
pub fn to_item(value: Value) -> HashMap<String, AttributeValue> {
    match value {
        Value::Object(obj) => obj.into_iter().map(|(k, v)| (k, to_attr(v))).collect(),
        _ => HashMap::new(),
    }
}

/// Convert a DynamoDB item map back into a JSON object.
pub fn from_item(item: HashMap<String, AttributeValue>) -> Value {
    Value::Object(item.into_iter().map(|(k, v)| (k, from_attr(v))).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_nested_records() {
        let value = json!({
            "user_id": "u1",
            "importance": 5,
            "active": true,
            "keywords": ["콘서트", "ATEEZ"],
            "kpop_preferences": {"favorite_groups": ["ATEEZ"]},
            "gender": null,
        });

        let item = to_item(value.clone());
        assert_eq!(from_item(item), value);
    }

    #[test]
    fn numbers_come_back_as_integers_when_whole() {
        let attr = AttributeValue::N("42".to_string());
        assert_eq!(from_attr(attr), json!(42));

        let attr = AttributeValue::N("1.5".to_string());
        assert_eq!(from_attr(attr), json!(1.5));
    }
}
