use serde_json::{Map, Value};

use crate::error::{AgentError, Result};

pub const WEI_PER_ETH: f64 = 1e18;
pub const WEI_PER_GWEI: f64 = 1e9;

/// 将 wei 金额转换为 ETH，用于展示
///
/// # 参数
/// * `wei` - 以 wei 为单位的金额
///
/// # 示例
/// ```ignore
/// let eth = wei_to_eth(1_500_000_000_000_000_000.0); // 返回 1.5
/// ```
pub fn wei_to_eth(wei: f64) -> f64 {
    wei / WEI_PER_ETH
}

/// 将 wei 金额转换为 Gwei，常用于展示 gas 价格
///
/// # 参数
/// * `wei` - 以 wei 为单位的金额
///
/// # 示例
/// ```ignore
/// let gwei = wei_to_gwei(20_000_000_000.0); // 返回 20.0
/// ```
pub fn wei_to_gwei(wei: f64) -> f64 {
    wei / WEI_PER_GWEI
}

/// 从 JSON 值中读取 wei 金额并转换为浮点数
///
/// 后端通常以十进制字符串返回金额，因此同时接受 JSON 数字和数字字符串，其他类型一律报错。
///
/// # 参数
/// * `value` - 后端返回的 JSON 值
///
/// # 示例
/// ```ignore
/// let wei = value_to_f64(&json!("21000"))?; // 返回 21000.0
/// let err = value_to_f64(&json!(true)); // 返回 InvalidResponse
/// ```
pub fn value_to_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| AgentError::InvalidResponse(format!("number out of range: {}", n))),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            AgentError::InvalidResponse(format!("not a numeric string: '{}'", s))
        }),
        other => Err(AgentError::InvalidResponse(format!(
            "expected a number or numeric string, got {}",
            json_type_name(other)
        ))),
    }
}

/// 读取 `body[key]` 并按 [`value_to_f64`] 转换，字段缺失时视为 0
///
/// # 参数
/// * `body` - 后端返回的 JSON 对象
/// * `key` - 字段名
///
/// # 示例
/// ```ignore
/// let cost = field_to_f64(&body, "estimatedCost")?; // 缺失时返回 0.0
/// ```
pub fn field_to_f64(body: &Map<String, Value>, key: &str) -> Result<f64> {
    match body.get(key) {
        Some(value) => value_to_f64(value),
        None => Ok(0.0),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wei_to_eth() {
        assert_eq!(wei_to_eth(1_000_000_000_000_000_000.0), 1.0);
        assert_eq!(wei_to_eth(0.0), 0.0);
    }

    #[test]
    fn test_wei_to_gwei() {
        assert_eq!(wei_to_gwei(20_000_000_000.0), 20.0);
    }

    #[test]
    fn test_numeric_string() {
        assert_eq!(value_to_f64(&json!("21000")).unwrap(), 21000.0);
        assert_eq!(value_to_f64(&json!(" 7 ")).unwrap(), 7.0);
    }

    #[test]
    fn test_json_number() {
        assert_eq!(value_to_f64(&json!(42)).unwrap(), 42.0);
    }

    #[test]
    fn test_rejects_null_and_garbage() {
        assert!(value_to_f64(&Value::Null).is_err());
        assert!(value_to_f64(&json!("abc")).is_err());
        assert!(value_to_f64(&json!([1])).is_err());
    }

    #[test]
    fn test_missing_field_is_zero() {
        let body = Map::new();
        assert_eq!(field_to_f64(&body, "gasPrice").unwrap(), 0.0);
    }
}
