pub mod balance;
pub mod execute;
pub mod pool;
pub mod price;
pub mod swap;

pub use balance::BalanceTool;
pub use execute::ExecuteTool;
pub use pool::PoolTool;
pub use price::PriceTool;
pub use swap::{SwapPolicy, SwapTool};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{json, Value};
use std::fmt;

/// 工具调用的结果，仅在交给模型时才序列化为文本
pub type ToolResult<T> = std::result::Result<T, ToolFailure>;

/// 返回给模型的错误载荷，代替直接抛出的错误
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub error: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl ToolFailure {
    pub fn new(message: impl fmt::Display) -> Self {
        ToolFailure {
            error: Value::String(message.to_string()),
            details: None,
            context: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_context<C: Serialize>(mut self, context: &C) -> Self {
        self.context = serde_json::to_value(context).ok();
        self
    }
}

/// 执行或估算交易时模型标注的交易类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TxType {
    Swap,
    Liquidity,
    Custom,
    Other(String),
}

impl From<String> for TxType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "SWAP" => TxType::Swap,
            "LIQUIDITY" => TxType::Liquidity,
            "CUSTOM" => TxType::Custom,
            _ => TxType::Other(raw),
        }
    }
}

impl From<TxType> for String {
    fn from(tx_type: TxType) -> Self {
        tx_type.to_string()
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxType::Swap => f.write_str("SWAP"),
            TxType::Liquidity => f.write_str("LIQUIDITY"),
            TxType::Custom => f.write_str("CUSTOM"),
            TxType::Other(raw) => f.write_str(raw),
        }
    }
}

/// 以 4 空格缩进序列化为 JSON 文本
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);

    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(e) => json!({ "error": e.to_string() }).to_string(),
    }
}

/// 将工具结果渲染为模型接收的 JSON 文本，失败时同样返回 JSON
pub fn render<T: Serialize>(result: &ToolResult<T>) -> String {
    match result {
        Ok(payload) => to_pretty_json(payload),
        Err(failure) => to_pretty_json(failure),
    }
}
