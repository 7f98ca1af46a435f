use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::backend::BackendClient;
use crate::error::AgentError;
use crate::precision;
use crate::tools::{ToolFailure, ToolResult, TxType};

fn default_value() -> String {
    "0".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// 目标合约地址
    pub to: String,
    /// 编码后的调用数据，以 `0x` 开头
    pub data: String,
    /// 随交易发送的原生代币（wei）
    #[serde(default = "default_value")]
    pub value: String,
    #[serde(default)]
    pub tx_type: Option<TxType>,
}

impl TransactionRequest {
    /// 交易类型，空字符串视为未提供
    fn tx_type(&self) -> Option<&TxType> {
        self.tx_type
            .as_ref()
            .filter(|t| !matches!(t, TxType::Other(raw) if raw.is_empty()))
    }

    fn context(&self) -> TxContext {
        TxContext {
            tx_type: self
                .tx_type()
                .map(ToString::to_string)
                .unwrap_or_else(|| TxType::Custom.to_string()),
            target: self.to.clone(),
            value: self.value.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBody<'a> {
    to: &'a str,
    data: &'a str,
    value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tx_type: Option<&'a TxType>,
}

impl<'a> From<&'a TransactionRequest> for TransactionBody<'a> {
    fn from(request: &'a TransactionRequest) -> Self {
        TransactionBody {
            to: &request.to,
            data: &request.data,
            value: &request.value,
            tx_type: request.tx_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxContext {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub target: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    pub success: bool,
    pub transaction_hash: Value,
    pub block_number: Value,
    pub gas_used: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub status: ExecutionStatus,
    pub context: TxContext,
    pub details: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimation {
    pub gas_estimate: Value,
    pub gas_price: Value,
    pub total_cost: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanReadableCost {
    pub estimated_cost_in_eth: f64,
    pub gas_price_in_gwei: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasReport {
    pub estimation: GasEstimation,
    pub context: TxContext,
    pub human_readable: HumanReadableCost,
}

fn field(body: &Map<String, Value>, key: &str) -> Value {
    body.get(key).cloned().unwrap_or(Value::Null)
}

fn expect_object(body: Value) -> Result<Map<String, Value>, AgentError> {
    match body {
        Value::Object(map) => Ok(map),
        other => Err(AgentError::InvalidResponse(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// 通过后端签名器提交交易和估算 Gas
pub struct ExecuteTool {
    backend: BackendClient,
}

impl ExecuteTool {
    pub fn new(backend: BackendClient) -> Self {
        ExecuteTool { backend }
    }

    /// 发送交易并等待回执
    ///
    /// 返回 `{status, context, details}`，`details` 为后端原始响应
    pub async fn execute_transaction(
        &self,
        request: &TransactionRequest,
    ) -> ToolResult<ExecutionReport> {
        let context = request.context();
        info!(
            "Executing {} transaction to {} (value {})",
            context.tx_type, context.target, context.value
        );

        let raw = self
            .backend
            .post("/execute/transaction", &TransactionBody::from(request))
            .await
            .and_then(expect_object)
            .map_err(|e| ToolFailure::new(e).with_context(&context))?;

        let success = raw.get("status").and_then(Value::as_str) == Some("success");
        if !success {
            warn!("Transaction did not succeed: {:?}", raw.get("status"));
        }

        Ok(ExecutionReport {
            status: ExecutionStatus {
                success,
                transaction_hash: field(&raw, "transactionHash"),
                block_number: field(&raw, "blockNumber"),
                gas_used: field(&raw, "gasUsed"),
            },
            context,
            details: Value::Object(raw),
        })
    }

    /// 估算交易的 Gas 和总成本，不实际发送
    ///
    /// 额外给出以 ETH 和 Gwei 表示的人类可读数值
    pub async fn estimate_gas(&self, request: &TransactionRequest) -> ToolResult<GasReport> {
        let context = request.context();
        info!(
            "Estimating gas for {} transaction to {}",
            context.tx_type, context.target
        );

        let raw = self
            .backend
            .post("/execute/estimate", &TransactionBody::from(request))
            .await
            .and_then(expect_object)
            .map_err(|e| ToolFailure::new(e).with_context(&context))?;

        let human_readable = precision::field_to_f64(&raw, "estimatedCost")
            .and_then(|cost| {
                let price = precision::field_to_f64(&raw, "gasPrice")?;
                Ok(HumanReadableCost {
                    estimated_cost_in_eth: precision::wei_to_eth(cost),
                    gas_price_in_gwei: precision::wei_to_gwei(price),
                })
            })
            .map_err(|e| ToolFailure::new(e).with_context(&context))?;

        Ok(GasReport {
            estimation: GasEstimation {
                gas_estimate: field(&raw, "gasEstimate"),
                gas_price: field(&raw, "gasPrice"),
                total_cost: field(&raw, "estimatedCost"),
            },
            context,
            human_readable,
        })
    }
}
