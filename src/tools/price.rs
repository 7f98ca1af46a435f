use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::backend::BackendClient;
use crate::tools::{ToolFailure, ToolResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceImpactRequest {
    pub token_in: String,
    pub token_out: String,
    /// 输入金额（wei）
    pub amount_in: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceImpactBody<'a> {
    token_in_address: &'a str,
    token_out_address: &'a str,
    amount_in: &'a str,
}

pub struct PriceTool {
    backend: BackendClient,
}

impl PriceTool {
    pub fn new(backend: BackendClient) -> Self {
        PriceTool { backend }
    }

    /// 计算交换的价格影响和预期输出，结果由后端计算后原样返回
    pub async fn calculate_price_impact(&self, request: &PriceImpactRequest) -> ToolResult<Value> {
        info!(
            "Calculating price impact: {} {} -> {}",
            request.amount_in, request.token_in, request.token_out
        );

        let body = PriceImpactBody {
            token_in_address: &request.token_in,
            token_out_address: &request.token_out,
            amount_in: &request.amount_in,
        };

        self.backend
            .post("/token/price-impact", &body)
            .await
            .map_err(ToolFailure::new)
    }
}
