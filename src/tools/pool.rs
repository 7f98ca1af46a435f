use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::backend::BackendClient;
use crate::tools::{ToolFailure, ToolResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolInfoRequest {
    pub token_a: String,
    pub token_b: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PoolInfoBody<'a> {
    token_a: &'a str,
    token_b: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolVolumeRequest {
    pub pair_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityPositionRequest {
    pub pair_address: String,
    #[serde(default)]
    pub user_address: Option<String>,
}

/// 只读的池子与流动性查询
pub struct PoolTool {
    backend: BackendClient,
}

impl PoolTool {
    pub fn new(backend: BackendClient) -> Self {
        PoolTool { backend }
    }

    /// 获取 `token_a` 与 `token_b` 组成的池子的储备量和指标
    pub async fn get_pool_info(&self, request: &PoolInfoRequest) -> ToolResult<Value> {
        info!("Fetching pool for {} / {}", request.token_a, request.token_b);

        let body = PoolInfoBody {
            token_a: &request.token_a,
            token_b: &request.token_b,
        };

        self.backend
            .post("/pool/reserves-for-tokens", &body)
            .await
            .map_err(ToolFailure::new)
    }

    /// 列出所有池子
    pub async fn get_all_pools(&self) -> ToolResult<Value> {
        info!("Fetching all pools");

        self.backend
            .get("/pool/all", &[])
            .await
            .map_err(ToolFailure::new)
    }

    /// 获取交易对的交易量和最近的交换记录
    pub async fn get_pool_volume(&self, request: &PoolVolumeRequest) -> ToolResult<Value> {
        info!("Fetching volume for pair {}", request.pair_address);

        let path = format!("/pool/volume/{}", request.pair_address);
        self.backend
            .get(&path, &[])
            .await
            .map_err(ToolFailure::new)
    }

    /// 获取交易对中的 LP 持仓，提供 `user_address` 时按该地址查询
    pub async fn get_liquidity_position(
        &self,
        request: &LiquidityPositionRequest,
    ) -> ToolResult<Value> {
        info!(
            "Fetching liquidity position in {} for {:?}",
            request.pair_address, request.user_address
        );

        let path = format!("/token/liquidity-position/{}", request.pair_address);
        let query: Vec<(&str, &str)> = match request.user_address.as_deref() {
            Some(address) if !address.is_empty() => vec![("address", address)],
            _ => Vec::new(),
        };

        self.backend
            .get(&path, &query)
            .await
            .map_err(ToolFailure::new)
    }
}
