use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::backend::BackendClient;
use crate::config::Config;
use crate::error::Result;
use crate::llm::FunctionDeclaration;
use crate::tools::balance::BalanceRequest;
use crate::tools::execute::TransactionRequest;
use crate::tools::pool::{LiquidityPositionRequest, PoolInfoRequest, PoolVolumeRequest};
use crate::tools::price::PriceImpactRequest;
use crate::tools::swap::SwapDetailsRequest;
use crate::tools::{
    render, to_pretty_json, BalanceTool, ExecuteTool, PoolTool, PriceTool, SwapPolicy, SwapTool,
    ToolFailure,
};

pub const TOOL_NAMES: [&str; 9] = [
    "get_token_balance",
    "calculate_price_impact",
    "get_swap_details",
    "get_pool_info",
    "get_all_pools",
    "get_pool_volume",
    "get_liquidity_position",
    "execute_transaction",
    "estimate_gas",
];

/// 模型可见的 DEX 工具集：函数声明以及按名称分发
pub struct Toolbox {
    balance: BalanceTool,
    price: PriceTool,
    swap: SwapTool,
    pool: PoolTool,
    execute: ExecuteTool,
}

impl Toolbox {
    pub fn new(backend: BackendClient, policy: SwapPolicy) -> Self {
        Toolbox {
            balance: BalanceTool::new(backend.clone()),
            price: PriceTool::new(backend.clone()),
            swap: SwapTool::new(backend.clone(), policy),
            pool: PoolTool::new(backend.clone()),
            execute: ExecuteTool::new(backend),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = BackendClient::new(config.backend_url.clone())?;
        Ok(Self::new(backend, SwapPolicy::new(config.recipient)))
    }

    /// 按固定顺序返回函数声明
    pub fn definitions(&self) -> Vec<FunctionDeclaration> {
        let string = |description: &str| json!({"type": "STRING", "description": description});
        let transaction_parameters = json!({
            "type": "OBJECT",
            "properties": {
                "to": string("Target contract address (e.g. the router for swaps)"),
                "data": string("Encoded transaction data, must start with 0x"),
                "value": string("Native token to send in wei (default \"0\")"),
                "tx_type": {
                    "type": "STRING",
                    "description": "Transaction type for context: SWAP, LIQUIDITY or CUSTOM"
                }
            },
            "required": ["to", "data"]
        });

        vec![
            declaration(
                "get_token_balance",
                "Get token balance and details (name, symbol, decimals, raw and formatted balance) for a wallet",
                Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "token_address": string("Address of the ERC20 token contract"),
                        "owner_address": string("Address of the wallet to check")
                    },
                    "required": ["token_address", "owner_address"]
                })),
            ),
            declaration(
                "calculate_price_impact",
                "Calculate price impact and expected output for a token swap",
                Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "token_in": string("Address of the input token"),
                        "token_out": string("Address of the output token"),
                        "amount_in": string("Amount of input token in wei")
                    },
                    "required": ["token_in", "token_out", "amount_in"]
                })),
            ),
            declaration(
                "get_swap_details",
                "Swap tokens through the router and return the swap result",
                Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "token_in": string("Address of the input token"),
                        "token_out": string("Address of the output token"),
                        "amount": string("Amount of input token in wei"),
                        "slippage": {
                            "type": "NUMBER",
                            "description": "Maximum allowed slippage percentage (default 0.5)"
                        }
                    },
                    "required": ["token_in", "token_out", "amount"]
                })),
            ),
            declaration(
                "get_pool_info",
                "Get reserves and metrics of the liquidity pool for two tokens",
                Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "token_a": string("Contract address of the first token"),
                        "token_b": string("Contract address of the second token")
                    },
                    "required": ["token_a", "token_b"]
                })),
            ),
            declaration(
                "get_all_pools",
                "Get information about all available liquidity pools",
                None,
            ),
            declaration(
                "get_pool_volume",
                "Get trading volume and recent swaps for a pool",
                Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "pair_address": string("Address of the liquidity pair")
                    },
                    "required": ["pair_address"]
                })),
            ),
            declaration(
                "get_liquidity_position",
                "Get liquidity position details for a pool, optionally for one user",
                Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "pair_address": string("Address of the liquidity pair"),
                        "user_address": string("Address of the liquidity provider (optional)")
                    },
                    "required": ["pair_address"]
                })),
            ),
            declaration(
                "execute_transaction",
                "Execute a blockchain transaction and report hash, block, gas used and status",
                Some(transaction_parameters.clone()),
            ),
            declaration(
                "estimate_gas",
                "Estimate gas, gas price and total cost of a transaction in wei, ETH and Gwei",
                Some(transaction_parameters),
            ),
        ]
    }

    /// 使用模型提供的参数执行指定工具，始终返回 JSON 文本
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> String {
        debug!("Dispatching {} with {}", name, arguments);

        match name {
            "get_token_balance" => match decode::<BalanceRequest>(name, arguments) {
                Ok(request) => render(&self.balance.get_token_balance(&request).await),
                Err(text) => text,
            },
            "calculate_price_impact" => match decode::<PriceImpactRequest>(name, arguments) {
                Ok(request) => render(&self.price.calculate_price_impact(&request).await),
                Err(text) => text,
            },
            "get_swap_details" => match decode::<SwapDetailsRequest>(name, arguments) {
                Ok(request) => render(&self.swap.get_swap_details(&request).await),
                Err(text) => text,
            },
            "get_pool_info" => match decode::<PoolInfoRequest>(name, arguments) {
                Ok(request) => render(&self.pool.get_pool_info(&request).await),
                Err(text) => text,
            },
            "get_all_pools" => render(&self.pool.get_all_pools().await),
            "get_pool_volume" => match decode::<PoolVolumeRequest>(name, arguments) {
                Ok(request) => render(&self.pool.get_pool_volume(&request).await),
                Err(text) => text,
            },
            "get_liquidity_position" => match decode::<LiquidityPositionRequest>(name, arguments)
            {
                Ok(request) => render(&self.pool.get_liquidity_position(&request).await),
                Err(text) => text,
            },
            "execute_transaction" => match decode::<TransactionRequest>(name, arguments) {
                Ok(request) => render(&self.execute.execute_transaction(&request).await),
                Err(text) => text,
            },
            "estimate_gas" => match decode::<TransactionRequest>(name, arguments) {
                Ok(request) => render(&self.execute.estimate_gas(&request).await),
                Err(text) => text,
            },
            _ => {
                warn!("Model requested unknown tool: {}", name);
                to_pretty_json(
                    &ToolFailure::new(format!("Tool not found: {}", name))
                        .with_context(&json!({ "tool": name })),
                )
            }
        }
    }
}

fn declaration(name: &str, description: &str, parameters: Option<Value>) -> FunctionDeclaration {
    FunctionDeclaration {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

/// 解析工具参数，失败时生成返回给模型的错误文本
fn decode<T: DeserializeOwned>(name: &str, arguments: &Value) -> std::result::Result<T, String> {
    serde_json::from_value(arguments.clone()).map_err(|e| {
        warn!("Invalid arguments for {}: {}", name, e);
        to_pretty_json(
            &ToolFailure::new(format!("Invalid arguments: {}", e))
                .with_context(&json!({ "tool": name })),
        )
    })
}
