use alloy_primitives::{address, Address};
use std::collections::HashMap;

/// 部署链上的包装原生代币
pub const WETH_ADDRESS: Address = address!("cde412ba5370eDEb27F3C549f8E9949D296045CF");

/// 默认池子中与 WETH 配对的稳定币
pub const DAI_ADDRESS: Address = address!("b793fc98d3e47ce2146747ad7af130fae5ec9cc0");

/// 未配置接收地址时接收交换输出的账户
pub const DEFAULT_RECIPIENT: Address = address!("eD24fb342c24607A42F722bCEBe7febE7B3AA2F4");

/// 部署链上的已知代币
pub struct TokenRegistry {
    tokens: HashMap<String, Address>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        let mut registry = TokenRegistry {
            tokens: HashMap::new(),
        };

        registry.register("WETH".to_string(), WETH_ADDRESS);
        registry.register("DAI".to_string(), DAI_ADDRESS);

        registry
    }

    pub fn register(&mut self, symbol: String, address: Address) {
        self.tokens.insert(symbol.to_uppercase(), address);
    }

    /// 按符号排序的已注册代币，格式为 `(符号, 校验和地址)`
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .tokens
            .iter()
            .map(|(symbol, address)| (symbol.clone(), address.to_checksum(None)))
            .collect();
        entries.sort();
        entries
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 解析十六进制地址，不区分大小写
pub fn parse_address(raw: &str) -> crate::Result<Address> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| crate::AgentError::InvalidAddress(raw.to_string()))
}
