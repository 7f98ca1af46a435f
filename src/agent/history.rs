use std::collections::VecDeque;

use crate::llm::Content;

pub const DEFAULT_HISTORY_EXCHANGES: usize = 10;

/// 一条用户消息，以及回答它的所有模型和工具轮次
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub turns: Vec<Content>,
}

/// 最近若干轮对话的滚动窗口
#[derive(Debug, Clone)]
pub struct ChatHistory {
    exchanges: VecDeque<Exchange>,
    capacity: usize,
}

impl ChatHistory {
    pub fn new(capacity: usize) -> Self {
        ChatHistory {
            exchanges: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, exchange: Exchange) {
        if self.capacity == 0 {
            return;
        }
        while self.exchanges.len() >= self.capacity {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back(exchange);
    }

    /// 保留的全部轮次，按时间从旧到新
    pub fn contents(&self) -> Vec<Content> {
        self.exchanges
            .iter()
            .flat_map(|exchange| exchange.turns.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_EXCHANGES)
    }
}
