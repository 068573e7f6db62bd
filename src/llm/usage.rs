//! Token 用量、计费系数与会话统计
//!
//! 不同厂商的定价单位不同（每千 / 每百万 token），Pricing 统一换算为每千 token，
//! 使 SessionStats 中的费用在不同后端之间可比。

use serde::{Deserialize, Serialize};

/// 单次调用的 token 用量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    /// 推理/思考 token（按输出单价计费）
    pub thinking: u64,
}

impl TokenUsage {
    pub fn new(input: u64, output: u64, thinking: u64) -> Self {
        Self {
            input,
            output,
            thinking,
        }
    }

    /// 字符数 / 4 的粗略估算，用于拿不到用量元数据的后端
    pub fn estimate_tokens(text: &str) -> u64 {
        (text.chars().count() / 4) as u64
    }
}

/// 计费系数（统一为每 1000 token 的价格）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Pricing {
    pub fn per_1k(input: f64, output: f64) -> Self {
        Self {
            input_per_1k: input,
            output_per_1k: output,
        }
    }

    /// 以每百万 token 报价的厂商（如 Gemini）
    pub fn per_million(input: f64, output: f64) -> Self {
        Self::per_1k(input / 1000.0, output / 1000.0)
    }

    pub fn free() -> Self {
        Self::per_1k(0.0, 0.0)
    }

    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        let input = usage.input as f64 / 1000.0 * self.input_per_1k;
        let output = (usage.output + usage.thinking) as f64 / 1000.0 * self.output_per_1k;
        (input + output).max(0.0)
    }
}

/// 会话级累计统计；只增不减，除非显式 reset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_calls: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_thinking_tokens: u64,
    pub total_cost: f64,
}

impl SessionStats {
    pub fn record(&mut self, usage: &TokenUsage, cost: f64) {
        self.total_calls += 1;
        self.total_input_tokens += usage.input;
        self.total_output_tokens += usage.output;
        self.total_thinking_tokens += usage.thinking;
        self.total_cost += cost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_cost_per_1k() {
        let pricing = Pricing::per_1k(0.00014, 0.00028);
        let cost = pricing.cost(&TokenUsage::new(1000, 2000, 0));
        assert!(approx(cost, 0.00014 + 0.00056));
    }

    #[test]
    fn test_thinking_billed_as_output() {
        let pricing = Pricing::per_1k(0.001, 0.002);
        let a = pricing.cost(&TokenUsage::new(0, 500, 500));
        let b = pricing.cost(&TokenUsage::new(0, 1000, 0));
        assert!(approx(a, b));
    }

    #[test]
    fn test_per_million_matches_per_1k() {
        let gemini = Pricing::per_million(0.375, 1.875);
        let cost = gemini.cost(&TokenUsage::new(1_000_000, 1_000_000, 0));
        assert!(approx(cost, 0.375 + 1.875));
    }

    #[test]
    fn test_estimate_counts_chars_not_bytes() {
        assert_eq!(TokenUsage::estimate_tokens("你好世界你好世界"), 2);
        assert_eq!(TokenUsage::estimate_tokens("abc"), 0);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = SessionStats::default();
        stats.record(&TokenUsage::new(10, 20, 5), 0.5);
        stats.record(&TokenUsage::new(1, 2, 0), 0.25);
        assert_eq!(stats.total_calls, 2);
        assert_eq!(stats.total_input_tokens, 11);
        assert_eq!(stats.total_output_tokens, 22);
        assert_eq!(stats.total_thinking_tokens, 5);
        assert!(approx(stats.total_cost, 0.75));
    }
}
