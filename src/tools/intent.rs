//! 意图规则表：搜索意图 / 搜索确认 / 通用确认
//!
//! 纯关键词子串匹配（忽略大小写），不做分词或语义理解。
//! 换作分类器时只需替换本模块，调用方契约（返回值形状）不变。

/// 搜索触发词；命中多个时取最长者（"搜索关于" 优先于 "搜索"）
pub const SEARCH_TRIGGERS: &[&str] = &[
    "搜索",
    "查找",
    "查询",
    "了解",
    "搜索关于",
    "查找关于",
    "查询关于",
    "search",
    "find",
    "lookup",
    "search for",
    "find about",
];

/// 查询末尾要去掉的填充后缀；命中多个时取最长者
pub const FILLER_SUFFIXES: &[&str] = &["的内容", "的信息", "的资料", "的新闻", "的资讯"];

/// 搜索确认词（与通用确认词分开，优先判定）
pub const SEARCH_CONFIRMATIONS: &[&str] = &[
    "搜索",
    "执行搜索",
    "开始搜索",
    "搜索吧",
    "好的搜索",
    "search",
    "execute search",
    "start search",
    "go search",
];

/// 确认词后常见的语气词 / 虚词；触发词后只剩这些时不算新查询
pub const CONFIRMATION_PARTICLES: &[&str] = &[
    "吧", "一下", "一下吧", "下吧", "呗", "啊", "呀", "now", "please", "it", "it now",
];

/// 通用确认词：命中后把对话交给 Orchestrator 生成内容
pub const GENERIC_CONFIRMATIONS: &[&str] = &[
    "可以", "好的", "行", "没问题", "就这样", "确认", "同意", "开始", "生成", "立即", "马上",
    "ok", "yes", "sure", "fine", "start", "generate", "create", "proceed",
];

/// 一次意图判定的结果，只用于当轮分支选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SearchConfirmation,
    Confirmation,
    SearchRequest(String),
    Open,
}

/// 忽略大小写查找 needle（needle 须为小写），返回其在原文中的结束字节位置
fn find_end_ignore_case(text: &str, needle: &str) -> Option<usize> {
    let mut lowered = String::with_capacity(text.len());
    // lowered 中每个字节对应的原文字符起点
    let mut origin = Vec::with_capacity(text.len() + 1);
    for (i, c) in text.char_indices() {
        for lc in c.to_lowercase() {
            let before = lowered.len();
            lowered.push(lc);
            origin.extend(std::iter::repeat(i).take(lowered.len() - before));
        }
    }
    origin.push(text.len());

    let start = lowered.find(needle)?;
    Some(origin[start + needle.len()])
}

fn contains_any(text: &str, vocabulary: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    vocabulary.iter().any(|w| lowered.contains(w))
}

fn strip_filler_suffix(query: &str) -> &str {
    FILLER_SUFFIXES
        .iter()
        .filter(|s| query.ends_with(*s))
        .max_by_key(|s| s.chars().count())
        .map(|s| query[..query.len() - s.len()].trim_end())
        .unwrap_or(query)
}

/// 检测搜索意图：返回 (是否搜索, 提取出的查询)
///
/// 查询取最长触发词之后的原文，去首尾空白与填充后缀；触发词后没有内容时查询为空串。
pub fn detect_search_intent(text: &str) -> (bool, String) {
    let lowered = text.to_lowercase();
    // 同长时取表中靠前的
    let trigger = SEARCH_TRIGGERS
        .iter()
        .enumerate()
        .filter(|(_, t)| lowered.contains(**t))
        .max_by_key(|(i, t)| (t.chars().count(), std::cmp::Reverse(*i)))
        .map(|(_, t)| *t);

    let Some(trigger) = trigger else {
        return (false, String::new());
    };

    let query = find_end_ignore_case(text, trigger)
        .map(|end| text[end..].trim())
        .unwrap_or_default();
    (true, strip_filler_suffix(query).to_string())
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || c.is_whitespace() || "。！？，、～".contains(c)
}

/// 提取出的查询是否只是语气词（"搜索吧" 里的 "吧"、"搜索一下" 里的 "一下"）
fn is_particle_only(query: &str) -> bool {
    let q = query.trim_matches(is_punctuation).to_lowercase();
    q.is_empty() || CONFIRMATION_PARTICLES.contains(&q.as_str())
}

/// 是否为搜索确认
///
/// 命中确认词且本身不携带新查询（"搜索关于老虎" 是新的搜索请求，不是确认）；
/// 触发词后只剩语气词时（"开始搜索吧"、"好的搜索一下"）仍视为确认。
pub fn is_search_confirmation(text: &str) -> bool {
    let normalized = text.trim().trim_end_matches(is_punctuation).to_lowercase();
    if SEARCH_CONFIRMATIONS.contains(&normalized.as_str()) {
        return true;
    }
    contains_any(text, SEARCH_CONFIRMATIONS) && is_particle_only(&detect_search_intent(text).1)
}

/// 是否为通用确认（子串匹配；"lookup" 含 "ok" 这类误命中是已知的）
pub fn is_generic_confirmation(text: &str) -> bool {
    contains_any(text, GENERIC_CONFIRMATIONS)
}

/// 按判定优先级给出本轮意图：搜索确认 > 通用确认 > 搜索请求 > 开放内容
pub fn classify(text: &str) -> Intent {
    if is_search_confirmation(text) {
        return Intent::SearchConfirmation;
    }
    if is_generic_confirmation(text) {
        return Intent::Confirmation;
    }
    match detect_search_intent(text) {
        (true, query) => Intent::SearchRequest(query),
        (false, _) => Intent::Open,
    }
}
