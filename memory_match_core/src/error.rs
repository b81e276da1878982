use crate::card::Symbol;
use thiserror::Error;

/// 选牌被拒绝的原因
///
/// `MatchEngine::select` 会把这些情况当作空操作静默忽略，
/// 需要提示玩家时使用 `try_select` 拿到具体原因。
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SelectRejection {
    #[error("位置 {index} 没有卡牌 (共 {len} 张)")]
    OutOfRange { index: usize, len: usize },
    #[error("这张牌已经翻开了")]
    AlreadyRevealed(usize),
    #[error("这张牌已经配对成功")]
    AlreadyMatched(usize),
    #[error("请等待当前两张牌判定完成")]
    SelectionFull,
    #[error("本局已经结束")]
    GameCompleted,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeckError {
    #[error("牌组必须有 {expected} 张牌，实际为 {actual} 张")]
    WrongSize { expected: usize, actual: usize },
    #[error("符号 {symbol} 出现了 {count} 次，应当恰好两次")]
    UnbalancedSymbol { symbol: Symbol, count: usize },
}

/// 玩家名字校验失败，信息直接展示给玩家
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("请输入你的名字！")]
    Empty,
    #[error("名字长度必须为 1-20 个字符。")]
    TooLong { len: usize },
}

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("排行榜存储读写失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("排行榜序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}
