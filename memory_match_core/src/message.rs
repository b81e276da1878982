use crate::card::Symbol;
use crate::state::{GameId, GameSummary};
use std::time::Duration;

// --- 输入源 -> 引擎 ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// 选中某个位置的牌 (从 0 开始)
    SelectCard(usize),
    /// 放弃当前局，重新洗牌
    NewGame,
}

// --- 引擎 -> 渲染器 ---
// 引擎状态变化后产生的事件，渲染器只读不写。

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// 重新洗牌，回到 NotStarted
    NewGame { game_id: GameId },
    /// 第一次翻牌，开始计时
    Started { game_id: GameId },
    CardRevealed { index: usize, symbol: Symbol },
    /// 翻开了第二张牌，步数已加一，等待延迟判定
    PairFlipped { first: usize, second: usize, moves: u32 },
    PairMatched {
        first: usize,
        second: usize,
        symbol: Symbol,
        points: u32, // 本次获得的分数 (基础分 + 速度奖励)
        matched_pairs: u32,
    },
    PairMismatched { first: usize, second: usize },
    /// 计时刷新
    Tick { elapsed: Duration },
    /// 全部配对完成，附带结算结果
    Completed(GameSummary),
}

impl GameEvent {
    /// 是否改变了牌面或分数 (计时刷新不算)
    pub fn changes_board(&self) -> bool {
        !matches!(self, GameEvent::Tick { .. })
    }
}
