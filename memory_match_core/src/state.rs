use crate::card::{CardStatus, Deck, Symbol};
use crate::timer::{TimerId, TimerQueue};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub type GameId = Uuid;

/// 一局游戏的阶段
///
/// `NotStarted → InProgress → Resolving → (InProgress | Completed)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    NotStarted, // 洗好牌，还没翻第一张
    InProgress, // 计时中，可以翻牌
    Resolving,  // 已翻开两张，等待延迟判定，期间拒绝翻牌
    Completed,  // 全部配对，分数已结算
}

/// 一局记忆翻牌游戏 (Match Engine)
///
/// 持有牌组、当前翻开的牌、步数与分数，以及所有待触发的定时任务。
/// 渲染器通过 `snapshot` 读取状态，不能直接修改。状态迁移逻辑见 `logic` 模块。
#[derive(Debug)]
pub struct MatchEngine {
    pub(crate) config: GameConfig,
    pub(crate) rng: StdRng,
    pub(crate) game_id: GameId,
    pub(crate) deck: Deck,
    // 已翻开但尚未判定的牌，长度只可能是 0、1、2
    pub(crate) selection: Vec<usize>,
    pub(crate) phase: GamePhase,
    pub(crate) score: ScoreState,
    pub(crate) started_at: Option<Instant>,
    // 结束时冻结的耗时
    pub(crate) final_elapsed: Option<Duration>,
    pub(crate) timers: TimerQueue,
    pub(crate) pending_resolution: Option<TimerId>,
    pub(crate) clock_tick: Option<TimerId>,
    pub(crate) summary: Option<GameSummary>,
}

/// 计分规则与时间参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub match_delay: Duration,    // 配对成功后的判定延迟
    pub mismatch_delay: Duration, // 配对失败后翻回去的延迟
    pub tick_interval: Duration,  // 计时器刷新间隔
    pub base_match_score: u32,    // 每对的基础分
    pub speed_bonus: u32,         // 步数未超过 2 倍对数时每对的额外分
    pub time_bonus_max: u32,
    pub time_bonus_per_second: u32,
    pub move_bonus_max: u32,
    pub move_bonus_per_move: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            match_delay: Duration::from_millis(500),
            mismatch_delay: Duration::from_millis(1000),
            tick_interval: Duration::from_secs(1),
            base_match_score: 100,
            speed_bonus: 50,
            time_bonus_max: 1000,
            time_bonus_per_second: 10,
            move_bonus_max: 500,
            move_bonus_per_move: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreState {
    pub moves: u32,         // 已判定的翻牌次数 (每两张算一步)
    pub score: u32,
    pub matched_pairs: u32,
}

/// 一局结束时的结果，用于提交排行榜
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub game_id: GameId,
    pub score: u32,
    pub moves: u32,
    pub elapsed: Duration,
    pub time_bonus: u32,
    pub move_bonus: u32,
}

impl GameSummary {
    pub fn formatted_time(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// 渲染用的单张牌视图，背面朝上时不暴露符号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardView {
    pub index: usize,
    pub status: CardStatus,
    pub symbol: Option<Symbol>,
}

/// 某一时刻的只读游戏快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub phase: GamePhase,
    pub cards: Vec<CardView>,
    pub moves: u32,
    pub score: u32,
    pub matched_pairs: u32,
    pub total_pairs: u32,
    pub elapsed: Duration,
}

impl GameSnapshot {
    pub fn formatted_time(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

/// 把耗时格式化成 `MM:SS`，分钟不封顶
pub fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// 解析 `MM:SS`，秒数必须小于 60
pub fn parse_elapsed(text: &str) -> Option<Duration> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(minutes) || !all_digits(seconds) {
        return None;
    }
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some(Duration::from_secs(minutes * 60 + seconds))
}
