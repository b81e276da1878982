//! # 记忆翻牌核心逻辑库
//!
//! 这个 `core` crate 包含了记忆翻牌游戏的牌组生成、翻牌与配对判定的状态机、
//! 计分规则以及排行榜的持久化。
//! 它不依赖任何具体的界面或运行时，时间由调用方以 `Instant` 传入，
//! 延迟判定与计时都是引擎内部的定时任务，由上层按 `next_deadline` 唤醒驱动。

mod card;
mod error;
mod leaderboard;
mod logic;
mod message;
mod state;
mod timer;

pub use card::*;

pub use error::*;

pub use leaderboard::*;

pub use logic::{match_points, move_bonus, time_bonus};

pub use message::*;

pub use state::*;

pub use timer::{Resolution, Task, TimerId, TimerQueue};
