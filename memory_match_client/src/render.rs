use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType, SetTitle};
use memory_match_core::{
    CardStatus, CardView, GameEvent, GamePhase, GameSnapshot, GameSummary, LeaderboardEntry,
};
use std::io::{self, Write};

pub const BOARD_COLUMNS: usize = 4;
const TITLE: &str = "🧠 记忆翻牌";

pub fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}

/// 计时显示在终端标题上，每秒刷新也不会打断输入
pub fn set_clock_title<W: Write>(out: &mut W, time: &str) -> io::Result<()> {
    execute!(out, SetTitle(format!("{TITLE} ⏱ {time}")))
}

fn card_cell(card: &CardView) -> String {
    match (card.status, card.symbol) {
        (CardStatus::Matched, Some(symbol)) => format!("[{}]", symbol).green().to_string(),
        (CardStatus::Revealed, Some(symbol)) => format!("[{}]", symbol).yellow().bold().to_string(),
        _ => format!("[{:>2}]", card.index + 1).dark_grey().to_string(),
    }
}

pub fn render_board(snapshot: &GameSnapshot) -> String {
    let mut lines = vec![
        TITLE.bold().to_string(),
        format!(
            "⏱ {}   得分 {}   步数 {}   配对 {}/{}",
            snapshot.formatted_time(),
            snapshot.score,
            snapshot.moves,
            snapshot.matched_pairs,
            snapshot.total_pairs
        ),
        String::new(),
    ];

    for row in snapshot.cards.chunks(BOARD_COLUMNS) {
        let cells: Vec<String> = row.iter().map(card_cell).collect();
        lines.push(format!("  {}", cells.join(" ")));
    }

    lines.push(String::new());
    lines.push(
        match snapshot.phase {
            GamePhase::NotStarted => "翻开任意一张牌开始计时。",
            GamePhase::InProgress => "选择一张牌。",
            GamePhase::Resolving => "判定中…",
            GamePhase::Completed => "全部配对完成！",
        }
        .to_string(),
    );
    lines.join("\n")
}

pub fn render_summary(summary: &GameSummary) -> String {
    [
        "🎉 恭喜完成！".bold().to_string(),
        format!("  用时: {}", summary.formatted_time()),
        format!("  步数: {}", summary.moves),
        format!("  时间奖励: +{}   步数奖励: +{}", summary.time_bonus, summary.move_bonus),
        format!("  最终得分: {}", summary.score),
    ]
    .join("\n")
}

/// 事件对应的提示信息，翻牌和计时不需要额外提示
pub fn render_event(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::NewGame { .. } => Some("新的一局开始了。".to_string()),
        GameEvent::PairMatched { symbol, points, .. } => {
            Some(format!("配对成功 {} +{}", symbol, points).green().to_string())
        }
        GameEvent::PairMismatched { .. } => Some("没有配对，牌已翻回。".red().to_string()),
        GameEvent::Completed(summary) => Some(render_summary(summary)),
        GameEvent::Started { .. }
        | GameEvent::CardRevealed { .. }
        | GameEvent::PairFlipped { .. }
        | GameEvent::Tick { .. } => None,
    }
}

pub fn render_leaderboard(entries: &[LeaderboardEntry]) -> String {
    let mut lines = vec!["🏆 排行榜".bold().to_string()];
    if entries.is_empty() {
        lines.push("还没有成绩，玩一局开始吧！".to_string());
    }
    for (rank, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "  #{:<2} {:<20} {:>5}  {}  {} 步",
            rank + 1,
            entry.name,
            entry.score,
            entry.time,
            entry.moves
        ));
    }
    lines.join("\n")
}
