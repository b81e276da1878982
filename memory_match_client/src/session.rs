use crate::command::{Command, HELP};
use crate::render;
use chrono::Utc;
use crossterm::style::Stylize;
use memory_match_core::{
    GameEvent, GameSummary, Leaderboard, LeaderboardEntry, MatchEngine, PlayerName, Storage,
};
use std::io::{self, Write};
use std::time::Instant;
use tracing::{info, warn};

const SKIP_NAME: &str = "skip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// 一次终端会话：把输入行和定时唤醒交给引擎，再把结果画出来
///
/// 所有状态都在这一个结构里，由主循环按顺序调用，不需要加锁。
pub struct Session<S: Storage> {
    engine: MatchEngine,
    leaderboard: Leaderboard<S>,
    // 本局已结束，下一行输入当作玩家名字
    awaiting_name: Option<GameSummary>,
    // 下次重绘时显示在牌桌下方的提示
    notices: Vec<String>,
}

impl<S: Storage> Session<S> {
    pub fn new(engine: MatchEngine, leaderboard: Leaderboard<S>) -> Self {
        Session {
            engine,
            leaderboard,
            awaiting_name: None,
            notices: Vec::new(),
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.engine.next_deadline()
    }

    pub fn start<W: Write>(&mut self, now: Instant, out: &mut W) -> io::Result<()> {
        self.notices.push(HELP.to_string());
        self.redraw(now, out)
    }

    /// 处理一行输入
    pub fn handle_line<W: Write>(
        &mut self,
        line: &str,
        now: Instant,
        out: &mut W,
    ) -> io::Result<Flow> {
        if self.awaiting_name.is_some() {
            return self.handle_name(line, now, out);
        }

        match Command::parse(line) {
            Ok(None) => {}
            Ok(Some(Command::Flip(index))) => match self.engine.try_select(index, now) {
                Ok(events) => self.absorb(events),
                Err(reason) => self.notices.push(reason.to_string().dark_grey().to_string()),
            },
            Ok(Some(Command::NewGame)) => {
                let event = self.engine.start_new_game();
                self.absorb(vec![event]);
            }
            Ok(Some(Command::Board)) => {}
            Ok(Some(Command::Leaderboard)) => {
                let entries = self.leaderboard.load();
                self.notices.push(render::render_leaderboard(&entries));
            }
            Ok(Some(Command::Help)) => self.notices.push(HELP.to_string()),
            Ok(Some(Command::Quit)) => return Ok(Flow::Quit),
            Err(message) => self.notices.push(message.red().to_string()),
        }

        self.redraw(now, out)?;
        Ok(Flow::Continue)
    }

    /// 定时唤醒：触发到期的判定与计时
    pub fn advance<W: Write>(&mut self, now: Instant, out: &mut W) -> io::Result<()> {
        let events = self.engine.advance(now);
        if events.iter().any(GameEvent::changes_board) {
            self.absorb(events);
            self.redraw(now, out)
        } else {
            render::set_clock_title(out, &self.engine.snapshot(now).formatted_time())
        }
    }

    fn absorb(&mut self, events: Vec<GameEvent>) {
        for event in events {
            if let Some(message) = render::render_event(&event) {
                self.notices.push(message);
            }
            if let GameEvent::Completed(summary) = event {
                self.awaiting_name = Some(summary);
                self.notices.push(format!(
                    "输入你的名字保存成绩 (1-20 个字符，输入 {} 跳过，n 直接开新局，q 退出):",
                    SKIP_NAME
                ));
            }
        }
    }

    /// 名字输入阶段：退出和开新局命令照常生效，成绩不保存
    fn handle_name<W: Write>(&mut self, line: &str, now: Instant, out: &mut W) -> io::Result<Flow> {
        let Some(summary) = self.awaiting_name else {
            return Ok(Flow::Continue);
        };

        match Command::parse(line) {
            Ok(Some(Command::Quit)) => {
                self.awaiting_name = None;
                return Ok(Flow::Quit);
            }
            Ok(Some(Command::NewGame)) => {
                self.awaiting_name = None;
                let event = self.engine.start_new_game();
                self.absorb(vec![event]);
                self.redraw(now, out)?;
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        if line.trim().eq_ignore_ascii_case(SKIP_NAME) {
            self.awaiting_name = None;
            self.notices.push("成绩未保存。输入 n 开始新的一局。".to_string());
            self.redraw(now, out)?;
            return Ok(Flow::Continue);
        }

        let name = match PlayerName::parse(line) {
            Ok(name) => name,
            Err(e) => {
                // 名字不合法时不改动任何状态，继续等待输入
                writeln!(out, "{}", e.to_string().red())?;
                write!(out, "名字> ")?;
                out.flush()?;
                return Ok(Flow::Continue);
            }
        };

        let entry = LeaderboardEntry::from_summary(name, &summary, Utc::now());
        match self.leaderboard.submit(entry) {
            Ok(entries) => {
                info!(game_id = %summary.game_id, score = summary.score, "成绩已保存");
                self.notices.push(render::render_leaderboard(&entries));
            }
            Err(e) => {
                warn!("保存成绩失败: {}", e);
                self.notices.push(format!("保存成绩失败: {}", e).red().to_string());
            }
        }
        self.awaiting_name = None;
        self.notices.push("输入 n 开始新的一局。".to_string());
        self.redraw(now, out)?;
        Ok(Flow::Continue)
    }

    fn redraw<W: Write>(&mut self, now: Instant, out: &mut W) -> io::Result<()> {
        let snapshot = self.engine.snapshot(now);
        render::clear_screen(out)?;
        render::set_clock_title(out, &snapshot.formatted_time())?;
        writeln!(out, "{}", render::render_board(&snapshot))?;
        for notice in self.notices.drain(..) {
            writeln!(out, "{}", notice)?;
        }
        write!(out, "{}", if self.awaiting_name.is_some() { "名字> " } else { "> " })?;
        out.flush()
    }
}

#[cfg(test)]
impl<S: Storage> Session<S> {
    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn leaderboard(&self) -> &Leaderboard<S> {
        &self.leaderboard
    }

    pub fn is_awaiting_name(&self) -> bool {
        self.awaiting_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_match_core::{CardStatus, Deck, GameConfig, GamePhase, MemoryStorage, Symbol};
    use std::time::Duration;

    // (0,1) (2,3) ... 是配对
    fn setup_session() -> (Session<MemoryStorage>, Instant, Vec<u8>) {
        let layout: Vec<Symbol> = Symbol::ALL.iter().flat_map(|s| [*s, *s]).collect();
        let deck = Deck::from_symbols(&layout).unwrap();
        let engine = MatchEngine::with_deck(GameConfig::default(), deck);
        let session = Session::new(engine, Leaderboard::new(MemoryStorage::new()));
        (session, Instant::now(), Vec::new())
    }

    fn finish_game(
        session: &mut Session<MemoryStorage>,
        t0: Instant,
        out: &mut Vec<u8>,
    ) -> Instant {
        let mut now = t0;
        for pair in 0..8 {
            session.handle_line(&(pair * 2 + 1).to_string(), now, out).unwrap();
            session.handle_line(&(pair * 2 + 2).to_string(), now, out).unwrap();
            now += Duration::from_millis(500);
            session.advance(now, out).unwrap();
        }
        now
    }

    #[test]
    fn test_flip_matching_pair() {
        let (mut session, t0, mut out) = setup_session();
        session.handle_line("1", t0, &mut out).unwrap();
        session.handle_line("flip 2", t0, &mut out).unwrap();
        assert_eq!(session.engine().phase(), GamePhase::Resolving);

        out.clear();
        session.advance(t0 + Duration::from_millis(500), &mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("+150"));
        assert_eq!(session.engine().card(0).unwrap().status, CardStatus::Matched);
    }

    #[test]
    fn test_rejected_flip_leaves_state_alone() {
        let (mut session, t0, mut out) = setup_session();
        session.handle_line("1", t0, &mut out).unwrap();
        out.clear();
        session.handle_line("1", t0, &mut out).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("这张牌已经翻开了"));
        assert_eq!(session.engine().moves(), 0);
    }

    #[test]
    fn test_completed_game_saves_named_score() {
        let (mut session, t0, mut out) = setup_session();
        let now = finish_game(&mut session, t0, &mut out);
        assert!(session.is_awaiting_name());
        let score = session.engine().score();

        // 不合法的名字会被拒绝，继续等待
        out.clear();
        session.handle_line("   ", now, &mut out).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("请输入你的名字"));
        assert!(session.is_awaiting_name());
        session.handle_line(&"x".repeat(21), now, &mut out).unwrap();
        assert!(session.is_awaiting_name());
        assert!(session.leaderboard().load().is_empty());

        session.handle_line("  Ann ", now, &mut out).unwrap();
        assert!(!session.is_awaiting_name());
        let entries = session.leaderboard().load();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Ann");
        assert_eq!(entries[0].score, score);
        assert_eq!(entries[0].time, "00:04");
        assert_eq!(entries[0].moves, 8);
    }

    #[test]
    fn test_quit_at_name_prompt_saves_nothing() {
        let (mut session, t0, mut out) = setup_session();
        let now = finish_game(&mut session, t0, &mut out);
        assert!(session.is_awaiting_name());

        assert_eq!(session.handle_line("q", now, &mut out).unwrap(), Flow::Quit);
        assert!(!session.is_awaiting_name());
        assert!(session.leaderboard().load().is_empty());
    }

    #[test]
    fn test_new_game_at_name_prompt_saves_nothing() {
        let (mut session, t0, mut out) = setup_session();
        let now = finish_game(&mut session, t0, &mut out);

        assert_eq!(session.handle_line("n", now, &mut out).unwrap(), Flow::Continue);
        assert!(!session.is_awaiting_name());
        assert!(session.leaderboard().load().is_empty());
        assert_eq!(session.engine().phase(), GamePhase::NotStarted);
        assert_eq!(session.engine().score(), 0);
    }

    #[test]
    fn test_skip_name() {
        let (mut session, t0, mut out) = setup_session();
        let now = finish_game(&mut session, t0, &mut out);
        session.handle_line("skip", now, &mut out).unwrap();
        assert!(!session.is_awaiting_name());
        assert!(session.leaderboard().load().is_empty());
    }

    #[test]
    fn test_new_game_mid_resolution() {
        let (mut session, t0, mut out) = setup_session();
        session.handle_line("1", t0, &mut out).unwrap();
        session.handle_line("3", t0, &mut out).unwrap();
        session.handle_line("n", t0, &mut out).unwrap();
        assert_eq!(session.next_deadline(), None);
        assert_eq!(session.engine().phase(), GamePhase::NotStarted);

        session.advance(t0 + Duration::from_secs(2), &mut out).unwrap();
        assert_eq!(session.engine().moves(), 0);
    }

    #[test]
    fn test_quit_and_unknown_command() {
        let (mut session, t0, mut out) = setup_session();
        assert_eq!(session.handle_line("dance", t0, &mut out).unwrap(), Flow::Continue);
        assert!(String::from_utf8_lossy(&out).contains("未知命令"));
        assert_eq!(session.handle_line("q", t0, &mut out).unwrap(), Flow::Quit);
    }
}
