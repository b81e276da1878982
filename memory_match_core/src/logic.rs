use crate::card::*;
use crate::error::SelectRejection;
use crate::message::{GameEvent, PlayerInput};
use crate::state::*;
use crate::timer::{Resolution, Task, TimerQueue};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

// --- 计分规则 ---

/// 每对配对成功时的得分：基础分，外加步数未超过 2 倍对数时的速度奖励
pub fn match_points(config: &GameConfig, moves: u32, total_pairs: u32) -> u32 {
    let mut points = config.base_match_score;
    if moves <= total_pairs * 2 {
        points += config.speed_bonus;
    }
    points
}

/// 时间奖励 = max(0, 1000 - 10 × 整秒数)
pub fn time_bonus(config: &GameConfig, elapsed: Duration) -> u32 {
    let penalty = elapsed.as_secs().saturating_mul(u64::from(config.time_bonus_per_second));
    u64::from(config.time_bonus_max).saturating_sub(penalty) as u32
}

/// 步数奖励 = max(0, 500 - 5 × 步数)
pub fn move_bonus(config: &GameConfig, moves: u32) -> u32 {
    config
        .move_bonus_max
        .saturating_sub(moves.saturating_mul(config.move_bonus_per_move))
}

// --- 核心游戏流程 ---

impl MatchEngine {
    /// 用系统随机源洗一副新牌
    pub fn new(config: GameConfig) -> Self {
        let rng = StdRng::from_rng(&mut rand::rng());
        Self::with_rng(config, rng)
    }

    /// 固定随机种子，相同种子得到相同的牌序
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: GameConfig, mut rng: StdRng) -> Self {
        let deck = Deck::shuffled(&mut rng);
        Self::build(config, rng, deck)
    }

    /// 使用指定牌序开局；之后的新局仍然随机洗牌
    pub fn with_deck(config: GameConfig, deck: Deck) -> Self {
        let rng = StdRng::from_rng(&mut rand::rng());
        Self::build(config, rng, deck)
    }

    fn build(config: GameConfig, rng: StdRng, deck: Deck) -> Self {
        MatchEngine {
            config,
            rng,
            game_id: Uuid::new_v4(),
            deck,
            selection: Vec::with_capacity(2),
            phase: GamePhase::NotStarted,
            score: ScoreState::default(),
            started_at: None,
            final_elapsed: None,
            timers: TimerQueue::new(),
            pending_resolution: None,
            clock_tick: None,
            summary: None,
        }
    }

    /// 开始新的一局
    ///
    /// 任何阶段都可以调用。先取消所有未触发的判定和计时任务，
    /// 再重新洗牌、清零计数，旧局的延迟任务不可能再作用到新局上。
    pub fn start_new_game(&mut self) -> GameEvent {
        if let Some(id) = self.pending_resolution.take() {
            self.timers.cancel(id);
        }
        if let Some(id) = self.clock_tick.take() {
            self.timers.cancel(id);
        }
        debug_assert!(self.timers.is_empty());

        self.deck = Deck::shuffled(&mut self.rng);
        self.game_id = Uuid::new_v4();
        self.selection.clear();
        self.phase = GamePhase::NotStarted;
        self.score = ScoreState::default();
        self.started_at = None;
        self.final_elapsed = None;
        self.summary = None;

        info!(game_id = %self.game_id, "新的一局已洗牌");
        GameEvent::NewGame { game_id: self.game_id }
    }

    /// 分发输入源的事件
    pub fn handle_input(&mut self, input: PlayerInput, now: Instant) -> Vec<GameEvent> {
        match input {
            PlayerInput::SelectCard(index) => self.select(index, now),
            PlayerInput::NewGame => vec![self.start_new_game()],
        }
    }

    /// 选中一张牌，不合法的选择是静默的空操作
    pub fn select(&mut self, index: usize, now: Instant) -> Vec<GameEvent> {
        match self.try_select(index, now) {
            Ok(events) => events,
            Err(reason) => {
                debug!(game_id = %self.game_id, index, %reason, "忽略选牌");
                Vec::new()
            }
        }
    }

    /// 选中一张牌，被拒绝时返回原因且不改变任何状态
    ///
    /// - 第一次选牌把游戏从 NotStarted 推进到 InProgress，并开始计时。
    /// - 选中第二张牌后步数加一，进入 Resolving，按是否配对调度延迟判定。
    pub fn try_select(
        &mut self,
        index: usize,
        now: Instant,
    ) -> Result<Vec<GameEvent>, SelectRejection> {
        match self.phase {
            GamePhase::Completed => return Err(SelectRejection::GameCompleted),
            GamePhase::Resolving => return Err(SelectRejection::SelectionFull),
            GamePhase::NotStarted | GamePhase::InProgress => {}
        }
        if self.selection.len() >= 2 {
            return Err(SelectRejection::SelectionFull);
        }

        let len = self.deck.len();
        let card = *self
            .deck
            .get(index)
            .ok_or(SelectRejection::OutOfRange { index, len })?;
        match card.status {
            CardStatus::Matched => return Err(SelectRejection::AlreadyMatched(index)),
            CardStatus::Revealed => return Err(SelectRejection::AlreadyRevealed(index)),
            CardStatus::Hidden => {}
        }

        let mut events = Vec::new();
        if self.phase == GamePhase::NotStarted {
            self.start_clock(now);
            events.push(GameEvent::Started { game_id: self.game_id });
        }

        self.set_status(index, CardStatus::Revealed);
        self.selection.push(index);
        events.push(GameEvent::CardRevealed { index, symbol: card.symbol });

        if self.selection.len() == 2 {
            events.push(self.begin_resolution(now));
        }
        Ok(events)
    }

    /// 触发所有已到期的定时任务，按到期先后处理
    pub fn advance(&mut self, now: Instant) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Some((id, deadline, task)) = self.timers.pop_due(now) {
            match task {
                Task::Resolve(resolution) => {
                    if self.pending_resolution == Some(id) {
                        self.pending_resolution = None;
                    }
                    self.resolve(resolution, deadline, &mut events);
                }
                Task::ClockTick => {
                    if self.clock_tick == Some(id) {
                        self.clock_tick = None;
                    }
                    self.on_tick(deadline, &mut events);
                }
            }
        }
        events
    }

    /// 下一个定时任务的到期时间，驱动方据此安排唤醒
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // --- 辅助逻辑函数 ---

    fn start_clock(&mut self, now: Instant) {
        self.started_at = Some(now);
        self.phase = GamePhase::InProgress;
        let deadline = now + self.config.tick_interval;
        self.clock_tick = Some(self.timers.schedule(deadline, Task::ClockTick));
        info!(game_id = %self.game_id, "开始计时");
    }

    fn set_status(&mut self, index: usize, status: CardStatus) {
        if let Some(card) = self.deck.get_mut(index) {
            card.status = status;
        }
    }

    /// 两张牌都已翻开：步数加一，比较符号并调度判定任务
    fn begin_resolution(&mut self, now: Instant) -> GameEvent {
        let (first, second) = (self.selection[0], self.selection[1]);
        self.score.moves += 1;
        self.phase = GamePhase::Resolving;

        let symbol = self.deck.cards()[first].symbol;
        let matched = symbol == self.deck.cards()[second].symbol;
        let delay = if matched { self.config.match_delay } else { self.config.mismatch_delay };
        let resolution = Resolution { first, second, symbol, matched };
        let id = self.timers.schedule(now + delay, Task::Resolve(resolution));
        self.pending_resolution = Some(id);

        debug!(
            game_id = %self.game_id,
            first,
            second,
            matched,
            moves = self.score.moves,
            "等待判定"
        );
        GameEvent::PairFlipped { first, second, moves: self.score.moves }
    }

    fn resolve(&mut self, resolution: Resolution, at: Instant, events: &mut Vec<GameEvent>) {
        let Resolution { first, second, symbol, matched } = resolution;
        self.selection.clear();

        if !matched {
            self.set_status(first, CardStatus::Hidden);
            self.set_status(second, CardStatus::Hidden);
            self.phase = GamePhase::InProgress;
            events.push(GameEvent::PairMismatched { first, second });
            return;
        }

        self.set_status(first, CardStatus::Matched);
        self.set_status(second, CardStatus::Matched);
        self.score.matched_pairs += 1;
        let points = match_points(&self.config, self.score.moves, self.total_pairs());
        self.score.score += points;

        events.push(GameEvent::PairMatched {
            first,
            second,
            symbol,
            points,
            matched_pairs: self.score.matched_pairs,
        });

        if self.score.matched_pairs == self.total_pairs() {
            events.push(self.complete(at));
        } else {
            self.phase = GamePhase::InProgress;
        }
    }

    /// 所有牌配对完成：停表，加上时间奖励与步数奖励
    fn complete(&mut self, at: Instant) -> GameEvent {
        self.phase = GamePhase::Completed;
        if let Some(id) = self.clock_tick.take() {
            self.timers.cancel(id);
        }

        let elapsed = self
            .started_at
            .map_or(Duration::ZERO, |start| at.saturating_duration_since(start));
        self.final_elapsed = Some(elapsed);

        let time_bonus = time_bonus(&self.config, elapsed);
        let move_bonus = move_bonus(&self.config, self.score.moves);
        self.score.score += time_bonus + move_bonus;

        let summary = GameSummary {
            game_id: self.game_id,
            score: self.score.score,
            moves: self.score.moves,
            elapsed,
            time_bonus,
            move_bonus,
        };
        self.summary = Some(summary);

        info!(
            game_id = %self.game_id,
            score = summary.score,
            moves = summary.moves,
            time = %summary.formatted_time(),
            "本局完成"
        );
        GameEvent::Completed(summary)
    }

    fn on_tick(&mut self, at: Instant, events: &mut Vec<GameEvent>) {
        if self.phase == GamePhase::Completed || self.phase == GamePhase::NotStarted {
            return;
        }
        events.push(GameEvent::Tick { elapsed: self.elapsed(at) });
        let deadline = at + self.config.tick_interval;
        self.clock_tick = Some(self.timers.schedule(deadline, Task::ClockTick));
    }

    // --- 只读访问 ---

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn moves(&self) -> u32 {
        self.score.moves
    }

    pub fn score(&self) -> u32 {
        self.score.score
    }

    pub fn matched_pairs(&self) -> u32 {
        self.score.matched_pairs
    }

    pub fn score_state(&self) -> ScoreState {
        self.score
    }

    pub fn total_pairs(&self) -> u32 {
        (self.deck.len() / 2) as u32
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.deck.get(index)
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// 已翻开但未判定的牌
    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    /// 是否有一对牌在等待判定
    pub fn has_pending_resolution(&self) -> bool {
        self.pending_resolution.is_some()
    }

    /// 本局结算结果，仅在 Completed 之后存在
    pub fn summary(&self) -> Option<GameSummary> {
        self.summary
    }

    pub fn is_completed(&self) -> bool {
        self.phase == GamePhase::Completed
    }

    /// 从第一次翻牌起的耗时，结束后保持不变
    pub fn elapsed(&self, now: Instant) -> Duration {
        if let Some(elapsed) = self.final_elapsed {
            return elapsed;
        }
        self.started_at
            .map_or(Duration::ZERO, |start| now.saturating_duration_since(start))
    }

    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        let cards = self
            .deck
            .cards()
            .iter()
            .map(|card| CardView {
                index: card.index,
                status: card.status,
                symbol: card.is_face_up().then_some(card.symbol),
            })
            .collect();

        GameSnapshot {
            game_id: self.game_id,
            phase: self.phase,
            cards,
            moves: self.score.moves,
            score: self.score.score,
            matched_pairs: self.score.matched_pairs,
            total_pairs: self.total_pairs(),
            elapsed: self.elapsed(now),
        }
    }
}

// --- 单元测试 ---
