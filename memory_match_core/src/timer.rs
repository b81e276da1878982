use crate::card::Symbol;
use std::time::Instant;

/// 已调度任务的句柄，用来取消任务
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// 一对翻开的牌等待判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub first: usize,
    pub second: usize,
    pub symbol: Symbol, // 第一张牌的符号
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// 延迟判定一对牌 (配对 / 不配对)
    Resolve(Resolution),
    /// 每秒一次的计时刷新
    ClockTick,
}

#[derive(Debug, Clone)]
struct Scheduled {
    id: TimerId,
    deadline: Instant,
    task: Task,
}

/// 游戏实例持有的定时任务队列
///
/// 队列里最多只有一个判定任务和一个计时任务，线性扫描足够。
/// 到期顺序按 deadline，deadline 相同时按调度先后。
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    next_id: u64,
    entries: Vec<Scheduled>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Instant, task: Task) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Scheduled { id, deadline, task });
        id
    }

    /// 取消任务，任务已触发或不存在时返回 false
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|s| s.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.entries.iter().any(|s| s.id == id)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|s| s.deadline).min()
    }

    /// 取出最早一个已到期的任务
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, Instant, Task)> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, s)| s.deadline <= now)
            .min_by_key(|(_, s)| (s.deadline, s.id))
            .map(|(i, _)| i)?;
        let s = self.entries.remove(pos);
        Some((s.id, s.deadline, s.task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_pop_due_in_deadline_order() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        let late = queue.schedule(t0 + Duration::from_millis(900), Task::ClockTick);
        let early = queue.schedule(
            t0 + Duration::from_millis(100),
            Task::Resolve(Resolution { first: 0, second: 1, symbol: Symbol::Dice, matched: true }),
        );

        assert_eq!(queue.next_deadline(), Some(t0 + Duration::from_millis(100)));
        assert!(queue.pop_due(t0).is_none());

        let now = t0 + Duration::from_secs(1);
        assert_eq!(queue.pop_due(now).map(|(id, ..)| id), Some(early));
        assert_eq!(queue.pop_due(now).map(|(id, ..)| id), Some(late));
        assert!(queue.pop_due(now).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_same_deadline_fires_in_schedule_order() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        let a = queue.schedule(t0, Task::ClockTick);
        let b = queue.schedule(t0, Task::ClockTick);
        assert_eq!(queue.pop_due(t0).map(|(id, ..)| id), Some(a));
        assert_eq!(queue.pop_due(t0).map(|(id, ..)| id), Some(b));
    }

    #[test]
    fn test_cancelled_task_never_fires() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        let id = queue.schedule(t0, Task::ClockTick);
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(!queue.contains(id));
        assert!(queue.pop_due(t0 + Duration::from_secs(10)).is_none());
        assert_eq!(queue.next_deadline(), None);
    }

    #[test]
    fn test_ids_stay_unique_after_clear() {
        let t0 = Instant::now();
        let mut queue = TimerQueue::new();
        let old = queue.schedule(t0, Task::ClockTick);
        queue.clear();
        let new = queue.schedule(t0, Task::ClockTick);
        assert_ne!(old, new);
        assert!(!queue.cancel(old));
        assert_eq!(queue.len(), 1);
    }
}
