use crate::error::{LeaderboardError, NameError};
use crate::state::{GameSummary, parse_elapsed};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, warn};

/// 排行榜在存储中使用的键
pub const LEADERBOARD_KEY: &str = "memoryMatchLeaderboard";
/// 排行榜最多保留的条目数
pub const MAX_ENTRIES: usize = 10;
/// 玩家名字的最大长度 (按 UTF-16 码元计，和浏览器里字符串的 length 一致)
pub const MAX_NAME_LEN: usize = 20;

// --- 存储后端 ---

/// 键值存储，排行榜只通过它读写
pub trait Storage {
    /// 键不存在时返回 `Ok(None)`
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// 每个键对应数据目录下的一个 `<key>.json` 文件
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        // 先写临时文件再改名，写到一半失败不会破坏旧数据
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }
}

/// 内存存储，进程退出即丢失
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// --- 排行榜数据 ---

/// 校验过的玩家名字：去掉首尾空白后 1-20 个 UTF-16 码元
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn parse(raw: &str) -> Result<PlayerName, NameError> {
        let trimmed = raw.trim();
        let len = trimmed.encode_utf16().count();
        if len == 0 {
            return Err(NameError::Empty);
        }
        if len > MAX_NAME_LEN {
            return Err(NameError::TooLong { len });
        }
        Ok(PlayerName(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 持久化的一条成绩
///
/// JSON 形如 `{"name": "...", "score": 1860, "time": "01:05", "moves": 12, "date": "2024-05-01T12:00:00.000Z"}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    pub time: String, // MM:SS
    pub moves: u32,
    pub date: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn from_summary(name: PlayerName, summary: &GameSummary, date: DateTime<Utc>) -> Self {
        LeaderboardEntry {
            name: name.0,
            score: summary.score,
            time: summary.formatted_time(),
            moves: summary.moves,
            date,
        }
    }
}

/// 用于比较用时的键：能解析的 `MM:SS` 按秒数升序，解析不了的排在最后
fn time_rank(time: &str) -> (bool, u64) {
    match parse_elapsed(time) {
        Some(elapsed) => (false, elapsed.as_secs()),
        None => (true, 0),
    }
}

/// 分数从高到低，同分时用时短的在前，最后截断到前 10 名
///
/// 排序是稳定的，完全相同的成绩保持原有先后顺序。
pub fn rank_entries(entries: &mut Vec<LeaderboardEntry>) {
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| time_rank(&a.time).cmp(&time_rank(&b.time)))
    });
    entries.truncate(MAX_ENTRIES);
}

// --- 排行榜存取 ---

#[derive(Debug, Clone)]
pub struct Leaderboard<S: Storage> {
    storage: S,
}

impl<S: Storage> Leaderboard<S> {
    pub fn new(storage: S) -> Self {
        Leaderboard { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 读取排行榜
    ///
    /// 存储不可用或数据损坏时返回空列表，不会把错误抛给调用方。
    pub fn load(&self) -> Vec<LeaderboardEntry> {
        let raw = match self.storage.read(LEADERBOARD_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("读取排行榜失败: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<LeaderboardEntry>>(&raw) {
            Ok(mut entries) => {
                rank_entries(&mut entries);
                entries
            }
            Err(e) => {
                warn!("排行榜数据已损坏，按空列表处理: {}", e);
                Vec::new()
            }
        }
    }

    /// 插入一条成绩，排序、截断并写回存储，返回新的排行榜
    pub fn submit(
        &mut self,
        entry: LeaderboardEntry,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let mut entries = self.load();
        entries.push(entry);
        rank_entries(&mut entries);

        let payload = serde_json::to_string(&entries)?;
        self.storage.write(LEADERBOARD_KEY, &payload)?;
        debug!(count = entries.len(), "排行榜已保存");
        Ok(entries)
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use uuid::Uuid;

    fn entry(name: &str, score: u32, time: &str) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            score,
            time: time.to_string(),
            moves: 10,
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn names(entries: &[LeaderboardEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    // 读失败 / 写失败的存储
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn read(&self, _key: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }

        fn write(&mut self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_player_name_validation() {
        assert_eq!(PlayerName::parse("  Alice  ").unwrap().as_str(), "Alice");
        assert_eq!(PlayerName::parse("   "), Err(NameError::Empty));
        assert_eq!(PlayerName::parse(""), Err(NameError::Empty));
        assert!(PlayerName::parse(&"a".repeat(20)).is_ok());
        assert_eq!(PlayerName::parse(&"a".repeat(21)), Err(NameError::TooLong { len: 21 }));
        // 按 UTF-16 码元而不是字节计数
        assert!(PlayerName::parse(&"记".repeat(20)).is_ok());
    }

    #[test]
    fn test_player_name_counts_utf16_units() {
        // 表情符号占两个码元
        assert!(PlayerName::parse(&"😀".repeat(10)).is_ok());
        assert_eq!(PlayerName::parse(&"😀".repeat(11)), Err(NameError::TooLong { len: 22 }));
        assert_eq!(PlayerName::parse(&"😀".repeat(20)), Err(NameError::TooLong { len: 40 }));
    }

    #[test]
    fn test_rank_by_score_then_time() {
        let mut entries = vec![
            entry("slow", 1500, "01:30"),
            entry("best", 1800, "02:00"),
            entry("fast", 1500, "00:45"),
            entry("broken", 1500, "??"),
        ];
        rank_entries(&mut entries);
        assert_eq!(names(&entries), vec!["best", "fast", "slow", "broken"]);
    }

    #[test]
    fn test_time_tie_break_is_numeric() {
        // 字符串比较会把 "100:00" 排在 "20:00" 前面
        let mut entries = vec![entry("long", 900, "100:00"), entry("short", 900, "20:00")];
        rank_entries(&mut entries);
        assert_eq!(names(&entries), vec!["short", "long"]);
    }

    #[test]
    fn test_submit_keeps_top_ten() {
        let mut board = Leaderboard::new(MemoryStorage::new());
        for i in 0..15u32 {
            let entries = board.submit(entry(&format!("p{i}"), i * 100, "01:00")).unwrap();
            assert!(entries.len() <= MAX_ENTRIES);
        }

        let entries = board.load();
        assert_eq!(entries.len(), MAX_ENTRIES);
        assert_eq!(entries[0].name, "p14");
        assert_eq!(entries[9].name, "p5");
        assert!(entries.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_submit_from_summary() {
        let mut board = Leaderboard::new(MemoryStorage::new());
        let summary = GameSummary {
            game_id: Uuid::new_v4(),
            score: 2150,
            moves: 12,
            elapsed: Duration::from_secs(65),
            time_bonus: 350,
            move_bonus: 440,
        };
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let name = PlayerName::parse("Bob").unwrap();
        let entries = board.submit(LeaderboardEntry::from_summary(name, &summary, date)).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].time, "01:05");
        assert_eq!(entries[0].score, 2150);
        assert_eq!(entries[0].moves, 12);
    }

    #[test]
    fn test_corrupt_storage_reads_as_empty() {
        let mut storage = MemoryStorage::new();
        storage.write(LEADERBOARD_KEY, "{not json").unwrap();
        let mut board = Leaderboard::new(storage);
        assert!(board.load().is_empty());

        // 损坏的数据会在下次提交时被覆盖
        let entries = board.submit(entry("a", 100, "00:10")).unwrap();
        assert_eq!(names(&entries), vec!["a"]);
    }

    #[test]
    fn test_unavailable_storage_degrades() {
        let mut board = Leaderboard::new(BrokenStorage);
        assert!(board.load().is_empty());
        let err = board.submit(entry("a", 100, "00:10")).unwrap_err();
        assert!(matches!(err, LeaderboardError::Io(_)));
    }

    #[test]
    fn test_reads_browser_style_records() {
        let raw = r#"[
            {"name":"Ann","score":1200,"time":"01:10","moves":14,"date":"2024-05-01T12:00:00.000Z"},
            {"name":"Ben","score":1900,"time":"00:50","moves":9,"date":"2024-05-02T08:30:00.000Z"}
        ]"#;
        let mut storage = MemoryStorage::new();
        storage.write(LEADERBOARD_KEY, raw).unwrap();
        let entries = Leaderboard::new(storage).load();
        assert_eq!(names(&entries), vec!["Ben", "Ann"]);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir()
            .join(format!("memory_match_test_{}", Uuid::new_v4().simple()));
        let mut board = Leaderboard::new(FileStorage::new(&dir));
        assert!(board.load().is_empty());

        board.submit(entry("a", 300, "00:30")).unwrap();
        board.submit(entry("b", 500, "00:40")).unwrap();
        assert!(board.storage().path_for(LEADERBOARD_KEY).exists());

        let reopened = Leaderboard::new(FileStorage::new(&dir));
        assert_eq!(names(&reopened.load()), vec!["b", "a"]);

        let _ = fs::remove_dir_all(&dir);
    }
}
