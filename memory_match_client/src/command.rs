/// 玩家在终端里输入的一条命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 翻开某个位置的牌 (已转换成从 0 开始)
    Flip(usize),
    NewGame,
    Board,
    Leaderboard,
    Help,
    Quit,
}

pub const HELP: &str = "\
可用命令:
  <位置>  或  flip <位置>   - 翻开一张牌 (位置 1-16)
  n, new                    - 重新开始一局
  b, board                  - 重新显示牌桌
  l, leaderboard            - 查看排行榜
  h, help                   - 显示帮助
  q, quit                   - 退出";

impl Command {
    /// 解析一行输入，空行返回 `Ok(None)`
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = parts.first() else {
            return Ok(None);
        };

        let command = match first.to_ascii_lowercase().as_str() {
            "flip" | "f" => {
                let Some(position) = parts.get(1) else {
                    return Err("用法: flip <位置>".to_string());
                };
                Command::Flip(parse_position(position)?)
            }
            "n" | "new" => Command::NewGame,
            "b" | "board" => Command::Board,
            "l" | "leaderboard" => Command::Leaderboard,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other if other.bytes().all(|b| b.is_ascii_digit()) => {
                Command::Flip(parse_position(other)?)
            }
            _ => return Err(format!("未知命令: {}", line.trim())),
        };
        Ok(Some(command))
    }
}

/// 玩家看到的位置从 1 开始
fn parse_position(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("无效的位置: {}", text)),
    }
}
