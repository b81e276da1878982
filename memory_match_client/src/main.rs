mod command;
mod config;
mod render;
mod session;

use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::ClientConfig;
use memory_match_core::{FileStorage, GameConfig, Leaderboard, MatchEngine};
use session::{Flow, Session};

type MainError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), MainError> {
    dotenvy::dotenv().ok();
    let config = ClientConfig::from_env()?;
    init_tracing(&config.log_filter);

    info!("排行榜目录: {}", config.data_dir.display());
    let leaderboard = Leaderboard::new(FileStorage::new(&config.data_dir));
    let mut session = Session::new(MatchEngine::new(GameConfig::default()), leaderboard);

    let mut stdout = std::io::stdout();
    session.start(Instant::now(), &mut stdout)?;

    // 所有状态都在这个任务里修改：输入行和定时唤醒轮流交给 session
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let deadline = session.next_deadline();
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if session.handle_line(&line, Instant::now(), &mut stdout)? == Flow::Quit {
                    break;
                }
            }
            _ = wait_until(deadline) => {
                session.advance(Instant::now(), &mut stdout)?;
            }
        }
    }

    println!("\n再见!");
    Ok(())
}

/// 日志写到 stderr，不和牌桌混在一起；`RUST_LOG` 优先于配置
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 没有待触发的任务时永远挂起
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
