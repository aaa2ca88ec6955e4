use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;
use board::base_url::normalize_base_url;
use board::client::LeaderboardClient;
use board::config::Config;
use board::cycle::LeaderboardSync;
use board::sinks::{BoardSnapshot, BoardState};

const USAGE: &str = "usage: leaderboard-web [run|once|normalize <url>] [--config <path>]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run,
    Once,
    Normalize { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub config_path: Option<String>,
}

pub fn parse_args<I>(args: I) -> std::result::Result<Invocation, String>
where
    I: Iterator<Item = String>,
{
    // Drop argv[0].
    let mut rest: Vec<String> = args.skip(1).collect();

    let config_path = match rest.iter().position(|a| a == "--config") {
        Some(i) => {
            if i + 1 >= rest.len() {
                return Err(USAGE.to_string());
            }
            let path = rest.remove(i + 1);
            rest.remove(i);
            Some(path)
        }
        None => None,
    };

    let mut rest = rest.into_iter();
    let command = match rest.next().as_deref() {
        None | Some("run") => Command::Run,
        Some("once") => Command::Once,
        Some("normalize") => {
            let url = rest
                .next()
                .ok_or_else(|| "usage: leaderboard-web normalize <url>".to_string())?;
            Command::Normalize { url }
        }
        Some(other) => return Err(format!("unknown command: {other}\n{USAGE}")),
    };

    if let Some(extra) = rest.next() {
        return Err(format!("unexpected argument: {extra}\n{USAGE}"));
    }

    Ok(Invocation {
        command,
        config_path,
    })
}

pub fn show_normalized(url: &str) {
    println!("{}", normalize_base_url(Some(url)));
}

/// Run a single cycle and print the board. Fails when the cycle fails.
pub async fn run_once(config: &Config) -> Result<()> {
    let board = Arc::new(BoardState::default());
    let client = LeaderboardClient::from_config(&config.backend)?;
    let sync = LeaderboardSync::new(
        config.backend.base_url.clone(),
        client,
        board.clone(),
        board.clone(),
    )
    .with_badges(config.badges.clone());

    let outcome = sync.run_once().await;
    let snap = board.snapshot();
    print!("{}", format_board(&snap));

    if outcome.is_failure() {
        anyhow::bail!("leaderboard cycle failed: {}", snap.status);
    }
    Ok(())
}

pub fn format_board(snap: &BoardSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", snap.status);
    if snap.rows.is_empty() {
        return out;
    }

    let _ = writeln!(
        out,
        "{:>4}  {:<20} {:<44} {:>14} {:>12} {:>12}  FLAGS",
        "#", "TRADER", "ADDRESS", "PORTFOLIO", "REALIZED", "UNREALIZED"
    );
    for row in &snap.rows {
        let flags: String = row.badges.iter().map(|b| b.label.as_str()).collect();
        let _ = writeln!(
            out,
            "{:>4}  {:<20} {:<44} {:>14} {:>12} {:>12}  {}",
            row.rank,
            row.trader.name,
            row.trader.address,
            row.portfolio,
            row.realized.text,
            row.unrealized.text,
            flags
        );
    }
    out
}
