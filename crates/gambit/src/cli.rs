//! Command-line interface for the `gambit` binary.

use clap::{Parser, ValueEnum};

/// Gambit - two-player chess over WebSockets, with spectators
#[derive(Parser, Debug)]
#[command(name = "gambit")]
#[command(about = "Two-player chess over WebSockets, with spectators", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "GAMBIT_BIND", default_value = "127.0.0.1:3000")]
    pub bind: String,

    /// Drop connections that send nothing for this many seconds
    #[arg(long, env = "GAMBIT_IDLE_TIMEOUT_SECS", default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// Ping every connection this often, in seconds
    #[arg(
        long,
        env = "GAMBIT_HEARTBEAT_SECS",
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub heartbeat_secs: u64,

    /// Start (and reset) games from this FEN instead of the standard position
    #[arg(long, env = "GAMBIT_START_FEN")]
    pub start_fen: Option<String>,

    /// Log output format
    #[arg(long, env = "GAMBIT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, for terminals
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
}
