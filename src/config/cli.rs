use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "huat-leads")]
#[command(about = "Lead capture and click tracking backed by Google Sheets")]
pub struct Cli {
    /// TOML 設定檔；省略時只讀環境變數
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 啟動 HTTP API（預設）
    Serve {
        /// 覆寫 [server] bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// 把整張表輸出成 CSV
    Export {
        #[arg(long, short, default_value = "leads.csv")]
        output: PathBuf,
    },
    /// 重送失敗紀錄中的資料
    Replay,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Serve { bind: None })
    }
}
