use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::thread;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(
    name = "bgm-player",
    version,
    about = "后台随机播放音乐（Rust + rodio）"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// 覆盖数据目录（默认走系统 data_local_dir）
    #[arg(long, env = "BGM_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// 覆盖日志目录（默认 `{data_dir}/logs`）
    #[arg(long, env = "BGM_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// 覆盖日志过滤（等价于设置 RUST_LOG）
    #[arg(long, env = "RUST_LOG")]
    pub log_filter: Option<String>,

    /// 覆盖曲目目录（默认 `{data_dir}/audio`）
    #[arg(long, env = "BGM_MUSIC_DIR")]
    pub music_dir: Option<PathBuf>,

    /// 不打开音频设备，使用静音输出
    #[arg(long)]
    pub no_audio: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 交互运行（默认）：从 stdin 读取 on / off / toggle / status / quit
    Run,

    /// 列出曲目目录中可播放的曲目
    List,
}

/// 交互模式下的一行输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    On,
    Off,
    Toggle,
    Status,
    Quit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "on" | "enable" => Some(Self::On),
            "off" | "disable" => Some(Self::Off),
            "toggle" | "t" => Some(Self::Toggle),
            "status" | "s" => Some(Self::Status),
            "quit" | "exit" | "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// 在独立线程上逐行读取输入，通过 channel 转发
///
/// 阻塞读取不占用 tokio 运行时，进程退出时不需要等它返回。
/// 读到 EOF 或读取出错后 channel 关闭。
pub fn spawn_line_reader<R>(reader: R) -> io::Result<mpsc::UnboundedReceiver<io::Result<String>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("bgm-stdin".to_owned())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
            tracing::debug!("输入读取线程结束");
        })?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_repl_commands() {
        assert_eq!(ReplCommand::parse(" ON \n"), Some(ReplCommand::On));
        assert_eq!(ReplCommand::parse("disable"), Some(ReplCommand::Off));
        assert_eq!(ReplCommand::parse("q"), Some(ReplCommand::Quit));
        assert_eq!(ReplCommand::parse("play"), None);
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::try_parse_from(["bgm-player", "--no-audio", "--music-dir", "/tmp/m", "list"])
            .expect("parse");
        assert!(cli.no_audio);
        assert_eq!(cli.music_dir, Some(PathBuf::from("/tmp/m")));
        assert!(matches!(cli.command, Some(Command::List)));
    }

    #[test]
    fn line_reader_forwards_lines_then_closes() {
        let input = io::Cursor::new("on\n\nstatus\n");
        let mut rx = spawn_line_reader(input).expect("spawn");

        let mut lines = Vec::new();
        while let Some(line) = rx.blocking_recv() {
            lines.push(line.expect("line"));
        }
        assert_eq!(lines, ["on", "", "status"]);
    }
}
