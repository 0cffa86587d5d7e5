use bgm_player::audio_worker::{
    AudioBackend, DirTrackSource, NotificationSink, PlaybackNotice, TrackSource,
};
use bgm_player::cli::{Cli, Command, ReplCommand, spawn_line_reader};
use bgm_player::error::AppError;
use bgm_player::logging;
use bgm_player::player::AudioPlayer;
use bgm_player::settings::{default_data_dir, load_settings};
use clap::Parser;
use std::env;
use std::io::{self, BufReader};
use std::sync::Arc;

/// 把通知打印到终端
struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, notice: &PlaybackNotice) {
        tracing::warn!(notice = ?notice, "播放通知");
        println!("{}", notice.message());
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);

    let no_audio_env = env::var("BGM_NO_AUDIO")
        .ok()
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false);
    let backend = if cli.no_audio || no_audio_env {
        AudioBackend::Null
    } else {
        AudioBackend::Real
    };

    let _log_guard = logging::init(
        &data_dir,
        logging::LogConfig {
            dir: cli.log_dir.clone(),
            filter: cli.log_filter.clone(),
            stderr: true,
        },
    );
    tracing::info!(data_dir = %data_dir.display(), ?backend, "bgm-player 启动");

    let mut settings = load_settings(&data_dir);
    if let Some(dir) = cli.music_dir.clone() {
        settings.music_dir = Some(dir);
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::List => {
            let source = DirTrackSource::new(settings.music_dir(&data_dir), &settings.track_extension);
            let tracks = source.enumerate();
            println!("{}: {} 首", source.describe(), tracks.len());
            for track in tracks {
                println!("  {}", track.path().display());
            }
            Ok(())
        }
        Command::Run => {
            let player = AudioPlayer::with_factory(
                &data_dir,
                settings,
                backend.device_factory(),
                Arc::new(ConsoleNotifier),
            );
            run_interactive(player).await
        }
    }
}

async fn run_interactive(mut player: AudioPlayer) -> Result<(), AppError> {
    println!("命令: on / off / toggle / status / quit");
    // 读取线程在 Ctrl-C 后仍可能阻塞在 stdin 上，不等待它
    let mut lines = spawn_line_reader(BufReader::new(io::stdin()))?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到 Ctrl-C");
                break;
            }
            line = lines.recv() => {
                let Some(line) = line.transpose()? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let Some(cmd) = ReplCommand::parse(&line) else {
                    println!("未知命令: {}", line.trim());
                    continue;
                };
                let result = match cmd {
                    ReplCommand::On => player.set_music(true),
                    ReplCommand::Off => player.set_music(false),
                    ReplCommand::Toggle => {
                        let next = !player.is_music_enabled();
                        player.set_music(next)
                    }
                    ReplCommand::Status => Ok(()),
                    ReplCommand::Quit => break,
                };
                if let Err(e) = result {
                    println!("{e}");
                }
                let state = if player.is_music_enabled() { "on" } else { "off" };
                println!("{}: {state}", player.music().label());
            }
        }
    }

    player.shutdown();
    tracing::info!("bgm-player 退出");
    Ok(())
}
