pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod feed;
pub mod rules;
pub mod speech;
pub mod state;
pub mod tailer;
pub mod telemetry;

use speech::{CommandSink, LogSink, SpeechChannel, SpeechSink};
use tokio::sync::mpsc;

pub async fn run() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // Logging: rolling log file under <config dir>/logs/, rotated daily.
    // -----------------------------------------------------------------------
    let config_dir = config::config_dir();
    let log_dir = config_dir.join("logs");
    let _ = std::fs::create_dir_all(&log_dir);

    let file_appender = tracing_appender::rolling::daily(&log_dir, "voice-alerts.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Lives as long as the process; dropping it flushes and stops the writer.
    std::mem::forget(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("voice_alerts_lib=debug".parse()?),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    // -----------------------------------------------------------------------
    // Panic hook: log panics through tracing before the process dies.
    // -----------------------------------------------------------------------
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        tracing::error!("PANIC at {}: {}", location, message);
    }));

    tracing::info!("Voice alerts starting, logs at {}", log_dir.display());

    // --- Load config (or defaults on first run) ---
    let cfg = config::load_or_default(&config_dir)?;
    cfg.validate()?;

    if cfg.feed_path.as_os_str().is_empty() {
        tracing::warn!("No feed_path configured, writing defaults to {:?}", config_dir);
        config::save(&cfg, &config_dir)?;
        anyhow::bail!(
            "feed_path is not set; edit {} and restart",
            config_dir.join("config.toml").display()
        );
    }

    let mut speech = SpeechChannel::new(speech_sink(&cfg.speech));

    // --- Pipeline: tailer -> feed -> engine ---
    let (line_tx, line_rx)     = mpsc::channel::<String>(2048);
    let (record_tx, record_rx) = mpsc::channel::<feed::FeedRecord>(1024);

    let feed_path = cfg.feed_path.clone();
    let tailer = tokio::task::spawn_blocking(move || tailer::follow(feed_path, line_tx));
    let parser = tokio::spawn(feed::run(line_rx, record_tx));
    let engine = tokio::spawn(async move { engine::run(record_rx, &mut speech, &cfg).await });

    // The engine finishes once the feed side closes
    tokio::select! {
        res = engine => {
            res??;
            parser.await??;
            tailer.await??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }
    tracing::info!("Voice alerts stopped");
    Ok(())
}

fn speech_sink(cfg: &config::SpeechConfig) -> Box<dyn SpeechSink + Send> {
    match &cfg.command {
        Some(command) if !command.trim().is_empty() => {
            tracing::info!("Speech via {} {:?}", command, cfg.args);
            Box::new(CommandSink::new(command.clone(), cfg.args.clone()))
        }
        _ => {
            tracing::info!("No speech command configured, announcements are logged only");
            Box::new(LogSink)
        }
    }
}
