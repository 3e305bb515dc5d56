//! macro-deck
//!
//! Global keyboard/mouse macro recorder and player driven by hotkeys.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use macro_deck::config::Config;
use macro_deck::control::{create_engine_channels, hotkey_handler, EngineCommand, MacroEngine};
use macro_deck::input::{create_input_hook, create_simulator};
use macro_deck::logging;
use macro_deck::player::Player;
use macro_deck::recorder::Recorder;
use macro_deck::store::FileStore;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // Held until exit so buffered file logs are flushed
    let _log_guard = logging::init_logging()?;
    info!("macro-deck starting...");
    if let Ok(dir) = logging::get_log_dir() {
        info!("Logging to {:?}", dir);
    }

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded from {:?}", config.config_path()?);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;

    let store = Arc::new(FileStore::new(config.settings_path()?));
    info!("Macros stored in {:?}", store.path());

    let hook = create_input_hook();
    let simulator = create_simulator();

    let record_key = config.record_hotkey();
    let play_key = config.play_hotkey();

    let recorder = Recorder::new(hook.clone(), store.clone())
        .with_ignored_keys([record_key.clone(), play_key.clone()]);
    let player = Player::new(simulator, store, config.player_config());

    // Create engine channels
    let (cmd_tx, cmd_rx, status_tx, status_rx) = create_engine_channels();
    let mut engine = MacroEngine::new(recorder, player, cmd_rx, status_tx);

    let hotkeys = hook
        .subscribe(hotkey_handler(
            record_key.clone(),
            play_key.clone(),
            cmd_tx.clone(),
        ))
        .context("Failed to install global input hook")?;
    info!(
        "Press {} to record, {} to play/stop, Ctrl+C to exit",
        record_key, play_key
    );

    runtime.spawn(report_status(status_rx));

    // Set up Ctrl+C handler that sends shutdown command
    let ctrl_c_tx = cmd_tx.clone();
    let handle = runtime.handle().clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        let tx = ctrl_c_tx.clone();
        handle.spawn(async move {
            let _ = tx.send(EngineCommand::Shutdown).await;
        });
    })?;

    if let Err(e) = runtime.block_on(engine.run()) {
        error!("Macro engine error: {}", e);
    }

    hook.unsubscribe(hotkeys);
    drop(engine);
    info!("Shutdown complete");
    Ok(())
}

/// Surface engine status changes to the user
async fn report_status(mut status_rx: broadcast::Receiver<macro_deck::control::EngineStatus>) {
    loop {
        match status_rx.recv().await {
            Ok(status) => println!("[{}]", status.label()),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Status reporter lagged by {} updates", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_help() {
    println!("macro-deck - Keyboard and mouse macro recorder");
    println!();
    println!("USAGE:");
    println!("    macro-deck [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help    Print this help message");
    println!();
    println!("Hotkeys, the settings file and playback limits are set in config.toml.");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG              Set log level (e.g., debug, info, warn)");
    println!("    MACRO_DECK_LOG_PATH   Override the log directory");
}
