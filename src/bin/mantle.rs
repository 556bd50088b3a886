use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use mantle_shell::actor::config::ConfigActor;
use mantle_shell::actor::config_watcher::ConfigWatcher;
use mantle_shell::actor::desktop::{Desktop, DesktopEvent};
use mantle_shell::actor::icons::IconLoader;
use mantle_shell::actor::tasks::Tasks;
use mantle_shell::common::config::{Config, config_file};
use mantle_shell::common::log;
use mantle_shell::sys::app::{NullCatalog, NullIconExtractor};
use mantle_shell::sys::background::SourceRenderer;
use mantle_shell::sys::geometry::Size;
use mantle_shell::sys::shell::{NullShellOps, WindowHandle};
use tokio::task::LocalSet;

#[derive(Parser)]
struct Cli {
    /// Check the configuration file without starting the shell.
    #[arg(long)]
    validate: bool,

    /// Run without claiming the session shell role (desktop bounds and
    /// background stay under OS control).
    #[arg(long)]
    no_shell: bool,

    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    let opt = Cli::parse();

    if std::env::var_os("RUST_BACKTRACE").is_none() {
        // SAFETY: We are single threaded at this point.
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }
    log::init_logging();

    let config_path = opt.config.clone().unwrap_or_else(config_file);
    let mut config = if config_path.exists() {
        match Config::read(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{e:#}");
                process::exit(1);
            }
        }
    } else {
        Config::default()
    };
    config.desktop.run_as_shell &= !opt.no_shell;

    if opt.validate {
        let issues = config.validate();
        if issues.is_empty() {
            println!("Config validation passed");
            return;
        }
        for issue in issues {
            eprintln!("{issue}");
        }
        process::exit(1);
    }
    for issue in config.validate() {
        tracing::warn!("config: {issue}");
    }

    let (broadcast_tx, mut broadcast_rx) = mantle_shell::actor::channel();

    // This binary runs the engine with logging host stubs; a platform host
    // links the library and supplies real shell operations instead.
    let ops = Arc::new(NullShellOps);
    let (desktop, desktop_tx) = Desktop::new(
        config.desktop.clone(),
        ops,
        Box::new(SourceRenderer),
        broadcast_tx.clone(),
    );

    let icons = IconLoader::spawn(Arc::new(NullIconExtractor));
    let (tasks, _tasks_tx) = Tasks::new(
        Arc::new(NullCatalog),
        icons,
        broadcast_tx.clone(),
        config.taskbar.icon_size,
        config.taskbar.group_by_application,
    );

    let config_tx = ConfigActor::spawn_with_path(config.clone(), desktop_tx.clone(), config_path.clone());
    ConfigWatcher::spawn(config_tx, config.clone(), config_path);

    let desktop_tx_for_signal = desktop_tx.clone();
    ctrlc::set_handler(move || {
        desktop_tx_for_signal.send(DesktopEvent::ShuttingDown);
    })
    .expect("Error setting Ctrl+C handler");

    if config.desktop.enable_desktop {
        // Stand-in for the host's window creation; the handle is synthetic
        // and every native call lands in the logging stubs.
        desktop_tx.send(DesktopEvent::WindowCreated {
            handle: WindowHandle::new(1).expect("nonzero handle"),
            display: Size::new(1920, 1080),
        });
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("failed to build runtime");
    let local = LocalSet::new();
    local.block_on(&runtime, async move {
        let drain = async move {
            while let Some((_span, event)) = broadcast_rx.recv().await {
                tracing::debug!(?event, "broadcast");
            }
        };
        tokio::select! {
            _ = desktop.run() => {}
            _ = tasks.run() => {}
            _ = drain => {}
        }
    });
}
