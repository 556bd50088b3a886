//! Watches the configuration file and triggers reloads.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, thread};

use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, DebouncedEvent, DebouncedEventKind, new_debouncer};
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

use crate::actor::config::{self as config_actor, Event as ConfigEvent};
use crate::common::config::{Config, ConfigCommand};

pub struct ConfigWatcher {
    file: PathBuf,
    real_file: Option<PathBuf>,
    config_tx: config_actor::Sender,
    enabled: bool,
}

impl ConfigWatcher {
    pub fn spawn(config_tx: config_actor::Sender, config: Config, config_path: PathBuf) {
        thread::Builder::new()
            .name("config-watcher".to_string())
            .spawn(move || {
                let real_file = fs::canonicalize(&config_path).ok();
                let actor = ConfigWatcher {
                    file: config_path,
                    real_file,
                    config_tx,
                    enabled: config.hot_reload,
                };
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .expect("failed to build config-watcher runtime");
                runtime.block_on(async move {
                    if let Err(e) = actor.run().await {
                        warn!("config-watcher: error: {e:?}");
                    }
                });
            })
            .expect("failed to spawn config-watcher thread");
    }

    async fn run(mut self) -> notify::Result<()> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<DebouncedEvent>();

        let mut debouncer =
            new_debouncer(Duration::from_millis(250), move |res: DebounceEventResult| {
                if let Ok(events) = res {
                    for e in events {
                        if e.kind == DebouncedEventKind::Any {
                            let _ = tx.send(e);
                        }
                    }
                }
            })?;

        let watcher = debouncer.watcher();
        let mut dirs: Vec<&Path> = Vec::new();
        for dir in [self.file.parent(), self.real_file.as_deref().and_then(|p| p.parent())]
            .into_iter()
            .flatten()
        {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        let mut watched = false;
        for dir in dirs {
            if watcher.watch(dir, RecursiveMode::NonRecursive).is_ok() {
                info!("watching {:?}", dir);
                watched = true;
            }
        }
        if !watched {
            debug!("no config directory to watch; watcher idle");
            return Ok(());
        }

        while let Some(event) = rx.recv().await {
            if !self.is_relevant(&event) {
                continue;
            }
            trace!("change detected (debounced): {:?} {:?}", event.kind, event.path);

            if !self.enabled {
                debug!("hot reload disabled; ignoring config change");
                continue;
            }

            match self.request_reload().await {
                Ok(()) => {
                    if let Some(new_config) = self.query_config().await {
                        self.enabled = new_config.hot_reload;
                    }
                    debug!("config reloaded successfully");
                }
                Err(e) => warn!("config reload failed: {e}"),
            }
        }

        Ok(())
    }

    fn is_relevant(&self, event: &DebouncedEvent) -> bool {
        if event.path == self.file {
            return true;
        }
        if let Some(real) = &self.real_file {
            if event.path == *real {
                return true;
            }
            if let Ok(ev_real) = fs::canonicalize(&event.path)
                && ev_real == *real
            {
                return true;
            }
        }
        event.path.file_name().is_some_and(|n| Some(n) == self.file.file_name())
    }

    async fn request_reload(&self) -> Result<(), String> {
        info!("requesting config reload");
        let (tx, rx) = oneshot::channel();
        self.config_tx
            .try_send(ConfigEvent::ApplyConfig {
                cmd: ConfigCommand::ReloadConfig,
                response: tx,
            })
            .map_err(|_| "config actor unavailable".to_string())?;
        rx.await.map_err(|_| "config actor dropped the request".to_string())?
    }

    async fn query_config(&self) -> Option<Config> {
        let (tx, rx) = oneshot::channel();
        self.config_tx.try_send(ConfigEvent::QueryConfig(tx)).ok()?;
        rx.await.ok()
    }
}
