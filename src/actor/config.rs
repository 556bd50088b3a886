//! Owns the authoritative configuration and applies changes to it.
//!
//! Commands arrive over the actor channel; accepted changes are validated
//! and republished to the desktop actor as `ConfigUpdated`.

use std::path::PathBuf;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::actor::{self, desktop};
use crate::common::config::{Config, ConfigCommand};

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[derive(Debug)]
pub enum Event {
    QueryConfig(oneshot::Sender<Config>),
    ApplyConfig {
        cmd: ConfigCommand,
        response: oneshot::Sender<Result<(), String>>,
    },
}

pub struct ConfigActor {
    config: Config,
    desktop_tx: desktop::Sender,
    config_path: PathBuf,
}

impl ConfigActor {
    pub fn spawn(config: Config, desktop_tx: desktop::Sender) -> Sender {
        Self::spawn_with_path(config, desktop_tx, crate::common::config::config_file())
    }

    pub fn spawn_with_path(
        config: Config,
        desktop_tx: desktop::Sender,
        config_path: PathBuf,
    ) -> Sender {
        let (tx, rx) = actor::channel();
        std::thread::Builder::new()
            .name("config".to_string())
            .spawn(move || {
                let actor = ConfigActor { config, desktop_tx, config_path };
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .expect("failed to build config actor runtime");
                runtime.block_on(actor.run(rx));
            })
            .expect("failed to spawn config thread");
        tx
    }

    async fn run(mut self, mut events: Receiver) {
        while let Some((span, event)) = events.recv().await {
            let _guard = span.enter();
            match event {
                Event::QueryConfig(response) => {
                    _ = response.send(self.config.clone());
                }
                Event::ApplyConfig { cmd, response } => {
                    _ = response.send(self.handle_config_command(cmd));
                }
            }
        }
    }

    fn handle_config_command(&mut self, cmd: ConfigCommand) -> Result<(), String> {
        debug!("applying config command: {:?}", cmd);

        let mut new_config = self.config.clone();

        match cmd {
            ConfigCommand::SetOverlayHotkeyEnabled(enabled) => {
                new_config.desktop.overlay_hotkey_enabled = enabled;
                info!("updated overlay_hotkey_enabled to: {enabled}");
            }
            ConfigCommand::SetBackgroundSource(source) => {
                new_config.desktop.background.source = source;
                info!("updated background source to: {source:?}");
            }

            ConfigCommand::Set { key, value } => {
                let mut cfg_val = serde_json::to_value(&new_config)
                    .map_err(|e| format!("failed to serialize config for modification: {e}"))?;

                let parts: Vec<&str> = key.split('.').collect();
                if parts.iter().any(|part| part.is_empty()) {
                    return Err(format!("invalid config key: {key:?}"));
                }
                let mut cur = &mut cfg_val;
                let (last, prefix) = parts.split_last().expect("parts is non-empty");
                for part in prefix {
                    let Some(obj) = cur.as_object_mut() else {
                        return Err(format!("invalid config path: {key}"));
                    };
                    cur = obj
                        .entry(part.to_string())
                        .or_insert_with(|| serde_json::json!({}));
                }
                let Some(obj) = cur.as_object_mut() else {
                    return Err(format!("invalid config path: {key}"));
                };
                obj.insert(last.to_string(), value.clone());

                new_config = serde_json::from_value(cfg_val).map_err(|e| {
                    format!("failed to deserialize config after setting {key:?}: {e}")
                })?;
                info!("updated {key} to {value}");
            }

            ConfigCommand::ShowConfig => {
                let config_json = serde_json::to_string_pretty(&self.config)
                    .unwrap_or_else(|e| format!("error serializing config: {e}"));
                info!("current config:\n{config_json}");
                return Ok(());
            }
            ConfigCommand::SaveConfig => {
                return match self.config.save(&self.config_path) {
                    Ok(()) => {
                        info!("config saved to {}", self.config_path.display());
                        Ok(())
                    }
                    Err(e) => Err(format!("failed to save config: {e}")),
                };
            }
            ConfigCommand::ReloadConfig => {
                if !self.config_path.exists() {
                    return Err("config file not found".to_string());
                }
                new_config = Config::read(&self.config_path)
                    .map_err(|e| format!("failed to reload config: {e}"))?;
                info!("config reloaded from {}", self.config_path.display());
            }
        }

        let issues = new_config.validate();
        if !issues.is_empty() {
            return Err(issues.join("; "));
        }

        if new_config != self.config {
            self.config = new_config;
            self.desktop_tx.send(desktop::DesktopEvent::ConfigUpdated(Box::new(
                self.config.clone(),
            )));
        }

        Ok(())
    }
}
