use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::errors::ConfigError;
use crate::evaluator::ModerationEvaluator;
use crate::loader::{apply_overlay, load_config_with_options, validate_config, LoadOptions};
use crate::model::{ConfigSource, ModerationConfig};
use crate::override_store::RuntimeOverrideStore;

pub trait ModerationCenter: Send + Sync {
    fn snapshot(&self) -> Arc<ModerationConfig>;
    /// Publishes `config` as the new base, with runtime overrides replayed on top,
    /// and returns the new revision.
    fn replace(&self, config: ModerationConfig) -> u64;
    fn reload(&self) -> Result<u64, ConfigError>;
    /// Overrides one configuration path, e.g. `warned` or `links.appeal`. The
    /// override outlives later reloads until cleared.
    fn apply_override(&self, path: &str, value: Value) -> Result<u64, ConfigError>;
    fn clear_override(&self, path: &str) -> Result<u64, ConfigError>;
    fn subscribe(&self) -> watch::Receiver<Arc<ModerationConfig>>;

    fn evaluator(&self) -> ModerationEvaluator {
        ModerationEvaluator::new(self.snapshot())
    }
}

struct CenterState {
    base: ModerationConfig,
    overrides: RuntimeOverrideStore,
    /// Files present at the last successful load; reload refuses to drop them.
    watched: Vec<PathBuf>,
}

impl CenterState {
    fn compose(&self) -> Result<ModerationConfig, ConfigError> {
        compose(&self.base, &self.overrides)
    }
}

fn compose(
    base: &ModerationConfig,
    overrides: &RuntimeOverrideStore,
) -> Result<ModerationConfig, ConfigError> {
    let mut config = base.clone();
    if overrides.is_empty() {
        return Ok(config);
    }
    for entry in overrides.entries() {
        apply_overlay(&mut config, &entry.path, entry.value.clone(), ConfigSource::Runtime)?;
    }
    validate_config(&config)?;
    Ok(config)
}

fn existing_paths(options: &LoadOptions) -> Vec<PathBuf> {
    options
        .paths
        .iter()
        .filter(|path| path.exists())
        .cloned()
        .collect()
}

/// Process-wide holder of the current configuration.
///
/// Readers load the whole snapshot through one atomic pointer read, so a
/// concurrent reload is observed either entirely or not at all.
pub struct SharedModerationCenter {
    current: ArcSwap<ModerationConfig>,
    options: LoadOptions,
    state: Mutex<CenterState>,
    watch_tx: watch::Sender<Arc<ModerationConfig>>,
}

impl SharedModerationCenter {
    pub fn new(config: ModerationConfig) -> Self {
        Self::with_options(config, LoadOptions::default())
    }

    pub fn with_options(config: ModerationConfig, options: LoadOptions) -> Self {
        let current = Arc::new(config.clone());
        let (watch_tx, _watch_rx) = watch::channel(Arc::clone(&current));
        let state = CenterState {
            base: config,
            overrides: RuntimeOverrideStore::default(),
            watched: existing_paths(&options),
        };
        Self {
            current: ArcSwap::new(current),
            options,
            state: Mutex::new(state),
            watch_tx,
        }
    }

    /// Loads the configuration described by `options` and keeps them for later reloads.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let config = load_config_with_options(&options)?;
        Ok(Self::with_options(config, options))
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    fn reload_locked(&self, state: &mut CenterState) -> Result<u64, ConfigError> {
        if let Some(missing) = state.watched.iter().find(|path| !path.exists()) {
            return Err(ConfigError::Io(format!(
                "{}: configuration file no longer exists",
                missing.display()
            )));
        }
        let base = load_config_with_options(&self.options)?;
        let composed = compose(&base, &state.overrides)?;
        state.base = base;
        state.watched = existing_paths(&self.options);
        Ok(self.publish_locked(composed))
    }

    // Callers hold `state`.
    fn publish_locked(&self, mut config: ModerationConfig) -> u64 {
        let rev = self.current.load().rev.saturating_add(1);
        config.rev = rev;
        let next = Arc::new(config);
        self.current.store(Arc::clone(&next));
        info!(
            rev,
            blocked = next.blocked.len(),
            warned = next.warned.len(),
            "moderation configuration published"
        );
        self.watch_tx.send_replace(next);
        rev
    }
}

impl ModerationCenter for SharedModerationCenter {
    fn snapshot(&self) -> Arc<ModerationConfig> {
        self.current.load_full()
    }

    fn replace(&self, config: ModerationConfig) -> u64 {
        let mut state = self.state.lock();
        state.base = config;
        let composed = match state.compose() {
            Ok(composed) => composed,
            Err(err) => {
                warn!("runtime overrides no longer apply, publishing base only: {err}");
                state.base.clone()
            }
        };
        self.publish_locked(composed)
    }

    fn reload(&self) -> Result<u64, ConfigError> {
        let mut state = self.state.lock();
        self.reload_locked(&mut state).map_err(|err| {
            warn!("moderation configuration reload failed, keeping current: {err}");
            err
        })
    }

    fn apply_override(&self, path: &str, value: Value) -> Result<u64, ConfigError> {
        let mut state = self.state.lock();
        let previous = state.overrides.clone();
        state.overrides.insert(path.to_string(), value);
        match state.compose() {
            Ok(composed) => Ok(self.publish_locked(composed)),
            Err(err) => {
                state.overrides = previous;
                Err(err)
            }
        }
    }

    fn clear_override(&self, path: &str) -> Result<u64, ConfigError> {
        let mut state = self.state.lock();
        let previous = state.overrides.clone();
        if !state.overrides.remove(path) {
            return Ok(self.current.load().rev);
        }
        match state.compose() {
            Ok(composed) => Ok(self.publish_locked(composed)),
            Err(err) => {
                state.overrides = previous;
                Err(err)
            }
        }
    }

    fn subscribe(&self) -> watch::Receiver<Arc<ModerationConfig>> {
        self.watch_tx.subscribe()
    }
}
