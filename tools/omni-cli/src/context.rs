//! CLI execution context.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use omni_core::omni_auth::OtpMode;
use omni_core::omni_cache::SessionId;
use omni_core::{init_logging, Backend, ShopperSession, StoreConfig, Storefront};

use crate::output::Output;

/// Config file names looked for from the working directory upwards.
const CONFIG_NAMES: [&str; 3] = ["omnistore.toml", ".omnistore.toml", "omnistore.json"];

/// Global flags.
pub struct Settings {
    pub config_path: Option<PathBuf>,
    pub data: Option<PathBuf>,
    pub session: Option<String>,
    pub verbose: bool,
}

impl Settings {
    /// The configuration the CLI runs with: file plus environment, forced
    /// onto the file backend and local OTP mode.
    pub fn store_config(&self) -> Result<StoreConfig> {
        let path = match &self.config_path {
            Some(path) => Some(path.clone()),
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                find_config(&cwd)
            }
        };

        let mut config =
            StoreConfig::load_with_env(path.as_deref()).context("Failed to load configuration")?;

        config.store.backend = Backend::File;
        if let Some(data) = &self.data {
            config.store.path = data.clone();
        }
        // No SMS provider is wired into the CLI.
        config.otp.mode = OtpMode::Local;
        if self.verbose {
            config.logging.level = "debug".to_string();
        }

        Ok(config)
    }
}

/// Execution context for CLI commands.
pub struct Context {
    /// The opened storefront.
    pub store: Storefront,
    /// Output handler.
    pub output: Output,
    /// The visitor session this invocation acts as.
    pub session_id: SessionId,
}

impl Context {
    /// Resolve config, install logging, open the store and pick the session.
    pub async fn load(settings: &Settings, output: Output) -> Result<Self> {
        let config = settings.store_config()?;
        init_logging(&config.logging)?;

        let session_id = match &settings.session {
            Some(id) => SessionId::new(id.as_str()),
            None => load_or_create_session(&session_file(&config.store.path))?,
        };
        output.debug(&format!("store: {}", config.store.path.display()));
        output.debug(&format!("session: {}", session_id));

        let store = Storefront::open(config)
            .await
            .context("Failed to open store")?;

        Ok(Self {
            store,
            output,
            session_id,
        })
    }

    /// The current visitor.
    pub async fn shopper(&self) -> Result<ShopperSession> {
        Ok(self.store.session(self.session_id.clone()).await?)
    }
}

/// Where the session id for a store file is remembered.
pub fn session_file(store_path: &Path) -> PathBuf {
    store_path.with_extension("session")
}

fn load_or_create_session(path: &Path) -> Result<SessionId> {
    match std::fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => Ok(SessionId::new(content.trim())),
        Ok(_) => create_session(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => create_session(path),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn create_session(path: &Path) -> Result<SessionId> {
    let id = SessionId::generate();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, id.as_str())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(id)
}

/// Find a config file in the directory tree.
fn find_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for name in &CONFIG_NAMES {
            let candidate = current.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
