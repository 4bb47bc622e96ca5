//! Opening a transfer manager for a configured remote
//!
//! Every object command follows the same lifecycle: resolve the profile,
//! load the trust store, run, then disconnect so newly trusted certificates
//! are written back.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use davsync_core::{ConfigManager, Error, ProfileManager, TransferManager, TrustStore};
use davsync_webdav::{WebdavSettings, WebdavTransferManager};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::exit_code::ExitCode;
use crate::interaction::ConsolePrompt;
use crate::output::Formatter;

pub struct Session {
    pub manager: WebdavTransferManager,
    progress: ProgressBar,
    show_progress: bool,
}

fn load_trust_store(config_manager: &ConfigManager) -> anyhow::Result<Arc<TrustStore>> {
    let path = config_manager.trust_store_path();
    let store = TrustStore::load(&path)
        .with_context(|| format!("Failed to load trust store {}", path.display()))?;
    Ok(Arc::new(store))
}

impl Session {
    /// Resolve `remote` and build its transfer manager
    pub fn open(remote: &str, formatter: &Formatter) -> Result<Self, ExitCode> {
        let config_manager = match ConfigManager::new() {
            Ok(cm) => cm,
            Err(e) => {
                formatter.error(&format!("Failed to locate configuration: {e}"));
                return Err(ExitCode::GeneralError);
            }
        };
        let trust_store = match load_trust_store(&config_manager) {
            Ok(store) => store,
            Err(e) => {
                formatter.error(&format!("{e:#}"));
                return Err(ExitCode::GeneralError);
            }
        };

        let profiles = ProfileManager::with_config_manager(config_manager);
        let profile = match profiles.get(remote) {
            Ok(p) => p,
            Err(Error::ProfileNotFound(_)) => {
                formatter.error(&format!("Remote '{remote}' not found"));
                return Err(ExitCode::NotFound);
            }
            Err(e) => {
                formatter.error(&format!("Failed to load remotes: {e}"));
                return Err(ExitCode::GeneralError);
            }
        };

        let settings = match WebdavSettings::try_from(&profile) {
            Ok(s) => s,
            Err(e) => {
                formatter.error(&format!("Remote '{remote}' is misconfigured: {e}"));
                return Err(ExitCode::UsageError);
            }
        };
        tracing::debug!(%settings, "Opening session");

        let progress = ProgressBar::hidden();
        let prompt = ConsolePrompt::new(progress.clone(), formatter.colors_enabled());
        let manager = match WebdavTransferManager::new(settings, trust_store) {
            Ok(m) => m.with_interaction_listener(Arc::new(prompt)),
            Err(e) => {
                formatter.error(&e.to_string());
                return Err(ExitCode::from_error(&e));
            }
        };

        Ok(Self {
            manager,
            progress,
            show_progress: !formatter.is_json() && !formatter.is_quiet(),
        })
    }

    /// Show a spinner with `message` until [`Session::finish`]
    pub fn spinner(&self, message: String) {
        if !self.show_progress {
            return;
        }
        self.progress.set_draw_target(ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            self.progress.set_style(style);
        }
        self.progress.set_message(message);
        self.progress.enable_steady_tick(Duration::from_millis(100));
    }

    /// Report a failed operation and pick the exit code
    pub fn fail(&self, formatter: &Formatter, context: &str, error: &Error) -> ExitCode {
        self.progress.finish_and_clear();
        formatter.error(&format!("{context}: {error}"));
        ExitCode::from_error(error)
    }

    /// Disconnect, persisting the trust store; `code` passes through unless
    /// the disconnect itself fails after a success
    pub async fn finish(mut self, formatter: &Formatter, code: ExitCode) -> ExitCode {
        self.progress.finish_and_clear();
        match self.manager.disconnect().await {
            Ok(()) => code,
            Err(e) => {
                formatter.warning(&format!("Failed to save trust store: {e}"));
                if code == ExitCode::Success {
                    ExitCode::GeneralError
                } else {
                    code
                }
            }
        }
    }
}
