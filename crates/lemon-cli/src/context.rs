//! Composition root: builds the session manager from CLI settings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use directories::ProjectDirs;

use lemon_core::{AuthApi, BaseUrl, ClientConfig, DemoAuthApi, SessionManager};
use lemon_file::FileSecureStore;
use lemon_http::{HttpAuthApi, ReqwestTransport};

use crate::cli::ConnectionArgs;

/// Everything a command needs.
pub struct Context {
    pub manager: SessionManager,
    pub data_dir: PathBuf,
    pub demo: bool,
}

impl Context {
    pub fn new(args: &ConnectionArgs) -> Result<Self> {
        let base_url = BaseUrl::new(&args.base_url).context("Invalid base URL")?;
        let config = ClientConfig::new(base_url)
            .with_timeout(Duration::from_millis(args.timeout_ms))
            .with_retry_attempts(args.retries)
            .with_retry_base_delay(Duration::from_millis(args.retry_delay_ms));

        let data_dir = match args.data_dir {
            Some(ref dir) => dir.clone(),
            None => default_data_dir()?,
        };

        let transport = Arc::new(ReqwestTransport::new().context("Failed to build HTTP client")?);
        let auth: Arc<dyn AuthApi> = if args.demo {
            Arc::new(DemoAuthApi::new().with_latency(Duration::from_millis(200)))
        } else {
            Arc::new(HttpAuthApi::new(&config, transport.clone()))
        };

        let manager = SessionManager::new(
            config,
            Arc::new(FileSecureStore::new(&data_dir)),
            transport,
            auth,
        );

        Ok(Self {
            manager,
            data_dir,
            demo: args.demo,
        })
    }
}

/// Per-user data directory, e.g. `~/.local/share/lemon` on Linux.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "lemon").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("session"))
}
