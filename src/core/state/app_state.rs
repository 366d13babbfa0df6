use std::sync::Arc;

use tracing::info;

use crate::core::auth::{AuthChain, MsaDeviceCodeProvider, PromptFn, TokenCache};
use crate::core::config::LauncherConfig;
use crate::core::error::LauncherResult;
use crate::core::events::ProgressBus;
use crate::core::http::{HttpTransport, ReqwestTransport};
use crate::core::install::ProfileInstaller;
use crate::core::paths::LauncherPaths;
use crate::core::profile::ProfileManager;

/// Everything one launcher session shares: config, the HTTP transport and
/// the progress bus. Services are built on demand from it.
pub struct AppState {
    pub config: LauncherConfig,
    pub paths: LauncherPaths,
    pub transport: Arc<dyn HttpTransport>,
    pub bus: Arc<ProgressBus>,
}

impl AppState {
    pub fn new(config: LauncherConfig) -> LauncherResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: LauncherConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let paths = config.paths();
        info!("Launcher root: {:?}", paths.root());
        Self {
            config,
            paths,
            transport,
            bus: Arc::new(ProgressBus::new()),
        }
    }

    pub fn installer(&self) -> ProfileInstaller {
        ProfileInstaller::new(self.config.clone(), self.transport.clone(), self.bus.clone())
    }

    pub fn profiles(&self) -> ProfileManager {
        ProfileManager::new(self.config.clone(), self.transport.clone(), self.bus.clone())
    }

    /// Sign-in chain backed by the device-code provider and the login cache.
    pub fn auth_chain(&self, prompt: PromptFn) -> AuthChain {
        let identity = MsaDeviceCodeProvider::new(
            self.transport.clone(),
            self.config.auth.clone(),
            TokenCache::new(self.paths.login_cache_file()),
            prompt,
        );
        AuthChain::new(
            Arc::new(identity),
            self.transport.clone(),
            self.config.auth.clone(),
        )
    }
}
