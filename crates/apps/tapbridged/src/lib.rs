//! Process-level wiring of the bridge: one capture store, one recorder, one
//! scan registry and one loopback endpoint, started and stopped together.

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tapbridge_capture::{TrafficRecorder, TrafficStore};
use tapbridge_rpc::{register_default_methods, Host, MethodRegistry, RegistryError, ScanRegistry};
use tapbridge_rpc_server::{RpcServer, ServerConfig, ServerError, ServerHandle};

pub use config::{BridgeConfig, ConfigError, DEFAULT_PORT};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// A running bridge.
pub struct Bridge {
    recorder: Arc<TrafficRecorder>,
    scans: Arc<ScanRegistry>,
    server: ServerHandle,
}

impl Bridge {
    pub async fn start(config: BridgeConfig, host: Arc<dyn Host>) -> Result<Self, BridgeError> {
        config.validate()?;

        let store = Arc::new(TrafficStore::new(config.max_requests_per_domain));
        let recorder = Arc::new(TrafficRecorder::new(Arc::clone(&store), config.max_body_size));
        let scans = Arc::new(ScanRegistry::new());

        let mut registry = MethodRegistry::new();
        register_default_methods(&mut registry, store, host, Arc::clone(&scans))?;
        let dispatcher = Arc::new(registry.build());
        log::debug!("bridge: methods {:?}", dispatcher.method_names());

        let server_config = ServerConfig { port: config.port, auth_token: config.auth_token };
        let server = RpcServer::bind(server_config, dispatcher).await?.spawn()?;
        log::info!(
            "bridge: started on ws://{} (max {} per domain, body ceiling {} bytes)",
            server.local_addr(),
            config.max_requests_per_domain,
            config.max_body_size
        );
        Ok(Self { recorder, scans, server })
    }

    /// Hand this to the host's traffic notification hook.
    pub fn recorder(&self) -> &Arc<TrafficRecorder> {
        &self.recorder
    }

    pub fn store(&self) -> &Arc<TrafficStore> {
        self.recorder.store()
    }

    pub fn scans(&self) -> &Arc<ScanRegistry> {
        &self.scans
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Stop the endpoint, then drop captured traffic and scan handles.
    pub async fn shutdown(self) {
        let Self { recorder, scans, server } = self;
        server.shutdown().await;
        recorder.store().clear_all();
        scans.clear();
        let stats = recorder.stats().snapshot();
        log::info!(
            "bridge: stopped (captured {}, failed {})",
            stats.captured,
            stats.failed
        );
    }
}
