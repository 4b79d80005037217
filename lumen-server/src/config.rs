use clap::Parser;
use lumen_core::IceServerConfig;
use lumen_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use std::net::SocketAddr;

/// Settings of the signaling relay, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "lumen-server", version, about = "Signaling relay for Lumen screen sharing")]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket listener binds to.
    #[arg(long, env = "LUMEN_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// STUN URLs advertised to clients.
    #[arg(
        long = "stun",
        env = "LUMEN_STUN_URLS",
        value_delimiter = ',',
        default_values = [DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2]
    )]
    pub stun_urls: Vec<String>,

    #[arg(long, env = "TURN_URL")]
    pub turn_url: Option<String>,

    #[arg(long, env = "TURN_USERNAME")]
    pub turn_username: Option<String>,

    #[arg(long, env = "TURN_CREDENTIAL")]
    pub turn_credential: Option<String>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long = "log", env = "LUMEN_LOG", default_value = "lumen_server=info,tower_http=info")]
    pub log_filter: String,
}

impl ServerConfig {
    /// ICE servers pushed to every client in its `ice-config` frame.
    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        let mut servers = Vec::new();

        if !self.stun_urls.is_empty() {
            servers.push(IceServerConfig::stun(self.stun_urls.clone()));
        }

        if let Some(turn_url) = &self.turn_url {
            servers.push(IceServerConfig {
                urls: vec![turn_url.clone()],
                username: self.turn_username.clone(),
                credential: self.turn_credential.clone(),
            });
        }

        servers
    }
}
