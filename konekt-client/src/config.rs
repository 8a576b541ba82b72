use konekt_core::{default_stun_servers, IceServerConfig};
use webrtc::ice_transport::ice_server::RTCIceServer;

#[derive(Clone)]
pub struct SessionConfig {
    /// Relay-discovery servers handed to the peer transport. Empty is
    /// fine for same-host testing (host candidates suffice).
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_stun_servers(),
        }
    }
}

impl SessionConfig {
    pub fn without_ice_servers() -> Self {
        Self {
            ice_servers: Vec::new(),
        }
    }

    pub(crate) fn rtc_ice_servers(&self) -> Vec<RTCIceServer> {
        self.ice_servers
            .iter()
            .map(|server| RTCIceServer {
                urls: server.urls.clone(),
                username: server.username.clone().unwrap_or_default(),
                credential: server.credential.clone().unwrap_or_default(),
            })
            .collect()
    }
}
