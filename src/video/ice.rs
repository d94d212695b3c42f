// ICE server configuration handed to the browser
//
// The browser negotiates NAT traversal itself; the service only supplies the
// RTCConfiguration it should use. Field names deserialize in snake_case from
// the config file and serialize in the camelCase shape the browser expects.
// TURN credentials are never written in config, only the name of the
// environment variable holding them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct IceServer {
    pub urls: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Environment variable holding the TURN credential
    #[serde(default, skip_serializing)]
    pub credential_env: Option<String>,

    /// Resolved credential (filled from `credential_env`, never from config)
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServer {
    pub fn stun(url: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
            username: None,
            credential_env: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IceTransportPolicy {
    All,
    Relay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundlePolicy {
    Balanced,
    MaxCompat,
    MaxBundle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct IceConfig {
    #[serde(default = "default_ice_servers")]
    pub ice_servers: Vec<IceServer>,

    #[serde(default = "default_transport_policy")]
    pub ice_transport_policy: IceTransportPolicy,

    #[serde(default = "default_bundle_policy")]
    pub bundle_policy: BundlePolicy,

    /// Reconnect attempts tolerated per session before it is ended
    #[serde(default = "default_max_reconnect_attempts", skip_serializing)]
    pub max_reconnect_attempts: u32,
}

fn default_ice_servers() -> Vec<IceServer> {
    vec![
        IceServer::stun("stun:stun.l.google.com:19302"),
        IceServer::stun("stun:stun1.l.google.com:19302"),
        IceServer::stun("stun:stun2.l.google.com:19302"),
    ]
}

fn default_transport_policy() -> IceTransportPolicy {
    IceTransportPolicy::All
}

fn default_bundle_policy() -> BundlePolicy {
    BundlePolicy::MaxBundle
}

fn default_max_reconnect_attempts() -> u32 {
    3
}

impl Default for IceConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
            ice_transport_policy: default_transport_policy(),
            bundle_policy: default_bundle_policy(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

impl IceConfig {
    /// Fill every server's credential from its environment variable
    pub fn resolve_credentials(mut self) -> Result<Self> {
        for server in &mut self.ice_servers {
            if let Some(var) = &server.credential_env {
                let credential = std::env::var(var)
                    .with_context(|| format!("ICE credential variable {} is not set", var))?;
                server.credential = Some(credential);
            }
        }
        Ok(self)
    }
}

/// Turn a transport error into the message shown to the user
pub fn describe_transport_error(message: &str) -> String {
    error!("WebRTC error: {}", message);

    let lowered = message.to_ascii_lowercase();
    // A torn-down peer can also surface as a NoneType error from the media bridge
    let lost = [
        "connection closed",
        "connection lost",
        "disconnected",
        "peer closed",
        "ice failed",
        "nonetype",
    ]
    .iter()
    .any(|needle| lowered.contains(needle));

    if lost {
        "Connection lost. Please refresh the page.".to_string()
    } else {
        format!("WebRTC error: {}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ice_config_serializes_for_browser() {
        let json = serde_json::to_value(IceConfig::default()).unwrap();

        assert_eq!(json["iceServers"].as_array().unwrap().len(), 3);
        assert_eq!(json["iceServers"][0]["urls"][0], "stun:stun.l.google.com:19302");
        assert_eq!(json["iceTransportPolicy"], "all");
        assert_eq!(json["bundlePolicy"], "max-bundle");
        assert!(json.get("maxReconnectAttempts").is_none());
        assert!(json["iceServers"][0].get("credential").is_none());
    }

    #[test]
    fn test_describe_lost_connection() {
        assert_eq!(
            describe_transport_error("Peer closed: connection closed by remote"),
            "Connection lost. Please refresh the page."
        );
        assert_eq!(
            describe_transport_error("'NoneType' object has no attribute 'recv'"),
            "Connection lost. Please refresh the page."
        );
        assert_eq!(
            describe_transport_error("codec negotiation failed"),
            "WebRTC error: codec negotiation failed"
        );
    }

    #[test]
    fn test_resolve_credentials_requires_env() {
        let config = IceConfig {
            ice_servers: vec![IceServer {
                urls: vec!["turn:turn.example.org:3478".to_string()],
                username: Some("neuronote".to_string()),
                credential_env: Some("NEURONOTE_TEST_TURN_CREDENTIAL_UNSET".to_string()),
                credential: None,
            }],
            ..IceConfig::default()
        };

        assert!(config.resolve_credentials().is_err());
    }
}
