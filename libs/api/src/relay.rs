//! Form bodies posted by the streaming relay (Icecast URL auth / event hooks)

use serde::{Deserialize, Serialize};

/// Response header the relay reads to accept or reject a client
pub const ICECAST_AUTH_USER: &str = "icecast-auth-user";
pub const ICECAST_AUTH_MESSAGE: &str = "icecast-auth-message";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SourceAuth {
    #[serde(default)]
    pub action: Option<String>,
    pub mount: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ListenerAuth {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub mount: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub agent: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MountAdd {
    pub mount: String,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MountRemove {
    pub mount: String,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ListenerAdd {
    pub mount: String,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ListenerRemove {
    pub mount: String,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}
