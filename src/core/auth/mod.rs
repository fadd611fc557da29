use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity handed to the game through its argument placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSession {
    pub access_token: String,
    pub client_token: String,
    pub uuid: String,
    pub name: String,
    /// JSON object passed as `${user_properties}`.
    #[serde(default = "empty_properties")]
    pub user_properties: String,
}

fn empty_properties() -> String {
    "{}".into()
}

impl LaunchSession {
    /// A session that never talked to an authentication server. Tokens and
    /// uuid are random so two offline players never collide.
    pub fn offline(name: &str) -> Self {
        let name = match name.trim() {
            "" => "Player",
            trimmed => trimmed,
        };
        Self {
            access_token: Uuid::new_v4().simple().to_string(),
            client_token: Uuid::new_v4().simple().to_string(),
            uuid: Uuid::new_v4().to_string(),
            name: name.to_string(),
            user_properties: empty_properties(),
        }
    }
}
