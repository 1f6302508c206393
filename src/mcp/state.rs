// ABOUTME: Connection status state machine and the per-server state snapshot read by the UI
// ABOUTME: Also defines the capability flags and listing item types returned by servers

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a server is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Inputs that drive [`ConnectionStatus`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The user asked to connect.
    Connect,
    /// Handshake completed (listing failures do not matter).
    Established,
    /// Spawn or handshake failed.
    Failed,
    /// The user asked to disconnect.
    Disconnect,
}

impl ConnectionStatus {
    /// Next status for `event`, or `None` when the event is not legal here.
    ///
    /// `None` means the caller must leave state untouched: connecting twice,
    /// disconnecting an idle server, or a completion arriving outside of
    /// `Connecting`.
    pub const fn next(self, event: ConnectionEvent) -> Option<Self> {
        use ConnectionEvent as E;
        match (self, event) {
            (Self::Disconnected | Self::Error, E::Connect) => Some(Self::Connecting),
            (Self::Connecting, E::Established) => Some(Self::Connected),
            (Self::Connecting, E::Failed) => Some(Self::Error),
            (Self::Connecting | Self::Connected, E::Disconnect) => Some(Self::Disconnected),
            _ => None,
        }
    }

    /// Status glyph for the server list.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Connected => "●",
            Self::Connecting => "◐",
            Self::Error => "✗",
            Self::Disconnected => "○",
        }
    }

    /// Lowercase label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Connecting => "connecting",
            Self::Error => "error",
            Self::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Listing categories a server advertised during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub resources: bool,
    pub prompts: bool,
    pub tools: bool,
}

impl Capabilities {
    /// Read flags from an `initialize` result's `capabilities` object.
    ///
    /// A category counts as supported when its key is present and not null.
    pub fn from_server(capabilities: Option<&Value>) -> Self {
        let has = |key: &str| {
            capabilities
                .and_then(|c| c.get(key))
                .is_some_and(|v| !v.is_null())
        };
        Self {
            resources: has("resources"),
            prompts: has("prompts"),
            tools: has("tools"),
        }
    }
}

/// A resource entry from `resources/list`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// One argument a prompt accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptArgument {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// A prompt entry from `prompts/list`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

/// A tool entry from `tools/list`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Value,
}

/// Snapshot of one server's connection, owned by the connection manager.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub error: Option<String>,
    pub capabilities: Capabilities,
    pub resources: Vec<Resource>,
    pub prompts: Vec<Prompt>,
    pub tools: Vec<Tool>,
}

impl ConnectionState {
    /// Reset to `status` with no capabilities or listings.
    pub fn cleared(status: ConnectionStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ConnectionEvent as E;
    use ConnectionStatus as S;

    #[test]
    fn test_legal_transitions() {
        assert_eq!(S::Disconnected.next(E::Connect), Some(S::Connecting));
        assert_eq!(S::Error.next(E::Connect), Some(S::Connecting));
        assert_eq!(S::Connecting.next(E::Established), Some(S::Connected));
        assert_eq!(S::Connecting.next(E::Failed), Some(S::Error));
        assert_eq!(S::Connected.next(E::Disconnect), Some(S::Disconnected));
        assert_eq!(S::Connecting.next(E::Disconnect), Some(S::Disconnected));
    }

    #[test]
    fn test_illegal_transitions_are_rejected() {
        let all = [S::Disconnected, S::Connecting, S::Connected, S::Error];
        let events = [E::Connect, E::Established, E::Failed, E::Disconnect];
        let legal = [
            (S::Disconnected, E::Connect),
            (S::Error, E::Connect),
            (S::Connecting, E::Established),
            (S::Connecting, E::Failed),
            (S::Connected, E::Disconnect),
            (S::Connecting, E::Disconnect),
        ];
        for status in all {
            for event in events {
                assert_eq!(
                    status.next(event).is_some(),
                    legal.contains(&(status, event)),
                    "{status:?} + {event:?}"
                );
            }
        }
    }

    #[test]
    fn test_capabilities_from_server() {
        let caps = Capabilities::from_server(Some(&json!({
            "resources": {"subscribe": true},
            "prompts": null,
            "logging": {}
        })));
        assert_eq!(
            caps,
            Capabilities {
                resources: true,
                prompts: false,
                tools: false
            }
        );
        assert_eq!(Capabilities::from_server(None), Capabilities::default());
    }

    #[test]
    fn test_listing_items_tolerate_missing_fields() {
        let tool: Tool = serde_json::from_value(json!({"name": "echo"})).unwrap();
        assert_eq!(tool.input_schema, Value::Null);
        let resource: Resource =
            serde_json::from_value(json!({"uri": "file:///a", "mimeType": "text/plain"})).unwrap();
        assert_eq!(resource.mime_type.as_deref(), Some("text/plain"));
        let prompt: Prompt = serde_json::from_value(json!({
            "name": "greet",
            "arguments": [{"name": "who", "required": true}]
        }))
        .unwrap();
        assert!(prompt.arguments[0].required);
    }
}
