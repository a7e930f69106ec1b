//! Relay wire protocol.
//!
//! Every inbound text frame is decoded once into an [`Envelope`]: a closed
//! [`MessageKind`] for routing plus the raw JSON object, which is what gets
//! forwarded. Messages the relay itself originates are [`Notice`]s.

use screenlink_common::RelayError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Screen geometry reported by the agent in `screen_info`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentScreen {
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<f64>,
}

/// Viewport geometry reported by a viewer in `client_info.screen`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerScreen {
    pub window_width: f64,
    pub window_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_pixel_ratio: Option<f64>,
}

/// Routing-relevant classification of an inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    ScreenInfo(AgentScreen),
    ClientInfo(ViewerScreen),
    Frame,
    Input,
    ViewerReady,
    /// Any other `type` (mousemove, keydown, ...) or none at all.
    Other(Option<String>),
}

impl MessageKind {
    fn classify(raw: &Map<String, Value>) -> Result<Self, RelayError> {
        let kind = match raw.get("type").and_then(Value::as_str) {
            Some("screen_info") => {
                let screen = serde_json::from_value(Value::Object(raw.clone()))
                    .map_err(|e| malformed(format!("screen_info: {e}")))?;
                Self::ScreenInfo(screen)
            }
            Some("client_info") => {
                let screen = raw
                    .get("screen")
                    .ok_or_else(|| malformed("client_info: missing field `screen`"))?;
                let screen = ViewerScreen::deserialize(screen)
                    .map_err(|e| malformed(format!("client_info: {e}")))?;
                Self::ClientInfo(screen)
            }
            Some("frame") => Self::Frame,
            Some("input") => Self::Input,
            Some("viewer_ready") => Self::ViewerReady,
            other => Self::Other(other.map(str::to_owned)),
        };
        Ok(kind)
    }

    /// Wire name of the message type, for logging.
    pub fn name(&self) -> &str {
        match self {
            Self::ScreenInfo(_) => "screen_info",
            Self::ClientInfo(_) => "client_info",
            Self::Frame => "frame",
            Self::Input => "input",
            Self::ViewerReady => "viewer_ready",
            Self::Other(Some(name)) => name.as_str(),
            Self::Other(None) => "<untyped>",
        }
    }
}

/// A decoded inbound message.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub kind: MessageKind,
    pub raw: Map<String, Value>,
}

impl Envelope {
    /// Decode a text payload. Anything other than a JSON object is malformed.
    pub fn decode(text: &str) -> Result<Self, RelayError> {
        let raw = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(raw)) => raw,
            Ok(_) => return Err(malformed("expected a JSON object")),
            Err(e) => return Err(malformed(e.to_string())),
        };
        let kind = MessageKind::classify(&raw)?;
        Ok(Self { kind, raw })
    }

    /// Attach the agent's native resolution so viewers can map coordinates.
    pub fn annotate(&mut self, screen: &AgentScreen) {
        self.raw
            .insert("originalWidth".into(), Value::from(screen.width));
        self.raw
            .insert("originalHeight".into(), Value::from(screen.height));
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.raw)
    }
}

/// Messages the relay originates and sends to viewers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Notice {
    #[serde(rename = "agent_status")]
    AgentStatus { connected: bool },

    #[serde(rename = "set_scale")]
    SetScale {
        scale: f64,
        #[serde(rename = "originalWidth")]
        original_width: u32,
        #[serde(rename = "originalHeight")]
        original_height: u32,
    },
}

impl Notice {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn malformed(reason: impl Into<String>) -> RelayError {
    RelayError::MalformedMessage(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_screen_info() {
        let env = Envelope::decode(r#"{"type":"screen_info","width":1920,"height":1080,"dpi":96}"#)
            .unwrap();
        assert_eq!(
            env.kind,
            MessageKind::ScreenInfo(AgentScreen {
                width: 1920,
                height: 1080,
                dpi: Some(96.0),
            })
        );
    }

    #[test]
    fn screen_info_dpi_is_optional() {
        let env = Envelope::decode(r#"{"type":"screen_info","width":800,"height":600}"#).unwrap();
        match env.kind {
            MessageKind::ScreenInfo(screen) => assert_eq!(screen.dpi, None),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn screen_info_without_height_is_malformed() {
        let err = Envelope::decode(r#"{"type":"screen_info","width":800}"#).unwrap_err();
        assert!(matches!(err, RelayError::MalformedMessage(_)));
        assert!(err.to_string().contains("height"));
    }

    #[test]
    fn decodes_client_info() {
        let env = Envelope::decode(
            r#"{"type":"client_info","screen":{"windowWidth":1280,"windowHeight":720,"devicePixelRatio":2}}"#,
        )
        .unwrap();
        assert_eq!(
            env.kind,
            MessageKind::ClientInfo(ViewerScreen {
                window_width: 1280.0,
                window_height: 720.0,
                device_pixel_ratio: Some(2.0),
            })
        );
    }

    #[test]
    fn client_info_without_screen_is_malformed() {
        let err = Envelope::decode(r#"{"type":"client_info"}"#).unwrap_err();
        assert!(err.to_string().contains("screen"));
    }

    #[test]
    fn unknown_and_missing_types_fall_back() {
        let env = Envelope::decode(r#"{"type":"mousemove","x":10,"y":20}"#).unwrap();
        assert_eq!(env.kind, MessageKind::Other(Some("mousemove".into())));
        assert_eq!(env.kind.name(), "mousemove");

        let env = Envelope::decode(r#"{"x":10}"#).unwrap();
        assert_eq!(env.kind, MessageKind::Other(None));
    }

    #[test]
    fn known_passthrough_types() {
        assert_eq!(
            Envelope::decode(r#"{"type":"frame","image":"AAAA"}"#).unwrap().kind,
            MessageKind::Frame
        );
        assert_eq!(
            Envelope::decode(r#"{"type":"input","event":"click"}"#).unwrap().kind,
            MessageKind::Input
        );
        assert_eq!(
            Envelope::decode(r#"{"type":"viewer_ready","sessionId":"abc"}"#).unwrap().kind,
            MessageKind::ViewerReady
        );
    }

    #[test]
    fn non_json_and_non_objects_are_malformed() {
        assert!(matches!(
            Envelope::decode("not json"),
            Err(RelayError::MalformedMessage(_))
        ));
        assert!(matches!(
            Envelope::decode("[1,2,3]"),
            Err(RelayError::MalformedMessage(_))
        ));
    }

    #[test]
    fn annotate_adds_original_dimensions() {
        let mut env = Envelope::decode(r#"{"type":"frame","image":"AAAA","width":960,"height":540}"#)
            .unwrap();
        env.annotate(&AgentScreen {
            width: 1920,
            height: 1080,
            dpi: None,
        });
        let encoded: Value = serde_json::from_str(&env.encode().unwrap()).unwrap();
        assert_eq!(encoded["originalWidth"], 1920);
        assert_eq!(encoded["originalHeight"], 1080);
        assert_eq!(encoded["image"], "AAAA");
        assert_eq!(encoded["width"], 960);
    }

    #[test]
    fn notices_serialize_with_type_tag() {
        let json: Value =
            serde_json::from_str(&Notice::AgentStatus { connected: true }.encode().unwrap())
                .unwrap();
        assert_eq!(json, json!({"type": "agent_status", "connected": true}));

        let json: Value = serde_json::from_str(
            &Notice::SetScale {
                scale: 0.5,
                original_width: 1920,
                original_height: 1080,
            }
            .encode()
            .unwrap(),
        )
        .unwrap();
        assert_eq!(
            json,
            json!({"type": "set_scale", "scale": 0.5, "originalWidth": 1920, "originalHeight": 1080})
        );
    }
}
