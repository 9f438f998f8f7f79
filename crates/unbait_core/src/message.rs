use serde::{Deserialize, Serialize};

/// Orchestrator -> page surface update, serialized as `{action, data}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum UpdateMessage {
    ShowLoading { url: String },
    ShowResult { url: String, result: String },
    ShowError { url: String, error: String },
}

impl UpdateMessage {
    pub fn url(&self) -> &str {
        match self {
            UpdateMessage::ShowLoading { url }
            | UpdateMessage::ShowResult { url, .. }
            | UpdateMessage::ShowError { url, .. } => url,
        }
    }

    /// `showResult` and `showError` end a request's visible lifecycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UpdateMessage::ShowLoading { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
    Canceled,
}

/// Response sent back for every delivered [`UpdateMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: AckStatus,
}

impl Ack {
    pub fn success() -> Self {
        Self {
            status: AckStatus::Success,
        }
    }

    pub fn canceled() -> Self {
        Self {
            status: AckStatus::Canceled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_uses_action_and_data() {
        let msg = UpdateMessage::ShowResult {
            url: "https://a.example".into(),
            result: "Yes.".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "showResult",
                "data": { "url": "https://a.example", "result": "Yes." }
            })
        );
    }

    #[test]
    fn error_message_parses_from_wire() {
        let raw = r#"{"action":"showError","data":{"url":"u","error":"boom"}}"#;
        let msg: UpdateMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.url(), "u");
        assert!(msg.is_terminal());
    }

    #[test]
    fn ack_status_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Ack::canceled()).unwrap(),
            r#"{"status":"canceled"}"#
        );
    }
}
