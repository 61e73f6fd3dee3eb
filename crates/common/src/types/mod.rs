use serde::{Deserialize, Serialize};

/// Wire envelope used by every cross-service endpoint.
///
/// Mirrors the `{status_code, message, content}` shape the peer services
/// exchange, with `content` omitted when there is no payload.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ServiceResponse<T> {
    pub status_code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(message: impl Into<String>, content: T) -> Self {
        Self { status_code: 200, message: message.into(), content: Some(content) }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status_code: 404, message: message.into(), content: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_roundtrips_and_is_omitted_when_absent() {
        let r = ServiceResponse::ok("found", "payload".to_string());
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"content\":\"payload\""));

        let r: ServiceResponse<String> = ServiceResponse::not_found("missing");
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("content"));
        let back: ServiceResponse<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status_code, 404);
        assert!(back.content.is_none());
    }
}
