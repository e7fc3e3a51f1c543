//! Wire types for the Core service's JSON contract.

use serde::{Deserialize, Serialize};

use goftar_core::{FileAttachment, QueryRequest};

/// Request body for both the buffered and streaming query endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CoreQueryBody {
    pub query: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_attachments: Vec<FileAttachment>,
}

impl From<&QueryRequest> for CoreQueryBody {
    fn from(req: &QueryRequest) -> Self {
        Self {
            query: req.text.clone(),
            language: req.language.clone(),
            conversation_id: req.conversation_id.clone(),
            file_attachments: req.attachments.clone(),
        }
    }
}

/// One streamed event payload. The end of stream is the literal
/// `data: [DONE]` sentinel, not a JSON event.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub delta: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_omits_absent_fields() {
        let req = QueryRequest {
            text: "سلام".to_string(),
            language: "fa".to_string(),
            conversation_id: None,
            attachments: vec![],
            stream: false,
        };
        let json = serde_json::to_value(CoreQueryBody::from(&req)).unwrap();

        assert_eq!(json["query"], "سلام");
        assert_eq!(json["language"], "fa");
        assert!(json.get("conversation_id").is_none());
        assert!(json.get("file_attachments").is_none());
    }

    #[test]
    fn test_body_carries_attachments_by_reference() {
        let req = QueryRequest {
            text: "قرارداد را بررسی کن".to_string(),
            language: "fa".to_string(),
            conversation_id: Some("c-12".to_string()),
            attachments: vec![FileAttachment {
                filename: "contract.pdf".to_string(),
                object_key: "staging/u/1-x/contract.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                size_bytes: 4096,
            }],
            stream: false,
        };
        let json = serde_json::to_value(CoreQueryBody::from(&req)).unwrap();

        assert_eq!(json["conversation_id"], "c-12");
        assert_eq!(
            json["file_attachments"][0]["object_key"],
            "staging/u/1-x/contract.pdf"
        );
        // The body never contains file bytes; Core fetches them itself.
        assert!(json["file_attachments"][0].get("body").is_none());
    }

    #[test]
    fn test_stream_delta_defaults_missing_field() {
        let ev: StreamDelta = serde_json::from_str("{}").unwrap();
        assert_eq!(ev.delta, "");
    }
}
