//! Wire types for the Formway data API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OAuth2 token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Bare GUID reference, serialized as `{"guid": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuidRef {
    pub guid: String,
}

impl GuidRef {
    pub fn new(guid: impl Into<String>) -> Self {
        Self { guid: guid.into() }
    }
}

/// One form field on one element creation request.
///
/// Field order matters to some Formway versions; keep it as
/// guid, type, svalue, name, formLayout, value.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldPayload {
    pub guid: String,
    #[serde(rename = "type")]
    pub wire_type: String,
    /// Display string shown in the form UI
    pub svalue: String,
    pub name: String,
    #[serde(rename = "formLayout")]
    pub form_layout: FormLayout,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct FormLayout {
    pub editability: i32,
    pub requiredness: i32,
}

/// Nested child-collection payload attached to a parent element
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemList {
    pub guid: String,
    pub name: String,
    /// Always "Incremental": rows are appended, never replaced
    pub mode: String,
    pub rows: Vec<ItemRow>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemRow {
    pub cells: Vec<ItemCell>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ItemCell {
    pub guid: String,
    pub svalue: String,
    pub value: Value,
}

/// Body of `POST /api/data/v6.0/db/{database}/elements`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateElementRequest {
    pub workflow: GuidRef,
    #[serde(rename = "formType")]
    pub form_type: GuidRef,
    #[serde(rename = "formFields")]
    pub form_fields: Vec<FieldPayload>,
    #[serde(rename = "businessEntity", skip_serializing_if = "Option::is_none")]
    pub business_entity: Option<GuidRef>,
    #[serde(rename = "itemLists", skip_serializing_if = "Option::is_none")]
    pub item_lists: Option<Vec<ItemList>>,
}

/// Structured error body returned by the data API
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ApiErrorBody {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "errorGuid", default)]
    pub error_guid: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Best-effort error message extraction from a response body.
    ///
    /// Falls back to a truncated copy of the raw body when it is not the
    /// structured shape.
    pub fn extract(body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
            let text = parsed
                .description
                .or(parsed.message)
                .or(parsed.error)
                .or(parsed.kind);
            if let Some(text) = text {
                return match parsed.error_guid {
                    Some(guid) if !guid.is_empty() => format!("{} (error {})", text, guid),
                    _ => text,
                };
            }
        }

        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no response body".to_string()
        } else {
            let mut text: String = trimmed.chars().take(300).collect();
            if text.len() < trimmed.len() {
                text.push('…');
            }
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_payload_json_shape() {
        let payload = FieldPayload {
            guid: "f-1".to_string(),
            wire_type: "integer".to_string(),
            svalue: "42".to_string(),
            name: "WFD_AttInt1".to_string(),
            form_layout: FormLayout {
                editability: 1,
                requiredness: 0,
            },
            value: json!(42),
        };

        let text = serde_json::to_string(&payload).unwrap();
        // Serialization preserves declaration order
        let mut last = 0;
        for key in ["\"guid\"", "\"type\"", "\"svalue\"", "\"name\"", "\"formLayout\"", "\"value\""] {
            let pos = text.find(key).unwrap_or_else(|| panic!("missing {}", key));
            assert!(pos >= last, "{} out of order in {}", key, text);
            last = pos;
        }
        assert!(text.contains("\"formLayout\":{\"editability\":1,\"requiredness\":0}"));
    }

    #[test]
    fn test_request_omits_optional_sections() {
        let request = CreateElementRequest {
            workflow: GuidRef::new("w"),
            form_type: GuidRef::new("f"),
            form_fields: vec![],
            business_entity: None,
            item_lists: None,
        };
        let text = serde_json::to_string(&request).unwrap();
        assert!(!text.contains("businessEntity"));
        assert!(!text.contains("itemLists"));
    }

    #[test]
    fn test_error_body_extraction() {
        let structured = r#"{"type":"ValidationError","description":"Field X is required","errorGuid":"abc-123"}"#;
        assert_eq!(
            ApiErrorBody::extract(structured),
            "Field X is required (error abc-123)"
        );

        let generic = r#"{"message":"boom"}"#;
        assert_eq!(ApiErrorBody::extract(generic), "boom");

        assert_eq!(ApiErrorBody::extract("   "), "no response body");
        assert_eq!(ApiErrorBody::extract("<html>teapot</html>"), "<html>teapot</html>");
    }
}
