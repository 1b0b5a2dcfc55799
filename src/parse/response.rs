// Typed decoding of poem service payloads.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::CliError;
use crate::poem::{ArchivedPoem, GeneratedPoem, IllustrationStatus};

/// Decode a `/generate` response.
pub fn parse_generated(payload: &Value) -> Result<GeneratedPoem, CliError> {
    GeneratedPoem::deserialize(payload)
        .map_err(|e| CliError::Parse(format!("Unexpected /generate response: {e}")))
}

/// Decode a `/poems` response, which is either a bare array or `{ "poems": [...] }`.
///
/// Entries that do not decode are skipped. If none decode, the first entry's
/// error is returned.
pub fn parse_archive(payload: &Value) -> Result<Vec<ArchivedPoem>, CliError> {
    let entries = match payload {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("poems") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CliError::Parse(
                    "Unexpected /poems response: expected a list of poems.".to_string(),
                ));
            }
        },
        other => {
            return Err(CliError::Parse(format!(
                "Unexpected /poems response: expected a list of poems, got {other}"
            )));
        }
    };

    let mut poems = Vec::with_capacity(entries.len());
    let mut first_error = None;
    for (idx, entry) in entries.iter().enumerate() {
        match ArchivedPoem::deserialize(entry) {
            Ok(poem) => poems.push(poem),
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "skipping archive entry");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) if poems.is_empty() => Err(CliError::Parse(format!(
            "Unexpected /poems response: {e}"
        ))),
        _ => Ok(poems),
    }
}

pub fn parse_illustration(payload: &Value) -> Result<IllustrationStatus, CliError> {
    IllustrationStatus::deserialize(payload)
        .map_err(|e| CliError::Parse(format!("Unexpected /illustration response: {e}")))
}

/// Pull a human readable message out of an error body.
pub fn error_detail(payload: &Value) -> Option<String> {
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poem::IllustrationState;
    use serde_json::json;

    #[test]
    fn generated_with_all_fields() {
        let poem = parse_generated(&json!({
            "title": "Tribute to a 'Subber Code'",
            "body": "For two weeks dow I'b had this code.",
            "signature": "(J.D. Evans, a pseudonym)",
            "similar_poems": ["a", "b"],
            "poem_id": 12,
            "illustration_prompt": "a sneezing poet",
            "illustration_url": null
        }))
        .unwrap();
        assert_eq!(poem.title, "Tribute to a 'Subber Code'");
        assert_eq!(poem.poem_id.as_deref(), Some("12"));
        assert_eq!(poem.illustration_prompt.as_deref(), Some("a sneezing poet"));
        assert_eq!(poem.illustration_url, None);
        assert_eq!(poem.similar_poems, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn generated_without_body_is_a_parse_error() {
        let err = parse_generated(&json!({ "title": "x" })).unwrap_err();
        assert!(matches!(err, CliError::Parse(_)));
    }

    #[test]
    fn archive_accepts_bare_and_wrapped_lists() {
        let entry = json!({ "id": "1", "title": "t", "content": "c", "signature": "s" });
        assert_eq!(parse_archive(&json!([entry.clone()])).unwrap().len(), 1);
        assert_eq!(
            parse_archive(&json!({ "poems": [entry.clone(), entry] }))
                .unwrap()
                .len(),
            2
        );
        assert!(parse_archive(&json!({ "items": [] })).is_err());
        assert!(parse_archive(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn archive_skips_entries_that_do_not_decode() {
        let poems = parse_archive(&json!([
            { "id": 1, "title": "Ode", "content": "c", "signature": "s" },
            { "id": null, "title": "Broken", "content": "c", "signature": "s" },
        ]))
        .unwrap();
        assert_eq!(poems.len(), 1);
        assert_eq!(poems[0].id, "1");

        let err = parse_archive(&json!([{ "id": null, "title": "Broken" }])).unwrap_err();
        let CliError::Parse(message) = err else {
            panic!("expected a parse error");
        };
        assert!(message.contains("poem id must be"), "{message}");
    }

    #[test]
    fn illustration_status_decodes() {
        let pending = parse_illustration(&json!({ "status": "pending" })).unwrap();
        assert_eq!(pending.status, IllustrationState::Pending);

        let ready = parse_illustration(&json!({
            "status": "ready",
            "illustration_url": "https://img.example/1.png"
        }))
        .unwrap();
        assert_eq!(ready.status, IllustrationState::Ready);
        assert_eq!(
            ready.illustration_url.as_deref(),
            Some("https://img.example/1.png")
        );

        assert!(parse_illustration(&json!({})).is_err());
    }

    #[test]
    fn error_detail_prefers_fastapi_detail() {
        assert_eq!(
            error_detail(&json!({ "detail": "boom", "message": "other" })).as_deref(),
            Some("boom")
        );
        assert_eq!(error_detail(&json!({ "message": "m" })).as_deref(), Some("m"));
        assert_eq!(error_detail(&json!({ "detail": "  " })), None);
        assert_eq!(error_detail(&json!({ "raw": "x" })), None);
    }
}
