//! Wire types for the poem service and the display form shared by the CLI
//! and the TUI.

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Generation style. Classic is the service default and is never sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum PoemMode {
    #[default]
    #[serde(rename = "classic")]
    #[value(name = "classic")]
    Classic,
    #[serde(rename = "1980s")]
    #[value(name = "1980s", alias = "80s", alias = "eighties")]
    Eighties,
}

impl PoemMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "classic" => Some(Self::Classic),
            "1980s" | "80s" | "eighties" => Some(Self::Eighties),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PoemMode::Classic => "classic",
            PoemMode::Eighties => "1980s",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            PoemMode::Classic => PoemMode::Eighties,
            PoemMode::Eighties => PoemMode::Classic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<PoemMode>,
}

impl GenerateRequest {
    pub fn new(prompt: &str, mode: PoemMode) -> Self {
        Self {
            prompt: prompt.trim().to_string(),
            mode: (mode != PoemMode::Classic).then_some(mode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPoem {
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    // Older deployments answer with a single `poem` field.
    #[serde(alias = "poem", deserialize_with = "nullable_string")]
    pub body: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub signature: String,
    #[serde(default, deserialize_with = "nullable_list")]
    pub similar_poems: Vec<String>,
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub poem_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustration_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustration_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedPoem {
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, alias = "body", deserialize_with = "nullable_string")]
    pub content: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub signature: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IllustrationState {
    Pending,
    Ready,
    #[serde(alias = "error")]
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IllustrationStatus {
    pub status: IllustrationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustration_url: Option<String>,
}

/// What the poem display shows, whether the poem was just generated or
/// picked from the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoemView {
    pub title: String,
    pub body: String,
    pub signature: String,
    pub similar_poems: Vec<String>,
    pub poem_id: Option<String>,
}

impl From<&GeneratedPoem> for PoemView {
    fn from(poem: &GeneratedPoem) -> Self {
        Self {
            title: poem.title.clone(),
            body: poem.body.clone(),
            signature: poem.signature.clone(),
            similar_poems: poem.similar_poems.clone(),
            poem_id: poem.poem_id.clone(),
        }
    }
}

impl From<&ArchivedPoem> for PoemView {
    fn from(poem: &ArchivedPoem) -> Self {
        Self {
            title: poem.title.clone(),
            body: poem.content.clone(),
            signature: poem.signature.clone(),
            similar_poems: Vec::new(),
            poem_id: Some(poem.id.clone()),
        }
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(Value::deserialize(deserializer)?))
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_from_value(Value::deserialize(deserializer)?)
        .ok_or_else(|| serde::de::Error::custom("poem id must be a non-empty string or a number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classic_mode_is_not_sent() {
        let body = serde_json::to_value(GenerateRequest::new("  rain  ", PoemMode::Classic)).unwrap();
        assert_eq!(body, json!({ "prompt": "rain" }));
    }

    #[test]
    fn eighties_mode_is_sent_as_1980s() {
        let body = serde_json::to_value(GenerateRequest::new("rain", PoemMode::Eighties)).unwrap();
        assert_eq!(body, json!({ "prompt": "rain", "mode": "1980s" }));
    }

    #[test]
    fn mode_parse_accepts_aliases() {
        assert_eq!(PoemMode::parse("1980s"), Some(PoemMode::Eighties));
        assert_eq!(PoemMode::parse(" 80S "), Some(PoemMode::Eighties));
        assert_eq!(PoemMode::parse("Classic"), Some(PoemMode::Classic));
        assert_eq!(PoemMode::parse("1990s"), None);
        assert_eq!(PoemMode::Classic.toggled(), PoemMode::Eighties);
    }

    #[test]
    fn legacy_poem_field_reads_as_body() {
        let poem: GeneratedPoem = serde_json::from_value(json!({
            "poem": "The prompt sits there, mocking me",
            "similar_poems": ["Title: Happiness is warm Zapper"]
        }))
        .unwrap();
        assert_eq!(poem.body, "The prompt sits there, mocking me");
        assert_eq!(poem.title, "");
        assert_eq!(poem.similar_poems.len(), 1);
        assert_eq!(poem.poem_id, None);
    }

    #[test]
    fn archive_ids_are_normalised_to_strings() {
        let numeric: ArchivedPoem = serde_json::from_value(json!({
            "id": 42, "title": "Ode", "content": "lines", "signature": null
        }))
        .unwrap();
        assert_eq!(numeric.id, "42");
        assert_eq!(numeric.signature, "");

        let missing = serde_json::from_value::<ArchivedPoem>(json!({ "id": "  ", "title": "x" }));
        assert!(missing.is_err());
    }

    #[test]
    fn unexpected_illustration_status_is_unknown() {
        let status: IllustrationStatus =
            serde_json::from_value(json!({ "status": "queued" })).unwrap();
        assert_eq!(status.status, IllustrationState::Unknown);

        let failed: IllustrationStatus =
            serde_json::from_value(json!({ "status": "error" })).unwrap();
        assert_eq!(failed.status, IllustrationState::Failed);
    }

    #[test]
    fn archive_entry_view_carries_its_id() {
        let entry = ArchivedPoem {
            id: "7".to_string(),
            title: "Fatherhood's rewards".to_string(),
            content: "Sigmund Freud was overjoyed".to_string(),
            signature: "(J.D. Evans)".to_string(),
        };
        let view = PoemView::from(&entry);
        assert_eq!(view.poem_id.as_deref(), Some("7"));
        assert_eq!(view.body, entry.content);
        assert!(view.similar_poems.is_empty());
    }
}
