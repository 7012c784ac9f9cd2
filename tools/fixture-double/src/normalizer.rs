pub const PROJECT_ID_PLACEHOLDER: &str = "{PROJECT_ID}";
pub const API_KEY_PLACEHOLDER: &str = "{API_KEY}";

/// Swaps the run's live secrets for fixed placeholders and back, so fixture
/// text is identical no matter which project recorded it.
///
/// Text that already contains a placeholder does not round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    project_id: String,
    api_key: String,
}

impl Normalizer {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn to_portable(&self, text: &str) -> String {
        let text = replace_non_empty(text, &self.project_id, PROJECT_ID_PLACEHOLDER);
        replace_non_empty(&text, &self.api_key, API_KEY_PLACEHOLDER)
    }

    pub fn from_portable(&self, text: &str) -> String {
        text.replace(PROJECT_ID_PLACEHOLDER, &self.project_id)
            .replace(API_KEY_PLACEHOLDER, &self.api_key)
    }
}

// An empty pattern matches between every character.
fn replace_non_empty(text: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        text.to_string()
    } else {
        text.replace(from, to)
    }
}
