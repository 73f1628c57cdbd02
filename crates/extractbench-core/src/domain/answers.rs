//! Answers and fetched documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Answer substituted for a question a candidate did not answer.
pub const NOT_FOUND: &str = "(not found)";

/// Question -> answer mapping produced once per (candidate, link).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, String>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        self.insert(question, answer);
        self
    }

    pub fn insert(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.0.insert(question.into(), answer.into());
    }

    pub fn get(&self, question: &str) -> Option<&str> {
        self.0.get(question).map(String::as_str)
    }

    /// The answer, or [`NOT_FOUND`] when the question was omitted.
    pub fn answer_or_not_found(&self, question: &str) -> &str {
        self.get(question).unwrap_or(NOT_FOUND)
    }

    pub fn contains(&self, question: &str) -> bool {
        self.0.contains_key(question)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(q, a)| (q.as_str(), a.as_str()))
    }
}

impl FromIterator<(String, String)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Answers persisted for one item page, as stored under the `majority` and
/// `human` cache namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAnswers {
    pub url: String,
    pub data: AnswerSet,
}

/// Fetched page content. Opaque to the engine apart from its source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub url: String,

    #[serde(default)]
    pub content_type: Option<String>,

    pub body: String,
}

impl Document {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_answer_reads_as_not_found() {
        let answers = AnswerSet::new().with("Name", "Bulbasaur");
        assert_eq!(answers.answer_or_not_found("Name"), "Bulbasaur");
        assert_eq!(answers.answer_or_not_found("Type"), NOT_FOUND);
    }

    #[test]
    fn test_answer_set_is_a_plain_json_object() {
        let answers = AnswerSet::new().with("Title", "Dune");
        let raw = serde_json::to_value(&answers).unwrap();
        assert_eq!(raw, serde_json::json!({"Title": "Dune"}));
    }

    #[test]
    fn test_item_answers_shape() {
        let item = ItemAnswers {
            url: "https://pokemondb.net/pokedex/ivysaur".to_string(),
            data: AnswerSet::new().with("Name", "Ivysaur"),
        };
        let raw = serde_json::to_value(&item).unwrap();
        assert_eq!(raw["url"], "https://pokemondb.net/pokedex/ivysaur");
        assert_eq!(raw["data"]["Name"], "Ivysaur");
    }

    #[test]
    fn test_document_without_content_type_deserializes() {
        let doc: Document =
            serde_json::from_str(r#"{"url":"https://a","body":"<html></html>"}"#).unwrap();
        assert_eq!(doc.content_type, None);
        assert_eq!(doc.body, "<html></html>");
    }
}
