//! Chat-backed answer extraction.
//!
//! Two strategies:
//! - `basic`: one prompt asking every question, answered as a JSON object
//! - `iterative-prompt`: one prompt per question, answered as plain text
//!
//! The page may first be reduced to its visible text (`minimize =
//! "strip-markup"`) and truncated (`max_chars`).

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use extractbench_core::{AnswerSet, CollaboratorError, CollaboratorResult, Document, Extractor, NOT_FOUND};
use serde_json::Value;

use crate::chat::{number_option, ChatClient};
use crate::error::{ProviderError, Result};
use crate::markup::{strip_markup, truncate_chars};

const SYSTEM_PROMPT: &str = "You extract facts from web pages. Answer only from the page content. \
If the page does not contain an answer, say \"(not found)\".";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Basic,
    IterativePrompt,
}

impl FromStr for Strategy {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(Self::Basic),
            "iterative-prompt" => Ok(Self::IterativePrompt),
            other => Err(ProviderError::UnsupportedExtractor(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Minimizer {
    StripMarkup,
}

/// Page preprocessing read from candidate options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Preprocess {
    pub minimizer: Option<Minimizer>,
    pub max_chars: Option<usize>,
}

impl Preprocess {
    pub fn from_options(options: &BTreeMap<String, Value>) -> Result<Self> {
        let minimizer = match options.get("minimize") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s == "strip-markup" => Some(Minimizer::StripMarkup),
            Some(other) => {
                return Err(ProviderError::InvalidOption {
                    key: "minimize".to_string(),
                    reason: format!("unknown minimizer {other}"),
                })
            }
        };
        let max_chars = number_option(options, "max_chars")?.map(|n| n.max(0.0) as usize);
        Ok(Self { minimizer, max_chars })
    }

    pub fn apply(&self, document: &Document) -> String {
        let text = match self.minimizer {
            Some(Minimizer::StripMarkup) => strip_markup(&document.body),
            None => document.body.clone(),
        };
        match self.max_chars {
            Some(max) => truncate_chars(&text, max).to_string(),
            None => text,
        }
    }
}

pub struct ChatExtractor {
    client: Arc<ChatClient>,
    strategy: Strategy,
    preprocess: Preprocess,
}

impl ChatExtractor {
    pub fn new(client: Arc<ChatClient>, strategy: Strategy, preprocess: Preprocess) -> Self {
        Self {
            client,
            strategy,
            preprocess,
        }
    }

    async fn extract_basic(&self, page: &str, questions: &[String]) -> Result<Option<AnswerSet>> {
        let listed: String = questions
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}\n", i + 1, q))
            .collect();
        let prompt = format!(
            "Answer these questions about the page below. Reply with one JSON object \
             whose keys are the questions, verbatim, and whose values are short string answers.\n\n\
             {listed}\n---\n{page}"
        );
        let reply = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        parse_answers(&reply, questions)
    }

    async fn extract_iterative(&self, page: &str, questions: &[String]) -> Result<Option<AnswerSet>> {
        let mut answers = AnswerSet::new();
        for question in questions {
            let prompt = format!("{question}\nReply with the answer only.\n\n---\n{page}");
            let reply = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
            if let Some(answer) = clean_answer(&reply) {
                answers.insert(question.clone(), answer);
            }
        }
        Ok((!answers.is_empty()).then_some(answers))
    }
}

#[async_trait]
impl Extractor for ChatExtractor {
    async fn extract(&self, document: &Document, questions: &[String]) -> CollaboratorResult<Option<AnswerSet>> {
        let page = self.preprocess.apply(document);
        let outcome = match self.strategy {
            Strategy::Basic => self.extract_basic(&page, questions).await,
            Strategy::IterativePrompt => self.extract_iterative(&page, questions).await,
        };
        outcome.map_err(|e| CollaboratorError::Extraction {
            url: document.url.clone(),
            reason: e.to_string(),
        })
    }
}

/// Answers from a reply holding a JSON object, possibly fenced or wrapped in
/// prose. Only the asked questions are kept; `(not found)` and empty values
/// are dropped.
pub fn parse_answers(reply: &str, questions: &[String]) -> Result<Option<AnswerSet>> {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        return Err(ProviderError::MalformedResponse("no JSON object in reply".to_string()));
    };
    if end < start {
        return Err(ProviderError::MalformedResponse("no JSON object in reply".to_string()));
    }
    let object: serde_json::Map<String, Value> = serde_json::from_str(&reply[start..=end])?;

    let mut answers = AnswerSet::new();
    for question in questions {
        let text = match object.get(question) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => continue,
        };
        if let Some(answer) = clean_answer(&text) {
            answers.insert(question.clone(), answer);
        }
    }
    Ok((!answers.is_empty()).then_some(answers))
}

fn clean_answer(raw: &str) -> Option<String> {
    let answer = raw.trim().trim_matches('"').trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case(NOT_FOUND) {
        None
    } else {
        Some(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn questions() -> Vec<String> {
        vec!["What is the price?".to_string(), "Who sells it?".to_string()]
    }

    #[test]
    fn strategy_from_extractor_id() {
        assert_eq!("basic".parse::<Strategy>().unwrap(), Strategy::Basic);
        assert_eq!("iterative-prompt".parse::<Strategy>().unwrap(), Strategy::IterativePrompt);
        assert!("single-prompt".parse::<Strategy>().is_err());
    }

    #[test]
    fn parse_fenced_json() {
        let reply = "Sure!\n```json\n{\"What is the price?\": \"$10\", \"Who sells it?\": \"(not found)\"}\n```";
        let answers = parse_answers(reply, &questions()).unwrap().unwrap();
        assert_eq!(answers.get("What is the price?"), Some("$10"));
        assert!(!answers.contains("Who sells it?"));
    }

    #[test]
    fn parse_keeps_only_asked_questions_and_stringifies_scalars() {
        let reply = r#"{"What is the price?": 10, "Who sells it?": true, "Other": "x"}"#;
        let answers = parse_answers(reply, &questions()).unwrap().unwrap();
        assert_eq!(answers.get("What is the price?"), Some("10"));
        assert_eq!(answers.get("Who sells it?"), Some("true"));
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn parse_without_answers_is_none() {
        assert!(parse_answers("{}", &questions()).unwrap().is_none());
        assert!(parse_answers("I cannot help", &questions()).is_err());
    }

    #[test]
    fn preprocess_from_options() {
        let mut options = BTreeMap::new();
        assert_eq!(Preprocess::from_options(&options).unwrap(), Preprocess::default());

        options.insert("minimize".to_string(), json!("strip-markup"));
        options.insert("max_chars".to_string(), json!(5));
        let pre = Preprocess::from_options(&options).unwrap();
        assert_eq!(pre.minimizer, Some(Minimizer::StripMarkup));
        assert_eq!(pre.apply(&Document::new("u", "<p>Hello world</p>")), "Hello");

        options.insert("minimize".to_string(), json!("summarize"));
        assert!(Preprocess::from_options(&options).is_err());
    }

    #[test]
    fn clean_answer_drops_not_found() {
        assert_eq!(clean_answer("  \"Acme\" "), Some("Acme".to_string()));
        assert_eq!(clean_answer("(Not Found)"), None);
        assert_eq!(clean_answer(""), None);
    }
}
