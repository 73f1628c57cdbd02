//! Benchmark case definitions.

use serde::{Deserialize, Serialize};

/// One benchmark task: a seed page, the instruction used to discover target
/// links on it, and the ordered questions asked of every target page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BenchmarkCase {
    /// Page the link discovery starts from. Also the case's identity in records.
    pub seed_url: String,

    /// Instruction handed to the link discovery collaborator.
    pub link_prompt: String,

    /// Questions asked of every discovered page, in order.
    pub questions: Vec<String>,
}

impl BenchmarkCase {
    /// Create a new case.
    pub fn new(
        seed_url: impl Into<String>,
        link_prompt: impl Into<String>,
        questions: Vec<String>,
    ) -> Self {
        Self {
            seed_url: seed_url.into(),
            link_prompt: link_prompt.into(),
            questions,
        }
    }

    /// The questions joined the way cache keys expect them.
    pub fn joined_questions(&self) -> String {
        self.questions.join("; ")
    }
}

/// A discovered target page within a case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Link {
    pub url: String,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}
