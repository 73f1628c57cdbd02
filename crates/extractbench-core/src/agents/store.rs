use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::domain::{AnswerSet, BenchError, Candidate, CandidateId, Result};
use crate::obs;
use crate::runner::EvaluationResult;

use super::guard::{check_record, plan_reset, ResetDecision};
use super::record::{AgentRecord, ItemScore};

/// Name of the manifest listing every record file.
pub const MANIFEST_FILE: &str = "list.json";

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("static filename pattern"))
}

/// Filename of a candidate's record, e.g. `openai_gpt-4o_basic.json`.
pub fn record_filename(id: &CandidateId) -> String {
    format!("{}.json", unsafe_chars().replace_all(id.as_str(), "_"))
}

/// One JSON record per candidate plus a manifest, under a single directory.
///
/// Layout: `<dir>/<sanitized id>.json`, `<dir>/list.json`
///
/// A single writer per candidate is assumed.
pub struct AgentStore {
    dir: PathBuf,
}

impl AgentStore {
    /// Create a store rooted at `dir`. Creates `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, id: &CandidateId) -> PathBuf {
        self.dir.join(record_filename(id))
    }

    /// Load a candidate's record, if one was ever written.
    ///
    /// Fails when the file at the candidate's path belongs to another
    /// candidate whose id sanitizes to the same filename.
    pub fn load(&self, id: &CandidateId) -> Result<Option<AgentRecord>> {
        let path = self.record_path(id);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                let record: AgentRecord = serde_json::from_str(&raw)?;
                if record.id != *id {
                    return Err(BenchError::InvalidConfig(format!(
                        "record file {} belongs to `{}`, not `{}`",
                        record_filename(id),
                        record.id,
                        id
                    )));
                }
                Ok(Some(record))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn load_or_init(&self, id: &CandidateId) -> Result<AgentRecord> {
        Ok(self.load(id)?.unwrap_or_else(|| AgentRecord::new(id.clone())))
    }

    /// Create the record on first observation of `candidate`, refreshing its
    /// tags otherwise.
    pub fn ensure_agent(&self, candidate: &Candidate) -> Result<AgentRecord> {
        let id = candidate.id();
        let mut record = self.load_or_init(&id)?;
        let tags = candidate.tags();
        if record.tags != tags || !self.record_path(&id).exists() {
            record.tags = tags;
            self.persist(&mut record)?;
            self.write_manifest()?;
        }
        Ok(record)
    }

    /// Forget a case so it can be recorded again, unless the stored run for
    /// it holds more than `item_limit` items.
    pub fn reset_for_case(&self, id: &CandidateId, case_url: &str, item_limit: usize) -> Result<ResetDecision> {
        let mut record = self.load_or_init(id)?;
        let decision = plan_reset(&record, case_url, item_limit);

        match decision {
            ResetDecision::Protected { stored, limit } => {
                obs::emit_reset_protected(id.as_str(), case_url, stored, limit);
            }
            ResetDecision::Clear => {
                record.processed.remove(case_url);
                record.scoring.remove(case_url);
                record.metrics.remove(case_url);
                record.overall = record.compute_overall();
                self.persist(&mut record)?;
                debug!(agent = %id, case = %case_url, "case reset");
            }
        }
        Ok(decision)
    }

    /// Score `result` against `expected` (one answer set per item) and store
    /// it under `case_url`.
    ///
    /// Fails without touching the record when `expected` is empty, when any
    /// expected set has no keys, or when the case is already recorded.
    pub fn record_result(
        &self,
        id: &CandidateId,
        case_url: &str,
        result: &EvaluationResult,
        expected: &[AnswerSet],
    ) -> Result<AgentRecord> {
        let mut record = self.load_or_init(id)?;
        check_record(&record, case_url, expected)?;

        let scores: Vec<ItemScore> = result
            .items
            .iter()
            .zip(expected)
            .map(|(item, want)| ItemScore::compute(&item.url, item.metrics.clone(), want, &item.answers))
            .collect();

        let correct: u64 = scores.iter().map(|s| s.correct).sum();
        let total: u64 = scores.iter().map(|s| s.total).sum();

        record.processed.insert(case_url.to_string());
        record.scoring.insert(case_url.to_string(), scores);
        record.metrics.insert(case_url.to_string(), result.totals.clone());
        record.overall = record.compute_overall();

        self.persist(&mut record)?;
        self.write_manifest()?;

        info!(
            agent = %id,
            case = %case_url,
            correct,
            total,
            overall_correct = record.overall.correct,
            overall_total = record.overall.total,
            "result recorded"
        );
        Ok(record)
    }

    /// Record filenames currently present, sorted, manifest excluded.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") && name != MANIFEST_FILE {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Every stored record, in filename order.
    pub fn records(&self) -> Result<Vec<AgentRecord>> {
        self.list()?
            .iter()
            .map(|name| {
                let raw = fs::read_to_string(self.dir.join(name))?;
                Ok(serde_json::from_str(&raw)?)
            })
            .collect()
    }

    fn write_manifest(&self) -> Result<()> {
        let names = self.list()?;
        self.write_atomic(&self.dir.join(MANIFEST_FILE), &serde_json::to_string_pretty(&names)?)
    }

    fn persist(&self, record: &mut AgentRecord) -> Result<()> {
        record.updated_at = Some(Utc::now());
        let content = serde_json::to_string_pretty(record)?;
        self.write_atomic(&self.record_path(&record.id), &content)
    }

    // Temp file in the same directory, then rename.
    fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_filename_is_sanitized() {
        assert_eq!(
            record_filename(&"openai:gpt-4o/iterative-prompt".into()),
            "openai_gpt-4o_iterative-prompt.json"
        );
        assert_eq!(record_filename(&"ollama:llama3.1:8b/basic".into()), "ollama_llama3.1_8b_basic.json");
        assert_eq!(record_filename(&"human".into()), "human.json");
    }

    #[test]
    fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = AgentStore::new(dir.path()).unwrap();
        assert!(store.load(&"nobody".into()).unwrap().is_none());
    }

    #[test]
    fn ensure_agent_creates_record_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = AgentStore::new(dir.path()).unwrap();
        let candidate = Candidate::new("openai:gpt-4o", "basic");

        let record = store.ensure_agent(&candidate).unwrap();
        assert_eq!(record.id.as_str(), "openai:gpt-4o/basic");
        assert!(record.tags.contains(&"provider:openai".to_string()));
        assert_eq!(store.list().unwrap(), vec!["openai_gpt-4o_basic.json".to_string()]);

        let manifest: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest, vec!["openai_gpt-4o_basic.json".to_string()]);
    }

    #[test]
    fn reset_on_absent_record_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = AgentStore::new(dir.path()).unwrap();
        let decision = store.reset_for_case(&"a/basic".into(), "https://case", 10).unwrap();
        assert_eq!(decision, ResetDecision::Clear);
        assert!(store.load(&"a/basic".into()).unwrap().is_some());
    }

    #[test]
    fn colliding_filenames_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = AgentStore::new(dir.path()).unwrap();
        let first: CandidateId = "a:b/c".into();
        let second: CandidateId = "a_b/c".into();
        assert_eq!(record_filename(&first), record_filename(&second));

        store.ensure_agent(&Candidate::new("a:b", "c")).unwrap();
        let before = std::fs::read(store.record_path(&first)).unwrap();

        assert!(matches!(store.load(&second), Err(BenchError::InvalidConfig(_))));
        assert!(store.ensure_agent(&Candidate::new("a_b", "c")).is_err());
        assert_eq!(std::fs::read(store.record_path(&first)).unwrap(), before);
        assert_eq!(store.load(&first).unwrap().unwrap().id, first);
    }
}
