use crate::dom::{normalize_text, ClassFilter, Document};
use crate::error::{QuizError, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::{debug, warn};

static ENTRY_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ans_key\d").expect("answer-key class pattern"));

/// Correct choice letters per question number, built once per chapter.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnswerKey {
    entries: BTreeMap<String, BTreeSet<char>>,
}

impl AnswerKey {
    /// Reads every `<p class="ans_keyN">` entry: the first link holds the
    /// question number, the first span holds the letters.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let paragraphs = doc.find_all("p", ClassFilter::Pattern(&ENTRY_CLASS));
        if paragraphs.is_empty() {
            return Err(QuizError::AnswerKeyMissing);
        }

        let mut key = AnswerKey::default();
        for (index, p) in paragraphs.iter().enumerate() {
            let number = p
                .find_first("a")
                .ok_or(QuizError::MalformedAnswerKeyEntry { index })?;
            let raw = p
                .find_first("span")
                .ok_or(QuizError::MalformedAnswerKeyEntry { index })?;
            key.insert(normalize_text(&number.text()), parse_letters(&raw.text()));
        }
        debug!(entries = key.len(), "answer key resolved");
        Ok(key)
    }

    pub fn insert(&mut self, question: String, letters: BTreeSet<char>) {
        if let Some(prev) = self.entries.insert(question.clone(), letters) {
            warn!(%question, previous = ?prev, "duplicate answer-key entry; keeping the later one");
        }
    }

    pub fn correct_letters(&self, question: &str) -> Result<&BTreeSet<char>> {
        self.entries
            .get(question)
            .ok_or_else(|| QuizError::UnknownQuestionNumber {
                question: question.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Uppercase ASCII letters in `raw`; separators and anything else are ignored.
pub fn parse_letters(raw: &str) -> BTreeSet<char> {
    raw.chars().filter(|c| c.is_ascii_uppercase()).collect()
}
