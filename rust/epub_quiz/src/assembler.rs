//! Turns each `<p class="quiz">` of a chapter into a checklist block:
//!
//! ```text
//! 1. Which layer routes packets?
//!
//! - [ ] A. Physical
//! - [x] B. Network
//!
//! **Explanation**: B. The network layer routes packets.
//!
//! ```

use crate::answer_key::AnswerKey;
use crate::dom::{normalize_text, ClassFilter, Document, Node};
use crate::error::{QuizError, Result};
use crate::explanation::{ExplanationBlock, ExplanationResolver};
use std::collections::BTreeSet;
use tracing::debug;

const CHECKED: &str = "- [x]";
const UNCHECKED: &str = "- [ ]";

/// One quiz question as read from the chapter markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    pub number: String,
    pub anchor: String,
    pub choices: Vec<String>,
}

impl Question {
    pub fn from_paragraph(paragraph: &Node) -> Result<Self> {
        let prompt = normalize_text(&paragraph.text());

        let link = paragraph
            .find_first("a")
            .ok_or_else(|| QuizError::QuestionAnchorMissing {
                prompt: prompt.clone(),
            })?;
        let href = link.attr("href").ok_or_else(|| QuizError::MalformedHref {
            href: String::new(),
        })?;
        let anchor = explanation_anchor(&href)?;
        let number = normalize_text(&link.text());

        let list = paragraph
            .next_sibling_element()
            .filter(|n| n.is("ol", ClassFilter::Token("lower-alpha")))
            .ok_or_else(|| QuizError::ChoiceListMissing {
                question: number.clone(),
            })?;
        let choices: Vec<String> = list
            .child_elements("li")
            .iter()
            .map(|li| normalize_text(&li.text()))
            .collect();
        if choices.len() > 26 {
            return Err(QuizError::ChoiceOverflow {
                question: number,
                count: choices.len(),
            });
        }

        Ok(Question {
            prompt,
            number,
            anchor,
            choices,
        })
    }

    /// Full block: prompt, blank, checklist, blank, explanation, blank.
    pub fn render(&self, correct: &BTreeSet<char>, explanation: &ExplanationBlock) -> String {
        let mut out = format!("{}\n\n", self.prompt);
        for (letter, choice) in ('A'..='Z').zip(&self.choices) {
            let marker = if correct.contains(&letter) {
                CHECKED
            } else {
                UNCHECKED
            };
            out.push_str(&format!("{marker} {letter}. {choice}\n"));
        }
        out.push('\n');
        out.push_str(&format!("{explanation}\n\n"));
        out
    }
}

/// Fragment of a question link with its final character dropped: the
/// question links to `#c01-ans3a` while the appendix anchor is `c01-ans3`.
pub fn explanation_anchor(href: &str) -> Result<String> {
    let malformed = || QuizError::MalformedHref {
        href: href.to_string(),
    };
    let (_, fragment) = href.split_once('#').ok_or_else(malformed)?;
    let mut chars = fragment.chars();
    chars.next_back().ok_or_else(malformed)?;
    let anchor = chars.as_str();
    if anchor.is_empty() {
        return Err(malformed());
    }
    Ok(anchor.to_string())
}

/// Assembles every question of `doc` in document order. Nothing is returned
/// unless every question resolves.
pub fn assemble_questions(
    doc: &Document,
    key: &AnswerKey,
    explanations: ExplanationResolver<'_>,
) -> Result<(String, usize)> {
    let mut out = String::new();
    let paragraphs = doc.find_all("p", ClassFilter::Token("quiz"));
    for p in &paragraphs {
        let question = Question::from_paragraph(p)?;
        let correct = key.correct_letters(&question.number)?;
        let explanation = explanations.resolve(&question.anchor)?;
        debug!(
            number = %question.number,
            anchor = %question.anchor,
            choices = question.choices.len(),
            "question assembled"
        );
        out.push_str(&question.render(correct, &explanation));
    }
    Ok((out, paragraphs.len()))
}
