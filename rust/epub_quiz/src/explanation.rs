use crate::dom::{normalize_text, ClassFilter, Document};
use crate::error::{QuizError, Result};
use crate::volume::Volume;
use std::fmt;

/// Explanation paragraph text for one question, back-link removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationBlock {
    pub anchor: String,
    pub text: String,
}

impl fmt::Display for ExplanationBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**Explanation**: {}", self.text)
    }
}

/// Looks explanations up in one volume's appendix.
#[derive(Clone, Copy)]
pub struct ExplanationResolver<'a> {
    document: &'a Document,
}

impl<'a> ExplanationResolver<'a> {
    pub fn new(document: &'a Document) -> Self {
        ExplanationResolver { document }
    }

    pub fn resolve(&self, anchor: &str) -> Result<ExplanationBlock> {
        let target = self
            .document
            .find_by_id(anchor)
            .ok_or_else(|| QuizError::ExplanationAnchorNotFound {
                anchor: anchor.to_string(),
            })?;
        let paragraph = target
            .nearest_ancestor("p", ClassFilter::Token("quiz"))
            .ok_or_else(|| QuizError::ExplanationParagraphNotFound {
                anchor: anchor.to_string(),
            })?;

        // The paragraph opens with a link back to the question; keep it out of the text.
        let text = match paragraph.find_first("a") {
            Some(back_link) => paragraph.text_excluding(&back_link),
            None => paragraph.text(),
        };

        Ok(ExplanationBlock {
            anchor: anchor.to_string(),
            text: normalize_text(&text),
        })
    }
}

/// Both appendices, parsed once and held for the whole run.
pub struct ExplanationDocuments {
    volume_one: Document,
    volume_two: Document,
}

impl ExplanationDocuments {
    pub fn new(volume_one: Document, volume_two: Document) -> Self {
        ExplanationDocuments {
            volume_one,
            volume_two,
        }
    }

    pub fn resolver(&self, volume: Volume) -> ExplanationResolver<'_> {
        match volume {
            Volume::One => ExplanationResolver::new(&self.volume_one),
            Volume::Two => ExplanationResolver::new(&self.volume_two),
        }
    }
}
