use std::path::PathBuf;
use thiserror::Error;

/// Every failure the extractor can raise. None of them are recovered locally;
/// the first one aborts the whole run.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("no answer-key entries found")]
    AnswerKeyMissing,

    #[error("answer-key entry #{index} has no question link or answer span")]
    MalformedAnswerKeyEntry { index: usize },

    #[error("question paragraph has no link: {prompt:?}")]
    QuestionAnchorMissing { prompt: String },

    #[error("question link has an unusable href: {href:?}")]
    MalformedHref { href: String },

    #[error("question {question} is not followed by a lower-alpha choice list")]
    ChoiceListMissing { question: String },

    #[error("question {question} has {count} choices; only A-Z can be lettered")]
    ChoiceOverflow { question: String, count: usize },

    #[error("question {question} has no answer-key entry")]
    UnknownQuestionNumber { question: String },

    #[error("no element with id {anchor:?} in the explanation document")]
    ExplanationAnchorNotFound { anchor: String },

    #[error("anchor {anchor:?} is not inside a quiz paragraph")]
    ExplanationParagraphNotFound { anchor: String },

    #[error("explanation document {file} not found")]
    ExplanationDocumentMissing { file: String },

    #[error("chapter document {file} not found")]
    ChapterMissing { file: String },

    #[error("cannot tell which volume {file} belongs to")]
    UnknownVolume { file: String },

    #[error("{file} belongs to volume 1 but volume 2 is already active")]
    VolumeRegression { file: String },

    #[error("archive not found: {}", path.display())]
    ArchiveNotFound { path: PathBuf },

    #[error("in chapter {chapter}")]
    InChapter {
        chapter: String,
        #[source]
        source: Box<QuizError>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl QuizError {
    pub fn in_chapter(chapter: &str, source: QuizError) -> Self {
        QuizError::InChapter {
            chapter: chapter.to_string(),
            source: Box::new(source),
        }
    }

    /// Innermost error, with any chapter wrapping peeled off.
    pub fn root(&self) -> &QuizError {
        match self {
            QuizError::InChapter { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
