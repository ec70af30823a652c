use crate::answer_key::AnswerKey;
use crate::assembler::assemble_questions;
use crate::dom::Document;
use crate::error::{QuizError, Result};
use crate::explanation::{ExplanationDocuments, ExplanationResolver};
use crate::heading::chapter_heading;
use crate::volume::{order_chapters, Volume, VolumeSwitcher};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where chapter and appendix markup comes from.
pub trait DocumentSource {
    /// Every file name the source can serve.
    fn file_names(&self) -> Result<Vec<String>>;

    /// Parsed document, or `None` when the source has no such file.
    fn load(&self, name: &str) -> Result<Option<Document>>;
}

/// Files unpacked into a flat working directory.
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectorySource { root: root.into() }
    }
}

impl DocumentSource for DirectorySource {
    fn file_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn load(&self, name: &str) -> Result<Option<Document>> {
        let path = self.root.join(name);
        match std::fs::read_to_string(&path) {
            Ok(markup) => Ok(Some(Document::parse(&markup))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Markup held in memory, keyed by file name.
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    files: BTreeMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, markup: impl Into<String>) {
        self.files.insert(name.into(), markup.into());
    }

    pub fn with(mut self, name: impl Into<String>, markup: impl Into<String>) -> Self {
        self.insert(name, markup);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl DocumentSource for InMemorySource {
    fn file_names(&self) -> Result<Vec<String>> {
        Ok(self.files.keys().cloned().collect())
    }

    fn load(&self, name: &str) -> Result<Option<Document>> {
        Ok(self.files.get(name).map(|m| Document::parse(m)))
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Chapters known to carry no quiz.
    pub skip_chapters: BTreeSet<String>,
    pub volume_one_appendix: String,
    pub volume_two_appendix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            skip_chapters: BTreeSet::new(),
            volume_one_appendix: "vol1_appc.xhtml".to_string(),
            volume_two_appendix: "vol2_appc.xhtml".to_string(),
        }
    }
}

impl PipelineConfig {
    fn is_appendix(&self, name: &str) -> bool {
        name == self.volume_one_appendix || name == self.volume_two_appendix
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub chapters: usize,
    pub questions: usize,
    pub skipped: Vec<String>,
}

/// One chapter's heading plus all its question blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterBlock {
    pub text: String,
    pub questions: usize,
}

/// Heading, answer key, then questions. The key is resolved before any
/// question is looked at.
pub fn assemble_chapter(
    doc: &Document,
    explanations: ExplanationResolver<'_>,
) -> Result<ChapterBlock> {
    let mut text = chapter_heading(doc);
    let key = AnswerKey::from_document(doc)?;
    let (body, questions) = assemble_questions(doc, &key, explanations)?;
    text.push_str(&body);
    Ok(ChapterBlock { text, questions })
}

pub struct Pipeline<S> {
    source: S,
    config: PipelineConfig,
}

impl<S: DocumentSource> Pipeline<S> {
    pub fn new(source: S, config: PipelineConfig) -> Self {
        Pipeline { source, config }
    }

    /// Chapter names in processing order: `.xhtml` files other than the
    /// appendices, volume 1 before volume 2, sorted within each volume.
    pub fn chapter_order(&self) -> Result<Vec<String>> {
        let names = self
            .source
            .file_names()?
            .into_iter()
            .filter(|n| n.ends_with(".xhtml") && !self.config.is_appendix(n));
        order_chapters(names)
    }

    fn load_explanations(&self) -> Result<ExplanationDocuments> {
        let load = |name: &str| -> Result<Document> {
            self.source
                .load(name)?
                .ok_or_else(|| QuizError::ExplanationDocumentMissing {
                    file: name.to_string(),
                })
        };
        Ok(ExplanationDocuments::new(
            load(&self.config.volume_one_appendix)?,
            load(&self.config.volume_two_appendix)?,
        ))
    }

    /// Writes every chapter block to `out` in order and stops at the first
    /// error. Each block is fully built before any of it is written.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<RunSummary> {
        let explanations = self.load_explanations()?;
        let chapters = self.chapter_order()?;
        let mut switcher = VolumeSwitcher::new();
        let mut summary = RunSummary::default();

        for name in chapters {
            if self.config.skip_chapters.contains(&name) {
                debug!(chapter = %name, "no quiz, skipped");
                summary.skipped.push(name);
                continue;
            }
            let block = self
                .process(&name, &mut switcher, &explanations)
                .map_err(|e| QuizError::in_chapter(&name, e))?;
            out.write_all(block.text.as_bytes())?;
            summary.chapters += 1;
            summary.questions += block.questions;
        }

        out.flush()?;
        info!(
            chapters = summary.chapters,
            questions = summary.questions,
            skipped = summary.skipped.len(),
            "quiz extraction finished"
        );
        Ok(summary)
    }

    fn process(
        &self,
        name: &str,
        switcher: &mut VolumeSwitcher,
        explanations: &ExplanationDocuments,
    ) -> Result<ChapterBlock> {
        let volume: Volume = switcher.observe(name)?;
        let doc = self
            .source
            .load(name)?
            .ok_or_else(|| QuizError::ChapterMissing {
                file: name.to_string(),
            })?;
        let block = assemble_chapter(&doc, explanations.resolver(volume))?;
        info!(chapter = %name, %volume, questions = block.questions, "chapter assembled");
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{appendix_markup, chapter_markup, FixtureQuestion};

    fn chapter(number: &str, anchor: &str, answer: &str) -> String {
        chapter_markup(
            &[format!("Chapter {number}").as_str()],
            &[FixtureQuestion {
                number,
                anchor,
                prompt: "Which one?",
                choices: &["first", "second"],
                answer,
            }],
        )
    }

    // Both appendices use the same anchor ids, so the text tells which one answered.
    fn two_volume_source() -> InMemorySource {
        InMemorySource::new()
            .with(
                "vol1_appc.xhtml",
                appendix_markup(&[("e1", "from volume one"), ("e2", "one again")]),
            )
            .with(
                "vol2_appc.xhtml",
                appendix_markup(&[("e1", "from volume two"), ("e2", "two again")]),
            )
            .with("vol1_ch01.xhtml", chapter("1", "e1", "A"))
            .with("vol1_ch02.xhtml", chapter("2", "e2", "B"))
            .with("vol2_ch03.xhtml", chapter("3", "e1", "B"))
            .with("vol2_ch04.xhtml", chapter("4", "e2", "A"))
    }

    fn run(source: InMemorySource, config: PipelineConfig) -> Result<(String, RunSummary)> {
        let mut out = Vec::new();
        let summary = Pipeline::new(source, config).run(&mut out)?;
        Ok((String::from_utf8(out).unwrap(), summary))
    }

    #[test]
    fn explanations_follow_the_volume_boundary() {
        let (text, summary) = run(two_volume_source(), PipelineConfig::default()).unwrap();
        assert_eq!(summary.chapters, 4);
        assert_eq!(summary.questions, 4);

        let explanations: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("**Explanation**"))
            .collect();
        assert_eq!(
            explanations,
            [
                "**Explanation**: from volume one",
                "**Explanation**: one again",
                "**Explanation**: from volume two",
                "**Explanation**: two again"
            ]
        );
        let headings: Vec<&str> = text.lines().filter(|l| l.starts_with("## ")).collect();
        assert_eq!(headings, ["## Chapter 1", "## Chapter 2", "## Chapter 3", "## Chapter 4"]);
    }

    #[test]
    fn chapter_block_layout() {
        let source = InMemorySource::new()
            .with("vol1_appc.xhtml", appendix_markup(&[("e1", "Because.")]))
            .with("vol2_appc.xhtml", appendix_markup(&[]))
            .with("vol1_ch01.xhtml", chapter("1", "e1", "B"));
        let (text, _) = run(source, PipelineConfig::default()).unwrap();
        assert_eq!(
            text,
            concat!(
                "## Chapter 1\n\n1. Which one?\n\n",
                "- [ ] A. first\n- [x] B. second\n\n**Explanation**: Because.\n\n"
            )
        );
    }

    #[test]
    fn running_twice_is_byte_identical() {
        let (a, _) = run(two_volume_source(), PipelineConfig::default()).unwrap();
        let (b, _) = run(two_volume_source(), PipelineConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn denylisted_chapters_produce_nothing() {
        let source = two_volume_source()
            .with("vol1_ch00.xhtml", "<html><body><h2>Intro</h2></body></html>");
        let config = PipelineConfig {
            skip_chapters: BTreeSet::from(["vol1_ch00.xhtml".to_string()]),
            ..PipelineConfig::default()
        };
        let (text, summary) = run(source, config).unwrap();
        assert_eq!(summary.skipped, ["vol1_ch00.xhtml"]);
        assert_eq!(summary.chapters, 4);
        assert!(!text.contains("Intro"));
    }

    #[test]
    fn chapter_without_key_fails_before_questions() {
        let source = two_volume_source().with(
            "vol1_ch05.xhtml",
            "<html><body><h2>Five</h2><p class=\"quiz\">1. No link</p></body></html>",
        );
        let err = run(source, PipelineConfig::default()).unwrap_err();
        match &err {
            QuizError::InChapter { chapter, .. } => assert_eq!(chapter, "vol1_ch05.xhtml"),
            other => panic!("unexpected error: {other:?}"),
        }
        // The question would have failed with QuestionAnchorMissing had it been reached.
        assert!(matches!(err.root(), QuizError::AnswerKeyMissing));
    }

    #[test]
    fn missing_anchor_aborts_without_partial_chapter() {
        let source = two_volume_source().with("vol2_ch05.xhtml", chapter("5", "e9", "A"));
        let mut out = Vec::new();
        let err = Pipeline::new(source, PipelineConfig::default())
            .run(&mut out)
            .unwrap_err();
        assert!(matches!(
            err.root(),
            QuizError::ExplanationAnchorNotFound { anchor } if anchor == "e9"
        ));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("## Chapter 4"));
        assert!(!text.contains("## Chapter 5"));
    }

    #[test]
    fn missing_appendix_is_reported_up_front() {
        let source = InMemorySource::new()
            .with("vol1_appc.xhtml", appendix_markup(&[]))
            .with("vol1_ch01.xhtml", chapter("1", "e1", "A"));
        let mut out = Vec::new();
        let err = Pipeline::new(source, PipelineConfig::default())
            .run(&mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            QuizError::ExplanationDocumentMissing { file } if file == "vol2_appc.xhtml"
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn order_ignores_appendices_and_other_files() {
        let source = two_volume_source().with("styles.css", "");
        let pipeline = Pipeline::new(source, PipelineConfig::default());
        assert_eq!(
            pipeline.chapter_order().unwrap(),
            ["vol1_ch01.xhtml", "vol1_ch02.xhtml", "vol2_ch03.xhtml", "vol2_ch04.xhtml"]
        );
    }

    #[test]
    fn directory_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let appendix = appendix_markup(&[("e1", "dir")]);
        std::fs::write(dir.path().join("vol1_appc.xhtml"), appendix).unwrap();
        std::fs::write(dir.path().join("vol2_appc.xhtml"), appendix_markup(&[])).unwrap();
        std::fs::write(dir.path().join("vol1_ch01.xhtml"), chapter("1", "e1", "A")).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(
            source.file_names().unwrap(),
            ["vol1_appc.xhtml", "vol1_ch01.xhtml", "vol2_appc.xhtml"]
        );
        assert!(source.load("vol9_ch01.xhtml").unwrap().is_none());

        let mut out = Vec::new();
        let summary = Pipeline::new(source, PipelineConfig::default()).run(&mut out).unwrap();
        assert_eq!(summary.questions, 1);
        assert!(String::from_utf8(out).unwrap().contains("**Explanation**: dir\n"));
    }
}
