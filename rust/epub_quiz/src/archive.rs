//! EPUB (zip) access: listing entries and pulling out the chapter and
//! appendix files the extractor works on.

use crate::error::{QuizError, Result};
use crate::pipeline::InMemorySource;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use zip::ZipArchive;

static QUIZ_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^vol[12]_(ch\d+|appc)\.xhtml$").expect("quiz file pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
}

/// True for `volN_chNN.xhtml` and `volN_appc.xhtml`, judged on the base name.
pub fn is_quiz_file(name: &str) -> bool {
    QUIZ_FILE.is_match(base_name(name))
}

fn base_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

pub fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    if !path.is_file() {
        return Err(QuizError::ArchiveNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    Ok(ZipArchive::new(BufReader::new(file))?)
}

/// Entries in stored order.
pub fn list_entries(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut archive = open_archive(path)?;
    let mut out = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        out.push(ArchiveEntry {
            name: entry.name().to_string(),
            size: entry.size(),
        });
    }
    Ok(out)
}

/// Calls `f(base_name, contents)` for every quiz file in the archive.
fn for_each_quiz_file(
    path: &Path,
    mut f: impl FnMut(&str, String) -> Result<()>,
) -> Result<()> {
    let mut archive = open_archive(path)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        // Skips names that would escape the target directory.
        let Some(enclosed) = entry.enclosed_name() else {
            continue;
        };
        let Some(name) = enclosed.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_quiz_file(name) {
            continue;
        }
        let name = name.to_string();
        let mut markup = String::new();
        entry.read_to_string(&mut markup)?;
        debug!(entry = %entry.name(), bytes = markup.len(), "quiz file found");
        f(&name, markup)?;
    }
    Ok(())
}

/// Removes quiz files left in `dest` by an earlier run; other files stay.
fn clear_quiz_files(dest: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dest)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(is_quiz_file) {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Writes only the quiz files into `dest`, flattened to their base names.
/// Quiz files already in `dest` are removed first, so the directory holds
/// exactly this archive's selection.
pub fn unpack_matching(path: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    // Fail on a bad archive before touching the directory.
    drop(open_archive(path)?);
    std::fs::create_dir_all(dest)?;
    let stale = clear_quiz_files(dest)?;
    if stale > 0 {
        debug!(dir = %dest.display(), stale, "removed quiz files from a previous run");
    }
    let mut written = Vec::new();
    for_each_quiz_file(path, |name, markup| {
        let target = dest.join(name);
        std::fs::write(&target, markup)?;
        written.push(target);
        Ok(())
    })?;
    written.sort();
    Ok(written)
}

/// Same selection as [`unpack_matching`], kept in memory.
pub fn load_matching(path: &Path) -> Result<InMemorySource> {
    let mut source = InMemorySource::new();
    for_each_quiz_file(path, |name, markup| {
        source.insert(name, markup);
        Ok(())
    })?;
    Ok(source)
}
