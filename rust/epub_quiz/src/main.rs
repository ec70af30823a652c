use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use epub_quiz::archive::{list_entries, load_matching, unpack_matching};
use epub_quiz::{DirectorySource, DocumentSource, Pipeline, PipelineConfig, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input EPUB holding `volN_chNN.xhtml` chapters and `volN_appc.xhtml` appendices.
    #[arg(long)]
    epub: PathBuf,

    /// Output markdown path (overwritten).
    #[arg(long, required_unless_present = "list")]
    out: Option<PathBuf>,

    /// Unpack the quiz files here instead of reading them in memory.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Chapter file with no quiz; may be repeated.
    #[arg(long = "skip-chapter", value_name = "FILE")]
    skip_chapters: Vec<String>,

    /// Print the archive entries and exit.
    #[arg(long)]
    list: bool,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "epub_quiz=debug" } else { "epub_quiz=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn extract<S: DocumentSource>(source: S, config: PipelineConfig) -> Result<(Vec<u8>, RunSummary)> {
    let mut buf = Vec::new();
    let summary = Pipeline::new(source, config)
        .run(&mut buf)
        .context("extract quizzes")?;
    Ok((buf, summary))
}

fn write_output(out_path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file =
        File::create(out_path).with_context(|| format!("create {}", out_path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("write {}", out_path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list {
        let entries = list_entries(&args.epub)
            .with_context(|| format!("list {}", args.epub.display()))?;
        for e in entries {
            println!("{:>10}  {}", e.size, e.name);
        }
        return Ok(());
    }

    let out_path = args.out.ok_or_else(|| anyhow!("--out is required"))?;
    let config = PipelineConfig {
        skip_chapters: args.skip_chapters.into_iter().collect(),
        ..PipelineConfig::default()
    };

    // Output is only written once every chapter has assembled.
    let (text, summary) = match &args.work_dir {
        Some(dir) => {
            let written = unpack_matching(&args.epub, dir)
                .with_context(|| format!("unpack {} into {}", args.epub.display(), dir.display()))?;
            if written.is_empty() {
                bail!("no quiz files found in {}", args.epub.display());
            }
            info!(files = written.len(), dir = %dir.display(), "quiz files unpacked");
            extract(DirectorySource::new(dir), config)?
        }
        None => {
            let source = load_matching(&args.epub)
                .with_context(|| format!("read {}", args.epub.display()))?;
            if source.is_empty() {
                bail!("no quiz files found in {}", args.epub.display());
            }
            info!(files = source.len(), "quiz files loaded");
            extract(source, config)?
        }
    };

    write_output(&out_path, &text)?;
    info!(
        out = %out_path.display(),
        chapters = summary.chapters,
        questions = summary.questions,
        "checklist written"
    );
    Ok(())
}
