//! vocset: indexing, validation and materialization of Pascal VOC corpora.
//!
//! A VOC corpus keeps one XML annotation per image under `Annotations/`, the
//! images under `JPEGImages/`, and split membership lists under
//! `ImageSets/Main/`. vocset turns such a corpus into typed, per-item
//! detection records ready for training code.
//!
//! # Modules
//!
//! - [`tree`]: schema-light XML decoding with repeatable `<object>` groups
//! - [`vocab`]: deterministic class vocabulary, persisted as JSON
//! - [`corpus`]: directory layout and split-driven [`corpus::CorpusIndex`]
//! - [`materialize`]: per-item [`ir::DetectionRecord`] materialization
//! - [`validation`]: non-failing corpus consistency checks
//! - [`batch`]: collation of ragged records
//! - [`dataset`]: random-access view with an optional transform hook
//! - [`error`]: error types

pub mod batch;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod image;
pub mod ir;
pub mod materialize;
pub mod tree;
pub mod validation;
pub mod vocab;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use error::VocError;

use corpus::{CorpusIndex, CorpusLayout};
use dataset::VocDataset;

/// The vocset CLI application.
#[derive(Parser)]
#[command(name = "vocset")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the class vocabulary of a corpus.
    Vocab(VocabArgs),
    /// Check that annotations and images correspond.
    Check(CheckArgs),
    /// Index a split and materialize every item without reading images.
    Index(IndexArgs),
    /// Print the records of randomly chosen split items.
    Show(ShowArgs),
}

#[derive(clap::Args)]
struct VocabArgs {
    /// Corpus root (or its Annotations/ directory).
    root: PathBuf,

    /// Where to write the vocabulary.
    #[arg(short, long, default_value = "classes.json")]
    output: PathBuf,

    /// Verify the corpus against an existing vocabulary instead of writing one.
    #[arg(long)]
    check: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Corpus root.
    root: PathBuf,

    /// Also verify the <filename> field of each annotation.
    #[arg(long)]
    filename_field: bool,

    /// Also report images without annotations.
    #[arg(long)]
    orphans: bool,

    /// Also compare <size> with the image headers.
    #[arg(long)]
    sizes: bool,

    /// Treat warnings as errors.
    #[arg(long)]
    strict: bool,

    /// Report format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct SplitArgs {
    /// Corpus root.
    root: PathBuf,

    /// Vocabulary file written by `vocset vocab`.
    #[arg(long, env = "VOCSET_VOCAB")]
    vocab: PathBuf,

    /// Split file, relative to ImageSets/Main/.
    #[arg(long, default_value = "train.txt")]
    split: PathBuf,

    /// Treat <root> as a VOC download and use VOCdevkit/VOC<year> under it (2007 or 2012).
    #[arg(long)]
    year: Option<String>,
}

#[derive(clap::Args)]
struct IndexArgs {
    #[command(flatten)]
    split: SplitArgs,

    /// Summary format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(clap::Args)]
struct ShowArgs {
    #[command(flatten)]
    split: SplitArgs,

    /// Number of items to print.
    #[arg(long, default_value_t = 5)]
    count: usize,

    /// Seed for reproducible item selection.
    #[arg(long)]
    seed: Option<u64>,
}

/// Run the vocset CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), VocError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Vocab(args)) => run_vocab(args),
        Some(Commands::Check(args)) => run_check(args),
        Some(Commands::Index(args)) => run_index(args),
        Some(Commands::Show(args)) => run_show(args),
        None => {
            println!("vocset {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Pascal VOC corpus indexing and validation.");
            println!();
            println!("Run 'vocset --help' for usage information.");
            Ok(())
        }
    }
}

fn run_vocab(args: VocabArgs) -> Result<(), VocError> {
    let layout = CorpusLayout::discover(&args.root)?;

    if let Some(existing) = args.check {
        let vocabulary = vocab::load(&existing)?;
        vocab::verify_covers(&layout.annotations_dir, &vocabulary)?;
        println!(
            "Vocabulary {} covers every class in {} ({} classes)",
            existing.display(),
            layout.annotations_dir.display(),
            vocabulary.len()
        );
        return Ok(());
    }

    let vocabulary = vocab::build(&layout.annotations_dir)?;
    vocab::save(&vocabulary, &args.output)?;

    println!(
        "Wrote {} classes to {}",
        vocabulary.len(),
        args.output.display()
    );
    for (name, id) in vocabulary.iter() {
        println!("  {:>3}  {}", id, name);
    }
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), VocError> {
    let output = OutputFormat::parse(&args.output)?;
    // Missing directories are reported by the checks themselves.
    let root = CorpusLayout::discover(&args.root)
        .map(|layout| layout.root)
        .unwrap_or_else(|_| args.root.clone());
    let opts = validation::CheckOptions {
        filename_field: args.filename_field,
        orphan_images: args.orphans,
        image_sizes: args.sizes,
    };
    let report = validation::check_corpus(&root, &opts);

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(VocError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Summary printed by `vocset index`.
#[derive(Debug, Default, Serialize)]
struct IndexSummary {
    split: PathBuf,
    items: usize,
    objects: usize,
    dropped_objects: usize,
    empty_items: usize,
    difficult_objects: usize,
    classes: usize,
}

fn run_index(args: IndexArgs) -> Result<(), VocError> {
    let output = OutputFormat::parse(&args.output)?;
    let dataset = open_dataset(&args.split)?;

    let mut summary = IndexSummary {
        split: dataset.index().split_path().to_path_buf(),
        items: dataset.len(),
        classes: dataset.vocabulary().len(),
        ..IndexSummary::default()
    };
    for i in 0..dataset.len() {
        let record = dataset.coco_index(i)?;
        summary.objects += record.len();
        summary.dropped_objects += record.dropped_objects.len();
        summary.difficult_objects += record.objects.iter().filter(|obj| obj.difficult).count();
        if record.is_empty() {
            summary.empty_items += 1;
        }
    }

    match output {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => {
            println!("Split:             {}", summary.split.display());
            println!("Items:             {}", summary.items);
            println!("Classes:           {}", summary.classes);
            println!("Objects:           {}", summary.objects);
            println!("Difficult objects: {}", summary.difficult_objects);
            println!("Dropped boxes:     {}", summary.dropped_objects);
            println!("Items w/o objects: {}", summary.empty_items);
        }
    }
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<(), VocError> {
    let dataset = open_dataset(&args.split)?;
    let indices = dataset.sample_indices(args.count, args.seed);
    let batch = dataset.batch(&indices)?;

    #[derive(Serialize)]
    struct Shown<'a> {
        image: &'a image::ImageHandle,
        classes: Vec<&'a str>,
        record: &'a ir::DetectionRecord,
    }

    let shown: Vec<Shown<'_>> = batch
        .iter()
        .map(|(image, record)| Shown {
            image,
            classes: record
                .labels()
                .into_iter()
                .map(|label| dataset.vocabulary().name(label).unwrap_or("?"))
                .collect(),
            record,
        })
        .collect();
    print_json(&shown)
}

fn open_dataset(args: &SplitArgs) -> Result<VocDataset, VocError> {
    let layout = match &args.year {
        Some(year) => CorpusLayout::devkit(&args.root, year)?,
        None => CorpusLayout::discover(&args.root)?,
    };
    let vocabulary = Arc::new(vocab::load(&args.vocab)?);
    let index = CorpusIndex::from_layout(absolute_layout(layout)?, &args.split, vocabulary)?;
    Ok(VocDataset::new(index))
}

fn absolute_layout(layout: CorpusLayout) -> Result<CorpusLayout, VocError> {
    Ok(CorpusLayout::new(std::path::absolute(&layout.root)?))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(raw: &str) -> Result<Self, VocError> {
        match raw {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(VocError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            ))),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), VocError> {
    let json = serde_json::to_string_pretty(value).map_err(VocError::OutputSerialize)?;
    println!("{json}");
    Ok(())
}
