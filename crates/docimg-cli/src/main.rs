//! docimg - extract every image from a Word document and map the images onto
//! placeholders in a directory of markdown files.
//!
//! The first run extracts images, analyzes placeholders, and writes a
//! reviewable mapping file. A second run with `--apply-mappings` rewrites the
//! markdown.

mod settings;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use docimg_core::{MappingConfigFile, DEFAULT_MAPPING_FILE};
use docimg_extract::{DedupPolicy, ExtractOptions, ImageExtractor, DEFAULT_MIN_IMAGE_SIZE, REPORT_FILE_NAME};
use docimg_markdown::{MarkdownImageMapper, DEFAULT_THRESHOLD};
use settings::Settings;
use std::path::{Path, PathBuf};

/// Default directory for extracted images.
const DEFAULT_OUTPUT_DIR: &str = "extracted_images";

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Default log filter when `RUST_LOG` is unset
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
enum DedupArg {
    /// One set of content digests shared by all strategies (default)
    ContentHash,
    /// Per-strategy duplicate checks of earlier releases
    Legacy,
}

impl From<DedupArg> for DedupPolicy {
    fn from(arg: DedupArg) -> Self {
        match arg {
            DedupArg::ContentHash => Self::ContentHash,
            DedupArg::Legacy => Self::Legacy,
        }
    }
}

fn parse_threshold(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("threshold must be between 0 and 1, got {value}"))
    }
}

#[derive(Parser, Debug)]
#[command(name = "docimg")]
#[command(version)]
#[command(about = "Extract ALL images from a Word document and map them to markdown placeholders")]
#[command(long_about = "Extract ALL images from a Word document and map them to markdown placeholders.\n\
                  \n\
                  Images are pulled out with four independent strategies and deduplicated.\n\
                  Placeholders ([IMAGE:name], <!-- IMAGE: name -->, ![alt](path), <img src>)\n\
                  are matched to images and written to a mapping file for review. Run again\n\
                  with --apply-mappings to rewrite the markdown.\n\
                  \n\
                  Defaults can be set via .docimg.toml settings file.")]
struct Args {
    /// Path to the Word document (.docx)
    #[arg(value_name = "WORD_FILE")]
    word_file: PathBuf,

    /// Directory containing markdown files
    #[arg(value_name = "MD_DIRECTORY")]
    md_directory: PathBuf,

    /// Directory to save extracted images (default: extracted_images)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Path to mapping configuration file (default: image_mappings.json)
    #[arg(long, value_name = "FILE")]
    mapping_file: Option<PathBuf>,

    /// Apply mappings from the configuration file
    #[arg(long)]
    apply_mappings: bool,

    /// Don't create backup files when applying mappings
    #[arg(long)]
    no_backup: bool,

    /// Duplicate detection across extraction strategies
    #[arg(long, value_enum)]
    dedup: Option<DedupArg>,

    /// Minimum similarity (0-1) a suggestion must exceed (default: 0.3)
    #[arg(long, value_parser = parse_threshold)]
    threshold: Option<f64>,

    /// Settings file to use instead of ./.docimg.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
}

/// Everything a run needs, after CLI flags and settings are combined.
#[derive(Debug, Clone, PartialEq)]
struct RunOptions {
    output_dir: PathBuf,
    mapping_file: PathBuf,
    apply: bool,
    backup: bool,
    threshold: f64,
    extract: ExtractOptions,
}

impl RunOptions {
    /// CLI flags > settings > defaults
    fn resolve(args: &Args, settings: &Settings) -> Self {
        let extract = settings.extract();
        let mapping = settings.mapping();

        Self {
            output_dir: args
                .output_dir
                .clone()
                .or(extract.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            mapping_file: args
                .mapping_file
                .clone()
                .or(mapping.mapping_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MAPPING_FILE)),
            apply: args.apply_mappings,
            backup: !args.no_backup && mapping.backup.unwrap_or(true),
            threshold: args.threshold.or(mapping.threshold).unwrap_or(DEFAULT_THRESHOLD),
            extract: ExtractOptions {
                dedup: args.dedup.map(DedupPolicy::from).or(extract.dedup).unwrap_or_default(),
                min_image_size: extract.min_image_size.unwrap_or(DEFAULT_MIN_IMAGE_SIZE),
            },
        }
    }
}

fn init_logging(verbosity: Verbosity) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Extract global verbosity settings
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);
    init_logging(verbosity);

    let settings = Settings::resolve(args.config.as_deref())?;
    let options = RunOptions::resolve(&args, &settings);
    log::debug!("Effective options: {options:?}");

    run(&args.word_file, &args.md_directory, &options, verbosity)
}

/// Abort before any work if the inputs are unusable.
fn check_preconditions(word_file: &Path, md_directory: &Path) -> Result<()> {
    if !word_file.is_file() {
        eprintln!(
            "{} Word document not found: {}",
            "Error:".red().bold(),
            word_file.display()
        );
        bail!("Word document not found: {}", word_file.display());
    }
    if !md_directory.is_dir() {
        eprintln!(
            "{} Markdown directory not found: {}",
            "Error:".red().bold(),
            md_directory.display()
        );
        bail!("Markdown directory not found: {}", md_directory.display());
    }
    Ok(())
}

fn run(word_file: &Path, md_directory: &Path, options: &RunOptions, verbosity: Verbosity) -> Result<()> {
    check_preconditions(word_file, md_directory)?;
    let show = verbosity.should_show_output();
    let rule = "=".repeat(60);

    // Step 1: extract images
    let mut extractor = ImageExtractor::new(word_file, &options.output_dir, options.extract)
        .with_context(|| format!("Cannot prepare output directory {}", options.output_dir.display()))?;
    let image_mapping = extractor.extract_all_images();
    let report_path = extractor.output_dir().join(REPORT_FILE_NAME);

    if image_mapping.is_empty() {
        if show {
            println!("\nNo images found in the Word document.");
            println!(
                "This is unusual. Please check {} for details.",
                report_path.display()
            );
        }
        return Ok(());
    }

    if show {
        println!("\n{rule}");
        println!(
            "{} Successfully extracted {} images to: {}",
            "✓".green().bold(),
            image_mapping.len().to_string().green(),
            extractor.output_dir().display()
        );
        println!("Check {} for detailed information", report_path.display());
        println!("{rule}");
    }

    // Step 2: analyze markdown
    let mapper = MarkdownImageMapper::new(md_directory, image_mapping).with_threshold(options.threshold);
    let placeholder_map = mapper.analyze_placeholders();

    if placeholder_map.is_empty() {
        if show {
            println!("\nNo image placeholders found in markdown files.");
            println!("The images have been extracted successfully though.");
        }
        return Ok(());
    }

    // Step 3: apply reviewed mappings, or suggest and save
    if options.apply {
        if options.mapping_file.exists() {
            return apply_saved_mappings(&mapper, options, show);
        }
        eprintln!(
            "{} Mapping file {} not found; generating suggestions instead",
            "Warning:".yellow().bold(),
            options.mapping_file.display()
        );
    }

    let suggestions = mapper.suggest_mappings(&placeholder_map);
    let placeholder_count: usize = placeholder_map.values().map(Vec::len).sum();
    let suggestion_count = suggestions.len();
    MappingConfigFile::new(placeholder_map, suggestions)
        .save(&options.mapping_file)
        .with_context(|| format!("Failed to write mapping file {}", options.mapping_file.display()))?;

    if show {
        println!(
            "\nSuggested {} of {} placeholders",
            suggestion_count.to_string().green(),
            placeholder_count
        );
        println!("\nNext steps:");
        println!(
            "1. Review and edit the mapping file: {}",
            options.mapping_file.display()
        );
        println!("2. Run again with --apply-mappings flag to apply the mappings");
    }

    Ok(())
}

fn apply_saved_mappings(mapper: &MarkdownImageMapper, options: &RunOptions, show: bool) -> Result<()> {
    let config = MappingConfigFile::load(&options.mapping_file)
        .with_context(|| format!("Failed to read mapping file {}", options.mapping_file.display()))?;

    let mappings = config.effective_mappings();
    if mappings.is_empty() {
        if show {
            println!("No mappings found in configuration file.");
        }
        return Ok(());
    }

    let report = mapper.apply_mappings(mappings, options.backup);

    if show {
        println!("\n{} Mapping complete!", "✓".green().bold());
        println!("{:<16} {}", "Files updated:", report.files_updated.to_string().green());
        println!("{:<16} {}", "Replacements:", report.replacements);
        if options.backup {
            println!("{:<16} {}", "Backups:", report.backups_written);
        }
        if report.skipped_entries > 0 {
            println!("{:<16} {}", "Skipped:", report.skipped_entries.to_string().yellow());
        }
    }
    for failed in &report.failed_files {
        eprintln!("{} Could not update {failed}", "✗".red().bold());
    }

    Ok(())
}
