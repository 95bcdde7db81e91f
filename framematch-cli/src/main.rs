//! framematch CLI - screenshot vs. reference image matching
//!
//! Compare a captured frame with a reference image and report whether it is
//! similar enough or identical.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, ColorChoice, Parser, ValueEnum};
use colored::Colorize;
use framematch::{
    ComparisonResult, DifferenceEngine, ExactMatch, ImageComparator, ImageMatcher, MatchParams,
    MatcherOutcome, Predicate, RasterImage,
};
use log::{debug, info};
use serde::Serialize;

/// Screenshot matcher
///
/// Compares an actual image (typically a captured emulator frame) with an
/// expected reference image. The similarity is the percentage of pixels that
/// are not different; anti-aliased edges and tiny color shifts are tolerated
/// unless --exact or --include-aa is given.
///
/// Modes:
///   similar   - passes when at least --min-percent (default 80) of pixels match
///   identical - passes only when every pixel matches
#[derive(Parser, Debug)]
#[command(name = "framematch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Check that a frame looks like the reference:
        framematch screenshot.png fixtures/intro.png

    Require an exact match:
        framematch --mode identical screenshot.png fixtures/intro.png

    Compare all PNGs in two directories:
        framematch --batch captured/ fixtures/

    Output JSON for scripting:
        framematch --json screenshot.png fixtures/intro.png

    Save an image highlighting the differing pixels:
        framematch --diff diff.png screenshot.png fixtures/intro.png

EXIT CODES:
    0 - Images match under the selected mode
    1 - Images don't match
    2 - Error (file not found, invalid image, size mismatch, etc.)")]
struct Cli {
    /// Actual image or directory (captured frames)
    #[arg(value_name = "ACTUAL")]
    actual: PathBuf,

    /// Expected reference image or directory
    #[arg(value_name = "EXPECTED")]
    expected: PathBuf,

    /// Match mode
    #[arg(short, long, value_enum, default_value = "similar")]
    mode: Mode,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output JSON (shorthand for --format json)
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Save an image highlighting differing pixels to file
    #[arg(short, long, value_name = "FILE")]
    diff: Option<PathBuf>,

    /// Per-pixel color threshold (0.0-1.0)
    ///
    /// Smaller values make the comparison more sensitive to color changes.
    #[arg(long, default_value = "0.1", value_name = "THRESHOLD", value_parser = parse_threshold)]
    threshold: f64,

    /// Count anti-aliased pixels as differences
    #[arg(long)]
    include_aa: bool,

    /// Compare raw bytes: any change in a pixel makes it different
    #[arg(long, conflicts_with_all = ["threshold", "include_aa"])]
    exact: bool,

    /// Minimum similarity percentage for --mode similar
    #[arg(long, default_value = "80.0", value_name = "PERCENT", value_parser = parse_percent)]
    min_percent: f64,

    /// Batch mode: compare matching files in two directories
    #[arg(long, short = 'b')]
    batch: bool,

    /// File extensions to include in batch mode (comma-separated)
    #[arg(long, default_value = "png", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Quiet mode - only output the similarity percentage
    #[arg(long, short = 's', action = ArgAction::SetTrue)]
    quiet: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Continue on errors in batch mode
    #[arg(long)]
    keep_going: bool,

    /// Show summary statistics in batch mode
    #[arg(long)]
    summary: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// toBeSimilarToImage
    Similar,
    /// toBeIdenticalToImage
    Identical,
}

impl Mode {
    fn predicate(self) -> Predicate {
        match self {
            Self::Similar => Predicate::SimilarTo,
            Self::Identical => Predicate::IdenticalTo,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Plain text with verdict
    Text,
    /// JSON output with all metrics
    Json,
    /// Minimal - just the similarity percentage
    Score,
}

#[derive(Serialize)]
struct JsonOutput {
    matcher: &'static str,
    pass: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    similarity_percent: f64,
    differing_pixels: usize,
    total_pixels: usize,
    actual: String,
    expected: String,
    width: usize,
    height: usize,
    params: JsonParams,
}

#[derive(Serialize)]
struct JsonParams {
    threshold: f64,
    include_aa: bool,
    exact: bool,
    min_percent: f64,
}

#[derive(Serialize)]
struct JsonError {
    actual: String,
    expected: String,
    error: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum BatchJsonResult {
    Compared(JsonOutput),
    Failed(JsonError),
}

#[derive(Serialize)]
struct BatchJsonOutput {
    results: Vec<BatchJsonResult>,
    summary: BatchSummary,
}

#[derive(Serialize)]
struct BatchSummary {
    total: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    min_similarity: f64,
    max_similarity: f64,
    mean_similarity: f64,
}

struct Verdict {
    result: ComparisonResult,
    outcome: MatcherOutcome,
}

struct BatchEntry {
    actual: PathBuf,
    expected: PathBuf,
    verdict: Result<Verdict, String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Set up color output
    setup_colors(&cli);

    if cli.batch || (cli.actual.is_dir() && cli.expected.is_dir()) {
        run_batch(&cli)
    } else {
        run_single(&cli)
    }
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            // Disable colors if not a terminal
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn parse_bounded(s: &str, max: f64) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() && (0.0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be a number between 0 and {max}"))
    }
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    parse_bounded(s, 1.0)
}

fn parse_percent(s: &str) -> Result<f64, String> {
    parse_bounded(s, 100.0)
}

fn params(cli: &Cli) -> MatchParams {
    MatchParams::new()
        .with_threshold(cli.threshold)
        .with_include_aa(cli.include_aa)
        .with_similar_percent(cli.min_percent)
}

fn comparator(cli: &Cli) -> ImageComparator<Box<dyn DifferenceEngine>> {
    let engine: Box<dyn DifferenceEngine> = if cli.exact {
        Box::new(ExactMatch)
    } else {
        Box::new(params(cli).engine())
    };
    ImageComparator::with_engine(engine)
}

fn report_error(cli: &Cli, e: &str) {
    if !cli.quiet {
        eprintln!("{}: {}", "error".red().bold(), e);
    }
}

fn run_single(cli: &Cli) -> ExitCode {
    let comparator = comparator(cli);
    let verdict = if let Some(diff_path) = &cli.diff {
        compare_with_diff(cli, &comparator, diff_path)
    } else {
        compare_pair(cli, &comparator, &cli.actual, &cli.expected)
    };

    match verdict {
        Ok(verdict) => {
            if let Some(diff_path) = &cli.diff {
                if !cli.quiet && get_format(cli) != OutputFormat::Json {
                    eprintln!("Diff image saved to: {}", diff_path.display());
                }
            }

            if let Err(e) = output_single_result(cli, &verdict) {
                report_error(cli, &e);
                return ExitCode::from(2);
            }

            if verdict.outcome.pass {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            report_error(cli, &e);
            ExitCode::from(2)
        }
    }
}

fn run_batch(cli: &Cli) -> ExitCode {
    if !cli.actual.is_dir() {
        eprintln!(
            "{}: actual path '{}' is not a directory",
            "error".red().bold(),
            cli.actual.display()
        );
        return ExitCode::from(2);
    }
    if !cli.expected.is_dir() {
        eprintln!(
            "{}: expected path '{}' is not a directory",
            "error".red().bold(),
            cli.expected.display()
        );
        return ExitCode::from(2);
    }

    // Find matching files
    let pairs = match find_matching_files(&cli.actual, &cli.expected, &cli.extensions) {
        Ok(pairs) => pairs,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::from(2);
        }
    };

    if pairs.is_empty() {
        eprintln!(
            "{}: no matching image files found",
            "warning".yellow().bold()
        );
        return ExitCode::from(2);
    }

    info!("comparing {} image pairs", pairs.len());

    let comparator = comparator(cli);
    let mut entries: Vec<BatchEntry> = Vec::new();
    let mut had_errors = false;
    let mut had_failures = false;

    for (actual, expected) in pairs {
        let verdict = compare_pair(cli, &comparator, &actual, &expected);

        match &verdict {
            Ok(v) if !v.outcome.pass => had_failures = true,
            Ok(_) => {}
            Err(e) => {
                had_errors = true;
                if !cli.keep_going {
                    eprintln!("{}: {}: {}", "error".red().bold(), actual.display(), e);
                    return ExitCode::from(2);
                }
            }
        }

        entries.push(BatchEntry {
            actual,
            expected,
            verdict,
        });
    }

    // Output results
    if let Err(e) = output_batch_results(cli, &entries) {
        eprintln!("{}: {}", "error".red().bold(), e);
        return ExitCode::from(2);
    }

    if had_failures {
        ExitCode::from(1)
    } else if had_errors {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn find_matching_files(
    actual_dir: &Path,
    expected_dir: &Path,
    extensions: &[String],
) -> Result<Vec<(PathBuf, PathBuf)>, String> {
    let extensions: Vec<String> = extensions.iter().map(|e| e.to_lowercase()).collect();

    let mut pairs = Vec::new();

    let entries = std::fs::read_dir(actual_dir)
        .map_err(|e| format!("failed to read directory '{}': {}", actual_dir.display(), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| format!("failed to read directory entry: {e}"))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !extensions.contains(&ext) {
            continue;
        }

        // Find the reference with the same name
        let Some(filename) = path.file_name() else {
            continue;
        };
        let expected_path = expected_dir.join(filename);

        if expected_path.exists() {
            pairs.push((path, expected_path));
        } else {
            debug!("no reference for '{}'", path.display());
        }
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(pairs)
}

fn matcher(cli: &Cli) -> ImageMatcher {
    ImageMatcher::with_params(cli.mode.predicate(), &params(cli))
}

fn compare_pair(
    cli: &Cli,
    comparator: &ImageComparator<Box<dyn DifferenceEngine>>,
    actual: &Path,
    expected: &Path,
) -> Result<Verdict, String> {
    let result = comparator
        .compare_files(actual, expected)
        .map_err(|e| e.to_string())?;
    let outcome = matcher(cli).judge(result.similarity_percent);
    Ok(Verdict { result, outcome })
}

fn compare_with_diff(
    cli: &Cli,
    comparator: &ImageComparator<Box<dyn DifferenceEngine>>,
    diff_path: &Path,
) -> Result<Verdict, String> {
    let actual = RasterImage::open(&cli.actual).map_err(|e| e.to_string())?;
    let expected = RasterImage::open(&cli.expected).map_err(|e| e.to_string())?;

    let (result, diff) = comparator
        .diff_images(&actual, &expected)
        .map_err(|e| e.to_string())?;

    diff.to_rgba_image()
        .save(diff_path)
        .map_err(|e| format!("failed to save diff image: {e}"))?;

    let outcome = matcher(cli).judge(result.similarity_percent);
    Ok(Verdict { result, outcome })
}

fn get_format(cli: &Cli) -> OutputFormat {
    if cli.json {
        OutputFormat::Json
    } else if cli.quiet {
        OutputFormat::Score
    } else {
        cli.format
    }
}

fn json_output(cli: &Cli, actual: &Path, expected: &Path, verdict: &Verdict) -> JsonOutput {
    JsonOutput {
        matcher: cli.mode.predicate().name(),
        pass: verdict.outcome.pass,
        message: verdict.outcome.message.clone(),
        similarity_percent: verdict.result.similarity_percent,
        differing_pixels: verdict.result.differing_pixels,
        total_pixels: verdict.result.total_pixels,
        actual: actual.display().to_string(),
        expected: expected.display().to_string(),
        width: verdict.result.width,
        height: verdict.result.height,
        params: json_params(cli),
    }
}

fn json_params(cli: &Cli) -> JsonParams {
    let params = params(cli);
    JsonParams {
        threshold: params.threshold(),
        include_aa: params.include_aa(),
        exact: cli.exact,
        min_percent: params.similar_percent(),
    }
}

fn output_single_result(cli: &Cli, verdict: &Verdict) -> Result<(), String> {
    let result = &verdict.result;

    match get_format(cli) {
        OutputFormat::Score => {
            println!("{}", result.similarity_percent);
        }
        OutputFormat::Text => {
            let pct = format!("{}%", result.similarity_percent);
            let status = if verdict.outcome.pass {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            };
            println!(
                "{}: {} similar ({} of {} pixels differ) {}",
                cli.mode.predicate(),
                pct.bold(),
                result.differing_pixels,
                result.total_pixels,
                status
            );
            if let Some(message) = &verdict.outcome.message {
                println!("{}", message.red());
            }
        }
        OutputFormat::Json => {
            let output = json_output(cli, &cli.actual, &cli.expected, verdict);
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| format!("failed to serialize JSON: {e}"))?;
            println!("{json}");
        }
    }

    Ok(())
}

fn output_batch_results(cli: &Cli, entries: &[BatchEntry]) -> Result<(), String> {
    let format = get_format(cli);

    // Collect similarities for summary
    let mut similarities: Vec<f64> = Vec::new();
    let mut passed = 0;
    let mut failed = 0;
    let mut errors = 0;

    for entry in entries {
        match &entry.verdict {
            Ok(verdict) => {
                similarities.push(verdict.result.similarity_percent);
                if verdict.outcome.pass {
                    passed += 1;
                } else {
                    failed += 1;
                }
            }
            Err(_) => {
                errors += 1;
            }
        }
    }

    let min_similarity = similarities.iter().copied().fold(f64::INFINITY, f64::min);
    let max_similarity = similarities
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let mean_similarity = if similarities.is_empty() {
        0.0
    } else {
        similarities.iter().sum::<f64>() / similarities.len() as f64
    };

    match format {
        OutputFormat::Json => {
            let results = entries
                .iter()
                .map(|entry| match &entry.verdict {
                    Ok(v) => {
                        BatchJsonResult::Compared(json_output(cli, &entry.actual, &entry.expected, v))
                    }
                    Err(e) => BatchJsonResult::Failed(JsonError {
                        actual: entry.actual.display().to_string(),
                        expected: entry.expected.display().to_string(),
                        error: e.clone(),
                    }),
                })
                .collect();

            let batch_output = BatchJsonOutput {
                results,
                summary: BatchSummary {
                    total: entries.len(),
                    passed,
                    failed,
                    errors,
                    min_similarity: if min_similarity.is_finite() {
                        min_similarity
                    } else {
                        0.0
                    },
                    max_similarity: if max_similarity.is_finite() {
                        max_similarity
                    } else {
                        0.0
                    },
                    mean_similarity,
                },
            };

            let json = serde_json::to_string_pretty(&batch_output)
                .map_err(|e| format!("failed to serialize JSON: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Score => {
            for entry in entries {
                if let Ok(verdict) = &entry.verdict {
                    println!("{}", verdict.result.similarity_percent);
                }
            }
        }
        OutputFormat::Text => {
            let name_width = entries
                .iter()
                .map(|entry| entry.actual.file_name().unwrap_or_default().len())
                .max()
                .unwrap_or(20);

            for entry in entries {
                let filename = entry
                    .actual
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("?");

                match &entry.verdict {
                    Ok(verdict) => {
                        let pct = format!("{}%", verdict.result.similarity_percent);
                        let status = if verdict.outcome.pass {
                            "PASS".green().bold()
                        } else {
                            "FAIL".red().bold()
                        };
                        println!(
                            "{:width$}  {:>8}  {}",
                            filename,
                            pct,
                            status,
                            width = name_width
                        );
                    }
                    Err(e) => {
                        println!(
                            "{:width$}  {:>8}  {}",
                            filename,
                            "-".dimmed(),
                            format!("ERROR: {e}").red(),
                            width = name_width
                        );
                    }
                }
            }

            // Summary
            if cli.summary || entries.len() > 1 {
                println!();
                println!("{}", "Summary:".bold());
                println!(
                    "  Total: {}  Passed: {}  Failed: {}  Errors: {}",
                    entries.len(),
                    passed.to_string().green(),
                    if failed > 0 {
                        failed.to_string().red()
                    } else {
                        failed.to_string().normal()
                    },
                    if errors > 0 {
                        errors.to_string().red()
                    } else {
                        errors.to_string().normal()
                    }
                );
                if !similarities.is_empty() {
                    println!(
                        "  Similarity: min={min_similarity}%  max={max_similarity}%  mean={mean_similarity:.2}%"
                    );
                }
            }
        }
    }

    // Flush stdout
    let _ = io::stdout().flush();

    Ok(())
}
