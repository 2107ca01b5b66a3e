use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use nas_bdf::Deck;
use nas_mesh::{EquivalenceConfig, equivalence_nodes};
use nas_model::{BdfModel, ModelConfig, ModelSummary};
use nas_op2::{DecodeConfig, DecodeReport, Endian, TableKind, UnknownMarkerPolicy, decode_table};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Nastran bulk-data and OP2 geometry toolkit")]
struct Cli {
    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    /// JSON file with `decode` and `equivalence` settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a bulk-data deck and print its card counts
    Summary {
        deck: PathBuf,
        /// Print JSON instead of plain lines
        #[arg(long)]
        json: bool,
    },
    /// Decode a framed binary geometry table
    Decode {
        table_file: PathBuf,
        /// GEOM1, GEOM2 or DYNAMICS
        #[arg(long)]
        table: String,
        /// Skip unknown markers instead of failing
        #[arg(long)]
        skip_unknown: bool,
        /// Read the table as big-endian instead of detecting the byte order
        #[arg(long)]
        big_endian: bool,
        #[arg(long)]
        json: bool,
    },
    /// Merge coincident nodes of a deck and write the result
    Equivalence {
        input: PathBuf,
        output: PathBuf,
        /// Merge tolerance
        #[arg(long)]
        tol: Option<f64>,
        /// Neighbours examined per node
        #[arg(long)]
        neighbors: Option<usize>,
        /// Fail when an element collapses
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    decode: DecodeConfig,
    equivalence: EquivalenceConfig,
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_model(path: &Path) -> Result<BdfModel> {
    let deck = Deck::parse_file(path).with_context(|| format!("parsing {}", path.display()))?;
    BdfModel::build_from_deck(&deck, ModelConfig::default()).with_context(|| format!("building model from {}", path.display()))
}

fn print_summary(summary: &ModelSummary) {
    println!("total_cards: {}", summary.total_cards());
    for (category, count) in &summary.categories {
        println!("{category}: {count}");
    }
    for (card, count) in &summary.rejected {
        println!("rejected {card}: {count}");
    }
}

fn print_report(report: &DecodeReport) {
    println!("table: {}", report.table);
    println!("records: {}", report.records);
    for (card, count) in &report.counts {
        println!("{card}: {count}");
    }
    for (card, count) in &report.undecoded {
        println!("undecoded {card}: {count}");
    }
    for (marker, count) in &report.skipped_markers {
        println!("skipped {marker}: {count}");
    }
    if report.dropped_ids > 0 {
        println!("dropped_ids: {}", report.dropped_ids);
    }
}

fn summary(deck: &Path, json: bool) -> Result<()> {
    let model = read_model(deck)?;
    let summary = ModelSummary::from_model(&model);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn decode(settings: Settings, table_file: &Path, table: &str, skip_unknown: bool, big_endian: bool, json: bool) -> Result<()> {
    let kind = TableKind::from_name(table).ok_or_else(|| {
        let valid: Vec<&str> = TableKind::ALL.iter().map(|t| t.name()).collect();
        anyhow!("unknown table {table:?}; expected one of {}", valid.join(", "))
    })?;
    let buf = fs::read(table_file).with_context(|| format!("reading {}", table_file.display()))?;

    let mut config = settings.decode;
    if skip_unknown {
        config.unknown_markers = UnknownMarkerPolicy::Skip;
    }
    config.endian = if big_endian {
        Endian::Big
    } else {
        Endian::detect(&buf).unwrap_or(config.endian)
    };
    debug!(?config, "decode settings");

    let decoded = decode_table(kind, &buf, &config).with_context(|| format!("decoding {}", table_file.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&decoded.report)?);
    } else {
        print_report(&decoded.report);
    }
    Ok(())
}

fn equivalence(config: EquivalenceConfig, input: &Path, output: &Path) -> Result<()> {
    let mut model = read_model(input)?;
    let result = equivalence_nodes(&mut model, &config).context("equivalencing nodes")?;

    let mut file = fs::File::create(output).with_context(|| format!("creating {}", output.display()))?;
    writeln!(
        file,
        "$ equivalenced from {} on {} (tolerance {})",
        input.display(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        config.tolerance
    )?;
    model.write_bulk_to(&mut file)?;
    info!(output = %output.display(), "wrote equivalenced deck");

    println!("merged: {}", result.merged());
    println!("degenerate: {}", result.degenerate.len());
    println!("incompatible: {}", result.incompatible.len());
    for card in &result.stale {
        println!("stale {} {}: {:?}", card.card_type, card.key, card.nids);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    match cli.command {
        Command::Summary { deck, json } => summary(&deck, json),
        Command::Decode {
            table_file,
            table,
            skip_unknown,
            big_endian,
            json,
        } => decode(settings, &table_file, &table, skip_unknown, big_endian, json),
        Command::Equivalence {
            input,
            output,
            tol,
            neighbors,
            strict,
        } => {
            let mut config = settings.equivalence;
            if let Some(tol) = tol {
                config.tolerance = tol;
            }
            if let Some(k) = neighbors {
                config.neighbor_count = k;
            }
            config.strict |= strict;
            equivalence(config, &input, &output)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(1)
        }
    }
}
