mod batch;
mod config;
mod db;
mod error;
mod parser;
mod records;
mod source;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};

use config::PipelineConfig;
use parser::listing::ListingOutcome;
use parser::merge::EnrichOutcome;
use records::{BaseRecord, EntityKind};
use source::DirectorySource;

#[derive(Parser)]
#[command(
    name = "portfolio_extract",
    about = "Turn saved portfolio/team pages into enriched company and people records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Companies,
    People,
}

impl From<KindArg> for EntityKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Companies => EntityKind::Company,
            KindArg::People => EntityKind::Person,
        }
    }
}

#[derive(Args)]
struct PathArgs {
    /// Entity kind to process
    #[arg(short, long, value_enum)]
    kind: KindArg,
    /// Listing page HTML
    #[arg(long)]
    html: Option<PathBuf>,
    /// Directory of <slug>.html detail pages
    #[arg(long)]
    pages: Option<PathBuf>,
    /// Base batch JSON (written by `list`, read by `enrich`)
    #[arg(long)]
    base: Option<PathBuf>,
    /// Enriched batch JSON output
    #[arg(long)]
    out: Option<PathBuf>,
    /// Also upsert enriched records into this SQLite database
    #[arg(long)]
    db: Option<PathBuf>,
}

impl PathArgs {
    fn into_config(self) -> PipelineConfig {
        let mut cfg = PipelineConfig::defaults(self.kind.into());
        if let Some(p) = self.html {
            cfg.listing_html = p;
        }
        if let Some(p) = self.pages {
            cfg.detail_dir = p;
        }
        if let Some(p) = self.base {
            cfg.base_out = p;
        }
        if let Some(p) = self.out {
            cfg.enriched_out = p;
        }
        cfg.db_path = self.db;
        cfg
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract base records from a listing page
    List(PathArgs),
    /// Enrich a base batch with detail pages
    Enrich(PathArgs),
    /// List + enrich in one pipeline
    Run(PathArgs),
    /// Show record counts from the database
    Stats {
        #[arg(long, default_value = config::DEFAULT_DB_PATH)]
        db: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List(args) => {
            let cfg = args.into_config();
            run_list(&cfg).map(|_| ())
        }
        Commands::Enrich(args) => {
            let cfg = args.into_config();
            let bases = batch::read_base_batch(&cfg.base_out)?;
            run_enrich(&cfg, &bases)
        }
        Commands::Run(args) => {
            let cfg = args.into_config();
            let bases = run_list(&cfg)?;
            run_enrich(&cfg, &bases)
        }
        Commands::Stats { db: path } => {
            let conn = db::connect(&path)?;
            db::init_schema(&conn)?;
            let stats = db::get_stats(&conn)?;
            if stats.is_empty() {
                println!("No records in {}. Run 'enrich --db' first.", path.display());
                return Ok(());
            }
            println!(
                "{:<8} | {:>6} | {:>7} | {:>7} | {:>8}",
                "Kind", "Total", "Detail", "Missing", "Mismatch"
            );
            println!("{}", "-".repeat(48));
            for s in &stats {
                println!(
                    "{:<8} | {:>6} | {:>7} | {:>7} | {:>8}",
                    s.kind, s.total, s.with_detail, s.missing_detail, s.name_mismatches
                );
            }
            println!(
                "\n{} leaders, {} portfolio links",
                db::count_leaders(&conn)?,
                db::count_portfolio_refs(&conn)?
            );
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn run_list(cfg: &PipelineConfig) -> anyhow::Result<Vec<BaseRecord>> {
    let html = std::fs::read_to_string(&cfg.listing_html)
        .with_context(|| format!("Missing listing page at {}", cfg.listing_html.display()))?;
    let ListingOutcome {
        records,
        cards_found,
        skipped,
        status_conflicts,
    } = parser::listing::extract_listing(cfg.kind, &html)?;

    println!("Found {} {} cards ({} skipped without slug)", cards_found, cfg.kind, skipped);
    if status_conflicts > 0 {
        println!("{} cards carry both active and exited", status_conflicts);
    }

    batch::write_json(&cfg.base_out, &records)?;
    println!("Wrote {} base records to {}", records.len(), cfg.base_out.display());
    Ok(records)
}

fn run_enrich(cfg: &PipelineConfig, bases: &[BaseRecord]) -> anyhow::Result<()> {
    if bases.is_empty() {
        println!("No base records to enrich. Run 'list' first.");
        return Ok(());
    }

    let t_enrich = Instant::now();
    println!("Enriching {} {} records...", bases.len(), cfg.kind);
    let source = DirectorySource::new(&cfg.detail_dir);
    let outcome = enrich_in_chunks(bases, &source)?;
    println!("Enriched in {:.1}s", t_enrich.elapsed().as_secs_f64());

    batch::write_json(&cfg.enriched_out, &outcome.records)?;
    println!(
        "Wrote {} enriched records to {}",
        outcome.records.len(),
        cfg.enriched_out.display()
    );
    if !outcome.missing_detail.is_empty() {
        println!(
            "{} records had no detail page and were left un-enriched.",
            outcome.missing_detail.len()
        );
    }
    if outcome.name_mismatches > 0 {
        println!("{} records have differing listing and detail names.", outcome.name_mismatches);
    }

    if let Some(path) = &cfg.db_path {
        let conn = db::connect(path)?;
        db::init_schema(&conn)?;
        let saved = db::save_enriched(&conn, &outcome.records)?;
        println!("Saved {} records to {}", saved, path.display());
    }
    Ok(())
}

fn enrich_in_chunks(
    bases: &[BaseRecord],
    source: &DirectorySource,
) -> anyhow::Result<EnrichOutcome> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(bases.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut outcome = EnrichOutcome::default();
    for chunk in bases.chunks(200) {
        outcome.absorb(parser::merge::enrich_batch(chunk, source));
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(outcome)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
