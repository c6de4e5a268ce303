use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use lexicon_cli::{AppState, LexiconIndex, router};
use lexicon_extract::artifacts::{
    self, LEXICON_FILE, RAW_ENTRIES_FILE, REPORT_FILE, SECTIONS_FILE, STATISTICS_FILE,
};
use lexicon_extract::{ExtractConfig, Pipeline, Refinement, RunReport};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_OUT_DIR: &str = "out";
const DEFAULT_LEXICON_PATH: &str = "out/lexicon.json";
const MAX_PAGE_SIZE: usize = 500;

#[derive(Parser)]
#[command(name = "lexicon")]
#[command(about = "Extract a bilingual lexicon from page text and serve lookups over it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment and parse pages into raw entries.
    Extract {
        #[arg(long, env = "LEXICON_PAGES")]
        pages: PathBuf,
        #[arg(long, env = "LEXICON_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
        #[arg(long, env = "LEXICON_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Clean, validate and deduplicate a raw entries file.
    Normalize {
        #[arg(long)]
        raw: PathBuf,
        #[arg(long, env = "LEXICON_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
    },
    /// Run every stage and write all artifacts.
    Run {
        #[arg(long, env = "LEXICON_PAGES")]
        pages: PathBuf,
        #[arg(long, env = "LEXICON_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
        #[arg(long, env = "LEXICON_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Serve read-only lookups over a lexicon file.
    Serve {
        #[arg(long, env = "LEXICON_PATH", default_value = DEFAULT_LEXICON_PATH)]
        lexicon: PathBuf,
        #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
        host: String,
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            pages,
            out_dir,
            config,
        } => extract(&pages, &out_dir, config.as_deref()),
        Commands::Normalize { raw, out_dir } => normalize(&raw, &out_dir),
        Commands::Run {
            pages,
            out_dir,
            config,
        } => run(&pages, &out_dir, config.as_deref()),
        Commands::Serve {
            lexicon,
            host,
            port,
        } => serve(&lexicon, &host, port).await,
    }
}

fn extract(pages_path: &Path, out_dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(config_path)?;
    let pages = artifacts::read_pages(pages_path)?;
    create_out_dir(out_dir)?;

    let extraction = pipeline.extract(&pages);
    let sections =
        artifacts::sections_document(&extraction.segmentation, &pipeline.config().sections);
    artifacts::write_json(out_dir.join(SECTIONS_FILE), &sections)?;
    artifacts::write_json(out_dir.join(RAW_ENTRIES_FILE), &extraction.raw_entries)?;

    RunReport {
        missing_sections: extraction.segmentation.missing,
        parse: extraction.report,
        ..RunReport::default()
    }
    .log_summary();
    Ok(())
}

fn normalize(raw_path: &Path, out_dir: &Path) -> Result<()> {
    let (raw_entries, read) = artifacts::read_raw_entries(raw_path)?;
    create_out_dir(out_dir)?;

    let refinement = Pipeline::refine(raw_entries);
    write_refinement(out_dir, &refinement)?;

    RunReport {
        entries_produced: refinement.lexicon.len(),
        read,
        normalize: refinement.normalize,
        dedup: refinement.dedup,
        ..RunReport::default()
    }
    .log_summary();
    Ok(())
}

fn run(pages_path: &Path, out_dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let pipeline = build_pipeline(config_path)?;
    let pages = artifacts::read_pages(pages_path)?;
    create_out_dir(out_dir)?;

    let start = Instant::now();
    let output = pipeline.run(&pages);
    info!("pipeline finished in {} ms", start.elapsed().as_millis());

    let sections = artifacts::sections_document(
        &output.extraction.segmentation,
        &pipeline.config().sections,
    );
    artifacts::write_json(out_dir.join(SECTIONS_FILE), &sections)?;
    artifacts::write_json(out_dir.join(RAW_ENTRIES_FILE), &output.extraction.raw_entries)?;
    write_refinement(out_dir, &output.refinement)?;
    artifacts::write_json(out_dir.join(REPORT_FILE), &output.report)?;

    output.report.log_summary();
    Ok(())
}

async fn serve(lexicon_path: &Path, host: &str, port: u16) -> Result<()> {
    info!("binding to {host}:{port}");
    info!("using lexicon at {}", lexicon_path.display());

    let start = Instant::now();
    let index = LexiconIndex::load(lexicon_path)?;
    info!("index built in {} ms", start.elapsed().as_millis());

    let state = AppState {
        index,
        max_page_size: MAX_PAGE_SIZE,
    };
    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_pipeline(config_path: Option<&Path>) -> Result<Pipeline> {
    let config = match config_path {
        Some(path) => {
            info!("using config at {}", path.display());
            ExtractConfig::load(path)?
        }
        None => ExtractConfig::default(),
    };
    Ok(Pipeline::new(config)?)
}

fn create_out_dir(out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))
}

fn write_refinement(out_dir: &Path, refinement: &Refinement) -> Result<()> {
    artifacts::write_json(out_dir.join(LEXICON_FILE), refinement.lexicon.entries())?;
    artifacts::write_json(out_dir.join(STATISTICS_FILE), &refinement.statistics())?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
