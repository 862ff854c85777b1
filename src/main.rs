//! `splice`: render a response into a page from the command line and print
//! the resulting document.

use change::{ChangeError, FragmentConfig, Page, RenderOptions, parse_placement};
use clap::Parser;
use core_types::{InvalidMode, LayerMode};
use layer::{GetOptions, LayerError, LayerRef};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Render an HTML response into a page the way a fragment update would.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Page the response is rendered into
    page: PathBuf,
    /// Response markup
    response: PathBuf,
    /// Target expression, e.g. `main` or `#list:after, .flash`
    #[arg(short, long)]
    target: Option<String>,
    /// Targets tried when the target cannot be matched
    #[arg(long)]
    fallback: Vec<String>,
    /// Layer reference; `new` opens an overlay
    #[arg(short, long, default_value = "current")]
    layer: String,
    /// Mode of a new overlay
    #[arg(short, long, default_value = "modal")]
    mode: String,
    /// Default placement for targets without a suffix
    #[arg(short, long)]
    placement: Option<String>,
    /// Location the rendered content belongs to
    #[arg(long)]
    location: Option<String>,
    /// Location of the page before rendering
    #[arg(long)]
    page_location: Option<String>,
    /// Accept the front layer after rendering
    #[arg(long, conflicts_with = "dismiss")]
    accept: bool,
    /// Dismiss the front layer after rendering
    #[arg(long)]
    dismiss: bool,
    /// JSON value to accept or dismiss with
    #[arg(long, default_value = "null")]
    value: String,
    /// TOML file with `[fragments]` and `[layers]` tables
    #[arg(long, env = "SPLICE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Settings {
    fragments: FragmentConfig,
    layers: layer::Config,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid value: {0}")]
    Value(#[from] serde_json::Error),
    #[error(transparent)]
    Mode(#[from] InvalidMode),
    #[error(transparent)]
    Layer(#[from] LayerError),
    #[error(transparent)]
    Change(#[from] ChangeError),
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("SPLICE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn,splice=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_page(cli: &Cli) -> Result<Page, CliError> {
    let settings: Settings = match &cli.config {
        Some(path) => toml::from_str(&read(path)?)?,
        None => Settings::default(),
    };
    let mut builder = Page::builder(read(&cli.page)?)
        .fragment_config(settings.fragments)
        .layer_config(settings.layers);
    if let Some(location) = &cli.page_location {
        builder = builder.location(location.as_str());
    }
    let page = builder.build();
    page.boot();
    Ok(page)
}

fn run(cli: Cli) -> Result<String, CliError> {
    let page = build_page(&cli)?;
    let mut options = RenderOptions {
        layer: LayerRef::parse(&cli.layer)?,
        target: cli.target.clone(),
        fallback: cli.fallback.clone(),
        html: read(&cli.response)?,
        location: cli.location.clone(),
        mode: cli.mode.parse::<LayerMode>()?,
        ..RenderOptions::default()
    };
    if let Some(placement) = &cli.placement {
        options.placement = parse_placement(placement).map_err(ChangeError::from)?;
    }

    let result = page.render(options)?;
    tracing::info!(
        layer = %result.layer,
        fragments = result.fragments.len(),
        kept = result.kept.len(),
        "rendered"
    );
    match futures::executor::block_on(result.finished) {
        Err(err) if err.is_uncritical() => tracing::info!("{err}"),
        other => other?,
    }

    if cli.accept || cli.dismiss {
        let value: Value = serde_json::from_str(&cli.value)?;
        let front = {
            let doc = page.document();
            page.stack()
                .get(&doc, &LayerRef::Front, GetOptions::default())
                .unwrap_or(core_types::LayerId::ROOT)
        };
        let closing = if cli.accept {
            page.accept(front, value)?
        } else {
            page.dismiss(front, value)?
        };
        futures::executor::block_on(closing)?;
        tracing::info!(layer = %front, "closed");
    }
    Ok(page.html())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(html) => {
            println!("{html}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
