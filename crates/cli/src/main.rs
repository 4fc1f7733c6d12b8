use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use cli::init_tracing_with_config;
use cli::output::{render_history, render_json, render_page};
use console::style;
use core_types::config::{AppConfig, load_or_create_config};
use core_types::{Language, Metric};
use indicatif::{ProgressBar, ProgressStyle};
use session::{SearchQuery, Session};

/// Retrieve CAD models similar to a query by comparing feature vectors.
#[derive(Parser, Debug)]
#[command(name = "shapeseek", version, about = "Similarity search over CAD feature databases")]
struct Cli {
    /// Config file (defaults to config/shapeseek.toml).
    #[arg(long, global = true, env = "SHAPESEEK_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank database models against a query feature file.
    Search(SearchArgs),
    /// List past searches, newest first.
    History {
        #[arg(long, value_enum)]
        lang: Option<LangArg>,
    },
    /// Re-run a past search by its history index.
    Replay {
        /// Index shown by `history` (0 = most recent).
        index: usize,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Query feature file (.npy).
    #[arg(short, long)]
    query: PathBuf,
    /// Single stacked database feature file (.npy).
    #[arg(long, required_unless_present = "database_dir")]
    database: Option<PathBuf>,
    /// Directory of per-model feature files (.npy).
    #[arg(long, conflicts_with = "database")]
    database_dir: Option<PathBuf>,
    /// Directory of model files matching the database rows.
    #[arg(short, long)]
    artifacts: PathBuf,
    /// Query model file; its name gives the query class.
    #[arg(short, long)]
    model: Option<PathBuf>,
    #[arg(long, value_enum)]
    metric: Option<MetricArg>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Number of results to keep (1-100).
    #[arg(short, long)]
    limit: Option<usize>,
    /// Page to show, starting at 1.
    #[arg(long)]
    page: Option<usize>,
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,
    /// Also write the text report to this file.
    #[arg(long)]
    save: Option<PathBuf>,
    #[arg(long, value_enum)]
    lang: Option<LangArg>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MetricArg {
    Euclidean,
    Cosine,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LangArg {
    En,
    Zh,
}

impl From<LangArg> for Language {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Zh => Self::Zh,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let cfg = load_or_create_config(cli.config.as_deref())?;
    let _guard = init_tracing_with_config(&cfg.logging)?;

    match cli.command {
        Commands::Search(args) => search(&cfg, args).await,
        Commands::History { lang } => {
            let mut session = Session::open(&cfg);
            if let Some(lang) = lang {
                session.set_language(lang.into());
            }
            print!("{}", render_history(&session));
            Ok(())
        }
        Commands::Replay { index, output } => {
            let mut session = Session::open(&cfg);
            configure(&mut session, &output);
            session.replay(index)?;
            present(&mut session, &output)
        }
    }
}

async fn search(cfg: &AppConfig, args: SearchArgs) -> Result<()> {
    let mut session = Session::open(cfg);
    configure(&mut session, &args.output);
    if let Some(metric) = args.metric {
        session.options_mut().metric = match metric {
            MetricArg::Euclidean => Metric::Euclidean,
            MetricArg::Cosine => Metric::Cosine,
        };
    }

    let (candidate_input, is_single_file) = match (args.database, args.database_dir) {
        (Some(file), None) => (file, true),
        (None, Some(dir)) => (dir, false),
        _ => bail!("pass exactly one of --database or --database-dir"),
    };
    let query = SearchQuery {
        feature_file: args.query,
        candidate_input,
        is_single_file,
        artifact_dir: args.artifacts,
        model_file: args.model,
    };
    tracing::debug!(?query, metric = %session.options().metric, "starting search");

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Loading features and ranking candidates...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    let outcome = session.search_async(query).await.map(|_| ());
    spinner.finish_and_clear();
    outcome?;

    present(&mut session, &args.output)
}

fn configure(session: &mut Session, output: &OutputArgs) {
    if let Some(limit) = output.limit {
        session.set_result_limit(limit);
    }
    if let Some(lang) = output.lang {
        session.set_language(lang.into());
    }
}

fn present(session: &mut Session, output: &OutputArgs) -> Result<()> {
    if let Some(page) = output.page {
        let moved = page
            .checked_sub(1)
            .is_some_and(|index| session.go_to_page(index));
        if !moved {
            bail!("page {page} out of range (1-{})", session.page_count().max(1));
        }
    }

    match output.format {
        FormatArg::Text => print!("{}", render_page(session)),
        FormatArg::Json => println!("{}", render_json(session)?),
    }

    if let Some(path) = &output.save {
        session
            .save_report(path)
            .with_context(|| format!("saving report to {}", path.display()))?;
        eprintln!("{} {}", style("Report saved to").green(), path.display());
    }
    Ok(())
}
