mod config;
mod context;
mod error;

use clap::Parser;
use config::Config;
use context::{Context, ContextPointer};
use error::ServiceError;
use log::{error, info};
use search_client::SearchKind;
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(about = "Search the upstream catalogue through a local expiring cache")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Kind of record to search for (track or album)
    #[arg(short = 't', long = "type", default_value_t = SearchKind::Track)]
    kind: SearchKind,

    /// Run each query this many times; repeats are answered from the cache
    #[arg(short, long, default_value_t = 1)]
    repeat: usize,

    /// Queries to run
    #[arg(required = true)]
    queries: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<(), ServiceError> {
    let config = Config::load(&args.config)?;
    TermLogger::init(
        config.log_level().into(),
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    info!(
        "Loaded configuration from {:?}, log level {}",
        args.config,
        config.log_level()
    );

    let context: ContextPointer = Arc::new(Context::new(config)?);
    let sweep = context.start_sweep();

    let mut result = Ok(());
    'queries: for query in &args.queries {
        for _ in 0..args.repeat.max(1) {
            match context.search_json(args.kind, query).await {
                Ok(json) => println!("{}", json),
                Err(err) => {
                    result = Err(err);
                    break 'queries;
                }
            }
        }
    }

    info!("Cache stats: {:?}", context.search_client().cache_stats());
    context.shutdown(sweep).await;
    result
}
