use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use async_std::{
    io::{self, prelude::*, BufReader},
    stream::StreamExt,
};
use clap::{Args, Parser, Subcommand};
use line_index::{IndexConfig, LineRetriever, Preprocessor, Reply};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "line-server")]
#[command(about = "Serve single lines of large text files from a preprocessed index", long_about = None)]
struct Cli {
    #[command(flatten)]
    index: IndexArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct IndexArgs {
    /// Directory holding the segment files
    #[arg(long, env = "LINE_INDEX_DIR", default_value = line_index::config::DEFAULT_DIRECTORY)]
    index_dir: PathBuf,

    /// Filename prefix of the segment files
    #[arg(long, env = "LINE_INDEX_PREFIX", default_value = line_index::config::DEFAULT_FILE_PREFIX)]
    prefix: String,

    /// Amount of line offsets stored per segment
    #[arg(long, env = "LINE_INDEX_BATCH_SIZE", default_value_t = line_index::config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Seconds a loaded segment is kept in memory
    #[arg(long, env = "LINE_INDEX_CACHE_TTL_SECS", default_value_t = line_index::config::DEFAULT_CACHE_TTL.as_secs())]
    cache_ttl_secs: u64,
}

impl IndexArgs {
    fn config(&self) -> IndexConfig {
        IndexConfig::new(self.index_dir.clone())
            .with_file_prefix(self.prefix.as_str())
            .with_batch_size(self.batch_size)
            .with_cache_ttl(Duration::from_secs(self.cache_ttl_secs))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the index of a file, replacing any existing one
    Preprocess {
        /// The file to index
        #[arg(long, env = "FILE_TO_PREPROCESS")]
        file: Option<PathBuf>,
    },
    /// Print a single line
    Line {
        /// 0-based index of the line
        #[arg(allow_hyphen_values = true)]
        index: String,
    },
    /// Answer one request per line read from stdin with `<status> <body>`
    Serve,
}

#[async_std::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.index.config();
    config.validate()?;

    match cli.command {
        Command::Preprocess { file } => preprocess(config, file).await,
        Command::Line { index } => line(config, &index).await,
        Command::Serve => serve(config).await,
    }
}

async fn preprocess(config: IndexConfig, file: Option<PathBuf>) -> Result<()> {
    let file = match file {
        Some(file) => file,
        None => {
            warn!("FILE_TO_PREPROCESS is not set. Nothing to preprocess");
            bail!("no file to preprocess given");
        }
    };

    info!("Please wait. Preprocessing file: {}", file.display());
    let metadata = Preprocessor::new(config)
        .run(&file)
        .await
        .with_context(|| format!("Error preprocessing {}", file.display()))?;

    info!(
        "File processed in job: {} ({} lines)",
        file.display(),
        metadata.original_line_count
    );
    Ok(())
}

async fn line(config: IndexConfig, request: &str) -> Result<()> {
    let reply = match Reply::parse_request(request) {
        Ok(index) => Reply::from_outcome(LineRetriever::new(config).retrieve(index).await),
        Err(reply) => reply,
    };

    if !reply.status.is_success() {
        bail!("{} {}", reply.status, reply.body);
    }

    println!("{}", reply.body);
    Ok(())
}

async fn serve(config: IndexConfig) -> Result<()> {
    let retriever = LineRetriever::new(config);
    let mut requests = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(request) = requests.next().await {
        let request = request?;
        let request = request.trim();
        if request.is_empty() {
            continue;
        }

        let reply = match Reply::parse_request(request) {
            Ok(index) => Reply::from_outcome(retriever.retrieve(index).await),
            Err(reply) => reply,
        };

        stdout
            .write_all(format!("{} {}\n", reply.status, reply.body).as_bytes())
            .await?;
        stdout.flush().await?;
    }

    Ok(())
}
