use anyhow::Result;
use clap::{Parser, Subcommand};
use clear_convey::config::Config;
use clear_convey::transport::{cli, AppContext, ExportFormat, OutputFormat, StyleArgs};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    env!("CONVEY_VERSION_SUFFIX")
);

#[derive(Parser)]
#[command(name = "convey")]
#[command(author, version = VERSION, about = "Clear Convey - rewrite copy with AI and keep every revision", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Session data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Share link to resume, e.g. https://clearconvey.app/?thread=abc123
    #[arg(long, global = true)]
    link: Option<String>,

    /// Use the built-in offline rewriter instead of the service
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite text, starting a new thread
    Revise {
        /// Text to rewrite ("-" reads stdin)
        text: Option<String>,

        /// Read the text from a file
        #[arg(long)]
        file: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,

        /// Refine the current thread instead of starting a new one
        #[arg(short, long)]
        refine: bool,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Start a new thread from a version of an existing one
    Branch {
        /// Thread to branch from
        #[arg(long)]
        thread: String,

        /// Version to branch from (0 is the original text)
        #[arg(long)]
        version: usize,

        #[command(flatten)]
        style: StyleArgs,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the versions of a thread (current thread by default)
    History {
        /// Thread id
        #[arg(long)]
        thread: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List all threads in the session
    Threads,

    /// Export the whole session
    Export {
        /// Export format (json, markdown)
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the session with a JSON export
    Import {
        /// Export file to load
        path: PathBuf,
    },

    /// Delete all threads and forget the current one
    Clear,

    /// Guess the content type of a text
    Detect {
        /// Text to analyze ("-" reads stdin)
        text: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List style chips and their values
    Chips,

    /// Print the share link of the current thread
    Link,

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "clear_convey=debug,convey=debug"
    } else {
        "clear_convey=warn,convey=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(
        "convey {} ({})",
        VERSION,
        env!("CONVEY_GIT_HASH")
    );

    // Commands that need no session
    match &cli.command {
        Commands::Detect { text, format } => {
            let text = cli::read_input(text.clone(), None)?;
            return cli::run_detect(&text, *format);
        }
        Commands::Chips => return cli::run_chips(),
        _ => {}
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?.with_env_overrides(),
        None => Config::load()?,
    };

    if let Commands::Config { save } = cli.command {
        return cli::run_config(&config, cli.config.as_deref(), save);
    }
    let ctx = AppContext::open(config, cli.data_dir, cli.link.as_deref(), cli.offline)?;

    match cli.command {
        Commands::Revise {
            text,
            file,
            style,
            refine,
            format,
        } => {
            let text = cli::read_input(text, file.as_deref())?;
            cli::run_revise(&ctx, &text, &style, refine, format).await?;
        }
        Commands::Branch {
            thread,
            version,
            style,
            format,
        } => {
            cli::run_branch(&ctx, &thread, version, &style, format).await?;
        }
        Commands::History { thread, format } => {
            cli::run_history(&ctx, thread.as_deref(), format).await?;
        }
        Commands::Threads => cli::run_threads(&ctx).await?,
        Commands::Export { format, output } => {
            cli::run_export(&ctx, format, output.as_deref()).await?;
        }
        Commands::Import { path } => cli::run_import(&ctx, &path).await?,
        Commands::Clear => cli::run_clear(&ctx).await?,
        Commands::Link => cli::run_link(&ctx).await?,
        Commands::Detect { .. } | Commands::Chips | Commands::Config { .. } => {}
    }

    Ok(())
}
