//! CLI transport for direct terminal interaction
//!
//! Each `run_*` function backs one `convey` subcommand. They share an
//! [`AppContext`] that wires the file store, the share link and the session
//! store together the same way for every command.

use crate::config::Config;
use crate::controller::{ControllerEvent, Submission, ThreadController};
use crate::core::NavigationContext;
use crate::detect::detect_content_type;
use crate::preferences::{category_options, Category, SelectionState, Similarity};
use crate::rewrite::{ChangeAnalysis, HttpRewriteService, RewriteService};
use crate::session::{RewriteVersion, SessionStore, Thread, VersionEntry};
use crate::share::ShareLink;
use crate::storage::{default_data_dir, FileStore};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};
use tokio::sync::Mutex;

/// Output format for read commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Output format for `export`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

/// Style options shared by `revise` and `branch`
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StyleArgs {
    /// Content type (headline, social, email, webpage, blog, description, about, other)
    #[arg(short = 't', long)]
    pub content_type: Option<String>,

    /// How close to stay to the original, 0-100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub similarity: Option<u8>,

    /// Style chip as category=value (repeat; tone may be given several times)
    #[arg(short, long = "chip", value_name = "CATEGORY=VALUE")]
    pub chips: Vec<String>,
}

impl StyleArgs {
    fn selection(&self) -> SelectionState {
        SelectionState::from_chip_args(&self.chips)
    }

    fn similarity(&self, config: &Config) -> Similarity {
        self.similarity
            .map(Similarity::new)
            .unwrap_or(config.defaults.similarity)
    }

    fn content_type<'a>(&'a self, config: &'a Config) -> &'a str {
        self.content_type
            .as_deref()
            .unwrap_or(&config.defaults.content_type)
    }
}

/// Everything a command needs: config, session store and share link
pub struct AppContext {
    pub config: Config,
    pub store: Arc<Mutex<SessionStore>>,
    pub link: Arc<ShareLink>,
    data_dir: PathBuf,
    offline: bool,
}

impl AppContext {
    /// Open the session at `data_dir` (or the configured/default location)
    ///
    /// A `link` carrying a `thread` parameter selects that thread.
    pub fn open(
        config: Config,
        data_dir: Option<PathBuf>,
        link: Option<&str>,
        offline: bool,
    ) -> Result<Self> {
        let data_dir = data_dir
            .or_else(|| config.storage.data_dir.clone())
            .unwrap_or_else(default_data_dir);
        let persistence = FileStore::new(&data_dir).context("Failed to open session storage")?;

        let link = Arc::new(
            ShareLink::parse(link.unwrap_or(&config.share.base_url))
                .context("Failed to parse share link")?,
        );
        let store = SessionStore::open(Arc::new(persistence), link.clone());
        tracing::debug!("Session data in {}", data_dir.display());

        Ok(Self {
            config,
            store: Arc::new(Mutex::new(store)),
            link,
            data_dir,
            offline,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn service(&self) -> Result<Arc<dyn RewriteService>> {
        if self.offline {
            #[cfg(feature = "sim")]
            return Ok(Arc::new(crate::rewrite::SimRewriteService::new()));
            #[cfg(not(feature = "sim"))]
            anyhow::bail!("This build has no offline rewrite support");
        }
        let service = HttpRewriteService::new(&self.config.service.base_url)?
            .with_timeout(self.config.service.timeout());
        Ok(Arc::new(service))
    }

    /// Controller that reports progress on stderr
    fn controller(&self) -> Result<ThreadController> {
        let mut controller = ThreadController::new(self.service()?, self.store.clone());
        controller.subscribe(|event| match event {
            ControllerEvent::Started { refinement } => {
                let action = if *refinement { "Refining" } else { "Polishing" };
                eprintln!("{}", format!("{}...", action).dimmed());
            }
            ControllerEvent::Failed { message } => {
                tracing::debug!("Submission failed: {}", message);
            }
            ControllerEvent::Completed { .. } => {}
        });
        Ok(controller)
    }
}

/// Read the text to rewrite from the argument, a file, or stdin (`-`)
pub fn read_input(text: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    match text {
        Some(text) if text != "-" => Ok(text),
        _ => {
            use std::io::Read;
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            Ok(buffer)
        }
    }
}

/// Rewrite text, starting a thread or refining the current one
pub async fn run_revise(
    ctx: &AppContext,
    text: &str,
    style: &StyleArgs,
    refine: bool,
    format: OutputFormat,
) -> Result<()> {
    if style.content_type.is_none() {
        if let Some(detection) = detect_content_type(text) {
            eprintln!(
                "{} looks like {} ({}% confident); pass --content-type {} to use it",
                "Hint:".yellow(),
                detection.kind.label(),
                detection.confidence,
                detection.kind.id()
            );
        }
    }

    let selection = style.selection();
    let submission = Submission::new(text, &selection)
        .with_content_type(style.content_type(&ctx.config))
        .with_similarity(style.similarity(&ctx.config))
        .refining(refine);

    let controller = ctx.controller()?;
    let version = controller.submit(submission).await?;

    match version {
        Some(version) => print_outcome(ctx, &version, format).await,
        None => {
            println!("{}", "Nothing to rewrite: the text is empty.".yellow());
            Ok(())
        }
    }
}

/// Start a new thread from a version of an existing one
pub async fn run_branch(
    ctx: &AppContext,
    thread_id: &str,
    version_number: usize,
    style: &StyleArgs,
    format: OutputFormat,
) -> Result<()> {
    let controller = ctx.controller()?;
    let version = controller
        .branch(
            thread_id,
            version_number,
            &style.selection(),
            style.content_type(&ctx.config),
            style.similarity(&ctx.config),
        )
        .await?;

    match version {
        Some(version) => print_outcome(ctx, &version, format).await,
        None => {
            println!("{}", "That version is empty; nothing to branch.".yellow());
            Ok(())
        }
    }
}

async fn print_outcome(ctx: &AppContext, version: &RewriteVersion, format: OutputFormat) -> Result<()> {
    let store = ctx.store.lock().await;
    let thread = store
        .current_thread()
        .context("Revision was recorded but no thread is current")?;
    let version_number = thread.versions().len();

    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "threadId": thread.thread_id(),
            "versionNumber": version_number,
            "version": version,
            "shareUrl": ctx.link.share_url(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} Version {} of thread {} ({})",
        "✓".green(),
        version_number,
        thread.thread_id().cyan(),
        version.request_type
    );
    println!();
    println!("{}", version.output_text);
    println!();
    println!(
        "{} {} → {}   {} {} ({})",
        "Words:".bold(),
        version.word_count.original,
        version.word_count.revised,
        "Similarity:".bold(),
        version.similarity,
        version.similarity.band().label()
    );
    if let Some(analysis) = version.analysis.as_ref().and_then(ChangeAnalysis::from_value) {
        print_analysis(&analysis);
    }
    println!("{} {}", "Share:".bold(), ctx.link.share_url());
    Ok(())
}

fn print_analysis(analysis: &ChangeAnalysis) {
    if let Some(rationale) = analysis.rationale.as_deref() {
        println!("{} {}", "Strategy:".bold(), rationale);
    }
    for change in &analysis.changes {
        match change.before_after() {
            Some((before, after)) => println!(
                "  {} {}: {} (\"{}\" → \"{}\")",
                change.icon(),
                change.kind,
                change.description,
                before.red(),
                after.green()
            ),
            None => println!("  {} {}: {}", change.icon(), change.kind, change.description),
        }
    }
    if let Some(metrics) = &analysis.metrics {
        for (label, value) in metrics.entries() {
            println!("  {} {}", format!("{}:", label).bold(), value);
        }
    }
}

/// Show the lineage of a thread (the current one by default)
pub async fn run_history(
    ctx: &AppContext,
    thread_id: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let store = ctx.store.lock().await;
    let thread = match thread_id {
        Some(id) => store
            .thread(id)
            .with_context(|| format!("No thread with id {}", id))?,
        None => match store.current_thread() {
            Some(thread) => thread,
            None => {
                println!("{}", "No current thread. Run `convey revise` first.".yellow());
                return Ok(());
            }
        },
    };

    let entries = SessionStore::reconstruct_version_list(thread);
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{} {}", "Thread".bold().cyan(), thread.thread_id().cyan());
    println!();
    for entry in &entries {
        match entry {
            VersionEntry::Original { .. } => {
                println!("{}", "Original".bold());
                println!("{}", local_time(thread.start_time()).dimmed());
            }
            VersionEntry::Version { version_number, .. } => {
                println!("{}", format!("Version {}", version_number).bold());
                if let Some(version) = thread.versions().get(version_number - 1) {
                    println!("{}", version_details(version).dimmed());
                }
            }
        }
        println!("{}", entry.content());
        println!();
    }
    Ok(())
}

fn local_time(time: chrono::DateTime<chrono::Utc>) -> String {
    time.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// One-line summary of how a version was produced
fn version_details(version: &RewriteVersion) -> String {
    let mut parts = vec![
        local_time(version.timestamp),
        version.request_type.to_string(),
        version.content_type.clone(),
    ];
    if let Some(platform) = &version.social_platform {
        parts.push(platform.clone());
    }
    parts.push(format!(
        "similarity {} ({})",
        version.similarity,
        version.similarity.band().label()
    ));
    parts.join(" · ")
}

#[derive(Tabled)]
struct ThreadRow {
    #[tabled(rename = "")]
    marker: String,
    #[tabled(rename = "Thread")]
    thread_id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Versions")]
    versions: usize,
    #[tabled(rename = "Started")]
    started: String,
}

impl ThreadRow {
    fn new(thread: &Thread, current: Option<&str>) -> Self {
        Self {
            marker: if current == Some(thread.thread_id()) {
                "*".to_string()
            } else {
                String::new()
            },
            thread_id: thread.thread_id().to_string(),
            title: thread.title(),
            versions: thread.versions().len(),
            started: thread
                .start_time()
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
        }
    }
}

/// List all threads of the session
pub async fn run_threads(ctx: &AppContext) -> Result<()> {
    let store = ctx.store.lock().await;
    let threads = store.threads_by_start();
    if threads.is_empty() {
        println!("{}", "No threads yet.".yellow());
        return Ok(());
    }

    let current = store.state().current_thread_id();
    let rows: Vec<ThreadRow> = threads
        .iter()
        .map(|thread| ThreadRow::new(thread, current))
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!(
        "{} thread(s), {} version(s). * marks the current thread.",
        store.state().thread_count(),
        store.state().version_count()
    );
    Ok(())
}

/// Export the whole session to stdout or a file
pub async fn run_export(ctx: &AppContext, format: ExportFormat, output: Option<&Path>) -> Result<()> {
    let store = ctx.store.lock().await;
    let content = match format {
        ExportFormat::Json => store.export_json()?,
        ExportFormat::Markdown => store.export_markdown(),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Exported {} thread(s) to {}",
                "✓".green(),
                store.state().thread_count(),
                path.display()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Replace the session with a JSON export
pub async fn run_import(ctx: &AppContext, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut store = ctx.store.lock().await;
    let state = store.import_json(&json)?;
    println!(
        "{} Imported {} thread(s), {} version(s)",
        "✓".green(),
        state.thread_count(),
        state.version_count()
    );
    Ok(())
}

/// Wipe the session
pub async fn run_clear(ctx: &AppContext) -> Result<()> {
    let mut store = ctx.store.lock().await;
    let removed = store.state().thread_count();
    store.clear();
    println!("{} Cleared {} thread(s)", "✓".green(), removed);
    Ok(())
}

/// Guess the content type of a text
pub fn run_detect(text: &str, format: OutputFormat) -> Result<()> {
    let detection = detect_content_type(text);
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
        return Ok(());
    }
    match detection {
        Some(detection) => println!(
            "{} ({}, {}% confident)",
            detection.kind.label().bold(),
            detection.kind.id(),
            detection.confidence
        ),
        None => println!("{}", "No confident guess; use --content-type other".yellow()),
    }
    Ok(())
}

#[derive(Tabled)]
struct ChipRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Select")]
    select: &'static str,
    #[tabled(rename = "Values")]
    values: String,
}

/// List style categories and their known values
pub fn run_chips() -> Result<()> {
    let rows: Vec<ChipRow> = Category::all()
        .map(|category| ChipRow {
            category: format!("{} ({})", category.label(), category.id()),
            select: if category.is_multi() { "many" } else { "one" },
            values: category_options(category)
                .iter()
                .map(|option| option.value)
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!("{}", "Tip:".bold());
    println!("  • convey revise \"...\" --chip length=shorter --chip tone=clear --chip tone=gentle");
    println!("  • Earlier tone picks weigh more than later ones");
    Ok(())
}

/// Print the effective configuration, optionally writing it back
///
/// `path` is the `--config` file; the platform config file otherwise.
pub fn run_config(config: &Config, custom_path: Option<&Path>, save: bool) -> Result<()> {
    let path = match custom_path {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };

    if save {
        match custom_path {
            Some(path) => {
                if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("Failed to create {}", dir.display()))?;
                }
                config.save_to(path)?;
            }
            None => config.save()?,
        }
        println!("{} Saved configuration to {}", "✓".green(), path.display());
        return Ok(());
    }

    println!("{} {}", "Config file:".bold(), path.display());
    if !path.exists() {
        println!("{}", "(not present, showing defaults)".dimmed());
    }
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Print the share link of the current thread
pub async fn run_link(ctx: &AppContext) -> Result<()> {
    let store = ctx.store.lock().await;
    let current = store.state().current_thread_id();
    ctx.link.set_thread_id(current)?;
    match current {
        Some(_) => println!("{}", ctx.link.share_url()),
        None => println!("{}", "No current thread to share.".yellow()),
    }
    Ok(())
}
