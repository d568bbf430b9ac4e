//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use prospector_core::pipeline::{
    BatchReport, CancellationFlag, DiscoveryRequest, ProgressReporter, StorageFailurePolicy,
};
use prospector_core::{HttpOracle, JudgmentOracleClient};
use prospector_shared::{
    AppConfig, CandidateRecord, PersistedProspect, ProspectId, SourceKind, Status, init_config,
    load_config, resolve_secret,
};
use prospector_sources::{SampleSource, SourceAdapter, WebDirectorySource};
use prospector_storage::{MemoryStore, ProspectStore, Storage};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Prospector: find likely clients and draft outreach to them.
#[derive(Parser)]
#[command(
    name = "prospector",
    version,
    about = "Discover candidate companies, score them, and draft outreach.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Candidate source selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum SourceArg {
    Sample,
    Web,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Sample => SourceKind::Sample,
            SourceArg::Web => SourceKind::Web,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run a discovery batch: acquire, enrich, score, draft, persist.
    Discover {
        /// Search terms passed to the source.
        #[arg(required = true)]
        terms: Vec<String>,

        /// Process at most this many candidates.
        #[arg(long)]
        max_results: Option<usize>,

        /// Draft outreach when the composite score reaches this value.
        #[arg(long)]
        draft_threshold: Option<u8>,

        /// Report prospects whose composite score reaches this value.
        #[arg(long)]
        report_threshold: Option<u8>,

        /// Candidate source (defaults to `acquisition.source`).
        #[arg(long)]
        source: Option<SourceArg>,

        /// Skip candidates whose writes fail instead of aborting the batch.
        #[arg(long)]
        skip_storage_errors: bool,

        /// Keep results in memory; nothing is written to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Score and store a single company.
    Analyze {
        #[arg(long)]
        company: String,

        #[arg(long)]
        industry: String,

        /// Size class, e.g. "11-50 employees".
        #[arg(long)]
        size: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        website: Option<String>,

        /// Job-posting excerpt (repeatable).
        #[arg(long = "job-posting")]
        job_postings: Vec<String>,

        /// Technology indicator (repeatable).
        #[arg(long = "tech")]
        tech_stack: Vec<String>,

        /// Draft outreach when the composite score reaches this value.
        #[arg(long)]
        draft_threshold: Option<u8>,

        /// Keep the result in memory; nothing is written to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// List stored prospects.
    List {
        /// Only scored prospects at or above this composite, best first.
        #[arg(long, conflicts_with = "recent")]
        min_score: Option<u8>,

        /// The N most recently created prospects.
        #[arg(long)]
        recent: Option<usize>,

        /// Only prospects with this status.
        #[arg(long)]
        status: Option<String>,
    },

    /// Set a prospect's status.
    Status {
        /// Prospect ID.
        id: String,

        /// discovered, analyzed, contacted, responded, qualified, or rejected.
        status: String,
    },

    /// Regenerate and save the outreach message for a scored prospect.
    Outreach {
        /// Prospect ID.
        id: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "prospector=info",
        1 => "prospector=debug",
        _ => "prospector=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Discover {
            terms,
            max_results,
            draft_threshold,
            report_threshold,
            source,
            skip_storage_errors,
            dry_run,
        } => {
            let config = load_config()?;
            let mut request = DiscoveryRequest::from_defaults(terms, &config.defaults);
            if let Some(n) = max_results {
                request.max_results = n;
            }
            if let Some(t) = draft_threshold {
                request.draft_threshold = t;
            }
            if let Some(t) = report_threshold {
                request.report_threshold = t;
            }
            if skip_storage_errors {
                request.storage_failure = StorageFailurePolicy::Skip;
            }
            let kind = source.map(SourceKind::from).unwrap_or(config.acquisition.source);
            cmd_discover(&config, request, kind, dry_run).await
        }
        Command::Analyze {
            company,
            industry,
            size,
            description,
            website,
            job_postings,
            tech_stack,
            draft_threshold,
            dry_run,
        } => {
            let candidate = CandidateRecord {
                job_postings,
                tech_stack,
                website,
                ..CandidateRecord::new(company, industry, size, description)
            };
            cmd_analyze(candidate, draft_threshold, dry_run).await
        }
        Command::List {
            min_score,
            recent,
            status,
        } => cmd_list(min_score, recent, status.as_deref()).await,
        Command::Status { id, status } => cmd_status(&id, &status).await,
        Command::Outreach { id } => cmd_outreach(&id).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Collaborator setup
// ---------------------------------------------------------------------------

async fn open_store(config: &AppConfig, dry_run: bool) -> Result<Box<dyn ProspectStore>> {
    if dry_run {
        info!("dry run: results are kept in memory only");
        return Ok(Box::new(MemoryStore::new()));
    }

    let storage = if config.store.is_remote() {
        let token = resolve_secret(&config.store.auth_token_env)?;
        Storage::open_remote(&config.store.database, &token).await?
    } else {
        Storage::open(&config.store.local_path()?).await?
    };
    Ok(Box::new(storage))
}

fn build_judge(config: &AppConfig) -> Result<JudgmentOracleClient<HttpOracle>> {
    Ok(JudgmentOracleClient::new(HttpOracle::from_config(
        &config.oracle,
    )?))
}

fn build_source(
    config: &AppConfig,
    kind: SourceKind,
    max_results: usize,
) -> Result<Box<dyn SourceAdapter>> {
    Ok(match kind {
        SourceKind::Sample => Box::new(SampleSource::new()),
        SourceKind::Web => Box::new(
            WebDirectorySource::new(&config.acquisition)?.with_profile_limit(max_results),
        ),
    })
}

fn parse_id(raw: &str) -> Result<ProspectId> {
    raw.trim()
        .parse()
        .map_err(|e| eyre!("invalid prospect id '{raw}': {e}"))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Attach a fresh cancellation flag to the request.
fn cancellable(mut request: DiscoveryRequest) -> (DiscoveryRequest, CancellationFlag) {
    let flag = CancellationFlag::new();
    request.cancellation = Some(flag.clone());
    (request, flag)
}

async fn cmd_discover(
    config: &AppConfig,
    request: DiscoveryRequest,
    kind: SourceKind,
    dry_run: bool,
) -> Result<()> {
    let judge = build_judge(config)?;
    let store = open_store(config, dry_run).await?;
    let mut source = build_source(config, kind, request.max_results)?;

    info!(
        terms = ?request.search_terms,
        source = source.name(),
        max_results = request.max_results,
        draft_threshold = request.draft_threshold,
        "running discovery"
    );

    let (request, flag) = cancellable(request);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping after the current candidate");
            flag.cancel();
        }
    });

    let reporter = CliProgress::new();
    let report = prospector_core::run_discovery_batch(
        &request,
        source.as_mut(),
        &judge,
        store.as_ref(),
        &reporter,
    )
    .await;
    interrupt.abort();
    reporter.finish();
    let report = report?;

    println!();
    println!("  Discovery complete{}", if dry_run { " (dry run)" } else { "" });
    println!("  Processed: {}", report.processed_count);
    println!(
        "  Qualified: {} (composite >= {})",
        report.qualified.len(),
        request.report_threshold
    );
    println!("  Failed:    {}", report.failures.len());
    if report.cancelled {
        println!("  Stopped early on cancellation");
    }
    println!("  Time:      {:.1}s", report.elapsed_ms as f64 / 1000.0);

    for prospect in &report.qualified {
        println!();
        println!(
            "  [{}] {} ({}, {})",
            prospect.score.composite,
            prospect.candidate.company,
            prospect.candidate.industry,
            prospect.candidate.size
        );
        println!("    ID: {}", prospect.id);
        if !prospect.score.rationale.is_empty() {
            println!("    Why: {}", prospect.score.rationale);
        }
        if let Some(message) = &prospect.outreach_message {
            println!("    Outreach:");
            for line in message.lines() {
                println!("      {line}");
            }
        }
    }

    for failure in &report.failures {
        println!();
        println!("  Skipped {}: {}", failure.company, failure.error);
    }
    println!();

    Ok(())
}

async fn cmd_analyze(
    candidate: CandidateRecord,
    draft_threshold: Option<u8>,
    dry_run: bool,
) -> Result<()> {
    let config = load_config()?;
    let judge = build_judge(&config)?;
    let store = open_store(&config, dry_run).await?;
    let threshold = draft_threshold.unwrap_or(config.defaults.single_draft_threshold);

    let analyzed =
        prospector_core::analyze_one(candidate, threshold, &judge, store.as_ref()).await?;
    let score = &analyzed.score;

    println!();
    println!("  {} analyzed", analyzed.candidate.company);
    println!("  ID:             {}", analyzed.id);
    println!("  Composite:      {}", score.composite);
    println!("  Urgency:        {}", score.urgency);
    println!("  Budget:         {}", score.budget);
    println!("  Fit:            {}", score.fit);
    println!("  Contactability: {}", score.contactability);
    if !score.rationale.is_empty() {
        println!("  Why:            {}", score.rationale);
    }
    match &analyzed.outreach_message {
        Some(message) => {
            println!("  Outreach:");
            for line in message.lines() {
                println!("    {line}");
            }
        }
        None => println!("  No outreach drafted (composite below {threshold})"),
    }
    println!();

    Ok(())
}

async fn cmd_list(min_score: Option<u8>, recent: Option<usize>, status: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config, false).await?;
    let status: Option<Status> = status.map(str::parse).transpose()?;

    let prospects = match (min_score, recent) {
        (Some(min), _) => store.list_by_min_score(min).await?,
        (None, Some(n)) => store.list_recent(n).await?,
        (None, None) => store.list_recent(config.defaults.max_results * 5).await?,
    };

    let shown: Vec<&PersistedProspect> = prospects
        .iter()
        .filter(|p| status.is_none_or(|s| p.status == s))
        .collect();

    if shown.is_empty() {
        println!("No prospects found.");
        return Ok(());
    }

    println!("{:<36}  {:>5}  {:<10}  {:<24}  INDUSTRY", "ID", "SCORE", "STATUS", "COMPANY");
    for p in shown {
        let score = p
            .composite()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<36}  {:>5}  {:<10}  {:<24}  {}",
            p.id.to_string(),
            score,
            p.status.as_str(),
            truncate(&p.candidate.company, 24),
            p.candidate.industry
        );
    }

    Ok(())
}

async fn cmd_status(id: &str, status: &str) -> Result<()> {
    let id = parse_id(id)?;
    let status: Status = status.parse()?;
    let config = load_config()?;
    let store = open_store(&config, false).await?;

    store.set_status(&id, status).await?;
    info!(%id, %status, "status updated");
    println!("{id} -> {status}");
    Ok(())
}

async fn cmd_outreach(id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let config = load_config()?;
    let judge = build_judge(&config)?;
    let store = open_store(&config, false).await?;

    let message = prospector_core::regenerate_outreach(&id, &judge, store.as_ref()).await?;
    println!("{message}");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    /// Clear the spinner; safe to call after `done`.
    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn candidate_started(&self, company: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Analyzing [{current}/{total}] {company}"));
    }

    fn candidate_finished(&self, company: &str, composite: Option<u8>) {
        match composite {
            Some(c) => self.spinner.println(format!("  ✓ {company} ({c})")),
            None => self.spinner.println(format!("  ✗ {company} (skipped)")),
        }
    }

    fn done(&self, _report: &BatchReport) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn interrupt_flag_reaches_the_request() {
        let (request, flag) = cancellable(DiscoveryRequest::new(vec!["saas".into()]));
        let attached = request.cancellation.clone().unwrap();
        assert!(!attached.is_cancelled());
        flag.cancel();
        assert!(attached.is_cancelled());
    }

    #[test]
    fn discover_requires_terms() {
        assert!(Cli::try_parse_from(["prospector", "discover"]).is_err());
        let cli = Cli::try_parse_from([
            "prospector",
            "discover",
            "saas",
            "fintech",
            "--max-results",
            "3",
            "--source",
            "web",
            "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Discover {
                terms,
                max_results,
                source,
                dry_run,
                ..
            } => {
                assert_eq!(terms, vec!["saas", "fintech"]);
                assert_eq!(max_results, Some(3));
                assert_eq!(source, Some(SourceArg::Web));
                assert!(dry_run);
            }
            _ => panic!("expected discover"),
        }
    }

    #[test]
    fn analyze_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "prospector",
            "analyze",
            "--company",
            "Acme",
            "--industry",
            "SaaS",
            "--size",
            "11-50",
            "--description",
            "Widgets",
            "--tech",
            "React",
            "--tech",
            "AWS",
            "--job-posting",
            "Ops Manager",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                tech_stack,
                job_postings,
                draft_threshold,
                ..
            } => {
                assert_eq!(tech_stack, vec!["React", "AWS"]);
                assert_eq!(job_postings, vec!["Ops Manager"]);
                assert_eq!(draft_threshold, None);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn list_filters_conflict() {
        assert!(
            Cli::try_parse_from(["prospector", "list", "--min-score", "60", "--recent", "5"])
                .is_err()
        );
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("Acme", 10), "Acme");
        assert_eq!(truncate("Acme Analytics International", 10), "Acme Anal…");
    }
}
