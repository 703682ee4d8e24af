use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use incident_reports::config::{self, Config};
use incident_reports::db::{self, PgReportStore};
use incident_reports::models::{Category, ReportStatus, ReportUpdate};
use incident_reports::session::SessionState;
use incident_reports::store::{MemoryReportStore, ReportStore};
use incident_reports::{analysis, catalog, export, report, script};

#[derive(Parser)]
#[command(name = config::APP_NAME, version = config::APP_VERSION)]
#[command(about = "Pictogram-based school harassment reporting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load the symbol catalog and default locations
    Seed,
    /// Import locations from a CSV file
    ImportLocations {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List known locations
    Locations,
    /// List symbols, optionally for a single category
    Symbols {
        #[arg(long)]
        category: Option<Category>,
    },
    /// Run a report wizard from an answers file and submit it
    Submit {
        #[arg(long)]
        answers: PathBuf,
        /// Submit to an in-memory store instead of Postgres
        #[arg(long)]
        dry_run: bool,
    },
    /// List reports, newest first
    List {
        #[arg(long)]
        status: Option<ReportStatus>,
    },
    /// Change the status or notes of a report
    Update {
        id: Uuid,
        #[arg(long)]
        status: Option<ReportStatus>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Trend analysis for one student
    Analyze {
        #[arg(long)]
        student_id: String,
    },
    /// Generate a markdown review digest
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export reports as CSV with legacy register codes
    Export {
        /// Defaults to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Poll for reports until Ctrl-C
    Watch {
        #[arg(long)]
        status: Option<ReportStatus>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect(config: &Config) -> anyhow::Result<PgReportStore> {
    let database_url = config.require_database_url()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(PgReportStore::new(pool))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    let config = Config::from_env()?;
    let mut session = SessionState::new();

    match cli.command {
        Commands::InitDb => {
            let store = connect(&config).await?;
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let store = connect(&config).await?;
            db::seed(store.pool()).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportLocations { csv } => {
            let store = connect(&config).await?;
            let imported = db::import_locations_csv(store.pool(), &csv).await?;
            println!("Imported {imported} locations from {}.", csv.display());
        }
        Commands::Locations => {
            let store = connect(&config).await?;
            for location in store.list_locations().await? {
                println!("- {} {} ({})", location.icon, location.name, location.id);
            }
        }
        Commands::Symbols { category } => {
            let store = connect(&config).await?;
            let categories = match category {
                Some(category) => vec![category],
                None => Category::REPORTABLE.to_vec(),
            };
            for category in categories {
                let info = catalog::category_info(category);
                println!("{}:", info.label);
                for symbol in store.list_symbols_by_category(category).await? {
                    println!("- {} ({})", symbol.label, symbol.id);
                }
            }
        }
        Commands::Submit { answers, dry_run } => {
            let text = std::fs::read_to_string(&answers)
                .with_context(|| format!("failed to read {}", answers.display()))?;
            let answers_script = script::WizardScript::from_json(&text)
                .with_context(|| format!("invalid answers file {}", answers.display()))?;

            if let Some(banner) = session.take_banner() {
                println!("{banner}");
            }

            let submitted = if dry_run {
                let store = MemoryReportStore::new();
                script::run_script(&answers_script, &store, Instant::now()).await?
            } else {
                let store = connect(&config).await?;
                script::run_script(&answers_script, &store, Instant::now()).await?
            };
            println!("Thank you. Report {} recorded.", submitted.id);
            println!("{}", report::summary_line(&submitted));
        }
        Commands::List { status } => {
            let store = connect(&config).await?;
            let reports = store.list_reports().await?;
            let counts = report::count_by_status(&reports);
            println!(
                "{} pending, {} reviewed, {} resolved",
                counts.pending, counts.reviewed, counts.resolved
            );

            let shown = report::filter_by_status(&reports, status);
            if shown.is_empty() {
                println!("No reports found.");
                return Ok(());
            }
            for entry in shown {
                println!("- {}", report::summary_line(entry));
            }
        }
        Commands::Update { id, status, notes } => {
            let update = ReportUpdate {
                status,
                teacher_notes: notes,
            };
            if update.is_empty() {
                bail!("nothing to update: pass --status and/or --notes");
            }
            let store = connect(&config).await?;
            store.update_report(id, &update).await?;
            println!("Report {id} updated.");
        }
        Commands::Analyze { student_id } => {
            let store = connect(&config).await?;
            let history = store.list_reports_for_student(&student_id).await?;
            let result = analysis::analyze_student_reports(&history);
            let mut output = String::new();
            report::render_analysis(&mut output, &result);
            print!("{output}");
        }
        Commands::Report { out } => {
            let store = connect(&config).await?;
            let reports = store.list_reports().await?;
            std::fs::write(&out, report::build_report(&reports))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { out } => {
            let store = connect(&config).await?;
            let reports = store.list_reports().await?;
            match out {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    let written = export::write_csv(file, &reports)?;
                    println!("Exported {written} reports to {}.", path.display());
                }
                None => {
                    export::write_csv(std::io::stdout().lock(), &reports)?;
                }
            }
        }
        Commands::Watch { status } => {
            let store = connect(&config).await?;
            watch(&store, &mut session, &config, status).await;
        }
    }

    Ok(())
}

async fn watch<S: ReportStore + ?Sized>(
    store: &S,
    session: &mut SessionState,
    config: &Config,
    status: Option<ReportStatus>,
) {
    let mut interval = tokio::time::interval(config.refresh_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    if let Some(banner) = session.take_banner() {
        println!("{banner}");
    }
    info!(interval = ?config.refresh_interval, "watching for reports");

    let mut last_seen: Option<usize> = None;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match store.list_reports().await {
                    Ok(reports) => {
                        let shown = report::filter_by_status(&reports, status);
                        if last_seen != Some(shown.len()) {
                            let counts = report::count_by_status(&reports);
                            println!(
                                "{} pending, {} reviewed, {} resolved",
                                counts.pending, counts.reviewed, counts.resolved
                            );
                            if let Some(latest) = shown.first() {
                                println!("- {}", report::summary_line(latest));
                            }
                            last_seen = Some(shown.len());
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to refresh reports"),
                }
            }
            _ = &mut shutdown => {
                info!("stopping watch");
                break;
            }
        }
    }
}
