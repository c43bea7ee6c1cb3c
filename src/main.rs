//! CLI entry point for the classroom evaluation reports tool.
//!
//! Loads a score sheet, composes per-instructor, per-program and
//! institution-wide reports, writes them to disk and optionally hands them
//! to a mailer.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use classroom_reports::{
    analyzers::tier::PerformanceTier,
    config::{NameColumn, ReportConfig},
    delivery::{
        CoordinatorDirectory, DeliveryOptions, DryRunMailer, Mailer, OutboxMailer, ReportKind,
        deliver, parse_emails, resolve_attachments,
    },
    normalize::normalize,
    output::{render_institution, render_instructor, render_program_summary},
    output::{write_institution, write_instructor, write_program},
    parser::load_table,
    records::ClassroomRecord,
    report::{ReportFilters, ReportLimits},
    report::{compose_institution, compose_instructors, compose_programs},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "classroom_reports")]
#[command(about = "Classroom evaluation reports per instructor, program and institution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a score sheet and log institution-wide totals
    Summary {
        /// Score sheet exported as CSV
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,
    },
    /// Write reports to the output directory
    Generate {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Write reports and deliver them
    Send {
        #[command(flatten)]
        report: ReportArgs,

        #[command(flatten)]
        delivery: DeliveryArgs,
    },
}

#[derive(Args)]
struct ColumnArgs {
    /// Header of the instructor name column
    #[arg(long, conflicts_with = "name_position")]
    name_column: Option<String>,

    /// 1-based position of the instructor name column (default: 5)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    name_position: Option<u64>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Granularity {
    Instructors,
    Programs,
}

#[derive(Args)]
struct ReportArgs {
    /// Score sheet exported as CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "salida")]
    out: PathBuf,

    /// Report granularities to produce
    #[arg(long, value_enum, value_delimiter = ',', default_values = ["instructors", "programs"])]
    reports: Vec<Granularity>,

    /// Also produce the institution-wide report
    #[arg(long, default_value_t = false)]
    global: bool,

    /// Only these programs (comma separated)
    #[arg(long, value_delimiter = ',')]
    only_programs: Vec<String>,

    /// Only these instructor ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    only_instructors: Vec<String>,

    /// Only instructors with these e-mails (`;` or `,` separated)
    #[arg(long)]
    only_emails: Option<String>,

    /// Stop after this many instructor reports
    #[arg(long)]
    limit_instructors: Option<usize>,

    /// Stop after this many program reports
    #[arg(long)]
    limit_programs: Option<usize>,

    #[command(flatten)]
    columns: ColumnArgs,
}

#[derive(Args)]
struct DeliveryArgs {
    /// Coordinator directory CSV (PROGRAMA, PROGRAMA_CORTO, COORDINADOR, EMAIL)
    #[arg(long)]
    coords: Option<PathBuf>,

    /// Send everything to this address instead (test run)
    #[arg(long)]
    force_to: Option<String>,

    #[arg(long)]
    cc: Option<String>,

    #[arg(long)]
    bcc: Option<String>,

    #[arg(long)]
    reply_to: Option<String>,

    /// Recipients of the institution report
    #[arg(long)]
    global_to: Option<String>,

    /// Extra files attached to every instructor report
    #[arg(long)]
    attach_instructor: Option<String>,

    /// Extra files attached to every program report
    #[arg(long)]
    attach_program: Option<String>,

    /// Log messages instead of queueing them
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Directory where queued messages are written (default: <out>/outbox)
    #[arg(long)]
    outbox: Option<PathBuf>,
}

/// Everything a delivery pass needs besides the reports themselves.
struct Delivery {
    mailer: Box<dyn Mailer>,
    options: DeliveryOptions,
    directory: Option<CoordinatorDirectory>,
    instructor_attachments: Vec<PathBuf>,
    program_attachments: Vec<PathBuf>,
    log_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/classroom_reports.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("classroom_reports.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summary { input, columns } => {
            let config = columns.config();
            let records = load_records(&input, &config)?;
            let institution = compose_institution(&records, &config.bands, &ReportFilters::default());

            for program in &institution.programs {
                info!(
                    program = %program.name,
                    classrooms = program.totals.total_count,
                    instructors = program.instructors.len(),
                    average = program.totals.display_average(),
                    "Program"
                );
            }
            let totals = &institution.totals;
            info!(
                classrooms = totals.total_count,
                average = totals.display_average(),
                excellent = totals.tier_counts.get(PerformanceTier::Excellent),
                good = totals.tier_counts.get(PerformanceTier::Good),
                acceptable = totals.tier_counts.get(PerformanceTier::Acceptable),
                unsatisfactory = totals.tier_counts.get(PerformanceTier::Unsatisfactory),
                "Institution summary"
            );
        }
        Commands::Generate { report } => {
            run_reports(&report, None).await?;
        }
        Commands::Send { report, delivery } => {
            let delivery = delivery.build(&report.out)?;
            run_reports(&report, Some(&delivery)).await?;
        }
    }

    Ok(())
}

impl ColumnArgs {
    fn config(&self) -> ReportConfig {
        let name_column = match (&self.name_column, self.name_position) {
            (Some(header), _) => NameColumn::Header(header.clone()),
            (None, Some(position)) => NameColumn::Position(position as usize - 1),
            (None, None) => NameColumn::default(),
        };
        ReportConfig::default().with_name_column(name_column)
    }
}

impl ReportArgs {
    fn filters(&self) -> ReportFilters {
        ReportFilters::default()
            .with_programs(&self.only_programs)
            .with_instructor_ids(&self.only_instructors)
            .with_emails(parse_emails(self.only_emails.as_deref().unwrap_or_default()))
    }

    fn limits(&self) -> ReportLimits {
        ReportLimits {
            instructors: self.limit_instructors,
            programs: self.limit_programs,
        }
    }
}

impl DeliveryArgs {
    fn build(&self, out_dir: &Path) -> Result<Delivery> {
        let mailer: Box<dyn Mailer> = if self.dry_run {
            Box::new(DryRunMailer)
        } else {
            let outbox = self.outbox.clone().unwrap_or_else(|| out_dir.join("outbox"));
            info!(outbox = %outbox.display(), "Queueing messages in outbox");
            Box::new(OutboxMailer::new(outbox))
        };

        let directory = match &self.coords {
            Some(path) if path.exists() => {
                let directory = CoordinatorDirectory::load(path)?;
                info!(programs = directory.len(), "Coordinator directory loaded");
                Some(directory)
            }
            Some(path) => {
                warn!(path = %path.display(), "Coordinator directory not found");
                None
            }
            None => None,
        };

        let split = |raw: &Option<String>| parse_emails(raw.as_deref().unwrap_or_default());
        Ok(Delivery {
            mailer,
            options: DeliveryOptions {
                force_to: self.force_to.clone(),
                cc: split(&self.cc),
                bcc: split(&self.bcc),
                reply_to: self.reply_to.clone(),
                global_to: split(&self.global_to),
            },
            directory,
            instructor_attachments: resolve_attachments(&split(&self.attach_instructor)),
            program_attachments: resolve_attachments(&split(&self.attach_program)),
            log_path: out_dir.join("envios.csv"),
        })
    }
}

/// Loads and normalizes the score sheet.
#[tracing::instrument(skip_all, fields(input = %input.display()))]
fn load_records(input: &Path, config: &ReportConfig) -> Result<Vec<ClassroomRecord>> {
    let table = load_table(input)?;
    let records = normalize(&table, &config.columns)?;
    info!(rows = table.rows.len(), classrooms = records.len(), "Score sheet loaded");
    Ok(records)
}

/// Composes, writes and (when `delivery` is set) sends every requested report.
#[tracing::instrument(skip_all, fields(out = %args.out.display()))]
async fn run_reports(args: &ReportArgs, delivery: Option<&Delivery>) -> Result<()> {
    let config = args.columns.config();
    let records = load_records(&args.input, &config)?;
    let filters = args.filters();
    let limits = args.limits();
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();

    if args.reports.contains(&Granularity::Instructors) {
        let summaries = compose_instructors(&records, &config.bands, &filters, limits.instructors);
        for summary in &summaries {
            let written = write_instructor(&args.out, &date, summary, &config)?;
            let Some(delivery) = delivery else { continue };

            let Some(to) = delivery.options.instructor_recipient(summary) else {
                warn!(instructor = %summary.name, id = %summary.id, "No valid e-mail, report not sent");
                continue;
            };
            let message = delivery.options.message(
                &[to],
                delivery.options.subject(ReportKind::Instructor, &summary.name, &date),
                render_instructor(summary, &config, &date),
                delivery.instructor_attachments.clone(),
            );
            if let Err(e) =
                deliver(delivery.mailer.as_ref(), &delivery.log_path, ReportKind::Instructor, &message).await
            {
                error!(instructor = %summary.name, error = %e, "Failed to deliver instructor report");
            }
            info!(instructor = %summary.name, path = %written.markdown.display(), "Instructor report done");
        }
        info!(count = summaries.len(), "Instructor reports written");
    }

    if args.reports.contains(&Granularity::Programs) {
        let programs = compose_programs(&records, &config.bands, &filters, limits.programs);
        for program in &programs {
            let written = write_program(&args.out, &date, program, &config)?;
            let Some(delivery) = delivery else { continue };

            let Some(to) = delivery
                .options
                .program_recipient(&program.name, delivery.directory.as_ref())
            else {
                warn!(program = %program.name, "No coordinator e-mail and no forced recipient, report only written");
                continue;
            };
            let mut attachments: Vec<PathBuf> = written.detail.iter().cloned().collect();
            attachments.extend(delivery.program_attachments.iter().cloned());
            let message = delivery.options.message(
                &[to],
                delivery.options.subject(ReportKind::Program, &program.name, &date),
                render_program_summary(program, &config, &date),
                attachments,
            );
            if let Err(e) =
                deliver(delivery.mailer.as_ref(), &delivery.log_path, ReportKind::Program, &message).await
            {
                error!(program = %program.name, error = %e, "Failed to deliver program report");
            }
        }
        info!(count = programs.len(), "Program reports written");
    }

    if args.global {
        let institution = compose_institution(&records, &config.bands, &ReportFilters::default());
        let written = write_institution(&args.out, &date, &institution, &config)?;

        if let Some(delivery) = delivery {
            let recipients = delivery.options.global_recipients();
            if recipients.is_empty() {
                warn!("No recipients for the institution report; use --global-to or --force-to");
            } else {
                let message = delivery.options.message(
                    &recipients,
                    delivery.options.subject(ReportKind::Global, "", &date),
                    render_institution(&institution, &config, &date),
                    vec![written.markdown.clone()],
                );
                if let Err(e) =
                    deliver(delivery.mailer.as_ref(), &delivery.log_path, ReportKind::Global, &message).await
                {
                    error!(error = %e, "Failed to deliver institution report");
                }
            }
        }
    }

    info!(out = %args.out.display(), "Finished writing reports");
    Ok(())
}
