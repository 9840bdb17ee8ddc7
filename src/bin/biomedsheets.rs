use std::io::{self, Write};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use biomedsheets::app::App;
use biomedsheets::config::{ConfigLoader, ResolvedConfig};
use biomedsheets::domain::{AssaySelector, SheetType};
use biomedsheets::error::SheetError;
use biomedsheets::output::JsonOutput;

#[derive(Parser)]
#[command(name = "biomedsheets")]
#[command(about = "Sample sheet views for germline pedigrees and matched tumor/normal studies")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Write the germline cohort as a PED file")]
    Ped(PedArgs),
    #[command(about = "Print a JSON summary of the sheet")]
    Summary(SheetArgs),
    #[command(about = "Print the entity at a secondary id path, e.g. P001-N1-DNA1")]
    Crawl(CrawlArgs),
}

#[derive(Args, Clone)]
struct SheetArgs {
    /// Project file; defaults to biomedsheets.json unless --sheet is given.
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    sheet: Option<Utf8PathBuf>,

    #[arg(long = "type", value_enum)]
    sheet_type: Option<SheetType>,

    #[arg(long, value_enum)]
    selector: Option<AssaySelector>,

    #[arg(long)]
    join_by_field: Option<String>,

    #[arg(long)]
    only_with_dna_library: bool,
}

#[derive(Args, Clone)]
struct PedArgs {
    #[command(flatten)]
    sheet: SheetArgs,

    /// Output file; stdout when neither this nor the project file names one.
    #[arg(long, short)]
    output: Option<Utf8PathBuf>,
}

#[derive(Args, Clone)]
struct CrawlArgs {
    #[command(flatten)]
    sheet: SheetArgs,

    path: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SheetError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SheetError) -> u8 {
    match error {
        SheetError::MissingConfig | SheetError::ConfigRead(_) | SheetError::SheetRead(_) => 2,
        SheetError::MissingDataEntity { .. }
        | SheetError::AmbiguousSecondaryId { .. }
        | SheetError::SecondaryIdNotFound(_)
        | SheetError::InvalidFieldValue { .. }
        | SheetError::UndefinedField { .. }
        | SheetError::InconsistentPedigree { .. }
        | SheetError::UnknownParent { .. }
        | SheetError::DuplicateKey { .. }
        | SheetError::SheetParse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ped(args) => run_ped(args),
        Commands::Summary(args) => run_summary(args),
        Commands::Crawl(args) => run_crawl(args),
    }
}

/// Project file values with command line flags applied on top.
fn resolve_config(args: &SheetArgs) -> Result<ResolvedConfig, SheetError> {
    let mut config = match (&args.config, &args.sheet) {
        (None, Some(sheet)) => ResolvedConfig::for_sheet(sheet.clone()),
        (config, _) => ConfigLoader::resolve(config.as_deref())?,
    };
    if let Some(sheet) = &args.sheet {
        config.sheet_path = sheet.clone();
    }
    if let Some(sheet_type) = args.sheet_type {
        config.sheet_type = sheet_type;
    }
    if let Some(selector) = args.selector {
        config.selector = selector;
    }
    if let Some(field) = &args.join_by_field {
        config.join_by_field = Some(field.clone());
    }
    if args.only_with_dna_library {
        config.only_with_dna_library = true;
    }
    Ok(config)
}

fn run_ped(args: PedArgs) -> miette::Result<()> {
    let mut config = resolve_config(&args.sheet)?;
    if let Some(output) = args.output {
        config.ped_output = Some(output);
    }
    let app = App::new(config);
    let sheet = app.load_sheet()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = app.ped(&sheet, &mut out)?;
    out.flush().into_diagnostic()?;
    if result.output.is_some() {
        JsonOutput::print_ped(&result).into_diagnostic()?;
    }
    Ok(())
}

fn run_summary(args: SheetArgs) -> miette::Result<()> {
    let app = App::new(resolve_config(&args)?);
    let sheet = app.load_sheet()?;
    let result = app.summary(&sheet)?;
    JsonOutput::print_summary(&result).into_diagnostic()?;
    Ok(())
}

fn run_crawl(args: CrawlArgs) -> miette::Result<()> {
    let app = App::new(resolve_config(&args.sheet)?);
    let sheet = app.load_sheet()?;
    let result = app.crawl(&sheet, &args.path)?;
    JsonOutput::print_crawl(&result).into_diagnostic()?;
    Ok(())
}
