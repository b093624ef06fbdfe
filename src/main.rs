use clap::Parser;
use kbm_accrual::workbook::journal_totals;
use kbm_accrual::{
    process_with_verification, read_workbook, write_report, AccrualConfig, ReferenceTables,
    Result, RunParameters,
};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser, Debug)]
#[command(
    name = "kbm-accrual",
    version,
    about = "Build the no-document accrual journal and branch reports from a KBM workbook"
)]
struct Cli {
    /// KBM workbook: two prior old-format sheets, the current old-format sheet, then the new-format sheet
    #[arg(short = 'i', long = "input", required_unless_present = "print_config_schema")]
    input: Option<PathBuf>,

    /// Month to close (januari .. desember)
    #[arg(short = 'm', long = "month", required_unless_present = "print_config_schema")]
    month: Option<String>,

    /// Four-digit year
    #[arg(short = 'y', long = "year", required_unless_present = "print_config_schema")]
    year: Option<String>,

    /// Branch codes, comma separated or repeated
    #[arg(short = 'b', long = "branch", value_delimiter = ',')]
    branches: Vec<String>,

    /// Account lookup table (csv or xlsx) with `Nama Kegiatan` and `COA` columns
    #[arg(long = "coa", default_value = "list_COA.csv")]
    coa: PathBuf,

    /// Price list (csv or xlsx) with `CABANG`, `STVDR`, `HAULAGE` and `LOLO BM` columns
    #[arg(long = "tariff", default_value = "tarif.csv")]
    tariff: PathBuf,

    /// JSON configuration replacing the built-in branch directory and account codes
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Output workbook (default: OUTPUT_KBM_<MONTH>_<YEAR>.xlsx)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Print the JSON schema of the configuration file and exit
    #[arg(long = "print-config-schema")]
    print_config_schema: bool,

    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_max_level(if cli.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
        .with_target(true)
        .with_level(true)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run aborted, no output written: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.print_config_schema {
        println!("{}", AccrualConfig::schema_as_json()?);
        return Ok(());
    }

    let params = RunParameters {
        month: cli.month.unwrap_or_default(),
        year: cli.year.unwrap_or_default(),
        branches: cli.branches,
    };

    let config = match &cli.config {
        Some(path) => AccrualConfig::from_json_file(path)?,
        None => AccrualConfig::default(),
    };
    params.validate(&config.branch_directory())?;

    let references = ReferenceTables::load(&cli.coa, &cli.tariff)?;
    let dataset = read_workbook(cli.input.unwrap_or_default())?;

    let report = process_with_verification(&dataset, &references, &params, &config)?;

    let (debits, credits) = journal_totals(&report.journal);
    info!("Journal totals: debit {}, credit {}", debits, credits);

    let output = match cli.output {
        Some(path) => path,
        None => PathBuf::from(params.default_output_name()?),
    };
    write_report(&report, &output)
}
