use log::{info, warn};

use partisan_lean::dashboard::*;
use partisan_lean::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use text_diff::print_diff;

use crate::args::Args;
use crate::pipeline::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_json;

#[derive(Debug, Snafu)]
pub enum LeanError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Row {lineno}: cannot read cell {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading the header of {path}"))]
    CsvHeader { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: u64 },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: u64 },
    #[snafu(display("Missing column {column:?} in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno}: cannot read {column} from {content:?}"))]
    ParsingNumber {
        lineno: u64,
        column: String,
        content: String,
    },
    #[snafu(display("Line {lineno}: unknown party label {label:?}"))]
    UnknownParty { lineno: u64, label: String },
    #[snafu(display("Line {lineno}: unknown state {name:?}"))]
    InvalidState { lineno: u64, name: String },
    #[snafu(display("Column {header:?} is not a census year"))]
    InvalidCensusYear { header: String },
    #[snafu(display("Error writing {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading {path}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid apportionment table {path}"))]
    Apportionment {
        source: AggregationErrors,
        path: String,
    },
    #[snafu(display("Aggregation failed"))]
    Aggregation { source: AggregationErrors },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type LeanResult<T> = Result<T, LeanError>;
pub type BLeanResult<T> = Result<T, Box<LeanError>>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ApportionmentProvider {
    Csv,
    Xlsx,
}

/// Where to write a JSON document.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    fn parse(s: &str) -> OutputTarget {
        if s == "stdout" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(s))
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Stages {
    pub aggregate: bool,
    pub dashboard: bool,
    pub diagnostics: bool,
}

/// Everything a run needs, resolved from the configuration file and the
/// command line.
#[derive(PartialEq, Debug, Clone)]
pub struct RunConfig {
    pub results_path: Option<PathBuf>,
    pub apportionment_path: Option<PathBuf>,
    pub apportionment_provider: ApportionmentProvider,
    pub excel_worksheet_name: Option<String>,
    pub margins_path: PathBuf,
    pub dashboard_out: OutputTarget,
    pub diagnostics_out: OutputTarget,
    pub reference_path: Option<PathBuf>,
    pub stages: Stages,
    pub labels: PartyLabels,
    pub rules: AggregationRules,
    pub selection: Selection,
    pub dashboard_settings: DashboardSettings,
}

pub fn build_run_config(args: &Args) -> LeanResult<RunConfig> {
    let (config, root): (LeanConfig, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        None => (LeanConfig::default(), PathBuf::new()),
    };
    info!("config: {:?}", config);

    let stages = Stages {
        aggregate: !args.no_aggregate && config.stages.aggregate.unwrap_or(true),
        dashboard: !args.no_dashboard && config.stages.dashboard.unwrap_or(true),
        diagnostics: args.diagnostics || config.stages.diagnostics.unwrap_or(false),
    };

    let inputs = &config.input_settings;
    let results_path = match (&args.input, &inputs.results_file_path) {
        (Some(p), _) => Some(PathBuf::from(p)),
        (None, Some(p)) => Some(root.join(p)),
        (None, None) => None,
    };
    let apportionment_path = match (&args.apportionment, &inputs.apportionment_file_path) {
        (Some(p), _) => Some(PathBuf::from(p)),
        (None, Some(p)) => Some(root.join(p)),
        (None, None) => None,
    };
    if stages.aggregate && (results_path.is_none() || apportionment_path.is_none()) {
        whatever!("Both a results file (--input) and an apportionment file (--apportionment) are required to compute the margins")
    }
    let provider_name = args
        .apportionment_type
        .clone()
        .or_else(|| inputs.apportionment_provider.clone());
    let apportionment_provider = provider(provider_name.as_deref(), apportionment_path.as_deref())?;

    let outputs = &config.output_settings;
    let out_dir = root.join(outputs.output_directory.as_deref().unwrap_or("."));
    let margins_path = match &args.out {
        Some(p) => PathBuf::from(p),
        None => out_dir.join(outputs.margins_file.as_deref().unwrap_or("margins.csv")),
    };
    let output_target = |arg: &Option<String>, conf: &Option<String>, default: &str| match (arg, conf)
    {
        (Some(p), _) => OutputTarget::parse(p),
        (None, Some(p)) if p == "stdout" => OutputTarget::Stdout,
        (None, Some(p)) => OutputTarget::File(out_dir.join(p)),
        (None, None) => OutputTarget::File(out_dir.join(default)),
    };
    let dashboard_out = output_target(&args.dashboard_out, &outputs.dashboard_file, "dashboard.json");
    let diagnostics_out = output_target(
        &args.diagnostics_out,
        &outputs.diagnostics_file,
        "lean_distribution.json",
    );

    let dash = &config.dashboard;
    let metric = match &args.metric {
        Some(m) => parse_metric(m)?,
        None => dash.metric()?,
    };
    let hover = match &args.hover {
        Some(h) => Some(parse_state(h)?),
        None => dash.hover_state()?,
    };
    let selection = Selection {
        year: args.year.or(dash.year),
        metric,
        hover,
    };
    let dashboard_settings = DashboardSettings {
        default_hover: dash.default_hover_state()?,
    };

    Ok(RunConfig {
        results_path,
        apportionment_path,
        apportionment_provider,
        excel_worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or_else(|| inputs.excel_worksheet_name.clone()),
        margins_path,
        dashboard_out,
        diagnostics_out,
        reference_path: args.reference.as_ref().map(PathBuf::from),
        stages,
        labels: config.rules.party_labels(),
        rules: config.rules.aggregation_rules()?,
        selection,
        dashboard_settings,
    })
}

fn provider(name: Option<&str>, path: Option<&Path>) -> LeanResult<ApportionmentProvider> {
    match name {
        Some("csv") => Ok(ApportionmentProvider::Csv),
        Some("xlsx") | Some("excel") => Ok(ApportionmentProvider::Xlsx),
        Some(x) => whatever!("Unknown apportionment provider {:?}: expected csv or xlsx", x),
        None => {
            let is_excel = path
                .and_then(|p| p.extension())
                .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
                .unwrap_or(false);
            if is_excel {
                Ok(ApportionmentProvider::Xlsx)
            } else {
                Ok(ApportionmentProvider::Csv)
            }
        }
    }
}

fn display(p: &Path) -> String {
    p.display().to_string()
}

/// The output directory may not exist yet.
fn create_parent_dir(p: &Path) -> LeanResult<()> {
    match p.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).context(WritingFileSnafu { path: display(dir) })
        }
        _ => Ok(()),
    }
}

pub fn run(args: &Args) -> BLeanResult<()> {
    let config = build_run_config(args)?;
    run_pipeline(&config)
}

pub fn run_pipeline(config: &RunConfig) -> BLeanResult<()> {
    info!("stages: {:?}", config.stages);
    let margins_path = display(&config.margins_path);

    if config.stages.aggregate {
        if let (Some(results_p), Some(apportionment_p)) =
            (&config.results_path, &config.apportionment_path)
        {
            let result = aggregate(
                &display(results_p),
                &display(apportionment_p),
                config,
            )?;
            create_parent_dir(&config.margins_path)?;
            io_csv::write_margins(&margins_path, &result.records)?;
            info!(
                "Wrote {} records to {:?}",
                result.records.len(),
                margins_path
            );
        } else {
            warn!("No results or apportionment file, the margins are not computed");
        }
        // The reference summary, if provided for comparison
        if let Some(reference_p) = &config.reference_path {
            check_reference(&margins_path, &display(reference_p))?;
        }
    }

    if config.stages.dashboard || config.stages.diagnostics {
        let table = MarginTable::new(io_csv::read_margins(&margins_path)?);
        if table.is_empty() {
            warn!("No margins could be read from {:?}", margins_path);
        } else {
            info!(
                "Read {} records from {:?}",
                table.records().len(),
                margins_path
            );
        }
        if config.stages.dashboard {
            let view = render(&table, &config.selection, &config.dashboard_settings);
            let js = io_json::dashboard_to_json(&table, &view);
            io_json::write_json(&config.dashboard_out, &js)?;
        }
        if config.stages.diagnostics {
            let js = io_json::diagnostics_to_json(&lean_distribution(&table));
            io_json::write_json(&config.diagnostics_out, &js)?;
        }
    }
    Ok(())
}

fn aggregate(
    results_path: &str,
    apportionment_path: &str,
    config: &RunConfig,
) -> BLeanResult<AggregationResult> {
    info!("Attempting to read results file {:?}", results_path);
    let rows = io_csv::read_results(results_path, &config.labels)?;

    info!(
        "Attempting to read apportionment file {:?}",
        apportionment_path
    );
    let apportionment = match config.apportionment_provider {
        ApportionmentProvider::Csv => io_csv::read_apportionment(apportionment_path)?,
        ApportionmentProvider::Xlsx => {
            io_excel::read_apportionment(apportionment_path, config.excel_worksheet_name.as_deref())?
        }
    };

    let result = run_aggregation(&rows, &apportionment, &config.rules)
        .context(AggregationSnafu {})?;
    for y in result.years.iter() {
        info!(
            "{}: national margin {}, {} electoral votes",
            y.year,
            lean_label(y.national_margin),
            y.electoral_votes
        );
    }
    for r in result.incomplete.iter() {
        warn!("Incomplete record: {} {}: {:?}", r.year, r.state, r.reason);
    }
    Ok(result)
}

fn check_reference(margins_path: &str, reference_path: &str) -> LeanResult<()> {
    let written = fs::read_to_string(margins_path).context(ReadingFileSnafu {
        path: margins_path.to_string(),
    })?;
    let reference = fs::read_to_string(reference_path).context(ReadingFileSnafu {
        path: reference_path.to_string(),
    })?;
    if reference != written {
        warn!("Found differences with the reference file {:?}", reference_path);
        print_diff(reference.as_str(), written.as_str(), "\n");
        whatever!("Difference detected between the computed margins and the reference margins")
    }
    info!("The computed margins match the reference {:?}", reference_path);
    Ok(())
}

// Each test has a directory in tests/data with a configuration and the
// expected margins.
#[cfg(test)]
fn test_wrapper(test_name: &str) -> BLeanResult<serde_json::Value> {
    let _ = env_logger::builder().is_test(true).try_init();
    let test_dir = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name);
    let out_dir = tempfile::tempdir().context(WritingFileSnafu {
        path: "tempdir".to_string(),
    })?;
    let out = |name: &str| Some(out_dir.path().join(name).display().to_string());
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}_config.json", test_dir, test_name)),
        reference: Some(format!("{}/{}_expected_margins.csv", test_dir, test_name)),
        out: out("margins.csv"),
        dashboard_out: out("dashboard.json"),
        diagnostics_out: out("lean_distribution.json"),
        ..Args::default()
    };
    run(&args)?;
    let path = out_dir.path().join("dashboard.json").display().to_string();
    let contents = fs::read_to_string(&path).context(ReadingFileSnafu { path })?;
    let js: serde_json::Value = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    Ok(js)
}
