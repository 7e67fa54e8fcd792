use clap::Parser;

/// Computes the partisan lean of each state in presidential elections, and
/// prepares the data for an interactive map.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. The paths it contains are relative to
    /// the directory of the configuration file. The options below override its content.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The election results, as a CSV file with one row per candidate, state and year
    /// (columns year, state_po, party, candidatevotes, totalvotes).
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path) The number of seats in the House of Representatives for each state and
    /// census year. CSV or Excel file.
    #[clap(short, long, value_parser)]
    pub apportionment: Option<String>,

    /// (csv or xlsx) The type of the apportionment file. Guessed from the extension if not provided.
    #[clap(long, value_parser)]
    pub apportionment_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. Required if the
    /// workbook has several worksheets.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path) Where to write the margins table. Defaults to margins.csv in the output directory.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or 'stdout') Where to write the dashboard in JSON format.
    #[clap(long, value_parser)]
    pub dashboard_out: Option<String>,

    /// (file path or 'stdout') Where to write the lean distribution in JSON format.
    #[clap(long, value_parser)]
    pub diagnostics_out: Option<String>,

    /// (file path) A reference margins table. If provided, leanmap checks that the computed
    /// margins are identical to the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// The election year shown in the dashboard. Defaults to the first year of the table, where
    /// the year slider starts.
    #[clap(short, long, value_parser)]
    pub year: Option<u32>,

    /// ("Margin of Victory" or "Partisan Lean") The metric shown in the dashboard.
    #[clap(short, long, value_parser)]
    pub metric: Option<String>,

    /// (state code or name) The state highlighted in the trend lines.
    #[clap(long, value_parser)]
    pub hover: Option<String>,

    /// Skips the computation of the margins and reuses an existing margins table.
    #[clap(long, takes_value = false)]
    pub no_aggregate: bool,

    /// Does not write the dashboard.
    #[clap(long, takes_value = false)]
    pub no_dashboard: bool,

    /// Writes the lean distribution of each year.
    #[clap(long, takes_value = false)]
    pub diagnostics: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
