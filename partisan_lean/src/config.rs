// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// The party a result row is counted for.
///
/// Only the two major parties enter the margins. Every other row still
/// counts towards the national total of votes.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Party {
    Democrat,
    Republican,
    Other,
}

/// A two-letter postal code (`PA`, `DC`, ...).
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct StateCode(String);

// Full names accepted in the apportionment tables.
const STATE_NAMES: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

impl StateCode {
    /// Parses a postal code. Any two ASCII letters are accepted, in any case.
    pub fn new(code: &str) -> Option<StateCode> {
        let c = code.trim();
        if c.len() == 2 && c.chars().all(|x| x.is_ascii_alphabetic()) {
            Some(StateCode(c.to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// Accepts either a postal code or the full name of a state
    /// (including "District of Columbia").
    pub fn from_name_or_code(s: &str) -> Option<StateCode> {
        let name = s.trim();
        STATE_NAMES
            .iter()
            .find(|(_, full)| full.eq_ignore_ascii_case(name))
            .map(|(code, _)| StateCode(code.to_string()))
            .or_else(|| StateCode::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for StateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the historical results: the votes of one candidate (or party)
/// in one state for one election year.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionResult {
    pub year: u32,
    pub state: StateCode,
    pub party: Party,
    pub candidate_votes: u64,
    /// The turnout of the state, as reported on this row.
    pub total_votes: u64,
}

/// Seats in the House of Representatives for each state, per census.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Apportionment {
    // Sorted, strictly increasing.
    census_years: Vec<u32>,
    seats: HashMap<StateCode, Vec<u32>>,
}

impl Apportionment {
    /// Builds the table from the census years (the columns) and one row of seat
    /// counts per state, in the same order as the census years.
    pub fn new(
        census_years: &[u32],
        rows: Vec<(StateCode, Vec<u32>)>,
    ) -> Result<Apportionment, AggregationErrors> {
        let mut order: Vec<usize> = (0..census_years.len()).collect();
        order.sort_by_key(|idx| census_years[*idx]);
        let sorted_years: Vec<u32> = order.iter().map(|idx| census_years[*idx]).collect();
        if sorted_years.windows(2).any(|w| w[0] == w[1]) {
            return Err(AggregationErrors::InvalidApportionment(
                "duplicate census year".to_string(),
            ));
        }

        let mut seats: HashMap<StateCode, Vec<u32>> = HashMap::new();
        for (state, counts) in rows {
            if counts.len() != census_years.len() {
                return Err(AggregationErrors::InvalidApportionment(format!(
                    "{} has {} seat counts for {} census years",
                    state,
                    counts.len(),
                    census_years.len()
                )));
            }
            let sorted_counts: Vec<u32> = order.iter().map(|idx| counts[*idx]).collect();
            if seats.insert(state.clone(), sorted_counts).is_some() {
                return Err(AggregationErrors::InvalidApportionment(format!(
                    "{} appears more than once",
                    state
                )));
            }
        }
        Ok(Apportionment {
            census_years: sorted_years,
            seats,
        })
    }

    pub fn census_years(&self) -> &[u32] {
        &self.census_years
    }

    /// The census that applies to an election: the latest census year that is
    /// not after the election year.
    pub fn census_year_for(&self, election_year: u32) -> Option<u32> {
        self.census_years
            .iter()
            .rev()
            .find(|cy| **cy <= election_year)
            .cloned()
    }

    pub fn seats(&self, state: &StateCode, census_year: u32) -> Option<u32> {
        let idx = self.census_years.iter().position(|cy| *cy == census_year)?;
        self.seats.get(state).and_then(|counts| counts.get(idx).cloned())
    }
}

// ******** Output data structures *********

/// Formats a margin for display: `D+5.2`, `R+3.1`.
///
/// Positive values are Democratic. Zero and negative values are labelled
/// Republican, so an exact tie reads `R+0.0`.
pub fn lean_label(value: f64) -> String {
    if value > 0.0 {
        format!("D+{:.1}", value.abs())
    } else {
        format!("R+{:.1}", value.abs())
    }
}

/// The margin and partisan lean of one state for one election year.
#[derive(PartialEq, Debug, Clone)]
pub struct MarginRecord {
    pub year: u32,
    pub state: StateCode,
    pub electoral_votes: u32,
    /// Democratic minus Republican share, in percentage points.
    pub margin: f64,
    pub margin_label: String,
    /// The margin minus the national margin of the same year.
    pub partisan_lean: f64,
    pub lean_label: String,
}

impl MarginRecord {
    pub fn new(
        year: u32,
        state: StateCode,
        electoral_votes: u32,
        margin: f64,
        partisan_lean: f64,
    ) -> MarginRecord {
        MarginRecord {
            year,
            state,
            electoral_votes,
            margin,
            margin_label: lean_label(margin),
            partisan_lean,
            lean_label: lean_label(partisan_lean),
        }
    }
}

/// Why a state could not be scored for a given year.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum IncompleteReason {
    /// The state has no result row at all for this year.
    NoResults,
    MissingDemocrat,
    MissingRepublican,
    ZeroTotalVotes,
    /// The two major-party rows disagree on the turnout of the state.
    TotalVotesMismatch { democrat: u64, republican: u64 },
    /// The election predates every census year of the apportionment table.
    NoCensusYear,
    /// The state is not in the apportionment table.
    MissingApportionment,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct IncompleteRecord {
    pub year: u32,
    pub state: StateCode,
    pub reason: IncompleteReason,
}

/// National figures for one election year.
#[derive(PartialEq, Debug, Clone)]
pub struct YearSummary {
    pub year: u32,
    pub census_year: Option<u32>,
    pub democrat_votes: u64,
    pub republican_votes: u64,
    pub all_votes: u64,
    pub national_margin: f64,
    /// Electoral votes over the states that could be scored.
    pub electoral_votes: u32,
    /// None if no expected total was configured.
    pub electoral_votes_check: Option<bool>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct AggregationResult {
    pub records: Vec<MarginRecord>,
    pub incomplete: Vec<IncompleteRecord>,
    pub years: Vec<YearSummary>,
}

/// Errors that prevent the aggregation from completing.
///
/// Problems limited to one state and one year are not errors, they are
/// reported as `IncompleteRecord`s.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AggregationErrors {
    EmptyElection,
    MissingApportionment,
    InvalidApportionment(String),
    InvalidState(String),
    UnknownParty(String),
}

impl Error for AggregationErrors {}

impl Display for AggregationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationErrors::EmptyElection => write!(f, "no election results to aggregate"),
            AggregationErrors::MissingApportionment => {
                write!(f, "no apportionment table was provided")
            }
            AggregationErrors::InvalidApportionment(msg) => {
                write!(f, "invalid apportionment table: {}", msg)
            }
            AggregationErrors::InvalidState(s) => write!(f, "invalid state code: {:?}", s),
            AggregationErrors::UnknownParty(s) => write!(f, "unknown party label: {:?}", s),
        }
    }
}

// ********* Configuration **********

/// How to handle a state whose Democratic and Republican rows report a
/// different turnout.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TotalVotesPolicy {
    /// The state-year is reported as incomplete.
    Strict,
    /// The turnout of the Republican row is used, with a warning.
    UseRepublicanRow,
}

/// Maps the raw party labels of the results table to a `Party`.
///
/// Labels are compared trimmed and lower-cased.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PartyLabels {
    pub democrat: Vec<String>,
    pub republican: Vec<String>,
    pub other: Vec<String>,
    /// If false, a label in none of the lists is rejected.
    pub unknown_as_other: bool,
}

impl PartyLabels {
    pub const DEFAULT_DEMOCRAT: [&'static str; 3] =
        ["democrat", "democratic-farmer-labor", "democratic-npl"];
    pub const DEFAULT_REPUBLICAN: [&'static str; 1] = ["republican"];
    pub const DEFAULT_OTHER: [&'static str; 14] = [
        "",
        "na",
        "independent",
        "libertarian",
        "green",
        "constitution party",
        "reform party",
        "natural law",
        "socialist workers",
        "socialist",
        "american independent party",
        "peace & freedom",
        "working families",
        "conservative",
    ];

    pub fn new(democrat: &[String], republican: &[String], other: &[String]) -> PartyLabels {
        let norm = |l: &[String]| -> Vec<String> {
            l.iter().map(|s| s.trim().to_lowercase()).collect()
        };
        PartyLabels {
            democrat: norm(democrat),
            republican: norm(republican),
            other: norm(other),
            unknown_as_other: false,
        }
    }

    pub fn classify(&self, label: &str) -> Option<Party> {
        let l = label.trim().to_lowercase();
        if self.democrat.contains(&l) {
            Some(Party::Democrat)
        } else if self.republican.contains(&l) {
            Some(Party::Republican)
        } else if self.unknown_as_other || self.other.contains(&l) {
            Some(Party::Other)
        } else {
            None
        }
    }
}

impl Default for PartyLabels {
    fn default() -> Self {
        let to_vec = |l: &[&str]| -> Vec<String> { l.iter().map(|s| s.to_string()).collect() };
        PartyLabels::new(
            &to_vec(&PartyLabels::DEFAULT_DEMOCRAT),
            &to_vec(&PartyLabels::DEFAULT_REPUBLICAN),
            &to_vec(&PartyLabels::DEFAULT_OTHER),
        )
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregationRules {
    pub total_votes_policy: TotalVotesPolicy,
    /// The national number of electoral votes each year is checked against.
    pub expected_electoral_votes: Option<u32>,
}

impl AggregationRules {
    /// 538 electoral votes: the modern era (since 1964).
    pub const DEFAULT_RULES: AggregationRules = AggregationRules {
        total_votes_policy: TotalVotesPolicy::Strict,
        expected_electoral_votes: Some(538),
    };
}
