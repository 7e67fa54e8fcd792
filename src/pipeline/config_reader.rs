use crate::pipeline::*;

use partisan_lean::dashboard::Metric;
use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct InputSettings {
    #[serde(rename = "resultsFilePath")]
    pub results_file_path: Option<String>,
    #[serde(rename = "apportionmentFilePath")]
    pub apportionment_file_path: Option<String>,
    /// `csv` or `xlsx`. Guessed from the file extension if not provided.
    #[serde(rename = "apportionmentProvider")]
    pub apportionment_provider: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "marginsFile")]
    pub margins_file: Option<String>,
    #[serde(rename = "dashboardFile")]
    pub dashboard_file: Option<String>,
    #[serde(rename = "diagnosticsFile")]
    pub diagnostics_file: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct StageSettings {
    pub aggregate: Option<bool>,
    pub dashboard: Option<bool>,
    pub diagnostics: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct LeanRules {
    #[serde(rename = "democratLabels")]
    pub democrat_labels: Option<Vec<String>>,
    #[serde(rename = "republicanLabels")]
    pub republican_labels: Option<Vec<String>>,
    #[serde(rename = "otherLabels")]
    pub other_labels: Option<Vec<String>>,
    #[serde(rename = "treatUnknownPartyAsOther")]
    pub treat_unknown_party_as_other: Option<bool>,
    #[serde(rename = "totalVotesPolicy")]
    pub total_votes_policy: Option<String>,
    /// 0 turns off the check.
    #[serde(rename = "expectedElectoralVotes")]
    pub expected_electoral_votes: Option<u32>,
}

impl LeanRules {
    pub fn party_labels(&self) -> PartyLabels {
        let defaults = PartyLabels::default();
        PartyLabels {
            unknown_as_other: self.treat_unknown_party_as_other.unwrap_or(false),
            ..PartyLabels::new(
                self.democrat_labels.as_ref().unwrap_or(&defaults.democrat),
                self.republican_labels
                    .as_ref()
                    .unwrap_or(&defaults.republican),
                self.other_labels.as_ref().unwrap_or(&defaults.other),
            )
        }
    }

    pub fn aggregation_rules(&self) -> LeanResult<AggregationRules> {
        let total_votes_policy = match self.total_votes_policy.as_deref() {
            None | Some("strict") => TotalVotesPolicy::Strict,
            Some("useRepublicanRow") => TotalVotesPolicy::UseRepublicanRow,
            Some(x) => whatever!(
                "unknown total votes policy: {:?} (expected strict or useRepublicanRow)",
                x
            ),
        };
        let expected_electoral_votes = match self.expected_electoral_votes {
            Some(0) => None,
            Some(x) => Some(x),
            None => AggregationRules::DEFAULT_RULES.expected_electoral_votes,
        };
        Ok(AggregationRules {
            total_votes_policy,
            expected_electoral_votes,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    pub year: Option<u32>,
    pub metric: Option<String>,
    #[serde(rename = "hoverState")]
    pub hover_state: Option<String>,
    #[serde(rename = "defaultHoverState")]
    pub default_hover_state: Option<String>,
}

impl DashboardConfig {
    /// Margin of victory unless specified.
    pub fn metric(&self) -> LeanResult<Metric> {
        match &self.metric {
            Some(m) => parse_metric(m),
            None => Ok(Metric::MarginOfVictory),
        }
    }

    pub fn hover_state(&self) -> LeanResult<Option<StateCode>> {
        self.hover_state.as_deref().map(parse_state).transpose()
    }

    pub fn default_hover_state(&self) -> LeanResult<Option<StateCode>> {
        self.default_hover_state
            .as_deref()
            .map(parse_state)
            .transpose()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct LeanConfig {
    #[serde(rename = "inputSettings", default)]
    pub input_settings: InputSettings,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub stages: StageSettings,
    #[serde(default)]
    pub rules: LeanRules,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

pub fn read_config(path: &str) -> LeanResult<LeanConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
}

pub fn parse_metric(s: &str) -> LeanResult<Metric> {
    match Metric::parse(s) {
        Some(m) => Ok(m),
        None => whatever!(
            "unknown metric {:?}: expected \"Margin of Victory\" or \"Partisan Lean\"",
            s
        ),
    }
}

pub fn parse_state(s: &str) -> LeanResult<StateCode> {
    match StateCode::from_name_or_code(s) {
        Some(st) => Ok(st),
        None => whatever!("unknown state {:?}", s),
    }
}
