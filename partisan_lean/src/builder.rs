pub use crate::config::*;

/// A builder for adding result rows.
///
/// ```
/// pub use partisan_lean::builder::Builder;
/// pub use partisan_lean::{AggregationRules, Apportionment, Party, StateCode};
/// # use partisan_lean::AggregationErrors;
///
/// let apportionment = Apportionment::new(
///     &[2010],
///     vec![(StateCode::new("PA").unwrap(), vec![18])],
/// )?;
/// let mut builder = Builder::new(&AggregationRules::DEFAULT_RULES)?
///     .apportionment(apportionment)?;
///
/// builder.add_result(2016, "PA", Party::Democrat, 2926441, 6115402)?;
/// builder.add_result_labeled(2016, "PA", "republican", 2970733, 6115402)?;
/// builder.add_result_labeled(2016, "PA", "libertarian", 218228, 6115402)?;
///
/// let res = builder.build()?;
/// assert_eq!(res.records[0].electoral_votes, 20);
/// assert_eq!(res.records[0].margin_label, "R+0.7");
///
/// # Ok::<(), AggregationErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AggregationRules,
    pub(crate) _labels: PartyLabels,
    pub(crate) _apportionment: Option<Apportionment>,
    pub(crate) _results: Vec<ElectionResult>,
}

impl Builder {
    pub fn new(rules: &AggregationRules) -> Result<Builder, AggregationErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _labels: PartyLabels::default(),
            _apportionment: None,
            _results: Vec::new(),
        })
    }

    pub fn apportionment(self, apportionment: Apportionment) -> Result<Builder, AggregationErrors> {
        Ok(Builder {
            _apportionment: Some(apportionment),
            ..self
        })
    }

    /// Replaces the default classification of the party labels.
    pub fn party_labels(self, labels: PartyLabels) -> Result<Builder, AggregationErrors> {
        Ok(Builder {
            _labels: labels,
            ..self
        })
    }

    /// Adds the votes of one candidate.
    ///
    /// state: the postal code of the state.
    pub fn add_result(
        &mut self,
        year: u32,
        state: &str,
        party: Party,
        candidate_votes: u64,
        total_votes: u64,
    ) -> Result<(), AggregationErrors> {
        let state_code =
            StateCode::new(state).ok_or_else(|| AggregationErrors::InvalidState(state.to_string()))?;
        self.add_result_2(&ElectionResult {
            year,
            state: state_code,
            party,
            candidate_votes,
            total_votes,
        })
    }

    /// Adds the votes of one candidate, with the party as written in the
    /// source data. The label must be known to the party classification.
    pub fn add_result_labeled(
        &mut self,
        year: u32,
        state: &str,
        party_label: &str,
        candidate_votes: u64,
        total_votes: u64,
    ) -> Result<(), AggregationErrors> {
        let party = self
            ._labels
            .classify(party_label)
            .ok_or_else(|| AggregationErrors::UnknownParty(party_label.to_string()))?;
        self.add_result(year, state, party, candidate_votes, total_votes)
    }

    pub fn add_result_2(&mut self, result: &ElectionResult) -> Result<(), AggregationErrors> {
        self._results.push(result.clone());
        Ok(())
    }

    /// Runs the aggregation over all the rows added so far.
    pub fn build(&self) -> Result<AggregationResult, AggregationErrors> {
        let apportionment = self
            ._apportionment
            .as_ref()
            .ok_or(AggregationErrors::MissingApportionment)?;
        crate::run_aggregation(&self._results, apportionment, &self._rules)
    }
}
