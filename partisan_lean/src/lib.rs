/*!

Margins and partisan lean of presidential elections, state by state.

The main entry point is [`run_aggregation`]: from the results of each state
(one row per candidate) and the apportionment of the House of
Representatives, it computes for every election year and every state:
- the number of electoral votes (House seats plus the two senators)
- the margin of victory, Democratic minus Republican, in percentage points
- the partisan lean: the margin minus the national margin of the same year.

The [`dashboard`] module turns the resulting table into the content of the
interactive dashboard for a given selection of the controls.

See the [manual] for the input formats and the configuration of the
`leanmap` program.
*/

pub mod builder;
mod config;
pub mod dashboard;
pub mod manual;

use log::{debug, info, warn};

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::AddAssign,
};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);

    fn share_of(self, total: u64) -> f64 {
        self.0 as f64 / total as f64
    }
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

// All the rows of one party in one state, for one year.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
struct PartyTally {
    votes: VoteCount,
    rows: u32,
    // The turnout reported by the first row of the party.
    total_votes: Option<u64>,
}

impl PartyTally {
    fn add_row(&mut self, row: &ElectionResult) {
        self.votes += VoteCount(row.candidate_votes);
        self.rows += 1;
        if self.total_votes.is_none() {
            self.total_votes = Some(row.total_votes);
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct StateTally {
    democrat: PartyTally,
    republican: PartyTally,
}

/// Democratic minus Republican share of `total`, in percentage points.
fn margin_of(democrat: VoteCount, republican: VoteCount, total: u64) -> f64 {
    100.0 * (democrat.share_of(total) - republican.share_of(total))
}

/// Runs the aggregation over all the election years found in the results.
///
/// Arguments:
/// * `coll` the result rows, for all the years and all the states
/// * `apportionment` the seats of each state, per census
/// * `rules` the options of the aggregation
///
/// Every state found in the results is scored for every year. The state-years
/// that cannot be scored are returned in `incomplete` and do not interrupt the
/// aggregation.
pub fn run_aggregation(
    coll: &[ElectionResult],
    apportionment: &Apportionment,
    rules: &AggregationRules,
) -> Result<AggregationResult, AggregationErrors> {
    info!(
        "Processing {:?} result rows, {:?} census years, rules: {:?}",
        coll.len(),
        apportionment.census_years().len(),
        rules
    );
    if coll.is_empty() {
        return Err(AggregationErrors::EmptyElection);
    }

    let all_states: BTreeSet<StateCode> = coll.iter().map(|r| r.state.clone()).collect();
    let mut by_year: BTreeMap<u32, Vec<&ElectionResult>> = BTreeMap::new();
    for r in coll.iter() {
        by_year.entry(r.year).or_default().push(r);
    }
    info!(
        "Found {} states over {} election years",
        all_states.len(),
        by_year.len()
    );

    let mut records: Vec<MarginRecord> = Vec::new();
    let mut incomplete: Vec<IncompleteRecord> = Vec::new();
    let mut years: Vec<YearSummary> = Vec::new();
    for (year, rows) in by_year.iter() {
        let (summary, mut year_records, mut year_incomplete) =
            aggregate_year(*year, rows, &all_states, apportionment, rules);
        records.append(&mut year_records);
        incomplete.append(&mut year_incomplete);
        years.push(summary);
    }

    if !incomplete.is_empty() {
        warn!(
            "{} state-years could not be scored, {} records computed",
            incomplete.len(),
            records.len()
        );
    }
    Ok(AggregationResult {
        records,
        incomplete,
        years,
    })
}

fn aggregate_year(
    year: u32,
    rows: &[&ElectionResult],
    all_states: &BTreeSet<StateCode>,
    apportionment: &Apportionment,
    rules: &AggregationRules,
) -> (YearSummary, Vec<MarginRecord>, Vec<IncompleteRecord>) {
    let democrat_votes: VoteCount = rows
        .iter()
        .filter(|r| r.party == Party::Democrat)
        .map(|r| VoteCount(r.candidate_votes))
        .sum();
    let republican_votes: VoteCount = rows
        .iter()
        .filter(|r| r.party == Party::Republican)
        .map(|r| VoteCount(r.candidate_votes))
        .sum();
    let all_votes: VoteCount = rows.iter().map(|r| VoteCount(r.candidate_votes)).sum();
    let national_margin = if all_votes > VoteCount::EMPTY {
        margin_of(democrat_votes, republican_votes, all_votes.0)
    } else {
        0.0
    };
    let census_year = apportionment.census_year_for(year);
    info!(
        "Year {}: national margin {} ({}), census year {:?}",
        year,
        national_margin,
        lean_label(national_margin),
        census_year
    );

    let mut tallies: BTreeMap<&StateCode, StateTally> = BTreeMap::new();
    for r in rows.iter() {
        let tally = tallies.entry(&r.state).or_default();
        match r.party {
            Party::Democrat => tally.democrat.add_row(r),
            Party::Republican => tally.republican.add_row(r),
            Party::Other => {}
        }
    }

    let mut records: Vec<MarginRecord> = Vec::new();
    let mut incomplete: Vec<IncompleteRecord> = Vec::new();
    for state in all_states.iter() {
        let scored = match (census_year, tallies.get(state)) {
            (None, _) => Err(IncompleteReason::NoCensusYear),
            (_, None) => Err(IncompleteReason::NoResults),
            _ if all_votes == VoteCount::EMPTY => Err(IncompleteReason::ZeroTotalVotes),
            (Some(cy), Some(tally)) => score_state(
                year,
                state,
                tally,
                national_margin,
                cy,
                apportionment,
                rules,
            ),
        };
        match scored {
            Ok(record) => {
                debug!(
                    "aggregate_year: {} {}: ev: {} margin: {} lean: {}",
                    year, state, record.electoral_votes, record.margin_label, record.lean_label
                );
                records.push(record);
            }
            Err(reason) => {
                warn!("Year {}: skipping {}: {:?}", year, state, reason);
                incomplete.push(IncompleteRecord {
                    year,
                    state: state.clone(),
                    reason,
                });
            }
        }
    }

    let electoral_votes: u32 = records.iter().map(|r| r.electoral_votes).sum();
    let electoral_votes_check = rules.expected_electoral_votes.map(|expected| {
        if electoral_votes != expected {
            warn!(
                "Year {}: {} electoral votes allocated, expected {}",
                year, electoral_votes, expected
            );
        }
        electoral_votes == expected
    });

    let summary = YearSummary {
        year,
        census_year,
        democrat_votes: democrat_votes.0,
        republican_votes: republican_votes.0,
        all_votes: all_votes.0,
        national_margin,
        electoral_votes,
        electoral_votes_check,
    };
    (summary, records, incomplete)
}

fn score_state(
    year: u32,
    state: &StateCode,
    tally: &StateTally,
    national_margin: f64,
    census_year: u32,
    apportionment: &Apportionment,
    rules: &AggregationRules,
) -> Result<MarginRecord, IncompleteReason> {
    let dem = &tally.democrat;
    let rep = &tally.republican;
    // Also the case when only minor parties are on the ballot.
    if dem.rows == 0 {
        return Err(IncompleteReason::MissingDemocrat);
    }
    let total = match (dem.total_votes, rep.total_votes) {
        (_, None) => return Err(IncompleteReason::MissingRepublican),
        (Some(d), Some(r)) if d != r => match rules.total_votes_policy {
            TotalVotesPolicy::Strict => {
                return Err(IncompleteReason::TotalVotesMismatch {
                    democrat: d,
                    republican: r,
                })
            }
            TotalVotesPolicy::UseRepublicanRow => {
                warn!(
                    "Year {}: {}: democrat row reports {} votes, republican row {}: using {}",
                    year, state, d, r, r
                );
                r
            }
        },
        (_, Some(r)) => r,
    };
    if total == 0 {
        return Err(IncompleteReason::ZeroTotalVotes);
    }

    let seats = apportionment
        .seats(state, census_year)
        .ok_or(IncompleteReason::MissingApportionment)?;

    let margin = margin_of(dem.votes, rep.votes, total);
    let partisan_lean = margin - national_margin;
    // +2 for the senators.
    Ok(MarginRecord::new(
        year,
        state.clone(),
        seats + 2,
        margin,
        partisan_lean,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(s: &str) -> StateCode {
        StateCode::new(s).unwrap()
    }

    fn row(year: u32, state: &str, party: Party, votes: u64, total: u64) -> ElectionResult {
        ElectionResult {
            year,
            state: st(state),
            party,
            candidate_votes: votes,
            total_votes: total,
        }
    }

    fn apportionment() -> Apportionment {
        Apportionment::new(
            &[1990, 2000, 1980],
            vec![
                (st("AA"), vec![10, 12, 9]),
                (st("BB"), vec![1, 1, 1]),
                (st("CC"), vec![5, 4, 6]),
            ],
        )
        .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn find(res: &AggregationResult, year: u32, state: &str) -> MarginRecord {
        res.records
            .iter()
            .find(|r| r.year == year && r.state == st(state))
            .cloned()
            .unwrap()
    }

    // National split 52/48, AA at 60/40 and BB at 45/55.
    fn two_state_year(year: u32) -> Vec<ElectionResult> {
        vec![
            row(year, "AA", Party::Democrat, 420, 700),
            row(year, "AA", Party::Republican, 280, 700),
            row(year, "BB", Party::Democrat, 360, 800),
            row(year, "BB", Party::Republican, 440, 800),
        ]
    }

    #[test]
    fn two_states_national_environment() {
        let _ = env_logger::builder().is_test(true).try_init();
        let res = run_aggregation(
            &two_state_year(2016),
            &apportionment(),
            &AggregationRules::DEFAULT_RULES,
        )
        .unwrap();
        assert_eq!(res.years.len(), 1);
        assert!(close(res.years[0].national_margin, 4.0));

        let a = find(&res, 2016, "AA");
        assert!(close(a.margin, 20.0));
        assert!(close(a.partisan_lean, 16.0));
        assert_eq!(a.margin_label, "D+20.0");
        assert_eq!(a.lean_label, "D+16.0");

        let b = find(&res, 2016, "BB");
        assert!(close(b.margin, -10.0));
        assert!(close(b.partisan_lean, -14.0));
        assert_eq!(b.margin_label, "R+10.0");
        assert_eq!(b.lean_label, "R+14.0");
        assert!(res.incomplete.is_empty());
    }

    #[test]
    fn state_at_national_margin_has_no_lean() {
        let rows = vec![
            row(2000, "AA", Party::Democrat, 55, 100),
            row(2000, "AA", Party::Republican, 45, 100),
            row(2000, "BB", Party::Democrat, 110, 200),
            row(2000, "BB", Party::Republican, 90, 200),
        ];
        let res = run_aggregation(&rows, &apportionment(), &AggregationRules::DEFAULT_RULES)
            .unwrap();
        for r in res.records.iter() {
            assert_eq!(r.partisan_lean, 0.0);
            assert_eq!(r.lean_label, "R+0.0");
        }
    }

    #[test]
    fn weighted_state_margins_reconcile_with_national() {
        let rows = vec![
            row(2004, "AA", Party::Democrat, 1234, 3000),
            row(2004, "AA", Party::Republican, 1500, 3000),
            row(2004, "AA", Party::Other, 266, 3000),
            row(2004, "BB", Party::Democrat, 700, 1000),
            row(2004, "BB", Party::Republican, 250, 1000),
            row(2004, "BB", Party::Other, 50, 1000),
            row(2004, "CC", Party::Democrat, 3333, 7777),
            row(2004, "CC", Party::Republican, 4000, 7777),
            row(2004, "CC", Party::Other, 444, 7777),
        ];
        let res = run_aggregation(&rows, &apportionment(), &AggregationRules::DEFAULT_RULES)
            .unwrap();
        let totals = [("AA", 3000.0), ("BB", 1000.0), ("CC", 7777.0)];
        let weighted: f64 = totals
            .iter()
            .map(|(s, t)| find(&res, 2004, s).margin * t)
            .sum::<f64>()
            / totals.iter().map(|(_, t)| t).sum::<f64>();
        assert!(close(weighted, res.years[0].national_margin));
    }

    #[test]
    fn electoral_votes_follow_the_census() {
        let mut rows = two_state_year(1984);
        rows.extend(two_state_year(1992));
        rows.extend(two_state_year(2000));
        let res = run_aggregation(&rows, &apportionment(), &AggregationRules::DEFAULT_RULES)
            .unwrap();
        assert_eq!(find(&res, 1984, "AA").electoral_votes, 11);
        assert_eq!(find(&res, 1992, "AA").electoral_votes, 12);
        assert_eq!(find(&res, 2000, "AA").electoral_votes, 14);
        assert!(res.records.iter().all(|r| r.electoral_votes >= 3));
        assert_eq!(find(&res, 2000, "BB").electoral_votes, 3);
        let census: Vec<Option<u32>> = res.years.iter().map(|y| y.census_year).collect();
        assert_eq!(census, vec![Some(1980), Some(1990), Some(2000)]);
    }

    #[test]
    fn census_year_is_a_step_function() {
        let a = apportionment();
        assert_eq!(a.census_years(), &[1980, 1990, 2000]);
        assert_eq!(a.census_year_for(1976), None);
        assert_eq!(a.census_year_for(1980), Some(1980));
        assert_eq!(a.census_year_for(1988), Some(1980));
        assert_eq!(a.census_year_for(2016), Some(2000));
    }

    #[test]
    fn missing_party_is_incomplete_not_fatal() {
        let mut rows = two_state_year(2012);
        rows.push(row(2012, "CC", Party::Democrat, 10, 10));
        let res = run_aggregation(&rows, &apportionment(), &AggregationRules::DEFAULT_RULES)
            .unwrap();
        assert_eq!(res.records.len(), 2);
        assert_eq!(
            res.incomplete,
            vec![IncompleteRecord {
                year: 2012,
                state: st("CC"),
                reason: IncompleteReason::MissingRepublican
            }]
        );
    }

    #[test]
    fn state_absent_one_year_has_no_results() {
        let mut rows = two_state_year(2012);
        rows.push(row(2016, "AA", Party::Democrat, 10, 20));
        rows.push(row(2016, "AA", Party::Republican, 10, 20));
        let res = run_aggregation(&rows, &apportionment(), &AggregationRules::DEFAULT_RULES)
            .unwrap();
        assert_eq!(res.incomplete.len(), 1);
        assert_eq!(res.incomplete[0].reason, IncompleteReason::NoResults);
        assert_eq!(res.incomplete[0].state, st("BB"));
    }

    #[test]
    fn total_votes_mismatch() {
        let rows = vec![
            row(2008, "AA", Party::Democrat, 60, 110),
            row(2008, "AA", Party::Republican, 40, 100),
        ];
        let res = run_aggregation(&rows, &apportionment(), &AggregationRules::DEFAULT_RULES)
            .unwrap();
        assert_eq!(
            res.incomplete[0].reason,
            IncompleteReason::TotalVotesMismatch {
                democrat: 110,
                republican: 100
            }
        );

        let lenient = AggregationRules {
            total_votes_policy: TotalVotesPolicy::UseRepublicanRow,
            expected_electoral_votes: None,
        };
        let res = run_aggregation(&rows, &apportionment(), &lenient).unwrap();
        assert!(close(res.records[0].margin, 20.0));
        assert_eq!(res.years[0].electoral_votes_check, None);
    }

    #[test]
    fn unknown_state_and_early_years() {
        let mut rows = two_state_year(1976);
        rows.extend(vec![
            row(1984, "ZZ", Party::Democrat, 5, 10),
            row(1984, "ZZ", Party::Republican, 5, 10),
        ]);
        let res = run_aggregation(&rows, &apportionment(), &AggregationRules::DEFAULT_RULES)
            .unwrap();
        assert!(res
            .incomplete
            .iter()
            .filter(|r| r.year == 1976)
            .all(|r| r.reason == IncompleteReason::NoCensusYear));
        let zz = res
            .incomplete
            .iter()
            .find(|r| r.year == 1984 && r.state == st("ZZ"))
            .unwrap();
        assert_eq!(zz.reason, IncompleteReason::MissingApportionment);
    }

    #[test]
    fn electoral_vote_cross_check() {
        let rows = two_state_year(2016);
        let rules = AggregationRules {
            total_votes_policy: TotalVotesPolicy::Strict,
            expected_electoral_votes: Some(17),
        };
        let res = run_aggregation(&rows, &apportionment(), &rules).unwrap();
        assert_eq!(res.years[0].electoral_votes, 17);
        assert_eq!(res.years[0].electoral_votes_check, Some(true));
        let res = run_aggregation(&rows, &apportionment(), &AggregationRules::DEFAULT_RULES)
            .unwrap();
        assert_eq!(res.years[0].electoral_votes_check, Some(false));
    }

    #[test]
    fn empty_election() {
        let res = run_aggregation(&[], &apportionment(), &AggregationRules::DEFAULT_RULES);
        assert_eq!(res, Err(AggregationErrors::EmptyElection));
    }

    #[test]
    fn labels() {
        assert_eq!(lean_label(5.24), "D+5.2");
        assert_eq!(lean_label(-3.06), "R+3.1");
        assert_eq!(lean_label(0.0), "R+0.0");
        assert_eq!(lean_label(-0.0), "R+0.0");
        assert_eq!(lean_label(0.01), "D+0.0");
    }

    #[test]
    fn party_labels() {
        let labels = PartyLabels::default();
        assert_eq!(labels.classify("democrat"), Some(Party::Democrat));
        assert_eq!(
            labels.classify(" Democratic-Farmer-Labor "),
            Some(Party::Democrat)
        );
        assert_eq!(labels.classify("REPUBLICAN"), Some(Party::Republican));
        assert_eq!(labels.classify("libertarian"), Some(Party::Other));
        assert_eq!(labels.classify(""), Some(Party::Other));
        assert_eq!(labels.classify("whig"), None);
        let lenient = PartyLabels {
            unknown_as_other: true,
            ..labels
        };
        assert_eq!(lenient.classify("whig"), Some(Party::Other));
    }

    #[test]
    fn state_codes() {
        assert_eq!(StateCode::from_name_or_code("Pennsylvania"), Some(st("PA")));
        assert_eq!(
            StateCode::from_name_or_code("district of columbia"),
            Some(st("DC"))
        );
        assert_eq!(StateCode::from_name_or_code("tx"), Some(st("TX")));
        assert_eq!(StateCode::from_name_or_code("Atlantis"), None);
    }

    #[test]
    fn invalid_apportionment() {
        let res = Apportionment::new(&[1990, 2000], vec![(st("AA"), vec![1])]);
        assert!(matches!(
            res,
            Err(AggregationErrors::InvalidApportionment(_))
        ));
        let res = Apportionment::new(
            &[1990],
            vec![(st("AA"), vec![1]), (st("AA"), vec![2])],
        );
        assert!(res.is_err());
    }
}
