//! The content of the lean dashboard.
//!
//! The dashboard has two controls, a year slider and a choice of metric, and
//! three panels: a map of the states, the cumulative electoral votes over the
//! metric, and the evolution of the metric over the years for every state.
//! Hovering a state in the trend panel highlights its line.
//!
//! Drawing is left to the front end. This module computes what each panel
//! shows for a given selection of the controls.

use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::config::*;

/// Half of the 538 electoral votes. The cumulative curve starts at minus this
/// value so that it becomes positive at the 270th electoral vote.
pub const HALF_ELECTORAL_VOTES: i64 = 269;

/// Fixed domain of the map colour scale, in percentage points.
pub const MAP_DOMAIN: (f64, f64) = (-30.0, 30.0);

/// Opacity of the trend lines that are not highlighted.
pub const DIMMED_OPACITY: f64 = 0.2;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Metric {
    MarginOfVictory,
    PartisanLean,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::MarginOfVictory, Metric::PartisanLean];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::MarginOfVictory => "Margin of Victory",
            Metric::PartisanLean => "Partisan Lean",
        }
    }

    /// Accepts the label of the metric, or the short names `margin` and `pvi`.
    pub fn parse(s: &str) -> Option<Metric> {
        match s.trim().to_lowercase().as_str() {
            "margin of victory" | "margin" => Some(Metric::MarginOfVictory),
            "partisan lean" | "pvi" | "lean" => Some(Metric::PartisanLean),
            _ => None,
        }
    }

    pub fn value(&self, record: &MarginRecord) -> f64 {
        match self {
            Metric::MarginOfVictory => record.margin,
            Metric::PartisanLean => record.partisan_lean,
        }
    }

    pub fn text<'a>(&self, record: &'a MarginRecord) -> &'a str {
        match self {
            Metric::MarginOfVictory => record.margin_label.as_str(),
            Metric::PartisanLean => record.lean_label.as_str(),
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The margins table, held in memory for the lifetime of the dashboard.
#[derive(PartialEq, Debug, Clone)]
pub struct MarginTable {
    // Sorted by (year, state)
    records: Vec<MarginRecord>,
}

impl MarginTable {
    /// Keeps the first record of any duplicated (year, state) pair.
    pub fn new(records: Vec<MarginRecord>) -> MarginTable {
        let mut by_key: BTreeMap<(u32, StateCode), MarginRecord> = BTreeMap::new();
        for r in records {
            by_key.entry((r.year, r.state.clone())).or_insert(r);
        }
        MarginTable {
            records: by_key.into_values().collect(),
        }
    }

    pub fn records(&self) -> &[MarginRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn years(&self) -> Vec<u32> {
        let mut years: Vec<u32> = self.records.iter().map(|r| r.year).collect();
        years.dedup();
        years
    }

    pub fn for_year(&self, year: u32) -> impl Iterator<Item = &MarginRecord> {
        self.records.iter().filter(move |r| r.year == year)
    }
}

/// The year slider: from the first to the last year of the table, with one
/// step per election year.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct YearSelector {
    pub min: u32,
    pub max: u32,
    pub marks: Vec<u32>,
}

impl YearSelector {
    /// None when the table is empty.
    pub fn from_table(table: &MarginTable) -> Option<YearSelector> {
        let marks = table.years();
        Some(YearSelector {
            min: *marks.first()?,
            max: *marks.last()?,
            marks,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Selection {
    /// None selects the first year of the table, where the slider starts.
    pub year: Option<u32>,
    pub metric: Metric,
    /// The state under the cursor, if any.
    pub hover: Option<StateCode>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DashboardSettings {
    /// The state highlighted when nothing is hovered. Without it, no line is
    /// highlighted.
    pub default_hover: Option<StateCode>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ChoroplethCell {
    pub state: StateCode,
    pub value: f64,
    pub text: String,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Choropleth {
    pub title: String,
    pub cells: Vec<ChoroplethCell>,
    pub zmin: f64,
    pub zmax: f64,
    pub zmid: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CurvePoint {
    pub state: StateCode,
    pub value: f64,
    /// Running sum of the electoral votes, offset by -269.
    pub cumulative: i64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CumulativeCurve {
    pub offset: i64,
    pub points: Vec<CurvePoint>,
    /// The state at which the curve becomes positive, if it does.
    pub tipping_point: Option<StateCode>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TrendLine {
    pub state: StateCode,
    pub points: Vec<(u32, f64)>,
    pub opacity: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct TrendLines {
    pub highlighted: Option<StateCode>,
    pub lines: Vec<TrendLine>,
}

/// What the dashboard displays for one selection.
#[derive(PartialEq, Debug, Clone)]
pub enum DashboardView {
    Ready {
        year: u32,
        metric: Metric,
        choropleth: Choropleth,
        cumulative: CumulativeCurve,
        trends: TrendLines,
    },
    /// Nothing to display for this year (or at all, if year is None).
    NoData { year: Option<u32>, metric: Metric },
}

/// Computes all the panels for the given selection of the controls.
pub fn render(
    table: &MarginTable,
    selection: &Selection,
    settings: &DashboardSettings,
) -> DashboardView {
    let metric = selection.metric;
    let year = match selection.year.or_else(|| table.years().first().cloned()) {
        Some(y) => y,
        None => {
            info!("render: empty table, nothing to display");
            return DashboardView::NoData { year: None, metric };
        }
    };
    let records: Vec<&MarginRecord> = table.for_year(year).collect();
    if records.is_empty() {
        info!("render: no data to display for {}", year);
        return DashboardView::NoData {
            year: Some(year),
            metric,
        };
    }
    debug!(
        "render: year: {} metric: {} hover: {:?} records: {}",
        year,
        metric,
        selection.hover,
        records.len()
    );

    let highlighted = selection
        .hover
        .clone()
        .or_else(|| settings.default_hover.clone());
    DashboardView::Ready {
        year,
        metric,
        choropleth: choropleth(year, &records, metric),
        cumulative: cumulative_curve(&records, metric),
        trends: trend_lines(table, metric, highlighted),
    }
}

fn choropleth(year: u32, records: &[&MarginRecord], metric: Metric) -> Choropleth {
    Choropleth {
        title: format!("Heatmap of election margins in {}", year),
        cells: records
            .iter()
            .map(|r| ChoroplethCell {
                state: r.state.clone(),
                value: metric.value(r),
                text: metric.text(r).to_string(),
            })
            .collect(),
        zmin: MAP_DOMAIN.0,
        zmax: MAP_DOMAIN.1,
        zmid: 0.0,
    }
}

/// The electoral votes accumulated from the most Republican state to the most
/// Democratic one.
pub fn cumulative_curve(records: &[&MarginRecord], metric: Metric) -> CumulativeCurve {
    let mut sorted: Vec<&MarginRecord> = records.to_vec();
    sorted.sort_by(|a, b| metric.value(a).total_cmp(&metric.value(b)));

    let mut running = -HALF_ELECTORAL_VOTES;
    let mut tipping_point: Option<StateCode> = None;
    let mut points: Vec<CurvePoint> = Vec::new();
    for r in sorted {
        running += r.electoral_votes as i64;
        if running > 0 && tipping_point.is_none() {
            tipping_point = Some(r.state.clone());
        }
        points.push(CurvePoint {
            state: r.state.clone(),
            value: metric.value(r),
            cumulative: running,
        });
    }
    CumulativeCurve {
        offset: -HALF_ELECTORAL_VOTES,
        points,
        tipping_point,
    }
}

fn trend_lines(table: &MarginTable, metric: Metric, highlighted: Option<StateCode>) -> TrendLines {
    let mut by_state: BTreeMap<StateCode, Vec<(u32, f64)>> = BTreeMap::new();
    for r in table.records() {
        by_state
            .entry(r.state.clone())
            .or_default()
            .push((r.year, metric.value(r)));
    }
    let lines = by_state
        .into_iter()
        .map(|(state, points)| {
            let opacity = match &highlighted {
                Some(h) if *h != state => DIMMED_OPACITY,
                _ => 1.0,
            };
            TrendLine {
                state,
                points,
                opacity,
            }
        })
        .collect();
    TrendLines { highlighted, lines }
}

/// The cumulative share of the electoral votes over the partisan lean of one
/// year. A share of 1.0 is reached at the 269th electoral vote.
#[derive(PartialEq, Debug, Clone)]
pub struct LeanDistribution {
    pub year: u32,
    /// (partisan lean, cumulative share), by increasing lean
    pub points: Vec<(f64, f64)>,
}

/// Diagnostics: the distribution of the electoral votes over the partisan
/// lean, for every year of the table.
pub fn lean_distribution(table: &MarginTable) -> Vec<LeanDistribution> {
    table
        .years()
        .into_iter()
        .map(|year| {
            let records: Vec<&MarginRecord> = table.for_year(year).collect();
            let curve = cumulative_curve(&records, Metric::PartisanLean);
            let half = HALF_ELECTORAL_VOTES as f64;
            let points = curve
                .points
                .iter()
                .map(|p| (p.value, (p.cumulative as f64 + half) / half))
                .collect();
            LeanDistribution { year, points }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(s: &str) -> StateCode {
        StateCode::new(s).unwrap()
    }

    fn rec(year: u32, state: &str, ev: u32, margin: f64, lean: f64) -> MarginRecord {
        MarginRecord::new(year, st(state), ev, margin, lean)
    }

    fn table() -> MarginTable {
        MarginTable::new(vec![
            rec(2016, "AA", 300, 5.0, 3.0),
            rec(2012, "AA", 300, 6.0, 2.0),
            rec(2016, "BB", 200, -10.0, -12.0),
            rec(2012, "BB", 200, -8.0, -12.0),
            rec(2016, "CC", 38, 1.0, -1.0),
            rec(2012, "CC", 38, 2.0, -2.0),
        ])
    }

    fn select(year: Option<u32>, metric: Metric, hover: Option<&str>) -> Selection {
        Selection {
            year,
            metric,
            hover: hover.map(st),
        }
    }

    #[test]
    fn year_selector() {
        let sel = YearSelector::from_table(&table()).unwrap();
        assert_eq!(sel.min, 2012);
        assert_eq!(sel.max, 2016);
        assert_eq!(sel.marks, vec![2012, 2016]);
        assert_eq!(YearSelector::from_table(&MarginTable::new(vec![])), None);
        assert!(MarginTable::new(vec![]).is_empty());
        assert!(!table().is_empty());
    }

    #[test]
    fn metric_names() {
        assert_eq!(Metric::parse("Partisan Lean"), Some(Metric::PartisanLean));
        assert_eq!(Metric::parse("pvi"), Some(Metric::PartisanLean));
        assert_eq!(
            Metric::parse("Margin of Victory"),
            Some(Metric::MarginOfVictory)
        );
        assert_eq!(Metric::parse("turnout"), None);
        let labels: Vec<&str> = Metric::ALL.iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["Margin of Victory", "Partisan Lean"]);
    }

    #[test]
    fn full_year_ends_at_269() {
        let t = table();
        let records: Vec<&MarginRecord> = t.for_year(2016).collect();
        let curve = cumulative_curve(&records, Metric::MarginOfVictory);
        let order: Vec<&str> = curve.points.iter().map(|p| p.state.as_str()).collect();
        assert_eq!(order, vec!["BB", "CC", "AA"]);
        let ys: Vec<i64> = curve.points.iter().map(|p| p.cumulative).collect();
        assert_eq!(ys, vec![-69, -31, 269]);
        assert_eq!(curve.tipping_point, Some(st("AA")));
    }

    #[test]
    fn render_selection() {
        let view = render(
            &table(),
            &select(Some(2016), Metric::PartisanLean, Some("CC")),
            &DashboardSettings::default(),
        );
        match view {
            DashboardView::Ready {
                year,
                choropleth,
                trends,
                ..
            } => {
                assert_eq!(year, 2016);
                assert_eq!(choropleth.title, "Heatmap of election margins in 2016");
                assert_eq!(choropleth.cells.len(), 3);
                let bb = &choropleth.cells[1];
                assert_eq!(bb.value, -12.0);
                assert_eq!(bb.text, "R+12.0");
                assert_eq!((choropleth.zmin, choropleth.zmax), (-30.0, 30.0));

                assert_eq!(trends.highlighted, Some(st("CC")));
                for line in trends.lines.iter() {
                    assert_eq!(line.points.len(), 2);
                    let expected = if line.state == st("CC") { 1.0 } else { DIMMED_OPACITY };
                    assert_eq!(line.opacity, expected);
                }
            }
            _ => panic!("expected data for 2016"),
        }
    }

    #[test]
    fn default_hover_only_without_hover() {
        let settings = DashboardSettings {
            default_hover: Some(st("AA")),
        };
        let hovered = |hover: Option<&str>| match render(
            &table(),
            &select(None, Metric::MarginOfVictory, hover),
            &settings,
        ) {
            DashboardView::Ready { year, trends, .. } => {
                assert_eq!(year, 2012);
                trends.highlighted
            }
            _ => panic!("expected data"),
        };
        assert_eq!(hovered(None), Some(st("AA")));
        assert_eq!(hovered(Some("BB")), Some(st("BB")));

        match render(
            &table(),
            &select(None, Metric::MarginOfVictory, None),
            &DashboardSettings::default(),
        ) {
            DashboardView::Ready { trends, .. } => {
                assert!(trends.lines.iter().all(|l| l.opacity == 1.0))
            }
            _ => panic!("expected data"),
        }
    }

    #[test]
    fn no_data() {
        let view = render(
            &table(),
            &select(Some(1999), Metric::PartisanLean, None),
            &DashboardSettings::default(),
        );
        assert_eq!(
            view,
            DashboardView::NoData {
                year: Some(1999),
                metric: Metric::PartisanLean
            }
        );
        let view = render(
            &MarginTable::new(vec![]),
            &select(None, Metric::PartisanLean, None),
            &DashboardSettings::default(),
        );
        assert_eq!(
            view,
            DashboardView::NoData {
                year: None,
                metric: Metric::PartisanLean
            }
        );
    }

    #[test]
    fn duplicates_are_dropped() {
        let t = MarginTable::new(vec![rec(2016, "AA", 3, 1.0, 1.0), rec(2016, "AA", 3, 2.0, 2.0)]);
        assert_eq!(t.records().len(), 1);
        assert_eq!(t.records()[0].margin, 1.0);
    }

    #[test]
    fn lean_shares() {
        let dist = lean_distribution(&table());
        assert_eq!(dist.len(), 2);
        let last = dist[1].points.last().unwrap();
        assert_eq!(last.0, 3.0);
        assert_eq!(last.1, 2.0);
    }
}
