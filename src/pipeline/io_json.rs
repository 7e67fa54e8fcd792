// The JSON documents consumed by the map front-end.

use log::info;
use serde_json::json;
use serde_json::Value as JSValue;

use crate::pipeline::*;

fn year_selector_to_json(table: &MarginTable) -> JSValue {
    match YearSelector::from_table(table) {
        Some(ys) => json!({"min": ys.min, "max": ys.max, "marks": ys.marks}),
        None => JSValue::Null,
    }
}

fn choropleth_to_json(c: &Choropleth) -> JSValue {
    let locations: Vec<&str> = c.cells.iter().map(|cell| cell.state.as_str()).collect();
    let z: Vec<f64> = c.cells.iter().map(|cell| cell.value).collect();
    let text: Vec<&str> = c.cells.iter().map(|cell| cell.text.as_str()).collect();
    json!({
        "title": c.title,
        "locations": locations,
        "z": z,
        "text": text,
        "zmin": c.zmin,
        "zmax": c.zmax,
        "zmid": c.zmid,
    })
}

fn cumulative_to_json(c: &CumulativeCurve) -> JSValue {
    let points: Vec<JSValue> = c
        .points
        .iter()
        .map(|p| json!({"state": p.state.as_str(), "value": p.value, "cumulative": p.cumulative}))
        .collect();
    json!({
        "offset": c.offset,
        "points": points,
        "tippingPoint": c.tipping_point.as_ref().map(|s| s.as_str()),
    })
}

fn trends_to_json(t: &TrendLines) -> JSValue {
    let lines: Vec<JSValue> = t
        .lines
        .iter()
        .map(|l| {
            let points: Vec<JSValue> = l
                .points
                .iter()
                .map(|(year, value)| json!({"year": year, "value": value}))
                .collect();
            json!({"state": l.state.as_str(), "points": points, "opacity": l.opacity})
        })
        .collect();
    json!({
        "highlighted": t.highlighted.as_ref().map(|s| s.as_str()),
        "lines": lines,
    })
}

/// The dashboard for one selection, with the controls it was computed from.
pub fn dashboard_to_json(table: &MarginTable, view: &DashboardView) -> JSValue {
    let metrics: Vec<&str> = Metric::ALL.iter().map(|m| m.label()).collect();
    match view {
        DashboardView::Ready {
            year,
            metric,
            choropleth,
            cumulative,
            trends,
        } => json!({
            "status": "ready",
            "year": year,
            "metric": metric.label(),
            "metrics": metrics,
            "yearSelector": year_selector_to_json(table),
            "choropleth": choropleth_to_json(choropleth),
            "cumulative": cumulative_to_json(cumulative),
            "trends": trends_to_json(trends),
        }),
        DashboardView::NoData { year, metric } => json!({
            "status": "noData",
            "message": "No data to display",
            "year": year,
            "metric": metric.label(),
            "metrics": metrics,
            "yearSelector": year_selector_to_json(table),
        }),
    }
}

pub fn diagnostics_to_json(distributions: &[LeanDistribution]) -> JSValue {
    let years: Vec<JSValue> = distributions
        .iter()
        .map(|d| {
            let points: Vec<JSValue> = d
                .points
                .iter()
                .map(|(lean, share)| json!({"partisanLean": lean, "electoralVoteShare": share}))
                .collect();
            json!({"year": d.year, "points": points})
        })
        .collect();
    json!({ "leanDistribution": years })
}

pub fn write_json(target: &OutputTarget, js: &JSValue) -> BLeanResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
    match target {
        OutputTarget::Stdout => {
            println!("{}", pretty);
        }
        OutputTarget::File(p) => {
            let path = display(p);
            create_parent_dir(p)?;
            fs::write(p, pretty).context(WritingFileSnafu { path: path.clone() })?;
            info!("Wrote {:?}", path);
        }
    }
    Ok(())
}
