// Reading and writing the CSV tables.

use log::{debug, warn};
use std::io;

use crate::pipeline::{io_common::*, *};

pub const RESULT_COLUMNS: [&str; 5] = ["year", "state_po", "party", "candidatevotes", "totalvotes"];

pub const MARGIN_COLUMNS: [&str; 7] = [
    "year",
    "state",
    "electoral_votes",
    "Margin of Victory",
    "Margin of Victory text",
    "Partisan Lean",
    "Partisan Lean text",
];

pub fn read_results(path: &str, labels: &PartyLabels) -> BLeanResult<Vec<ElectionResult>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_results_from(rdr, labels, path)
}

pub fn read_results_from<R: io::Read>(
    mut rdr: csv::Reader<R>,
    labels: &PartyLabels,
    path: &str,
) -> BLeanResult<Vec<ElectionResult>> {
    let header = read_header(&mut rdr, path)?;
    let cols = get_col_index_mapping(&RESULT_COLUMNS, &header, path)?;
    let (year_idx, state_idx, party_idx, votes_idx, total_idx) =
        (cols[0], cols[1], cols[2], cols[3], cols[4]);

    let mut res: Vec<ElectionResult> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = (idx + 2) as u64;
        let record = line_r.context(CsvLineParseSnafu { lineno })?;
        let line: Vec<String> = record.iter().map(|s| s.to_string()).collect();

        let year_s = get_cell(&line, year_idx, lineno)?;
        let year = year_s.parse::<u32>().ok().context(ParsingNumberSnafu {
            lineno,
            column: "year",
            content: year_s,
        })?;
        let state_s = get_cell(&line, state_idx, lineno)?;
        let state = StateCode::new(state_s).context(InvalidStateSnafu {
            lineno,
            name: state_s,
        })?;
        let party_s = get_cell(&line, party_idx, lineno)?;
        let party = labels.classify(party_s).context(UnknownPartySnafu {
            lineno,
            label: party_s,
        })?;
        let candidate_votes = parse_count(get_cell(&line, votes_idx, lineno)?, "candidatevotes", lineno)?;
        let total_votes = parse_count(get_cell(&line, total_idx, lineno)?, "totalvotes", lineno)?;

        debug!(
            "read_results: lineno: {:?} {} {} {:?} {} {}",
            lineno, year, state, party, candidate_votes, total_votes
        );
        res.push(ElectionResult {
            year,
            state,
            party,
            candidate_votes,
            total_votes,
        });
    }
    Ok(res)
}

pub fn read_apportionment(path: &str) -> BLeanResult<Apportionment> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    read_apportionment_from(rdr, path)
}

pub fn read_apportionment_from<R: io::Read>(
    mut rdr: csv::Reader<R>,
    path: &str,
) -> BLeanResult<Apportionment> {
    let header = read_header(&mut rdr, path)?;
    let mut rows: Vec<(u64, Vec<String>)> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = (idx + 2) as u64;
        let record = line_r.context(CsvLineParseSnafu { lineno })?;
        rows.push((lineno, record.iter().map(|s| s.to_string()).collect()));
    }
    Ok(assemble_apportionment(&header, &rows, path)?)
}

fn read_header<R: io::Read>(rdr: &mut csv::Reader<R>, path: &str) -> LeanResult<Vec<Option<String>>> {
    let header = rdr.headers().context(CsvHeaderSnafu { path })?;
    Ok(header.iter().map(|s| Some(s.to_string())).collect())
}

/// Overwrites the margins table. The raw values are written with all their
/// digits, the labels carry the rounding.
pub fn write_margins(path: &str, records: &[MarginRecord]) -> BLeanResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(WritingCsvSnafu { path })?;
    write_margins_to(&mut wtr, records, path)
}

pub fn write_margins_to<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    records: &[MarginRecord],
    path: &str,
) -> BLeanResult<()> {
    wtr.write_record(MARGIN_COLUMNS)
        .context(WritingCsvSnafu { path })?;
    for r in records.iter() {
        wtr.write_record([
            r.year.to_string(),
            r.state.to_string(),
            r.electoral_votes.to_string(),
            r.margin.to_string(),
            r.margin_label.clone(),
            r.partisan_lean.to_string(),
            r.lean_label.clone(),
        ])
        .context(WritingCsvSnafu { path })?;
    }
    wtr.flush().context(WritingFileSnafu { path })?;
    Ok(())
}

pub fn read_margins(path: &str) -> BLeanResult<Vec<MarginRecord>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    Ok(read_margins_from(rdr, path))
}

/// Reads back the margins table for display.
///
/// A malformed table is not an error: the rows that cannot be read are
/// skipped, and the dashboard shows that there is no data for them.
pub fn read_margins_from<R: io::Read>(mut rdr: csv::Reader<R>, path: &str) -> Vec<MarginRecord> {
    let cols = match read_header(&mut rdr, path)
        .and_then(|header| get_col_index_mapping(&MARGIN_COLUMNS[..4], &header, path))
    {
        Ok(cols) => cols,
        Err(e) => {
            warn!("read_margins: cannot use {:?}: {}", path, e);
            return Vec::new();
        }
    };
    let lean_idx = match rdr.headers() {
        Ok(h) => h.iter().position(|s| s.trim() == MARGIN_COLUMNS[5]),
        Err(_) => None,
    };
    let lean_idx = match lean_idx {
        Some(idx) => idx,
        None => {
            warn!("read_margins: {:?} has no {:?} column", path, MARGIN_COLUMNS[5]);
            return Vec::new();
        }
    };

    let mut res: Vec<MarginRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = (idx + 2) as u64;
        match line_r
            .context(CsvLineParseSnafu { lineno })
            .and_then(|record| parse_margin(&record, &cols, lean_idx, lineno))
        {
            Ok(r) => res.push(r),
            Err(e) => warn!("read_margins: skipping line {} of {:?}: {}", lineno, path, e),
        }
    }
    res
}

fn parse_margin(
    record: &csv::StringRecord,
    cols: &[usize],
    lean_idx: usize,
    lineno: u64,
) -> LeanResult<MarginRecord> {
    let line: Vec<String> = record.iter().map(|s| s.to_string()).collect();
    let year_s = get_cell(&line, cols[0], lineno)?;
    let year = year_s.parse::<u32>().ok().context(ParsingNumberSnafu {
        lineno,
        column: "year",
        content: year_s,
    })?;
    let state_s = get_cell(&line, cols[1], lineno)?;
    let state = StateCode::new(state_s).context(InvalidStateSnafu {
        lineno,
        name: state_s,
    })?;
    let ev_s = get_cell(&line, cols[2], lineno)?;
    let electoral_votes = ev_s.parse::<u32>().ok().context(ParsingNumberSnafu {
        lineno,
        column: "electoral_votes",
        content: ev_s,
    })?;
    let margin = parse_float(get_cell(&line, cols[3], lineno)?, MARGIN_COLUMNS[3], lineno)?;
    let partisan_lean = parse_float(get_cell(&line, lean_idx, lineno)?, MARGIN_COLUMNS[5], lineno)?;
    Ok(MarginRecord::new(
        year,
        state,
        electoral_votes,
        margin,
        partisan_lean,
    ))
}

fn parse_float(content: &str, column: &str, lineno: u64) -> LeanResult<f64> {
    content
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .context(ParsingNumberSnafu {
            lineno,
            column,
            content,
        })
}
