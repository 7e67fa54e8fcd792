use log::debug;
use std::collections::HashMap;

use crate::pipeline::*;

/// Finds the position of each required column in the header.
pub fn get_col_index_mapping(
    req_col_names: &[&str],
    header: &[Option<String>],
    path: &str,
) -> LeanResult<Vec<usize>> {
    let col_names: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .filter_map(|(idx, x)| x.as_ref().map(|s| (s.trim(), idx)))
        .collect();

    debug!("get_col_index_mapping: col_names: {:?}", col_names);

    let mut col_indexes: Vec<usize> = Vec::new();
    for cname in req_col_names {
        let idx = col_names.get(cname).context(MissingColumnSnafu {
            column: *cname,
            path,
        })?;
        col_indexes.push(*idx);
    }
    Ok(col_indexes)
}

pub fn get_cell<'a>(line: &'a [String], idx: usize, lineno: u64) -> LeanResult<&'a str> {
    line.get(idx)
        .map(|s| s.trim())
        .context(CsvLineTooShortSnafu { lineno })
}

pub fn parse_count(content: &str, column: &str, lineno: u64) -> LeanResult<u64> {
    content.trim().parse::<u64>().ok().context(ParsingNumberSnafu {
        lineno,
        column,
        content,
    })
}

/// Seat counts are integers, but spreadsheets may store them as `7.0`.
pub fn parse_seats(content: &str, column: &str, lineno: u64) -> LeanResult<u32> {
    let c = content.trim();
    c.parse::<u32>()
        .ok()
        .or_else(|| {
            c.parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u32)
        })
        .context(ParsingNumberSnafu {
            lineno,
            column,
            content,
        })
}

/// A census year column: `1970` or `1970.0`.
pub fn parse_census_year(header: &str) -> Option<u32> {
    let h = header.trim();
    h.parse::<u32>().ok().or_else(|| {
        h.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && *f > 0.0 && *f < 10000.0)
            .map(|f| f as u32)
    })
}

pub const APPORTIONMENT_STATE_COLUMN: &str = "State";

/// Builds the apportionment table out of a grid of cells, whatever the file
/// format. The rows come with their line number.
pub fn assemble_apportionment(
    header: &[Option<String>],
    rows: &[(u64, Vec<String>)],
    path: &str,
) -> LeanResult<Apportionment> {
    let state_idx =
        get_col_index_mapping(&[APPORTIONMENT_STATE_COLUMN], header, path)?[0];

    // All the other named columns are census years.
    let mut year_cols: Vec<(usize, u32)> = Vec::new();
    for (idx, h) in header.iter().enumerate() {
        match h {
            Some(name) if idx != state_idx && !name.trim().is_empty() => {
                let year = parse_census_year(name).context(InvalidCensusYearSnafu {
                    header: name.clone(),
                })?;
                year_cols.push((idx, year));
            }
            _ => {}
        }
    }
    debug!("assemble_apportionment: census years: {:?}", year_cols);
    let census_years: Vec<u32> = year_cols.iter().map(|(_, y)| *y).collect();

    let mut states: Vec<(StateCode, Vec<u32>)> = Vec::new();
    for (lineno, line) in rows.iter() {
        let name = get_cell(line, state_idx, *lineno)?;
        if name.is_empty() {
            // Trailing empty rows of spreadsheets.
            continue;
        }
        let state = StateCode::from_name_or_code(name).context(InvalidStateSnafu {
            lineno: *lineno,
            name,
        })?;
        let mut seats: Vec<u32> = Vec::new();
        for (idx, year) in year_cols.iter() {
            let cell = get_cell(line, *idx, *lineno)?;
            seats.push(parse_seats(cell, &year.to_string(), *lineno)?);
        }
        debug!("assemble_apportionment: {}: {:?}", state, seats);
        states.push((state, seats));
    }
    Apportionment::new(&census_years, states).context(ApportionmentSnafu { path })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Vec<Option<String>> {
        cols.iter().map(|s| Some(s.to_string())).collect()
    }

    fn line(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn column_mapping() {
        let h = header(&["year", "state_po", " party "]);
        assert_eq!(
            get_col_index_mapping(&["party", "year"], &h, "x.csv").unwrap(),
            vec![2, 0]
        );
        let err = get_col_index_mapping(&["totalvotes"], &h, "x.csv").unwrap_err();
        assert!(matches!(err, LeanError::MissingColumn { .. }));
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_count(" 12 ", "candidatevotes", 3).unwrap(), 12);
        assert!(parse_count("NA", "candidatevotes", 3).is_err());
        assert_eq!(parse_seats("7.0", "1970", 2).unwrap(), 7);
        assert!(parse_seats("7.5", "1970", 2).is_err());
        assert_eq!(parse_census_year("1970.0"), Some(1970));
        assert_eq!(parse_census_year("Code"), None);
    }

    #[test]
    fn apportionment_grid() {
        let h = header(&["State", "2000", "2010"]);
        let rows = vec![
            (2, line(&["Pennsylvania", "19", "18"])),
            (3, line(&["District of Columbia", "1", "1"])),
            (4, line(&["", "", ""])),
        ];
        let a = assemble_apportionment(&h, &rows, "seats.csv").unwrap();
        assert_eq!(a.census_years(), &[2000, 2010]);
        assert_eq!(a.seats(&StateCode::new("PA").unwrap(), 2010), Some(18));
        assert_eq!(a.seats(&StateCode::new("DC").unwrap(), 2000), Some(1));

        let bad = header(&["State", "2000", "Notes"]);
        assert!(matches!(
            assemble_apportionment(&bad, &rows, "seats.csv"),
            Err(LeanError::InvalidCensusYear { .. })
        ));
        let unknown = vec![(2, line(&["Atlantis", "1", "1"]))];
        assert!(matches!(
            assemble_apportionment(&h, &unknown, "seats.csv"),
            Err(LeanError::InvalidState { .. })
        ));
    }
}
