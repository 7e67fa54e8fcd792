// Apportionment tables saved as Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;

use crate::pipeline::{io_common::*, *};

pub fn read_apportionment(path: &str, worksheet_name: Option<&str>) -> BLeanResult<Apportionment> {
    let wrange = get_range(path, worksheet_name)?;

    let mut iter = wrange.rows();
    let header: Vec<Option<String>> = iter
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(header_cell)
        .collect();
    debug!("read_apportionment: header: {:?}", header);

    let mut rows: Vec<(u64, Vec<String>)> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // Row 1 is the header.
        let lineno = (idx + 2) as u64;
        let mut cells: Vec<String> = Vec::new();
        for cell in row.iter() {
            cells.push(read_cell(cell, lineno)?);
        }
        rows.push((lineno, cells));
    }
    Ok(assemble_apportionment(&header, &rows, path)?)
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> BLeanResult<calamine::Range<DataType>> {
    debug!(
        "read_apportionment: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(name) = worksheet_name {
        let wrange = workbook
            .worksheet_range(name)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        return Ok(wrange);
    }
    let all_worksheets = workbook.worksheets();
    match all_worksheets.as_slice() {
        [(worksheet_name, wrange)] => {
            debug!(
                "read_apportionment: path: {:?} worksheet: {:?}",
                path, worksheet_name
            );
            Ok(wrange.clone())
        }
        [] => Err(Box::new(LeanError::EmptyExcel {
            path: path.to_string(),
        })),
        _ => {
            let names: Vec<&String> = all_worksheets.iter().map(|(n, _)| n).collect();
            Err(Box::new(LeanError::Whatever {
                message: format!(
                    "{} has several worksheets {:?}: pick one with the worksheet name option",
                    path, names
                ),
                source: None,
            }))
        }
    }
}

fn header_cell(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

/// The content of a cell, as it would read in a CSV file.
fn read_cell(cell: &DataType, lineno: u64) -> LeanResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Empty => Ok("".to_string()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(read_cell(&DataType::Float(7.0), 2).unwrap(), "7");
        assert_eq!(read_cell(&DataType::Int(36), 2).unwrap(), "36");
        assert_eq!(
            read_cell(&DataType::String("Texas".to_string()), 2).unwrap(),
            "Texas"
        );
        assert_eq!(read_cell(&DataType::Empty, 2).unwrap(), "");
        assert!(matches!(
            read_cell(&DataType::Bool(true), 5),
            Err(LeanError::ExcelWrongCellType { lineno: 5, .. })
        ));
        assert_eq!(header_cell(&DataType::Float(1990.0)), Some("1990".to_string()));
        assert_eq!(header_cell(&DataType::Empty), None);
    }

    fn fixture(name: &str) -> String {
        format!(
            "{}/tests/data/apportionment_xlsx/{}",
            env!("CARGO_MANIFEST_DIR"),
            name
        )
    }

    fn check_seats(a: &Apportionment) {
        let st = |s: &str| StateCode::new(s).unwrap();
        assert_eq!(a.census_years(), &[2000, 2010]);
        assert_eq!(a.seats(&st("PA"), 2000), Some(19));
        assert_eq!(a.seats(&st("TX"), 2010), Some(36));
        assert_eq!(a.seats(&st("DC"), 2010), Some(1));
        assert_eq!(a.census_year_for(2016), Some(2010));
    }

    #[test]
    fn only_worksheet() {
        let a = read_apportionment(&fixture("seats.xlsx"), None).unwrap();
        check_seats(&a);
        let named = read_apportionment(&fixture("seats.xlsx"), Some("Apportionment")).unwrap();
        assert_eq!(named, a);
    }

    #[test]
    fn named_worksheet() {
        let a = read_apportionment(&fixture("seats_two_sheets.xlsx"), Some("Seats")).unwrap();
        check_seats(&a);
    }

    #[test]
    fn several_worksheets_need_a_name() {
        let res = read_apportionment(&fixture("seats_two_sheets.xlsx"), None);
        match res.map_err(|e| *e) {
            Err(LeanError::Whatever { message, .. }) => {
                assert!(message.contains("Notes"));
                assert!(message.contains("Seats"));
            }
            other => panic!("unexpected result {:?}", other),
        }
        let res = read_apportionment(&fixture("seats_two_sheets.xlsx"), Some("Summary"));
        assert!(matches!(
            res.map_err(|e| *e),
            Err(LeanError::EmptyExcel { .. })
        ));
    }

    #[test]
    fn missing_workbook() {
        let res = read_apportionment("/nonexistent/seats.xlsx", None);
        assert!(matches!(
            res.map_err(|e| *e),
            Err(LeanError::OpeningExcel { .. })
        ));
    }
}
