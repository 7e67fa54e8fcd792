/*!

This is the long-form manual for `partisan_lean` and `leanmap`.

## Input formats

Two tables are read: the results of the presidential elections, and the
apportionment of the House of Representatives.

### Results (CSV)

One row per candidate, per state and per year. The format is the one of the
MIT Election Data and Science Lab (`1976-2016-president.csv`). Columns are found
by name in the header, the other columns are ignored:

```text
year,state,state_po,candidate,party,writein,candidatevotes,totalvotes
2016,Pennsylvania,PA,"Clinton, Hillary",democrat,FALSE,2926441,6115402
2016,Pennsylvania,PA,"Trump, Donald J.",republican,FALSE,2970733,6115402
2016,Pennsylvania,PA,"Johnson, Gary",libertarian,FALSE,146715,6115402
```

- `year`: the election year
- `state_po`: the postal code of the state
- `party`: the party label. See [party labels](#party-labels)
- `candidatevotes`: the votes of this candidate
- `totalvotes`: the turnout of the state. The turnout reported by the Republican
  row is used for the state.

A missing column or a number that cannot be parsed stops the program.

### Apportionment (`csv` or `xlsx`)

One row per state, one column per census. The `State` column contains the full
name of the state (or its postal code). The other columns are named after the
census year and contain the number of seats in the House:

```text
State,1970,1980,1990,2000,2010
Alabama,7,7,7,7,7
...
District of Columbia,1,1,1,1,1
```

The District of Columbia has no seat in the House. It should be listed with 1
so that it gets its 3 electoral votes.

The census applied to an election is the latest census year up to the election year:
the 1990 census for 1992, 1996 and 2000. For Excel files, the worksheet is either
the only one of the workbook, or the one named with `excelWorksheetName`.

## Computation

For each year:
- the national margin is the Democratic minus the Republican share of all the
  votes cast that year, in percentage points
- the margin of a state is the Democratic minus the Republican share of the
  turnout of the state
- the partisan lean of a state is its margin minus the national margin
- the electoral votes of a state are its seats plus 2.

Labels read `D+5.2` for positive values and `R+3.1` otherwise. A tie reads `R+0.0`.

States that cannot be scored for a year (no Democratic or Republican candidate,
not in the apportionment table, ...) are skipped with a warning.

## Output

### Margins (CSV)

```text
year,state,electoral_votes,Margin of Victory,Margin of Victory text,Partisan Lean,Partisan Lean text
2016,PA,20,-0.7243594584...,R+0.7,1.3...,D+1.3
```

The file is overwritten at every run. The numbers are written with all their
digits: reading the file back gives the same values.

### Dashboard (JSON)

The content of the dashboard for one selection (year, metric, hovered state):
the year slider, the two metrics (`Margin of Victory`, `Partisan Lean`), the
map, the cumulative electoral votes and the trend lines.

### Diagnostics (JSON)

For every year, the cumulative share of the electoral votes over the partisan
lean (a share of 1 is 269 electoral votes).

## Configuration

`leanmap` comes with sensible defaults. All the options can be passed in a
configuration file in JSON. The paths are relative to the configuration file.

```json
{
  "inputSettings": {
    "resultsFilePath": "1976-2016-president.csv",
    "apportionmentFilePath": "electoral_vote_apportionment.csv",
    "apportionmentProvider": "csv"
  },
  "outputSettings": {
    "outputDirectory": "out",
    "marginsFile": "margins.csv",
    "dashboardFile": "dashboard.json"
  },
  "stages": { "aggregate": true, "dashboard": true, "diagnostics": false },
  "rules": { "totalVotesPolicy": "strict", "expectedElectoralVotes": 538 },
  "dashboard": { "year": 2016, "metric": "Partisan Lean", "hoverState": "PA" }
}
```

Stages:
- `aggregate` (default true): computes and writes the margins table
- `dashboard` (default true): reads the margins table back and writes the
  dashboard content for the selection
- `diagnostics` (default false): writes the lean distributions.

Rules:
- `totalVotesPolicy`: `strict` (default) skips the states whose Democratic and
  Republican rows report a different turnout. `useRepublicanRow` keeps the turnout
  of the Republican row.
- `expectedElectoralVotes` (default 538): the number of electoral votes
  checked every year. A mismatch is only a warning. 0 turns off the check.

### Party labels

The party labels are matched exactly (case insensitive). The defaults are:
- Democratic: `democrat`, `democratic-farmer-labor`, `democratic-npl`
- Republican: `republican`
- other parties: a list of common minor parties, and the empty label.

They are replaced with `democratLabels`, `republicanLabels` and `otherLabels` in the
rules. An unknown label stops the program, unless `treatUnknownPartyAsOther` is set.

 */
