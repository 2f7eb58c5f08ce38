//! Melts reconstructed tables and flat export records into normalized rows.

use log::{debug, warn};
use snafu::OptionExt;

use crate::aggregate::ContestRow;
use crate::config::*;
use crate::reconstruct::{ContestTables, ReconstructedTable, COUNTY, PRECINCT};
use crate::vocabulary::*;

/// Columns of the PDF tables that are never candidates.
pub const METRIC_COLUMNS: [&str; 6] = [
    "Reg. Voters",
    "Times Counted",
    "Total Votes",
    "Vote For",
    "Times Over Voted",
    "Number Of Under Votes",
];

/// The office of turnout tables, whose metrics are reported as candidates.
pub const VOTERS: &str = "Voters";
pub const TURNOUT_COLUMNS: [&str; 2] = ["Reg. Voters", "Cards Cast"];

/// Precinct names (after title casing) of aggregate rows.
pub const AGGREGATE_PRECINCTS: [&str; 3] = ["Presidential Ballot", "Total", "Elections Office"];

/// Normalizes every table of a document, in label order.
pub fn normalize_tables(tables: &ContestTables) -> NormalizeResult<Vec<NormalizedRow>> {
    let mut res: Vec<NormalizedRow> = Vec::new();
    for (label, table) in tables.iter() {
        let mut rows = normalize_table(label, table)?;
        debug!("normalize_tables: {:?}: {} rows", label, rows.len());
        res.append(&mut rows);
    }
    Ok(res)
}

/// One row per candidate column and precinct of a contest table.
///
/// Aggregate precincts and cells without a non-negative vote count are
/// skipped.
pub fn normalize_table(
    label: &str,
    table: &ReconstructedTable,
) -> NormalizeResult<Vec<NormalizedRow>> {
    let office = office_from_free_label(label);
    let district = district_from_free_label(label);

    let precinct_idx = match table.column_index(PRECINCT) {
        Some(idx) => idx,
        None => {
            warn!("normalize_table: {:?}: no precinct column, skipping", label);
            return Ok(vec![]);
        }
    };
    let county_idx = table.column_index(COUNTY);

    let candidate_columns: Vec<(usize, &str)> = if office == VOTERS {
        TURNOUT_COLUMNS
            .iter()
            .filter_map(|name| {
                let idx = table.column_index(name);
                if idx.is_none() {
                    warn!("normalize_table: {:?}: missing turnout column {:?}", label, name);
                }
                idx.map(|idx| (idx, *name))
            })
            .collect()
    } else {
        table
            .columns()
            .iter()
            .enumerate()
            .filter(|(idx, name)| {
                *idx != precinct_idx
                    && Some(*idx) != county_idx
                    && !METRIC_COLUMNS.contains(&name.as_str())
            })
            .map(|(idx, name)| (idx, name.as_str()))
            .collect()
    };

    let mut res: Vec<NormalizedRow> = Vec::new();
    let mut skipped = 0;
    for (col_idx, column) in candidate_columns {
        let candidate = candidate_name_from_raw(column)?;
        let party = party_from_raw(column);
        for row in table.rows() {
            let precinct = match &row[precinct_idx] {
                Some(p) => title_case(p),
                None => continue,
            };
            if AGGREGATE_PRECINCTS.contains(&precinct.as_str()) {
                continue;
            }
            let votes = match row[col_idx].as_deref().and_then(parse_votes) {
                Some(v) => v,
                None => {
                    skipped += 1;
                    continue;
                }
            };
            let county = county_idx
                .and_then(|idx| row[idx].clone())
                .unwrap_or_default();
            res.push(NormalizedRow {
                county,
                precinct,
                office: Some(office.clone()),
                district: Some(district.clone()),
                party: party.clone(),
                candidate: candidate.clone(),
                votes,
            });
        }
    }
    if skipped > 0 {
        debug!(
            "normalize_table: {:?}: skipped {} cells without a vote count",
            label, skipped
        );
    }
    Ok(res)
}

/// Reads a vote count. Thousands separators and integral floats (`12.0`)
/// are accepted, negative and non-numeric values are not.
pub fn parse_votes(cell: &str) -> Option<u64> {
    let cleaned: String = cell.trim().chars().filter(|c| *c != ',').collect();
    if let Ok(v) = cleaned.parse::<u64>() {
        return Some(v);
    }
    match cleaned.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Some(f as u64),
        _ => None,
    }
}

fn parse_vote_count(value: &str) -> NormalizeResult<u64> {
    parse_votes(value).context(InvalidVoteCountSnafu { value })
}

/// A row of the county totals export, one per candidate and county.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountyTotalsRecord {
    pub county: String,
    pub office_name: String,
    pub party_abbrev: String,
    pub first_name: String,
    pub last_name: String,
    pub votes: String,
}

// Checked in order against the office name, the first match wins.
const OFFICE_NAME_RULES: [(&str, &str, bool); 6] = [
    ("CONGRESS", "U.S. House", true),
    ("SENATE", "State Senate", true),
    ("REPRESENTATIVE", "State House", true),
    ("PRESIDENT", "President", false),
    ("SENATOR", "U.S. Senate", false),
    ("GOVERNOR", "Governor", false),
];

/// The office and district of an office name from the county totals export.
/// Unknown offices are passed through without a district.
pub fn office_from_office_name(name: &str) -> NormalizeResult<(String, Option<String>)> {
    match OFFICE_NAME_RULES
        .iter()
        .find(|(needle, _, _)| name.contains(needle))
    {
        Some((_, office, true)) => {
            let district = first_digits(name).context(MissingDigitsSnafu { label: name })?;
            Ok((office.to_string(), Some(district)))
        }
        Some((_, office, false)) => Ok((office.to_string(), None)),
        None => Ok((name.to_string(), None)),
    }
}

/// County totals have no precinct: the precinct of the row is empty.
pub fn normalize_county_totals(rec: &CountyTotalsRecord) -> NormalizeResult<NormalizedRow> {
    let (office, district) = office_from_office_name(&rec.office_name)?;
    Ok(NormalizedRow {
        county: rec.county.clone(),
        precinct: String::new(),
        office: Some(office),
        district,
        party: rec.party_abbrev.clone(),
        candidate: format!("{} {}", rec.first_name, rec.last_name),
        votes: parse_vote_count(&rec.votes)?,
    })
}

/// A row of the precinct results export.
///
/// Some exports leave the contest name empty on part of the rows. Those rows
/// are completed from the other rows of the same contest id, see
/// [`crate::aggregate::Aggregator`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PrecinctContestRecord {
    pub juris_name: String,
    pub precinct_name: String,
    pub candidate_name: String,
    pub party_name: Option<String>,
    pub vote_count: String,
    pub contest_name: Option<String>,
    pub contest_id: String,
}

pub fn contest_row_from_record(rec: PrecinctContestRecord) -> NormalizeResult<ContestRow> {
    let votes = parse_vote_count(&rec.vote_count)?;
    Ok(ContestRow {
        group: ContestGroupId(rec.contest_id),
        contest: rec.contest_name.filter(|s| !s.is_empty()),
        county: rec.juris_name,
        precinct: rec.precinct_name,
        party: rec.party_name,
        candidate: rec.candidate_name,
        votes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> ReconstructedTable {
        ReconstructedTable::new(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn melt_contest_table() {
        let t = table(
            &["Precinct", "Total Votes", "SMITH, JOHN (DEM)", "DOE, JANE (REP)", "County"],
            &[
                &["ASHMORE 1", "30", "10", "20", "Edgar"],
                &["KANSAS 2", "12", "7", "5", "Edgar"],
            ],
        );
        let rows = normalize_table("D5 REPRESENTATIVE", &t).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[0],
            NormalizedRow {
                county: "Edgar".to_string(),
                precinct: "Ashmore 1".to_string(),
                office: Some("General Assembly".to_string()),
                district: Some("5".to_string()),
                party: "DEM".to_string(),
                candidate: "SMITH, JOHN".to_string(),
                votes: 10,
            }
        );
        // Candidate-major order.
        assert_eq!(rows[1].precinct, "Kansas 2");
        assert_eq!(rows[1].candidate, "SMITH, JOHN");
        assert_eq!(rows[2].candidate, "DOE, JANE");
        assert_eq!(rows[2].party, "REP");
    }

    #[test]
    fn aggregates_and_bad_counts_are_dropped() {
        let t = table(
            &["Precinct", "A (DEM)", "County"],
            &[
                &["TOTAL", "100", "Edgar"],
                &["ELECTIONS OFFICE", "3", "Edgar"],
                &["P1", "-4", "Edgar"],
                &["P2", "n/a", "Edgar"],
                &["P3", "", "Edgar"],
                &["P4", "1,204", "Edgar"],
            ],
        );
        let rows = normalize_table("PRESIDENT", &t).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].precinct, "P4");
        assert_eq!(rows[0].votes, 1204);
        assert_eq!(rows[0].district, Some(NOT_AVAILABLE.to_string()));
    }

    #[test]
    fn turnout_tables() {
        let t = table(
            &["Precinct", "Reg. Voters", "Cards Cast", "Times Counted", "County"],
            &[&["P1", "100", "40", "41", "Edgar"]],
        );
        let rows = normalize_table("TURN OUT", &t).unwrap();
        let cands: Vec<(&str, u64)> = rows.iter().map(|r| (r.candidate.as_str(), r.votes)).collect();
        assert_eq!(cands, vec![("Reg. Voters", 100), ("Cards Cast", 40)]);
        assert!(rows.iter().all(|r| r.office.as_deref() == Some(VOTERS)));
        assert!(rows.iter().all(|r| r.party == NOT_AVAILABLE));
    }

    #[test]
    fn metrics_are_not_candidates() {
        let t = table(
            &["Precinct", "Reg. Voters", "Vote For", "Times Over Voted", "A", "County"],
            &[&["P1", "100", "1", "0", "7", "Edgar"]],
        );
        let rows = normalize_table("CIRCUIT CLERK", &t).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].candidate, "A");
        assert_eq!(rows[0].office.as_deref(), Some("Circuit Clerk"));
    }

    #[test]
    fn malformed_candidate_header_fails() {
        let t = table(&["Precinct", "(DEM)", "County"], &[&["P1", "1", "Edgar"]]);
        assert!(matches!(
            normalize_table("PRESIDENT", &t),
            Err(NormalizeError::MalformedCandidate { .. })
        ));
    }

    #[test]
    fn votes_are_never_negative() {
        for cell in ["-1", "-0.5", "1.5", "abc", "NaN", "inf"] {
            assert_eq!(parse_votes(cell), None, "{:?}", cell);
        }
        assert_eq!(parse_votes(" 12 "), Some(12));
        assert_eq!(parse_votes("12.0"), Some(12));
        assert_eq!(parse_votes("0"), Some(0));
    }

    #[test]
    fn office_names() {
        assert_eq!(
            office_from_office_name("REPRESENTATIVE IN CONGRESS 13TH").unwrap(),
            ("U.S. House".to_string(), Some("13".to_string()))
        );
        assert_eq!(
            office_from_office_name("STATE SENATE 51ST").unwrap(),
            ("State Senate".to_string(), Some("51".to_string()))
        );
        assert_eq!(
            office_from_office_name("REPRESENTATIVE 102ND").unwrap(),
            ("State House".to_string(), Some("102".to_string()))
        );
        assert_eq!(
            office_from_office_name("PRESIDENT AND VICE PRESIDENT").unwrap(),
            ("President".to_string(), None)
        );
        assert_eq!(
            office_from_office_name("UNITED STATES SENATOR").unwrap(),
            ("U.S. Senate".to_string(), None)
        );
        assert_eq!(
            office_from_office_name("GOVERNOR AND LIEUTENANT GOVERNOR").unwrap(),
            ("Governor".to_string(), None)
        );
        assert_eq!(
            office_from_office_name("COMPTROLLER").unwrap(),
            ("COMPTROLLER".to_string(), None)
        );
        assert!(matches!(
            office_from_office_name("STATE SENATE"),
            Err(NormalizeError::MissingDigits { .. })
        ));
    }

    #[test]
    fn county_totals() {
        let rec = CountyTotalsRecord {
            county: "EDGAR".to_string(),
            office_name: "UNITED STATES SENATOR".to_string(),
            party_abbrev: "D".to_string(),
            first_name: "JOHN".to_string(),
            last_name: "SMITH".to_string(),
            votes: "1234".to_string(),
        };
        let row = normalize_county_totals(&rec).unwrap();
        assert_eq!(row.candidate, "JOHN SMITH");
        assert_eq!(row.party, "D");
        assert_eq!(row.precinct, "");
        assert_eq!(row.office.as_deref(), Some("U.S. Senate"));
        assert_eq!(row.votes, 1234);

        let bad = CountyTotalsRecord {
            votes: "".to_string(),
            ..rec
        };
        assert!(matches!(
            normalize_county_totals(&bad),
            Err(NormalizeError::InvalidVoteCount { .. })
        ));
    }

    #[test]
    fn contest_records() {
        let row = contest_row_from_record(PrecinctContestRecord {
            juris_name: "COOK".to_string(),
            precinct_name: "WARD 1".to_string(),
            candidate_name: "Write-in".to_string(),
            party_name: None,
            vote_count: "3".to_string(),
            contest_name: Some("".to_string()),
            contest_id: "77".to_string(),
        })
        .unwrap();
        assert_eq!(row.group, ContestGroupId("77".to_string()));
        assert_eq!(row.contest, None);
        assert_eq!(row.votes, 3);
    }
}
