// Primitives for reading the state exports and writing the normalized output.

use std::fs;
use std::io;

use log::debug;
use results_normalizer::{CountyTotalsRecord, NormalizedRow, PrecinctContestRecord};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::norm::io_common::simplify_file_name;
use crate::norm::*;

pub const OUTPUT_HEADER: [&str; 7] = [
    "county",
    "precinct",
    "office",
    "district",
    "party",
    "candidate",
    "votes",
];

const PRECINCT_CONTEST_COLUMNS: [&str; 7] = [
    "JurisName",
    "PrecinctName",
    "CandidateName",
    "PartyName",
    "VoteCount",
    "ContestName",
    "EISContestID",
];

const COUNTY_TOTALS_COLUMNS: [&str; 6] = [
    "County",
    "OfficeName",
    "PartyAbbrev",
    "CanFirstName",
    "CanLastName",
    "Votes",
];

/// The records of one export file, by vintage.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FlatRecords {
    PrecinctContests(Vec<PrecinctContestRecord>),
    CountyTotals(Vec<CountyTotalsRecord>),
}

#[derive(Debug, Deserialize)]
struct PrecinctContestLine {
    #[serde(rename = "JurisName")]
    juris_name: String,
    #[serde(rename = "PrecinctName")]
    precinct_name: String,
    #[serde(rename = "CandidateName")]
    candidate_name: String,
    #[serde(rename = "PartyName")]
    party_name: Option<String>,
    #[serde(rename = "VoteCount")]
    vote_count: String,
    #[serde(rename = "ContestName")]
    contest_name: Option<String>,
    #[serde(rename = "EISContestID")]
    contest_id: String,
}

#[derive(Debug, Deserialize)]
struct CountyTotalsLine {
    #[serde(rename = "County")]
    county: String,
    #[serde(rename = "OfficeName")]
    office_name: String,
    #[serde(rename = "PartyAbbrev")]
    party_abbrev: String,
    #[serde(rename = "CanFirstName")]
    first_name: String,
    #[serde(rename = "CanLastName")]
    last_name: String,
    #[serde(rename = "Votes")]
    votes: String,
}

/// Tab if the header line has one, comma otherwise.
fn sniff_delimiter(contents: &str) -> u8 {
    let header_line = contents.lines().next().unwrap_or_default();
    if header_line.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

pub fn read_flat_file(path: &str) -> ElnormResult<FlatRecords> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let contents = contents.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(contents);
    debug!(
        "read_flat_file: {}: delimiter {:?}",
        simplify_file_name(path),
        delimiter as char
    );
    parse_flat(contents.as_bytes(), delimiter, path)
}

fn has_columns(header: &csv::StringRecord, columns: &[&str]) -> bool {
    columns.iter().all(|c| header.iter().any(|h| h == *c))
}

pub fn parse_flat<R: io::Read>(rdr: R, delimiter: u8, path: &str) -> ElnormResult<FlatRecords> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let header = rdr.headers().context(ReadingCsvSnafu { path })?.clone();
    debug!("parse_flat: header: {:?}", header);

    if has_columns(&header, &PRECINCT_CONTEST_COLUMNS) {
        let mut res: Vec<PrecinctContestRecord> = Vec::new();
        for line_r in rdr.deserialize() {
            let line: PrecinctContestLine = line_r.context(ReadingCsvSnafu { path })?;
            res.push(PrecinctContestRecord {
                juris_name: line.juris_name,
                precinct_name: line.precinct_name,
                candidate_name: line.candidate_name,
                party_name: line.party_name,
                vote_count: line.vote_count,
                contest_name: line.contest_name,
                contest_id: line.contest_id,
            });
        }
        Ok(FlatRecords::PrecinctContests(res))
    } else if has_columns(&header, &COUNTY_TOTALS_COLUMNS) {
        let mut res: Vec<CountyTotalsRecord> = Vec::new();
        for line_r in rdr.deserialize() {
            let line: CountyTotalsLine = line_r.context(ReadingCsvSnafu { path })?;
            res.push(CountyTotalsRecord {
                county: line.county,
                office_name: line.office_name,
                party_abbrev: line.party_abbrev,
                first_name: line.first_name,
                last_name: line.last_name,
                votes: line.votes,
            });
        }
        Ok(FlatRecords::CountyTotals(res))
    } else {
        UnknownVintageSnafu {
            path,
            header: header.iter().map(|s| s.to_string()).collect::<Vec<String>>(),
        }
        .fail()
    }
}

#[derive(Debug, Serialize)]
struct OutputLine<'a> {
    county: &'a str,
    precinct: &'a str,
    office: Option<&'a str>,
    district: Option<&'a str>,
    party: &'a str,
    candidate: &'a str,
    votes: u64,
}

impl<'a> From<&'a NormalizedRow> for OutputLine<'a> {
    fn from(row: &'a NormalizedRow) -> OutputLine<'a> {
        OutputLine {
            county: &row.county,
            precinct: &row.precinct,
            office: row.office.as_deref(),
            district: row.district.as_deref(),
            party: &row.party,
            candidate: &row.candidate,
            votes: row.votes,
        }
    }
}

/// Writes the rows as CSV. The header is written even without rows.
pub fn write_rows<W: io::Write>(w: W, rows: &[NormalizedRow]) -> ElnormResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(w);
    wtr.write_record(&OUTPUT_HEADER).context(WritingCsvSnafu {})?;
    for row in rows {
        wtr.serialize(OutputLine::from(row))
            .context(WritingCsvSnafu {})?;
    }
    wtr.flush()
        .map_err(csv::Error::from)
        .context(WritingCsvSnafu {})?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precinct_contest_vintage() {
        let data = "\
JurisName,PrecinctName,EISContestID,ContestName,CandidateName,PartyName,VoteCount
COOK,WARD 1,42,5TH REPRESENTATIVE,SMITH JOHN,Democratic,12
COOK,WARD 2,42,,Write-in,,3
";
        let recs = parse_flat(data.as_bytes(), sniff_delimiter(data), "ps.csv").unwrap();
        let recs = match recs {
            FlatRecords::PrecinctContests(r) => r,
            x => panic!("wrong vintage {:?}", x),
        };
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].contest_name.as_deref(), Some("5TH REPRESENTATIVE"));
        assert_eq!(recs[0].party_name.as_deref(), Some("Democratic"));
        assert_eq!(recs[1].contest_name, None);
        assert_eq!(recs[1].party_name, None);
        assert_eq!(recs[1].contest_id, "42");
    }

    #[test]
    fn county_totals_vintage() {
        let data = "County\tOfficeName\tPartyAbbrev\tCanFirstName\tCanLastName\tVotes\n\
EDGAR \tSTATE SENATE 51ST\tR\tJANE\tDOE\t1204\n";
        assert_eq!(sniff_delimiter(data), b'\t');
        let recs = parse_flat(data.as_bytes(), b'\t', "ct.txt").unwrap();
        assert_eq!(
            recs,
            FlatRecords::CountyTotals(vec![CountyTotalsRecord {
                county: "EDGAR".to_string(),
                office_name: "STATE SENATE 51ST".to_string(),
                party_abbrev: "R".to_string(),
                first_name: "JANE".to_string(),
                last_name: "DOE".to_string(),
                votes: "1204".to_string(),
            }])
        );
    }

    #[test]
    fn unknown_vintage() {
        let data = "a,b,c\n1,2,3\n";
        assert!(matches!(
            parse_flat(data.as_bytes(), b',', "x.csv"),
            Err(ElnormError::UnknownVintage { .. })
        ));
    }

    #[test]
    fn write_output() {
        let rows = vec![NormalizedRow {
            county: "Edgar".to_string(),
            precinct: "".to_string(),
            office: Some("U.S. Senate".to_string()),
            district: None,
            party: "D".to_string(),
            candidate: "JOHN SMITH".to_string(),
            votes: 1234,
        }];
        let mut buffer: Vec<u8> = Vec::new();
        write_rows(&mut buffer, &rows).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "county,precinct,office,district,party,candidate,votes\nEdgar,,U.S. Senate,,D,JOHN SMITH,1234\n"
        );

        let mut buffer: Vec<u8> = Vec::new();
        write_rows(&mut buffer, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "county,precinct,office,district,party,candidate,votes\n"
        );
    }
}
