//! Merges the rows of all the sources into the final, sorted output.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::{debug, info, warn};

use crate::config::*;
use crate::vocabulary::*;

/// A row from the precinct results export, before its contest is resolved.
///
/// The contest name may be missing on some rows of a contest. It is
/// recovered from a row with the same group id before the office and the
/// district are derived from it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ContestRow {
    pub group: ContestGroupId,
    pub contest: Option<String>,
    pub county: String,
    pub precinct: String,
    /// Free-text party name, as spelled by the export.
    pub party: Option<String>,
    pub candidate: String,
    pub votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
enum Pending {
    Ready(NormalizedRow),
    Contest(ContestRow),
}

/// Collects rows from every source, then reconciles and sorts them.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Aggregator {
    pending: Vec<Pending>,
}

impl Aggregator {
    pub fn new() -> Aggregator {
        Aggregator::default()
    }

    /// Adds rows that are already normalized.
    pub fn add_rows<I: IntoIterator<Item = NormalizedRow>>(&mut self, rows: I) {
        self.pending.extend(rows.into_iter().map(Pending::Ready));
    }

    pub fn add_contest_rows<I: IntoIterator<Item = ContestRow>>(&mut self, rows: I) {
        self.pending.extend(rows.into_iter().map(Pending::Contest));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Resolves the pending contest rows and returns all the rows sorted by
    /// county, precinct, office, district and party.
    ///
    /// Rows with the same sort key keep the order in which they were added.
    /// They are neither merged nor summed.
    pub fn finish(self) -> NormalizeResult<Vec<NormalizedRow>> {
        info!("Aggregating {} rows", self.pending.len());
        let names = contest_names_by_group(&self.pending);
        debug!("finish: {} contest groups with a name", names.len());

        let mut unresolved: HashSet<ContestGroupId> = HashSet::new();
        let mut rows: Vec<NormalizedRow> = Vec::with_capacity(self.pending.len());
        for p in self.pending {
            let mut row = match p {
                Pending::Ready(row) => row,
                Pending::Contest(c) => {
                    if c.contest.is_none() && !names.contains_key(&c.group) {
                        unresolved.insert(c.group.clone());
                    }
                    resolve_contest_row(c, &names)?
                }
            };
            row.county = title_case(&row.county);
            rows.push(row);
        }

        let mut unresolved: Vec<ContestGroupId> = unresolved.into_iter().collect();
        unresolved.sort();
        for group in unresolved {
            warn!(
                "No row of contest group {:?} has a contest name, leaving the office empty",
                group.0
            );
        }

        sort_rows(&mut rows);
        Ok(rows)
    }
}

// The first known contest name of every group.
fn contest_names_by_group(pending: &[Pending]) -> HashMap<ContestGroupId, String> {
    let mut names: HashMap<ContestGroupId, String> = HashMap::new();
    for p in pending {
        if let Pending::Contest(ContestRow {
            group,
            contest: Some(name),
            ..
        }) = p
        {
            names.entry(group.clone()).or_insert_with(|| name.clone());
        }
    }
    names
}

fn resolve_contest_row(
    row: ContestRow,
    names: &HashMap<ContestGroupId, String>,
) -> NormalizeResult<NormalizedRow> {
    let contest = row.contest.or_else(|| names.get(&row.group).cloned());
    let (office, district) = match contest.as_deref() {
        Some(label) => (
            Some(office_from_contest_label(label)),
            district_from_contest_label(label)?,
        ),
        None => (None, None),
    };
    Ok(NormalizedRow {
        county: row.county,
        precinct: row.precinct,
        office,
        district,
        party: normalize_party(row.party.as_deref().unwrap_or(""))?,
        candidate: normalize_write_in(&row.candidate),
        votes: row.votes,
    })
}

/// Stable sort on `(county, precinct, office, district, party)`. Missing
/// offices and districts sort after all the others.
pub fn sort_rows(rows: &mut [NormalizedRow]) {
    rows.sort_by(|a, b| {
        a.county
            .cmp(&b.county)
            .then_with(|| a.precinct.cmp(&b.precinct))
            .then_with(|| cmp_missing_last(&a.office, &b.office))
            .then_with(|| cmp_missing_last(&a.district, &b.district))
            .then_with(|| a.party.cmp(&b.party))
    });
}

fn cmp_missing_last(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
