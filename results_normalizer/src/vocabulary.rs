//! Translation tables and free-text extractors shared by both pipelines.
//!
//! Every table is an exact-match lookup. What happens to a key that is not in
//! a table depends on the table: the party table rejects it, all the others
//! hand the input back unchanged.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use snafu::OptionExt;

use crate::config::*;

/// Marker for a party or a district that could not be read from a label.
pub const NOT_AVAILABLE: &str = "-";

/// What a lookup does with a key that is absent from its table.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Unmapped {
    /// The table is exhaustive: an absent key is a data error.
    Reject,
    /// The input is returned unchanged.
    PassThrough,
}

/// A finite, exact-match mapping from raw spellings to canonical values.
#[derive(Eq, PartialEq, Debug)]
pub struct Translation {
    entries: &'static [(&'static str, &'static str)],
    unmapped: Unmapped,
}

impl Translation {
    pub const fn new(entries: &'static [(&'static str, &'static str)], unmapped: Unmapped) -> Self {
        Translation { entries, unmapped }
    }

    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(raw, _)| *raw == key)
            .map(|(_, canonical)| *canonical)
    }

    pub fn unmapped(&self) -> Unmapped {
        self.unmapped
    }

    /// Looks a key up, applying the policy of the table to absent keys:
    /// `None` when they are rejected, the key itself when they pass through.
    pub fn translate(&self, key: &str) -> Option<String> {
        match (self.get(key), self.unmapped()) {
            (Some(canonical), _) => Some(canonical.to_string()),
            (None, Unmapped::PassThrough) => Some(key.to_string()),
            (None, Unmapped::Reject) => None,
        }
    }

    /// All the raw spellings known to the table.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(raw, _)| *raw)
    }
}

// This might not be exhaustive for every cycle. New spellings must be added
// here, they are never passed through.
pub static PARTIES: Translation = Translation::new(
    &[
        ("", ""),
        ("CONSERVATIVE", "CONSERVATIVE"),
        ("Conservative", "CONSERVATIVE"),
        ("DEM", "DEM"),
        ("DEMOCRACT", "DEM"),
        ("Democrat", "DEM"),
        ("DEMOCRATIC", "DEM"),
        ("Democratic", "DEM"),
        ("DOWNSTATE UNITED", "DOWNSTATE UNITED"),
        ("Downstate United", "DOWNSTATE UNITED"),
        ("GRN", "GRN"),
        ("Green", "GRN"),
        ("GREEN", "GRN"),
        ("IND", "IND"),
        ("Independent", "IND"),
        ("INDEPENDENT", "IND"),
        ("LIB", "LIB"),
        ("LIBERTARIAN", "LIB"),
        ("Libertarian", "LIB"),
        ("NON-PARTISAN", "NONPARTISAN"),
        ("Non-Partisan", "NONPARTISAN"),
        ("Nonpartisan", "NONPARTISAN"),
        ("NonPartisan", "NONPARTISAN"),
        ("NONPARTISAN", "NONPARTISAN"),
        ("REP", "REP"),
        ("REPUBLICAN", "REP"),
        ("Republican", "REP"),
    ],
    Unmapped::Reject,
);

pub static OFFICES: Translation = Translation::new(
    &[
        ("GOVERNOR AND LIEUTENANT GOVERNOR", "Governor"),
        ("PRESIDENT AND VICE PRESIDENT", "President"),
        ("UNITED STATES SENATOR", "U.S. Senate"),
        ("ATTORNEY GENERAL", "Attorney General"),
        ("SECRETARY OF STATE", "Secretary of State"),
        ("STATE HOUSE", "State House"),
        ("STATE SENATE", "State Senate"),
        ("TREASURER", "Treasurer"),
        ("U.S. HOUSE", "U.S. House"),
        ("U.S. SENATE", "U.S. Senate"),
        ("COMPTROLLER", "Comptroller"),
    ],
    Unmapped::PassThrough,
);

pub static WRITE_INS: Translation = Translation::new(
    &[
        ("WRITE-IN", "Write-ins"),
        ("Write-In", "Write-ins"),
        ("write-in", "Write-ins"),
        ("Write-in", "Write-ins"),
    ],
    Unmapped::PassThrough,
);

/// Suffixes of contest labels that carry a district number, with their office.
/// The suffixes are mutually exclusive, the order only matters for reading.
const DISTRICT_SUFFIXES: [(&str, &str); 3] = [
    (" REPRESENTATIVE", "State House"),
    (" SENATE", "State Senate"),
    (" CONGRESS", "U.S. House"),
];

// Tried in this order, the first match wins. Some labels match more than one.
static FREE_LABEL_OFFICES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"^D[0-9]+ REPRESENTATIVE", "General Assembly"),
        (r"^REPRES [0-9]+[A-Z]{2} DIST", "General Assembly"),
        (r"^D[0-9]+ CONGRESS", "U.S. House"),
        (r"^REP IN CONG [0-9]+[A-Z]{2} DIST", "U.S. House"),
        (r"^[0-9]+[A-Z]{2} CONGRESSIONAL DIST", "U.S. House"),
        (r"^D[0-9]+ STATE SENATE", "State Senate"),
        (r"^SENATE DIST [0-9]+", "State Senate"),
        (r"^TURN OUT", "Voters"),
        (r"^PRESIDENT", "President"),
    ]
    .into_iter()
    .map(|(p, office)| (Regex::new(p).unwrap(), office))
    .collect()
});

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());
static LEADING_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z ,.'-]+").unwrap());
static PARENTHESIZED_PARTY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([A-Z]+)\)").unwrap());

/// Maps any known spelling of a party to its code. Empty stays empty.
pub fn normalize_party(raw: &str) -> NormalizeResult<String> {
    PARTIES
        .translate(raw)
        .context(UnknownPartySnafu { party: raw })
}

/// Canonical spelling of write-in candidates; any other name is unchanged.
pub fn normalize_write_in(name: &str) -> String {
    WRITE_INS
        .translate(name)
        .unwrap_or_else(|| name.to_string())
}

/// The office of a contest label from the state exports, e.g. `5 STATE SENATE`.
pub fn office_from_contest_label(label: &str) -> String {
    if let Some((_, office)) = DISTRICT_SUFFIXES
        .iter()
        .find(|(suffix, _)| label.ends_with(suffix))
    {
        return office.to_string();
    }
    OFFICES
        .translate(label)
        .unwrap_or_else(|| label.to_string())
}

/// The district of a contest label from the state exports.
///
/// Labels that do not end with a district suffix have no district. Labels
/// that do must contain one.
pub fn district_from_contest_label(label: &str) -> NormalizeResult<Option<String>> {
    if !DISTRICT_SUFFIXES
        .iter()
        .any(|(suffix, _)| label.ends_with(suffix))
    {
        return Ok(None);
    }
    first_digits(label)
        .map(Some)
        .context(MissingDigitsSnafu { label })
}

/// The office of a contest label read from a PDF page.
pub fn office_from_free_label(label: &str) -> String {
    match FREE_LABEL_OFFICES.iter().find(|(re, _)| re.is_match(label)) {
        Some((re, office)) => {
            debug!("office_from_free_label: {:?} matched {:?}", label, re.as_str());
            office.to_string()
        }
        None => title_case(label),
    }
}

/// The first number in a PDF contest label, or [`NOT_AVAILABLE`].
pub fn district_from_free_label(label: &str) -> String {
    first_digits(label).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// The name at the start of a candidate header, without the party or any
/// trailing numbers: `SMITH, JOHN (DEM)` gives `SMITH, JOHN`.
pub fn candidate_name_from_raw(text: &str) -> NormalizeResult<String> {
    LEADING_NAME
        .find(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
        .context(MalformedCandidateSnafu { text })
}

/// The party code embedded in a candidate header: `SMITH, JOHN (DEM)` gives `DEM`.
pub fn party_from_raw(text: &str) -> String {
    PARENTHESIZED_PARTY
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Uppercases the first letter of every word and lowercases the rest.
/// A word starts after any character that is not a letter, so
/// `ST. JOHN'S 1` becomes `St. John'S 1`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if prev_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_is_letter = c.is_alphabetic();
    }
    out
}

/// The leftmost run of digits in `s`.
pub(crate) fn first_digits(s: &str) -> Option<String> {
    DIGITS.find(s).map(|m| m.as_str().to_string())
}
