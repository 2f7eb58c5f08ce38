// ********* Input data structures ***********

use std::collections::HashMap;
use std::fmt::Display;

use snafu::Snafu;

/// A grid of text cells, as extracted from one rectangular region of a page.
///
/// Rows are ordered top to bottom and cells left to right. A `None` cell is a
/// cell the extractor found nothing in. Rows may be ragged.
pub type RawCellGrid = Vec<Vec<Option<String>>>;

/// A rectangle on a page, in PDF points, as used by the table extractors.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Area {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Area {
    /// The `(y1, x1, y2, x2)` bounds expected by most extraction tools.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.top,
            self.left,
            self.top + self.height,
            self.left + self.width,
        )
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ScrapeAreas {
    pub label: Area,
    pub header: Area,
    pub content: Area,
}

/// The three regions read on every page.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RegionKind {
    Label,
    Header,
    Content,
}

impl Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RegionKind::Label => "label",
            RegionKind::Header => "header",
            RegionKind::Content => "content",
        };
        write!(f, "{}", name)
    }
}

/// Everything needed to rebuild the contest tables of one PDF.
#[derive(PartialEq, Debug, Clone)]
pub struct ScrapeConfig {
    pub areas: ScrapeAreas,
    /// The county every row of this document belongs to.
    pub county: String,
    /// The pages to read, in processing order.
    pub pages: Vec<u32>,
    /// Literal header names for pages where the header region cannot be read.
    pub headers: HashMap<u32, Vec<String>>,
    /// Literal contest labels for pages where the label region cannot be read.
    pub labels: HashMap<u32, String>,
}

// ******** Output data structures *********

/// Joins the rows of one logical contest across split export files.
#[derive(Eq, PartialEq, Debug, Clone, Hash, PartialOrd, Ord)]
pub struct ContestGroupId(pub String);

/// The canonical output unit: the votes of one candidate in one precinct.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NormalizedRow {
    pub county: String,
    /// Empty for county-level sources.
    pub precinct: String,
    /// `None` only when the contest name could not be recovered for the row.
    pub office: Option<String>,
    pub district: Option<String>,
    pub party: String,
    pub candidate: String,
    pub votes: u64,
}

/// Errors that stop the processing of a row or a page.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum NormalizeError {
    #[snafu(display("Unknown party {party:?}: not present in the party translation table"))]
    UnknownParty { party: String },

    #[snafu(display("Malformed candidate {text:?}: it does not start with a name"))]
    MalformedCandidate { text: String },

    #[snafu(display("Contest label {label:?} names a district office but contains no digits"))]
    MissingDigits { label: String },

    #[snafu(display(
        "Page {page}: {labels} header labels but only {columns} content columns"
    ))]
    HeaderMismatch {
        page: u32,
        labels: usize,
        columns: usize,
    },

    #[snafu(display("Page {page}: the label region is empty and no label override is set"))]
    EmptyLabel { page: u32 },

    #[snafu(display("Page {page} is listed more than once"))]
    DuplicatePage { page: u32 },

    #[snafu(display("Page {page}: could not extract the {region} region: {message}"))]
    Extraction {
        page: u32,
        region: RegionKind,
        message: String,
    },

    #[snafu(display("Invalid vote count {value:?}"))]
    InvalidVoteCount { value: String },
}

pub type NormalizeResult<T> = Result<T, NormalizeError>;
