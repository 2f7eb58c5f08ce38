//! Rebuilds the logical contest tables of a PDF from per-page region grids.
//!
//! Each page goes through a fixed sequence of grid transforms:
//! drop empty columns, drop percentage columns, assign the header, attach the
//! county, drop the jurisdiction-wide rows. The order matters: the header is
//! zipped onto the columns that survive the drops.

use std::collections::{HashMap, HashSet};

use log::{debug, info};
use snafu::ensure;

use crate::config::*;

pub const PRECINCT: &str = "Precinct";
pub const COUNTY: &str = "County";
/// Aggregate row printed at the top of some contest pages.
pub const JURISDICTION_WIDE: &str = "Jurisdiction Wide";

/// Provides the cells of a region of a page.
///
/// This is the only thing required from the PDF table extraction layer.
pub trait RegionSource {
    fn read_region(
        &mut self,
        page: u32,
        region: RegionKind,
        area: &Area,
    ) -> NormalizeResult<RawCellGrid>;
}

/// One row per precinct, one column per candidate or metric, plus the
/// `Precinct` and `County` columns.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ReconstructedTable {
    columns: Vec<String>,
    // Invariant: every row has exactly one cell per column.
    rows: Vec<Vec<Option<String>>>,
}

impl ReconstructedTable {
    /// Builds a table, padding short rows with empty cells.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> ReconstructedTable {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        ReconstructedTable { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The cells of a column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    /// Appends the rows of `other`, taking the union of the columns.
    ///
    /// Columns are matched by name. New columns are added at the end and the
    /// cells missing on either side are left empty.
    pub fn append_outer(&mut self, other: ReconstructedTable) {
        // The k-th column with a given name goes to the k-th one here.
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut targets: Vec<usize> = Vec::with_capacity(other.columns.len());
        let mut added: Vec<String> = Vec::new();
        for name in other.columns.iter() {
            let nth = seen.entry(name.as_str()).or_insert(0);
            let existing = self
                .columns
                .iter()
                .enumerate()
                .filter(|(_, c)| *c == name)
                .map(|(idx, _)| idx)
                .nth(*nth);
            *nth += 1;
            let target = match existing {
                Some(idx) => idx,
                None => {
                    added.push(name.clone());
                    self.columns.len() + added.len() - 1
                }
            };
            targets.push(target);
        }
        if !added.is_empty() {
            debug!("append_outer: new columns {:?}", added);
            self.columns.extend(added);
            let width = self.columns.len();
            for row in self.rows.iter_mut() {
                row.resize(width, None);
            }
        }

        let width = self.columns.len();
        for row in other.rows {
            let mut merged: Vec<Option<String>> = vec![None; width];
            for (cell, target) in row.into_iter().zip(targets.iter()) {
                merged[*target] = cell;
            }
            self.rows.push(merged);
        }
    }
}

/// The tables of a document, keyed by contest label, in the order in which the
/// labels were first seen.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ContestTables {
    tables: Vec<(String, ReconstructedTable)>,
}

impl ContestTables {
    /// Adds the table of one page. Pages sharing a label are concatenated.
    pub fn merge(&mut self, label: String, table: ReconstructedTable) {
        match self.tables.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => existing.append_outer(table),
            None => self.tables.push((label, table)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&ReconstructedTable> {
        self.tables
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, table)| table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReconstructedTable)> {
        self.tables.iter().map(|(l, t)| (l.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Reads all the configured pages and groups their tables by contest label.
pub fn reconstruct<S: RegionSource + ?Sized>(
    source: &mut S,
    config: &ScrapeConfig,
) -> NormalizeResult<ContestTables> {
    let mut seen: HashSet<u32> = HashSet::new();
    for page in config.pages.iter() {
        ensure!(seen.insert(*page), DuplicatePageSnafu { page: *page });
    }

    let mut results = ContestTables::default();
    for page in config.pages.iter() {
        let (label, table) = reconstruct_page(source, config, *page)?;
        info!(
            "Added result from page {}. Race: {} ({} rows)",
            page,
            label,
            table.len()
        );
        results.merge(label, table);
    }
    Ok(results)
}

/// The contest label and the table of a single page.
pub fn reconstruct_page<S: RegionSource + ?Sized>(
    source: &mut S,
    config: &ScrapeConfig,
    page: u32,
) -> NormalizeResult<(String, ReconstructedTable)> {
    let label = read_label(source, config, page)?;
    let header = read_header(source, config, page)?;
    debug!("reconstruct_page: page {} header {:?}", page, header);

    let grid = source.read_region(page, RegionKind::Content, &config.areas.content)?;
    let columns = into_columns(grid);
    let columns = drop_empty_columns(columns);
    let columns = drop_percent_columns(columns);
    let table = assign_header(page, header, columns)?;
    let table = attach_county(table, &config.county);
    let table = drop_jurisdiction_rows(table);
    Ok((label, table))
}

fn read_label<S: RegionSource + ?Sized>(
    source: &mut S,
    config: &ScrapeConfig,
    page: u32,
) -> NormalizeResult<String> {
    if let Some(label) = config.labels.get(&page) {
        return Ok(label.clone());
    }
    let grid = source.read_region(page, RegionKind::Label, &config.areas.label)?;
    // Only the first line of the region holds the label.
    let label = grid
        .first()
        .map(|row| join_fragments(row.iter().flatten()))
        .unwrap_or_default();
    ensure!(!label.is_empty(), EmptyLabelSnafu { page });
    Ok(label)
}

fn read_header<S: RegionSource + ?Sized>(
    source: &mut S,
    config: &ScrapeConfig,
    page: u32,
) -> NormalizeResult<Vec<String>> {
    let grid: RawCellGrid = match config.headers.get(&page) {
        Some(names) => vec![names.iter().cloned().map(Some).collect()],
        None => source.read_region(page, RegionKind::Header, &config.areas.header)?,
    };
    Ok(header_labels(grid))
}

/// Turns a header grid into column labels.
///
/// Fragments stacked in the same column are joined with spaces. Labels of
/// percentage columns are dropped, and `Precinct` is always the first label.
/// Blank labels keep their position so that the labels after them stay on
/// their columns.
pub fn header_labels(grid: RawCellGrid) -> Vec<String> {
    let mut labels = vec![PRECINCT.to_string()];
    labels.extend(
        into_columns(grid)
            .into_iter()
            .map(|col| join_fragments(col.iter().flatten()))
            .filter(|label| !label.contains('%')),
    );
    labels
}

fn join_fragments<'a>(fragments: impl Iterator<Item = &'a String>) -> String {
    fragments
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join(" ")
}

type Columns = Vec<Vec<Option<String>>>;

// Transposes a grid. Short rows are padded and blank cells become empty.
fn into_columns(grid: RawCellGrid) -> Columns {
    let width = grid.iter().map(|row| row.len()).max().unwrap_or(0);
    let mut columns: Columns = vec![Vec::with_capacity(grid.len()); width];
    for row in grid {
        let mut cells = row.into_iter();
        for col in columns.iter_mut() {
            let cell = cells.next().flatten().filter(|s| !s.trim().is_empty());
            col.push(cell);
        }
    }
    columns
}

fn drop_empty_columns(columns: Columns) -> Columns {
    columns
        .into_iter()
        .filter(|col| col.iter().any(|c| c.is_some()))
        .collect()
}

// A column with percentages is either a pure duplicate of the count next to
// it, or a count and its percentage that the extractor failed to split.
fn drop_percent_columns(columns: Columns) -> Columns {
    columns
        .into_iter()
        .filter_map(|col| {
            if !col.iter().flatten().any(|c| is_percent(c)) {
                return Some(col);
            }
            if col.iter().flatten().any(|c| c.trim().contains(' ')) {
                Some(col.into_iter().map(|c| c.map(numeric_prefix)).collect())
            } else {
                None
            }
        })
        .collect()
}

// `52%` as well as `45 (52%)`.
fn is_percent(cell: &str) -> bool {
    let cell = cell.trim();
    cell.ends_with('%') || cell.ends_with("%)")
}

fn numeric_prefix(cell: String) -> String {
    cell.split_whitespace().next().unwrap_or_default().to_string()
}

fn assign_header(
    page: u32,
    mut header: Vec<String>,
    columns: Columns,
) -> NormalizeResult<ReconstructedTable> {
    ensure!(
        columns.len() >= header.len(),
        HeaderMismatchSnafu {
            page,
            labels: header.len(),
            columns: columns.len(),
        }
    );
    let extra = columns.len() - header.len();
    header.extend((0..extra).map(|i| format!("Unnamed: {}", i)));

    let height = columns.first().map(|c| c.len()).unwrap_or(0);
    let mut cells: Vec<_> = columns.into_iter().map(|c| c.into_iter()).collect();
    let rows: Vec<Vec<Option<String>>> = (0..height)
        .map(|_| cells.iter_mut().map(|c| c.next().flatten()).collect())
        .collect();
    Ok(ReconstructedTable::new(header, rows))
}

fn attach_county(mut table: ReconstructedTable, county: &str) -> ReconstructedTable {
    table.columns.push(COUNTY.to_string());
    for row in table.rows.iter_mut() {
        row.push(Some(county.to_string()));
    }
    table
}

// Rows without a precinct are wrapped text or page furniture.
fn drop_jurisdiction_rows(mut table: ReconstructedTable) -> ReconstructedTable {
    if let Some(idx) = table.column_index(PRECINCT) {
        table
            .rows
            .retain(|row| matches!(&row[idx], Some(p) if p != JURISDICTION_WIDE));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    // Empty strings stand for empty cells.
    fn grid(rows: &[&[&str]]) -> RawCellGrid {
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|s| if s.is_empty() { None } else { Some(s.to_string()) })
                    .collect()
            })
            .collect()
    }

    #[derive(Default)]
    struct FakePdf {
        regions: HashMap<(u32, RegionKind), RawCellGrid>,
    }

    impl FakePdf {
        fn page(mut self, page: u32, label: &[&[&str]], header: &[&[&str]], content: &[&[&str]]) -> Self {
            self.regions.insert((page, RegionKind::Label), grid(label));
            self.regions.insert((page, RegionKind::Header), grid(header));
            self.regions.insert((page, RegionKind::Content), grid(content));
            self
        }
    }

    impl RegionSource for FakePdf {
        fn read_region(
            &mut self,
            page: u32,
            region: RegionKind,
            _area: &Area,
        ) -> NormalizeResult<RawCellGrid> {
            self.regions
                .get(&(page, region))
                .cloned()
                .ok_or(NormalizeError::Extraction {
                    page,
                    region,
                    message: "no such region".to_string(),
                })
        }
    }

    fn config(pages: &[u32]) -> ScrapeConfig {
        let area = Area {
            left: 0.0,
            top: 0.0,
            width: 100.0,
            height: 100.0,
        };
        ScrapeConfig {
            areas: ScrapeAreas {
                label: area,
                header: area,
                content: area,
            },
            county: "Edgar".to_string(),
            pages: pages.to_vec(),
            headers: HashMap::new(),
            labels: HashMap::new(),
        }
    }

    fn strings(cells: &[Option<&str>]) -> Vec<Option<String>> {
        cells.iter().map(|c| c.map(|s| s.to_string())).collect()
    }

    #[test]
    fn percent_columns() {
        let columns = into_columns(grid(&[&["45 (52%)", "52%", "45"], &["10 (48%)", " 48% ", "10"]]));
        let columns = drop_percent_columns(columns);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0], strings(&[Some("45"), Some("10")]));
        assert_eq!(columns[1], strings(&[Some("45"), Some("10")]));
    }

    #[test]
    fn empty_columns() {
        let columns = into_columns(grid(&[&["A", "", "1"], &["B", " ", "2"], &["C"]]));
        assert_eq!(columns.len(), 3);
        let columns = drop_empty_columns(columns);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1], strings(&[Some("1"), Some("2"), None]));
    }

    #[test]
    fn multi_row_headers() {
        let header = header_labels(grid(&[
            &["Reg.", "SMITH, JOHN", "", "DOE, JANE"],
            &["Voters", "(DEM)", "%", "(REP)"],
        ]));
        assert_eq!(
            header,
            vec!["Precinct", "Reg. Voters", "SMITH, JOHN (DEM)", "DOE, JANE (REP)"]
        );

    }

    #[test]
    fn blank_header_columns_keep_their_position() {
        let header = header_labels(grid(&[&["", "SMITH (DEM)"]]));
        assert_eq!(header, vec!["Precinct", "", "SMITH (DEM)"]);

        let columns = into_columns(grid(&[&["P1", "7", "30"]]));
        let table = assign_header(1, header, columns).unwrap();
        assert_eq!(table.columns(), &["Precinct", "", "SMITH (DEM)"]);
        assert_eq!(table.column("SMITH (DEM)").unwrap(), vec![Some("30")]);
    }

    #[test]
    fn stray_columns_get_placeholder_names() {
        let columns = into_columns(grid(&[&["P1", "1", "2", "3"]]));
        let table = assign_header(1, vec!["Precinct".to_string(), "A".to_string()], columns).unwrap();
        assert_eq!(table.columns(), &["Precinct", "A", "Unnamed: 0", "Unnamed: 1"]);
    }

    #[test]
    fn missing_columns_fail() {
        let columns = into_columns(grid(&[&["P1"]]));
        let res = assign_header(3, vec!["Precinct".to_string(), "A".to_string()], columns);
        assert!(matches!(
            res,
            Err(NormalizeError::HeaderMismatch {
                page: 3,
                labels: 2,
                columns: 1
            })
        ));
    }

    #[test]
    fn single_page() {
        let mut pdf = FakePdf::default().page(
            1,
            &[&["D5", "REPRESENTATIVE"]],
            &[&["SMITH (DEM)", "%", "DOE (REP)", "%"]],
            &[
                &["Jurisdiction Wide", "30", "60%", "20", "40%"],
                &["ASHMORE 1", "10", "50%", "10", "50%"],
                &["", "", "", "", ""],
                &["ASHMORE 2", "20", "66%", "10", "33%"],
            ],
        );
        let tables = reconstruct(&mut pdf, &config(&[1])).unwrap();
        assert_eq!(tables.len(), 1);
        let table = tables.get("D5 REPRESENTATIVE").unwrap();
        assert_eq!(table.columns(), &["Precinct", "SMITH (DEM)", "DOE (REP)", "County"]);
        assert_eq!(
            table.column("Precinct").unwrap(),
            vec![Some("ASHMORE 1"), Some("ASHMORE 2")]
        );
        assert_eq!(table.column("County").unwrap(), vec![Some("Edgar"), Some("Edgar")]);
        assert_eq!(table.column("DOE (REP)").unwrap(), vec![Some("10"), Some("10")]);
    }

    #[test]
    fn pages_sharing_a_label_are_joined() {
        let mut pdf = FakePdf::default()
            .page(
                1,
                &[&["PRESIDENT"]],
                &[&["A (DEM)", "B (REP)"]],
                &[&["P1", "1", "2"], &["P2", "3", "4"]],
            )
            .page(
                2,
                &[&["PRESIDENT"]],
                &[&["A (DEM)", "B (REP)", "C (GRN)"]],
                &[&["P3", "5", "6", "7"]],
            )
            .page(3, &[&["TURN OUT"]], &[&["Reg. Voters"]], &[&["P1", "100"]]);
        let tables = reconstruct(&mut pdf, &config(&[1, 2, 3])).unwrap();
        assert_eq!(tables.iter().map(|(l, _)| l).collect::<Vec<_>>(), vec!["PRESIDENT", "TURN OUT"]);

        let table = tables.get("PRESIDENT").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.columns(),
            &["Precinct", "A (DEM)", "B (REP)", "County", "C (GRN)"]
        );
        assert_eq!(table.column("C (GRN)").unwrap(), vec![None, None, Some("7")]);
        assert_eq!(table.column("A (DEM)").unwrap(), vec![Some("1"), Some("3"), Some("5")]);
    }

    #[test]
    fn overrides() {
        let mut pdf = FakePdf::default().page(
            1,
            &[],
            &[],
            &[&["P1", "100", "40", "40%"], &["P2", "50", "10", "20%"]],
        );
        let mut cfg = config(&[1]);
        cfg.labels.insert(1, "TURN OUT".to_string());
        cfg.headers.insert(
            1,
            vec!["Reg. Voters".to_string(), "Cards Cast".to_string(), "% Turnout".to_string()],
        );
        let tables = reconstruct(&mut pdf, &cfg).unwrap();
        let table = tables.get("TURN OUT").unwrap();
        assert_eq!(table.columns(), &["Precinct", "Reg. Voters", "Cards Cast", "County"]);
    }

    #[test]
    fn empty_label_fails() {
        let mut pdf = FakePdf::default().page(1, &[&["", " "]], &[&["A"]], &[&["P1", "1"]]);
        assert!(matches!(
            reconstruct(&mut pdf, &config(&[1])),
            Err(NormalizeError::EmptyLabel { page: 1 })
        ));
    }

    #[test]
    fn duplicate_pages_fail() {
        let mut pdf = FakePdf::default().page(1, &[&["X"]], &[&["A"]], &[&["P1", "1"]]);
        assert!(matches!(
            reconstruct(&mut pdf, &config(&[1, 1])),
            Err(NormalizeError::DuplicatePage { page: 1 })
        ));
    }

    #[test]
    fn append_outer_matches_columns_by_name() {
        let mut left = ReconstructedTable::new(
            vec!["Precinct".to_string(), "B".to_string()],
            vec![strings(&[Some("P1"), Some("1")])],
        );
        let right = ReconstructedTable::new(
            vec!["Precinct".to_string(), "C".to_string(), "B".to_string()],
            vec![strings(&[Some("P2"), Some("7"), Some("2")])],
        );
        left.append_outer(right);
        assert_eq!(left.columns(), &["Precinct", "B", "C"]);
        assert_eq!(
            left.rows(),
            &[
                strings(&[Some("P1"), Some("1"), None]),
                strings(&[Some("P2"), Some("2"), Some("7")]),
            ]
        );
    }
}
