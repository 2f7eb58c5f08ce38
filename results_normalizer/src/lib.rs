mod config;
pub mod aggregate;
pub mod manual;
pub mod normalize;
pub mod reconstruct;
pub mod vocabulary;

use log::info;

pub use crate::aggregate::{Aggregator, ContestRow};
pub use crate::config::*;
pub use crate::normalize::{CountyTotalsRecord, PrecinctContestRecord};
pub use crate::reconstruct::{ContestTables, ReconstructedTable, RegionSource};

/// Rebuilds the contest tables of one PDF and normalizes them.
///
/// Arguments:
/// * `source` gives access to the extracted regions of the pages
/// * `config` the pages, regions and overrides of this document
pub fn normalize_pdf<S: RegionSource + ?Sized>(
    source: &mut S,
    config: &ScrapeConfig,
) -> NormalizeResult<Vec<NormalizedRow>> {
    info!(
        "Processing {} pages for county {:?}",
        config.pages.len(),
        config.county
    );
    let tables = reconstruct::reconstruct(source, config)?;
    info!("Found {} contests", tables.len());
    normalize::normalize_tables(&tables)
}
