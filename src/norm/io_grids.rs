// Reads the cells extracted from the PDF pages by the table extraction tool.

use std::collections::HashMap;
use std::fs;

use log::debug;

use results_normalizer::{Area, NormalizeError, NormalizeResult, RawCellGrid, RegionKind, RegionSource};
use serde::Deserialize;
use snafu::prelude::*;

use crate::norm::*;

#[derive(Debug, Clone, Deserialize)]
struct GridDump {
    pages: Vec<PageGrids>,
}

#[derive(Debug, Clone, Deserialize)]
struct PageGrids {
    page: u32,
    #[serde(default)]
    label: RawCellGrid,
    #[serde(default)]
    header: RawCellGrid,
    #[serde(default)]
    content: RawCellGrid,
}

/// A grid dump, serving the regions of each page it contains.
///
/// Regions absent from the dump are served as empty grids. Pages absent from
/// the dump are an extraction error.
#[derive(Debug, Clone)]
pub struct GridDumpSource {
    pages: HashMap<u32, PageGrids>,
}

impl GridDumpSource {
    pub fn read(path: &str) -> ElnormResult<GridDumpSource> {
        let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
        GridDumpSource::parse(&contents, path)
    }

    pub fn parse(contents: &str, path: &str) -> ElnormResult<GridDumpSource> {
        let dump: GridDump = serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
        let mut pages: HashMap<u32, PageGrids> = HashMap::new();
        for p in dump.pages {
            let page = p.page;
            if pages.insert(page, p).is_some() {
                whatever!("{}: page {} is present more than once", path, page)
            }
        }
        debug!("GridDumpSource::parse: {}: {} pages", path, pages.len());
        Ok(GridDumpSource { pages })
    }
}

impl RegionSource for GridDumpSource {
    fn read_region(
        &mut self,
        page: u32,
        region: RegionKind,
        area: &Area,
    ) -> NormalizeResult<RawCellGrid> {
        let grids = self.pages.get(&page).ok_or(NormalizeError::Extraction {
            page,
            region,
            message: "the page is missing from the extracted grids".to_string(),
        })?;
        debug!("read_region: page {} {} {:?}", page, region, area.bounds());
        let grid = match region {
            RegionKind::Label => &grids.label,
            RegionKind::Header => &grids.header,
            RegionKind::Content => &grids.content,
        };
        Ok(grid.clone())
    }
}
