use std::collections::HashMap;
use std::fs;

use log::{debug, warn};
use results_normalizer::{Area, ScrapeAreas, ScrapeConfig};
use serde::Deserialize;
use snafu::prelude::*;

use crate::norm::*;

/// A rectangle on the page, in PDF points.
#[derive(PartialEq, Debug, Clone, Copy, Deserialize)]
pub struct AreaSettings {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct AreasSettings {
    pub label: AreaSettings,
    pub header: AreaSettings,
    pub content: AreaSettings,
}

/// The scrape configuration of one county PDF.
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct ScrapeSettings {
    pub areas: AreasSettings,
    /// The scanned document. Only informative: the cells are read from the
    /// extracted grids.
    pub pdf: Option<String>,
    /// The grid dump produced by the table extractor, relative to the
    /// configuration file.
    #[serde(rename = "extractedGrids")]
    pub extracted_grids: String,
    pub pages: Vec<u32>,
    pub county: String,
    #[serde(default)]
    pub headers: HashMap<u32, Vec<String>>,
    #[serde(default)]
    pub labels: HashMap<u32, String>,
}

impl From<AreaSettings> for Area {
    fn from(a: AreaSettings) -> Area {
        Area {
            left: a.left,
            top: a.top,
            width: a.width,
            height: a.height,
        }
    }
}

impl ScrapeSettings {
    pub fn to_scrape_config(&self) -> ScrapeConfig {
        ScrapeConfig {
            areas: ScrapeAreas {
                label: self.areas.label.into(),
                header: self.areas.header.into(),
                content: self.areas.content.into(),
            },
            county: self.county.clone(),
            pages: self.pages.clone(),
            headers: self.headers.clone(),
            labels: self.labels.clone(),
        }
    }
}

pub fn read_scrape_settings(path: &str) -> ElnormResult<ScrapeSettings> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let settings: ScrapeSettings =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!("read_scrape_settings: {:?}", settings);
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &ScrapeSettings) -> ElnormResult<()> {
    if settings.pages.is_empty() {
        whatever!("No pages listed in the scrape configuration")
    }
    if settings.county.trim().is_empty() {
        whatever!("The scrape configuration has no county")
    }
    for (name, area) in [
        ("label", &settings.areas.label),
        ("header", &settings.areas.header),
        ("content", &settings.areas.content),
    ] {
        if !(area.width > 0.0 && area.height > 0.0) {
            whatever!("The {} area has an empty size: {:?}", name, area)
        }
    }

    let mut overridden: Vec<u32> = settings
        .headers
        .keys()
        .chain(settings.labels.keys())
        .cloned()
        .collect();
    overridden.sort_unstable();
    overridden.dedup();
    for page in overridden {
        if !settings.pages.contains(&page) {
            warn!("Page {} has overrides but is not listed in the pages", page);
        }
    }
    Ok(())
}
