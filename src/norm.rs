use log::{debug, info, warn};

use results_normalizer::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use text_diff::print_diff;

use crate::args::Args;
use crate::norm::config_reader::*;
use crate::norm::io_common::*;
use crate::norm::io_csv::*;
use crate::norm::io_grids::GridDumpSource;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_grids;

#[derive(Debug, Snafu)]
pub enum ElnormError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error reading CSV file {path}"))]
    ReadingCsv { source: csv::Error, path: String },
    #[snafu(display("{path}: unrecognized header {header:?}"))]
    UnknownVintage { path: String, header: Vec<String> },
    #[snafu(display("Error writing the output"))]
    WritingCsv { source: csv::Error },
    #[snafu(display("Error writing the output to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The output is not valid UTF-8"))]
    OutputEncoding { source: std::string::FromUtf8Error },
    #[snafu(display("Error normalizing {path}"))]
    Normalizing {
        source: NormalizeError,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ElnormResult<T> = Result<T, ElnormError>;

/// Reads the PDF extraction described by a scrape configuration file.
pub fn read_pdf_results(config_path: &str) -> ElnormResult<Vec<NormalizedRow>> {
    let settings = read_scrape_settings(config_path)?;
    let root_p = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu {})?;
    let grids_path = resolve_path(root_p, &settings.extracted_grids);
    info!(
        "Attempting to read extracted grids {:?} (document: {:?})",
        grids_path, settings.pdf
    );
    let mut source = GridDumpSource::read(&grids_path)?;
    normalize_scrape(&settings, &mut source).context(NormalizingSnafu { path: grids_path })
}

fn normalize_scrape<S: RegionSource>(
    settings: &ScrapeSettings,
    source: &mut S,
) -> Result<Vec<NormalizedRow>, NormalizeError> {
    let config = settings.to_scrape_config();
    let rows = normalize_pdf(source, &config)?;
    let mut agg = Aggregator::new();
    agg.add_rows(rows);
    agg.finish()
}

/// Reads all the state exports found under a directory.
pub fn read_flat_results(input_dir: &str) -> ElnormResult<Vec<NormalizedRow>> {
    let files = list_files(Path::new(input_dir))?;
    if files.is_empty() {
        whatever!("No input files found in {}", input_dir)
    }

    let mut agg = Aggregator::new();
    for file in files {
        let path = file.display().to_string();
        info!("Attempting to read export file {:?}", path);
        match read_flat_file(&path)? {
            FlatRecords::PrecinctContests(records) => {
                debug!("{}: {} precinct result records", simplify_file_name(&path), records.len());
                let rows = records
                    .into_iter()
                    .map(normalize::contest_row_from_record)
                    .collect::<Result<Vec<ContestRow>, _>>()
                    .context(NormalizingSnafu { path: path.clone() })?;
                agg.add_contest_rows(rows);
            }
            FlatRecords::CountyTotals(records) => {
                debug!("{}: {} county total records", simplify_file_name(&path), records.len());
                let rows = records
                    .iter()
                    .map(normalize::normalize_county_totals)
                    .collect::<Result<Vec<NormalizedRow>, _>>()
                    .context(NormalizingSnafu { path: path.clone() })?;
                agg.add_rows(rows);
            }
        }
    }
    agg.finish().context(NormalizingSnafu { path: input_dir })
}

/// Fails with a diff if the produced output differs from the reference.
fn check_reference(reference: &str, produced: &str) -> ElnormResult<()> {
    if reference != produced {
        warn!("Found differences with the reference output");
        print_diff(reference, produced, "\n");
        whatever!("Difference detected between the normalized output and the reference output")
    }
    Ok(())
}

pub fn run_normalization(args: &Args) -> ElnormResult<()> {
    let rows = match args.input_type.as_deref().unwrap_or("flat") {
        "pdf" => match args.config.as_deref() {
            Some(config_path) => read_pdf_results(config_path)?,
            None => whatever!("The pdf input requires a scrape configuration (--config)"),
        },
        "flat" => match args.input.as_deref() {
            Some(input_dir) => read_flat_results(input_dir)?,
            None => whatever!("The flat input requires an input directory (--input)"),
        },
        x => whatever!("Input type not implemented {:?}", x),
    };
    info!("Writing {} normalized rows", rows.len());

    let mut buffer: Vec<u8> = Vec::new();
    write_rows(&mut buffer, &rows)?;
    let produced = String::from_utf8(buffer).context(OutputEncodingSnafu {})?;

    match args.out.as_deref() {
        None | Some("stdout") => print!("{}", produced),
        Some(out_path) => {
            fs::write(out_path, produced.as_bytes()).context(WritingOutputSnafu { path: out_path })?;
            info!("Wrote normalized results to {}", out_path);
        }
    }

    // The reference output, if provided for comparison
    if let Some(reference_path) = args.reference.as_deref() {
        let reference =
            fs::read_to_string(reference_path).context(OpeningFileSnafu { path: reference_path })?;
        check_reference(&reference, &produced)?;
        info!("The output matches the reference {}", reference_path);
    }
    Ok(())
}
