use clap::Parser;

/// This program normalizes precinct election results into a single CSV file.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (pdf or flat, default flat) The type of the input. 'pdf' reads the cells extracted from a scanned
    /// county document, as described by a scrape configuration. 'flat' reads the state board exports.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path) The scrape configuration of a county document, in JSON format. Required with --input-type pdf.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory path) The directory containing the state exports. All the files in this directory and its
    /// sub-directories are read. Required with --input-type flat.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the normalized results. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected normalized results. If provided, elnorm will
    /// check that the output matches the reference and fail otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
