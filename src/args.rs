use clap::Parser;

/// Adds the categories and the summary blocks to exported survey results.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file paths) The exported survey results, in the xlsx format. When both a Leader and a Team
    /// export are given, a comparison of the two is produced as well.
    #[clap(value_parser, required = true)]
    pub inputs: Vec<String>,

    /// (directory, default '.') Where the processed file (or the zip archive of all the processed files)
    /// is written.
    #[clap(short, long, value_parser, default_value = ".")]
    pub out: String,

    /// (file path, optional) A JSON file with the styles and the output names. All the fields are optional.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// If passed as an argument, the files that cannot be processed are reported and skipped
    /// instead of stopping the whole batch.
    #[clap(long, takes_value = false)]
    pub keep_going: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
