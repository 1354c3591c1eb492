use clap::Parser;

/// This is an instant-runoff election resolution program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the election: candidates, rules and ballot files.
    /// See the manual of runoff_engine for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, runoff will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified in the --config file.
    /// An empty value writes nothing, which is useful with --reference.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A file of ballots. Setting this option overrides the ballot sources of the --config file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or json.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (repeated, or not specified) The candidate identifiers, in reference order. Required when
    /// no --config file is given.
    #[clap(long = "candidate", value_parser)]
    pub candidates: Option<Vec<String>>,

    /// (integer) The seed of the random tiebreak. Overrides the randomSeed rule of the --config file.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
