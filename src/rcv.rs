use log::{debug, info, warn};

use runoff_engine::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rcv::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;

#[derive(Debug, Snafu)]
pub enum RcvError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a non-negative integer"))]
    ParsingJsonNumber {},
    #[snafu(display("Cannot find the directory of the configuration file"))]
    MissingParentDir {},
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Candidates {first} and {second} share the name {name:?}"))]
    DuplicateCandidateName {
        name: String,
        first: String,
        second: String,
    },

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },

    #[snafu(display("Ballot {ballot_id} is invalid"))]
    InvalidBallot {
        source: ResolveError,
        ballot_id: String,
    },
    #[snafu(display("The election could not be resolved"))]
    Resolution { source: ResolveError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RcvResult<T> = Result<T, RcvError>;

/// A ballot, as read from a ballot file.
/// This is before checking it against the registered candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub id: String,
    pub choices: Vec<String>,
}

/// A candidate as seen by the engine: compared by identifier, displayed by name.
#[derive(Debug, Clone)]
pub struct CandidateLabel {
    pub id: String,
    pub name: String,
}

impl PartialEq for CandidateLabel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CandidateLabel {}

impl Hash for CandidateLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for CandidateLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Everything needed to resolve one election.
#[derive(Debug, Clone)]
pub struct ElectionInput {
    pub output: OutputConfig,
    pub candidates: Vec<CandidateLabel>,
    pub ballots: Vec<ParsedBallot>,
    pub seed: u64,
    /// Where to write the summary when the command line does not say.
    pub output_path: Option<String>,
}

/// The summary is keyed by names, so two candidates cannot share one.
fn candidate_labels(candidates: &[RcvCandidate]) -> RcvResult<Vec<CandidateLabel>> {
    let labels: Vec<CandidateLabel> = candidates
        .iter()
        .map(|c| CandidateLabel {
            id: c.id.clone(),
            name: match c.name.clone() {
                Some(x) if !x.is_empty() => x,
                _ => c.id.clone(),
            },
        })
        .collect();
    let mut names: HashMap<&str, &str> = HashMap::new();
    for l in labels.iter() {
        if let Some(first) = names.insert(l.name.as_str(), l.id.as_str()) {
            return DuplicateCandidateNameSnafu {
                name: l.name.as_str(),
                first,
                second: l.id.as_str(),
            }
            .fail();
        }
    }
    Ok(labels)
}

fn read_ballot_source(root_path: &Path, source: &BallotSource) -> RcvResult<Vec<ParsedBallot>> {
    let p: PathBuf = root_path.join(&source.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read ballot file {:?}", p2);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_ranking(p2, source),
        "json" => io_json::read_json_ranking(p2),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn read_input_file(path: &str, input_type: Option<&str>) -> RcvResult<Vec<ParsedBallot>> {
    match input_type.unwrap_or("csv") {
        "csv" => io_csv::read_csv_ranking(path.to_string(), &BallotSource::for_file(path, "csv")),
        "json" => io_json::read_json_ranking(path.to_string()),
        x => whatever!("Input type not implemented {:?}", x),
    }
}

/// Gathers the candidates, ballots and rules from the configuration file and
/// the command line. The command line takes precedence.
pub fn load_election(args: &Args) -> RcvResult<ElectionInput> {
    if let Some(config_path) = args.config.clone() {
        let config = read_config(config_path.clone())?;
        debug!("config: {:?}", config);
        let root_p = Path::new(config_path.as_str())
            .parent()
            .context(MissingParentDirSnafu {})?;

        let ballots = if let Some(input) = args.input.as_deref() {
            read_input_file(input, args.input_type.as_deref())?
        } else {
            if config.ballot_sources.is_empty() {
                whatever!("No ballot source in {} and no --input file", config_path);
            }
            let mut data: Vec<ParsedBallot> = Vec::new();
            for source in config.ballot_sources.iter() {
                let mut file_data = read_ballot_source(root_p, source)?;
                data.append(&mut file_data);
            }
            data
        };

        let seed = match args.seed {
            Some(s) => s,
            None => config.rules.random_seed()?,
        };
        let output_path = config
            .output_settings
            .output_path
            .clone()
            .map(|p| root_p.join(p).display().to_string());
        Ok(ElectionInput {
            output: OutputConfig::new(&config.output_settings, seed),
            candidates: candidate_labels(&config.candidates)?,
            ballots,
            seed,
            output_path,
        })
    } else {
        let input = match args.input.as_deref() {
            Some(x) => x,
            None => whatever!("Either --config or --input must be provided"),
        };
        let candidate_ids = match args.candidates.clone() {
            Some(x) if !x.is_empty() => x,
            _ => whatever!("The candidates must be listed with --candidate when no --config is given"),
        };
        let candidates: Vec<RcvCandidate> = candidate_ids
            .into_iter()
            .map(|id| RcvCandidate { id, name: None })
            .collect();
        let seed = args.seed.unwrap_or(0);
        let settings = OutputSettings::for_file(input);
        Ok(ElectionInput {
            output: OutputConfig::new(&settings, seed),
            candidates: candidate_labels(&candidates)?,
            ballots: read_input_file(input, args.input_type.as_deref())?,
            seed,
            output_path: None,
        })
    }
}

/// Maps the choices of every ballot to the registered candidates. Unknown
/// identifiers are kept as they are and rejected by the engine.
fn label_ballots(input: &ElectionInput) -> Vec<Vec<CandidateLabel>> {
    let by_id: HashMap<&str, &CandidateLabel> = input
        .candidates
        .iter()
        .map(|c| (c.id.as_str(), c))
        .collect();
    input
        .ballots
        .iter()
        .map(|pb| {
            pb.choices
                .iter()
                .map(|choice| match by_id.get(choice.as_str()) {
                    Some(c) => (*c).clone(),
                    None => CandidateLabel {
                        id: choice.clone(),
                        name: choice.clone(),
                    },
                })
                .collect()
        })
        .collect()
}

/// Resolves the election described by the input.
pub fn tabulate(input: &ElectionInput) -> RcvResult<ElectionResult<CandidateLabel>> {
    let ballots = label_ballots(input);
    let mut rng = TieRng::from_seed_u64(input.seed);
    let res = resolve_election(&input.candidates, &ballots, &mut rng);
    debug!(
        "tabulate: {} random words drawn with seed {}",
        rng.words_consumed(),
        input.seed
    );
    match res {
        Ok(result) => Ok(result),
        Err(e) => {
            if let ResolveError::InvalidBallot { ballot, .. } = e {
                let ballot_id = input
                    .ballots
                    .get(ballot)
                    .map(|pb| pb.id.clone())
                    .unwrap_or_default();
                return Err(e).context(InvalidBallotSnafu { ballot_id });
            }
            Err(e).context(ResolutionSnafu {})
        }
    }
}

fn tally_to_json(tally: &[(String, u64)]) -> JSValue {
    let mut votes: JSMap<String, JSValue> = JSMap::new();
    for (name, count) in tally {
        votes.insert(name.clone(), json!(count));
    }
    JSValue::Object(votes)
}

fn result_stats_to_json(rs: &ElectionResult<String>) -> (Vec<JSValue>, Vec<JSValue>) {
    let mut summaries: Vec<JSValue> = Vec::new();
    let mut deep_log: Vec<JSValue> = Vec::new();
    for round_stat in rs.rounds.iter() {
        let winner: JSValue = match &round_stat.outcome {
            RoundOutcome::Elected(name) => json!(name),
            RoundOutcome::Draw => json!("draw"),
            RoundOutcome::Eliminated(_) => JSValue::Null,
        };
        let mut data = json!({
            "totalVotes": round_stat.total_votes,
            "quota": round_stat.quota,
            "votes": tally_to_json(&round_stat.tally),
            "winner": winner,
            "eliminated": round_stat.eliminated(),
            "tiebreakerDepth": round_stat.tiebreak_depth().level(),
        });
        if let Some(tb) = &round_stat.tiebreak {
            data["tiebreaker"] = json!({
                "tied": tb.tied,
                "votes": tally_to_json(&tb.secondary_tally),
                "drawnFrom": tb.finalists,
            });
        }
        summaries.push(json!({"round": round_stat.round, "roundSummaryData": data}));
        deep_log.push(json!({"round": round_stat.round, "roundLog": round_stat.log}));
    }
    (summaries, deep_log)
}

/// The JSON summary of an election, keyed by candidate names.
pub fn build_summary_js(output: &OutputConfig, result: &ElectionResult<CandidateLabel>) -> JSValue {
    let named = result.map_candidates(|c| c.name.clone());
    let (summaries, deep_log) = result_stats_to_json(&named);
    let audit = json!({"roundSummaries": summaries, "deepLog": deep_log});
    let digest = sha256::digest(audit.to_string());
    json!({
        "config": output,
        "overallWinner": named.winner(),
        "overallDraw": named.is_draw(),
        "roundSummaries": audit["roundSummaries"],
        "deepLog": audit["deepLog"],
        "auditDigest": digest,
    })
}

fn write_summary(destination: &str, pretty_js: &str) -> RcvResult<()> {
    if destination == "stdout" {
        println!("{}", pretty_js);
    } else {
        info!("Writing summary to {:?}", destination);
        fs::write(destination, pretty_js).context(WritingSummarySnafu {
            path: destination.to_string(),
        })?;
    }
    Ok(())
}

fn check_reference(reference_path: String, pretty_js_stats: &str) -> RcvResult<()> {
    let summary_ref = read_summary(reference_path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("The summary matches the reference");
    Ok(())
}

pub fn run_election(args: &Args) -> RcvResult<()> {
    let input = load_election(args)?;
    info!(
        "Election {:?}: {} candidates, {} ballots, seed {}",
        input.output.contest,
        input.candidates.len(),
        input.ballots.len(),
        input.seed
    );

    let result = tabulate(&input)?;
    match result.winner() {
        Some(w) => info!("Winner: {}", w),
        None => info!("The election is a draw"),
    }

    let summary_js = build_summary_js(&input.output, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    let destination = args
        .out
        .clone()
        .or_else(|| input.output_path.clone())
        .unwrap_or_else(|| "stdout".to_string());
    if destination.is_empty() {
        info!("No output requested, the summary is not written");
    } else {
        write_summary(destination.as_str(), pretty_js_stats.as_str())?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = args.reference.clone() {
        check_reference(reference_path, pretty_js_stats.as_str())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_path(lpath: &str) -> String {
        format!("{}/data/{}", env!("CARGO_MANIFEST_DIR"), lpath)
    }

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("runoff-{}-{}.json", name, std::process::id()))
            .display()
            .to_string()
    }

    fn args_for_config(config: &str) -> Args {
        Args {
            config: Some(data_path(config)),
            reference: None,
            out: None,
            input: None,
            input_type: None,
            candidates: None,
            seed: None,
            verbose: false,
        }
    }

    #[test]
    fn student_council() {
        let input = load_election(&args_for_config("student_council/student_council_config.json"))
            .unwrap();
        assert_eq!(input.candidates.len(), 4);
        assert_eq!(input.ballots.len(), 9);
        assert_eq!(input.seed, 2021);

        let result = tabulate(&input).unwrap();
        assert_eq!(result.winner().map(|c| c.id.as_str()), Some("anna"));
        assert_eq!(result.rounds.len(), 2);

        let js = build_summary_js(&input.output, &result);
        assert_eq!(js["overallWinner"], json!("Anna Smith"));
        assert_eq!(js["overallDraw"], json!(false));
        assert_eq!(js["config"]["contest"], json!("Student Council President"));
        let round0 = &js["roundSummaries"][0]["roundSummaryData"];
        assert_eq!(round0["totalVotes"], json!(9));
        assert_eq!(round0["quota"], json!(5));
        assert_eq!(round0["winner"], JSValue::Null);
        assert_eq!(round0["eliminated"], json!("Bob Jones"));
        assert_eq!(round0["tiebreakerDepth"], json!(1));
        assert_eq!(
            round0["tiebreaker"]["votes"],
            json!({"Bob Jones": 1, "Clara Wu": 6})
        );
        let names: Vec<&String> = round0["votes"].as_object().unwrap().keys().collect();
        assert_eq!(names, vec!["Anna Smith", "Bob Jones", "Clara Wu", "Dan Ortiz"]);
        let round1 = &js["roundSummaries"][1]["roundSummaryData"];
        assert_eq!(round1["winner"], json!("Anna Smith"));
        assert_eq!(round1["votes"]["Anna Smith"], json!(5));
        assert_eq!(
            js["deepLog"][1]["roundLog"].as_array().unwrap().last(),
            Some(&json!("Anna Smith achieves quota and is duly elected."))
        );
        assert_eq!(js["auditDigest"].as_str().map(|s| s.len()), Some(64));
    }

    #[test]
    fn random_board_is_reproducible() {
        let args = args_for_config("tied_board/tied_board_config.json");
        let input = load_election(&args).unwrap();
        let first = build_summary_js(&input.output, &tabulate(&input).unwrap());
        let second = build_summary_js(&input.output, &tabulate(&input).unwrap());
        assert_eq!(first, second);
        assert_eq!(
            first["roundSummaries"][0]["roundSummaryData"]["tiebreakerDepth"],
            json!(2)
        );
        assert_eq!(first["overallWinner"], json!("Xavier"));
    }

    #[test]
    fn seed_from_the_command_line_wins() {
        let mut args = args_for_config("tied_board/tied_board_config.json");
        args.seed = Some(77);
        let input = load_election(&args).unwrap();
        assert_eq!(input.seed, 77);
        assert_eq!(input.output.seed, "77");
    }

    #[test]
    fn input_without_config() {
        let args = Args {
            config: None,
            reference: None,
            out: None,
            input: Some(data_path("tied_board/tied_board_ballots.json")),
            input_type: Some("json".to_string()),
            candidates: Some(vec!["x".to_string(), "y".to_string(), "z".to_string()]),
            seed: Some(5),
            verbose: false,
        };
        let input = load_election(&args).unwrap();
        assert_eq!(input.output.contest, "tied_board_ballots.json");
        assert_eq!(input.candidates[0].name, "x");
        let result = tabulate(&input).unwrap();
        assert_eq!(result.winner().map(|c| c.name.as_str()), Some("x"));
    }

    #[test]
    fn missing_candidates_without_config() {
        let args = Args {
            config: None,
            reference: None,
            out: None,
            input: Some(data_path("tied_board/tied_board_ballots.json")),
            input_type: Some("json".to_string()),
            candidates: None,
            seed: None,
            verbose: false,
        };
        assert!(load_election(&args).is_err());
    }

    #[test]
    fn invalid_ballot_names_the_ballot() {
        let mut input = load_election(&args_for_config("student_council/student_council_config.json"))
            .unwrap();
        input.ballots[3].choices.pop();
        let err = tabulate(&input).unwrap_err();
        match err {
            RcvError::InvalidBallot { ballot_id, source } => {
                assert_eq!(ballot_id, "v04");
                assert_eq!(
                    source,
                    ResolveError::InvalidBallot {
                        ballot: 3,
                        defect: BallotDefect::WrongLength {
                            expected: 4,
                            found: 3
                        }
                    }
                );
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn unknown_candidate_is_rejected() {
        let mut input = load_election(&args_for_config("student_council/student_council_config.json"))
            .unwrap();
        input.ballots[0].choices[2] = "eve".to_string();
        assert!(matches!(
            tabulate(&input),
            Err(RcvError::InvalidBallot { .. })
        ));
    }

    #[test]
    fn shared_display_names_are_rejected() {
        let candidates = vec![
            RcvCandidate {
                id: "a1".to_string(),
                name: Some("Alex".to_string()),
            },
            RcvCandidate {
                id: "b".to_string(),
                name: None,
            },
            RcvCandidate {
                id: "a2".to_string(),
                name: Some("Alex".to_string()),
            },
        ];
        match candidate_labels(&candidates) {
            Err(RcvError::DuplicateCandidateName {
                name,
                first,
                second,
            }) => {
                assert_eq!(name, "Alex");
                assert_eq!(first, "a1");
                assert_eq!(second, "a2");
            }
            x => panic!("unexpected result {:?}", x),
        }

        // A name may repeat an id as long as no other name does.
        let candidates = vec![
            RcvCandidate {
                id: "a".to_string(),
                name: Some("b2".to_string()),
            },
            RcvCandidate {
                id: "b2".to_string(),
                name: Some("Bea".to_string()),
            },
        ];
        assert_eq!(candidate_labels(&candidates).unwrap().len(), 2);
    }

    #[test]
    fn empty_out_only_checks_the_reference() {
        let out = temp_path("council-for-empty-out");
        let mut args = args_for_config("student_council/student_council_config.json");
        args.out = Some(out.clone());
        run_election(&args).unwrap();

        let mut check = args_for_config("student_council/student_council_config.json");
        check.out = Some(String::new());
        check.reference = Some(out);
        run_election(&check).unwrap();
    }

    #[test]
    fn reference_comparison() {
        let out = temp_path("council-summary");
        let mut args = args_for_config("student_council/student_council_config.json");
        args.out = Some(out.clone());
        run_election(&args).unwrap();

        // Same election, compared with the summary just written.
        let mut check = args_for_config("student_council/student_council_config.json");
        check.out = Some(temp_path("council-check"));
        check.reference = Some(out.clone());
        run_election(&check).unwrap();

        let mut js: JSValue = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        js["config"]["contest"] = json!("Another contest");
        let altered = temp_path("council-altered");
        fs::write(&altered, js.to_string()).unwrap();
        check.reference = Some(altered);
        assert!(run_election(&check).is_err());
    }
}
