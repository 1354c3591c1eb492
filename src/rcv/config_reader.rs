use crate::rcv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_juridiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
    /// Relative to the directory of the configuration file.
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

impl OutputSettings {
    /// Settings for a ballot file given without configuration.
    pub fn for_file(path: &str) -> OutputSettings {
        OutputSettings {
            contest_name: io_common::simplify_file_name(path),
            contest_date: None,
            contest_juridiction: None,
            contest_office: None,
            output_path: None,
        }
    }
}

/// The `config` block of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub seed: String,
}

impl OutputConfig {
    pub fn new(settings: &OutputSettings, seed: u64) -> OutputConfig {
        OutputConfig {
            contest: settings.contest_name.clone(),
            date: settings.contest_date.clone(),
            jurisdiction: settings.contest_juridiction.clone(),
            office: settings.contest_office.clone(),
            seed: seed.to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotSource {
    /// csv or json
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "idColumnIndex")]
    pub id_column_index: Option<JSValue>,
}

impl BallotSource {
    /// A source with the default layout: no header, no id column, votes from the first column.
    pub fn for_file(path: &str, provider: &str) -> BallotSource {
        BallotSource {
            provider: provider.to_string(),
            file_path: path.to_string(),
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            id_column_index: None,
        }
    }

    /// Zero-based. The configuration counts columns from 1.
    pub fn first_vote_column_index(&self) -> RcvResult<usize> {
        one_based(&self._first_vote_column_index)
    }

    /// Zero-based. The configuration counts rows from 1.
    pub fn first_vote_row_index(&self) -> RcvResult<usize> {
        one_based(&self._first_vote_row_index)
    }

    /// Zero-based, if the ballots have an id column.
    pub fn id_column_index_int(&self) -> RcvResult<Option<usize>> {
        if self.id_column_index.is_some() {
            one_based(&self.id_column_index).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvCandidate {
    pub id: String,
    /// Defaults to the id.
    pub name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RcvRules {
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<JSValue>,
    #[serde(rename = "rulesDescription")]
    pub rules_description: Option<String>,
}

impl RcvRules {
    /// The seed of the random tiebreak, 0 if not set.
    pub fn random_seed(&self) -> RcvResult<u64> {
        if self.random_seed.is_some() {
            read_js_int(&self.random_seed)
        } else {
            Ok(0)
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "ballotSources", default)]
    pub ballot_sources: Vec<BallotSource>,
    pub candidates: Vec<RcvCandidate>,
    #[serde(default)]
    pub rules: RcvRules,
}

pub fn read_config(path: String) -> RcvResult<RcvConfig> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let config: RcvConfig = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: String) -> RcvResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn one_based(x: &Option<JSValue>) -> RcvResult<usize> {
    if x.is_none() {
        return Ok(0);
    }
    let idx = read_js_int(x)? as usize;
    idx.checked_sub(1).context(ParsingJsonNumberSnafu {})
}

fn read_js_int(x: &Option<JSValue>) -> RcvResult<u64> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64().context(ParsingJsonNumberSnafu {}),
        // Excel-style column names, single letter only.
        Some(JSValue::String(s)) if s.len() == 1 && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            let c1 = s.to_ascii_lowercase().chars().next().context(ParsingJsonNumberSnafu {})?;
            Ok((c1 as u64) - ('a' as u64) + 1)
        }
        Some(JSValue::String(s)) => s.trim().parse::<u64>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seeds() {
        let mut rules = RcvRules::default();
        assert_eq!(rules.random_seed().unwrap(), 0);
        rules.random_seed = Some(json!("1234"));
        assert_eq!(rules.random_seed().unwrap(), 1234);
        rules.random_seed = Some(json!(99));
        assert_eq!(rules.random_seed().unwrap(), 99);
        rules.random_seed = Some(json!(-3));
        assert!(rules.random_seed().is_err());
        rules.random_seed = Some(json!("seed"));
        assert!(rules.random_seed().is_err());
    }

    #[test]
    fn column_indices() {
        let js = json!({
            "provider": "csv",
            "filePath": "ballots.csv",
            "firstVoteColumnIndex": "C",
            "firstVoteRowIndex": 2,
            "idColumnIndex": "1",
        });
        let source: BallotSource = serde_json::from_value(js).unwrap();
        assert_eq!(source.first_vote_column_index().unwrap(), 2);
        assert_eq!(source.first_vote_row_index().unwrap(), 1);
        assert_eq!(source.id_column_index_int().unwrap(), Some(0));

        let default = BallotSource::for_file("ballots.csv", "csv");
        assert_eq!(default.first_vote_column_index().unwrap(), 0);
        assert_eq!(default.first_vote_row_index().unwrap(), 0);
        assert_eq!(default.id_column_index_int().unwrap(), None);
    }

    #[test]
    fn zero_index_is_rejected() {
        let js = json!({"provider": "csv", "filePath": "b.csv", "firstVoteColumnIndex": 0});
        let source: BallotSource = serde_json::from_value(js).unwrap();
        assert!(source.first_vote_column_index().is_err());
    }

    #[test]
    fn minimal_config() {
        let js = json!({
            "outputSettings": {"contestName": "Mayor"},
            "candidates": [{"id": "a"}, {"id": "b", "name": "Bea"}],
        });
        let config: RcvConfig = serde_json::from_value(js).unwrap();
        assert!(config.ballot_sources.is_empty());
        assert_eq!(config.rules.random_seed().unwrap(), 0);
        assert_eq!(config.candidates[1].name.as_deref(), Some("Bea"));
        let out = OutputConfig::new(&config.output_settings, 12);
        assert_eq!(out.contest, "Mayor");
        assert_eq!(out.seed, "12");
    }
}
