// Primitives for reading CSV files.

use std::fs::File;

use crate::rcv::{io_common::make_default_id, *};

/// Reads one ballot per line. Blank cells at the end of a line are dropped.
pub fn read_csv_ranking(path: String, cfs: &BallotSource) -> RcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(&path);

    let id_idx_o = cfs.id_column_index_int()?;
    let choices_start_col = cfs.first_vote_column_index()?;

    let mut res: Vec<ParsedBallot> = Vec::new();
    let (records, row_offset) = get_records(&path, cfs)?;

    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset + 1;
        let line = line_r.context(CsvLineParseSnafu {})?;
        let id = if let Some(id_idx) = id_idx_o {
            line.get(id_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim()
                .to_string()
        } else {
            default_id(lineno)
        };

        if line.len() <= choices_start_col {
            return CsvLineTooShortSnafu { lineno }.fail();
        }
        let mut choices: Vec<String> = line
            .iter()
            .skip(choices_start_col)
            .map(|s| s.trim().to_string())
            .collect();
        while choices.last().map(|s| s.is_empty()).unwrap_or(false) {
            choices.pop();
        }
        debug!("read_csv_ranking: lineno: {:?} row: {:?}", lineno, &choices);

        res.push(ParsedBallot { id, choices });
    }
    info!("read_csv_ranking: {} ballots read from {:?}", res.len(), path);
    Ok(res)
}

fn get_records(path: &str, cfs: &BallotSource) -> RcvResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_vote_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    for _ in 0..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn council_source() -> BallotSource {
        let path = format!(
            "{}/data/student_council/student_council_config.json",
            env!("CARGO_MANIFEST_DIR")
        );
        read_config(path).unwrap().ballot_sources[0].clone()
    }

    #[test]
    fn header_and_id_column() {
        let path = format!(
            "{}/data/student_council/student_council_ballots.csv",
            env!("CARGO_MANIFEST_DIR")
        );
        let ballots = read_csv_ranking(path, &council_source()).unwrap();
        assert_eq!(ballots.len(), 9);
        assert_eq!(
            ballots[0],
            ParsedBallot {
                id: "v01".to_string(),
                choices: vec!["anna", "clara", "bob", "dan"]
                    .into_iter()
                    .map(|s| s.to_string())
                    .collect(),
            }
        );
        assert_eq!(ballots[8].id, "v09");
    }

    #[test]
    fn trailing_blanks_and_default_ids() {
        let path = format!(
            "{}/data/partial/partial_ballots.csv",
            env!("CARGO_MANIFEST_DIR")
        );
        let ballots = read_csv_ranking(path.clone(), &BallotSource::for_file(&path, "csv")).unwrap();
        assert_eq!(ballots.len(), 3);
        assert_eq!(ballots[0].choices, vec!["x", "y", "z"]);
        assert_eq!(ballots[1].choices, vec!["y", "z"]);
        assert_eq!(ballots[2].choices, vec!["z", "", "x"]);
        assert_eq!(ballots[1].id, "partial_ballots.csv-00000002");
    }

    #[test]
    fn missing_file() {
        let r = read_csv_ranking(
            "/nonexistent/ballots.csv".to_string(),
            &BallotSource::for_file("/nonexistent/ballots.csv", "csv"),
        );
        assert!(matches!(r, Err(RcvError::CsvOpen { .. })));
    }
}
