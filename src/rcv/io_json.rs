// Ballots as a JSON array of rankings: [["anna", "bob"], ["bob", "anna"]]

use crate::rcv::{io_common::make_default_id, *};

pub fn read_json_ranking(path: String) -> RcvResult<Vec<ParsedBallot>> {
    let default_id = make_default_id(&path);
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path: path.clone() })?;
    let rankings: Vec<Vec<String>> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    info!("read_json_ranking: {} ballots read from {:?}", rankings.len(), path);
    Ok(rankings
        .into_iter()
        .enumerate()
        .map(|(idx, choices)| ParsedBallot {
            id: default_id(idx + 1),
            choices,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_ballots() {
        let path = format!(
            "{}/data/tied_board/tied_board_ballots.json",
            env!("CARGO_MANIFEST_DIR")
        );
        let ballots = read_json_ranking(path).unwrap();
        assert_eq!(ballots.len(), 4);
        assert_eq!(ballots[2].choices, vec!["y", "x", "z"]);
        assert_eq!(ballots[0].id, "tied_board_ballots.json-00000001");
    }

    #[test]
    fn not_a_list_of_rankings() {
        let path = format!(
            "{}/data/tied_board/tied_board_config.json",
            env!("CARGO_MANIFEST_DIR")
        );
        assert!(matches!(
            read_json_ranking(path),
            Err(RcvError::ParsingJson { .. })
        ));
    }
}
