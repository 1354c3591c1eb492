use log::debug;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::rng::RandomSource;
use crate::{CandidateId, Ranking, TiebreakDepth, VoteCount};

/// The resolution of a tie for last place.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct TiebreakResolution {
    pub(crate) eliminated: CandidateId,
    pub(crate) depth: TiebreakDepth,
    pub(crate) tied: Vec<CandidateId>,
    /// Tiebreak votes of the tied candidates, in candidate order.
    pub(crate) secondary_tally: Vec<(CandidateId, VoteCount)>,
    /// The candidates of the random draw, empty if none was needed.
    pub(crate) finalists: Vec<CandidateId>,
    pub(crate) log: Vec<String>,
}

fn join_labels<C: Display>(cids: &[CandidateId], candidates: &[C]) -> String {
    cids.iter()
        .map(|cid| cid.label(candidates).to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// Picks which of the tied candidates is eliminated.
///
/// `tied` holds at least two contenders sharing the lowest tally, and at
/// least one contender is not part of the tie. `landings` gives, for each
/// ballot, the contender holding it in the current round.
///
/// First level: every ballot held by a contender outside the tie gives one
/// tiebreak vote to the tied candidate it ranks first after its current
/// holder. The tied candidate with the fewest tiebreak votes is eliminated.
/// Second level: if several share that minimum, one of them is drawn from
/// `rng`.
pub(crate) fn break_tie<C: Display, R: RandomSource + ?Sized>(
    tied: &[CandidateId],
    ballots: &[Ranking],
    landings: &[CandidateId],
    candidates: &[C],
    rng: &mut R,
) -> TiebreakResolution {
    debug_assert!(tied.len() >= 2, "break_tie: not a tie: {:?}", tied);
    let tied_set: BTreeSet<CandidateId> = tied.iter().cloned().collect();
    let mut log: Vec<String> = vec![format!(
        "Tie for last place between {}.",
        join_labels(tied, candidates)
    )];

    let mut secondary: BTreeMap<CandidateId, VoteCount> =
        tied.iter().map(|cid| (*cid, VoteCount::EMPTY)).collect();
    for (idx, (ranking, holder)) in ballots.iter().zip(landings.iter()).enumerate() {
        if tied_set.contains(holder) {
            continue;
        }
        let start = ranking
            .iter()
            .position(|cid| cid == holder)
            .map(|p| p + 1)
            .unwrap_or(ranking.len());
        let next_tied = ranking[start..]
            .iter()
            .enumerate()
            .find(|(_, cid)| tied_set.contains(cid));
        match next_tied {
            Some((offset, cid)) => {
                if let Some(vc) = secondary.get_mut(cid) {
                    *vc += VoteCount(1);
                }
                log.push(format!(
                    "Tiebreak: ballot #{} (held by {}) gives its tiebreak vote to {} (preference {}).",
                    idx,
                    holder.label(candidates),
                    cid.label(candidates),
                    start + offset + 1
                ));
            }
            None => {
                log.push(format!(
                    "Tiebreak: ballot #{} (held by {}) ranks no tied candidate after {} and does not vote.",
                    idx,
                    holder.label(candidates),
                    holder.label(candidates)
                ));
            }
        }
    }

    let secondary_tally: Vec<(CandidateId, VoteCount)> = secondary.into_iter().collect();
    log.push(format!(
        "Tiebreak tally: {}.",
        secondary_tally
            .iter()
            .map(|(cid, vc)| format!("{} {}", cid.label(candidates), vc.0))
            .collect::<Vec<String>>()
            .join(", ")
    ));
    debug!("break_tie: tied: {:?} secondary tally: {:?}", tied, secondary_tally);

    let min_count = secondary_tally
        .iter()
        .map(|(_, vc)| *vc)
        .min()
        .unwrap_or(VoteCount::EMPTY);
    let at_min: Vec<CandidateId> = secondary_tally
        .iter()
        .filter_map(|(cid, vc)| if *vc == min_count { Some(*cid) } else { None })
        .collect();

    if let [single] = at_min.as_slice() {
        log.push(format!(
            "{} has the fewest tiebreak votes and is eliminated.",
            single.label(candidates)
        ));
        return TiebreakResolution {
            eliminated: *single,
            depth: TiebreakDepth::SecondPreference,
            tied: tied.to_vec(),
            secondary_tally,
            finalists: vec![],
            log,
        };
    }

    if at_min.len() == tied.len() {
        log.push(format!(
            "The tiebreak votes do not separate {}; drawing at random.",
            join_labels(&at_min, candidates)
        ));
    } else {
        log.push(format!(
            "{} remain tied on {} tiebreak votes each; drawing at random between them.",
            join_labels(&at_min, candidates),
            min_count.0
        ));
    }
    let pick = rng.pick_index(at_min.len());
    assert!(
        pick < at_min.len(),
        "random source returned index {} for {} candidates",
        pick,
        at_min.len()
    );
    let eliminated = at_min[pick];
    debug!(
        "break_tie: random draw among {:?} picked {:?}",
        at_min, eliminated
    );
    log.push(format!(
        "Random draw picked {}, who is eliminated.",
        eliminated.label(candidates)
    ));
    TiebreakResolution {
        eliminated,
        depth: TiebreakDepth::RandomDraw,
        tied: tied.to_vec(),
        secondary_tally,
        finalists: at_min,
        log,
    }
}
