use log::{debug, error};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use crate::{CandidateId, Ranking, ResolveError, RoundId, VoteCount};

/// The winning threshold for a single seat: a strict majority of the valid ballots.
pub fn quota(valid_ballots: u64) -> u64 {
    (valid_ballots / 2) + 1
}

/// The count of one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub(crate) struct RoundTally {
    /// Every contender with its votes, in candidate order.
    pub(crate) counts: Vec<(CandidateId, VoteCount)>,
    /// For each ballot, the contender receiving its vote.
    pub(crate) landings: Vec<CandidateId>,
    pub(crate) quota: VoteCount,
    pub(crate) winner: Option<CandidateId>,
    pub(crate) log: Vec<String>,
}

impl RoundTally {
    pub(crate) fn min_count(&self) -> VoteCount {
        self.counts
            .iter()
            .map(|(_, vc)| *vc)
            .min()
            .unwrap_or(VoteCount::EMPTY)
    }

    /// The contenders holding the lowest tally, in candidate order.
    pub(crate) fn lowest(&self) -> Vec<CandidateId> {
        let min_count = self.min_count();
        self.counts
            .iter()
            .filter_map(|(cid, vc)| if *vc == min_count { Some(*cid) } else { None })
            .collect()
    }
}

/// The first choice of the ranking that is still standing, with its position.
pub(crate) fn first_standing(
    ranking: &[CandidateId],
    standing: &BTreeSet<CandidateId>,
) -> Option<(usize, CandidateId)> {
    ranking
        .iter()
        .enumerate()
        .find(|(_, cid)| standing.contains(cid))
        .map(|(rank, cid)| (rank, *cid))
}

/// Counts the ballots of one round from scratch.
///
/// Each ballot goes to its highest ranked contender. Contenders that receive
/// no ballot still appear with zero votes.
pub(crate) fn tabulate_round<C: Display>(
    contenders: &BTreeSet<CandidateId>,
    ballots: &[Ranking],
    valid_ballots: VoteCount,
    candidates: &[C],
    round_id: RoundId,
) -> Result<RoundTally, ResolveError> {
    let mut tally: BTreeMap<CandidateId, VoteCount> = contenders
        .iter()
        .map(|cid| (*cid, VoteCount::EMPTY))
        .collect();
    let mut landings: Vec<CandidateId> = Vec::with_capacity(ballots.len());
    let mut log: Vec<String> = Vec::with_capacity(ballots.len());

    for (idx, ranking) in ballots.iter().enumerate() {
        let (rank, cid) = match first_standing(ranking, contenders) {
            Some(x) => x,
            None => {
                error!(
                    "tabulate_round: round {}: ballot #{} {:?} has no standing candidate among {:?}",
                    round_id, idx, ranking, contenders
                );
                return Err(ResolveError::ExhaustedBallot {
                    ballot: idx,
                    round: round_id,
                });
            }
        };
        if let Some(vc) = tally.get_mut(&cid) {
            *vc += VoteCount(1);
        }
        landings.push(cid);
        log.push(format!(
            "Ballot #{} votes for {} (preference {}).",
            idx,
            cid.label(candidates),
            rank + 1
        ));
    }

    let quota = VoteCount(quota(valid_ballots.0));
    // The map is ordered by candidate position, so the first qualifying
    // candidate is the lowest indexed one.
    let winner = tally
        .iter()
        .find(|(_, vc)| **vc >= quota)
        .map(|(cid, _)| *cid);
    debug!(
        "tabulate_round: round {}: tally: {:?} quota: {:?} winner: {:?}",
        round_id, tally, quota, winner
    );

    Ok(RoundTally {
        counts: tally.into_iter().collect(),
        landings,
        quota,
        winner,
        log,
    })
}
