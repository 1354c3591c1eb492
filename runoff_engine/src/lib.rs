/*!
Single-winner instant-runoff election resolution.

```
use runoff_engine::{resolve_election, TieRng};
# use runoff_engine::ResolveError;

let candidates = ["Anna", "Bob", "Clara"];
let ballots = vec![
    vec!["Anna", "Bob", "Clara"],
    vec!["Anna", "Clara", "Bob"],
    vec!["Bob", "Anna", "Clara"],
];
let result = resolve_election(&candidates, &ballots, &mut TieRng::from_seed_u64(0))?;
assert_eq!(result.winner(), Some(&"Anna"));
# Ok::<(), ResolveError>(())
```

See the [`manual`] for the counting rules.
*/
mod rng;
mod tally;
mod tiebreak;
mod types;
mod validate;

pub mod manual;

use log::{debug, info};

use std::collections::BTreeSet;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::AddAssign;

pub use crate::rng::{RandomSource, TieRng};
pub use crate::tally::quota;
pub use crate::types::*;
pub use crate::validate::validate_ballots;

use crate::tally::{tabulate_round, RoundTally};
use crate::tiebreak::{break_tie, TiebreakResolution};

// **** Private structures ****

/// Position of a candidate in the registered candidate list.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

impl CandidateId {
    fn from_position(position: usize) -> Result<CandidateId, ResolveError> {
        u32::try_from(position)
            .map(CandidateId)
            .map_err(|_| ResolveError::TooManyCandidates { position })
    }

    fn label<'a, C>(&self, candidates: &'a [C]) -> &'a C {
        &candidates[self.0 as usize]
    }
}

/// A validated ballot: every candidate exactly once, most preferred first.
type Ranking = Vec<CandidateId>;

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

fn to_public_tally<C: Clone>(
    counts: &[(CandidateId, VoteCount)],
    candidates: &[C],
) -> Vec<(C, u64)> {
    counts
        .iter()
        .map(|(cid, vc)| (cid.label(candidates).clone(), vc.0))
        .collect()
}

fn to_public_tiebreak<C: Clone>(tb: &TiebreakResolution, candidates: &[C]) -> TiebreakRecord<C> {
    let labels = |cids: &[CandidateId]| -> Vec<C> {
        cids.iter()
            .map(|cid| cid.label(candidates).clone())
            .collect()
    };
    TiebreakRecord {
        tied: labels(&tb.tied),
        secondary_tally: to_public_tally(&tb.secondary_tally, candidates),
        finalists: labels(&tb.finalists),
        depth: tb.depth,
    }
}

/// Builds the record of a finished round and logs its outcome.
fn close_round<C: Clone + Display>(
    round_id: RoundId,
    total_votes: VoteCount,
    tally: RoundTally,
    outcome: RoundOutcome<C>,
    tiebreak: Option<TiebreakResolution>,
    candidates: &[C],
) -> RoundRecord<C> {
    let mut log = tally.log;
    if let Some(tb) = &tiebreak {
        log.extend(tb.log.iter().cloned());
    }
    let mut record = RoundRecord {
        round: round_id,
        total_votes: total_votes.0,
        quota: tally.quota.0,
        tally: to_public_tally(&tally.counts, candidates),
        outcome,
        tiebreak: tiebreak.map(|tb| to_public_tiebreak(&tb, candidates)),
        log: Vec::new(),
    };
    let summary = record.summary_line();
    info!("Round {}: {}", round_id, summary);
    log.push(summary);
    record.log = log;
    record
}

/// Resolves a single-winner election by instant runoff.
///
/// Arguments:
/// * `candidates` the registered candidates. Their order is the reference order for
///   reporting tallies and for choosing between several candidates meeting the quota.
/// * `ballots` one full ranking of the candidates per voter, most preferred first.
/// * `rng` the random source consulted when a tie for last place survives the
///   second preference tiebreak. A seeded source makes the whole run reproducible.
///
/// Every ballot is validated before counting starts; the first malformed ballot is
/// reported as [`ResolveError::InvalidBallot`].
///
/// Each round counts every ballot for its highest ranked standing candidate. A
/// candidate reaching [`quota`] wins. Otherwise, if all the standing candidates hold
/// the same tally the election is a draw; else the lowest candidate is eliminated,
/// with ties for last place broken by second preferences and then by a random draw.
pub fn resolve_election<C, R>(
    candidates: &[C],
    ballots: &[Vec<C>],
    rng: &mut R,
) -> Result<ElectionResult<C>, ResolveError>
where
    C: Clone + Eq + Hash + Debug + Display,
    R: RandomSource + ?Sized,
{
    info!(
        "Processing {:?} ballots, {:?} candidates",
        ballots.len(),
        candidates.len()
    );
    let rankings: Vec<Ranking> = validate::checks(candidates, ballots)?;
    let total_votes = VoteCount(rankings.len() as u64);
    for (idx, c) in candidates.iter().enumerate() {
        info!("Candidate: {}: {}", idx + 1, c);
    }

    let mut contenders: BTreeSet<CandidateId> = (0..candidates.len())
        .map(CandidateId::from_position)
        .collect::<Result<_, _>>()?;
    let mut rounds: Vec<RoundRecord<C>> = Vec::new();

    // At most one round per candidate: each round either ends the election or
    // eliminates one contender, and a single contender always meets the quota.
    loop {
        let round_id = rounds.len() as RoundId;
        debug!(
            "Round {}: contenders: {:?}",
            round_id,
            contenders
                .iter()
                .map(|cid| cid.label(candidates))
                .collect::<Vec<&C>>()
        );
        let tally = tabulate_round(&contenders, &rankings, total_votes, candidates, round_id)?;
        info!(
            "Round {} (winning threshold: {})",
            round_id, tally.quota.0
        );
        for (cid, vc) in tally.counts.iter() {
            info!("{:>8} {}", vc.0, cid.label(candidates));
        }

        if let Some(winner) = tally.winner {
            let c = winner.label(candidates).clone();
            rounds.push(close_round(
                round_id,
                total_votes,
                tally,
                RoundOutcome::Elected(c.clone()),
                None,
                candidates,
            ));
            return Ok(ElectionResult {
                outcome: ElectionOutcome::Winner(c),
                rounds,
            });
        }

        let lowest = tally.lowest();
        if lowest.len() == contenders.len() {
            rounds.push(close_round(
                round_id,
                total_votes,
                tally,
                RoundOutcome::Draw,
                None,
                candidates,
            ));
            return Ok(ElectionResult {
                outcome: ElectionOutcome::Draw,
                rounds,
            });
        }

        let (eliminated, tiebreak) = match lowest.as_slice() {
            [single] => (*single, None),
            _ => {
                let tb = break_tie(&lowest, &rankings, &tally.landings, candidates, rng);
                (tb.eliminated, Some(tb))
            }
        };
        let removed = contenders.remove(&eliminated);
        debug_assert!(removed, "eliminated candidate was not standing");
        rounds.push(close_round(
            round_id,
            total_votes,
            tally,
            RoundOutcome::Eliminated(eliminated.label(candidates).clone()),
            tiebreak,
            candidates,
        ));
    }
}
