use log::debug;

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::{BallotDefect, CandidateId, Ranking, ResolveError};

/// Maps every registered candidate to its position in the candidate list.
pub(crate) fn build_registry<C: Eq + Hash>(
    candidates: &[C],
) -> Result<HashMap<&C, CandidateId>, ResolveError> {
    if candidates.is_empty() {
        return Err(ResolveError::EmptyElection);
    }
    let mut registry: HashMap<&C, CandidateId> = HashMap::with_capacity(candidates.len());
    for (position, c) in candidates.iter().enumerate() {
        if registry.insert(c, CandidateId::from_position(position)?).is_some() {
            return Err(ResolveError::DuplicateCandidate { position });
        }
    }
    Ok(registry)
}

fn check_ballot<C: Eq + Hash>(
    ballot: &[C],
    registry: &HashMap<&C, CandidateId>,
) -> Result<Ranking, BallotDefect> {
    if ballot.len() != registry.len() {
        return Err(BallotDefect::WrongLength {
            expected: registry.len(),
            found: ballot.len(),
        });
    }
    let mut seen: HashSet<CandidateId> = HashSet::with_capacity(ballot.len());
    let mut ranking: Ranking = Vec::with_capacity(ballot.len());
    for (position, c) in ballot.iter().enumerate() {
        let cid = *registry
            .get(c)
            .ok_or(BallotDefect::UnknownCandidate { position })?;
        if !seen.insert(cid) {
            return Err(BallotDefect::DuplicateEntry { position });
        }
        ranking.push(cid);
    }
    // Same length, no repeat and only known candidates: the ballot is a
    // permutation of the candidate list.
    Ok(ranking)
}

/// Validates the whole ballot set and converts it to internal rankings.
///
/// The first defective ballot aborts the validation.
pub(crate) fn checks<C: Eq + Hash>(
    candidates: &[C],
    ballots: &[Vec<C>],
) -> Result<Vec<Ranking>, ResolveError> {
    let registry = build_registry(candidates)?;
    if ballots.is_empty() {
        return Err(ResolveError::NoBallots);
    }
    let mut rankings: Vec<Ranking> = Vec::with_capacity(ballots.len());
    for (idx, ballot) in ballots.iter().enumerate() {
        let ranking = check_ballot(ballot, &registry).map_err(|defect| {
            debug!("checks: ballot #{} rejected: {:?}", idx, defect);
            ResolveError::InvalidBallot {
                ballot: idx,
                defect,
            }
        })?;
        rankings.push(ranking);
    }
    debug!(
        "checks: {} ballots accepted for {} candidates",
        rankings.len(),
        candidates.len()
    );
    Ok(rankings)
}

/// Checks that every ballot ranks each candidate exactly once.
///
/// [`crate::resolve_election`] runs the same checks before counting; this
/// entry point lets callers reject bad input earlier, for example when the
/// ballots are imported.
pub fn validate_ballots<C: Eq + Hash>(
    candidates: &[C],
    ballots: &[Vec<C>],
) -> Result<(), ResolveError> {
    checks(candidates, ballots).map(|_| ())
}
