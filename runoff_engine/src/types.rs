// ******** Output data structures *********

use std::error::Error;
use std::fmt::{Debug, Display};

/// Zero-based index of a round within one resolution run.
pub type RoundId = u32;

/// How far the tiebreak cascade had to go to pick the eliminated candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum TiebreakDepth {
    /// The lowest tally was held by a single candidate.
    Clean,
    /// Decided by the next preferences of the ballots held by the other contenders.
    SecondPreference,
    /// Decided by drawing from the injected random source.
    RandomDraw,
}

impl TiebreakDepth {
    /// The numeric level used in summaries: 0, 1 or 2.
    pub fn level(self) -> u8 {
        match self {
            TiebreakDepth::Clean => 0,
            TiebreakDepth::SecondPreference => 1,
            TiebreakDepth::RandomDraw => 2,
        }
    }
}

/// What happened at the end of a round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RoundOutcome<C> {
    Elected(C),
    Eliminated(C),
    /// All the remaining contenders hold the same tally.
    Draw,
}

/// Details of a tie for last place.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TiebreakRecord<C> {
    /// The contenders sharing the lowest tally, in candidate order.
    pub tied: Vec<C>,
    /// The tiebreak votes received by each tied candidate.
    pub secondary_tally: Vec<(C, u64)>,
    /// The candidates that went into the random draw. Empty when the
    /// secondary preferences were enough.
    pub finalists: Vec<C>,
    pub depth: TiebreakDepth,
}

impl<C> TiebreakRecord<C> {
    fn map<D, F: Fn(&C) -> D>(&self, f: &F) -> TiebreakRecord<D> {
        TiebreakRecord {
            tied: self.tied.iter().map(f).collect(),
            secondary_tally: self
                .secondary_tally
                .iter()
                .map(|(c, count)| (f(c), *count))
                .collect(),
            finalists: self.finalists.iter().map(f).collect(),
            depth: self.depth,
        }
    }
}

/// Immutable snapshot of one round.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundRecord<C> {
    pub round: RoundId,
    /// Number of valid ballots in the election.
    pub total_votes: u64,
    pub quota: u64,
    /// The votes of every contender of this round, in candidate order.
    pub tally: Vec<(C, u64)>,
    pub outcome: RoundOutcome<C>,
    pub tiebreak: Option<TiebreakRecord<C>>,
    /// Every decision taken during the round, one line each.
    pub log: Vec<String>,
}

impl<C> RoundRecord<C> {
    pub fn winner(&self) -> Option<&C> {
        match &self.outcome {
            RoundOutcome::Elected(c) => Some(c),
            _ => None,
        }
    }

    pub fn eliminated(&self) -> Option<&C> {
        match &self.outcome {
            RoundOutcome::Eliminated(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self.outcome, RoundOutcome::Draw)
    }

    pub fn tiebreak_depth(&self) -> TiebreakDepth {
        self.tiebreak
            .as_ref()
            .map(|tb| tb.depth)
            .unwrap_or(TiebreakDepth::Clean)
    }

    /// The votes of a contender in this round, if it was still standing.
    pub fn votes_for(&self, candidate: &C) -> Option<u64>
    where
        C: PartialEq,
    {
        self.tally
            .iter()
            .find(|(c, _)| c == candidate)
            .map(|(_, count)| *count)
    }

    pub fn map_candidates<D, F: Fn(&C) -> D>(&self, f: &F) -> RoundRecord<D> {
        RoundRecord {
            round: self.round,
            total_votes: self.total_votes,
            quota: self.quota,
            tally: self.tally.iter().map(|(c, count)| (f(c), *count)).collect(),
            outcome: match &self.outcome {
                RoundOutcome::Elected(c) => RoundOutcome::Elected(f(c)),
                RoundOutcome::Eliminated(c) => RoundOutcome::Eliminated(f(c)),
                RoundOutcome::Draw => RoundOutcome::Draw,
            },
            tiebreak: self.tiebreak.as_ref().map(|tb| tb.map(f)),
            log: self.log.clone(),
        }
    }
}

impl<C: Display> RoundRecord<C> {
    /// One line describing the outcome of the round.
    pub fn summary_line(&self) -> String {
        match (&self.outcome, self.tiebreak_depth()) {
            (RoundOutcome::Elected(c), _) => format!("{} achieves quota and is duly elected.", c),
            (RoundOutcome::Draw, _) => "Nobody achieves quota, the result is a draw.".to_string(),
            (RoundOutcome::Eliminated(c), TiebreakDepth::Clean) => {
                format!("No one achieves quota and {} is eliminated.", c)
            }
            (RoundOutcome::Eliminated(c), TiebreakDepth::SecondPreference) => format!(
                "No one achieves quota and {} is eliminated by 2nd preference tiebreaker.",
                c
            ),
            (RoundOutcome::Eliminated(c), TiebreakDepth::RandomDraw) => format!(
                "No one achieves quota and {} is eliminated by random draw (double tiebreaker).",
                c
            ),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ElectionOutcome<C> {
    Winner(C),
    Draw,
}

/// The terminal artifact of a resolution run: the outcome and the audit trail.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionResult<C> {
    pub outcome: ElectionOutcome<C>,
    pub rounds: Vec<RoundRecord<C>>,
}

impl<C> ElectionResult<C> {
    pub fn winner(&self) -> Option<&C> {
        match &self.outcome {
            ElectionOutcome::Winner(c) => Some(c),
            ElectionOutcome::Draw => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        matches!(self.outcome, ElectionOutcome::Draw)
    }

    /// Candidates eliminated so far, in elimination order.
    pub fn eliminations(&self) -> Vec<&C> {
        self.rounds.iter().filter_map(|r| r.eliminated()).collect()
    }

    /// Re-keys the whole result, for example from identifiers to display names.
    ///
    /// The decision log is kept as it was rendered during the run.
    pub fn map_candidates<D, F: Fn(&C) -> D>(&self, f: F) -> ElectionResult<D> {
        ElectionResult {
            outcome: match &self.outcome {
                ElectionOutcome::Winner(c) => ElectionOutcome::Winner(f(c)),
                ElectionOutcome::Draw => ElectionOutcome::Draw,
            },
            rounds: self.rounds.iter().map(|r| r.map_candidates(&f)).collect(),
        }
    }
}

/// The defect found in a ballot by the validator.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BallotDefect {
    /// The ballot does not rank every candidate.
    WrongLength { expected: usize, found: usize },
    /// The entry at `position` repeats an earlier entry.
    DuplicateEntry { position: usize },
    /// The entry at `position` is not a candidate of this election.
    UnknownCandidate { position: usize },
}

impl Display for BallotDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotDefect::WrongLength { expected, found } => {
                write!(f, "ranks {} candidates instead of {}", found, expected)
            }
            BallotDefect::DuplicateEntry { position } => {
                write!(f, "repeats a candidate at position {}", position)
            }
            BallotDefect::UnknownCandidate { position } => {
                write!(f, "contains an unknown candidate at position {}", position)
            }
        }
    }
}

/// Errors that prevent the election from being resolved.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ResolveError {
    /// No candidate was registered.
    EmptyElection,
    /// The candidate at `position` is registered twice.
    DuplicateCandidate { position: usize },
    /// No ballot was supplied.
    NoBallots,
    /// The ballot at index `ballot` failed validation.
    InvalidBallot { ballot: usize, defect: BallotDefect },
    /// A ballot did not rank any standing contender. This cannot happen with
    /// validated input.
    ExhaustedBallot { ballot: usize, round: RoundId },
    /// The candidate at `position` cannot be numbered.
    TooManyCandidates { position: usize },
}

impl Error for ResolveError {}

impl Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::EmptyElection => write!(f, "the election has no candidate"),
            ResolveError::DuplicateCandidate { position } => {
                write!(f, "candidate at position {} is registered twice", position)
            }
            ResolveError::NoBallots => write!(f, "the election has no valid ballot"),
            ResolveError::InvalidBallot { ballot, defect } => {
                write!(f, "ballot #{} {}", ballot, defect)
            }
            ResolveError::ExhaustedBallot { ballot, round } => write!(
                f,
                "ballot #{} ranks no standing candidate in round {}",
                ballot, round
            ),
            ResolveError::TooManyCandidates { position } => {
                write!(f, "too many candidates: cannot register candidate #{}", position)
            }
        }
    }
}
