/*!

This is the long-form manual for `runoff_engine` and the `runoff` command line tool.

## Counting rules

The engine elects exactly one candidate by instant runoff.

**Ballots** Every ballot ranks all the candidates, each exactly once, the most preferred
first. Ballots are checked before anything is counted: a ballot that misses a candidate,
repeats one or names an unknown candidate stops the resolution with
`ResolveError::InvalidBallot`. An election without ballots is rejected with
`ResolveError::NoBallots`.

**Quota** With `n` valid ballots the quota is `n / 2 + 1` (integer division):

| ballots | quota |
|---------|-------|
| 7       | 4     |
| 8       | 5     |

**Rounds** Each round starts from scratch: every ballot counts for the candidate it ranks
highest among those still standing. Then:

1. if a candidate reaches the quota, it is elected and the count stops. If several did
   (which valid ballots cannot produce), the first one in candidate order is elected;
2. if all the standing candidates have the same number of votes, the election is a draw;
3. otherwise the candidate with the fewest votes is eliminated and a new round starts.

**Tiebreaks** When several candidates share the fewest votes (but not all the standing
candidates do), the eliminated candidate is chosen in two steps:

1. *second preference*: every ballot currently held by a candidate outside the tie gives one
   tiebreak vote to the tied candidate it ranks first after its current holder. The tied
   candidate with the fewest tiebreak votes is eliminated;
2. *random draw*: if several tied candidates share the fewest tiebreak votes, one of them is
   drawn at random. The draw uses the `RandomSource` given to `resolve_election`.
   `TieRng::from_seed_u64` gives a reproducible source: the same ballots and the same
   seed always produce the same rounds.

## Audit trail

The result holds one `RoundRecord` per round with the tally, the quota, the outcome
(`Elected`, `Eliminated` or `Draw`), the tiebreak details and a log with one line per
decision:

```text
Ballot #0 votes for Anna (preference 1).
Ballot #1 votes for Bob (preference 1).
Tie for last place between Bob, Clara.
Tiebreak: ballot #0 (held by Anna) gives its tiebreak vote to Clara (preference 2).
Tiebreak tally: Bob 0, Clara 1.
Bob has the fewest tiebreak votes and is eliminated.
No one achieves quota and Bob is eliminated by 2nd preference tiebreaker.
```

The tallies are keyed by the candidate identifiers given to the engine. Use
`ElectionResult::map_candidates` to present them under other labels, such as display names.

## Command line

`runoff` reads an election description in JSON:

```json
{
  "outputSettings": { "contestName": "President", "contestDate": "2021-03-04" },
  "candidates": [
    { "id": "anna", "name": "Anna Smith" },
    { "id": "bob", "name": "Bob Jones" }
  ],
  "rules": { "randomSeed": "1234" },
  "ballotSources": [ { "provider": "csv", "filePath": "ballots.csv", "firstVoteColumnIndex": 2 } ]
}
```

```bash
runoff --config election.json --out summary.json
```

Ballots can also be given directly, without a configuration file:

```bash
runoff --input ballots.csv --candidate anna --candidate bob --seed 1234
```

The summary lists every round (`roundSummaries`), the decision log (`deepLog`), the overall
outcome and a SHA-256 digest of the rounds. Passing `--reference` compares the summary with
a previous one and fails on any difference.

*/
