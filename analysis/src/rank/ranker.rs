//! @ai:module:intent Rank tool runs of one benchmark by false positives, bugs found, coverage, crashes and time
//! @ai:module:layer application
//! @ai:module:public_api RankCandidate, RunKind, Sample, RankOptions, RankPosition, RankReason, TimeMeasure, RankError, rank
//! @ai:module:depends_on rank::stats, result_info, spec, verification
//! @ai:module:stateless true

use crate::rank::stats::{mean, ConfidenceInterval};
use crate::result_info::{OneOrMany, ResultInfo};
use crate::spec::{match_against_spec, BenchmarkSpec, SpecMatch};
use crate::verification::classify_all;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

/// @ai:intent Caller errors that make a ranking meaningless
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankError {
    #[error("Ranking needs at least two candidates, got {0}")]
    TooFewCandidates(usize),

    #[error("Cannot rank single-run and merged results together")]
    MixedRunKinds,

    #[error("Confidence interval comparison is only defined for two candidates, got {0}")]
    FuzzyArity(usize),

    #[error("Expected {expected} coverage samples (one per candidate), got {found}")]
    CandidateCountMismatch { expected: usize, found: usize },

    #[error("Candidate {index}: {message}")]
    InconsistentSample { index: usize, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Single,
    Merged,
}

/// @ai:intent A measurement from one run or from every repetition of a merged run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sample {
    Single(f64),
    Repeated(Vec<f64>),
}

impl Sample {
    pub fn values(&self) -> Vec<f64> {
        match self {
            Sample::Single(v) => vec![*v],
            Sample::Repeated(values) => values.clone(),
        }
    }

    fn clamped(&self, max: Option<f64>) -> Sample {
        let Some(max) = max else {
            return self.clone();
        };
        match self {
            Sample::Single(v) => Sample::Single(v.min(max)),
            Sample::Repeated(values) => {
                Sample::Repeated(values.iter().map(|v| v.min(max)).collect())
            }
        }
    }
}

impl From<&OneOrMany<f64>> for Sample {
    fn from(value: &OneOrMany<f64>) -> Self {
        match value {
            OneOrMany::One(v) => Sample::Single(*v),
            OneOrMany::Many(values) => Sample::Repeated(values.clone()),
        }
    }
}

/// @ai:intent Everything the ranker needs to know about one tool run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankCandidate {
    pub label: String,
    pub kind: RunKind,
    pub false_positives: usize,
    pub true_positives: usize,
    /// Crashed repetitions (bad exit code or out of memory)
    pub crashes: usize,
    /// User plus system time, `None` when any repetition lacks it
    pub cpu_time: Option<Sample>,
    pub wallclock_time: Option<Sample>,
}

impl RankCandidate {
    /// @ai:intent Derive ranking inputs by classifying the run and matching every task against the spec
    /// @ai:effects fs:read
    pub fn from_result_info(
        result: &ResultInfo,
        spec: &BenchmarkSpec,
        allow_invalid_klee_dir: bool,
    ) -> crate::Result<Self> {
        let dir = result.open_klee_dir()?;
        let mut false_positives = 0;
        let mut true_positives = 0;
        for verification in classify_all(&*dir, allow_invalid_klee_dir) {
            let task_spec = spec.task(verification.task())?;
            match match_against_spec(&verification, task_spec) {
                SpecMatch::Mismatch { reason, .. } if reason.is_false_positive() => {
                    false_positives += 1;
                }
                SpecMatch::Match {
                    expect_correct: false,
                    ..
                } => true_positives += 1,
                _ => {}
            }
        }

        let kind = if result.is_merged() {
            RunKind::Merged
        } else {
            RunKind::Single
        };
        let to_sample = |values: Vec<Option<f64>>| -> Option<Sample> {
            let values = values.into_iter().collect::<Option<Vec<f64>>>()?;
            match (kind, values.as_slice()) {
                (RunKind::Single, [v]) => Some(Sample::Single(*v)),
                _ => Some(Sample::Repeated(values)),
            }
        };

        Ok(Self {
            label: result.program().to_string(),
            kind,
            false_positives,
            true_positives,
            crashes: result.crash_count(),
            cpu_time: to_sample(result.cpu_times()),
            wallclock_time: to_sample(result.wallclock_times()),
        })
    }
}

/// @ai:intent Tunables for the ranking stages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankOptions {
    pub coverage_confidence: f64,
    pub time_confidence: f64,
    /// Times above this are clamped to it; both count as timeouts
    pub max_exec_time: Option<f64>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            coverage_confidence: 0.95,
            time_confidence: 0.99,
            max_exec_time: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMeasure {
    Cpu,
    Wallclock,
}

impl TimeMeasure {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeMeasure::Cpu => "CPU time",
            TimeMeasure::Wallclock => "wall-clock time",
        }
    }
}

/// @ai:intent The stage that placed a group, with the group's value at that stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum RankReason {
    /// Count per index of the group
    FalsePositives { counts: Vec<usize> },
    TruePositives { count: usize },
    BranchCoverage { coverage: f64 },
    BranchCoverageInterval { interval: ConfidenceInterval },
    CoverageUnavailable,
    Crashes { count: usize },
    ExecutionTime { measure: TimeMeasure, seconds: f64 },
    ExecutionTimeInterval {
        measure: TimeMeasure,
        interval: ConfidenceInterval,
    },
    ExecutionTimeUnavailable,
    Tied,
}

impl RankReason {
    /// @ai:intent Stage name without the group's value, for tallying
    /// @ai:effects pure
    pub fn kind(&self) -> &'static str {
        match self {
            RankReason::FalsePositives { .. } => "false positives",
            RankReason::TruePositives { .. } => "true positives",
            RankReason::BranchCoverage { .. } | RankReason::BranchCoverageInterval { .. } => {
                "branch coverage"
            }
            RankReason::CoverageUnavailable => "coverage unavailable",
            RankReason::Crashes { .. } => "crashes",
            RankReason::ExecutionTime { .. } | RankReason::ExecutionTimeInterval { .. } => {
                "execution time"
            }
            RankReason::ExecutionTimeUnavailable => "execution time unavailable",
            RankReason::Tied => "tied",
        }
    }
}

impl std::fmt::Display for RankReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankReason::FalsePositives { counts } => match counts.as_slice() {
                [first, rest @ ..] if rest.iter().all(|c| c == first) => {
                    write!(f, "{} false positives", first)
                }
                _ => {
                    let counts: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
                    write!(f, "false positives ({})", counts.join(", "))
                }
            },
            RankReason::TruePositives { count } => write!(f, "{} true positives", count),
            RankReason::BranchCoverage { coverage } => {
                write!(f, "branch coverage {:.2}%", coverage * 100.0)
            }
            RankReason::BranchCoverageInterval { interval } => {
                write!(f, "branch coverage {}", interval)
            }
            RankReason::CoverageUnavailable => write!(f, "coverage unavailable"),
            RankReason::Crashes { count } => write!(f, "{} crashes", count),
            RankReason::ExecutionTime { measure, seconds } => {
                write!(f, "{} {:.3}s", measure.as_str(), seconds)
            }
            RankReason::ExecutionTimeInterval { measure, interval } => {
                write!(f, "{} {}", measure.as_str(), interval)
            }
            RankReason::ExecutionTimeUnavailable => write!(f, "execution time unavailable"),
            RankReason::Tied => write!(f, "tied"),
        }
    }
}

/// @ai:intent Candidates (by index) ranked equal, and why they sit here
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankPosition {
    pub indices: Vec<usize>,
    pub reason: RankReason,
}

impl std::fmt::Display for RankPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.indices, self.reason)
    }
}

#[derive(Clone, Copy)]
enum Stage {
    FalsePositives,
    TruePositives,
    Coverage,
    Crashes,
    ExecutionTime,
}

impl Stage {
    const ORDER: [Stage; 5] = [
        Stage::FalsePositives,
        Stage::TruePositives,
        Stage::Coverage,
        Stage::Crashes,
        Stage::ExecutionTime,
    ];
}

/// Result of one stage over the remaining candidates
enum StageOutcome {
    /// The stage did not tell the remaining candidates apart
    Undecided,
    /// Groups best-first; the first proceeds unless it is the only one left
    Split(Vec<(Vec<usize>, RankReason)>),
    /// Emit these groups best-first and stop
    Final(Vec<(Vec<usize>, RankReason)>),
}

/// @ai:intent Order candidates for one benchmark best-first
/// @ai:pre candidates.len() >= 2, all of one RunKind; coverage, when given, has one sample per candidate
/// @ai:post every candidate index appears in exactly one position
/// @ai:effects pure
///
/// Stages run in order: false-positive presence, true-positive count, branch
/// coverage, crash count, execution time. A stage splits the remaining
/// candidates into groups; the best group proceeds and the others are placed
/// below everything still in play. Whatever survives every stage is tied.
///
/// Merged runs compare coverage and time by confidence interval: disjoint
/// intervals order the two candidates, overlapping intervals let both
/// proceed. This is only defined for exactly two candidates and is not
/// transitive: A may tie B and B tie C while A beats C, so ranking A, B and C
/// pairwise need not produce a consistent total order.
pub fn rank(
    candidates: &[RankCandidate],
    coverage: Option<&[Sample]>,
    options: &RankOptions,
) -> Result<Vec<RankPosition>, RankError> {
    if candidates.len() < 2 {
        return Err(RankError::TooFewCandidates(candidates.len()));
    }
    let kind = candidates[0].kind;
    if candidates.iter().any(|c| c.kind != kind) {
        return Err(RankError::MixedRunKinds);
    }
    if let Some(coverage) = coverage {
        if coverage.len() != candidates.len() {
            return Err(RankError::CandidateCountMismatch {
                expected: candidates.len(),
                found: coverage.len(),
            });
        }
        check_samples(kind, coverage.iter().enumerate())?;
    }
    check_samples(
        kind,
        candidates
            .iter()
            .enumerate()
            .flat_map(|(i, c)| [(i, &c.cpu_time), (i, &c.wallclock_time)])
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s))),
    )?;

    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut placed_by_stage: Vec<Vec<RankPosition>> = Vec::new();
    let mut top: Vec<RankPosition> = Vec::new();

    for stage in Stage::ORDER {
        let outcome = match stage {
            Stage::FalsePositives => false_positive_stage(candidates, &remaining),
            Stage::TruePositives => true_positive_stage(candidates, &remaining),
            Stage::Coverage => coverage_stage(kind, coverage, &remaining, options)?,
            Stage::Crashes => crash_stage(candidates, &remaining),
            Stage::ExecutionTime => time_stage(kind, candidates, &remaining, options)?,
        };
        match outcome {
            StageOutcome::Undecided => {}
            StageOutcome::Final(groups) => {
                top.extend(groups.into_iter().map(position));
                remaining.clear();
                break;
            }
            StageOutcome::Split(groups) => {
                let mut groups = groups.into_iter();
                let Some((best, best_reason)) = groups.next() else {
                    continue;
                };
                placed_by_stage.push(groups.map(position).collect());
                if best.len() == 1 {
                    top.push(position((best, best_reason)));
                    remaining.clear();
                    break;
                }
                remaining = best;
            }
        }
    }

    if !remaining.is_empty() {
        top.push(RankPosition {
            indices: remaining,
            reason: RankReason::Tied,
        });
    }

    // Candidates dropped at a later stage beat those dropped earlier
    top.extend(placed_by_stage.into_iter().rev().flatten());
    Ok(top)
}

fn position((indices, reason): (Vec<usize>, RankReason)) -> RankPosition {
    RankPosition { indices, reason }
}

fn check_samples<'a>(
    kind: RunKind,
    samples: impl Iterator<Item = (usize, &'a Sample)>,
) -> Result<(), RankError> {
    for (index, sample) in samples {
        match (kind, sample) {
            (RunKind::Single, Sample::Repeated(values)) if values.len() != 1 => {
                return Err(RankError::InconsistentSample {
                    index,
                    message: format!("single run has {} measurements", values.len()),
                });
            }
            (_, Sample::Repeated(values)) if values.is_empty() => {
                return Err(RankError::InconsistentSample {
                    index,
                    message: "no measurements".to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Group `remaining` by an integer key, ordered best-first
fn group_by_key<K: Ord + Copy>(
    remaining: &[usize],
    key: impl Fn(usize) -> K,
    lower_is_better: bool,
) -> Vec<(K, Vec<usize>)> {
    let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for &i in remaining {
        groups.entry(key(i)).or_default().push(i);
    }
    let mut groups: Vec<_> = groups.into_iter().collect();
    if !lower_is_better {
        groups.reverse();
    }
    groups
}

/// Group `remaining` by exact value, ordered best-first
fn group_by_value(
    remaining: &[usize],
    value: impl Fn(usize) -> f64,
    lower_is_better: bool,
) -> Vec<(f64, Vec<usize>)> {
    let mut sorted: Vec<(f64, usize)> = remaining.iter().map(|&i| (value(i), i)).collect();
    sorted.sort_by(|a, b| {
        let ord = a.0.total_cmp(&b.0);
        let ord = if lower_is_better { ord } else { ord.reverse() };
        ord.then(a.1.cmp(&b.1))
    });

    let mut groups: Vec<(f64, Vec<usize>)> = Vec::new();
    for (v, i) in sorted {
        match groups.last_mut() {
            Some((last, members)) if last.total_cmp(&v) == Ordering::Equal => members.push(i),
            _ => groups.push((v, vec![i])),
        }
    }
    groups
}

fn split_or_undecided(groups: Vec<(Vec<usize>, RankReason)>) -> StageOutcome {
    if groups.len() <= 1 {
        StageOutcome::Undecided
    } else {
        StageOutcome::Split(groups)
    }
}

fn false_positive_stage(candidates: &[RankCandidate], remaining: &[usize]) -> StageOutcome {
    let groups = group_by_key(remaining, |i| candidates[i].false_positives > 0, true)
        .into_iter()
        .map(|(_, members)| {
            let counts = members
                .iter()
                .map(|&i| candidates[i].false_positives)
                .collect();
            (members, RankReason::FalsePositives { counts })
        })
        .collect();
    split_or_undecided(groups)
}

fn true_positive_stage(candidates: &[RankCandidate], remaining: &[usize]) -> StageOutcome {
    let groups = group_by_key(remaining, |i| candidates[i].true_positives, false)
        .into_iter()
        .map(|(count, members)| (members, RankReason::TruePositives { count }))
        .collect();
    split_or_undecided(groups)
}

fn crash_stage(candidates: &[RankCandidate], remaining: &[usize]) -> StageOutcome {
    let groups: Vec<(Vec<usize>, RankReason)> =
        group_by_key(remaining, |i| candidates[i].crashes, true)
            .into_iter()
            .map(|(count, members)| (members, RankReason::Crashes { count }))
            .collect();

    let any_clean = groups
        .first()
        .is_some_and(|(_, reason)| *reason == RankReason::Crashes { count: 0 });
    if any_clean {
        split_or_undecided(groups)
    } else {
        // Time is meaningless once every remaining candidate crashed
        StageOutcome::Final(groups)
    }
}

fn coverage_stage(
    kind: RunKind,
    coverage: Option<&[Sample]>,
    remaining: &[usize],
    options: &RankOptions,
) -> Result<StageOutcome, RankError> {
    let Some(coverage) = coverage else {
        return Ok(StageOutcome::Final(vec![(
            remaining.to_vec(),
            RankReason::CoverageUnavailable,
        )]));
    };

    match kind {
        RunKind::Single => {
            let groups = group_by_value(remaining, |i| mean(&coverage[i].values()), false)
                .into_iter()
                .map(|(coverage, members)| (members, RankReason::BranchCoverage { coverage }))
                .collect();
            Ok(split_or_undecided(groups))
        }
        RunKind::Merged => {
            let [a, b] = pair(remaining)?;
            let level = options.coverage_confidence;
            let ci_a = ConfidenceInterval::from_samples(&coverage[a].values(), level);
            let ci_b = ConfidenceInterval::from_samples(&coverage[b].values(), level);
            Ok(fuzzy_order(a, ci_a, b, ci_b, false, |interval| {
                RankReason::BranchCoverageInterval { interval }
            }))
        }
    }
}

fn time_stage(
    kind: RunKind,
    candidates: &[RankCandidate],
    remaining: &[usize],
    options: &RankOptions,
) -> Result<StageOutcome, RankError> {
    let all_have_cpu = remaining.iter().all(|&i| candidates[i].cpu_time.is_some());
    let measure = if all_have_cpu {
        TimeMeasure::Cpu
    } else {
        TimeMeasure::Wallclock
    };

    let mut samples: BTreeMap<usize, Sample> = BTreeMap::new();
    for &i in remaining {
        let sample = match measure {
            TimeMeasure::Cpu => candidates[i].cpu_time.as_ref(),
            TimeMeasure::Wallclock => candidates[i].wallclock_time.as_ref(),
        };
        let Some(sample) = sample else {
            tracing::warn!("No execution time for candidate {}", candidates[i].label);
            return Ok(StageOutcome::Final(vec![(
                remaining.to_vec(),
                RankReason::ExecutionTimeUnavailable,
            )]));
        };
        samples.insert(i, sample.clamped(options.max_exec_time));
    }
    let values_of = |i: usize| -> Vec<f64> {
        samples.get(&i).map(Sample::values).unwrap_or_default()
    };

    match kind {
        RunKind::Single => {
            let groups = group_by_value(remaining, |i| mean(&values_of(i)), true)
                .into_iter()
                .map(|(seconds, members)| {
                    (members, RankReason::ExecutionTime { measure, seconds })
                })
                .collect();
            Ok(split_or_undecided(groups))
        }
        RunKind::Merged => {
            let [a, b] = pair(remaining)?;
            let level = options.time_confidence;
            let ci_a = ConfidenceInterval::from_samples(&values_of(a), level);
            let ci_b = ConfidenceInterval::from_samples(&values_of(b), level);
            Ok(fuzzy_order(a, ci_a, b, ci_b, true, |interval| {
                RankReason::ExecutionTimeInterval { measure, interval }
            }))
        }
    }
}

fn pair(remaining: &[usize]) -> Result<[usize; 2], RankError> {
    match remaining {
        [a, b] => Ok([*a, *b]),
        _ => Err(RankError::FuzzyArity(remaining.len())),
    }
}

/// Overlapping intervals are indistinguishable; otherwise order by mean
fn fuzzy_order(
    a: usize,
    ci_a: ConfidenceInterval,
    b: usize,
    ci_b: ConfidenceInterval,
    lower_is_better: bool,
    reason: impl Fn(ConfidenceInterval) -> RankReason,
) -> StageOutcome {
    if ci_a.overlaps(&ci_b) {
        return StageOutcome::Undecided;
    }
    let a_first = (ci_a.mean < ci_b.mean) == lower_is_better;
    let (first, second) = if a_first {
        ((a, ci_a), (b, ci_b))
    } else {
        ((b, ci_b), (a, ci_a))
    };
    StageOutcome::Split(vec![
        (vec![first.0], reason(first.1)),
        (vec![second.0], reason(second.1)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single(fp: usize, tp: usize, crashes: usize, cpu: Option<f64>, wall: f64) -> RankCandidate {
        RankCandidate {
            label: "bench".to_string(),
            kind: RunKind::Single,
            false_positives: fp,
            true_positives: tp,
            crashes,
            cpu_time: cpu.map(Sample::Single),
            wallclock_time: Some(Sample::Single(wall)),
        }
    }

    fn merged(tp: usize, cpu: &[f64]) -> RankCandidate {
        RankCandidate {
            label: "bench".to_string(),
            kind: RunKind::Merged,
            false_positives: 0,
            true_positives: tp,
            crashes: 0,
            cpu_time: Some(Sample::Repeated(cpu.to_vec())),
            wallclock_time: Some(Sample::Repeated(cpu.to_vec())),
        }
    }

    fn indices(positions: &[RankPosition]) -> Vec<Vec<usize>> {
        positions.iter().map(|p| p.indices.clone()).collect()
    }

    #[test]
    fn test_false_positives_rank_last() {
        let candidates = [single(2, 0, 0, Some(1.0), 1.0), single(0, 1, 0, Some(1.0), 1.0)];
        let ranking = rank(&candidates, None, &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![1], vec![0]]);
        assert_eq!(ranking[1].reason.to_string(), "2 false positives");
        assert_eq!(ranking[0].reason.to_string(), "0 false positives");
    }

    #[test]
    fn test_false_positive_presence_is_binary() {
        let candidates = [single(1, 0, 0, Some(1.0), 1.0), single(3, 0, 0, Some(1.0), 1.0)];
        let ranking = rank(&candidates, None, &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![0, 1]]);
        assert_eq!(ranking[0].reason, RankReason::CoverageUnavailable);
    }

    #[test]
    fn test_more_true_positives_win() {
        let candidates = [
            single(0, 1, 0, Some(1.0), 1.0),
            single(0, 3, 0, Some(1.0), 1.0),
            single(0, 2, 0, Some(1.0), 1.0),
        ];
        let ranking = rank(&candidates, None, &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![1], vec![2], vec![0]]);
    }

    #[test]
    fn test_later_stage_losers_rank_above_earlier_ones() {
        let candidates = [
            single(1, 0, 0, Some(1.0), 1.0),
            single(0, 1, 0, Some(5.0), 5.0),
            single(0, 1, 0, Some(2.0), 2.0),
        ];
        let coverage = [Sample::Single(0.5), Sample::Single(0.5), Sample::Single(0.5)];
        let ranking = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![2], vec![1], vec![0]]);
        assert_eq!(
            ranking[1].reason,
            RankReason::ExecutionTime {
                measure: TimeMeasure::Cpu,
                seconds: 5.0
            }
        );
    }

    #[test]
    fn test_coverage_orders_single_runs() {
        let candidates = [single(0, 0, 0, Some(1.0), 1.0), single(0, 0, 0, Some(9.0), 9.0)];
        let coverage = [Sample::Single(0.4), Sample::Single(0.8)];
        let ranking = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![1], vec![0]]);
        assert_eq!(ranking[0].reason, RankReason::BranchCoverage { coverage: 0.8 });
    }

    #[test]
    fn test_crashed_candidates_are_excluded_before_time() {
        let candidates = [single(0, 0, 1, Some(0.1), 0.1), single(0, 0, 0, Some(9.0), 9.0)];
        let coverage = [Sample::Single(0.5), Sample::Single(0.5)];
        let ranking = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![1], vec![0]]);
        assert_eq!(ranking[1].reason, RankReason::Crashes { count: 1 });
    }

    #[test]
    fn test_all_crashed_stops_before_time() {
        let candidates = [single(0, 0, 2, Some(0.1), 0.1), single(0, 0, 1, Some(9.0), 9.0)];
        let coverage = [Sample::Single(0.5), Sample::Single(0.5)];
        let ranking = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![1], vec![0]]);
        assert_eq!(ranking[0].reason, RankReason::Crashes { count: 1 });
    }

    #[test]
    fn test_wallclock_fallback_when_cpu_missing() {
        let candidates = [single(0, 0, 0, None, 3.0), single(0, 0, 0, Some(100.0), 2.0)];
        let coverage = [Sample::Single(0.5), Sample::Single(0.5)];
        let ranking = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![1], vec![0]]);
        assert_eq!(
            ranking[0].reason,
            RankReason::ExecutionTime {
                measure: TimeMeasure::Wallclock,
                seconds: 2.0
            }
        );
    }

    #[test]
    fn test_times_above_limit_are_clamped_and_tie() {
        let candidates = [single(0, 0, 0, Some(950.0), 950.0), single(0, 0, 0, Some(1200.0), 1200.0)];
        let coverage = [Sample::Single(0.5), Sample::Single(0.5)];
        let options = RankOptions {
            max_exec_time: Some(900.0),
            ..RankOptions::default()
        };
        let ranking = rank(&candidates, Some(&coverage), &options).unwrap();
        assert_eq!(
            ranking,
            vec![RankPosition {
                indices: vec![0, 1],
                reason: RankReason::Tied
            }]
        );
    }

    #[test]
    fn test_fuzzy_coverage_overlap_proceeds_to_time() {
        let candidates = [merged(0, &[10.0, 10.5, 9.5]), merged(0, &[50.0, 51.0, 49.0])];
        let coverage = [
            Sample::Repeated(vec![0.50, 0.52, 0.48]),
            Sample::Repeated(vec![0.51, 0.53, 0.49]),
        ];
        let ranking = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![0], vec![1]]);
        assert_eq!(ranking[0].reason.kind(), "execution time");
    }

    #[test]
    fn test_fuzzy_coverage_disjoint_orders() {
        let candidates = [merged(0, &[1.0, 1.0]), merged(0, &[1.0, 1.0])];
        let coverage = [
            Sample::Repeated(vec![0.20, 0.21, 0.19]),
            Sample::Repeated(vec![0.80, 0.81, 0.79]),
        ];
        let ranking = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![1], vec![0]]);
        assert_eq!(ranking[0].reason.kind(), "branch coverage");
    }

    #[test]
    fn test_fuzzy_overlapping_times_tie() {
        let candidates = [merged(0, &[10.0, 12.0, 11.0]), merged(0, &[11.0, 10.5, 11.5])];
        let coverage = [Sample::Single(0.5), Sample::Single(0.5)];
        let ranking = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
        assert_eq!(indices(&ranking), vec![vec![0, 1]]);
        assert_eq!(ranking[0].reason, RankReason::Tied);
    }

    #[test]
    fn test_fuzzy_comparison_rejects_three_candidates() {
        let candidates = [merged(0, &[1.0]), merged(0, &[1.0]), merged(0, &[1.0])];
        let coverage = [Sample::Single(0.5), Sample::Single(0.5), Sample::Single(0.5)];
        let err = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap_err();
        assert_eq!(err, RankError::FuzzyArity(3));
    }

    #[test]
    fn test_precondition_violations() {
        let one = [single(0, 0, 0, Some(1.0), 1.0)];
        assert_eq!(
            rank(&one, None, &RankOptions::default()).unwrap_err(),
            RankError::TooFewCandidates(1)
        );

        let mixed = [single(0, 0, 0, Some(1.0), 1.0), merged(0, &[1.0, 2.0])];
        assert_eq!(
            rank(&mixed, None, &RankOptions::default()).unwrap_err(),
            RankError::MixedRunKinds
        );

        let pair = [single(0, 0, 0, Some(1.0), 1.0), single(0, 0, 0, Some(1.0), 1.0)];
        let coverage = [Sample::Single(0.5)];
        assert_eq!(
            rank(&pair, Some(&coverage), &RankOptions::default()).unwrap_err(),
            RankError::CandidateCountMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_every_index_placed_once() {
        let candidates = [
            single(1, 0, 0, Some(1.0), 1.0),
            single(0, 2, 0, Some(3.0), 3.0),
            single(0, 2, 1, Some(1.0), 1.0),
            single(0, 1, 0, Some(1.0), 1.0),
            single(0, 2, 0, Some(3.0), 3.0),
        ];
        let coverage: Vec<Sample> = (0..5).map(|_| Sample::Single(0.3)).collect();
        let ranking = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
        let mut seen: Vec<usize> = ranking.iter().flat_map(|p| p.indices.clone()).collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert_eq!(indices(&ranking), vec![vec![1, 4], vec![2], vec![3], vec![0]]);
    }
}
