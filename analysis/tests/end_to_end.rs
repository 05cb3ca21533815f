//! Verification and ranking over run directories, specs and result-info files written to disk.

use klee_analysis::metrics::{BenchmarkRanking, BenchmarkReport, MetricsAggregator, MetricsAggregatorTrait, TaskReport};
use klee_analysis::rank::{rank, RankCandidate, RankOptions, RankReason, Sample};
use klee_analysis::result_info::{group_result_infos, ResultInfos, RunOutcome};
use klee_analysis::spec::{match_against_spec, MatchKind, MismatchReason, SpecMatch};
use klee_analysis::verification::{
    classify, classify_all, summarize_across_tasks, UnknownReason, Verdict, VerificationResult,
    VerificationTask,
};
use kleedir::{KleeDirProxy, RunDirectory};
use klee_analysis::ReportGenerator;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SPEC: &str = r#"
name: prog
categories: [demo, integer]
verification_tasks:
  no_assert_fail:
    correct: false
    exhaustive_counter_examples: true
    counter_examples:
      - description: "assertion on negative input"
        locations:
          - file: src/main.c
            line: 17
  no_reach_error_function:
    correct: true
  no_invalid_free:
    correct: true
  no_invalid_deref:
    correct: true
  no_integer_division_by_zero:
    correct: true
  no_overshift:
    correct: true
"#;

fn info(tests: u32) -> String {
    format!(
        "klee --output-dir=out prog.bc\n\
         PID: 11\n\
         Started: 2017-03-01 10:20:30\n\
         BEGIN searcher description\n\
         DFSSearcher\n\
         END searcher description\n\
         Finished: 2017-03-01 10:21:30\n\
         Elapsed: 00:01:00\n\
         KLEE: done: explored paths = {tests}\n\
         KLEE: done: avg. constructs per query = 1\n\
         KLEE: done: total queries = 1\n\
         KLEE: done: valid queries = 1\n\
         KLEE: done: invalid queries = 0\n\
         KLEE: done: query cex = 1\n\
         \n\
         KLEE: done: total instructions = 100\n\
         KLEE: done: completed paths = {tests}\n\
         KLEE: done: generated tests = {tests}\n"
    )
}

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("spec.yml"), SPEC).unwrap();
        Self { root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// A run with `successes` plain tests, optionally followed by an assertion failure in `src/main.c`
    fn run_dir(&self, name: &str, successes: u32, assertion_line: Option<u64>) -> PathBuf {
        let dir = self.path(name);
        std::fs::create_dir_all(&dir).unwrap();
        let total = successes + u32::from(assertion_line.is_some());
        std::fs::write(dir.join("info"), info(total)).unwrap();
        for id in 1..=total {
            std::fs::write(dir.join(format!("test{id:06}.ktest")), b"KTEST").unwrap();
        }
        if let Some(line) = assertion_line {
            std::fs::write(
                dir.join(format!("test{total:06}.assert.err")),
                format!(
                    "Error: ASSERTION FAIL: x >= 0\nFile: /home/user/bench/src/main.c\nLine: {line}\nassembly.ll line: 30\nStack:\n\t#0 in main ()\n"
                ),
            )
            .unwrap();
        }
        dir
    }

    fn result_info(&self, name: &str, klee_dir: &Path, cpu: f64) -> PathBuf {
        let path = self.path(name);
        let content = format!(
            "misc:\n  runner: Klee\nresults:\n  - exit_code: 0\n    out_of_memory: false\n    backend_timeout: false\n    klee_dir: {}\n    user_cpu_time: {}\n    sys_cpu_time: 0.0\n    wallclock_time: {}\n    invocation_info:\n      program: prog.bc\n      misc:\n        augmented_spec_file: {}\n",
            klee_dir.display(),
            cpu,
            cpu + 1.0,
            self.path("spec.yml").display()
        );
        std::fs::write(&path, content).unwrap();
        path
    }
}

fn verify(path: &Path) -> Vec<BenchmarkReport> {
    let infos = ResultInfos::load(path).unwrap();
    infos
        .results
        .iter()
        .map(|result| {
            let spec = result.load_spec().unwrap();
            let (outcomes, dir) = result.run_outcomes().unwrap();
            let verdicts = classify_all(&*dir, false);
            let tasks = verdicts
                .iter()
                .map(|v| {
                    let matched = match_against_spec(v, spec.task(v.task()).unwrap());
                    TaskReport::new(v, Some(&matched))
                })
                .collect();
            BenchmarkReport {
                program: result.program().to_string(),
                spec_name: Some(spec.name.clone()),
                klee_dirs: vec![],
                outcomes,
                overall: summarize_across_tasks(&verdicts).unwrap(),
                tasks,
            }
        })
        .collect()
}

#[test]
fn test_verify_counter_example_found() {
    let ws = Workspace::new();
    let dir = ws.run_dir("found", 1, Some(17));
    let result_info = ws.result_info("found.yml", &dir, 10.0);

    let benchmarks = verify(&result_info);
    assert_eq!(benchmarks.len(), 1);
    let benchmark = &benchmarks[0];
    assert_eq!(benchmark.outcomes, vec![RunOutcome::ValidKleeDir]);
    assert_eq!(benchmark.overall, Verdict::Incorrect);

    let assert_fail = &benchmark.tasks[0];
    assert_eq!(assert_fail.task, VerificationTask::NoAssertFail);
    assert_eq!(assert_fail.verdict, Verdict::Incorrect);
    assert_eq!(assert_fail.test_cases, vec![2]);
    assert_eq!(assert_fail.spec_match, Some(MatchKind::Match));
    assert!(assert_fail.true_positive);
    assert!(assert_fail.warnings.is_empty());

    // the assertion failure terminates its path, so every other task is provable
    for task in &benchmark.tasks[1..] {
        assert_eq!(task.verdict, Verdict::Correct);
        assert_eq!(task.spec_match, Some(MatchKind::Match));
    }

    let results = MetricsAggregator::new().aggregate_verification(
        benchmarks,
        &result_info.display().to_string(),
        false,
    );
    assert_eq!(results.overall.incorrect, 1);
    assert_eq!(results.by_task.len(), VerificationTask::ALL.len());

    let out = ws.path("reports");
    ReportGenerator::new().generate_verification(&results, &out).unwrap();
    assert!(out.join("verification.json").exists());
    let markdown = std::fs::read_to_string(out.join("verification.md")).unwrap();
    assert!(markdown.contains("| no_assert_fail | 0 | 1 | 0 | 1 | 0 | 0 | 1 |"));
}

#[test]
fn test_verify_wrong_location_is_disallowed() {
    let ws = Workspace::new();
    let dir = ws.run_dir("wrong", 2, Some(99));
    let infos = ResultInfos::load(&ws.result_info("wrong.yml", &dir, 3.0)).unwrap();
    let result = &infos.results[0];
    let spec = result.load_spec().unwrap();
    let klee_dir = result.open_klee_dir().unwrap();

    let verdicts = classify_all(&*klee_dir, false);
    let matched = match_against_spec(&verdicts[0], spec.task(VerificationTask::NoAssertFail).unwrap());
    match matched {
        SpecMatch::Mismatch { reason, test_cases, .. } => {
            assert_eq!(reason, MismatchReason::DisallowedCounterExample);
            assert!(reason.is_false_positive());
            assert_eq!(test_cases.len(), 1);
            assert_eq!(test_cases[0].identifier, 3);
        }
        other => panic!("expected a mismatch, got {:?}", other),
    }
}

#[test]
fn test_proxy_with_invalid_run_still_reports_counter_example() {
    let ws = Workspace::new();
    let found = ws.run_dir("found", 1, Some(17));
    let aborted = ws.path("aborted");
    std::fs::create_dir_all(&aborted).unwrap();
    std::fs::write(aborted.join("info"), "klee prog.bc\nPID: 12\nStarted: 2017-03-01 10:20:30\n").unwrap();
    std::fs::write(aborted.join("test000001.ktest"), b"KTEST").unwrap();

    let proxy = KleeDirProxy::open(&[&found, &aborted]).unwrap();
    assert!(!proxy.is_valid());

    let strict = classify(VerificationTask::NoAssertFail, &proxy, false);
    assert_eq!(strict.verdict(), Verdict::Unknown);

    let assert_fail = classify(VerificationTask::NoAssertFail, &proxy, true);
    assert_eq!(assert_fail.verdict(), Verdict::Incorrect);
    assert_eq!(assert_fail.test_cases().len(), 1);
    assert_eq!(assert_fail.test_cases()[0].identifier, 2);

    // without a counter example, an invalid run means nothing can be proven
    match classify(VerificationTask::NoOvershift, &proxy, true) {
        VerificationResult::Unknown { reason, .. } => {
            assert_eq!(reason, UnknownReason::InvalidKleeDir)
        }
        other => panic!("expected unknown, got {:?}", other),
    }
}

#[test]
fn test_rank_prefers_true_positive() {
    let ws = Workspace::new();
    let finds = ws.run_dir("finds", 1, Some(17));
    let misses = ws.run_dir("misses", 1, None);
    let files = vec![
        ResultInfos::load(&ws.result_info("a.yml", &finds, 50.0)).unwrap(),
        ResultInfos::load(&ws.result_info("b.yml", &misses, 5.0)).unwrap(),
    ];

    let grouped = group_result_infos(&files);
    assert!(!grouped.has_rejected());
    assert!(grouped.missing().is_empty());

    let mut rankings = Vec::new();
    for (program, results) in grouped.complete() {
        let spec = results[0].load_spec().unwrap();
        let candidates: Vec<RankCandidate> = results
            .iter()
            .map(|r| RankCandidate::from_result_info(r, &spec, false).unwrap())
            .collect();
        assert_eq!(candidates[0].true_positives, 1);
        assert_eq!(candidates[1].true_positives, 0);
        assert_eq!(candidates[1].false_positives, 0);

        let positions = rank(&candidates, None, &RankOptions::default()).unwrap();
        assert_eq!(positions[0].indices, vec![0]);
        assert_eq!(positions[0].reason, RankReason::TruePositives { count: 1 });
        assert_eq!(positions[1].indices, vec![1]);
        rankings.push(BenchmarkRanking {
            program: program.to_string(),
            positions,
        });
    }

    let names = vec!["a.yml".to_string(), "b.yml".to_string()];
    let results = MetricsAggregator::new().aggregate_ranking(rankings, &names);
    assert_eq!(results.wins[0].wins, 1);
    assert_eq!(results.wins[0].reasons["true positives"], 1);
    assert_eq!(results.ties, 0);

    let out = ws.path("ranking");
    ReportGenerator::new().generate_ranking(&results, &out).unwrap();
    let markdown = std::fs::read_to_string(out.join("ranking.md")).unwrap();
    assert!(markdown.contains("| 0 | a.yml | 1 | 100.0% | true positives: 1 |"));
}

#[test]
fn test_rank_equal_coverage_falls_through_to_time() {
    let ws = Workspace::new();
    let slow = ws.run_dir("slow", 3, None);
    let fast = ws.run_dir("fast", 3, None);
    let files = vec![
        ResultInfos::load(&ws.result_info("slow.yml", &slow, 80.0)).unwrap(),
        ResultInfos::load(&ws.result_info("fast.yml", &fast, 20.0)).unwrap(),
    ];
    let grouped = group_result_infos(&files);
    let (_, results) = grouped.complete().next().unwrap();
    let spec = results[0].load_spec().unwrap();
    let candidates: Vec<RankCandidate> = results
        .iter()
        .map(|r| RankCandidate::from_result_info(r, &spec, false).unwrap())
        .collect();

    let tied = rank(&candidates, None, &RankOptions::default()).unwrap();
    assert_eq!(tied.len(), 1);
    assert_eq!(tied[0].indices, vec![0, 1]);
    assert_eq!(tied[0].reason, RankReason::CoverageUnavailable);

    let coverage = [Sample::Single(0.5), Sample::Single(0.5)];
    let positions = rank(&candidates, Some(&coverage), &RankOptions::default()).unwrap();
    assert_eq!(positions[0].indices, vec![1]);
    assert_eq!(positions[0].reason.kind(), "execution time");
    assert_eq!(positions[1].indices, vec![0]);
}

#[test]
fn test_missing_program_is_reported() {
    let ws = Workspace::new();
    let dir = ws.run_dir("only", 1, None);
    let present = ResultInfos::load(&ws.result_info("present.yml", &dir, 1.0)).unwrap();
    std::fs::write(ws.path("empty.yml"), "results: []\n").unwrap();
    let empty = ResultInfos::load(&ws.path("empty.yml")).unwrap();

    let files = vec![present, empty];
    let grouped = group_result_infos(&files);
    assert_eq!(grouped.missing(), vec![("prog.bc", 1)]);
    assert_eq!(grouped.complete().count(), 0);
}
