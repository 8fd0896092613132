//! Localization Scenario Integration Tests
//!
//! Rewrite -> baseline -> substitution search -> ranking over the shared
//! Calc fixture.

use core_types::{Value, ValueType};
use instrumenter::{RewriteTarget, Rewriter};
use integration_tests::{write_project, CALC_SOURCE, FAILING_TEST};
use interpreter::PassThrough;
use localizer::{
    alternate_values, IvmpCandidate, LocalizationReport, Localizer, ModuleTestExecutor,
    TestExecutor, TestResult,
};
use recorder::{Mode, Recorder};

fn instrumented_executor(dir: &std::path::Path) -> ModuleTestExecutor {
    let (calc, tests) = write_project(dir);
    Rewriter::new(dir.join("backup"))
        .unwrap()
        .rewrite(&RewriteTarget::new("Calc", calc.clone()))
        .unwrap();
    let modules = vec![calc.load().unwrap(), tests.load().unwrap()];
    ModuleTestExecutor::new(modules, "CalcTests")
        .unwrap()
        .with_step_limit(10_000)
}

fn localizer(dir: &std::path::Path) -> Localizer<ModuleTestExecutor> {
    let executor = instrumented_executor(dir);
    let recorder = Recorder::new(executor.sites());
    Localizer::new(executor, recorder)
}

#[test]
fn test_baseline_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let mut localizer = localizer(dir.path());
    let baseline = localizer.run_baseline();
    assert_eq!(baseline.failing(), vec![FAILING_TEST]);
    assert_eq!(baseline.pass_count(), 2);

    let profile = localizer.recorder().profile(FAILING_TEST).unwrap();
    assert_eq!(profile.sites(), vec![0, 1]);
    assert_eq!(profile.value(0, 0), Some(&Value::Int32(5)));
    assert_eq!(profile.value(1, 0), Some(&Value::Int32(7)));
}

#[test]
fn test_pool_for_local_site() {
    let dir = tempfile::tempdir().unwrap();
    let mut localizer = localizer(dir.path());
    localizer.run_baseline();
    let profiles: Vec<_> = ["CalcTests::low_feed", "CalcTests::high_feed", FAILING_TEST]
        .iter()
        .map(|t| localizer.recorder().profile(t).unwrap().clone())
        .collect();
    // observed {3, 9, 5}; the original 5 is not an alternative
    assert_eq!(
        alternate_values(&profiles, 0, &ValueType::Int32, &Value::Int32(5)),
        vec![Value::Int32(3), Value::Int32(9)]
    );
}

#[test]
fn test_exactly_one_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let mut localizer = localizer(dir.path());
    localizer.run_baseline();
    let outcome = localizer.search().unwrap();

    assert_eq!(
        outcome.candidates,
        vec![IvmpCandidate {
            site: 0,
            test: FAILING_TEST.into(),
            original: Value::Int32(5),
            alternate: Value::Int32(9),
        }]
    );
    // site 0 tries 3 and 9, site 1 tries 1
    assert_eq!(outcome.trials, 3);
    assert!(outcome.inconclusive.is_empty());
    assert!(localizer.recorder().mapping().is_empty());
}

#[test]
fn test_ranked_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut localizer = localizer(dir.path());
    localizer.run_baseline();
    let outcome = localizer.search().unwrap();
    let ranked = localizer.rank(&outcome.candidates);
    let report = LocalizationReport::new(localizer.baseline().unwrap(), &outcome, &ranked);

    assert_eq!(report.total_tests, 3);
    assert_eq!(report.failing_tests, 1);
    assert_eq!(report.entries.len(), 1);
    let entry = &report.entries[0];
    assert_eq!(entry.file, CALC_SOURCE);
    assert_eq!((entry.start_line, entry.end_line), (10, 10));
    assert_eq!((entry.start_column, entry.end_column), (9, 10));
    assert_eq!(entry.fixed_failing_tests, 1);
    assert_eq!(entry.method, "Calc::compute");
}

#[test]
fn test_override_is_exact_and_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let mut executor = instrumented_executor(dir.path());
    let mut recorder = Recorder::new(executor.sites());
    recorder.set_mode(Mode::Replay);
    recorder.install(0, Value::Int32(9)).unwrap();

    recorder.begin_test(FAILING_TEST);
    let result = executor.run_test(FAILING_TEST, &mut recorder);
    recorder.end_test();
    assert_eq!(result, TestResult::Pass);

    // the replay profile keeps what the program produced
    let replay = recorder.replay_profile().unwrap();
    assert_eq!(replay.value(0, 0), Some(&Value::Int32(5)));
    assert_eq!(replay.value(1, 0), Some(&Value::Int32(7)));

    recorder.uninstall(0);
    assert!(recorder.mapping().is_empty());
}

#[test]
fn test_instrumented_suite_matches_original() {
    let dir = tempfile::tempdir().unwrap();
    let mut original = ModuleTestExecutor::new(
        vec![integration_tests::calc_module(), integration_tests::tests_module()],
        "CalcTests",
    )
    .unwrap();
    let mut instrumented = instrumented_executor(dir.path());
    let mut recorder = Recorder::new(instrumented.sites());

    for test in original.test_ids() {
        recorder.begin_test(&test);
        let rewritten = instrumented.run_test(&test, &mut recorder);
        recorder.end_test();
        assert_eq!(rewritten, original.run_test(&test, &mut PassThrough), "{}", test);
    }
}
