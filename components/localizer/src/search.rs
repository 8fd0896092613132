//! Baseline recording, substitution search and ranking

use bytecode_system::SiteRecord;
use core_types::{Value, ValueType};
use recorder::{Mode, Recorder, ValueProfile};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::LocalizeError;
use crate::executor::{TestExecutor, TestResult};

/// A single-site substitution that turned a failing test into a passing one
#[derive(Debug, Clone, PartialEq)]
pub struct IvmpCandidate {
    /// Site id
    pub site: u32,
    /// Failing test that passed under the substitution
    pub test: String,
    /// Value the test originally observed at the site
    pub original: Value,
    /// Substituted value
    pub alternate: Value,
}

/// A trial that could not be decided
#[derive(Debug, Clone, PartialEq)]
pub struct InconclusiveTrial {
    /// Site id
    pub site: u32,
    /// Failing test being replayed
    pub test: String,
    /// Value that was substituted
    pub alternate: Value,
    /// Why the run broke down
    pub reason: String,
}

/// Outcome of the baseline run, in suite order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Baseline {
    /// Result per test
    pub results: Vec<(String, TestResult)>,
}

impl Baseline {
    /// Tests that failed
    pub fn failing(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_fail())
            .map(|(t, _)| t.as_str())
            .collect()
    }

    /// Number of passing tests
    pub fn pass_count(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_pass()).count()
    }

    /// Number of tests that could not be run
    pub fn inconclusive_count(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_inconclusive()).count()
    }
}

/// Everything the search produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Candidates in discovery order
    pub candidates: Vec<IvmpCandidate>,
    /// Trials that were neither pass nor fail
    pub inconclusive: Vec<InconclusiveTrial>,
    /// Number of replays executed
    pub trials: usize,
}

/// A site with the failing tests some substitution there fixed
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSite {
    /// The site
    pub site: SiteRecord,
    /// Distinct failing tests fixed, in discovery order
    pub fixed_tests: Vec<String>,
}

/// Drives baseline recording and the substitution search over one executor
pub struct Localizer<E: TestExecutor> {
    executor: E,
    recorder: Recorder,
    filter: Option<Regex>,
    baseline: Option<Baseline>,
}

impl<E: TestExecutor> Localizer<E> {
    /// Create a driver; `recorder` must know every site the executor can reach
    pub fn new(executor: E, recorder: Recorder) -> Self {
        Self {
            executor,
            recorder,
            filter: None,
            baseline: None,
        }
    }

    /// Only run tests whose id matches `pattern`
    pub fn with_filter(mut self, pattern: &str) -> Result<Self, LocalizeError> {
        self.filter = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// The executor
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Consume the driver, returning its executor
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// The recorder
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// The baseline, once recorded
    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    /// Run every selected test once in recording mode
    pub fn run_baseline(&mut self) -> &Baseline {
        self.recorder.set_mode(Mode::Recording);
        self.recorder.clear_overrides();

        let tests: Vec<String> = self
            .executor
            .test_ids()
            .into_iter()
            .filter(|t| self.filter.as_ref().map_or(true, |f| f.is_match(t)))
            .collect();
        info!(tests = tests.len(), "running baseline");

        let mut results = Vec::with_capacity(tests.len());
        for test in tests {
            let result = self.run(&test);
            match &result {
                TestResult::Pass => debug!(test = %test, "pass"),
                TestResult::Fail(reason) => info!(test = %test, reason = %reason, "failing test"),
                TestResult::Inconclusive(reason) => {
                    warn!(test = %test, reason = %reason, "baseline run inconclusive")
                }
            }
            results.push((test, result));
        }

        let baseline = Baseline { results };
        info!(
            passed = baseline.pass_count(),
            failed = baseline.failing().len(),
            inconclusive = baseline.inconclusive_count(),
            "baseline finished"
        );
        self.baseline.insert(baseline)
    }

    /// Try alternate values at every site each failing test touched
    pub fn search(&mut self) -> Result<SearchOutcome, LocalizeError> {
        let baseline = self.baseline.clone().ok_or(LocalizeError::NoBaseline)?;
        let profiles: Vec<ValueProfile> = baseline
            .results
            .iter()
            .filter_map(|(test, _)| self.recorder.profile(test).cloned())
            .collect();

        self.recorder.set_mode(Mode::Replay);
        let mut outcome = SearchOutcome::default();
        for test in baseline.failing() {
            let Some(profile) = profiles.iter().find(|p| p.test() == test) else {
                continue;
            };
            info!(test, sites = profile.sites().len(), "searching");
            for site in profile.sites() {
                let Some(first) = profile.first(site) else {
                    continue;
                };
                let Some(record) = self.recorder.sites().get(site) else {
                    continue;
                };
                let pool = alternate_values(&profiles, site, &record.ty, &first.value);
                for alternate in pool {
                    outcome.trials += 1;
                    match self.trial(site, test, &alternate) {
                        TestResult::Pass => {
                            info!(site, test, original = %first.value, alternate = %alternate, "candidate");
                            outcome.candidates.push(IvmpCandidate {
                                site,
                                test: test.to_string(),
                                original: first.value.clone(),
                                alternate,
                            });
                            break;
                        }
                        TestResult::Fail(_) => {}
                        TestResult::Inconclusive(reason) => {
                            debug!(site, test, reason = %reason, "inconclusive trial");
                            outcome.inconclusive.push(InconclusiveTrial {
                                site,
                                test: test.to_string(),
                                alternate,
                                reason,
                            });
                        }
                    }
                }
            }
        }
        self.recorder.set_mode(Mode::Recording);
        info!(
            candidates = outcome.candidates.len(),
            trials = outcome.trials,
            inconclusive = outcome.inconclusive.len(),
            "search finished"
        );
        Ok(outcome)
    }

    /// Group candidates by site, most failing tests fixed first
    pub fn rank(&self, candidates: &[IvmpCandidate]) -> Vec<RankedSite> {
        rank(candidates, |id| self.recorder.sites().get(id).cloned())
    }

    fn trial(&mut self, site: u32, test: &str, alternate: &Value) -> TestResult {
        // every trial gets its own copy of the substituted objects
        if let Err(e) = self.recorder.install(site, alternate.deep_copy()) {
            warn!(site, test, error = %e, "override rejected");
            return TestResult::Inconclusive(e.to_string());
        }
        let result = self.run(test);
        self.recorder.uninstall(site);
        result
    }

    fn run(&mut self, test: &str) -> TestResult {
        self.recorder.begin_test(test);
        let result = self.executor.run_test(test, &mut self.recorder);
        self.recorder.end_test();
        result
    }
}

/// Values of type `ty` observed at `site` across `profiles`, first seen
/// first, without duplicates and without `original`
pub fn alternate_values(
    profiles: &[ValueProfile],
    site: u32,
    ty: &ValueType,
    original: &Value,
) -> Vec<Value> {
    let mut pool: Vec<Value> = Vec::new();
    for value in profiles.iter().flat_map(|p| p.values_at(site)) {
        if !value.is_assignable_to(ty)
            || value.same_value(original)
            || pool.iter().any(|v| v.same_value(value))
        {
            continue;
        }
        pool.push(value.clone());
    }
    pool
}

/// Group candidates by site and order by distinct failing tests fixed,
/// then by site id. Sites `lookup` does not know are dropped.
pub fn rank(
    candidates: &[IvmpCandidate],
    lookup: impl Fn(u32) -> Option<SiteRecord>,
) -> Vec<RankedSite> {
    let mut by_site: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for candidate in candidates {
        let tests = by_site.entry(candidate.site).or_default();
        if !tests.contains(&candidate.test) {
            tests.push(candidate.test.clone());
        }
    }

    let mut ranked: Vec<RankedSite> = by_site
        .into_iter()
        .filter_map(|(id, fixed_tests)| {
            Some(RankedSite {
                site: lookup(id)?,
                fixed_tests,
            })
        })
        .collect();
    // stable sort keeps ascending site id among ties
    ranked.sort_by(|a, b| b.fixed_tests.len().cmp(&a.fixed_tests.len()));
    ranked
}
