//! Differential fuzzer: reference sponge vs. implementation-under-test.
//!
//! Each iteration walks `Idle -> GenerateCase -> ComputeReference ->
//! QueryImplementation -> Compare` and returns to `Idle` on a match. The
//! first discrepancy or protocol failure moves the fuzzer to `Halted` and
//! ends the run.

use super::protocol::TestCase;
use super::repro::ReproBundle;
use super::runner::ImplementationRunner;
use super::{ConformanceError, ConformanceResult};
use crate::config::FuzzConfig;
use crate::variant::Variant;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Fuzzer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzState {
    /// Between iterations.
    Idle,
    /// Drawing a variant and input.
    GenerateCase,
    /// Running the reference sponge.
    ComputeReference,
    /// Waiting on the implementation-under-test.
    QueryImplementation,
    /// Comparing digests.
    Compare,
    /// Stopped after a discrepancy or failure; terminal.
    Halted,
}

/// Result of a differential comparison.
#[derive(Debug)]
pub enum DiffResult {
    /// Both implementations produced the same digest.
    Match {
        /// The matching digest (lowercase hex).
        digest: String,
    },
    /// Implementations produced different digests.
    Mismatch {
        /// Repro bundle for debugging.
        repro: ReproBundle,
    },
}

impl DiffResult {
    /// Check if the result is a match.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }

    /// Check if the result is a mismatch.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

/// Why a run stopped early.
#[derive(Debug)]
pub enum HaltReason {
    /// The digests differed.
    Discrepancy(ReproBundle),
    /// The implementation broke the protocol or the reference rejected the case.
    Failure {
        /// Zero-based iteration at which the failure happened.
        iteration: usize,
        /// Request line that was being processed, if one was generated.
        request: Option<String>,
        /// The error.
        error: ConformanceError,
    },
}

/// How a run ended.
#[derive(Debug)]
pub enum FuzzOutcome {
    /// Every iteration matched.
    Completed,
    /// The run stopped at the first problem.
    Halted(HaltReason),
}

/// Summary of a fuzzing run.
#[derive(Debug)]
pub struct FuzzReport {
    /// Seed that generated every case of the run.
    pub seed: u64,
    /// Iterations requested.
    pub iterations: usize,
    /// Iterations whose digests matched.
    pub passed: usize,
    /// Number of times the fuzzer returned to `Idle` after a comparison.
    pub idle_transitions: usize,
    /// Total input bytes hashed.
    pub bytes_hashed: usize,
    /// How the run ended.
    pub outcome: FuzzOutcome,
}

impl FuzzReport {
    /// True when the run finished without a discrepancy or failure.
    pub fn is_clean(&self) -> bool {
        matches!(self.outcome, FuzzOutcome::Completed)
    }

    /// The discrepancy that halted the run, if any.
    pub fn discrepancy(&self) -> Option<&ReproBundle> {
        match &self.outcome {
            FuzzOutcome::Halted(HaltReason::Discrepancy(repro)) => Some(repro),
            _ => None,
        }
    }

    /// Format a summary string.
    pub fn summary(&self) -> String {
        let status = match &self.outcome {
            FuzzOutcome::Completed => "completed".to_string(),
            FuzzOutcome::Halted(HaltReason::Discrepancy(repro)) => {
                format!("halted on discrepancy at iteration {}", repro.iteration)
            }
            FuzzOutcome::Halted(HaltReason::Failure { iteration, .. }) => {
                format!("halted on failure at iteration {}", iteration)
            }
        };
        format!(
            "{} of {} iterations matched, {} bytes hashed, seed {} ({})",
            self.passed, self.iterations, self.bytes_hashed, self.seed, status
        )
    }
}

/// Differential fuzzer over the eight fixed-output variants.
pub struct DiffFuzzer<R> {
    runner: R,
    rng: ChaCha8Rng,
    seed: u64,
    iterations: usize,
    max_input_len: usize,
    state: FuzzState,
    idle_transitions: usize,
}

impl<R: ImplementationRunner> DiffFuzzer<R> {
    /// Create a fuzzer. Draws a seed when the config has none.
    pub fn new(runner: R, config: &FuzzConfig) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            runner,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            iterations: config.iterations,
            max_input_len: config.max_input_len,
            state: FuzzState::Idle,
            idle_transitions: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> FuzzState {
        self.state
    }

    /// Seed of this run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The wrapped runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Consume the fuzzer and return the runner.
    pub fn into_runner(self) -> R {
        self.runner
    }

    fn transition(&mut self, next: FuzzState) {
        log::trace!("{:?} -> {:?}", self.state, next);
        if next == FuzzState::Idle && self.state == FuzzState::Compare {
            self.idle_transitions += 1;
        }
        self.state = next;
    }

    /// Draw a uniformly random variant and input.
    pub fn generate_case(&mut self) -> TestCase {
        let index = self.rng.gen_range(0..Variant::FIXED_OUTPUT.len());
        let len = self.rng.gen_range(0..=self.max_input_len);
        let mut input = vec![0u8; len];
        self.rng.fill(&mut input[..]);
        TestCase::new(Variant::FIXED_OUTPUT[index], input)
    }

    /// Run one case through both implementations and compare.
    pub fn compare_case(&mut self, iteration: usize, case: &TestCase) -> ConformanceResult<DiffResult> {
        self.transition(FuzzState::ComputeReference);
        let expected = hex::encode(case.reference_digest()?);

        self.transition(FuzzState::QueryImplementation);
        let actual = self.runner.submit_case(case)?;

        self.transition(FuzzState::Compare);
        if expected.eq_ignore_ascii_case(&actual) {
            log::debug!(
                "{:>4} {:<10} {:>5} bytes  {}",
                iteration,
                case.variant.name(),
                case.input.len(),
                expected
            );
            Ok(DiffResult::Match { digest: expected })
        } else {
            Ok(DiffResult::Mismatch {
                repro: ReproBundle::new(iteration, self.seed, case, expected, actual),
            })
        }
    }

    /// Run until every iteration has matched or the first problem.
    pub fn run(&mut self) -> FuzzReport {
        log::info!(
            "fuzzing {} against the reference: {} iterations, seed {}",
            self.runner.name(),
            self.iterations,
            self.seed
        );

        let mut passed = 0;
        let mut bytes_hashed = 0;
        let mut outcome = FuzzOutcome::Completed;

        for iteration in 0..self.iterations {
            self.transition(FuzzState::GenerateCase);
            let case = self.generate_case();
            bytes_hashed += case.input.len();

            match self.compare_case(iteration, &case) {
                Ok(DiffResult::Match { .. }) => {
                    passed += 1;
                    self.transition(FuzzState::Idle);
                }
                Ok(DiffResult::Mismatch { repro }) => {
                    log::warn!(
                        "discrepancy at iteration {}: {} expected {}, got {}",
                        iteration,
                        repro.variant,
                        repro.expected,
                        repro.actual
                    );
                    self.transition(FuzzState::Halted);
                    outcome = FuzzOutcome::Halted(HaltReason::Discrepancy(repro));
                    break;
                }
                Err(error) => {
                    log::warn!("iteration {} failed: {}", iteration, error);
                    self.transition(FuzzState::Halted);
                    outcome = FuzzOutcome::Halted(HaltReason::Failure {
                        iteration,
                        request: Some(super::protocol::format_request(&case)),
                        error,
                    });
                    break;
                }
            }
        }

        let report = FuzzReport {
            seed: self.seed,
            iterations: self.iterations,
            passed,
            idle_transitions: self.idle_transitions,
            bytes_hashed,
            outcome,
        };
        log::info!("{}", report.summary());
        report
    }
}
