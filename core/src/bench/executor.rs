use strum::IntoEnumIterator;

use super::{
    artifact::ArtifactGuard,
    language::LanguageSpec,
    outcome::{ExecutionOutcome, Verdict},
    process::ProcessRunner,
    samples::{PairSamples, SampleSet},
    testcase::{Dimension, TestCase},
};

/// Benchmarks one (language, test case) pair: compile once, run each
/// dimension `repetitions` times, clean up.
#[derive(Debug, Clone)]
pub struct TestExecutor {
    runner: ProcessRunner,
    repetitions: usize,
}

impl TestExecutor {
    pub const DEFAULT_REPETITIONS: usize = 5;

    pub fn new(runner: ProcessRunner) -> Self {
        Self {
            runner,
            repetitions: Self::DEFAULT_REPETITIONS,
        }
    }

    pub fn repetitions(mut self, n: usize) -> Self {
        self.repetitions = n;
        self
    }

    pub fn get_repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn get_runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Per-pair failures end up in the returned verdicts. `Err` means the run
    /// as a whole cannot continue (spawn failure, abort, broken template).
    pub async fn execute(&self, lang: &LanguageSpec, case: &TestCase) -> anyhow::Result<PairSamples> {
        if !lang.is_available() {
            log::info!(
                "Skip {} (test {}): toolchain {}",
                lang.name(),
                case.index + 1,
                lang.get_toolchain()
            );
            return Ok(PairSamples::uniform(SampleSet::failed(
                Verdict::ToolUnavailable,
            )));
        }

        // Render everything up front: a broken template must not leave a half-run pair.
        let compile_cmd = lang.compile_command()?;
        let run_cmds = Dimension::iter()
            .map(|dim| lang.run_command(case, dim).map(|cmd| (dim, cmd)))
            .collect::<Result<Vec<_>, _>>()?;

        let _artifacts = ArtifactGuard::new(self.runner.get_workdir(), lang.get_clean());

        if let Some(cmd) = compile_cmd {
            log::debug!("Compiling {}: {}", lang.name(), cmd);
            let res = self.runner.run(&cmd).await?;
            match res.outcome {
                ExecutionOutcome::Success(t) => {
                    log::debug!("Compiled {} in {}ms", lang.name(), t.as_millis())
                }
                ExecutionOutcome::Timeout => {
                    log::warn!("Compile of {} timed out", lang.name());
                    return Ok(PairSamples::uniform(SampleSet::failed(Verdict::Timeout)));
                }
                other => {
                    log::warn!(
                        "Compile of {} failed ({:?}): {}",
                        lang.name(),
                        other,
                        res.stderr.trim_end()
                    );
                    return Ok(PairSamples::uniform(SampleSet::failed(
                        Verdict::CompileFailed,
                    )));
                }
            }
        }

        let mut pair = PairSamples::uniform(SampleSet::failed(Verdict::ToolUnavailable));
        for (dim, cmd) in run_cmds {
            let set = self.run_repetitions(&cmd).await?;
            log::info!(
                "{} {} (test {}): {} [{} samples]",
                lang.name(),
                dim,
                case.index + 1,
                set.verdict(),
                set.samples().len()
            );
            *pair.get_mut(dim) = set;
        }
        Ok(pair)
    }

    /// Run `cmd` exactly `repetitions` times; failed attempts do not stop the loop.
    pub async fn run_repetitions(&self, cmd: &str) -> anyhow::Result<SampleSet> {
        let mut attempts = Vec::with_capacity(self.repetitions);
        for i in 0..self.repetitions {
            let res = self.runner.run(cmd).await?;
            match res.outcome {
                ExecutionOutcome::Success(t) => {
                    log::debug!("#{} {} [{}ms]", i + 1, cmd, t.as_millis())
                }
                other => log::debug!(
                    "#{} {} => {:?} {}",
                    i + 1,
                    cmd,
                    other,
                    res.stderr.trim_end()
                ),
            }
            attempts.push(res.outcome);
        }
        Ok(SampleSet::from_attempts(&attempts))
    }
}
