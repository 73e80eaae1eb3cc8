use super::{
    outcome::{ExecutionOutcome, Verdict},
    testcase::Dimension,
};

/// Successful wall-clock timings (seconds) of one (language, test, dimension),
/// plus the classification of the whole series.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    samples: Vec<f64>,
    verdict: Verdict,
}

impl SampleSet {
    /// An empty set for a pair that never got to run.
    pub fn failed(verdict: Verdict) -> Self {
        Self {
            samples: Vec::new(),
            verdict,
        }
    }

    /// Reduce the attempts of one repetition loop.
    ///
    /// Any success makes the series a success and only successful timings are
    /// kept. Without any success a timeout wins over a crash, otherwise the last
    /// attempt decides.
    pub fn from_attempts(attempts: &[ExecutionOutcome]) -> Self {
        let samples: Vec<f64> = attempts
            .iter()
            .filter_map(ExecutionOutcome::elapsed)
            .map(|t| t.as_secs_f64())
            .collect();

        let verdict = if !samples.is_empty() {
            Verdict::Success
        } else if attempts.contains(&ExecutionOutcome::Timeout) {
            Verdict::Timeout
        } else {
            attempts
                .last()
                .map(ExecutionOutcome::verdict)
                .unwrap_or(Verdict::ProcessFailed(None))
        };
        Self { samples, verdict }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Sample sets of both dimensions of one (language, test case) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairSamples {
    pub cycle: SampleSet,
    pub hanoi: SampleSet,
}

impl PairSamples {
    pub fn uniform(set: SampleSet) -> Self {
        Self {
            cycle: set.clone(),
            hanoi: set,
        }
    }

    pub fn get(&self, dim: Dimension) -> &SampleSet {
        match dim {
            Dimension::Cycle => &self.cycle,
            Dimension::Hanoi => &self.hanoi,
        }
    }

    pub fn get_mut(&mut self, dim: Dimension) -> &mut SampleSet {
        match dim {
            Dimension::Cycle => &mut self.cycle,
            Dimension::Hanoi => &mut self.hanoi,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;
    use ExecutionOutcome::*;

    fn ms(ms: u64) -> ExecutionOutcome {
        Success(Duration::from_millis(ms))
    }

    #[test]
    fn partial_success_keeps_only_successful_samples() {
        let set = SampleSet::from_attempts(&[ms(1000), Timeout, ms(1200), ProcessFailed(Some(1))]);
        assert_eq!(set.verdict(), Verdict::Success);
        assert_eq!(set.samples(), [1.0, 1.2]);
    }

    #[test]
    fn timeout_is_preferred_over_crash() {
        let set = SampleSet::from_attempts(&[Timeout, ProcessFailed(Some(1)), ProcessFailed(Some(2))]);
        assert_eq!(set.verdict(), Verdict::Timeout);
        assert!(set.is_empty());
    }

    #[test]
    fn last_failure_decides_without_timeout() {
        let set = SampleSet::from_attempts(&[ProcessFailed(Some(1)), ProcessFailed(None)]);
        assert_eq!(set.verdict(), Verdict::ProcessFailed(None));
        assert!(set.is_empty());
    }

    #[test]
    fn uniform_pair() {
        let p = PairSamples::uniform(SampleSet::failed(Verdict::CompileFailed));
        assert_eq!(p.get(Dimension::Cycle).verdict(), Verdict::CompileFailed);
        assert_eq!(p.get(Dimension::Hanoi).verdict(), Verdict::CompileFailed);
        assert!(p.cycle.is_empty() && p.hanoi.is_empty());
    }
}
