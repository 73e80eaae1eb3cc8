//! Reduction of sample sets to mean and relative standard deviation.
//!
//! The deviation is the *sample* standard deviation (Bessel's correction,
//! divisor `n - 1`), so it is undefined below two samples.

use serde::Serialize;

use super::{outcome::Verdict, samples::SampleSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryStat {
    Measured {
        /// Seconds.
        mean: f64,
        /// Percent of the mean. `None` with fewer than two samples.
        rsd_percent: Option<f64>,
        samples: usize,
    },
    Unavailable {
        verdict: Verdict,
    },
}

impl SummaryStat {
    pub fn from_samples(set: &SampleSet) -> Self {
        match self::mean(set.samples()) {
            Some(mean) => Self::Measured {
                mean,
                rsd_percent: self::relative_std_dev(set.samples()),
                samples: set.samples().len(),
            },
            None => Self::Unavailable {
                verdict: set.verdict(),
            },
        }
    }

    pub fn mean(&self) -> Option<f64> {
        match *self {
            Self::Measured { mean, .. } => Some(mean),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn rsd_percent(&self) -> Option<f64> {
        match *self {
            Self::Measured { rsd_percent, .. } => rsd_percent,
            Self::Unavailable { .. } => None,
        }
    }

    pub fn sample_count(&self) -> usize {
        match *self {
            Self::Measured { samples, .. } => samples,
            Self::Unavailable { .. } => 0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Measured { .. })
    }

    pub fn verdict(&self) -> Verdict {
        match *self {
            Self::Measured { .. } => Verdict::Success,
            Self::Unavailable { verdict } => verdict,
        }
    }
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

pub fn sample_std_dev(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let mean = self::mean(xs)?;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    Some(var.sqrt())
}

/// Standard deviation as a percentage of the mean.
pub fn relative_std_dev(xs: &[f64]) -> Option<f64> {
    let mean = self::mean(xs)?;
    let sd = self::sample_std_dev(xs)?;
    if mean == 0.0 {
        return None;
    }
    Some(sd / mean * 100.0)
}
