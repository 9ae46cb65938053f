use std::fmt;

use super::domain::{Score, Stage};

/// Upper bound of the displayed weighted score.
pub const SCORE_SCALE: f64 = 10.0;

/// Average of the set scores mapped onto the 0-10 scale. Unset criteria are excluded from
/// the denominator; with nothing set the score is zero.
pub fn weighted_score<I>(scores: I) -> f64
where
    I: IntoIterator<Item = Option<Score>>,
{
    let (total, count) = scores
        .into_iter()
        .flatten()
        .fold((0u32, 0u32), |(total, count), score| {
            (total + u32::from(score.value()), count + 1)
        });

    if count == 0 {
        return 0.0;
    }

    let average = f64::from(total) / f64::from(count);
    average / f64::from(Score::MAX) * SCORE_SCALE
}

/// Rounded to the two decimals the backend stores.
pub fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Where a displayed score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    /// Hydrated from the server's `weighted_score`.
    Server,
    /// Computed from the scores currently selected in the panel.
    Local,
}

/// Rendered weighted score, e.g. `"6.00 / 10"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDisplay {
    pub value: f64,
    pub source: ScoreSource,
}

impl ScoreDisplay {
    pub fn local<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = Option<Score>>,
    {
        Self {
            value: weighted_score(scores),
            source: ScoreSource::Local,
        }
    }

    /// Server value when present, otherwise the local computation.
    pub fn resolve<I>(server: Option<f64>, scores: I) -> Self
    where
        I: IntoIterator<Item = Option<Score>>,
    {
        match server {
            Some(value) => Self {
                value: value.clamp(0.0, SCORE_SCALE),
                source: ScoreSource::Server,
            },
            None => Self::local(scores),
        }
    }

    /// Width of the score bar.
    pub fn bar_percent(&self) -> f64 {
        self.value / SCORE_SCALE * 100.0
    }
}

impl fmt::Display for ScoreDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} / {}", self.value, SCORE_SCALE as u32)
    }
}

/// Minimum weighted scores the backend demands before each forward transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreThresholds {
    pub screening: f64,
    pub interview: f64,
    pub final_review: f64,
    pub require_interview_date: bool,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            screening: 4.0,
            interview: 5.0,
            final_review: 6.5,
            require_interview_date: true,
        }
    }
}

impl ScoreThresholds {
    pub fn for_stage(&self, stage: Stage) -> Option<f64> {
        match stage {
            Stage::Screening => Some(self.screening),
            Stage::Interview => Some(self.interview),
            Stage::FinalReview => Some(self.final_review),
            Stage::Submitted | Stage::Decision => None,
        }
    }
}
