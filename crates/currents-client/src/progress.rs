// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Download progress as a display percentage.

use crate::transport::TransferProgress;

/// Percentage of a transfer completed, rounded to the nearest integer.
///
/// A missing or zero `total` counts as `1`, so the computation never
/// divides by zero. The result is not clamped: a transfer of unknown size
/// yields `loaded * 100`.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "byte counts fit f64 for display purposes")]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "value is rounded and non-negative")]
pub fn percent_complete(loaded: u64, total: Option<u64>) -> u64 {
    let total = match total {
        Some(0) | None => 1,
        Some(t) => t,
    };
    (loaded as f64 / total as f64 * 100.0).round() as u64
}

impl TransferProgress {
    /// See [`percent_complete`].
    #[must_use]
    pub fn percent(&self) -> u64 {
        percent_complete(self.loaded, self.total)
    }
}

/// Where a dataset load currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading {
        percent: u64,
    },
    Loaded,
    /// The load ended without a map; `percent` is the last progress seen.
    Failed {
        message: String,
        percent: u64,
    },
}

impl LoadState {
    /// Last reported percentage, if any progress was seen.
    #[must_use]
    pub fn percent(&self) -> Option<u64> {
        match self {
            LoadState::Loading { percent } | LoadState::Failed { percent, .. } => Some(*percent),
            LoadState::NotLoaded | LoadState::Loaded => None,
        }
    }

    /// Progress bar fill in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "percent is small")]
    pub fn fraction(&self) -> Option<f32> {
        self.percent().map(|p| (p as f32 / 100.0).clamp(0.0, 1.0))
    }

    /// Move to `Failed`, keeping the progress reached so far.
    #[must_use]
    pub fn fail(&self, message: impl Into<String>) -> Self {
        LoadState::Failed {
            message: message.into(),
            percent: self.percent().unwrap_or(0),
        }
    }

    /// The progress indicator is visible until the load reaches 100%.
    /// A failed load never completes, so its indicator stays up.
    #[must_use]
    pub fn shows_progress(&self) -> bool {
        match self {
            LoadState::NotLoaded | LoadState::Failed { .. } => true,
            LoadState::Loading { percent } => *percent < 100,
            LoadState::Loaded => false,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_loaded() {
        assert_eq!(percent_complete(50, Some(200)), 25);
    }

    #[test]
    fn test_zero_total_does_not_divide_by_zero() {
        assert_eq!(percent_complete(3, Some(0)), 300);
        assert_eq!(percent_complete(0, Some(0)), 0);
    }

    #[test]
    fn test_absent_total_uses_one() {
        assert_eq!(percent_complete(5, None), 500);
    }

    #[test]
    fn test_rounds_to_nearest() {
        assert_eq!(percent_complete(1, Some(3)), 33);
        assert_eq!(percent_complete(2, Some(3)), 67);
        assert_eq!(percent_complete(1, Some(200)), 1);
    }

    #[test]
    fn test_transfer_progress_percent() {
        let p = TransferProgress { loaded: 200, total: Some(200) };
        assert_eq!(p.percent(), 100);
    }

    #[test]
    fn test_fraction_is_clamped() {
        assert_eq!(LoadState::Loading { percent: 500 }.fraction(), Some(1.0));
        assert_eq!(LoadState::Loading { percent: 40 }.fraction(), Some(0.4));
        assert_eq!(LoadState::Loaded.fraction(), None);
    }

    #[test]
    fn test_progress_visibility() {
        assert!(LoadState::NotLoaded.shows_progress());
        assert!(LoadState::Loading { percent: 99 }.shows_progress());
        assert!(!LoadState::Loading { percent: 100 }.shows_progress());
        assert!(!LoadState::Loaded.shows_progress());
    }

    #[test]
    fn test_failure_keeps_progress_visible() {
        let failed = LoadState::Loading { percent: 37 }.fail("connection reset");
        assert_eq!(
            failed,
            LoadState::Failed {
                message: "connection reset".to_string(),
                percent: 37
            }
        );
        assert!(failed.shows_progress());
        assert!(failed.is_finished());
        assert_eq!(failed.fraction(), Some(0.37));

        let early = LoadState::NotLoaded.fail("refused");
        assert_eq!(early.percent(), Some(0));
    }
}
