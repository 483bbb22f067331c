// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Consecutive-failure tracking.

/// Turns a stream of poll outcomes into an availability flag.
///
/// The flag drops after `max_errors` consecutive failures and comes back on
/// the first success.
///
/// # Examples
///
/// ```
/// use cozy_power::sensor::Availability;
///
/// let mut availability = Availability::new();
/// availability.record_failure();
/// availability.record_failure();
/// assert!(availability.is_available());
///
/// availability.record_failure();
/// assert!(!availability.is_available());
///
/// availability.record_success();
/// assert!(availability.is_available());
/// assert_eq!(availability.error_count(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    error_count: u32,
    max_errors: u32,
    available: bool,
}

impl Availability {
    /// Consecutive failures after which a device is reported unavailable.
    pub const DEFAULT_MAX_ERRORS: u32 = 3;

    /// Creates a tracker with the default threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(Self::DEFAULT_MAX_ERRORS)
    }

    /// Creates a tracker with a custom threshold (at least 1).
    #[must_use]
    pub fn with_threshold(max_errors: u32) -> Self {
        Self {
            error_count: 0,
            max_errors: max_errors.max(1),
            available: true,
        }
    }

    /// Records a successful poll.
    pub fn record_success(&mut self) {
        self.error_count = 0;
        self.available = true;
    }

    /// Records a failed poll.
    ///
    /// Returns true if the threshold is reached, i.e. the device is now
    /// (or still) unavailable.
    pub fn record_failure(&mut self) -> bool {
        self.error_count = self.error_count.saturating_add(1);
        if self.error_count >= self.max_errors {
            self.available = false;
        }
        !self.available
    }

    /// Returns the availability flag.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Returns the number of consecutive failures.
    #[must_use]
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Returns the threshold.
    #[must_use]
    pub fn max_errors(&self) -> u32 {
        self.max_errors
    }
}

impl Default for Availability {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_available() {
        let availability = Availability::default();
        assert!(availability.is_available());
        assert_eq!(availability.error_count(), 0);
        assert_eq!(availability.max_errors(), 3);
    }

    #[test]
    fn three_failures_flip_availability() {
        let mut availability = Availability::new();
        assert!(!availability.record_failure());
        assert!(!availability.record_failure());
        assert!(availability.record_failure());
        assert!(!availability.is_available());

        assert!(availability.record_failure());
        assert_eq!(availability.error_count(), 4);
    }

    #[test]
    fn success_in_between_resets_count() {
        let mut availability = Availability::new();
        availability.record_failure();
        availability.record_failure();
        availability.record_success();
        assert_eq!(availability.error_count(), 0);

        availability.record_failure();
        availability.record_failure();
        assert!(availability.is_available());
    }

    #[test]
    fn threshold_is_at_least_one() {
        let mut availability = Availability::with_threshold(0);
        assert_eq!(availability.max_errors(), 1);
        assert!(availability.record_failure());
    }
}
