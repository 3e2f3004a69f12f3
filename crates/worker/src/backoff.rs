use std::time::Duration;

use rand::Rng;

/// Bounded exponential backoff with jitter.
///
/// Attempt `n` (0-based) waits `base * 2^n`, capped at `max`, then shortened
/// by a random fraction of at most `jitter`. Attempts at or beyond
/// `max_attempts` are refused.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
	pub base: Duration,
	pub max: Duration,
	pub max_attempts: u32,
	/// Fraction in `0.0..=1.0`; values outside are clamped.
	pub jitter: f64,
}

impl Backoff {
	/// A policy that never retries.
	pub const fn never() -> Self {
		Self {
			base: Duration::ZERO,
			max: Duration::ZERO,
			max_attempts: 0,
			jitter: 0.0,
		}
	}

	/// Returns whether another attempt is allowed after `attempt` earlier ones.
	pub fn allows(&self, attempt: u32) -> bool {
		attempt < self.max_attempts
	}

	/// Un-jittered delay for `attempt`.
	pub fn ceiling(&self, attempt: u32) -> Duration {
		let factor = 2u32.saturating_pow(attempt);
		self.base.saturating_mul(factor).min(self.max)
	}

	/// Jittered delay before `attempt`, or `None` once attempts are exhausted.
	pub fn delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Option<Duration> {
		if !self.allows(attempt) {
			return None;
		}
		let ceiling = self.ceiling(attempt);
		let jitter = if self.jitter.is_finite() { self.jitter.clamp(0.0, 1.0) } else { 0.0 };
		if jitter == 0.0 || ceiling.is_zero() {
			return Some(ceiling);
		}
		let factor = rng.random_range((1.0 - jitter)..=1.0);
		Some(ceiling.mul_f64(factor))
	}
}

impl Default for Backoff {
	fn default() -> Self {
		Self {
			base: Duration::from_millis(500),
			max: Duration::from_secs(30),
			max_attempts: 6,
			jitter: 0.2,
		}
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;

	fn policy() -> Backoff {
		Backoff {
			base: Duration::from_millis(100),
			max: Duration::from_millis(1_000),
			max_attempts: 5,
			jitter: 0.0,
		}
	}

	#[test]
	fn delays_double_until_capped() {
		let backoff = policy();
		let mut rng = StdRng::seed_from_u64(1);
		let delays: Vec<_> = (0..5).map(|n| backoff.delay(n, &mut rng)).collect();
		assert_eq!(
			delays,
			vec![
				Some(Duration::from_millis(100)),
				Some(Duration::from_millis(200)),
				Some(Duration::from_millis(400)),
				Some(Duration::from_millis(800)),
				Some(Duration::from_millis(1_000)),
			]
		);
	}

	#[test]
	fn refuses_after_max_attempts() {
		let backoff = policy();
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(backoff.delay(5, &mut rng), None);
		assert_eq!(Backoff::never().delay(0, &mut rng), None);
	}

	#[test]
	fn jitter_stays_within_band() {
		let backoff = Backoff { jitter: 0.5, ..policy() };
		let mut rng = StdRng::seed_from_u64(42);
		for attempt in 0..5 {
			let ceiling = backoff.ceiling(attempt);
			let delay = backoff.delay(attempt, &mut rng).unwrap();
			assert!(delay <= ceiling, "{delay:?} > {ceiling:?}");
			assert!(delay >= ceiling / 2, "{delay:?} < half of {ceiling:?}");
		}
	}

	#[test]
	fn huge_attempt_numbers_saturate() {
		let backoff = Backoff {
			max_attempts: u32::MAX,
			..policy()
		};
		assert_eq!(backoff.ceiling(64), Duration::from_millis(1_000));
	}
}
