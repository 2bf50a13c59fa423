use rand::Rng;
use std::time::Duration;

/// Human-like pauses between page interactions, scaled by configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    scale: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Pacing {
    pub fn new(scale: f64) -> Self {
        Self {
            scale: scale.max(0.0),
        }
    }

    /// No pauses at all.
    pub fn none() -> Self {
        Self::new(0.0)
    }

    pub fn scaled(&self, duration: Duration) -> Duration {
        duration.mul_f64(self.scale)
    }

    pub async fn pause(&self, duration: Duration) {
        let scaled = self.scaled(duration);
        if !scaled.is_zero() {
            tokio::time::sleep(scaled).await;
        }
    }

    pub async fn pause_secs(&self, seconds: f64) {
        self.pause(Duration::from_secs_f64(seconds)).await;
    }

    /// A uniformly random pause between `min` and `max` seconds.
    pub async fn between(&self, min: f64, max: f64) {
        let seconds = if max > min {
            rand::thread_rng().gen_range(min..max)
        } else {
            min
        };
        self.pause_secs(seconds).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_multiplies_durations() {
        let pacing = Pacing::new(0.5);
        assert_eq!(pacing.scaled(Duration::from_secs(2)), Duration::from_secs(1));
        assert_eq!(Pacing::none().scaled(Duration::from_secs(5)), Duration::ZERO);
        assert_eq!(Pacing::new(-3.0), Pacing::none());
    }

    #[tokio::test(start_paused = true)]
    async fn between_sleeps_within_bounds() {
        let start = tokio::time::Instant::now();
        Pacing::default().between(0.1, 0.3).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed <= Duration::from_millis(300));
    }
}
