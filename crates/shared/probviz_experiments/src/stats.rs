//! Running statistics folded one outcome at a time.
//!
//! Every update appends the new value to a history so the plot can show the
//! whole convergence path of the run so far.

/// Relative frequency of an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningFrequency {
    pub hits: u64,
    pub trials: u64,
    pub history: Vec<f64>,
}

impl RunningFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        }
        self.trials += 1;
        self.history.push(self.value());
    }

    /// Current frequency; 0 before the first trial.
    pub fn value(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.hits as f64 / self.trials as f64
        }
    }
}

/// Arithmetic mean of the values seen so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningMean {
    pub sum: f64,
    pub count: u64,
    pub history: Vec<f64>,
}

impl RunningMean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
        self.history.push(self.value());
    }

    pub fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_tracks_every_trial() {
        let mut f = RunningFrequency::new();
        assert_eq!(f.value(), 0.0);
        for hit in [true, false, true, true] {
            f.record(hit);
        }
        assert_eq!(f.hits, 3);
        assert_eq!(f.history, vec![1.0, 0.5, 2.0 / 3.0, 0.75]);
    }

    #[test]
    fn mean_history_is_prefix_means() {
        let mut m = RunningMean::new();
        for v in [1.0, 3.0, 5.0] {
            m.record(v);
        }
        assert_eq!(m.history, vec![1.0, 2.0, 3.0]);
        assert_eq!(m.value(), 3.0);
    }
}
