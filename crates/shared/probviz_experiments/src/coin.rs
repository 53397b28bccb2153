//! Coin tossing: the relative frequency of heads settles near `p`.

use probviz::driver::Trial;
use probviz::error::InvalidParameterError;
use probviz::prng::Prng;

use crate::plot::{PlotFrame, ReferenceLine, Series};
use crate::stats::RunningFrequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Heads,
    Tails,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoinToss {
    p_heads: f64,
}

impl Default for CoinToss {
    fn default() -> Self {
        Self { p_heads: 0.5 }
    }
}

impl CoinToss {
    pub fn new(p_heads: f64) -> Result<Self, InvalidParameterError> {
        if !(p_heads > 0.0 && p_heads < 1.0) {
            return Err(InvalidParameterError::new("p", "must lie in (0, 1)"));
        }
        Ok(Self { p_heads })
    }

    pub fn p_heads(&self) -> f64 {
        self.p_heads
    }
}

pub type CoinStats = RunningFrequency;

impl Trial for CoinToss {
    type Outcome = Side;
    type Statistic = CoinStats;

    fn sample(&self, rng: &mut Prng) -> Side {
        if rng.gen_bool(self.p_heads) {
            Side::Heads
        } else {
            Side::Tails
        }
    }

    fn fold(&self, stat: &mut CoinStats, side: Side) {
        stat.record(side == Side::Heads);
    }
}

/// Full frame for a run of `target` tosses; the x axis spans the whole run
/// from the first tick so the curve grows left to right.
pub fn plot_frame(trial: &CoinToss, stats: &CoinStats, target: u64) -> PlotFrame {
    PlotFrame::new(
        format!("Coin tossing: stability of frequency (tosses: {target})"),
        "Tosses",
        "Frequency of heads",
    )
    .with_ranges((1.0, target.max(2) as f64), (0.0, 1.0))
    .with_series(Series::indexed("Observed frequency", &stats.history))
    .with_reference(ReferenceLine::horizontal(
        format!("Probability ({})", trial.p_heads),
        trial.p_heads,
    ))
    .with_note(format!(
        "{} heads in {} tosses, frequency {:.4}",
        stats.hits,
        stats.trials,
        stats.value()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use probviz::driver::SimulationDriver;
    use probviz::scheduler::ManualScheduler;

    #[test]
    fn invalid_probability_is_rejected() {
        assert!(CoinToss::new(0.0).is_err());
        assert!(CoinToss::new(1.0).is_err());
        assert!(CoinToss::new(f64::NAN).is_err());
        assert_eq!(CoinToss::new(0.3).unwrap().p_heads(), 0.3);
    }

    #[test]
    fn driven_run_fills_history_to_target() {
        let mut sched = ManualScheduler::new();
        let mut driver = SimulationDriver::new(CoinToss::default(), 11);
        driver.start(1000, &mut sched).unwrap();
        for token in sched.advance(probviz::driver::TICK_INTERVAL * 60) {
            driver.on_timer(token, &mut sched);
        }
        let stats = driver.statistic();
        assert_eq!(stats.trials, 1000);
        assert_eq!(stats.history.len(), 1000);
        assert!((stats.value() - 0.5).abs() < 0.06);

        let frame = plot_frame(driver.trial(), stats, 1000);
        assert_eq!(frame.x_range, (1.0, 1000.0));
        assert_eq!(frame.reference_lines[0].value, 0.5);
        assert_eq!(frame.series[0].points.len(), 1000);
    }
}
