//! Dice rolling: frequencies of two events and the running mean.

use std::fmt;
use std::str::FromStr;

use probviz::driver::Trial;
use probviz::error::InvalidParameterError;
use probviz::prng::Prng;

use crate::plot::{PlotFrame, ReferenceLine, Series};
use crate::stats::{RunningFrequency, RunningMean};

pub const FACES: usize = 6;

/// One fair six-sided die.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DieRoll;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiceStats {
    pub counts: [u64; FACES],
    pub rolls: u64,
    /// Frequency of a face below four.
    pub below_four: RunningFrequency,
    /// Frequency of a five.
    pub equals_five: RunningFrequency,
    pub mean: RunningMean,
}

impl Trial for DieRoll {
    /// Face value, 1 through 6.
    type Outcome = u8;
    type Statistic = DiceStats;

    fn sample(&self, rng: &mut Prng) -> u8 {
        rng.gen_range_u32(1, FACES as u32 + 1) as u8
    }

    fn fold(&self, stat: &mut DiceStats, face: u8) {
        stat.counts[usize::from(face - 1)] += 1;
        stat.rolls += 1;
        stat.below_four.record(face < 4);
        stat.equals_five.record(face == 5);
        stat.mean.record(f64::from(face));
    }
}

/// Which aspect of a dice run is plotted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiceView {
    #[default]
    Frequency,
    Expectation,
}

impl DiceView {
    pub fn label(self) -> &'static str {
        match self {
            DiceView::Frequency => "frequency",
            DiceView::Expectation => "expectation",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            DiceView::Frequency => DiceView::Expectation,
            DiceView::Expectation => DiceView::Frequency,
        }
    }
}

impl fmt::Display for DiceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DiceView {
    type Err = InvalidParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frequency" | "freq" => Ok(DiceView::Frequency),
            "expectation" | "mean" => Ok(DiceView::Expectation),
            other => Err(InvalidParameterError::new(
                "mode",
                format!("unknown mode `{other}` (expected frequency|expectation)"),
            )),
        }
    }
}

pub fn plot_frame(view: DiceView, stats: &DiceStats, target: u64) -> PlotFrame {
    let x_range = (1.0, target.max(2) as f64);
    let counts = stats
        .counts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ");

    match view {
        DiceView::Frequency => PlotFrame::new(
            format!("Dice rolling: stability of frequency (rolls: {target})"),
            "Rolls",
            "Frequency",
        )
        .with_ranges(x_range, (0.0, 1.0))
        .with_series(Series::indexed("Frequency of < 4", &stats.below_four.history))
        .with_series(Series::indexed("Frequency of = 5", &stats.equals_five.history))
        .with_reference(ReferenceLine::horizontal("P(< 4) = 1/2", 0.5))
        .with_reference(ReferenceLine::horizontal("P(= 5) = 1/6", 1.0 / 6.0)),
        DiceView::Expectation => PlotFrame::new(
            format!("Dice rolling: meaning of expectation (rolls: {target})"),
            "Rolls",
            "Mean",
        )
        .with_ranges(x_range, (1.0, 6.0))
        .with_series(Series::indexed("Observed mean", &stats.mean.history))
        .with_reference(ReferenceLine::horizontal("E[X] = 3.5", 3.5)),
    }
    .with_note(format!("face counts 1-6: {counts}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use probviz::driver::{DriverState, SimulationDriver, TICK_INTERVAL};
    use probviz::scheduler::ManualScheduler;

    #[test]
    fn fold_updates_every_statistic() {
        let mut stats = DiceStats::default();
        for face in [1, 5, 6, 3] {
            DieRoll.fold(&mut stats, face);
        }
        assert_eq!(stats.counts, [1, 0, 1, 0, 1, 1]);
        assert_eq!(stats.below_four.history, vec![1.0, 0.5, 1.0 / 3.0, 0.5]);
        assert_eq!(stats.equals_five.hits, 1);
        assert_eq!(stats.mean.value(), 3.75);
    }

    #[test]
    fn rolls_stay_on_the_die() {
        let mut rng = Prng::new(3);
        let mut seen = [false; FACES];
        for _ in 0..600 {
            let f = DieRoll.sample(&mut rng);
            assert!((1..=6).contains(&f));
            seen[usize::from(f - 1)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn toggling_view_restarts_from_empty() {
        let mut sched = ManualScheduler::new();
        let mut driver = SimulationDriver::new(DieRoll, 5);
        driver.start(100, &mut sched).unwrap();
        for token in sched.advance(TICK_INTERVAL * 10) {
            driver.on_timer(token, &mut sched);
        }
        assert_eq!(driver.samples_drawn(), 20);

        let view = DiceView::Frequency.toggle();
        driver.start(100, &mut sched).unwrap();
        assert_eq!(driver.statistic().rolls, 0);
        assert_eq!(sched.pending(), 1);

        for token in sched.advance(TICK_INTERVAL * 50) {
            driver.on_timer(token, &mut sched);
        }
        assert_eq!(driver.state(), DriverState::Completed);
        assert_eq!(driver.timer(), None);
        assert_eq!(sched.pending(), 0);

        let frame = plot_frame(view, driver.statistic(), 100);
        assert_eq!(frame.reference_lines[0].value, 3.5);
        assert_eq!(frame.series[0].points.len(), 100);
        assert_eq!(driver.statistic().counts.iter().sum::<u64>(), 100);
    }

    #[test]
    fn modes_parse() {
        assert_eq!("Mean".parse::<DiceView>(), Ok(DiceView::Expectation));
        assert!("median".parse::<DiceView>().is_err());
    }
}
