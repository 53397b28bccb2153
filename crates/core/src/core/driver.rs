//! Incremental simulation driver.
//!
//! Draws independent trials in fixed-size batches, one batch per timer tick,
//! folding every outcome into a running statistic in draw order. A run always
//! finishes in roughly [`TARGET_REDRAWS`] ticks whatever the target count.

use std::time::Duration;
use tracing::{debug, trace};

use crate::error::InvalidParameterError;
use crate::prng::Prng;
use crate::scheduler::{Scheduler, TimerToken};

/// Delay between two batches.
pub const TICK_INTERVAL: Duration = Duration::from_millis(20);

/// Approximate number of batches (and redraws) per run.
pub const TARGET_REDRAWS: u64 = 50;

pub fn batch_size_for(target_count: u64) -> u64 {
    (target_count / TARGET_REDRAWS).max(1)
}

/// One kind of independent, identically distributed trial.
pub trait Trial {
    type Outcome: Copy;
    /// Left-fold accumulator; `Default` is the empty run.
    type Statistic: Default + Clone;

    fn sample(&self, rng: &mut Prng) -> Self::Outcome;

    /// Folds one outcome using only the state accumulated before it.
    fn fold(&self, stat: &mut Self::Statistic, outcome: Self::Outcome);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Samples drawn by this tick.
    pub drawn: u64,
    pub samples_drawn: u64,
    pub completed: bool,
}

#[derive(Debug)]
pub struct SimulationDriver<T: Trial> {
    trial: T,
    rng: Prng,
    state: DriverState,
    target_count: u64,
    batch_size: u64,
    samples_drawn: u64,
    statistic: T::Statistic,
    timer: Option<TimerToken>,
    redraw_requested: bool,
}

impl<T: Trial> SimulationDriver<T> {
    pub fn new(trial: T, seed: u64) -> Self {
        Self {
            trial,
            rng: Prng::new(seed),
            state: DriverState::Idle,
            target_count: 0,
            batch_size: 1,
            samples_drawn: 0,
            statistic: T::Statistic::default(),
            timer: None,
            redraw_requested: false,
        }
    }

    /// Starts a fresh run of `target_count` samples.
    ///
    /// Any run in progress is discarded and its timer cancelled. A
    /// non-positive count is rejected without touching the driver.
    pub fn start(
        &mut self,
        target_count: i64,
        scheduler: &mut dyn Scheduler,
    ) -> Result<(), InvalidParameterError> {
        if target_count <= 0 {
            return Err(InvalidParameterError::new(
                "target_count",
                format!("must be a positive integer, got {target_count}"),
            ));
        }
        let target_count = target_count as u64;

        self.stop_timer(scheduler);
        self.target_count = target_count;
        self.batch_size = batch_size_for(target_count);
        self.samples_drawn = 0;
        self.statistic = T::Statistic::default();
        self.state = DriverState::Running;
        self.redraw_requested = true;
        self.timer = Some(scheduler.schedule_repeating(TICK_INTERVAL));

        debug!(
            target_count,
            batch_size = self.batch_size,
            "simulation run started"
        );
        Ok(())
    }

    /// Draws the next batch. A no-op unless the driver is running.
    pub fn tick(&mut self, scheduler: &mut dyn Scheduler) -> TickReport {
        if self.state != DriverState::Running {
            return TickReport {
                drawn: 0,
                samples_drawn: self.samples_drawn,
                completed: self.state == DriverState::Completed,
            };
        }

        let remaining = self.target_count - self.samples_drawn;
        let drawn = self.batch_size.min(remaining);
        for _ in 0..drawn {
            let outcome = self.trial.sample(&mut self.rng);
            self.trial.fold(&mut self.statistic, outcome);
        }
        self.samples_drawn += drawn;
        self.redraw_requested = true;
        trace!(drawn, samples_drawn = self.samples_drawn, "simulation tick");

        let completed = self.samples_drawn == self.target_count;
        if completed {
            self.stop_timer(scheduler);
            self.state = DriverState::Completed;
            debug!(samples_drawn = self.samples_drawn, "simulation run completed");
        }

        TickReport {
            drawn,
            samples_drawn: self.samples_drawn,
            completed,
        }
    }

    /// Ticks only if `token` is this run's live timer.
    pub fn on_timer(
        &mut self,
        token: TimerToken,
        scheduler: &mut dyn Scheduler,
    ) -> Option<TickReport> {
        if self.timer != Some(token) {
            return None;
        }
        Some(self.tick(scheduler))
    }

    /// Stops the pending timer, e.g. when the page is navigated away from.
    /// The statistic gathered so far is kept for display.
    pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        if self.state == DriverState::Running {
            debug!(samples_drawn = self.samples_drawn, "simulation run cancelled");
            self.state = DriverState::Idle;
        }
        self.stop_timer(scheduler);
    }

    fn stop_timer(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(token) = self.timer.take() {
            scheduler.cancel(token);
        }
    }

    /// Replaces the trial definition. Callers restart the run afterwards.
    pub fn set_trial(&mut self, trial: T) {
        self.trial = trial;
    }

    pub fn trial(&self) -> &T {
        &self.trial
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    pub fn statistic(&self) -> &T::Statistic {
        &self.statistic
    }

    pub fn samples_drawn(&self) -> u64 {
        self.samples_drawn
    }

    pub fn target_count(&self) -> u64 {
        self.target_count
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn timer(&self) -> Option<TimerToken> {
        self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    struct Bernoulli {
        p: f64,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Successes {
        hits: u64,
        draws: u64,
        history: Vec<f64>,
    }

    impl Successes {
        fn frequency(&self) -> f64 {
            self.hits as f64 / self.draws as f64
        }
    }

    impl Trial for Bernoulli {
        type Outcome = bool;
        type Statistic = Successes;

        fn sample(&self, rng: &mut Prng) -> bool {
            rng.gen_bool(self.p)
        }

        fn fold(&self, stat: &mut Successes, hit: bool) {
            stat.hits += hit as u64;
            stat.draws += 1;
            stat.history.push(stat.frequency());
        }
    }

    fn driver(seed: u64) -> SimulationDriver<Bernoulli> {
        SimulationDriver::new(Bernoulli { p: 0.5 }, seed)
    }

    fn run_to_end(d: &mut SimulationDriver<Bernoulli>, s: &mut ManualScheduler) -> u32 {
        let mut ticks = 0;
        while d.state() == DriverState::Running {
            d.tick(s);
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn batch_size_targets_fifty_redraws() {
        assert_eq!(batch_size_for(1), 1);
        assert_eq!(batch_size_for(49), 1);
        assert_eq!(batch_size_for(50), 1);
        assert_eq!(batch_size_for(100), 2);
        assert_eq!(batch_size_for(1000), 20);
    }

    #[test]
    fn restart_discards_previous_run() {
        let mut s = ManualScheduler::new();
        let mut d = driver(1);
        d.start(500, &mut s).unwrap();
        for _ in 0..5 {
            d.tick(&mut s);
        }
        assert_eq!(d.samples_drawn(), 50);
        let old = d.timer().unwrap();

        d.start(200, &mut s).unwrap();
        assert_eq!(d.samples_drawn(), 0);
        assert_eq!(d.statistic(), &Successes::default());
        assert_eq!(d.state(), DriverState::Running);
        assert_eq!(d.batch_size(), 4);
        assert!(!s.is_scheduled(old));
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn restart_after_completion_resets() {
        let mut s = ManualScheduler::new();
        let mut d = driver(2);
        d.start(30, &mut s).unwrap();
        run_to_end(&mut d, &mut s);
        assert_eq!(d.state(), DriverState::Completed);

        d.start(10, &mut s).unwrap();
        assert_eq!(d.samples_drawn(), 0);
        assert!(d.statistic().history.is_empty());
    }

    #[test]
    fn run_completes_exactly_at_target() {
        for target in [1u64, 2, 49, 50, 51, 99, 100, 101, 999, 1000, 12_345] {
            let mut s = ManualScheduler::new();
            let mut d = driver(target);
            d.start(target as i64, &mut s).unwrap();
            let ticks = run_to_end(&mut d, &mut s);

            assert_eq!(d.samples_drawn(), target, "target {target}");
            assert_eq!(d.statistic().draws, target);
            assert_eq!(d.state(), DriverState::Completed);
            assert_eq!(s.pending(), 0);
            assert!(ticks as u64 <= 2 * TARGET_REDRAWS, "target {target}: {ticks}");
        }
    }

    #[test]
    fn completed_driver_ignores_further_ticks() {
        let mut s = ManualScheduler::new();
        let mut d = driver(4);
        d.start(3, &mut s).unwrap();
        run_to_end(&mut d, &mut s);
        let r = d.tick(&mut s);
        assert_eq!(r.drawn, 0);
        assert!(r.completed);
        assert_eq!(d.samples_drawn(), 3);
    }

    #[test]
    fn seeded_runs_reproduce_every_tick() {
        let record = |seed: u64| {
            let mut s = ManualScheduler::new();
            let mut d = driver(seed);
            d.start(777, &mut s).unwrap();
            let mut snapshots = Vec::new();
            while d.is_running() {
                d.tick(&mut s);
                snapshots.push(d.statistic().clone());
            }
            snapshots
        };

        let a = record(99);
        let b = record(99);
        assert_eq!(a, b);
        assert_ne!(a, record(100));

        let last = a.last().unwrap();
        let mut rng = Prng::new(99);
        let hits = (0..777).filter(|_| rng.gen_bool(0.5)).count() as u64;
        assert_eq!(last.hits, hits);
        assert_eq!(last.frequency(), hits as f64 / 777.0);
        assert_eq!(last.history.len(), 777);
    }

    #[test]
    fn single_sample_run_takes_one_tick() {
        let mut s = ManualScheduler::new();
        let mut d = driver(5);
        d.start(1, &mut s).unwrap();
        assert_eq!(d.batch_size(), 1);

        let r = d.tick(&mut s);
        assert_eq!(r.drawn, 1);
        assert!(r.completed);
        let f = d.statistic().frequency();
        assert!(f == 0.0 || f == 1.0);
    }

    #[test]
    fn non_positive_target_is_rejected() {
        let mut s = ManualScheduler::new();
        let mut d = driver(6);
        for bad in [0, -5] {
            let err = d.start(bad, &mut s).unwrap_err();
            assert_eq!(err.name, "target_count");
            assert_eq!(d.state(), DriverState::Idle);
            assert!(d.timer().is_none());
            assert_eq!(s.pending(), 0);
        }
    }

    #[test]
    fn invalid_restart_keeps_the_current_run() {
        let mut s = ManualScheduler::new();
        let mut d = driver(7);
        d.start(100, &mut s).unwrap();
        d.tick(&mut s);
        assert!(d.start(-1, &mut s).is_err());
        assert!(d.is_running());
        assert_eq!(d.samples_drawn(), 2);
    }

    #[test]
    fn scheduler_drives_run_and_stale_tokens_are_ignored() {
        let mut s = ManualScheduler::new();
        let mut d = driver(8);
        d.start(100, &mut s).unwrap();
        let first = d.timer().unwrap();

        s.advance_by(Duration::from_millis(100));
        while let Some(token) = s.next_fired() {
            d.on_timer(token, &mut s);
        }
        assert_eq!(d.samples_drawn(), 10);

        d.start(100, &mut s).unwrap();
        assert!(d.on_timer(first, &mut s).is_none());
        assert_eq!(d.samples_drawn(), 0);

        s.advance_by(TICK_INTERVAL * 60);
        let mut ticks = 0;
        while let Some(token) = s.next_fired() {
            if d.on_timer(token, &mut s).is_some() {
                ticks += 1;
            }
        }
        assert_eq!(ticks, 50);
        assert_eq!(d.state(), DriverState::Completed);
        assert_eq!(d.samples_drawn(), 100);
    }

    #[test]
    fn cancel_stops_timer_and_keeps_statistic() {
        let mut s = ManualScheduler::new();
        let mut d = driver(9);
        d.start(100, &mut s).unwrap();
        d.tick(&mut s);
        d.cancel(&mut s);

        assert_eq!(d.state(), DriverState::Idle);
        assert_eq!(s.pending(), 0);
        assert_eq!(d.statistic().draws, 2);
        assert!(s.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn redraw_flag_is_consumed() {
        let mut s = ManualScheduler::new();
        let mut d = driver(10);
        assert!(!d.take_redraw());
        d.start(10, &mut s).unwrap();
        assert!(d.take_redraw());
        assert!(!d.take_redraw());
        d.tick(&mut s);
        assert!(d.take_redraw());
    }
}
