//! The two pages every topic offers.

use probviz::context::{Theme, ThemeListener};
use probviz::driver::{DriverState, SimulationDriver};
use probviz::error::InvalidParameterError;
use probviz::prng::Prng;
use probviz::scheduler::{Scheduler, TimerToken};
use probviz_experiments::catalog::{ExperimentKind, TopicKind};
use probviz_experiments::coin::{self, CoinToss};
use probviz_experiments::dice::{self, DiceView, DieRoll};
use probviz_experiments::distributions::{ContinuousKind, DiscreteKind};
use probviz_experiments::figures;
use probviz_experiments::params::ParamValues;
use probviz_experiments::plot::{PlotFrame, PlotSurface};
use tracing::{debug, warn};

use crate::markdown::{html_document, render_markdown};

/// Theme state shared by both page kinds.
#[derive(Debug, Clone, Copy)]
pub struct Appearance {
    pub theme: Theme,
    pub system_prefers_dark: bool,
}

impl Appearance {
    pub fn is_dark(&self) -> bool {
        self.theme.is_dark(self.system_prefers_dark)
    }
}

#[derive(Debug)]
pub struct DescriptionPage {
    topic: TopicKind,
    appearance: Appearance,
    html: String,
    renders: u32,
}

impl DescriptionPage {
    pub fn new(topic: TopicKind, appearance: Appearance) -> Self {
        let mut page = Self {
            topic,
            appearance,
            html: String::new(),
            renders: 0,
        };
        page.render();
        page
    }

    fn render(&mut self) {
        let body = render_markdown(self.topic.description());
        self.html = html_document(self.topic.display_name(), &body, self.appearance.is_dark());
        self.renders += 1;
    }

    pub fn markdown(&self) -> &'static str {
        self.topic.description()
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    #[cfg(test)]
    pub fn renders(&self) -> u32 {
        self.renders
    }
}

#[derive(Debug)]
enum Content {
    Coin(SimulationDriver<CoinToss>),
    Dice {
        driver: SimulationDriver<DieRoll>,
        view: DiceView,
    },
    Figure,
    Discrete(DiscreteKind),
    Continuous(ContinuousKind),
}

/// Interactive half of a topic: an animated run or a parameterized figure.
#[derive(Debug)]
pub struct ExperimentPage {
    topic: TopicKind,
    appearance: Appearance,
    content: Content,
    params: ParamValues,
    rng: Prng,
    frame: Option<PlotFrame>,
    redraw_pending: bool,
}

impl ExperimentPage {
    pub fn new(
        topic: TopicKind,
        appearance: Appearance,
        seed: u64,
    ) -> Result<Self, InvalidParameterError> {
        let (content, params) = match topic.experiment() {
            ExperimentKind::CoinTossing => {
                let params = ParamValues::defaults(topic.params());
                let trial = CoinToss::new(params.require("p")?)?;
                (Content::Coin(SimulationDriver::new(trial, seed)), params)
            }
            ExperimentKind::DiceRolling => (
                Content::Dice {
                    driver: SimulationDriver::new(DieRoll, seed),
                    view: DiceView::default(),
                },
                ParamValues::defaults(topic.params()),
            ),
            ExperimentKind::Figure => (Content::Figure, ParamValues::defaults(topic.params())),
            ExperimentKind::DiscreteFamily => {
                let kind = DiscreteKind::Binomial;
                (Content::Discrete(kind), ParamValues::defaults(kind.params()))
            }
            ExperimentKind::ContinuousFamily => {
                let kind = ContinuousKind::Normal;
                (Content::Continuous(kind), ParamValues::defaults(kind.params()))
            }
        };

        let mut page = Self {
            topic,
            appearance,
            content,
            params,
            rng: Prng::new(seed),
            frame: None,
            redraw_pending: false,
        };
        page.frame = page.build_frame()?;
        page.redraw_pending = page.frame.is_some();
        Ok(page)
    }

    pub fn params(&self) -> &ParamValues {
        &self.params
    }

    pub fn frame(&self) -> Option<&PlotFrame> {
        self.frame.as_ref()
    }

    pub fn is_animated(&self) -> bool {
        matches!(self.content, Content::Coin(_) | Content::Dice { .. })
    }

    pub fn state(&self) -> Option<DriverState> {
        match &self.content {
            Content::Coin(d) => Some(d.state()),
            Content::Dice { driver, .. } => Some(driver.state()),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == Some(DriverState::Running)
    }

    pub fn samples_drawn(&self) -> u64 {
        match &self.content {
            Content::Coin(d) => d.samples_drawn(),
            Content::Dice { driver, .. } => driver.samples_drawn(),
            _ => 0,
        }
    }

    #[cfg(test)]
    pub fn timer(&self) -> Option<TimerToken> {
        match &self.content {
            Content::Coin(d) => d.timer(),
            Content::Dice { driver, .. } => driver.timer(),
            _ => None,
        }
    }

    /// Starts a fresh run from the current sample count. Static pages just
    /// rebuild their figure.
    pub fn start(&mut self, scheduler: &mut dyn Scheduler) -> Result<(), InvalidParameterError> {
        let target = self.params.get("n").unwrap_or(0.0) as i64;
        match &mut self.content {
            Content::Coin(d) => d.start(target, scheduler)?,
            Content::Dice { driver, .. } => driver.start(target, scheduler)?,
            _ => {}
        }
        self.refresh()
    }

    /// Starts a run unless one is in progress or already finished.
    pub fn resume(&mut self, scheduler: &mut dyn Scheduler) -> Result<(), InvalidParameterError> {
        if self.state() == Some(DriverState::Idle) {
            self.start(scheduler)?;
        }
        Ok(())
    }

    pub fn cancel(&mut self, scheduler: &mut dyn Scheduler) {
        match &mut self.content {
            Content::Coin(d) => d.cancel(scheduler),
            Content::Dice { driver, .. } => driver.cancel(scheduler),
            _ => {}
        }
    }

    /// Validates and applies one control value.
    ///
    /// Animated experiments restart with the new value. On any error the
    /// previous value, run and figure are kept.
    pub fn set_param(
        &mut self,
        key: &str,
        value: f64,
        scheduler: &mut dyn Scheduler,
    ) -> Result<(), InvalidParameterError> {
        let previous = self.params.clone();
        self.params.set(key, value)?;

        let applied = match &mut self.content {
            Content::Coin(d) => self
                .params
                .require("p")
                .and_then(CoinToss::new)
                .map(|trial| d.set_trial(trial)),
            _ => Ok(()),
        };
        let applied = applied.and_then(|_| {
            if self.is_animated() {
                self.start(scheduler)
            } else {
                self.refresh()
            }
        });
        if applied.is_err() {
            self.params = previous;
        }
        debug!(topic = %self.topic, key, value, ok = applied.is_ok(), "parameter update");
        applied
    }

    /// Switches the plotted aspect of a dice run and restarts it.
    pub fn set_view(
        &mut self,
        view: DiceView,
        scheduler: &mut dyn Scheduler,
    ) -> Result<(), InvalidParameterError> {
        match &mut self.content {
            Content::Dice { view: current, .. } => *current = view,
            _ => {
                return Err(InvalidParameterError::new(
                    "mode",
                    "only the dice experiment has display modes",
                ))
            }
        }
        self.start(scheduler)
    }

    pub fn view(&self) -> Option<DiceView> {
        match &self.content {
            Content::Dice { view, .. } => Some(*view),
            _ => None,
        }
    }

    /// Selects the family shown by a distribution topic; its controls reset
    /// to their defaults.
    pub fn set_distribution(&mut self, name: &str) -> Result<(), InvalidParameterError> {
        let (content, params) = match &self.content {
            Content::Discrete(_) => {
                let kind: DiscreteKind = name.parse()?;
                (Content::Discrete(kind), ParamValues::defaults(kind.params()))
            }
            Content::Continuous(_) => {
                let kind: ContinuousKind = name.parse()?;
                (Content::Continuous(kind), ParamValues::defaults(kind.params()))
            }
            _ => {
                return Err(InvalidParameterError::new(
                    "dist",
                    "only the distribution topics select a family",
                ))
            }
        };
        self.content = content;
        self.params = params;
        self.refresh()
    }

    /// Selects the family after the current one, wrapping around.
    pub fn next_distribution(&mut self) -> Result<(), InvalidParameterError> {
        let next = match self.content {
            Content::Discrete(kind) => next_in(DiscreteKind::all(), kind).label(),
            Content::Continuous(kind) => next_in(ContinuousKind::all(), kind).label(),
            _ => {
                return Err(InvalidParameterError::new(
                    "dist",
                    "only the distribution topics select a family",
                ))
            }
        };
        self.set_distribution(next)
    }

    /// Name of the family shown by a distribution topic.
    pub fn distribution(&self) -> Option<&'static str> {
        match self.content {
            Content::Discrete(kind) => Some(kind.display_name()),
            Content::Continuous(kind) => Some(kind.display_name()),
            _ => None,
        }
    }

    /// Dispatches a scheduler firing; returns whether a new frame is ready.
    pub fn on_timer(&mut self, token: TimerToken, scheduler: &mut dyn Scheduler) -> bool {
        let ticked = match &mut self.content {
            Content::Coin(d) => d.on_timer(token, scheduler).is_some() && d.take_redraw(),
            Content::Dice { driver, .. } => {
                driver.on_timer(token, scheduler).is_some() && driver.take_redraw()
            }
            _ => false,
        };
        if ticked {
            if let Err(err) = self.refresh() {
                warn!(topic = %self.topic, error = %err, "frame rebuild failed");
                return false;
            }
        }
        ticked
    }

    /// Paints the current frame if something changed since the last paint.
    pub fn paint(&mut self, surface: &mut dyn PlotSurface) -> bool {
        if !std::mem::take(&mut self.redraw_pending) {
            return false;
        }
        match &self.frame {
            Some(frame) => {
                surface.redraw(frame, self.appearance.is_dark());
                true
            }
            None => false,
        }
    }

    /// Marks the current frame for repainting, e.g. after the surrounding
    /// screen was cleared.
    pub fn request_redraw(&mut self) {
        self.redraw_pending = self.frame.is_some();
    }

    fn refresh(&mut self) -> Result<(), InvalidParameterError> {
        self.frame = self.build_frame()?;
        self.redraw_pending = true;
        Ok(())
    }

    fn build_frame(&mut self) -> Result<Option<PlotFrame>, InvalidParameterError> {
        let frame = match &mut self.content {
            Content::Coin(d) => Some(coin::plot_frame(d.trial(), d.statistic(), d.target_count())),
            Content::Dice { driver, view } => Some(dice::plot_frame(
                *view,
                driver.statistic(),
                driver.target_count(),
            )),
            Content::Figure => self.topic.figure(&self.params, &mut self.rng)?,
            Content::Discrete(kind) => Some(figures::discrete_distribution(*kind, &self.params)?),
            Content::Continuous(kind) => {
                Some(figures::continuous_distribution(*kind, &self.params)?)
            }
        };
        Ok(frame)
    }
}

fn next_in<T: Copy + PartialEq>(all: &[T], current: T) -> T {
    let i = all.iter().position(|k| *k == current).unwrap_or(0);
    all[(i + 1) % all.len()]
}

#[derive(Debug)]
pub enum Page {
    Description(DescriptionPage),
    Experiment(ExperimentPage),
}

impl Page {
    pub fn as_experiment_mut(&mut self) -> Option<&mut ExperimentPage> {
        match self {
            Page::Experiment(p) => Some(p),
            Page::Description(_) => None,
        }
    }

    pub fn as_experiment(&self) -> Option<&ExperimentPage> {
        match self {
            Page::Experiment(p) => Some(p),
            Page::Description(_) => None,
        }
    }

    pub fn as_description(&self) -> Option<&DescriptionPage> {
        match self {
            Page::Description(p) => Some(p),
            Page::Experiment(_) => None,
        }
    }
}

impl ThemeListener for Page {
    fn on_theme_changed(&mut self, theme: Theme) {
        match self {
            Page::Description(p) => {
                p.appearance.theme = theme;
                p.render();
            }
            Page::Experiment(p) => {
                p.appearance.theme = theme;
                p.redraw_pending = p.frame.is_some();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probviz::driver::TICK_INTERVAL;
    use probviz::scheduler::ManualScheduler;

    const LIGHT: Appearance = Appearance {
        theme: Theme::Light,
        system_prefers_dark: false,
    };

    struct Recorder {
        frames: Vec<(PlotFrame, bool)>,
    }

    impl PlotSurface for Recorder {
        fn redraw(&mut self, frame: &PlotFrame, dark: bool) {
            self.frames.push((frame.clone(), dark));
        }
    }

    fn drain(page: &mut ExperimentPage, sched: &mut ManualScheduler, ticks: u32) -> u32 {
        let mut redraws = 0;
        for token in sched.advance(TICK_INTERVAL * ticks) {
            redraws += page.on_timer(token, sched) as u32;
        }
        redraws
    }

    #[test]
    fn coin_page_runs_to_completion() {
        let mut sched = ManualScheduler::new();
        let mut page = ExperimentPage::new(TopicKind::CoinTossing, LIGHT, 1).unwrap();
        assert_eq!(page.state(), Some(DriverState::Idle));
        page.resume(&mut sched).unwrap();
        assert!(page.is_running());

        assert_eq!(drain(&mut page, &mut sched, 60), 50);
        assert_eq!(page.state(), Some(DriverState::Completed));
        assert_eq!(page.samples_drawn(), 100);

        // Completed runs are not restarted by a revisit.
        page.resume(&mut sched).unwrap();
        assert_eq!(page.state(), Some(DriverState::Completed));
    }

    #[test]
    fn invalid_sample_count_keeps_the_current_run() {
        let mut sched = ManualScheduler::new();
        let mut page = ExperimentPage::new(TopicKind::CoinTossing, LIGHT, 1).unwrap();
        page.start(&mut sched).unwrap();
        drain(&mut page, &mut sched, 5);
        let before = page.samples_drawn();

        assert!(page.set_param("n", 5.0, &mut sched).is_err());
        assert!(page.set_param("p", 1.5, &mut sched).is_err());
        assert_eq!(page.params().get("n"), Some(100.0));
        assert_eq!(page.samples_drawn(), before);
        assert!(page.is_running());

        page.set_param("n", 500.0, &mut sched).unwrap();
        assert_eq!(page.samples_drawn(), 0);
        assert_eq!(drain(&mut page, &mut sched, 50), 50);
        assert_eq!(page.samples_drawn(), 500);
    }

    #[test]
    fn coin_probability_change_restarts_with_new_trial() {
        let mut sched = ManualScheduler::new();
        let mut page = ExperimentPage::new(TopicKind::CoinTossing, LIGHT, 4).unwrap();
        page.start(&mut sched).unwrap();
        drain(&mut page, &mut sched, 5);

        page.set_param("p", 0.3, &mut sched).unwrap();
        assert_eq!(page.samples_drawn(), 0);
        assert_eq!(page.frame().unwrap().reference_lines[0].value, 0.3);

        let before = page.params().clone();
        assert!(page.set_param("p", 0.0, &mut sched).is_err());
        assert_eq!(page.params(), &before);
        assert_eq!(page.frame().unwrap().reference_lines[0].value, 0.3);
        assert!(page.is_running());
    }

    #[test]
    fn families_cycle_in_catalog_order() {
        let mut page = ExperimentPage::new(TopicKind::DiscreteDistributions, LIGHT, 0).unwrap();
        let first = page.distribution();
        for _ in 0..DiscreteKind::all().len() {
            page.next_distribution().unwrap();
        }
        assert_eq!(page.distribution(), first);

        page.next_distribution().unwrap();
        assert_ne!(page.distribution(), first);
        assert!(ExperimentPage::new(TopicKind::CoinTossing, LIGHT, 0)
            .unwrap()
            .next_distribution()
            .is_err());
    }

    #[test]
    fn dice_view_toggle_restarts() {
        let mut sched = ManualScheduler::new();
        let mut page = ExperimentPage::new(TopicKind::DiceRolling, LIGHT, 2).unwrap();
        page.start(&mut sched).unwrap();
        drain(&mut page, &mut sched, 10);
        assert_eq!(page.samples_drawn(), 20);

        page.set_view(DiceView::Expectation, &mut sched).unwrap();
        assert_eq!(page.samples_drawn(), 0);
        assert_eq!(page.view(), Some(DiceView::Expectation));
        assert_eq!(sched.pending(), 1);
        assert_eq!(page.frame().unwrap().reference_lines[0].value, 3.5);
    }

    #[test]
    fn rejected_figure_parameter_keeps_previous_frame() {
        let mut sched = ManualScheduler::new();
        let mut page = ExperimentPage::new(TopicKind::Binomial, LIGHT, 0).unwrap();
        let before = page.frame().cloned();

        let err = page.set_param("p", 0.0, &mut sched).unwrap_err();
        assert_eq!(err.name, "p");
        assert_eq!(page.frame().cloned(), before);
        assert_eq!(page.params().get("p"), Some(0.5));

        page.set_param("n", 20.0, &mut sched).unwrap();
        assert_eq!(page.frame().unwrap().series[0].points.len(), 21);
    }

    #[test]
    fn family_selection_resets_controls() {
        let mut page = ExperimentPage::new(TopicKind::ContinuousDistributions, LIGHT, 0).unwrap();
        page.set_distribution("gamma").unwrap();
        assert_eq!(page.params().get("alpha"), Some(2.0));
        assert!(page.frame().unwrap().title.starts_with("Gamma"));
        assert!(page.set_distribution("poisson").is_err());

        let mut figure = ExperimentPage::new(TopicKind::Poisson, LIGHT, 0).unwrap();
        assert!(figure.set_distribution("normal").is_err());
    }

    #[test]
    fn theme_change_rerenders_pages() {
        let mut desc = Page::Description(DescriptionPage::new(TopicKind::Poisson, LIGHT));
        desc.on_theme_changed(Theme::Dark);
        let d = desc.as_description().unwrap();
        assert_eq!(d.renders(), 2);
        assert!(d.html().contains(r#"data-theme="dark""#));

        let mut surface = Recorder { frames: Vec::new() };
        let exp = ExperimentPage::new(TopicKind::OneDimNormal, LIGHT, 0).unwrap();
        let mut page = Page::Experiment(exp);
        let exp = page.as_experiment_mut().unwrap();
        assert!(exp.paint(&mut surface));
        assert!(!exp.paint(&mut surface));

        page.on_theme_changed(Theme::Dark);
        assert!(page.as_experiment_mut().unwrap().paint(&mut surface));
        assert_eq!(surface.frames.len(), 2);
        assert!(surface.frames[1].1);
    }
}
