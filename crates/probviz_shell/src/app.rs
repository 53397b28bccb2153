//! Wires the catalog into a lazy router and drives the simulation clock.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use probviz::context::{AppContext, Settings, Theme};
use probviz::error::PageBuildError;
use probviz::notice::{Notice, NoticeDebouncer};
use probviz::router::{PageKey, Route, Router};
use probviz::scheduler::ManualScheduler;
use probviz_experiments::catalog::TopicKind;
use tracing::{debug, info};

use crate::error::ShellError;
use crate::pages::{Appearance, DescriptionPage, ExperimentPage, Page};

pub type PageHandle = Rc<RefCell<Page>>;

pub struct App {
    ctx: Rc<RefCell<AppContext>>,
    router: Router<RefCell<Page>>,
    scheduler: ManualScheduler,
    notices: NoticeDebouncer,
}

fn appearance(ctx: &RefCell<AppContext>) -> Appearance {
    let ctx = ctx.borrow();
    Appearance {
        theme: ctx.theme(),
        system_prefers_dark: ctx.system_prefers_dark(),
    }
}

impl App {
    /// Registers both pages of every topic; nothing is built yet.
    pub fn new(
        settings: Settings,
        seed: u64,
        system_prefers_dark: bool,
    ) -> Result<Self, ShellError> {
        let ctx = Rc::new(RefCell::new(
            AppContext::new(settings, seed).with_system_dark(system_prefers_dark),
        ));
        let mut router = Router::new();

        for (i, &topic) in TopicKind::all().iter().enumerate() {
            let c = Rc::clone(&ctx);
            router.register_page(topic.label(), PageKey::Description, move || {
                Ok(RefCell::new(Page::Description(DescriptionPage::new(
                    topic,
                    appearance(&c),
                ))))
            })?;

            let c = Rc::clone(&ctx);
            router.register_page(topic.label(), PageKey::Experiment, move || {
                let seed = c.borrow().seed().wrapping_add(i as u64);
                let page = ExperimentPage::new(topic, appearance(&c), seed)
                    .map_err(PageBuildError::from)?;
                Ok(RefCell::new(Page::Experiment(page)))
            })?;
        }
        debug!(topics = TopicKind::all().len(), "registered topics");

        Ok(Self {
            ctx,
            router,
            scheduler: ManualScheduler::new(),
            notices: NoticeDebouncer::default(),
        })
    }

    /// Shows `(topic, page)`, building it on the first visit.
    ///
    /// The run of the page being left is cancelled once the target is up; an
    /// experiment page that is not running (fresh or cancelled) starts a new
    /// run. A failed activation leaves the visible page untouched.
    pub fn navigate(&mut self, topic: TopicKind, page: PageKey) -> Result<PageHandle, ShellError> {
        let target = Route {
            topic: topic.label().to_string(),
            page,
        };
        let leaving = self
            .router
            .current_route()
            .filter(|current| *current != target)
            .and_then(|_| self.router.current_page());

        let fresh = !self.router.is_constructed(topic.label(), page);
        let handle = self.router.activate(topic.label(), page)?;
        if let Some(previous) = leaving {
            if let Some(exp) = previous.borrow_mut().as_experiment_mut() {
                exp.cancel(&mut self.scheduler);
            }
        }
        if fresh {
            self.ctx.borrow_mut().subscribe(&handle);
        }
        self.with_experiment(|exp, sched| exp.resume(sched))
            .transpose()?;
        info!(route = %target, fresh, "navigated");
        Ok(handle)
    }

    pub fn current_page(&self) -> Option<PageHandle> {
        self.router.current_page()
    }

    /// Runs `f` on the visible page if it is an experiment page.
    pub fn with_experiment<R>(
        &mut self,
        f: impl FnOnce(&mut ExperimentPage, &mut ManualScheduler) -> R,
    ) -> Option<R> {
        let page = self.router.current_page()?;
        let mut page = page.borrow_mut();
        let exp = page.as_experiment_mut()?;
        Some(f(exp, &mut self.scheduler))
    }

    /// Cancels the visible run, if any; its statistic stays on screen.
    pub fn stop(&mut self) {
        self.with_experiment(|exp, sched| exp.cancel(sched));
    }

    /// Advances the clock by `elapsed` and dispatches every timer that fell
    /// due to the visible page. Returns the number of new frames.
    pub fn pump(&mut self, elapsed: Duration) -> u32 {
        self.scheduler.advance_by(elapsed);
        let page = self.router.current_page();
        let mut frames = 0;
        while let Some(token) = self.scheduler.next_fired() {
            if let Some(page) = &page {
                if let Some(exp) = page.borrow_mut().as_experiment_mut() {
                    frames += exp.on_timer(token, &mut self.scheduler) as u32;
                }
            }
        }
        frames
    }

    /// Applies a parameter change on the visible experiment page. A rejected
    /// value is returned as a debounced notice instead of an error.
    pub fn update_param(&mut self, key: &str, value: f64) -> Option<Notice> {
        let result = self.with_experiment(|exp, sched| exp.set_param(key, value, sched))?;
        let err = result.err()?;
        debug!(error = %err, "parameter rejected");
        self.notices.offer_error(self.scheduler.now(), &err)
    }

    /// Rejected values swallowed by the debounce window since the last
    /// notice was shown.
    pub fn suppressed_notices(&self) -> u32 {
        self.notices.suppressed()
    }

    /// Returns the number of built pages that re-rendered.
    pub fn set_theme(&mut self, theme: Theme) -> usize {
        self.ctx.borrow_mut().set_theme(theme)
    }

    pub fn theme(&self) -> Theme {
        self.ctx.borrow().theme()
    }

    pub fn is_dark(&self) -> bool {
        self.ctx.borrow().is_dark()
    }

    /// Current settings, including live theme changes.
    pub fn settings(&self) -> Settings {
        self.ctx.borrow().settings()
    }

    pub fn current_route(&self) -> Option<Route> {
        self.router.current_route()
    }

    pub fn constructed_count(&self) -> usize {
        self.router.constructed_count()
    }

    #[cfg(test)]
    pub fn is_constructed(&self, topic: TopicKind, page: PageKey) -> bool {
        self.router.is_constructed(topic.label(), page)
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &ManualScheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probviz::driver::{DriverState, TICK_INTERVAL};
    use probviz::error::RouteError;
    use probviz::scheduler::Scheduler;

    fn app() -> App {
        App::new(
            Settings {
                theme: Theme::Light,
                ..Settings::default()
            },
            7,
            false,
        )
        .unwrap()
    }

    fn state(handle: &PageHandle) -> Option<DriverState> {
        handle.borrow().as_experiment().and_then(ExperimentPage::state)
    }

    #[test]
    fn pages_are_built_on_first_visit_only() {
        let mut app = app();
        assert_eq!(app.constructed_count(), 0);
        assert!(app.current_route().is_none());

        app.navigate(TopicKind::Binomial, PageKey::Description).unwrap();
        app.navigate(TopicKind::Poisson, PageKey::Experiment).unwrap();
        app.navigate(TopicKind::Binomial, PageKey::Experiment).unwrap();
        app.navigate(TopicKind::Binomial, PageKey::Description).unwrap();
        assert_eq!(app.constructed_count(), 3);
        assert!(!app.is_constructed(TopicKind::Poisson, PageKey::Description));

        let route = app.current_route().unwrap();
        assert_eq!(route.topic, "binomial_distribution");
        assert_eq!(route.page, PageKey::Description);
    }

    #[test]
    fn revisiting_returns_the_same_page() {
        let mut app = app();
        let a = app.navigate(TopicKind::TwoDimNormal, PageKey::Experiment).unwrap();
        app.navigate(TopicKind::Poisson, PageKey::Description).unwrap();
        let b = app.navigate(TopicKind::TwoDimNormal, PageKey::Experiment).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn coin_run_advances_with_the_clock() {
        let mut app = app();
        let page = app.navigate(TopicKind::CoinTossing, PageKey::Experiment).unwrap();
        assert_eq!(state(&page), Some(DriverState::Running));

        assert_eq!(app.pump(TICK_INTERVAL * 10), 10);
        assert_eq!(page.borrow().as_experiment().unwrap().samples_drawn(), 20);
        assert_eq!(app.pump(TICK_INTERVAL * 100), 40);
        assert_eq!(state(&page), Some(DriverState::Completed));
        assert_eq!(app.scheduler().pending(), 0);
    }

    #[test]
    fn leaving_an_experiment_cancels_its_timer() {
        let mut app = app();
        let dice = app.navigate(TopicKind::DiceRolling, PageKey::Experiment).unwrap();
        app.pump(TICK_INTERVAL * 3);
        let token = dice.borrow().as_experiment().unwrap().timer().unwrap();

        app.navigate(TopicKind::DiceRolling, PageKey::Description).unwrap();
        assert!(!app.scheduler().is_scheduled(token));
        assert_eq!(state(&dice), Some(DriverState::Idle));
        assert_eq!(app.pump(TICK_INTERVAL * 10), 0);

        app.navigate(TopicKind::DiceRolling, PageKey::Experiment).unwrap();
        assert_eq!(state(&dice), Some(DriverState::Running));
        assert_eq!(app.scheduler().pending(), 1);
    }

    #[test]
    fn theme_change_reaches_built_pages_only() {
        let mut app = app();
        assert_eq!(app.set_theme(Theme::Dark), 0);

        let desc = app.navigate(TopicKind::Poisson, PageKey::Description).unwrap();
        app.navigate(TopicKind::Poisson, PageKey::Experiment).unwrap();
        assert!(desc.borrow().as_description().unwrap().html().contains(r#"data-theme="dark""#));

        assert_eq!(app.set_theme(Theme::Light), 2);
        assert_eq!(desc.borrow().as_description().unwrap().renders(), 2);
        assert!(!app.is_dark());
    }

    #[test]
    fn rejected_updates_are_debounced() {
        let mut app = app();
        app.navigate(TopicKind::CoinTossing, PageKey::Experiment).unwrap();
        let notice = app.update_param("n", 0.0).unwrap();
        assert!(notice.message.contains("`n`"));
        assert!(app.update_param("p", 2.0).is_none());
        assert_eq!(app.suppressed_notices(), 1);

        app.pump(Duration::from_secs(1));
        let notice = app.update_param("p", 2.0).unwrap();
        assert_eq!(notice.suppressed, 1);
        assert_eq!(app.suppressed_notices(), 0);
        assert!(app.update_param("n", 200.0).is_none());
    }

    #[test]
    fn failed_navigation_keeps_the_visible_run() {
        let ctx = Rc::new(RefCell::new(AppContext::new(Settings::default(), 3)));
        let mut router: Router<RefCell<Page>> = Router::new();
        let c = Rc::clone(&ctx);
        router
            .register_page(TopicKind::CoinTossing.label(), PageKey::Experiment, move || {
                let page = ExperimentPage::new(TopicKind::CoinTossing, appearance(&c), 3)
                    .map_err(PageBuildError::from)?;
                Ok(RefCell::new(Page::Experiment(page)))
            })
            .unwrap();
        router
            .register_page(TopicKind::Poisson.label(), PageKey::Experiment, || {
                Err("figure unavailable".into())
            })
            .unwrap();
        let mut app = App {
            ctx,
            router,
            scheduler: ManualScheduler::new(),
            notices: NoticeDebouncer::default(),
        };

        let coin = app.navigate(TopicKind::CoinTossing, PageKey::Experiment).unwrap();
        app.pump(TICK_INTERVAL * 5);
        let err = app.navigate(TopicKind::Poisson, PageKey::Experiment).unwrap_err();
        assert!(matches!(
            err,
            ShellError::Route(RouteError::Construction { .. })
        ));

        assert_eq!(state(&coin), Some(DriverState::Running));
        let route = app.current_route().unwrap();
        assert_eq!(route.topic, TopicKind::CoinTossing.label());
        assert_eq!(app.pump(TICK_INTERVAL * 5), 5);
        assert_eq!(coin.borrow().as_experiment().unwrap().samples_drawn(), 20);
    }
}
