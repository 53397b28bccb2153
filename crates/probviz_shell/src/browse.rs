//! Interactive session.
//!
//! The arrow keys move between topics, Tab flips between a topic's two
//! pages, and the controls of the visible experiment are edited in place
//! while its run is going. The theme can be toggled at any time; every page
//! built so far restyles itself.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use probviz::context::{Settings, UiScale};
use probviz::driver::{DriverState, TICK_INTERVAL};
use probviz::error::InvalidParameterError;
use probviz::notice::Notice;
use probviz::router::PageKey;
use probviz::scheduler::ManualScheduler;
use probviz_experiments::catalog::TopicKind;
use tracing::{debug, info};

use crate::app::App;
use crate::error::ShellError;
use crate::pages::{ExperimentPage, Page};
use crate::term_plot::TextPlot;

const HELP: &str =
    "<-/-> topic  tab page  up/down control  +/- adjust  r restart  m mode  f family  t theme  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NextTopic,
    PrevTopic,
    SwitchPage,
    NextControl,
    PrevControl,
    Increase,
    Decrease,
    Restart,
    ToggleView,
    NextFamily,
    ToggleTheme,
    Quit,
}

impl Action {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        let action = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
            (KeyCode::Char('q') | KeyCode::Esc, _) => Action::Quit,
            (KeyCode::Right | KeyCode::Char('n'), _) => Action::NextTopic,
            (KeyCode::Left | KeyCode::Char('p'), _) => Action::PrevTopic,
            (KeyCode::Tab | KeyCode::BackTab, _) => Action::SwitchPage,
            (KeyCode::Down, _) => Action::NextControl,
            (KeyCode::Up, _) => Action::PrevControl,
            (KeyCode::Char('+' | '='), _) => Action::Increase,
            (KeyCode::Char('-' | '_'), _) => Action::Decrease,
            (KeyCode::Char('r'), _) => Action::Restart,
            (KeyCode::Char('m'), _) => Action::ToggleView,
            (KeyCode::Char('f'), _) => Action::NextFamily,
            (KeyCode::Char('t'), _) => Action::ToggleTheme,
            _ => return None,
        };
        Some(action)
    }
}

fn notice_text(notice: &Notice) -> String {
    match notice.suppressed {
        0 => notice.message.clone(),
        n => format!("{} (+{n} more rejected)", notice.message),
    }
}

fn run_label(state: DriverState) -> &'static str {
    match state {
        DriverState::Idle => "stopped",
        DriverState::Running => "running",
        DriverState::Completed => "done",
    }
}

/// Session state on top of [`App`]: which topic is shown, which control has
/// the cursor and the last message for the user.
pub struct Browser {
    app: App,
    topic: usize,
    page: PageKey,
    control: usize,
    status: Option<String>,
}

impl Browser {
    pub fn open(app: App, topic: TopicKind, page: PageKey) -> Result<Self, ShellError> {
        let index = TopicKind::all()
            .iter()
            .position(|t| *t == topic)
            .unwrap_or(0);
        let mut browser = Self {
            app,
            topic: index,
            page,
            control: 0,
            status: None,
        };
        browser.app.navigate(topic, page)?;
        Ok(browser)
    }

    pub fn topic(&self) -> TopicKind {
        TopicKind::all()[self.topic]
    }

    #[cfg(test)]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[cfg(test)]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Applies one key action. Returns `false` once the session should end.
    pub fn apply(&mut self, action: Action) -> bool {
        let topics = TopicKind::all().len();
        let result = match action {
            Action::Quit => return false,
            Action::NextTopic => self.go(self.topic + 1, self.page),
            Action::PrevTopic => self.go(self.topic + topics - 1, self.page),
            Action::SwitchPage => {
                let page = match self.page {
                    PageKey::Description => PageKey::Experiment,
                    PageKey::Experiment => PageKey::Description,
                };
                self.go(self.topic, page)
            }
            Action::NextControl => {
                self.move_cursor(1);
                Ok(())
            }
            Action::PrevControl => {
                self.move_cursor(-1);
                Ok(())
            }
            Action::Increase => {
                self.nudge(1);
                Ok(())
            }
            Action::Decrease => {
                self.nudge(-1);
                Ok(())
            }
            Action::Restart => self.on_experiment(|exp, sched| exp.start(sched)),
            Action::ToggleView => self.on_experiment(|exp, sched| match exp.view() {
                Some(view) => exp.set_view(view.toggle(), sched),
                None => Ok(()),
            }),
            Action::NextFamily => {
                self.control = 0;
                self.on_experiment(|exp, _| match exp.distribution() {
                    Some(_) => exp.next_distribution(),
                    None => Ok(()),
                })
            }
            Action::ToggleTheme => {
                let theme = self.app.theme().toggle();
                let restyled = self.app.set_theme(theme);
                self.status = Some(format!(
                    "theme {} ({restyled} pages restyled)",
                    theme.label()
                ));
                Ok(())
            }
        };
        if let Err(err) = result {
            self.status = Some(err.to_string());
        }
        debug!(?action, topic = %self.topic(), "key action");
        true
    }

    /// Advances the visible run by `elapsed`.
    pub fn tick(&mut self, elapsed: Duration) -> u32 {
        self.app.pump(elapsed)
    }

    /// Paints the visible page. With `force` the whole screen is redrawn,
    /// otherwise only a changed experiment frame is.
    pub fn draw<W: Write>(&mut self, plot: &mut TextPlot<W>, force: bool) -> bool {
        let Some(handle) = self.app.current_page() else {
            return false;
        };
        let footer = self.footer();
        let mut page = handle.borrow_mut();
        match &mut *page {
            Page::Description(desc) => {
                if force {
                    plot.set_footer(footer);
                    plot.show_text(desc.markdown());
                }
                force
            }
            Page::Experiment(exp) => {
                if force {
                    exp.request_redraw();
                }
                plot.set_footer(footer);
                exp.paint(plot)
            }
        }
    }

    /// Status lines shown under the page.
    pub fn footer(&self) -> Vec<String> {
        let topics = TopicKind::all();
        let topic = self.topic();
        let mut lines = vec![
            String::new(),
            format!(
                "[{}/{}] {} | {} | theme {} ({})",
                self.topic + 1,
                topics.len(),
                topic.display_name(),
                self.page,
                self.app.theme().label(),
                if self.app.is_dark() { "dark" } else { "light" }
            ),
        ];

        let handle = self.app.current_page();
        let page = handle.as_ref().map(|h| h.borrow());
        if let Some(exp) = page.as_deref().and_then(Page::as_experiment) {
            if let Some(family) = exp.distribution() {
                lines.push(format!("family: {family}"));
            }
            if let Some(view) = exp.view() {
                lines.push(format!("view: {view}"));
            }
            if let Some(state) = exp.state() {
                let drawn = exp.samples_drawn();
                lines.push(format!("run: {} ({drawn} samples)", run_label(state)));
            }
            for (i, (spec, value)) in exp.params().iter().enumerate() {
                let cursor = if i == self.control { '>' } else { ' ' };
                lines.push(format!("{cursor} {}", spec.describe(value)));
            }
        }
        if let Some(status) = &self.status {
            lines.push(format!("! {status}"));
        }
        lines.push(HELP.to_string());
        lines
    }

    fn go(&mut self, topic: usize, page: PageKey) -> Result<(), ShellError> {
        let topic = topic % TopicKind::all().len();
        self.app.navigate(TopicKind::all()[topic], page)?;
        self.topic = topic;
        self.page = page;
        self.control = 0;
        self.status = None;
        Ok(())
    }

    fn on_experiment(
        &mut self,
        f: impl FnOnce(&mut ExperimentPage, &mut ManualScheduler) -> Result<(), InvalidParameterError>,
    ) -> Result<(), ShellError> {
        self.app.with_experiment(f).transpose()?;
        Ok(())
    }

    fn control_count(&self) -> usize {
        let Some(handle) = self.app.current_page() else {
            return 0;
        };
        let page = handle.borrow();
        page.as_experiment().map_or(0, |e| e.params().specs().len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let count = self.control_count();
        if count == 0 {
            return;
        }
        let next = (self.control as isize + delta).rem_euclid(count as isize);
        self.control = next as usize;
    }

    /// Moves the selected control by whole steps. A rejected value keeps the
    /// old one and shows a debounced notice.
    fn nudge(&mut self, steps: i32) {
        let selected = self.app.current_page().and_then(|handle| {
            let page = handle.borrow();
            let (spec, value) = page.as_experiment()?.params().iter().nth(self.control)?;
            Some((spec.key, spec.nudge(value, steps)))
        });
        let Some((key, value)) = selected else {
            return;
        };

        let suppressed = self.app.suppressed_notices();
        match self.app.update_param(key, value) {
            Some(notice) => self.status = Some(notice_text(&notice)),
            // Rejected but debounced: the last notice still applies.
            None if self.app.suppressed_notices() > suppressed => {}
            None => self.status = None,
        }
    }

    /// Runs the session in the terminal until `q`, then returns the settings
    /// to persist.
    pub async fn run(mut self, scale: UiScale) -> Result<Settings, ShellError> {
        let _guard = TermGuard::new()?;
        let mut plot = TextPlot::new(io::stdout())
            .with_scale(scale)
            .with_ansi(true)
            .with_raw_mode(true);
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        let mut force = true;
        info!(topic = %self.topic(), "session started");

        loop {
            ticker.tick().await;
            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        let Some(action) = Action::from_key(key) else {
                            continue;
                        };
                        if !self.apply(action) {
                            info!(pages = self.app.constructed_count(), "session ended");
                            return Ok(self.app.settings());
                        }
                        force = true;
                    }
                    Event::Resize(..) => force = true,
                    _ => {}
                }
            }
            self.tick(TICK_INTERVAL);
            self.draw(&mut plot, std::mem::take(&mut force));
        }
    }
}

/// Raw mode on an alternate screen for as long as it lives.
struct TermGuard {
    out: Stdout,
}

impl TermGuard {
    fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, cursor::Hide, cursor::MoveTo(0, 0))?;
        Ok(Self { out })
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
