//! Application context injected into every page at construction time.
//!
//! Holds the user settings and an explicit list of theme subscribers; a theme
//! change notifies each live subscriber, which re-renders from scratch.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::str::FromStr;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

impl Theme {
    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::Auto => "Auto",
        }
    }

    pub fn as_attr(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }

    /// Resolves `Auto` against the platform preference.
    pub fn is_dark(self, system_prefers_dark: bool) -> bool {
        match self {
            Theme::Light => false,
            Theme::Dark => true,
            Theme::Auto => system_prefers_dark,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light | Theme::Auto => Theme::Dark,
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "auto" | "system" => Ok(Theme::Auto),
            other => Err(format!("unknown theme `{other}` (expected light|dark|auto)")),
        }
    }
}

/// Interface zoom. Takes effect on the next launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UiScale {
    #[cfg_attr(feature = "serde", serde(rename = "100"))]
    X100,
    #[cfg_attr(feature = "serde", serde(rename = "125"))]
    X125,
    #[cfg_attr(feature = "serde", serde(rename = "150"))]
    X150,
    #[cfg_attr(feature = "serde", serde(rename = "175"))]
    X175,
    #[cfg_attr(feature = "serde", serde(rename = "200"))]
    X200,
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "auto"))]
    Auto,
}

impl UiScale {
    pub fn factor(self) -> Option<f32> {
        match self {
            UiScale::X100 => Some(1.0),
            UiScale::X125 => Some(1.25),
            UiScale::X150 => Some(1.5),
            UiScale::X175 => Some(1.75),
            UiScale::X200 => Some(2.0),
            UiScale::Auto => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UiScale::X100 => "100%",
            UiScale::X125 => "125%",
            UiScale::X150 => "150%",
            UiScale::X175 => "175%",
            UiScale::X200 => "200%",
            UiScale::Auto => "System",
        }
    }
}

impl FromStr for UiScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_end_matches('%').to_ascii_lowercase().as_str() {
            "100" | "1" => Ok(UiScale::X100),
            "125" | "1.25" => Ok(UiScale::X125),
            "150" | "1.5" => Ok(UiScale::X150),
            "175" | "1.75" => Ok(UiScale::X175),
            "200" | "2" => Ok(UiScale::X200),
            "auto" | "system" => Ok(UiScale::Auto),
            other => Err(format!(
                "unknown scale `{other}` (expected 100|125|150|175|200|auto)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settings {
    #[cfg_attr(feature = "serde", serde(default))]
    pub theme: Theme,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ui_scale: UiScale,
}

pub trait ThemeListener {
    fn on_theme_changed(&mut self, theme: Theme);
}

pub struct AppContext {
    settings: Settings,
    system_prefers_dark: bool,
    seed: u64,
    listeners: Vec<Weak<RefCell<dyn ThemeListener>>>,
}

impl AppContext {
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self {
            settings,
            system_prefers_dark: false,
            seed,
            listeners: Vec::new(),
        }
    }

    pub fn with_system_dark(mut self, prefers_dark: bool) -> Self {
        self.system_prefers_dark = prefers_dark;
        self
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn theme(&self) -> Theme {
        self.settings.theme
    }

    pub fn is_dark(&self) -> bool {
        self.settings.theme.is_dark(self.system_prefers_dark)
    }

    pub fn system_prefers_dark(&self) -> bool {
        self.system_prefers_dark
    }

    /// Base seed for simulations built under this context.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Registers a page for theme notifications. Only a weak handle is kept,
    /// so dropping the page unsubscribes it.
    pub fn subscribe<L: ThemeListener + 'static>(&mut self, listener: &Rc<RefCell<L>>) {
        let listener: Rc<RefCell<dyn ThemeListener>> = listener.clone();
        self.listeners.push(Rc::downgrade(&listener));
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.iter().filter(|w| w.strong_count() > 0).count()
    }

    /// Changes the theme and notifies every live subscriber.
    /// Returns the number of subscribers notified.
    pub fn set_theme(&mut self, theme: Theme) -> usize {
        if self.settings.theme == theme {
            return 0;
        }
        self.settings.theme = theme;
        self.listeners.retain(|w| w.strong_count() > 0);

        let mut notified = 0;
        for listener in self.listeners.iter().filter_map(Weak::upgrade) {
            match listener.try_borrow_mut() {
                Ok(mut l) => {
                    l.on_theme_changed(theme);
                    notified += 1;
                }
                Err(_) => warn!("theme subscriber busy; skipped"),
            }
        }
        debug!(theme = theme.as_attr(), notified, "theme changed");
        notified
    }
}
