//! Lazy view router.
//!
//! Holds a fixed set of named topics, each with a small fixed set of pages.
//! Pages are built by their factory on first activation and kept alive for the
//! rest of the session; re-activating a built page only moves the visible
//! pointers.

use hashbrown::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{PageBuildError, RouteError};

pub type TopicId = String;

/// Zero-argument page constructor, invoked at most once successfully.
pub type PageFactory<P> = Box<dyn FnMut() -> Result<P, PageBuildError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKey {
    Description,
    Experiment,
}

impl PageKey {
    pub fn label(self) -> &'static str {
        match self {
            PageKey::Description => "description",
            PageKey::Experiment => "experiment",
        }
    }

    pub fn all() -> &'static [PageKey] {
        &[PageKey::Description, PageKey::Experiment]
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PageKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "description" | "desc" => Ok(PageKey::Description),
            "experiment" | "exp" => Ok(PageKey::Experiment),
            other => Err(format!("unknown page `{other}` (expected description|experiment)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub topic: TopicId,
    pub page: PageKey,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.page)
    }
}

pub enum PageSlot<P> {
    Unconstructed(PageFactory<P>),
    Ready(Rc<P>),
}

impl<P> PageSlot<P> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PageSlot::Ready(_))
    }

    /// Returns the built page, invoking the factory if needed.
    ///
    /// A failing factory leaves the slot `Unconstructed` so the next call
    /// retries from scratch.
    fn resolve(&mut self) -> Result<Rc<P>, PageBuildError> {
        match self {
            PageSlot::Ready(page) => Ok(Rc::clone(page)),
            PageSlot::Unconstructed(factory) => {
                let page = Rc::new(factory()?);
                *self = PageSlot::Ready(Rc::clone(&page));
                Ok(page)
            }
        }
    }
}

impl<P> fmt::Debug for PageSlot<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSlot::Unconstructed(_) => f.write_str("Unconstructed"),
            PageSlot::Ready(_) => f.write_str("Ready"),
        }
    }
}

struct TopicEntry<P> {
    id: TopicId,
    pages: Vec<(PageKey, PageSlot<P>)>,
    visible: Option<PageKey>,
}

impl<P> TopicEntry<P> {
    fn slot(&self, page: PageKey) -> Option<&PageSlot<P>> {
        self.pages.iter().find(|(k, _)| *k == page).map(|(_, s)| s)
    }

    fn slot_mut(&mut self, page: PageKey) -> Option<&mut PageSlot<P>> {
        self.pages
            .iter_mut()
            .find(|(k, _)| *k == page)
            .map(|(_, s)| s)
    }
}

pub struct Router<P> {
    topics: Vec<TopicEntry<P>>,
    index: HashMap<TopicId, usize>,
    current: Option<usize>,
}

impl<P> Default for Router<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Router<P> {
    pub fn new() -> Self {
        Self {
            topics: Vec::new(),
            index: HashMap::new(),
            current: None,
        }
    }

    /// Stores `factory` for `(topic, page)` without invoking it.
    ///
    /// The topic is created on its first registered page; registration order
    /// is kept for both topics and pages.
    pub fn register_page<F>(
        &mut self,
        topic: impl Into<TopicId>,
        page: PageKey,
        factory: F,
    ) -> Result<(), RouteError>
    where
        F: FnMut() -> Result<P, PageBuildError> + 'static,
    {
        let topic = topic.into();
        let idx = match self.index.get(&topic) {
            Some(&idx) => idx,
            None => {
                let idx = self.topics.len();
                self.topics.push(TopicEntry {
                    id: topic.clone(),
                    pages: Vec::with_capacity(PageKey::all().len()),
                    visible: None,
                });
                self.index.insert(topic.clone(), idx);
                idx
            }
        };

        let entry = &mut self.topics[idx];
        if entry.slot(page).is_some() {
            return Err(RouteError::DuplicateRegistration { topic, page });
        }
        entry
            .pages
            .push((page, PageSlot::Unconstructed(Box::new(factory))));
        debug!(topic = %topic, page = %page, "registered page");
        Ok(())
    }

    /// Makes `(topic, page)` the visible page, building it on first use.
    pub fn activate(&mut self, topic: &str, page: PageKey) -> Result<Rc<P>, RouteError> {
        let unknown = || RouteError::UnknownRoute {
            topic: topic.to_string(),
            page: page.to_string(),
        };
        let idx = *self.index.get(topic).ok_or_else(unknown)?;
        let entry = &mut self.topics[idx];
        let slot = entry.slot_mut(page).ok_or_else(unknown)?;

        let first_visit = !slot.is_ready();
        let handle = slot.resolve().map_err(|source| {
            warn!(topic, page = %page, error = %source, "page construction failed");
            RouteError::Construction {
                topic: topic.to_string(),
                page,
                source,
            }
        })?;
        if first_visit {
            debug!(topic, page = %page, "constructed page");
        }

        entry.visible = Some(page);
        if self.current != Some(idx) {
            debug!(topic, "switched topic");
            self.current = Some(idx);
        }
        Ok(handle)
    }

    /// Activates the topic's last visible page, or its first registered page
    /// when the topic has never been shown.
    pub fn activate_topic(&mut self, topic: &str) -> Result<Rc<P>, RouteError> {
        let unknown = || RouteError::UnknownRoute {
            topic: topic.to_string(),
            page: "*".to_string(),
        };
        let idx = *self.index.get(topic).ok_or_else(unknown)?;
        let entry = &self.topics[idx];
        let page = entry
            .visible
            .or_else(|| entry.pages.first().map(|(k, _)| *k))
            .ok_or_else(unknown)?;
        self.activate(topic, page)
    }

    /// Startup default: the first page of the first registered topic.
    pub fn activate_default(&mut self) -> Result<Rc<P>, RouteError> {
        let (topic, page) = self
            .topics
            .first()
            .and_then(|t| t.pages.first().map(|(k, _)| (t.id.clone(), *k)))
            .ok_or_else(|| RouteError::UnknownRoute {
                topic: "*".to_string(),
                page: "*".to_string(),
            })?;
        self.activate(&topic, page)
    }

    pub fn current_route(&self) -> Option<Route> {
        let entry = &self.topics[self.current?];
        Some(Route {
            topic: entry.id.clone(),
            page: entry.visible?,
        })
    }

    /// The visible page handle, if any page has been activated.
    pub fn current_page(&self) -> Option<Rc<P>> {
        let route = self.current_route()?;
        self.page(&route.topic, route.page)
    }

    /// A built page, without activating it.
    pub fn page(&self, topic: &str, page: PageKey) -> Option<Rc<P>> {
        let idx = *self.index.get(topic)?;
        match self.topics[idx].slot(page)? {
            PageSlot::Ready(p) => Some(Rc::clone(p)),
            PageSlot::Unconstructed(_) => None,
        }
    }

    pub fn is_constructed(&self, topic: &str, page: PageKey) -> bool {
        self.index
            .get(topic)
            .and_then(|&idx| self.topics[idx].slot(page))
            .is_some_and(PageSlot::is_ready)
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> + '_ {
        self.topics.iter().map(|t| t.id.as_str())
    }

    pub fn pages(&self, topic: &str) -> Vec<PageKey> {
        self.index
            .get(topic)
            .map(|&idx| self.topics[idx].pages.iter().map(|(k, _)| *k).collect())
            .unwrap_or_default()
    }

    pub fn constructed_count(&self) -> usize {
        self.topics
            .iter()
            .flat_map(|t| t.pages.iter())
            .filter(|(_, s)| s.is_ready())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Page {
        name: String,
    }

    fn counting_factory(
        name: &str,
        calls: &Rc<Cell<u32>>,
    ) -> impl FnMut() -> Result<Page, PageBuildError> + 'static {
        let name = name.to_string();
        let calls = Rc::clone(calls);
        move || {
            calls.set(calls.get() + 1);
            Ok(Page { name: name.clone() })
        }
    }

    #[test]
    fn activate_twice_builds_once_and_returns_same_handle() {
        let calls = Rc::new(Cell::new(0));
        let mut r = Router::new();
        r.register_page("a", PageKey::Description, counting_factory("a/d", &calls))
            .unwrap();

        assert_eq!(calls.get(), 0);
        let p1 = r.activate("a", PageKey::Description).unwrap();
        let p2 = r.activate("a", PageKey::Description).unwrap();
        assert_eq!(calls.get(), 1);
        assert!(Rc::ptr_eq(&p1, &p2));
        assert_eq!(p1.name, "a/d");
    }

    #[test]
    fn activating_one_topic_does_not_build_another() {
        let t1 = Rc::new(Cell::new(0));
        let t2 = Rc::new(Cell::new(0));
        let mut r = Router::new();
        r.register_page("t1", PageKey::Description, counting_factory("t1", &t1))
            .unwrap();
        r.register_page("t2", PageKey::Description, counting_factory("t2", &t2))
            .unwrap();
        r.register_page("t2", PageKey::Experiment, counting_factory("t2e", &t2))
            .unwrap();

        r.activate("t1", PageKey::Description).unwrap();
        assert_eq!(t1.get(), 1);
        assert_eq!(t2.get(), 0);
        assert!(!r.is_constructed("t2", PageKey::Description));

        r.activate("t2", PageKey::Experiment).unwrap();
        assert_eq!(t2.get(), 1);
        assert!(!r.is_constructed("t2", PageKey::Description));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let calls = Rc::new(Cell::new(0));
        let mut r = Router::new();
        r.register_page("a", PageKey::Experiment, counting_factory("x", &calls))
            .unwrap();
        let err = r
            .register_page("a", PageKey::Experiment, counting_factory("y", &calls))
            .unwrap_err();
        assert!(matches!(
            err,
            RouteError::DuplicateRegistration {
                page: PageKey::Experiment,
                ..
            }
        ));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn unknown_route_leaves_state_intact() {
        let calls = Rc::new(Cell::new(0));
        let mut r = Router::new();
        r.register_page("a", PageKey::Description, counting_factory("a", &calls))
            .unwrap();
        r.activate("a", PageKey::Description).unwrap();

        let err = r.activate("missing", PageKey::Description).unwrap_err();
        assert!(matches!(err, RouteError::UnknownRoute { .. }));
        let err = r.activate("a", PageKey::Experiment).unwrap_err();
        assert!(matches!(err, RouteError::UnknownRoute { .. }));
        assert!(r.activate_topic("missing").is_err());

        assert_eq!(
            r.current_route(),
            Some(Route {
                topic: "a".to_string(),
                page: PageKey::Description
            })
        );
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failed_construction_is_not_memoized() {
        let attempts = Rc::new(Cell::new(0));
        let mut r: Router<Page> = Router::new();
        {
            let attempts = Rc::clone(&attempts);
            r.register_page("flaky", PageKey::Experiment, move || {
                attempts.set(attempts.get() + 1);
                if attempts.get() == 1 {
                    Err("surface unavailable".into())
                } else {
                    Ok(Page {
                        name: "flaky".to_string(),
                    })
                }
            })
            .unwrap();
        }

        let err = r.activate("flaky", PageKey::Experiment).unwrap_err();
        assert!(matches!(err, RouteError::Construction { .. }));
        assert!(!r.is_constructed("flaky", PageKey::Experiment));
        assert_eq!(r.current_route(), None);

        let page = r.activate("flaky", PageKey::Experiment).unwrap();
        assert_eq!(page.name, "flaky");
        assert_eq!(attempts.get(), 2);

        r.activate("flaky", PageKey::Experiment).unwrap();
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn current_route_is_unset_until_first_activation() {
        let calls = Rc::new(Cell::new(0));
        let mut r = Router::new();
        r.register_page("a", PageKey::Description, counting_factory("a", &calls))
            .unwrap();
        assert_eq!(r.current_route(), None);
        assert!(r.current_page().is_none());
    }

    #[test]
    fn default_route_is_first_page_of_first_topic() {
        let calls = Rc::new(Cell::new(0));
        let mut r = Router::new();
        r.register_page("first", PageKey::Description, counting_factory("fd", &calls))
            .unwrap();
        r.register_page("first", PageKey::Experiment, counting_factory("fe", &calls))
            .unwrap();
        r.register_page("second", PageKey::Description, counting_factory("sd", &calls))
            .unwrap();

        let page = r.activate_default().unwrap();
        assert_eq!(page.name, "fd");
        assert_eq!(
            r.current_route().map(|rt| rt.to_string()),
            Some("first/description".to_string())
        );
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn topic_remembers_its_visible_page() {
        let calls = Rc::new(Cell::new(0));
        let mut r = Router::new();
        for topic in ["a", "b"] {
            for &page in PageKey::all() {
                r.register_page(topic, page, counting_factory(topic, &calls))
                    .unwrap();
            }
        }

        r.activate("a", PageKey::Experiment).unwrap();
        r.activate_topic("b").unwrap();
        assert_eq!(r.current_route().unwrap().page, PageKey::Description);

        r.activate_topic("a").unwrap();
        assert_eq!(
            r.current_route(),
            Some(Route {
                topic: "a".to_string(),
                page: PageKey::Experiment
            })
        );
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn navigation_scenario_builds_each_touched_page_once() {
        let calls = Rc::new(Cell::new(0));
        let mut r = Router::new();
        for topic in ["A", "B"] {
            r.register_page(topic, PageKey::Description, counting_factory(topic, &calls))
                .unwrap();
            r.register_page(topic, PageKey::Experiment, counting_factory(topic, &calls))
                .unwrap();
        }
        assert_eq!(calls.get(), 0);

        r.activate("A", PageKey::Description).unwrap();
        r.activate("B", PageKey::Experiment).unwrap();
        r.activate("A", PageKey::Experiment).unwrap();

        assert_eq!(calls.get(), 3);
        assert_eq!(r.constructed_count(), 3);
        assert_eq!(
            r.current_route(),
            Some(Route {
                topic: "A".to_string(),
                page: PageKey::Experiment
            })
        );
    }

    #[test]
    fn page_key_parses_labels() {
        assert_eq!("Experiment".parse::<PageKey>(), Ok(PageKey::Experiment));
        assert_eq!("desc".parse::<PageKey>(), Ok(PageKey::Description));
        assert!("plot".parse::<PageKey>().is_err());
        let router = Router::<Page>::new();
        let topics: Vec<&str> = router.topics().collect();
        assert!(topics.is_empty());
    }
}
