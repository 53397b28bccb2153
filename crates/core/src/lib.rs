//! # probviz
//!
//! Core mechanisms behind the ProbViz experiment browser: a lazy view router
//! that builds pages on first visit, and an incremental simulation driver
//! that samples trials in timed batches.
//!
//! ## Quick Start
//!
//! ```
//! use probviz::prelude::*;
//!
//! struct Coin;
//!
//! impl Trial for Coin {
//!     type Outcome = bool;
//!     type Statistic = (u64, u64);
//!
//!     fn sample(&self, rng: &mut Prng) -> bool {
//!         rng.gen_bool(0.5)
//!     }
//!
//!     fn fold(&self, (heads, tosses): &mut (u64, u64), head: bool) {
//!         *heads += head as u64;
//!         *tosses += 1;
//!     }
//! }
//!
//! let mut scheduler = ManualScheduler::new();
//! let mut driver = SimulationDriver::new(Coin, 42);
//! driver.start(100, &mut scheduler).unwrap();
//!
//! scheduler.advance_by(TICK_INTERVAL * 50);
//! while let Some(token) = scheduler.next_fired() {
//!     driver.on_timer(token, &mut scheduler);
//! }
//! assert_eq!(driver.statistic().1, 100);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization of [`context::Settings`]
//!
//! ## Modules
//!
//! - [`router`]: lazy, memoized page construction and navigation state
//! - [`driver`]: batched Monte-Carlo runs with a left-folded statistic
//! - [`scheduler`]: repeating timers with cancellation tokens
//! - [`context`]: injected settings and theme subscriptions
//! - [`notice`]: debounced user-facing notices

#[path = "core/context.rs"]
pub mod context;

#[path = "core/driver.rs"]
pub mod driver;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/notice.rs"]
pub mod notice;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/router.rs"]
pub mod router;

#[path = "core/scheduler.rs"]
pub mod scheduler;

/// Prelude module for convenient imports.
///
/// ```
/// use probviz::prelude::*;
/// ```
pub mod prelude {
    pub use crate::context::{AppContext, Settings, Theme, ThemeListener, UiScale};
    pub use crate::driver::{
        DriverState, SimulationDriver, TickReport, Trial, TARGET_REDRAWS, TICK_INTERVAL,
    };
    pub use crate::error::{InvalidParameterError, PageBuildError, RouteError};
    pub use crate::notice::{Notice, NoticeDebouncer, NoticeLevel};
    pub use crate::prng::Prng;
    pub use crate::router::{PageKey, Route, Router};
    pub use crate::scheduler::{ManualScheduler, Scheduler, TimerToken};
}
