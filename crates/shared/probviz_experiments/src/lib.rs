//! Experiments shown by ProbViz: the trial definitions fed to
//! [`probviz::driver::SimulationDriver`], the parameter tables and domain
//! checks guarding every control, the distribution formulas behind the static
//! figures, and the topic catalog.

pub mod catalog;
pub mod coin;
pub mod dice;
pub mod distributions;
pub mod figures;
pub mod params;
pub mod plot;
pub mod special;
pub mod stats;
