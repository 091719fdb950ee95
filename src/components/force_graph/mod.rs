mod builder;
mod component;
mod detail;
mod render;
mod session;
mod simulation;
mod state;
pub mod style;
mod types;

pub use builder::{BuilderConfig, build_graph};
pub use component::ForceGraphCanvas;
pub use types::{RiskAccount, RiskAssessment, flag_display_name};
