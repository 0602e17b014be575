//! Timeline render surface for the scrubber: a framework-agnostic render
//! model plus the view state that feeds it from screen events.

pub mod app;
pub mod smoothing;
pub mod widgets;

pub use app::{TimelineView, ViewMessage};
pub use smoothing::Smoothed;
pub use widgets::timeline::{
    StripCell, TimeLabel, TimelineFrame, TimelineLayout, TimelineRenderModel, build_render_model,
};
