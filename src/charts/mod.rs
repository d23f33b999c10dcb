//! Charts module - static figure rendering

mod plotter;
mod renderer;

pub use plotter::{ChartData, ChartPlotter, HEATMAP_TITLE, SCATTER_TITLE, TIMELINE_TITLE};
pub use renderer::{figure_pixels, pt, RenderError, StaticChartRenderer, DPI};
