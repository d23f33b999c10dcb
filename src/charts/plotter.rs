//! Chart Plotter Module
//! Lays out the correlation heatmap, the dual-axis timeline and the
//! emigration vs knife-crime scatter.

use crate::charts::renderer::{
    figure_pixels, pt, RenderError, StaticChartRenderer, EMIGRATION_COLOR, GRID_COLOR,
    KNIFE_CRIME_COLOR, TREND_COLOR,
};
use crate::data::{column_as_f64, column_as_i64, EMIGRATION, KNIFE_CRIME_TOTAL, YEAR_COLUMN};
use crate::stats::{CorrelationMatrix, LinearFit, StatsCalculator};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::{DataFrame, PolarsResult};
use std::path::Path;

pub const HEATMAP_TITLE: &str = "Correlation Heatmap: Migration vs Economic Indicators";
pub const TIMELINE_TITLE: &str = "UK Emigration and Knife-enabled Crime Over Time (2011–2024)";
pub const SCATTER_TITLE: &str = "Emigration vs Knife-enabled Crime (2011–2024)";

const FONT: &str = "sans-serif";
const EMIGRATION_LABEL: &str = "Emigration (thousands)";
const KNIFE_CRIME_LABEL: &str = "Knife-enabled crime (offences)";
const FIT_SAMPLES: usize = 200;

const DASH: f64 = 3.7;
const DASH_GAP: f64 = 1.6;

/// Gridline endpoints, one line per tick, spanning the plot in data coordinates.
fn grid_lines(
    x_ticks: &[f64],
    y_ticks: &[f64],
    (x0, x1): (f64, f64),
    (y0, y1): (f64, f64),
) -> Vec<Vec<(f64, f64)>> {
    let verticals = x_ticks.iter().map(|&x| vec![(x, y0), (x, y1)]);
    let horizontals = y_ticks.iter().map(|&y| vec![(x0, y), (x1, y)]);
    verticals.chain(horizontals).collect()
}

/// Merged Year / Emigration / Knife_Crime_Total rows ready for plotting.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    pub years: Vec<i64>,
    pub emigration: Vec<Option<f64>>,
    pub knife_crime: Vec<Option<f64>>,
}

impl ChartData {
    /// Decode the merged table; rows without a Year are skipped.
    pub fn from_merged(df: &DataFrame) -> PolarsResult<Self> {
        let years = column_as_i64(df, YEAR_COLUMN)?;
        let emigration = column_as_f64(df, EMIGRATION)?;
        let knife_crime = column_as_f64(df, KNIFE_CRIME_TOTAL)?;

        let mut data = ChartData::default();
        for ((year, emi), knife) in years.into_iter().zip(emigration).zip(knife_crime) {
            if let Some(year) = year {
                data.years.push(year);
                data.emigration.push(emi);
                data.knife_crime.push(knife);
            }
        }
        Ok(data)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// `(knife_crime, emigration)` pairs where both are present.
    pub fn paired_points(&self) -> (Vec<f64>, Vec<f64>) {
        self.knife_crime
            .iter()
            .zip(&self.emigration)
            .filter_map(|(k, e)| Some(((*k)?, (*e)?)))
            .unzip()
    }

    /// Unbroken `(year, value)` runs; a missing value ends a run.
    pub fn runs(&self, values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for (year, value) in self.years.iter().zip(values) {
            match value {
                Some(v) => current.push((*year as f64, *v)),
                None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}

/// Creates the static figures.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw the annotated correlation heatmap with a color bar.
    pub fn draw_correlation_heatmap(
        matrix: &CorrelationMatrix,
        path: &Path,
    ) -> Result<(), RenderError> {
        let n = matrix.size();
        if n == 0 {
            return Err(RenderError::Empty("no correlation columns".into()));
        }
        let (vmin, vmax) = matrix.value_range();

        StaticChartRenderer::render_png(path, figure_pixels(10.0, 8.0), |root| {
            let (width, _) = root.dim_in_pixel();
            let (main, bar) = root.split_horizontally(width * 84 / 100);
            Self::draw_heatmap_cells(root, &main, matrix, vmin, vmax)?;
            Self::draw_color_bar(&bar, vmin, vmax)
        })
    }

    fn draw_heatmap_cells(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        matrix: &CorrelationMatrix,
        vmin: f64,
        vmax: f64,
    ) -> Result<(), RenderError> {
        let n = matrix.size();
        let nf = n as f64;

        let mut chart = ChartBuilder::on(area)
            .caption(HEATMAP_TITLE, (FONT, pt(12.0)))
            .margin(pt(8.0))
            .x_label_area_size(pt(110.0))
            .y_label_area_size(pt(110.0))
            .build_cartesian_2d(0f64..nf, 0f64..nf)
            .map_err(RenderError::drawing)?;

        // Row 0 sits at the top, so row i spans y in [n-1-i, n-i].
        let cell = |i: usize, j: usize| {
            let top = (n - i) as f64;
            [(j as f64, top - 1.0), (j as f64 + 1.0, top)]
        };

        chart
            .draw_series((0..n).flat_map(|i| (0..n).map(move |j| (i, j))).map(|(i, j)| {
                let value = matrix.get(i, j);
                let color = if value.is_finite() {
                    StaticChartRenderer::viridis(StaticChartRenderer::normalize(value, vmin, vmax))
                } else {
                    WHITE
                };
                Rectangle::new(cell(i, j), color.filled())
            }))
            .map_err(RenderError::drawing)?;

        // Minor gridlines on cell boundaries.
        chart
            .draw_series(
                (0..n)
                    .flat_map(|i| (0..n).map(move |j| (i, j)))
                    .map(|(i, j)| Rectangle::new(cell(i, j), WHITE.stroke_width(pt(1.0)))),
            )
            .map_err(RenderError::drawing)?;

        let annotation = (FONT, pt(10.0))
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series((0..n).flat_map(|i| (0..n).map(move |j| (i, j))).map(|(i, j)| {
                let value = matrix.get(i, j);
                let label = if value.is_nan() {
                    "nan".to_string()
                } else {
                    format!("{:.2}", value)
                };
                let [(x0, _), (_, top)] = cell(i, j);
                Text::new(label, (x0 + 0.5, top - 0.5), annotation.clone())
            }))
            .map_err(RenderError::drawing)?;

        // Tick labels: column names, rotated under the x axis.
        let gap = pt(4.0) as i32;
        let x_style = (FONT, pt(10.0))
            .into_font()
            .transform(FontTransform::Rotate90)
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));
        let y_style = (FONT, pt(10.0))
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Center));

        for (idx, name) in matrix.columns.iter().enumerate() {
            let (px, py) = chart.backend_coord(&(idx as f64 + 0.5, 0.0));
            root.draw(&Text::new(name.as_str(), (px, py + gap), x_style.clone()))
                .map_err(RenderError::drawing)?;

            let (px, py) = chart.backend_coord(&(0.0, nf - idx as f64 - 0.5));
            root.draw(&Text::new(name.as_str(), (px - gap, py), y_style.clone()))
                .map_err(RenderError::drawing)?;
        }

        Ok(())
    }

    fn draw_color_bar(
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        vmin: f64,
        vmax: f64,
    ) -> Result<(), RenderError> {
        // Ticks live on the right, so the scale is mirrored onto the secondary axis.
        let mut chart = ChartBuilder::on(area)
            .margin_top(pt(40.0))
            .margin_bottom(pt(118.0))
            .margin_left(pt(12.0))
            .margin_right(pt(8.0))
            .right_y_label_area_size(pt(70.0))
            .build_cartesian_2d(0f64..1f64, vmin..vmax)
            .map_err(RenderError::drawing)?
            .set_secondary_coord(0f64..1f64, vmin..vmax);

        chart
            .configure_secondary_axes()
            .y_labels(9)
            .y_label_formatter(&|v| format!("{:.1}", v))
            .y_desc("Pearson correlation")
            .label_style((FONT, pt(9.0)))
            .axis_desc_style((FONT, pt(10.0)))
            .draw()
            .map_err(RenderError::drawing)?;

        let steps = 256;
        chart
            .draw_series((0..steps).map(|s| {
                let lo = vmin + (vmax - vmin) * s as f64 / steps as f64;
                let hi = vmin + (vmax - vmin) * (s + 1) as f64 / steps as f64;
                let color = StaticChartRenderer::viridis(s as f64 / (steps - 1) as f64);
                Rectangle::new([(0.0, lo), (1.0, hi)], color.filled())
            }))
            .map_err(RenderError::drawing)?;

        Ok(())
    }

    /// Emigration (left axis) and knife crime (right axis) over the years.
    pub fn draw_timeline(data: &ChartData, path: &Path) -> Result<(), RenderError> {
        let (x0, x1) =
            StaticChartRenderer::padded_range(data.years.iter().map(|y| *y as f64), 0.05);
        let (e0, e1) =
            StaticChartRenderer::padded_range(data.emigration.iter().flatten().copied(), 0.05);
        let (k0, k1) =
            StaticChartRenderer::padded_range(data.knife_crime.iter().flatten().copied(), 0.05);

        let x_ticks = StaticChartRenderer::axis_ticks(x0, x1, 8);
        let e_ticks = StaticChartRenderer::axis_ticks(e0, e1, 6);
        let k_ticks = StaticChartRenderer::axis_ticks(k0, k1, 6);

        StaticChartRenderer::render_png(path, figure_pixels(11.0, 6.0), |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(TIMELINE_TITLE, (FONT, pt(12.0)))
                .margin(pt(8.0))
                .x_label_area_size(pt(36.0))
                .y_label_area_size(pt(60.0))
                .right_y_label_area_size(pt(70.0))
                .build_cartesian_2d(x0..x1, e0..e1)
                .map_err(RenderError::drawing)?
                .set_secondary_coord(x0..x1, k0..k1);

            let x_fmt = |v: &f64| StaticChartRenderer::format_tick(*v, &x_ticks);
            let e_fmt = |v: &f64| StaticChartRenderer::format_tick(*v, &e_ticks);
            let k_fmt = |v: &f64| StaticChartRenderer::format_tick(*v, &k_ticks);

            // Year axis in black, emigration axis in the series colour.
            chart
                .configure_mesh()
                .disable_mesh()
                .disable_y_axis()
                .x_labels(x_ticks.len())
                .x_desc("Year")
                .x_label_formatter(&x_fmt)
                .x_label_style((FONT, pt(10.0)))
                .axis_desc_style((FONT, pt(10.0)))
                .draw()
                .map_err(RenderError::drawing)?;

            chart
                .configure_mesh()
                .disable_mesh()
                .disable_x_axis()
                .y_labels(e_ticks.len())
                .y_desc(EMIGRATION_LABEL)
                .y_label_formatter(&e_fmt)
                .y_label_style((FONT, pt(10.0)).into_font().color(&EMIGRATION_COLOR))
                .axis_desc_style((FONT, pt(10.0)).into_font().color(&EMIGRATION_COLOR))
                .draw()
                .map_err(RenderError::drawing)?;

            chart
                .configure_secondary_axes()
                .y_labels(k_ticks.len())
                .y_desc(KNIFE_CRIME_LABEL)
                .y_label_formatter(&k_fmt)
                .label_style((FONT, pt(10.0)).into_font().color(&KNIFE_CRIME_COLOR))
                .axis_desc_style((FONT, pt(10.0)).into_font().color(&KNIFE_CRIME_COLOR))
                .draw()
                .map_err(RenderError::drawing)?;

            // Dashed grid underneath both series.
            let grid = GRID_COLOR.mix(0.5).stroke_width(pt(0.8));
            for line in grid_lines(&x_ticks, &e_ticks, (x0, x1), (e0, e1)) {
                chart
                    .draw_series(DashedLineSeries::new(line, pt(DASH), pt(DASH_GAP), grid))
                    .map_err(RenderError::drawing)?;
            }

            let line_width = pt(2.0);
            let marker = pt(3.0) as i32;

            for run in data.runs(&data.emigration) {
                chart
                    .draw_series(LineSeries::new(
                        run.clone(),
                        EMIGRATION_COLOR.stroke_width(line_width),
                    ))
                    .map_err(RenderError::drawing)?;
                chart
                    .draw_series(
                        run.into_iter()
                            .map(|p| Circle::new(p, marker, EMIGRATION_COLOR.filled())),
                    )
                    .map_err(RenderError::drawing)?;
            }

            for run in data.runs(&data.knife_crime) {
                chart
                    .draw_secondary_series(LineSeries::new(
                        run.clone(),
                        KNIFE_CRIME_COLOR.stroke_width(line_width),
                    ))
                    .map_err(RenderError::drawing)?;
                chart
                    .draw_secondary_series(run.into_iter().map(|p| {
                        EmptyElement::at(p)
                            + Rectangle::new(
                                [(-marker, -marker), (marker, marker)],
                                KNIFE_CRIME_COLOR.filled(),
                            )
                    }))
                    .map_err(RenderError::drawing)?;
            }

            Ok(())
        })
    }

    /// Knife crime (x) against emigration (y) with an optional trend line.
    pub fn draw_scatter(
        data: &ChartData,
        fit: Option<&LinearFit>,
        path: &Path,
    ) -> Result<(), RenderError> {
        let (xs, ys) = data.paired_points();
        let (x0, x1) = StaticChartRenderer::padded_range(xs.iter().copied(), 0.05);
        let (y0, y1) = StaticChartRenderer::padded_range(ys.iter().copied(), 0.05);
        let x_ticks = StaticChartRenderer::axis_ticks(x0, x1, 6);
        let y_ticks = StaticChartRenderer::axis_ticks(y0, y1, 6);

        StaticChartRenderer::render_png(path, figure_pixels(9.0, 6.0), |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(SCATTER_TITLE, (FONT, pt(12.0)))
                .margin(pt(8.0))
                .x_label_area_size(pt(36.0))
                .y_label_area_size(pt(60.0))
                .build_cartesian_2d(x0..x1, y0..y1)
                .map_err(RenderError::drawing)?;

            let x_fmt = |v: &f64| StaticChartRenderer::format_tick(*v, &x_ticks);
            let y_fmt = |v: &f64| StaticChartRenderer::format_tick(*v, &y_ticks);

            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(x_ticks.len())
                .y_labels(y_ticks.len())
                .x_desc(KNIFE_CRIME_LABEL)
                .y_desc(EMIGRATION_LABEL)
                .x_label_formatter(&x_fmt)
                .y_label_formatter(&y_fmt)
                .label_style((FONT, pt(10.0)))
                .axis_desc_style((FONT, pt(10.0)))
                .draw()
                .map_err(RenderError::drawing)?;

            let grid = GRID_COLOR.mix(0.4).stroke_width(pt(0.8));
            for line in grid_lines(&x_ticks, &y_ticks, (x0, x1), (y0, y1)) {
                chart
                    .draw_series(DashedLineSeries::new(line, pt(DASH), pt(DASH_GAP), grid))
                    .map_err(RenderError::drawing)?;
            }

            chart
                .draw_series(
                    xs.iter().zip(&ys).map(|(&x, &y)| {
                        Circle::new((x, y), pt(3.0), EMIGRATION_COLOR.mix(0.8).filled())
                    }),
                )
                .map_err(RenderError::drawing)?;

            if let Some(fit) = fit {
                let (lo, hi) = xs
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                        (lo.min(x), hi.max(x))
                    });
                let line = StatsCalculator::linspace(lo, hi, FIT_SAMPLES)
                    .into_iter()
                    .map(|x| (x, fit.predict(x)));
                chart
                    .draw_series(LineSeries::new(line, TREND_COLOR.stroke_width(pt(2.0))))
                    .map_err(RenderError::drawing)?;
            }

            Ok(())
        })
    }
}
