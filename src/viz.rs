//! Chart rendering with Plotters and text formatting of dashboard views

use std::f64::consts::PI;
use std::fmt;

use plotters::prelude::*;
use polars::prelude::{ChunkAgg, Float64Chunked};

use crate::data::{ColumnInfo, ColumnStats, DatasetOverview, FeatureRange};
use crate::metrics::CLASS_NAMES;
use crate::model::{Evaluation, Prediction};

/// Palette for label categories
const CATEGORY_COLORS: [RGBColor; 5] = [BLUE, RED, GREEN, MAGENTA, CYAN];

/// Bins used by the EDA histogram
pub const HISTOGRAM_BINS: usize = 30;

fn category_color(index: usize) -> RGBColor {
    CATEGORY_COLORS[index % CATEGORY_COLORS.len()]
}

/// Bar chart of customers per churn label
pub fn create_churn_bar_chart(counts: &[(String, usize)], output_path: &str) -> crate::Result<()> {
    let max_count = counts.iter().map(|(_, n)| *n).max().unwrap_or(1).max(1) as f64;
    let n_bars = counts.len().max(1);

    let root = BitMapBackend::new(output_path, (600, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customers by Churn", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..n_bars as f64, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n_bars)
        .x_label_formatter(&|x| {
            counts
                .get(x.floor() as usize)
                .map(|(label, _)| label.clone())
                .unwrap_or_default()
        })
        .x_desc("Churn")
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, (_, count)) in counts.iter().enumerate() {
        let color = category_color(i);
        chart.draw_series(std::iter::once(Rectangle::new(
            [(i as f64 + 0.1, 0.0), (i as f64 + 0.9, *count as f64)],
            color.filled(),
        )))?;
    }

    root.present()?;
    tracing::info!(path = output_path, "churn bar chart saved");

    Ok(())
}

/// One wedge of the churn pie
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub percent: f64,
    /// Radians, clockwise from 12 o'clock
    pub start_angle: f64,
    pub end_angle: f64,
}

/// Split a full turn proportionally to the counts
pub fn pie_slices(counts: &[(String, usize)]) -> Vec<PieSlice> {
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut angle = 0.0;
    counts
        .iter()
        .map(|(label, n)| {
            let share = *n as f64 / total as f64;
            let slice = PieSlice {
                label: label.clone(),
                percent: share * 100.0,
                start_angle: angle,
                end_angle: angle + share * 2.0 * PI,
            };
            angle = slice.end_angle;
            slice
        })
        .collect()
}

/// Pie chart of churn shares with percentage labels
pub fn create_churn_pie_chart(counts: &[(String, usize)], output_path: &str) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, (500, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled("Churn Share", ("sans-serif", 30))?;

    let (width, height) = area.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = width.min(height) as f64 * 0.4;
    let point = |angle: f64, r: f64| {
        (
            (center.0 + r * angle.sin()).round() as i32,
            (center.1 - r * angle.cos()).round() as i32,
        )
    };

    for (i, slice) in pie_slices(counts).iter().enumerate() {
        let sweep = slice.end_angle - slice.start_angle;
        let steps = (sweep / (2.0 * PI) * 180.0).ceil().max(1.0) as usize;
        let mut wedge = vec![point(0.0, 0.0)];
        wedge.extend((0..=steps).map(|s| {
            let t = s as f64 / steps as f64;
            point(slice.start_angle + t * sweep, radius)
        }));
        area.draw(&Polygon::new(wedge, category_color(i).filled()))?;

        let middle = (slice.start_angle + slice.end_angle) / 2.0;
        area.draw(&Text::new(
            format!("{} ({:.1}%)", slice.label, slice.percent),
            point(middle, radius * 0.6),
            ("sans-serif", 15).into_font(),
        ))?;
    }

    root.present()?;
    tracing::info!(path = output_path, "churn pie chart saved");

    Ok(())
}

/// Equal-width histogram bin
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Bucket non-null values into `n_bins` equal-width bins spanning their range
///
/// A constant column yields a single bin holding every value.
pub fn histogram_bins(values: &Float64Chunked, n_bins: usize) -> Vec<HistogramBin> {
    let (Some(min), Some(max)) = (values.min(), values.max()) else {
        return Vec::new();
    };
    if n_bins == 0 {
        return Vec::new();
    }
    if min == max {
        return vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            count: values.len() - values.null_count(),
        }];
    }

    let width = (max - min) / n_bins as f64;
    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|i| HistogramBin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for v in values.into_iter().flatten() {
        let idx = (((v - min) / width) as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Histogram of one numeric column
pub fn create_histogram(
    column: &str,
    bins: &[HistogramBin],
    output_path: &str,
) -> crate::Result<()> {
    let x_min = bins.first().map(|b| b.start).unwrap_or(0.0);
    let x_max = bins.last().map(|b| b.end).unwrap_or(1.0);
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(1).max(1) as f64;

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Distribution of {}", column), ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("Count")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(bins.iter().map(|bin| {
        Rectangle::new([(bin.start, 0.0), (bin.end, bin.count as f64)], BLUE.mix(0.7).filled())
    }))?;

    root.present()?;
    tracing::info!(path = output_path, column, "histogram saved");

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for DatasetOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Churn Dataset ===")?;
        writeln!(f, "Total customers: {}", self.total_customers)?;
        if let Some(churned) = self.total_churn {
            writeln!(f, "Total churn: {}", churned)?;
        }
        if let Some(rate) = self.churn_rate {
            writeln!(f, "Churn rate: {:.2}%", rate)?;
        }
        if let Some(phone) = self.phone_service {
            writeln!(f, "Phone service: {}", phone)?;
        }
        if let Some(fiber) = self.fiber_optic {
            writeln!(f, "Fiber optic users: {}", fiber)?;
        }
        Ok(())
    }
}

/// Descriptive statistics table
pub struct StatsTable<'a>(pub &'a [ColumnStats]);

impl fmt::Display for StatsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Descriptive Statistics ===")?;
        writeln!(
            f,
            "  {:<20} | {:>7} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for s in self.0 {
            writeln!(
                f,
                "  {:<20} | {:>7} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10} | {:>10}",
                s.name,
                s.count,
                fmt_opt(s.mean),
                fmt_opt(s.std),
                fmt_opt(s.min),
                fmt_opt(s.q25),
                fmt_opt(s.median),
                fmt_opt(s.q75),
                fmt_opt(s.max)
            )?;
        }
        Ok(())
    }
}

/// Column dtype and cardinality table
pub struct ColumnInfoTable<'a>(pub &'a [ColumnInfo]);

impl fmt::Display for ColumnInfoTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Column Info ===")?;
        writeln!(f, "  {:<20} | {:<10} | {:>8}", "column", "dtype", "n_unique")?;
        for c in self.0 {
            writeln!(f, "  {:<20} | {:<10} | {:>8}", c.name, c.dtype, c.n_unique)?;
        }
        Ok(())
    }
}

/// Churn label counts with their shares
pub struct ChurnCounts<'a>(pub &'a [(String, usize)]);

impl fmt::Display for ChurnCounts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Churn Comparison ===")?;
        for ((_, count), slice) in self.0.iter().zip(pie_slices(self.0)) {
            writeln!(f, "  {:<10} {:>7} ({:.1}%)", slice.label, count, slice.percent)?;
        }
        Ok(())
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Churn Modeling ===")?;
        writeln!(
            f,
            "Train rows: {}, held-out rows: {}",
            self.split.train.len(),
            self.split.test.len()
        )?;
        writeln!(f, "Accuracy: {:.4}", self.accuracy)?;

        writeln!(f, "\nConfusion Matrix (rows = actual, columns = predicted):")?;
        writeln!(f, "  {:>8} | {:>8} | {:>8}", "", CLASS_NAMES[0], CLASS_NAMES[1])?;
        for (name, row) in CLASS_NAMES.iter().zip(self.confusion.counts.iter()) {
            writeln!(f, "  {:>8} | {:>8} | {:>8}", name, row[0], row[1])?;
        }

        writeln!(f, "\nClassification Report:")?;
        write!(f, "{}", self.report)?;
        if self.degenerate {
            writeln!(
                f,
                "\nNote: the held-out partition is missing a class; its metrics read as 0."
            )?;
        }
        Ok(())
    }
}

/// Feature list with observed ranges for prediction input
pub struct FeatureRangeList<'a>(pub &'a [FeatureRange]);

impl fmt::Display for FeatureRangeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Enter one value for each feature, in this order:")?;
        for r in self.0 {
            if r.is_fixed() {
                writeln!(f, "  {:<20} = {}", r.name, r.min)?;
            } else {
                writeln!(f, "  {:<20} [{} .. {}]", r.name, r.min, r.max)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Churn Prediction ===")?;
        writeln!(f, "{}", self.message())?;
        writeln!(f, "Churn probability: {:.1}%", self.churn_probability * 100.0)
    }
}
