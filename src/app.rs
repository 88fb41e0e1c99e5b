//! Session state and menu dispatch
//!
//! Every menu item is a pure handler `(state, action) -> (state', view)` looked up
//! from a table indexed by [`MenuKind`]. Only [`MenuAction::Load`] replaces the
//! dataset; failures are turned into an inline view and leave the state untouched.

use std::fmt;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;

use crate::data::{self, ColumnInfo, ColumnStats, DatasetOverview, FeatureRange, LABEL_COLUMN};
use crate::error::ChurnError;
use crate::features::{labeled_rows, prepare_features};
use crate::model::{self, Evaluation, ModelConfig, Prediction};
use crate::viz::{
    self, ChurnCounts, ColumnInfoTable, FeatureRangeList, HistogramBin, StatsTable, HISTOGRAM_BINS,
};

/// Rows shown in the data preview
const PREVIEW_ROWS: usize = 10;

/// Static findings of the churn analysis
pub const BUSINESS_INSIGHTS: [&str; 5] = [
    "Customers on month-to-month contracts churn the most.",
    "Higher monthly charges increase churn risk.",
    "Fiber optic internet has the highest churn rate.",
    "Customers with low tenure tend to churn sooner.",
    "Retention efforts should target new customers and fiber optic users.",
];

/// Settings shared by every handler
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory receiving chart PNGs
    pub output_dir: PathBuf,
    pub model: ModelConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            model: ModelConfig::default(),
        }
    }
}

/// Session state: the currently loaded dataset, if any
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub dataset: Option<DataFrame>,
    /// Path the dataset was loaded from
    pub source: Option<String>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            dataset: None,
            source: None,
            settings,
        }
    }

    /// Loaded dataset or `EmptyDataset`
    pub fn dataset(&self) -> crate::Result<&DataFrame> {
        self.dataset
            .as_ref()
            .ok_or_else(|| ChurnError::EmptyDataset.into())
    }
}

/// User-selectable menu actions
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    /// Replace the session dataset with the CSV at the given path
    Load(String),
    ShowData,
    ChurnChart,
    /// Histogram of a numeric column; the first numeric column when `None`
    Eda { column: Option<String> },
    Modeling,
    /// Classify one customer; list the expected inputs when `None`
    Prediction { values: Option<Vec<f64>> },
    Insights,
}

impl MenuAction {
    pub fn kind(&self) -> MenuKind {
        match self {
            MenuAction::Load(_) => MenuKind::Load,
            MenuAction::ShowData => MenuKind::ShowData,
            MenuAction::ChurnChart => MenuKind::ChurnChart,
            MenuAction::Eda { .. } => MenuKind::Eda,
            MenuAction::Modeling => MenuKind::Modeling,
            MenuAction::Prediction { .. } => MenuKind::Prediction,
            MenuAction::Insights => MenuKind::Insights,
        }
    }
}

/// Menu entries, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    Load = 0,
    ShowData,
    ChurnChart,
    Eda,
    Modeling,
    Prediction,
    Insights,
}

type Handler = fn(AppState, &MenuAction) -> crate::Result<(AppState, View)>;

/// Indexed by `MenuKind as usize`
const HANDLERS: [Handler; 7] = [
    handle_load,
    handle_show_data,
    handle_churn_chart,
    handle_eda,
    handle_modeling,
    handle_prediction,
    handle_insights,
];

impl MenuKind {
    pub const ALL: [MenuKind; 7] = [
        MenuKind::Load,
        MenuKind::ShowData,
        MenuKind::ChurnChart,
        MenuKind::Eda,
        MenuKind::Modeling,
        MenuKind::Prediction,
        MenuKind::Insights,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuKind::Load => "Upload Data",
            MenuKind::ShowData => "Show Data",
            MenuKind::ChurnChart => "Churn Chart",
            MenuKind::Eda => "EDA",
            MenuKind::Modeling => "Modeling",
            MenuKind::Prediction => "Prediction",
            MenuKind::Insights => "Business Insights",
        }
    }

    fn handler(self) -> Handler {
        HANDLERS[self as usize]
    }
}

/// Result of one menu action, rendered with `Display`
#[derive(Debug, Clone)]
pub enum View {
    Loaded {
        path: String,
        rows: usize,
        columns: usize,
    },
    Data {
        overview: DatasetOverview,
        stats: Vec<ColumnStats>,
        info: Vec<ColumnInfo>,
        preview: String,
    },
    ChurnChart {
        counts: Vec<(String, usize)>,
        charts: Vec<PathBuf>,
    },
    Histogram {
        column: String,
        bins: Vec<HistogramBin>,
        chart: Option<PathBuf>,
    },
    Evaluation(Box<Evaluation>),
    FeatureInputs(Vec<FeatureRange>),
    Prediction {
        prediction: Prediction,
        /// Features whose value lies outside the observed range
        out_of_range: Vec<String>,
    },
    Insights,
    /// Recoverable condition such as no data loaded yet
    Warning(String),
    Error(String),
}

impl View {
    pub fn is_error(&self) -> bool {
        matches!(self, View::Warning(_) | View::Error(_))
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Loaded {
                path,
                rows,
                columns,
            } => writeln!(f, "✓ Loaded {} ({} rows, {} columns)", path, rows, columns),
            View::Data {
                overview,
                stats,
                info,
                preview,
            } => {
                write!(f, "{}", overview)?;
                writeln!(f, "\n{}\n", preview)?;
                writeln!(f, "{}", StatsTable(stats))?;
                write!(f, "{}", ColumnInfoTable(info))
            }
            View::ChurnChart { counts, charts } => {
                write!(f, "{}", ChurnCounts(counts))?;
                for chart in charts {
                    writeln!(f, "Chart saved to: {}", chart.display())?;
                }
                Ok(())
            }
            View::Histogram {
                column,
                bins,
                chart,
            } => {
                writeln!(f, "=== Distribution of {} ===", column)?;
                for bin in bins {
                    writeln!(f, "  [{:>10.2}, {:>10.2})  {}", bin.start, bin.end, bin.count)?;
                }
                if let Some(path) = chart {
                    writeln!(f, "Chart saved to: {}", path.display())?;
                }
                Ok(())
            }
            View::Evaluation(evaluation) => write!(f, "{}", evaluation),
            View::FeatureInputs(ranges) => write!(f, "{}", FeatureRangeList(ranges)),
            View::Prediction {
                prediction,
                out_of_range,
            } => {
                write!(f, "{}", prediction)?;
                if !out_of_range.is_empty() {
                    writeln!(
                        f,
                        "Note: values outside the observed range for: {}",
                        out_of_range.join(", ")
                    )?;
                }
                Ok(())
            }
            View::Insights => {
                writeln!(f, "=== Business Insights ===")?;
                for insight in BUSINESS_INSIGHTS {
                    writeln!(f, "  - {}", insight)?;
                }
                Ok(())
            }
            View::Warning(message) => writeln!(f, "⚠ {}", message),
            View::Error(message) => writeln!(f, "✗ {}", message),
        }
    }
}

/// Run one action; errors become an inline view and keep the previous state
pub fn dispatch(state: AppState, action: &MenuAction) -> (AppState, View) {
    tracing::debug!(menu = action.kind().label(), "dispatching menu action");

    match action.kind().handler()(state.clone(), action) {
        Ok(next) => next,
        Err(err) => {
            let view = match err.downcast_ref::<ChurnError>() {
                Some(ChurnError::EmptyDataset) => View::Warning(err.to_string()),
                _ => {
                    tracing::warn!(error = %err, "menu action failed");
                    View::Error(format!("{:#}", err))
                }
            };
            (state, view)
        }
    }
}

fn handle_load(mut state: AppState, action: &MenuAction) -> crate::Result<(AppState, View)> {
    let MenuAction::Load(path) = action else {
        anyhow::bail!("load handler received {:?}", action);
    };

    let df = data::load_dataset(path)?;
    let view = View::Loaded {
        path: path.clone(),
        rows: df.height(),
        columns: df.width(),
    };
    state.dataset = Some(df);
    state.source = Some(path.clone());
    Ok((state, view))
}

fn handle_show_data(state: AppState, _action: &MenuAction) -> crate::Result<(AppState, View)> {
    let df = state.dataset()?;
    let view = View::Data {
        overview: data::overview(df)?,
        stats: data::describe(df)?,
        info: data::column_info(df)?,
        preview: df.head(Some(PREVIEW_ROWS)).to_string(),
    };
    Ok((state, view))
}

fn handle_churn_chart(state: AppState, _action: &MenuAction) -> crate::Result<(AppState, View)> {
    let df = state.dataset()?;
    if !data::has_label(df) {
        return Err(ChurnError::MissingLabelColumn(LABEL_COLUMN.to_string()).into());
    }

    let counts = data::value_counts(df, LABEL_COLUMN)?;
    let out_dir = &state.settings.output_dir;
    let mut charts = Vec::new();

    let bar_path = out_dir.join("churn_bar.png");
    if render_chart(&bar_path, |p| viz::create_churn_bar_chart(&counts, p)) {
        charts.push(bar_path);
    }
    let pie_path = out_dir.join("churn_pie.png");
    if render_chart(&pie_path, |p| viz::create_churn_pie_chart(&counts, p)) {
        charts.push(pie_path);
    }

    Ok((state, View::ChurnChart { counts, charts }))
}

fn handle_eda(state: AppState, action: &MenuAction) -> crate::Result<(AppState, View)> {
    let df = state.dataset()?;
    let numeric = data::numeric_columns(df);
    let first = numeric.first().ok_or(ChurnError::NoNumericColumns)?;

    let column = match action {
        MenuAction::Eda { column: Some(name) } => name.clone(),
        _ => first.clone(),
    };
    if !numeric.contains(&column) {
        return Err(ChurnError::UnknownColumn(column).into());
    }

    let values = data::finite_values(df, &column)?;
    let bins = viz::histogram_bins(&values, HISTOGRAM_BINS);

    let path = state
        .settings
        .output_dir
        .join(format!("eda_{}.png", file_stem(&column)));
    let chart = render_chart(&path, |p| viz::create_histogram(&column, &bins, p)).then_some(path);

    Ok((
        state,
        View::Histogram {
            column,
            bins,
            chart,
        },
    ))
}

fn handle_modeling(state: AppState, _action: &MenuAction) -> crate::Result<(AppState, View)> {
    let prepared = prepare_features(state.dataset()?)?;
    let evaluation = model::evaluate(&prepared, &state.settings.model)?;
    Ok((state, View::Evaluation(Box::new(evaluation))))
}

fn handle_prediction(state: AppState, action: &MenuAction) -> crate::Result<(AppState, View)> {
    let df = state.dataset()?;
    let prepared = prepare_features(df)?;
    let ranges = data::feature_ranges(&labeled_rows(df)?, &prepared.feature_names)?;

    let values = match action {
        MenuAction::Prediction { values: Some(values) } => values,
        _ => return Ok((state, View::FeatureInputs(ranges))),
    };

    let out_of_range: Vec<String> = ranges
        .iter()
        .zip(values)
        .filter(|(range, &v)| !range.contains(v))
        .map(|(range, _)| range.name.clone())
        .collect();
    if !out_of_range.is_empty() {
        tracing::warn!(features = ?out_of_range, "prediction input outside observed range");
    }

    let prediction = model::predict_customer(&prepared, values, &state.settings.model)?;
    Ok((
        state,
        View::Prediction {
            prediction,
            out_of_range,
        },
    ))
}

fn handle_insights(state: AppState, _action: &MenuAction) -> crate::Result<(AppState, View)> {
    Ok((state, View::Insights))
}

/// Render a chart, logging rather than failing when drawing is unavailable
fn render_chart(path: &Path, draw: impl FnOnce(&str) -> crate::Result<()>) -> bool {
    let Some(path_str) = path.to_str() else {
        tracing::warn!(path = %path.display(), "chart path is not valid UTF-8");
        return false;
    };
    match draw(path_str) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(path = path_str, error = %err, "chart rendering failed");
            false
        }
    }
}

/// Column name reduced to filename-safe characters
fn file_stem(column: &str) -> String {
    column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
