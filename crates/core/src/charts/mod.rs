use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::api::Detection;

pub const HOURS_PER_DAY: usize = 24;

/// Per-species detection counts for each hour of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesActivity {
    pub species: String,
    pub hourly_activity: [u32; HOURS_PER_DAY],
}

impl SpeciesActivity {
    pub fn new(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            hourly_activity: [0; HOURS_PER_DAY],
        }
    }

    pub fn total(&self) -> u32 {
        self.hourly_activity.iter().sum()
    }
}

/// Min/max of one heatmap row, used to normalise colours per species.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowStats {
    pub min: u32,
    pub max: u32,
}

/// One cell of the species-by-hour matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCell {
    /// Hour label, e.g. `"05:00"`.
    pub x: String,
    /// Species label.
    pub y: String,
    pub v: u32,
    pub row_stats: RowStats,
}

/// A `{category, value}` row as consumed by bar charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryValue {
    pub category: String,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Nature-themed colours shared by every chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent1: &'static str,
    pub accent2: &'static str,
    pub text: &'static str,
    pub background: &'static str,
    pub grid: &'static str,
    /// RGB triple of `secondary`, used for heatmap cells.
    pub secondary_rgb: [u8; 3],
}

pub const PALETTE: Palette = Palette {
    primary: "#2D6A4F",
    secondary: "#74C69D",
    accent1: "#D9ED92",
    accent2: "#B7E4C7",
    text: "#1B4332",
    background: "#F1FAEE",
    grid: "rgba(45, 106, 79, 0.2)",
    secondary_rgb: [116, 198, 157],
};

/// Groups detections by species and hour of day. Species keep the order in
/// which they first appear; rows whose time has no valid `HH` prefix still
/// register the species but add no count.
pub fn hourly_activity(detections: &[Detection]) -> Vec<SpeciesActivity> {
    let mut rows: Vec<SpeciesActivity> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for detection in detections {
        let species = detection.species();
        let row = *index.entry(species.to_string()).or_insert_with(|| {
            rows.push(SpeciesActivity::new(species));
            rows.len() - 1
        });

        if let Some(hour) = parse_hour(&detection.time) {
            rows[row].hourly_activity[hour] += 1;
        }
    }

    rows
}

fn parse_hour(time: &str) -> Option<usize> {
    let hour: usize = time.split(':').next()?.trim().parse().ok()?;
    (hour < HOURS_PER_DAY).then_some(hour)
}

/// `"00:00"` through `"23:00"`.
pub fn hour_labels() -> Vec<String> {
    (0..HOURS_PER_DAY).map(|hour| format!("{hour:02}:00")).collect()
}

pub fn row_stats(data: &[SpeciesActivity]) -> Vec<RowStats> {
    data.iter()
        .map(|row| RowStats {
            min: row.hourly_activity.iter().copied().min().unwrap_or(0),
            max: row.hourly_activity.iter().copied().max().unwrap_or(0),
        })
        .collect()
}

/// Flattens activity rows into matrix cells, row by row, hour by hour.
pub fn category_matrix(data: &[SpeciesActivity], stats: &[RowStats]) -> Vec<MatrixCell> {
    let hours = hour_labels();
    data.iter()
        .zip(stats)
        .flat_map(|(row, stats)| {
            row.hourly_activity
                .iter()
                .zip(&hours)
                .map(move |(value, hour)| MatrixCell {
                    x: hour.clone(),
                    y: row.species.clone(),
                    v: *value,
                    row_stats: *stats,
                })
        })
        .collect()
}

/// Opacity of a heatmap cell: the square root of the value normalised to its
/// row, or 0.5 for rows without variation.
pub fn heatmap_alpha(cell: &MatrixCell) -> f32 {
    let RowStats { min, max } = cell.row_stats;
    let normalized = if max > min {
        (cell.v.saturating_sub(min)) as f32 / (max - min) as f32
    } else {
        0.5
    };
    normalized.sqrt()
}

pub fn heatmap_color(cell: &MatrixCell) -> Rgba {
    let [r, g, b] = PALETTE.secondary_rgb;
    Rgba {
        r,
        g,
        b,
        a: heatmap_alpha(cell),
    }
}

/// Cells that get a value label drawn over them, with their index in
/// `cells`.
pub fn labelled_cells(cells: &[MatrixCell]) -> impl Iterator<Item = (usize, &MatrixCell)> {
    cells.iter().enumerate().filter(|(_, cell)| cell.v > 0)
}

/// Total detections per species, for the horizontal bar chart.
pub fn totals(data: &[SpeciesActivity]) -> Vec<CategoryValue> {
    data.iter()
        .map(|row| CategoryValue {
            category: row.species.clone(),
            value: row.total(),
        })
        .collect()
}

/// Drawing area of a chart in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartArea {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ChartArea {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Grid drawn over a category matrix so that lines fall on cell
/// boundaries rather than through cell centres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridOverlay {
    pub columns: usize,
    pub rows: usize,
}

/// A straight line segment in chart pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Line {
    pub from: (f32, f32),
    pub to: (f32, f32),
}

impl GridOverlay {
    /// Maps a category index (cell centres at `0, 1, ..`) to a pixel offset
    /// along an axis of `length` pixels holding `count` categories.
    fn pixel(index: f32, count: usize, start: f32, length: f32) -> f32 {
        let step = length / count.max(1) as f32;
        start + (index + 0.5) * step
    }

    /// Vertical boundary lines at `i - 0.5` for `i` in `0..=columns`.
    pub fn vertical_lines(&self, area: ChartArea) -> Vec<Line> {
        (0..=self.columns)
            .map(|i| {
                let x = Self::pixel(i as f32 - 0.5, self.columns, area.left, area.width);
                Line {
                    from: (x, area.top),
                    to: (x, area.bottom()),
                }
            })
            .collect()
    }

    /// Horizontal boundary lines at `i - 0.5` for `i` in `0..=rows`.
    pub fn horizontal_lines(&self, area: ChartArea) -> Vec<Line> {
        (0..=self.rows)
            .map(|i| {
                let y = Self::pixel(i as f32 - 0.5, self.rows, area.top, area.height);
                Line {
                    from: (area.left, y),
                    to: (area.right(), y),
                }
            })
            .collect()
    }

    /// Size of one cell within `area`.
    pub fn cell_size(&self, area: ChartArea) -> (f32, f32) {
        (
            area.width / self.columns.max(1) as f32,
            area.height / self.rows.max(1) as f32,
        )
    }
}
