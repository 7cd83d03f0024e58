use std::fmt::Write;

use crate::charts::{
    heatmap_alpha, heatmap_color, hour_labels, labelled_cells, CategoryValue, ChartArea,
    GridOverlay, MatrixCell, HOURS_PER_DAY, PALETTE,
};

/// Shades from empty to full, indexed by heatmap opacity.
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
const NO_DATA: &str = "(no data)";

const SVG_CELL_WIDTH: f32 = 28.0;
const SVG_CELL_HEIGHT: f32 = 22.0;
const SVG_LABEL_WIDTH: f32 = 170.0;
const SVG_TITLE_HEIGHT: f32 = 36.0;
const SVG_AXIS_HEIGHT: f32 = 28.0;
const SVG_MARGIN: f32 = 12.0;

/// Renders prepared chart data as plain text for the terminal.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    bar_width: usize,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self { bar_width: 40 }
    }
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bar_width(bar_width: usize) -> Self {
        Self {
            bar_width: bar_width.max(1),
        }
    }

    /// Horizontal bar chart, one line per category, scaled to the largest
    /// value.
    pub fn bar_chart(&self, title: &str, rows: &[CategoryValue]) -> String {
        let mut out = format!("{title}\n");
        if rows.is_empty() {
            out.push_str(NO_DATA);
            out.push('\n');
            return out;
        }

        let label_width = label_width(rows.iter().map(|row| row.category.as_str()));
        let max = rows.iter().map(|row| row.value).max().unwrap_or(0).max(1);

        for row in rows {
            let len = (row.value as usize * self.bar_width).div_ceil(max as usize);
            let _ = writeln!(
                out,
                "{:<label_width$} │{} {}",
                row.category,
                "█".repeat(len),
                row.value
            );
        }
        out
    }

    /// Species-by-hour heatmap. Cells are shaded by their row-normalised
    /// opacity; each row is labelled with its species.
    pub fn heatmap(&self, title: &str, cells: &[MatrixCell]) -> String {
        let mut out = format!("{title}\n");
        if cells.is_empty() {
            out.push_str(NO_DATA);
            out.push('\n');
            return out;
        }

        let label_width = label_width(cells.iter().map(|cell| cell.y.as_str()));
        let header: String = hour_labels()
            .iter()
            .map(|label| label.chars().nth(1).unwrap_or(' '))
            .collect();
        let _ = writeln!(out, "{:<label_width$} │{header}", "");

        let mut current: Option<&str> = None;
        for cell in cells {
            if current != Some(cell.y.as_str()) {
                if current.is_some() {
                    out.push('\n');
                }
                let _ = write!(out, "{:<label_width$} │", cell.y);
                current = Some(cell.y.as_str());
            }
            out.push(shade(cell));
        }
        out.push('\n');
        out
    }

    /// Species-by-hour heatmap as a standalone SVG document. Cells are filled
    /// with the palette colour at their row-normalised opacity, non-zero
    /// counts are labelled, and grid lines fall on the cell boundaries.
    pub fn heatmap_svg(&self, title: &str, cells: &[MatrixCell]) -> String {
        let species: Vec<&str> = cells
            .chunks(HOURS_PER_DAY)
            .map(|row| row[0].y.as_str())
            .collect();
        let grid = GridOverlay {
            columns: HOURS_PER_DAY,
            rows: species.len(),
        };
        let area = ChartArea {
            left: SVG_LABEL_WIDTH,
            top: SVG_TITLE_HEIGHT,
            width: SVG_CELL_WIDTH * HOURS_PER_DAY as f32,
            height: SVG_CELL_HEIGHT * species.len().max(1) as f32,
        };
        let (cell_width, cell_height) = grid.cell_size(area);
        let width = area.right() + SVG_MARGIN;
        let height = area.bottom() + SVG_AXIS_HEIGHT;

        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="sans-serif" font-size="11">"#
        );
        let _ = writeln!(
            out,
            r#"<rect width="100%" height="100%" fill="{}"/>"#,
            PALETTE.background
        );
        let _ = writeln!(
            out,
            r#"<text x="{}" y="22" font-size="15" font-weight="bold" fill="{}">{}</text>"#,
            area.left,
            PALETTE.text,
            escape_xml(title)
        );

        if cells.is_empty() {
            let _ = writeln!(
                out,
                r#"<text x="{}" y="{}" fill="{}">{NO_DATA}</text>"#,
                area.left,
                area.top + cell_height / 2.0,
                PALETTE.text
            );
            out.push_str("</svg>\n");
            return out;
        }

        let origin = |index: usize| {
            (
                area.left + (index % HOURS_PER_DAY) as f32 * cell_width,
                area.top + (index / HOURS_PER_DAY) as f32 * cell_height,
            )
        };

        for (index, cell) in cells.iter().enumerate() {
            let (x, y) = origin(index);
            let _ = writeln!(
                out,
                r#"<rect class="cell" x="{x}" y="{y}" width="{cell_width}" height="{cell_height}" fill="{}"/>"#,
                heatmap_color(cell).css()
            );
        }

        for (index, cell) in labelled_cells(cells) {
            let (x, y) = origin(index);
            let _ = writeln!(
                out,
                r#"<text class="label" x="{}" y="{}" text-anchor="middle" dominant-baseline="central" fill="{}">{}</text>"#,
                x + cell_width / 2.0,
                y + cell_height / 2.0,
                PALETTE.text,
                cell.v
            );
        }

        for line in grid
            .vertical_lines(area)
            .into_iter()
            .chain(grid.horizontal_lines(area))
        {
            let _ = writeln!(
                out,
                r#"<line class="grid" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}"/>"#,
                line.from.0, line.from.1, line.to.0, line.to.1, PALETTE.grid
            );
        }

        for (row, name) in species.iter().enumerate() {
            let _ = writeln!(
                out,
                r#"<text x="{}" y="{}" text-anchor="end" dominant-baseline="central" fill="{}">{}</text>"#,
                area.left - 8.0,
                area.top + (row as f32 + 0.5) * cell_height,
                PALETTE.text,
                escape_xml(name)
            );
        }

        for (column, label) in hour_labels().iter().enumerate().step_by(2) {
            let _ = writeln!(
                out,
                r#"<text x="{}" y="{}" text-anchor="middle" fill="{}">{label}</text>"#,
                area.left + (column as f32 + 0.5) * cell_width,
                area.bottom() + 16.0,
                PALETTE.text
            );
        }

        out.push_str("</svg>\n");
        out
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn shade(cell: &MatrixCell) -> char {
    if cell.v == 0 {
        return SHADES[0];
    }
    let alpha = heatmap_alpha(cell).clamp(0.0, 1.0);
    let index = (alpha * (SHADES.len() - 1) as f32).round() as usize;
    SHADES[index.max(1)]
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(|label| label.chars().count()).max().unwrap_or(0)
}
