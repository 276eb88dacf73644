//! Box plot + statistics table, stacked vertically in one image.
//!
//! Layout (top to bottom):
//! - horizontal box plot, one box per column, first column at the bottom;
//!   median solid red, mean dashed blue, boxes filled green, no outliers
//! - table: row label = column name, then Mean / Median / Min / Max

use crate::Result;
use crate::render::fonts;
use crate::timing::TimingReport;

use anyhow::bail;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle, TextStyle};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Column headers of the statistics table.
pub const TABLE_HEADERS: [&str; 4] = ["Mean", "Median", "Min", "Max"];

const BOX_FILL: RGBColor = RGBColor(0, 128, 0);
const GRID: RGBColor = RGBColor(220, 220, 220);

/// Half the height of a box, in category units.
const BOX_HALF_HEIGHT: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct FigureConfig {
    /// Output file. `.svg` selects the SVG backend; anything else is encoded
    /// as a bitmap by extension.
    pub output: PathBuf,
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    /// TrueType font for text; system fonts are tried when unset.
    pub font: Option<PathBuf>,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("time.png"),
            width_in: 6.4,
            height_in: 4.8,
            dpi: 1000,
            font: None,
        }
    }
}

impl FigureConfig {
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| (inches * self.dpi as f64).round().max(1.0) as u32;
        (px(self.width_in), px(self.height_in))
    }

    fn is_svg(&self) -> bool {
        self.output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
    }

    /// Points to pixels, at least one pixel.
    fn pt(&self, points: f64) -> u32 {
        (points * self.dpi as f64 / 72.0).round().max(1.0) as u32
    }
}

/// Render `report` to `config.output`.
pub fn render_report(report: &TimingReport, config: &FigureConfig) -> Result<()> {
    if report.columns.is_empty() {
        bail!("nothing to plot: report has no columns");
    }
    if !(config.width_in > 0.0 && config.height_in > 0.0) || config.dpi == 0 {
        bail!(
            "invalid figure size {}x{} in at {} dpi",
            config.width_in,
            config.height_in,
            config.dpi
        );
    }

    let range = value_range(report)?;

    let text = fonts::ensure_registered(config.font.as_deref());
    if !text {
        warn!(
            "no usable TrueType font found; {} is rendered without text (use --font)",
            config.output.display()
        );
    }

    let size = config.pixel_size();
    debug!(output = %config.output.display(), width = size.0, height = size.1, "rendering figure");

    if config.is_svg() {
        draw_figure(
            SVGBackend::new(&config.output, size).into_drawing_area(),
            report,
            config,
            range,
            text,
        )
    } else {
        draw_figure(
            BitMapBackend::new(&config.output, size).into_drawing_area(),
            report,
            config,
            range,
            text,
        )
    }
}

fn draw_figure<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    report: &TimingReport,
    config: &FigureConfig,
    range: (f64, f64),
    text: bool,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (_, height) = root.dim_in_pixel();
    let (upper, lower) = root.split_vertically(height / 2);
    draw_boxplot(&upper, report, config, range, text)?;
    draw_table(&lower, report, config, text)?;

    root.present()?;
    Ok(())
}

fn draw_boxplot<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    report: &TimingReport,
    config: &FigureConfig,
    (lo, hi): (f64, f64),
    text: bool,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let n = report.columns.len();
    let font_px = config.pt(10.0);
    let line = config.pt(1.0);

    let longest = report
        .columns
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0) as u32;
    let (x_label_area, y_label_area) = if text {
        (font_px * 2, font_px * (longest + 2) * 3 / 5)
    } else {
        (0, 0)
    };

    let mut chart = ChartBuilder::on(area)
        .margin(config.pt(6.0))
        .x_label_area_size(x_label_area)
        .y_label_area_size(y_label_area)
        .build_cartesian_2d(lo..hi, 0.5f64..(n as f64 + 0.5))?;

    if text {
        let names: Vec<&str> = report.columns.iter().map(|c| c.name.as_str()).collect();
        let font: TextStyle = FontDesc::new(
            FontFamily::Name(fonts::FAMILY),
            font_px as f64,
            FontStyle::Normal,
        )
        .color(&BLACK);
        chart
            .configure_mesh()
            .y_labels(2 * n + 1)
            .y_label_formatter(&|y| category_label(&names, *y))
            .x_label_style(font.clone())
            .y_label_style(font)
            .light_line_style(GRID.stroke_width(line))
            .bold_line_style(GRID.stroke_width(line))
            .axis_style(BLACK.stroke_width(line))
            .draw()?;
    } else {
        // The mesh measures its labels, so without a font the grid is drawn by hand.
        chart.draw_series(grid_lines((lo, hi), n, 10, GRID.stroke_width(line)))?;
    }

    for (i, col) in report.columns.iter().enumerate() {
        let y = (i + 1) as f64;
        let (top, bottom) = (y + BOX_HALF_HEIGHT, y - BOX_HALF_HEIGHT);
        let cap = BOX_HALF_HEIGHT / 2.0;
        let b = &col.boxplot;

        chart.draw_series(std::iter::once(Rectangle::new(
            [(b.q1, bottom), (b.q3, top)],
            BOX_FILL.filled(),
        )))?;
        chart.draw_series([
            Rectangle::new([(b.q1, bottom), (b.q3, top)], BLACK.stroke_width(line)),
        ])?;
        chart.draw_series([
            PathElement::new(vec![(b.whisker_lo, y), (b.q1, y)], BLACK.stroke_width(line)),
            PathElement::new(vec![(b.q3, y), (b.whisker_hi, y)], BLACK.stroke_width(line)),
            PathElement::new(
                vec![(b.whisker_lo, y - cap), (b.whisker_lo, y + cap)],
                BLACK.stroke_width(line),
            ),
            PathElement::new(
                vec![(b.whisker_hi, y - cap), (b.whisker_hi, y + cap)],
                BLACK.stroke_width(line),
            ),
            PathElement::new(vec![(b.median, bottom), (b.median, top)], RED.stroke_width(line)),
        ])?;
        chart.draw_series(dashed_vertical(b.mean, bottom, top, 7, BLUE.stroke_width(line)))?;
    }

    Ok(())
}

fn draw_table<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    report: &TimingReport,
    config: &FigureConfig,
    text: bool,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (width, height) = area.dim_in_pixel();
    let margin = config.pt(6.0) as i32;
    let line = config.pt(0.5);
    let rows = report.columns.len() as i32 + 1;
    let cols = TABLE_HEADERS.len() as i32 + 1;

    let usable_h = (height as i32 - 2 * margin).max(rows);
    let row_h = (usable_h / rows).min(config.pt(18.0) as i32).max(1);
    let cell_w = ((width as i32 - 2 * margin) / cols).max(1);
    let top = (height as i32 - row_h * rows) / 2;
    let left = (width as i32 - cell_w * cols) / 2;

    let style = FontDesc::new(
        FontFamily::Name(fonts::FAMILY),
        config.pt(10.0) as f64,
        FontStyle::Normal,
    )
    .color(&BLACK)
    .pos(Pos::new(HPos::Center, VPos::Center));

    for r in 0..rows {
        for c in 0..cols {
            // Top-left corner stays empty: row labels have no header.
            if r == 0 && c == 0 {
                continue;
            }
            let (x0, y0) = (left + c * cell_w, top + r * row_h);
            area.draw(&Rectangle::new(
                [(x0, y0), (x0 + cell_w, y0 + row_h)],
                BLACK.stroke_width(line),
            ))?;

            if text {
                let label = cell_text(report, r as usize, c as usize);
                area.draw(&Text::new(
                    label,
                    (x0 + cell_w / 2, y0 + row_h / 2),
                    style.clone(),
                ))?;
            }
        }
    }

    Ok(())
}

/// Text of table cell (`row`, `col`); row 0 holds the headers, column 0 the
/// row labels.
fn cell_text(report: &TimingReport, row: usize, col: usize) -> String {
    match (row, col) {
        (0, 0) => String::new(),
        (0, c) => TABLE_HEADERS[c - 1].to_string(),
        (r, 0) => report.columns[r - 1].name.clone(),
        // Only the rounded mean keeps a `.0` on whole values.
        (r, 1) => format_value(report.columns[r - 1].stats.mean, true),
        (r, c) => format_value(report.columns[r - 1].stats.as_row()[c - 1], false),
    }
}

/// Shortest round-trip representation; whole numbers get a `.0` only when
/// `keep_fraction` is set.
fn format_value(v: f64, keep_fraction: bool) -> String {
    if keep_fraction && v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Label for a y tick: the column name at integer positions, blank elsewhere.
fn category_label(names: &[&str], y: f64) -> String {
    let idx = y.round();
    if (y - idx).abs() > 1e-6 || idx < 1.0 {
        return String::new();
    }
    names
        .get(idx as usize - 1)
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// Padded x range covering every whisker. Fails when the range or its span
/// is not a finite number, which the plot cannot be scaled to.
fn value_range(report: &TimingReport) -> Result<(f64, f64)> {
    let lo = report
        .columns
        .iter()
        .map(|c| c.boxplot.whisker_lo.min(c.boxplot.mean))
        .fold(f64::INFINITY, f64::min);
    let hi = report
        .columns
        .iter()
        .map(|c| c.boxplot.whisker_hi.max(c.boxplot.mean))
        .fold(f64::NEG_INFINITY, f64::max);

    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        lo.abs().max(1.0) * 0.05
    };
    let (lo, hi) = (lo - pad, hi + pad);
    if !(lo.is_finite() && hi.is_finite() && (hi - lo).is_finite()) {
        bail!("cannot plot: value range [{}, {}] is not finite", lo, hi);
    }
    Ok((lo, hi))
}

/// Background grid for a chart drawn without a mesh: `ticks - 1` vertical
/// lines splitting `x` evenly, plus one horizontal line per category.
fn grid_lines(
    (lo, hi): (f64, f64),
    categories: usize,
    ticks: usize,
    style: ShapeStyle,
) -> Vec<PathElement<(f64, f64)>> {
    let (bottom, top) = (0.5, categories as f64 + 0.5);
    let step = (hi - lo) / ticks.max(1) as f64;
    let vertical = (1..ticks).map(|k| {
        let x = lo + step * k as f64;
        PathElement::new(vec![(x, bottom), (x, top)], style)
    });
    let horizontal = (1..=categories).map(|i| {
        let y = i as f64;
        PathElement::new(vec![(lo, y), (hi, y)], style)
    });
    vertical.chain(horizontal).collect()
}

/// A vertical line at `x` from `y0` to `y1`, drawn as `dashes` segments.
fn dashed_vertical(
    x: f64,
    y0: f64,
    y1: f64,
    dashes: usize,
    style: ShapeStyle,
) -> Vec<PathElement<(f64, f64)>> {
    // Each dash is followed by a gap of the same length, the last one is not.
    let dashes = dashes.max(1);
    let step = (y1 - y0) / (2 * dashes - 1) as f64;
    (0..dashes)
        .map(|i| {
            let start = y0 + step * (2 * i) as f64;
            PathElement::new(vec![(x, start), (x, start + step)], style)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::{TableOptions, TimingTable};
    use pretty_assertions::assert_eq;

    fn report(text: &str) -> TimingReport {
        let table = TimingTable::from_reader(text.as_bytes(), &TableOptions::default()).unwrap();
        TimingReport::from_table(&table).unwrap()
    }

    #[test]
    fn pixel_size_follows_dpi() {
        let config = FigureConfig::default();
        assert_eq!(config.pixel_size(), (6400, 4800));

        let config = FigureConfig {
            dpi: 50,
            ..FigureConfig::default()
        };
        assert_eq!(config.pixel_size(), (320, 240));
        assert_eq!(config.pt(0.1), 1);
    }

    #[test]
    fn table_cells() {
        let report = report("A,B,\n1,4,\n2,5.5,\n3,6,\n");

        assert_eq!(cell_text(&report, 0, 1), "Mean");
        assert_eq!(cell_text(&report, 0, 4), "Max");
        assert_eq!(cell_text(&report, 1, 0), "A");
        assert_eq!(cell_text(&report, 1, 1), "2.0");
        assert_eq!(cell_text(&report, 1, 2), "2");
        assert_eq!(cell_text(&report, 1, 3), "1");
        assert_eq!(cell_text(&report, 1, 4), "3");
        assert_eq!(cell_text(&report, 2, 1), "5.17");
        assert_eq!(cell_text(&report, 2, 2), "5.5");
        assert_eq!(cell_text(&report, 2, 4), "6");
    }

    #[test]
    fn y_labels_only_at_box_positions() {
        let names = ["A", "B"];
        assert_eq!(category_label(&names, 1.0), "A");
        assert_eq!(category_label(&names, 2.0), "B");
        assert_eq!(category_label(&names, 1.5), "");
        assert_eq!(category_label(&names, 0.0), "");
        assert_eq!(category_label(&names, 3.0), "");
    }

    #[test]
    fn range_is_padded_even_for_constant_data() {
        let (lo, hi) = value_range(&report("A,\n5,\n5,\n")).unwrap();
        assert!(lo < 5.0 && hi > 5.0);

        let (lo, hi) = value_range(&report("A,B,\n0,10,\n0,10,\n")).unwrap();
        assert!(lo < 0.0 && hi > 10.0);
    }

    #[test]
    fn overflowing_range_is_rejected_before_drawing() {
        let report = report("A,B,\n1e308,1,\n-1e308,2,\n");
        assert_eq!(report.columns[0].stats.median, 0.0);
        assert!(value_range(&report).is_err());

        let dir = tempfile::TempDir::new().unwrap();
        let config = FigureConfig {
            output: dir.path().join("time.png"),
            dpi: 10,
            ..FigureConfig::default()
        };
        let err = render_report(&report, &config).unwrap_err();
        assert!(err.to_string().contains("not finite"), "{err}");
        assert!(!config.output.exists());
    }

    #[test]
    fn grid_without_mesh_has_ticks_and_category_lines() {
        let lines = grid_lines((0.0, 10.0), 3, 10, GRID.stroke_width(1));
        assert_eq!(lines.len(), 9 + 3);
        assert_eq!(grid_lines((0.0, 10.0), 1, 1, GRID.stroke_width(1)).len(), 1);
    }

    #[test]
    fn dashes_span_the_box() {
        let dashes = dashed_vertical(1.0, 0.0, 1.3, 7, BLUE.stroke_width(1));
        assert_eq!(dashes.len(), 7);
    }

    #[test]
    fn svg_is_chosen_by_extension() {
        let svg = FigureConfig {
            output: PathBuf::from("out/report.SVG"),
            ..FigureConfig::default()
        };
        assert!(svg.is_svg());
        assert!(!FigureConfig::default().is_svg());
    }
}
