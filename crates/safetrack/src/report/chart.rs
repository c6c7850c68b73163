//! Raster line charts for the trend workbook.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use image::{imageops, DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut, text_size,
};

use crate::error::ReportError;

/// Largest accepted side of a chart image, in pixels.
pub const MAX_CHART_SIDE: u32 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    /// Tick label under the point.
    pub label: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Captions drawn around the plot.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartTitles<'a> {
    pub title: &'a str,
    pub x_axis: &'a str,
    pub y_axis: &'a str,
}

/// Turns a series into PNG bytes. Implementations must accept an empty
/// series.
pub trait ChartRenderer: Send + Sync {
    fn render_png(
        &self,
        titles: &ChartTitles<'_>,
        points: &[ChartPoint],
    ) -> Result<Vec<u8>, ReportError>;

    /// Pixel size of the images this renderer produces.
    fn dimensions(&self) -> (u32, u32);
}

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const SERIES: Rgb<u8> = Rgb([31, 119, 180]);
const TEXT: Rgb<u8> = Rgb([20, 20, 20]);

const PAD: i32 = 8;
const PLAIN_MARGIN: i32 = 40;
const GRID_LINES: u32 = 5;
const MARKER_RADIUS: i32 = 4;
const TITLE_SCALE: f32 = 18.0;
const LABEL_SCALE: f32 = 13.0;

/// Fonts with Cyrillic coverage that are commonly installed.
const FONT_CANDIDATES: [&str; 8] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// First installed font from a list of common sans-serif faces.
pub fn find_system_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

pub fn load_font(path: &Path) -> Result<FontArc, ReportError> {
    let font_error = |reason: String| ReportError::Font {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = std::fs::read(path).map_err(|e| font_error(e.to_string()))?;
    FontArc::try_from_vec(bytes).map_err(|e| font_error(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlotArea {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl PlotArea {
    fn y_for(&self, value: f64, y_max: f64) -> i32 {
        let ratio = (value.max(0.0) / y_max).min(1.0);
        self.bottom - (f64::from(self.bottom - self.top) * ratio).round() as i32
    }
}

/// Markers joined by a line over a grid. Points are spaced evenly along the
/// x axis in the order given and labelled with [`ChartPoint::label`]; the y
/// axis starts at zero.
///
/// Without a font the plot is drawn with no captions or tick labels.
#[derive(Clone)]
pub struct LineChart {
    width: u32,
    height: u32,
    font: Option<FontArc>,
}

impl LineChart {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            font: None,
        }
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn check_size(&self) -> Result<(), ReportError> {
        let side_ok = |side: u32| (1..=MAX_CHART_SIDE).contains(&side);
        let buffer = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(3));
        if side_ok(self.width) && side_ok(self.height) && buffer.is_some() {
            Ok(())
        } else {
            Err(ReportError::ChartSize {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Only valid after `check_size`.
    fn plot_area(&self, y_max: f64) -> PlotArea {
        let (w, h) = (self.width as i32, self.height as i32);
        let (left, top, below) = match &self.font {
            None => (PLAIN_MARGIN, PLAIN_MARGIN / 2, PLAIN_MARGIN),
            Some(font) => {
                let tick_width = text_width(font, LABEL_SCALE, &format_tick(y_max));
                (
                    PAD * 3 + line_height(LABEL_SCALE) + tick_width,
                    PAD * 2 + line_height(TITLE_SCALE),
                    PAD * 3 + line_height(LABEL_SCALE) * 2,
                )
            }
        };
        let left = left.min(w / 3);
        let top = top.min(h / 4);
        let right = w - 1 - (PLAIN_MARGIN / 2).min(w / 8);
        let bottom = h - 1 - below.min(h / 3);
        PlotArea {
            left,
            top,
            right: right.max(left + 1),
            bottom: bottom.max(top + 1),
        }
    }
}

impl Default for LineChart {
    fn default() -> Self {
        Self::new(800, 400)
    }
}

impl ChartRenderer for LineChart {
    fn render_png(
        &self,
        titles: &ChartTitles<'_>,
        points: &[ChartPoint],
    ) -> Result<Vec<u8>, ReportError> {
        self.check_size()?;
        let mut img = RgbImage::from_pixel(self.width, self.height, BACKGROUND);
        let y_max = axis_max(points);
        let area = self.plot_area(y_max);
        let font = self.font.as_ref();

        for i in 0..=GRID_LINES {
            let value = y_max * f64::from(i) / f64::from(GRID_LINES);
            let y = area.y_for(value, y_max);
            if i > 0 {
                draw_line(&mut img, (area.left, y), (area.right, y), GRID);
            }
            if let Some(font) = font {
                let tick = format_tick(value);
                let (width, height) = text_size(LABEL_SCALE, font, &tick);
                let x = area.left - PAD - width as i32;
                draw_text_mut(&mut img, TEXT, x, y - height as i32 / 2, LABEL_SCALE, font, &tick);
            }
        }

        let xs: Vec<i32> = (0..points.len())
            .map(|i| x_position(i, points.len(), area.left, area.right))
            .collect();
        let widest = font
            .map(|font| {
                points
                    .iter()
                    .map(|p| text_width(font, LABEL_SCALE, &p.label))
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        let stride = label_stride(points.len(), area.right - area.left, widest + PAD);

        for (point, &x) in points.iter().zip(&xs).step_by(stride) {
            draw_line(&mut img, (x, area.top), (x, area.bottom), GRID);
            if let Some(font) = font {
                let width = text_width(font, LABEL_SCALE, &point.label);
                let y = area.bottom + PAD;
                draw_text_mut(&mut img, TEXT, x - width / 2, y, LABEL_SCALE, font, &point.label);
            }
        }

        draw_line(&mut img, (area.left, area.bottom), (area.right, area.bottom), AXIS);
        draw_line(&mut img, (area.left, area.top), (area.left, area.bottom), AXIS);

        let positions: Vec<(i32, i32)> = points
            .iter()
            .zip(&xs)
            .map(|(p, &x)| (x, area.y_for(p.value, y_max)))
            .collect();
        for pair in positions.windows(2) {
            for offset in -1..=1 {
                let (from, to) = (pair[0], pair[1]);
                draw_line(&mut img, (from.0, from.1 + offset), (to.0, to.1 + offset), SERIES);
            }
        }
        for &center in &positions {
            draw_filled_circle_mut(&mut img, center, MARKER_RADIUS, SERIES);
        }

        if let Some(font) = font {
            let center_x = (area.left + area.right) / 2;
            let width = text_width(font, TITLE_SCALE, titles.title);
            draw_text_mut(&mut img, TEXT, center_x - width / 2, PAD, TITLE_SCALE, font, titles.title);

            let width = text_width(font, LABEL_SCALE, titles.x_axis);
            let y = area.bottom + PAD * 2 + line_height(LABEL_SCALE);
            draw_text_mut(&mut img, TEXT, center_x - width / 2, y, LABEL_SCALE, font, titles.x_axis);

            draw_vertical_text(&mut img, font, titles.y_axis, PAD, (area.top + area.bottom) / 2);
        }

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Top of the y axis: the largest value rounded up to a multiple of the
/// grid step, at least one grid step.
fn axis_max(points: &[ChartPoint]) -> f64 {
    let max = points
        .iter()
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let step = (max / f64::from(GRID_LINES)).ceil().max(1.0);
    step * f64::from(GRID_LINES)
}

fn x_position(index: usize, count: usize, left: i32, right: i32) -> i32 {
    let pad = (right - left) / 20;
    if count <= 1 {
        return (left + right) / 2;
    }
    let span = f64::from(right - left - 2 * pad);
    left + pad + (span * index as f64 / (count - 1) as f64).round() as i32
}

/// Every how many points an x tick is labelled so labels of `label_width`
/// pixels do not overlap over `span` pixels.
fn label_stride(count: usize, span: i32, label_width: i32) -> usize {
    if count == 0 || span <= 0 {
        return 1;
    }
    let fits = (span / label_width.max(1)).max(1) as usize;
    count.div_ceil(fits).max(1)
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn line_height(scale: f32) -> i32 {
    scale.ceil() as i32 + 2
}

fn text_width(font: &FontArc, scale: f32, text: &str) -> i32 {
    text_size(scale, font, text).0 as i32
}

fn draw_line(img: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    draw_line_segment_mut(
        img,
        (from.0 as f32, from.1 as f32),
        (to.0 as f32, to.1 as f32),
        color,
    );
}

/// Text turned a quarter counter-clockwise, its left edge at `x` and
/// centred on `center_y`.
fn draw_vertical_text(img: &mut RgbImage, font: &FontArc, text: &str, x: i32, center_y: i32) {
    let (width, height) = text_size(LABEL_SCALE, font, text);
    if width == 0 || height == 0 {
        return;
    }
    let mut label = RgbImage::from_pixel(width, height + 2, BACKGROUND);
    draw_text_mut(&mut label, TEXT, 0, 0, LABEL_SCALE, font, text);
    let rotated = imageops::rotate270(&label);
    imageops::overlay(
        img,
        &rotated,
        i64::from(x),
        i64::from(center_y) - i64::from(width) / 2,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn decode(bytes: &[u8]) -> RgbImage {
        image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .unwrap()
            .to_rgb8()
    }

    fn titles() -> ChartTitles<'static> {
        ChartTitles {
            title: "Динамика нарушений для ООО Монтаж",
            x_axis: "Дата",
            y_axis: "Количество нарушений",
        }
    }

    fn installed_font() -> Option<FontArc> {
        find_system_font().and_then(|path| load_font(&path).ok())
    }

    fn has_dark_pixel(img: &RgbImage, rows: std::ops::Range<u32>) -> bool {
        rows.flat_map(|y| (0..img.width()).map(move |x| (x, y)))
            .any(|(x, y)| img.get_pixel(x, y).0.iter().all(|&c| c < 128))
    }

    #[test]
    fn test_empty_series_renders() {
        let chart = LineChart::new(320, 200);
        let img = decode(&chart.render_png(&titles(), &[]).unwrap());
        assert_eq!(img.dimensions(), (320, 200));
        assert!(img.pixels().all(|p| *p != SERIES));
    }

    #[test]
    fn test_markers_are_drawn() {
        let chart = LineChart::new(400, 300);
        let points = vec![
            ChartPoint::new("01.03.2024", 2.0),
            ChartPoint::new("02.03.2024", 5.0),
        ];
        let img = decode(&chart.render_png(&titles(), &points).unwrap());

        let max = axis_max(&points);
        let area = chart.plot_area(max);
        let x = x_position(1, 2, area.left, area.right);
        let y = area.y_for(5.0, max);
        assert_eq!(*img.get_pixel(x as u32, y as u32), SERIES);
    }

    #[test]
    fn test_oversized_chart_is_rejected() {
        let points = [ChartPoint::new("01.03.2024", 1.0)];
        for (width, height) in [(u32::MAX, u32::MAX), (MAX_CHART_SIDE + 1, 10), (0, 10)] {
            let result = LineChart::new(width, height).render_png(&titles(), &points);
            assert!(
                matches!(result, Err(ReportError::ChartSize { .. })),
                "{}x{} accepted",
                width,
                height
            );
        }
        assert!(LineChart::new(MAX_CHART_SIDE, 1)
            .render_png(&titles(), &[])
            .is_ok());
    }

    #[test]
    fn test_captions_and_ticks_are_drawn_with_font() {
        let Some(font) = installed_font() else {
            return;
        };
        let chart = LineChart::new(640, 360).with_font(font);
        let points = vec![
            ChartPoint::new("01.03.2024", 2.0),
            ChartPoint::new("05.03.2024", 4.0),
        ];
        let img = decode(&chart.render_png(&titles(), &points).unwrap());
        let area = chart.plot_area(axis_max(&points));

        assert!(has_dark_pixel(&img, 0..area.top as u32), "no title");
        assert!(
            has_dark_pixel(&img, (area.bottom as u32 + 2)..img.height()),
            "no date labels"
        );
    }

    #[test]
    fn test_without_font_nothing_outside_plot() {
        let chart = LineChart::new(320, 200);
        let img = decode(&chart.render_png(&titles(), &[]).unwrap());
        let area = chart.plot_area(axis_max(&[]));
        assert!(!has_dark_pixel(&img, 0..area.top as u32));
    }

    #[test]
    fn test_load_font_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();

        assert!(matches!(load_font(&path), Err(ReportError::Font { .. })));
        assert!(matches!(
            load_font(&dir.path().join("missing.ttf")),
            Err(ReportError::Font { .. })
        ));
    }

    #[test]
    fn test_axis_max() {
        assert_eq!(axis_max(&[]), 5.0);
        assert_eq!(axis_max(&[ChartPoint::new("a", 12.0)]), 15.0);
        assert_eq!(axis_max(&[ChartPoint::new("a", 10.0)]), 10.0);
    }

    #[test]
    fn test_single_point_is_centered() {
        assert_eq!(x_position(0, 1, 0, 100), 50);
        assert_eq!(x_position(0, 3, 0, 100), 5);
        assert_eq!(x_position(2, 3, 0, 100), 95);
    }

    #[test]
    fn test_label_stride() {
        assert_eq!(label_stride(0, 500, 80), 1);
        assert_eq!(label_stride(5, 500, 80), 1);
        assert_eq!(label_stride(12, 500, 80), 2);
        assert_eq!(label_stride(30, 500, 80), 5);
        assert_eq!(label_stride(3, 0, 80), 1);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(15.0), "15");
        assert_eq!(format_tick(2.5), "2.5");
    }
}
