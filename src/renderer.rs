//! # Beach Profile Rendering
//!
//! This module turns a [`ProfilePlot`] into pixels. Drawing goes through
//! `embedded-graphics`, so the same chart code can target the in-memory
//! [`Canvas`] used for PNG output or any other [`DrawTarget`]. A plain-text
//! preview ([`draw_ascii`]) is provided for terminals.
//!
//! ## Chart Layout
//! - depth axis inverted: the water surface (depth 0) is at the top and
//!   deeper water lower down
//! - sea (light blue) filled between the surface and the seabed profile
//! - land (brown) filled from the profile down to `max depth + 2 m`
//! - black profile line, red marker and label at the predicted break point
//! - title, legend line and axis labels in a 6x10 monospace font

use crate::{config::RenderConfig, planner::format_wave_height, Coordinate, ProfilePlot};
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::{Alignment, Text},
};
use std::{
    convert::Infallible,
    fmt::Write as _,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};
use thiserror::Error;

/// Sea fill colour (#a1cfff)
const SEA: Rgb888 = Rgb888::new(0xa1, 0xcf, 0xff);
/// Land fill colour (#a0522d)
const LAND: Rgb888 = Rgb888::new(0xa0, 0x52, 0x2d);
/// Axis and tick colour
const AXIS: Rgb888 = Rgb888::new(0x40, 0x40, 0x40);

/// Extra depth below the deepest sample that the land fill extends to.
const LAND_MARGIN_M: f64 = 2.0;

// Plot area margins in pixels
const MARGIN_LEFT: i32 = 60;
const MARGIN_RIGHT: i32 = 20;
const MARGIN_TOP: i32 = 44;
const MARGIN_BOTTOM: i32 = 40;

const TICKS: i32 = 5;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// RGB framebuffer that embedded-graphics can draw on.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Canvas {
    /// White canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::WHITE; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Number of pixels with exactly this colour.
    pub fn count(&self, color: Rgb888) -> usize {
        self.pixels.iter().filter(|&&p| p == color).count()
    }

    /// Encode as an 8-bit RGB PNG.
    pub fn encode_png<W: Write>(&self, writer: W) -> Result<(), RenderError> {
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let data: Vec<u8> = self
            .pixels
            .iter()
            .flat_map(|p| [p.r(), p.g(), p.b()])
            .collect();

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&data)?;
        writer.finish()?;
        Ok(())
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0
                && point.y >= 0
                && (point.x as u32) < self.width
                && (point.y as u32) < self.height
            {
                let idx = point.y as usize * self.width as usize + point.x as usize;
                self.pixels[idx] = color;
            }
        }
        Ok(())
    }
}

/// Render `plot` to a PNG file at `path`.
pub fn render_png(plot: &ProfilePlot, config: &RenderConfig, path: &Path) -> Result<(), RenderError> {
    let mut canvas = Canvas::new(config.width, config.height);
    if let Err(never) = draw_profile(plot, &mut canvas) {
        match never {}
    }

    let io_error = |source: io::Error| RenderError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io_error)?);
    canvas.encode_png(&mut out)?;
    out.flush().map_err(io_error)
}

/// Data → pixel mapping for the plot area.
struct Frame {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    x_min: f64,
    x_max: f64,
    /// Depth drawn at the top edge
    depth_top: f64,
    /// Depth drawn at the bottom edge
    depth_bottom: f64,
}

impl Frame {
    fn new(area: Rectangle, coordinates: &[Coordinate]) -> Self {
        let (x_min, x_max) = span(coordinates.iter().map(|c| c.x));
        let (d_min, d_max) = span(coordinates.iter().map(|c| c.depth));

        Self {
            left: area.top_left.x + MARGIN_LEFT,
            top: area.top_left.y + MARGIN_TOP,
            width: (area.size.width as i32 - MARGIN_LEFT - MARGIN_RIGHT).max(1),
            height: (area.size.height as i32 - MARGIN_TOP - MARGIN_BOTTOM).max(1),
            x_min,
            x_max,
            depth_top: d_min.min(0.0),
            depth_bottom: d_max + LAND_MARGIN_M,
        }
    }

    fn px(&self, x: f64) -> i32 {
        let t = (x - self.x_min) / (self.x_max - self.x_min);
        self.left + (t * (self.width - 1) as f64).round() as i32
    }

    fn py(&self, depth: f64) -> i32 {
        let t = (depth - self.depth_top) / (self.depth_bottom - self.depth_top);
        self.top + (t * (self.height - 1) as f64).round() as i32
    }

    /// Data x at the centre of a pixel column.
    fn x_at(&self, px: i32) -> f64 {
        let t = (px - self.left) as f64 / (self.width - 1).max(1) as f64;
        self.x_min + t * (self.x_max - self.x_min)
    }

    fn point(&self, c: &Coordinate) -> Point {
        Point::new(self.px(c.x), self.py(c.depth))
    }
}

/// Draw the annotated profile chart onto any RGB draw target.
///
/// Plots with no coordinates only get the title.
pub fn draw_profile<D>(plot: &ProfilePlot, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let area = target.bounding_box();
    let text = MonoTextStyle::new(&FONT_6X10, Rgb888::BLACK);
    let centre_x = area.top_left.x + area.size.width as i32 / 2;

    Text::with_alignment(
        "2D Beach Profile",
        Point::new(centre_x, area.top_left.y + 14),
        text,
        Alignment::Center,
    )
    .draw(target)?;

    let coordinates = &plot.transect.coordinates;
    if coordinates.is_empty() {
        return Ok(());
    }
    let frame = Frame::new(area, coordinates);

    let surface = frame.py(0.0);
    let bottom = frame.py(frame.depth_bottom);
    for px in frame.left..frame.left + frame.width {
        let Some(depth) = depth_at(coordinates, frame.x_at(px)) else {
            continue;
        };
        let seabed = frame.py(depth);

        vertical(target, px, seabed, bottom, LAND)?;
        // Dry sections above the surface get no sea
        if seabed > surface {
            vertical(target, px, surface, seabed - 1, SEA)?;
        }
    }

    draw_axes(&frame, target, text)?;

    let line = PrimitiveStyle::with_stroke(Rgb888::BLACK, 2);
    for pair in coordinates.windows(2) {
        Line::new(frame.point(&pair[0]), frame.point(&pair[1]))
            .into_styled(line)
            .draw(target)?;
    }

    let legend = format!(
        "Beach profile ({:.1} m) | Wave height: {} m",
        plot.transect.alongshore_distance,
        format_wave_height(plot.wave_height)
    );
    Text::new(&legend, Point::new(frame.left + 6, area.top_left.y + 30), text).draw(target)?;

    if let Some(point) = plot.break_point {
        draw_break_point(&frame, &point, target)?;
    }

    Ok(())
}

fn draw_axes<D>(frame: &Frame, target: &mut D, text: MonoTextStyle<'_, Rgb888>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let axis = PrimitiveStyle::with_stroke(AXIS, 1);
    let bottom = frame.top + frame.height - 1;
    let right = frame.left + frame.width - 1;

    Line::new(Point::new(frame.left, frame.top), Point::new(frame.left, bottom))
        .into_styled(axis)
        .draw(target)?;
    Line::new(Point::new(frame.left, bottom), Point::new(right, bottom))
        .into_styled(axis)
        .draw(target)?;

    for i in 0..=TICKS {
        let t = i as f64 / TICKS as f64;

        let x = frame.x_min + t * (frame.x_max - frame.x_min);
        let px = frame.px(x);
        Line::new(Point::new(px, bottom), Point::new(px, bottom + 4))
            .into_styled(axis)
            .draw(target)?;
        Text::with_alignment(
            &format!("{x:.0}"),
            Point::new(px, bottom + 14),
            text,
            Alignment::Center,
        )
        .draw(target)?;

        let depth = frame.depth_top + t * (frame.depth_bottom - frame.depth_top);
        let py = frame.py(depth);
        Line::new(Point::new(frame.left - 4, py), Point::new(frame.left, py))
            .into_styled(axis)
            .draw(target)?;
        Text::with_alignment(
            &format!("{depth:.1}"),
            Point::new(frame.left - 6, py + 3),
            text,
            Alignment::Right,
        )
        .draw(target)?;
    }

    Text::with_alignment(
        "Distance (m)",
        Point::new(frame.left + frame.width / 2, bottom + 30),
        text,
        Alignment::Center,
    )
    .draw(target)?;
    Text::new("Depth (m)", Point::new(2, frame.top - 6), text).draw(target)?;

    Ok(())
}

fn draw_break_point<D>(frame: &Frame, point: &Coordinate, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let red = MonoTextStyle::new(&FONT_6X10, Rgb888::RED);
    let marker = frame.point(point);

    Circle::with_center(marker, 9)
        .into_styled(PrimitiveStyle::with_fill(Rgb888::RED))
        .draw(target)?;

    // Label below and to the right, with a leader line back to the marker
    let label_at = marker + Point::new(18, 18);
    Line::new(label_at - Point::new(3, 8), marker + Point::new(4, 4))
        .into_styled(PrimitiveStyle::with_stroke(Rgb888::RED, 1))
        .draw(target)?;
    Text::new(
        &format!("Wave break (x={:.2}, y={:.2})", point.x, point.depth),
        label_at,
        red,
    )
    .draw(target)?;

    Ok(())
}

fn vertical<D>(target: &mut D, x: i32, from: i32, to: i32, color: Rgb888) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    if from > to {
        return Ok(());
    }
    Line::new(Point::new(x, from), Point::new(x, to))
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(target)
}

/// Linearly interpolated profile depth at `x`, `None` outside the survey.
fn depth_at(coordinates: &[Coordinate], x: f64) -> Option<f64> {
    if let [only] = coordinates {
        return Some(only.depth);
    }
    coordinates.windows(2).find_map(|pair| {
        let (a, b) = (pair[0], pair[1]);
        let (lo, hi) = if a.x <= b.x { (a.x, b.x) } else { (b.x, a.x) };
        if x < lo || x > hi {
            return None;
        }
        if hi == lo {
            return Some(a.depth);
        }
        let alpha = (x - a.x) / (b.x - a.x);
        Some(a.depth + alpha * (b.depth - a.depth))
    })
}

/// (min, max) of the values, widened by 1 on each side when they coincide.
fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    });
    if min < max {
        (min, max)
    } else {
        (min - 1.0, max + 1.0)
    }
}

/// Render a plot as ASCII text for terminal preview.
///
/// One column per sample, deeper samples lower down. The break point is
/// marked with `X`, other samples with `•`.
pub fn draw_ascii(plot: &ProfilePlot) -> String {
    const ROWS: usize = 16;
    const Y_AXIS_WIDTH: usize = 8; // Space for depth labels
    let coordinates = &plot.transect.coordinates;
    let mut out = String::new();

    let _ = writeln!(out, "{}", plot.label);
    let _ = writeln!(
        out,
        "Beach profile ({:.1} m) | Wave height: {} m | Breaking depth: {:.2} m",
        plot.transect.alongshore_distance,
        format_wave_height(plot.wave_height),
        plot.breaking_depth
    );
    if coordinates.is_empty() {
        let _ = writeln!(out, "(no samples)");
        return out;
    }

    let (min_depth, max_depth) = span(coordinates.iter().map(|c| c.depth));
    let depth_to_row = |depth: f64| {
        let normalized = (depth - min_depth) / (max_depth - min_depth);
        (normalized * (ROWS as f64 - 1.0)).round() as usize
    };

    let mut grid = vec![vec![' '; coordinates.len() + Y_AXIS_WIDTH]; ROWS];

    for depth in [min_depth, (min_depth + max_depth) / 2.0, max_depth] {
        let row = depth_to_row(depth).min(ROWS - 1);
        let label = format!("{:>width$.1}", depth, width = Y_AXIS_WIDTH - 2);
        for (i, ch) in label.chars().take(Y_AXIS_WIDTH - 1).enumerate() {
            grid[row][i] = ch;
        }
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }

    let break_index = plot
        .break_point
        .and_then(|bp| coordinates.iter().rposition(|c| *c == bp));

    for (column, sample) in coordinates.iter().enumerate() {
        let row = depth_to_row(sample.depth).min(ROWS - 1);
        grid[row][column + Y_AXIS_WIDTH] = if Some(column) == break_index {
            'X'
        } else {
            '•'
        };
    }

    for row in grid {
        let _ = writeln!(out, "{}", row.into_iter().collect::<String>().trim_end());
    }

    // Distance labels below the chart
    let padding = " ".repeat(Y_AXIS_WIDTH);
    let first = format!("{:.0}", coordinates[0].x);
    let last = format!("{:.0}", coordinates[coordinates.len() - 1].x);
    let gap = coordinates.len().saturating_sub(first.len() + last.len()).max(1);
    let _ = writeln!(out, "{}{}{}{}  (m)", padding, first, " ".repeat(gap), last);

    match plot.break_point {
        Some(bp) => {
            let _ = writeln!(out, "Wave break at x={:.2}, y={:.2}", bp.x, bp.depth);
        }
        None => {
            let _ = writeln!(out, "No wave break within the surveyed profile");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transect;
    use tempfile::TempDir;

    fn test_plot() -> ProfilePlot {
        let depths = [12.0, 9.0, 6.0, 4.0, 1.0];
        ProfilePlot {
            label: "profile_beach.csv_1_3.9.png".to_string(),
            transect_index: 1,
            wave_height: 3.9,
            breaking_depth: 5.0,
            transect: Transect {
                coordinates: depths
                    .iter()
                    .enumerate()
                    .map(|(i, &depth)| Coordinate {
                        x: i as f64 * 5.0,
                        depth,
                    })
                    .collect(),
                alongshore_distance: 100.0,
            },
            break_point: Some(Coordinate {
                x: 20.0,
                depth: 1.0,
            }),
        }
    }

    #[test]
    fn test_depth_interpolation() {
        let plot = test_plot();
        let coords = &plot.transect.coordinates;
        assert_eq!(depth_at(coords, 0.0), Some(12.0));
        assert_eq!(depth_at(coords, 2.5), Some(10.5));
        assert_eq!(depth_at(coords, 20.0), Some(1.0));
        assert_eq!(depth_at(coords, 21.0), None);
    }

    #[test]
    fn test_span_widens_degenerate_range() {
        assert_eq!(span([3.0, 3.0].into_iter()), (2.0, 4.0));
        assert_eq!(span([1.0, 4.0, -2.0].into_iter()), (-2.0, 4.0));
    }

    #[test]
    fn test_profile_draws_sea_land_and_break_point() {
        let plot = test_plot();
        let mut canvas = Canvas::new(1000, 500);
        draw_profile(&plot, &mut canvas).unwrap();

        assert!(canvas.count(SEA) > 1000, "sea fill missing");
        assert!(canvas.count(LAND) > 1000, "land fill missing");
        assert!(canvas.count(Rgb888::RED) > 20, "break point marker missing");
        assert!(canvas.count(Rgb888::BLACK) > 100, "profile line missing");

        let frame = Frame::new(canvas.bounding_box(), &plot.transect.coordinates);
        let marker = frame.point(&Coordinate {
            x: 20.0,
            depth: 1.0,
        });
        assert_eq!(
            canvas.pixel(marker.x as u32, marker.y as u32),
            Some(Rgb888::RED)
        );
        assert_eq!(canvas.pixel(1000, 0), None);
    }

    #[test]
    fn test_profile_without_break_point_has_no_red() {
        let mut plot = test_plot();
        plot.break_point = None;
        let mut canvas = Canvas::new(800, 400);
        draw_profile(&plot, &mut canvas).unwrap();
        assert_eq!(canvas.count(Rgb888::RED), 0);
    }

    #[test]
    fn test_dry_profile_has_no_sea() {
        let mut plot = test_plot();
        for c in &mut plot.transect.coordinates {
            c.depth = -c.depth;
        }
        plot.break_point = None;
        let mut canvas = Canvas::new(600, 300);
        draw_profile(&plot, &mut canvas).unwrap();
        assert_eq!(canvas.count(SEA), 0);
        assert!(canvas.count(LAND) > 1000);
    }

    #[test]
    fn test_deeper_water_is_drawn_lower() {
        let plot = test_plot();
        let frame = Frame::new(
            Rectangle::new(Point::zero(), Size::new(1000, 500)),
            &plot.transect.coordinates,
        );
        assert!(frame.py(12.0) > frame.py(1.0));
        assert_eq!(frame.py(0.0), frame.top);
        assert!(frame.px(20.0) > frame.px(0.0));
    }

    #[test]
    fn test_empty_plot_draws_title_only() {
        let mut plot = test_plot();
        plot.transect.coordinates.clear();
        plot.break_point = None;
        let mut canvas = Canvas::new(400, 200);
        draw_profile(&plot, &mut canvas).unwrap();
        assert_eq!(canvas.count(SEA), 0);
        assert!(canvas.count(Rgb888::BLACK) > 0);
    }

    #[test]
    fn test_render_png_writes_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.png");
        render_png(&test_plot(), &RenderConfig::default(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    /// Accepts `limit` bytes, then fails every write.
    struct ShortWriter {
        written: usize,
        limit: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_encode_png_reports_failed_trailer_write() {
        let mut canvas = Canvas::new(120, 80);
        draw_profile(&test_plot(), &mut canvas).unwrap();

        let mut full = Vec::new();
        canvas.encode_png(&mut full).unwrap();
        assert_eq!(&full[full.len() - 8..full.len() - 4], b"IEND");

        // Room for everything except the 12-byte IEND chunk
        let short = ShortWriter {
            written: 0,
            limit: full.len() - 12,
        };
        assert!(canvas.encode_png(short).is_err());
    }

    #[test]
    fn test_render_png_into_missing_directory_fails() {
        let err = render_png(
            &test_plot(),
            &RenderConfig::default(),
            Path::new("/nonexistent/dir/profile.png"),
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }

    #[test]
    fn test_ascii_marks_break_point() {
        let text = draw_ascii(&test_plot());
        assert!(text.starts_with("profile_beach.csv_1_3.9.png\n"));
        assert!(text.contains("Wave height: 3.9 m"));
        assert!(text.contains("Breaking depth: 5.00 m"));
        assert_eq!(text.matches('X').count(), 1);
        assert_eq!(text.matches('•').count(), 4);
        assert!(text.contains("Wave break at x=20.00, y=1.00"));
    }

    #[test]
    fn test_ascii_without_break_point() {
        let mut plot = test_plot();
        plot.break_point = None;
        let text = draw_ascii(&plot);
        assert!(!text.contains('X'));
        assert!(text.contains("No wave break"));
    }
}
