//! Freehand capture of a target molecular-weight distribution.
//!
//! [`FreehandCapture`] turns pointer events into an ordered point sequence
//! and paints onto any [`Surface`] as it goes, so a frame never has to replay
//! the whole stroke history. [`Raster`] is the in-memory surface the
//! terminal UI renders.

/// Stroke width of drawn segments, in pixels.
pub const STROKE_WIDTH: f64 = 3.0;
/// Radius of the eraser, in pixels.
pub const ERASE_RADIUS: f64 = 20.0;
/// Number of grid cells along each axis.
pub const GRID_DIVISIONS: u32 = 10;

/// Default raster size.
pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_HEIGHT: u32 = 200;

/// A canvas-local pixel coordinate. `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tool {
    #[default]
    Draw,
    Erase,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Idle,
    Drawing,
    Erasing,
}

// ── Surface ────────────────────────────────────────────────────────────────────

/// What a pixel holds. Colors are chosen at render time from the theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Paint {
    #[default]
    Background,
    Grid,
    Ink,
}

/// Axis reference label placed by [`Surface::draw_background`].
#[derive(Debug, Clone, PartialEq)]
pub struct AxisLabel {
    pub at: Point,
    pub text: String,
}

/// Drawing operations the capture needs from its target.
pub trait Surface {
    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Fill the whole surface with the background paint.
    fn fill_background(&mut self);

    /// Draw a segment with round caps.
    fn stroke_segment(&mut self, from: Point, to: Point, width: f64);

    /// Fill a circle with `paint`.
    fn fill_circle(&mut self, center: Point, radius: f64, paint: Paint);

    /// Paint the grid and axis labels over background pixels only.
    fn draw_background(&mut self);
}

/// Bitmap surface. Pixels are stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Paint>,
    labels: Vec<AxisLabel>,
}

impl Default for Raster {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Raster {
    /// Blank raster with the grid already drawn.
    pub fn new(width: u32, height: u32) -> Self {
        let mut raster = Self {
            width,
            height,
            pixels: vec![Paint::Background; (width as usize) * (height as usize)],
            labels: Vec::new(),
        };
        raster.draw_background();
        raster
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Paint> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    pub fn labels(&self) -> &[AxisLabel] {
        &self.labels
    }

    /// Coordinates of every pixel holding `paint`.
    pub fn pixels_with(&self, paint: Paint) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width.max(1);
        self.pixels
            .iter()
            .enumerate()
            .filter(move |(_, p)| **p == paint)
            .map(move |(i, _)| ((i as u32) % width, (i as u32) / width))
    }

    pub fn count(&self, paint: Paint) -> usize {
        self.pixels.iter().filter(|p| **p == paint).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    fn set(&mut self, x: u32, y: u32, paint: Paint) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.pixels[idx] = paint;
        }
    }

    /// Pixel range covering `[lo, hi]` clamped to `0..limit`.
    fn span(lo: f64, hi: f64, limit: u32) -> std::ops::Range<u32> {
        let start = lo.floor().max(0.0) as u32;
        let end = (hi.ceil().max(0.0) as u32).saturating_add(1).min(limit);
        start.min(end)..end
    }
}

impl Surface for Raster {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_background(&mut self) {
        self.pixels.fill(Paint::Background);
    }

    fn stroke_segment(&mut self, from: Point, to: Point, width: f64) {
        let r = width / 2.0;
        let xs = Self::span(from.x.min(to.x) - r, from.x.max(to.x) + r, self.width);
        let ys = Self::span(from.y.min(to.y) - r, from.y.max(to.y) + r, self.height);
        for y in ys {
            for x in xs.clone() {
                let p = Point::new(x as f64, y as f64);
                if distance_to_segment(p, from, to) <= r {
                    self.set(x, y, Paint::Ink);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, paint: Paint) {
        let xs = Self::span(center.x - radius, center.x + radius, self.width);
        let ys = Self::span(center.y - radius, center.y + radius, self.height);
        for y in ys {
            for x in xs.clone() {
                if Point::new(x as f64, y as f64).distance(center) <= radius {
                    self.set(x, y, paint);
                }
            }
        }
    }

    fn draw_background(&mut self) {
        let (w, h) = (self.width, self.height);
        if w == 0 || h == 0 {
            return;
        }
        for i in 0..=GRID_DIVISIONS {
            let gx = ((w - 1) * i / GRID_DIVISIONS).min(w - 1);
            for y in 0..h {
                if self.get(gx, y) == Some(Paint::Background) {
                    self.set(gx, y, Paint::Grid);
                }
            }
            let gy = ((h - 1) * i / GRID_DIVISIONS).min(h - 1);
            for x in 0..w {
                if self.get(x, gy) == Some(Paint::Background) {
                    self.set(x, gy, Paint::Grid);
                }
            }
        }

        let (wf, hf) = (w as f64, h as f64);
        self.labels = vec![
            AxisLabel {
                at: Point::new(4.0, hf - 4.0),
                text: crate::formatting::decade_label(2),
            },
            AxisLabel {
                at: Point::new(wf - 24.0, hf - 4.0),
                text: crate::formatting::decade_label(6),
            },
            AxisLabel {
                at: Point::new(4.0, hf - 16.0),
                text: "0".to_string(),
            },
            AxisLabel {
                at: Point::new(4.0, 12.0),
                text: "1.0".to_string(),
            },
        ];
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

// ── Capture ────────────────────────────────────────────────────────────────────

/// Pointer-driven state machine recording a freehand curve.
#[derive(Debug, Clone, Default)]
pub struct FreehandCapture {
    tool: Tool,
    state: CaptureState,
    points: Vec<Point>,
}

impl FreehandCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Select the tool for the next pointer-down. An active gesture keeps
    /// the tool it started with.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn pointer_down(&mut self, at: Point, surface: &mut dyn Surface) {
        match self.tool {
            Tool::Draw => {
                self.points.clear();
                self.points.push(at);
                // A single click still leaves a visible dot.
                surface.stroke_segment(at, at, STROKE_WIDTH);
                self.state = CaptureState::Drawing;
            }
            Tool::Erase => self.state = CaptureState::Erasing,
        }
    }

    pub fn pointer_move(&mut self, at: Point, surface: &mut dyn Surface) {
        match self.state {
            CaptureState::Idle => {}
            CaptureState::Drawing => {
                if let Some(&last) = self.points.last() {
                    surface.stroke_segment(last, at, STROKE_WIDTH);
                }
                self.points.push(at);
            }
            CaptureState::Erasing => {
                surface.fill_circle(at, ERASE_RADIUS, Paint::Background);
                surface.draw_background();
                self.points.retain(|p| p.distance(at) > ERASE_RADIUS);
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.state = CaptureState::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.state = CaptureState::Idle;
    }

    /// Drop every point and repaint a blank grid.
    pub fn clear(&mut self, surface: &mut dyn Surface) {
        self.points.clear();
        self.state = CaptureState::Idle;
        surface.fill_background();
        surface.draw_background();
    }
}
