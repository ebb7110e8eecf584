//! 8-bit coverage canvas for vector masks.
//!
//! Coordinates are continuous pixel units with pixel `(x, y)` covering
//! `[x, x + 1) x [y, y + 1)`. A pixel is painted when its center falls
//! inside the shape, so there is no antialiasing. Everything outside the
//! canvas is silently clipped.

/// Single-channel 8-bit canvas, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Canvas {
    /// Creates a canvas filled with 0.
    pub fn new(width: usize, height: usize) -> Self {
        Self { data: vec![0; width * height], width, height }
    }

    /// Canvas width.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Canvas height.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw row-major values.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Value at `(x, y)`, or `None` outside the canvas.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        (x < self.width && y < self.height).then(|| self.data[y * self.width + x])
    }

    /// Canvas as floats in `[0, 1]`.
    pub fn to_unit(&self) -> Vec<f32> {
        self.data.iter().map(|v| *v as f32 / 255.0).collect()
    }

    /// First and one-past-last pixel index whose center lies in `[lo, hi]`,
    /// clipped to `len`.
    #[inline]
    fn center_span(lo: f32, hi: f32, len: usize) -> (usize, usize) {
        let start = (lo - 0.5).ceil().max(0.0) as usize;
        let end = ((hi - 0.5).floor() + 1.0).clamp(0.0, len as f32) as usize;
        (start.min(len), end)
    }

    fn fill_span(&mut self, y: usize, x0: usize, x1: usize, value: u8) {
        if x0 < x1 {
            let row = y * self.width;
            self.data[row + x0..row + x1].fill(value);
        }
    }

    /// Fills a closed polygon with the even-odd rule.
    ///
    /// Scanline fill at pixel-center rows; each edge pair paints the pixels
    /// whose centers lie in `[x_left, x_right)`.
    pub fn fill_polygon(&mut self, points: &[(f32, f32)], value: u8) {
        let n = points.len();
        if n < 3 || self.data.is_empty() {
            return;
        }

        let (ymin, ymax) = points
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
        let (y_start, y_end) = Self::center_span(ymin, ymax, self.height);

        let mut xs: Vec<f32> = Vec::with_capacity(8);
        for y in y_start..y_end {
            let sy = y as f32 + 0.5;
            xs.clear();
            for i in 0..n {
                let (x1, y1) = points[i];
                let (x2, y2) = points[(i + 1) % n];
                if (y1 <= sy && sy < y2) || (y2 <= sy && sy < y1) {
                    xs.push(x1 + (sy - y1) * (x2 - x1) / (y2 - y1));
                }
            }
            xs.sort_by(|a, b| a.total_cmp(b));

            for pair in xs.chunks_exact(2) {
                let x0 = ((pair[0] - 0.5).ceil().max(0.0) as usize).min(self.width);
                let x1 = ((pair[1] - 0.5).ceil().max(0.0) as usize).min(self.width);
                self.fill_span(y, x0, x1, value);
            }
        }
    }

    /// Fills the disc of radius `r` around (`cx`, `cy`).
    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, value: u8) {
        if r <= 0.0 || self.data.is_empty() {
            return;
        }
        let (y_start, y_end) = Self::center_span(cy - r, cy + r, self.height);
        let r2 = r * r;
        for y in y_start..y_end {
            let dy = y as f32 + 0.5 - cy;
            let rem = r2 - dy * dy;
            if rem < 0.0 {
                continue;
            }
            let half = rem.sqrt();
            let (x0, x1) = Self::center_span(cx - half, cx + half, self.width);
            self.fill_span(y, x0, x1, value);
        }
    }

    /// Strokes an open polyline `width` pixels wide with round joints.
    ///
    /// Each segment is a filled quad; interior vertices get a disc so turns
    /// stay closed. End caps are left to the caller.
    pub fn stroke_polyline(&mut self, points: &[(f32, f32)], width: f32, value: u8) {
        if points.len() < 2 || width <= 0.0 {
            return;
        }
        let half = width / 2.0;

        for seg in points.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let (dx, dy) = (b.0 - a.0, b.1 - a.1);
            let len = (dx * dx + dy * dy).sqrt();
            if len <= f32::EPSILON {
                continue;
            }
            let (nx, ny) = (-dy / len * half, dx / len * half);
            self.fill_polygon(
                &[(a.0 + nx, a.1 + ny), (b.0 + nx, b.1 + ny), (b.0 - nx, b.1 - ny), (a.0 - nx, a.1 - ny)],
                value,
            );
        }
        for p in &points[1..points.len() - 1] {
            self.fill_circle(p.0, p.1, half, value);
        }
    }
}
