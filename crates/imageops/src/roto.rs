//! Vector masks: paint strokes and closed bezier shapes.
//!
//! The host hands over a loosely structured payload, either a JSON value or
//! JSON text:
//!
//! ```json
//! {"version": 1, "mode": "paint",
//!  "strokes": [{"points": [[0.1, 0.1], [0.9, 0.9]], "brush": 12, "erase": false}]}
//!
//! {"version": 1, "mode": "bezier", "steps": 48,
//!  "points": [{"x": 0.1, "y": 0.1}, {"x": 0.9, "y": 0.1}, {"x": 0.5, "y": 0.9}]}
//! ```
//!
//! Coordinates are normalized to the frame. Parsing never fails: anything
//! malformed is dropped, down to an empty shape.
//!
//! Bezier mode treats the points as a closed Catmull-Rom loop. Each span
//! `p1 -> p2` becomes a cubic with controls `p1 + (p2 - p0) / 6` and
//! `p2 - (p3 - p1) / 6`, is sampled `steps` times, and the resulting polygon
//! is filled.

use imageops_core::{ImageBatch, MaskBatch, OpsConfig, OpsResult, clamp01};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::adapter::select_source;
use crate::filter::convolve_separable;
use crate::kernel::Kernel;
use crate::raster::Canvas;

const DEFAULT_BRUSH: f64 = 24.0;
const DEFAULT_STEPS: f64 = 48.0;
const MIN_STEPS: f64 = 8.0;
const MAX_STEPS: f64 = 256.0;

/// One paint stroke in normalized coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Polyline vertices.
    pub points: Vec<(f32, f32)>,
    /// Brush diameter in pixels.
    pub brush: f32,
    /// Paint 0 instead of 255.
    pub erase: bool,
}

/// Parsed vector mask geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorMaskSpec {
    /// Strokes painted in order onto one canvas.
    Paint {
        /// Strokes with at least two usable points.
        strokes: Vec<Stroke>,
    },
    /// Closed Catmull-Rom loop.
    Bezier {
        /// Control points.
        points: Vec<(f32, f32)>,
        /// Samples per span.
        steps: usize,
    },
}

impl Default for VectorMaskSpec {
    fn default() -> Self {
        Self::Paint { strokes: Vec::new() }
    }
}

/// Reads a number, accepting numeric strings.
fn as_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|f| f.is_finite())
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Null => false,
    }
}

fn parse_stroke(v: &Value) -> Option<Stroke> {
    let obj = v.as_object()?;
    let points: Vec<(f32, f32)> = obj
        .get("points")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|p| {
            let p = p.as_array().filter(|p| p.len() >= 2)?;
            Some((as_number(&p[0])? as f32, as_number(&p[1])? as f32))
        })
        .collect();
    if points.len() < 2 {
        return None;
    }
    let brush = obj
        .get("brush")
        .and_then(as_number)
        .filter(|b| *b != 0.0)
        .unwrap_or(DEFAULT_BRUSH);
    let erase = obj.get("erase").is_some_and(truthy);
    Some(Stroke { points, brush: brush as f32, erase })
}

fn parse_bezier_point(v: &Value) -> Option<(f32, f32)> {
    let obj = v.as_object()?;
    let coord = |key: &str| obj.get(key).and_then(as_number).unwrap_or(0.0) as f32;
    Some((coord("x"), coord("y")))
}

impl VectorMaskSpec {
    /// Interprets a JSON value. Non-objects yield an empty paint spec.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            if let Value::String(s) = value {
                return Self::parse(s);
            }
            if !value.is_null() {
                debug!("vector mask payload is not an object");
            }
            return Self::default();
        };

        let mode = obj
            .get("mode")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or("paint")
            .to_ascii_lowercase();

        if mode == "bezier" {
            let points = obj
                .get("points")
                .and_then(Value::as_array)
                .map(|pts| pts.iter().filter_map(parse_bezier_point).collect())
                .unwrap_or_default();
            let steps = obj
                .get("steps")
                .and_then(as_number)
                .unwrap_or(DEFAULT_STEPS)
                .clamp(MIN_STEPS, MAX_STEPS) as usize;
            return Self::Bezier { points, steps };
        }

        let strokes = obj
            .get("strokes")
            .and_then(Value::as_array)
            .map(|s| s.iter().filter_map(parse_stroke).collect())
            .unwrap_or_default();
        Self::Paint { strokes }
    }

    /// Parses JSON text. Invalid text yields an empty paint spec.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::String(_)) => Self::default(),
            Ok(v) => Self::from_value(&v),
            Err(e) => {
                warn!(error = %e, "invalid vector mask payload; using empty mask");
                Self::default()
            }
        }
    }

    /// Rasterizes onto a `width` × `height` 8-bit canvas.
    pub fn rasterize(&self, width: usize, height: usize) -> Canvas {
        let mut canvas = Canvas::new(width, height);
        let (fw, fh) = (width as f32, height as f32);
        let to_px = |p: &(f32, f32)| (p.0 * fw, p.1 * fh);

        match self {
            Self::Paint { strokes } => {
                for s in strokes {
                    let pts: Vec<(f32, f32)> = s.points.iter().map(to_px).collect();
                    let brush_px = s.brush.round_ties_even().max(1.0);
                    let value = if s.erase { 0 } else { 255 };
                    canvas.stroke_polyline(&pts, brush_px, value);
                    let r = (brush_px as u32 / 2).max(1) as f32;
                    for (x, y) in [pts[0], pts[pts.len() - 1]] {
                        canvas.fill_circle(x, y, r, value);
                    }
                }
            }
            Self::Bezier { points, steps } => {
                if points.len() >= 3 {
                    let pts: Vec<(f32, f32)> = points.iter().map(to_px).collect();
                    let outline = sample_closed_spline(&pts, *steps);
                    canvas.fill_polygon(&outline, 255);
                }
            }
        }
        canvas
    }
}

/// Samples a closed Catmull-Rom loop through `pts` as cubic bezier spans.
///
/// Every span contributes `steps + 1` samples except that spans after the
/// first drop their leading sample, which repeats the previous span's end.
pub fn sample_closed_spline(pts: &[(f32, f32)], steps: usize) -> Vec<(f32, f32)> {
    let n = pts.len();
    let steps = steps.max(1);
    let mut out = Vec::with_capacity(n * steps + 1);

    for i in 0..n {
        let p0 = pts[(i + n - 1) % n];
        let p1 = pts[i];
        let p2 = pts[(i + 1) % n];
        let p3 = pts[(i + 2) % n];
        let c1 = (p1.0 + (p2.0 - p0.0) / 6.0, p1.1 + (p2.1 - p0.1) / 6.0);
        let c2 = (p2.0 - (p3.0 - p1.0) / 6.0, p2.1 - (p3.1 - p1.1) / 6.0);

        let first = if i == 0 { 0 } else { 1 };
        for k in first..=steps {
            let t = k as f32 / steps as f32;
            let mt = 1.0 - t;
            let (a, b, c, d) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
            out.push((
                a * p1.0 + b * c1.0 + c * c2.0 + d * p2.0,
                a * p1.1 + b * c1.1 + c * c2.1 + d * p2.1,
            ));
        }
    }
    out
}

/// Renders a vector mask payload at the source frame size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotoMask {
    /// Shape payload, a JSON object or JSON text.
    pub payload: Value,
    /// Output `1 - mask`.
    pub invert: bool,
    /// Gaussian sigma in pixels; 0 keeps hard edges.
    pub feather: f32,
    /// Multiplier applied before inversion.
    pub opacity: f32,
}

impl Default for RotoMask {
    fn default() -> Self {
        Self {
            payload: serde_json::json!({"version": 1, "mode": "paint"}),
            invert: false,
            feather: 0.0,
            opacity: 1.0,
        }
    }
}

impl RotoMask {
    /// Rasterizes the payload once and repeats it for every source frame.
    ///
    /// # Errors
    ///
    /// [`imageops_core::OpsError::NoSource`] when neither input is given.
    pub fn render(
        &self,
        image: Option<&ImageBatch>,
        video: Option<&ImageBatch>,
        cfg: &OpsConfig,
    ) -> OpsResult<MaskBatch> {
        let src = select_source(image, video)?;
        let (b, h, w, _) = src.shape();
        trace!(invert = self.invert, feather = self.feather, opacity = self.opacity, batch = b, "roto::render");

        let spec = VectorMaskSpec::from_value(&self.payload);
        let mut mask = spec.rasterize(w, h).to_unit();

        if self.feather > 0.0 {
            // reflected taps wider than the frame add nothing
            let radius = ((3.0 * self.feather).ceil() as usize).min(w.max(h));
            let kernel = Kernel::gaussian(radius, self.feather, cfg.epsilon);
            mask = convolve_separable(&mask, 1, h, w, 1, &kernel);
        }
        for v in &mut mask {
            *v = clamp01(*v * self.opacity);
            if self.invert {
                *v = 1.0 - *v;
            }
        }

        let mut data = Vec::with_capacity(mask.len() * b);
        for _ in 0..b {
            data.extend_from_slice(&mask);
        }
        MaskBatch::from_data(b, h, w, data)
    }
}
