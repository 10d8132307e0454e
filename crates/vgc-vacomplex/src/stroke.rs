//! Stroke geometry attached to key edges.
//!
//! The complex only needs a small capability set from a stroke: sampling,
//! endpoint snapping, splitting at curve parameters, and averaging several
//! strokes into one when edges are glued. Strokes are trait objects so that
//! several models can coexist in one complex; [`PolylineStroke`] is the
//! universal model every other model can convert to.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cmp::{Ordering, Reverse};
use std::fmt;
use vgc_core::geometry::EPSILON;
use vgc_core::{Rect2d, Vec2d};

/// Upper bound on the number of samples produced when averaging strokes.
const MAX_AVERAGE_SAMPLES: usize = 256;

/// A location on a sampled stroke: a segment of the centerline polyline and
/// a parameter `u` in `[0, 1]` along that segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParameter {
    pub segment_index: usize,
    pub u: f64,
}

impl CurveParameter {
    pub const fn new(segment_index: usize, u: f64) -> Self {
        Self { segment_index, u }
    }

    /// Clamps to a polyline with `num_segments` segments, moving `u == 1`
    /// onto the start of the next segment when there is one.
    pub fn normalized(self, num_segments: usize) -> Self {
        if num_segments == 0 {
            return Self::new(0, 0.0);
        }
        let (mut segment, mut u) = if self.segment_index >= num_segments {
            (num_segments - 1, 1.0)
        } else {
            (self.segment_index, self.u.clamp(0.0, 1.0))
        };
        if u >= 1.0 && segment + 1 < num_segments {
            segment += 1;
            u = 0.0;
        }
        Self::new(segment, u)
    }

    pub fn compare(&self, other: &CurveParameter) -> Ordering {
        self.segment_index
            .cmp(&other.segment_index)
            .then(self.u.total_cmp(&other.u))
    }

    fn is_near(&self, other: &CurveParameter) -> bool {
        self.segment_index == other.segment_index && (self.u - other.u).abs() < EPSILON
    }
}

/// Geometry capability of a key edge.
pub trait StrokeGeometry: fmt::Debug {
    fn model_name(&self) -> &'static str;

    /// Models with a higher rank are preferred when averaging.
    fn model_rank(&self) -> i32;

    fn clone_box(&self) -> Box<dyn StrokeGeometry>;

    fn as_any(&self) -> &dyn Any;

    fn is_closed(&self) -> bool;

    fn width(&self) -> f64;

    /// Centerline samples. Closed strokes repeat the first sample at the end.
    fn sample(&self) -> Vec<Vec2d>;

    fn translate(&mut self, delta: Vec2d);

    /// Moves the endpoints of an open stroke. No-op for closed strokes.
    fn snap(&mut self, start: Vec2d, end: Vec2d);

    fn reversed(&self) -> Box<dyn StrokeGeometry>;

    fn bounding_box(&self) -> Rect2d {
        Rect2d::from_points(&self.sample())
    }

    fn position_at(&self, param: CurveParameter) -> Vec2d {
        position_at(&self.sample(), param)
    }

    fn to_polyline(&self) -> PolylineStroke {
        PolylineStroke::from_samples(self.sample(), self.width(), self.is_closed())
    }

    /// Splits an open stroke at sorted interior parameters, returning one
    /// more piece than there are parameters.
    fn split_open(&self, params: &[CurveParameter]) -> Vec<Box<dyn StrokeGeometry>> {
        self.to_polyline().split_open(params)
    }

    /// Splits a closed stroke at sorted parameters, returning as many open
    /// pieces as there are parameters. The last piece wraps around.
    fn split_closed(&self, params: &[CurveParameter]) -> Vec<Box<dyn StrokeGeometry>> {
        self.to_polyline().split_closed(params)
    }

    /// Averages open strokes given with their traversal direction, or
    /// returns `None` if this model cannot represent the result natively.
    fn average_open(&self, inputs: &[(&dyn StrokeGeometry, bool)]) -> Option<Box<dyn StrokeGeometry>> {
        let _ = inputs;
        None
    }

    /// Averages closed strokes given with their direction and start offset,
    /// a fraction of arc length in `[0, 1)`.
    fn average_closed(
        &self,
        inputs: &[(&dyn StrokeGeometry, bool, f64)],
    ) -> Option<Box<dyn StrokeGeometry>> {
        let _ = inputs;
        None
    }
}

impl Clone for Box<dyn StrokeGeometry> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Straight segment between two points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStroke {
    pub start: Vec2d,
    pub end: Vec2d,
    pub width: f64,
}

impl LineStroke {
    pub fn new(start: Vec2d, end: Vec2d, width: f64) -> Self {
        Self { start, end, width }
    }
}

impl StrokeGeometry for LineStroke {
    fn model_name(&self) -> &'static str {
        "line"
    }

    fn model_rank(&self) -> i32 {
        0
    }

    fn clone_box(&self) -> Box<dyn StrokeGeometry> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn sample(&self) -> Vec<Vec2d> {
        vec![self.start, self.end]
    }

    fn translate(&mut self, delta: Vec2d) {
        self.start += delta;
        self.end += delta;
    }

    fn snap(&mut self, start: Vec2d, end: Vec2d) {
        self.start = start;
        self.end = end;
    }

    fn reversed(&self) -> Box<dyn StrokeGeometry> {
        Box::new(LineStroke::new(self.end, self.start, self.width))
    }

    fn split_open(&self, params: &[CurveParameter]) -> Vec<Box<dyn StrokeGeometry>> {
        let mut points = vec![self.start];
        points.extend(params.iter().map(|p| self.position_at(*p)));
        points.push(self.end);
        points
            .windows(2)
            .map(|w| Box::new(LineStroke::new(w[0], w[1], self.width)) as Box<dyn StrokeGeometry>)
            .collect()
    }

    fn average_open(&self, inputs: &[(&dyn StrokeGeometry, bool)]) -> Option<Box<dyn StrokeGeometry>> {
        if inputs.is_empty() {
            return None;
        }
        let mut start = Vec2d::ZERO;
        let mut end = Vec2d::ZERO;
        let mut width = 0.0;
        for (stroke, direction) in inputs {
            let line = stroke.as_any().downcast_ref::<LineStroke>()?;
            let (s, e) = if *direction {
                (line.start, line.end)
            } else {
                (line.end, line.start)
            };
            start += s;
            end += e;
            width += line.width;
        }
        let n = inputs.len() as f64;
        Some(Box::new(LineStroke::new(start / n, end / n, width / n)))
    }
}

/// Polyline centerline with a constant width.
///
/// Closed polylines store their points without repeating the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineStroke {
    points: Vec<Vec2d>,
    width: f64,
    closed: bool,
}

impl PolylineStroke {
    pub fn open(mut points: Vec<Vec2d>, width: f64) -> Self {
        if points.is_empty() {
            points.push(Vec2d::ZERO);
        }
        if points.len() == 1 {
            points.push(points[0]);
        }
        Self {
            points,
            width,
            closed: false,
        }
    }

    pub fn closed(mut points: Vec<Vec2d>, width: f64) -> Self {
        if points.len() > 1 && points[0] == points[points.len() - 1] {
            points.pop();
        }
        if points.is_empty() {
            points.push(Vec2d::ZERO);
        }
        Self {
            points,
            width,
            closed: true,
        }
    }

    fn from_samples(samples: Vec<Vec2d>, width: f64, closed: bool) -> Self {
        if closed {
            Self::closed(samples, width)
        } else {
            Self::open(samples, width)
        }
    }

    pub fn points(&self) -> &[Vec2d] {
        &self.points
    }
}

impl StrokeGeometry for PolylineStroke {
    fn model_name(&self) -> &'static str {
        "polyline"
    }

    fn model_rank(&self) -> i32 {
        1
    }

    fn clone_box(&self) -> Box<dyn StrokeGeometry> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn width(&self) -> f64 {
        self.width
    }

    fn sample(&self) -> Vec<Vec2d> {
        let mut samples = self.points.clone();
        if self.closed {
            samples.push(self.points[0]);
        }
        samples
    }

    fn translate(&mut self, delta: Vec2d) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    fn snap(&mut self, start: Vec2d, end: Vec2d) {
        if self.closed {
            return;
        }
        let last = self.points.len() - 1;
        let delta_start = start - self.points[0];
        let delta_end = end - self.points[last];
        let fractions = arc_length_fractions(&self.points);
        for (p, t) in self.points.iter_mut().zip(fractions) {
            *p += delta_start * (1.0 - t) + delta_end * t;
        }
        self.points[0] = start;
        self.points[last] = end;
    }

    fn reversed(&self) -> Box<dyn StrokeGeometry> {
        let mut points = self.points.clone();
        points.reverse();
        if self.closed {
            // Keep the same start point for closed strokes.
            points.rotate_right(1);
        }
        Box::new(PolylineStroke {
            points,
            width: self.width,
            closed: self.closed,
        })
    }

    fn to_polyline(&self) -> PolylineStroke {
        self.clone()
    }

    fn split_open(&self, params: &[CurveParameter]) -> Vec<Box<dyn StrokeGeometry>> {
        let samples = self.sample();
        let n = samples.len() - 1;
        let mut bounds = vec![CurveParameter::new(0, 0.0)];
        bounds.extend(params.iter().map(|p| p.normalized(n)));
        bounds.push(CurveParameter::new(n.saturating_sub(1), 1.0));
        bounds
            .windows(2)
            .map(|w| {
                Box::new(PolylineStroke::open(sub_polyline(&samples, w[0], w[1]), self.width))
                    as Box<dyn StrokeGeometry>
            })
            .collect()
    }

    fn split_closed(&self, params: &[CurveParameter]) -> Vec<Box<dyn StrokeGeometry>> {
        let samples = self.sample();
        let n = samples.len() - 1;
        let params: Vec<CurveParameter> = params.iter().map(|p| p.normalized(n)).collect();
        let Some((&first, _)) = params.split_first() else {
            return vec![self.clone_box()];
        };
        let start = CurveParameter::new(0, 0.0);
        let end = CurveParameter::new(n.saturating_sub(1), 1.0);
        let mut pieces: Vec<Box<dyn StrokeGeometry>> = params
            .windows(2)
            .map(|w| {
                Box::new(PolylineStroke::open(sub_polyline(&samples, w[0], w[1]), self.width))
                    as Box<dyn StrokeGeometry>
            })
            .collect();
        let last = params[params.len() - 1];
        let mut wrap = sub_polyline(&samples, last, end);
        for p in sub_polyline(&samples, start, first) {
            push_distinct(&mut wrap, p);
        }
        pieces.push(Box::new(PolylineStroke::open(wrap, self.width)));
        pieces
    }

    fn average_open(&self, inputs: &[(&dyn StrokeGeometry, bool)]) -> Option<Box<dyn StrokeGeometry>> {
        if inputs.is_empty() {
            return None;
        }
        let oriented: Vec<Vec<Vec2d>> = inputs
            .iter()
            .map(|(stroke, direction)| {
                let mut samples = stroke.sample();
                if !direction {
                    samples.reverse();
                }
                samples
            })
            .collect();
        let count = oriented
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(2)
            .clamp(2, MAX_AVERAGE_SAMPLES);
        let resampled: Vec<Vec<Vec2d>> = oriented.iter().map(|s| resample_open(s, count)).collect();
        let width = inputs.iter().map(|(s, _)| s.width()).sum::<f64>() / inputs.len() as f64;
        Some(Box::new(PolylineStroke::open(average_points(&resampled, count), width)))
    }

    fn average_closed(
        &self,
        inputs: &[(&dyn StrokeGeometry, bool, f64)],
    ) -> Option<Box<dyn StrokeGeometry>> {
        if inputs.is_empty() {
            return None;
        }
        let count = inputs
            .iter()
            .map(|(s, _, _)| s.sample().len().saturating_sub(1))
            .max()
            .unwrap_or(3)
            .clamp(3, MAX_AVERAGE_SAMPLES);
        let resampled: Vec<Vec<Vec2d>> = inputs
            .iter()
            .map(|(stroke, direction, offset)| {
                let mut samples = stroke.sample();
                if !direction {
                    samples.reverse();
                }
                resample_closed(&samples, count, *offset)
            })
            .collect();
        let width = inputs.iter().map(|(s, _, _)| s.width()).sum::<f64>() / inputs.len() as f64;
        Some(Box::new(PolylineStroke::closed(average_points(&resampled, count), width)))
    }
}

/// Averages open strokes with the highest-ranked model able to represent
/// the result, falling back to a polyline.
pub fn average_open_strokes(inputs: &[(&dyn StrokeGeometry, bool)]) -> Option<Box<dyn StrokeGeometry>> {
    let mut candidates: Vec<&dyn StrokeGeometry> = inputs.iter().map(|(s, _)| *s).collect();
    candidates.sort_by_key(|s| Reverse(s.model_rank()));
    candidates
        .iter()
        .find_map(|c| c.average_open(inputs))
        .or_else(|| PolylineStroke::open(Vec::new(), 0.0).average_open(inputs))
}

/// Closed counterpart of [`average_open_strokes`].
pub fn average_closed_strokes(
    inputs: &[(&dyn StrokeGeometry, bool, f64)],
) -> Option<Box<dyn StrokeGeometry>> {
    let mut candidates: Vec<&dyn StrokeGeometry> = inputs.iter().map(|(s, _, _)| *s).collect();
    candidates.sort_by_key(|s| Reverse(s.model_rank()));
    candidates
        .iter()
        .find_map(|c| c.average_closed(inputs))
        .or_else(|| PolylineStroke::closed(Vec::new(), 0.0).average_closed(inputs))
}

/// Concatenates open strokes traversed in the given directions.
pub fn join_open_strokes(parts: &[(&dyn StrokeGeometry, bool)]) -> Box<dyn StrokeGeometry> {
    let mut points = Vec::new();
    let mut width = 0.0;
    for (stroke, direction) in parts {
        let mut samples = stroke.sample();
        if !direction {
            samples.reverse();
        }
        for p in samples {
            push_distinct(&mut points, p);
        }
        width += stroke.width();
    }
    let width = if parts.is_empty() {
        0.0
    } else {
        width / parts.len() as f64
    };
    Box::new(PolylineStroke::open(points, width))
}

/// Turns an open stroke whose endpoints coincide into a closed stroke.
pub fn close_open_stroke(stroke: &dyn StrokeGeometry) -> Box<dyn StrokeGeometry> {
    Box::new(PolylineStroke::closed(stroke.sample(), stroke.width()))
}

/// Normalizes, sorts and deduplicates cut parameters. For open strokes the
/// parameters located at either end are dropped.
pub(crate) fn prepare_cut_parameters(
    params: &[CurveParameter],
    num_segments: usize,
    closed: bool,
) -> Vec<CurveParameter> {
    let start = CurveParameter::new(0, 0.0);
    let end = CurveParameter::new(num_segments.saturating_sub(1), 1.0);
    let mut prepared: Vec<CurveParameter> = params
        .iter()
        .map(|p| p.normalized(num_segments))
        .map(|p| if closed && p.is_near(&end) { start } else { p })
        .collect();
    prepared.sort_by(CurveParameter::compare);
    prepared.dedup_by(|a, b| a.is_near(b));
    if !closed {
        prepared.retain(|p| !p.is_near(&start) && !p.is_near(&end));
    }
    prepared
}

/// Index in `prepared` of the parameter `param` was merged into, if kept.
pub(crate) fn cut_parameter_index(
    prepared: &[CurveParameter],
    param: CurveParameter,
    num_segments: usize,
) -> Option<usize> {
    let param = param.normalized(num_segments);
    prepared.iter().position(|p| p.is_near(&param))
}

pub fn position_at(samples: &[Vec2d], param: CurveParameter) -> Vec2d {
    if samples.len() < 2 {
        return samples.first().copied().unwrap_or(Vec2d::ZERO);
    }
    let p = param.normalized(samples.len() - 1);
    samples[p.segment_index].lerp(samples[p.segment_index + 1], p.u)
}

/// Point at arc-length fraction `t` in `[0, 1]`.
pub fn point_at_fraction(samples: &[Vec2d], t: f64) -> Vec2d {
    let lengths = cumulative_lengths(samples);
    let total = lengths.last().copied().unwrap_or(0.0);
    point_at_length(samples, &lengths, t.clamp(0.0, 1.0) * total)
}

fn sub_polyline(samples: &[Vec2d], from: CurveParameter, to: CurveParameter) -> Vec<Vec2d> {
    let mut points = vec![position_at(samples, from)];
    for sample in samples
        .iter()
        .take(to.segment_index + 1)
        .skip(from.segment_index + 1)
    {
        push_distinct(&mut points, *sample);
    }
    push_distinct(&mut points, position_at(samples, to));
    points
}

fn push_distinct(points: &mut Vec<Vec2d>, p: Vec2d) {
    if points.last() != Some(&p) {
        points.push(p);
    }
}

fn cumulative_lengths(samples: &[Vec2d]) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(samples.len());
    let mut total = 0.0;
    for (i, p) in samples.iter().enumerate() {
        if i > 0 {
            total += samples[i - 1].distance_to(*p);
        }
        lengths.push(total);
    }
    lengths
}

fn arc_length_fractions(samples: &[Vec2d]) -> Vec<f64> {
    let lengths = cumulative_lengths(samples);
    let total = lengths.last().copied().unwrap_or(0.0);
    let last = samples.len().saturating_sub(1).max(1) as f64;
    lengths
        .iter()
        .enumerate()
        .map(|(i, l)| if total > EPSILON { l / total } else { i as f64 / last })
        .collect()
}

fn point_at_length(samples: &[Vec2d], lengths: &[f64], s: f64) -> Vec2d {
    if samples.len() < 2 {
        return samples.first().copied().unwrap_or(Vec2d::ZERO);
    }
    let i = match lengths.iter().position(|l| *l >= s) {
        Some(0) => return samples[0],
        Some(i) => i,
        None => return samples[samples.len() - 1],
    };
    let segment = lengths[i] - lengths[i - 1];
    if segment <= EPSILON {
        return samples[i];
    }
    samples[i - 1].lerp(samples[i], (s - lengths[i - 1]) / segment)
}

fn resample_open(samples: &[Vec2d], count: usize) -> Vec<Vec2d> {
    let lengths = cumulative_lengths(samples);
    let total = lengths.last().copied().unwrap_or(0.0);
    (0..count)
        .map(|k| {
            let t = k as f64 / (count - 1) as f64;
            point_at_length(samples, &lengths, t * total)
        })
        .collect()
}

fn resample_closed(samples: &[Vec2d], count: usize, offset: f64) -> Vec<Vec2d> {
    let lengths = cumulative_lengths(samples);
    let total = lengths.last().copied().unwrap_or(0.0);
    (0..count)
        .map(|k| {
            let t = (offset + k as f64 / count as f64).rem_euclid(1.0);
            point_at_length(samples, &lengths, t * total)
        })
        .collect()
}

fn average_points(inputs: &[Vec<Vec2d>], count: usize) -> Vec<Vec2d> {
    let n = inputs.len() as f64;
    (0..count)
        .map(|k| inputs.iter().fold(Vec2d::ZERO, |acc, pts| acc + pts[k]) / n)
        .collect()
}
