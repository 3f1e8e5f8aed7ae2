//! Arc-length reparametrization of curves.
//!
//! Most curves are not parametrized by arc length: stepping the native
//! parameter in equal increments gives unequal distances. The table built
//! here maps a uniform distance fraction `u` (0 at the start, 1 at the end)
//! back to the native parameter so items can be spaced by true distance.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::constants::MIN_CURVE_LENGTH;
use crate::curve::{Curve, CurveRef};
use crate::validation::StackError;

/// Sampled mapping between native curve parameter and distance fraction
#[derive(Debug, Clone, PartialEq)]
pub struct ArcLengthTable {
    /// Native parameters of the samples, increasing from 0 to 1
    params: Vec<f32>,
    /// Cumulative length at each sample divided by the total length
    fractions: Vec<f32>,
    /// Total length in curve space
    total_length: f32,
}

impl ArcLengthTable {
    /// Sample a curve with `samples` segments, uniformly spaced in `t`.
    ///
    /// Fails for curves whose length is zero or not finite.
    pub fn sample<C: Curve + ?Sized>(curve: &C, samples: usize) -> Result<Self, StackError> {
        let samples = samples.max(1);
        let mut params = Vec::with_capacity(samples + 1);
        let mut fractions = Vec::with_capacity(samples + 1);

        let mut previous = curve.sample_point(0.0);
        let mut total_length = 0.0f32;
        params.push(0.0);
        fractions.push(0.0);

        for k in 1..=samples {
            let t = k as f32 / samples as f32;
            let point = curve.sample_point(t);
            total_length += point.distance(previous);
            previous = point;
            params.push(t);
            fractions.push(total_length);
        }

        if !total_length.is_finite() || total_length < MIN_CURVE_LENGTH {
            warn!("ArcLengthTable::sample: degenerate curve, length={}", total_length);
            return Err(StackError::GenerationFailed(format!(
                "curve length {total_length} is degenerate"
            )));
        }

        for fraction in &mut fractions {
            *fraction /= total_length;
        }

        Ok(Self {
            params,
            fractions,
            total_length,
        })
    }

    /// Total length of the curve in curve space
    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    /// Number of samples in the table (segments + 1)
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the table holds no samples
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Map distance fraction `u` to the native parameter.
    ///
    /// Inside `[0, 1]` the table is interpolated linearly. Outside it the
    /// mapping continues with the slope of the first or last non-flat segment,
    /// so positions keep following the curve's end tangents.
    pub fn uniform_to_native(&self, u: f32) -> f32 {
        let last = self.params.len() - 1;

        if u <= 0.0 {
            return self.params[0] + u * self.edge_slope(false);
        }
        if u >= 1.0 {
            return self.params[last] + (u - 1.0) * self.edge_slope(true);
        }

        // First sample strictly past u; fractions[0] == 0 <= u < 1 == fractions[last]
        let k = self.fractions.partition_point(|&f| f <= u).clamp(1, last);
        let (f0, f1) = (self.fractions[k - 1], self.fractions[k]);
        let (t0, t1) = (self.params[k - 1], self.params[k]);

        let span = f1 - f0;
        if span <= 0.0 {
            return t0;
        }
        t0 + (t1 - t0) * (u - f0) / span
    }

    /// Derivative dt/du of the first (or last) segment that has any length
    fn edge_slope(&self, at_end: bool) -> f32 {
        let mut slopes = self
            .fractions
            .windows(2)
            .zip(self.params.windows(2))
            .filter_map(|(f, t)| {
                let df = f[1] - f[0];
                (df > 0.0).then(|| (t[1] - t[0]) / df)
            });

        let slope = if at_end { slopes.last() } else { slopes.next() };
        slope.unwrap_or(1.0)
    }
}

/// Arc-length table bound to one curve revision.
///
/// Owned by a stack builder and reused across regenerations until the curve
/// handle or its revision changes.
#[derive(Debug)]
pub struct ArcLengthReparametrizer {
    curve: CurveRef,
    revision: u64,
    table: ArcLengthTable,
}

impl ArcLengthReparametrizer {
    /// Build the table for `curve`
    pub fn init(curve: &CurveRef, samples: usize) -> Result<Self, StackError> {
        let table = curve.sample_arc_length_table(samples)?;
        debug!(
            "ArcLengthReparametrizer::init: {} samples, length={:.3}, revision={}",
            table.len(),
            table.total_length(),
            curve.revision()
        );
        Ok(Self {
            curve: Arc::clone(curve),
            revision: curve.revision(),
            table,
        })
    }

    /// Whether this table is still valid for `curve`
    pub fn is_bound_to(&self, curve: &CurveRef) -> bool {
        Arc::ptr_eq(&self.curve, curve) && self.revision == curve.revision()
    }

    /// Return the reparametrizer in `slot`, rebuilding it if it belongs to
    /// another curve or an older revision
    pub fn ensure<'a>(
        slot: &'a mut Option<Self>,
        curve: &CurveRef,
        samples: usize,
    ) -> Result<&'a Self, StackError> {
        if !slot.as_ref().is_some_and(|r| r.is_bound_to(curve)) {
            // Drop the stale table first so a failed rebuild leaves nothing behind
            *slot = None;
            *slot = Some(Self::init(curve, samples)?);
        }
        slot.as_ref().ok_or_else(|| {
            StackError::GenerationFailed("arc-length table unavailable".to_string())
        })
    }

    /// Native parameter for distance fraction `u`
    pub fn uniform_to_native(&self, u: f32) -> f32 {
        self.table.uniform_to_native(u)
    }

    /// The underlying table
    pub fn table(&self) -> &ArcLengthTable {
        &self.table
    }
}
