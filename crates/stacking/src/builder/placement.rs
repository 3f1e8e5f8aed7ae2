//! Per-item placement for straight and curve stacks.

use glam::{Mat4, Quat, Vec3};

use crate::arc_length::ArcLengthReparametrizer;
use crate::constants::{ROW_STAGGER, UP_AXIS};
use crate::curve::{Curve, CurveRef};
use crate::random::StackRandom;
use crate::types::{StackCell, StackConfig, TransformSpace};
use crate::validation::relative_distance;

/// How items are placed, resolved once per configuration
#[derive(Debug, Clone)]
pub(crate) enum Placement {
    /// Along +Z in generator space, `spacing` apart
    Straight { spacing: f32 },
    /// Along a curve, `rel_distance` apart as a fraction of its length
    Curve { curve: CurveRef, rel_distance: f32 },
}

impl Placement {
    pub(crate) fn resolve(config: &StackConfig) -> Self {
        match &config.curve {
            Some(curve) => Self::Curve {
                curve: CurveRef::clone(curve),
                rel_distance: relative_distance(config.base_count),
            },
            None => Self::Straight {
                spacing: config.base_length / config.base_count as f32,
            },
        }
    }

    /// Space the resulting transforms are expressed in
    pub(crate) fn space(&self) -> TransformSpace {
        match self {
            Self::Straight { .. } => TransformSpace::Local,
            Self::Curve { .. } => TransformSpace::Global,
        }
    }
}

/// Placement of one generation pass, with the curve data sampled up front
pub(crate) enum Pass<'a> {
    Straight { spacing: f32 },
    Curve(CurveFrame<'a>),
}

/// Curve data shared by every item of one generation pass
pub(crate) struct CurveFrame<'a> {
    pub curve: &'a dyn Curve,
    pub reparametrizer: &'a ArcLengthReparametrizer,
    pub global_transform: Mat4,
    pub rel_distance: f32,
}

/// Random heading rotation about the up axis. Draws once.
pub(crate) fn heading(config: &StackConfig, random: &mut StackRandom) -> Quat {
    Quat::from_rotation_y(random.draw_signed() * config.random_rotation)
}

/// Item transform in generator space. Draws across, then along.
pub(crate) fn straight_item(
    config: &StackConfig,
    spacing: f32,
    cell: StackCell,
    rotation: Quat,
    random: &mut StackRandom,
) -> Mat4 {
    let row = cell.row as f32;
    let item = cell.item as f32;

    let across = random.draw_signed() * config.random_offset_across;
    let along = random.draw_signed() * config.random_offset_along;

    let position = Vec3::new(
        across,
        config.row_height * row,
        spacing * item + spacing * row * ROW_STAGGER + along,
    );
    Mat4::from_rotation_translation(rotation, position)
}

/// Item transform in global space. Draws across, then along.
pub(crate) fn curve_item(
    config: &StackConfig,
    frame: &CurveFrame<'_>,
    cell: StackCell,
    rotation: Quat,
    random: &mut StackRandom,
) -> Mat4 {
    let row = cell.row as f32;
    let item = cell.item as f32;

    let u = frame.rel_distance * item + frame.rel_distance * ROW_STAGGER * row;
    let t = frame.reparametrizer.uniform_to_native(u);

    let point = frame.curve.sample_point(t);
    let tangent = frame.curve.sample_tangent(t);
    let across_axis = tangent.cross(UP_AXIS);

    let mut position = point + UP_AXIS * (config.row_height * row);
    position += across_axis * (random.draw_signed() * config.random_offset_across);
    position += tangent * (random.draw_signed() * config.random_offset_along);

    frame.global_transform * Mat4::from_rotation_translation(rotation, position)
}
