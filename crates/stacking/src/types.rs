use std::sync::Arc;

use glam::Mat4;
use stack_config::StackSettings;

use crate::curve::CurveRef;
use crate::validation::{StackError, layout_row_count, row_item_count};

/// Everything that determines the shape of a stack.
///
/// Two configurations are equal when all values match and they reference the
/// same curve (or both have none).
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Items in the bottom row (must be at least 1)
    pub base_count: u32,
    /// Length of the bottom row when no curve is used
    pub base_length: f32,
    /// Requested rows; the layout gets `min(base_count, row_count)`
    pub row_count: u32,
    /// Vertical distance between rows
    pub row_height: f32,
    /// Seed for the per-item jitter
    pub random_seed: u32,
    /// Maximum absolute heading rotation, in radians
    pub random_rotation: f32,
    /// Maximum absolute offset across the stack direction
    pub random_offset_across: f32,
    /// Maximum absolute offset along the stack direction
    pub random_offset_along: f32,
    /// Curve to follow instead of a straight line
    pub curve: Option<CurveRef>,
}

impl PartialEq for StackConfig {
    fn eq(&self, other: &Self) -> bool {
        let same_curve = match (&self.curve, &other.curve) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };

        same_curve
            && self.base_count == other.base_count
            && self.base_length == other.base_length
            && self.row_count == other.row_count
            && self.row_height == other.row_height
            && self.random_seed == other.random_seed
            && self.random_rotation == other.random_rotation
            && self.random_offset_across == other.random_offset_across
            && self.random_offset_along == other.random_offset_along
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::from_settings(&StackSettings::default(), None)
    }
}

impl StackConfig {
    /// Build a configuration from persisted settings and an optional curve
    pub fn from_settings(settings: &StackSettings, curve: Option<CurveRef>) -> Self {
        Self {
            base_count: settings.base_count,
            base_length: settings.base_length,
            row_count: settings.row_count,
            row_height: settings.row_height,
            random_seed: settings.random_seed,
            random_rotation: settings.random_rotation,
            random_offset_across: settings.random_offset_across,
            random_offset_along: settings.random_offset_along,
            curve,
        }
    }

    /// Straight stack without jitter
    pub fn straight(base_count: u32, base_length: f32, row_count: u32, row_height: f32) -> Self {
        Self {
            base_count,
            base_length,
            row_count,
            row_height,
            random_seed: 0,
            random_rotation: 0.0,
            random_offset_across: 0.0,
            random_offset_along: 0.0,
            curve: None,
        }
    }

    /// Follow `curve` instead of a straight line
    pub fn with_curve(mut self, curve: CurveRef) -> Self {
        self.curve = Some(curve);
        self
    }

    /// Set the seed and random ranges
    pub fn with_jitter(mut self, seed: u32, rotation: f32, across: f32, along: f32) -> Self {
        self.random_seed = seed;
        self.random_rotation = rotation;
        self.random_offset_across = across;
        self.random_offset_along = along;
        self
    }

    /// Whether items are placed along a curve
    pub fn uses_curve(&self) -> bool {
        self.curve.is_some()
    }
}

/// Position of an item in the stack grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackCell {
    /// Row index, 0 is the bottom row
    pub row: usize,
    /// Item index within the row
    pub item: usize,
}

/// Space the transforms of a layout are expressed in.
///
/// Straight stacks are laid out in generator space. Curve stacks are laid out
/// in global space because the curve carries its own transform; they must be
/// brought into generator space before use as local transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformSpace {
    #[default]
    Local,
    Global,
}

/// Triangular grid of item transforms.
///
/// Row `r` holds `base_count - r` items. Iteration is row-major: bottom row
/// first, items in order within each row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StackLayout {
    pub(crate) rows: Vec<Vec<Mat4>>,
    pub(crate) space: TransformSpace,
}

impl StackLayout {
    /// Allocate a grid for the given counts, every transform set to identity
    pub fn with_shape(base_count: u32, row_count: u32) -> Result<Self, StackError> {
        let row_total = layout_row_count(base_count, row_count);

        let mut rows: Vec<Vec<Mat4>> = Vec::new();
        rows.try_reserve_exact(row_total)
            .map_err(|_| StackError::OutOfMemory { rows: row_total })?;

        for row in 0..row_total {
            let items = row_item_count(base_count, row);
            let mut transforms = Vec::new();
            transforms
                .try_reserve_exact(items)
                .map_err(|_| StackError::OutOfMemory { rows: row_total })?;
            transforms.resize(items, Mat4::IDENTITY);
            rows.push(transforms);
        }

        Ok(Self {
            rows,
            space: TransformSpace::Local,
        })
    }

    /// All rows, bottom first
    pub fn rows(&self) -> &[Vec<Mat4>] {
        &self.rows
    }

    /// Transforms of one row
    pub fn row(&self, row: usize) -> Option<&[Mat4]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Total number of items over all rows
    pub fn item_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Whether the layout has no items
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Space the transforms are expressed in
    pub fn space(&self) -> TransformSpace {
        self.space
    }

    /// Transform of a single cell
    pub fn transform(&self, cell: StackCell) -> Option<Mat4> {
        self.rows.get(cell.row)?.get(cell.item).copied()
    }

    /// Iterate cells and transforms in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (StackCell, &Mat4)> + '_ {
        self.rows.iter().enumerate().flat_map(|(row, items)| {
            items
                .iter()
                .enumerate()
                .map(move |(item, transform)| (StackCell { row, item }, transform))
        })
    }

    /// Flatten the layout into GPU instance records.
    ///
    /// Transforms are copied as stored, so curve layouts stay in global space.
    pub fn to_instances(&self) -> Vec<StackInstance> {
        self.iter()
            .map(|(cell, transform)| StackInstance {
                transform: transform.to_cols_array_2d(),
                row: cell.row as u32,
                item: cell.item as u32,
                _padding: [0; 2],
            })
            .collect()
    }
}

/// One stack item for hardware instanced rendering.
///
/// Layout is `#[repr(C)]` and `Pod` so a slice can be uploaded as a vertex
/// or storage buffer with `bytemuck::cast_slice`.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct StackInstance {
    /// Column-major item transform
    pub transform: [[f32; 4]; 4],
    /// Row index
    pub row: u32,
    /// Item index within the row
    pub item: u32,
    /// Padding to a 16-byte multiple
    pub _padding: [u32; 2],
}
