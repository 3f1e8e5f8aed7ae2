//! Persisted settings for the stack generator
//!
//! This crate holds the attribute set a host stores for a stack generator
//! node: counts, lengths, random ranges and the instancing switch. It is the
//! single source of truth for default values and for the row-count clamp that
//! keeps a stack from asking for more rows than its base can carry.

use serde::{Deserialize, Serialize};

/// Default number of items in the bottom row
pub const DEFAULT_BASE_COUNT: u32 = 3;

/// Default length of the bottom row (used when no curve is linked)
pub const DEFAULT_BASE_LENGTH: f32 = 100.0;

/// Default number of rows
pub const DEFAULT_ROW_COUNT: u32 = 3;

/// Default vertical distance between rows
pub const DEFAULT_ROW_HEIGHT: f32 = 20.0;

/// Default random seed
pub const DEFAULT_RANDOM_SEED: u32 = 12345;

/// Stack generator attributes as persisted by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackSettings {
    /// Items in the bottom row
    pub base_count: u32,
    /// Length of the bottom row when no curve is linked
    pub base_length: f32,
    /// Requested number of rows (never more than `base_count` once validated)
    pub row_count: u32,
    /// Vertical distance between rows
    pub row_height: f32,
    /// Emit lightweight instances instead of full copies after the first item
    pub render_instances: bool,
    /// Seed for the per-item jitter
    pub random_seed: u32,
    /// Maximum absolute heading rotation per item, in radians
    pub random_rotation: f32,
    /// Maximum absolute offset across the stack direction
    pub random_offset_across: f32,
    /// Maximum absolute offset along the stack direction
    pub random_offset_along: f32,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            base_count: DEFAULT_BASE_COUNT,
            base_length: DEFAULT_BASE_LENGTH,
            row_count: DEFAULT_ROW_COUNT,
            row_height: DEFAULT_ROW_HEIGHT,
            render_instances: true,
            random_seed: DEFAULT_RANDOM_SEED,
            random_rotation: 0.0,
            random_offset_across: 0.0,
            random_offset_along: 0.0,
        }
    }
}

impl StackSettings {
    /// Create settings for a stack with the given base and row counts
    pub fn new(base_count: u32, row_count: u32) -> Self {
        Self {
            base_count,
            row_count,
            ..Default::default()
        }
    }

    /// Return a copy with `row_count` clamped to `base_count`
    pub fn validated(&self) -> Self {
        Self {
            row_count: self.row_count.min(self.base_count),
            ..self.clone()
        }
    }

    /// Whether any of the random ranges is non-zero
    pub fn has_jitter(&self) -> bool {
        self.random_rotation != 0.0
            || self.random_offset_across != 0.0
            || self.random_offset_along != 0.0
    }

    /// Number of items a stack with these settings contains
    pub fn item_count(&self) -> u64 {
        let base = self.base_count as u64;
        let rows = (self.row_count as u64).min(base);
        // Sum of base, base - 1, ... for `rows` rows
        rows * base - rows * rows.saturating_sub(1) / 2
    }

    /// Set the row height from the vertical bounding radius of an item.
    ///
    /// Rows are as tall as the item, so the height becomes twice the radius.
    /// Returns false and leaves the height alone for a zero radius.
    pub fn fit_row_height(&mut self, radius_y: f32) -> bool {
        if radius_y == 0.0 || !radius_y.is_finite() {
            return false;
        }
        self.row_height = radius_y.abs() * 2.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = StackSettings::default();
        assert_eq!(settings.base_count, DEFAULT_BASE_COUNT);
        assert_eq!(settings.base_length, DEFAULT_BASE_LENGTH);
        assert_eq!(settings.row_count, DEFAULT_ROW_COUNT);
        assert_eq!(settings.row_height, DEFAULT_ROW_HEIGHT);
        assert_eq!(settings.random_seed, DEFAULT_RANDOM_SEED);
        assert!(settings.render_instances);
        assert!(!settings.has_jitter());
    }

    #[test]
    fn test_validated_clamps_rows() {
        let settings = StackSettings::new(4, 9).validated();
        assert_eq!(settings.row_count, 4);

        let settings = StackSettings::new(4, 2).validated();
        assert_eq!(settings.row_count, 2);
    }

    #[test]
    fn test_item_count() {
        assert_eq!(StackSettings::new(5, 5).item_count(), 15);
        assert_eq!(StackSettings::new(5, 9).item_count(), 15);
        assert_eq!(StackSettings::new(4, 2).item_count(), 7);
        assert_eq!(StackSettings::new(1, 1).item_count(), 1);
        assert_eq!(StackSettings::new(3, 0).item_count(), 0);
    }

    #[test]
    fn test_fit_row_height() {
        let mut settings = StackSettings::default();
        assert!(settings.fit_row_height(6.5));
        assert_eq!(settings.row_height, 13.0);

        assert!(!settings.fit_row_height(0.0));
        assert_eq!(settings.row_height, 13.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: StackSettings =
            serde_json::from_str(r#"{ "base_count": 7, "random_rotation": 0.25 }"#).unwrap();
        assert_eq!(settings.base_count, 7);
        assert_eq!(settings.random_rotation, 0.25);
        assert_eq!(settings.row_count, DEFAULT_ROW_COUNT);
        assert!(settings.render_instances);
        assert!(settings.has_jitter());
    }
}
