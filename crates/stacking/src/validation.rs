use thiserror::Error;

use crate::types::StackConfig;

/// Errors reported by the stack generator.
///
/// Every failure is local to one generator and one call. Nothing is retried
/// internally; callers correct the input and call again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StackError {
    #[error("Invalid configuration: base count {base_count} must be at least 1")]
    InvalidConfig { base_count: u32 },
    #[error("Out of memory while reshaping the stack to {rows} rows")]
    OutOfMemory { rows: usize },
    #[error("Stack generator has not been configured")]
    NotConfigured,
    #[error("Stack generation failed: {0}")]
    GenerationFailed(String),
    #[error("No template node to duplicate")]
    NoTemplate,
    #[error("Allocation failed while assembling item {index}")]
    AllocationFailed { index: usize },
    #[error("Generator transform cannot be inverted")]
    SingularTransform,
}

/// Validate a configuration before it replaces the stored one
pub fn validate_config(config: &StackConfig) -> Result<(), StackError> {
    if config.base_count < 1 {
        return Err(StackError::InvalidConfig {
            base_count: config.base_count,
        });
    }
    Ok(())
}

/// Number of rows a stack actually gets: never more than its base count
pub fn layout_row_count(base_count: u32, row_count: u32) -> usize {
    base_count.min(row_count) as usize
}

/// Number of items in `row` of a stack with the given base count
pub fn row_item_count(base_count: u32, row: usize) -> usize {
    (base_count as usize).saturating_sub(row)
}

/// Distance fraction between neighbouring items on a curve.
///
/// The first and last base items sit on the curve ends, so a single-item
/// base has no spacing at all.
pub fn relative_distance(base_count: u32) -> f32 {
    if base_count > 1 {
        1.0 / (base_count - 1) as f32
    } else {
        0.0
    }
}
