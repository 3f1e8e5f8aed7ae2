use glam::Vec3;

/// Up axis of generator and curve space. Rows grow along it.
pub const UP_AXIS: Vec3 = Vec3::Y;

/// Fraction of an item spacing each row is shifted against the row below.
pub const ROW_STAGGER: f32 = 0.5;

/// Default number of segments sampled when building an arc-length table.
pub const DEFAULT_ARC_LENGTH_SAMPLES: usize = 256;

/// Curves shorter than this are treated as degenerate.
pub const MIN_CURVE_LENGTH: f32 = 1e-6;

/// Name given to the parent node of an assembled stack.
pub const STACK_NODE_NAME: &str = "Stack";
