//! Stack layout builder
//!
//! [`StackBuilder`] owns the triangular grid of item transforms and fills it
//! from a [`StackConfig`]:
//! 1. `configure` reseeds the random source and, for a new configuration,
//!    reshapes the grid to the requested counts
//! 2. `generate` computes a transform for every cell, either along a straight
//!    line in generator space or along a curve in global space
//!
//! The random source is drawn in a fixed order (rows, then items; per item
//! heading, across, along), which is what makes a seed reproduce a layout.

mod placement;

use tracing::{debug, trace, warn};

use crate::arc_length::ArcLengthReparametrizer;
use crate::constants::DEFAULT_ARC_LENGTH_SAMPLES;
use crate::random::StackRandom;
use crate::types::{StackCell, StackConfig, StackLayout};
use crate::validation::{StackError, validate_config};

use placement::{CurveFrame, Pass, Placement};

/// Builds stack layouts from configurations.
///
/// One builder serves one generator: it keeps the last configuration, the
/// grid and the arc-length table of the current curve between calls.
#[derive(Debug)]
pub struct StackBuilder {
    /// Last accepted configuration (None until `configure` succeeds)
    pub(crate) config: Option<StackConfig>,
    /// Placement resolved from `config`
    pub(crate) placement: Option<Placement>,
    /// Item transforms
    pub(crate) layout: StackLayout,
    /// Jitter source, reseeded on every `configure`
    pub(crate) random: StackRandom,
    /// Arc-length table of the current curve, built on first use
    pub(crate) arc_length: Option<ArcLengthReparametrizer>,
    /// Segments sampled per arc-length table
    pub(crate) arc_length_samples: usize,
}

impl Default for StackBuilder {
    fn default() -> Self {
        Self {
            config: None,
            placement: None,
            layout: StackLayout::default(),
            random: StackRandom::default(),
            arc_length: None,
            arc_length_samples: DEFAULT_ARC_LENGTH_SAMPLES,
        }
    }
}

impl StackBuilder {
    /// Create an unconfigured builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `samples` segments for arc-length tables
    pub fn with_arc_length_samples(mut self, samples: usize) -> Self {
        self.arc_length_samples = samples.max(1);
        self
    }

    /// Accept a configuration.
    ///
    /// The random source is reseeded every time, even when nothing else
    /// changes, so the next `generate` always starts from the seed. An equal
    /// configuration leaves everything else untouched. A rejected
    /// configuration leaves the previous one and its layout in place, with
    /// the random source restarted from the previous seed.
    pub fn configure(&mut self, config: &StackConfig) -> Result<(), StackError> {
        self.random.reseed(config.random_seed);

        if self.config.as_ref() == Some(config) {
            trace!("StackBuilder::configure: unchanged, seed={}", config.random_seed);
            return Ok(());
        }

        let layout = match validate_config(config)
            .and_then(|()| StackLayout::with_shape(config.base_count, config.row_count))
        {
            Ok(layout) => layout,
            Err(err) => {
                warn!("StackBuilder::configure: rejected: {}", err);
                if let Some(previous) = &self.config {
                    self.random.reseed(previous.random_seed);
                }
                return Err(err);
            }
        };

        if config.curve.is_none() {
            // No curve to follow, release its table
            self.arc_length = None;
        }
        self.placement = Some(Placement::resolve(config));
        self.layout = layout;
        self.config = Some(config.clone());

        debug!(
            "StackBuilder::configure: base={}, rows={} ({} requested), items={}, curve={}",
            config.base_count,
            self.layout.row_count(),
            config.row_count,
            self.layout.item_count(),
            config.uses_curve()
        );
        Ok(())
    }

    /// Compute every item transform of the configured stack.
    ///
    /// Curve stacks rebuild the arc-length table first if the curve changed
    /// since the last call; a degenerate curve fails without touching the
    /// layout.
    pub fn generate(&mut self) -> Result<&StackLayout, StackError> {
        let (Some(config), Some(mode)) = (self.config.as_ref(), self.placement.as_ref())
        else {
            return Err(StackError::NotConfigured);
        };

        let pass = match mode {
            Placement::Straight { spacing } => Pass::Straight { spacing: *spacing },
            Placement::Curve {
                curve,
                rel_distance,
            } => {
                let reparametrizer = ArcLengthReparametrizer::ensure(
                    &mut self.arc_length,
                    curve,
                    self.arc_length_samples,
                )?;
                Pass::Curve(CurveFrame {
                    curve: &**curve,
                    reparametrizer,
                    global_transform: curve.global_transform(),
                    rel_distance: *rel_distance,
                })
            }
        };

        let random = &mut self.random;
        for (row, items) in self.layout.rows.iter_mut().enumerate() {
            for (item, slot) in items.iter_mut().enumerate() {
                let cell = StackCell { row, item };
                let rotation = placement::heading(config, random);

                *slot = match &pass {
                    Pass::Straight { spacing } => {
                        placement::straight_item(config, *spacing, cell, rotation, random)
                    }
                    Pass::Curve(frame) => {
                        placement::curve_item(config, frame, cell, rotation, random)
                    }
                };
            }
        }
        self.layout.space = mode.space();

        debug!(
            "StackBuilder::generate: {} items in {} rows, space={:?}",
            self.layout.item_count(),
            self.layout.row_count(),
            self.layout.space
        );
        Ok(&self.layout)
    }

    /// Last generated layout
    pub fn layout(&self) -> &StackLayout {
        &self.layout
    }

    /// Last accepted configuration
    pub fn config(&self) -> Option<&StackConfig> {
        self.config.as_ref()
    }

    /// Whether `configure` has succeeded at least once
    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }
}
