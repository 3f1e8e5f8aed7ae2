//! Host-side generator cache.
//!
//! A host asks for the stack of a generator node on every scene evaluation.
//! [`StackGenerator`] keeps the last assembled geometry and only rebuilds it
//! when something that shapes the output changed: the settings, the curve or
//! its revision, the template or its revision, or the generator transform.

use glam::{Mat4, Vec3};
use stack_config::StackSettings;
use tracing::{debug, trace, warn};

use crate::assembly::{StackGeometry, TemplateNode, build_stack_geometry};
use crate::builder::StackBuilder;
use crate::curve::CurveRef;
use crate::types::StackConfig;
use crate::validation::StackError;

/// Outcome of [`StackGenerator::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The geometry was assembled again
    Rebuilt,
    /// The cached geometry was still valid
    Cached,
}

/// Everything a host passes in to evaluate one generator node
#[derive(Debug)]
pub struct StackRequest<'a, T: ?Sized> {
    /// Persisted attributes of the generator
    pub settings: &'a StackSettings,
    /// Linked curve, if any
    pub curve: Option<CurveRef>,
    /// Node to stack (the generator's first child), if any
    pub template: Option<&'a T>,
    /// Counter the host bumps whenever the template changes
    pub template_revision: u64,
    /// Global transform of the generator node
    pub generator_transform: Mat4,
}

impl<'a, T: ?Sized> StackRequest<'a, T> {
    /// Request for a straight stack at the origin
    pub fn new(settings: &'a StackSettings, template: Option<&'a T>) -> Self {
        Self {
            settings,
            curve: None,
            template,
            template_revision: 0,
            generator_transform: Mat4::IDENTITY,
        }
    }
}

/// What the cached geometry was built from
#[derive(Debug, Clone, PartialEq)]
struct CacheKey {
    config: StackConfig,
    curve_revision: Option<u64>,
    template_address: usize,
    template_revision: u64,
    generator_transform: Mat4,
    render_instances: bool,
}

/// Stack generator with a result cache, one per host node
#[derive(Debug)]
pub struct StackGenerator<D> {
    builder: StackBuilder,
    cached: Option<(CacheKey, StackGeometry<D>)>,
}

impl<D> Default for StackGenerator<D> {
    fn default() -> Self {
        Self {
            builder: StackBuilder::new(),
            cached: None,
        }
    }
}

impl<D> StackGenerator<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator with a custom builder (e.g. a different arc-length sampling)
    pub fn with_builder(builder: StackBuilder) -> Self {
        Self {
            builder,
            cached: None,
        }
    }

    /// The layout builder behind this generator
    pub fn builder(&self) -> &StackBuilder {
        &self.builder
    }

    /// Last successfully assembled geometry
    pub fn cached(&self) -> Option<&StackGeometry<D>> {
        self.cached.as_ref().map(|(_, geometry)| geometry)
    }

    /// Drop the cached geometry so the next update rebuilds
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Return the stack for `request`, rebuilding it if anything changed.
    ///
    /// Settings are validated first, so a row count above the base count is
    /// clamped rather than rejected. On failure the previous geometry stays
    /// cached.
    pub fn update<T>(
        &mut self,
        request: &StackRequest<'_, T>,
    ) -> Result<(UpdateStatus, &StackGeometry<D>), StackError>
    where
        T: TemplateNode<Duplicate = D> + ?Sized,
    {
        let Some(template) = request.template else {
            warn!("StackGenerator::update: no template child");
            return Err(StackError::NoTemplate);
        };

        let settings = request.settings.validated();
        let key = CacheKey {
            config: StackConfig::from_settings(&settings, request.curve.clone()),
            curve_revision: request.curve.as_ref().map(|curve| curve.revision()),
            template_address: std::ptr::from_ref(template).cast::<()>() as usize,
            template_revision: request.template_revision,
            generator_transform: request.generator_transform,
            render_instances: settings.render_instances,
        };

        let (status, entry) = match self.cached.take() {
            Some((cached, geometry)) if cached == key => {
                trace!("StackGenerator::update: cache hit");
                (UpdateStatus::Cached, (cached, geometry))
            }
            previous => match self.rebuild(key, template) {
                Ok(entry) => (UpdateStatus::Rebuilt, entry),
                Err(err) => {
                    self.cached = previous;
                    return Err(err);
                }
            },
        };

        let (_, geometry) = self.cached.insert(entry);
        Ok((status, geometry))
    }

    fn rebuild<T>(
        &mut self,
        key: CacheKey,
        template: &T,
    ) -> Result<(CacheKey, StackGeometry<D>), StackError>
    where
        T: TemplateNode<Duplicate = D> + ?Sized,
    {
        self.builder.configure(&key.config)?;
        let layout = self.builder.generate()?;
        let geometry = build_stack_geometry(
            layout,
            template,
            key.generator_transform,
            key.render_instances,
        )?;

        debug!(
            "StackGenerator::update: rebuilt {} items ({} duplicates)",
            geometry.len(),
            geometry.duplicate_count()
        );
        Ok((key, geometry))
    }
}

/// Set the row height of `settings` from the template's vertical size.
///
/// Returns false when the template reports no bounding radius.
pub fn fit_row_height<T: TemplateNode + ?Sized>(settings: &mut StackSettings, template: &T) -> bool {
    let radius: Vec3 = template.bounding_radius();
    let changed = settings.fit_row_height(radius.y);
    if changed {
        debug!("fit_row_height: row height set to {}", settings.row_height);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use crate::assembly::{ItemPayload, TemplateKind};
    use crate::curve::{Curve, PolylineCurve};

    #[derive(Debug)]
    struct Can {
        radius: Vec3,
    }

    impl TemplateNode for Can {
        type Duplicate = String;

        fn name(&self) -> &str {
            "Can"
        }

        fn kind(&self) -> TemplateKind<'_, Self> {
            TemplateKind::Geometry
        }

        fn duplicate(&self) -> Option<String> {
            Some("can mesh".to_string())
        }

        fn bounding_radius(&self) -> Vec3 {
            self.radius
        }
    }

    /// Straight line along +X whose revision can be bumped in place
    #[derive(Debug)]
    struct EditableLine {
        line: PolylineCurve,
        revision: AtomicU64,
    }

    impl Curve for EditableLine {
        fn global_transform(&self) -> Mat4 {
            self.line.global_transform()
        }

        fn sample_point(&self, t: f32) -> Vec3 {
            self.line.sample_point(t)
        }

        fn sample_tangent(&self, t: f32) -> Vec3 {
            self.line.sample_tangent(t)
        }

        fn revision(&self) -> u64 {
            self.revision.load(Ordering::Relaxed)
        }
    }

    fn can() -> Can {
        Can { radius: Vec3::ZERO }
    }

    #[test]
    fn test_missing_template() {
        let settings = StackSettings::default();
        let mut generator = StackGenerator::<String>::new();
        let request = StackRequest::<Can>::new(&settings, None);

        assert_eq!(generator.update(&request).err(), Some(StackError::NoTemplate));
        assert!(generator.cached().is_none());
    }

    #[test]
    fn test_second_update_is_cached() {
        let settings = StackSettings::new(4, 4);
        let template = can();
        let mut generator = StackGenerator::new();
        let request = StackRequest::new(&settings, Some(&template));

        let (status, geometry) = generator.update(&request).unwrap();
        assert_eq!(status, UpdateStatus::Rebuilt);
        assert_eq!(geometry.len(), 10);
        let first = geometry.clone();

        let (status, geometry) = generator.update(&request).unwrap();
        assert_eq!(status, UpdateStatus::Cached);
        assert_eq!(geometry, &first);
    }

    #[test]
    fn test_settings_change_rebuilds() {
        let template = can();
        let mut generator = StackGenerator::new();

        let settings = StackSettings::new(3, 3);
        generator
            .update(&StackRequest::new(&settings, Some(&template)))
            .unwrap();

        let settings = StackSettings {
            render_instances: false,
            ..settings
        };
        let (status, geometry) = generator
            .update(&StackRequest::new(&settings, Some(&template)))
            .unwrap();
        assert_eq!(status, UpdateStatus::Rebuilt);
        assert_eq!(geometry.duplicate_count(), 6);
    }

    #[test]
    fn test_rows_are_clamped_not_rejected() {
        let settings = StackSettings::new(2, 7);
        let template = can();
        let mut generator = StackGenerator::new();

        let (_, geometry) = generator
            .update(&StackRequest::new(&settings, Some(&template)))
            .unwrap();
        assert_eq!(geometry.len(), 3);
        assert_eq!(generator.builder().layout().row_count(), 2);
    }

    #[test]
    fn test_template_revision_rebuilds() {
        let settings = StackSettings::default();
        let template = can();
        let mut generator = StackGenerator::new();

        let mut request = StackRequest::new(&settings, Some(&template));
        generator.update(&request).unwrap();

        request.template_revision = 1;
        let (status, _) = generator.update(&request).unwrap();
        assert_eq!(status, UpdateStatus::Rebuilt);
    }

    #[test]
    fn test_curve_revision_rebuilds() {
        let settings = StackSettings::new(3, 1);
        let template = can();
        let curve = Arc::new(EditableLine {
            line: PolylineCurve::new(vec![Vec3::ZERO, Vec3::new(30.0, 0.0, 0.0)]),
            revision: AtomicU64::new(0),
        });
        let handle: CurveRef = curve.clone();
        let mut generator = StackGenerator::new();

        let request = StackRequest {
            curve: Some(handle),
            ..StackRequest::new(&settings, Some(&template))
        };
        generator.update(&request).unwrap();
        assert_eq!(generator.update(&request).unwrap().0, UpdateStatus::Cached);

        curve.revision.store(1, Ordering::Relaxed);
        assert_eq!(generator.update(&request).unwrap().0, UpdateStatus::Rebuilt);
    }

    #[test]
    fn test_generator_transform_moves_curve_stack() {
        let settings = StackSettings::new(2, 1);
        let template = can();
        let curve: CurveRef = Arc::new(PolylineCurve::new(vec![
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 0.0),
        ]));
        let mut generator = StackGenerator::new();

        let mut request = StackRequest {
            curve: Some(curve),
            ..StackRequest::new(&settings, Some(&template))
        };
        generator.update(&request).unwrap();

        request.generator_transform = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let (status, geometry) = generator.update(&request).unwrap();
        assert_eq!(status, UpdateStatus::Rebuilt);

        // Curve stays put in global space, so the items move the other way
        let first = geometry.children[0].local_transform.w_axis;
        assert!((first.x + 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_failed_update_keeps_cache() {
        let template = can();
        let mut generator = StackGenerator::new();

        let settings = StackSettings::new(3, 2);
        let request = StackRequest::new(&settings, Some(&template));
        generator.update(&request).unwrap();

        let broken = StackSettings::new(0, 2);
        let result = generator.update(&StackRequest::new(&broken, Some(&template)));
        assert_eq!(result.err(), Some(StackError::InvalidConfig { base_count: 0 }));

        let cached = generator.cached().unwrap();
        assert_eq!(cached.len(), 5);
        assert_eq!(
            cached.primary().map(|c| &c.payload),
            Some(&ItemPayload::Duplicate("can mesh".to_string()))
        );

        // The kept entry still answers its own request
        let (status, geometry) = generator.update(&request).unwrap();
        assert_eq!(status, UpdateStatus::Cached);
        assert_eq!(geometry.len(), 5);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let settings = StackSettings::default();
        let template = can();
        let mut generator = StackGenerator::new();
        let request = StackRequest::new(&settings, Some(&template));

        generator.update(&request).unwrap();
        generator.invalidate();
        assert!(generator.cached().is_none());
        assert_eq!(generator.update(&request).unwrap().0, UpdateStatus::Rebuilt);
    }

    #[test]
    fn test_fit_row_height() {
        let mut settings = StackSettings::default();

        assert!(!fit_row_height(&mut settings, &can()));
        assert_eq!(settings.row_height, stack_config::DEFAULT_ROW_HEIGHT);

        let tall = Can {
            radius: Vec3::new(4.0, 7.5, 4.0),
        };
        assert!(fit_row_height(&mut settings, &tall));
        assert_eq!(settings.row_height, 15.0);
    }
}
