//! Geometry assembly: turn a layout into positioned output nodes.
//!
//! The first item is always a full duplicate of the template. With
//! instancing enabled every later item only references that first duplicate,
//! which keeps heavy templates cheap to stack.

use glam::{Mat4, Vec3};
use tracing::debug;

use crate::constants::STACK_NODE_NAME;
use crate::types::{StackCell, StackLayout, TransformSpace};
use crate::validation::StackError;

/// What a template node is
#[derive(Debug)]
pub enum TemplateKind<'a, T: ?Sized> {
    /// A node that can be duplicated as is
    Geometry,
    /// A lightweight instance of another node (None if its link is broken)
    Instance(Option<&'a T>),
}

/// A host node that can serve as the item of a stack
pub trait TemplateNode {
    /// Full copy of the node, as produced by [`TemplateNode::duplicate`]
    type Duplicate;

    /// Name used for the generated items
    fn name(&self) -> &str;

    /// Whether this node is an instance wrapper, and of what
    fn kind(&self) -> TemplateKind<'_, Self>;

    /// Create a full copy of this node. None if the copy cannot be made.
    fn duplicate(&self) -> Option<Self::Duplicate>;

    /// Bounding box radius of the node, zero if unknown
    fn bounding_radius(&self) -> Vec3 {
        Vec3::ZERO
    }
}

/// Content of one generated item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPayload<D> {
    /// A full copy of the template
    Duplicate(D),
    /// A lightweight instance of the child at index `primary`
    Instance { primary: usize },
}

/// One generated item
#[derive(Debug, Clone, PartialEq)]
pub struct StackItemNode<D> {
    pub name: String,
    /// Grid cell the item came from
    pub cell: StackCell,
    /// Transform relative to the generator
    pub local_transform: Mat4,
    pub payload: ItemPayload<D>,
}

/// Parent node holding all generated items in layout order
#[derive(Debug, Clone, PartialEq)]
pub struct StackGeometry<D> {
    pub name: String,
    pub children: Vec<StackItemNode<D>>,
}

impl<D> StackGeometry<D> {
    /// Number of items
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether no items were generated
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The first item, which is always a full duplicate
    pub fn primary(&self) -> Option<&StackItemNode<D>> {
        self.children.first()
    }

    /// Number of items carrying a full duplicate
    pub fn duplicate_count(&self) -> usize {
        self.children
            .iter()
            .filter(|c| matches!(c.payload, ItemPayload::Duplicate(_)))
            .count()
    }

    /// Number of items that are lightweight instances
    pub fn instance_count(&self) -> usize {
        self.len() - self.duplicate_count()
    }
}

/// Find the node to duplicate: the template itself, or the node it instances
pub fn resolve_template<T: TemplateNode + ?Sized>(template: &T) -> Result<&T, StackError> {
    match template.kind() {
        TemplateKind::Geometry => Ok(template),
        TemplateKind::Instance(Some(target)) => Ok(target),
        TemplateKind::Instance(None) => Err(StackError::NoTemplate),
    }
}

/// Assemble the output nodes of a layout.
///
/// `generator_transform` is the generator's global transform. Curve layouts
/// are stored in global space and are brought into generator space with its
/// inverse; straight layouts are used as they are. Fails as a whole if any
/// duplicate cannot be made.
pub fn build_stack_geometry<T: TemplateNode + ?Sized>(
    layout: &StackLayout,
    template: &T,
    generator_transform: Mat4,
    use_instances: bool,
) -> Result<StackGeometry<T::Duplicate>, StackError> {
    let source = resolve_template(template)?;

    let to_local = match layout.space() {
        TransformSpace::Local => None,
        TransformSpace::Global => Some(invert(generator_transform)?),
    };

    let mut children = Vec::new();
    children
        .try_reserve_exact(layout.item_count())
        .map_err(|_| StackError::AllocationFailed { index: 0 })?;

    for (index, (cell, transform)) in layout.iter().enumerate() {
        let payload = if use_instances && index > 0 {
            ItemPayload::Instance { primary: 0 }
        } else {
            let duplicate = source
                .duplicate()
                .ok_or(StackError::AllocationFailed { index })?;
            ItemPayload::Duplicate(duplicate)
        };

        let local_transform = match to_local {
            Some(inverse) => inverse * *transform,
            None => *transform,
        };

        children.push(StackItemNode {
            name: format!("{} {}", source.name(), index),
            cell,
            local_transform,
            payload,
        });
    }

    debug!(
        "build_stack_geometry: {} items from '{}', instances={}, space={:?}",
        children.len(),
        source.name(),
        use_instances,
        layout.space()
    );

    Ok(StackGeometry {
        name: STACK_NODE_NAME.to_string(),
        children,
    })
}

fn invert(transform: Mat4) -> Result<Mat4, StackError> {
    let determinant = transform.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        return Err(StackError::SingularTransform);
    }
    Ok(transform.inverse())
}
