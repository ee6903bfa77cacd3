//! Native geometry context: the arena that owns every native geometry record.
//!
//! A [`NativeContext`] models the foreign memory region of the underlying
//! geometry provider. Geometry data lives in numbered slots; wrappers hold
//! [`crate::NativeHandle`] guards that release their slot on drop. The
//! context also carries the provider capability flags and live-handle
//! accounting used to verify that failure paths release everything they
//! acquired.

use crate::error::{GeoforgeError, Result};
use geo::Geometry as GeoGeometry;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Version of the provider interface the context delegates to, in
/// `<major>.<minor>[.<patch>]` form.
pub const NATIVE_VERSION: &str = "0.31.0";

/// Returns the native provider version string.
pub fn native_version() -> &'static str {
    NATIVE_VERSION
}

/// Kind tag for a native geometry record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    LineString,
    LinearRing,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    Collection,
}

impl GeometryKind {
    /// Lowercase name of the kind, e.g. `"linear_ring"`.
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::LineString => "line_string",
            GeometryKind::LinearRing => "linear_ring",
            GeometryKind::Polygon => "polygon",
            GeometryKind::MultiPoint => "multi_point",
            GeometryKind::MultiLineString => "multi_line_string",
            GeometryKind::MultiPolygon => "multi_polygon",
            GeometryKind::Collection => "collection",
        }
    }
}

/// Optional operations the native provider may or may not support.
///
/// Contexts constructed with a capability disabled answer the matching
/// capability query with `false`, and the gated operations return `None`
/// instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Whether `unary_union` is available.
    pub unary_union: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities { unary_union: true }
    }
}

/// One native geometry record: the provider value plus its kind tag.
///
/// The kind tag is not always derivable from the provider representation
/// (linear rings share the provider's line string type), so it is stored
/// alongside the value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NativeGeom {
    pub kind: GeometryKind,
    pub geom: GeoGeometry<f64>,
}

impl NativeGeom {
    /// Canonicalizes a provider value into a record, normalizing the
    /// provider's shorthand types (lines, rectangles, triangles) to
    /// their standard representations.
    pub(crate) fn from_geo(geom: GeoGeometry<f64>) -> Self {
        let kind = match &geom {
            GeoGeometry::Point(_) => GeometryKind::Point,
            GeoGeometry::Line(_) | GeoGeometry::LineString(_) => GeometryKind::LineString,
            GeoGeometry::Polygon(_) | GeoGeometry::Rect(_) | GeoGeometry::Triangle(_) => {
                GeometryKind::Polygon
            }
            GeoGeometry::MultiPoint(_) => GeometryKind::MultiPoint,
            GeoGeometry::MultiLineString(_) => GeometryKind::MultiLineString,
            GeoGeometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
            GeoGeometry::GeometryCollection(_) => GeometryKind::Collection,
        };
        let geom = match geom {
            GeoGeometry::Line(line) => {
                GeoGeometry::LineString(geo::LineString::from(vec![line.start, line.end]))
            }
            GeoGeometry::Rect(rect) => GeoGeometry::Polygon(rect.to_polygon()),
            GeoGeometry::Triangle(triangle) => GeoGeometry::Polygon(triangle.to_polygon()),
            other => other,
        };
        NativeGeom { kind, geom }
    }
}

/// Identifier of a slot inside a [`NativeContext`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) usize);

struct SlotArena {
    slots: Vec<Option<NativeGeom>>,
    free: Vec<usize>,
    live: usize,
}

impl SlotArena {
    fn new() -> Self {
        SlotArena {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

/// Arena owning native geometry records.
///
/// Most callers share the process-wide context returned by
/// [`NativeContext::shared`]; isolated contexts exist for capability
/// testing and resource accounting. Two geometries from different
/// contexts can still be combined: the dispatch layer normalizes the
/// foreign operand into the receiver's context first.
pub struct NativeContext {
    id: Uuid,
    capabilities: Capabilities,
    arena: RwLock<SlotArena>,
}

static SHARED_CONTEXT: Lazy<Arc<NativeContext>> =
    Lazy::new(|| Arc::new(NativeContext::new(Capabilities::default())));

impl NativeContext {
    fn new(capabilities: Capabilities) -> Self {
        NativeContext {
            id: Uuid::new_v4(),
            capabilities,
            arena: RwLock::new(SlotArena::new()),
        }
    }

    /// The process-wide context used by factories unless told otherwise.
    pub fn shared() -> Arc<NativeContext> {
        Arc::clone(&SHARED_CONTEXT)
    }

    /// A fresh context with default capabilities and its own arena.
    pub fn isolated() -> Arc<NativeContext> {
        Arc::new(NativeContext::new(Capabilities::default()))
    }

    /// A fresh context with the given capability flags.
    pub fn with_capabilities(capabilities: Capabilities) -> Arc<NativeContext> {
        Arc::new(NativeContext::new(capabilities))
    }

    /// Unique identifier of this context.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Capability flags of the provider behind this context.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Number of currently live native records.
    ///
    /// Construction-failure tests assert that this returns to its
    /// baseline once every handle acquired along the failure path has
    /// been released.
    pub fn live_handles(&self) -> usize {
        self.arena.read().live
    }

    pub(crate) fn alloc(&self, geom: NativeGeom) -> SlotId {
        let mut arena = self.arena.write();
        arena.live += 1;
        let index = match arena.free.pop() {
            Some(index) => {
                arena.slots[index] = Some(geom);
                index
            }
            None => {
                arena.slots.push(Some(geom));
                arena.slots.len() - 1
            }
        };
        log::trace!("context {}: allocated slot {}", self.id, index);
        SlotId(index)
    }

    pub(crate) fn release(&self, slot: SlotId) {
        let mut arena = self.arena.write();
        if let Some(entry) = arena.slots.get_mut(slot.0) {
            if entry.take().is_some() {
                arena.free.push(slot.0);
                arena.live -= 1;
                log::trace!("context {}: released slot {}", self.id, slot.0);
            }
        }
    }

    /// Deep-copies the record in `slot` into a fresh, independent slot.
    pub(crate) fn clone_slot(&self, slot: SlotId) -> Result<SlotId> {
        let geom = self.geom_of(slot)?;
        Ok(self.alloc(geom))
    }

    pub(crate) fn kind_of(&self, slot: SlotId) -> Result<GeometryKind> {
        let arena = self.arena.read();
        arena
            .slots
            .get(slot.0)
            .and_then(|entry| entry.as_ref())
            .map(|geom| geom.kind)
            .ok_or(GeoforgeError::HandleReleased)
    }

    /// Clones the record out of the arena. Reads never hold the lock
    /// across provider calls.
    pub(crate) fn geom_of(&self, slot: SlotId) -> Result<NativeGeom> {
        let arena = self.arena.read();
        arena
            .slots
            .get(slot.0)
            .and_then(|entry| entry.as_ref())
            .cloned()
            .ok_or(GeoforgeError::HandleReleased)
    }
}

impl std::fmt::Debug for NativeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeContext")
            .field("id", &self.id)
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    fn point_geom(x: f64, y: f64) -> NativeGeom {
        NativeGeom {
            kind: GeometryKind::Point,
            geom: GeoGeometry::Point(Point::new(x, y)),
        }
    }

    #[test]
    fn test_alloc_release_accounting() {
        let ctx = NativeContext::isolated();
        assert_eq!(ctx.live_handles(), 0);

        let a = ctx.alloc(point_geom(1.0, 2.0));
        let b = ctx.alloc(point_geom(3.0, 4.0));
        assert_eq!(ctx.live_handles(), 2);

        ctx.release(a);
        assert_eq!(ctx.live_handles(), 1);

        // Double release is a no-op.
        ctx.release(a);
        assert_eq!(ctx.live_handles(), 1);

        ctx.release(b);
        assert_eq!(ctx.live_handles(), 0);
    }

    #[test]
    fn test_slot_reuse() {
        let ctx = NativeContext::isolated();
        let a = ctx.alloc(point_geom(1.0, 2.0));
        ctx.release(a);
        let b = ctx.alloc(point_geom(5.0, 6.0));
        assert_eq!(a, b);
        assert_eq!(ctx.live_handles(), 1);
    }

    #[test]
    fn test_clone_slot_is_independent() {
        let ctx = NativeContext::isolated();
        let a = ctx.alloc(point_geom(1.0, 2.0));
        let b = ctx.clone_slot(a).unwrap();
        assert_ne!(a, b);

        ctx.release(a);
        let cloned = ctx.geom_of(b).unwrap();
        assert_eq!(cloned.kind, GeometryKind::Point);
    }

    #[test]
    fn test_released_slot_access_fails() {
        let ctx = NativeContext::isolated();
        let a = ctx.alloc(point_geom(1.0, 2.0));
        ctx.release(a);
        assert!(matches!(ctx.geom_of(a), Err(GeoforgeError::HandleReleased)));
    }

    #[test]
    fn test_version_pattern() {
        let version = native_version();
        let mut parts = version.split('.');
        assert!(parts.next().unwrap().parse::<u32>().is_ok());
        assert!(parts.next().unwrap().parse::<u32>().is_ok());
    }

    #[test]
    fn test_contexts_have_distinct_ids() {
        let a = NativeContext::isolated();
        let b = NativeContext::isolated();
        assert_ne!(a.id(), b.id());
    }
}
