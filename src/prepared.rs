//! Prepared-geometry cache: a per-wrapper acceleration structure for
//! repeated predicate evaluation.
//!
//! The accelerator caches the owner's bounding rectangle and an R-tree of
//! its boundary segments. `intersects` resolves entirely through the
//! cache when possible; the remaining predicates use the cached bounds to
//! reject disjoint operands before falling back to the full provider
//! algorithm.

use crate::context::{GeometryKind, NativeGeom};
use crate::handle::NativeHandle;
use geo::{
    BoundingRect, CoordsIter, Geometry as GeoGeometry, Intersects, LinesIter, Point, Rect, coord,
};
use rstar::primitives::Line as IndexedLine;
use rstar::{AABB, RTree};

/// Acceleration structure built from one native handle.
///
/// Owned exclusively by the wrapper whose handle it was built from, and
/// torn down with it. Never shared, never rebuilt implicitly.
pub struct PreparedGeometry {
    kind: GeometryKind,
    bounds: Option<Rect<f64>>,
    edges: RTree<IndexedLine<[f64; 2]>>,
}

impl PreparedGeometry {
    /// Builds the accelerator from the handle's current record.
    ///
    /// Returns `None` when the geometry kind has no boundary segments to
    /// index (points, empty geometries, mixed collections). The caller
    /// treats that as "unprepared" and keeps using the unaccelerated
    /// path.
    pub(crate) fn build(handle: &NativeHandle) -> Option<PreparedGeometry> {
        let native = handle.geom().ok()?;
        let segments = collect_segments(&native)?;
        if segments.is_empty() {
            log::trace!("prepare skipped: {} has no segments", native.kind.name());
            return None;
        }
        let bounds = native.geom.bounding_rect();
        log::debug!(
            "prepared {} with {} indexed segments",
            native.kind.name(),
            segments.len()
        );
        Some(PreparedGeometry {
            kind: native.kind,
            bounds,
            edges: RTree::bulk_load(segments),
        })
    }

    /// Whether the operand's envelope overlaps the cached bounds.
    /// `true` means "cannot rule out interaction".
    pub(crate) fn may_interact(&self, other: &GeoGeometry<f64>) -> bool {
        match (self.bounds, other.bounding_rect()) {
            (Some(a), Some(b)) => rects_overlap(&a, &b),
            _ => true,
        }
    }

    /// Accelerated intersection test against `other`.
    ///
    /// `own` is the geometry this cache was built from; it is consulted
    /// only on the interior-containment fallback. Returns `None` when the
    /// cache cannot decide and the caller must run the full algorithm.
    pub(crate) fn intersects(
        &self,
        own: &GeoGeometry<f64>,
        other: &GeoGeometry<f64>,
    ) -> Option<bool> {
        let other_bounds = other.bounding_rect()?;
        if let Some(bounds) = self.bounds {
            if !rects_overlap(&bounds, &other_bounds) {
                return Some(false);
            }
        }

        let envelope = AABB::from_corners(
            [other_bounds.min().x, other_bounds.min().y],
            [other_bounds.max().x, other_bounds.max().y],
        );
        for segment in self.edges.locate_in_envelope_intersecting(&envelope) {
            let line = geo::Line::new(
                coord! { x: segment.from[0], y: segment.from[1] },
                coord! { x: segment.to[0], y: segment.to[1] },
            );
            if line.intersects(other) {
                return Some(true);
            }
        }

        // No boundary contact. For areal geometries the operand is either
        // entirely inside or entirely outside; one representative point
        // settles it. Lower-dimensional geometries interact only through
        // their segments.
        match self.kind {
            GeometryKind::Polygon | GeometryKind::MultiPolygon => {
                let point = other.coords_iter().next().map(Point::from)?;
                Some(own.intersects(&point))
            }
            _ => Some(false),
        }
    }
}

impl std::fmt::Debug for PreparedGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedGeometry")
            .field("kind", &self.kind)
            .field("bounds", &self.bounds)
            .field("segments", &self.edges.size())
            .finish()
    }
}

fn rects_overlap(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x && a.min().y <= b.max().y && b.min().y <= a.max().y
}

fn collect_segments(native: &NativeGeom) -> Option<Vec<IndexedLine<[f64; 2]>>> {
    let lines: Vec<geo::Line<f64>> = match (&native.kind, &native.geom) {
        (GeometryKind::LineString | GeometryKind::LinearRing, GeoGeometry::LineString(ls)) => {
            ls.lines_iter().collect()
        }
        (GeometryKind::Polygon, GeoGeometry::Polygon(poly)) => poly.lines_iter().collect(),
        (GeometryKind::MultiLineString, GeoGeometry::MultiLineString(mls)) => {
            mls.lines_iter().collect()
        }
        (GeometryKind::MultiPolygon, GeoGeometry::MultiPolygon(mp)) => mp.lines_iter().collect(),
        _ => return None,
    };
    Some(
        lines
            .into_iter()
            .map(|line| {
                IndexedLine::new(
                    [line.start.x, line.start.y],
                    [line.end.x, line.end.y],
                )
            })
            .collect(),
    )
}
