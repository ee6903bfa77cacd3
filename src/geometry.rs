//! Geometry wrapper: type-agnostic operations over one native handle.
//!
//! A [`Geometry`] is created by a [`Factory`] either initialized (handle
//! attached) or uninitialized. Uninitialized wrappers answer every
//! type/topology query with `None`/`false`: an empty-but-valid state,
//! not an error. Initialized wrappers are immutable apart from
//! preparation, which attaches a cache entry.
//!
//! Binary predicates and operations validate their argument through the
//! foreign-object guard before any native evaluation; rejected arguments
//! surface as [`GeoforgeError::Cast`](crate::GeoforgeError::Cast) and
//! leave the wrapper untouched.

use crate::config::AutoPrepare;
use crate::context::{GeometryKind, NativeGeom};
use crate::error::Result;
use crate::factory::Factory;
use crate::guard::{self, GeometryLike, NativeRef, Operand};
use crate::handle::NativeHandle;
use crate::prepared::PreparedGeometry;
use bytes::Bytes;
use geo::{
    BooleanOps, Contains, Distance, Euclidean, Geometry as GeoGeometry, HasDimensions, Intersects,
    MultiPoint, MultiPolygon, Point, Polygon, Relate, Within,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// A geometry backed by at most one native handle.
pub struct Geometry {
    factory: Factory,
    state: Option<GeomState>,
}

struct GeomState {
    // Field order is load-bearing: the cache entry built from the handle
    // must be torn down before the handle releases its slot.
    prepared: Mutex<PreparedSlot>,
    handle: NativeHandle,
}

#[derive(Default)]
struct PreparedSlot {
    cache: Option<PreparedGeometry>,
    predicate_calls: u32,
}

enum BooleanOp {
    Union,
    Intersection,
    Difference,
    SymDifference,
}

impl Geometry {
    pub(crate) fn uninitialized(factory: Factory) -> Self {
        Geometry {
            factory,
            state: None,
        }
    }

    pub(crate) fn from_handle(factory: Factory, handle: NativeHandle) -> Self {
        Geometry {
            factory,
            state: Some(GeomState {
                prepared: Mutex::new(PreparedSlot::default()),
                handle,
            }),
        }
    }

    /// Whether a native handle is attached.
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Kind tag, or `None` for an uninitialized wrapper.
    pub fn geometry_type(&self) -> Option<GeometryKind> {
        self.state.as_ref().map(|state| state.handle.kind())
    }

    /// Whether the geometry is the empty set; `None` when uninitialized.
    pub fn is_empty(&self) -> Option<bool> {
        let state = self.state.as_ref()?;
        let own = state.handle.geom().ok()?;
        Some(own.geom.is_empty())
    }

    /// Spatial reference identifier inherited from the factory.
    pub fn srid(&self) -> i32 {
        self.factory.srid()
    }

    /// The factory this geometry was created by.
    pub fn factory(&self) -> &Factory {
        &self.factory
    }

    /// Whether a live prepared-cache entry exists.
    pub fn is_prepared(&self) -> bool {
        self.state
            .as_ref()
            .map(|state| state.prepared.lock().cache.is_some())
            .unwrap_or(false)
    }

    /// Builds the prepared cache from the current handle, replacing any
    /// existing entry. Idempotent; returns whether a cache entry is live
    /// afterwards (building fails softly for unsupported kinds).
    pub fn prepare(&self) -> bool {
        let Some(state) = self.state.as_ref() else {
            return false;
        };
        let mut slot = state.prepared.lock();
        slot.cache = PreparedGeometry::build(&state.handle);
        slot.cache.is_some()
    }

    /// Deep copy: fresh handle, unprepared, call counter reset.
    pub fn try_clone(&self) -> Result<Geometry> {
        match self.state.as_ref() {
            None => Ok(Geometry::uninitialized(self.factory.clone())),
            Some(state) => {
                let handle = state.handle.try_clone()?;
                Ok(Geometry::from_handle(self.factory.clone(), handle))
            }
        }
    }

    /// WKT form, or `None` when uninitialized.
    pub fn as_text(&self) -> Result<Option<String>> {
        let Some(state) = self.state.as_ref() else {
            return Ok(None);
        };
        let own = state.handle.geom()?;
        Ok(Some(self.factory.wkt_generator().generate(&own.geom)?))
    }

    /// WKB form, or `None` when uninitialized.
    pub fn as_binary(&self) -> Result<Option<Bytes>> {
        let Some(state) = self.state.as_ref() else {
            return Ok(None);
        };
        let own = state.handle.geom()?;
        Ok(Some(Bytes::from(
            self.factory.wkb_generator().generate(&own.geom)?,
        )))
    }

    /// Strict structural equality: same kind, same coordinate sequences.
    ///
    /// Distinguishes representations even when they are topologically
    /// equivalent: an empty collection and an empty line string compare
    /// unequal here. Foreign objects compare unequal rather than
    /// erroring. Self-comparison is always `true`, including for invalid
    /// geometries.
    pub fn equals_exact(&self, other: &dyn GeometryLike) -> bool {
        let Some(state) = self.state.as_ref() else {
            return false;
        };
        let Some(nref) = other.native_ref() else {
            return false;
        };
        if nref.context_id() == state.handle.context_id() && nref.slot() == state.handle.slot() {
            return true;
        }
        if nref.kind() != state.handle.kind() {
            return false;
        }
        let (Ok(own), Ok(arg)) = (state.handle.geom(), nref.context().geom_of(nref.slot())) else {
            return false;
        };
        own == arg
    }

    /// Topological (point-set) equality via the native evaluator.
    ///
    /// Empty geometries of any kinds are equal. Self-identity
    /// short-circuits before native evaluation, so invalid geometries
    /// still equal themselves.
    pub fn equals_topologically(&self, other: &dyn GeometryLike) -> Result<bool> {
        let Some(state) = self.state.as_ref() else {
            return Ok(false);
        };
        let operand = guard::resolve(self.factory.context(), other)?;
        self.note_predicate_call(state);
        if operand.is_borrowed() && operand.slot() == state.handle.slot() {
            return Ok(true);
        }
        let own = state.handle.geom()?;
        let arg = self.operand_geom(&operand)?;
        match (own.geom.is_empty(), arg.geom.is_empty()) {
            (true, true) => Ok(true),
            (true, false) | (false, true) => Ok(false),
            (false, false) => Ok(own.geom.relate(&arg.geom).is_equal_topo()),
        }
    }

    /// Whether this geometry shares any point with `other`.
    pub fn intersects(&self, other: &dyn GeometryLike) -> Result<bool> {
        let Some(state) = self.state.as_ref() else {
            return Ok(false);
        };
        let operand = guard::resolve(self.factory.context(), other)?;
        self.note_predicate_call(state);
        let own = state.handle.geom()?;
        let arg = self.operand_geom(&operand)?;
        Ok(self.eval_intersects(state, &own, &arg))
    }

    /// Whether this geometry shares no point with `other`.
    pub fn disjoint(&self, other: &dyn GeometryLike) -> Result<bool> {
        let Some(state) = self.state.as_ref() else {
            return Ok(false);
        };
        let operand = guard::resolve(self.factory.context(), other)?;
        self.note_predicate_call(state);
        let own = state.handle.geom()?;
        let arg = self.operand_geom(&operand)?;
        Ok(!self.eval_intersects(state, &own, &arg))
    }

    /// Whether `other` lies in this geometry's interior.
    pub fn contains(&self, other: &dyn GeometryLike) -> Result<bool> {
        let Some(state) = self.state.as_ref() else {
            return Ok(false);
        };
        let operand = guard::resolve(self.factory.context(), other)?;
        self.note_predicate_call(state);
        let own = state.handle.geom()?;
        let arg = self.operand_geom(&operand)?;
        if !self.may_interact(state, &arg.geom) {
            return Ok(false);
        }
        Ok(own.geom.contains(&arg.geom))
    }

    /// Whether this geometry lies in the interior of `other`.
    pub fn within(&self, other: &dyn GeometryLike) -> Result<bool> {
        let Some(state) = self.state.as_ref() else {
            return Ok(false);
        };
        let operand = guard::resolve(self.factory.context(), other)?;
        self.note_predicate_call(state);
        let own = state.handle.geom()?;
        let arg = self.operand_geom(&operand)?;
        if !self.may_interact(state, &arg.geom) {
            return Ok(false);
        }
        Ok(own.geom.is_within(&arg.geom))
    }

    /// Euclidean distance to `other`; `None` when either side is
    /// uninitialized or empty.
    pub fn distance(&self, other: &dyn GeometryLike) -> Result<Option<f64>> {
        let Some(state) = self.state.as_ref() else {
            return Ok(None);
        };
        let operand = guard::resolve(self.factory.context(), other)?;
        let own = state.handle.geom()?;
        let arg = self.operand_geom(&operand)?;
        if own.geom.is_empty() || arg.geom.is_empty() {
            return Ok(None);
        }
        Ok(Some(Euclidean.distance(&own.geom, &arg.geom)))
    }

    /// Union with `other`. `None` when the provider cannot union the
    /// operand kinds (boolean operations are areal-only).
    pub fn union(&self, other: &dyn GeometryLike) -> Result<Option<Geometry>> {
        self.boolean_op(other, BooleanOp::Union)
    }

    /// Intersection with `other`; `None` for non-areal operand kinds.
    pub fn intersection(&self, other: &dyn GeometryLike) -> Result<Option<Geometry>> {
        self.boolean_op(other, BooleanOp::Intersection)
    }

    /// Difference with `other`; `None` for non-areal operand kinds.
    pub fn difference(&self, other: &dyn GeometryLike) -> Result<Option<Geometry>> {
        self.boolean_op(other, BooleanOp::Difference)
    }

    /// Symmetric difference with `other`; `None` for non-areal operand
    /// kinds.
    pub fn sym_difference(&self, other: &dyn GeometryLike) -> Result<Option<Geometry>> {
        self.boolean_op(other, BooleanOp::SymDifference)
    }

    /// Union of this geometry's own components.
    ///
    /// Returns `None` when the context reports the capability as
    /// unsupported, or when the contents mix dimensions beyond the
    /// provider's union surface (point-only and polygon-only contents
    /// are supported).
    pub fn unary_union(&self) -> Result<Option<Geometry>> {
        let Some(state) = self.state.as_ref() else {
            return Ok(None);
        };
        if !self.factory.supports_unary_union() {
            return Ok(None);
        }
        let own = state.handle.geom()?;
        let mut points: Vec<Point<f64>> = Vec::new();
        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        if !collect_union_leaves(&own.geom, &mut points, &mut polygons) {
            return Ok(None);
        }
        match (points.is_empty(), polygons.is_empty()) {
            (false, true) => {
                let mut unique: Vec<Point<f64>> = Vec::new();
                for point in points {
                    if !unique.contains(&point) {
                        unique.push(point);
                    }
                }
                Ok(Some(self.factory.wrap(NativeGeom {
                    kind: GeometryKind::MultiPoint,
                    geom: GeoGeometry::MultiPoint(MultiPoint(unique)),
                })))
            }
            (true, false) => {
                let mut iter = polygons.iter();
                let first = iter.next().cloned().map(|p| MultiPolygon(vec![p]));
                let Some(mut merged) = first else {
                    return Ok(None);
                };
                for polygon in iter {
                    merged = merged.union(&MultiPolygon(vec![polygon.clone()]));
                }
                Ok(Some(self.factory.wrap(NativeGeom {
                    kind: GeometryKind::MultiPolygon,
                    geom: GeoGeometry::MultiPolygon(merged),
                })))
            }
            _ => Ok(None),
        }
    }

    fn boolean_op(&self, other: &dyn GeometryLike, op: BooleanOp) -> Result<Option<Geometry>> {
        let Some(state) = self.state.as_ref() else {
            return Ok(None);
        };
        let operand = guard::resolve(self.factory.context(), other)?;
        let own = state.handle.geom()?;
        let arg = self.operand_geom(&operand)?;
        let (Some(a), Some(b)) = (as_multi_polygon(&own.geom), as_multi_polygon(&arg.geom)) else {
            return Ok(None);
        };
        let result = match op {
            BooleanOp::Union => a.union(&b),
            BooleanOp::Intersection => a.intersection(&b),
            BooleanOp::Difference => a.difference(&b),
            BooleanOp::SymDifference => a.xor(&b),
        };
        Ok(Some(self.factory.wrap(NativeGeom {
            kind: GeometryKind::MultiPolygon,
            geom: GeoGeometry::MultiPolygon(result),
        })))
    }

    fn operand_geom(&self, operand: &Operand) -> Result<NativeGeom> {
        self.factory.context().geom_of(operand.slot())
    }

    /// Counts an accepted predicate call and, under the enabled policy,
    /// builds the cache starting with the second call.
    fn note_predicate_call(&self, state: &GeomState) {
        let mut slot = state.prepared.lock();
        slot.predicate_calls = slot.predicate_calls.saturating_add(1);
        if slot.cache.is_none()
            && slot.predicate_calls >= 2
            && self.factory.config().auto_prepare == AutoPrepare::Enabled
        {
            slot.cache = PreparedGeometry::build(&state.handle);
        }
    }

    fn eval_intersects(&self, state: &GeomState, own: &NativeGeom, arg: &NativeGeom) -> bool {
        let shortcut = {
            let slot = state.prepared.lock();
            slot.cache
                .as_ref()
                .and_then(|cache| cache.intersects(&own.geom, &arg.geom))
        };
        shortcut.unwrap_or_else(|| own.geom.intersects(&arg.geom))
    }

    fn may_interact(&self, state: &GeomState, other: &GeoGeometry<f64>) -> bool {
        let slot = state.prepared.lock();
        slot.cache
            .as_ref()
            .map(|cache| cache.may_interact(other))
            .unwrap_or(true)
    }
}

impl GeometryLike for Geometry {
    fn native_ref(&self) -> Option<NativeRef> {
        self.state.as_ref().map(|state| {
            NativeRef::new(
                Arc::clone(state.handle.context()),
                state.handle.slot(),
                state.handle.kind(),
            )
        })
    }
}

impl std::fmt::Debug for Geometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geometry")
            .field("kind", &self.geometry_type())
            .field("srid", &self.srid())
            .field("prepared", &self.is_prepared())
            .finish()
    }
}

fn as_multi_polygon(geom: &GeoGeometry<f64>) -> Option<MultiPolygon<f64>> {
    match geom {
        GeoGeometry::Polygon(polygon) => Some(MultiPolygon(vec![polygon.clone()])),
        GeoGeometry::MultiPolygon(mp) => Some(mp.clone()),
        _ => None,
    }
}

fn collect_union_leaves(
    geom: &GeoGeometry<f64>,
    points: &mut Vec<Point<f64>>,
    polygons: &mut Vec<Polygon<f64>>,
) -> bool {
    match geom {
        GeoGeometry::Point(point) => {
            points.push(*point);
            true
        }
        GeoGeometry::MultiPoint(mp) => {
            points.extend(mp.0.iter().copied());
            true
        }
        GeoGeometry::Polygon(polygon) => {
            polygons.push(polygon.clone());
            true
        }
        GeoGeometry::MultiPolygon(mp) => {
            polygons.extend(mp.0.iter().cloned());
            true
        }
        GeoGeometry::GeometryCollection(gc) => gc
            .0
            .iter()
            .all(|child| collect_union_leaves(child, points, polygons)),
        _ => false,
    }
}
