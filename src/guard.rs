//! Operand validation for binary native operations.
//!
//! Every binary predicate and operation runs its argument through
//! [`resolve`] before touching the provider. An argument qualifies only
//! if it exposes a live [`NativeRef`]; anything else, including
//! permissive stand-ins that answer `None` to every query, is rejected
//! with a cast error before any native evaluation happens.

use crate::context::{GeometryKind, NativeContext, SlotId};
use crate::error::{GeoforgeError, Result};
use crate::handle::NativeHandle;
use std::sync::Arc;
use uuid::Uuid;

/// Proof that an object is backed by a live native geometry record.
///
/// Only in-crate types can mint one; foreign implementors of
/// [`GeometryLike`] can merely answer `None`.
pub struct NativeRef {
    ctx: Arc<NativeContext>,
    slot: SlotId,
    kind: GeometryKind,
}

impl NativeRef {
    pub(crate) fn new(ctx: Arc<NativeContext>, slot: SlotId, kind: GeometryKind) -> Self {
        NativeRef { ctx, slot, kind }
    }

    /// Identifier of the owning context.
    pub fn context_id(&self) -> Uuid {
        self.ctx.id()
    }

    /// Kind tag of the referenced record.
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub(crate) fn context(&self) -> &Arc<NativeContext> {
        &self.ctx
    }

    pub(crate) fn slot(&self) -> SlotId {
        self.slot
    }
}

/// Capability surface checked before any binary native operation.
///
/// Implemented by [`crate::Geometry`]. Objects that are not backed by a
/// native handle (or whose wrapper is uninitialized) answer `None` and
/// are rejected by the dispatch layer with [`GeoforgeError::Cast`].
pub trait GeometryLike {
    /// Native backing of this object, if any.
    fn native_ref(&self) -> Option<NativeRef>;
}

/// A validated operand, resolved against the receiver's context.
///
/// Same-context arguments borrow their existing slot. Cross-context
/// arguments are normalized: the canonical provider value is copied into
/// the receiver's context and released again when the operand drops.
pub(crate) enum Operand {
    Borrowed(SlotId),
    Adopted(NativeHandle),
}

impl Operand {
    pub(crate) fn slot(&self) -> SlotId {
        match self {
            Operand::Borrowed(slot) => *slot,
            Operand::Adopted(handle) => handle.slot(),
        }
    }

    pub(crate) fn is_borrowed(&self) -> bool {
        matches!(self, Operand::Borrowed(_))
    }
}

/// Validates `arg` and resolves it into `ctx`.
pub(crate) fn resolve(ctx: &Arc<NativeContext>, arg: &dyn GeometryLike) -> Result<Operand> {
    let Some(nref) = arg.native_ref() else {
        log::warn!("rejecting operand without native geometry backing");
        return Err(GeoforgeError::Cast(
            "operand is not backed by a native geometry".to_string(),
        ));
    };

    if nref.context_id() == ctx.id() {
        return Ok(Operand::Borrowed(nref.slot()));
    }

    log::debug!(
        "normalizing operand from context {} into context {}",
        nref.context_id(),
        ctx.id()
    );
    let geom = nref.context().geom_of(nref.slot())?;
    Ok(Operand::Adopted(NativeHandle::alloc(Arc::clone(ctx), geom)))
}

/// Validates `arg` as a linear ring and returns an owned component
/// handle for it in `ctx`.
///
/// Same-context rings are deep-copied so the component is independent of
/// the argument; the returned handle releases its slot if construction
/// fails further along.
pub(crate) fn resolve_ring(ctx: &Arc<NativeContext>, arg: &dyn GeometryLike) -> Result<NativeHandle> {
    let operand = resolve(ctx, arg)?;
    let kind = ctx.kind_of(operand.slot())?;
    if kind != GeometryKind::LinearRing {
        return Err(GeoforgeError::Cast(format!(
            "expected a linear_ring component, got {}",
            kind.name()
        )));
    }
    match operand {
        Operand::Adopted(handle) => Ok(handle),
        Operand::Borrowed(slot) => {
            let copied = ctx.clone_slot(slot)?;
            NativeHandle::adopt(Arc::clone(ctx), copied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NativeGeom;
    use geo::{Geometry as GeoGeometry, Point};

    struct Foreign;

    impl GeometryLike for Foreign {
        fn native_ref(&self) -> Option<NativeRef> {
            None
        }
    }

    struct Backed {
        ctx: Arc<NativeContext>,
        handle: NativeHandle,
    }

    impl GeometryLike for Backed {
        fn native_ref(&self) -> Option<NativeRef> {
            Some(NativeRef::new(
                Arc::clone(&self.ctx),
                self.handle.slot(),
                self.handle.kind(),
            ))
        }
    }

    fn backed_point(ctx: &Arc<NativeContext>, x: f64, y: f64) -> Backed {
        let handle = NativeHandle::alloc(
            Arc::clone(ctx),
            NativeGeom {
                kind: GeometryKind::Point,
                geom: GeoGeometry::Point(Point::new(x, y)),
            },
        );
        Backed {
            ctx: Arc::clone(ctx),
            handle,
        }
    }

    #[test]
    fn test_foreign_object_rejected() {
        let ctx = NativeContext::isolated();
        let result = resolve(&ctx, &Foreign);
        assert!(matches!(result, Err(GeoforgeError::Cast(_))));
        assert_eq!(ctx.live_handles(), 0);
    }

    #[test]
    fn test_same_context_borrows() {
        let ctx = NativeContext::isolated();
        let arg = backed_point(&ctx, 1.0, 2.0);
        let operand = resolve(&ctx, &arg).unwrap();
        assert!(operand.is_borrowed());
        assert_eq!(operand.slot(), arg.handle.slot());
        assert_eq!(ctx.live_handles(), 1);
    }

    #[test]
    fn test_cross_context_adopts_and_releases() {
        let receiver = NativeContext::isolated();
        let sender = NativeContext::isolated();
        let arg = backed_point(&sender, 1.0, 2.0);

        {
            let operand = resolve(&receiver, &arg).unwrap();
            assert!(!operand.is_borrowed());
            assert_eq!(receiver.live_handles(), 1);
        }
        // Adopted operand released with its scope; the sender keeps its record.
        assert_eq!(receiver.live_handles(), 0);
        assert_eq!(sender.live_handles(), 1);
    }

    #[test]
    fn test_ring_kind_enforced() {
        let ctx = NativeContext::isolated();
        let arg = backed_point(&ctx, 1.0, 2.0);
        let result = resolve_ring(&ctx, &arg);
        assert!(matches!(result, Err(GeoforgeError::Cast(_))));
        assert_eq!(ctx.live_handles(), 1);
    }
}
