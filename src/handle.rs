//! RAII guard over one native geometry slot.

use crate::context::{GeometryKind, NativeContext, NativeGeom, SlotId};
use crate::error::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Exclusive owner of one native geometry record.
///
/// A handle is never copied or shared: dropping it releases the slot it
/// guards, and [`NativeHandle::try_clone`] is the only way to duplicate
/// the underlying record, producing a fully independent slot. Exactly
/// one handle references a live slot at any time.
pub struct NativeHandle {
    ctx: Arc<NativeContext>,
    slot: SlotId,
    kind: GeometryKind,
}

impl NativeHandle {
    pub(crate) fn alloc(ctx: Arc<NativeContext>, geom: NativeGeom) -> Self {
        let kind = geom.kind;
        let slot = ctx.alloc(geom);
        NativeHandle { ctx, slot, kind }
    }

    /// Adopts an already-allocated slot. The caller transfers ownership;
    /// the slot is released when the returned handle drops.
    pub(crate) fn adopt(ctx: Arc<NativeContext>, slot: SlotId) -> Result<Self> {
        let kind = ctx.kind_of(slot)?;
        Ok(NativeHandle { ctx, slot, kind })
    }

    /// Kind tag of the guarded record.
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Identifier of the context that owns the record.
    pub fn context_id(&self) -> Uuid {
        self.ctx.id()
    }

    pub(crate) fn context(&self) -> &Arc<NativeContext> {
        &self.ctx
    }

    pub(crate) fn slot(&self) -> SlotId {
        self.slot
    }

    pub(crate) fn geom(&self) -> Result<NativeGeom> {
        self.ctx.geom_of(self.slot)
    }

    /// Deep-copies the record into a new slot and returns its handle.
    pub fn try_clone(&self) -> Result<NativeHandle> {
        let slot = self.ctx.clone_slot(self.slot)?;
        Ok(NativeHandle {
            ctx: Arc::clone(&self.ctx),
            slot,
            kind: self.kind,
        })
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        self.ctx.release(self.slot);
    }
}

impl std::fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeHandle")
            .field("context", &self.ctx.id())
            .field("slot", &self.slot)
            .field("kind", &self.kind)
            .finish()
    }
}
