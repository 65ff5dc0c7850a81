//! The single mirror texture a session may hold.

use tracing::{debug, warn};

use crate::{
    adapter::Backend,
    format::to_shader_view_format,
    texture::{BindUsage, RuntimeMirrorDesc, TextureDesc},
    types::{DeviceHandle, RuntimeMirrorHandle, TextureHandle, ViewHandle},
    ShimError, ShimResult,
};

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MirrorHandle(pub usize);

/// A runtime mirror texture and the application's view of it.
///
/// The application-visible texture is the runtime's own mirror buffer, so
/// there is nothing to copy per frame: the runtime keeps it current.
#[derive(Debug)]
pub struct MirrorRecord {
    backend: Backend,
    runtime_mirror: RuntimeMirrorHandle,
    texture: TextureHandle,
    view: Option<ViewHandle>,
}

impl MirrorRecord {
    pub fn create(
        backend: &Backend,
        device: DeviceHandle,
        desc: &TextureDesc,
        runtime_desc: &RuntimeMirrorDesc,
    ) -> ShimResult<Self> {
        let runtime_mirror =
            backend
                .runtime
                .create_mirror_texture(backend.session, device, runtime_desc)?;

        let texture = match backend
            .runtime
            .mirror_texture_buffer(backend.session, runtime_mirror)
        {
            Ok(texture) => texture,
            Err(err) => {
                backend
                    .runtime
                    .destroy_mirror_texture(backend.session, runtime_mirror);
                return Err(err);
            }
        };

        let mut record = Self {
            backend: backend.clone(),
            runtime_mirror,
            texture,
            view: None,
        };

        if desc.bind.contains(BindUsage::SHADER_RESOURCE) {
            let view = backend.graphics.create_shader_view(
                device,
                texture,
                to_shader_view_format(desc.format),
                desc,
            )?;
            record.view = Some(view);
        }

        debug!(
            runtime_mirror = runtime_mirror.0,
            width = runtime_desc.width,
            height = runtime_desc.height,
            "mirror texture created"
        );
        Ok(record)
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn view(&self) -> Option<ViewHandle> {
        self.view
    }

    pub fn runtime_mirror(&self) -> RuntimeMirrorHandle {
        self.runtime_mirror
    }
}

impl Drop for MirrorRecord {
    fn drop(&mut self) {
        if let Some(view) = self.view.take() {
            self.backend.graphics.release_view(view);
        }
        self.backend.graphics.release_texture(self.texture);
        self.backend
            .runtime
            .destroy_mirror_texture(self.backend.session, self.runtime_mirror);
        debug!(runtime_mirror = self.runtime_mirror.0, "mirror texture destroyed");
    }
}

/// Holds at most one live mirror.
#[derive(Debug, Default)]
pub struct MirrorSlot {
    current: Option<(MirrorHandle, MirrorRecord)>,
    next_handle: usize,
}

impl MirrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the live mirror, if any. Must happen before a replacement is
    /// created, since the runtime only supports one mirror at a time.
    pub fn release_current(&mut self) {
        if let Some((handle, _record)) = self.current.take() {
            warn!(mirror = handle.0, "replacing live mirror texture");
        }
    }

    pub fn install(&mut self, record: MirrorRecord) -> MirrorHandle {
        self.release_current();
        self.next_handle += 1;
        let handle = MirrorHandle(self.next_handle);
        self.current = Some((handle, record));
        handle
    }

    pub fn get(&self, handle: MirrorHandle) -> ShimResult<&MirrorRecord> {
        match &self.current {
            Some((live, record)) if *live == handle => Ok(record),
            _ => Err(ShimError::InvalidHandle),
        }
    }

    /// Destroy the mirror named by `handle`. Stale or unknown handles are a
    /// no-op.
    pub fn remove(&mut self, handle: MirrorHandle) -> Option<MirrorRecord> {
        match &self.current {
            Some((live, _)) if *live == handle => self.current.take().map(|(_, record)| record),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.current.is_some()
    }

    pub fn live_handle(&self) -> Option<MirrorHandle> {
        self.current.as_ref().map(|(handle, _)| *handle)
    }
}
