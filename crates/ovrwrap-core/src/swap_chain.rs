//! The application-visible half of a legacy swap texture set.
//!
//! A legacy set is two textures the application renders into directly and
//! flips between on its own. Behind it sits a [`RuntimeRing`] whose length
//! and index belong to the runtime. The two rings only meet in
//! [`SwapChainRecord::commit_and_advance`], which copies the visible texture
//! the application last selected into the runtime's current buffer.

use ovrwrap_common::ChainLengthPolicy;
use tracing::debug;

use crate::{
    adapter::Backend,
    format::to_shader_view_format,
    ring::RuntimeRing,
    texture::{BindUsage, RuntimeChainDesc, TextureDesc},
    types::{ContextHandle, DeviceHandle, RuntimeChainHandle, TextureHandle, ViewHandle},
    ShimResult,
};

/// Every legacy swap texture set exposes exactly this many textures.
pub const VISIBLE_TEXTURE_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleTexture {
    pub texture: TextureHandle,
    pub view: Option<ViewHandle>,
}

#[derive(Debug)]
pub struct SwapChainRecord {
    ring: RuntimeRing,
    context: ContextHandle,
    visible: Vec<VisibleTexture>,
    visible_index: usize,
    desc: TextureDesc,
    backend: Backend,
}

impl SwapChainRecord {
    /// Allocate the runtime chain and the visible textures.
    ///
    /// Visible textures keep the caller's own format; the runtime chain
    /// uses `runtime_desc`. Any failure releases whatever was already
    /// created.
    pub fn create(
        backend: &Backend,
        device: DeviceHandle,
        desc: &TextureDesc,
        runtime_desc: &RuntimeChainDesc,
        policy: ChainLengthPolicy,
    ) -> ShimResult<Self> {
        let ring = RuntimeRing::create(backend, device, runtime_desc, policy)?;
        let context = backend.graphics.immediate_context(device)?;

        let mut record = Self {
            ring,
            context,
            visible: Vec::with_capacity(VISIBLE_TEXTURE_COUNT),
            visible_index: 0,
            desc: *desc,
            backend: backend.clone(),
        };

        let wants_view = desc.bind.contains(BindUsage::SHADER_RESOURCE);
        let view_format = to_shader_view_format(desc.format);
        for _ in 0..VISIBLE_TEXTURE_COUNT {
            let texture = backend.graphics.create_texture(device, desc)?;
            record.visible.push(VisibleTexture {
                texture,
                view: None,
            });
            if wants_view {
                let view = backend
                    .graphics
                    .create_shader_view(device, texture, view_format, desc)?;
                if let Some(slot) = record.visible.last_mut() {
                    slot.view = Some(view);
                }
            }
        }

        debug!(
            runtime_chain = record.ring.chain().0,
            runtime_length = record.ring.len(),
            format = %desc.format,
            "swap texture set created"
        );
        Ok(record)
    }

    pub fn visible_textures(&self) -> &[VisibleTexture] {
        &self.visible
    }

    pub fn visible_index(&self) -> usize {
        self.visible_index
    }

    /// The texture the application is currently rendering into.
    pub fn current_visible(&self) -> VisibleTexture {
        self.visible[self.visible_index]
    }

    /// Mirror the application's own index change. Out-of-range indices wrap.
    pub fn set_visible_index(&mut self, index: usize) {
        self.visible_index = index % self.visible.len();
    }

    /// Copy the current visible texture into the runtime chain and commit.
    /// The visible index is left alone.
    pub fn commit_and_advance(&mut self) -> ShimResult<RuntimeChainHandle> {
        let source = self.current_visible().texture;
        self.ring.commit_from(self.context, source)?;
        Ok(self.ring.chain())
    }

    pub fn runtime_chain(&self) -> RuntimeChainHandle {
        self.ring.chain()
    }

    pub fn runtime_desc(&self) -> &RuntimeChainDesc {
        self.ring.desc()
    }

    pub fn runtime_length(&self) -> usize {
        self.ring.len()
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }
}

impl Drop for SwapChainRecord {
    fn drop(&mut self) {
        let graphics = &self.backend.graphics;
        for visible in self.visible.drain(..) {
            if let Some(view) = visible.view {
                graphics.release_view(view);
            }
            graphics.release_texture(visible.texture);
        }
        graphics.release_context(self.context);
        // `ring` drops after this, destroying the runtime chain.
    }
}
