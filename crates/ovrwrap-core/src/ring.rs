//! A runtime-owned texture swap chain plus the buffers we have fetched
//! from it.

use ovrwrap_common::ChainLengthPolicy;
use tracing::{debug, warn};

use crate::{
    adapter::Backend,
    texture::RuntimeChainDesc,
    types::{ContextHandle, DeviceHandle, RuntimeChainHandle, TextureHandle},
    ShimResult,
};

/// Buffer count assumed when the runtime cannot report one.
pub const DEFAULT_RUNTIME_CHAIN_LENGTH: usize = 3;

/// Owns one runtime swap chain. Dropping the ring releases every fetched
/// buffer and destroys the chain.
#[derive(Debug)]
pub struct RuntimeRing {
    backend: Backend,
    chain: RuntimeChainHandle,
    desc: RuntimeChainDesc,
    buffers: Vec<Option<TextureHandle>>,
}

impl RuntimeRing {
    pub fn create(
        backend: &Backend,
        device: DeviceHandle,
        desc: &RuntimeChainDesc,
        policy: ChainLengthPolicy,
    ) -> ShimResult<Self> {
        let chain = backend
            .runtime
            .create_texture_swap_chain(backend.session, device, desc)?;

        // From here on the chain is owned by the ring, so early returns clean up.
        let mut ring = Self {
            backend: backend.clone(),
            chain,
            desc: *desc,
            buffers: Vec::new(),
        };

        let length = match backend
            .runtime
            .texture_swap_chain_length(backend.session, chain)
        {
            Ok(length) => length,
            Err(err) => match policy {
                ChainLengthPolicy::Tolerant => {
                    warn!(
                        "chain length query failed ({err}); assuming {DEFAULT_RUNTIME_CHAIN_LENGTH}"
                    );
                    DEFAULT_RUNTIME_CHAIN_LENGTH
                }
                ChainLengthPolicy::FailFast => return Err(err),
            },
        };
        ring.buffers.resize(length, None);

        debug!(
            chain = chain.0,
            length,
            format = ?desc.format,
            width = desc.width,
            height = desc.height,
            "runtime swap chain created"
        );
        Ok(ring)
    }

    pub fn chain(&self) -> RuntimeChainHandle {
        self.chain
    }

    pub fn desc(&self) -> &RuntimeChainDesc {
        &self.desc
    }

    /// Buffer count as last known; grows if the runtime reports an index
    /// past it.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Copy `source` into the runtime's current buffer, then commit.
    ///
    /// The runtime's index is read fresh every time; it advances on commit
    /// and has nothing to do with the application's own index.
    pub fn commit_from(&mut self, context: ContextHandle, source: TextureHandle) -> ShimResult<()> {
        let session = self.backend.session;
        let index = self
            .backend
            .runtime
            .texture_swap_chain_current_index(session, self.chain)?;
        let target = self.buffer(index)?;

        self.backend.graphics.copy_texture(context, target, source);
        self.backend
            .runtime
            .commit_texture_swap_chain(session, self.chain)
    }

    fn buffer(&mut self, index: usize) -> ShimResult<TextureHandle> {
        if index >= self.buffers.len() {
            self.buffers.resize(index + 1, None);
        }
        if let Some(texture) = self.buffers[index] {
            return Ok(texture);
        }

        let texture = self.backend.runtime.texture_swap_chain_buffer(
            self.backend.session,
            self.chain,
            index,
        )?;
        self.buffers[index] = Some(texture);
        Ok(texture)
    }
}

impl Drop for RuntimeRing {
    fn drop(&mut self) {
        for texture in self.buffers.drain(..).flatten() {
            self.backend.graphics.release_texture(texture);
        }
        self.backend
            .runtime
            .destroy_texture_swap_chain(self.backend.session, self.chain);
        debug!(chain = self.chain.0, "runtime swap chain destroyed");
    }
}
