use std::sync::Arc;

use crate::{
    format::DxgiFormat,
    layers::RuntimeLayer,
    status::ResultCode,
    texture::{RuntimeChainDesc, RuntimeMirrorDesc, TextureDesc},
    types::{
        ContextHandle, DeviceHandle, Eye, EyeRenderDesc, FovPort, RuntimeChainHandle,
        RuntimeMirrorHandle, SessionHandle, Sizei, TextureHandle, ViewHandle, ViewScaleDesc,
    },
    ShimResult,
};

/// The runtime entry points the core consumes.
///
/// Implemented over the dynamically resolved runtime library by
/// `ovrwrap-rev`. Failures carry the runtime's own result code in
/// [`ShimError::Runtime`](crate::ShimError::Runtime) so it reaches the caller
/// unchanged.
pub trait RuntimeApi: Send + Sync {
    // Texture swap chains
    fn create_texture_swap_chain(
        &self,
        session: SessionHandle,
        device: DeviceHandle,
        desc: &RuntimeChainDesc,
    ) -> ShimResult<RuntimeChainHandle>;
    fn texture_swap_chain_length(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<usize>;
    fn texture_swap_chain_current_index(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<usize>;
    fn texture_swap_chain_desc(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<RuntimeChainDesc>;
    /// Fetch one runtime buffer. The returned texture holds a reference the
    /// caller must give back through [`GraphicsApi::release_texture`].
    fn texture_swap_chain_buffer(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
        index: usize,
    ) -> ShimResult<TextureHandle>;
    fn commit_texture_swap_chain(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<()>;
    fn destroy_texture_swap_chain(&self, session: SessionHandle, chain: RuntimeChainHandle);

    // Mirror texture
    fn create_mirror_texture(
        &self,
        session: SessionHandle,
        device: DeviceHandle,
        desc: &RuntimeMirrorDesc,
    ) -> ShimResult<RuntimeMirrorHandle>;
    fn mirror_texture_buffer(
        &self,
        session: SessionHandle,
        mirror: RuntimeMirrorHandle,
    ) -> ShimResult<TextureHandle>;
    fn destroy_mirror_texture(&self, session: SessionHandle, mirror: RuntimeMirrorHandle);

    // Rendering parameters
    fn render_desc(&self, session: SessionHandle, eye: Eye, fov: FovPort) -> EyeRenderDesc;
    fn fov_texture_size(
        &self,
        session: SessionHandle,
        eye: Eye,
        fov: FovPort,
        pixels_per_display_pixel: f32,
    ) -> Sizei;

    // Frame loop
    /// Submit translated layers. Qualified successes such as
    /// [`ResultCode::SUCCESS_NOT_VISIBLE`] come back as `Ok`.
    fn submit_frame(
        &self,
        session: SessionHandle,
        frame_index: i64,
        view_scale: Option<&ViewScaleDesc>,
        layers: &[RuntimeLayer],
    ) -> ShimResult<ResultCode>;
    fn predicted_display_time(&self, session: SessionHandle, frame_index: i64) -> f64;
    fn time_in_seconds(&self) -> f64;
    fn display_refresh_rate(&self, session: SessionHandle) -> f32;
}

/// The graphics device operations the core needs.
pub trait GraphicsApi: Send + Sync {
    /// Returns the device's immediate context with an added reference.
    fn immediate_context(&self, device: DeviceHandle) -> ShimResult<ContextHandle>;
    fn release_context(&self, context: ContextHandle);

    fn create_texture(&self, device: DeviceHandle, desc: &TextureDesc) -> ShimResult<TextureHandle>;
    /// `desc` is the texture's own description; mip count and sample count
    /// decide the view dimension.
    fn create_shader_view(
        &self,
        device: DeviceHandle,
        texture: TextureHandle,
        format: DxgiFormat,
        desc: &TextureDesc,
    ) -> ShimResult<ViewHandle>;
    fn texture_desc(&self, texture: TextureHandle) -> ShimResult<TextureDesc>;

    /// Queue a whole-resource copy. Ordering comes from the GPU queue.
    fn copy_texture(&self, context: ContextHandle, dst: TextureHandle, src: TextureHandle);

    fn release_texture(&self, texture: TextureHandle);
    fn release_view(&self, view: ViewHandle);
}

/// Everything a resource needs to release itself: both capabilities plus the
/// runtime session it belongs to.
#[derive(Clone)]
pub struct Backend {
    pub runtime: Arc<dyn RuntimeApi>,
    pub graphics: Arc<dyn GraphicsApi>,
    pub session: SessionHandle,
}

impl Backend {
    pub fn new(
        runtime: Arc<dyn RuntimeApi>,
        graphics: Arc<dyn GraphicsApi>,
        session: SessionHandle,
    ) -> Self {
        Self {
            runtime,
            graphics,
            session,
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
