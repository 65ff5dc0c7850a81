//! Per-session shim state.

use std::sync::Arc;

use ovrwrap_common::ShimSettings;
use tracing::{debug, info, trace};

use crate::{
    adapter::{Backend, GraphicsApi, RuntimeApi},
    layers::LayerDescriptor,
    mirror::{MirrorHandle, MirrorRecord, MirrorSlot},
    present::{EyeTexture, PresentParams, Presenter},
    registry::{Registry, SwapChainHandle},
    revision::ApiRevision,
    status::ResultCode,
    submit::translate_layers,
    swap_chain::{SwapChainRecord, VisibleTexture},
    texture::{runtime_chain_desc, runtime_mirror_desc, RuntimeChainDesc, TextureDesc},
    timing::{FrameClock, FrameTiming},
    types::{
        ContextHandle, DeviceHandle, Eye, EyeRenderDesc, FovPort, GraphicsLuid, Posef,
        RuntimeChainHandle, SessionHandle, Sizei, ViewScaleDesc,
    },
    ShimResult,
};

/// All shim-side bookkeeping for one runtime session.
///
/// Dropping the session releases every swap chain, the mirror and the
/// presenter rings; the runtime session itself must be destroyed afterwards
/// by whoever created it.
pub struct ShimSession {
    backend: Backend,
    revision: ApiRevision,
    settings: ShimSettings,
    graphics_luid: GraphicsLuid,
    chains: Registry<SwapChainRecord>,
    mirror: MirrorSlot,
    clock: FrameClock,
    presenter: Presenter,
}

impl ShimSession {
    /// Wrap an already created runtime session. The display refresh rate is
    /// read here once and cached for frame timing.
    pub fn new(
        runtime: Arc<dyn RuntimeApi>,
        graphics: Arc<dyn GraphicsApi>,
        session: SessionHandle,
        graphics_luid: GraphicsLuid,
        revision: ApiRevision,
        settings: ShimSettings,
    ) -> Self {
        let reported = runtime.display_refresh_rate(session);
        let clock = FrameClock::new(reported, settings.default_refresh_rate);
        info!(
            %revision,
            refresh_rate = clock.refresh_rate(),
            srgb_correction = settings.srgb_correction,
            chain_length_policy = %settings.chain_length_policy,
            "shim session ready"
        );

        Self {
            backend: Backend::new(runtime, graphics, session),
            revision,
            settings,
            graphics_luid,
            chains: Registry::new(),
            mirror: MirrorSlot::new(),
            clock,
            presenter: Presenter::new(),
        }
    }

    pub fn revision(&self) -> ApiRevision {
        self.revision
    }

    pub fn settings(&self) -> &ShimSettings {
        &self.settings
    }

    pub fn session_handle(&self) -> SessionHandle {
        self.backend.session
    }

    pub fn graphics_luid(&self) -> GraphicsLuid {
        self.graphics_luid
    }

    pub fn refresh_rate(&self) -> f32 {
        self.clock.refresh_rate()
    }

    pub fn frame_index(&self) -> i64 {
        self.clock.frame_index()
    }

    pub fn swap_chain_count(&self) -> usize {
        self.chains.len()
    }

    fn promote_srgb(&self) -> bool {
        self.revision.promotes_srgb() && self.settings.srgb_correction
    }

    // Swap chains

    /// Create a legacy swap texture set on `device`.
    ///
    /// `typeless_requested` is the caller's explicit typeless flag on
    /// revisions that have one; older revisions pass `false`.
    pub fn create_swap_chain(
        &mut self,
        device: DeviceHandle,
        desc: &TextureDesc,
        typeless_requested: bool,
    ) -> ShimResult<SwapChainHandle> {
        let runtime_desc = runtime_chain_desc(desc, self.promote_srgb(), typeless_requested)?;
        let record = SwapChainRecord::create(
            &self.backend,
            device,
            desc,
            &runtime_desc,
            self.settings.chain_length_policy,
        )?;

        let handle = self.chains.allocate_handle();
        self.chains.register(handle, record);
        debug!(chain = handle.0, live = self.chains.len(), "swap chain registered");
        Ok(handle)
    }

    pub fn swap_chain(&self, handle: SwapChainHandle) -> ShimResult<&SwapChainRecord> {
        self.chains.lookup(handle)
    }

    pub fn current_visible_texture(&self, handle: SwapChainHandle) -> ShimResult<VisibleTexture> {
        Ok(self.chains.lookup(handle)?.current_visible())
    }

    pub fn set_visible_index(&mut self, handle: SwapChainHandle, index: usize) -> ShimResult<()> {
        self.chains.lookup_mut(handle)?.set_visible_index(index);
        Ok(())
    }

    pub fn commit_and_advance(&mut self, handle: SwapChainHandle) -> ShimResult<RuntimeChainHandle> {
        self.chains.lookup_mut(handle)?.commit_and_advance()
    }

    /// Description of the runtime chain behind `handle`, as the runtime
    /// reports it.
    pub fn runtime_chain_desc(&self, handle: SwapChainHandle) -> ShimResult<RuntimeChainDesc> {
        let chain = self.chains.lookup(handle)?.runtime_chain();
        self.backend
            .runtime
            .texture_swap_chain_desc(self.backend.session, chain)
    }

    /// Destroy a swap chain. Unknown handles are ignored.
    pub fn destroy_swap_chain(&mut self, handle: SwapChainHandle) {
        if self.chains.remove(handle).is_some() {
            debug!(chain = handle.0, live = self.chains.len(), "swap chain destroyed");
        }
    }

    // Mirror

    /// Create the mirror texture, releasing any live one first.
    pub fn create_mirror(
        &mut self,
        device: DeviceHandle,
        desc: &TextureDesc,
        typeless_requested: bool,
    ) -> ShimResult<MirrorHandle> {
        let runtime_desc = runtime_mirror_desc(desc, self.promote_srgb(), typeless_requested)?;
        self.mirror.release_current();
        let record = MirrorRecord::create(&self.backend, device, desc, &runtime_desc)?;
        Ok(self.mirror.install(record))
    }

    pub fn mirror(&self, handle: MirrorHandle) -> ShimResult<&MirrorRecord> {
        self.mirror.get(handle)
    }

    pub fn has_mirror(&self) -> bool {
        self.mirror.is_live()
    }

    /// Destroy the mirror. Stale handles are ignored.
    pub fn destroy_mirror(&mut self, handle: MirrorHandle) {
        self.mirror.remove(handle);
    }

    // Frame submission

    /// Translate and submit one frame of layers.
    ///
    /// The runtime's code comes back unchanged: qualified successes as `Ok`,
    /// failures (display lost included) as [`ShimError::Runtime`](crate::ShimError::Runtime).
    pub fn submit_frame(
        &mut self,
        frame_index: i64,
        view_scale: Option<&ViewScaleDesc>,
        layers: &[Option<LayerDescriptor>],
    ) -> ShimResult<ResultCode> {
        trace!(frame_index, layers = layers.len(), "submit frame");
        self.clock.set_frame_index(frame_index);

        let translated =
            translate_layers(&mut self.chains, layers, self.clock.tracking_sample_time())?;
        self.backend.runtime.submit_frame(
            self.backend.session,
            frame_index,
            view_scale,
            &translated,
        )
    }

    /// Remember when tracking state was last sampled; eye layers submitted
    /// afterwards carry this timestamp.
    pub fn record_tracking_sample(&mut self, time: f64) {
        self.clock.record_tracking_sample(time);
    }

    pub fn tracking_sample_time(&self) -> Option<f64> {
        self.clock.tracking_sample_time()
    }

    // Timing

    pub fn frame_timing(&self, frame_index: i64) -> FrameTiming {
        self.clock
            .timing(self.backend.runtime.as_ref(), self.backend.session, frame_index)
    }

    pub fn reset_frame_timing(&mut self, frame_index: i64) {
        self.clock.set_frame_index(frame_index);
    }

    /// Start a frame in the `EndFrame` model: the index is remembered for
    /// the following `end_frame`.
    pub fn begin_frame(&mut self, frame_index: i64) -> FrameTiming {
        self.clock.set_frame_index(frame_index);
        self.frame_timing(frame_index)
    }

    pub fn predicted_display_time(&self, frame_index: i64) -> f64 {
        self.backend
            .runtime
            .predicted_display_time(self.backend.session, frame_index)
    }

    pub fn time_in_seconds(&self) -> f64 {
        self.backend.runtime.time_in_seconds()
    }

    // Rendering parameters

    pub fn render_desc(&self, eye: Eye, fov: FovPort) -> EyeRenderDesc {
        self.backend
            .runtime
            .render_desc(self.backend.session, eye, fov)
    }

    pub fn fov_texture_size(&self, eye: Eye, fov: FovPort, pixels_per_display_pixel: f32) -> Sizei {
        self.backend
            .runtime
            .fov_texture_size(self.backend.session, eye, fov, pixels_per_display_pixel)
    }

    // EndFrame presenter (0.4 / 0.5)

    pub fn configure_rendering(
        &mut self,
        device: DeviceHandle,
        context: ContextHandle,
        fov: [FovPort; 2],
    ) -> [EyeRenderDesc; 2] {
        self.presenter.configure(device, context, fov);
        Eye::BOTH.map(|eye| self.render_desc(eye, fov[eye.index()]))
    }

    pub fn end_frame(
        &mut self,
        render_pose: [Posef; 2],
        eye_textures: [EyeTexture; 2],
    ) -> ShimResult<ResultCode> {
        let params = PresentParams {
            frame_index: self.clock.frame_index(),
            sample_time: self.clock.tracking_sample_time().unwrap_or(0.0),
            promote_srgb: self.promote_srgb(),
            policy: self.settings.chain_length_policy,
        };
        self.presenter
            .present(&self.backend, params, render_pose, eye_textures)
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn shutdown_rendering(&mut self) {
        self.presenter.shutdown();
    }
}

impl std::fmt::Debug for ShimSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShimSession")
            .field("session", &self.backend.session)
            .field("revision", &self.revision)
            .field("swap_chains", &self.chains.len())
            .field("mirror", &self.mirror.live_handle())
            .finish_non_exhaustive()
    }
}
