//! Recording mocks for the runtime and the graphics device.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use ovrwrap_common::ShimSettings;
use ovrwrap_core::{
    ApiRevision, ContextHandle, DeviceHandle, DxgiFormat, Eye, EyeRenderDesc, FovPort,
    GraphicsApi, GraphicsLuid, Recti, ResultCode, RuntimeApi, RuntimeChainDesc,
    RuntimeChainHandle, RuntimeLayer, RuntimeMirrorDesc, RuntimeMirrorHandle, SessionHandle,
    ShimError, ShimResult, ShimSession, Sizei, TextureDesc, TextureHandle, Vector2f, Vector3f,
    ViewHandle, ViewScaleDesc,
};

pub const DEVICE: DeviceHandle = DeviceHandle(0xD0);
pub const SESSION: SessionHandle = SessionHandle(0x5E);

#[derive(Debug, Clone)]
pub struct MockChain {
    pub desc: RuntimeChainDesc,
    pub length: usize,
    pub index: usize,
    pub commits: usize,
}

#[derive(Debug, Clone)]
pub struct SubmitCall {
    pub frame_index: i64,
    pub view_scale: Option<ViewScaleDesc>,
    pub layers: Vec<RuntimeLayer>,
}

#[derive(Debug)]
pub struct RuntimeState {
    next_id: usize,
    pub chains: HashMap<RuntimeChainHandle, MockChain>,
    pub created_chains: Vec<RuntimeChainDesc>,
    pub destroyed_chains: Vec<RuntimeChainHandle>,
    pub buffer_fetches: usize,
    pub mirrors: HashSet<RuntimeMirrorHandle>,
    pub created_mirrors: Vec<RuntimeMirrorDesc>,
    pub destroyed_mirrors: Vec<RuntimeMirrorHandle>,
    pub submits: Vec<SubmitCall>,

    pub chain_length: usize,
    pub fail_chain_length: bool,
    pub fail_create_chain: Option<ResultCode>,
    pub submit_result: ResultCode,
    pub refresh_rate: f32,
    pub now: f64,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            next_id: 0x1000,
            chains: HashMap::new(),
            created_chains: Vec::new(),
            destroyed_chains: Vec::new(),
            buffer_fetches: 0,
            mirrors: HashSet::new(),
            created_mirrors: Vec::new(),
            destroyed_mirrors: Vec::new(),
            submits: Vec::new(),
            chain_length: 3,
            fail_chain_length: false,
            fail_create_chain: None,
            submit_result: ResultCode::SUCCESS,
            refresh_rate: 90.0,
            now: 100.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockRuntime {
    state: Mutex<RuntimeState>,
}

impl MockRuntime {
    pub fn state(&self) -> MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap()
    }

    pub fn total_commits(&self) -> usize {
        self.state().chains.values().map(|chain| chain.commits).sum()
    }

    pub fn commits(&self, chain: RuntimeChainHandle) -> usize {
        self.state().chains.get(&chain).map_or(0, |chain| chain.commits)
    }

    pub fn runtime_index(&self, chain: RuntimeChainHandle) -> usize {
        self.state().chains[&chain].index
    }

    /// The texture the mock hands out for `chain`'s buffer `index`.
    pub fn buffer_texture(chain: RuntimeChainHandle, index: usize) -> TextureHandle {
        TextureHandle(0x100_0000 + chain.0 * 0x100 + index)
    }

    pub fn last_submit(&self) -> SubmitCall {
        self.state().submits.last().cloned().expect("no submit recorded")
    }
}

impl RuntimeApi for MockRuntime {
    fn create_texture_swap_chain(
        &self,
        session: SessionHandle,
        device: DeviceHandle,
        desc: &RuntimeChainDesc,
    ) -> ShimResult<RuntimeChainHandle> {
        assert_eq!(session, SESSION);
        assert_eq!(device, DEVICE);
        let mut state = self.state();
        if let Some(code) = state.fail_create_chain {
            return Err(ShimError::Runtime(code));
        }
        state.next_id += 1;
        let handle = RuntimeChainHandle(state.next_id);
        let length = state.chain_length;
        state.chains.insert(
            handle,
            MockChain {
                desc: *desc,
                length,
                index: 0,
                commits: 0,
            },
        );
        state.created_chains.push(*desc);
        Ok(handle)
    }

    fn texture_swap_chain_length(
        &self,
        _session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<usize> {
        let state = self.state();
        if state.fail_chain_length {
            return Err(ShimError::Runtime(ResultCode::SERVICE_ERROR));
        }
        state
            .chains
            .get(&chain)
            .map(|chain| chain.length)
            .ok_or(ShimError::Runtime(ResultCode::TEXTURE_SWAP_CHAIN_INVALID))
    }

    fn texture_swap_chain_current_index(
        &self,
        _session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<usize> {
        self.state()
            .chains
            .get(&chain)
            .map(|chain| chain.index)
            .ok_or(ShimError::Runtime(ResultCode::TEXTURE_SWAP_CHAIN_INVALID))
    }

    fn texture_swap_chain_desc(
        &self,
        _session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<RuntimeChainDesc> {
        self.state()
            .chains
            .get(&chain)
            .map(|chain| chain.desc)
            .ok_or(ShimError::Runtime(ResultCode::TEXTURE_SWAP_CHAIN_INVALID))
    }

    fn texture_swap_chain_buffer(
        &self,
        _session: SessionHandle,
        chain: RuntimeChainHandle,
        index: usize,
    ) -> ShimResult<TextureHandle> {
        let mut state = self.state();
        state.buffer_fetches += 1;
        match state.chains.get(&chain) {
            Some(mock) if index < mock.length => Ok(Self::buffer_texture(chain, index)),
            _ => Err(ShimError::Runtime(ResultCode::INVALID_PARAMETER)),
        }
    }

    fn commit_texture_swap_chain(
        &self,
        _session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<()> {
        let mut state = self.state();
        let mock = state
            .chains
            .get_mut(&chain)
            .ok_or(ShimError::Runtime(ResultCode::TEXTURE_SWAP_CHAIN_INVALID))?;
        mock.commits += 1;
        mock.index = (mock.index + 1) % mock.length;
        Ok(())
    }

    fn destroy_texture_swap_chain(&self, _session: SessionHandle, chain: RuntimeChainHandle) {
        let mut state = self.state();
        state.chains.remove(&chain);
        state.destroyed_chains.push(chain);
    }

    fn create_mirror_texture(
        &self,
        _session: SessionHandle,
        _device: DeviceHandle,
        desc: &RuntimeMirrorDesc,
    ) -> ShimResult<RuntimeMirrorHandle> {
        let mut state = self.state();
        state.next_id += 1;
        let handle = RuntimeMirrorHandle(state.next_id);
        state.mirrors.insert(handle);
        state.created_mirrors.push(*desc);
        Ok(handle)
    }

    fn mirror_texture_buffer(
        &self,
        _session: SessionHandle,
        mirror: RuntimeMirrorHandle,
    ) -> ShimResult<TextureHandle> {
        if self.state().mirrors.contains(&mirror) {
            Ok(TextureHandle(0x200_0000 + mirror.0))
        } else {
            Err(ShimError::Runtime(ResultCode::INVALID_PARAMETER))
        }
    }

    fn destroy_mirror_texture(&self, _session: SessionHandle, mirror: RuntimeMirrorHandle) {
        let mut state = self.state();
        state.mirrors.remove(&mirror);
        state.destroyed_mirrors.push(mirror);
    }

    fn render_desc(&self, _session: SessionHandle, eye: Eye, fov: FovPort) -> EyeRenderDesc {
        EyeRenderDesc {
            eye: eye as i32,
            fov,
            distorted_viewport: Recti::default(),
            pixels_per_tan_angle_at_center: Vector2f { x: 500.0, y: 500.0 },
            hmd_to_eye_offset: Vector3f {
                x: if eye == Eye::Left { -0.032 } else { 0.032 },
                y: 0.0,
                z: 0.0,
            },
        }
    }

    fn fov_texture_size(
        &self,
        _session: SessionHandle,
        _eye: Eye,
        fov: FovPort,
        pixels_per_display_pixel: f32,
    ) -> Sizei {
        let scale = 500.0 * pixels_per_display_pixel;
        Sizei {
            w: ((fov.left_tan + fov.right_tan) * scale) as i32,
            h: ((fov.up_tan + fov.down_tan) * scale) as i32,
        }
    }

    fn submit_frame(
        &self,
        session: SessionHandle,
        frame_index: i64,
        view_scale: Option<&ViewScaleDesc>,
        layers: &[RuntimeLayer],
    ) -> ShimResult<ResultCode> {
        assert_eq!(session, SESSION);
        let mut state = self.state();
        state.submits.push(SubmitCall {
            frame_index,
            view_scale: view_scale.copied(),
            layers: layers.to_vec(),
        });
        state.submit_result.into_result()
    }

    fn predicted_display_time(&self, _session: SessionHandle, frame_index: i64) -> f64 {
        let state = self.state();
        state.now + 0.02 + frame_index as f64 * 0.001
    }

    fn time_in_seconds(&self) -> f64 {
        self.state().now
    }

    fn display_refresh_rate(&self, _session: SessionHandle) -> f32 {
        self.state().refresh_rate
    }
}

#[derive(Debug)]
pub struct GraphicsState {
    next_id: usize,
    pub live_textures: HashSet<TextureHandle>,
    pub live_views: HashSet<ViewHandle>,
    pub texture_descs: HashMap<TextureHandle, TextureDesc>,
    pub created_textures: Vec<TextureDesc>,
    pub views: Vec<(ViewHandle, TextureHandle, DxgiFormat)>,
    pub released_textures: Vec<TextureHandle>,
    pub released_views: Vec<ViewHandle>,
    pub contexts_acquired: usize,
    pub contexts_released: usize,
    pub copies: Vec<(ContextHandle, TextureHandle, TextureHandle)>,
    /// Fail the n-th texture creation (0-based) with a service error.
    pub fail_texture_at: Option<usize>,
    pub fail_views: bool,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            next_id: 0x10,
            live_textures: HashSet::new(),
            live_views: HashSet::new(),
            texture_descs: HashMap::new(),
            created_textures: Vec::new(),
            views: Vec::new(),
            released_textures: Vec::new(),
            released_views: Vec::new(),
            contexts_acquired: 0,
            contexts_released: 0,
            copies: Vec::new(),
            fail_texture_at: None,
            fail_views: false,
        }
    }
}

pub const CONTEXT: ContextHandle = ContextHandle(0xC0);

#[derive(Debug, Default)]
pub struct MockGraphics {
    state: Mutex<GraphicsState>,
}

impl MockGraphics {
    pub fn state(&self) -> MutexGuard<'_, GraphicsState> {
        self.state.lock().unwrap()
    }

    /// Register an application-owned texture, as an `EndFrame` caller would
    /// pass in.
    pub fn external_texture(&self, desc: TextureDesc) -> TextureHandle {
        let mut state = self.state();
        state.next_id += 1;
        let handle = TextureHandle(state.next_id);
        state.texture_descs.insert(handle, desc);
        handle
    }
}

impl GraphicsApi for MockGraphics {
    fn immediate_context(&self, device: DeviceHandle) -> ShimResult<ContextHandle> {
        assert_eq!(device, DEVICE);
        self.state().contexts_acquired += 1;
        Ok(CONTEXT)
    }

    fn release_context(&self, context: ContextHandle) {
        assert_eq!(context, CONTEXT);
        self.state().contexts_released += 1;
    }

    fn create_texture(&self, device: DeviceHandle, desc: &TextureDesc) -> ShimResult<TextureHandle> {
        assert_eq!(device, DEVICE);
        let mut state = self.state();
        if state.fail_texture_at == Some(state.created_textures.len()) {
            state.created_textures.push(*desc);
            return Err(ShimError::Service("CreateTexture2D failed".to_string()));
        }
        state.created_textures.push(*desc);
        state.next_id += 1;
        let handle = TextureHandle(state.next_id);
        state.live_textures.insert(handle);
        state.texture_descs.insert(handle, *desc);
        Ok(handle)
    }

    fn create_shader_view(
        &self,
        _device: DeviceHandle,
        texture: TextureHandle,
        format: DxgiFormat,
        _desc: &TextureDesc,
    ) -> ShimResult<ViewHandle> {
        let mut state = self.state();
        if state.fail_views {
            return Err(ShimError::Service("CreateShaderResourceView failed".to_string()));
        }
        state.next_id += 1;
        let view = ViewHandle(state.next_id);
        state.live_views.insert(view);
        state.views.push((view, texture, format));
        Ok(view)
    }

    fn texture_desc(&self, texture: TextureHandle) -> ShimResult<TextureDesc> {
        self.state()
            .texture_descs
            .get(&texture)
            .copied()
            .ok_or(ShimError::InvalidHandle)
    }

    fn copy_texture(&self, context: ContextHandle, dst: TextureHandle, src: TextureHandle) {
        self.state().copies.push((context, dst, src));
    }

    fn release_texture(&self, texture: TextureHandle) {
        let mut state = self.state();
        state.live_textures.remove(&texture);
        state.released_textures.push(texture);
    }

    fn release_view(&self, view: ViewHandle) {
        let mut state = self.state();
        state.live_views.remove(&view);
        state.released_views.push(view);
    }
}

pub struct Harness {
    pub runtime: Arc<MockRuntime>,
    pub graphics: Arc<MockGraphics>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            runtime: Arc::new(MockRuntime::default()),
            graphics: Arc::new(MockGraphics::default()),
        }
    }

    pub fn session(&self, revision: ApiRevision) -> ShimSession {
        self.session_with(revision, ShimSettings::default())
    }

    pub fn session_with(&self, revision: ApiRevision, settings: ShimSettings) -> ShimSession {
        ShimSession::new(
            self.runtime.clone(),
            self.graphics.clone(),
            SESSION,
            GraphicsLuid([1, 2, 3, 4, 5, 6, 7, 8]),
            revision,
            settings,
        )
    }
}

pub fn symmetric_fov(tan: f32) -> FovPort {
    FovPort {
        up_tan: tan,
        down_tan: tan,
        left_tan: tan,
        right_tan: tan,
    }
}
