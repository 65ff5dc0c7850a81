//! The single process-wide shim state.
//!
//! Legacy applications assume one runtime and at most one device per
//! process, so everything the exported functions share lives in one value
//! behind one lock: the loaded runtime, the session, and the allocations
//! whose addresses the caller holds.
//!
//! The runtime is also published outside that lock so clock queries never
//! wait on it.

use std::collections::HashMap;
use std::ffi::{c_int, c_uint};
use std::ops::{Deref, DerefMut};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use once_cell::sync::Lazy;
use ovrwrap_common::ShimSettings;
use ovrwrap_core::{
    ApiRevision, DeviceHandle, Eye, EyeRenderDesc, EyeTexture, FovPort, FrameTiming, Posef,
    ResultCode, RuntimeApi, SessionHandle, ShimError, ShimResult, ShimSession, Sizei, TextureDesc,
    ViewScaleDesc, RUNTIME_MAX_LAYERS,
};
use ovrwrap_rev::sys::RevInitParams;
use ovrwrap_rev::{platform_graphics, RevRuntime};
use tracing::{debug, error, info, warn};

use crate::legacy::{
    decode_layer, Exposed, HmdDescV4, HmdDescV4Alloc, HmdDescV6, HmdDescV6Alloc, InitParams,
    InitParamsV5, LayerHeader, MirrorTextureAlloc, OvrBool, RenderApiConfig, SwapTextureSet,
    SwapTextureSetAlloc, Texture, TextureV4, OVR_FALSE, OVR_TRUE, RENDER_API_D3D11,
    TEXTURE_MISC_TYPELESS,
};
use crate::logging;

/// How an entry point names its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    /// 0.4 to 0.6: the address of the device description we handed out.
    Hmd(usize),
    /// 0.7 and 0.8: the runtime session itself.
    Session(SessionHandle),
}

#[derive(Debug)]
enum LegacyHmd {
    V4(Exposed<HmdDescV4Alloc>),
    V6(Exposed<HmdDescV6Alloc>),
}

impl LegacyHmd {
    fn addr(&self) -> usize {
        match self {
            Self::V4(alloc) => alloc.addr(),
            Self::V6(alloc) => alloc.addr(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ShimState {
    settings: Option<ShimSettings>,
    runtime: Option<Arc<RevRuntime>>,
    session: Option<ShimSession>,
    hmd: Option<LegacyHmd>,
    swap_sets: HashMap<usize, Exposed<SwapTextureSetAlloc>>,
    mirror: Option<Exposed<MirrorTextureAlloc>>,
}

static STATE: Lazy<Mutex<ShimState>> = Lazy::new(|| Mutex::new(ShimState::default()));

static RUNTIME: RwLock<Option<Arc<RevRuntime>>> = RwLock::new(None);

/// Exclusive access to the shim state.
///
/// Runtime log messages raised while it is held reach the caller's callback
/// after the lock is released.
pub struct StateGuard {
    // Field order matters: the lock is released before queued messages go out.
    guard: MutexGuard<'static, ShimState>,
    _deferral: logging::Deferral,
}

impl Deref for StateGuard {
    type Target = ShimState;

    fn deref(&self) -> &ShimState {
        &self.guard
    }
}

impl DerefMut for StateGuard {
    fn deref_mut(&mut self) -> &mut ShimState {
        &mut self.guard
    }
}

/// Lock the shim state. A panic on another thread does not make the state
/// unusable, so a poisoned lock is taken over.
pub fn lock() -> StateGuard {
    let guard = match STATE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    StateGuard {
        guard,
        _deferral: logging::Deferral::hold(),
    }
}

fn publish_runtime(runtime: Option<Arc<RevRuntime>>) {
    let mut slot = match RUNTIME.write() {
        Ok(slot) => slot,
        Err(poisoned) => poisoned.into_inner(),
    };
    *slot = runtime;
}

/// Runtime clock, or zero before initialization. Does not take the state
/// lock.
pub fn time_in_seconds() -> f64 {
    let slot = match RUNTIME.read() {
        Ok(slot) => slot,
        Err(poisoned) => poisoned.into_inner(),
    };
    slot.as_ref().map_or(0.0, |runtime| runtime.time_in_seconds())
}

/// Result code for a failure outside the core.
pub fn setup_error_code(err: &ovrwrap_common::Error) -> ResultCode {
    match err {
        ovrwrap_common::Error::LibraryNotFound(_) | ovrwrap_common::Error::MissingSymbol(_) => {
            ResultCode::LIB_LOAD
        }
        _ => ResultCode::INITIALIZE,
    }
}

/// Log a failure and reduce the outcome to the caller's result code.
pub fn report(operation: &str, result: ShimResult<ResultCode>) -> c_int {
    match result {
        Ok(code) => code.0,
        Err(err) => {
            error!(operation, "{err}");
            err.result_code().0
        }
    }
}

/// [`report`] for revisions that answer with `ovrBool`.
pub fn report_bool(operation: &str, result: ShimResult<ResultCode>) -> OvrBool {
    if ResultCode(report(operation, result)).is_success() {
        OVR_TRUE
    } else {
        OVR_FALSE
    }
}

/// Runtime initialization parameters for a caller's flags.
///
/// The caller's requested version names a legacy revision, which means
/// nothing to the runtime; the runtime is always asked for the version this
/// shim was written against.
pub fn runtime_init_params(flags: u32, connection_timeout_ms: u32) -> RevInitParams {
    RevInitParams {
        flags: flags & !ovrwrap_rev::sys::REV_INIT_REQUEST_VERSION,
        requested_minor_version: 0,
        log_callback: logging::runtime_callback(),
        user_data: 0,
        connection_timeout_ms,
    }
}

/// `ovr_Initialize` for 0.4 to 0.6. The caller's callback, if any, receives
/// the runtime's log messages.
pub fn initialize_v5(params: Option<&InitParamsV5>) -> ResultCode {
    let (flags, timeout) = match params {
        Some(params) => {
            logging::install_v5(params.log_callback);
            (params.flags, params.connection_timeout_ms)
        }
        None => {
            logging::clear();
            (0, 0)
        }
    };
    finish_initialize(runtime_init_params(flags, timeout))
}

/// `ovr_Initialize` for 0.7 and 0.8.
pub fn initialize_v7(params: Option<&InitParams>) -> ResultCode {
    let (flags, timeout) = match params {
        Some(params) => {
            logging::install(params.log_callback, params.user_data);
            (params.flags, params.connection_timeout_ms)
        }
        None => {
            logging::clear();
            (0, 0)
        }
    };
    finish_initialize(runtime_init_params(flags, timeout))
}

fn finish_initialize(params: RevInitParams) -> ResultCode {
    match lock().initialize(params) {
        Ok(()) => ResultCode::SUCCESS,
        Err(code) => {
            logging::clear();
            code
        }
    }
}

/// Run `f` on the session `key` names. Entry points that cannot report
/// failure get `T::default()` instead, and the failure is logged.
pub fn with_session<T: Default>(
    operation: &str,
    key: SessionKey,
    f: impl FnOnce(&mut ShimSession) -> T,
) -> T {
    match lock().session(key) {
        Ok(session) => f(session),
        Err(err) => {
            warn!(operation, "{err}");
            T::default()
        }
    }
}

/// Decode a caller's eye index, logging anything out of range.
pub fn eye(operation: &str, raw: c_int) -> Option<Eye> {
    let eye = Eye::from_raw(raw);
    if eye.is_none() {
        warn!(operation, eye = raw, "invalid eye index");
    }
    eye
}

fn invalid_session() -> ShimError {
    ShimError::Runtime(ResultCode::INVALID_SESSION)
}

fn resolve_session<'a>(
    session: &'a mut Option<ShimSession>,
    hmd: &Option<LegacyHmd>,
    key: SessionKey,
) -> ShimResult<&'a mut ShimSession> {
    let session = session.as_mut().ok_or_else(invalid_session)?;
    let matches = match key {
        SessionKey::Hmd(addr) => addr != 0 && hmd.as_ref().map(LegacyHmd::addr) == Some(addr),
        SessionKey::Session(handle) => !handle.is_null() && session.session_handle() == handle,
    };
    if matches {
        Ok(session)
    } else {
        Err(invalid_session())
    }
}

/// The session `key` names, provided its revision renders through
/// `EndFrame`.
fn end_frame_session<'a>(
    session: &'a mut Option<ShimSession>,
    hmd: &Option<LegacyHmd>,
    key: SessionKey,
) -> ShimResult<&'a mut ShimSession> {
    let session = resolve_session(session, hmd, key)?;
    if session.revision().uses_end_frame() {
        Ok(session)
    } else {
        Err(ShimError::Unsupported(format!(
            "{} sessions submit layers instead of ending frames",
            session.revision()
        )))
    }
}

fn typeless_requested(revision: ApiRevision, misc_flags: c_uint) -> bool {
    revision.explicit_typeless_flag() && misc_flags & TEXTURE_MISC_TYPELESS != 0
}

fn texture_size(desc: &TextureDesc) -> Sizei {
    Sizei {
        w: i32::try_from(desc.width).unwrap_or(i32::MAX),
        h: i32::try_from(desc.height).unwrap_or(i32::MAX),
    }
}

impl ShimState {
    pub fn is_initialized(&self) -> bool {
        self.runtime.is_some()
    }

    // Lifecycle

    /// Load settings and the runtime, then initialize it. Repeated calls
    /// after a success do nothing.
    pub fn initialize(&mut self, params: RevInitParams) -> Result<(), ResultCode> {
        if self.runtime.is_some() {
            debug!("already initialized");
            return Ok(());
        }

        let settings = match ShimSettings::load() {
            Ok(settings) => settings,
            Err(err) => {
                ovrwrap_common::init_tracing("info");
                error!("could not load settings: {err}");
                return Err(setup_error_code(&err));
            }
        };
        ovrwrap_common::init_tracing_from(&settings);

        let runtime = RevRuntime::load(&settings).map_err(|err| {
            error!("could not load the runtime: {err}");
            setup_error_code(&err)
        })?;
        runtime
            .initialize(Some(params))
            .map_err(|err| err.result_code())?;

        info!(
            library = %runtime.library_path().display(),
            srgb_correction = settings.srgb_correction,
            "shim initialized"
        );
        let runtime = Arc::new(runtime);
        publish_runtime(Some(Arc::clone(&runtime)));
        self.settings = Some(settings);
        self.runtime = Some(runtime);
        Ok(())
    }

    /// Close any session and shut the runtime down.
    pub fn shutdown(&mut self) {
        self.close_session();
        if let Some(runtime) = self.runtime.take() {
            publish_runtime(None);
            runtime.shutdown();
        }
        self.settings = None;
        logging::clear();
    }

    fn runtime(&self) -> ShimResult<&Arc<RevRuntime>> {
        self.runtime
            .as_ref()
            .ok_or(ShimError::Runtime(ResultCode::NOT_INITIALIZED))
    }

    // Sessions

    /// Create the runtime session and the shim state around it.
    pub fn open_session(&mut self, revision: ApiRevision) -> ShimResult<SessionHandle> {
        if self.session.is_some() {
            return Err(ShimError::Unsupported(
                "only one session per process is supported".to_string(),
            ));
        }
        let runtime = Arc::clone(self.runtime()?);
        let settings = self.settings.clone().unwrap_or_default();

        let (handle, luid) = runtime.create_session()?;
        let session = ShimSession::new(runtime, platform_graphics(), handle, luid, revision, settings);
        info!(session = handle.0, %revision, "session created");
        self.session = Some(session);
        Ok(handle)
    }

    /// Release everything the caller was given, then the session itself.
    pub fn close_session(&mut self) {
        self.swap_sets.clear();
        self.mirror = None;
        self.hmd = None;

        if let Some(session) = self.session.take() {
            let handle = session.session_handle();
            drop(session);
            if let Some(runtime) = &self.runtime {
                runtime.destroy_session(handle);
            }
            info!(session = handle.0, "session destroyed");
        }
    }

    /// Open a session for 0.4/0.5 and describe the device.
    pub fn create_hmd_v4(&mut self, revision: ApiRevision) -> ShimResult<*const HmdDescV4> {
        let handle = self.open_session(revision)?;
        let desc = self.runtime()?.hmd_desc(handle);
        let alloc = HmdDescV4Alloc::build(revision, handle, &desc);
        // SAFETY: `alloc` is live; the description is its first field.
        let desc_ptr = unsafe { ptr::addr_of!((*alloc.as_ptr()).desc) };
        self.hmd = Some(LegacyHmd::V4(alloc));
        Ok(desc_ptr)
    }

    /// Open a session for 0.6 and describe the device.
    pub fn create_hmd_v6(&mut self) -> ShimResult<*const HmdDescV6> {
        let handle = self.open_session(ApiRevision::V0_6)?;
        let desc = self.runtime()?.hmd_desc(handle);
        let alloc = HmdDescV6Alloc::build(handle, &desc);
        // SAFETY: as above.
        let desc_ptr = unsafe { ptr::addr_of!((*alloc.as_ptr()).desc) };
        self.hmd = Some(LegacyHmd::V6(alloc));
        Ok(desc_ptr)
    }

    /// Destroy the session `key` names. Anything else is ignored.
    pub fn destroy(&mut self, key: SessionKey) {
        if resolve_session(&mut self.session, &self.hmd, key).is_ok() {
            self.close_session();
        } else {
            warn!(?key, "destroy for an unknown session ignored");
        }
    }

    pub fn session(&mut self, key: SessionKey) -> ShimResult<&mut ShimSession> {
        resolve_session(&mut self.session, &self.hmd, key)
    }

    // Swap texture sets

    /// `misc_flags` are the caller's texture flags; revisions without them
    /// pass zero.
    pub fn create_swap_set(
        &mut self,
        key: SessionKey,
        device: DeviceHandle,
        desc: &TextureDesc,
        misc_flags: c_uint,
    ) -> ShimResult<*mut SwapTextureSet> {
        let session = resolve_session(&mut self.session, &self.hmd, key)?;
        let typeless = typeless_requested(session.revision(), misc_flags);
        let chain = session.create_swap_chain(device, desc, typeless)?;
        let visible = session.swap_chain(chain)?.visible_textures();
        let alloc = SwapTextureSetAlloc::build(chain, visible, texture_size(desc));

        // SAFETY: `alloc` is live; the public set is its first field.
        let set = unsafe { ptr::addr_of_mut!((*alloc.as_ptr()).set) };
        self.swap_sets.insert(alloc.addr(), alloc);
        Ok(set)
    }

    /// Destroy a swap texture set. Sets the shim did not hand out are
    /// ignored.
    pub fn destroy_swap_set(&mut self, key: SessionKey, set: *mut SwapTextureSet) {
        let Some(alloc) = self.swap_sets.remove(&(set as usize)) else {
            warn!(set = set as usize, "destroy for an unknown swap texture set ignored");
            return;
        };
        // SAFETY: the allocation came out of our own map.
        let chain = unsafe { SwapTextureSetAlloc::chain(&alloc) };
        match resolve_session(&mut self.session, &self.hmd, key) {
            Ok(session) => session.destroy_swap_chain(chain),
            Err(err) => warn!("swap texture set outlived its session: {err}"),
        }
    }

    pub fn swap_set_count(&self) -> usize {
        self.swap_sets.len()
    }

    // Mirror

    pub fn create_mirror(
        &mut self,
        key: SessionKey,
        device: DeviceHandle,
        desc: &TextureDesc,
        misc_flags: c_uint,
    ) -> ShimResult<*mut Texture> {
        let session = resolve_session(&mut self.session, &self.hmd, key)?;
        let typeless = typeless_requested(session.revision(), misc_flags);
        let handle = match session.create_mirror(device, desc, typeless) {
            Ok(handle) => handle,
            Err(err) => {
                // A failure after the live mirror was released leaves its
                // caller-visible texture dangling.
                if !session.has_mirror() {
                    self.mirror = None;
                }
                return Err(err);
            }
        };
        let record = session.mirror(handle)?;
        let texture = Texture::d3d11(record.texture(), record.view(), texture_size(desc));

        // The session released any earlier mirror; its caller-visible
        // texture goes with it.
        let alloc = Exposed::new(MirrorTextureAlloc { texture, handle });
        // SAFETY: `alloc` is live; the texture is its first field.
        let texture_ptr = unsafe { ptr::addr_of_mut!((*alloc.as_ptr()).texture) };
        self.mirror = Some(alloc);
        Ok(texture_ptr)
    }

    /// Destroy the mirror. Anything but the live mirror texture is ignored.
    pub fn destroy_mirror(&mut self, key: SessionKey, texture: *mut Texture) {
        let is_live = matches!(&self.mirror, Some(alloc) if alloc.addr() == texture as usize);
        if !is_live {
            warn!(texture = texture as usize, "destroy for an unknown mirror texture ignored");
            return;
        }
        if let Some(alloc) = self.mirror.take() {
            // SAFETY: the allocation is ours and still live.
            let handle = unsafe { (*alloc.as_ptr()).handle };
            if let Ok(session) = resolve_session(&mut self.session, &self.hmd, key) {
                session.destroy_mirror(handle);
            }
        }
    }

    // Frames

    /// Decode the caller's layer list and submit it.
    ///
    /// Null entries are dropped and the rest truncated to the runtime limit
    /// before anything is decoded, so layers past the limit are never
    /// looked at. Each referenced set's `CurrentIndex` is read as the caller
    /// left it and becomes the texture that gets committed.
    ///
    /// # Safety
    /// Every non-null entry of `layers` must point at a layer laid out for
    /// the session's revision.
    pub unsafe fn submit_frame(
        &mut self,
        key: SessionKey,
        frame_index: i64,
        view_scale: Option<&ViewScaleDesc>,
        layers: &[*const LayerHeader],
    ) -> ShimResult<ResultCode> {
        let session = resolve_session(&mut self.session, &self.hmd, key)?;
        let revision = session.revision();
        let sets = &self.swap_sets;

        if !revision.eye_layer_sample_time() {
            let now = session.time_in_seconds();
            session.record_tracking_sample(now);
        }

        let present = layers.iter().filter(|header| !header.is_null()).count();
        if present > RUNTIME_MAX_LAYERS {
            debug!(present, limit = RUNTIME_MAX_LAYERS, "ignoring layers past the runtime limit");
        }

        let mut decoded = Vec::with_capacity(present.min(RUNTIME_MAX_LAYERS));
        let kept = layers.iter().filter(|header| !header.is_null()).take(RUNTIME_MAX_LAYERS);
        for &header in kept {
            let layer = decode_layer(revision, header, |set| {
                let alloc = sets.get(&(set as usize)).ok_or(ShimError::InvalidHandle)?;
                let chain = SwapTextureSetAlloc::chain(alloc);
                let index = SwapTextureSetAlloc::current_index(alloc);
                session.set_visible_index(chain, usize::try_from(index).unwrap_or(0))?;
                Ok(chain)
            })?;
            decoded.push(layer);
        }

        session.submit_frame(frame_index, view_scale, &decoded)
    }

    pub fn frame_timing(&mut self, key: SessionKey, frame_index: i64) -> ShimResult<FrameTiming> {
        Ok(self.session(key)?.frame_timing(frame_index))
    }

    pub fn begin_frame(&mut self, key: SessionKey, frame_index: i64) -> ShimResult<FrameTiming> {
        Ok(self.session(key)?.begin_frame(frame_index))
    }

    pub fn reset_frame_timing(&mut self, key: SessionKey, frame_index: i64) -> ShimResult<()> {
        self.session(key)?.reset_frame_timing(frame_index);
        Ok(())
    }

    // 0.4/0.5 rendering

    /// Remember the D3D11 device and context for `EndFrame`. Without a
    /// configuration only the render descriptions are produced.
    pub fn configure_rendering(
        &mut self,
        key: SessionKey,
        config: Option<&RenderApiConfig>,
        fov: [FovPort; 2],
    ) -> ShimResult<[EyeRenderDesc; 2]> {
        let session = end_frame_session(&mut self.session, &self.hmd, key)?;
        match config {
            None => Ok(Eye::BOTH.map(|eye| session.render_desc(eye, fov[eye.index()]))),
            Some(config) if config.header.api != RENDER_API_D3D11 => Err(ShimError::Unsupported(
                format!("rendering API {}", config.header.api),
            )),
            Some(config) => Ok(session.configure_rendering(config.device(), config.context(), fov)),
        }
    }

    pub fn end_frame(
        &mut self,
        key: SessionKey,
        render_pose: [Posef; 2],
        eye_textures: &[TextureV4; 2],
    ) -> ShimResult<ResultCode> {
        let session = end_frame_session(&mut self.session, &self.hmd, key)?;
        if let Some(other) = eye_textures
            .iter()
            .map(|texture| texture.header.api)
            .find(|api| *api != RENDER_API_D3D11)
        {
            return Err(ShimError::Unsupported(format!("eye texture API {other}")));
        }
        let eyes = eye_textures.map(|texture| EyeTexture {
            texture: texture.texture(),
            size: texture.header.texture_size,
            viewport: texture.header.render_viewport,
        });
        session.end_frame(render_pose, eyes)
    }

    #[cfg(test)]
    fn install_session(&mut self, session: ShimSession) {
        self.session = Some(session);
    }
}
