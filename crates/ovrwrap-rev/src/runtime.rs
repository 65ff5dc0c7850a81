//! [`RuntimeApi`] over the dynamically loaded runtime.

use std::ffi::{c_int, c_uint, CStr};
use std::ptr;

use ovrwrap_common::ShimSettings;
use ovrwrap_core::{
    DeviceHandle, Eye, EyeRenderDesc, FovPort, GraphicsLuid, ResultCode, RuntimeApi,
    RuntimeBindFlags, RuntimeChainDesc, RuntimeChainHandle, RuntimeFormat, RuntimeLayer,
    RuntimeMirrorDesc, RuntimeMirrorHandle, RuntimeMiscFlags, SessionHandle, ShimError,
    ShimResult, Sizei, TextureHandle, ViewScaleDesc,
};
use tracing::{debug, info, warn};

use crate::loader::{RevFunctions, RevLibrary};
use crate::sys::*;

fn check(code: RevResult) -> ShimResult<ResultCode> {
    ResultCode(code).into_result()
}

fn to_c_int(value: u32, what: &str) -> ShimResult<c_int> {
    c_int::try_from(value).map_err(|_| ShimError::InvalidParameter(format!("{what} {value}")))
}

fn from_c_int(value: c_int, what: &str) -> ShimResult<u32> {
    u32::try_from(value).map_err(|_| ShimError::Service(format!("runtime reported {what} {value}")))
}

/// Fill in what the runtime expects from an initializer that did not ask
/// for a particular interface version.
pub fn normalize_init_params(params: Option<RevInitParams>) -> RevInitParams {
    let mut params = params.unwrap_or_default();
    if params.flags & REV_INIT_REQUEST_VERSION == 0 {
        params.flags |= REV_INIT_REQUEST_VERSION;
        params.requested_minor_version = REV_MINOR_VERSION;
    }
    params.flags &= REV_INIT_WRITABLE_BITS;
    params
}

pub fn chain_desc_to_rev(desc: &RuntimeChainDesc) -> ShimResult<RevTextureSwapChainDesc> {
    Ok(RevTextureSwapChainDesc {
        texture_type: REV_TEXTURE_2D,
        format: desc.format as c_int,
        array_size: to_c_int(desc.array_size, "array size")?,
        width: to_c_int(desc.width, "width")?,
        height: to_c_int(desc.height, "height")?,
        mip_levels: to_c_int(desc.mip_levels, "mip levels")?,
        sample_count: to_c_int(desc.sample_count, "sample count")?,
        static_image: RevBool::from(desc.static_image),
        misc_flags: desc.misc.bits(),
        bind_flags: desc.bind.bits(),
    })
}

pub fn chain_desc_from_rev(desc: &RevTextureSwapChainDesc) -> ShimResult<RuntimeChainDesc> {
    Ok(RuntimeChainDesc {
        format: RuntimeFormat::from_raw(desc.format),
        width: from_c_int(desc.width, "width")?,
        height: from_c_int(desc.height, "height")?,
        mip_levels: from_c_int(desc.mip_levels, "mip levels")?,
        array_size: from_c_int(desc.array_size, "array size")?,
        sample_count: from_c_int(desc.sample_count, "sample count")?,
        static_image: desc.static_image != 0,
        misc: RuntimeMiscFlags::from_bits_retain(desc.misc_flags),
        bind: RuntimeBindFlags::from_bits_retain(desc.bind_flags),
    })
}

pub fn mirror_desc_to_rev(desc: &RuntimeMirrorDesc) -> ShimResult<RevMirrorTextureDesc> {
    Ok(RevMirrorTextureDesc {
        format: desc.format as c_int,
        width: to_c_int(desc.width, "width")?,
        height: to_c_int(desc.height, "height")?,
        misc_flags: desc.misc.bits(),
    })
}

/// One layer in the runtime's own layout. Every variant starts with the
/// header, so a pointer to the header is a pointer to the layer.
#[derive(Debug, Clone, Copy)]
pub enum RevLayer {
    EyeFov(RevLayerEyeFov),
    Quad(RevLayerQuad),
    Header(RevLayerHeader),
}

impl RevLayer {
    pub fn from_runtime(layer: &RuntimeLayer) -> Self {
        let header = RevLayerHeader {
            layer_type: layer.layer_type() as c_int,
            flags: layer.flags().bits(),
            _align: [],
        };
        match *layer {
            RuntimeLayer::EyeFov {
                color,
                viewport,
                fov,
                render_pose,
                sensor_sample_time,
                ..
            } => Self::EyeFov(RevLayerEyeFov {
                header,
                color_texture: color.map(|chain| chain.as_ptr()),
                viewport,
                fov,
                render_pose,
                sensor_sample_time,
            }),
            RuntimeLayer::Quad {
                color,
                viewport,
                center_pose,
                size,
                ..
            } => Self::Quad(RevLayerQuad {
                header,
                color_texture: color.as_ptr(),
                viewport,
                quad_pose_center: center_pose,
                quad_size: size,
            }),
            RuntimeLayer::Disabled { .. } => Self::Header(header),
        }
    }

    pub fn header(&self) -> *const RevLayerHeader {
        match self {
            Self::EyeFov(layer) => &layer.header,
            Self::Quad(layer) => &layer.header,
            Self::Header(header) => header,
        }
    }
}

/// The loaded runtime.
#[derive(Debug)]
pub struct RevRuntime {
    library: RevLibrary,
}

impl RevRuntime {
    /// Find and load the runtime library named by `settings`.
    pub fn load(settings: &ShimSettings) -> ovrwrap_common::Result<Self> {
        let library = RevLibrary::load(settings.runtime_dir.as_deref())?;
        Ok(Self { library })
    }

    pub fn from_library(library: RevLibrary) -> Self {
        Self { library }
    }

    pub fn library_path(&self) -> &std::path::Path {
        self.library.path()
    }

    fn api(&self) -> &RevFunctions {
        self.library.functions()
    }

    // Lifecycle

    pub fn initialize(&self, params: Option<RevInitParams>) -> ShimResult<()> {
        let params = normalize_init_params(params);
        let code = unsafe { (self.api().initialize)(&params) };
        if let Err(err) = check(code) {
            let (_, message) = self.last_error();
            warn!("runtime initialization failed: {message}");
            return Err(err);
        }
        info!(
            minor_version = params.requested_minor_version,
            "runtime initialized"
        );
        Ok(())
    }

    pub fn shutdown(&self) {
        unsafe { (self.api().shutdown)() };
        debug!("runtime shut down");
    }

    /// The last error the runtime recorded on this thread.
    pub fn last_error(&self) -> (ResultCode, String) {
        let mut info = RevErrorInfo::default();
        unsafe { (self.api().get_last_error_info)(&mut info) };
        // The runtime NUL-terminates; the last byte is forced in case it did not.
        info.error_string[info.error_string.len() - 1] = 0;
        let message = unsafe { CStr::from_ptr(info.error_string.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        (ResultCode(info.result), message)
    }

    pub fn create_session(&self) -> ShimResult<(SessionHandle, GraphicsLuid)> {
        let mut session: RevSession = ptr::null_mut();
        let mut luid = RevGraphicsLuid::default();
        check(unsafe { (self.api().create)(&mut session, &mut luid) })?;
        if session.is_null() {
            return Err(ShimError::Service("runtime returned no session".to_string()));
        }
        Ok((SessionHandle::from_ptr(session), GraphicsLuid(luid.reserved)))
    }

    pub fn destroy_session(&self, session: SessionHandle) {
        unsafe { (self.api().destroy)(session.as_ptr()) };
    }

    pub fn hmd_desc(&self, session: SessionHandle) -> RevHmdDesc {
        unsafe { (self.api().get_hmd_desc)(session.as_ptr()) }
    }
}

impl RuntimeApi for RevRuntime {
    fn create_texture_swap_chain(
        &self,
        session: SessionHandle,
        device: DeviceHandle,
        desc: &RuntimeChainDesc,
    ) -> ShimResult<RuntimeChainHandle> {
        let rev_desc = chain_desc_to_rev(desc)?;
        let mut chain: RevTextureSwapChain = ptr::null_mut();
        check(unsafe {
            (self.api().create_texture_swap_chain_dx)(
                session.as_ptr(),
                device.as_ptr(),
                &rev_desc,
                &mut chain,
            )
        })?;
        Ok(RuntimeChainHandle::from_ptr(chain))
    }

    fn texture_swap_chain_length(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<usize> {
        let mut length: c_int = 0;
        check(unsafe {
            (self.api().get_texture_swap_chain_length)(session.as_ptr(), chain.as_ptr(), &mut length)
        })?;
        Ok(from_c_int(length, "chain length")? as usize)
    }

    fn texture_swap_chain_current_index(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<usize> {
        let mut index: c_int = 0;
        check(unsafe {
            (self.api().get_texture_swap_chain_current_index)(
                session.as_ptr(),
                chain.as_ptr(),
                &mut index,
            )
        })?;
        Ok(from_c_int(index, "chain index")? as usize)
    }

    fn texture_swap_chain_desc(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<RuntimeChainDesc> {
        let mut desc = RevTextureSwapChainDesc::default();
        check(unsafe {
            (self.api().get_texture_swap_chain_desc)(session.as_ptr(), chain.as_ptr(), &mut desc)
        })?;
        chain_desc_from_rev(&desc)
    }

    fn texture_swap_chain_buffer(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
        index: usize,
    ) -> ShimResult<TextureHandle> {
        let index = c_int::try_from(index)
            .map_err(|_| ShimError::InvalidParameter(format!("buffer index {index}")))?;
        let mut buffer = ptr::null_mut();
        check(unsafe {
            (self.api().get_texture_swap_chain_buffer_dx)(
                session.as_ptr(),
                chain.as_ptr(),
                index,
                IID_ID3D11_TEXTURE2D,
                &mut buffer,
            )
        })?;
        if buffer.is_null() {
            return Err(ShimError::Service(format!("no texture for buffer {index}")));
        }
        Ok(TextureHandle::from_ptr(buffer))
    }

    fn commit_texture_swap_chain(
        &self,
        session: SessionHandle,
        chain: RuntimeChainHandle,
    ) -> ShimResult<()> {
        check(unsafe { (self.api().commit_texture_swap_chain)(session.as_ptr(), chain.as_ptr()) })?;
        Ok(())
    }

    fn destroy_texture_swap_chain(&self, session: SessionHandle, chain: RuntimeChainHandle) {
        unsafe { (self.api().destroy_texture_swap_chain)(session.as_ptr(), chain.as_ptr()) };
    }

    fn create_mirror_texture(
        &self,
        session: SessionHandle,
        device: DeviceHandle,
        desc: &RuntimeMirrorDesc,
    ) -> ShimResult<RuntimeMirrorHandle> {
        let rev_desc = mirror_desc_to_rev(desc)?;
        let mut mirror: RevMirrorTexture = ptr::null_mut();
        check(unsafe {
            (self.api().create_mirror_texture_dx)(
                session.as_ptr(),
                device.as_ptr(),
                &rev_desc,
                &mut mirror,
            )
        })?;
        Ok(RuntimeMirrorHandle::from_ptr(mirror))
    }

    fn mirror_texture_buffer(
        &self,
        session: SessionHandle,
        mirror: RuntimeMirrorHandle,
    ) -> ShimResult<TextureHandle> {
        let mut buffer = ptr::null_mut();
        check(unsafe {
            (self.api().get_mirror_texture_buffer_dx)(
                session.as_ptr(),
                mirror.as_ptr(),
                IID_ID3D11_TEXTURE2D,
                &mut buffer,
            )
        })?;
        if buffer.is_null() {
            return Err(ShimError::Service("no mirror texture".to_string()));
        }
        Ok(TextureHandle::from_ptr(buffer))
    }

    fn destroy_mirror_texture(&self, session: SessionHandle, mirror: RuntimeMirrorHandle) {
        unsafe { (self.api().destroy_mirror_texture)(session.as_ptr(), mirror.as_ptr()) };
    }

    fn render_desc(&self, session: SessionHandle, eye: Eye, fov: FovPort) -> EyeRenderDesc {
        unsafe { (self.api().get_render_desc)(session.as_ptr(), eye as c_int, fov) }
    }

    fn fov_texture_size(
        &self,
        session: SessionHandle,
        eye: Eye,
        fov: FovPort,
        pixels_per_display_pixel: f32,
    ) -> Sizei {
        unsafe {
            (self.api().get_fov_texture_size)(
                session.as_ptr(),
                eye as c_int,
                fov,
                pixels_per_display_pixel,
            )
        }
    }

    fn submit_frame(
        &self,
        session: SessionHandle,
        frame_index: i64,
        view_scale: Option<&ViewScaleDesc>,
        layers: &[RuntimeLayer],
    ) -> ShimResult<ResultCode> {
        let rev_layers: Vec<RevLayer> = layers.iter().map(RevLayer::from_runtime).collect();
        let headers: Vec<*const RevLayerHeader> = rev_layers.iter().map(RevLayer::header).collect();
        let view_scale = view_scale.map_or(ptr::null(), |scale| scale as *const ViewScaleDesc);

        let code = unsafe {
            (self.api().submit_frame)(
                session.as_ptr(),
                frame_index,
                view_scale,
                headers.as_ptr(),
                headers.len() as c_uint,
            )
        };
        check(code)
    }

    fn predicted_display_time(&self, session: SessionHandle, frame_index: i64) -> f64 {
        unsafe { (self.api().get_predicted_display_time)(session.as_ptr(), frame_index) }
    }

    fn time_in_seconds(&self) -> f64 {
        unsafe { (self.api().get_time_in_seconds)() }
    }

    fn display_refresh_rate(&self, session: SessionHandle) -> f32 {
        self.hmd_desc(session).display_refresh_rate
    }
}
