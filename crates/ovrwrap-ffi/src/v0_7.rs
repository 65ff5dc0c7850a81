//! Entry points of the 0.7 API.
//!
//! Sessions replaced device descriptions, and texture creation takes an
//! explicit typeless request in its misc flags.

use std::ffi::{c_char, c_int, c_uint, c_void};

use ovrwrap_core::{
    ApiRevision, EyeRenderDesc, FovPort, GraphicsLuid, ResultCode, SessionHandle, ShimError,
    ShimResult, Sizei, ViewScaleDesc,
};
use tracing::trace;

use crate::legacy::{
    D3d11Texture2dDesc, FrameTimingV6, InitParams, LayerHeader, SwapTextureSet, Texture,
};
use crate::state::{self, SessionKey};
use crate::v0_6;

pub const REVISION: ApiRevision = ApiRevision::V0_7;

static VERSION: &str = "0.7.0.0\0";

fn key(session: *mut c_void) -> SessionKey {
    SessionKey::Session(SessionHandle::from_ptr(session))
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_Initialize(params: *const InitParams) -> c_int {
    trace!("ovr_Initialize");
    state::initialize_v7(params.as_ref()).0
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_Shutdown() {
    trace!("ovr_Shutdown");
    state::lock().shutdown();
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_GetVersionString() -> *const c_char {
    VERSION.as_ptr().cast()
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_GetTimeInSeconds() -> f64 {
    state::time_in_seconds()
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_Create(out_session: *mut *mut c_void, out_luid: *mut GraphicsLuid) -> c_int {
    create_session(REVISION, out_session, out_luid)
}

pub(crate) unsafe fn create_session(
    revision: ApiRevision,
    out_session: *mut *mut c_void,
    out_luid: *mut GraphicsLuid,
) -> c_int {
    trace!(%revision, "ovr_Create");
    let result = (|| -> ShimResult<ResultCode> {
        let out = out_session
            .as_mut()
            .ok_or_else(|| ShimError::InvalidParameter("null session pointer".to_string()))?;
        *out = std::ptr::null_mut();

        let mut shim = state::lock();
        let handle = shim.open_session(revision)?;
        let luid = shim.session(SessionKey::Session(handle))?.graphics_luid();
        if let Some(out_luid) = out_luid.as_mut() {
            *out_luid = luid;
        }
        *out = handle.as_ptr();
        Ok(ResultCode::SUCCESS)
    })();
    state::report("ovr_Create", result)
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_Destroy(session: *mut c_void) {
    trace!("ovr_Destroy");
    state::lock().destroy(key(session));
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_CreateSwapTextureSetD3D11(
    session: *mut c_void,
    device: *mut c_void,
    desc: *const D3d11Texture2dDesc,
    misc_flags: c_uint,
    out_texture_set: *mut *mut SwapTextureSet,
) -> c_int {
    v0_6::create_swap_texture_set(
        "ovr_CreateSwapTextureSetD3D11",
        key(session),
        device,
        desc,
        misc_flags,
        out_texture_set,
    )
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_DestroySwapTextureSet(
    session: *mut c_void,
    texture_set: *mut SwapTextureSet,
) {
    trace!("ovr_DestroySwapTextureSet");
    state::lock().destroy_swap_set(key(session), texture_set);
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_CreateMirrorTextureD3D11(
    session: *mut c_void,
    device: *mut c_void,
    desc: *const D3d11Texture2dDesc,
    misc_flags: c_uint,
    out_mirror_texture: *mut *mut Texture,
) -> c_int {
    v0_6::create_mirror_texture(
        "ovr_CreateMirrorTextureD3D11",
        key(session),
        device,
        desc,
        misc_flags,
        out_mirror_texture,
    )
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_DestroyMirrorTexture(session: *mut c_void, mirror_texture: *mut Texture) {
    trace!("ovr_DestroyMirrorTexture");
    state::lock().destroy_mirror(key(session), mirror_texture);
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_GetFovTextureSize(
    session: *mut c_void,
    eye: c_int,
    fov: FovPort,
    pixels_per_display_pixel: f32,
) -> Sizei {
    v0_6::fov_texture_size(key(session), eye, fov, pixels_per_display_pixel)
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_GetRenderDesc(session: *mut c_void, eye: c_int, fov: FovPort) -> EyeRenderDesc {
    v0_6::render_desc(key(session), eye, fov)
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_SubmitFrame(
    session: *mut c_void,
    frame_index: c_uint,
    view_scale_desc: *const ViewScaleDesc,
    layer_ptr_list: *const *const LayerHeader,
    layer_count: c_uint,
) -> c_int {
    v0_6::submit_frame(
        "ovr_SubmitFrame",
        key(session),
        i64::from(frame_index),
        view_scale_desc,
        layer_ptr_list,
        layer_count,
    )
}

#[cfg_attr(export_abi = "0_7", no_mangle)]
pub unsafe extern "C" fn ovr_GetFrameTiming(session: *mut c_void, frame_index: c_uint) -> FrameTimingV6 {
    v0_6::frame_timing(key(session), frame_index)
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use std::ptr;

    use super::*;

    #[test]
    fn test_version_string() {
        let version = unsafe { CStr::from_ptr(ovr_GetVersionString()) };
        assert_eq!(version.to_str().unwrap(), REVISION.version_string());
    }

    #[test]
    fn test_create_rejects_null_out_pointer() {
        let code = unsafe { ovr_Create(ptr::null_mut(), ptr::null_mut()) };
        assert_eq!(code, ResultCode::INVALID_PARAMETER.0);
    }

    #[test]
    fn test_unknown_session() {
        let session = 0x5e55 as *mut c_void;
        assert_eq!(unsafe { ovr_GetFrameTiming(session, 2) }, FrameTimingV6::default());
        assert_eq!(
            unsafe { ovr_GetRenderDesc(session, 0, FovPort::default()) },
            EyeRenderDesc::default()
        );
        unsafe {
            ovr_DestroySwapTextureSet(session, 0x20 as *mut SwapTextureSet);
            ovr_DestroyMirrorTexture(session, 0x30 as *mut Texture);
            ovr_Destroy(session);
        }
    }
}
