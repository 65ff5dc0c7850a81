//! Entry points of the 0.6 API.
//!
//! 0.6 introduced swap texture sets and layer submission. The helpers here
//! are shared with 0.7 and 0.8, which only renamed the functions and widened
//! a few parameters.

use std::ffi::{c_char, c_int, c_uint, c_void};
use std::ptr;
use std::slice;

use ovrwrap_core::{
    ApiRevision, DeviceHandle, EyeRenderDesc, FovPort, FrameTiming, ResultCode, ShimError,
    ShimResult, Sizei, TextureDesc, ViewScaleDesc,
};
use tracing::{trace, warn};

use crate::legacy::{
    D3d11Texture2dDesc, FrameTimingV6, HmdDescV6, InitParamsV5, LayerHeader, SwapTextureSet,
    Texture,
};
use crate::state::{self, SessionKey};

pub const REVISION: ApiRevision = ApiRevision::V0_6;

static VERSION: &str = "0.6.0.1\0";

fn key(hmd: *const HmdDescV6) -> SessionKey {
    SessionKey::Hmd(hmd as usize)
}

fn null_argument(what: &str) -> ShimError {
    ShimError::InvalidParameter(format!("null {what}"))
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovr_Initialize(params: *const InitParamsV5) -> c_int {
    trace!("ovr_Initialize");
    state::initialize_v5(params.as_ref()).0
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovr_Shutdown() {
    trace!("ovr_Shutdown");
    state::lock().shutdown();
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovr_GetVersionString() -> *const c_char {
    VERSION.as_ptr().cast()
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovr_GetTimeInSeconds() -> f64 {
    state::time_in_seconds()
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_Create(index: c_int, out_hmd: *mut *const HmdDescV6) -> c_int {
    trace!(index, "ovrHmd_Create");
    let result = out_hmd
        .as_mut()
        .ok_or_else(|| null_argument("device pointer"))
        .and_then(|out| {
            *out = ptr::null();
            *out = state::lock().create_hmd_v6()?;
            Ok(ResultCode::SUCCESS)
        });
    state::report("ovrHmd_Create", result)
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_Destroy(hmd: *const HmdDescV6) {
    trace!("ovrHmd_Destroy");
    state::lock().destroy(key(hmd));
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_CreateSwapTextureSetD3D11(
    hmd: *const HmdDescV6,
    device: *mut c_void,
    desc: *const D3d11Texture2dDesc,
    out_texture_set: *mut *mut SwapTextureSet,
) -> c_int {
    create_swap_texture_set(
        "ovrHmd_CreateSwapTextureSetD3D11",
        key(hmd),
        device,
        desc,
        0,
        out_texture_set,
    )
}

pub(crate) unsafe fn create_swap_texture_set(
    operation: &str,
    key: SessionKey,
    device: *mut c_void,
    desc: *const D3d11Texture2dDesc,
    misc_flags: c_uint,
    out_texture_set: *mut *mut SwapTextureSet,
) -> c_int {
    trace!(operation);
    let result = (|| -> ShimResult<ResultCode> {
        let out = out_texture_set
            .as_mut()
            .ok_or_else(|| null_argument("texture set pointer"))?;
        *out = ptr::null_mut();
        let desc = TextureDesc::from(desc.as_ref().ok_or_else(|| null_argument("texture description"))?);
        *out = state::lock().create_swap_set(
            key,
            DeviceHandle::from_ptr(device),
            &desc,
            misc_flags,
        )?;
        Ok(ResultCode::SUCCESS)
    })();
    state::report(operation, result)
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_DestroySwapTextureSet(
    hmd: *const HmdDescV6,
    texture_set: *mut SwapTextureSet,
) {
    trace!("ovrHmd_DestroySwapTextureSet");
    state::lock().destroy_swap_set(key(hmd), texture_set);
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_CreateMirrorTextureD3D11(
    hmd: *const HmdDescV6,
    device: *mut c_void,
    desc: *const D3d11Texture2dDesc,
    out_mirror_texture: *mut *mut Texture,
) -> c_int {
    create_mirror_texture(
        "ovrHmd_CreateMirrorTextureD3D11",
        key(hmd),
        device,
        desc,
        0,
        out_mirror_texture,
    )
}

pub(crate) unsafe fn create_mirror_texture(
    operation: &str,
    key: SessionKey,
    device: *mut c_void,
    desc: *const D3d11Texture2dDesc,
    misc_flags: c_uint,
    out_mirror_texture: *mut *mut Texture,
) -> c_int {
    trace!(operation);
    let result = (|| -> ShimResult<ResultCode> {
        let out = out_mirror_texture
            .as_mut()
            .ok_or_else(|| null_argument("mirror texture pointer"))?;
        *out = ptr::null_mut();
        let desc = TextureDesc::from(desc.as_ref().ok_or_else(|| null_argument("texture description"))?);
        *out = state::lock().create_mirror(
            key,
            DeviceHandle::from_ptr(device),
            &desc,
            misc_flags,
        )?;
        Ok(ResultCode::SUCCESS)
    })();
    state::report(operation, result)
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_DestroyMirrorTexture(
    hmd: *const HmdDescV6,
    mirror_texture: *mut Texture,
) {
    trace!("ovrHmd_DestroyMirrorTexture");
    state::lock().destroy_mirror(key(hmd), mirror_texture);
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_GetFovTextureSize(
    hmd: *const HmdDescV6,
    eye: c_int,
    fov: FovPort,
    pixels_per_display_pixel: f32,
) -> Sizei {
    fov_texture_size(key(hmd), eye, fov, pixels_per_display_pixel)
}

pub(crate) fn fov_texture_size(
    key: SessionKey,
    eye: c_int,
    fov: FovPort,
    pixels_per_display_pixel: f32,
) -> Sizei {
    let Some(eye) = state::eye("GetFovTextureSize", eye) else {
        return Sizei::default();
    };
    state::with_session("GetFovTextureSize", key, |session| {
        session.fov_texture_size(eye, fov, pixels_per_display_pixel)
    })
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_GetRenderDesc(
    hmd: *const HmdDescV6,
    eye: c_int,
    fov: FovPort,
) -> EyeRenderDesc {
    render_desc(key(hmd), eye, fov)
}

pub(crate) fn render_desc(key: SessionKey, eye: c_int, fov: FovPort) -> EyeRenderDesc {
    let Some(eye) = state::eye("GetRenderDesc", eye) else {
        return EyeRenderDesc::default();
    };
    state::with_session("GetRenderDesc", key, |session| session.render_desc(eye, fov))
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_SubmitFrame(
    hmd: *const HmdDescV6,
    frame_index: c_uint,
    view_scale_desc: *const ViewScaleDesc,
    layer_ptr_list: *const *const LayerHeader,
    layer_count: c_uint,
) -> c_int {
    submit_frame(
        "ovrHmd_SubmitFrame",
        key(hmd),
        i64::from(frame_index),
        view_scale_desc,
        layer_ptr_list,
        layer_count,
    )
}

pub(crate) unsafe fn submit_frame(
    operation: &str,
    key: SessionKey,
    frame_index: i64,
    view_scale_desc: *const ViewScaleDesc,
    layer_ptr_list: *const *const LayerHeader,
    layer_count: c_uint,
) -> c_int {
    trace!(frame_index, layer_count, "{operation}");
    let layers = if layer_ptr_list.is_null() || layer_count == 0 {
        &[][..]
    } else {
        slice::from_raw_parts(layer_ptr_list, layer_count as usize)
    };
    let result = state::lock().submit_frame(key, frame_index, view_scale_desc.as_ref(), layers);
    state::report(operation, result)
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_GetFrameTiming(
    hmd: *const HmdDescV6,
    frame_index: c_uint,
) -> FrameTimingV6 {
    frame_timing(key(hmd), frame_index)
}

pub(crate) fn frame_timing(key: SessionKey, frame_index: c_uint) -> FrameTimingV6 {
    let timing = state::lock()
        .frame_timing(key, i64::from(frame_index))
        .unwrap_or_else(|err| {
            warn!("GetFrameTiming: {err}");
            FrameTiming::default()
        });
    FrameTimingV6::from(&timing)
}

#[cfg_attr(export_abi = "0_6", no_mangle)]
pub unsafe extern "C" fn ovrHmd_ResetFrameTiming(hmd: *const HmdDescV6, frame_index: c_uint) {
    if let Err(err) = state::lock().reset_frame_timing(key(hmd), i64::from(frame_index)) {
        warn!("ovrHmd_ResetFrameTiming: {err}");
    }
}
