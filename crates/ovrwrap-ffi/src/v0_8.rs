//! Entry points of the 0.8 API, the default export set.
//!
//! Frame indices widened to 64 bits and frame timing gave way to a single
//! predicted display time.

use std::ffi::{c_char, c_int, c_uint, c_void};

use ovrwrap_core::{
    ApiRevision, EyeRenderDesc, FovPort, GraphicsLuid, SessionHandle, Sizei, ViewScaleDesc,
};
use tracing::trace;

use crate::legacy::{D3d11Texture2dDesc, InitParams, LayerHeader, SwapTextureSet, Texture};
use crate::state::{self, SessionKey};
use crate::{v0_6, v0_7};

pub const REVISION: ApiRevision = ApiRevision::V0_8;

static VERSION: &str = "0.8.0.0\0";

fn key(session: *mut c_void) -> SessionKey {
    SessionKey::Session(SessionHandle::from_ptr(session))
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_Initialize(params: *const InitParams) -> c_int {
    trace!("ovr_Initialize");
    state::initialize_v7(params.as_ref()).0
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_Shutdown() {
    trace!("ovr_Shutdown");
    state::lock().shutdown();
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_GetVersionString() -> *const c_char {
    VERSION.as_ptr().cast()
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_GetTimeInSeconds() -> f64 {
    state::time_in_seconds()
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_Create(out_session: *mut *mut c_void, out_luid: *mut GraphicsLuid) -> c_int {
    v0_7::create_session(REVISION, out_session, out_luid)
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_Destroy(session: *mut c_void) {
    trace!("ovr_Destroy");
    state::lock().destroy(key(session));
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
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

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_DestroySwapTextureSet(
    session: *mut c_void,
    texture_set: *mut SwapTextureSet,
) {
    trace!("ovr_DestroySwapTextureSet");
    state::lock().destroy_swap_set(key(session), texture_set);
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
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

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_DestroyMirrorTexture(session: *mut c_void, mirror_texture: *mut Texture) {
    trace!("ovr_DestroyMirrorTexture");
    state::lock().destroy_mirror(key(session), mirror_texture);
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_GetFovTextureSize(
    session: *mut c_void,
    eye: c_int,
    fov: FovPort,
    pixels_per_display_pixel: f32,
) -> Sizei {
    v0_6::fov_texture_size(key(session), eye, fov, pixels_per_display_pixel)
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_GetRenderDesc(session: *mut c_void, eye: c_int, fov: FovPort) -> EyeRenderDesc {
    v0_6::render_desc(key(session), eye, fov)
}

#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_SubmitFrame(
    session: *mut c_void,
    frame_index: i64,
    view_scale_desc: *const ViewScaleDesc,
    layer_ptr_list: *const *const LayerHeader,
    layer_count: c_uint,
) -> c_int {
    v0_6::submit_frame(
        "ovr_SubmitFrame",
        key(session),
        frame_index,
        view_scale_desc,
        layer_ptr_list,
        layer_count,
    )
}

/// Zero for an unknown session.
#[cfg_attr(export_abi = "0_8", no_mangle)]
pub unsafe extern "C" fn ovr_GetPredictedDisplayTime(session: *mut c_void, frame_index: i64) -> f64 {
    state::with_session("ovr_GetPredictedDisplayTime", key(session), |session| {
        session.predicted_display_time(frame_index)
    })
}
