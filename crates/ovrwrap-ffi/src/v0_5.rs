//! Entry points of the 0.5 API.
//!
//! Same frame model as 0.4; initialization gained parameters and a log
//! callback.

use std::ffi::{c_char, c_int, c_uint};
use std::ptr;

use ovrwrap_core::{ApiRevision, EyeRenderDesc, FovPort, Posef, Sizei};
use tracing::{trace, warn};

use crate::legacy::{FrameTimingV4, HmdDescV4, InitParamsV5, OvrBool, RenderApiConfig, TextureV4};
use crate::state::{self, SessionKey};
use crate::v0_4;

pub const REVISION: ApiRevision = ApiRevision::V0_5;

static VERSION: &str = "0.5.0.1\0";

fn key(hmd: *const HmdDescV4) -> SessionKey {
    SessionKey::Hmd(hmd as usize)
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovr_Initialize(params: *const InitParamsV5) -> OvrBool {
    trace!("ovr_Initialize");
    let code = state::initialize_v5(params.as_ref());
    state::report_bool("ovr_Initialize", code.into_result())
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovr_Shutdown() {
    trace!("ovr_Shutdown");
    state::lock().shutdown();
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovr_GetVersionString() -> *const c_char {
    VERSION.as_ptr().cast()
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovr_GetTimeInSeconds() -> f64 {
    state::time_in_seconds()
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_Create(index: c_int) -> *const HmdDescV4 {
    trace!(index, "ovrHmd_Create");
    match state::lock().create_hmd_v4(REVISION) {
        Ok(desc) => desc,
        Err(err) => {
            warn!("ovrHmd_Create: {err}");
            ptr::null()
        }
    }
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_Destroy(hmd: *const HmdDescV4) {
    trace!("ovrHmd_Destroy");
    state::lock().destroy(key(hmd));
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_GetFovTextureSize(
    hmd: *const HmdDescV4,
    eye: c_int,
    fov: FovPort,
    pixels_per_display_pixel: f32,
) -> Sizei {
    v0_4::ovrHmd_GetFovTextureSize(hmd, eye, fov, pixels_per_display_pixel)
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_GetRenderDesc(
    hmd: *const HmdDescV4,
    eye: c_int,
    fov: FovPort,
) -> EyeRenderDesc {
    v0_4::ovrHmd_GetRenderDesc(hmd, eye, fov)
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_ConfigureRendering(
    hmd: *const HmdDescV4,
    api_config: *const RenderApiConfig,
    distortion_caps: c_uint,
    eye_fov_in: *const FovPort,
    eye_render_desc_out: *mut EyeRenderDesc,
) -> OvrBool {
    v0_4::configure_rendering(
        key(hmd),
        api_config,
        distortion_caps,
        eye_fov_in,
        eye_render_desc_out,
    )
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_BeginFrame(hmd: *const HmdDescV4, frame_index: c_uint) -> FrameTimingV4 {
    trace!(frame_index, "ovrHmd_BeginFrame");
    v0_4::begin_frame(key(hmd), frame_index)
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_EndFrame(
    hmd: *const HmdDescV4,
    render_pose: *const Posef,
    eye_texture: *const TextureV4,
) {
    v0_4::end_frame(key(hmd), render_pose, eye_texture);
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_BeginFrameTiming(
    hmd: *const HmdDescV4,
    frame_index: c_uint,
) -> FrameTimingV4 {
    trace!(frame_index, "ovrHmd_BeginFrameTiming");
    v0_4::begin_frame(key(hmd), frame_index)
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_EndFrameTiming(_hmd: *const HmdDescV4) {
    trace!("ovrHmd_EndFrameTiming");
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_GetFrameTiming(
    hmd: *const HmdDescV4,
    frame_index: c_uint,
) -> FrameTimingV4 {
    v0_4::frame_timing(key(hmd), frame_index)
}

#[cfg_attr(export_abi = "0_5", no_mangle)]
pub unsafe extern "C" fn ovrHmd_ResetFrameTiming(hmd: *const HmdDescV4, frame_index: c_uint) {
    v0_4::reset_frame_timing(key(hmd), frame_index);
}
