//! Entry points of the 0.4 API.
//!
//! 0.4 applications hand finished eye textures to `ovrHmd_EndFrame` and let
//! the runtime distort them; they never see swap chains or layers.

use std::ffi::{c_char, c_int, c_uint};
use std::ptr;

use ovrwrap_core::{ApiRevision, EyeRenderDesc, FovPort, FrameTiming, Posef, ResultCode, Sizei};
use tracing::{trace, warn};

use crate::legacy::{FrameTimingV4, HmdDescV4, OvrBool, RenderApiConfig, TextureV4, OVR_FALSE};
use crate::state::{self, SessionKey};

pub const REVISION: ApiRevision = ApiRevision::V0_4;

static VERSION: &str = "0.4.4\0";

fn key(hmd: *const HmdDescV4) -> SessionKey {
    SessionKey::Hmd(hmd as usize)
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovr_Initialize() -> OvrBool {
    trace!("ovr_Initialize");
    state::report_bool("ovr_Initialize", state::initialize_v5(None).into_result())
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovr_Shutdown() {
    trace!("ovr_Shutdown");
    state::lock().shutdown();
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovr_GetVersionString() -> *const c_char {
    VERSION.as_ptr().cast()
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovr_GetTimeInSeconds() -> f64 {
    state::time_in_seconds()
}

/// Returns null when no device could be opened. Only index 0 exists.
#[cfg_attr(export_abi = "0_4", no_mangle)]
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

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_Destroy(hmd: *const HmdDescV4) {
    trace!("ovrHmd_Destroy");
    state::lock().destroy(key(hmd));
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_GetFovTextureSize(
    hmd: *const HmdDescV4,
    eye: c_int,
    fov: FovPort,
    pixels_per_display_pixel: f32,
) -> Sizei {
    let Some(eye) = state::eye("ovrHmd_GetFovTextureSize", eye) else {
        return Sizei::default();
    };
    state::with_session("ovrHmd_GetFovTextureSize", key(hmd), |session| {
        session.fov_texture_size(eye, fov, pixels_per_display_pixel)
    })
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_GetRenderDesc(
    hmd: *const HmdDescV4,
    eye: c_int,
    fov: FovPort,
) -> EyeRenderDesc {
    let Some(eye) = state::eye("ovrHmd_GetRenderDesc", eye) else {
        return EyeRenderDesc::default();
    };
    state::with_session("ovrHmd_GetRenderDesc", key(hmd), |session| {
        session.render_desc(eye, fov)
    })
}

/// Render descriptions are written even when the configuration names an
/// unsupported API; only then does the call fail.
#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_ConfigureRendering(
    hmd: *const HmdDescV4,
    api_config: *const RenderApiConfig,
    distortion_caps: c_uint,
    eye_fov_in: *const FovPort,
    eye_render_desc_out: *mut EyeRenderDesc,
) -> OvrBool {
    configure_rendering(
        key(hmd),
        api_config,
        distortion_caps,
        eye_fov_in,
        eye_render_desc_out,
    )
}

pub(crate) unsafe fn configure_rendering(
    key: SessionKey,
    api_config: *const RenderApiConfig,
    distortion_caps: c_uint,
    eye_fov_in: *const FovPort,
    eye_render_desc_out: *mut EyeRenderDesc,
) -> OvrBool {
    trace!(distortion_caps, "ovrHmd_ConfigureRendering");
    if eye_fov_in.is_null() {
        warn!("ovrHmd_ConfigureRendering without a field of view");
        return OVR_FALSE;
    }
    let fov = ptr::read_unaligned(eye_fov_in.cast::<[FovPort; 2]>());

    let mut shim = state::lock();
    let descs = match shim.configure_rendering(key, None, fov) {
        Ok(descs) => descs,
        Err(err) => return state::report_bool("ovrHmd_ConfigureRendering", Err(err)),
    };
    if !eye_render_desc_out.is_null() {
        ptr::write_unaligned(eye_render_desc_out.cast::<[EyeRenderDesc; 2]>(), descs);
    }

    let result = match api_config.as_ref() {
        Some(config) => shim
            .configure_rendering(key, Some(config), fov)
            .map(|_| ResultCode::SUCCESS),
        None => Ok(ResultCode::SUCCESS),
    };
    state::report_bool("ovrHmd_ConfigureRendering", result)
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_BeginFrame(hmd: *const HmdDescV4, frame_index: c_uint) -> FrameTimingV4 {
    trace!(frame_index, "ovrHmd_BeginFrame");
    begin_frame(key(hmd), frame_index)
}

pub(crate) fn begin_frame(key: SessionKey, frame_index: c_uint) -> FrameTimingV4 {
    let timing = state::lock()
        .begin_frame(key, i64::from(frame_index))
        .unwrap_or_else(|err| {
            warn!("ovrHmd_BeginFrame: {err}");
            FrameTiming::default()
        });
    FrameTimingV4::from(&timing)
}

/// Eye textures of any API but D3D11 are ignored.
#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_EndFrame(
    hmd: *const HmdDescV4,
    render_pose: *const Posef,
    eye_texture: *const TextureV4,
) {
    end_frame(key(hmd), render_pose, eye_texture);
}

pub(crate) unsafe fn end_frame(
    key: SessionKey,
    render_pose: *const Posef,
    eye_texture: *const TextureV4,
) {
    trace!("ovrHmd_EndFrame");
    if eye_texture.is_null() {
        return;
    }
    let textures = ptr::read_unaligned(eye_texture.cast::<[TextureV4; 2]>());
    let poses = if render_pose.is_null() {
        [Posef::default(); 2]
    } else {
        ptr::read_unaligned(render_pose.cast::<[Posef; 2]>())
    };
    state::report("ovrHmd_EndFrame", state::lock().end_frame(key, poses, &textures));
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_BeginFrameTiming(
    hmd: *const HmdDescV4,
    frame_index: c_uint,
) -> FrameTimingV4 {
    trace!(frame_index, "ovrHmd_BeginFrameTiming");
    begin_frame(key(hmd), frame_index)
}

/// Applications that distort on their own have nothing left to hand over.
#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_EndFrameTiming(_hmd: *const HmdDescV4) {
    trace!("ovrHmd_EndFrameTiming");
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_GetFrameTiming(
    hmd: *const HmdDescV4,
    frame_index: c_uint,
) -> FrameTimingV4 {
    frame_timing(key(hmd), frame_index)
}

pub(crate) fn frame_timing(key: SessionKey, frame_index: c_uint) -> FrameTimingV4 {
    let timing = state::lock()
        .frame_timing(key, i64::from(frame_index))
        .unwrap_or_else(|err| {
            warn!("ovrHmd_GetFrameTiming: {err}");
            FrameTiming::default()
        });
    FrameTimingV4::from(&timing)
}

#[cfg_attr(export_abi = "0_4", no_mangle)]
pub unsafe extern "C" fn ovrHmd_ResetFrameTiming(hmd: *const HmdDescV4, frame_index: c_uint) {
    reset_frame_timing(key(hmd), frame_index);
}

pub(crate) fn reset_frame_timing(key: SessionKey, frame_index: c_uint) {
    if let Err(err) = state::lock().reset_frame_timing(key, i64::from(frame_index)) {
        warn!("ovrHmd_ResetFrameTiming: {err}");
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    #[test]
    fn test_version_string() {
        let version = unsafe { CStr::from_ptr(ovr_GetVersionString()) };
        assert_eq!(version.to_str().unwrap(), REVISION.version_string());
    }

    #[test]
    fn test_calls_without_a_device_are_harmless() {
        let fov = [FovPort::default(); 2];
        let mut descs = [EyeRenderDesc::default(); 2];
        let ok = unsafe {
            ovrHmd_ConfigureRendering(
                ptr::null(),
                ptr::null(),
                0,
                fov.as_ptr(),
                descs.as_mut_ptr(),
            )
        };
        assert_eq!(ok, OVR_FALSE);
        assert_eq!(
            unsafe { ovrHmd_GetFrameTiming(ptr::null(), 3) },
            FrameTimingV4::default()
        );
        unsafe {
            ovrHmd_EndFrame(ptr::null(), ptr::null(), ptr::null());
            ovrHmd_ResetFrameTiming(ptr::null(), 1);
            ovrHmd_Destroy(ptr::null());
        }
        assert_eq!(
            unsafe { ovrHmd_GetFovTextureSize(ptr::null(), 7, FovPort::default(), 1.0) },
            Sizei::default()
        );
    }
}
