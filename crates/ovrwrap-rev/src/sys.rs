//! Raw LibREV types and entry point signatures.
//!
//! Math types (`FovPort`, `Posef`, `Recti`, ...) and `EyeRenderDesc` share
//! the runtime's layout and come from `ovrwrap_core::types`.

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int, c_uint, c_void};

use ovrwrap_core::{EyeRenderDesc, FovPort, Posef, Recti, Sizei, Vector2f, ViewScaleDesc};

pub type RevResult = c_int;
pub type RevBool = c_char;
pub type RevSession = *mut c_void;
pub type RevTextureSwapChain = *mut c_void;
pub type RevMirrorTexture = *mut c_void;

pub const REV_TEXTURE_2D: c_int = 0;

pub const REV_INIT_DEBUG: u32 = 0x0000_0001;
pub const REV_INIT_REQUEST_VERSION: u32 = 0x0000_0004;
pub const REV_INIT_WRITABLE_BITS: u32 = 0x00ff_ffff;

/// Minor version of the runtime interface this binding was written against.
pub const REV_MINOR_VERSION: u32 = 3;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevTextureSwapChainDesc {
    pub texture_type: c_int,
    pub format: c_int,
    pub array_size: c_int,
    pub width: c_int,
    pub height: c_int,
    pub mip_levels: c_int,
    pub sample_count: c_int,
    pub static_image: RevBool,
    pub misc_flags: c_uint,
    pub bind_flags: c_uint,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevMirrorTextureDesc {
    pub format: c_int,
    pub width: c_int,
    pub height: c_int,
    pub misc_flags: c_uint,
}

/// Pointer-aligned, like every layer struct that embeds it.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RevLayerHeader {
    pub layer_type: c_int,
    pub flags: c_uint,
    pub _align: [usize; 0],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RevLayerEyeFov {
    pub header: RevLayerHeader,
    pub color_texture: [RevTextureSwapChain; 2],
    pub viewport: [Recti; 2],
    pub fov: [FovPort; 2],
    pub render_pose: [Posef; 2],
    pub sensor_sample_time: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RevLayerQuad {
    pub header: RevLayerHeader,
    pub color_texture: RevTextureSwapChain,
    pub viewport: Recti,
    pub quad_pose_center: Posef,
    pub quad_size: Vector2f,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RevGraphicsLuid {
    pub reserved: [u8; 8],
    pub _align: [usize; 0],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RevHmdDesc {
    pub hmd_type: c_int,
    #[cfg(target_pointer_width = "64")]
    pub _pad0: [u8; 4],
    pub product_name: [c_char; 64],
    pub manufacturer: [c_char; 64],
    pub vendor_id: i16,
    pub product_id: i16,
    pub serial_number: [c_char; 24],
    pub firmware_major: i16,
    pub firmware_minor: i16,
    pub available_hmd_caps: c_uint,
    pub default_hmd_caps: c_uint,
    pub available_tracking_caps: c_uint,
    pub default_tracking_caps: c_uint,
    pub default_eye_fov: [FovPort; 2],
    pub max_eye_fov: [FovPort; 2],
    pub resolution: Sizei,
    pub display_refresh_rate: f32,
    pub _align: [usize; 0],
}

pub type RevLogCallback =
    Option<unsafe extern "C" fn(user_data: usize, level: c_int, message: *const c_char)>;

#[repr(C, align(8))]
#[derive(Debug, Clone, Copy, Default)]
pub struct RevInitParams {
    pub flags: u32,
    pub requested_minor_version: u32,
    pub log_callback: RevLogCallback,
    pub user_data: usize,
    pub connection_timeout_ms: u32,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct RevErrorInfo {
    pub result: RevResult,
    pub error_string: [c_char; 512],
}

impl Default for RevErrorInfo {
    fn default() -> Self {
        Self {
            result: 0,
            error_string: [0; 512],
        }
    }
}

/// A COM interface identifier, passed by value.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

/// `__uuidof(ID3D11Texture2D)`.
pub const IID_ID3D11_TEXTURE2D: Guid = Guid {
    data1: 0x6f15_aaf2,
    data2: 0xd208,
    data3: 0x4e89,
    data4: [0x9a, 0xb4, 0x48, 0x95, 0x35, 0xd3, 0x4f, 0x9c],
};

pub type InitializeFn = unsafe extern "C" fn(params: *const RevInitParams) -> RevResult;
pub type ShutdownFn = unsafe extern "C" fn();
pub type GetLastErrorInfoFn = unsafe extern "C" fn(info: *mut RevErrorInfo);
pub type CreateFn =
    unsafe extern "C" fn(session: *mut RevSession, luid: *mut RevGraphicsLuid) -> RevResult;
pub type DestroyFn = unsafe extern "C" fn(session: RevSession);
pub type GetHmdDescFn = unsafe extern "C" fn(session: RevSession) -> RevHmdDesc;

pub type CreateTextureSwapChainDxFn = unsafe extern "C" fn(
    session: RevSession,
    d3d_ptr: *mut c_void,
    desc: *const RevTextureSwapChainDesc,
    out_chain: *mut RevTextureSwapChain,
) -> RevResult;
pub type GetTextureSwapChainLengthFn = unsafe extern "C" fn(
    session: RevSession,
    chain: RevTextureSwapChain,
    out_length: *mut c_int,
) -> RevResult;
pub type GetTextureSwapChainCurrentIndexFn = unsafe extern "C" fn(
    session: RevSession,
    chain: RevTextureSwapChain,
    out_index: *mut c_int,
) -> RevResult;
pub type GetTextureSwapChainDescFn = unsafe extern "C" fn(
    session: RevSession,
    chain: RevTextureSwapChain,
    out_desc: *mut RevTextureSwapChainDesc,
) -> RevResult;
pub type GetTextureSwapChainBufferDxFn = unsafe extern "C" fn(
    session: RevSession,
    chain: RevTextureSwapChain,
    index: c_int,
    iid: Guid,
    out_buffer: *mut *mut c_void,
) -> RevResult;
pub type CommitTextureSwapChainFn =
    unsafe extern "C" fn(session: RevSession, chain: RevTextureSwapChain) -> RevResult;
pub type DestroyTextureSwapChainFn =
    unsafe extern "C" fn(session: RevSession, chain: RevTextureSwapChain);

pub type CreateMirrorTextureDxFn = unsafe extern "C" fn(
    session: RevSession,
    d3d_ptr: *mut c_void,
    desc: *const RevMirrorTextureDesc,
    out_mirror: *mut RevMirrorTexture,
) -> RevResult;
pub type GetMirrorTextureBufferDxFn = unsafe extern "C" fn(
    session: RevSession,
    mirror: RevMirrorTexture,
    iid: Guid,
    out_buffer: *mut *mut c_void,
) -> RevResult;
pub type DestroyMirrorTextureFn = unsafe extern "C" fn(session: RevSession, mirror: RevMirrorTexture);

pub type GetFovTextureSizeFn = unsafe extern "C" fn(
    session: RevSession,
    eye: c_int,
    fov: FovPort,
    pixels_per_display_pixel: f32,
) -> Sizei;
pub type GetRenderDescFn =
    unsafe extern "C" fn(session: RevSession, eye: c_int, fov: FovPort) -> EyeRenderDesc;
pub type SubmitFrameFn = unsafe extern "C" fn(
    session: RevSession,
    frame_index: i64,
    view_scale: *const ViewScaleDesc,
    layers: *const *const RevLayerHeader,
    layer_count: c_uint,
) -> RevResult;
pub type GetPredictedDisplayTimeFn =
    unsafe extern "C" fn(session: RevSession, frame_index: i64) -> f64;
pub type GetTimeInSecondsFn = unsafe extern "C" fn() -> f64;
