//! C layouts of the legacy API revisions and their decoding into core types.
//!
//! Types without a version suffix are shared by 0.6 through 0.8. `V4`
//! layouts are the 0.4/0.5 ones, `V6` marks what only 0.6 used.

use std::ffi::{c_char, c_int, c_uint, c_void};
use std::ptr::{self, NonNull};

use ovrwrap_core::{
    ApiRevision, BindUsage, DxgiFormat, EyeFovLayer, FovPort, FrameTiming, LayerDescriptor,
    LayerFlags, LegacyLayerKind, MirrorHandle, Posef, QuadLayer, Recti, SessionHandle, ShimResult,
    Sizei, SwapChainHandle, TextureDesc, TextureHandle, Vector2f, Vector2i, ViewHandle,
    VisibleTexture, VISIBLE_TEXTURE_COUNT,
};
use ovrwrap_rev::sys::RevHmdDesc;

pub type OvrBool = c_char;
pub const OVR_TRUE: OvrBool = 1;
pub const OVR_FALSE: OvrBool = 0;

/// `ovrRenderAPI_D3D11`; every revision kept the same value.
pub const RENDER_API_D3D11: c_int = 5;

/// Typeless request accepted by 0.7 and 0.8 texture creation.
pub const TEXTURE_MISC_TYPELESS: c_uint = 0x0001;

pub const HMD_CAP_PRESENT: c_uint = 0x0001;
pub const HMD_CAP_AVAILABLE: c_uint = 0x0002;
pub const HMD_CAP_CAPTURED: c_uint = 0x0004;
pub const HMD_CAP_LOW_PERSISTENCE: c_uint = 0x0080;
pub const HMD_CAP_DYNAMIC_PREDICTION: c_uint = 0x0200;

pub const DISTORTION_CAP_VIGNETTE: c_uint = 0x0008;
pub const DISTORTION_CAP_OVERDRIVE: c_uint = 0x0080;

static DISPLAY_DEVICE_NAME: &[u8] = b"\\\\.\\DISPLAY0\0";

/// `D3D11_TEXTURE2D_DESC`, declared here so non-Windows builds can decode it.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct D3d11Texture2dDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_size: u32,
    pub format: u32,
    pub sample_count: u32,
    pub sample_quality: u32,
    pub usage: u32,
    pub bind_flags: u32,
    pub cpu_access_flags: u32,
    pub misc_flags: u32,
}

impl From<&D3d11Texture2dDesc> for TextureDesc {
    fn from(desc: &D3d11Texture2dDesc) -> Self {
        TextureDesc {
            format: DxgiFormat(desc.format),
            width: desc.width,
            height: desc.height,
            mip_levels: desc.mip_levels,
            array_size: desc.array_size,
            sample_count: desc.sample_count,
            sample_quality: desc.sample_quality,
            usage: desc.usage,
            bind: BindUsage::from_bits_retain(desc.bind_flags),
            cpu_access: desc.cpu_access_flags,
            misc: desc.misc_flags,
        }
    }
}

// Textures

/// `ovrTextureHeader` up to 0.5, which still carried the render viewport.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureHeaderV4 {
    pub api: c_int,
    pub texture_size: Sizei,
    pub render_viewport: Recti,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureV4 {
    pub header: TextureHeaderV4,
    /// For D3D11: `ID3D11Texture2D*` then `ID3D11ShaderResourceView*`.
    pub platform_data: [usize; 8],
}

impl TextureV4 {
    pub fn texture(&self) -> TextureHandle {
        TextureHandle(self.platform_data[0])
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextureHeader {
    pub api: c_int,
    pub texture_size: Sizei,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Texture {
    pub header: TextureHeader,
    pub platform_data: [usize; 8],
}

impl Texture {
    pub fn d3d11(texture: TextureHandle, view: Option<ViewHandle>, size: Sizei) -> Self {
        let mut platform_data = [0; 8];
        platform_data[0] = texture.0;
        platform_data[1] = view.map_or(0, |view| view.0);
        Self {
            header: TextureHeader {
                api: RENDER_API_D3D11,
                texture_size: size,
            },
            platform_data,
        }
    }

    pub fn texture(&self) -> TextureHandle {
        TextureHandle(self.platform_data[0])
    }

    pub fn view(&self) -> ViewHandle {
        ViewHandle(self.platform_data[1])
    }
}

/// `ovrSwapTextureSet`. The caller flips `current_index` itself.
#[repr(C)]
#[derive(Debug)]
pub struct SwapTextureSet {
    pub textures: *mut Texture,
    pub texture_count: c_int,
    pub current_index: c_int,
}

// Rendering configuration (0.4/0.5)

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderApiConfigHeader {
    pub api: c_int,
    pub back_buffer_size: Sizei,
    pub multisample: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderApiConfig {
    pub header: RenderApiConfigHeader,
    /// For D3D11: device, immediate context, then back buffer objects.
    pub platform_data: [usize; 8],
}

impl RenderApiConfig {
    pub fn device(&self) -> ovrwrap_core::DeviceHandle {
        ovrwrap_core::DeviceHandle(self.platform_data[0])
    }

    pub fn context(&self) -> ovrwrap_core::ContextHandle {
        ovrwrap_core::ContextHandle(self.platform_data[1])
    }
}

// Layers (0.6 - 0.8)

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerHeader {
    pub layer_type: c_int,
    pub flags: c_uint,
    pub _align: [usize; 0],
}

/// 0.6 eye layer; the sample timestamp arrived in 0.7.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LayerEyeFovV6 {
    pub header: LayerHeader,
    pub color_texture: [*const SwapTextureSet; 2],
    pub viewport: [Recti; 2],
    pub fov: [FovPort; 2],
    pub render_pose: [Posef; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LayerEyeFov {
    pub header: LayerHeader,
    pub color_texture: [*const SwapTextureSet; 2],
    pub viewport: [Recti; 2],
    pub fov: [FovPort; 2],
    pub render_pose: [Posef; 2],
    pub sensor_sample_time: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LayerQuad {
    pub header: LayerHeader,
    pub color_texture: *const SwapTextureSet,
    pub viewport: Recti,
    pub quad_pose_center: Posef,
    pub quad_size: Vector2f,
}

/// Decode one caller layer.
///
/// Null entries decode to `None`. `resolve` maps a non-null swap texture
/// set pointer to the chain behind it and fails for sets the shim did not
/// hand out. A right eye that is null or repeats the left one is resolved
/// once and left empty so both eyes share the left chain.
///
/// # Safety
/// `header` must be null or point at a layer laid out for `revision` whose
/// type code matches its header.
pub unsafe fn decode_layer<F>(
    revision: ApiRevision,
    header: *const LayerHeader,
    mut resolve: F,
) -> ShimResult<Option<LayerDescriptor>>
where
    F: FnMut(*const SwapTextureSet) -> ShimResult<SwapChainHandle>,
{
    let Some(head) = header.as_ref() else {
        return Ok(None);
    };
    let flags = LayerFlags::from_bits_retain(head.flags);

    let layer = match revision.classify_layer(head.layer_type) {
        LegacyLayerKind::Disabled => LayerDescriptor::Disabled { flags },
        LegacyLayerKind::EyeFov => {
            let (color, viewport, fov, render_pose, sensor_sample_time) =
                if revision >= ApiRevision::V0_7 {
                    let layer = &*header.cast::<LayerEyeFov>();
                    (
                        layer.color_texture,
                        layer.viewport,
                        layer.fov,
                        layer.render_pose,
                        layer.sensor_sample_time,
                    )
                } else {
                    let layer = &*header.cast::<LayerEyeFovV6>();
                    (
                        layer.color_texture,
                        layer.viewport,
                        layer.fov,
                        layer.render_pose,
                        0.0,
                    )
                };

            let left = if color[0].is_null() {
                None
            } else {
                Some(resolve(color[0])?)
            };
            let right = if color[1].is_null() || color[1] == color[0] {
                None
            } else {
                Some(resolve(color[1])?)
            };

            LayerDescriptor::EyeFov(EyeFovLayer {
                flags,
                color: [left, right],
                viewport,
                fov,
                render_pose,
                sensor_sample_time,
            })
        }
        kind @ (LegacyLayerKind::QuadInWorld | LegacyLayerKind::QuadHeadLocked) => {
            let layer = &*header.cast::<LayerQuad>();
            let color = if layer.color_texture.is_null() {
                None
            } else {
                Some(resolve(layer.color_texture)?)
            };
            LayerDescriptor::Quad(QuadLayer {
                flags,
                color,
                viewport: layer.viewport,
                center_pose: layer.quad_pose_center,
                size: layer.quad_size,
                head_locked: kind == LegacyLayerKind::QuadHeadLocked,
            })
        }
        LegacyLayerKind::Unsupported(raw_type) => LayerDescriptor::Unsupported { raw_type },
    };
    Ok(Some(layer))
}

// Frame timing

/// 0.4/0.5 `ovrFrameTiming`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTimingV4 {
    pub delta_seconds: f32,
    pub this_frame_seconds: f64,
    pub timewarp_point_seconds: f64,
    pub next_frame_seconds: f64,
    pub scanout_midpoint_seconds: f64,
    pub eye_scanout_seconds: [f64; 2],
}

impl From<&FrameTiming> for FrameTimingV4 {
    fn from(timing: &FrameTiming) -> Self {
        let midpoint = timing.display_midpoint_seconds;
        Self {
            delta_seconds: timing.frame_interval_seconds as f32,
            this_frame_seconds: timing.this_frame_seconds,
            timewarp_point_seconds: midpoint,
            next_frame_seconds: timing.next_frame_seconds,
            scanout_midpoint_seconds: midpoint,
            eye_scanout_seconds: [midpoint; 2],
        }
    }
}

/// 0.6/0.7 `ovrFrameTiming`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTimingV6 {
    pub display_midpoint_seconds: f64,
    pub frame_interval_seconds: f64,
    pub app_frame_index: c_uint,
    pub display_frame_index: c_uint,
}

impl From<&FrameTiming> for FrameTimingV6 {
    fn from(timing: &FrameTiming) -> Self {
        // Legacy indices are 32-bit; the caller handed them in as such.
        Self {
            display_midpoint_seconds: timing.display_midpoint_seconds,
            frame_interval_seconds: timing.frame_interval_seconds,
            app_frame_index: timing.app_frame_index as c_uint,
            display_frame_index: timing.display_frame_index as c_uint,
        }
    }
}

// Initialization

pub type LogCallbackV5 = Option<unsafe extern "C" fn(level: c_int, message: *const c_char)>;
pub type LogCallback =
    Option<unsafe extern "C" fn(user_data: usize, level: c_int, message: *const c_char)>;

/// 0.5/0.6 `ovrInitParams`.
#[repr(C, align(8))]
#[derive(Debug, Clone, Copy, Default)]
pub struct InitParamsV5 {
    pub flags: u32,
    pub requested_minor_version: u32,
    pub log_callback: LogCallbackV5,
    pub connection_timeout_ms: u32,
}

/// 0.7/0.8 `ovrInitParams`.
#[repr(C, align(8))]
#[derive(Debug, Clone, Copy, Default)]
pub struct InitParams {
    pub flags: u32,
    pub requested_minor_version: u32,
    pub log_callback: LogCallback,
    pub user_data: usize,
    pub connection_timeout_ms: u32,
}

// Device description

/// 0.4/0.5 `ovrHmdDesc`. `ovrHmd` in those revisions is a pointer to it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HmdDescV4 {
    pub handle: *mut c_void,
    pub hmd_type: c_int,
    pub product_name: *const c_char,
    pub manufacturer: *const c_char,
    pub vendor_id: i16,
    pub product_id: i16,
    pub serial_number: [c_char; 24],
    pub firmware_major: i16,
    pub firmware_minor: i16,
    pub camera_frustum_h_fov_in_radians: f32,
    pub camera_frustum_v_fov_in_radians: f32,
    pub camera_frustum_near_z_in_meters: f32,
    pub camera_frustum_far_z_in_meters: f32,
    pub hmd_caps: c_uint,
    pub tracking_caps: c_uint,
    pub distortion_caps: c_uint,
    pub default_eye_fov: [FovPort; 2],
    pub max_eye_fov: [FovPort; 2],
    pub eye_render_order: [c_int; 2],
    pub resolution: Sizei,
    pub windows_pos: Vector2i,
    pub display_device_name: *const c_char,
    pub display_id: c_int,
}

/// 0.6 `ovrHmdDesc`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HmdDescV6 {
    pub handle: *mut c_void,
    pub hmd_type: c_int,
    pub product_name: *const c_char,
    pub manufacturer: *const c_char,
    pub vendor_id: i16,
    pub product_id: i16,
    pub serial_number: [c_char; 24],
    pub firmware_major: i16,
    pub firmware_minor: i16,
    pub camera_frustum_h_fov_in_radians: f32,
    pub camera_frustum_v_fov_in_radians: f32,
    pub camera_frustum_near_z_in_meters: f32,
    pub camera_frustum_far_z_in_meters: f32,
    pub hmd_caps: c_uint,
    pub tracking_caps: c_uint,
    pub default_eye_fov: [FovPort; 2],
    pub max_eye_fov: [FovPort; 2],
    pub eye_render_order: [c_int; 2],
    pub resolution: Sizei,
    pub _align: [usize; 0],
}

/// Largest device type code each revision knows about.
fn max_hmd_type(revision: ApiRevision) -> c_int {
    match revision {
        ApiRevision::V0_4 | ApiRevision::V0_5 => 8,
        _ => 11,
    }
}

/// Fields both device descriptions fill the same way.
#[derive(Debug, Clone, Copy)]
struct DescCommon {
    hmd_type: c_int,
    vendor_id: i16,
    product_id: i16,
    serial_number: [c_char; 24],
    firmware_major: i16,
    firmware_minor: i16,
    tracking_caps: c_uint,
    default_eye_fov: [FovPort; 2],
    max_eye_fov: [FovPort; 2],
    resolution: Sizei,
}

impl DescCommon {
    fn new(revision: ApiRevision, desc: &RevHmdDesc) -> Self {
        let mut serial_number = desc.serial_number;
        let last = serial_number.len() - 1;
        serial_number[last] = 0;
        Self {
            hmd_type: desc.hmd_type.min(max_hmd_type(revision)),
            vendor_id: desc.vendor_id,
            product_id: desc.product_id,
            serial_number,
            firmware_major: desc.firmware_major,
            firmware_minor: desc.firmware_minor,
            tracking_caps: desc.available_tracking_caps,
            default_eye_fov: desc.default_eye_fov,
            max_eye_fov: desc.max_eye_fov,
            resolution: desc.resolution,
        }
    }
}

fn terminated(name: &[c_char; 64]) -> [c_char; 64] {
    let mut copy = *name;
    copy[63] = 0;
    copy
}

/// A device description and the strings it points into.
#[repr(C)]
pub struct HmdDescV4Alloc {
    pub desc: HmdDescV4,
    product_name: [c_char; 64],
    manufacturer: [c_char; 64],
}

impl HmdDescV4Alloc {
    pub fn build(revision: ApiRevision, session: SessionHandle, rev: &RevHmdDesc) -> Exposed<Self> {
        let common = DescCommon::new(revision, rev);
        let alloc = Exposed::new(Self {
            desc: HmdDescV4 {
                handle: session.as_ptr(),
                hmd_type: common.hmd_type,
                product_name: ptr::null(),
                manufacturer: ptr::null(),
                vendor_id: common.vendor_id,
                product_id: common.product_id,
                serial_number: common.serial_number,
                firmware_major: common.firmware_major,
                firmware_minor: common.firmware_minor,
                camera_frustum_h_fov_in_radians: 0.0,
                camera_frustum_v_fov_in_radians: 0.0,
                camera_frustum_near_z_in_meters: 0.0,
                camera_frustum_far_z_in_meters: 0.0,
                hmd_caps: HMD_CAP_PRESENT
                    | HMD_CAP_AVAILABLE
                    | HMD_CAP_CAPTURED
                    | HMD_CAP_LOW_PERSISTENCE
                    | HMD_CAP_DYNAMIC_PREDICTION,
                tracking_caps: common.tracking_caps,
                distortion_caps: DISTORTION_CAP_VIGNETTE | DISTORTION_CAP_OVERDRIVE,
                default_eye_fov: common.default_eye_fov,
                max_eye_fov: common.max_eye_fov,
                eye_render_order: [0, 1],
                resolution: common.resolution,
                windows_pos: Vector2i::default(),
                display_device_name: DISPLAY_DEVICE_NAME.as_ptr().cast(),
                display_id: 0,
            },
            product_name: terminated(&rev.product_name),
            manufacturer: terminated(&rev.manufacturer),
        });
        // SAFETY: the allocation is live and not yet shared.
        unsafe {
            let raw = alloc.as_ptr();
            (*raw).desc.product_name = ptr::addr_of!((*raw).product_name).cast();
            (*raw).desc.manufacturer = ptr::addr_of!((*raw).manufacturer).cast();
        }
        alloc
    }
}

#[repr(C)]
pub struct HmdDescV6Alloc {
    pub desc: HmdDescV6,
    product_name: [c_char; 64],
    manufacturer: [c_char; 64],
}

impl HmdDescV6Alloc {
    pub fn build(session: SessionHandle, rev: &RevHmdDesc) -> Exposed<Self> {
        let common = DescCommon::new(ApiRevision::V0_6, rev);
        let alloc = Exposed::new(Self {
            desc: HmdDescV6 {
                handle: session.as_ptr(),
                hmd_type: common.hmd_type,
                product_name: ptr::null(),
                manufacturer: ptr::null(),
                vendor_id: common.vendor_id,
                product_id: common.product_id,
                serial_number: common.serial_number,
                firmware_major: common.firmware_major,
                firmware_minor: common.firmware_minor,
                camera_frustum_h_fov_in_radians: 0.0,
                camera_frustum_v_fov_in_radians: 0.0,
                camera_frustum_near_z_in_meters: 0.0,
                camera_frustum_far_z_in_meters: 0.0,
                hmd_caps: rev.default_hmd_caps,
                tracking_caps: common.tracking_caps,
                default_eye_fov: common.default_eye_fov,
                max_eye_fov: common.max_eye_fov,
                eye_render_order: [0, 1],
                resolution: common.resolution,
                _align: [],
            },
            product_name: terminated(&rev.product_name),
            manufacturer: terminated(&rev.manufacturer),
        });
        // SAFETY: as for the 0.4 description.
        unsafe {
            let raw = alloc.as_ptr();
            (*raw).desc.product_name = ptr::addr_of!((*raw).product_name).cast();
            (*raw).desc.manufacturer = ptr::addr_of!((*raw).manufacturer).cast();
        }
        alloc
    }
}

// Shim-owned allocations handed to the caller

/// A heap allocation whose address is given to the caller.
///
/// The caller may write through that address at any time, so after
/// construction the shim only reaches the value through raw pointers.
/// Dropping frees it.
pub struct Exposed<T> {
    ptr: NonNull<T>,
}

impl<T> Exposed<T> {
    pub fn new(value: T) -> Self {
        Self {
            ptr: NonNull::from(Box::leak(Box::new(value))),
        }
    }

    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl<T> Drop for Exposed<T> {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `Box::leak` and is freed only here.
        drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
    }
}

impl<T> std::fmt::Debug for Exposed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Exposed({:#x})", self.addr())
    }
}

// Only the process-wide state touches these, and only under its lock.
unsafe impl<T> Send for Exposed<T> {}

/// The caller-visible swap texture set. The public prefix is the legacy
/// `ovrSwapTextureSet`; the tail is private to the shim.
#[repr(C)]
pub struct SwapTextureSetAlloc {
    pub set: SwapTextureSet,
    pub textures: [Texture; VISIBLE_TEXTURE_COUNT],
    pub chain: SwapChainHandle,
}

impl SwapTextureSetAlloc {
    pub fn build(chain: SwapChainHandle, visible: &[VisibleTexture], size: Sizei) -> Exposed<Self> {
        let mut textures = [Texture::default(); VISIBLE_TEXTURE_COUNT];
        for (slot, texture) in textures.iter_mut().zip(visible) {
            *slot = Texture::d3d11(texture.texture, texture.view, size);
        }
        let alloc = Exposed::new(Self {
            set: SwapTextureSet {
                textures: ptr::null_mut(),
                texture_count: VISIBLE_TEXTURE_COUNT as c_int,
                current_index: 0,
            },
            textures,
            chain,
        });
        // SAFETY: the allocation is live and not yet shared.
        unsafe {
            let raw = alloc.as_ptr();
            (*raw).set.textures = ptr::addr_of_mut!((*raw).textures).cast();
        }
        alloc
    }

    /// The index the caller last selected.
    ///
    /// # Safety
    /// `alloc` must be live.
    pub unsafe fn current_index(alloc: &Exposed<Self>) -> c_int {
        ptr::addr_of!((*alloc.as_ptr()).set.current_index).read_volatile()
    }

    /// # Safety
    /// `alloc` must be live.
    pub unsafe fn chain(alloc: &Exposed<Self>) -> SwapChainHandle {
        (*alloc.as_ptr()).chain
    }
}

/// The caller-visible mirror texture and the handle behind it.
#[repr(C)]
pub struct MirrorTextureAlloc {
    pub texture: Texture,
    pub handle: MirrorHandle,
}

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};

    use super::*;

    #[test]
    fn test_texture_desc_layout() {
        assert_eq!(size_of::<D3d11Texture2dDesc>(), 44);
        assert_eq!(offset_of!(D3d11Texture2dDesc, format), 16);
        assert_eq!(offset_of!(D3d11Texture2dDesc, bind_flags), 32);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_texture_layouts_64() {
        assert_eq!(size_of::<TextureHeaderV4>(), 28);
        assert_eq!(offset_of!(TextureV4, platform_data), 32);
        assert_eq!(size_of::<TextureV4>(), 96);
        assert_eq!(offset_of!(Texture, platform_data), 16);
        assert_eq!(size_of::<Texture>(), 80);
        assert_eq!(size_of::<SwapTextureSet>(), 16);
        assert_eq!(offset_of!(RenderApiConfig, platform_data), 16);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_layer_layouts_64() {
        assert_eq!(size_of::<LayerHeader>(), 8);
        assert_eq!(offset_of!(LayerEyeFov, viewport), 24);
        assert_eq!(offset_of!(LayerEyeFov, sensor_sample_time), 144);
        assert_eq!(size_of::<LayerEyeFov>(), 152);
        assert_eq!(size_of::<LayerEyeFovV6>(), 144);
        assert_eq!(offset_of!(LayerQuad, quad_size), 60);
        assert_eq!(size_of::<LayerQuad>(), 72);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_timing_and_init_layouts_64() {
        assert_eq!(offset_of!(FrameTimingV4, this_frame_seconds), 8);
        assert_eq!(size_of::<FrameTimingV4>(), 56);
        assert_eq!(size_of::<FrameTimingV6>(), 24);
        assert_eq!(offset_of!(InitParamsV5, connection_timeout_ms), 16);
        assert_eq!(size_of::<InitParamsV5>(), 24);
        assert_eq!(offset_of!(InitParams, user_data), 16);
        assert_eq!(size_of::<InitParams>(), 32);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_hmd_desc_layouts_64() {
        assert_eq!(offset_of!(HmdDescV4, product_name), 16);
        assert_eq!(offset_of!(HmdDescV4, serial_number), 36);
        assert_eq!(offset_of!(HmdDescV4, hmd_caps), 80);
        assert_eq!(offset_of!(HmdDescV4, default_eye_fov), 92);
        assert_eq!(offset_of!(HmdDescV4, display_device_name), 184);
        assert_eq!(size_of::<HmdDescV4>(), 200);
        assert_eq!(offset_of!(HmdDescV6, default_eye_fov), 88);
        assert_eq!(size_of::<HmdDescV6>(), 168);
    }

    fn chain_for(set: *const SwapTextureSet) -> ShimResult<SwapChainHandle> {
        Ok(SwapChainHandle(set as usize))
    }

    fn eye_layer(left: usize, right: usize, layer_type: c_int) -> LayerEyeFov {
        LayerEyeFov {
            header: LayerHeader {
                layer_type,
                flags: 0x80 | LayerFlags::HIGH_QUALITY.bits(),
                _align: [],
            },
            color_texture: [left as *const _, right as *const _],
            viewport: [Recti::default(); 2],
            fov: [FovPort::default(); 2],
            render_pose: [Posef::default(); 2],
            sensor_sample_time: 4.5,
        }
    }

    #[test]
    fn test_null_layer_decodes_to_none() {
        let decoded =
            unsafe { decode_layer(ApiRevision::V0_8, ptr::null(), chain_for) }.unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn test_eye_layer_decoding() {
        let layer = eye_layer(0x100, 0x200, 1);
        let header = &layer.header as *const LayerHeader;
        let decoded = unsafe { decode_layer(ApiRevision::V0_7, header, chain_for) }
            .unwrap()
            .unwrap();
        match decoded {
            LayerDescriptor::EyeFov(eye) => {
                assert_eq!(eye.color, [Some(SwapChainHandle(0x100)), Some(SwapChainHandle(0x200))]);
                assert_eq!(eye.sensor_sample_time, 4.5);
                assert_eq!(eye.flags.bits(), 0x81);
            }
            other => panic!("unexpected layer {other:?}"),
        }
    }

    #[test]
    fn test_shared_eye_set_resolved_once() {
        let layer = eye_layer(0x100, 0x100, 1);
        let mut calls = 0;
        let decoded = unsafe {
            decode_layer(ApiRevision::V0_8, &layer.header, |set| {
                calls += 1;
                chain_for(set)
            })
        }
        .unwrap()
        .unwrap();
        assert_eq!(calls, 1);
        match decoded {
            LayerDescriptor::EyeFov(eye) => {
                assert_eq!(eye.color, [Some(SwapChainHandle(0x100)), None])
            }
            other => panic!("unexpected layer {other:?}"),
        }
    }

    #[test]
    fn test_v6_eye_layer_has_no_sample_time() {
        let layer = LayerEyeFovV6 {
            header: LayerHeader {
                layer_type: 1,
                flags: 0,
                _align: [],
            },
            color_texture: [0x100 as *const _, ptr::null()],
            viewport: [Recti::default(); 2],
            fov: [FovPort::default(); 2],
            render_pose: [Posef::default(); 2],
        };
        let decoded = unsafe { decode_layer(ApiRevision::V0_6, &layer.header, chain_for) }
            .unwrap()
            .unwrap();
        match decoded {
            LayerDescriptor::EyeFov(eye) => {
                assert_eq!(eye.sensor_sample_time, 0.0);
                assert_eq!(eye.color[1], None);
            }
            other => panic!("unexpected layer {other:?}"),
        }
    }

    #[test]
    fn test_head_locked_quad_type_by_revision() {
        let quad = LayerQuad {
            header: LayerHeader {
                layer_type: 4,
                flags: 0,
                _align: [],
            },
            color_texture: 0x300 as *const _,
            viewport: Recti::default(),
            quad_pose_center: Posef::default(),
            quad_size: Vector2f { x: 1.0, y: 0.5 },
        };
        let old = unsafe { decode_layer(ApiRevision::V0_7, &quad.header, chain_for) }
            .unwrap()
            .unwrap();
        match old {
            LayerDescriptor::Quad(layer) => {
                assert!(layer.head_locked);
                assert_eq!(layer.color, Some(SwapChainHandle(0x300)));
                assert_eq!(layer.size, Vector2f { x: 1.0, y: 0.5 });
            }
            other => panic!("unexpected layer {other:?}"),
        }

        let new = unsafe { decode_layer(ApiRevision::V0_8, &quad.header, chain_for) }
            .unwrap()
            .unwrap();
        assert_eq!(new, LayerDescriptor::Unsupported { raw_type: 4 });
    }

    #[test]
    fn test_unknown_set_fails_decoding() {
        let layer = eye_layer(0x100, 0x200, 1);
        let result = unsafe {
            decode_layer(ApiRevision::V0_8, &layer.header, |_| {
                Err(ovrwrap_core::ShimError::InvalidHandle)
            })
        };
        assert!(result.is_err());
    }

    #[test]
    fn test_classic_timing_derives_from_midpoint() {
        let timing = FrameTiming {
            app_frame_index: 7,
            display_frame_index: 7,
            this_frame_seconds: 10.0,
            display_midpoint_seconds: 10.02,
            next_frame_seconds: 10.0 + 1.0 / 90.0,
            frame_interval_seconds: 1.0 / 90.0,
        };
        let classic = FrameTimingV4::from(&timing);
        assert_eq!(classic.scanout_midpoint_seconds, 10.02);
        assert_eq!(classic.timewarp_point_seconds, 10.02);
        assert_eq!(classic.eye_scanout_seconds, [10.02, 10.02]);
        assert_eq!(classic.delta_seconds, (1.0f64 / 90.0) as f32);

        let layered = FrameTimingV6::from(&timing);
        assert_eq!(layered.app_frame_index, 7);
        assert_eq!(layered.display_midpoint_seconds, 10.02);
    }

    #[test]
    fn test_swap_texture_set_points_at_its_own_textures() {
        let visible = [
            VisibleTexture {
                texture: TextureHandle(0x10),
                view: Some(ViewHandle(0x11)),
            },
            VisibleTexture {
                texture: TextureHandle(0x20),
                view: None,
            },
        ];
        let alloc = SwapTextureSetAlloc::build(SwapChainHandle(3), &visible, Sizei { w: 64, h: 32 });
        unsafe {
            let set = &(*alloc.as_ptr()).set;
            assert_eq!(set.texture_count, 2);
            assert_eq!(SwapTextureSetAlloc::current_index(&alloc), 0);
            assert_eq!(SwapTextureSetAlloc::chain(&alloc), SwapChainHandle(3));

            let second = &*set.textures.add(1);
            assert_eq!(second.texture(), TextureHandle(0x20));
            assert_eq!(second.view(), ViewHandle(0));
            assert_eq!(second.header.api, RENDER_API_D3D11);
            assert_eq!(second.header.texture_size, Sizei { w: 64, h: 32 });
            assert_eq!((*set.textures).view(), ViewHandle(0x11));
        }
        assert_eq!(alloc.addr(), alloc.as_ptr() as usize);
    }

    #[test]
    fn test_texture_desc_decoding() {
        let raw = D3d11Texture2dDesc {
            width: 1182,
            height: 1464,
            mip_levels: 1,
            array_size: 1,
            format: DxgiFormat::B8G8R8A8_UNORM.0,
            sample_count: 1,
            bind_flags: (BindUsage::SHADER_RESOURCE | BindUsage::RENDER_TARGET).bits(),
            ..Default::default()
        };
        let desc = TextureDesc::from(&raw);
        assert_eq!(desc.format, DxgiFormat::B8G8R8A8_UNORM);
        assert!(desc.bind.contains(BindUsage::RENDER_TARGET));
        assert_eq!(desc.width, 1182);
    }
}
