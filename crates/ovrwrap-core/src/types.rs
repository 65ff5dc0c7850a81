//! Plain data shared by the core, the runtime binding and the exported ABI.
//!
//! The math types are `#[repr(C)]` because every legacy revision and the
//! runtime agree on their layout, so the FFI layer can hand them across
//! without conversion.

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2f {
    pub x: f32,
    pub y: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vector2i {
    pub x: i32,
    pub y: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sizei {
    pub w: i32,
    pub h: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recti {
    pub pos: Vector2i,
    pub size: Sizei,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quatf {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quatf {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Posef {
    pub orientation: Quatf,
    pub position: Vector3f,
}

/// Field of view as tangents of the half angles.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FovPort {
    pub up_tan: f32,
    pub down_tan: f32,
    pub left_tan: f32,
    pub right_tan: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewScaleDesc {
    pub hmd_to_eye_offset: [Vector3f; 2],
    pub hmd_space_to_world_scale_in_meters: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EyeRenderDesc {
    pub eye: i32,
    pub fov: FovPort,
    pub distorted_viewport: Recti,
    pub pixels_per_tan_angle_at_center: Vector2f,
    pub hmd_to_eye_offset: Vector3f,
}

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left = 0,
    Right = 1,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Identifies the graphics adapter the runtime wants the application to use.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GraphicsLuid(pub [u8; 8]);

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(pub usize);

        impl $name {
            pub const NULL: Self = Self(0);

            pub fn is_null(self) -> bool {
                self.0 == 0
            }

            pub fn from_ptr<T>(ptr: *const T) -> Self {
                Self(ptr as usize)
            }

            pub fn as_ptr<T>(self) -> *mut T {
                self.0 as *mut T
            }
        }
    };
}

opaque_handle!(
    /// Runtime session the shim was created on.
    SessionHandle
);
opaque_handle!(
    /// The application's graphics device (an `ID3D11Device*` on Windows).
    DeviceHandle
);
opaque_handle!(
    /// Command context used for GPU-side copies.
    ContextHandle
);
opaque_handle!(TextureHandle);
opaque_handle!(ViewHandle);
opaque_handle!(
    /// Texture swap chain owned by the runtime.
    RuntimeChainHandle
);
opaque_handle!(RuntimeMirrorHandle);
