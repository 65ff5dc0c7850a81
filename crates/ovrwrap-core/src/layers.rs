use bitflags::bitflags;

use crate::{
    registry::SwapChainHandle,
    types::{FovPort, Posef, Recti, RuntimeChainHandle, Vector2f},
};

bitflags! {
    /// Layer header flags. Bit values are shared by every revision and the
    /// runtime; unknown bits are carried through untouched.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u32 {
        const HIGH_QUALITY = 0x01;
        const TEXTURE_ORIGIN_AT_BOTTOM_LEFT = 0x02;
        const HEAD_LOCKED = 0x04;
    }
}

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeLayerType {
    Disabled = 0,
    EyeFov = 1,
    Quad = 3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeFovLayer {
    pub flags: LayerFlags,
    /// Right eye may be absent, in which case it shares the left chain.
    pub color: [Option<SwapChainHandle>; 2],
    pub viewport: [Recti; 2],
    pub fov: [FovPort; 2],
    pub render_pose: [Posef; 2],
    pub sensor_sample_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadLayer {
    pub flags: LayerFlags,
    pub color: Option<SwapChainHandle>,
    pub viewport: Recti,
    pub center_pose: Posef,
    pub size: Vector2f,
    /// Set when the caller used the deprecated head-locked quad type.
    pub head_locked: bool,
}

/// One caller layer, decoded from whatever revision's layout it came in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerDescriptor {
    EyeFov(EyeFovLayer),
    Quad(QuadLayer),
    Disabled { flags: LayerFlags },
    /// A type code this revision does not translate. Dropped on submit.
    Unsupported { raw_type: i32 },
}

/// A layer in the runtime's unified representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuntimeLayer {
    EyeFov {
        flags: LayerFlags,
        color: [RuntimeChainHandle; 2],
        viewport: [Recti; 2],
        fov: [FovPort; 2],
        render_pose: [Posef; 2],
        sensor_sample_time: f64,
    },
    Quad {
        flags: LayerFlags,
        color: RuntimeChainHandle,
        viewport: Recti,
        center_pose: Posef,
        size: Vector2f,
    },
    Disabled {
        flags: LayerFlags,
    },
}

impl RuntimeLayer {
    pub fn layer_type(&self) -> RuntimeLayerType {
        match self {
            Self::EyeFov { .. } => RuntimeLayerType::EyeFov,
            Self::Quad { .. } => RuntimeLayerType::Quad,
            Self::Disabled { .. } => RuntimeLayerType::Disabled,
        }
    }

    pub fn flags(&self) -> LayerFlags {
        match self {
            Self::EyeFov { flags, .. } | Self::Quad { flags, .. } | Self::Disabled { flags } => {
                *flags
            }
        }
    }

    /// Runtime chains this layer references, in slot order.
    pub fn chains(&self) -> Vec<RuntimeChainHandle> {
        match self {
            Self::EyeFov { color, .. } => color.to_vec(),
            Self::Quad { color, .. } => vec![*color],
            Self::Disabled { .. } => Vec::new(),
        }
    }
}
