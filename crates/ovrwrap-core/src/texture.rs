//! Texture descriptions on both sides of the shim and the rules that turn a
//! caller's request into a runtime request.

use bitflags::bitflags;

use crate::format::{to_runtime_format, DxgiFormat, RuntimeFormat};
use crate::{ShimError, ShimResult};

bitflags! {
    /// Bind usage the caller asked for, using the D3D11 bit values.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct BindUsage: u32 {
        const SHADER_RESOURCE = 0x8;
        const RENDER_TARGET = 0x20;
        const DEPTH_STENCIL = 0x40;
        const UNORDERED_ACCESS = 0x80;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct RuntimeMiscFlags: u32 {
        /// Allocate typeless so views may reinterpret linear vs. sRGB.
        const DX_TYPELESS = 0x1;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct RuntimeBindFlags: u32 {
        const DX_RENDER_TARGET = 0x1;
        const DX_DEPTH_STENCIL = 0x4;
    }
}

/// The caller's description of a texture, as decoded from its
/// `D3D11_TEXTURE2D_DESC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub format: DxgiFormat,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_size: u32,
    pub sample_count: u32,
    pub sample_quality: u32,
    pub usage: u32,
    pub bind: BindUsage,
    pub cpu_access: u32,
    /// Raw D3D11 misc flags, forwarded untouched to the visible textures.
    pub misc: u32,
}

impl TextureDesc {
    pub fn new(format: DxgiFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            mip_levels: 1,
            array_size: 1,
            sample_count: 1,
            sample_quality: 0,
            usage: 0,
            bind: BindUsage::empty(),
            cpu_access: 0,
            misc: 0,
        }
    }

    pub fn with_bind(mut self, bind: BindUsage) -> Self {
        self.bind = bind;
        self
    }
}

/// Runtime-side swap chain description. Immutable once the chain exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeChainDesc {
    pub format: RuntimeFormat,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_size: u32,
    pub sample_count: u32,
    pub static_image: bool,
    pub misc: RuntimeMiscFlags,
    pub bind: RuntimeBindFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeMirrorDesc {
    pub format: RuntimeFormat,
    pub width: u32,
    pub height: u32,
    pub misc: RuntimeMiscFlags,
}

/// Validate a swap texture request and derive the runtime description.
///
/// Everything that can be rejected is rejected here, before any resource
/// exists.
pub fn runtime_chain_desc(
    desc: &TextureDesc,
    promote_srgb: bool,
    typeless_requested: bool,
) -> ShimResult<RuntimeChainDesc> {
    if desc.array_size != 1 {
        return Err(ShimError::Unsupported(format!(
            "texture arrays are not supported (array size {})",
            desc.array_size
        )));
    }
    if desc.bind.contains(BindUsage::UNORDERED_ACCESS) {
        return Err(ShimError::Unsupported(
            "unordered access binding is not supported".to_string(),
        ));
    }
    if desc.width == 0 || desc.height == 0 || desc.mip_levels == 0 || desc.sample_count == 0 {
        return Err(ShimError::InvalidParameter(format!(
            "degenerate texture {}x{} mips {} samples {}",
            desc.width, desc.height, desc.mip_levels, desc.sample_count
        )));
    }

    let format = to_runtime_format(desc.format, promote_srgb);
    if format.is_unknown() {
        return Err(ShimError::UnsupportedFormat(desc.format.0));
    }

    let mut misc = RuntimeMiscFlags::empty();
    let mut bind = RuntimeBindFlags::empty();
    if format.is_srgb() || typeless_requested {
        misc |= RuntimeMiscFlags::DX_TYPELESS;
    }
    if desc.bind.contains(BindUsage::DEPTH_STENCIL) {
        misc |= RuntimeMiscFlags::DX_TYPELESS;
        bind |= RuntimeBindFlags::DX_DEPTH_STENCIL;
    }

    Ok(RuntimeChainDesc {
        format,
        width: desc.width,
        height: desc.height,
        mip_levels: desc.mip_levels,
        array_size: 1,
        sample_count: desc.sample_count,
        static_image: false,
        misc,
        bind,
    })
}

pub fn runtime_mirror_desc(
    desc: &TextureDesc,
    promote_srgb: bool,
    typeless_requested: bool,
) -> ShimResult<RuntimeMirrorDesc> {
    if desc.width == 0 || desc.height == 0 {
        return Err(ShimError::InvalidParameter(format!(
            "degenerate mirror {}x{}",
            desc.width, desc.height
        )));
    }

    let format = to_runtime_format(desc.format, promote_srgb);
    if format.is_unknown() {
        return Err(ShimError::UnsupportedFormat(desc.format.0));
    }

    let mut misc = RuntimeMiscFlags::empty();
    if format.is_srgb() || typeless_requested {
        misc |= RuntimeMiscFlags::DX_TYPELESS;
    }

    Ok(RuntimeMirrorDesc {
        format,
        width: desc.width,
        height: desc.height,
        misc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(format: DxgiFormat) -> TextureDesc {
        TextureDesc::new(format, 1024, 1024).with_bind(BindUsage::SHADER_RESOURCE)
    }

    #[test]
    fn test_srgb_sets_typeless() {
        let desc = runtime_chain_desc(&color(DxgiFormat::R8G8B8A8_UNORM_SRGB), false, false).unwrap();
        assert_eq!(desc.format, RuntimeFormat::R8G8B8A8UnormSrgb);
        assert!(desc.misc.contains(RuntimeMiscFlags::DX_TYPELESS));
        assert!(desc.bind.is_empty());
    }

    #[test]
    fn test_linear_does_not_set_typeless() {
        let desc = runtime_chain_desc(&color(DxgiFormat::R16G16B16A16_FLOAT), true, false).unwrap();
        assert!(!desc.misc.contains(RuntimeMiscFlags::DX_TYPELESS));

        let desc = runtime_chain_desc(&color(DxgiFormat::R8G8B8A8_UNORM), false, false).unwrap();
        assert_eq!(desc.format, RuntimeFormat::R8G8B8A8Unorm);
        assert!(desc.misc.is_empty());
    }

    #[test]
    fn test_explicit_typeless_request() {
        let desc = runtime_chain_desc(&color(DxgiFormat::R8G8B8A8_UNORM), false, true).unwrap();
        assert!(desc.misc.contains(RuntimeMiscFlags::DX_TYPELESS));
    }

    #[test]
    fn test_depth_stencil_binding() {
        let request = TextureDesc::new(DxgiFormat::D24_UNORM_S8_UINT, 512, 512)
            .with_bind(BindUsage::DEPTH_STENCIL);
        let desc = runtime_chain_desc(&request, true, false).unwrap();
        assert_eq!(desc.format, RuntimeFormat::D24UnormS8Uint);
        assert!(desc.bind.contains(RuntimeBindFlags::DX_DEPTH_STENCIL));
        assert!(desc.misc.contains(RuntimeMiscFlags::DX_TYPELESS));
    }

    #[test]
    fn test_rejections() {
        let mut array = color(DxgiFormat::R8G8B8A8_UNORM);
        array.array_size = 2;
        assert!(matches!(
            runtime_chain_desc(&array, true, false),
            Err(ShimError::Unsupported(_))
        ));

        let uav = color(DxgiFormat::R8G8B8A8_UNORM).with_bind(BindUsage::UNORDERED_ACCESS);
        assert!(matches!(
            runtime_chain_desc(&uav, true, false),
            Err(ShimError::Unsupported(_))
        ));

        assert!(matches!(
            runtime_chain_desc(&color(DxgiFormat::BC1_UNORM), true, false),
            Err(ShimError::UnsupportedFormat(71))
        ));

        let empty = TextureDesc::new(DxgiFormat::R8G8B8A8_UNORM, 0, 16);
        assert!(matches!(
            runtime_chain_desc(&empty, true, false),
            Err(ShimError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_mirror_desc() {
        let desc = runtime_mirror_desc(&color(DxgiFormat::B8G8R8A8_UNORM), true, false).unwrap();
        assert_eq!(desc.format, RuntimeFormat::B8G8R8A8UnormSrgb);
        assert!(desc.misc.contains(RuntimeMiscFlags::DX_TYPELESS));
        assert!(matches!(
            runtime_mirror_desc(&color(DxgiFormat(2)), true, false),
            Err(ShimError::UnsupportedFormat(2))
        ));
    }
}
