//! Pixel format translation between the application's DXGI formats and the
//! runtime's closed format enumeration.

use std::fmt;

/// A `DXGI_FORMAT` value as the application passed it.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DxgiFormat(pub u32);

impl DxgiFormat {
    pub const UNKNOWN: Self = Self(0);
    pub const R16G16B16A16_FLOAT: Self = Self(10);
    pub const R32G8X24_TYPELESS: Self = Self(19);
    pub const D32_FLOAT_S8X24_UINT: Self = Self(20);
    pub const R32_FLOAT_X8X24_TYPELESS: Self = Self(21);
    pub const R8G8B8A8_TYPELESS: Self = Self(27);
    pub const R8G8B8A8_UNORM: Self = Self(28);
    pub const R8G8B8A8_UNORM_SRGB: Self = Self(29);
    pub const R32_TYPELESS: Self = Self(39);
    pub const D32_FLOAT: Self = Self(40);
    pub const R32_FLOAT: Self = Self(41);
    pub const R24G8_TYPELESS: Self = Self(44);
    pub const D24_UNORM_S8_UINT: Self = Self(45);
    pub const R24_UNORM_X8_TYPELESS: Self = Self(46);
    pub const R16_TYPELESS: Self = Self(53);
    pub const D16_UNORM: Self = Self(55);
    pub const R16_UNORM: Self = Self(56);
    pub const BC1_TYPELESS: Self = Self(70);
    pub const BC1_UNORM: Self = Self(71);
    pub const BC2_TYPELESS: Self = Self(73);
    pub const BC2_UNORM: Self = Self(74);
    pub const BC3_TYPELESS: Self = Self(76);
    pub const BC3_UNORM: Self = Self(77);
    pub const B5G6R5_UNORM: Self = Self(85);
    pub const B5G5R5A1_UNORM: Self = Self(86);
    pub const B8G8R8A8_UNORM: Self = Self(87);
    pub const B8G8R8X8_UNORM: Self = Self(88);
    pub const B8G8R8A8_TYPELESS: Self = Self(90);
    pub const B8G8R8A8_UNORM_SRGB: Self = Self(91);
    pub const B8G8R8X8_TYPELESS: Self = Self(92);
    pub const B8G8R8X8_UNORM_SRGB: Self = Self(93);
    pub const BC7_TYPELESS: Self = Self(97);
    pub const BC7_UNORM: Self = Self(98);
    pub const B4G4R4A4_UNORM: Self = Self(115);
}

impl fmt::Display for DxgiFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DXGI_FORMAT({})", self.0)
    }
}

/// The runtime's texture format enumeration.
#[repr(i32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RuntimeFormat {
    #[default]
    Unknown = 0,
    B5G6R5Unorm = 1,
    B5G5R5A1Unorm = 2,
    B4G4R4A4Unorm = 3,
    R8G8B8A8Unorm = 4,
    R8G8B8A8UnormSrgb = 5,
    B8G8R8A8Unorm = 6,
    B8G8R8A8UnormSrgb = 7,
    B8G8R8X8Unorm = 8,
    B8G8R8X8UnormSrgb = 9,
    R16G16B16A16Float = 10,
    D16Unorm = 11,
    D24UnormS8Uint = 12,
    D32Float = 13,
    D32FloatS8X24Uint = 14,
}

impl RuntimeFormat {
    /// Values outside the enumeration read as `Unknown`.
    pub fn from_raw(value: i32) -> Self {
        match value {
            1 => Self::B5G6R5Unorm,
            2 => Self::B5G5R5A1Unorm,
            3 => Self::B4G4R4A4Unorm,
            4 => Self::R8G8B8A8Unorm,
            5 => Self::R8G8B8A8UnormSrgb,
            6 => Self::B8G8R8A8Unorm,
            7 => Self::B8G8R8A8UnormSrgb,
            8 => Self::B8G8R8X8Unorm,
            9 => Self::B8G8R8X8UnormSrgb,
            10 => Self::R16G16B16A16Float,
            11 => Self::D16Unorm,
            12 => Self::D24UnormS8Uint,
            13 => Self::D32Float,
            14 => Self::D32FloatS8X24Uint,
            _ => Self::Unknown,
        }
    }

    pub fn is_unknown(self) -> bool {
        self == Self::Unknown
    }

    pub fn is_srgb(self) -> bool {
        matches!(
            self,
            Self::R8G8B8A8UnormSrgb | Self::B8G8R8A8UnormSrgb | Self::B8G8R8X8UnormSrgb
        )
    }

    pub fn is_depth(self) -> bool {
        matches!(
            self,
            Self::D16Unorm | Self::D24UnormS8Uint | Self::D32Float | Self::D32FloatS8X24Uint
        )
    }
}

/// Map an application format to the runtime format.
///
/// With `promote_srgb` set, plain 8-bit UNORM color formats (and their
/// typeless parents) become the sRGB runtime format; this is how the oldest
/// revisions told the compositor their content was gamma encoded. Anything
/// without a runtime counterpart yields [`RuntimeFormat::Unknown`].
pub fn to_runtime_format(format: DxgiFormat, promote_srgb: bool) -> RuntimeFormat {
    let color = |linear: RuntimeFormat, srgb: RuntimeFormat| {
        if promote_srgb {
            srgb
        } else {
            linear
        }
    };

    match format {
        DxgiFormat::B5G6R5_UNORM => RuntimeFormat::B5G6R5Unorm,
        DxgiFormat::B5G5R5A1_UNORM => RuntimeFormat::B5G5R5A1Unorm,
        DxgiFormat::B4G4R4A4_UNORM => RuntimeFormat::B4G4R4A4Unorm,

        DxgiFormat::R8G8B8A8_UNORM | DxgiFormat::R8G8B8A8_TYPELESS => {
            color(RuntimeFormat::R8G8B8A8Unorm, RuntimeFormat::R8G8B8A8UnormSrgb)
        }
        DxgiFormat::B8G8R8A8_UNORM | DxgiFormat::B8G8R8A8_TYPELESS => {
            color(RuntimeFormat::B8G8R8A8Unorm, RuntimeFormat::B8G8R8A8UnormSrgb)
        }
        DxgiFormat::B8G8R8X8_UNORM | DxgiFormat::B8G8R8X8_TYPELESS => {
            color(RuntimeFormat::B8G8R8X8Unorm, RuntimeFormat::B8G8R8X8UnormSrgb)
        }
        DxgiFormat::R8G8B8A8_UNORM_SRGB => RuntimeFormat::R8G8B8A8UnormSrgb,
        DxgiFormat::B8G8R8A8_UNORM_SRGB => RuntimeFormat::B8G8R8A8UnormSrgb,
        DxgiFormat::B8G8R8X8_UNORM_SRGB => RuntimeFormat::B8G8R8X8UnormSrgb,

        DxgiFormat::R16G16B16A16_FLOAT => RuntimeFormat::R16G16B16A16Float,

        DxgiFormat::D16_UNORM | DxgiFormat::R16_TYPELESS => RuntimeFormat::D16Unorm,
        DxgiFormat::D24_UNORM_S8_UINT | DxgiFormat::R24G8_TYPELESS => {
            RuntimeFormat::D24UnormS8Uint
        }
        DxgiFormat::D32_FLOAT | DxgiFormat::R32_TYPELESS => RuntimeFormat::D32Float,
        DxgiFormat::D32_FLOAT_S8X24_UINT | DxgiFormat::R32G8X24_TYPELESS => {
            RuntimeFormat::D32FloatS8X24Uint
        }

        _ => RuntimeFormat::Unknown,
    }
}

/// Concrete format for a shader-resource view on a texture of `format`.
///
/// Typeless formats resolve to their linear (or depth-readable) member;
/// everything else is already concrete and passes through.
pub fn to_shader_view_format(format: DxgiFormat) -> DxgiFormat {
    match format {
        DxgiFormat::B8G8R8A8_TYPELESS => DxgiFormat::B8G8R8A8_UNORM,
        DxgiFormat::R8G8B8A8_TYPELESS => DxgiFormat::R8G8B8A8_UNORM,
        DxgiFormat::B8G8R8X8_TYPELESS => DxgiFormat::B8G8R8X8_UNORM,
        DxgiFormat::BC1_TYPELESS => DxgiFormat::BC1_UNORM,
        DxgiFormat::BC2_TYPELESS => DxgiFormat::BC2_UNORM,
        DxgiFormat::BC3_TYPELESS => DxgiFormat::BC3_UNORM,
        DxgiFormat::BC7_TYPELESS => DxgiFormat::BC7_UNORM,
        DxgiFormat::R24G8_TYPELESS => DxgiFormat::R24_UNORM_X8_TYPELESS,
        DxgiFormat::R32_TYPELESS => DxgiFormat::R32_FLOAT,
        DxgiFormat::R16_TYPELESS => DxgiFormat::R16_UNORM,
        DxgiFormat::R32G8X24_TYPELESS => DxgiFormat::R32_FLOAT_X8X24_TYPELESS,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTED: &[DxgiFormat] = &[
        DxgiFormat::B5G6R5_UNORM,
        DxgiFormat::B5G5R5A1_UNORM,
        DxgiFormat::B4G4R4A4_UNORM,
        DxgiFormat::R8G8B8A8_UNORM,
        DxgiFormat::R8G8B8A8_UNORM_SRGB,
        DxgiFormat::R8G8B8A8_TYPELESS,
        DxgiFormat::B8G8R8A8_UNORM,
        DxgiFormat::B8G8R8A8_UNORM_SRGB,
        DxgiFormat::B8G8R8A8_TYPELESS,
        DxgiFormat::B8G8R8X8_UNORM,
        DxgiFormat::B8G8R8X8_UNORM_SRGB,
        DxgiFormat::B8G8R8X8_TYPELESS,
        DxgiFormat::R16G16B16A16_FLOAT,
        DxgiFormat::D16_UNORM,
        DxgiFormat::R16_TYPELESS,
        DxgiFormat::D24_UNORM_S8_UINT,
        DxgiFormat::R24G8_TYPELESS,
        DxgiFormat::D32_FLOAT,
        DxgiFormat::R32_TYPELESS,
        DxgiFormat::D32_FLOAT_S8X24_UINT,
        DxgiFormat::R32G8X24_TYPELESS,
    ];

    #[test]
    fn test_translation_is_pure() {
        for &format in SUPPORTED {
            for promote in [false, true] {
                let first = to_runtime_format(format, promote);
                let second = to_runtime_format(format, promote);
                assert_eq!(first, second, "{format}");
                assert!(!first.is_unknown(), "{format} should be supported");
            }
        }
    }

    #[test]
    fn test_unmapped_formats_are_unknown() {
        for raw in [0u32, 2, 41, 71, 98, 1000] {
            assert_eq!(
                to_runtime_format(DxgiFormat(raw), true),
                RuntimeFormat::Unknown,
                "{raw}"
            );
        }
    }

    #[test]
    fn test_srgb_promotion_toggle() {
        assert_eq!(
            to_runtime_format(DxgiFormat::R8G8B8A8_UNORM, true),
            RuntimeFormat::R8G8B8A8UnormSrgb
        );
        assert_eq!(
            to_runtime_format(DxgiFormat::R8G8B8A8_UNORM, false),
            RuntimeFormat::R8G8B8A8Unorm
        );
        assert_eq!(
            to_runtime_format(DxgiFormat::B8G8R8X8_TYPELESS, false),
            RuntimeFormat::B8G8R8X8Unorm
        );
        // Explicit sRGB input stays sRGB either way.
        assert_eq!(
            to_runtime_format(DxgiFormat::B8G8R8A8_UNORM_SRGB, false),
            RuntimeFormat::B8G8R8A8UnormSrgb
        );
        // Formats without an sRGB sibling are untouched by the toggle.
        assert_eq!(
            to_runtime_format(DxgiFormat::R16G16B16A16_FLOAT, true),
            RuntimeFormat::R16G16B16A16Float
        );
    }

    #[test]
    fn test_typeless_depth_maps_to_depth() {
        assert_eq!(
            to_runtime_format(DxgiFormat::R24G8_TYPELESS, false),
            RuntimeFormat::D24UnormS8Uint
        );
        assert!(to_runtime_format(DxgiFormat::R32_TYPELESS, false).is_depth());
    }

    #[test]
    fn test_shader_view_format() {
        assert_eq!(
            to_shader_view_format(DxgiFormat::R8G8B8A8_TYPELESS),
            DxgiFormat::R8G8B8A8_UNORM
        );
        assert_eq!(
            to_shader_view_format(DxgiFormat::R24G8_TYPELESS),
            DxgiFormat::R24_UNORM_X8_TYPELESS
        );
        assert_eq!(
            to_shader_view_format(DxgiFormat::R8G8B8A8_UNORM_SRGB),
            DxgiFormat::R8G8B8A8_UNORM_SRGB
        );
    }

    #[test]
    fn test_srgb_classification() {
        assert!(RuntimeFormat::B8G8R8X8UnormSrgb.is_srgb());
        assert!(!RuntimeFormat::B8G8R8X8Unorm.is_srgb());
        assert!(!RuntimeFormat::D32Float.is_srgb());
    }

    #[test]
    fn test_runtime_format_from_raw() {
        for raw in 0..=14 {
            assert_eq!(RuntimeFormat::from_raw(raw) as i32, raw);
        }
        assert_eq!(RuntimeFormat::from_raw(15), RuntimeFormat::Unknown);
        assert_eq!(RuntimeFormat::from_raw(-1), RuntimeFormat::Unknown);
    }
}
