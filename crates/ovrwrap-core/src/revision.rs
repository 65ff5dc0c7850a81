//! What differs between the legacy API revisions the shim impersonates.

use std::fmt;

/// A legacy API revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApiRevision {
    V0_4,
    V0_5,
    V0_6,
    V0_7,
    V0_8,
}

/// How a revision's raw layer type code should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyLayerKind {
    Disabled,
    EyeFov,
    QuadInWorld,
    QuadHeadLocked,
    Unsupported(i32),
}

impl ApiRevision {
    pub const ALL: [ApiRevision; 5] = [
        ApiRevision::V0_4,
        ApiRevision::V0_5,
        ApiRevision::V0_6,
        ApiRevision::V0_7,
        ApiRevision::V0_8,
    ];

    pub fn minor(self) -> u32 {
        match self {
            Self::V0_4 => 4,
            Self::V0_5 => 5,
            Self::V0_6 => 6,
            Self::V0_7 => 7,
            Self::V0_8 => 8,
        }
    }

    /// Version reported through `ovr_GetVersionString`.
    pub fn version_string(self) -> &'static str {
        match self {
            Self::V0_4 => "0.4.4",
            Self::V0_5 => "0.5.0.1",
            Self::V0_6 => "0.6.0.1",
            Self::V0_7 => "0.7.0.0",
            Self::V0_8 => "0.8.0.0",
        }
    }

    /// Decode a layer type code.
    ///
    /// Codes 2 (eye FOV with depth), 5 (eye matrix) and 6 (direct) existed in
    /// some revisions but have no translation; 4 (head-locked quad) was
    /// folded into a flag in 0.8.
    pub fn classify_layer(self, raw_type: i32) -> LegacyLayerKind {
        match raw_type {
            0 => LegacyLayerKind::Disabled,
            1 => LegacyLayerKind::EyeFov,
            3 => LegacyLayerKind::QuadInWorld,
            4 if self < Self::V0_8 => LegacyLayerKind::QuadHeadLocked,
            other => LegacyLayerKind::Unsupported(other),
        }
    }

    /// Whether plain 8-bit UNORM formats are promoted to sRGB.
    pub fn promotes_srgb(self) -> bool {
        self <= Self::V0_6
    }

    /// Whether texture creation carries an explicit typeless request.
    pub fn explicit_typeless_flag(self) -> bool {
        self >= Self::V0_7
    }

    /// Whether eye layers carry the caller's own sensor sample time. Older
    /// layouts have no such field and are stamped at submission.
    pub fn eye_layer_sample_time(self) -> bool {
        self >= Self::V0_7
    }

    /// 0.4 and 0.5 hand whole eye textures to `EndFrame` instead of
    /// submitting layers.
    pub fn uses_end_frame(self) -> bool {
        self <= Self::V0_5
    }
}

impl fmt::Display for ApiRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0.{}", self.minor())
    }
}
