//! Translation core of the legacy HMD API shim.
//!
//! The core owns everything that has to stay consistent between the
//! application's view of its render targets (legacy swap texture sets, the
//! legacy mirror texture, legacy layer lists) and the runtime's view (texture
//! swap chains that commit and advance on their own). It never touches a
//! graphics API or the runtime library directly: both are reached through the
//! [`RuntimeApi`] and [`GraphicsApi`] traits, which `ovrwrap-rev` implements
//! for the real runtime and the tests implement with recording mocks.

#![forbid(unsafe_code)]

pub mod adapter;
pub mod format;
pub mod layers;
pub mod mirror;
pub mod present;
pub mod registry;
pub mod revision;
pub mod ring;
pub mod session;
pub mod status;
pub mod submit;
pub mod swap_chain;
pub mod texture;
pub mod timing;
pub mod types;

pub use adapter::{Backend, GraphicsApi, RuntimeApi};
pub use format::{to_runtime_format, to_shader_view_format, DxgiFormat, RuntimeFormat};
pub use layers::{EyeFovLayer, LayerDescriptor, LayerFlags, QuadLayer, RuntimeLayer, RuntimeLayerType};
pub use mirror::{MirrorHandle, MirrorRecord};
pub use present::EyeTexture;
pub use registry::{Registry, SwapChainHandle};
pub use revision::{ApiRevision, LegacyLayerKind};
pub use session::ShimSession;
pub use status::ResultCode;
pub use submit::RUNTIME_MAX_LAYERS;
pub use swap_chain::{SwapChainRecord, VisibleTexture, VISIBLE_TEXTURE_COUNT};
pub use texture::{BindUsage, RuntimeBindFlags, RuntimeChainDesc, RuntimeMirrorDesc, RuntimeMiscFlags, TextureDesc};
pub use timing::FrameTiming;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShimError {
    #[error("unknown or destroyed handle")]
    InvalidHandle,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("unsupported texture format {0}")]
    UnsupportedFormat(u32),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("runtime returned {0}")]
    Runtime(ResultCode),
}

impl ShimError {
    /// The legacy result code reported to the caller for this error.
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::InvalidHandle | Self::InvalidParameter(_) => ResultCode::INVALID_PARAMETER,
            Self::UnsupportedFormat(_) | Self::Unsupported(_) => ResultCode::UNSUPPORTED,
            Self::Service(_) => ResultCode::SERVICE_ERROR,
            Self::Runtime(code) => *code,
        }
    }
}

pub type ShimResult<T> = Result<T, ShimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_mapping() {
        assert_eq!(ShimError::InvalidHandle.result_code(), ResultCode(-1005));
        assert_eq!(
            ShimError::InvalidParameter("x".into()).result_code(),
            ResultCode(-1005)
        );
        assert_eq!(ShimError::UnsupportedFormat(2).result_code(), ResultCode(-1009));
        assert_eq!(ShimError::Service("x".into()).result_code(), ResultCode(-1006));
        assert_eq!(
            ShimError::Runtime(ResultCode::DISPLAY_LOST).result_code(),
            ResultCode::DISPLAY_LOST
        );
    }
}
