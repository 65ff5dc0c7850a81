use std::fmt;

use crate::{ShimError, ShimResult};

/// Numeric result shared by the runtime and the 0.6+ legacy API.
///
/// Non-negative values are successes; `SUCCESS_NOT_VISIBLE` is the one
/// qualified success the caller is expected to poll on.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(pub i32);

impl ResultCode {
    pub const SUCCESS: Self = Self(0);
    pub const SUCCESS_NOT_VISIBLE: Self = Self(1000);

    pub const MEMORY_ALLOCATION_FAILURE: Self = Self(-1000);
    pub const INVALID_SESSION: Self = Self(-1002);
    pub const TIMEOUT: Self = Self(-1003);
    pub const NOT_INITIALIZED: Self = Self(-1004);
    pub const INVALID_PARAMETER: Self = Self(-1005);
    pub const SERVICE_ERROR: Self = Self(-1006);
    pub const NO_HMD: Self = Self(-1007);
    pub const UNSUPPORTED: Self = Self(-1009);
    pub const INITIALIZE: Self = Self(-3000);
    pub const LIB_LOAD: Self = Self(-3001);
    pub const DISPLAY_LOST: Self = Self(-6000);
    pub const TEXTURE_SWAP_CHAIN_FULL: Self = Self(-6001);
    pub const TEXTURE_SWAP_CHAIN_INVALID: Self = Self(-6002);
    pub const RUNTIME_EXCEPTION: Self = Self(-7000);

    pub fn is_success(self) -> bool {
        self.0 >= 0
    }

    pub fn into_result(self) -> ShimResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ShimError::Runtime(self))
        }
    }

    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "Success",
            Self::SUCCESS_NOT_VISIBLE => "Success_NotVisible",
            Self::MEMORY_ALLOCATION_FAILURE => "MemoryAllocationFailure",
            Self::INVALID_SESSION => "InvalidSession",
            Self::TIMEOUT => "Timeout",
            Self::NOT_INITIALIZED => "NotInitialized",
            Self::INVALID_PARAMETER => "InvalidParameter",
            Self::SERVICE_ERROR => "ServiceError",
            Self::NO_HMD => "NoHmd",
            Self::UNSUPPORTED => "Unsupported",
            Self::INITIALIZE => "Initialize",
            Self::LIB_LOAD => "LibLoad",
            Self::DISPLAY_LOST => "DisplayLost",
            Self::TEXTURE_SWAP_CHAIN_FULL => "TextureSwapChainFull",
            Self::TEXTURE_SWAP_CHAIN_INVALID => "TextureSwapChainInvalid",
            Self::RUNTIME_EXCEPTION => "RuntimeException",
            _ => return None,
        })
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_visible_is_success() {
        assert!(ResultCode::SUCCESS_NOT_VISIBLE.is_success());
        assert_ne!(ResultCode::SUCCESS_NOT_VISIBLE, ResultCode::SUCCESS);
        assert!(ResultCode::SUCCESS_NOT_VISIBLE.into_result().is_ok());
    }

    #[test]
    fn test_display_lost_propagates() {
        match ResultCode::DISPLAY_LOST.into_result() {
            Err(ShimError::Runtime(code)) => assert_eq!(code, ResultCode::DISPLAY_LOST),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ResultCode::DISPLAY_LOST.to_string(), "DisplayLost (-6000)");
        assert_eq!(ResultCode(-42).to_string(), "-42");
    }
}
