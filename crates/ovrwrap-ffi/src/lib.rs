#![allow(clippy::missing_safety_doc)]
#![allow(non_snake_case)]

//! The legacy HMD API, exported over the LibREV runtime.
//!
//! Every revision module is always compiled. The `abi-0-x` cargo feature
//! picks the one whose functions carry their unmangled C names, so one
//! build stands in for one legacy library.

pub mod legacy;
pub mod logging;
pub mod state;
pub mod v0_4;
pub mod v0_5;
pub mod v0_6;
pub mod v0_7;
pub mod v0_8;

use ovrwrap_core::ApiRevision;

/// The revision this build exports.
pub fn exported_revision() -> ApiRevision {
    if cfg!(export_abi = "0_4") {
        ApiRevision::V0_4
    } else if cfg!(export_abi = "0_5") {
        ApiRevision::V0_5
    } else if cfg!(export_abi = "0_6") {
        ApiRevision::V0_6
    } else if cfg!(export_abi = "0_7") {
        ApiRevision::V0_7
    } else {
        ApiRevision::V0_8
    }
}
