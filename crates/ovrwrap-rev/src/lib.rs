//! Binding to the LibREV runtime.
//!
//! The runtime library is never linked. [`loader`] finds it at run time and
//! resolves the entry points once; [`RevRuntime`] wraps the resulting table
//! and implements the core's [`RuntimeApi`](ovrwrap_core::RuntimeApi). On
//! Windows, `D3d11Graphics` supplies the matching graphics side;
//! [`platform_graphics`] picks whatever the platform has.

pub mod graphics;
pub mod loader;
pub mod runtime;
pub mod sys;

#[cfg(target_os = "windows")]
pub mod d3d11;

#[cfg(target_os = "windows")]
pub use d3d11::D3d11Graphics;
pub use graphics::platform_graphics;
pub use loader::{candidate_paths, library_file_name, RevLibrary};
pub use runtime::RevRuntime;
