//! Picks the graphics backend for the current platform.

use std::sync::Arc;

use ovrwrap_core::GraphicsApi;

/// The graphics backend sessions are created with.
///
/// Only Direct3D 11 is supported. Elsewhere every graphics operation fails
/// with [`ShimError::Unsupported`](ovrwrap_core::ShimError::Unsupported), so
/// a session can still be created and timed but never renders.
pub fn platform_graphics() -> Arc<dyn GraphicsApi> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(crate::d3d11::D3d11Graphics::new())
    }
    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(unsupported::UnsupportedGraphics)
    }
}

#[cfg(not(target_os = "windows"))]
pub mod unsupported {
    use ovrwrap_core::{
        ContextHandle, DeviceHandle, DxgiFormat, GraphicsApi, ShimError, ShimResult, TextureDesc,
        TextureHandle, ViewHandle,
    };
    use tracing::warn;

    fn unsupported<T>() -> ShimResult<T> {
        Err(ShimError::Unsupported(
            "Direct3D 11 is not available on this platform".to_string(),
        ))
    }

    #[derive(Debug, Default, Clone, Copy)]
    pub struct UnsupportedGraphics;

    impl GraphicsApi for UnsupportedGraphics {
        fn immediate_context(&self, _device: DeviceHandle) -> ShimResult<ContextHandle> {
            unsupported()
        }

        fn release_context(&self, _context: ContextHandle) {}

        fn create_texture(
            &self,
            _device: DeviceHandle,
            _desc: &TextureDesc,
        ) -> ShimResult<TextureHandle> {
            unsupported()
        }

        fn create_shader_view(
            &self,
            _device: DeviceHandle,
            _texture: TextureHandle,
            _format: DxgiFormat,
            _desc: &TextureDesc,
        ) -> ShimResult<ViewHandle> {
            unsupported()
        }

        fn texture_desc(&self, _texture: TextureHandle) -> ShimResult<TextureDesc> {
            unsupported()
        }

        fn copy_texture(&self, _context: ContextHandle, _dst: TextureHandle, _src: TextureHandle) {
            warn!("texture copy requested without a graphics backend");
        }

        fn release_texture(&self, _texture: TextureHandle) {}

        fn release_view(&self, _view: ViewHandle) {}
    }

}
