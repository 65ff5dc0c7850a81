//! [`GraphicsApi`] for Direct3D 11.
//!
//! Handles are raw COM pointers. A handle the core owns carries exactly one
//! reference, given back in the matching `release_*` call; everything else
//! is borrowed for the duration of a call.

use std::ffi::c_void;

use ovrwrap_core::{
    BindUsage, ContextHandle, DeviceHandle, DxgiFormat, GraphicsApi, ShimError, ShimResult,
    TextureDesc, TextureHandle, ViewHandle,
};
use tracing::warn;
use windows::core::Interface;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::*;

unsafe fn borrowed<'a, T: Interface>(raw: &'a *mut c_void, what: &str) -> ShimResult<&'a T> {
    T::from_raw_borrowed(raw).ok_or_else(|| ShimError::InvalidParameter(format!("null {what}")))
}

pub fn to_d3d_desc(desc: &TextureDesc) -> D3D11_TEXTURE2D_DESC {
    D3D11_TEXTURE2D_DESC {
        Width: desc.width,
        Height: desc.height,
        MipLevels: desc.mip_levels,
        ArraySize: desc.array_size,
        Format: DXGI_FORMAT(desc.format.0 as i32),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: desc.sample_count,
            Quality: desc.sample_quality,
        },
        Usage: D3D11_USAGE(desc.usage as i32),
        BindFlags: desc.bind.bits(),
        CPUAccessFlags: desc.cpu_access,
        MiscFlags: desc.misc,
    }
}

pub fn from_d3d_desc(desc: &D3D11_TEXTURE2D_DESC) -> TextureDesc {
    TextureDesc {
        format: DxgiFormat(desc.Format.0 as u32),
        width: desc.Width,
        height: desc.Height,
        mip_levels: desc.MipLevels,
        array_size: desc.ArraySize,
        sample_count: desc.SampleDesc.Count,
        sample_quality: desc.SampleDesc.Quality,
        usage: desc.Usage.0 as u32,
        bind: BindUsage::from_bits_retain(desc.BindFlags),
        cpu_access: desc.CPUAccessFlags,
        misc: desc.MiscFlags,
    }
}

fn view_desc(format: DxgiFormat, desc: &TextureDesc) -> D3D11_SHADER_RESOURCE_VIEW_DESC {
    let format = DXGI_FORMAT(format.0 as i32);
    if desc.sample_count > 1 {
        D3D11_SHADER_RESOURCE_VIEW_DESC {
            Format: format,
            ViewDimension: D3D11_SRV_DIMENSION_TEXTURE2DMS,
            Anonymous: D3D11_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2DMS: D3D11_TEX2DMS_SRV::default(),
            },
        }
    } else {
        D3D11_SHADER_RESOURCE_VIEW_DESC {
            Format: format,
            ViewDimension: D3D11_SRV_DIMENSION_TEXTURE2D,
            Anonymous: D3D11_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2D: D3D11_TEX2D_SRV {
                    MostDetailedMip: 0,
                    // Zero means "every level" to the caller; D3D spells it -1.
                    MipLevels: if desc.mip_levels == 0 {
                        u32::MAX
                    } else {
                        desc.mip_levels
                    },
                },
            },
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct D3d11Graphics;

impl D3d11Graphics {
    pub fn new() -> Self {
        Self
    }
}

impl GraphicsApi for D3d11Graphics {
    fn immediate_context(&self, device: DeviceHandle) -> ShimResult<ContextHandle> {
        let raw = device.as_ptr::<c_void>();
        let device = unsafe { borrowed::<ID3D11Device>(&raw, "device") }?;
        let context = unsafe { device.GetImmediateContext() }
            .map_err(|e| ShimError::Service(format!("GetImmediateContext: {e:?}")))?;
        Ok(ContextHandle::from_ptr(context.into_raw()))
    }

    fn release_context(&self, context: ContextHandle) {
        if !context.is_null() {
            drop(unsafe { ID3D11DeviceContext::from_raw(context.as_ptr()) });
        }
    }

    fn create_texture(&self, device: DeviceHandle, desc: &TextureDesc) -> ShimResult<TextureHandle> {
        let raw = device.as_ptr::<c_void>();
        let device = unsafe { borrowed::<ID3D11Device>(&raw, "device") }?;
        let d3d_desc = to_d3d_desc(desc);

        let mut texture: Option<ID3D11Texture2D> = None;
        unsafe { device.CreateTexture2D(&d3d_desc, None, Some(&mut texture)) }
            .map_err(|e| ShimError::Service(format!("CreateTexture2D: {e:?}")))?;
        let texture =
            texture.ok_or_else(|| ShimError::Service("CreateTexture2D returned nothing".to_string()))?;
        Ok(TextureHandle::from_ptr(texture.into_raw()))
    }

    fn create_shader_view(
        &self,
        device: DeviceHandle,
        texture: TextureHandle,
        format: DxgiFormat,
        desc: &TextureDesc,
    ) -> ShimResult<ViewHandle> {
        let raw_device = device.as_ptr::<c_void>();
        let raw_texture = texture.as_ptr::<c_void>();
        let device = unsafe { borrowed::<ID3D11Device>(&raw_device, "device") }?;
        let texture = unsafe { borrowed::<ID3D11Texture2D>(&raw_texture, "texture") }?;
        let view_desc = view_desc(format, desc);

        let mut view: Option<ID3D11ShaderResourceView> = None;
        unsafe { device.CreateShaderResourceView(texture, Some(&view_desc), Some(&mut view)) }
            .map_err(|e| ShimError::Service(format!("CreateShaderResourceView ({format}): {e:?}")))?;
        let view = view.ok_or_else(|| {
            ShimError::Service("CreateShaderResourceView returned nothing".to_string())
        })?;
        Ok(ViewHandle::from_ptr(view.into_raw()))
    }

    fn texture_desc(&self, texture: TextureHandle) -> ShimResult<TextureDesc> {
        let raw = texture.as_ptr::<c_void>();
        let texture = unsafe { borrowed::<ID3D11Texture2D>(&raw, "texture") }?;
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { texture.GetDesc(&mut desc) };
        Ok(from_d3d_desc(&desc))
    }

    fn copy_texture(&self, context: ContextHandle, dst: TextureHandle, src: TextureHandle) {
        let raw_context = context.as_ptr::<c_void>();
        let raw_dst = dst.as_ptr::<c_void>();
        let raw_src = src.as_ptr::<c_void>();
        let borrowed_all = unsafe {
            (
                borrowed::<ID3D11DeviceContext>(&raw_context, "context"),
                borrowed::<ID3D11Texture2D>(&raw_dst, "destination"),
                borrowed::<ID3D11Texture2D>(&raw_src, "source"),
            )
        };
        match borrowed_all {
            (Ok(context), Ok(dst), Ok(src)) => unsafe { context.CopyResource(dst, src) },
            _ => warn!("skipping copy with a null resource"),
        }
    }

    fn release_texture(&self, texture: TextureHandle) {
        if !texture.is_null() {
            drop(unsafe { ID3D11Texture2D::from_raw(texture.as_ptr()) });
        }
    }

    fn release_view(&self, view: ViewHandle) {
        if !view.is_null() {
            drop(unsafe { ID3D11ShaderResourceView::from_raw(view.as_ptr()) });
        }
    }
}
