//! `EndFrame`-style presentation for 0.4 and 0.5 callers.
//!
//! Those revisions never see a swap chain. The application renders into its
//! own textures and hands them over whole at the end of the frame; the
//! presenter keeps one runtime ring per eye, copies into it, and submits a
//! single eye layer built from the FOVs given at configuration time.

use ovrwrap_common::ChainLengthPolicy;
use tracing::debug;

use crate::{
    adapter::Backend,
    format::to_runtime_format,
    layers::{LayerFlags, RuntimeLayer},
    ring::RuntimeRing,
    status::ResultCode,
    texture::{RuntimeBindFlags, RuntimeChainDesc, RuntimeMiscFlags},
    types::{
        ContextHandle, DeviceHandle, FovPort, Posef, Recti, RuntimeChainHandle, Sizei,
        TextureHandle,
    },
    ShimError, ShimResult,
};

/// One eye's rendered image as an `EndFrame` caller describes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeTexture {
    pub texture: TextureHandle,
    pub size: Sizei,
    pub viewport: Recti,
}

#[derive(Debug, Clone, Copy)]
struct RenderConfig {
    device: DeviceHandle,
    context: ContextHandle,
    fov: [FovPort; 2],
}

#[derive(Debug)]
struct EyeRing {
    ring: RuntimeRing,
    size: Sizei,
}

/// Everything a single `EndFrame` needs from the session.
#[derive(Debug, Clone, Copy)]
pub struct PresentParams {
    pub frame_index: i64,
    pub sample_time: f64,
    pub promote_srgb: bool,
    pub policy: ChainLengthPolicy,
}

#[derive(Debug, Default)]
pub struct Presenter {
    config: Option<RenderConfig>,
    eyes: [Option<EyeRing>; 2],
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the device, its context and the FOVs to present with. Existing
    /// eye rings are dropped; the next frame recreates them.
    pub fn configure(&mut self, device: DeviceHandle, context: ContextHandle, fov: [FovPort; 2]) {
        self.eyes = [None, None];
        self.config = Some(RenderConfig {
            device,
            context,
            fov,
        });
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    pub fn eye_ring_len(&self, eye: usize) -> Option<usize> {
        self.eyes.get(eye)?.as_ref().map(|eye| eye.ring.len())
    }

    pub fn present(
        &mut self,
        backend: &Backend,
        params: PresentParams,
        render_pose: [Posef; 2],
        eye_textures: [EyeTexture; 2],
    ) -> ShimResult<ResultCode> {
        let config = self
            .config
            .ok_or_else(|| ShimError::InvalidParameter("rendering is not configured".to_string()))?;

        let mut chains = [RuntimeChainHandle::NULL; 2];
        for (eye, texture) in eye_textures.iter().enumerate() {
            let slot = &mut self.eyes[eye];
            let stale = match slot {
                Some(existing) => existing.size != texture.size,
                None => true,
            };
            if stale {
                // Drop the old ring before allocating its replacement.
                *slot = None;
                let ring = create_eye_ring(backend, config.device, texture, params)?;
                *slot = Some(EyeRing {
                    ring,
                    size: texture.size,
                });
            }

            if let Some(eye_ring) = slot.as_mut() {
                eye_ring.ring.commit_from(config.context, texture.texture)?;
                chains[eye] = eye_ring.ring.chain();
            }
        }

        let layer = RuntimeLayer::EyeFov {
            flags: LayerFlags::empty(),
            color: chains,
            viewport: [eye_textures[0].viewport, eye_textures[1].viewport],
            fov: config.fov,
            render_pose,
            sensor_sample_time: params.sample_time,
        };
        backend
            .runtime
            .submit_frame(backend.session, params.frame_index, None, &[layer])
    }

    /// Release both eye rings and forget the configuration.
    pub fn shutdown(&mut self) {
        self.eyes = [None, None];
        self.config = None;
    }
}

fn create_eye_ring(
    backend: &Backend,
    device: DeviceHandle,
    texture: &EyeTexture,
    params: PresentParams,
) -> ShimResult<RuntimeRing> {
    if texture.size.w <= 0 || texture.size.h <= 0 {
        return Err(ShimError::InvalidParameter(format!(
            "eye texture size {}x{}",
            texture.size.w, texture.size.h
        )));
    }

    let source = backend.graphics.texture_desc(texture.texture)?;
    let format = to_runtime_format(source.format, params.promote_srgb);
    if format.is_unknown() {
        return Err(ShimError::UnsupportedFormat(source.format.0));
    }

    let mut misc = RuntimeMiscFlags::empty();
    if format.is_srgb() {
        misc |= RuntimeMiscFlags::DX_TYPELESS;
    }
    let desc = RuntimeChainDesc {
        format,
        width: texture.size.w as u32,
        height: texture.size.h as u32,
        mip_levels: 1,
        array_size: 1,
        sample_count: 1,
        static_image: false,
        misc,
        bind: RuntimeBindFlags::empty(),
    };

    debug!(
        width = desc.width,
        height = desc.height,
        format = ?desc.format,
        "creating eye ring"
    );
    RuntimeRing::create(backend, device, &desc, params.policy)
}
