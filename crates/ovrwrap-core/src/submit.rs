//! Per-frame layer translation.
//!
//! Every submission starts from scratch: layers are decoded, referenced
//! chains are copied and committed, and the translated list is handed to
//! the runtime in the caller's order. Nothing survives the call.

use tracing::{debug, trace};

use crate::{
    layers::{LayerDescriptor, LayerFlags, RuntimeLayer},
    registry::{Registry, SwapChainHandle},
    swap_chain::SwapChainRecord,
    types::RuntimeChainHandle,
    ShimError, ShimResult,
};

/// Most layers the runtime composes in one frame.
pub const RUNTIME_MAX_LAYERS: usize = 16;

/// Translate the caller's layer list.
///
/// Absent entries are dropped and the rest truncated to
/// [`RUNTIME_MAX_LAYERS`] before anything is committed, so layers past the
/// limit never touch their chains. `sample_time` replaces the caller's eye
/// layer timestamps when a tracking query has been recorded.
pub fn translate_layers(
    chains: &mut Registry<SwapChainRecord>,
    layers: &[Option<LayerDescriptor>],
    sample_time: Option<f64>,
) -> ShimResult<Vec<RuntimeLayer>> {
    let present = layers.iter().flatten().count();
    if present > RUNTIME_MAX_LAYERS {
        debug!(
            present,
            limit = RUNTIME_MAX_LAYERS,
            "dropping layers past the runtime limit"
        );
    }

    let mut translated = Vec::with_capacity(present.min(RUNTIME_MAX_LAYERS));
    for layer in layers.iter().flatten().take(RUNTIME_MAX_LAYERS) {
        match layer {
            LayerDescriptor::EyeFov(eye) => {
                let left = eye.color[0].ok_or_else(|| {
                    ShimError::InvalidParameter("eye layer without a color texture".to_string())
                })?;
                let right = eye.color[1].unwrap_or(left);

                let left_chain = commit(chains, left)?;
                let right_chain = if right == left {
                    left_chain
                } else {
                    commit(chains, right)?
                };

                translated.push(RuntimeLayer::EyeFov {
                    flags: eye.flags,
                    color: [left_chain, right_chain],
                    viewport: eye.viewport,
                    fov: eye.fov,
                    render_pose: eye.render_pose,
                    sensor_sample_time: sample_time.unwrap_or(eye.sensor_sample_time),
                });
            }
            LayerDescriptor::Quad(quad) => {
                let handle = quad.color.ok_or_else(|| {
                    ShimError::InvalidParameter("quad layer without a color texture".to_string())
                })?;
                let mut flags = quad.flags;
                if quad.head_locked {
                    flags |= LayerFlags::HEAD_LOCKED;
                }

                translated.push(RuntimeLayer::Quad {
                    flags,
                    color: commit(chains, handle)?,
                    viewport: quad.viewport,
                    center_pose: quad.center_pose,
                    size: quad.size,
                });
            }
            LayerDescriptor::Disabled { flags } => {
                translated.push(RuntimeLayer::Disabled { flags: *flags });
            }
            LayerDescriptor::Unsupported { raw_type } => {
                trace!(raw_type, "skipping untranslatable layer");
            }
        }
    }

    Ok(translated)
}

fn commit(
    chains: &mut Registry<SwapChainRecord>,
    handle: SwapChainHandle,
) -> ShimResult<RuntimeChainHandle> {
    chains.lookup_mut(handle)?.commit_and_advance()
}
