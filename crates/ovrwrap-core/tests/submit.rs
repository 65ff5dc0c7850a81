//! Frame submission: filtering, truncation, commit counting and flag
//! translation.

mod support;

use ovrwrap_core::{
    ApiRevision, BindUsage, DxgiFormat, EyeFovLayer, LayerDescriptor, LayerFlags, Posef,
    QuadLayer, Recti, ResultCode, RuntimeLayer, RuntimeLayerType, ShimError, ShimSession, Sizei,
    SwapChainHandle, TextureDesc, Vector2f, Vector2i, Vector3f, ViewScaleDesc,
};
use support::{symmetric_fov, Harness, DEVICE};

fn chain(session: &mut ShimSession) -> SwapChainHandle {
    let desc = TextureDesc::new(DxgiFormat::R8G8B8A8_UNORM_SRGB, 512, 512)
        .with_bind(BindUsage::SHADER_RESOURCE | BindUsage::RENDER_TARGET);
    session.create_swap_chain(DEVICE, &desc, false).unwrap()
}

fn viewport(x: i32) -> Recti {
    Recti {
        pos: Vector2i { x, y: 0 },
        size: Sizei { w: 256, h: 512 },
    }
}

fn eye_layer(left: SwapChainHandle, right: Option<SwapChainHandle>) -> LayerDescriptor {
    LayerDescriptor::EyeFov(EyeFovLayer {
        flags: LayerFlags::HIGH_QUALITY,
        color: [Some(left), right],
        viewport: [viewport(0), viewport(256)],
        fov: [symmetric_fov(1.0), symmetric_fov(1.2)],
        render_pose: [Posef::default(); 2],
        sensor_sample_time: 12.5,
    })
}

fn quad_layer(handle: SwapChainHandle, flags: LayerFlags, head_locked: bool) -> LayerDescriptor {
    LayerDescriptor::Quad(QuadLayer {
        flags,
        color: Some(handle),
        viewport: viewport(0),
        center_pose: Posef {
            position: Vector3f {
                x: 0.0,
                y: 0.0,
                z: -1.0,
            },
            ..Posef::default()
        },
        size: Vector2f { x: 0.5, y: 0.25 },
        head_locked,
    })
}

#[test]
fn test_shared_eye_chain_commits_once() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_7);
    let handle = chain(&mut session);

    session
        .submit_frame(1, None, &[Some(eye_layer(handle, Some(handle)))])
        .unwrap();

    assert_eq!(harness.runtime.total_commits(), 1);
    assert_eq!(harness.graphics.state().copies.len(), 1);
    let submit = harness.runtime.last_submit();
    let runtime_chain = session.swap_chain(handle).unwrap().runtime_chain();
    match submit.layers.as_slice() {
        [RuntimeLayer::EyeFov { color, .. }] => assert_eq!(*color, [runtime_chain; 2]),
        other => panic!("unexpected layers {other:?}"),
    }
}

#[test]
fn test_missing_right_eye_reuses_left() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_7);
    let handle = chain(&mut session);

    session
        .submit_frame(1, None, &[Some(eye_layer(handle, None))])
        .unwrap();
    assert_eq!(harness.runtime.total_commits(), 1);
}

#[test]
fn test_distinct_eye_chains_commit_each() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_7);
    let left = chain(&mut session);
    let right = chain(&mut session);

    session
        .submit_frame(3, None, &[Some(eye_layer(left, Some(right)))])
        .unwrap();

    assert_eq!(harness.runtime.total_commits(), 2);
    let submit = harness.runtime.last_submit();
    assert_eq!(submit.frame_index, 3);
    let expected = [
        session.swap_chain(left).unwrap().runtime_chain(),
        session.swap_chain(right).unwrap().runtime_chain(),
    ];
    match &submit.layers[0] {
        RuntimeLayer::EyeFov {
            color,
            fov,
            viewport: ports,
            flags,
            ..
        } => {
            assert_eq!(*color, expected);
            assert_eq!(*fov, [symmetric_fov(1.0), symmetric_fov(1.2)]);
            assert_eq!(*ports, [viewport(0), viewport(256)]);
            assert_eq!(*flags, LayerFlags::HIGH_QUALITY);
        }
        other => panic!("unexpected layer {other:?}"),
    }
}

#[test]
fn test_more_than_sixteen_layers_truncated() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_6);
    let handles: Vec<_> = (0..20).map(|_| chain(&mut session)).collect();

    let layers: Vec<_> = handles
        .iter()
        .map(|&handle| Some(quad_layer(handle, LayerFlags::empty(), false)))
        .collect();
    session.submit_frame(1, None, &layers).unwrap();

    let submit = harness.runtime.last_submit();
    assert_eq!(submit.layers.len(), 16);
    for (layer, handle) in submit.layers.iter().zip(&handles) {
        let expected = session.swap_chain(*handle).unwrap().runtime_chain();
        assert_eq!(layer.chains(), vec![expected]);
    }
    // Layers past the limit were never committed.
    for handle in &handles[16..] {
        let runtime_chain = session.swap_chain(*handle).unwrap().runtime_chain();
        assert_eq!(harness.runtime.commits(runtime_chain), 0);
    }
    assert_eq!(harness.runtime.total_commits(), 16);
}

#[test]
fn test_null_entries_do_not_count_toward_limit() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_6);
    let handle = chain(&mut session);

    let mut layers = vec![None; 30];
    layers.push(Some(quad_layer(handle, LayerFlags::empty(), false)));
    session.submit_frame(1, None, &layers).unwrap();

    assert_eq!(harness.runtime.last_submit().layers.len(), 1);
}

#[test]
fn test_disabled_layer_has_no_resources() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_7);

    session
        .submit_frame(
            1,
            None,
            &[Some(LayerDescriptor::Disabled {
                flags: LayerFlags::empty(),
            })],
        )
        .unwrap();

    let submit = harness.runtime.last_submit();
    assert_eq!(submit.layers.len(), 1);
    assert_eq!(submit.layers[0].layer_type(), RuntimeLayerType::Disabled);
    assert!(submit.layers[0].chains().is_empty());
    assert_eq!(harness.runtime.total_commits(), 0);
    assert!(harness.graphics.state().copies.is_empty());
}

#[test]
fn test_head_locked_quad_sets_flag() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_6);
    let handle = chain(&mut session);

    session
        .submit_frame(
            1,
            None,
            &[
                Some(quad_layer(handle, LayerFlags::empty(), true)),
                Some(quad_layer(handle, LayerFlags::HEAD_LOCKED, false)),
                Some(quad_layer(handle, LayerFlags::empty(), false)),
            ],
        )
        .unwrap();

    let submit = harness.runtime.last_submit();
    assert_eq!(submit.layers.len(), 3);
    for layer in &submit.layers {
        assert_eq!(layer.layer_type(), RuntimeLayerType::Quad);
    }
    assert!(submit.layers[0].flags().contains(LayerFlags::HEAD_LOCKED));
    assert!(submit.layers[1].flags().contains(LayerFlags::HEAD_LOCKED));
    assert!(!submit.layers[2].flags().contains(LayerFlags::HEAD_LOCKED));
    match &submit.layers[0] {
        RuntimeLayer::Quad { size, viewport: port, .. } => {
            assert_eq!(*size, Vector2f { x: 0.5, y: 0.25 });
            assert_eq!(*port, viewport(0));
        }
        other => panic!("unexpected layer {other:?}"),
    }
}

#[test]
fn test_unsupported_layers_skipped_in_order() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_8);
    let back = chain(&mut session);
    let front = chain(&mut session);

    session
        .submit_frame(
            1,
            None,
            &[
                Some(eye_layer(back, None)),
                Some(LayerDescriptor::Unsupported { raw_type: 2 }),
                None,
                Some(quad_layer(front, LayerFlags::empty(), false)),
            ],
        )
        .unwrap();

    let submit = harness.runtime.last_submit();
    let types: Vec<_> = submit.layers.iter().map(|layer| layer.layer_type()).collect();
    assert_eq!(types, vec![RuntimeLayerType::EyeFov, RuntimeLayerType::Quad]);
}

#[test]
fn test_sample_time_comes_from_tracking_query() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_7);
    let handle = chain(&mut session);

    session
        .submit_frame(1, None, &[Some(eye_layer(handle, None))])
        .unwrap();
    match harness.runtime.last_submit().layers[0] {
        RuntimeLayer::EyeFov {
            sensor_sample_time, ..
        } => assert_eq!(sensor_sample_time, 12.5),
        ref other => panic!("unexpected layer {other:?}"),
    }

    session.record_tracking_sample(99.25);
    session
        .submit_frame(2, None, &[Some(eye_layer(handle, None))])
        .unwrap();
    match harness.runtime.last_submit().layers[0] {
        RuntimeLayer::EyeFov {
            sensor_sample_time, ..
        } => assert_eq!(sensor_sample_time, 99.25),
        ref other => panic!("unexpected layer {other:?}"),
    }
}

#[test]
fn test_view_scale_passed_verbatim() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_7);
    let scale = ViewScaleDesc {
        hmd_to_eye_offset: [
            Vector3f {
                x: -0.03,
                y: 0.0,
                z: 0.0,
            },
            Vector3f {
                x: 0.03,
                y: 0.0,
                z: 0.0,
            },
        ],
        hmd_space_to_world_scale_in_meters: 2.0,
    };

    session.submit_frame(7, Some(&scale), &[]).unwrap();
    assert_eq!(harness.runtime.last_submit().view_scale, Some(scale));

    session.submit_frame(8, None, &[]).unwrap();
    assert_eq!(harness.runtime.last_submit().view_scale, None);
    assert_eq!(session.frame_index(), 8);
}

#[test]
fn test_not_visible_is_reported_as_success() {
    let harness = Harness::new();
    harness.runtime.state().submit_result = ResultCode::SUCCESS_NOT_VISIBLE;
    let mut session = harness.session(ApiRevision::V0_7);

    let result = session.submit_frame(1, None, &[]).unwrap();
    assert_eq!(result, ResultCode::SUCCESS_NOT_VISIBLE);
}

#[test]
fn test_display_lost_propagates() {
    let harness = Harness::new();
    harness.runtime.state().submit_result = ResultCode::DISPLAY_LOST;
    let mut session = harness.session(ApiRevision::V0_7);

    let err = session.submit_frame(1, None, &[]).unwrap_err();
    assert_eq!(err.result_code(), ResultCode::DISPLAY_LOST);
}

#[test]
fn test_unknown_chain_is_invalid_handle() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_7);

    let err = session
        .submit_frame(1, None, &[Some(eye_layer(SwapChainHandle(77), None))])
        .unwrap_err();
    assert!(matches!(err, ShimError::InvalidHandle));
    assert!(harness.runtime.state().submits.is_empty());
}

#[test]
fn test_eye_layer_without_texture_rejected() {
    let harness = Harness::new();
    let mut session = harness.session(ApiRevision::V0_7);
    let layer = LayerDescriptor::EyeFov(EyeFovLayer {
        flags: LayerFlags::empty(),
        color: [None, None],
        viewport: [Recti::default(); 2],
        fov: [symmetric_fov(1.0); 2],
        render_pose: [Posef::default(); 2],
        sensor_sample_time: 0.0,
    });

    assert!(matches!(
        session.submit_frame(1, None, &[Some(layer)]),
        Err(ShimError::InvalidParameter(_))
    ));
}
