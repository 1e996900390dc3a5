mod common;

use common::{ScriptedBackend, SoftwareBackend};
use glam::{Mat4, Vec3};
use proptest::prelude::*;
use vantage_3d::{MeshRef, Phase, Program, Target, shapes};
use vantage_scene::{MAX_MODELS, Scene, SceneError, encode_pick_id};

const W: u32 = 512;
const H: u32 = 512;

fn top_down(scene: &mut Scene, height: f32) {
    scene.set_camera(Vec3::new(0.0, height, 0.0), Vec3::ZERO);
}

fn platform_and_bridge() -> Scene {
    let mut scene = Scene::new(W, H).unwrap();
    scene.attach_model(shapes::platform().unwrap()).unwrap();
    let bridge = shapes::box_model(20.0, 6.0, 0.2)
        .unwrap()
        .with_transform(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)));
    scene.attach_model(bridge).unwrap();
    top_down(&mut scene, 30.0);
    scene
}

#[test]
fn center_cursor_lands_on_ground_plane() {
    let mut scene = Scene::new(W, H).unwrap();
    scene.attach_model(shapes::platform().unwrap()).unwrap();
    top_down(&mut scene, 30.0);
    scene.set_pick_coordinates(0.0, 0.0);

    let mut backend = SoftwareBackend::new(W, H);
    scene.update(&mut backend).unwrap();

    assert_eq!(scene.picked(), Some(0));
    let [p] = scene.contact_points() else {
        panic!("expected one contact point, got {:?}", scene.contact_points());
    };
    assert!(p.y.abs() < 1e-4, "{p}");
    let half_extent = 30.0 * (22.5f32).to_radians().tan();
    assert!(p.x.abs() <= half_extent && p.z.abs() <= half_extent);
    assert_eq!(scene.model(0).unwrap().contact_point, Some(*p));
}

#[test]
fn nearest_surface_wins() {
    let mut scene = platform_and_bridge();
    scene.set_pick_coordinates(0.0, 0.0);
    let mut backend = SoftwareBackend::new(W, H);
    scene.update(&mut backend).unwrap();

    assert_eq!(scene.picked(), Some(1));
    assert_eq!(scene.models().iter().filter(|m| m.picked).count(), 1);
    assert!(!scene.model(0).unwrap().picked);
    let p = scene.contact_points()[0];
    assert!((p.y - 2.0).abs() < 1e-4, "{p}");
}

#[test]
fn cursor_off_the_bridge_picks_the_platform() {
    let mut scene = platform_and_bridge();
    let ndc = scene.camera().project(Vec3::new(0.0, 0.0, 8.0)).unwrap();
    scene.set_pick_coordinates(ndc.x, ndc.y);
    let mut backend = SoftwareBackend::new(W, H);
    scene.update(&mut backend).unwrap();

    assert_eq!(scene.picked(), Some(0));
    let p = scene.contact_points()[0];
    assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 8.0), 0.1), "{p}");
}

#[test]
fn background_pixel_picks_nothing() {
    let mut scene = platform_and_bridge();
    scene.set_pick_coordinates(0.99, 0.99);
    let mut backend = SoftwareBackend::new(W, H);
    scene.update(&mut backend).unwrap();

    assert_eq!(scene.picked(), None);
    assert!(scene.contact_points().is_empty());
    assert_eq!(backend.readbacks, 1);
}

#[test]
fn every_attached_model_resolves_to_its_own_index() {
    const SIZE: u32 = 1024;
    let mut scene = Scene::new(SIZE, SIZE).unwrap();
    let centers: Vec<Vec3> = (0..MAX_MODELS)
        .map(|i| {
            let (row, col) = ((i / 16) as f32, (i % 16) as f32);
            Vec3::new((col - 7.5) * 2.5, 0.0, (row - 7.5) * 2.5)
        })
        .collect();
    for &c in &centers {
        let tile = shapes::plane(2.0, 2.0, None)
            .unwrap()
            .with_transform(Mat4::from_translation(c));
        scene.attach_model(tile).unwrap();
    }
    top_down(&mut scene, 60.0);

    let mut backend = SoftwareBackend::new(SIZE, SIZE);
    for (index, &c) in centers.iter().enumerate() {
        let ndc = scene.camera().project(c).unwrap();
        scene.set_pick_coordinates(ndc.x, ndc.y);
        scene.update(&mut backend).unwrap();
        assert_eq!(scene.picked(), Some(index));
    }
}

#[test]
fn attaching_past_capacity_is_rejected() {
    let mut scene = Scene::new(W, H).unwrap();
    for _ in 0..MAX_MODELS {
        scene.attach_model(shapes::plane(1.0, 1.0, None).unwrap()).unwrap();
    }
    let err = scene
        .attach_model(shapes::plane(1.0, 1.0, None).unwrap())
        .unwrap_err();
    assert!(matches!(err, SceneError::TooManyModels { limit: 255 }));
    assert_eq!(scene.models().len(), MAX_MODELS);
}

#[test]
fn update_is_idempotent() {
    let mut scene = platform_and_bridge();
    scene.set_camera(Vec3::new(18.0, 14.0, 9.0), Vec3::ZERO);
    scene.set_pick_coordinates(0.1, -0.05);
    let mut backend = SoftwareBackend::new(W, H);

    scene.update(&mut backend).unwrap();
    let first = scene.contact_points().to_vec();
    let first_frame = scene.last_frame().clone();
    scene.update(&mut backend).unwrap();

    assert!(!first.is_empty());
    assert_eq!(scene.contact_points(), first.as_slice());
    assert_eq!(scene.last_frame(), &first_frame);
}

#[test]
fn passes_run_in_frame_order() {
    let mut scene = platform_and_bridge();
    scene.set_pick_coordinates(0.0, 0.0);
    let mut backend = SoftwareBackend::new(W, H);
    scene.update(&mut backend).unwrap();

    assert_eq!(backend.executed, vec![Phase::Pick, Phase::Color, Phase::Contact]);
    let phases: Vec<_> = scene.last_frame().passes().iter().map(|p| p.phase).collect();
    assert_eq!(phases, backend.executed);
}

#[test]
fn pick_pass_draws_only_surfaces_with_encoded_ids() {
    let mut scene = platform_and_bridge();
    let mut backend = SoftwareBackend::new(W, H);
    scene.update(&mut backend).unwrap();

    let pick = scene.last_frame().pass(Phase::Pick).unwrap();
    assert_eq!(pick.program, Program::Pick);
    assert_eq!(pick.target, Target::PickBuffer);
    assert_eq!(pick.clear, Some([0.0; 4]));
    assert_eq!(pick.draws.len(), 2);
    for (index, draw) in pick.draws.iter().enumerate() {
        let model = scene.model(index).unwrap();
        assert_eq!(draw.mesh, MeshRef::Model(index));
        assert_eq!(draw.prim, model.surface().prim);
        assert_eq!(draw.color(), encode_pick_id(index as u8));
    }
}

#[test]
fn color_pass_highlights_only_the_picked_surface() {
    let mut scene = platform_and_bridge();
    scene.set_pick_coordinates(0.0, 0.0);
    let mut backend = SoftwareBackend::new(W, H);
    scene.update(&mut backend).unwrap();

    let highlight = Vec3::from_array(scene.options().highlight).extend(1.0);
    let color = scene.last_frame().pass(Phase::Color).unwrap();
    assert_eq!(color.clear, Some(scene.options().background));
    let highlighted: Vec<_> = color
        .draws
        .iter()
        .filter(|d| d.color() == highlight)
        .map(|d| (d.mesh, d.prim))
        .collect();
    assert_eq!(highlighted, vec![(MeshRef::Model(1), 0)]);
}

#[test]
fn markers_sit_at_contact_points_without_rotation() {
    let mut scene = platform_and_bridge();
    scene.set_camera(Vec3::new(12.0, 20.0, -6.0), Vec3::ZERO);
    scene.set_pick_coordinates(0.05, 0.1);
    let mut backend = SoftwareBackend::new(W, H);
    scene.update(&mut backend).unwrap();

    let contacts = scene.last_frame().pass(Phase::Contact).unwrap();
    assert_eq!(contacts.program, Program::Contact);
    assert_eq!(contacts.clear, None);
    assert_eq!(contacts.draws.len(), scene.contact_points().len());
    assert!(!contacts.draws.is_empty());
    for (draw, point) in contacts.draws.iter().zip(scene.contact_points()) {
        assert_eq!(draw.mesh, MeshRef::Marker);
        assert_eq!(draw.local_matrix(), Mat4::from_translation(*point));
    }
}

#[test]
fn state_resets_when_cursor_leaves() {
    let mut scene = platform_and_bridge();
    let mut backend = SoftwareBackend::new(W, H);
    scene.set_pick_coordinates(0.0, 0.0);
    scene.update(&mut backend).unwrap();
    assert!(scene.picked().is_some());

    scene.set_pick_coordinates(1.5, 0.0);
    scene.update(&mut backend).unwrap();
    assert_eq!(scene.picked(), None);
    assert!(scene.models().iter().all(|m| m.contact_point.is_none()));
    assert!(scene.last_frame().pass(Phase::Contact).unwrap().draws.is_empty());
}

#[test]
fn parallel_ray_marks_pick_without_contact() {
    let mut scene = Scene::new(W, H).unwrap();
    scene.attach_model(shapes::platform().unwrap()).unwrap();
    // Eye level with the surface: every cursor ray through the centre is parallel to it.
    scene.set_camera(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO);
    scene.set_pick_coordinates(0.0, 0.0);

    let mut backend = ScriptedBackend::new([0, 0, 0, 255]);
    scene.update(&mut backend).unwrap();

    assert_eq!(scene.picked(), Some(0));
    assert!(scene.contact_points().is_empty());
    assert_eq!(scene.model(0).unwrap().contact_point, None);
    assert!(backend.passes[2].draws.is_empty());
}

#[test]
fn stale_pick_id_is_ignored() {
    let mut scene = platform_and_bridge();
    scene.set_pick_coordinates(0.0, 0.0);
    let mut backend = ScriptedBackend::new([9, 0, 0, 255]);
    scene.update(&mut backend).unwrap();
    assert_eq!(scene.picked(), None);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn out_of_range_cursor_yields_no_contacts(
        x in 1.001f32..50.0,
        y in -1.0f32..=1.0,
        negate in any::<bool>(),
        swap in any::<bool>(),
    ) {
        let x = if negate { -x } else { x };
        let (x, y) = if swap { (y, x) } else { (x, y) };
        let mut scene = platform_and_bridge();
        scene.set_pick_coordinates(x, y);
        let mut backend = SoftwareBackend::new(W, H);
        scene.update(&mut backend).unwrap();
        prop_assert!(scene.contact_points().is_empty());
        prop_assert_eq!(scene.picked(), None);
        prop_assert_eq!(backend.readbacks, 0);
    }
}
