//! Toy house with doors and windows that swing open on click.

use std::f32::consts::FRAC_PI_2;

use anyhow::{Context, Result};
use glam::Vec3;
use log::{debug, info};

use crate::camera::{CameraPose, OrbitCamera, OrbitLimits};
use crate::color::Color;
use crate::config::HouseConfig;
use crate::geometry;
use crate::info::InfoPanel;
use crate::input::KeyCode;
use crate::material::{Material, Side};
use crate::random::SeededRandom;
use crate::scene::{AmbientLight, DirectionalLight, Lights, NodeKey, SceneGraph, Transform};
use crate::showcase::Showcase;
use crate::texture::{Canvas, TextureId};
use crate::tween::AngleTween;

const HALF_WIDTH: f32 = 4.0;
const HALF_DEPTH: f32 = 3.0;
const WALL_HEIGHT: f32 = 4.0;
const WALL_THICKNESS: f32 = 0.2;
const DOOR_WIDTH: f32 = 1.2;
const DOOR_HEIGHT: f32 = 2.2;
const WINDOW_SIZE: f32 = 1.4;
const WINDOW_SILL: f32 = 1.2;
const WINDOW_SWING: f32 = 75.0 * std::f32::consts::PI / 180.0;

/// A door or window: a hinge group rotating about Y with a panel child.
#[derive(Debug, Clone)]
pub struct Opening {
    pub name: &'static str,
    hinge: NodeKey,
    panel: NodeKey,
    open: bool,
    open_angle: f32,
    tween: AngleTween,
}

impl Opening {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_moving(&self) -> bool {
        !self.tween.is_finished()
    }

    /// Current hinge angle in radians.
    pub fn angle(&self) -> f32 {
        self.tween.current()
    }

    fn state(&self) -> &'static str {
        match (self.open, self.is_moving()) {
            (true, true) => "opening",
            (true, false) => "open",
            (false, true) => "closing",
            (false, false) => "closed",
        }
    }
}

pub struct ToyHouse {
    graph: SceneGraph,
    openings: Vec<Opening>,
    transition: f32,
    info: InfoPanel,
}

impl ToyHouse {
    pub fn new(config: &HouseConfig) -> Result<Self> {
        let mut graph = SceneGraph::new();
        let mut rng = SeededRandom::default();
        let bricks = graph.textures.insert("bricks", paint_bricks(&mut rng));

        add_ground(&mut graph).context("ground")?;
        add_walls(&mut graph, bricks).context("walls")?;
        add_roof(&mut graph, bricks).context("roof")?;
        let openings = add_openings(&mut graph).context("doors and windows")?;

        graph.lights = Lights {
            ambient: Some(AmbientLight {
                color: Color::WHITE,
                intensity: 0.6,
            }),
            directional: Some(DirectionalLight {
                color: Color::WHITE,
                intensity: 0.8,
                position: Vec3::new(10.0, 20.0, 10.0),
            }),
            point: None,
        };
        info!(
            "toy house ready: {} nodes, {} openings",
            graph.len(),
            openings.len()
        );
        Ok(Self {
            graph,
            openings,
            transition: config.transition_seconds.max(0.0),
            info: InfoPanel::default(),
        })
    }

    pub fn openings(&self) -> &[Opening] {
        &self.openings
    }

    pub fn opening(&self, name: &str) -> Option<&Opening> {
        self.openings
            .iter()
            .find(|opening| opening.name.eq_ignore_ascii_case(name))
    }

    /// Flips an opening's target state. A swing in progress reverses from
    /// its current angle.
    pub fn toggle(&mut self, index: usize) {
        let Some(opening) = self.openings.get_mut(index) else {
            return;
        };
        opening.open = !opening.open;
        let target = if opening.open { opening.open_angle } else { 0.0 };
        opening
            .tween
            .retarget(target, self.transition, opening.open_angle);
        let verb = if opening.open { "opening" } else { "closing" };
        debug!("{} {verb}", opening.name);
        self.info.show(opening.name, verb);
    }
}

impl Showcase for ToyHouse {
    fn name(&self) -> &'static str {
        "house"
    }

    fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    fn camera_home(&self) -> CameraPose {
        CameraPose {
            position: Vec3::new(12.0, 8.0, 14.0),
            target: Vec3::new(0.0, 1.5, 0.0),
        }
    }

    fn orbit_limits(&self) -> OrbitLimits {
        OrbitLimits {
            center: Vec3::new(0.0, 1.5, 0.0),
            min_distance: 8.0,
            max_distance: 40.0,
        }
    }

    fn clear_color(&self) -> Color {
        Color::hex(0x87CEEB)
    }

    fn update(&mut self, dt: f32, _camera: &mut OrbitCamera) {
        for opening in &mut self.openings {
            if opening.tween.is_finished() {
                continue;
            }
            let angle = opening.tween.advance(dt);
            if let Ok(hinge) = self.graph.node_mut(opening.hinge) {
                hinge.transform.rotation.y = angle;
            }
        }
    }

    fn click(&mut self, hit: Option<NodeKey>) {
        let index = hit.and_then(|key| self.openings.iter().position(|o| o.panel == key));
        match index {
            Some(index) => self.toggle(index),
            None => self.info.hide(),
        }
    }

    fn key(&mut self, key: KeyCode, camera: &mut OrbitCamera) -> bool {
        match key {
            KeyCode::Digit(digit @ 1..=4) => self.toggle(usize::from(digit - 1)),
            KeyCode::Character('R') => camera.reset(),
            _ => return false,
        }
        true
    }

    fn info(&self) -> &InfoPanel {
        &self.info
    }

    fn status_line(&self) -> String {
        let open = self.openings.iter().filter(|o| o.is_open()).count();
        format!("{open}/{} open", self.openings.len())
    }

    fn summary(&self) -> Vec<String> {
        self.openings
            .iter()
            .map(|opening| {
                format!(
                    "{}: {} angle={:.1}",
                    opening.name,
                    opening.state(),
                    opening.angle().to_degrees()
                )
            })
            .collect()
    }
}

/// Running bond brickwork with slightly varied brick shades.
fn paint_bricks(rng: &mut SeededRandom) -> Canvas {
    const SIZE: f32 = 128.0;
    const BRICK_W: f32 = 32.0;
    const BRICK_H: f32 = 16.0;
    const MORTAR: f32 = 2.0;
    let mut canvas = Canvas::new(SIZE as u32, SIZE as u32);
    canvas.fill(Color::hex(0xC8BEB0));
    let light = Color::hex(0xB5533C);
    let dark = Color::hex(0x8E3B2A);
    let rows = (SIZE / BRICK_H) as u32;
    for row in 0..rows {
        let y = row as f32 * BRICK_H;
        let offset = if row % 2 == 0 { 0.0 } else { -BRICK_W / 2.0 };
        let mut x = offset;
        while x < SIZE {
            let shade = light.lerp(dark, rng.next_f32());
            canvas.fill_rect(x + MORTAR / 2.0, y + MORTAR / 2.0, BRICK_W - MORTAR, BRICK_H - MORTAR, shade);
            x += BRICK_W;
        }
    }
    canvas
}

fn add_ground(graph: &mut SceneGraph) -> Result<()> {
    let mesh = graph.meshes.insert(geometry::plane(40.0, 40.0));
    graph.add_mesh(
        None,
        "ground",
        Transform::default().with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
        mesh,
        Material::lambert(Color::hex(0x7CB342)),
    )?;
    Ok(())
}

/// Adds one wall block spanning `min..max`.
fn add_block(
    graph: &mut SceneGraph,
    name: &str,
    min: Vec3,
    max: Vec3,
    material: &Material,
) -> Result<NodeKey> {
    let size = max - min;
    let mesh = graph.meshes.insert(geometry::cuboid(size.x, size.y, size.z));
    Ok(graph.add_mesh(
        None,
        name,
        Transform::at((min + max) / 2.0),
        mesh,
        material.clone(),
    )?)
}

fn add_walls(graph: &mut SceneGraph, bricks: TextureId) -> Result<()> {
    let brick = Material::lambert(Color::WHITE).with_texture(bricks);
    let t = WALL_THICKNESS / 2.0;
    let door = DOOR_WIDTH / 2.0;

    for (label, z) in [("front", HALF_DEPTH), ("back", -HALF_DEPTH)] {
        add_block(
            graph,
            &format!("{label} wall left"),
            Vec3::new(-HALF_WIDTH, 0.0, z - t),
            Vec3::new(-door, WALL_HEIGHT, z + t),
            &brick,
        )?;
        add_block(
            graph,
            &format!("{label} wall right"),
            Vec3::new(door, 0.0, z - t),
            Vec3::new(HALF_WIDTH, WALL_HEIGHT, z + t),
            &brick,
        )?;
        add_block(
            graph,
            &format!("{label} wall lintel"),
            Vec3::new(-door, DOOR_HEIGHT, z - t),
            Vec3::new(door, WALL_HEIGHT, z + t),
            &brick,
        )?;
    }

    let pane = WINDOW_SIZE / 2.0;
    let top = WINDOW_SILL + WINDOW_SIZE;
    for (label, x) in [("left", -HALF_WIDTH), ("right", HALF_WIDTH)] {
        add_block(
            graph,
            &format!("{label} wall back"),
            Vec3::new(x - t, 0.0, -HALF_DEPTH),
            Vec3::new(x + t, WALL_HEIGHT, -pane),
            &brick,
        )?;
        add_block(
            graph,
            &format!("{label} wall front"),
            Vec3::new(x - t, 0.0, pane),
            Vec3::new(x + t, WALL_HEIGHT, HALF_DEPTH),
            &brick,
        )?;
        add_block(
            graph,
            &format!("{label} wall sill"),
            Vec3::new(x - t, 0.0, -pane),
            Vec3::new(x + t, WINDOW_SILL, pane),
            &brick,
        )?;
        add_block(
            graph,
            &format!("{label} wall header"),
            Vec3::new(x - t, top, -pane),
            Vec3::new(x + t, WALL_HEIGHT, pane),
            &brick,
        )?;
    }
    Ok(())
}

fn add_roof(graph: &mut SceneGraph, bricks: TextureId) -> Result<()> {
    let roof = graph.meshes.insert(geometry::gable(
        2.0 * HALF_WIDTH + 0.8,
        2.5,
        2.0 * HALF_DEPTH + 0.8,
    ));
    graph.add_mesh(
        None,
        "roof",
        Transform::at(Vec3::new(0.0, WALL_HEIGHT, 0.0)),
        roof,
        Material::lambert(Color::hex(0x8B2500)).with_side(Side::Double),
    )?;
    let chimney = graph.meshes.insert(geometry::cuboid(0.6, 1.6, 0.6));
    graph.add_mesh(
        None,
        "chimney",
        Transform::at(Vec3::new(2.0, WALL_HEIGHT + 1.3, -1.0)),
        chimney,
        Material::lambert(Color::hex(0xD0A090)).with_texture(bricks),
    )?;
    Ok(())
}

struct OpeningSpec {
    name: &'static str,
    hinge: Vec3,
    panel_offset: Vec3,
    panel_size: Vec3,
    open_angle: f32,
    color: Color,
    opacity: f32,
    description: &'static str,
}

fn add_openings(graph: &mut SceneGraph) -> Result<Vec<Opening>> {
    let door = DOOR_WIDTH / 2.0;
    let pane = WINDOW_SIZE / 2.0;
    let door_size = Vec3::new(DOOR_WIDTH, DOOR_HEIGHT, 0.08);
    let window_size = Vec3::new(0.06, WINDOW_SIZE, WINDOW_SIZE);
    let wood = Color::hex(0x8B4513);
    let glass = Color::hex(0xADD8E6);
    let specs = [
        OpeningSpec {
            name: "Front door",
            hinge: Vec3::new(-door, 0.0, HALF_DEPTH),
            panel_offset: Vec3::new(door, DOOR_HEIGHT / 2.0, 0.0),
            panel_size: door_size,
            open_angle: -FRAC_PI_2,
            color: wood,
            opacity: 1.0,
            description: "A wooden door. Click to open or close it",
        },
        OpeningSpec {
            name: "Back door",
            hinge: Vec3::new(door, 0.0, -HALF_DEPTH),
            panel_offset: Vec3::new(-door, DOOR_HEIGHT / 2.0, 0.0),
            panel_size: door_size,
            open_angle: -FRAC_PI_2,
            color: wood,
            opacity: 1.0,
            description: "A wooden door. Click to open or close it",
        },
        OpeningSpec {
            name: "Left window",
            hinge: Vec3::new(-HALF_WIDTH, WINDOW_SILL, pane),
            panel_offset: Vec3::new(0.0, pane, -pane),
            panel_size: window_size,
            open_angle: WINDOW_SWING,
            color: glass,
            opacity: 0.6,
            description: "A casement window. Click to open or close it",
        },
        OpeningSpec {
            name: "Right window",
            hinge: Vec3::new(HALF_WIDTH, WINDOW_SILL, pane),
            panel_offset: Vec3::new(0.0, pane, -pane),
            panel_size: window_size,
            open_angle: -WINDOW_SWING,
            color: glass,
            opacity: 0.6,
            description: "A casement window. Click to open or close it",
        },
    ];

    let mut openings = Vec::with_capacity(specs.len());
    for spec in specs {
        let hinge = graph.add_group(None, format!("{} hinge", spec.name), Transform::at(spec.hinge))?;
        let size = spec.panel_size;
        let mesh = graph.meshes.insert(geometry::cuboid(size.x, size.y, size.z));
        let panel = graph.add_mesh(
            Some(hinge),
            spec.name,
            Transform::at(spec.panel_offset),
            mesh,
            Material::lambert(spec.color)
                .with_opacity(spec.opacity)
                .with_side(Side::Double),
        )?;
        graph.set_pick(panel, spec.name, spec.description)?;
        openings.push(Opening {
            name: spec.name,
            hinge,
            panel,
            open: false,
            open_angle: spec.open_angle,
            tween: AngleTween::settled(0.0),
        });
    }
    Ok(openings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::picking::{cast, Ray};

    const STEP: f32 = 1.0 / 60.0;

    fn house() -> (ToyHouse, OrbitCamera) {
        let house = ToyHouse::new(&HouseConfig::default()).unwrap();
        let camera = house.camera(&CameraConfig::default());
        (house, camera)
    }

    fn run(house: &mut ToyHouse, camera: &mut OrbitCamera, frames: usize) {
        for _ in 0..frames {
            house.update(STEP, camera);
        }
    }

    fn degrees(house: &ToyHouse, name: &str) -> f32 {
        house.opening(name).unwrap().angle().to_degrees()
    }

    #[test]
    fn starts_with_everything_closed() {
        let (house, _) = house();
        assert_eq!(house.graph().pickables().len(), 4);
        assert_eq!(
            house.summary(),
            vec![
                "Front door: closed angle=0.0",
                "Back door: closed angle=0.0",
                "Left window: closed angle=0.0",
                "Right window: closed angle=0.0",
            ]
        );
    }

    #[test]
    fn clicking_a_door_swings_it_open() {
        let (mut house, mut camera) = house();
        assert!(house.click_named("Front door"));
        assert_eq!(house.info().body(), "opening");
        run(&mut house, &mut camera, 30);
        assert!((degrees(&house, "Front door") + 45.0).abs() < 1.0);
        run(&mut house, &mut camera, 40);
        assert!((degrees(&house, "Front door") + 90.0).abs() < 1e-3);
        assert_eq!(house.summary()[0], "Front door: open angle=-90.0");
    }

    #[test]
    fn reversing_mid_swing_returns_from_current_angle() {
        let (mut house, mut camera) = house();
        house.toggle(0);
        run(&mut house, &mut camera, 30);
        house.toggle(0);
        assert_eq!(house.info().body(), "closing");
        let start = degrees(&house, "Front door");
        assert!((start + 45.0).abs() < 1.0);
        run(&mut house, &mut camera, 15);
        assert!(degrees(&house, "Front door") > start);
        run(&mut house, &mut camera, 20);
        assert_eq!(degrees(&house, "Front door"), 0.0);
        assert!(!house.opening("Front door").unwrap().is_open());
    }

    #[test]
    fn digit_keys_toggle_in_order() {
        let (mut house, mut camera) = house();
        for digit in 1..=4 {
            assert!(house.key(KeyCode::Digit(digit), &mut camera));
        }
        assert!(!house.key(KeyCode::Digit(5), &mut camera));
        run(&mut house, &mut camera, 90);
        assert!((degrees(&house, "Back door") + 90.0).abs() < 1e-3);
        assert!((degrees(&house, "Left window") - 75.0).abs() < 1e-3);
        assert!((degrees(&house, "Right window") + 75.0).abs() < 1e-3);
        assert_eq!(house.status_line(), "4/4 open");
    }

    #[test]
    fn everything_swings_outward() {
        let (mut house, mut camera) = house();
        for index in 0..4 {
            house.toggle(index);
        }
        run(&mut house, &mut camera, 90);
        let center = |name: &str| {
            let key = house.graph().find_pickable(name).unwrap();
            house.graph().world_position(key).unwrap()
        };
        assert!(center("Front door").z > HALF_DEPTH + 0.5);
        assert!(center("Back door").z < -HALF_DEPTH - 0.5);
        assert!(center("Left window").x < -HALF_WIDTH - 0.5);
        assert!(center("Right window").x > HALF_WIDTH + 0.5);
    }

    #[test]
    fn front_door_is_hit_before_back_door() {
        let (house, _) = house();
        let ray = Ray::new(Vec3::new(0.0, 1.1, 20.0), Vec3::NEG_Z);
        let hit = cast(house.graph(), &ray).unwrap();
        assert_eq!(house.graph().pick_info(hit.key).unwrap().name, "Front door");
    }

    #[test]
    fn walls_hide_openings_behind_them() {
        let (house, _) = house();
        let eye = Vec3::new(12.0, 8.0, 14.0);
        let ray = Ray::new(eye, Vec3::new(0.0, 1.1, -3.0) - eye);
        assert_eq!(cast(house.graph(), &ray), None);
    }

    #[test]
    fn open_doorway_reveals_back_door() {
        let (mut house, mut camera) = house();
        let ray = Ray::new(Vec3::new(0.0, 1.1, 20.0), Vec3::NEG_Z);
        house.toggle(0);
        run(&mut house, &mut camera, 90);
        let hit = cast(house.graph(), &ray).unwrap();
        assert_eq!(house.graph().pick_info(hit.key).unwrap().name, "Back door");
    }

    #[test]
    fn clicking_empty_space_hides_panel() {
        let (mut house, _) = house();
        house.toggle(2);
        house.click(None);
        assert!(!house.info().is_visible());
    }
}
