//! Animated solar system: the sun, eight planets with their notable moons,
//! comets, an asteroid belt and a starfield, all clickable bodies counting
//! clicks until they explode.

mod bodies;
mod textures;

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI};

use anyhow::{Context, Result};
use glam::Vec3;
use log::{debug, error, info, warn};

use crate::camera::{CameraPose, OrbitCamera, OrbitLimits};
use crate::color::Color;
use crate::config::SolarConfig;
use crate::geometry::{self, MeshId, PointSprite};
use crate::info::InfoPanel;
use crate::input::KeyCode;
use crate::material::{Blend, Effect, Material, Side};
use crate::random::SeededRandom;
use crate::scene::{
    AmbientLight, DirectionalLight, Lights, NodeKey, PointLight, SceneGraph, Transform,
};
use crate::showcase::{frame_factor, Showcase};
use crate::texture::TextureId;

pub use bodies::{MoonLook, MoonSpec, PlanetSpec, Surface, MOONS, PLANETS};

const CLICKS_TO_EXPLODE: u32 = 3;
const EXPLOSION_SECONDS: f32 = 3.0;
const EXPLOSION_PARTICLES: usize = 50;
const EXPLOSION_SPREAD: f32 = 0.15;
const FRICTION: f32 = 0.98;
const TRAIL_LENGTH: usize = 20;
const TRAIL_MIN_SPEED: f32 = 1.5;
const COMET_COUNT: usize = 3;
const COMET_TAIL: usize = 50;
const FOLLOW_TARGET: &str = "Earth";

struct Planet {
    orbit: NodeKey,
    mesh: NodeKey,
    angle: f32,
    speed: f32,
    trail: MeshId,
    atmosphere: Option<NodeKey>,
    aurora: Option<NodeKey>,
}

struct Moon {
    orbit: NodeKey,
    mesh: NodeKey,
    speed: f32,
}

struct Comet {
    group: NodeKey,
    tail: Vec<NodeKey>,
}

struct Explosion {
    group: NodeKey,
    target: NodeKey,
    remaining: f32,
    particles: Vec<(NodeKey, Vec3)>,
}

pub struct SolarSystem {
    graph: SceneGraph,
    rng: SeededRandom,
    speed: f32,
    max_speed: f32,
    speed_step: f32,
    clock: f32,
    sun: NodeKey,
    corona: NodeKey,
    stars: NodeKey,
    nebula: NodeKey,
    asteroids: NodeKey,
    sun_particles: NodeKey,
    planets: Vec<Planet>,
    moons: Vec<Moon>,
    comets: Vec<Comet>,
    explosions: Vec<Explosion>,
    debris: MeshId,
    clicks: HashMap<NodeKey, u32>,
    info: InfoPanel,
    follow: Option<NodeKey>,
}

impl SolarSystem {
    pub fn new(config: &SolarConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => SeededRandom::new(seed),
            None => SeededRandom::from_clock(),
        };
        info!("building solar system (rng state {})", rng.state());
        let mut graph = SceneGraph::new();

        let stars = add_stars(&mut graph, &mut rng, config.star_count).context("starfield")?;
        let nebula =
            add_nebula(&mut graph, &mut rng, config.nebula_texture_size).context("nebula")?;
        let (sun, corona) = add_sun(&mut graph, &mut rng).context("sun")?;
        let (planets, moons) = add_planets(&mut graph, &mut rng).context("planets")?;
        let comets = add_comets(&mut graph, &mut rng).context("comets")?;
        let asteroids =
            add_asteroids(&mut graph, &mut rng, config.asteroid_count).context("asteroid belt")?;
        let sun_particles = add_sun_particles(&mut graph, &mut rng, config.sun_particle_count)
            .context("sun particles")?;
        let debris = graph.meshes.insert(geometry::sphere(0.05, 4, 4));

        info!(
            "solar system ready: {} nodes, {} meshes, {} textures",
            graph.len(),
            graph.meshes.len(),
            graph.textures.len()
        );

        let mut system = Self {
            graph,
            rng,
            speed: 1.0,
            max_speed: config.max_speed.max(0.0),
            speed_step: config.speed_step,
            clock: 0.0,
            sun,
            corona,
            stars,
            nebula,
            asteroids,
            sun_particles,
            planets,
            moons,
            comets,
            explosions: Vec::new(),
            debris,
            clicks: HashMap::new(),
            info: InfoPanel::default(),
            follow: None,
        };
        system.set_speed(config.initial_speed);
        Ok(system)
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Sets the simulation multiplier, clamped to `[0, max_speed]`.
    /// Non-finite values are ignored.
    pub fn set_speed(&mut self, speed: f32) {
        if !speed.is_finite() {
            warn!("ignoring simulation speed {speed}");
            return;
        }
        let speed = (speed * 1000.0).round() / 1000.0;
        self.speed = speed.clamp(0.0, self.max_speed);
    }

    pub fn clicks(&self, name: &str) -> u32 {
        self.graph
            .find_pickable(name)
            .and_then(|key| self.clicks.get(&key).copied())
            .unwrap_or(0)
    }

    pub fn active_explosions(&self) -> usize {
        self.explosions.len()
    }

    fn with_transform(&mut self, key: NodeKey, apply: impl FnOnce(&mut Transform)) {
        if let Ok(node) = self.graph.node_mut(key) {
            apply(&mut node.transform);
        }
    }

    fn advance_effect(&mut self, key: NodeKey, delta: f32) {
        if let Some(material) = self
            .graph
            .node_mut(key)
            .ok()
            .and_then(|node| node.material_mut())
        {
            material.time += delta;
        }
    }

    fn update_trail(&mut self, index: usize) {
        let planet = &self.planets[index];
        let trail = planet.trail;
        let Ok(head) = self.graph.world_position(planet.mesh) else {
            return;
        };
        if let Some(mesh) = self.graph.meshes.get_mut(trail) {
            mesh.shift_points();
            mesh.set_point_position(0, head);
            mesh.set_point_size(0, 1.0);
        }
    }

    fn explode(&mut self, target: NodeKey, name: &str) -> Result<()> {
        let origin = self.graph.world_position(target)?;
        let group = self
            .graph
            .add_group(None, format!("{name} explosion"), Transform::default())?;
        let mut particles = Vec::with_capacity(EXPLOSION_PARTICLES);
        for i in 0..EXPLOSION_PARTICLES {
            let color = if self.rng.chance(0.5) {
                Color::hex(0xFF4500)
            } else {
                Color::hex(0xFFD700)
            };
            let velocity = Vec3::new(
                self.rng.spread(EXPLOSION_SPREAD),
                self.rng.spread(EXPLOSION_SPREAD),
                self.rng.spread(EXPLOSION_SPREAD),
            );
            let particle = self.graph.add_mesh(
                Some(group),
                format!("debris {i}"),
                Transform::at(origin),
                self.debris,
                Material::basic(color),
            )?;
            particles.push((particle, velocity));
        }
        self.graph.node_mut(target)?.visible = false;
        self.explosions.push(Explosion {
            group,
            target,
            remaining: EXPLOSION_SECONDS,
            particles,
        });
        info!("{name} exploded");
        self.info.show(
            "EXPLOSION!",
            format!("{name} has exploded! It will reappear in 3 seconds..."),
        );
        Ok(())
    }

    fn update_explosions(&mut self, dt: f32, f: f32) {
        let damping = FRICTION.powf(f);
        let mut finished = Vec::new();
        for (index, explosion) in self.explosions.iter_mut().enumerate() {
            for (particle, velocity) in &mut explosion.particles {
                if let Ok(node) = self.graph.node_mut(*particle) {
                    node.transform.position += *velocity * f;
                }
                *velocity *= damping;
            }
            explosion.remaining -= dt;
            if explosion.remaining <= 0.0 {
                finished.push(index);
            }
        }
        for index in finished.into_iter().rev() {
            let explosion = self.explosions.remove(index);
            if let Ok(node) = self.graph.node_mut(explosion.target) {
                node.visible = true;
            }
            if let Err(err) = self.graph.remove(explosion.group) {
                error!("failed to remove explosion debris: {err}");
            }
            debug!("restored {:?} after explosion", explosion.target);
            self.info.hide();
        }
    }
}

impl Showcase for SolarSystem {
    fn name(&self) -> &'static str {
        "solar"
    }

    fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    fn camera_home(&self) -> CameraPose {
        CameraPose {
            position: Vec3::new(0.0, 20.0, 40.0),
            target: Vec3::ZERO,
        }
    }

    fn orbit_limits(&self) -> OrbitLimits {
        OrbitLimits {
            center: Vec3::ZERO,
            min_distance: 10.0,
            max_distance: 100.0,
        }
    }

    fn update(&mut self, dt: f32, camera: &mut OrbitCamera) {
        let f = frame_factor(dt);
        let fs = f * self.speed;
        self.clock += dt;

        self.with_transform(self.sun, |t| t.rotation.y += 0.01 * fs);
        for index in 0..self.planets.len() {
            let planet = &mut self.planets[index];
            planet.angle += planet.speed * fs;
            let (orbit, mesh, angle) = (planet.orbit, planet.mesh, planet.angle);
            self.with_transform(orbit, |t| t.rotation.y = angle);
            self.with_transform(mesh, |t| t.rotation.y += 0.02 * fs);
        }
        for index in 0..self.moons.len() {
            let Moon { orbit, mesh, speed } = self.moons[index];
            self.with_transform(orbit, |t| t.rotation.y += speed * fs);
            self.with_transform(mesh, |t| t.rotation.y += 0.03 * fs);
        }
        self.with_transform(self.asteroids, |t| t.rotation.y += 0.003 * fs);
        self.with_transform(self.sun_particles, |t| {
            t.rotation.y += 0.01 * fs;
            t.rotation.x += 0.005 * fs;
        });

        self.advance_effect(self.corona, 0.02 * fs);
        for index in 0..self.planets.len() {
            if let Some(atmosphere) = self.planets[index].atmosphere {
                self.advance_effect(atmosphere, 0.01 * fs);
            }
            if let Some(aurora) = self.planets[index].aurora {
                self.advance_effect(aurora, 0.02 * fs);
            }
            if self.speed > TRAIL_MIN_SPEED {
                self.update_trail(index);
            }
        }
        self.advance_effect(self.stars, 0.01 * f);
        self.advance_effect(self.nebula, 0.005 * f);

        let clock = self.clock;
        for index in 0..self.comets.len() {
            let group = self.comets[index].group;
            let i = index as f32;
            self.with_transform(group, |t| {
                t.rotation.y += (0.005 + i * 0.002) * fs;
                t.position.y = (clock + i).sin() * 2.0;
            });
            for p in 0..self.comets[index].tail.len() {
                let particle = self.comets[index].tail[p];
                let phase = p as f32;
                self.with_transform(particle, |t| {
                    t.position.x += (clock * 3.0 + phase).sin() * 0.01 * f;
                    t.position.y += (clock * 2.0 + phase).cos() * 0.01 * f;
                });
            }
        }

        self.update_explosions(dt, f);

        if let Some(target) = self.follow {
            match self.graph.world_position(target) {
                Ok(position) => camera.follow(Some(position)),
                Err(_) => self.follow = None,
            }
        }
    }

    fn click(&mut self, hit: Option<NodeKey>) {
        let Some((key, pick)) =
            hit.and_then(|key| Some((key, self.graph.pick_info(key)?.clone())))
        else {
            self.info.hide();
            return;
        };
        let count = self.clicks.entry(key).or_insert(0);
        *count += 1;
        debug!("{} clicked ({} / {CLICKS_TO_EXPLODE})", pick.name, count);
        if *count >= CLICKS_TO_EXPLODE {
            *count = 0;
            if let Err(err) = self.explode(key, &pick.name) {
                error!("explosion of {} failed: {err:?}", pick.name);
            }
        } else {
            let body = format!(
                "{} (Clicks: {}/{CLICKS_TO_EXPLODE})",
                pick.description, count
            );
            self.info.show(pick.name, body);
        }
    }

    fn key(&mut self, key: KeyCode, camera: &mut OrbitCamera) -> bool {
        match key {
            KeyCode::Character('+' | '=' | ']') => {
                self.set_speed(self.speed + self.speed_step);
                info!("simulation speed {:.1}x", self.speed);
            }
            KeyCode::Character('-' | '[') => {
                self.set_speed(self.speed - self.speed_step);
                info!("simulation speed {:.1}x", self.speed);
            }
            KeyCode::Character('R') => {
                self.follow = None;
                camera.reset();
            }
            KeyCode::Character('F') => {
                self.follow = self.graph.find_pickable(FOLLOW_TARGET);
                if let Some(position) = self
                    .follow
                    .and_then(|target| self.graph.world_position(target).ok())
                {
                    camera.follow(Some(position));
                }
            }
            _ => return false,
        }
        true
    }

    fn info(&self) -> &InfoPanel {
        &self.info
    }

    fn status_line(&self) -> String {
        format!("speed {:.1}x", self.speed)
    }

    fn summary(&self) -> Vec<String> {
        self.graph
            .pickables()
            .into_iter()
            .filter_map(|key| {
                let pick = self.graph.pick_info(key)?;
                let visible = self.graph.is_visible_in_tree(key).ok()?;
                let position = self.graph.world_position(key).ok()?;
                Some(format!(
                    "{} visible={} clicks={} pos=({:.2}, {:.2}, {:.2})",
                    pick.name,
                    visible,
                    self.clicks.get(&key).copied().unwrap_or(0),
                    position.x,
                    position.y,
                    position.z
                ))
            })
            .collect()
    }
}

fn flat() -> Transform {
    Transform::default().with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0))
}

fn add_stars(graph: &mut SceneGraph, rng: &mut SeededRandom, count: u32) -> Result<NodeKey> {
    let sprites: Vec<PointSprite> = (0..count)
        .map(|_| {
            let position = Vec3::new(rng.spread(1000.0), rng.spread(1000.0), rng.spread(1000.0));
            let class = rng.next_f32();
            let [r, g, b] = if class < 0.6 {
                [1.0, 1.0, 1.0]
            } else if class < 0.75 {
                [1.0, 0.9, 0.7]
            } else if class < 0.9 {
                [0.9, 0.9, 1.0]
            } else if class < 0.95 {
                [1.0, 0.7, 0.7]
            } else {
                [1.0, 0.5, 1.0]
            };
            let size = rng.next_f32() * 4.0 + 1.0;
            let opacity = rng.next_f32() * 0.5 + 0.5;
            PointSprite {
                position,
                color: [r, g, b, opacity],
                size,
            }
        })
        .collect();
    let mesh = graph.meshes.insert(geometry::points(&sprites));
    let material = Material::effect(Effect::Starfield).with_side(Side::Double);
    Ok(graph.add_mesh(None, "stars", Transform::default(), mesh, material)?)
}

fn add_nebula(graph: &mut SceneGraph, rng: &mut SeededRandom, size: u32) -> Result<NodeKey> {
    let texture = graph.textures.insert("nebula", textures::nebula(rng, size));
    let mesh = graph.meshes.insert(geometry::plane(1000.0, 1000.0));
    let material = Material::effect(Effect::Nebula)
        .with_texture(texture)
        .with_side(Side::Double);
    Ok(graph.add_mesh(
        None,
        "nebula",
        Transform::at(Vec3::new(0.0, 0.0, -800.0)),
        mesh,
        material,
    )?)
}

fn add_sun(graph: &mut SceneGraph, rng: &mut SeededRandom) -> Result<(NodeKey, NodeKey)> {
    let texture = graph.textures.insert("sun", textures::sun(rng));
    let mesh = graph.meshes.insert(geometry::sphere(2.0, 64, 64));
    let sun = graph.add_mesh(
        None,
        bodies::SUN_NAME,
        Transform::default(),
        mesh,
        Material::basic(Color::WHITE).with_texture(texture),
    )?;
    graph.set_pick(sun, bodies::SUN_NAME, bodies::SUN_DESCRIPTION)?;

    let corona_mesh = graph.meshes.insert(geometry::sphere(2.8, 32, 32));
    let corona = graph.add_mesh(
        Some(sun),
        "corona",
        Transform::default(),
        corona_mesh,
        Material::effect(Effect::Corona).with_side(Side::Back),
    )?;

    graph.lights = Lights {
        ambient: Some(AmbientLight {
            color: Color::hex(0x404040),
            intensity: 0.7,
        }),
        directional: Some(DirectionalLight {
            color: Color::WHITE,
            intensity: 0.5,
            position: Vec3::new(10.0, 10.0, 5.0),
        }),
        point: Some(PointLight {
            color: Color::WHITE,
            intensity: 3.0,
            position: Vec3::ZERO,
            range: 200.0,
        }),
    };
    Ok((sun, corona))
}

fn paint_surface(graph: &mut SceneGraph, rng: &mut SeededRandom, spec: &PlanetSpec) -> TextureId {
    let canvas = match spec.surface {
        Surface::Speckled { roughness } => textures::speckled(rng, spec.color, roughness),
        Surface::Earth => textures::earth(rng),
        Surface::Mars => textures::mars(rng),
        Surface::Jupiter => textures::jupiter(),
        Surface::Saturn => textures::saturn(),
    };
    graph.textures.insert(spec.name.to_lowercase(), canvas)
}

fn add_planets(
    graph: &mut SceneGraph,
    rng: &mut SeededRandom,
) -> Result<(Vec<Planet>, Vec<Moon>)> {
    let surfaces: Vec<TextureId> = PLANETS
        .iter()
        .map(|spec| paint_surface(graph, rng, spec))
        .collect();
    let orbit_ring_material = Material::basic(Color::hex(0x888888))
        .with_opacity(0.6)
        .with_side(Side::Double);

    let mut planets = Vec::with_capacity(PLANETS.len());
    let mut moons = Vec::new();
    for (spec, surface) in PLANETS.iter().zip(surfaces) {
        let orbit = graph.add_group(None, format!("{} orbit", spec.name), Transform::default())?;
        let mesh = graph.meshes.insert(geometry::sphere(spec.radius, 32, 32));
        let planet = graph.add_mesh(
            Some(orbit),
            spec.name,
            Transform::at(Vec3::new(spec.distance, 0.0, 0.0)),
            mesh,
            Material::lambert(Color::WHITE).with_texture(surface),
        )?;
        graph.set_pick(planet, spec.name, spec.description)?;

        let ring = graph.meshes.insert(geometry::ring(
            spec.distance - 0.02,
            spec.distance + 0.02,
            128,
        ));
        graph.add_mesh(
            None,
            format!("{} orbit ring", spec.name),
            flat(),
            ring,
            orbit_ring_material.clone(),
        )?;

        let angle = rng.angle();
        graph.node_mut(orbit)?.transform.rotation.y = angle;

        if spec.surface == Surface::Saturn {
            let texture = graph.textures.insert("saturn-rings", textures::saturn_rings());
            let rings = graph.meshes.insert(geometry::ring(
                spec.radius * 1.2,
                spec.radius * 2.2,
                64,
            ));
            graph.add_mesh(
                Some(planet),
                "Saturn rings",
                flat(),
                rings,
                Material::lambert(Color::WHITE)
                    .with_texture(texture)
                    .with_opacity(0.8)
                    .with_side(Side::Double),
            )?;
        }

        let aurora = if spec.surface == Surface::Earth {
            let mesh = graph.meshes.insert(geometry::ring(0.8, 1.1, 32));
            let mut transform = flat();
            transform.position.y = 0.6;
            Some(graph.add_mesh(
                Some(planet),
                "aurora",
                transform,
                mesh,
                Material::effect(Effect::Aurora).with_side(Side::Double),
            )?)
        } else {
            None
        };

        let trail = add_trail(graph, spec)?;

        for moon in MOONS.iter().filter(|moon| moon.planet == spec.name) {
            moons.push(add_moon(graph, rng, planet, moon)?);
        }

        let atmosphere = match spec.atmosphere {
            Some(glow) => {
                let mesh = graph
                    .meshes
                    .insert(geometry::sphere(spec.radius * 1.05, 32, 32));
                let effect = Effect::Atmosphere {
                    color: Color::hex(glow),
                };
                Some(graph.add_mesh(
                    Some(planet),
                    format!("{} atmosphere", spec.name),
                    Transform::default(),
                    mesh,
                    Material::effect(effect).with_side(Side::Back),
                )?)
            }
            None => None,
        };

        planets.push(Planet {
            orbit,
            mesh: planet,
            angle,
            speed: spec.speed,
            trail,
            atmosphere,
            aurora,
        });
    }
    Ok((planets, moons))
}

/// World-space sprites behind a planet. Unwritten segments have size zero
/// and are not drawn.
fn add_trail(graph: &mut SceneGraph, spec: &PlanetSpec) -> Result<MeshId> {
    let sprites: Vec<PointSprite> = (0..TRAIL_LENGTH)
        .map(|i| PointSprite {
            position: Vec3::ZERO,
            color: [1.0, 1.0, 1.0, (TRAIL_LENGTH - i) as f32 / TRAIL_LENGTH as f32],
            size: 0.0,
        })
        .collect();
    let mesh = graph.meshes.insert(geometry::points(&sprites));
    let material = Material::basic(Color::hex(spec.color))
        .with_opacity(0.5)
        .with_points(2.0, false)
        .with_side(Side::Double);
    graph.add_mesh(
        None,
        format!("{} trail", spec.name),
        Transform::default(),
        mesh,
        material,
    )?;
    Ok(mesh)
}

fn add_moon(
    graph: &mut SceneGraph,
    rng: &mut SeededRandom,
    planet: NodeKey,
    spec: &MoonSpec,
) -> Result<Moon> {
    let orbit = graph.add_group(Some(planet), format!("{} orbit", spec.name), Transform::default())?;
    let mesh = graph
        .meshes
        .insert(geometry::sphere(spec.radius, spec.segments, spec.segments));
    let material = match spec.look {
        MoonLook::Cratered => {
            let texture = graph
                .textures
                .insert(spec.name.to_lowercase(), textures::moon(rng));
            Material::lambert(Color::WHITE).with_texture(texture)
        }
        MoonLook::Plain(color) | MoonLook::Hazy { color, .. } => {
            Material::lambert(Color::hex(color))
        }
    };
    let moon = graph.add_mesh(
        Some(orbit),
        spec.name,
        Transform::at(Vec3::new(spec.distance, 0.0, 0.0)),
        mesh,
        material,
    )?;
    graph.set_pick(moon, spec.name, spec.description)?;

    if let MoonLook::Hazy { haze, .. } = spec.look {
        let shell = graph.meshes.insert(geometry::sphere(spec.radius + 0.02, 16, 16));
        graph.add_mesh(
            Some(moon),
            format!("{} haze", spec.name),
            Transform::default(),
            shell,
            Material::lambert(Color::hex(haze)).with_opacity(0.3),
        )?;
    }
    Ok(Moon {
        orbit,
        mesh: moon,
        speed: spec.speed,
    })
}

fn add_comets(graph: &mut SceneGraph, rng: &mut SeededRandom) -> Result<Vec<Comet>> {
    let core_mesh = graph.meshes.insert(geometry::sphere(0.15, 12, 12));
    let tail_mesh = graph.meshes.insert(geometry::sphere(0.02, 4, 4));
    let mut comets = Vec::with_capacity(COMET_COUNT);
    for index in 0..COMET_COUNT {
        let group = graph.add_group(None, format!("comet {index}"), Transform::default())?;
        let texture = graph
            .textures
            .insert(format!("comet-{index}"), textures::comet(rng));

        let mut tail = Vec::with_capacity(COMET_TAIL);
        for j in 0..COMET_TAIL {
            let color = Color::hsl(0.6, 0.8, 0.5 + rng.next_f32() * 0.5);
            let opacity = 0.7 - j as f32 / COMET_TAIL as f32 * 0.6;
            let position = Vec3::new(rng.spread(0.15), rng.spread(0.15), -(j as f32) * 0.1);
            tail.push(graph.add_mesh(
                Some(group),
                format!("comet {index} tail {j}"),
                Transform::at(position),
                tail_mesh,
                Material::basic(color).with_opacity(opacity),
            )?);
        }
        graph.add_mesh(
            Some(group),
            format!("comet {index} core"),
            Transform::default(),
            core_mesh,
            Material::lambert(Color::WHITE).with_texture(texture),
        )?;

        let angle = rng.angle();
        let distance = rng.range(30.0, 50.0);
        let height = rng.spread(5.0);
        graph.node_mut(group)?.transform.position =
            Vec3::new(angle.cos() * distance, height, angle.sin() * distance);
        graph.look_at(group, Vec3::ZERO)?;
        comets.push(Comet { group, tail });
    }
    Ok(comets)
}

fn add_asteroids(graph: &mut SceneGraph, rng: &mut SeededRandom, count: u32) -> Result<NodeKey> {
    let sprites: Vec<PointSprite> = (0..count)
        .map(|_| {
            let angle = rng.angle();
            let distance = rng.range(13.0, 16.0);
            let height = rng.spread(0.75);
            let class = rng.next_f32();
            let [r, g, b] = if class < 0.6 {
                [0.5, 0.5, 0.5]
            } else if class < 0.8 {
                [0.8, 0.8, 0.9]
            } else {
                [0.3, 0.25, 0.2]
            };
            PointSprite {
                position: Vec3::new(angle.cos() * distance, height, angle.sin() * distance),
                color: [r, g, b, 1.0],
                size: 1.0,
            }
        })
        .collect();
    let sprite = graph.textures.insert("asteroid", textures::round_sprite());
    let mesh = graph.meshes.insert(geometry::points(&sprites));
    let material = Material::basic(Color::WHITE)
        .with_texture(sprite)
        .with_points(3.0, false)
        .with_opacity(0.9)
        .with_alpha_test(0.1)
        .with_side(Side::Double);
    Ok(graph.add_mesh(None, "asteroid belt", Transform::default(), mesh, material)?)
}

fn add_sun_particles(
    graph: &mut SceneGraph,
    rng: &mut SeededRandom,
    count: u32,
) -> Result<NodeKey> {
    let sprites: Vec<PointSprite> = (0..count)
        .map(|_| {
            let radius = rng.range(3.0, 5.0);
            let theta = rng.angle();
            let phi = rng.next_f32() * PI;
            PointSprite {
                position: Vec3::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                ),
                color: [1.0; 4],
                size: 1.0,
            }
        })
        .collect();
    let mesh = graph.meshes.insert(geometry::points(&sprites));
    let material = Material::basic(Color::hex(0xFFAA00))
        .with_points(0.1, true)
        .with_opacity(0.8)
        .with_blend(Blend::Additive)
        .with_side(Side::Double);
    Ok(graph.add_mesh(None, "sun particles", Transform::default(), mesh, material)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;

    const STEP: f32 = 1.0 / 60.0;

    fn small_system(seed: u32) -> (SolarSystem, OrbitCamera) {
        let config = SolarConfig {
            seed: Some(seed),
            star_count: 64,
            asteroid_count: 32,
            sun_particle_count: 32,
            nebula_texture_size: 32,
            ..SolarConfig::default()
        };
        let system = SolarSystem::new(&config).unwrap();
        let camera = system.camera(&CameraConfig::default());
        (system, camera)
    }

    fn run(system: &mut SolarSystem, camera: &mut OrbitCamera, frames: usize) {
        for _ in 0..frames {
            system.update(STEP, camera);
        }
    }

    fn visible(system: &SolarSystem, name: &str) -> bool {
        let key = system.graph().find_pickable(name).unwrap();
        system.graph().is_visible_in_tree(key).unwrap()
    }

    #[test]
    fn every_body_is_pickable() {
        let (system, _) = small_system(1);
        assert_eq!(system.graph().pickables().len(), 17);
        for name in ["Sun", "Earth", "Moon", "Io", "Titan", "Deimos", "Neptune"] {
            assert!(system.graph().find_pickable(name).is_some(), "{name}");
        }
    }

    #[test]
    fn clicks_count_up_to_an_explosion() {
        let (mut system, mut camera) = small_system(2);
        assert!(system.click_named("Mars"));
        assert_eq!(system.info().body(), "The red planet (Clicks: 1/3)");
        assert!(system.click_named("Mars"));
        assert_eq!(system.clicks("Mars"), 2);
        assert!(system.click_named("Mars"));

        assert_eq!(system.info().title(), "EXPLOSION!");
        assert_eq!(
            system.info().body(),
            "Mars has exploded! It will reappear in 3 seconds..."
        );
        assert_eq!(system.clicks("Mars"), 0);
        assert!(!visible(&system, "Mars"));
        // Moons go down with their planet.
        assert!(!visible(&system, "Phobos"));
        assert!(!system.click_named("Phobos"));

        run(&mut system, &mut camera, 170);
        assert!(!visible(&system, "Mars"));
        assert_eq!(system.active_explosions(), 1);

        run(&mut system, &mut camera, 20);
        assert!(visible(&system, "Mars"));
        assert_eq!(system.active_explosions(), 0);
        assert!(!system.info().is_visible());
    }

    #[test]
    fn explosion_debris_is_removed() {
        let (mut system, mut camera) = small_system(3);
        let before = system.graph().len();
        for _ in 0..3 {
            system.click_named("Venus");
        }
        assert_eq!(system.graph().len(), before + 1 + EXPLOSION_PARTICLES);
        run(&mut system, &mut camera, 200);
        assert_eq!(system.graph().len(), before);
    }

    #[test]
    fn explosion_timer_ignores_simulation_speed() {
        let (mut system, mut camera) = small_system(4);
        system.set_speed(0.0);
        for _ in 0..3 {
            system.click_named("Sun");
        }
        run(&mut system, &mut camera, 190);
        assert!(visible(&system, "Sun"));
    }

    #[test]
    fn empty_click_hides_panel() {
        let (mut system, _) = small_system(5);
        system.click_named("Earth");
        assert!(system.info().is_visible());
        system.click(None);
        assert!(!system.info().is_visible());
    }

    #[test]
    fn speed_keys_step_and_clamp() {
        let (mut system, mut camera) = small_system(6);
        assert!(system.key(KeyCode::Character('+'), &mut camera));
        assert_eq!(system.status_line(), "speed 1.1x");
        for _ in 0..100 {
            system.key(KeyCode::Character(']'), &mut camera);
        }
        assert_eq!(system.speed(), 5.0);
        for _ in 0..100 {
            system.key(KeyCode::Character('-'), &mut camera);
        }
        assert_eq!(system.speed(), 0.0);
        assert!(!system.key(KeyCode::Digit(1), &mut camera));
    }

    #[test]
    fn planets_advance_with_speed() {
        let (mut system, mut camera) = small_system(7);
        let start = system.planets[2].angle;
        system.set_speed(2.0);
        run(&mut system, &mut camera, 10);
        let expected = start + 0.030 * 2.0 * 10.0;
        assert!((system.planets[2].angle - expected).abs() < 1e-4);
    }

    #[test]
    fn trails_only_grow_above_threshold() {
        let (mut system, mut camera) = small_system(8);
        let trail = system.planets[0].trail;
        run(&mut system, &mut camera, 5);
        assert_eq!(system.graph().meshes.get(trail).unwrap().point_size(0), Some(0.0));

        system.set_speed(2.0);
        run(&mut system, &mut camera, 3);
        let mesh = system.graph().meshes.get(trail).unwrap();
        for i in 0..3 {
            assert_eq!(mesh.point_size(i), Some(1.0));
        }
        assert_eq!(mesh.point_size(3), Some(0.0));
        let head = system.graph().world_position(system.planets[0].mesh).unwrap();
        assert!((mesh.point_position(0).unwrap() - head).length() < 1e-4);
    }

    #[test]
    fn same_seed_same_layout() {
        let (a, _) = small_system(9);
        let (b, _) = small_system(9);
        assert_eq!(a.summary(), b.summary());
    }

    #[test]
    fn follow_tracks_earth_until_reset() {
        let (mut system, mut camera) = small_system(10);
        assert!(system.key(KeyCode::Character('F'), &mut camera));
        run(&mut system, &mut camera, 3);
        let earth = system
            .graph()
            .world_position(system.graph().find_pickable("Earth").unwrap())
            .unwrap();
        assert!(camera.is_following());
        assert!((camera.target() - earth).length() < 1e-4);

        system.key(KeyCode::Character('R'), &mut camera);
        run(&mut system, &mut camera, 1);
        assert!(!camera.is_following());
        assert_eq!(camera.target(), Vec3::ZERO);
    }

    #[test]
    fn effect_clocks_advance() {
        let (mut system, mut camera) = small_system(11);
        run(&mut system, &mut camera, 60);
        let corona = system.graph().node(system.corona).unwrap();
        let time = corona.material().unwrap().time;
        assert!((time - 1.2).abs() < 1e-3);
    }

    #[test]
    fn debris_drifts_and_slows_each_frame() {
        let (mut system, mut camera) = small_system(5);
        for _ in 0..3 {
            system.click_named("Mars");
        }
        let (particle, velocity) = system.explosions[0].particles[0];
        let position = |system: &SolarSystem| system.graph.node(particle).unwrap().transform.position;

        let start = position(&system);
        system.update(STEP, &mut camera);
        let first = position(&system);
        assert!((first - start - velocity).length() < 1e-5);
        let slowed = system.explosions[0].particles[0].1;
        assert!((slowed - velocity * FRICTION).length() < 1e-5);

        system.update(STEP, &mut camera);
        let second = position(&system);
        assert!((second - first - velocity * FRICTION).length() < 1e-5);
    }

    #[test]
    fn comets_bob_spin_and_shake_their_tails() {
        let (mut system, mut camera) = small_system(8);
        run(&mut system, &mut camera, 10);
        let f = frame_factor(STEP);
        for (index, comet) in system.comets.iter().enumerate() {
            let y = system.graph.node(comet.group).unwrap().transform.position.y;
            assert!((y - (system.clock + index as f32).sin() * 2.0).abs() < 1e-5);
        }

        let yaw = |system: &SolarSystem, index: usize| {
            system.graph.node(system.comets[index].group).unwrap().transform.rotation.y
        };
        let tail = |system: &SolarSystem| {
            let key = system.comets[0].tail[3];
            system.graph.node(key).unwrap().transform.position
        };
        let before: Vec<f32> = (0..system.comets.len()).map(|i| yaw(&system, i)).collect();
        let tail_before = tail(&system);
        system.update(STEP, &mut camera);
        for (index, start) in before.iter().enumerate() {
            let expected = (0.005 + index as f32 * 0.002) * f * system.speed();
            assert!((yaw(&system, index) - start - expected).abs() < 1e-5);
        }
        let moved = tail(&system) - tail_before;
        assert!((moved.x - (system.clock * 3.0 + 3.0).sin() * 0.01 * f).abs() < 1e-6);
        assert!((moved.y - (system.clock * 2.0 + 3.0).cos() * 0.01 * f).abs() < 1e-6);
    }

    #[test]
    fn non_finite_speed_is_ignored() {
        let (mut system, mut camera) = small_system(2);
        system.set_speed(2.0);
        system.set_speed(f32::NAN);
        system.set_speed(f32::INFINITY);
        assert_eq!(system.speed(), 2.0);
        run(&mut system, &mut camera, 2);
        assert!(system.planets.iter().all(|planet| planet.angle.is_finite()));
    }
}
