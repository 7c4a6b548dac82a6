//! Glue between the platform event loop and a [`Showcase`].
//!
//! [`Session`] owns the scene, the orbit camera and the input state and is
//! driven the same way by the window loop and by the headless runner.

use anyhow::{bail, Context, Result};
use glam::Vec2;
use log::debug;
use winit::event::{MouseButton as WinitMouseButton, MouseScrollDelta};
use winit::keyboard::{Key, NamedKey as WinitNamedKey};

use crate::camera::OrbitCamera;
use crate::config::AppConfig;
use crate::house::ToyHouse;
use crate::input::{InputState, KeyCode, MouseButton, NamedKey};
use crate::picking;
use crate::showcase::Showcase;
use crate::solar::SolarSystem;

pub const SCENES: [&str; 2] = ["solar", "house"];

/// Builds the scene called `name` from its config section.
pub fn build_scene(name: &str, config: &AppConfig) -> Result<Box<dyn Showcase>> {
    Ok(match name {
        "solar" => Box::new(SolarSystem::new(&config.solar).context("building solar system")?),
        "house" => Box::new(ToyHouse::new(&config.house).context("building toy house")?),
        other => bail!("unknown scene '{other}', expected one of: {}", SCENES.join(", ")),
    })
}

pub struct Session {
    scene: Box<dyn Showcase>,
    camera: OrbitCamera,
    input: InputState,
    viewport: Vec2,
}

impl Session {
    pub fn new(scene: Box<dyn Showcase>, config: &AppConfig) -> Self {
        let mut camera = scene.camera(&config.camera);
        camera.resize(config.window.width, config.window.height);
        Self {
            scene,
            camera,
            input: InputState::new(),
            viewport: Vec2::new(config.window.width as f32, config.window.height as f32),
        }
    }

    pub fn scene(&self) -> &dyn Showcase {
        self.scene.as_ref()
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn step(&mut self, dt: f32) {
        self.scene.update(dt, &mut self.camera);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = Vec2::new(width as f32, height as f32);
        self.camera.resize(width, height);
    }

    /// Returns whether the scene reacted to the key. Presses of a key that
    /// is already held (auto-repeat) are ignored.
    pub fn key_down(&mut self, key: KeyCode) -> bool {
        if self.input.is_key_down(key) {
            return false;
        }
        self.input.set_key_down(key);
        self.scene.key(key, &mut self.camera)
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.input.set_key_up(key);
    }

    pub fn focus_lost(&mut self) {
        self.input.release_keys();
    }

    pub fn pointer_moved(&mut self, position: Vec2) {
        if let Some(delta) = self.input.set_mouse_position(position) {
            self.camera.drag(delta);
        }
    }

    pub fn button_down(&mut self, button: MouseButton) {
        self.input.set_mouse_button_down(button);
    }

    /// Completes a press; a release close enough to the press is a click and
    /// is picked against the scene.
    pub fn button_up(&mut self, button: MouseButton) {
        let Some(position) = self.input.set_mouse_button_up(button) else {
            return;
        };
        let hit = picking::pick(self.scene.graph(), &self.camera, position, self.viewport);
        debug!("click at {position} hit {:?}", hit.map(|hit| hit.key));
        self.scene.click(hit.map(|hit| hit.key));
    }

    pub fn scroll(&mut self, delta_y: f32) {
        self.camera.zoom(delta_y);
    }

    pub fn click_named(&mut self, name: &str) -> bool {
        self.scene.click_named(name)
    }

    pub fn title(&self, base: &str) -> String {
        self.scene.title(base)
    }

    /// Text printed by the headless runner.
    pub fn report(&self) -> Vec<String> {
        let graph = self.scene.graph();
        let mut lines = vec![format!(
            "Loaded scene '{}' with {} nodes ({} pickable)",
            self.scene.name(),
            graph.len(),
            graph.pickables().len()
        )];
        lines.extend(self.scene.summary().into_iter().map(|line| format!(" - {line}")));
        let status = self.scene.status_line();
        if !status.is_empty() {
            lines.push(format!("Status: {status}"));
        }
        if let Some(info) = self.scene.info().line() {
            lines.push(format!("Info: {info}"));
        }
        lines
    }
}

pub fn map_key(key: &Key) -> Option<KeyCode> {
    match key {
        Key::Named(WinitNamedKey::Space) => Some(KeyCode::Named(NamedKey::Space)),
        Key::Named(WinitNamedKey::Enter) => Some(KeyCode::Named(NamedKey::Enter)),
        Key::Named(WinitNamedKey::Escape) => Some(KeyCode::Named(NamedKey::Escape)),
        Key::Character(text) => text.chars().next().map(KeyCode::from_char),
        _ => None,
    }
}

pub fn map_mouse_button(button: WinitMouseButton) -> MouseButton {
    match button {
        WinitMouseButton::Left => MouseButton::LEFT,
        WinitMouseButton::Right => MouseButton::RIGHT,
        WinitMouseButton::Middle => MouseButton::MIDDLE,
        WinitMouseButton::Back => MouseButton::new(3),
        WinitMouseButton::Forward => MouseButton::new(4),
        WinitMouseButton::Other(value) => MouseButton::new(value.min(u16::from(u8::MAX)) as u8),
    }
}

/// Wheel movement in pixels, positive when scrolling toward the user.
pub fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
    }
}
