//! The interface every interactive scene implements.
//!
//! The window loop and the headless runner only talk to scenes through
//! [`Showcase`]: they feed it frame times, clicks and key presses, and read
//! back the scene graph to draw and the text to display.

use crate::camera::{CameraPose, OrbitCamera, OrbitLimits};
use crate::color::Color;
use crate::config::CameraConfig;
use crate::info::InfoPanel;
use crate::input::KeyCode;
use crate::scene::{NodeKey, SceneGraph};

/// Per-frame animation increments are tuned for this refresh rate and
/// scaled by `dt * FRAME_RATE`.
pub const FRAME_RATE: f32 = 60.0;

pub fn frame_factor(dt: f32) -> f32 {
    dt.max(0.0) * FRAME_RATE
}

pub trait Showcase {
    fn name(&self) -> &'static str;

    fn graph(&self) -> &SceneGraph;

    fn camera_home(&self) -> CameraPose;

    fn orbit_limits(&self) -> OrbitLimits;

    fn clear_color(&self) -> Color {
        Color::BLACK
    }

    /// Advances the animation by `dt` seconds of wall time.
    fn update(&mut self, dt: f32, camera: &mut OrbitCamera);

    /// Handles a completed click; `None` means empty space was clicked.
    fn click(&mut self, hit: Option<NodeKey>);

    /// Returns whether the key did anything.
    fn key(&mut self, key: KeyCode, camera: &mut OrbitCamera) -> bool;

    fn info(&self) -> &InfoPanel;

    /// Short status shown next to the scene name, e.g. the speed.
    fn status_line(&self) -> String {
        String::new()
    }

    /// One line per interactive object describing its current state.
    fn summary(&self) -> Vec<String>;

    /// Clicks the pickable named `name` as if the user hit it. Returns
    /// `false` when no such pickable exists or it is hidden.
    fn click_named(&mut self, name: &str) -> bool {
        let graph = self.graph();
        let Some(key) = graph.find_pickable(name) else {
            return false;
        };
        if !graph.is_visible_in_tree(key).unwrap_or(false) {
            return false;
        }
        self.click(Some(key));
        true
    }

    fn camera(&self, settings: &CameraConfig) -> OrbitCamera {
        OrbitCamera::new(settings, self.camera_home(), self.orbit_limits())
    }

    /// Window title combining scene name, status and info panel.
    fn title(&self, base: &str) -> String {
        let mut title = format!("{base} - {}", self.name());
        let status = self.status_line();
        if !status.is_empty() {
            title.push_str(&format!(" [{status}]"));
        }
        if let Some(line) = self.info().line() {
            title.push_str(" | ");
            title.push_str(&line);
        }
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_factor_is_one_at_sixty_hertz() {
        assert!((frame_factor(1.0 / 60.0) - 1.0).abs() < 1e-6);
        assert_eq!(frame_factor(-1.0), 0.0);
    }
}
