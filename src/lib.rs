//! Interactive 3D dioramas: an animated solar system and a toy house whose
//! doors and windows swing open.
//!
//! Scenes are plain data ([`SceneGraph`]) driven through the [`Showcase`]
//! trait, so everything except the wgpu [`Renderer`] runs and tests without
//! a window.

pub mod app;
pub mod camera;
pub mod color;
pub mod config;
pub mod geometry;
pub mod house;
pub mod info;
pub mod input;
pub mod material;
pub mod picking;
pub mod random;
pub mod render;
pub mod scene;
pub mod showcase;
pub mod solar;
pub mod texture;
pub mod tween;

pub use camera::{CameraPose, OrbitCamera, OrbitLimits};
pub use color::Color;
pub use config::{AppConfig, ConfigError};
pub use house::ToyHouse;
pub use input::{InputState, KeyCode, MouseButton, NamedKey};
pub use render::Renderer;
pub use scene::{NodeKey, SceneError, SceneGraph, Transform};
pub use showcase::Showcase;
pub use solar::SolarSystem;
