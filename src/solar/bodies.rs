//! Static description of the bodies in the solar system scene.
//!
//! Distances and radii are scene units, speeds are radians per 60 Hz frame
//! at 1x simulation speed.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surface {
    Speckled { roughness: f32 },
    Earth,
    Mars,
    Jupiter,
    Saturn,
}

#[derive(Debug, Clone, Copy)]
pub struct PlanetSpec {
    pub name: &'static str,
    pub radius: f32,
    pub distance: f32,
    pub speed: f32,
    pub color: u32,
    pub description: &'static str,
    pub surface: Surface,
    /// Glow color of a rim atmosphere, if any.
    pub atmosphere: Option<u32>,
}

pub const PLANETS: [PlanetSpec; 8] = [
    PlanetSpec {
        name: "Mercury",
        radius: 0.4,
        distance: 6.0,
        speed: 0.047,
        color: 0x8C7853,
        description: "The planet closest to the Sun",
        surface: Surface::Speckled { roughness: 0.3 },
        atmosphere: None,
    },
    PlanetSpec {
        name: "Venus",
        radius: 0.6,
        distance: 8.0,
        speed: 0.035,
        color: 0xFFC649,
        description: "The hottest planet",
        surface: Surface::Speckled { roughness: 0.8 },
        atmosphere: Some(0xFFA500),
    },
    PlanetSpec {
        name: "Earth",
        radius: 0.7,
        distance: 10.0,
        speed: 0.030,
        color: 0x6B93D6,
        description: "Our blue home",
        surface: Surface::Earth,
        atmosphere: Some(0x87CEEB),
    },
    PlanetSpec {
        name: "Mars",
        radius: 0.5,
        distance: 12.0,
        speed: 0.024,
        color: 0xCD5C5C,
        description: "The red planet",
        surface: Surface::Mars,
        atmosphere: Some(0xCD5C5C),
    },
    PlanetSpec {
        name: "Jupiter",
        radius: 1.5,
        distance: 16.0,
        speed: 0.013,
        color: 0xD8CA9D,
        description: "The gas giant",
        surface: Surface::Jupiter,
        atmosphere: None,
    },
    PlanetSpec {
        name: "Saturn",
        radius: 1.2,
        distance: 20.0,
        speed: 0.009,
        color: 0xFAD5A5,
        description: "The one with the rings",
        surface: Surface::Saturn,
        atmosphere: None,
    },
    PlanetSpec {
        name: "Uranus",
        radius: 0.9,
        distance: 24.0,
        speed: 0.006,
        color: 0x4FD0E7,
        description: "The ice giant",
        surface: Surface::Speckled { roughness: 0.4 },
        atmosphere: None,
    },
    PlanetSpec {
        name: "Neptune",
        radius: 0.8,
        distance: 28.0,
        speed: 0.005,
        color: 0x4B70DD,
        description: "The distant blue planet",
        surface: Surface::Speckled { roughness: 0.5 },
        atmosphere: None,
    },
];

#[derive(Debug, Clone, Copy)]
pub enum MoonLook {
    /// Painted crater texture.
    Cratered,
    Plain(u32),
    /// Plain color with a translucent haze shell.
    Hazy { color: u32, haze: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct MoonSpec {
    pub name: &'static str,
    pub planet: &'static str,
    pub radius: f32,
    pub distance: f32,
    pub speed: f32,
    pub segments: u32,
    pub look: MoonLook,
    pub description: &'static str,
}

pub const MOONS: [MoonSpec; 8] = [
    MoonSpec {
        name: "Moon",
        planet: "Earth",
        radius: 0.15,
        distance: 1.2,
        speed: 0.1,
        segments: 16,
        look: MoonLook::Cratered,
        description: "Earth's only natural satellite",
    },
    MoonSpec {
        name: "Io",
        planet: "Jupiter",
        radius: 0.08,
        distance: 2.2,
        speed: 0.15,
        segments: 12,
        look: MoonLook::Plain(0xFFFF99),
        description: "Moon of Jupiter: Io",
    },
    MoonSpec {
        name: "Europa",
        planet: "Jupiter",
        radius: 0.07,
        distance: 2.6,
        speed: 0.12,
        segments: 12,
        look: MoonLook::Plain(0xCCCCFF),
        description: "Moon of Jupiter: Europa",
    },
    MoonSpec {
        name: "Ganymede",
        planet: "Jupiter",
        radius: 0.1,
        distance: 3.0,
        speed: 0.09,
        segments: 12,
        look: MoonLook::Plain(0x999999),
        description: "Moon of Jupiter: Ganymede",
    },
    MoonSpec {
        name: "Callisto",
        planet: "Jupiter",
        radius: 0.09,
        distance: 3.5,
        speed: 0.07,
        segments: 12,
        look: MoonLook::Plain(0x666666),
        description: "Moon of Jupiter: Callisto",
    },
    MoonSpec {
        name: "Titan",
        planet: "Saturn",
        radius: 0.12,
        distance: 3.2,
        speed: 0.08,
        segments: 16,
        look: MoonLook::Hazy {
            color: 0xFFAA77,
            haze: 0xFF8844,
        },
        description: "Saturn's largest moon, wrapped in a dense atmosphere",
    },
    MoonSpec {
        name: "Phobos",
        planet: "Mars",
        radius: 0.04,
        distance: 0.8,
        speed: 0.25,
        segments: 8,
        look: MoonLook::Plain(0x888888),
        description: "Moon of Mars: Phobos",
    },
    MoonSpec {
        name: "Deimos",
        planet: "Mars",
        radius: 0.03,
        distance: 1.1,
        speed: 0.18,
        segments: 8,
        look: MoonLook::Plain(0x666666),
        description: "Moon of Mars: Deimos",
    },
];

pub const SUN_NAME: &str = "Sun";
pub const SUN_DESCRIPTION: &str = "Our star, the center of the solar system";
