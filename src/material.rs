use crate::color::Color;
use crate::texture::TextureId;

/// How a surface responds to light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Unlit: color times texture.
    Basic,
    /// Diffuse lighting from the scene's lights.
    Lambert,
    /// Procedural shader effect; ignores scene lights.
    Effect(Effect),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    /// Point sprites that twinkle over time.
    Starfield,
    /// Texture with slowly drifting coordinates, faded.
    Nebula,
    /// Pulsing glow around the sun.
    Corona,
    /// Fresnel rim glow tinted with `color`.
    Atmosphere { color: Color },
    /// Moving bands around a pole.
    Aurora,
}

impl Effect {
    pub(crate) fn code(self) -> u32 {
        match self {
            Effect::Starfield => 1,
            Effect::Nebula => 2,
            Effect::Corona => 3,
            Effect::Atmosphere { .. } => 4,
            Effect::Aurora => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blend {
    Normal,
    Additive,
}

/// Which faces are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
    pub texture: Option<TextureId>,
    pub shading: Shading,
    pub blend: Blend,
    pub side: Side,
    /// Fragments with alpha below this are discarded.
    pub alpha_test: f32,
    /// Sprite size for point meshes, in pixels or world units.
    pub point_size: f32,
    /// Shrink sprites with distance from the camera.
    pub size_attenuation: bool,
    /// Animation clock read by effect shaders.
    pub time: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
            texture: None,
            shading: Shading::Lambert,
            blend: Blend::Normal,
            side: Side::Front,
            alpha_test: 0.0,
            point_size: 1.0,
            size_attenuation: true,
            time: 0.0,
        }
    }
}

impl Material {
    pub fn basic(color: Color) -> Self {
        Self {
            color,
            shading: Shading::Basic,
            ..Self::default()
        }
    }

    pub fn lambert(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn effect(effect: Effect) -> Self {
        Self {
            shading: Shading::Effect(effect),
            blend: Blend::Additive,
            ..Self::default()
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_alpha_test(mut self, alpha_test: f32) -> Self {
        self.alpha_test = alpha_test;
        self
    }

    pub fn with_points(mut self, size: f32, size_attenuation: bool) -> Self {
        self.point_size = size;
        self.size_attenuation = size_attenuation;
        self
    }

    /// Transparent materials are sorted back to front and never write depth.
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
            || self.blend == Blend::Additive
            || matches!(self.shading, Shading::Effect(_))
    }
}
