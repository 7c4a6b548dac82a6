//! CPU-side packing of the uniforms the shader reads.

use std::f32::consts::FRAC_PI_2;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::camera::OrbitCamera;
use crate::material::{Blend, Effect, Material, Shading, Side};
use crate::scene::Lights;

pub const SHADING_BASIC: u32 = 0;
pub const SHADING_LAMBERT: u32 = 1;
pub const SHADING_EFFECT: u32 = 2;

pub const FLAG_SPRITES: u32 = 1;
pub const FLAG_ATTENUATE: u32 = 2;

/// Edge length of each shadow map face in texels.
pub const SHADOW_MAP_SIZE: u32 = 1024;
/// A point light renders one shadow face per axis direction.
pub const SHADOW_FACES: usize = 6;
/// Subtracted from the fragment depth before the shadow comparison.
pub const SHADOW_BIAS: f32 = 0.00002;
const SHADOW_NEAR: f32 = 0.1;
/// Far plane for point lights without a range.
const SHADOW_FAR: f32 = 1000.0;

/// Face order shared with the shader: +X, -X, +Y, -Y, +Z, -Z.
const SHADOW_DIRECTIONS: [(Vec3, Vec3); SHADOW_FACES] = [
    (Vec3::X, Vec3::Y),
    (Vec3::NEG_X, Vec3::Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::Z),
    (Vec3::Z, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y),
];

/// Fixed state baked into a render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub blend: Blend,
    pub side: Side,
    pub depth_write: bool,
}

impl PipelineKey {
    pub fn for_material(material: &Material) -> Self {
        Self {
            blend: material.blend,
            side: material.side,
            depth_write: !material.is_transparent(),
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        [Blend::Normal, Blend::Additive].into_iter().flat_map(|blend| {
            [Side::Front, Side::Back, Side::Double]
                .into_iter()
                .flat_map(move |side| {
                    [true, false].into_iter().map(move |depth_write| Self {
                        blend,
                        side,
                        depth_write,
                    })
                })
        })
    }

    pub fn cull_mode(self) -> Option<wgpu::Face> {
        match self.side {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }

    pub fn blend_state(self) -> wgpu::BlendState {
        match self.blend {
            Blend::Normal => wgpu::BlendState::ALPHA_BLENDING,
            Blend::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::Zero,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

/// Per-frame camera and lighting state. Light colors are premultiplied by
/// intensity; `w` of each light color is 1 when the light exists.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub viewport: [f32; 4],
    pub ambient: [f32; 4],
    pub directional_color: [f32; 4],
    /// Unit vector pointing from the scene toward the light.
    pub directional_direction: [f32; 4],
    pub point_color: [f32; 4],
    /// Position in `xyz`, range in `w`.
    pub point_position: [f32; 4],
}

impl GlobalUniform {
    pub fn new(camera: &OrbitCamera, lights: &Lights, viewport: Vec2) -> Self {
        let mut uniform = Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            view: camera.view().to_cols_array_2d(),
            camera_position: camera.position().extend(1.0).into(),
            viewport: [viewport.x.max(1.0), viewport.y.max(1.0), 0.0, 0.0],
            ..Self::zeroed()
        };
        if let Some(ambient) = lights.ambient {
            uniform.ambient = premultiplied(ambient.color.to_linear(), ambient.intensity);
        }
        if let Some(light) = lights.directional {
            uniform.directional_color = premultiplied(light.color.to_linear(), light.intensity);
            uniform.directional_direction = light.position.normalize_or_zero().extend(0.0).into();
        }
        if let Some(light) = lights.point {
            uniform.point_color = premultiplied(light.color.to_linear(), light.intensity);
            uniform.point_position = light.position.extend(light.range.max(0.0)).into();
        }
        uniform
    }
}

fn premultiplied([r, g, b]: [f32; 3], intensity: f32) -> [f32; 4] {
    [r * intensity, g * intensity, b * intensity, 1.0]
}

/// Light-space matrices for the point light shadow map. `params.x` is 1
/// when shadows are rendered this frame, `params.y` the depth bias.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowUniform {
    pub faces: [[[f32; 4]; 4]; SHADOW_FACES],
    pub params: [f32; 4],
}

impl ShadowUniform {
    pub fn new(lights: &Lights) -> Self {
        let Some(light) = lights.point else {
            return Self::zeroed();
        };
        let far = if light.range > 0.0 { light.range } else { SHADOW_FAR };
        Self {
            faces: point_shadow_faces(light.position, far).map(|face| face.to_cols_array_2d()),
            params: [1.0, SHADOW_BIAS, 0.0, 0.0],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.params[0] > 0.0
    }
}

/// One 90 degree perspective per axis direction around `position`.
pub fn point_shadow_faces(position: Vec3, far: f32) -> [Mat4; SHADOW_FACES] {
    let projection = Mat4::perspective_rh(FRAC_PI_2, 1.0, SHADOW_NEAR, far.max(SHADOW_NEAR * 2.0));
    SHADOW_DIRECTIONS.map(|(direction, up)| {
        projection * Mat4::look_at_rh(position, position + direction, up)
    })
}

/// Face whose frustum contains `offset` (fragment minus light position).
/// Mirrors `shadow_face` in the shader.
pub fn shadow_face(offset: Vec3) -> usize {
    let abs = offset.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        if offset.x > 0.0 { 0 } else { 1 }
    } else if abs.y >= abs.z {
        if offset.y > 0.0 { 2 } else { 3 }
    } else if offset.z > 0.0 {
        4
    } else {
        5
    }
}

/// Lit, opaque, solid meshes block the point light.
pub fn casts_shadow(material: &Material, sprites: bool) -> bool {
    material.shading == Shading::Lambert && !material.is_transparent() && !sprites
}

/// Per-draw material and transform state.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    /// Linear color with opacity in `w`.
    pub color: [f32; 4],
    pub effect_color: [f32; 4],
    /// Alpha test, point size, time.
    pub params: [f32; 4],
    /// Shading mode, effect code, sprite flags.
    pub flags: [u32; 4],
}

impl ObjectUniform {
    pub fn new(material: &Material, model: Mat4, sprites: bool) -> Self {
        let [r, g, b] = material.color.to_linear();
        let (shading, effect) = match material.shading {
            Shading::Basic => (SHADING_BASIC, 0),
            Shading::Lambert => (SHADING_LAMBERT, 0),
            Shading::Effect(effect) => (SHADING_EFFECT, effect.code()),
        };
        let effect_color = match material.shading {
            Shading::Effect(Effect::Atmosphere { color }) => {
                let [r, g, b] = color.to_linear();
                [r, g, b, color.a]
            }
            _ => [0.0; 4],
        };
        let mut bits = 0;
        if sprites {
            bits |= FLAG_SPRITES;
        }
        if material.size_attenuation {
            bits |= FLAG_ATTENUATE;
        }
        Self {
            model: model.to_cols_array_2d(),
            normal: normal_matrix(model),
            color: [r, g, b, material.color.a * material.opacity],
            effect_color,
            params: [material.alpha_test, material.point_size, material.time, 0.0],
            flags: [shading, effect, bits, 0],
        }
    }
}

/// Inverse transpose of the upper 3x3, padded to the WGSL `mat3x4` layout.
/// Singular matrices (e.g. zero scale) fall back to identity.
fn normal_matrix(model: Mat4) -> [[f32; 4]; 3] {
    let linear = Mat3::from_mat4(model);
    let normal = if linear.determinant().abs() > f32::EPSILON {
        linear.inverse().transpose()
    } else {
        Mat3::IDENTITY
    };
    [
        normal.x_axis.extend(0.0).into(),
        normal.y_axis.extend(0.0).into(),
        normal.z_axis.extend(0.0).into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraPose, OrbitLimits};
    use crate::color::Color;
    use crate::config::CameraConfig;
    use crate::scene::{AmbientLight, DirectionalLight, PointLight};
    use glam::Vec3;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(
            &CameraConfig::default(),
            CameraPose {
                position: Vec3::new(0.0, 0.0, 10.0),
                target: Vec3::ZERO,
            },
            OrbitLimits {
                center: Vec3::ZERO,
                min_distance: 1.0,
                max_distance: 100.0,
            },
        )
    }

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ShadowUniform>() % 16, 0);
    }

    #[test]
    fn transparent_materials_skip_depth_writes() {
        let glass = Material::lambert(Color::WHITE).with_opacity(0.5);
        assert!(!PipelineKey::for_material(&glass).depth_write);
        assert!(PipelineKey::for_material(&Material::default()).depth_write);
        assert_eq!(PipelineKey::all().count(), 12);
    }

    #[test]
    fn missing_lights_stay_dark() {
        let lights = Lights {
            ambient: Some(AmbientLight {
                color: Color::WHITE,
                intensity: 0.5,
            }),
            directional: Some(DirectionalLight {
                color: Color::WHITE,
                intensity: 1.0,
                position: Vec3::new(0.0, 10.0, 0.0),
            }),
            point: None,
        };
        let uniform = GlobalUniform::new(&camera(), &lights, Vec2::new(800.0, 600.0));
        assert_eq!(uniform.ambient, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(uniform.directional_direction, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(uniform.point_color, [0.0; 4]);
        assert_eq!(uniform.viewport[..2], [800.0, 600.0]);
    }

    #[test]
    fn effect_materials_carry_their_code() {
        let glow = Color::hex(0xFF0000);
        let material = Material::effect(Effect::Atmosphere { color: glow }).with_points(2.0, false);
        let uniform = ObjectUniform::new(&material, Mat4::IDENTITY, true);
        assert_eq!(uniform.flags, [SHADING_EFFECT, 4, FLAG_SPRITES, 0]);
        assert_eq!(uniform.effect_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.params[1], 2.0);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniform = ObjectUniform::new(&Material::default(), model, false);
        assert_eq!(uniform.normal[0], [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(uniform.flags[2], FLAG_ATTENUATE);

        let flat = ObjectUniform::new(&Material::default(), Mat4::from_scale(Vec3::ZERO), false);
        assert_eq!(flat.normal[1], [0.0, 1.0, 0.0, 0.0]);
    }

    fn sun() -> Lights {
        Lights {
            point: Some(PointLight {
                color: Color::WHITE,
                intensity: 3.0,
                position: Vec3::ZERO,
                range: 200.0,
            }),
            ..Lights::default()
        }
    }

    #[test]
    fn shadows_follow_the_point_light() {
        let shadow = ShadowUniform::new(&sun());
        assert!(shadow.is_enabled());
        assert_eq!(shadow.params[1], SHADOW_BIAS);
        assert!(!ShadowUniform::new(&Lights::default()).is_enabled());
    }

    #[test]
    fn every_direction_projects_inside_its_face() {
        let faces = point_shadow_faces(Vec3::ZERO, 200.0);
        let offsets = [
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(-6.0, 2.0, 1.0),
            Vec3::new(1.0, 12.0, -3.0),
            Vec3::new(0.5, -4.0, 3.9),
            Vec3::new(2.0, 1.0, 8.0),
            Vec3::new(-3.0, 2.9, -5.0),
            Vec3::new(9.0, 8.9, 8.8),
        ];
        for offset in offsets {
            let face = shadow_face(offset);
            let clip = faces[face] * offset.extend(1.0);
            assert!(clip.w > 0.0, "{offset} behind face {face}");
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() <= 1.0 + 1e-4 && ndc.y.abs() <= 1.0 + 1e-4, "{offset} -> {ndc}");
            assert!(ndc.z > 0.0 && ndc.z < 1.0, "{offset} depth {}", ndc.z);
        }
        assert_eq!(shadow_face(Vec3::NEG_Y), 3);
        assert_eq!(shadow_face(Vec3::Z), 4);
    }

    #[test]
    fn nearer_casters_have_smaller_shadow_depth() {
        let face = point_shadow_faces(Vec3::ZERO, 200.0)[0];
        let depth = |x: f32| {
            let clip = face * Vec3::new(x, 0.0, 0.0).extend(1.0);
            clip.z / clip.w
        };
        assert!(depth(11.2) < depth(12.0));
    }

    #[test]
    fn only_solid_lit_meshes_cast_shadows() {
        assert!(casts_shadow(&Material::lambert(Color::WHITE), false));
        assert!(!casts_shadow(&Material::lambert(Color::WHITE), true));
        assert!(!casts_shadow(&Material::basic(Color::WHITE), false));
        assert!(!casts_shadow(&Material::lambert(Color::WHITE).with_opacity(0.3), false));
    }
}
