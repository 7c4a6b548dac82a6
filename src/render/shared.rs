/// Single shader used by every pipeline. Materials select their path through
/// `object.flags`: x is the shading mode, y the effect code, z the sprite bits.
pub(crate) const SHADER: &str = r#"
struct GlobalUniform {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    camera_position: vec4<f32>,
    viewport: vec4<f32>,
    ambient: vec4<f32>,
    directional_color: vec4<f32>,
    directional_direction: vec4<f32>,
    point_color: vec4<f32>,
    point_position: vec4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    effect_color: vec4<f32>,
    params: vec4<f32>,
    flags: vec4<u32>,
}

struct ShadowUniform {
    faces: array<mat4x4<f32>, 6>,
    params: vec4<f32>,
}

const SHADING_LAMBERT: u32 = 1u;
const SHADING_EFFECT: u32 = 2u;

const EFFECT_STARFIELD: u32 = 1u;
const EFFECT_NEBULA: u32 = 2u;
const EFFECT_CORONA: u32 = 3u;
const EFFECT_ATMOSPHERE: u32 = 4u;
const EFFECT_AURORA: u32 = 5u;

const FLAG_SPRITES: u32 = 1u;
const FLAG_ATTENUATE: u32 = 2u;

@group(0) @binding(0)
var<uniform> globals: GlobalUniform;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;

@group(2) @binding(0)
var base_texture: texture_2d<f32>;
@group(2) @binding(1)
var base_sampler: sampler;

@group(3) @binding(0)
var<uniform> shadow: ShadowUniform;
@group(3) @binding(1)
var shadow_map: texture_depth_2d_array;
@group(3) @binding(2)
var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
    @location(4) size: f32,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) world_pos: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
}

fn is_sprite() -> bool {
    return (object.flags.z & FLAG_SPRITES) != 0u;
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    let world_pos = object.model * vec4<f32>(input.position, 1.0);
    output.world_pos = world_pos.xyz;
    output.uv = input.uv;
    output.color = input.color;

    if is_sprite() {
        output.normal = vec3<f32>(0.0, 0.0, 1.0);
        if input.size <= 0.0 {
            // Outside the clip volume.
            output.position = vec4<f32>(2.0, 2.0, 2.0, 1.0);
            return output;
        }
        var clip = globals.view_proj * world_pos;
        let depth = max(-(globals.view * world_pos).z, 0.001);
        var pixels = object.params.y * input.size;
        if object.flags.x == SHADING_EFFECT && object.flags.y == EFFECT_STARFIELD {
            pixels = input.size * 300.0 / depth;
        } else if (object.flags.z & FLAG_ATTENUATE) != 0u {
            pixels = pixels * globals.viewport.y * 0.5 / depth;
        }
        let corner = vec2<f32>(input.uv.x * 2.0 - 1.0, 1.0 - input.uv.y * 2.0);
        clip = vec4<f32>(clip.xy + corner * pixels / globals.viewport.xy * clip.w, clip.zw);
        output.position = clip;
        return output;
    }

    output.position = globals.view_proj * world_pos;
    output.normal = normalize((object.normal * vec4<f32>(input.normal, 0.0)).xyz);
    return output;
}

// Face order: +X, -X, +Y, -Y, +Z, -Z.
fn shadow_face(offset: vec3<f32>) -> u32 {
    let a = abs(offset);
    if a.x >= a.y && a.x >= a.z {
        return select(1u, 0u, offset.x > 0.0);
    }
    if a.y >= a.z {
        return select(3u, 2u, offset.y > 0.0);
    }
    return select(5u, 4u, offset.z > 0.0);
}

// 1 when the point light reaches `world_pos`, 0 when something blocks it.
fn point_shadow(world_pos: vec3<f32>) -> f32 {
    if shadow.params.x == 0.0 {
        return 1.0;
    }
    let face = shadow_face(world_pos - globals.point_position.xyz);
    let clip = shadow.faces[face] * vec4<f32>(world_pos, 1.0);
    if clip.w <= 0.0 {
        return 1.0;
    }
    let ndc = clip.xyz / clip.w;
    if ndc.z >= 1.0 {
        return 1.0;
    }
    let uv = ndc.xy * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5);
    return textureSampleCompareLevel(shadow_map, shadow_sampler, uv, face, ndc.z - shadow.params.y);
}

fn lambert(normal: vec3<f32>, world_pos: vec3<f32>) -> vec3<f32> {
    var light = globals.ambient.rgb;
    light += globals.directional_color.rgb
        * max(dot(normal, globals.directional_direction.xyz), 0.0);
    if globals.point_color.w > 0.0 {
        let to_light = globals.point_position.xyz - world_pos;
        let distance = length(to_light);
        let range = globals.point_position.w;
        var falloff = 1.0;
        if range > 0.0 {
            falloff = pow(clamp(1.0 - distance / range, 0.0, 1.0), 2.0);
        }
        light += globals.point_color.rgb
            * max(dot(normal, to_light / max(distance, 0.0001)), 0.0)
            * falloff
            * point_shadow(world_pos);
    }
    return light;
}

@fragment
fn fs_main(input: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let time = object.params.z;
    let effect = select(0u, object.flags.y, object.flags.x == SHADING_EFFECT);
    let drift = select(
        vec2<f32>(0.0),
        vec2<f32>(sin(time * 0.1), cos(time * 0.1)) * 0.01,
        effect == EFFECT_NEBULA
    );
    let texel = textureSample(base_texture, base_sampler, input.uv + drift);

    var normal = normalize(input.normal);
    if !front {
        normal = -normal;
    }
    let corner = input.uv * 2.0 - 1.0;
    let radius = length(corner);

    let base = object.color * input.color * texel;
    if is_sprite() && radius > 1.0 {
        discard;
    }
    if base.a < object.params.x {
        discard;
    }

    if object.flags.x == SHADING_LAMBERT {
        return vec4<f32>(base.rgb * lambert(normal, input.world_pos), base.a);
    }
    if object.flags.x != SHADING_EFFECT {
        return base;
    }

    // View-space facing: 1 toward the camera, 0 at the silhouette.
    let facing = (globals.view * vec4<f32>(normalize(input.normal), 0.0)).z;
    var color = base;
    switch effect {
        case EFFECT_STARFIELD: {
            let twinkle = 0.8 + 0.2 * sin(time * 2.0 + input.world_pos.x * 0.01);
            let soft = 1.0 - smoothstep(0.5, 1.0, radius);
            color = vec4<f32>(input.color.rgb, input.color.a * twinkle * soft);
        }
        case EFFECT_NEBULA: {
            color = vec4<f32>(texel.rgb, texel.a * 0.3);
        }
        case EFFECT_CORONA: {
            let pulse = sin(time * 2.0) * 0.3 + 0.7;
            let glow = pow(max(0.5 - facing, 0.0), 2.0) * pulse * 0.6;
            color = vec4<f32>(1.0, 0.6, 0.1, glow);
        }
        case EFFECT_ATMOSPHERE: {
            let pulse = sin(time * 3.0) * 0.1 + 0.9;
            let glow = pow(max(0.7 - facing, 0.0), 2.0) * pulse * 0.4;
            color = vec4<f32>(object.effect_color.rgb, glow * object.effect_color.a);
        }
        case EFFECT_AURORA: {
            let bands = 0.5 + 0.5 * sin(radius * 20.0 - time * 2.0);
            let tint = mix(vec3<f32>(0.2, 1.0, 0.4), vec3<f32>(0.3, 0.6, 1.0), bands);
            color = vec4<f32>(tint, bands * 0.6);
        }
        default: {}
    }
    return color;
}
"#;

/// Depth-only pass rendering shadow casters into one face of the point
/// light's shadow map.
pub(crate) const SHADOW_SHADER: &str = r#"
struct ObjectUniform {
    model: mat4x4<f32>,
    normal: mat3x4<f32>,
    color: vec4<f32>,
    effect_color: vec4<f32>,
    params: vec4<f32>,
    flags: vec4<u32>,
}

@group(0) @binding(0)
var<uniform> face_view_proj: mat4x4<f32>;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;

@vertex
fn vs_shadow(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return face_view_proj * object.model * vec4<f32>(position, 1.0);
}
"#;
