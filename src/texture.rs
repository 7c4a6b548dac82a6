//! Procedural texture painting.
//!
//! A [`Canvas`] is a small 2D painter over an `image::RgbaImage` with the
//! handful of primitives the scenes need: rectangles, circles, ellipses and
//! radial gradients, composited source-over.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};

use crate::color::Color;

/// A radial gradient centered at `(cx, cy)` reaching `radius` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    stops: Vec<(f32, Color)>,
}

impl RadialGradient {
    pub fn new(cx: f32, cy: f32, radius: f32) -> Self {
        Self {
            cx,
            cy,
            radius,
            stops: Vec::new(),
        }
    }

    /// Adds a color stop; offsets are clamped to `[0, 1]` and kept sorted.
    pub fn stop(mut self, offset: f32, color: Color) -> Self {
        let offset = offset.clamp(0.0, 1.0);
        let index = self
            .stops
            .iter()
            .position(|(existing, _)| *existing > offset)
            .unwrap_or(self.stops.len());
        self.stops.insert(index, (offset, color));
        self
    }

    /// Color at a pixel position. Interpolation happens in premultiplied
    /// alpha so fading to `TRANSPARENT` does not darken the color.
    pub fn sample(&self, x: f32, y: f32) -> Color {
        let Some(&(first_offset, first)) = self.stops.first() else {
            return Color::TRANSPARENT;
        };
        let distance = ((x - self.cx).powi(2) + (y - self.cy).powi(2)).sqrt();
        let t = if self.radius > 0.0 {
            (distance / self.radius).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if t <= first_offset {
            return first;
        }
        for pair in self.stops.windows(2) {
            let (o0, c0) = pair[0];
            let (o1, c1) = pair[1];
            if t <= o1 {
                let span = o1 - o0;
                let local = if span > 0.0 { (t - o0) / span } else { 1.0 };
                return lerp_premultiplied(c0, c1, local);
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}

fn lerp_premultiplied(a: Color, b: Color, t: f32) -> Color {
    let alpha = a.a + (b.a - a.a) * t;
    if alpha <= f32::EPSILON {
        return Color::TRANSPARENT;
    }
    let channel = |ca: f32, cb: f32| (ca * a.a + (cb * b.a - ca * a.a) * t) / alpha;
    Color::new(channel(a.r, b.r), channel(a.g, b.g), channel(a.b, b.b), alpha)
}

/// What a shape is filled with.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Radial(RadialGradient),
}

impl Paint {
    fn at(&self, x: f32, y: f32) -> Color {
        match self {
            Paint::Solid(color) => *color,
            Paint::Radial(gradient) => gradient.sample(x, y),
        }
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Solid(color)
    }
}

impl From<RadialGradient> for Paint {
    fn from(gradient: RadialGradient) -> Self {
        Paint::Radial(gradient)
    }
}

#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// A fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn fill(&mut self, paint: impl Into<Paint>) {
        let (w, h) = (self.width() as f32, self.height() as f32);
        self.fill_rect(0.0, 0.0, w, h, paint);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, paint: impl Into<Paint>) {
        let paint = paint.into();
        self.paint_region(x, y, x + w, y + h, &paint, |_, _| true);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, paint: impl Into<Paint>) {
        self.fill_ellipse(cx, cy, radius, radius, paint);
    }

    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, paint: impl Into<Paint>) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let paint = paint.into();
        self.paint_region(cx - rx, cy - ry, cx + rx, cy + ry, &paint, |px, py| {
            let dx = (px - cx) / rx;
            let dy = (py - cy) / ry;
            dx * dx + dy * dy <= 1.0
        });
    }

    /// Composites `paint` over every pixel whose center lies in the box and
    /// satisfies `inside`.
    fn paint_region(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        paint: &Paint,
        inside: impl Fn(f32, f32) -> bool,
    ) {
        let (w, h) = (self.width() as f32, self.height() as f32);
        let first_x = (x0 - 0.5).ceil().clamp(0.0, w) as u32;
        let first_y = (y0 - 0.5).ceil().clamp(0.0, h) as u32;
        let end_x = (x1 - 0.5).ceil().clamp(0.0, w) as u32;
        let end_y = (y1 - 0.5).ceil().clamp(0.0, h) as u32;
        for py in first_y..end_y {
            for px in first_x..end_x {
                let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
                if !inside(cx, cy) {
                    continue;
                }
                let source = paint.at(cx, cy);
                if source.a <= 0.0 {
                    continue;
                }
                let pixel = self.image.get_pixel_mut(px, py);
                *pixel = source_over(source, *pixel);
            }
        }
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

fn source_over(source: Color, dest: Rgba<u8>) -> Rgba<u8> {
    let [dr, dg, db, da] = dest.0.map(|c| c as f32 / 255.0);
    let out_a = source.a + da * (1.0 - source.a);
    if out_a <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |s: f32, d: f32| (s * source.a + d * da * (1.0 - source.a)) / out_a;
    Rgba(Color::new(mix(source.r, dr), mix(source.g, dg), mix(source.b, db), out_a).to_rgba8())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(usize);

#[derive(Debug, Clone)]
pub struct NamedTexture {
    pub name: String,
    pub image: RgbaImage,
}

/// Owns every texture painted while building a scene.
#[derive(Debug, Default)]
pub struct TextureStore {
    textures: Vec<NamedTexture>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, canvas: Canvas) -> TextureId {
        self.textures.push(NamedTexture {
            name: name.into(),
            image: canvas.into_image(),
        });
        TextureId(self.textures.len() - 1)
    }

    pub fn get(&self, id: TextureId) -> Option<&NamedTexture> {
        self.textures.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureId, &NamedTexture)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(index, texture)| (TextureId(index), texture))
    }

    /// Writes every texture as `<name>.png` into `dir`, creating it if needed.
    pub fn export_png(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("unable to create {}", dir.display()))?;
        let mut written = Vec::with_capacity(self.textures.len());
        for texture in &self.textures {
            let path = dir.join(format!("{}.png", texture.name));
            texture
                .image
                .save(&path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            written.push(path);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_fill_covers_canvas() {
        let mut canvas = Canvas::new(8, 8);
        canvas.fill(Color::hex(0x1E90FF));
        assert_eq!(canvas.pixel(0, 0), [0x1E, 0x90, 0xFF, 255]);
        assert_eq!(canvas.pixel(7, 7), [0x1E, 0x90, 0xFF, 255]);
    }

    #[test]
    fn circle_only_touches_inside_pixels() {
        let mut canvas = Canvas::new(32, 32);
        canvas.fill_circle(16.0, 16.0, 4.0, Color::WHITE);
        assert_eq!(canvas.pixel(16, 16)[3], 255);
        assert_eq!(canvas.pixel(0, 0)[3], 0);
        assert_eq!(canvas.pixel(16, 25)[3], 0);
    }

    #[test]
    fn gradient_pads_with_last_stop() {
        let gradient = RadialGradient::new(0.0, 0.0, 10.0)
            .stop(1.0, Color::hex(0x0000FF))
            .stop(0.0, Color::hex(0xFF0000));
        assert_eq!(gradient.sample(0.0, 0.0).to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(gradient.sample(50.0, 0.0).to_rgba8(), [0, 0, 255, 255]);
    }

    #[test]
    fn fading_to_transparent_keeps_hue() {
        let gradient = RadialGradient::new(0.0, 0.0, 10.0)
            .stop(0.0, Color::rgba8(255.0, 200.0, 100.0, 1.0))
            .stop(1.0, Color::TRANSPARENT);
        let mid = gradient.sample(5.0, 0.0);
        assert!((mid.a - 0.5).abs() < 1e-5);
        assert_eq!(mid.with_alpha(1.0).to_rgba8(), [255, 200, 100, 255]);
    }

    #[test]
    fn translucent_paint_blends_over_background() {
        let mut canvas = Canvas::new(2, 2);
        canvas.fill(Color::BLACK);
        canvas.fill(Color::WHITE.with_alpha(0.5));
        let [r, g, b, a] = canvas.pixel(1, 1);
        assert_eq!(a, 255);
        assert!((127..=128).contains(&r) && r == g && g == b);
    }

    #[test]
    fn export_writes_png_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TextureStore::new();
        let mut canvas = Canvas::new(4, 4);
        canvas.fill(Color::hex(0xCD5C5C));
        store.insert("mars", canvas);
        let written = store.export_png(dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        let loaded = image::open(&written[0]).unwrap().to_rgba8();
        assert_eq!(loaded.get_pixel(2, 2).0, [0xCD, 0x5C, 0x5C, 255]);
    }
}
