//! Procedurally painted surfaces for the solar system.
//!
//! Every painter draws its random choices from the scene's generator, so a
//! fixed seed yields identical images.

use crate::color::Color;
use crate::random::SeededRandom;
use crate::texture::{Canvas, RadialGradient};

const SURFACE: f32 = 512.0;

fn surface() -> Canvas {
    Canvas::new(SURFACE as u32, SURFACE as u32)
}

/// Two large color clouds plus scattered dust, scaled to `size` pixels.
pub fn nebula(rng: &mut SeededRandom, size: u32) -> Canvas {
    let size = size.max(16);
    let s = size as f32 / 1024.0;
    let mut canvas = Canvas::new(size, size);
    canvas.fill(
        RadialGradient::new(200.0 * s, 200.0 * s, 400.0 * s)
            .stop(0.0, Color::rgba8(255.0, 100.0, 255.0, 0.8))
            .stop(0.5, Color::rgba8(100.0, 150.0, 255.0, 0.4))
            .stop(1.0, Color::TRANSPARENT),
    );
    canvas.fill(
        RadialGradient::new(800.0 * s, 800.0 * s, 300.0 * s)
            .stop(0.0, Color::rgba8(255.0, 200.0, 100.0, 0.6))
            .stop(0.5, Color::rgba8(255.0, 100.0, 150.0, 0.3))
            .stop(1.0, Color::TRANSPARENT),
    );
    for _ in 0..200 {
        let x = rng.next_f32() * size as f32;
        let y = rng.next_f32() * size as f32;
        let radius = (rng.next_f32() * 30.0 + 5.0) * s;
        let dust = RadialGradient::new(x, y, radius)
            .stop(0.0, Color::rgba8(200.0, 200.0, 255.0, 0.3))
            .stop(1.0, Color::TRANSPARENT);
        canvas.fill_circle(x, y, radius, dust);
    }
    canvas
}

pub fn sun(rng: &mut SeededRandom) -> Canvas {
    let mut canvas = surface();
    canvas.fill(
        RadialGradient::new(256.0, 256.0, 256.0)
            .stop(0.0, Color::hex(0xFFD700))
            .stop(0.3, Color::hex(0xFFA500))
            .stop(0.6, Color::hex(0xFF6347))
            .stop(1.0, Color::hex(0xFF4500)),
    );
    for _ in 0..20 {
        let x = rng.next_f32() * SURFACE;
        let y = rng.next_f32() * SURFACE;
        let radius = rng.next_f32() * 30.0 + 10.0;
        let spot = RadialGradient::new(x, y, radius)
            .stop(0.0, Color::hex(0x8B0000))
            .stop(1.0, Color::TRANSPARENT);
        canvas.fill_circle(x, y, radius, spot);
    }
    canvas
}

/// Base color with a hundred blotches whose tint varies with `roughness`.
pub fn speckled(rng: &mut SeededRandom, base: u32, roughness: f32) -> Canvas {
    let r = ((base >> 16) & 0xFF) as f32;
    let g = ((base >> 8) & 0xFF) as f32;
    let b = (base & 0xFF) as f32;
    let mut canvas = surface();
    canvas.fill(Color::hex(base));
    for _ in 0..100 {
        let variation = rng.next_f32() * roughness * 100.0;
        let tint = Color::rgba8(
            r + rng.spread(0.5) * variation,
            g + rng.spread(0.5) * variation,
            b + rng.spread(0.5) * variation,
            1.0,
        );
        let x = rng.next_f32() * SURFACE;
        let y = rng.next_f32() * SURFACE;
        let radius = rng.next_f32() * 50.0 + 10.0;
        canvas.fill_circle(x, y, radius, tint);
    }
    canvas
}

pub fn earth(rng: &mut SeededRandom) -> Canvas {
    let mut canvas = surface();
    canvas.fill(Color::hex(0x1E90FF));
    let land = Color::hex(0x228B22);
    for _ in 0..15 {
        let (x, y) = (rng.next_f32() * SURFACE, rng.next_f32() * SURFACE);
        canvas.fill_circle(x, y, rng.next_f32() * 80.0 + 30.0, land);
    }
    let cloud = Color::WHITE.with_alpha(0.3);
    for _ in 0..30 {
        let (x, y) = (rng.next_f32() * SURFACE, rng.next_f32() * SURFACE);
        canvas.fill_circle(x, y, rng.next_f32() * 40.0 + 20.0, cloud);
    }
    canvas
}

pub fn mars(rng: &mut SeededRandom) -> Canvas {
    let mut canvas = surface();
    canvas.fill(Color::hex(0xCD5C5C));
    let ice = Color::hex(0xFFFAFA);
    canvas.fill_circle(256.0, 50.0, 80.0, ice);
    canvas.fill_circle(256.0, 462.0, 60.0, ice);
    let crater = Color::hex(0x8B4513);
    for _ in 0..20 {
        let (x, y) = (rng.next_f32() * SURFACE, rng.next_f32() * SURFACE);
        canvas.fill_circle(x, y, rng.next_f32() * 30.0 + 10.0, crater);
    }
    canvas
}

pub fn jupiter() -> Canvas {
    let mut canvas = surface();
    let bands = [0xD2B48C, 0xDAA520, 0xB8860B, 0xDAB855];
    let band_height = SURFACE / bands.len() as f32;
    for (index, band) in bands.into_iter().enumerate() {
        canvas.fill_rect(
            0.0,
            index as f32 * band_height,
            SURFACE,
            band_height,
            Color::hex(band),
        );
    }
    // Great red spot.
    canvas.fill_ellipse(300.0, 300.0, 50.0, 30.0, Color::hex(0xDC143C));
    canvas
}

pub fn saturn() -> Canvas {
    let mut canvas = surface();
    canvas.fill(Color::hex(0xFAD5A5));
    let band = Color::rgba8(218.0, 165.0, 32.0, 0.3);
    for y in (0..SURFACE as u32).step_by(30) {
        canvas.fill_rect(0.0, y as f32, SURFACE, 15.0, band);
    }
    canvas
}

pub fn saturn_rings() -> Canvas {
    let mut canvas = surface();
    canvas.fill(
        RadialGradient::new(256.0, 256.0, 256.0)
            .stop(0.0, Color::TRANSPARENT)
            .stop(0.3, Color::hex(0xC4A57B))
            .stop(0.5, Color::hex(0xDEB887))
            .stop(0.7, Color::hex(0xC4A57B))
            .stop(0.9, Color::hex(0x8B7355))
            .stop(1.0, Color::TRANSPARENT),
    );
    canvas
}

pub fn moon(rng: &mut SeededRandom) -> Canvas {
    let mut canvas = Canvas::new(256, 256);
    canvas.fill(Color::hex(0xCCCCCC));
    for _ in 0..30 {
        let x = rng.next_f32() * 256.0;
        let y = rng.next_f32() * 256.0;
        let radius = rng.next_f32() * 20.0 + 5.0;
        canvas.fill_circle(x, y, radius, Color::hex(0x999999));
        canvas.fill_circle(x, y, radius * 0.3, Color::hex(0x777777));
    }
    let mare = Color::rgba8(120.0, 120.0, 120.0, 0.7);
    for _ in 0..5 {
        let (x, y) = (rng.next_f32() * 256.0, rng.next_f32() * 256.0);
        canvas.fill_circle(x, y, rng.next_f32() * 40.0 + 20.0, mare);
    }
    canvas
}

pub fn comet(rng: &mut SeededRandom) -> Canvas {
    let mut canvas = Canvas::new(128, 128);
    canvas.fill(Color::hex(0x555555));
    for _ in 0..20 {
        let shade = rng.next_f32() * 100.0 + 50.0;
        let (x, y) = (rng.next_f32() * 128.0, rng.next_f32() * 128.0);
        let radius = rng.next_f32() * 10.0 + 2.0;
        canvas.fill_circle(x, y, radius, Color::rgba8(shade, shade, shade, 1.0));
    }
    canvas
}

/// Soft round sprite for point clouds.
pub fn round_sprite() -> Canvas {
    let mut canvas = Canvas::new(64, 64);
    canvas.fill(
        RadialGradient::new(32.0, 32.0, 32.0)
            .stop(0.0, Color::WHITE)
            .stop(0.7, Color::WHITE.with_alpha(0.8))
            .stop(1.0, Color::TRANSPARENT),
    );
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_paints_same_sun() {
        let a = sun(&mut SeededRandom::new(11)).into_image();
        let b = sun(&mut SeededRandom::new(11)).into_image();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn mars_has_polar_caps() {
        let canvas = mars(&mut SeededRandom::new(3));
        // Cap or crater, never bare surface.
        assert_ne!(canvas.pixel(256, 0), [0xCD, 0x5C, 0x5C, 255]);
    }

    #[test]
    fn jupiter_bands_are_stacked() {
        let canvas = jupiter();
        assert_eq!(canvas.pixel(10, 10), [0xD2, 0xB4, 0x8C, 255]);
        assert_eq!(canvas.pixel(10, 500), [0xDA, 0xB8, 0x55, 255]);
        assert_eq!(canvas.pixel(300, 300), [0xDC, 0x14, 0x3C, 255]);
    }

    #[test]
    fn rings_are_hollow_and_fade_out() {
        let canvas = saturn_rings();
        assert!(canvas.pixel(256, 256)[3] < 10);
        assert_eq!(canvas.pixel(0, 0)[3], 0);
        assert_eq!(canvas.pixel(256 + 128, 256)[3], 255);
    }

    #[test]
    fn nebula_scales_with_size() {
        let canvas = nebula(&mut SeededRandom::new(5), 64);
        assert_eq!((canvas.width(), canvas.height()), (64, 64));
        assert!(canvas.pixel(12, 12)[3] > 0);
    }
}
