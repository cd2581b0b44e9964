//! Scene rendering with the image crate.
//!
//! Draws each object as a small colored glyph on a white 128x128 canvas,
//! with the view spanning the unit square plus a margin so markers near the
//! edges are not clipped.

use std::path::Path;

use anyhow::{bail, Context, Result};
use image::{Rgb, RgbImage};

use crate::scene::Scene;

/// Rendered image side length in pixels.
pub const IMAGE_SIZE: u32 = 128;

/// View margin around the unit square, in scene units.
pub const VIEW_MARGIN: f64 = 0.1;

/// Glyph half-extent in pixels.
const GLYPH_RADIUS: i32 = 4;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Render a scene to a 128x128 RGB image.
///
/// Fails on a color or marker name outside the canonical sets, which only
/// happens for hand-edited state files.
pub fn render_scene(scene: &Scene) -> Result<RgbImage> {
    let mut img = RgbImage::from_pixel(IMAGE_SIZE, IMAGE_SIZE, BACKGROUND);

    for obj in &scene.objects {
        let rgb = color_rgb(&obj.c)
            .with_context(|| format!("unknown color name: {}", obj.c))?;
        let (cx, cy) = to_pixel(obj.p);
        stamp_marker(&mut img, &obj.m, cx, cy, rgb)?;
    }

    Ok(img)
}

/// Render and write a scene as a PNG in one step.
pub fn save_scene_png(scene: &Scene, path: &Path) -> Result<()> {
    let img = render_scene(scene)?;
    img.save(path)
        .with_context(|| format!("Failed to save image: {}", path.display()))?;
    Ok(())
}

/// Map a scene position to pixel coordinates. The y axis flips because scene
/// coordinates grow upward while image rows grow downward.
fn to_pixel(p: [f64; 2]) -> (i32, i32) {
    let span = 1.0 + 2.0 * VIEW_MARGIN;
    let x = (p[0] + VIEW_MARGIN) / span * IMAGE_SIZE as f64;
    let y = (1.0 + VIEW_MARGIN - p[1]) / span * IMAGE_SIZE as f64;
    (x as i32, y as i32)
}

fn color_rgb(name: &str) -> Option<Rgb<u8>> {
    let rgb = match name {
        "blue" => [0, 0, 255],
        "green" => [0, 128, 0],
        "red" => [255, 0, 0],
        "cyan" => [0, 255, 255],
        "magenta" => [255, 0, 255],
        "yellow" => [255, 255, 0],
        "black" => [0, 0, 0],
        "gray" => [128, 128, 128],
        _ => return None,
    };
    Some(Rgb(rgb))
}

/// Stamp one marker glyph centered on (cx, cy), clipping at the borders.
fn stamp_marker(img: &mut RgbImage, marker: &str, cx: i32, cy: i32, rgb: Rgb<u8>) -> Result<()> {
    for dy in -GLYPH_RADIUS..=GLYPH_RADIUS {
        for dx in -GLYPH_RADIUS..=GLYPH_RADIUS {
            if !marker_hit(marker, dx, dy)? {
                continue;
            }
            let x = cx + dx;
            let y = cy + dy;
            if x < 0 || y < 0 || x >= IMAGE_SIZE as i32 || y >= IMAGE_SIZE as i32 {
                continue;
            }
            img.put_pixel(x as u32, y as u32, rgb);
        }
    }
    Ok(())
}

/// Whether the pixel at glyph-local offset (dx, dy) belongs to the marker.
/// dy grows downward, so `v` (a downward-pointing triangle) narrows as dy
/// increases.
fn marker_hit(marker: &str, dx: i32, dy: i32) -> Result<bool> {
    let r = GLYPH_RADIUS;
    let hit = match marker {
        "o" => dx * dx + dy * dy <= r * r,
        "v" => 2 * dx.abs() <= r - dy,
        "^" => 2 * dx.abs() <= r + dy,
        "<" => 2 * dy.abs() <= r + dx,
        ">" => 2 * dy.abs() <= r - dx,
        "s" => dx.abs() <= r - 1 && dy.abs() <= r - 1,
        "P" => dx.abs() <= 1 || dy.abs() <= 1,
        "X" => (dx - dy).abs() <= 2 || (dx + dy).abs() <= 2,
        _ => bail!("unknown marker code: {}", marker),
    };
    Ok(hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Object;

    fn one_object_scene(p: [f64; 2], c: &str, m: &str) -> Scene {
        Scene {
            objects: vec![Object {
                p,
                c: c.to_string(),
                m: m.to_string(),
            }],
        }
    }

    #[test]
    fn test_image_dimensions_and_background() {
        let img = render_scene(&one_object_scene([0.5, 0.5], "red", "o")).unwrap();
        assert_eq!(img.dimensions(), (IMAGE_SIZE, IMAGE_SIZE));
        assert_eq!(*img.get_pixel(0, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_object_is_drawn_in_its_color() {
        let img = render_scene(&one_object_scene([0.5, 0.5], "red", "o")).unwrap();
        let (cx, cy) = to_pixel([0.5, 0.5]);
        assert_eq!(*img.get_pixel(cx as u32, cy as u32), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_y_axis_points_up() {
        // An object near y=1 lands in the upper image rows.
        let (_, y_high) = to_pixel([0.5, 0.9]);
        let (_, y_low) = to_pixel([0.5, 0.1]);
        assert!(y_high < y_low);
    }

    #[test]
    fn test_every_marker_covers_its_center() {
        for marker in crate::scene::MARKERS {
            assert!(marker_hit(marker, 0, 0).unwrap(), "marker {}", marker);
        }
    }

    #[test]
    fn test_edge_objects_do_not_panic() {
        let img = render_scene(&one_object_scene([0.0, 0.0], "black", "X")).unwrap();
        assert_eq!(img.dimensions(), (IMAGE_SIZE, IMAGE_SIZE));
    }

    #[test]
    fn test_unknown_color_is_an_error() {
        assert!(render_scene(&one_object_scene([0.5, 0.5], "mauve", "o")).is_err());
    }
}
