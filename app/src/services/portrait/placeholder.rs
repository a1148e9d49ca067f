// app/src/services/portrait/placeholder.rs

//! Branded stand-in used when no portrait could be generated.
//!
//! The scene is written once as SVG (vertical gradient, soft halo, head-and-shoulders
//! silhouette, brand line) and that markup is rasterized with resvg. The serif face is
//! bundled so the brand text renders the same on every host.

use crate::errors::{AppError, Result as AppResult};
use image::{DynamicImage, RgbaImage};
use resvg::{tiny_skia, usvg};

pub const BRAND_NAME: &str = "Soulsketch";
pub const WIDTH: u32 = 1080;
pub const HEIGHT: u32 = 1920;

const FONT_FAMILY: &str = "DejaVu Serif";
static FONT_DATA: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSerif.ttf");

#[derive(Debug, Clone, Copy)]
struct Palette {
  top: [u8; 3],
  bottom: [u8; 3],
  halo: [u8; 3],
  figure: [u8; 3],
}

fn palette_for(style: &str) -> Palette {
  match style {
    "ethereal" => Palette {
      top: [236, 222, 250],
      bottom: [170, 196, 240],
      halo: [255, 250, 235],
      figure: [96, 86, 140],
    },
    "mystical" => Palette {
      top: [40, 20, 72],
      bottom: [12, 40, 80],
      halo: [220, 180, 255],
      figure: [18, 10, 34],
    },
    "anime" => Palette {
      top: [255, 196, 214],
      bottom: [150, 200, 255],
      halo: [255, 255, 255],
      figure: [70, 60, 110],
    },
    "watercolor" => Palette {
      top: [250, 236, 214],
      bottom: [196, 224, 214],
      halo: [255, 250, 240],
      figure: [110, 100, 96],
    },
    _ => Palette {
      top: [64, 52, 96],
      bottom: [214, 150, 150],
      halo: [255, 226, 196],
      figure: [36, 28, 52],
    },
  }
}

fn hex(c: [u8; 3]) -> String {
  format!("#{:02x}{:02x}{:02x}", c[0], c[1], c[2])
}

fn escape_xml(raw: &str) -> String {
  raw
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

/// SVG markup for the placeholder scene.
pub fn placeholder_svg(style: &str, display_name: &str) -> String {
  let p = palette_for(style);
  let (cx, w, h) = (WIDTH / 2, WIDTH, HEIGHT);
  format!(
    r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
  <defs>
    <linearGradient id="bg" x1="0" y1="0" x2="0" y2="1">
      <stop offset="0%" stop-color="{top}"/>
      <stop offset="100%" stop-color="{bottom}"/>
    </linearGradient>
    <radialGradient id="halo">
      <stop offset="0%" stop-color="{halo}" stop-opacity="0.9"/>
      <stop offset="100%" stop-color="{halo}" stop-opacity="0"/>
    </radialGradient>
  </defs>
  <rect width="100%" height="100%" fill="url(#bg)"/>
  <circle cx="{cx}" cy="760" r="420" fill="url(#halo)"/>
  <circle cx="{cx}" cy="760" r="170" fill="{figure}"/>
  <ellipse cx="{cx}" cy="1240" rx="360" ry="300" fill="{figure}"/>
  <text x="{cx}" y="1660" text-anchor="middle" font-family="{font}" font-size="72" fill="{halo}">{brand}</text>
  <text x="{cx}" y="1750" text-anchor="middle" font-family="{font}" font-size="40" fill="{halo}">A soulmate portrait for {name}</text>
</svg>"##,
    w = w,
    h = h,
    cx = cx,
    top = hex(p.top),
    bottom = hex(p.bottom),
    halo = hex(p.halo),
    figure = hex(p.figure),
    brand = BRAND_NAME,
    font = FONT_FAMILY,
    name = escape_xml(display_name),
  )
}

/// Rasterizes placeholder markup at the size it declares.
pub fn rasterize_svg(svg: &str) -> AppResult<DynamicImage> {
  let mut options = usvg::Options {
    font_family: FONT_FAMILY.to_string(),
    ..usvg::Options::default()
  };
  options.fontdb_mut().load_font_data(FONT_DATA.to_vec());

  let tree = usvg::Tree::from_str(svg, &options)
    .map_err(|e| AppError::Image(format!("Placeholder SVG could not be parsed: {}", e)))?;
  let size = tree.size().to_int_size();
  let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
    .ok_or_else(|| AppError::Image("Placeholder canvas has zero size.".to_string()))?;
  resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

  // The backdrop is opaque, so premultiplied and straight alpha agree.
  let raster = RgbaImage::from_raw(size.width(), size.height(), pixmap.take())
    .ok_or_else(|| AppError::Image("Placeholder pixel buffer has the wrong length.".to_string()))?;
  Ok(DynamicImage::ImageRgba8(raster))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn svg_carries_brand_and_escaped_name() {
    let svg = placeholder_svg("mystical", "Ana & <Bo>");
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains(BRAND_NAME));
    assert!(svg.contains("Ana &amp; &lt;Bo&gt;"));
  }

  fn near(a: [u8; 3], b: [u8; 3]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 12)
  }

  #[test]
  fn raster_is_drawn_from_the_svg() {
    let palette = palette_for("realistic");
    let img = rasterize_svg(&placeholder_svg("realistic", "Ana")).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
    assert_ne!(img.get_pixel(0, 0), img.get_pixel(0, HEIGHT - 1));
    assert!(near(img.get_pixel(WIDTH / 2, 760).0, palette.figure));
    assert!(near(img.get_pixel(0, 0).0, palette.top));
  }

  #[test]
  fn raster_carries_brand_text() {
    let palette = palette_for("mystical");
    let img = rasterize_svg(&placeholder_svg("mystical", "Ana")).unwrap().to_rgb8();
    // Glyph fill uses the halo colour, which the dark gradient never reaches.
    let lettered = (1590..1670)
      .flat_map(|y| (200..WIDTH - 200).map(move |x| (x, y)))
      .filter(|&(x, y)| near(img.get_pixel(x, y).0, palette.halo))
      .count();
    assert!(lettered > 500, "only {} brand-coloured pixels", lettered);
  }

  #[test]
  fn malformed_markup_is_an_error() {
    assert!(matches!(rasterize_svg("<svg"), Err(AppError::Image(_))));
  }
}
