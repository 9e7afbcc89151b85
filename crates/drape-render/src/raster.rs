//! Software rasterizer: surface → RGBA image.
//!
//! Paints the garment template first, then every element in z-order,
//! clipped by the template's alpha so nothing bleeds outside the garment
//! silhouette. Geometry is built as kurbo paths in each element's local
//! space and handed to tiny-skia with the element transform. Text is laid
//! out with ab_glyph and its glyph outlines go through the same path, so
//! there is no offscreen layer to size.

use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, PxScale, ScaleFont};
use drape_core::model::{
    Color, DesignElement, ElementKind, FontStyle, SurfaceSize, TextAlign, TextStyle,
};
use drape_core::surface::SceneSurface;
use image::{Rgba, RgbaImage};
use kurbo::{Affine, BezPath, Circle, PathEl, Rect, RoundedRect, Shape};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, LineJoin, Mask, MaskType, Paint, PathBuilder, Pixmap,
    PixmapPaint, Stroke, Transform,
};

// ─── Configuration ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RasterConfig {
    /// Output pixels per logical surface unit.
    pub pixels_per_unit: f32,
    /// Anti-alias shape and glyph edges.
    pub anti_alias: bool,
    /// Tolerance used when turning circles and rounded corners into
    /// curves, in logical units.
    pub tolerance: f64,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            pixels_per_unit: 2.0,
            anti_alias: true,
            tolerance: 0.1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("could not decode image `{key}`: {source}")]
    Decode {
        key: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image `{key}` has no pixels")]
    EmptyImage { key: String },
    #[error("invalid font data for `{family}`")]
    Font { family: String },
    #[error("cannot allocate a {width}x{height} pixel target")]
    TooLarge { width: u32, height: u32 },
}

// ─── Assets ──────────────────────────────────────────────────────────────

/// Decoded bitmaps keyed by `source_ref` (uploads and garment templates),
/// held premultiplied and ready to draw.
#[derive(Debug, Default)]
pub struct ImageStore {
    images: HashMap<String, Pixmap>,
    generation: u64,
}

impl ImageStore {
    pub fn insert(&mut self, key: impl Into<String>, image: RgbaImage) -> Result<(), RasterError> {
        let key = key.into();
        let Some(pixmap) = to_pixmap(&image) else {
            return Err(RasterError::EmptyImage { key });
        };
        self.images.insert(key, pixmap);
        self.generation += 1;
        Ok(())
    }

    /// Decode PNG or JPEG bytes and store the result.
    pub fn insert_encoded(&mut self, key: &str, bytes: &[u8]) -> Result<(), RasterError> {
        let image = image::load_from_memory(bytes).map_err(|source| RasterError::Decode {
            key: key.to_string(),
            source,
        })?;
        self.insert(key, image.to_rgba8())
    }

    pub fn get(&self, key: &str) -> Option<&Pixmap> {
        self.images.get(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.images.remove(key).is_some();
        if removed {
            self.generation += 1;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Bumped on every change to the stored set.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let pixels = pixmap.pixels();
    RgbaImage::from_fn(width, pixmap.height(), |x, y| {
        let c = pixels[(y * width + x) as usize].demultiply();
        Rgba([c.red(), c.green(), c.blue(), c.alpha()])
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
}

impl FontKey {
    fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.trim().to_ascii_lowercase(),
            bold,
            italic,
        }
    }
}

/// Registered font faces. The first regular face registered is the
/// fallback for unknown families.
#[derive(Default)]
pub struct FontBook {
    faces: HashMap<FontKey, FontArc>,
    fallback: Option<FontArc>,
    generation: u64,
}

impl FontBook {
    /// Register the regular face of a family.
    pub fn register(&mut self, family: &str, bytes: Vec<u8>) -> Result<(), RasterError> {
        self.register_variant(family, false, false, bytes)
    }

    pub fn register_variant(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), RasterError> {
        let font = FontArc::try_from_vec(bytes).map_err(|_| RasterError::Font {
            family: family.to_string(),
        })?;
        if self.fallback.is_none() && !bold && !italic {
            self.fallback = Some(font.clone());
        }
        debug!("registered font `{family}` (bold: {bold}, italic: {italic})");
        self.faces.insert(FontKey::new(family, bold, italic), font);
        self.generation += 1;
        Ok(())
    }

    /// Best face for a style: exact variant, then the family's regular
    /// face, then the fallback.
    pub fn resolve(&self, style: &TextStyle) -> Option<&FontArc> {
        let bold = style.font_weight >= 600;
        let italic = style.font_style == FontStyle::Italic;
        self.faces
            .get(&FontKey::new(&style.font_family, bold, italic))
            .or_else(|| {
                self.faces
                    .get(&FontKey::new(&style.font_family, false, false))
            })
            .or(self.fallback.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ─── Rasterizer ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct Rasterizer {
    config: RasterConfig,
    fonts: FontBook,
    images: ImageStore,
}

impl Rasterizer {
    pub fn new(config: RasterConfig) -> Self {
        Self {
            config,
            fonts: FontBook::default(),
            images: ImageStore::default(),
        }
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageStore {
        &mut self.images
    }

    /// Changes whenever an image or font is added or removed, so cached
    /// rasters can tell that the assets under them moved.
    pub fn asset_generation(&self) -> u64 {
        self.images.generation() + self.fonts.generation()
    }

    /// Output size in pixels for a surface of `size` logical units.
    pub fn pixel_size(&self, size: SurfaceSize) -> (u32, u32) {
        let ppu = self.config.pixels_per_unit.max(0.01);
        (
            ((size.width * ppu).ceil() as u32).max(1),
            ((size.height * ppu).ceil() as u32).max(1),
        )
    }

    /// Paint a whole surface.
    pub fn rasterize(&self, surface: &SceneSurface) -> Result<RgbaImage, RasterError> {
        let (width, height) = self.pixel_size(surface.size());
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RasterError::TooLarge { width, height })?;

        let clip = match surface.template() {
            Some(template) => match self.images.get(&template.source_ref) {
                Some(src) => {
                    let fit = Affine::scale_non_uniform(
                        width as f64 / src.width() as f64,
                        height as f64 / src.height() as f64,
                    );
                    draw_pixmap(&mut pixmap, None, src, fit);
                    Some(Mask::from_pixmap(pixmap.as_ref(), MaskType::Alpha))
                }
                None => {
                    trace!("template `{}` is not loaded", template.source_ref);
                    None
                }
            },
            None => None,
        };

        for element in surface.elements() {
            trace!("raster {} ({})", element.id, element.kind.label());
            self.draw_element(&mut pixmap, clip.as_ref(), element);
        }
        Ok(to_image(&pixmap))
    }

    fn draw_element(&self, pixmap: &mut Pixmap, clip: Option<&Mask>, element: &DesignElement) {
        let to_pixels = self.element_affine(element);
        let tolerance = self.config.tolerance;
        match &element.kind {
            ElementKind::Rect {
                width,
                height,
                corner_radius,
                fill,
            } => {
                let radius = (*corner_radius).min(width / 2.0).min(height / 2.0).max(0.0);
                let rect = Rect::new(0.0, 0.0, *width as f64, *height as f64);
                let local = if radius > 0.0 {
                    RoundedRect::from_rect(rect, radius as f64).to_path(tolerance)
                } else {
                    rect.to_path(tolerance)
                };
                self.fill(pixmap, clip, &local, *fill, to_pixels);
            }
            ElementKind::Circle { radius, fill } => {
                let r = *radius as f64;
                let local = Circle::new((r, r), r).to_path(tolerance);
                self.fill(pixmap, clip, &local, *fill, to_pixels);
            }
            ElementKind::Image {
                width,
                height,
                source_ref,
            } => {
                let Some(src) = self.images.get(source_ref) else {
                    trace!("image `{source_ref}` is not loaded");
                    return;
                };
                let fit = Affine::scale_non_uniform(
                    *width as f64 / src.width() as f64,
                    *height as f64 / src.height() as f64,
                );
                draw_pixmap(pixmap, clip, src, to_pixels * fit);
            }
            ElementKind::Text { content, style } => {
                let Some(font) = self.fonts.resolve(style) else {
                    trace!("no font registered, skipping text {}", element.id);
                    return;
                };
                let mut style = style.clone();
                style.clamp_to_limits();
                let block = layout_text(font, content, &style);
                let Some(path) = block.path.finish() else {
                    return;
                };
                // Center the measured block on the element's box.
                let t = &element.transform;
                let (cx, cy) = element.bounds().center();
                let place = Affine::scale(self.config.pixels_per_unit as f64)
                    * Affine::translate((cx as f64, cy as f64))
                    * Affine::rotate(t.rotation.to_radians() as f64)
                    * Affine::scale_non_uniform(t.scale_x as f64, t.scale_y as f64)
                    * Affine::translate((-block.width as f64 / 2.0, -block.height as f64 / 2.0));
                let transform = skia_transform(place);

                if let Some(stroke) = style.stroke
                    && style.stroke_width > 0.0
                {
                    // Stroked at twice the width, then covered by the fill,
                    // so the outline only grows outward.
                    let outline = Stroke {
                        width: style.stroke_width * 2.0,
                        line_join: LineJoin::Round,
                        ..Stroke::default()
                    };
                    let paint = self.paint(stroke);
                    pixmap.stroke_path(&path, &paint, &outline, transform, clip);
                }
                let paint = self.paint(style.fill);
                pixmap.fill_path(&path, &paint, FillRule::Winding, transform, clip);
            }
        }
    }

    fn fill(
        &self,
        pixmap: &mut Pixmap,
        clip: Option<&Mask>,
        local: &BezPath,
        color: Color,
        to_pixels: Affine,
    ) {
        if color.a == 0 {
            return;
        }
        let Some(path) = skia_path(local) else {
            return;
        };
        let paint = self.paint(color);
        pixmap.fill_path(
            &path,
            &paint,
            FillRule::Winding,
            skia_transform(to_pixels),
            clip,
        );
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = self.config.anti_alias;
        paint
    }

    /// Map an element's intrinsic local space (origin top-left, unscaled)
    /// to output pixels.
    fn element_affine(&self, element: &DesignElement) -> Affine {
        let t = &element.transform;
        let (ew, eh) = element.effective_size();
        let ppu = self.config.pixels_per_unit as f64;
        Affine::scale(ppu)
            * Affine::translate(((t.x + ew / 2.0) as f64, (t.y + eh / 2.0) as f64))
            * Affine::rotate(t.rotation.to_radians() as f64)
            * Affine::translate((-(ew as f64) / 2.0, -(eh as f64) / 2.0))
            * Affine::scale_non_uniform(t.scale_x as f64, t.scale_y as f64)
    }
}

// ─── Paths ───────────────────────────────────────────────────────────────

fn skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Composite `src` through `affine` (source pixels → destination pixels).
fn draw_pixmap(dst: &mut Pixmap, clip: Option<&Mask>, src: &Pixmap, affine: Affine) {
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    dst.draw_pixmap(0, 0, src.as_ref(), &paint, skia_transform(affine), clip);
}

// ─── Text ────────────────────────────────────────────────────────────────

struct LineMetrics<'a> {
    text: &'a str,
    width: f32,
    spaces: usize,
}

/// Glyph outlines and decorations of a text block in unscaled units,
/// origin at the block's top-left.
struct TextBlock {
    path: PathBuilder,
    width: f32,
    height: f32,
}

fn measure_line<F: Font>(font: &F, scale: PxScale, line: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    for ch in line.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            width += scaled.kern(p, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

fn layout_text(font: &FontArc, content: &str, style: &TextStyle) -> TextBlock {
    let scale = PxScale::from(style.font_size);
    let scaled = font.as_scaled(scale);
    let line_h = style.font_size * style.line_height;
    let lines: Vec<LineMetrics> = content
        .split('\n')
        .map(|text| LineMetrics {
            text,
            width: measure_line(font, scale, text),
            spaces: text.chars().filter(|c| *c == ' ').count(),
        })
        .collect();
    let width = lines.iter().map(|l| l.width).fold(0.0, f32::max);
    let height = lines.len() as f32 * line_h;

    let mut path = PathBuilder::new();
    let decoration = style.font_size / 15.0;
    let last = lines.len().saturating_sub(1);

    for (i, line) in lines.iter().enumerate() {
        let slack = width - line.width;
        let (offset, space_extra) = match style.text_align {
            TextAlign::Left => (0.0, 0.0),
            TextAlign::Center => (slack / 2.0, 0.0),
            TextAlign::Right => (slack, 0.0),
            TextAlign::Justify if i < last && line.spaces > 0 => (0.0, slack / line.spaces as f32),
            TextAlign::Justify => (0.0, 0.0),
        };
        let top = i as f32 * line_h;
        // Center the glyph box vertically inside the line box.
        let baseline =
            top + (line_h - (scaled.ascent() - scaled.descent())) / 2.0 + scaled.ascent();

        let mut caret = offset;
        let mut prev: Option<GlyphId> = None;
        for ch in line.text.chars() {
            let id = font.glyph_id(ch);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            if let Some(outline) = font.outline(id) {
                let origin = (caret, baseline);
                let factor = (scaled.h_scale_factor(), scaled.v_scale_factor());
                push_outline(&mut path, &outline.curves, origin, factor);
            }
            caret += scaled.h_advance(id);
            if ch == ' ' {
                caret += space_extra;
            }
            prev = Some(id);
        }

        let line_w = line.width + space_extra * line.spaces as f32;
        let mut band = |y: f32| {
            if let Some(rect) =
                tiny_skia::Rect::from_xywh(offset, y - decoration / 2.0, line_w, decoration)
            {
                path.push_rect(rect);
            }
        };
        if style.underline {
            band(baseline + style.font_size * 0.1);
        }
        if style.strikethrough {
            band(baseline - scaled.ascent() * 0.3);
        }
        if style.overline {
            band(baseline - scaled.ascent());
        }
    }
    TextBlock {
        path,
        width,
        height,
    }
}

/// Append a glyph outline. Font units are y-up; the block is y-down.
fn push_outline(
    path: &mut PathBuilder,
    curves: &[OutlineCurve],
    (x, baseline): (f32, f32),
    (h, v): (f32, f32),
) {
    let map = |p: ab_glyph::Point| (x + p.x * h, baseline - p.y * v);
    let mut last: Option<ab_glyph::Point> = None;
    for curve in curves {
        let (start, end) = match curve {
            OutlineCurve::Line(p0, p1) => (*p0, *p1),
            OutlineCurve::Quad(p0, _, p2) => (*p0, *p2),
            OutlineCurve::Cubic(p0, _, _, p3) => (*p0, *p3),
        };
        if last != Some(start) {
            if last.is_some() {
                path.close();
            }
            let (sx, sy) = map(start);
            path.move_to(sx, sy);
        }
        match curve {
            OutlineCurve::Line(_, p1) => {
                let (ex, ey) = map(*p1);
                path.line_to(ex, ey);
            }
            OutlineCurve::Quad(_, c, p2) => {
                let (cx, cy) = map(*c);
                let (ex, ey) = map(*p2);
                path.quad_to(cx, cy, ex, ey);
            }
            OutlineCurve::Cubic(_, c1, c2, p3) => {
                let (ax, ay) = map(*c1);
                let (bx, by) = map(*c2);
                let (ex, ey) = map(*p3);
                path.cubic_to(ax, ay, bx, by, ex, ey);
            }
        }
        last = Some(end);
    }
    if last.is_some() {
        path.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drape_core::ElementDefaults;
    use drape_core::model::{SurfaceSide, TemplateImage};
    use drape_core::surface::ElementSpec;
    use pretty_assertions::assert_eq;

    const DEJAVU: &[u8] = include_bytes!("../tests/fixtures/DejaVuSans.ttf");

    fn small_surface() -> SceneSurface {
        SceneSurface::new(
            SurfaceSide::Front,
            SurfaceSize {
                width: 100.0,
                height: 100.0,
            },
        )
    }

    fn unit_rasterizer() -> Rasterizer {
        Rasterizer::new(RasterConfig {
            pixels_per_unit: 1.0,
            ..RasterConfig::default()
        })
    }

    fn with_font() -> Rasterizer {
        let mut r = unit_rasterizer();
        r.fonts_mut().register("DejaVu Sans", DEJAVU.to_vec()).unwrap();
        r
    }

    fn red_rect(w: f32, h: f32) -> ElementSpec {
        ElementSpec::new(ElementKind::Rect {
            width: w,
            height: h,
            corner_radius: 0.0,
            fill: Color::rgb(255, 0, 0),
        })
    }

    fn inked(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p[3] > 0).count()
    }

    #[test]
    fn empty_surface_is_transparent() {
        let img = unit_rasterizer().rasterize(&small_surface()).unwrap();
        assert_eq!(img.dimensions(), (100, 100));
        assert!(img.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn rect_fills_its_box() {
        let mut s = small_surface();
        s.add_element(red_rect(40.0, 20.0));
        let img = unit_rasterizer().rasterize(&s).unwrap();
        // Centered: x 30..70, y 40..60.
        assert_eq!(*img.get_pixel(50, 50), Rgba([255, 0, 0, 255]));
        assert_eq!(*img.get_pixel(31, 41), Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(28, 50)[3], 0);
        assert_eq!(img.get_pixel(50, 61)[3], 0);
    }

    #[test]
    fn pixels_per_unit_scales_output() {
        let r = Rasterizer::new(RasterConfig {
            pixels_per_unit: 3.0,
            ..RasterConfig::default()
        });
        assert_eq!(r.pixel_size(SurfaceSize::DEFAULT), (1500, 1800));
    }

    #[test]
    fn rotated_rect_leaves_corners_empty() {
        let mut s = small_surface();
        let id = s.add_element(red_rect(40.0, 40.0).rotated(45.0));
        assert!(s.get(id).is_some());
        let img = unit_rasterizer().rasterize(&s).unwrap();
        assert_eq!(img.get_pixel(50, 50)[3], 255);
        // Corner of the unrotated box (30, 30) is outside the diamond.
        assert_eq!(img.get_pixel(31, 31)[3], 0);
    }

    #[test]
    fn circle_is_round() {
        let mut s = small_surface();
        s.add_element(ElementSpec::new(ElementKind::Circle {
            radius: 20.0,
            fill: Color::BLACK,
        }));
        let img = unit_rasterizer().rasterize(&s).unwrap();
        assert_eq!(img.get_pixel(50, 50)[3], 255);
        assert_eq!(img.get_pixel(31, 31)[3], 0);
    }

    #[test]
    fn template_alpha_clips_elements() {
        let mut r = unit_rasterizer();
        // Opaque white on the left half only.
        let mut template = RgbaImage::new(100, 100);
        for (x, _, p) in template.enumerate_pixels_mut() {
            if x < 50 {
                *p = Rgba([255, 255, 255, 255]);
            }
        }
        r.images_mut().insert("tee", template).unwrap();

        let mut s = small_surface();
        s.set_template(Some(TemplateImage::new("tee")));
        s.add_element(red_rect(100.0, 100.0));
        let img = r.rasterize(&s).unwrap();
        assert_eq!(*img.get_pixel(10, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(90, 10)[3], 0);
    }

    #[test]
    fn missing_assets_are_skipped() {
        let mut s = small_surface();
        s.set_template(Some(TemplateImage::new("missing-template")));
        s.add_element(ElementSpec::image("missing-upload", 20.0, 20.0));
        s.add_element(ElementSpec::text(&ElementDefaults::default(), Some("Hi")));
        let img = unit_rasterizer().rasterize(&s).unwrap();
        assert!(img.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn uploaded_image_is_drawn() {
        let mut r = unit_rasterizer();
        r.images_mut()
            .insert("logo", RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255])))
            .unwrap();
        let mut s = small_surface();
        s.add_element(ElementSpec::image("logo", 20.0, 20.0));
        let img = r.rasterize(&s).unwrap();
        assert_eq!(*img.get_pixel(50, 50), Rgba([0, 0, 255, 255]));
        assert_eq!(img.get_pixel(35, 50)[3], 0);
    }

    #[test]
    fn empty_image_is_rejected() {
        let mut store = ImageStore::default();
        assert!(matches!(
            store.insert("blank", RgbaImage::new(0, 0)),
            Err(RasterError::EmptyImage { .. })
        ));
        assert!(store.is_empty());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn asset_changes_bump_the_generation() {
        let mut r = unit_rasterizer();
        let start = r.asset_generation();
        r.images_mut()
            .insert("logo", RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])))
            .unwrap();
        let after_image = r.asset_generation();
        assert!(after_image > start);
        r.fonts_mut().register("DejaVu Sans", DEJAVU.to_vec()).unwrap();
        assert!(r.asset_generation() > after_image);
        assert!(r.images_mut().remove("logo"));
        assert!(!r.images_mut().remove("logo"));
    }

    #[test]
    fn bad_font_bytes_are_rejected() {
        let mut book = FontBook::default();
        assert!(book.register("Nope", vec![0, 1, 2, 3]).is_err());
        assert!(book.is_empty());
        assert_eq!(book.generation(), 0);
    }

    #[test]
    fn text_is_drawn_with_the_fallback_face() {
        let mut s = small_surface();
        s.add_element(ElementSpec::text(&ElementDefaults::default(), Some("Hi")));
        let img = with_font().rasterize(&s).unwrap();
        assert!(inked(&img) > 0);
    }

    #[test]
    fn text_stroke_adds_ink() {
        let plain = ElementSpec::text(&ElementDefaults::default(), Some("Hi"));
        let mut outlined = plain.clone();
        if let ElementKind::Text { style, .. } = &mut outlined.kind {
            style.stroke = Some(Color::rgb(255, 0, 0));
            style.stroke_width = 2.0;
        }
        let r = with_font();
        let mut a = small_surface();
        a.add_element(plain);
        let mut b = small_surface();
        b.add_element(outlined);
        assert!(inked(&r.rasterize(&b).unwrap()) > inked(&r.rasterize(&a).unwrap()));
    }

    #[test]
    fn huge_text_renders_without_a_layer() {
        let mut spec = ElementSpec::text(&ElementDefaults::default(), Some("I"));
        if let ElementKind::Text { style, .. } = &mut spec.kind {
            style.font_size = 1e30;
            style.stroke = Some(Color::BLACK);
            style.stroke_width = 1e30;
        }
        let mut s = small_surface();
        s.add_element(spec);
        let img = with_font().rasterize(&s).unwrap();
        assert_eq!(img.dimensions(), (100, 100));
        // The stem of a 1000-unit "I" covers the middle of the surface.
        assert_eq!(img.get_pixel(50, 50)[3], 255);
    }

    #[test]
    fn oversized_target_is_an_error() {
        let r = Rasterizer::new(RasterConfig {
            pixels_per_unit: 1e6,
            ..RasterConfig::default()
        });
        assert!(matches!(
            r.rasterize(&small_surface()),
            Err(RasterError::TooLarge { .. })
        ));
    }
}
