//! Canvas2D renderer for the editable surface.
//!
//! Draws one surface to an HTML `<canvas>` via `CanvasRenderingContext2d`:
//! elements in z-order, then the selection overlay, snap guides, and the
//! marquee. The garment template is drawn by the page underneath the
//! canvas, so the background here stays transparent.

use drape_core::model::{
    Bounds, DesignElement, ElementKind, FontStyle, SurfaceSize, TextAlign, TextStyle,
};
use drape_core::snap::{GuideAxis, GuideLine};
use drape_core::surface::{SceneSurface, Selection};
use drape_render::hit::element_corners;
use web_sys::CanvasRenderingContext2d;

const ACCENT: &str = "#4FC3F7";
const GUIDE: &str = "#FF2D95";

/// Everything the overlay needs beyond the surface itself.
pub struct Overlay<'a> {
    pub guides: &'a [GuideLine],
    pub marquee: Option<Bounds>,
    pub editing: bool,
}

/// Render a surface at `zoom` canvas pixels per logical unit.
pub fn render_surface(
    ctx: &CanvasRenderingContext2d,
    surface: &SceneSurface,
    zoom: f64,
    overlay: &Overlay<'_>,
) {
    let size = surface.size();
    ctx.save();
    let _ = ctx.set_transform(zoom, 0.0, 0.0, zoom, 0.0, 0.0);
    ctx.clear_rect(0.0, 0.0, size.width as f64, size.height as f64);

    for element in surface.elements() {
        draw_element(ctx, element);
    }

    draw_selection(ctx, surface, overlay.editing);
    for guide in overlay.guides {
        draw_guide(ctx, guide, size);
    }
    if let Some(rect) = overlay.marquee {
        draw_marquee_rect(ctx, &rect);
    }
    ctx.restore();
}

fn draw_element(ctx: &CanvasRenderingContext2d, el: &DesignElement) {
    let b = el.bounds();
    let (w, h) = (b.width as f64, b.height as f64);

    ctx.save();
    // Draw in the element's local frame: origin at its center, rotated.
    let _ = ctx.translate(b.x as f64 + w / 2.0, b.y as f64 + h / 2.0);
    let _ = ctx.rotate((el.transform.rotation as f64).to_radians());

    match &el.kind {
        ElementKind::Rect {
            corner_radius,
            fill,
            ..
        } => {
            let r = *corner_radius as f64 * el.transform.scale_x.min(el.transform.scale_y) as f64;
            rounded_rect_path(ctx, -w / 2.0, -h / 2.0, w, h, r);
            ctx.set_fill_style_str(&css_color(fill.to_f32_array()));
            ctx.fill();
        }
        ElementKind::Circle { fill, .. } => {
            ctx.begin_path();
            let _ = ctx.ellipse(0.0, 0.0, w / 2.0, h / 2.0, 0.0, 0.0, std::f64::consts::TAU);
            ctx.set_fill_style_str(&css_color(fill.to_f32_array()));
            ctx.fill();
        }
        ElementKind::Text { content, style } => {
            let _ = ctx.scale(el.transform.scale_x as f64, el.transform.scale_y as f64);
            let sx = el.transform.scale_x.max(f32::EPSILON) as f64;
            let sy = el.transform.scale_y.max(f32::EPSILON) as f64;
            draw_text(ctx, content, style, w / sx, h / sy);
        }
        ElementKind::Image { source_ref, .. } => {
            draw_image_placeholder(ctx, source_ref, w, h);
        }
    }

    ctx.restore();
}

/// Text block of `w` x `h` unscaled units centered on the origin.
fn draw_text(ctx: &CanvasRenderingContext2d, content: &str, style: &TextStyle, w: f64, h: f64) {
    ctx.set_font(&css_font(style));
    ctx.set_text_baseline("top");
    let (align, anchor) = match style.text_align {
        TextAlign::Left | TextAlign::Justify => ("left", -w / 2.0),
        TextAlign::Center => ("center", 0.0),
        TextAlign::Right => ("right", w / 2.0),
    };
    ctx.set_text_align(align);

    let size = style.font_size as f64;
    let line_step = size * style.line_height as f64;
    let top = -h / 2.0;
    for (i, line) in content.split('\n').enumerate() {
        let y = top + i as f64 * line_step;
        if let Some(stroke) = style.stroke
            && style.stroke_width > 0.0
        {
            ctx.set_stroke_style_str(&css_color(stroke.to_f32_array()));
            ctx.set_line_width(style.stroke_width as f64 * 2.0);
            let _ = ctx.stroke_text(line, anchor, y);
        }
        ctx.set_fill_style_str(&css_color(style.fill.to_f32_array()));
        let _ = ctx.fill_text(line, anchor, y);

        let width = ctx
            .measure_text(line)
            .map(|m| m.width())
            .unwrap_or(w);
        let start = match style.text_align {
            TextAlign::Left | TextAlign::Justify => anchor,
            TextAlign::Center => -width / 2.0,
            TextAlign::Right => anchor - width,
        };
        let thickness = (size / 15.0).max(1.0);
        let mut bands = Vec::new();
        if style.overline {
            bands.push(y);
        }
        if style.strikethrough {
            bands.push(y + size * 0.55);
        }
        if style.underline {
            bands.push(y + size * 0.95);
        }
        for band in bands {
            ctx.fill_rect(start, band, width, thickness);
        }
    }
}

fn draw_image_placeholder(ctx: &CanvasRenderingContext2d, source_ref: &str, w: f64, h: f64) {
    ctx.set_stroke_style_str("#86868B");
    ctx.set_line_width(1.0);
    set_dash(ctx, 4.0);
    rounded_rect_path(ctx, -w / 2.0, -h / 2.0, w, h, 4.0);
    ctx.stroke();
    ctx.set_fill_style_str("rgba(142, 142, 147, 0.06)");
    ctx.fill();

    let label = source_ref.rsplit('/').next().unwrap_or(source_ref);
    ctx.set_font("11px Inter, system-ui, sans-serif");
    ctx.set_fill_style_str("#86868B");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(label, 0.0, 0.0);
}

// ─── Overlay ────────────────────────────────────────────────────────────

fn draw_selection(ctx: &CanvasRenderingContext2d, surface: &SceneSurface, editing: bool) {
    let selection = surface.selection();
    for id in selection.ids() {
        let Some(el) = surface.get(*id) else {
            continue;
        };
        let corners = element_corners(el);
        ctx.save();
        ctx.set_stroke_style_str(ACCENT);
        ctx.set_line_width(if editing { 1.0 } else { 1.5 });
        if editing {
            set_dash(ctx, 3.0);
        }
        ctx.begin_path();
        ctx.move_to(corners[0].0 as f64, corners[0].1 as f64);
        for (x, y) in &corners[1..] {
            ctx.line_to(*x as f64, *y as f64);
        }
        ctx.close_path();
        ctx.stroke();
        ctx.restore();

        if matches!(selection, Selection::Single(_)) && !editing {
            draw_handles(ctx, &corners);
        }
    }

    if let Selection::Group(_) = selection
        && let Some(b) = surface.selection_bounds()
    {
        ctx.save();
        ctx.set_stroke_style_str(ACCENT);
        ctx.set_line_width(1.0);
        set_dash(ctx, 4.0);
        ctx.stroke_rect(
            b.x as f64 - 4.0,
            b.y as f64 - 4.0,
            b.width as f64 + 8.0,
            b.height as f64 + 8.0,
        );
        ctx.restore();
    }
}

fn draw_handles(ctx: &CanvasRenderingContext2d, corners: &[(f32, f32); 4]) {
    let handle_size = 6.0;
    let half = handle_size / 2.0;

    ctx.set_fill_style_str("#FFFFFF");
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.5);
    for (x, y) in corners {
        let (hx, hy) = (*x as f64 - half, *y as f64 - half);
        ctx.fill_rect(hx, hy, handle_size, handle_size);
        ctx.stroke_rect(hx, hy, handle_size, handle_size);
    }
}

fn draw_guide(ctx: &CanvasRenderingContext2d, guide: &GuideLine, size: SurfaceSize) {
    let p = guide.position as f64;
    ctx.save();
    ctx.set_stroke_style_str(GUIDE);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    match guide.axis {
        GuideAxis::Vertical => {
            ctx.move_to(p, 0.0);
            ctx.line_to(p, size.height as f64);
        }
        GuideAxis::Horizontal => {
            ctx.move_to(0.0, p);
            ctx.line_to(size.width as f64, p);
        }
    }
    ctx.stroke();
    ctx.restore();
}

fn draw_marquee_rect(ctx: &CanvasRenderingContext2d, rect: &Bounds) {
    let (x, y, w, h) = (
        rect.x as f64,
        rect.y as f64,
        rect.width as f64,
        rect.height as f64,
    );
    if w < 1.0 && h < 1.0 {
        return;
    }

    ctx.save();
    ctx.set_fill_style_str("rgba(79, 195, 247, 0.08)");
    ctx.fill_rect(x, y, w, h);
    ctx.set_stroke_style_str(ACCENT);
    ctx.set_line_width(1.0);
    set_dash(ctx, 4.0);
    ctx.stroke_rect(x, y, w, h);
    ctx.restore();
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn set_dash(ctx: &CanvasRenderingContext2d, len: f64) {
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &wasm_bindgen::JsValue::from_f64(len),
        &wasm_bindgen::JsValue::from_f64(len),
    ));
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}

/// CSS `rgba()` from normalized components.
pub(crate) fn css_color([r, g, b, a]: [f32; 4]) -> String {
    format!(
        "rgba({}, {}, {}, {})",
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
        (a * 1000.0).round() / 1000.0
    )
}

/// CSS font shorthand for a text style.
pub(crate) fn css_font(style: &TextStyle) -> String {
    let italic = match style.font_style {
        FontStyle::Italic => "italic ",
        FontStyle::Normal => "",
    };
    format!(
        "{italic}{} {}px \"{}\"",
        style.font_weight, style.font_size, style.font_family
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use drape_core::model::Color;
    use pretty_assertions::assert_eq;

    #[test]
    fn colors_format_as_css() {
        assert_eq!(
            css_color(Color::rgba(255, 0, 128, 128).to_f32_array()),
            "rgba(255, 0, 128, 0.502)"
        );
        assert_eq!(css_color(Color::WHITE.to_f32_array()), "rgba(255, 255, 255, 1)");
    }

    #[test]
    fn font_shorthand() {
        let style = TextStyle {
            font_family: "Bebas Neue".into(),
            font_size: 48.0,
            font_weight: 700,
            font_style: FontStyle::Italic,
            ..TextStyle::default()
        };
        assert_eq!(css_font(&style), "italic 700 48px \"Bebas Neue\"");
    }
}
