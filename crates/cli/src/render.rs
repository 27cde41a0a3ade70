//! A small software renderer for exports.
//!
//! PNG output rasterizes the fills of shapes (rectangles, frames,
//! components, instances, ellipses). SVG output also carries strokes and
//! text. Effects, rotation and vector paths are not drawn.

use bridge::{ExportFormat, ExportSettings, RenderError, Renderer};
use glam::Vec2;
use node::{ColorStop, Node, NodeType, Paint, Rgb};
use scene_graph::Snapshot;
use smol::future::{self, BoxedLocal};
use std::fmt::{self, Write as _};

/// Largest image, in pixels, the renderer will allocate.
const MAX_PIXELS: u64 = 64 * 1024 * 1024;

#[derive(Default)]
pub struct SnapshotRenderer;

impl Renderer for SnapshotRenderer {
    fn export(
        &self,
        snapshot: Snapshot,
        settings: ExportSettings,
    ) -> BoxedLocal<Result<Vec<u8>, RenderError>> {
        log::debug!(
            "Exporting {} ({} nodes) as {} at {}x",
            snapshot.node.name,
            snapshot.len(),
            settings.format,
            settings.scale
        );
        let result = match settings.format {
            ExportFormat::Png => render_png(&snapshot, settings.scale),
            ExportFormat::Svg => render_svg(&snapshot, settings.scale)
                .map(String::into_bytes)
                .map_err(|e| RenderError(e.to_string())),
            format => Err(RenderError(format!("{format} export is not supported"))),
        };
        Box::pin(future::ready(result))
    }
}

/// The exported area: a scene node's own box, or for pages the extent of
/// their content.
fn extent(snapshot: &Snapshot) -> Vec2 {
    if snapshot.node.node_type.is_scene_node() {
        return snapshot.node.size;
    }
    let mut extent = Vec2::ZERO;
    snapshot.visit(|node, offset| {
        if node.node_type.is_scene_node() {
            extent = extent.max(offset + node.size);
        }
    });
    extent
}

fn draws_fills(node_type: NodeType) -> bool {
    matches!(
        node_type,
        NodeType::Frame
            | NodeType::Component
            | NodeType::Instance
            | NodeType::Rectangle
            | NodeType::Ellipse
    )
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Gradient color at `t`, clamped to the first and last stops.
fn sample(stops: &[ColorStop], t: f32) -> Option<[f32; 4]> {
    let rgba = |stop: &ColorStop| [stop.color.r, stop.color.g, stop.color.b, stop.color.a];
    let first = stops.first()?;
    let Some(index) = stops.iter().position(|stop| stop.position >= t) else {
        return stops.last().map(rgba);
    };
    if index == 0 {
        return Some(rgba(first));
    }

    let (from, to) = (&stops[index - 1], &stops[index]);
    let span = to.position - from.position;
    let local = if span > 0.0 {
        (t - from.position) / span
    } else {
        1.0
    };
    let (a, b) = (rgba(from), rgba(to));
    Some([
        lerp(a[0], b[0], local),
        lerp(a[1], b[1], local),
        lerp(a[2], b[2], local),
        lerp(a[3], b[3], local),
    ])
}

/// Color of `paint` at horizontal position `t` across the shape.
fn paint_color(paint: &Paint, t: f32) -> Option<[f32; 4]> {
    match paint {
        Paint::Solid {
            color,
            opacity,
            visible: true,
        } => Some([color.r, color.g, color.b, *opacity]),
        Paint::GradientLinear {
            gradient_stops,
            visible: true,
            ..
        } => sample(gradient_stops, t),
        _ => None,
    }
}

/// Straight-alpha RGBA8 image.
struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Composites `color` over the pixel at (x, y).
    fn blend(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let pixel = &mut self.data[i..i + 4];

        let src_a = color[3].clamp(0.0, 1.0);
        let dst_a = pixel[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        for c in 0..3 {
            let dst = pixel[c] as f32 / 255.0;
            let out = (color[c] * src_a + dst * dst_a * (1.0 - src_a)) / out_a;
            pixel[c] = to_byte(out);
        }
        pixel[3] = to_byte(out_a);
    }

    fn fill(&mut self, node: &Node, origin: Vec2, scale: f32, opacity: f32) {
        let Some(fills) = node.fills.as_deref() else {
            return;
        };
        let size = node.size * scale;
        if size.x <= 0.0 || size.y <= 0.0 {
            return;
        }

        let x0 = origin.x.floor().max(0.0) as u32;
        let y0 = origin.y.floor().max(0.0) as u32;
        let x1 = ((origin.x + size.x).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((origin.y + size.y).ceil().max(0.0) as u32).min(self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                // Sample at the pixel center
                let local = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - origin;
                if !covers(node.node_type, local, size) {
                    continue;
                }
                let t = local.x / size.x;
                for paint in fills {
                    if let Some(mut color) = paint_color(paint, t) {
                        color[3] *= opacity;
                        self.blend(x, y, color);
                    }
                }
            }
        }
    }

    fn encode(&self) -> Result<Vec<u8>, png::EncodingError> {
        let mut bytes = Vec::new();
        let mut encoder = png::Encoder::new(&mut bytes, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;
        writer.finish()?;
        Ok(bytes)
    }
}

fn covers(node_type: NodeType, local: Vec2, size: Vec2) -> bool {
    if local.x < 0.0 || local.y < 0.0 || local.x > size.x || local.y > size.y {
        return false;
    }
    match node_type {
        NodeType::Ellipse => {
            let d = local / size - Vec2::splat(0.5);
            d.length_squared() <= 0.25
        }
        _ => true,
    }
}

fn draw(pixmap: &mut Pixmap, snapshot: &Snapshot, offset: Vec2, scale: f32, opacity: f32) {
    let node = &snapshot.node;
    if !node.visible {
        return;
    }
    let opacity = opacity * node.opacity;
    if draws_fills(node.node_type) {
        pixmap.fill(node, offset * scale, scale, opacity);
    }
    for child in &snapshot.children {
        draw(pixmap, child, offset + child.node.position, scale, opacity);
    }
}

fn render_png(snapshot: &Snapshot, scale: f32) -> Result<Vec<u8>, RenderError> {
    if !(scale > 0.0 && scale.is_finite()) {
        return Err(RenderError(format!("Invalid export scale: {scale}")));
    }
    let size = (extent(snapshot) * scale).ceil().max(Vec2::ONE);
    let (width, height) = (size.x as u32, size.y as u32);
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(RenderError(format!("Export too large: {width}x{height}")));
    }

    let mut pixmap = Pixmap::new(width, height);
    draw(&mut pixmap, snapshot, Vec2::ZERO, scale, 1.0);
    pixmap
        .encode()
        .map_err(|e| RenderError(format!("PNG encoding failed: {e}")))
}

fn css_color(color: Rgb) -> String {
    format!(
        "rgb({},{},{})",
        to_byte(color.r),
        to_byte(color.g),
        to_byte(color.b)
    )
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

struct SvgWriter {
    out: String,
    gradients: usize,
}

impl SvgWriter {
    /// Writes a paint server if needed and returns the `fill` value.
    fn paint(&mut self, paint: &Paint) -> Result<Option<(String, f32)>, fmt::Error> {
        match paint {
            Paint::Solid {
                color,
                opacity,
                visible: true,
            } => Ok(Some((css_color(*color), *opacity))),
            Paint::GradientLinear {
                gradient_stops,
                visible: true,
                ..
            } => {
                self.gradients += 1;
                let id = format!("gradient{}", self.gradients);
                write!(self.out, r#"<defs><linearGradient id="{id}">"#)?;
                for stop in gradient_stops {
                    write!(
                        self.out,
                        r#"<stop offset="{}" stop-color="{}" stop-opacity="{}"/>"#,
                        stop.position,
                        css_color(stop.color.rgb()),
                        stop.color.a
                    )?;
                }
                self.out.push_str("</linearGradient></defs>");
                Ok(Some((format!("url(#{id})"), 1.0)))
            }
            _ => Ok(None),
        }
    }

    fn stroke(node: &Node) -> String {
        let stroke = node
            .strokes
            .iter()
            .flatten()
            .find_map(|paint| match paint {
                Paint::Solid {
                    color,
                    opacity,
                    visible: true,
                } => Some((*color, *opacity)),
                _ => None,
            });
        match (stroke, node.stroke_weight) {
            (Some((color, opacity)), Some(weight)) if weight > 0.0 => format!(
                r#" stroke="{}" stroke-opacity="{opacity}" stroke-width="{weight}""#,
                css_color(color)
            ),
            _ => String::new(),
        }
    }

    fn shape(&mut self, node: &Node) -> fmt::Result {
        let stroke = Self::stroke(node);
        for paint in node.fills.iter().flatten() {
            let Some((fill, opacity)) = self.paint(paint)? else {
                continue;
            };
            let (w, h) = (node.size.x, node.size.y);
            match node.node_type {
                NodeType::Ellipse => write!(
                    self.out,
                    r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}" fill="{fill}" fill-opacity="{opacity}"{stroke}/>"#,
                    w / 2.0,
                    h / 2.0,
                    w / 2.0,
                    h / 2.0
                )?,
                _ => {
                    let radius = node.corner_radius.unwrap_or(0.0);
                    write!(
                        self.out,
                        r#"<rect width="{w}" height="{h}" rx="{radius}" fill="{fill}" fill-opacity="{opacity}"{stroke}/>"#
                    )?
                }
            }
        }
        Ok(())
    }

    fn text(&mut self, node: &Node) -> fmt::Result {
        let Some(text) = &node.text else {
            return Ok(());
        };
        let fill = node
            .fills
            .iter()
            .flatten()
            .find_map(|paint| match paint {
                Paint::Solid {
                    color,
                    opacity,
                    visible: true,
                } => Some((css_color(*color), *opacity)),
                _ => None,
            })
            .unwrap_or_else(|| (css_color(Rgb::BLACK), 1.0));
        write!(
            self.out,
            r#"<text y="{}" font-family="{}" font-size="{}" font-weight="{}" fill="{}" fill-opacity="{}">{}</text>"#,
            text.font_size,
            escape(&text.font_name.family),
            text.font_size,
            text.font_weight,
            fill.0,
            fill.1,
            escape(&text.characters)
        )
    }

    fn node(&mut self, snapshot: &Snapshot, offset: Vec2) -> fmt::Result {
        let node = &snapshot.node;
        if !node.visible {
            return Ok(());
        }
        write!(
            self.out,
            r#"<g transform="translate({},{})" opacity="{}">"#,
            offset.x, offset.y, node.opacity
        )?;
        match node.node_type {
            NodeType::Text => self.text(node)?,
            node_type if draws_fills(node_type) => self.shape(node)?,
            _ => {}
        }
        for child in &snapshot.children {
            self.node(child, child.node.position)?;
        }
        self.out.push_str("</g>");
        Ok(())
    }
}

fn render_svg(snapshot: &Snapshot, scale: f32) -> Result<String, fmt::Error> {
    let size = extent(snapshot) * scale;
    let mut writer = SvgWriter {
        out: String::new(),
        gradients: 0,
    };
    write!(
        writer.out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}"><g transform="scale({scale})">"#,
        size.x, size.y, size.x, size.y
    )?;
    writer.node(snapshot, Vec2::ZERO)?;
    writer.out.push_str("</g></svg>");
    Ok(writer.out)
}
