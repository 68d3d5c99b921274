// SPDX-License-Identifier: MIT OR Apache-2.0
//! SVG serialization of scene trees.

use crate::config::RenderSettings;
use vectorweave_graph::{Color, Point, Shape, Style, Transform};

/// Writes one scene as a standalone SVG document
pub struct SvgWriter<'a> {
    settings: &'a RenderSettings,
    out: String,
}

impl<'a> SvgWriter<'a> {
    /// Create a writer using `settings` for number formatting and layout
    pub fn new(settings: &'a RenderSettings) -> Self {
        Self {
            settings,
            out: String::new(),
        }
    }

    /// Render `shape` on a `width` x `height` canvas.
    ///
    /// `background` paints a full-canvas rectangle beneath the scene.
    pub fn write(mut self, shape: &Shape, width: f64, height: f64, background: Option<Color>) -> String {
        let (w, h) = (self.num(width), self.num(height));
        self.line(
            0,
            &format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
            ),
        );
        if let Some(color) = background {
            let fill = paint_attrs("fill", Some(color));
            self.line(1, &format!(r#"<rect x="0" y="0" width="{w}" height="{h}"{fill}/>"#));
        }
        self.shape(shape, 1);
        self.line(0, "</svg>");
        self.out
    }

    fn shape(&mut self, shape: &Shape, depth: usize) {
        match shape {
            Shape::Empty => {}
            Shape::Group {
                children,
                transform,
                opacity,
            } => {
                let mut attrs = String::new();
                if !transform.is_identity() {
                    attrs.push_str(&format!(r#" transform="{}""#, self.transform(transform)));
                }
                if *opacity < 1.0 {
                    attrs.push_str(&format!(r#" opacity="{}""#, self.num(*opacity)));
                }
                self.line(depth, &format!("<g{attrs}>"));
                for child in children {
                    self.shape(child, depth + 1);
                }
                self.line(depth, "</g>");
            }
            Shape::Circle { center, radius, style } => {
                let element = format!(
                    r#"<circle cx="{}" cy="{}" r="{}"{}/>"#,
                    self.num(center.x),
                    self.num(center.y),
                    self.num(*radius),
                    self.style(style)
                );
                self.line(depth, &element);
            }
            Shape::Rect {
                origin,
                width,
                height,
                style,
            } => {
                let element = format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}"{}/>"#,
                    self.num(origin.x),
                    self.num(origin.y),
                    self.num(*width),
                    self.num(*height),
                    self.style(style)
                );
                self.line(depth, &element);
            }
            Shape::Polygon { points, style } => {
                let element = format!(
                    r#"<polygon points="{}"{}/>"#,
                    self.points(points),
                    self.style(style)
                );
                self.line(depth, &element);
            }
        }
    }

    fn transform(&self, transform: &Transform) -> String {
        let mut parts = Vec::new();
        if transform.translate != Point::ORIGIN {
            parts.push(format!(
                "translate({} {})",
                self.num(transform.translate.x),
                self.num(transform.translate.y)
            ));
        }
        if transform.rotate != 0.0 {
            parts.push(format!("rotate({})", self.num(transform.rotate)));
        }
        if transform.scale != 1.0 {
            parts.push(format!("scale({})", self.num(transform.scale)));
        }
        parts.join(" ")
    }

    fn style(&self, style: &Style) -> String {
        let mut attrs = paint_attrs("fill", style.fill);
        if style.stroke.is_some() && style.stroke_width > 0.0 {
            attrs.push_str(&paint_attrs("stroke", style.stroke));
            attrs.push_str(&format!(r#" stroke-width="{}""#, self.num(style.stroke_width)));
        }
        attrs
    }

    fn points(&self, points: &[Point]) -> String {
        points
            .iter()
            .map(|p| format!("{},{}", self.num(p.x), self.num(p.y)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn num(&self, value: f64) -> String {
        format_number(value, self.settings.precision)
    }

    fn line(&mut self, depth: usize, element: &str) {
        if self.settings.indent > 0 {
            self.out.push_str(&" ".repeat(depth * self.settings.indent));
        }
        self.out.push_str(element);
        if self.settings.indent > 0 {
            self.out.push('\n');
        }
    }
}

// `fill="#rrggbb"` plus an opacity attribute for translucent colors
fn paint_attrs(attribute: &str, color: Option<Color>) -> String {
    match color {
        None => format!(r#" {attribute}="none""#),
        Some(color) if color.a < 1.0 => format!(
            r#" {attribute}="{}" {attribute}-opacity="{}""#,
            color.to_hex(),
            format_number(color.a, 3)
        ),
        Some(color) => format!(r#" {attribute}="{}""#, color.to_hex()),
    }
}

/// Fixed precision with trailing zeros trimmed
pub fn format_number(value: f64, precision: usize) -> String {
    let fixed = format!("{value:.precision$}");
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact() -> RenderSettings {
        RenderSettings {
            indent: 0,
            ..RenderSettings::default()
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0, 2), "1");
        assert_eq!(format_number(1.256, 2), "1.26");
        assert_eq!(format_number(-0.001, 2), "0");
        assert_eq!(format_number(120.0, 0), "120");
    }

    #[test]
    fn test_circle_markup() {
        let settings = compact();
        let shape = Shape::Circle {
            center: Point::new(10.0, 20.5),
            radius: 5.0,
            style: Style::filled(Color::rgb(1.0, 0.0, 0.0)),
        };
        let svg = SvgWriter::new(&settings).write(&shape, 100.0, 50.0, None);
        assert_eq!(
            svg,
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50">"#,
                r##"<circle cx="10" cy="20.5" r="5" fill="#ff0000"/>"##,
                "</svg>"
            )
        );
    }

    #[test]
    fn test_group_attributes() {
        let settings = compact();
        let shape = Shape::Group {
            children: vec![Shape::Polygon {
                points: vec![Point::ORIGIN, Point::new(1.0, 0.0), Point::new(0.0, 1.0)],
                style: Style {
                    fill: None,
                    stroke: Some(Color::BLACK),
                    stroke_width: 0.5,
                },
            }],
            transform: Transform {
                translate: Point::new(3.0, 4.0),
                rotate: 45.0,
                scale: 1.0,
            },
            opacity: 0.5,
        };
        let svg = SvgWriter::new(&settings).write(&shape, 10.0, 10.0, Some(Color::WHITE));
        assert!(svg.contains(r##"<rect x="0" y="0" width="10" height="10" fill="#ffffff"/>"##));
        assert!(svg.contains(r#"<g transform="translate(3 4) rotate(45)" opacity="0.5">"#));
        assert!(svg.contains(
            r##"<polygon points="0,0 1,0 0,1" fill="none" stroke="#000000" stroke-width="0.5"/>"##
        ));
    }

    #[test]
    fn test_indented_output() {
        let settings = RenderSettings::default();
        let svg = SvgWriter::new(&settings).write(&Shape::Empty, 10.0, 10.0, None);
        let lines: Vec<&str> = svg.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("<svg"));
        assert_eq!(lines[1], "</svg>");
    }

    #[test]
    fn test_translucent_fill() {
        let settings = compact();
        let shape = Shape::Rect {
            origin: Point::ORIGIN,
            width: 2.0,
            height: 2.0,
            style: Style::filled(Color {
                a: 0.25,
                ..Color::WHITE
            }),
        };
        let svg = SvgWriter::new(&settings).write(&shape, 2.0, 2.0, None);
        assert!(svg.contains(r##"fill="#ffffff" fill-opacity="0.25""##));
    }
}
