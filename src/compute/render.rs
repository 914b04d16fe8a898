//! Raster canvas and shape compositing.

use std::path::Path;

use tiny_skia as sk;

use crate::compute::shape::{Shape, ShapeKind};
use crate::schema::ImageConfig;

/// Square RGBA canvas produced by rendering a chromosome.
///
/// The background is opaque and shapes are blended source-over, so every
/// pixel is fully opaque and the stored bytes equal straight RGBA.
#[derive(Debug, Clone)]
pub struct Raster {
    pixmap: sk::Pixmap,
}

impl PartialEq for Raster {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width() && self.data() == other.data()
    }
}

impl Raster {
    /// Canvas filled with a grey tone in `[0, 1]`.
    pub fn filled(size: u32, tone: f32) -> Result<Self, ExportError> {
        let mut pixmap = sk::Pixmap::new(size, size).ok_or(ExportError::InvalidSize(size))?;
        let tone = tone.clamp(0.0, 1.0);
        pixmap.fill(sk::Color::from_rgba(tone, tone, tone, 1.0).unwrap_or(sk::Color::BLACK));
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// RGBA bytes of one pixel, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
    }

    /// Rec. 601 luminance of one pixel in `[0, 1]`.
    pub fn luma(&self, x: u32, y: u32) -> Option<f32> {
        self.pixel(x, y).map(|[r, g, b, _]| {
            (0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)) / 255.0
        })
    }

    /// Row-major RGBA bytes.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Composite one shape over the current contents.
    pub fn draw_shape(&mut self, shape: &Shape, opacity: f32, anti_alias: bool) {
        let [r, g, b] = shape.color().to_rgb();
        let Some(color) = sk::Color::from_rgba(
            r.clamp(0.0, 1.0),
            g.clamp(0.0, 1.0),
            b.clamp(0.0, 1.0),
            opacity.clamp(0.0, 1.0),
        ) else {
            return;
        };
        let mut paint = sk::Paint::default();
        paint.set_color(color);
        paint.anti_alias = anti_alias;

        let p = shape.absolute_points();
        let transform = sk::Transform::identity();
        match shape.kind() {
            ShapeKind::Ellipse => {
                let oval = box_rect(p[0], p[1], p[2], p[3]).and_then(sk::PathBuilder::from_oval);
                if let Some(path) = oval {
                    self.pixmap
                        .fill_path(&path, &paint, sk::FillRule::Winding, transform, None);
                }
            }
            ShapeKind::Quad => {
                if let Some(rect) = box_rect(p[0], p[1], p[2], p[3]) {
                    self.pixmap.fill_rect(rect, &paint, transform, None);
                }
            }
            ShapeKind::Triangle => {
                let mut pb = sk::PathBuilder::new();
                pb.move_to(p[0] as f32, p[1] as f32);
                pb.line_to(p[2] as f32, p[3] as f32);
                pb.line_to(p[4] as f32, p[5] as f32);
                pb.close();
                // Coincident vertices produce no path.
                if let Some(path) = pb.finish() {
                    self.pixmap
                        .fill_path(&path, &paint, sk::FillRule::Winding, transform, None);
                }
            }
        }
    }

    /// Render shapes in paint order onto a fresh background.
    pub fn from_shapes<'a, I>(shapes: I, config: &ImageConfig) -> Result<Self, ExportError>
    where
        I: IntoIterator<Item = &'a Shape>,
    {
        let mut raster = Self::filled(config.canvas_size, config.background_tone)?;
        for shape in shapes {
            raster.draw_shape(shape, config.opacity, config.anti_alias);
        }
        Ok(raster)
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        self.pixmap
            .encode_png()
            .map_err(|e| ExportError::Encode(e.to_string()))
    }

    /// Write a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), ExportError> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

fn box_rect(x: i32, y: i32, w: i32, h: i32) -> Option<sk::Rect> {
    sk::Rect::from_xywh(x as f32, y as f32, w as f32, h as f32)
}

/// Raster creation and export errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Cannot allocate a {0}x{0} canvas")]
    InvalidSize(u32),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
