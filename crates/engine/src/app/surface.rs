use std::path::Path;

use image::ImageReader;
use thiserror::Error;

/// Screen/world position in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned pixel rectangle. `x`/`y` may be negative (partially
/// off-surface); width and height are always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h as i32
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        let px = point.x.round() as i32;
        let py = point.y.round() as i32;
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left >= right || top >= bottom {
            return None;
        }
        Some(Rect {
            x: left,
            y: top,
            w: (right - left) as u32,
            h: (bottom - top) as u32,
        })
    }

    /// Grow the rectangle by `margin` pixels on every side.
    pub fn inflated(&self, margin: u32) -> Rect {
        Rect {
            x: self.x - margin as i32,
            y: self.y - margin as i32,
            w: self.w + margin * 2,
            h: self.h + margin * 2,
        }
    }
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to open image at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// An owned RGBA pixel buffer. Blit/fill operations clip against the
/// destination bounds; out-of-bounds writes are silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Surface {
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut rgba = vec![0u8; width as usize * height as usize * 4];
        for chunk in rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn load_png(path: &Path) -> Result<Self, SurfaceError> {
        let reader = ImageReader::open(path).map_err(|source| SurfaceError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| SurfaceError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        let image = decoded.to_rgba8();
        Ok(Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba
            .get(offset..offset + 4)
            .map(|slice| [slice[0], slice[1], slice[2], slice[3]])
    }

    /// Nearest-neighbour resample to the requested dimensions.
    pub fn scaled(&self, width: u32, height: u32) -> Surface {
        let width = width.max(1);
        let height = height.max(1);
        let mut out = Surface::filled(width, height, [0, 0, 0, 0]);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        for out_y in 0..height {
            let src_y = (out_y as u64 * self.height as u64 / height as u64) as u32;
            let src_y = src_y.min(self.height - 1);
            for out_x in 0..width {
                let src_x = (out_x as u64 * self.width as u64 / width as u64) as u32;
                let src_x = src_x.min(self.width - 1);
                let src_offset = (src_y as usize * self.width as usize + src_x as usize) * 4;
                let dst_offset = (out_y as usize * width as usize + out_x as usize) * 4;
                out.rgba[dst_offset..dst_offset + 4]
                    .copy_from_slice(&self.rgba[src_offset..src_offset + 4]);
            }
        }
        out
    }

    /// Mirror around the vertical axis (used for left-facing actor frames).
    pub fn flipped_horizontal(&self) -> Surface {
        let mut out = self.clone();
        for y in 0..self.height as usize {
            let row = y * self.width as usize * 4;
            for x in 0..self.width as usize {
                let src = row + x * 4;
                let dst = row + (self.width as usize - 1 - x) * 4;
                out.rgba[dst..dst + 4].copy_from_slice(&self.rgba[src..src + 4]);
            }
        }
        out
    }

    pub fn fill(&mut self, color: [u8; 4]) {
        for chunk in self.rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let (width, height) = (self.width, self.height);
        fill_rect_rgba(&mut self.rgba, width, height, rect, color);
    }

    pub fn outline_rect(&mut self, rect: Rect, color: [u8; 4]) {
        let (width, height) = (self.width, self.height);
        outline_rect_rgba(&mut self.rgba, width, height, rect, color);
    }

    pub fn blit(&mut self, src: &Surface, x: i32, y: i32) {
        let (width, height) = (self.width, self.height);
        blit_rgba(&mut self.rgba, width, height, src, x, y, None);
    }

    pub fn blit_area(&mut self, src: &Surface, x: i32, y: i32, source: Rect) {
        let (width, height) = (self.width, self.height);
        blit_rgba(&mut self.rgba, width, height, src, x, y, Some(source));
    }

    pub(crate) fn raw_parts_mut(&mut self) -> (&mut [u8], u32, u32) {
        (&mut self.rgba, self.width, self.height)
    }
}

/// Mutable view over a presentation backbuffer. Shares the clipping
/// behaviour of [`Surface`] without owning the pixels.
pub struct Frame<'a> {
    rgba: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Frame<'a> {
    pub fn new(rgba: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            rgba,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: [u8; 4]) {
        for chunk in self.rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 4]) {
        fill_rect_rgba(self.rgba, self.width, self.height, rect, color);
    }

    /// Source-over blend of a translucent rectangle (battle tile overlays).
    pub fn fill_rect_blended(&mut self, rect: Rect, color: [u8; 4]) {
        let Some(clipped) = rect.intersection(&Rect::new(0, 0, self.width, self.height)) else {
            return;
        };
        let alpha = color[3] as u32;
        let inv = 255 - alpha;
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                let offset = (y as usize * self.width as usize + x as usize) * 4;
                for channel in 0..3 {
                    let dst = self.rgba[offset + channel] as u32;
                    let src = color[channel] as u32;
                    self.rgba[offset + channel] = ((src * alpha + dst * inv) / 255) as u8;
                }
                self.rgba[offset + 3] = 255;
            }
        }
    }

    pub fn outline_rect(&mut self, rect: Rect, color: [u8; 4]) {
        outline_rect_rgba(self.rgba, self.width, self.height, rect, color);
    }

    pub fn fill_circle(&mut self, center_x: i32, center_y: i32, radius: i32, color: [u8; 4]) {
        if radius <= 0 {
            return;
        }
        let r_sq = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > r_sq {
                    continue;
                }
                write_pixel_rgba(
                    self.rgba,
                    self.width,
                    self.height,
                    center_x + dx,
                    center_y + dy,
                    color,
                );
            }
        }
    }

    pub fn blit(&mut self, src: &Surface, x: i32, y: i32) {
        blit_rgba(self.rgba, self.width, self.height, src, x, y, None);
    }

    pub fn blit_area(&mut self, src: &Surface, x: i32, y: i32, source: Rect) {
        blit_rgba(self.rgba, self.width, self.height, src, x, y, Some(source));
    }

    pub(crate) fn raw_parts_mut(&mut self) -> (&mut [u8], u32, u32) {
        (self.rgba, self.width, self.height)
    }
}

pub(crate) fn write_pixel_rgba(
    rgba: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    if offset + 4 > rgba.len() {
        return;
    }
    rgba[offset..offset + 4].copy_from_slice(&color);
}

fn fill_rect_rgba(rgba: &mut [u8], width: u32, height: u32, rect: Rect, color: [u8; 4]) {
    let Some(clipped) = rect.intersection(&Rect::new(0, 0, width, height)) else {
        return;
    };
    for y in clipped.y..clipped.bottom() {
        let row = y as usize * width as usize * 4;
        for x in clipped.x..clipped.right() {
            let offset = row + x as usize * 4;
            rgba[offset..offset + 4].copy_from_slice(&color);
        }
    }
}

fn outline_rect_rgba(rgba: &mut [u8], width: u32, height: u32, rect: Rect, color: [u8; 4]) {
    if rect.w <= 1 || rect.h <= 1 {
        return;
    }
    fill_rect_rgba(rgba, width, height, Rect::new(rect.x, rect.y, rect.w, 1), color);
    fill_rect_rgba(
        rgba,
        width,
        height,
        Rect::new(rect.x, rect.bottom() - 1, rect.w, 1),
        color,
    );
    fill_rect_rgba(rgba, width, height, Rect::new(rect.x, rect.y, 1, rect.h), color);
    fill_rect_rgba(
        rgba,
        width,
        height,
        Rect::new(rect.right() - 1, rect.y, 1, rect.h),
        color,
    );
}

/// Alpha-aware blit: fully transparent source pixels are skipped, all
/// others overwrite the destination. `source` selects a sub-area of
/// `src`; `None` blits the whole surface.
fn blit_rgba(
    rgba: &mut [u8],
    width: u32,
    height: u32,
    src: &Surface,
    x: i32,
    y: i32,
    source: Option<Rect>,
) {
    let src_area = match source {
        Some(area) => match area.intersection(&src.bounds()) {
            Some(clipped) => clipped,
            None => return,
        },
        None => src.bounds(),
    };
    if src_area.is_empty() || width == 0 || height == 0 {
        return;
    }

    for row in 0..src_area.h as i32 {
        let dst_y = y + row;
        if dst_y < 0 || dst_y >= height as i32 {
            continue;
        }
        let src_y = (src_area.y + row) as usize;
        let src_row = src_y * src.width as usize * 4;
        let dst_row = dst_y as usize * width as usize * 4;
        for col in 0..src_area.w as i32 {
            let dst_x = x + col;
            if dst_x < 0 || dst_x >= width as i32 {
                continue;
            }
            let src_offset = src_row + (src_area.x + col) as usize * 4;
            if src.rgba[src_offset + 3] == 0 {
                continue;
            }
            let dst_offset = dst_row + dst_x as usize * 4;
            rgba[dst_offset..dst_offset + 4]
                .copy_from_slice(&src.rgba[src_offset..src_offset + 4]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    #[test]
    fn intersection_of_disjoint_rects_is_none() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 5, 5);
        assert_eq!(a.intersection(&b), None);
    }

    #[test]
    fn intersection_clips_to_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, -5, 10, 10);
        assert_eq!(a.intersection(&b), Some(Rect::new(5, 0, 5, 5)));
    }

    #[test]
    fn contains_point_is_half_open() {
        let rect = Rect::new(0, 0, 4, 4);
        assert!(rect.contains_point(Vec2 { x: 0.0, y: 0.0 }));
        assert!(rect.contains_point(Vec2 { x: 3.0, y: 3.0 }));
        assert!(!rect.contains_point(Vec2 { x: 4.0, y: 2.0 }));
    }

    #[test]
    fn blit_clips_against_destination_edges() {
        let mut dst = Surface::filled(4, 4, BLUE);
        let src = Surface::filled(4, 4, RED);
        dst.blit(&src, -2, -2);
        assert_eq!(dst.pixel(0, 0), Some(RED));
        assert_eq!(dst.pixel(1, 1), Some(RED));
        assert_eq!(dst.pixel(2, 2), Some(BLUE));
    }

    #[test]
    fn blit_skips_fully_transparent_pixels() {
        let mut dst = Surface::filled(2, 2, BLUE);
        let src = Surface::filled(2, 2, [255, 0, 0, 0]);
        dst.blit(&src, 0, 0);
        assert_eq!(dst.pixel(0, 0), Some(BLUE));
    }

    #[test]
    fn blit_area_selects_source_region() {
        let mut src = Surface::filled(4, 4, BLUE);
        src.fill_rect(Rect::new(2, 2, 2, 2), RED);
        let mut dst = Surface::filled(2, 2, [0, 0, 0, 255]);
        dst.blit_area(&src, 0, 0, Rect::new(2, 2, 2, 2));
        assert_eq!(dst.pixel(0, 0), Some(RED));
        assert_eq!(dst.pixel(1, 1), Some(RED));
    }

    #[test]
    fn scaled_preserves_solid_color() {
        let src = Surface::filled(2, 2, RED);
        let scaled = src.scaled(8, 6);
        assert_eq!(scaled.size(), (8, 6));
        assert_eq!(scaled.pixel(0, 0), Some(RED));
        assert_eq!(scaled.pixel(7, 5), Some(RED));
    }

    #[test]
    fn scaled_never_collapses_to_zero() {
        let src = Surface::filled(4, 4, RED);
        assert_eq!(src.scaled(0, 0).size(), (1, 1));
    }

    #[test]
    fn flipped_horizontal_mirrors_columns() {
        let mut src = Surface::filled(3, 1, BLUE);
        src.fill_rect(Rect::new(0, 0, 1, 1), RED);
        let flipped = src.flipped_horizontal();
        assert_eq!(flipped.pixel(2, 0), Some(RED));
        assert_eq!(flipped.pixel(0, 0), Some(BLUE));
    }

    #[test]
    fn frame_blend_mixes_toward_source() {
        let mut rgba = vec![0u8; 4 * 4];
        for chunk in rgba.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[0, 0, 0, 255]);
        }
        let mut frame = Frame::new(&mut rgba, 2, 2);
        frame.fill_rect_blended(Rect::new(0, 0, 1, 1), [255, 255, 255, 220]);
        assert_eq!(rgba[0], 219);
        assert_eq!(rgba[4], 0);
    }

    #[test]
    fn fill_circle_clips_to_radius() {
        let mut rgba = vec![0u8; 7 * 7 * 4];
        let mut frame = Frame::new(&mut rgba, 7, 7);
        frame.fill_circle(3, 3, 2, RED);
        let at = |x: usize, y: usize| {
            let offset = (y * 7 + x) * 4;
            [rgba[offset], rgba[offset + 1], rgba[offset + 2], rgba[offset + 3]]
        };
        assert_eq!(at(3, 3), RED);
        assert_eq!(at(3, 1), RED);
        assert_eq!(at(1, 1), [0, 0, 0, 0]);
        assert_eq!(at(6, 6), [0, 0, 0, 0]);
    }

    #[test]
    fn load_png_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tile.png");
        let mut buffer = image::RgbaImage::new(2, 2);
        for pixel in buffer.pixels_mut() {
            *pixel = image::Rgba(RED);
        }
        buffer.save(&path).expect("save png");

        let surface = Surface::load_png(&path).expect("load");
        assert_eq!(surface.size(), (2, 2));
        assert_eq!(surface.pixel(1, 1), Some(RED));
    }

    #[test]
    fn load_png_missing_file_is_open_error() {
        let result = Surface::load_png(Path::new("/nonexistent/missing.png"));
        assert!(matches!(result, Err(SurfaceError::Open { .. })));
    }
}
