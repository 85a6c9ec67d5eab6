use pixels::{Error as PixelsError, Pixels, SurfaceTexture, TextureError};
use thiserror::Error;
use winit::window::Window;

use crate::app::surface::Frame;

#[derive(Debug, Error)]
pub enum ScreenError {
    /// Zero-sized resizes are rejected; the caller must pass a size
    /// from the display system's reported modes.
    #[error("degenerate screen size {width}x{height}")]
    DegenerateSize { width: u32, height: u32 },
    #[error("failed to resize presentation surface: {0}")]
    Resize(#[from] TextureError),
}

/// The presentation surface: a CPU pixel buffer presented through a
/// GPU surface. States never touch this directly; the loop borrows a
/// [`Frame`] from it and flushes the render queue into that.
pub struct Screen {
    pixels: Pixels<'static>,
    width: u32,
    height: u32,
}

impl Screen {
    pub fn new(window: &'static Window) -> Result<Self, PixelsError> {
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, window);
        let pixels = Pixels::new(size.width, size.height, surface_texture)?;
        Ok(Self {
            pixels,
            width: size.width,
            height: size.height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), ScreenError> {
        if width == 0 || height == 0 {
            return Err(ScreenError::DegenerateSize { width, height });
        }
        self.pixels.resize_surface(width, height)?;
        self.pixels.resize_buffer(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn frame(&mut self) -> Frame<'_> {
        Frame::new(self.pixels.frame_mut(), self.width, self.height)
    }

    pub fn present(&mut self) -> Result<(), PixelsError> {
        self.pixels.render()
    }
}
