use crate::FrameSize;
use serde::{Deserialize, Serialize};

/// Interleaved 8-bit pixel layouts a frame buffer may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelLayout {
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Gray8,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Rgb8 | PixelLayout::Bgr8 => 3,
            PixelLayout::Rgba8 | PixelLayout::Bgra8 => 4,
            PixelLayout::Gray8 => 1,
        }
    }

    /// Byte offsets of the red, green and blue samples, if the layout has color.
    pub fn rgb_offsets(self) -> Option<[usize; 3]> {
        match self {
            PixelLayout::Rgb8 | PixelLayout::Rgba8 => Some([0, 1, 2]),
            PixelLayout::Bgr8 | PixelLayout::Bgra8 => Some([2, 1, 0]),
            PixelLayout::Gray8 => None,
        }
    }
}

/// Owned camera frame, row-major and tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub data: Vec<u8>, // len = w*h*channels
}

impl Frame {
    pub fn new(width: usize, height: usize, layout: PixelLayout, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            layout,
            data,
        }
    }

    /// A frame filled with one RGB color.
    pub fn filled_rgb(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width * height * 3)
            .collect();
        Self::new(width, height, PixelLayout::Rgb8, data)
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width as u32, self.height as u32)
    }

    pub fn expected_len(&self) -> usize {
        self.width * self.height * self.layout.channels()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Overwrite one pixel with an RGB color, converting to the frame layout.
    ///
    /// Pixels outside the frame, or past the end of a short buffer, are ignored.
    pub fn put_rgb(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let Some(offsets) = self.layout.rgb_offsets() else {
            return;
        };
        if x >= self.width || y >= self.height {
            return;
        }
        let ch = self.layout.channels();
        let base = (y * self.width + x) * ch;
        if base + ch > self.data.len() {
            return;
        }
        for (value, off) in rgb.into_iter().zip(offsets) {
            self.data[base + off] = value;
        }
        if ch == 4 {
            self.data[base + 3] = u8::MAX;
        }
    }

    /// Paint an axis-aligned rectangle `[x0, x1) x [y0, y1)`, clipped to the frame.
    pub fn fill_rect_rgb(&mut self, x0: usize, y0: usize, x1: usize, y1: usize, rgb: [u8; 3]) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                self.put_rgb(x, y, rgb);
            }
        }
    }
}

impl From<::image::RgbImage> for Frame {
    fn from(img: ::image::RgbImage) -> Self {
        let (w, h) = img.dimensions();
        Frame::new(w as usize, h as usize, PixelLayout::Rgb8, img.into_raw())
    }
}

impl From<::image::RgbaImage> for Frame {
    fn from(img: ::image::RgbaImage) -> Self {
        let (w, h) = img.dimensions();
        Frame::new(w as usize, h as usize, PixelLayout::Rgba8, img.into_raw())
    }
}

impl From<::image::GrayImage> for Frame {
    fn from(img: ::image::GrayImage) -> Self {
        let (w, h) = img.dimensions();
        Frame::new(w as usize, h as usize, PixelLayout::Gray8, img.into_raw())
    }
}

/// Binary threshold mask: `255` for accepted pixels, `0` otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>, // row-major, len = w*h
}

impl Mask {
    pub const ON: u8 = u8::MAX;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x] != 0
    }

    pub fn count_on(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Copy into an `image` buffer for display or saving.
    pub fn to_gray_image(&self) -> Option<::image::GrayImage> {
        ::image::GrayImage::from_raw(self.width as u32, self.height as u32, self.data.clone())
    }
}
