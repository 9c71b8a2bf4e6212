use anyhow::Result;
use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{Dimensions, OriginDimensions, Size},
    pixelcolor::BinaryColor,
    primitives::Rectangle,
    Pixel,
};

/// SSD1306 128x32 module.
pub const OLED_WIDTH: u32 = 128;
pub const OLED_HEIGHT: u32 = 32;

/// Rows per controller page.
const PAGE_ROWS: u32 = 8;

/// A physical display that accepts whole frames in SSD1306 page order.
pub trait Panel {
    fn write_frame(&mut self, width: u32, height: u32, pages: &[u8]) -> Result<()>;
}

/// 1-bit framebuffer laid out the way the SSD1306 expects it.
///
/// Byte `page * width + x` holds the 8 vertical pixels of column `x` in that
/// page, least significant bit at the top.
pub struct Framebuffer {
    buf: Vec<u8>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let pages = height.div_ceil(PAGE_ROWS);
        Self {
            buf: vec![0u8; (width * pages) as usize],
            width,
            height,
        }
    }

    pub fn clear_color(&mut self, color: BinaryColor) {
        let fill = if color.is_on() { 0xFF } else { 0x00 };
        self.buf.fill(fill);
    }

    fn index(&self, x: u32, y: u32) -> (usize, u8) {
        let idx = ((y / PAGE_ROWS) * self.width + x) as usize;
        (idx, 1 << (y % PAGE_ROWS))
    }

    fn set(&mut self, x: u32, y: u32, on: bool) {
        let (idx, mask) = self.index(x, y);
        if on {
            self.buf[idx] |= mask;
        } else {
            self.buf[idx] &= !mask;
        }
    }

    /// Whether the pixel at (x, y) is lit. Out of range reads as off.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (idx, mask) = self.index(x, y);
        self.buf[idx] & mask != 0
    }

    /// Number of lit pixels in rows `y0..y1`.
    pub fn lit_in_rows(&self, y0: u32, y1: u32) -> usize {
        (y0..y1.min(self.height))
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y))
            .count()
    }

    pub fn as_pages(&self) -> &[u8] {
        &self.buf
    }

    pub fn flush_to_panel<P: Panel + ?Sized>(&self, panel: &mut P) -> Result<()> {
        panel.write_frame(self.width, self.height, &self.buf)
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let w = self.width;
        let h = self.height;
        for Pixel(point, color) in pixels {
            let x = point.x;
            let y = point.y;
            if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
                self.set(x as u32, y as u32, color.is_on());
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let display = self.bounding_box();
        let area = area.intersection(&display);
        for y in area.rows() {
            for x in area.columns() {
                self.set(x as u32, y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::PrimitiveStyle;

    #[test]
    fn page_layout_matches_controller() {
        let mut fb = Framebuffer::new(OLED_WIDTH, OLED_HEIGHT);
        assert_eq!(fb.as_pages().len(), 512);

        Pixel(Point::new(3, 9), BinaryColor::On).draw(&mut fb).ok();
        // page 1, column 3, bit 1
        assert_eq!(fb.as_pages()[128 + 3], 0b0000_0010);
        assert!(fb.pixel(3, 9));
        assert!(!fb.pixel(3, 8));
    }

    #[test]
    fn drawing_is_clipped() {
        let mut fb = Framebuffer::new(OLED_WIDTH, OLED_HEIGHT);
        Rectangle::new(Point::new(120, 28), Size::new(20, 20))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .ok();
        assert_eq!(fb.lit_in_rows(0, OLED_HEIGHT), 8 * 4);
        assert!(!fb.pixel(200, 40));
    }

    #[test]
    fn clear_resets_everything() {
        let mut fb = Framebuffer::new(OLED_WIDTH, OLED_HEIGHT);
        fb.clear_color(BinaryColor::On);
        assert_eq!(fb.lit_in_rows(0, OLED_HEIGHT), 128 * 32);
        fb.clear_color(BinaryColor::Off);
        assert_eq!(fb.lit_in_rows(0, OLED_HEIGHT), 0);
    }
}
