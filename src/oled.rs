use embedded_graphics::{
    mono_font::MonoTextStyle,
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use log::{info, warn};
use profont::PROFONT_7_POINT;

use crate::display::DisplaySink;
use crate::framebuffer::{Framebuffer, Panel};

/// Vertical distance between text rows, in pixels.
pub const LINE_HEIGHT: i32 = 10;

/// Line-oriented text renderer for a small monochrome panel.
pub struct TextDisplay<P: Panel> {
    fb: Framebuffer,
    panel: P,
    wrap_width: usize,
    last_lines: Vec<String>,
}

impl<P: Panel> TextDisplay<P> {
    pub fn new(panel: P, width: u32, height: u32, wrap_width: usize) -> Self {
        Self {
            fb: Framebuffer::new(width, height),
            panel,
            wrap_width,
            last_lines: Vec::new(),
        }
    }

    /// The lines currently on screen.
    pub fn last_lines(&self) -> &[String] {
        &self.last_lines
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }
}

impl<P: Panel> DisplaySink for TextDisplay<P> {
    fn show_lines(&mut self, lines: &[String]) {
        self.fb.clear_color(BinaryColor::Off);

        let style = MonoTextStyle::new(&PROFONT_7_POINT, BinaryColor::On);
        let mut y = 0;
        for line in lines {
            info!("oled: {}", line);
            Text::with_baseline(line, Point::new(0, y), style, Baseline::Top)
                .draw(&mut self.fb)
                .ok();
            y += LINE_HEIGHT;
        }

        if let Err(e) = self.fb.flush_to_panel(&mut self.panel) {
            warn!("oled flush failed: {:#}", e);
        }
        self.last_lines = lines.to_vec();
    }

    fn wrap_width(&self) -> usize {
        self.wrap_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{OLED_HEIGHT, OLED_WIDTH};

    #[derive(Default)]
    struct CapturePanel {
        frames: Vec<Vec<u8>>,
        fail: bool,
    }

    impl Panel for CapturePanel {
        fn write_frame(&mut self, _width: u32, _height: u32, pages: &[u8]) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("i2c nack");
            }
            self.frames.push(pages.to_vec());
            Ok(())
        }
    }

    fn display() -> TextDisplay<CapturePanel> {
        TextDisplay::new(CapturePanel::default(), OLED_WIDTH, OLED_HEIGHT, 14)
    }

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lines_land_on_fixed_rows() {
        let mut d = display();
        d.show_lines(&lines(&["JFK to LAX", "", "AB123"]));

        assert!(d.framebuffer().lit_in_rows(0, 10) > 0);
        assert_eq!(d.framebuffer().lit_in_rows(10, 20), 0);
        assert!(d.framebuffer().lit_in_rows(20, 30) > 0);
        assert_eq!(d.panel().frames.len(), 1);
        assert_eq!(d.last_lines(), lines(&["JFK to LAX", "", "AB123"]).as_slice());
    }

    #[test]
    fn each_show_clears_the_previous_frame() {
        let mut d = display();
        d.show_lines(&lines(&["one", "two", "three"]));
        d.show_lines(&lines(&["only"]));

        assert_eq!(d.framebuffer().lit_in_rows(10, OLED_HEIGHT), 0);
        assert_eq!(d.panel().frames.len(), 2);
    }

    #[test]
    fn text_is_wrapped_before_drawing() {
        let mut d = display();
        d.show_text("London Heathrow (United Kingdom)");
        assert_eq!(
            d.last_lines(),
            lines(&["London Heathrow", "(United", "Kingdom)"]).as_slice()
        );
    }

    #[test]
    fn flush_failures_are_swallowed() {
        let mut d = TextDisplay::new(
            CapturePanel { frames: Vec::new(), fail: true },
            OLED_WIDTH,
            OLED_HEIGHT,
            14,
        );
        d.show_text("Error: boom");
        assert_eq!(d.last_lines(), lines(&["Error: boom"]).as_slice());
        assert!(d.panel().frames.is_empty());
    }
}
