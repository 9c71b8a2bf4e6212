use anyhow::{anyhow, Result};
use esp_idf_hal::i2c::I2cDriver;
use ssd1306::{mode::BasicMode, prelude::*, I2CDisplayInterface, Ssd1306};

use adsb_display::framebuffer::Panel;

/// SSD1306 128x32 on I2C, fed whole frames from the framebuffer.
pub struct OledPanel {
    display: Ssd1306<I2CInterface<I2cDriver<'static>>, DisplaySize128x32, BasicMode>,
}

impl OledPanel {
    pub fn new(i2c: I2cDriver<'static>) -> Result<Self> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut display = Ssd1306::new(interface, DisplaySize128x32, DisplayRotation::Rotate0);
        display
            .init()
            .map_err(|e| anyhow!("ssd1306 init: {:?}", e))?;
        Ok(Self { display })
    }
}

impl Panel for OledPanel {
    fn write_frame(&mut self, width: u32, height: u32, pages: &[u8]) -> Result<()> {
        self.display
            .set_draw_area((0, 0), (width as u8, height as u8))
            .map_err(|e| anyhow!("ssd1306 draw area: {:?}", e))?;
        self.display
            .draw(pages)
            .map_err(|e| anyhow!("ssd1306 draw: {:?}", e))
    }
}
