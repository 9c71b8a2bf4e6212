use anyhow::Result;
use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};

use adsb_display::input::InputSource;

/// Push button wired to ground; the internal pull-up holds it high.
pub struct Button {
    pin: PinDriver<'static, AnyIOPin, Input>,
}

impl Button {
    pub fn new(gpio: i32) -> Result<Self> {
        // SAFETY: the configured button pin is not claimed by any other driver.
        let pin = unsafe { AnyIOPin::new(gpio) };
        let mut pin = PinDriver::input(pin)?;
        pin.set_pull(Pull::Up)?;
        Ok(Self { pin })
    }
}

impl InputSource for Button {
    fn is_pressed(&mut self) -> bool {
        self.pin.is_low()
    }
}
