#[cfg(target_os = "espidf")]
mod button;
#[cfg(target_os = "espidf")]
mod panel;
#[cfg(target_os = "espidf")]
mod wifi;
#[cfg(target_os = "espidf")]
mod ws;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    device::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!(
        "adsb-display is ESP32 firmware; build it with --target xtensa-esp32-espidf \
         (the library and its tests build on any host)"
    )
}

#[cfg(target_os = "espidf")]
mod device {
    use std::time::Duration;

    use adsb_display::config::{self, Config};
    use adsb_display::display::{DisplaySink, CONNECTING_WIFI, WAITING_FOR_DATA};
    use adsb_display::framebuffer::{OLED_HEIGHT, OLED_WIDTH};
    use adsb_display::input::Debounced;
    use adsb_display::oled::TextDisplay;
    use adsb_display::supervisor::{retry_until_up, Settings, Supervisor, SystemClock};
    use anyhow::Result;
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_hal::units::Hertz;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
    use log::info;

    use crate::{button, panel, wifi, ws};

    // ── I2C (SSD1306) ───────────────────────────────────────────────────
    const I2C_FREQ_HZ: u32 = 400_000;

    const WS_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Read a string from NVS, returning None if the key is absent or on error.
    fn nvs_get_str(nvs: &EspNvs<NvsDefault>, key: &str) -> Option<String> {
        let len = match nvs.str_len(key) {
            Ok(Some(len)) => len,
            _ => return None,
        };

        let mut buf = vec![0u8; len];
        match nvs.get_str(key, &mut buf) {
            Ok(Some(val)) => Some(val.to_string()),
            _ => None,
        }
    }

    pub fn run() -> Result<()> {
        esp_idf_sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();

        info!("BOOT adsb-display v{}", env!("CARGO_PKG_VERSION"));

        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;
        let nvs_partition = EspDefaultNvsPartition::take()?;

        // ── 1. Config ──
        let cfg = {
            let nvs = EspNvs::new(nvs_partition.clone(), config::NS, true)?;
            Config::load(|key| nvs_get_str(&nvs, key))
        };

        // ── 2. OLED ──
        let i2c_config = I2cConfig::new().baudrate(Hertz(I2C_FREQ_HZ));
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio4,
            peripherals.pins.gpio5,
            &i2c_config,
        )?;
        let panel = panel::OledPanel::new(i2c)?;
        let mut oled = TextDisplay::new(panel, OLED_WIDTH, OLED_HEIGHT, cfg.display_width_columns);
        oled.show_text(CONNECTING_WIFI);

        // ── 3. WiFi ──
        let mut link = wifi::connect_wifi(
            peripherals.modem,
            sysloop.clone(),
            nvs_partition,
            &cfg.wifi_ssid,
            &cfg.wifi_pass,
        )?;
        let mut clock = SystemClock;
        let what = format!("WiFi '{}'", cfg.wifi_ssid);
        let mut first = true;
        retry_until_up(&mut clock, &mut oled, cfg.retry_interval, &what, || -> Result<bool> {
            if !std::mem::take(&mut first) {
                wifi::reconnect(&mut link, sysloop.clone())?;
            }
            Ok(link.is_up())
        });

        // ── 4. Feed ──
        oled.show_text(WAITING_FOR_DATA);

        let mut button = Debounced::new(button::Button::new(cfg.button_pin)?, cfg.debounce_samples);
        let connector = ws::WsConnector {
            connect_timeout: WS_CONNECT_TIMEOUT,
        };
        let mut supervisor = Supervisor::new(connector, Settings::from(&cfg));

        info!("Entering main loop");
        supervisor.run_forever(&mut clock, &mut button, &mut oled)
    }
}
