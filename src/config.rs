use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};

/// NVS namespace holding overrides on the device.
pub const NS: &str = "adsb_cfg";

pub const KEY_SERVICE_URL: &str = "svc_url";
pub const KEY_WRAP_COLUMNS: &str = "wrap_cols";
pub const KEY_RETRY_MS: &str = "retry_ms";
pub const KEY_POLL_MS: &str = "poll_ms";
pub const KEY_WIFI_SSID: &str = "wifi_ssid";
pub const KEY_WIFI_PASS: &str = "wifi_pass";
pub const KEY_BUTTON_PIN: &str = "btn_pin";
pub const KEY_DEBOUNCE: &str = "debounce";

const DEFAULT_SERVICE_URL: &str = match option_env!("LOCAL_SERVICE_URL") {
    Some(url) => url,
    None => "ws://192.168.86.21:8080/ws",
};
const DEFAULT_WIFI_SSID: &str = match option_env!("LOCAL_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};
const DEFAULT_WIFI_PASS: &str = match option_env!("LOCAL_WIFI_PASS") {
    Some(pass) => pass,
    None => "",
};
const DEFAULT_WRAP_COLUMNS: usize = 14;
const DEFAULT_RETRY_MS: u64 = 1_000;
const DEFAULT_POLL_MS: u64 = 1_000;
const DEFAULT_BUTTON_PIN: i32 = 2;
const DEFAULT_DEBOUNCE: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// WebSocket endpoint of the aircraft feed.
    pub service_url: String,
    /// Wrap width for free text on the OLED.
    pub display_width_columns: usize,
    /// Fixed pause between reconnect attempts.
    pub retry_interval: Duration,
    /// How long one tick waits for a message.
    pub poll_timeout: Duration,
    pub wifi_ssid: String,
    pub wifi_pass: String,
    /// GPIO of the active-low push button.
    pub button_pin: i32,
    /// Consistent reads required before the button changes state.
    pub debounce_samples: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            display_width_columns: DEFAULT_WRAP_COLUMNS,
            retry_interval: Duration::from_millis(DEFAULT_RETRY_MS),
            poll_timeout: Duration::from_millis(DEFAULT_POLL_MS),
            wifi_ssid: DEFAULT_WIFI_SSID.to_string(),
            wifi_pass: DEFAULT_WIFI_PASS.to_string(),
            button_pin: DEFAULT_BUTTON_PIN,
            debounce_samples: DEFAULT_DEBOUNCE,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim_end_matches('\0').trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a positive number, warning and falling back on anything else.
fn positive<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
{
    let Some(raw) = non_empty(raw) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(v) if v > T::default() => v,
        _ => {
            warn!("config {} = {:?} is not a positive number; using {}", key, raw, default);
            default
        }
    }
}

/// Parse a GPIO number. GPIO0 is a valid input; negative numbers are not.
fn gpio(key: &str, raw: Option<String>, default: i32) -> i32 {
    let Some(raw) = non_empty(raw) else {
        return default;
    };
    match raw.parse::<i32>() {
        Ok(pin) if pin >= 0 => pin,
        _ => {
            warn!("config {} = {:?} is not a GPIO number; using {}", key, raw, default);
            default
        }
    }
}

impl Config {
    /// Start from the compiled-in defaults and apply every override `lookup`
    /// knows about. Unset, blank or invalid values keep the default.
    pub fn load<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Config::default();

        let service_url = non_empty(lookup(KEY_SERVICE_URL)).unwrap_or(d.service_url);
        info!("config service_url = {:?}", service_url);

        let display_width_columns =
            positive(KEY_WRAP_COLUMNS, lookup(KEY_WRAP_COLUMNS), d.display_width_columns);
        info!("config wrap_cols = {}", display_width_columns);

        let retry_ms = positive(KEY_RETRY_MS, lookup(KEY_RETRY_MS), DEFAULT_RETRY_MS);
        info!("config retry_ms = {}", retry_ms);

        let poll_ms = positive(KEY_POLL_MS, lookup(KEY_POLL_MS), DEFAULT_POLL_MS);
        info!("config poll_ms = {}", poll_ms);

        let wifi_ssid = non_empty(lookup(KEY_WIFI_SSID)).unwrap_or(d.wifi_ssid);
        info!("config wifi_ssid = {:?}", wifi_ssid);

        let wifi_pass = non_empty(lookup(KEY_WIFI_PASS)).unwrap_or(d.wifi_pass);
        info!("config wifi_pass = <{} chars>", wifi_pass.len());

        let button_pin = gpio(KEY_BUTTON_PIN, lookup(KEY_BUTTON_PIN), d.button_pin);
        info!("config btn_pin = {}", button_pin);

        let debounce_samples = positive(KEY_DEBOUNCE, lookup(KEY_DEBOUNCE), d.debounce_samples);
        info!("config debounce = {}", debounce_samples);

        Config {
            service_url,
            display_width_columns,
            retry_interval: Duration::from_millis(retry_ms),
            poll_timeout: Duration::from_millis(poll_ms),
            wifi_ssid,
            wifi_pass,
            button_pin,
            debounce_samples,
        }
    }
}
