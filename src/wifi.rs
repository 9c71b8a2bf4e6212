use anyhow::Result;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};

const CONNECT_ATTEMPTS: u32 = 5;

pub struct WifiLink {
    pub wifi: Box<EspWifi<'static>>,
    pub ip_address: Option<String>,
}

impl WifiLink {
    pub fn is_up(&self) -> bool {
        self.ip_address.is_some()
    }
}

/// Log association state from ESP-IDF internals.
fn log_wifi_diag(label: &str) {
    unsafe {
        let mut ap_info: esp_idf_sys::wifi_ap_record_t = core::mem::zeroed();
        let rc = esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap_info);
        if rc == esp_idf_sys::ESP_OK {
            let ssid = core::str::from_utf8(&ap_info.ssid)
                .unwrap_or("?")
                .trim_end_matches('\0');
            info!(
                "WiFi [{}]: assoc=YES rssi={} ch={} ssid={}",
                label, ap_info.rssi, ap_info.primary, ssid
            );
        } else {
            info!("WiFi [{}]: assoc=NO (ap_info err={})", label, rc);
        }
    }
}

/// Try to associate, cycling the radio between attempts. Returns the IP on
/// success; `None` leaves the retry to the caller.
fn associate(blocking_wifi: &mut BlockingWifi<&mut EspWifi<'static>>) -> Option<String> {
    let _ = blocking_wifi.start();

    let mut connected = false;
    for attempt in 1..=CONNECT_ATTEMPTS {
        match blocking_wifi.connect() {
            Ok(_) => {
                info!("WiFi connect OK on attempt {}", attempt);
                log_wifi_diag(&format!("attempt {} OK", attempt));
                connected = true;
                break;
            }
            Err(e) => {
                warn!(
                    "WiFi connect attempt {}/{} failed: {}",
                    attempt, CONNECT_ATTEMPTS, e
                );
                log_wifi_diag(&format!("attempt {} FAIL", attempt));
                if attempt < CONNECT_ATTEMPTS {
                    let _ = blocking_wifi.disconnect();
                    blocking_wifi.stop().ok();
                    std::thread::sleep(std::time::Duration::from_millis(500));
                    blocking_wifi.start().ok();
                    std::thread::sleep(std::time::Duration::from_millis(300));
                }
            }
        }
    }
    if !connected {
        return None;
    }

    info!("WiFi associated, waiting for IP address...");
    if let Err(e) = blocking_wifi.wait_netif_up() {
        warn!("WiFi netif did not come up: {}", e);
        return None;
    }
    match blocking_wifi.wifi().sta_netif().get_ip_info() {
        Ok(ip_info) => {
            info!("WiFi connected, IP: {}", ip_info.ip);
            Some(ip_info.ip.to_string())
        }
        Err(e) => {
            warn!("WiFi has no IP info: {}", e);
            None
        }
    }
}

pub fn connect_wifi(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
    ssid: &str,
    password: &str,
) -> Result<WifiLink> {
    let mut esp_wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))?;

    let auth = if password.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };

    let mut wifi_ssid = heapless::String::<32>::new();
    let mut wifi_pass = heapless::String::<64>::new();
    wifi_ssid.push_str(ssid).ok();
    wifi_pass.push_str(password).ok();

    esp_wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: wifi_ssid,
        password: wifi_pass,
        auth_method: auth,
        ..Default::default()
    }))?;

    info!("WiFi connecting to '{}'...", ssid);
    let ip_address = {
        let mut blocking_wifi = BlockingWifi::wrap(&mut esp_wifi, sysloop)?;
        associate(&mut blocking_wifi)
    };

    Ok(WifiLink {
        wifi: Box::new(esp_wifi),
        ip_address,
    })
}

pub fn reconnect(link: &mut WifiLink, sysloop: EspSystemEventLoop) -> Result<()> {
    let mut blocking_wifi = BlockingWifi::wrap(link.wifi.as_mut(), sysloop)?;
    link.ip_address = associate(&mut blocking_wifi);
    Ok(())
}
