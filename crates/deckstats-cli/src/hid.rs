//! hidapi-backed deck discovery and transport.

use hidapi::{HidApi, HidDevice, HidError};
use log::debug;

use deckstats_core::protocol::{PRODUCT_ID, VENDOR_ID};
use deckstats_core::{DeckError, DeckTransport, Result};

fn transport_error(err: HidError) -> DeckError {
    DeckError::Transport(err.to_string())
}

/// An attached deck as reported by the HID layer.
#[derive(Debug, Clone)]
pub struct DeckInfo {
    pub path: String,
    pub serial: Option<String>,
    pub product: Option<String>,
}

/// One open HID handle to a deck.
pub struct HidTransport {
    device: HidDevice,
}

impl DeckTransport for HidTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.device.write(data).map_err(transport_error)
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        self.device
            .send_feature_report(data)
            .map_err(transport_error)
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        self.device
            .read_timeout(buf, timeout_ms)
            .map_err(transport_error)
    }
}

pub fn hid_api() -> Result<HidApi> {
    HidApi::new().map_err(transport_error)
}

/// Every attached device with the deck's vendor and product id.
pub fn list_decks(api: &HidApi) -> Vec<DeckInfo> {
    api.device_list()
        .filter(|d| d.vendor_id() == VENDOR_ID && d.product_id() == PRODUCT_ID)
        .map(|d| DeckInfo {
            path: d.path().to_string_lossy().into_owned(),
            serial: d.serial_number().map(str::to_string),
            product: d.product_string().map(str::to_string),
        })
        .collect()
}

/// Open the first deck, or the one with `serial`.
pub fn open_deck(api: &HidApi, serial: Option<&str>) -> Result<HidTransport> {
    let device = match serial {
        Some(serial) => api.open_serial(VENDOR_ID, PRODUCT_ID, serial),
        None => api.open(VENDOR_ID, PRODUCT_ID),
    }
    .map_err(|e| {
        DeckError::Transport(format!(
            "cannot open deck {VENDOR_ID:04x}:{PRODUCT_ID:04x}: {e}"
        ))
    })?;
    debug!("opened deck {VENDOR_ID:04x}:{PRODUCT_ID:04x}");
    Ok(HidTransport { device })
}

/// Open a deck or print the error and exit, as every device command does.
pub fn open_deck_or_exit(serial: Option<&str>) -> HidTransport {
    let api = match hid_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error initialising HID: {e}");
            std::process::exit(1);
        }
    };
    match open_deck(&api, serial) {
        Ok(deck) => deck,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run `deckstats devices` to list attached decks.");
            std::process::exit(1);
        }
    }
}
