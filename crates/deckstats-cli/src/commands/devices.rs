use deckstats_core::protocol::{PRODUCT_ID, VENDOR_ID};

use crate::hid::{hid_api, list_decks};

pub fn run() {
    let api = match hid_api() {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error initialising HID: {e}");
            std::process::exit(1);
        }
    };

    let decks = list_decks(&api);
    if decks.is_empty() {
        println!("No decks found ({VENDOR_ID:04x}:{PRODUCT_ID:04x}).");
        return;
    }

    println!("{} deck(s) found:", decks.len());
    for deck in decks {
        println!("  {}", deck.path);
        println!("    Product: {}", deck.product.as_deref().unwrap_or("-"));
        println!("    Serial:  {}", deck.serial.as_deref().unwrap_or("-"));
    }
}
