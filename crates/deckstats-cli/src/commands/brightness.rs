use crate::hid::open_deck_or_exit;

pub fn run(percent: u8, serial: Option<&str>) {
    let mut deck = open_deck_or_exit(serial);
    if let Err(e) = deckstats_core::set_brightness(&mut deck, percent) {
        eprintln!("Error setting brightness: {e}");
        std::process::exit(1);
    }
    println!("Brightness set to {percent}%.");
}
