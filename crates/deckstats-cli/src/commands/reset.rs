use crate::hid::open_deck_or_exit;

pub fn run(serial: Option<&str>) {
    let mut deck = open_deck_or_exit(serial);
    if let Err(e) = deckstats_core::reset(&mut deck) {
        eprintln!("Error resetting deck: {e}");
        std::process::exit(1);
    }
    println!("Deck reset.");
}
