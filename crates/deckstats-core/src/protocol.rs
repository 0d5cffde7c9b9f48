//! Wire protocol of the 15-key, 72x72 stream deck.
//!
//! A key image is pushed as two 8191-byte output reports ("pages"):
//!
//! - page 1: 16-byte command header, 54-byte BMP file/info header, then the
//!   first [`FIRST_PAGE_PIXELS`] B,G,R triples;
//! - page 2: 6-byte command header, 10 zero bytes, then the remaining
//!   [`SECOND_PAGE_PIXELS`] triples.
//!
//! Both pages are zero-padded to [`PACKET_LEN`]. Byte 5 of each command header
//! carries the 1-based key number. The split point is fixed by the device
//! firmware and does not follow from the payload size.
//!
//! Device state is changed with 17-byte feature reports (reset, brightness),
//! and key presses arrive as input reports with id `0x01` followed by one
//! byte per key.

use log::{debug, trace};

use crate::encode::{ENCODED_BYTES, ENCODED_CHANNELS, EncodedImage};
use crate::error::{DeckError, Result};
use crate::grid::ICON_SIZE;
use crate::transport::DeckTransport;

/// USB vendor id.
pub const VENDOR_ID: u16 = 0x0FD9;
/// USB product id of the original 15-key model.
pub const PRODUCT_ID: u16 = 0x0060;
/// Number of keys (5 columns x 3 rows).
pub const KEY_COUNT: u8 = 15;

/// Length of every image output report.
pub const PACKET_LEN: usize = 8191;
/// Pixel triples carried by page 1.
pub const FIRST_PAGE_PIXELS: usize = 2583;
/// Pixel triples carried by page 2.
pub const SECOND_PAGE_PIXELS: usize = 2601;

/// Offset of the 1-based key number inside both command headers.
pub const KEY_BYTE_OFFSET: usize = 5;

/// Page 1 command header. Byte [`KEY_BYTE_OFFSET`] is patched per key.
pub const PAGE1_COMMAND: [u8; 16] = [
    0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// BMP file header + BITMAPINFOHEADER for a 72x72, 24-bit image.
pub const BITMAP_HEADER: [u8; 54] = [
    0x42, 0x4d, 0xf6, 0x3c, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x36, 0x00, 0x00, 0x00, 0x28, 0x00, //
    0x00, 0x00, 0x48, 0x00, 0x00, 0x00, 0x48, 0x00, //
    0x00, 0x00, 0x01, 0x00, 0x18, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0xc0, 0x3c, 0x00, 0x00, 0xc4, 0x0e, //
    0x00, 0x00, 0xc4, 0x0e, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Page 2 command header. Byte [`KEY_BYTE_OFFSET`] is patched per key.
pub const PAGE2_COMMAND: [u8; 6] = [0x02, 0x01, 0x02, 0x00, 0x01, 0x00];

/// Zero bytes between the page 2 command header and its pixel data.
pub const PAGE2_PADDING: usize = 10;

/// Length of every feature report.
pub const FEATURE_REPORT_LEN: usize = 17;

/// Feature report that blanks every key and shows the vendor logo.
pub const RESET_REPORT: [u8; FEATURE_REPORT_LEN] = [
    0x0B, 0x63, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Brightness feature report. Byte [`BRIGHTNESS_OFFSET`] holds the percentage.
pub const BRIGHTNESS_REPORT: [u8; FEATURE_REPORT_LEN] = [
    0x05, 0x55, 0xAA, 0xD1, 0x01, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub const BRIGHTNESS_OFFSET: usize = 5;

/// Report id of key state input reports.
pub const INPUT_REPORT_ID: u8 = 0x01;
/// Buffer size that fits any input report the device sends.
pub const INPUT_REPORT_LEN: usize = 255;

const _: () = assert!(FIRST_PAGE_PIXELS + SECOND_PAGE_PIXELS == ICON_SIZE * ICON_SIZE);
const _: () = assert!(
    PAGE1_COMMAND.len() + BITMAP_HEADER.len() + FIRST_PAGE_PIXELS * ENCODED_CHANNELS <= PACKET_LEN
);
const _: () = assert!(
    PAGE2_COMMAND.len() + PAGE2_PADDING + SECOND_PAGE_PIXELS * ENCODED_CHANNELS <= PACKET_LEN
);

/// Reject key indices the device cannot address.
pub fn check_key(key: u8) -> Result<()> {
    if key >= KEY_COUNT {
        return Err(DeckError::InvalidKey {
            key,
            key_count: KEY_COUNT,
        });
    }
    Ok(())
}

/// Split an encoded image into the two output reports for `key` (0-based).
pub fn frame_key_image(key: u8, image: &EncodedImage) -> Result<[Vec<u8>; 2]> {
    check_key(key)?;
    let key_number = key + 1;
    let (first, second) = image
        .as_bytes()
        .split_at(FIRST_PAGE_PIXELS * ENCODED_CHANNELS);
    debug_assert_eq!(first.len() + second.len(), ENCODED_BYTES);

    let mut page1 = Vec::with_capacity(PACKET_LEN);
    page1.extend_from_slice(&PAGE1_COMMAND);
    page1[KEY_BYTE_OFFSET] = key_number;
    page1.extend_from_slice(&BITMAP_HEADER);
    page1.extend_from_slice(first);
    page1.resize(PACKET_LEN, 0);

    let mut page2 = Vec::with_capacity(PACKET_LEN);
    page2.extend_from_slice(&PAGE2_COMMAND);
    page2[KEY_BYTE_OFFSET] = key_number;
    page2.resize(PAGE2_COMMAND.len() + PAGE2_PADDING, 0);
    page2.extend_from_slice(second);
    page2.resize(PACKET_LEN, 0);

    Ok([page1, page2])
}

/// Frame `image` and send both pages to `key`.
///
/// Stops at the first failed or short write; the second page is never sent
/// after a failed first page. Nothing is retried.
pub fn write_key_image<T: DeckTransport + ?Sized>(
    transport: &mut T,
    key: u8,
    image: &EncodedImage,
) -> Result<()> {
    let pages = frame_key_image(key, image)?;
    for (page_no, page) in pages.iter().enumerate() {
        trace!("key {key}: writing page {} ({} bytes)", page_no + 1, page.len());
        let written = transport.write(page)?;
        if written < page.len() {
            return Err(DeckError::ShortWrite {
                expected: page.len(),
                written,
            });
        }
    }
    debug!("key {key}: image written");
    Ok(())
}

/// Build the brightness feature report. `percent` is clamped to 100.
pub fn brightness_report(percent: u8) -> [u8; FEATURE_REPORT_LEN] {
    let mut report = BRIGHTNESS_REPORT;
    report[BRIGHTNESS_OFFSET] = percent.min(100);
    report
}

pub fn set_brightness<T: DeckTransport + ?Sized>(transport: &mut T, percent: u8) -> Result<()> {
    debug!("setting brightness to {}%", percent.min(100));
    transport.send_feature_report(&brightness_report(percent))
}

pub fn reset<T: DeckTransport + ?Sized>(transport: &mut T) -> Result<()> {
    debug!("resetting device");
    transport.send_feature_report(&RESET_REPORT)
}

/// Pressed state of every key, in device key order.
pub type KeyStates = [bool; KEY_COUNT as usize];

/// Decode a key state input report. Returns `None` for foreign or short reports.
pub fn parse_key_states(report: &[u8]) -> Option<KeyStates> {
    if report.first() != Some(&INPUT_REPORT_ID) || report.len() < 1 + KEY_COUNT as usize {
        return None;
    }
    let mut states = [false; KEY_COUNT as usize];
    for (state, &byte) in states.iter_mut().zip(&report[1..]) {
        *state = byte != 0;
    }
    Some(states)
}

/// Keys whose state differs between two reports, with their new state.
pub fn key_changes(previous: &KeyStates, current: &KeyStates) -> Vec<(u8, bool)> {
    previous
        .iter()
        .zip(current)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(key, (_, &pressed))| (key as u8, pressed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode;
    use crate::grid::PixelGrid;
    use crate::transport::RecordingTransport;

    fn striped_image() -> EncodedImage {
        let mut grid = PixelGrid::new();
        for y in 0..ICON_SIZE {
            for x in 0..ICON_SIZE {
                grid.set_pixel(x, y, [y as u8, x as u8, 0xAB, 0xFF]);
            }
        }
        encode(&grid)
    }

    // -----------------------------------------------------------------------
    // Header templates
    // -----------------------------------------------------------------------

    #[test]
    fn page1_header_is_seventy_bytes() {
        assert_eq!(PAGE1_COMMAND.len() + BITMAP_HEADER.len(), 70);
    }

    #[test]
    fn bitmap_header_describes_72x72_24bit() {
        assert_eq!(&BITMAP_HEADER[..2], b"BM");
        // Pixel data offset.
        assert_eq!(BITMAP_HEADER[10], 0x36);
        // Width and height.
        assert_eq!(BITMAP_HEADER[18], 72);
        assert_eq!(BITMAP_HEADER[22], 72);
        // Bits per pixel.
        assert_eq!(BITMAP_HEADER[28], 24);
        // Image size: 72 * 72 * 3 = 0x3cc0.
        assert_eq!(
            u32::from_le_bytes([BITMAP_HEADER[34], BITMAP_HEADER[35], 0, 0]),
            ENCODED_BYTES as u32
        );
    }

    // -----------------------------------------------------------------------
    // Framing
    // -----------------------------------------------------------------------

    #[test]
    fn framing_key_three_marks_both_pages() {
        let [p1, p2] = frame_key_image(3, &striped_image()).unwrap();
        assert_eq!(p1.len(), PACKET_LEN);
        assert_eq!(p2.len(), PACKET_LEN);
        assert_eq!(p1[5], 4);
        assert_eq!(p2[5], 4);
        assert_eq!(&p1[..3], &[0x02, 0x01, 0x01]);
        assert_eq!(&p2[..5], &[0x02, 0x01, 0x02, 0x00, 0x01]);
    }

    #[test]
    fn pages_carry_the_whole_image_in_order() {
        let image = striped_image();
        let [p1, p2] = frame_key_image(0, &image).unwrap();

        let first_len = FIRST_PAGE_PIXELS * ENCODED_CHANNELS;
        let second_len = SECOND_PAGE_PIXELS * ENCODED_CHANNELS;
        assert_eq!(&p1[..16], &{
            let mut h = PAGE1_COMMAND;
            h[KEY_BYTE_OFFSET] = 1;
            h
        });
        assert_eq!(&p1[16..70], &BITMAP_HEADER);
        assert_eq!(&p1[70..70 + first_len], &image.as_bytes()[..first_len]);
        assert!(p1[70 + first_len..].iter().all(|&b| b == 0));

        assert!(p2[6..16].iter().all(|&b| b == 0));
        assert_eq!(&p2[16..16 + second_len], &image.as_bytes()[first_len..]);
        assert!(p2[16 + second_len..].iter().all(|&b| b == 0));
    }

    #[test]
    fn framing_rejects_out_of_range_key() {
        let err = frame_key_image(KEY_COUNT, &striped_image()).unwrap_err();
        assert!(matches!(err, DeckError::InvalidKey { key: 15, .. }));
    }

    #[test]
    fn last_key_is_addressable() {
        let [p1, _] = frame_key_image(KEY_COUNT - 1, &striped_image()).unwrap();
        assert_eq!(p1[KEY_BYTE_OFFSET], KEY_COUNT);
    }

    // -----------------------------------------------------------------------
    // Transport interaction
    // -----------------------------------------------------------------------

    #[test]
    fn write_key_image_sends_exactly_two_packets() {
        let mut t = RecordingTransport::new();
        write_key_image(&mut t, 8, &striped_image()).unwrap();
        assert_eq!(t.writes.len(), 2);
        assert!(t.writes.iter().all(|w| w.len() == PACKET_LEN));
        assert_eq!(t.writes[0][2], 0x01);
        assert_eq!(t.writes[1][2], 0x02);
    }

    #[test]
    fn failed_first_page_stops_the_frame() {
        let mut t = RecordingTransport::new().fail_write_at(0);
        let err = write_key_image(&mut t, 0, &striped_image()).unwrap_err();
        assert!(matches!(err, DeckError::Transport(_)));
        assert!(t.writes.is_empty());
    }

    struct HalfWrites;

    impl DeckTransport for HalfWrites {
        fn write(&mut self, data: &[u8]) -> Result<usize> {
            Ok(data.len() / 2)
        }
        fn send_feature_report(&mut self, _data: &[u8]) -> Result<()> {
            Ok(())
        }
        fn read_timeout(&mut self, _buf: &mut [u8], _timeout_ms: i32) -> Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn short_write_is_reported() {
        let err = write_key_image(&mut HalfWrites, 0, &striped_image()).unwrap_err();
        assert!(matches!(
            err,
            DeckError::ShortWrite {
                expected: PACKET_LEN,
                written: 4095
            }
        ));
    }

    // -----------------------------------------------------------------------
    // Feature reports
    // -----------------------------------------------------------------------

    #[test]
    fn brightness_is_clamped() {
        assert_eq!(brightness_report(42)[BRIGHTNESS_OFFSET], 42);
        assert_eq!(brightness_report(250)[BRIGHTNESS_OFFSET], 100);
        assert_eq!(&brightness_report(0)[..5], &[0x05, 0x55, 0xAA, 0xD1, 0x01]);
    }

    #[test]
    fn reset_and_brightness_go_out_as_feature_reports() {
        let mut t = RecordingTransport::new();
        reset(&mut t).unwrap();
        set_brightness(&mut t, 70).unwrap();
        assert_eq!(t.feature_reports.len(), 2);
        assert_eq!(t.feature_reports[0], RESET_REPORT.to_vec());
        assert_eq!(t.feature_reports[1][BRIGHTNESS_OFFSET], 70);
        assert!(t.writes.is_empty());
    }

    // -----------------------------------------------------------------------
    // Input reports
    // -----------------------------------------------------------------------

    #[test]
    fn parses_key_states() {
        let mut report = vec![INPUT_REPORT_ID];
        report.extend_from_slice(&[0; 15]);
        report[1 + 4] = 1;
        report.push(0);
        let states = parse_key_states(&report).unwrap();
        assert!(states[4]);
        assert_eq!(states.iter().filter(|&&s| s).count(), 1);
    }

    #[test]
    fn rejects_foreign_or_short_reports() {
        assert!(parse_key_states(&[]).is_none());
        assert!(parse_key_states(&[0x02; 17]).is_none());
        assert!(parse_key_states(&[INPUT_REPORT_ID, 0, 0]).is_none());
    }

    #[test]
    fn key_changes_lists_transitions() {
        let mut a = [false; KEY_COUNT as usize];
        let mut b = a;
        b[2] = true;
        assert_eq!(key_changes(&a, &b), vec![(2, true)]);
        a[2] = true;
        a[9] = true;
        assert_eq!(key_changes(&a, &b), vec![(9, false)]);
    }
}
