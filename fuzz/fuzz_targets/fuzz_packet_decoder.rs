//! Fuzz target: `PacketDecoder`
//!
//! Feeds arbitrary bytes in two chunks and drains the decoder.  It must
//! never panic, never buffer past its packet limit after an error, and
//! accept input again after a reset.
//!
//! cargo fuzz run fuzz_packet_decoder

#![no_main]

use cavehat2mqtt::mqtt::codec::PacketDecoder;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |b| usize::from(*b)).min(data.len());
    let mut decoder = PacketDecoder::new();

    decoder.feed(&data[..split]);
    drain(&mut decoder);
    decoder.feed(&data[split..]);
    drain(&mut decoder);

    decoder.reset();
    assert_eq!(decoder.buffered(), 0);
    decoder.feed(data);
    drain(&mut decoder);
});

fn drain(decoder: &mut PacketDecoder) {
    loop {
        match decoder.next_packet() {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => {
                assert_eq!(decoder.buffered(), 0, "decoder must discard on error");
                break;
            }
        }
    }
}
