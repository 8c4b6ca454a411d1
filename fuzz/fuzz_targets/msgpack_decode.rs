#![no_main]

use libfuzzer_sys::fuzz_target;
use senmlcat_senml::{EncodeOptions, Format, Pack, normalize_at};

fuzz_target!(|data: &[u8]| {
    if let Ok(pack) = Pack::decode(data, Format::MessagePack) {
        // must not panic on anything that decodes
        let normalized = normalize_at(&pack, 1_700_000_000);
        for format in Format::ALL {
            let _ = normalized.encode(format, &EncodeOptions::default());
        }
    }
});
