#![no_main]

use libfuzzer_sys::fuzz_target;
use senmlcat::broker::ProduceResponse;

fuzz_target!(|data: &[u8]| {
    if let Ok(response) = ProduceResponse::decode(data) {
        let _ = response.first_error();
    }
});
