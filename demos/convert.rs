//! Build a pack in code and print it in every output format
//!
//! ```bash
//! cargo run --example convert
//! ```

use senmlcat::senml::{EncodeOptions, Format, PackBuilder, TimeSeriesBuilder};

fn main() -> senmlcat::Result<()> {
    let pack = PackBuilder::new()
        .base_name("urn:dev:ow:10e2073a01080063/")
        .base_unit("Cel")
        .add_value("temp", 23.1)
        .add_string_value("status", "ok")
        .add_bool_value("door", false)
        .build();

    let resolved = pack.normalize();
    let options = EncodeOptions::new().with_pretty(true).with_topic("demo");

    for format in Format::ALL {
        let bytes = resolved.encode(format, &options)?;
        println!("--- {} ({}) ---", format, format.content_type());
        if matches!(format, Format::Cbor | Format::MessagePack) {
            println!("{} bytes", bytes.len());
        } else {
            println!("{}", String::from_utf8_lossy(&bytes));
        }
    }

    let series = TimeSeriesBuilder::new("urn:dev:mac:0024befffe804ff1/voltage", 1_700_000_000.0)
        .unit("V")
        .measurements([(0.0, 229.8), (60.0, 230.1), (120.0, 231.0)])
        .build();
    println!("--- time series ---");
    println!("{}", series.to_json_pretty()?);

    Ok(())
}
