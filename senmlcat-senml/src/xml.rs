//! XML serialization support for SenML
//!
//! A pack is a `sensml` root element in the `urn:ietf:params:xml:ns:senml` namespace
//! with one `senml` child per record. Every record field is an attribute; the sum is
//! carried by the `sum` attribute.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::format::{Codec, EncodeOptions, Format};
use crate::record::WireRecord;
use crate::{Pack, Record, Result, SenMLError};

/// XML namespace declared on the root element
pub const SENML_XML_NAMESPACE: &str = "urn:ietf:params:xml:ns:senml";

const ROOT_ELEMENT: &str = "sensml";
const RECORD_ELEMENT: &str = "senml";

/// XML codec (`application/senml+xml`)
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

impl Codec for XmlCodec {
    fn format(&self) -> Format {
        Format::Xml
    }

    fn decode(&self, bytes: &[u8]) -> Result<Pack> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut pack = Pack::new();
        let mut depth = 0usize;
        let mut saw_root = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    visit_element(&e, depth, &mut saw_root, &mut pack)?;
                    depth += 1;
                }
                Ok(Event::Empty(e)) => visit_element(&e, depth, &mut saw_root, &mut pack)?,
                Ok(Event::End(_)) => depth = depth.saturating_sub(1),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(SenMLError::decode(
                        Format::Xml,
                        format!("at byte {}: {}", reader.buffer_position(), e),
                    ));
                }
            }
            buf.clear();
        }

        if !saw_root {
            return Err(SenMLError::decode(
                Format::Xml,
                format!("missing <{}> root element", ROOT_ELEMENT),
            ));
        }
        if depth != 0 {
            return Err(SenMLError::decode(Format::Xml, "unexpected end of document"));
        }

        Ok(pack)
    }

    fn encode(&self, pack: &Pack, options: &EncodeOptions) -> Result<Vec<u8>> {
        pack.validate()
            .map_err(|e| SenMLError::encode(Format::Xml, e.to_string()))?;

        let mut writer = if options.pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };

        let mut root = BytesStart::new(ROOT_ELEMENT);
        root.push_attribute(("xmlns", SENML_XML_NAMESPACE));
        write(&mut writer, Event::Start(root))?;

        for record in &pack.records {
            let wire = WireRecord::from(record.clone());
            let mut element = BytesStart::new(RECORD_ELEMENT);

            push_text(&mut element, "bn", wire.base_name.as_deref());
            push_number(&mut element, "bt", wire.base_time);
            push_text(&mut element, "bu", wire.base_unit.as_deref());
            push_display(&mut element, "bver", wire.base_version);
            push_text(&mut element, "l", wire.link.as_deref());
            push_text(&mut element, "n", wire.name.as_deref());
            push_text(&mut element, "u", wire.unit.as_deref());
            push_number(&mut element, "t", wire.time);
            push_number(&mut element, "ut", wire.update_time);
            push_number(&mut element, "v", wire.value);
            push_text(&mut element, "vs", wire.string_value.as_deref());
            push_text(&mut element, "vd", wire.data_value.as_deref());
            push_display(&mut element, "vb", wire.bool_value);
            push_number(&mut element, "sum", wire.sum);

            write(&mut writer, Event::Start(element))?;
            write(&mut writer, Event::End(BytesEnd::new(RECORD_ELEMENT)))?;
        }

        write(&mut writer, Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
        Ok(writer.into_inner())
    }
}

impl Pack {
    /// Serialize this SenML pack to an XML string
    pub fn to_xml(&self) -> Result<String> {
        let bytes = XmlCodec.encode(self, &EncodeOptions::default())?;
        String::from_utf8(bytes).map_err(|e| SenMLError::encode(Format::Xml, e.to_string()))
    }

    /// Deserialize a SenML pack from an XML string
    pub fn from_xml(xml: &str) -> Result<Self> {
        XmlCodec.decode(xml.as_bytes())
    }
}

fn visit_element(
    element: &BytesStart<'_>,
    depth: usize,
    saw_root: &mut bool,
    pack: &mut Pack,
) -> Result<()> {
    let name = element.local_name();
    match depth {
        0 if name.as_ref() == ROOT_ELEMENT.as_bytes() => {
            *saw_root = true;
            Ok(())
        }
        0 => Err(SenMLError::decode(
            Format::Xml,
            format!(
                "unexpected root element <{}>",
                String::from_utf8_lossy(name.as_ref())
            ),
        )),
        1 if name.as_ref() == RECORD_ELEMENT.as_bytes() => {
            pack.add_record(parse_record(element)?);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn parse_record(element: &BytesStart<'_>) -> Result<Record> {
    let mut wire = WireRecord::default();

    for attr in element.attributes() {
        let attr = attr.map_err(|e| SenMLError::decode(Format::Xml, e.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|e| SenMLError::decode(Format::Xml, e.to_string()))?;

        match attr.key.local_name().as_ref() {
            b"bn" => wire.base_name = Some(value.into_owned()),
            b"bt" => wire.base_time = Some(parse_number("bt", &value)?),
            b"bu" => wire.base_unit = Some(value.into_owned()),
            b"bver" => {
                let version = value.trim().parse::<i32>().map_err(|_| invalid("bver", &value))?;
                wire.base_version = Some(version);
            }
            b"l" => wire.link = Some(value.into_owned()),
            b"n" => wire.name = Some(value.into_owned()),
            b"u" => wire.unit = Some(value.into_owned()),
            b"t" => wire.time = Some(parse_number("t", &value)?),
            b"ut" => wire.update_time = Some(parse_number("ut", &value)?),
            b"v" => wire.value = Some(parse_number("v", &value)?),
            b"vs" => wire.string_value = Some(value.into_owned()),
            b"vd" => wire.data_value = Some(value.into_owned()),
            b"vb" => wire.bool_value = Some(parse_bool(&value)?),
            b"sum" => wire.sum = Some(parse_number("sum", &value)?),
            _ => {}
        }
    }

    Record::try_from(wire).map_err(|e| SenMLError::decode(Format::Xml, e.to_string()))
}

fn parse_number(field: &str, text: &str) -> Result<f64> {
    text.trim().parse::<f64>().map_err(|_| invalid(field, text))
}

fn parse_bool(text: &str) -> Result<bool> {
    match text.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(invalid("vb", text)),
    }
}

fn invalid(field: &str, text: &str) -> SenMLError {
    SenMLError::decode(
        Format::Xml,
        format!("invalid value for attribute '{}': {:?}", field, text),
    )
}

fn push_text(element: &mut BytesStart<'_>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        element.push_attribute((key, value));
    }
}

fn push_number(element: &mut BytesStart<'_>, key: &str, value: Option<f64>) {
    push_display(element, key, value);
}

fn push_display<T: std::fmt::Display>(element: &mut BytesStart<'_>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        element.push_attribute((key, value.to_string().as_str()));
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| SenMLError::encode(Format::Xml, e.to_string()))
}
