//! XML documents shared by the query and REST-XML codecs.

use awsrpc_core::{Error, Result};
use quick_xml::events::{BytesCData, Event};
use quick_xml::{Reader, Writer};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Serialize `value` as an XML document with the given root element.
///
/// Absent members are omitted; list members repeat their element.
pub(crate) fn encode_xml(root: &str, value: &Value) -> Result<String> {
    quick_xml::se::to_string_with_root(root, &strip_nulls(value))
        .map_err(|e| Error::unsupported("failed to encode XML body").with_source(e))
}

fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(members) => Value::Object(
            members
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|v| !v.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        v => v.clone(),
    }
}

/// Decode an XML document, keeping the text of leaf elements verbatim.
///
/// The deserializer trims text nodes but leaves CDATA alone, so the text of
/// every element without children is rewritten as CDATA first. Whitespace
/// between elements is still ignored.
pub(crate) fn decode_xml<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::decode("XML body is not valid UTF-8").with_source(e))?;
    let normalized = leaf_text_as_cdata(text)?;
    let normalized = std::str::from_utf8(&normalized)
        .map_err(|e| Error::decode("XML body is not valid UTF-8").with_source(e))?;
    quick_xml::de::from_str(normalized)
        .map_err(|e| Error::decode("failed to decode XML body").with_source(e))
}

fn leaf_text_as_cdata(text: &str) -> Result<Vec<u8>> {
    let mut reader = Reader::from_str(text);
    let mut writer = Writer::new(Vec::with_capacity(text.len() + 64));

    // Text events read since the last start tag and their unescaped content.
    let mut pending: Option<(Vec<Event<'_>>, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::decode("malformed XML body").with_source(e))?;
        match event {
            Event::Eof => break,
            Event::Text(ref e) if pending.is_some() => {
                let content = e
                    .unescape()
                    .map_err(|e| Error::decode("malformed XML text").with_source(e))?
                    .into_owned();
                if let Some((events, buf)) = pending.as_mut() {
                    buf.push_str(&content);
                    events.push(event);
                }
            }
            Event::CData(ref e) if pending.is_some() => {
                let content = e
                    .decode()
                    .map_err(|e| Error::decode("malformed XML CDATA").with_source(e))?
                    .into_owned();
                if let Some((events, buf)) = pending.as_mut() {
                    buf.push_str(&content);
                    events.push(event);
                }
            }
            Event::End(_) => {
                if let Some((_, content)) = pending.take() {
                    if !content.is_empty() {
                        for part in BytesCData::escaped(&content) {
                            write(&mut writer, Event::CData(part))?;
                        }
                    }
                }
                write(&mut writer, event)?;
            }
            event => {
                if let Some((events, _)) = pending.take() {
                    for e in events {
                        write(&mut writer, e)?;
                    }
                }
                let starts_element = matches!(event, Event::Start(_));
                write(&mut writer, event)?;
                if starts_element {
                    pending = Some((Vec::new(), String::new()));
                }
            }
        }
    }

    Ok(writer.into_inner())
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::unexpected("failed to rewrite XML body").with_source(e))
}
