//! Minimal XML-RPC request/response codec, just enough of the protocol to
//! drive Odoo's `/xmlrpc/2/common` and `/xmlrpc/2/object` endpoints
//! (`common.authenticate`, `object.execute_kw`), grounded on the call shape
//! in `original_source/app/erp_manager.py`'s `ODOO_KLK_VISION.authenticate` /
//! `execute_kw`. Odoo's XML-RPC surface never round-trips dates, doubles, or
//! base64 blobs for the calls this crate makes, so those XML-RPC value kinds
//! are read but not written.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use serde_json::{Map, Value};
use std::io::Cursor;

#[derive(Debug, Clone)]
pub enum XmlRpcError {
    Fault { code: i32, message: String },
    Malformed(String),
    Unsupported(String),
}

impl std::fmt::Display for XmlRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XmlRpcError::Fault { code, message } => write!(f, "xmlrpc fault {code}: {message}"),
            XmlRpcError::Malformed(msg) => write!(f, "malformed xmlrpc response: {msg}"),
            XmlRpcError::Unsupported(msg) => write!(f, "unsupported xmlrpc value: {msg}"),
        }
    }
}

impl std::error::Error for XmlRpcError {}

/// Encodes a `methodCall` envelope for `method` with `params`, each param
/// being a JSON value mapped onto the nearest XML-RPC type (object → struct,
/// array → array, string/number/bool as themselves, null → empty string,
/// since Odoo never expects a literal nil param).
pub fn encode_call(method: &str, params: &[Value]) -> Result<String, XmlRpcError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    write_start(&mut writer, "methodCall")?;
    write_text_el(&mut writer, "methodName", method)?;
    write_start(&mut writer, "params")?;
    for param in params {
        write_start(&mut writer, "param")?;
        write_value(&mut writer, param)?;
        write_end(&mut writer, "param")?;
    }
    write_end(&mut writer, "params")?;
    write_end(&mut writer, "methodCall")?;

    let bytes = writer.into_inner().into_inner();
    let body = String::from_utf8(bytes).map_err(|e| XmlRpcError::Malformed(e.to_string()))?;
    Ok(format!("<?xml version=\"1.0\"?>\n{body}"))
}

fn write_start(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str) -> Result<(), XmlRpcError> {
    writer
        .write_event(Event::Start(BytesStart::new(tag)))
        .map_err(|e| XmlRpcError::Malformed(e.to_string()))
}

fn write_end(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str) -> Result<(), XmlRpcError> {
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(|e| XmlRpcError::Malformed(e.to_string()))
}

fn write_text_el(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> Result<(), XmlRpcError> {
    write_start(writer, tag)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| XmlRpcError::Malformed(e.to_string()))?;
    write_end(writer, tag)
}

fn write_value(writer: &mut Writer<Cursor<Vec<u8>>>, value: &Value) -> Result<(), XmlRpcError> {
    write_start(writer, "value")?;
    match value {
        Value::Null => {
            writer
                .write_event(Event::Text(BytesText::new("")))
                .map_err(|e| XmlRpcError::Malformed(e.to_string()))?;
        }
        Value::Bool(b) => write_text_el(writer, "boolean", if *b { "1" } else { "0" })?,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                write_text_el(writer, "int", &i.to_string())?;
            } else {
                write_text_el(writer, "double", &n.to_string())?;
            }
        }
        Value::String(s) => write_text_el(writer, "string", s)?,
        Value::Array(items) => {
            write_start(writer, "array")?;
            write_start(writer, "data")?;
            for item in items {
                write_value(writer, item)?;
            }
            write_end(writer, "data")?;
            write_end(writer, "array")?;
        }
        Value::Object(map) => {
            write_start(writer, "struct")?;
            for (key, val) in map {
                write_start(writer, "member")?;
                write_text_el(writer, "name", key)?;
                write_value(writer, val)?;
                write_end(writer, "member")?;
            }
            write_end(writer, "struct")?;
        }
    }
    write_end(writer, "value")?;
    Ok(())
}

/// Decodes a `methodResponse` body into the single returned value, or an
/// `XmlRpcError::Fault` if the server signalled one.
pub fn decode_response(body: &str) -> Result<Value, XmlRpcError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text = true;

    let mut depth_stack: Vec<String> = Vec::new();
    let mut is_fault = false;

    loop {
        match reader.read_event().map_err(|e| XmlRpcError::Malformed(e.to_string()))? {
            Event::Start(tag) => {
                let name = tag_name(&tag);
                if name == "fault" {
                    is_fault = true;
                }
                if name == "value" {
                    let value = read_value(&mut reader)?;
                    if is_fault {
                        return Err(fault_from_value(&value));
                    }
                    return Ok(value);
                }
                depth_stack.push(name);
            }
            Event::Eof => return Err(XmlRpcError::Malformed("no <value> found in response".to_string())),
            _ => {}
        }
    }
}

fn fault_from_value(value: &Value) -> XmlRpcError {
    let code = value.get("faultCode").and_then(|v| v.as_i64()).unwrap_or(-1) as i32;
    let message = value
        .get("faultString")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown fault")
        .to_string();
    XmlRpcError::Fault { code, message }
}

fn tag_name(tag: &BytesStart) -> String {
    String::from_utf8_lossy(tag.name().as_ref()).to_string()
}

fn end_tag_name(tag: &BytesEnd) -> String {
    String::from_utf8_lossy(tag.name().as_ref()).to_string()
}

/// Reads one `<value>...</value>` subtree, assuming the opening `<value>`
/// tag was already consumed.
fn read_value(reader: &mut Reader<&[u8]>) -> Result<Value, XmlRpcError> {
    let mut pending_text = String::new();
    loop {
        match reader.read_event().map_err(|e| XmlRpcError::Malformed(e.to_string()))? {
            Event::Start(tag) => {
                let name = tag_name(&tag);
                let value = match name.as_str() {
                    "struct" => read_struct(reader)?,
                    "array" => read_array(reader)?,
                    "int" | "i4" | "i8" => Value::Number(read_text(reader)?.trim().parse::<i64>().map_err(|e| XmlRpcError::Malformed(e.to_string()))?.into()),
                    "double" => {
                        let raw = read_text(reader)?;
                        let f: f64 = raw.trim().parse().map_err(|e: std::num::ParseFloatError| XmlRpcError::Malformed(e.to_string()))?;
                        serde_json::Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
                    }
                    "boolean" => Value::Bool(read_text(reader)?.trim() == "1"),
                    "string" => Value::String(read_text(reader)?),
                    "nil" => Value::Null,
                    "base64" | "dateTime.iso8601" => Value::String(read_text(reader)?),
                    other => return Err(XmlRpcError::Unsupported(other.to_string())),
                };
                return Ok(value);
            }
            // Self-closing scalar, e.g. `<nil/>` or `<string/>` — no separate
            // closing tag follows, so there is nothing further to consume.
            Event::Empty(tag) => {
                let name = tag_name(&tag);
                return Ok(match name.as_str() {
                    "nil" => Value::Null,
                    "boolean" => Value::Bool(false),
                    "int" | "i4" | "i8" | "double" => Value::Number(0.into()),
                    _ => Value::String(String::new()),
                });
            }
            Event::Text(text) => {
                pending_text.push_str(&text.unescape().map_err(|e| XmlRpcError::Malformed(e.to_string()))?);
            }
            Event::End(tag) if end_tag_name(&tag) == "value" => {
                return Ok(Value::String(pending_text));
            }
            Event::Eof => return Err(XmlRpcError::Malformed("unexpected eof inside <value>".to_string())),
            _ => {}
        }
    }
}

fn read_text(reader: &mut Reader<&[u8]>) -> Result<String, XmlRpcError> {
    match reader.read_event().map_err(|e| XmlRpcError::Malformed(e.to_string()))? {
        Event::Text(text) => {
            let value = text.unescape().map_err(|e| XmlRpcError::Malformed(e.to_string()))?.to_string();
            consume_until_value_close(reader)?;
            Ok(value)
        }
        Event::End(_) => {
            consume_until_value_close(reader)?;
            Ok(String::new())
        }
        _ => Err(XmlRpcError::Malformed("expected text content".to_string())),
    }
}

/// After a scalar's closing tag (e.g. `</int>`), the remaining `</value>`
/// must still be consumed so the caller's loop stays aligned.
fn consume_until_value_close(reader: &mut Reader<&[u8]>) -> Result<(), XmlRpcError> {
    loop {
        match reader.read_event().map_err(|e| XmlRpcError::Malformed(e.to_string()))? {
            Event::End(tag) if end_tag_name(&tag) == "value" => {
                return Ok(());
            }
            Event::Eof => return Err(XmlRpcError::Malformed("unexpected eof closing <value>".to_string())),
            _ => {}
        }
    }
}

fn read_struct(reader: &mut Reader<&[u8]>) -> Result<Value, XmlRpcError> {
    let mut map = Map::new();
    loop {
        match reader.read_event().map_err(|e| XmlRpcError::Malformed(e.to_string()))? {
            Event::Start(tag) if tag_name(&tag) == "member" => {
                let (key, value) = read_member(reader)?;
                map.insert(key, value);
            }
            Event::End(tag) if end_tag_name(&tag) == "struct" => {
                return Ok(Value::Object(map));
            }
            Event::Eof => return Err(XmlRpcError::Malformed("unexpected eof inside <struct>".to_string())),
            _ => {}
        }
    }
}

fn read_member(reader: &mut Reader<&[u8]>) -> Result<(String, Value), XmlRpcError> {
    let mut name = None;
    let mut value = None;
    loop {
        match reader.read_event().map_err(|e| XmlRpcError::Malformed(e.to_string()))? {
            Event::Start(tag) => {
                let tag_name = tag_name(&tag);
                if tag_name == "name" {
                    name = Some(read_text(reader)?);
                } else if tag_name == "value" {
                    value = Some(read_value(reader)?);
                }
            }
            Event::End(tag) if end_tag_name(&tag) == "member" => {
                let name = name.ok_or_else(|| XmlRpcError::Malformed("struct member missing <name>".to_string()))?;
                let value = value.ok_or_else(|| XmlRpcError::Malformed("struct member missing <value>".to_string()))?;
                return Ok((name, value));
            }
            Event::Eof => return Err(XmlRpcError::Malformed("unexpected eof inside <member>".to_string())),
            _ => {}
        }
    }
}

fn read_array(reader: &mut Reader<&[u8]>) -> Result<Value, XmlRpcError> {
    let mut items = Vec::new();
    loop {
        match reader.read_event().map_err(|e| XmlRpcError::Malformed(e.to_string()))? {
            Event::Start(tag) if tag_name(&tag) == "value" => {
                items.push(read_value(reader)?);
            }
            Event::End(tag) if end_tag_name(&tag) == "array" => {
                return Ok(Value::Array(items));
            }
            Event::Eof => return Err(XmlRpcError::Malformed("unexpected eof inside <array>".to_string())),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_execute_kw_call() {
        let params = vec![
            Value::String("mydb".to_string()),
            Value::Number(2.into()),
            Value::String("pw".to_string()),
            Value::String("res.company".to_string()),
            Value::String("search_count".to_string()),
            Value::Array(vec![Value::Array(vec![])]),
        ];
        let xml = encode_call("execute_kw", &params).unwrap();
        assert!(xml.contains("<methodName>execute_kw</methodName>"));
        assert!(xml.contains("<string>mydb</string>"));
        assert!(xml.contains("<int>2</int>"));
    }

    #[test]
    fn decodes_successful_int_response() {
        let body = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value><int>2</int></value>
    </param>
  </params>
</methodResponse>"#;
        let value = decode_response(body).unwrap();
        assert_eq!(value, Value::Number(2.into()));
    }

    #[test]
    fn decodes_struct_response() {
        let body = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <struct>
          <member><name>name</name><value><string>Acme</string></value></member>
          <member><name>id</name><value><int>7</int></value></member>
        </struct>
      </value>
    </param>
  </params>
</methodResponse>"#;
        let value = decode_response(body).unwrap();
        assert_eq!(value.get("name").unwrap(), "Acme");
        assert_eq!(value.get("id").unwrap(), &Value::Number(7.into()));
    }

    #[test]
    fn decodes_fault_as_error() {
        let body = r#"<?xml version="1.0"?>
<methodResponse>
  <fault>
    <value>
      <struct>
        <member><name>faultCode</name><value><int>1</int></value></member>
        <member><name>faultString</name><value><string>Access denied</string></value></member>
      </struct>
    </value>
  </fault>
</methodResponse>"#;
        let err = decode_response(body).unwrap_err();
        match err {
            XmlRpcError::Fault { code, message } => {
                assert_eq!(code, 1);
                assert_eq!(message, "Access denied");
            }
            other => panic!("expected Fault, got {other:?}"),
        }
    }
}
