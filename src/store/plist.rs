// src/store/plist.rs
//! Minimal XML property-list reader/writer for the store endpoints.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::PlistError;

pub type Dict = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
    /// Base64 payload, kept encoded.
    Data(String),
    Date(String),
    Array(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dict(d) => d.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// String or integer rendered as text; store ids come as either.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Text at `key` when this is a dict.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(Value::as_text)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

/// Build a dict value from key/value pairs.
pub fn dict<I, K, V>(pairs: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    Value::Dict(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
}

// ------------------------------------------------------------
// Writer
// ------------------------------------------------------------

pub fn to_xml(root: &Value) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
         <plist version=\"1.0\">\n",
    );
    write_value(&mut out, root, 0);
    out.push_str("</plist>\n");
    out
}

fn write_value(out: &mut String, v: &Value, depth: usize) {
    let pad = "  ".repeat(depth);
    match v {
        Value::String(s) => {
            let _ = writeln!(out, "{pad}<string>{}</string>", quick_xml::escape::escape(s.as_str()));
        }
        Value::Integer(i) => {
            let _ = writeln!(out, "{pad}<integer>{i}</integer>");
        }
        Value::Real(r) => {
            let _ = writeln!(out, "{pad}<real>{r}</real>");
        }
        Value::Bool(b) => {
            let _ = writeln!(out, "{pad}<{}/>", if *b { "true" } else { "false" });
        }
        Value::Data(d) => {
            let _ = writeln!(out, "{pad}<data>{d}</data>");
        }
        Value::Date(d) => {
            let _ = writeln!(out, "{pad}<date>{d}</date>");
        }
        Value::Array(items) => {
            let _ = writeln!(out, "{pad}<array>");
            for it in items {
                write_value(out, it, depth + 1);
            }
            let _ = writeln!(out, "{pad}</array>");
        }
        Value::Dict(d) => {
            let _ = writeln!(out, "{pad}<dict>");
            for (k, val) in d {
                let _ = writeln!(out, "{pad}  <key>{}</key>", quick_xml::escape::escape(k.as_str()));
                write_value(out, val, depth + 1);
            }
            let _ = writeln!(out, "{pad}</dict>");
        }
    }
}

// ------------------------------------------------------------
// Reader
// ------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Tok {
    Open(String),
    Close(String),
    Empty(String),
    Text(String),
}

fn tokenize(xml: &str) -> Result<Vec<Tok>, PlistError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut toks = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => toks.push(Tok::Open(utf8(e.name().as_ref())?)),
            Event::End(e) => toks.push(Tok::Close(utf8(e.name().as_ref())?)),
            Event::Empty(e) => toks.push(Tok::Empty(utf8(e.name().as_ref())?)),
            Event::Text(t) => {
                let s = t.unescape().map_err(|e| PlistError::Xml(e.to_string()))?;
                toks.push(Tok::Text(s.into_owned()));
            }
            Event::CData(c) => toks.push(Tok::Text(utf8(&c)?)),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(toks)
}

fn utf8(b: &[u8]) -> Result<String, PlistError> {
    std::str::from_utf8(b)
        .map(str::to_string)
        .map_err(|e| PlistError::Xml(e.to_string()))
}

struct Parser {
    toks: std::vec::IntoIter<Tok>,
}

impl Parser {
    fn next(&mut self) -> Result<Tok, PlistError> {
        self.toks.next().ok_or(PlistError::Truncated)
    }

    /// Optional text followed by the closing tag of `tag`.
    fn leaf(&mut self, tag: &str) -> Result<String, PlistError> {
        match self.next()? {
            Tok::Text(t) => {
                self.expect_close(tag)?;
                Ok(t)
            }
            Tok::Close(c) if c == tag => Ok(String::new()),
            Tok::Open(o) | Tok::Empty(o) => Err(PlistError::Unexpected(o)),
            Tok::Close(c) => Err(PlistError::Unexpected(format!("/{c}"))),
        }
    }

    fn expect_close(&mut self, tag: &str) -> Result<(), PlistError> {
        match self.next()? {
            Tok::Close(c) if c == tag => Ok(()),
            Tok::Close(c) => Err(PlistError::Unexpected(format!("/{c}"))),
            Tok::Open(o) | Tok::Empty(o) => Err(PlistError::Unexpected(o)),
            Tok::Text(_) => Err(PlistError::Unexpected("text".into())),
        }
    }

    fn value_from(&mut self, tok: Tok) -> Result<Value, PlistError> {
        match tok {
            Tok::Open(tag) => match tag.as_str() {
                "dict" => self.dict_body(),
                "array" => self.array_body(),
                "string" => Ok(Value::String(self.leaf("string")?)),
                "data" => Ok(Value::Data(self.leaf("data")?)),
                "date" => Ok(Value::Date(self.leaf("date")?)),
                "integer" => {
                    let raw = self.leaf("integer")?;
                    raw.trim().parse().map(Value::Integer).map_err(|_| PlistError::Value {
                        kind: "integer",
                        value: raw,
                    })
                }
                "real" => {
                    let raw = self.leaf("real")?;
                    raw.trim().parse().map(Value::Real).map_err(|_| PlistError::Value {
                        kind: "real",
                        value: raw,
                    })
                }
                "true" | "false" => {
                    self.expect_close(&tag)?;
                    Ok(Value::Bool(tag == "true"))
                }
                _ => Err(PlistError::Unexpected(tag)),
            },
            Tok::Empty(tag) => match tag.as_str() {
                "dict" => Ok(Value::Dict(Dict::new())),
                "array" => Ok(Value::Array(Vec::new())),
                "string" => Ok(Value::String(String::new())),
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(PlistError::Unexpected(tag)),
            },
            Tok::Close(c) => Err(PlistError::Unexpected(format!("/{c}"))),
            Tok::Text(_) => Err(PlistError::Unexpected("text".into())),
        }
    }

    fn dict_body(&mut self) -> Result<Value, PlistError> {
        let mut d = Dict::new();
        loop {
            match self.next()? {
                Tok::Close(c) if c == "dict" => return Ok(Value::Dict(d)),
                Tok::Open(k) if k == "key" => {
                    let key = self.leaf("key")?;
                    let tok = self.next()?;
                    let val = self.value_from(tok)?;
                    d.insert(key, val);
                }
                Tok::Empty(k) if k == "key" => {
                    let tok = self.next()?;
                    let val = self.value_from(tok)?;
                    d.insert(String::new(), val);
                }
                other => return Err(PlistError::Unexpected(format!("{other:?}"))),
            }
        }
    }

    fn array_body(&mut self) -> Result<Value, PlistError> {
        let mut items = Vec::new();
        loop {
            match self.next()? {
                Tok::Close(c) if c == "array" => return Ok(Value::Array(items)),
                tok => items.push(self.value_from(tok)?),
            }
        }
    }
}

/// Parse a plist document (the `<plist>` wrapper is optional).
pub fn from_xml(xml: &str) -> Result<Value, PlistError> {
    let mut p = Parser {
        toks: tokenize(xml)?.into_iter(),
    };
    let first = match p.next()? {
        Tok::Open(t) if t == "plist" => p.next()?,
        tok => tok,
    };
    p.value_from(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_style_response() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
  <key>dsPersonId</key><string>123456</string>
  <key>passwordToken</key><string>tok&amp;en</string>
  <key>status</key><integer>0</integer>
  <key>isManaged</key><false/>
  <key>songList</key>
  <array>
    <dict><key>URL</key><string>https://example.test/a.ipa</string></dict>
  </array>
  <key>empty</key><string></string>
  <key>nested</key><dict/>
</dict>
</plist>"#;
        let v = from_xml(xml).unwrap();
        assert_eq!(v.text("dsPersonId").as_deref(), Some("123456"));
        assert_eq!(v.get("passwordToken").and_then(Value::as_str), Some("tok&en"));
        assert_eq!(v.get("status"), Some(&Value::Integer(0)));
        assert_eq!(v.get("isManaged"), Some(&Value::Bool(false)));
        let songs = v.get("songList").and_then(Value::as_array).unwrap();
        assert_eq!(songs[0].text("URL").as_deref(), Some("https://example.test/a.ipa"));
        assert_eq!(v.get("empty"), Some(&Value::String(String::new())));
        assert_eq!(v.get("nested"), Some(&Value::Dict(Dict::new())));
    }

    #[test]
    fn written_document_reads_back() {
        let body = dict([("guid", Value::from("ABC<1>")), ("attempt", Value::from(4i64))]);
        let xml = to_xml(&body);
        assert!(xml.contains("<key>attempt</key>"));
        assert!(xml.contains("ABC&lt;1&gt;"));
        assert_eq!(from_xml(&xml).unwrap(), body);
    }

    #[test]
    fn truncated_document_is_an_error() {
        assert!(matches!(
            from_xml("<plist><dict><key>a</key>"),
            Err(PlistError::Truncated) | Err(PlistError::Xml(_))
        ));
    }

    #[test]
    fn bad_integer_is_reported() {
        assert!(matches!(
            from_xml("<integer>abc</integer>"),
            Err(PlistError::Value { kind: "integer", .. })
        ));
    }
}
