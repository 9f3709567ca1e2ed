//! Typed output document model.
//!
//! The artifact is assembled as a tree of tagged values and rendered by a
//! single recursive writer. Objects carry an ordered key list, so ordering
//! invariants are enforced by the type rather than by caller discipline.

use std::fmt::Write;

/// A value in the output document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<DocValue>),
    /// Keys render in insertion order; builders insert them sorted where the
    /// schema requires lexical order.
    Object(Vec<(String, DocValue)>),
}

impl DocValue {
    pub fn str(s: impl Into<String>) -> Self {
        DocValue::Str(s.into())
    }

    pub fn int(n: usize) -> Self {
        DocValue::Int(n as i64)
    }

    pub fn list<I: IntoIterator<Item = DocValue>>(items: I) -> Self {
        DocValue::List(items.into_iter().collect())
    }

    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DocValue)>,
    {
        DocValue::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Render the document as compact JSON with a trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out.push('\n');
        out
    }

    fn write(&self, out: &mut String) {
        match self {
            DocValue::Null => out.push_str("null"),
            DocValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            DocValue::Int(n) => {
                write!(out, "{n}").unwrap();
            }
            DocValue::Float(f) => {
                write!(out, "{f}").unwrap();
            }
            DocValue::Str(s) => {
                out.push('"');
                escape_into(s, out);
                out.push('"');
            }
            DocValue::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write(out);
                }
                out.push(']');
            }
            DocValue::Object(fields) => {
                out.push('{');
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push('"');
                    escape_into(key, out);
                    out.push_str("\":");
                    value.write(out);
                }
                out.push('}');
            }
        }
    }
}

fn escape_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                write!(out, "\\u{:04x}", c as u32).unwrap();
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scalars() {
        assert_eq!(DocValue::Null.render(), "null\n");
        assert_eq!(DocValue::Bool(true).render(), "true\n");
        assert_eq!(DocValue::Int(42).render(), "42\n");
        assert_eq!(DocValue::str("hi").render(), "\"hi\"\n");
    }

    #[test]
    fn test_render_preserves_key_order() {
        let doc = DocValue::object([
            ("b", DocValue::int(1)),
            ("a", DocValue::int(2)),
        ]);
        assert_eq!(doc.render(), "{\"b\":1,\"a\":2}\n");
    }

    #[test]
    fn test_render_nested() {
        let doc = DocValue::object([(
            "edges",
            DocValue::list([DocValue::object([
                ("source", DocValue::str("a")),
                ("target", DocValue::str("b")),
            ])]),
        )]);
        assert_eq!(
            doc.render(),
            "{\"edges\":[{\"source\":\"a\",\"target\":\"b\"}]}\n"
        );
    }

    #[test]
    fn test_escape_specials() {
        let doc = DocValue::str("a\"b\\c\nd\te");
        assert_eq!(doc.render(), "\"a\\\"b\\\\c\\nd\\te\"\n");
    }

    #[test]
    fn test_escape_control_chars() {
        let doc = DocValue::str("\u{0001}");
        assert_eq!(doc.render(), "\"\\u0001\"\n");
    }

    #[test]
    fn test_rendered_output_is_valid_json() {
        let doc = DocValue::object([
            ("name", DocValue::str("x\ny")),
            ("n", DocValue::Int(-3)),
            ("f", DocValue::Float(0.25)),
            ("list", DocValue::list([DocValue::Null, DocValue::Bool(false)])),
        ]);
        let parsed: serde_json::Value = serde_json::from_str(&doc.render()).unwrap();
        assert_eq!(parsed["name"], "x\ny");
        assert_eq!(parsed["n"], -3);
        assert_eq!(parsed["f"], 0.25);
    }
}
