use crate::document::Document;
use crate::entities::{escape_attribute, escape_text};
use crate::tokenizer::is_void_element;
use crate::types::{NodeId, NodeKind};

impl Document {
    /// Serialize `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Document { doctype } => {
                if let Some(doctype) = doctype {
                    out.push_str("<!");
                    out.push_str(doctype);
                    out.push('>');
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Fragment => {
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeKind::Element { name, attributes } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    if let Some(value) = value {
                        out.push_str("=\"");
                        escape_attribute(value, out);
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(name) {
                    return;
                }
                let raw = matches!(&**name, "script" | "style");
                for &child in self.children(id) {
                    match self.kind(child) {
                        NodeKind::Text { text } if raw => out.push_str(text),
                        _ => self.write_node(child, out),
                    }
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Text { text } => escape_text(text, out),
            NodeKind::Comment { text } => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}
