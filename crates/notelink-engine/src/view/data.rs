use crate::conversion::{Conversion, UpcastContext};
use crate::editing::{Block, Document, Inline};
use crate::parsing::{HtmlElement, HtmlNode, parse_fragment};
use crate::schema::{CODE_BLOCK, PARAGRAPH, Schema};
use crate::view::RenderAttributes;

/// Serialized output of a data downcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataNode {
    Text(String),
    Element(DataElement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataElement {
    pub tag: &'static str,
    pub attributes: RenderAttributes,
    pub children: Vec<DataNode>,
}

impl DataNode {
    fn write_html(&self, out: &mut String) {
        match self {
            DataNode::Text(text) => out.push_str(&html_escape::encode_text(text)),
            DataNode::Element(element) => {
                out.push('<');
                out.push_str(element.tag);
                for (name, value) in element.attributes.pairs() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(value));
                    out.push('"');
                }
                out.push('>');
                for child in &element.children {
                    child.write_html(out);
                }
                out.push_str("</");
                out.push_str(element.tag);
                out.push('>');
            }
        }
    }
}

/// Converts between the model and its stored HTML form.
///
/// Paragraphs are stored as `<p>`, code blocks as `<pre><code>`. Inline
/// elements go through the registered converters in both directions.
pub struct DataProcessor<'a> {
    schema: &'a Schema,
    conversion: &'a Conversion,
}

impl<'a> DataProcessor<'a> {
    pub fn new(schema: &'a Schema, conversion: &'a Conversion) -> Self {
        Self { schema, conversion }
    }

    pub fn to_data(&self, doc: &Document) -> String {
        let mut out = String::new();
        for block in doc.blocks() {
            let (open, close) = match block.name() {
                CODE_BLOCK => ("<pre><code>", "</code></pre>"),
                PARAGRAPH => ("<p>", "</p>"),
                other => {
                    log::debug!("serializing unknown block `{other}` as a paragraph");
                    ("<p>", "</p>")
                }
            };
            out.push_str(open);
            for child in block.children() {
                match child {
                    Inline::Text(text) => out.push_str(&html_escape::encode_text(text)),
                    Inline::Element(element) => match self.conversion.data_downcast(element) {
                        Some(node) => node.write_html(&mut out),
                        None => log::debug!("no data converter for `{}`", element.name()),
                    },
                }
            }
            out.push_str(close);
        }
        out
    }

    /// Parses stored HTML into blocks. Never fails: unknown markup is
    /// unwrapped to its content.
    pub fn from_data(&self, data: &str) -> Vec<Block> {
        let mut builder = BlockCollector::default();
        self.collect_blocks(&parse_fragment(data), &mut builder);
        builder.finish()
    }

    fn collect_blocks(&self, nodes: &[HtmlNode], builder: &mut BlockCollector) {
        for node in nodes {
            match node {
                HtmlNode::Text(text) => builder.push_loose_text(text),
                HtmlNode::Element(element) => match element.name.as_str() {
                    "p" => builder.push_block(PARAGRAPH, self.upcast_inline(&element.children, PARAGRAPH)),
                    "pre" => builder.push_block(CODE_BLOCK, self.upcast_inline(&element.children, CODE_BLOCK)),
                    _ => self.collect_loose_element(element, builder),
                },
            }
        }
    }

    /// An element outside any block: either inline content that ends up in
    /// an implicit paragraph, or a wrapper whose children are collected.
    fn collect_loose_element(&self, element: &HtmlElement, builder: &mut BlockCollector) {
        let ctx = UpcastContext::new(self.schema, PARAGRAPH);
        match self.conversion.upcast(element, &ctx) {
            Some(inlines) => builder.push_loose_inline(inlines),
            None => self.collect_blocks(&element.children, builder),
        }
    }

    fn upcast_inline(&self, nodes: &[HtmlNode], parent: &str) -> Vec<Inline> {
        let ctx = UpcastContext::new(self.schema, parent);
        let mut out = Vec::new();
        self.upcast_inline_into(nodes, &ctx, &mut out);
        out
    }

    fn upcast_inline_into(&self, nodes: &[HtmlNode], ctx: &UpcastContext<'_>, out: &mut Vec<Inline>) {
        for node in nodes {
            match node {
                HtmlNode::Text(text) => out.push(Inline::Text(text.clone())),
                HtmlNode::Element(element) => match self.conversion.upcast(element, ctx) {
                    Some(inlines) => out.extend(inlines),
                    None => self.upcast_inline_into(&element.children, ctx, out),
                },
            }
        }
    }
}

/// Gathers blocks, wrapping loose inline content in paragraphs.
#[derive(Default)]
struct BlockCollector {
    blocks: Vec<Block>,
    pending: Vec<Inline>,
}

impl BlockCollector {
    fn push_block(&mut self, name: &str, children: Vec<Inline>) {
        self.flush();
        self.blocks.push(Block::with_children(name, children));
    }

    fn push_loose_text(&mut self, text: &str) {
        // whitespace between blocks
        if self.pending.is_empty() && text.trim().is_empty() {
            return;
        }
        self.pending.push(Inline::Text(text.to_string()));
    }

    fn push_loose_inline(&mut self, inlines: Vec<Inline>) {
        self.pending.extend(inlines);
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let children = std::mem::take(&mut self.pending);
        self.blocks.push(Block::with_children(PARAGRAPH, children));
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }
}
