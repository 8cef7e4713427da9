//! Graphviz DOT rendering of a [`GraphIR`].

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use crate::config::StyleConfig;
use crate::ir::{Edge, Field, GraphIR, Node, NodeKind, Row};

#[derive(Debug, Default)]
pub struct DotRenderer {
    style: StyleConfig,
}

impl DotRenderer {
    pub fn new(style: StyleConfig) -> Self {
        Self { style }
    }

    pub fn render<W: Write>(&self, ir: &GraphIR, out: &mut W) -> io::Result<()> {
        self.write_header(out)?;
        for node in ir.nodes() {
            self.write_node(out, node)?;
        }
        for edge in ir.edges() {
            write_edge(out, edge)?;
        }
        writeln!(out, "\n}}")
    }

    pub fn render_to_string(&self, ir: &GraphIR) -> io::Result<String> {
        let mut buf = Vec::new();
        self.render(ir, &mut buf)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write the document to `path`. A failure mid-write may leave a partial file.
    pub fn export_to_file(&self, ir: &GraphIR, path: &Path) -> io::Result<()> {
        debug!(path:? = path; "Writing DOT file");
        let mut out = BufWriter::new(File::create(path)?);
        self.render(ir, &mut out)?;
        out.flush()?;
        info!(nodes = ir.nodes().len(), edges = ir.edges().len(); "DOT file written");
        Ok(())
    }

    fn write_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let style = &self.style;
        writeln!(out, "digraph xtext {{")?;
        writeln!(out, "fontname = \"{}\"", escape_quoted(&style.font_name))?;
        writeln!(out, "fontsize = {}", style.font_size)?;
        writeln!(out, "node[")?;
        writeln!(out, "    shape=record,")?;
        writeln!(out, "    style=filled,")?;
        writeln!(out, "    fillcolor=\"{}\"", escape_quoted(&style.node_fill))?;
        writeln!(out, "]")?;
        writeln!(out, "nodesep = {}", style.nodesep)?;
        writeln!(out, "edge[dir=forward,arrowtail=empty]")?;
        writeln!(out)
    }

    fn write_node<W: Write>(&self, out: &mut W, node: &Node) -> io::Result<()> {
        let mut label = match node.kind {
            NodeKind::Entity | NodeKind::Association => format!("{}: Entity", escape_record(&node.name)),
            NodeKind::Enum => format!("Enum {}", escape_record(&node.name)),
        };
        if let Some(l) = &node.label {
            label.push_str(&format!("\\n'{}'", escape_record(l)));
        }
        label.push('|');

        for row in &node.rows {
            match row {
                Row::Field(field) => label.push_str(&field_line(field)),
                Row::Compartment(title) => label.push_str(&format!("|-[ {} ]-\\l", escape_record(title))),
                Row::Literal { name, code, label: text } => label.push_str(&format!(
                    "{}: '{}' '{}'\\l",
                    escape_record(name),
                    escape_record(code),
                    escape_record(text)
                )),
            }
        }

        let fill = match node.kind {
            NodeKind::Entity => None,
            NodeKind::Association => Some(&self.style.association_fill),
            NodeKind::Enum => Some(&self.style.enum_fill),
        };
        let fill = fill
            .map(|c| format!(" fillcolor=\"{}\"", escape_quoted(c)))
            .unwrap_or_default();

        writeln!(out, "{}[label=\"{{{}}}\"{}]", node.id, label, fill)
    }
}

fn field_line(field: &Field) -> String {
    let mut line = String::new();
    if field.key {
        line.push('#');
    }
    line.push_str(&escape_record(&field.name));
    if let Some(label) = &field.label {
        line.push_str(&format!(" '{}'", escape_record(label)));
    }
    line.push_str(&format!(": {}", escape_record(&field.type_name)));
    if let Some(p) = field.precision {
        match p.y {
            Some(y) => line.push_str(&format!("({},{})", p.x, y)),
            None => line.push_str(&format!("({})", p.x)),
        }
    }
    if let Some(m) = field.multiplicity {
        line.push_str(&format!(" {}", m));
    }
    line.push_str("\\l");
    line
}

fn write_edge<W: Write>(out: &mut W, edge: &Edge) -> io::Result<()> {
    let mut attrs = format!(
        "label=\"{}{}\"",
        if edge.key { "#" } else { "" },
        escape_quoted(&edge.name)
    );
    if let Some(m) = edge.multiplicity {
        attrs.push_str(&format!(" headlabel=\"{}\"", m));
    }
    if edge.containment {
        attrs.push_str(" arrowtail=diamond dir=both");
    }
    writeln!(out, "{} -> {} [{}]", edge.from, edge.to, attrs)
}

/// Escape text placed inside a record label.
pub fn escape_record(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '"' | '{' | '}' | '|' | '<' | '>' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape text placed inside a plain quoted attribute value.
pub fn escape_quoted(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '"' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}
