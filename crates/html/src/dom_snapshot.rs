use crate::Node;
use std::fmt;

/// Tree dump in the tree-construction fixture format.
///
/// Rules:
/// - The first line names the root: `#document` or `#document-fragment`.
/// - Every node line starts with `|` followed by its indent; top-level nodes
///   are indented by one space, each nesting level adds two.
/// - Attributes follow their element two spaces deeper, sorted by name.
/// - Template contents appear under a `content` line.
/// - Lines are joined with `\n`; there is no trailing newline.
#[derive(Debug)]
pub struct DomSnapshot {
    lines: Vec<String>,
}

enum Step<'a> {
    Node(&'a Node, usize),
    Content(usize),
}

impl DomSnapshot {
    pub fn new(root: &Node) -> Self {
        let mut lines = Vec::new();
        let top_level: &[Node] = match root {
            Node::Document { children } => {
                lines.push("#document".to_string());
                children
            }
            Node::Fragment { children } => {
                lines.push("#document-fragment".to_string());
                children
            }
            other => std::slice::from_ref(other),
        };

        // Explicit stack: deep trees must not overflow the call stack.
        let mut stack: Vec<Step<'_>> = top_level.iter().rev().map(|n| Step::Node(n, 1)).collect();
        while let Some(step) = stack.pop() {
            match step {
                Step::Content(indent) => lines.push(line(indent, "content")),
                Step::Node(node, indent) => {
                    push_node_lines(node, indent, &mut lines);
                    if let Node::Element {
                        template_contents: Some(contents),
                        children,
                        ..
                    } = node
                    {
                        for child in children.iter().rev() {
                            stack.push(Step::Node(child, indent + 2));
                        }
                        for child in contents.iter().rev() {
                            stack.push(Step::Node(child, indent + 4));
                        }
                        stack.push(Step::Content(indent + 2));
                    } else {
                        for child in node.children().iter().rev() {
                            stack.push(Step::Node(child, indent + 2));
                        }
                    }
                }
            }
        }
        Self { lines }
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for DomSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Serializes `root` in the fixture dump format.
pub fn test_serialize(root: &Node) -> String {
    DomSnapshot::new(root).render()
}

fn line(indent: usize, body: &str) -> String {
    format!("|{:indent$}{body}", "")
}

fn push_node_lines(node: &Node, indent: usize, lines: &mut Vec<String>) {
    match node {
        Node::Document { .. } => lines.push(line(indent, "#document")),
        Node::Fragment { .. } => lines.push(line(indent, "#document-fragment")),
        Node::Doctype {
            name,
            public_id,
            system_id,
        } => {
            let body = if public_id.is_empty() && system_id.is_empty() {
                format!("<!DOCTYPE {name}>")
            } else {
                format!("<!DOCTYPE {name} \"{public_id}\" \"{system_id}\">")
            };
            lines.push(line(indent, &body));
        }
        Node::Element {
            name,
            namespace,
            attributes,
            ..
        } => {
            let tag = match namespace {
                Some(ns) => format!("<{} {name}>", ns.dump_prefix()),
                None => format!("<{name}>"),
            };
            lines.push(line(indent, &tag));

            let mut attrs: Vec<(String, &str)> = attributes
                .iter()
                .map(|attr| (attr.dump_name(), attr.value.as_str()))
                .collect();
            attrs.sort_by(|a, b| a.0.cmp(&b.0));
            for (name, value) in attrs {
                lines.push(line(indent + 2, &format!("{name}=\"{value}\"")));
            }
        }
        Node::Text { text } => lines.push(line(indent, &format!("\"{text}\""))),
        Node::Comment { text } => lines.push(line(indent, &format!("<!-- {text} -->"))),
    }
}
