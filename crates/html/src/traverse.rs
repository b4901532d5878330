use crate::Node;
use crate::types::{Attribute, Namespace};

/// One step of a depth-first walk over a [`Node`] tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalkEvent<'a> {
    StartTag {
        name: &'a str,
        namespace: Option<Namespace>,
        attributes: &'a [Attribute],
    },
    EndTag {
        name: &'a str,
        namespace: Option<Namespace>,
    },
    Text(&'a str),
    Comment(&'a str),
    Doctype {
        name: &'a str,
        public_id: &'a str,
        system_id: &'a str,
    },
}

/// Walks `root` in document order. Template contents are walked ahead of the
/// template's children, which a parsed tree leaves empty.
pub fn walk(root: &Node) -> Vec<WalkEvent<'_>> {
    enum Step<'a> {
        Enter(&'a Node),
        Leave(&'a str, Option<Namespace>),
    }

    let mut events = Vec::new();
    let mut stack = vec![Step::Enter(root)];
    while let Some(step) = stack.pop() {
        let node = match step {
            Step::Leave(name, namespace) => {
                events.push(WalkEvent::EndTag { name, namespace });
                continue;
            }
            Step::Enter(node) => node,
        };
        match node {
            Node::Document { children } | Node::Fragment { children } => {
                stack.extend(children.iter().rev().map(Step::Enter));
            }
            Node::Element {
                name,
                namespace,
                attributes,
                template_contents,
                children,
            } => {
                events.push(WalkEvent::StartTag {
                    name,
                    namespace: *namespace,
                    attributes,
                });
                stack.push(Step::Leave(name, *namespace));
                stack.extend(children.iter().rev().map(Step::Enter));
                if let Some(contents) = template_contents {
                    stack.extend(contents.iter().rev().map(Step::Enter));
                }
            }
            Node::Text { text } => events.push(WalkEvent::Text(text)),
            Node::Comment { text } => events.push(WalkEvent::Comment(text)),
            Node::Doctype {
                name,
                public_id,
                system_id,
            } => events.push(WalkEvent::Doctype {
                name,
                public_id,
                system_id,
            }),
        }
    }
    events
}
