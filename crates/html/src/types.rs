/// Element namespace as it appears in the test dump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    /// Short prefix used by the tree dump (`<svg path>`).
    pub const fn dump_prefix(self) -> &'static str {
        match self {
            Namespace::Html => "html",
            Namespace::Svg => "svg",
            Namespace::MathMl => "math",
        }
    }

    pub fn from_url(url: &str) -> Option<Self> {
        match url {
            "http://www.w3.org/1999/xhtml" => Some(Namespace::Html),
            "http://www.w3.org/2000/svg" => Some(Namespace::Svg),
            "http://www.w3.org/1998/Math/MathML" => Some(Namespace::MathMl),
            _ => None,
        }
    }
}

/// Namespace of an adjusted foreign attribute (`xlink:href`, `xml:lang`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeNamespace {
    XLink,
    Xml,
    XmlNs,
}

impl AttributeNamespace {
    pub const fn dump_prefix(self) -> &'static str {
        match self {
            AttributeNamespace::XLink => "xlink",
            AttributeNamespace::Xml => "xml",
            AttributeNamespace::XmlNs => "xmlns",
        }
    }

    pub fn from_url(url: &str) -> Option<Self> {
        match url {
            "http://www.w3.org/1999/xlink" => Some(AttributeNamespace::XLink),
            "http://www.w3.org/XML/1998/namespace" => Some(AttributeNamespace::Xml),
            "http://www.w3.org/2000/xmlns/" => Some(AttributeNamespace::XmlNs),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: Option<AttributeNamespace>,
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Name as printed in the dump: `xlink href` for namespaced attributes.
    pub fn dump_name(&self) -> String {
        match self.namespace {
            Some(ns) => format!("{} {}", ns.dump_prefix(), self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Document {
        children: Vec<Node>,
    },
    /// Root of a fragment parse; children are the context element's children.
    Fragment {
        children: Vec<Node>,
    },
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element {
        name: String,
        /// `None` for HTML elements when the parser does not namespace them.
        namespace: Option<Namespace>,
        attributes: Vec<Attribute>,
        template_contents: Option<Vec<Node>>,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl Node {
    pub fn element(name: impl Into<String>, namespace: Option<Namespace>) -> Self {
        Node::Element {
            name: name.into(),
            namespace,
            attributes: Vec::new(),
            template_contents: None,
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { children }
            | Node::Fragment { children }
            | Node::Element { children, .. } => children,
            Node::Doctype { .. } | Node::Text { .. } | Node::Comment { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children }
            | Node::Fragment { children }
            | Node::Element { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Builder-style helper used by tests and fixtures.
    pub fn with_children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        if let Some(children) = self.children_mut() {
            children.extend(nodes);
        }
        self
    }
}
