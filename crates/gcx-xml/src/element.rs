/// A single attribute. Order within an element is preserved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A child of an element: either a nested element or character data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Generic element: qualified tag name, ordered attributes, ordered children.
///
/// Tags are compared literally (`gnc:account`), namespace prefixes included;
/// book files always use the same prefixes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: append an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    /// Builder: set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Builder: append a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value.into(),
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Child elements, document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given tag.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// All child elements with the given tag.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// The `index`-th child element (text nodes not counted).
    pub fn element_at(&self, index: usize) -> Option<&Element> {
        self.elements().nth(index)
    }

    pub fn element_at_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.elements_mut().nth(index)
    }

    /// Direct character data, or `""` when there is none.
    pub fn text(&self) -> &str {
        self.children
            .iter()
            .find_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .unwrap_or("")
    }

    /// Replace all children with the given text. An empty string leaves the
    /// element without children.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text)
    }

    /// Set the text of the first child with the given tag, appending the
    /// child when it does not exist yet.
    pub fn set_child_text(&mut self, name: &str, text: impl Into<String>) {
        match self.child_mut(name) {
            Some(child) => child.set_text(text),
            None => self.push_child(Element::new(name).with_text(text)),
        }
    }

    /// Remove every child element with the given tag. Returns how many were removed.
    pub fn remove_children_named(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, Node::Element(e) if e.name == name));
        before - self.children.len()
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Follow a chain of child tags.
    pub fn path(&self, names: &[&str]) -> Option<&Element> {
        names
            .iter()
            .try_fold(self, |element, name| element.child(name))
    }

    pub fn path_text(&self, names: &[&str]) -> Option<&str> {
        self.path(names).map(Element::text)
    }

    /// Number of elements in this subtree, this one included.
    pub fn subtree_len(&self) -> usize {
        1 + self.elements().map(Element::subtree_len).sum::<usize>()
    }
}

/// A parsed document. Comments, processing instructions, and the XML
/// declaration are not kept; the writer regenerates them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}
