//! Display surfaces that receive markup and emit interactions.
//!
//! The presenter only needs a handful of capabilities from a surface: replace
//! its markup, register one click listener, walk from an element to its parent
//! and read or flip attributes and classes. [`MemorySurface`] implements these
//! over an element tree parsed from the written markup.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Handle to an element of the markup currently on a surface.
///
/// Handles are tied to one write; after the next write they resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    generation: u64,
    index: usize,
}

/// A click-style interaction originating at an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub origin: ElementId,
}

impl Interaction {
    pub fn at(origin: ElementId) -> Self {
        Self { origin }
    }
}

/// The region publications are rendered into
pub trait Surface {
    /// Replace the whole content with new markup
    fn write(&mut self, markup: &str);

    /// The markup last written
    fn markup(&self) -> &str;

    /// Register the click listener for this surface
    fn listen(&mut self);

    /// Parent element, or `None` at the top of the surface
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Attribute value of an element
    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    /// Set an attribute value on an element
    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);

    /// Whether an element carries a class
    fn has_class(&self, element: ElementId, class: &str) -> bool;

    /// Toggle a class on an element. `force` pins the outcome.
    /// Returns whether the class is present afterwards.
    fn toggle_class(&mut self, element: ElementId, class: &str, force: Option<bool>) -> bool;

    /// Toggle a class on the surface itself. Same contract as `toggle_class`.
    fn toggle_root_class(&mut self, class: &str, force: Option<bool>) -> bool;
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    parent: Option<usize>,
    attributes: Vec<(String, String)>,
    classes: Vec<String>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>, parent: Option<usize>) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let mut attributes = Vec::new();
        let mut classes = Vec::new();

        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
            if key == "class" {
                classes = value.split_whitespace().map(str::to_string).collect();
            } else {
                attributes.push((key, value));
            }
        }

        Self {
            name,
            parent,
            attributes,
            classes,
        }
    }
}

/// In-memory surface backed by an element tree
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    markup: String,
    elements: Vec<Element>,
    generation: u64,
    root_classes: Vec<String>,
    listeners: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of listener registrations received
    pub fn listener_count(&self) -> usize {
        self.listeners
    }

    /// Whether the surface itself carries a class
    pub fn has_root_class(&self, class: &str) -> bool {
        self.root_classes.iter().any(|c| c == class)
    }

    /// Tag name of an element
    pub fn tag_name(&self, element: ElementId) -> Option<&str> {
        self.get(element).map(|e| e.name.as_str())
    }

    /// First element, in document order, whose attribute has this value
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.attributes.iter().any(|(k, v)| k == name && v == value))
            .map(|index| self.id(index))
    }

    /// All elements carrying a class, in document order
    pub fn find_by_class(&self, class: &str) -> Vec<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.classes.iter().any(|c| c == class))
            .map(|(index, _)| self.id(index))
            .collect()
    }

    /// First child of an element, in document order
    pub fn first_child(&self, element: ElementId) -> Option<ElementId> {
        self.get(element)?;
        self.elements
            .iter()
            .position(|e| e.parent == Some(element.index))
            .map(|index| self.id(index))
    }

    /// Number of elements on the surface
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn id(&self, index: usize) -> ElementId {
        ElementId {
            generation: self.generation,
            index,
        }
    }

    fn get(&self, element: ElementId) -> Option<&Element> {
        if element.generation != self.generation {
            return None;
        }
        self.elements.get(element.index)
    }

    fn get_mut(&mut self, element: ElementId) -> Option<&mut Element> {
        if element.generation != self.generation {
            return None;
        }
        self.elements.get_mut(element.index)
    }
}

fn toggle(classes: &mut Vec<String>, class: &str, force: Option<bool>) -> bool {
    let present = classes.iter().any(|c| c == class);
    let wanted = force.unwrap_or(!present);
    if wanted && !present {
        classes.push(class.to_string());
    } else if !wanted && present {
        classes.retain(|c| c != class);
    }
    wanted
}

/// Build the element tree of a markup fragment.
///
/// On malformed markup the elements read so far are returned with the error.
fn parse_elements(markup: &str) -> (Vec<Element>, Option<quick_xml::Error>) {
    let mut reader = Reader::from_str(markup);
    reader.trim_text(true);

    let mut elements: Vec<Element> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                elements.push(Element::from_start(e, open.last().copied()));
                open.push(elements.len() - 1);
            }
            Ok(Event::Empty(ref e)) => {
                elements.push(Element::from_start(e, open.last().copied()));
            }
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return (elements, Some(e)),
            _ => {}
        }
        buf.clear();
    }

    (elements, None)
}

impl Surface for MemorySurface {
    fn write(&mut self, markup: &str) {
        let (elements, error) = parse_elements(markup);
        if let Some(e) = error {
            tracing::warn!("Surface markup is not well-formed: {}", e);
        }
        self.markup = markup.to_string();
        self.elements = elements;
        self.generation += 1;
    }

    fn markup(&self) -> &str {
        &self.markup
    }

    fn listen(&mut self) {
        self.listeners += 1;
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.get(element)?.parent.map(|index| self.id(index))
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let element = self.get(element)?;
        if name == "class" {
            return Some(element.classes.join(" "));
        }
        element
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        let Some(element) = self.get_mut(element) else {
            return;
        };
        if name == "class" {
            element.classes = value.split_whitespace().map(str::to_string).collect();
            return;
        }
        match element.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => element
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.get(element)
            .map(|e| e.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn toggle_class(&mut self, element: ElementId, class: &str, force: Option<bool>) -> bool {
        match self.get_mut(element) {
            Some(element) => toggle(&mut element.classes, class, force),
            None => false,
        }
    }

    fn toggle_root_class(&mut self, class: &str, force: Option<bool>) -> bool {
        toggle(&mut self.root_classes, class, force)
    }
}
