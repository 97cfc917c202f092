//! Display shape of a node.
//!
//! A value can satisfy several structural predicates at once (an empty tuple
//! is both a sequence and "all atoms"), so shapes are decided by walking
//! [`PRECEDENCE`] in order and taking the first rule that matches.

use strum_macros::{Display, IntoStaticStr};

use crate::format::{ELLIPSIS, atom_text, pair_width};
use crate::model::{Atom, Node, NodeBody};
use crate::walk::{Resolved, Slot, Walker};

/// Estimated pixels per label character.
pub const CHAR_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Shape {
    Frame,
    Mapping,
    EmptySet,
    Bool,
    Matrix,
    EmptyList,
    /// Indexed cells laid out horizontally.
    FlatRow,
    /// One labelled slot per row.
    VerticalList,
    Record,
    Opaque,
}

impl Shape {
    /// Shapes drawn as a bare text leaf rather than a table.
    pub fn is_leaf(self) -> bool {
        matches!(self, Shape::EmptySet | Shape::Bool | Shape::EmptyList)
    }
}

/// What is being classified: a standalone atom root or a heap node.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Atom(&'a Atom),
    Node(&'a Node),
}

impl<'a> Subject<'a> {
    fn body(self) -> Option<&'a NodeBody> {
        match self {
            Subject::Node(node) => Some(&node.body),
            Subject::Atom(_) => None,
        }
    }
}

pub type Rule = fn(&Walker<'_>, Subject<'_>) -> bool;

/// Classification rules, first match wins. The order is load-bearing.
pub const PRECEDENCE: [(Shape, Rule); 10] = [
    (Shape::Frame, is_frame),
    (Shape::Mapping, is_mapping),
    (Shape::EmptySet, is_empty_set),
    (Shape::Bool, is_bool),
    (Shape::Matrix, is_matrix),
    (Shape::EmptyList, is_empty_list),
    (Shape::FlatRow, is_flat_row),
    (Shape::VerticalList, is_collection),
    (Shape::Record, is_record),
    (Shape::Opaque, is_anything),
];

pub fn classify(walker: &Walker<'_>, subject: Subject<'_>) -> Shape {
    let shape = PRECEDENCE
        .iter()
        .find(|(_, rule)| rule(walker, subject))
        .map_or(Shape::Opaque, |(shape, _)| *shape);
    tracing::trace!(%shape, "classified");
    shape
}

fn is_frame(_: &Walker<'_>, subject: Subject<'_>) -> bool {
    matches!(subject.body(), Some(NodeBody::Frame(_)))
}

fn is_mapping(_: &Walker<'_>, subject: Subject<'_>) -> bool {
    matches!(subject.body(), Some(NodeBody::Mapping(_)))
}

fn is_empty_set(_: &Walker<'_>, subject: Subject<'_>) -> bool {
    matches!(subject.body(), Some(NodeBody::Set(items)) if items.is_empty())
}

fn is_bool(_: &Walker<'_>, subject: Subject<'_>) -> bool {
    matches!(subject, Subject::Atom(Atom::Bool(_)))
}

fn is_matrix(_: &Walker<'_>, subject: Subject<'_>) -> bool {
    matches!(subject.body(), Some(NodeBody::Matrix(_)))
}

fn is_empty_list(_: &Walker<'_>, subject: Subject<'_>) -> bool {
    matches!(subject.body(), Some(NodeBody::Sequence { items, .. }) if items.is_empty())
}

fn is_collection(_: &Walker<'_>, subject: Subject<'_>) -> bool {
    matches!(
        subject.body(),
        Some(NodeBody::Sequence { .. } | NodeBody::Set(_))
    )
}

fn is_record(_: &Walker<'_>, subject: Subject<'_>) -> bool {
    matches!(subject.body(), Some(NodeBody::Record(_)))
}

fn is_anything(_: &Walker<'_>, _: Subject<'_>) -> bool {
    true
}

fn is_flat_row(walker: &Walker<'_>, subject: Subject<'_>) -> bool {
    let Subject::Node(node) = subject else {
        return false;
    };
    if !is_collection(walker, subject) {
        return false;
    }
    let slots = walker.slots(node);
    let all_inline = slots.iter().all(|slot| match slot {
        Slot::Item { value, .. } => walker.resolve(value).is_inline(),
        Slot::Elided => true,
    });
    all_inline && fits_row(walker, node)
}

/// Whether `node`'s visible slots fit on one row: the widest cell times the
/// cell count, at [`CHAR_WIDTH`] per character, must stay within
/// `max_horiz_width`.
pub fn fits_row(walker: &Walker<'_>, node: &Node) -> bool {
    let prefs = walker.prefs();
    let slots = walker.slots(node);
    let widest = slots
        .iter()
        .map(|slot| match slot {
            Slot::Item { port, value, .. } => {
                let content = match walker.resolve(value) {
                    Resolved::Atom(atom) => atom_text(atom, prefs).chars().count(),
                    Resolved::Pair(key, val) => pair_width(key, val, prefs),
                    Resolved::Blank | Resolved::Ref(_) => 1,
                };
                content.max(port.to_string().len())
            }
            Slot::Elided => ELLIPSIS.len(),
        })
        .max()
        .unwrap_or(0);
    widest * slots.len() * CHAR_WIDTH <= prefs.max_horiz_width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Frame, Heap, Matrix, Value};
    use crate::prefs::Prefs;
    use pretty_assertions::assert_eq;

    fn shape_of(heap: &Heap, prefs: &Prefs, node: Node) -> Shape {
        let walker = Walker::new(heap, prefs);
        classify(&walker, Subject::Node(&node))
    }

    #[test]
    fn test_precedence_order() {
        let order: Vec<Shape> = PRECEDENCE.iter().map(|(shape, _)| *shape).collect();
        assert_eq!(
            order,
            vec![
                Shape::Frame,
                Shape::Mapping,
                Shape::EmptySet,
                Shape::Bool,
                Shape::Matrix,
                Shape::EmptyList,
                Shape::FlatRow,
                Shape::VerticalList,
                Shape::Record,
                Shape::Opaque,
            ]
        );
    }

    #[test]
    fn test_empty_collections_are_leaves() {
        let heap = Heap::new();
        let prefs = Prefs::default();
        assert_eq!(shape_of(&heap, &prefs, Node::list(vec![])), Shape::EmptyList);
        assert_eq!(shape_of(&heap, &prefs, Node::tuple(vec![])), Shape::EmptyList);
        assert_eq!(shape_of(&heap, &prefs, Node::set(vec![])), Shape::EmptySet);
        assert!(Shape::EmptyList.is_leaf());
    }

    #[test]
    fn test_bool_atom_is_literal() {
        let heap = Heap::new();
        let prefs = Prefs::default();
        let walker = Walker::new(&heap, &prefs);
        assert_eq!(
            classify(&walker, Subject::Atom(&Atom::Bool(true))),
            Shape::Bool
        );
        assert_eq!(classify(&walker, Subject::Atom(&Atom::Int(3))), Shape::Opaque);
    }

    #[test]
    fn test_atoms_make_flat_row_refs_make_column() {
        let mut heap = Heap::new();
        let inner = heap.alloc(Node::list(vec![]));
        let prefs = Prefs::default();
        assert_eq!(
            shape_of(&heap, &prefs, Node::list(vec![3.into(), 9.into(), 10.into()])),
            Shape::FlatRow
        );
        assert_eq!(
            shape_of(&heap, &prefs, Node::list(vec![3.into(), inner.into()])),
            Shape::VerticalList
        );
        // an empty slot is not an atom
        assert_eq!(
            shape_of(&heap, &prefs, Node::list(vec![3.into(), Value::Empty])),
            Shape::VerticalList
        );
    }

    #[test]
    fn test_wide_row_becomes_column() {
        let heap = Heap::new();
        let prefs = Prefs::default().with_max_horiz_width(50);
        let node = Node::list(vec!["aaaa".into(), "bbbb".into()]);
        assert_eq!(shape_of(&heap, &prefs, node), Shape::VerticalList);
    }

    #[test]
    fn test_pairs_count_as_atoms_in_assoc_view() {
        let mut heap = Heap::new();
        let pair = heap.alloc(Node::tuple(vec!["b".into(), 230.into()]));
        let bucket = Node::list(vec![pair.into()]);
        let prefs = Prefs::default();

        let plain = Walker::new(&heap, &prefs);
        assert_eq!(classify(&plain, Subject::Node(&bucket)), Shape::VerticalList);
        let assoc = Walker::new(&heap, &prefs).with_assoc(true);
        assert_eq!(classify(&assoc, Subject::Node(&bucket)), Shape::FlatRow);
    }

    #[test]
    fn test_structured_shapes() {
        let heap = Heap::new();
        let prefs = Prefs::default();
        assert_eq!(
            shape_of(&heap, &prefs, Node::frame(Frame::default())),
            Shape::Frame
        );
        assert_eq!(shape_of(&heap, &prefs, Node::mapping(vec![])), Shape::Mapping);
        assert_eq!(
            shape_of(&heap, &prefs, Node::matrix(Matrix::vector(vec![1.0]))),
            Shape::Matrix
        );
        assert_eq!(
            shape_of(&heap, &prefs, Node::record("Tree", vec![Field::new("value", 1)])),
            Shape::Record
        );
        assert_eq!(
            shape_of(&heap, &prefs, Node::opaque("File", "<fd 3>")),
            Shape::Opaque
        );
    }
}
