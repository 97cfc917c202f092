//! Reachability closure and edge discovery.
//!
//! Node content and traversal share one view of a node's slots
//! ([`Walker::slots`]), so whatever is hidden from the drawing (elided
//! elements, frame bindings outside the name filter, inlined pairs) is also
//! never followed.

use std::collections::HashSet;

use lolviz_error::Result;

use crate::format::plain_atom;
use crate::model::{Atom, Heap, Node, NodeBody, NodeId, Value};
use crate::prefs::Prefs;

/// How a slot is addressed in its node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotLabel<'h> {
    Index(usize),
    Name(&'h str),
    Key(&'h Atom),
}

impl SlotLabel<'_> {
    /// Field name used on edges and by the chain heuristic.
    pub fn field_name(&self) -> String {
        match self {
            SlotLabel::Index(i) => i.to_string(),
            SlotLabel::Name(name) => (*name).to_string(),
            SlotLabel::Key(atom) => plain_atom(atom),
        }
    }
}

/// One visible position of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'h> {
    Item {
        /// Position in the node's declared order; names the cell port.
        port: usize,
        label: SlotLabel<'h>,
        value: &'h Value,
    },
    /// Stands in for the elided middle of a long collection.
    Elided,
}

/// What a slot's value becomes in the drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'h> {
    Blank,
    Atom(&'h Atom),
    /// A two-atom tuple shown inline as `key → value`.
    Pair(&'h Atom, &'h Atom),
    Ref(NodeId),
}

impl Resolved<'_> {
    pub fn is_inline(&self) -> bool {
        matches!(self, Resolved::Atom(_) | Resolved::Pair(..))
    }
}

/// A reference from one cell of `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: NodeId,
    pub port: usize,
    pub field: String,
    pub target: NodeId,
}

/// Indices to show for a collection of `len` items: everything when it fits,
/// otherwise the first `max - 1`, a gap (`None`) and the last.
pub fn visible_indices(len: usize, max: usize) -> Vec<Option<usize>> {
    let max = max.max(2);
    if len <= max {
        return (0..len).map(Some).collect();
    }
    let mut out: Vec<Option<usize>> = (0..max - 1).map(Some).collect();
    out.push(None);
    out.push(Some(len - 1));
    out
}

/// Traversal context for one render call.
pub struct Walker<'h> {
    heap: &'h Heap,
    prefs: &'h Prefs,
    show_assoc: bool,
    names: Option<HashSet<String>>,
}

impl<'h> Walker<'h> {
    pub fn new(heap: &'h Heap, prefs: &'h Prefs) -> Self {
        Self {
            heap,
            prefs,
            show_assoc: false,
            names: None,
        }
    }

    /// Inline two-atom tuples as `key → value` instead of pointing at them.
    pub fn with_assoc(mut self, show_assoc: bool) -> Self {
        self.show_assoc = show_assoc;
        self
    }

    /// Show and follow only these frame bindings.
    pub fn with_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.names = Some(names.iter().map(|n| n.as_ref().to_string()).collect());
        self
    }

    pub fn heap(&self) -> &'h Heap {
        self.heap
    }

    pub fn prefs(&self) -> &'h Prefs {
        self.prefs
    }

    pub fn resolve<'v>(&'v self, value: &'v Value) -> Resolved<'v> {
        match value {
            Value::Empty => Resolved::Blank,
            Value::Atom(atom) => Resolved::Atom(atom),
            Value::Ref(id) => {
                if self.show_assoc
                    && let Some(Node {
                        body: NodeBody::Sequence { items, tuple: true },
                        ..
                    }) = self.heap.get(*id)
                    && let [Value::Atom(key), Value::Atom(val)] = items.as_slice()
                {
                    return Resolved::Pair(key, val);
                }
                Resolved::Ref(*id)
            }
        }
    }

    fn allowed(&self, name: &str) -> bool {
        self.names.as_ref().is_none_or(|names| names.contains(name))
    }

    pub fn slots<'v>(&'v self, node: &'v Node) -> Vec<Slot<'v>> {
        let max = self.prefs.max_list_elems;
        match &node.body {
            NodeBody::Sequence { items, .. } | NodeBody::Set(items) => {
                visible_indices(items.len(), max)
                    .into_iter()
                    .map(|i| match i {
                        Some(i) => Slot::Item {
                            port: i,
                            label: SlotLabel::Index(i),
                            value: &items[i],
                        },
                        None => Slot::Elided,
                    })
                    .collect()
            }
            NodeBody::Mapping(pairs) => visible_indices(pairs.len(), max)
                .into_iter()
                .map(|i| match i {
                    Some(i) => Slot::Item {
                        port: i,
                        label: SlotLabel::Key(&pairs[i].0),
                        value: &pairs[i].1,
                    },
                    None => Slot::Elided,
                })
                .collect(),
            NodeBody::Record(fields) => fields
                .iter()
                .enumerate()
                .map(|(i, field)| Slot::Item {
                    port: i,
                    label: SlotLabel::Name(&field.name),
                    value: &field.value,
                })
                .collect(),
            NodeBody::Frame(frame) => frame
                .args
                .iter()
                .chain(frame.locals.iter())
                .enumerate()
                .filter(|(_, field)| self.allowed(&field.name))
                .map(|(i, field)| Slot::Item {
                    port: i,
                    label: SlotLabel::Name(&field.name),
                    value: &field.value,
                })
                .collect(),
            NodeBody::Matrix(_) | NodeBody::Opaque(_) => Vec::new(),
        }
    }

    fn slot_target(&self, slot: &Slot<'_>) -> Option<NodeId> {
        match slot {
            Slot::Item { value, .. } => match self.resolve(value) {
                Resolved::Ref(id) => Some(id),
                _ => None,
            },
            Slot::Elided => None,
        }
    }

    /// Every node reachable from `roots`, depth first, in order of first
    /// discovery. Atoms and inlined pairs are not nodes and never appear.
    pub fn reachable(&self, roots: &[Value]) -> Result<Vec<NodeId>> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<NodeId> = roots.iter().rev().filter_map(Value::as_ref_id).collect();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = self
                .heap
                .node(id)
                .map_err(|err| err.with_operation("walk::reachable"))?;
            order.push(id);

            let mut children: Vec<NodeId> = self
                .slots(node)
                .iter()
                .filter_map(|slot| self.slot_target(slot))
                .collect();
            if let NodeBody::Frame(frame) = &node.body
                && !frame.global
            {
                children.extend(frame.caller);
            }
            stack.extend(
                children
                    .into_iter()
                    .rev()
                    .filter(|child| !visited.contains(child)),
            );
        }

        tracing::debug!(
            roots = roots.len(),
            nodes = order.len(),
            "reachability closure"
        );
        Ok(order)
    }

    /// Outgoing references of the given nodes, in node then slot order.
    /// Frame caller links are structure, not edges.
    pub fn edges(&self, nodes: &[NodeId]) -> Result<Vec<Edge>> {
        let mut edges = Vec::new();
        for &source in nodes {
            let node = self
                .heap
                .node(source)
                .map_err(|err| err.with_operation("walk::edges"))?;
            for slot in self.slots(node) {
                if let Slot::Item { port, label, value } = slot
                    && let Resolved::Ref(target) = self.resolve(value)
                {
                    edges.push(Edge {
                        source,
                        port,
                        field: label.field_name(),
                        target,
                    });
                }
            }
        }
        Ok(edges)
    }
}
