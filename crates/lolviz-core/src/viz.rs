//! Public rendering operations.
//!
//! The free functions take any [`Describe`] value and build a fresh heap per
//! call. [`Visualizer`] works on a heap the caller already owns. Linked lists
//! and trees can also be drawn through accessors over a [`Handle`], for
//! structures that do not implement `Describe`.

use std::collections::HashMap;

use lolviz_dot::Diagram;
use lolviz_error::{Error, Result};

use crate::describe::{Describe, Describer, short_type_name};
use crate::model::{Field, Heap, Matrix, Node, NodeBody, NodeId, Value};
use crate::prefs::Prefs;
use crate::render::{Direction, RecordLayout, RenderOptions, render};

/// Identity and type of a node visited through accessors.
pub trait Handle: Copy {
    /// Stable identity; two handles to the same node compare equal.
    fn identity(&self) -> usize;
    fn type_name(&self) -> String;
}

impl<T> Handle for &T {
    fn identity(&self) -> usize {
        std::ptr::from_ref::<T>(*self) as usize
    }

    fn type_name(&self) -> String {
        short_type_name::<T>().to_string()
    }
}

/// A node of an existing [`Heap`], used as a [`Handle`].
#[derive(Debug, Clone, Copy)]
pub struct HeapRef<'h> {
    heap: &'h Heap,
    id: NodeId,
}

impl<'h> HeapRef<'h> {
    pub fn new(heap: &'h Heap, id: NodeId) -> Self {
        Self { heap, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> Result<&'h Node> {
        self.heap.node(self.id)
    }

    /// Content of a named record or frame field.
    pub fn value(&self, field: &str) -> Result<Value> {
        let node = self.node()?;
        node.field(field).cloned().ok_or_else(|| {
            Error::invalid_argument(format!(
                "node {} of type '{}' has no field '{field}'",
                self.id, node.type_name
            ))
            .with_operation("heap_ref::value")
            .with_context("field", field)
        })
    }

    /// Follow a named field to another node; an empty field ends the walk.
    pub fn link(&self, field: &str) -> Result<Option<HeapRef<'h>>> {
        match self.value(field)? {
            Value::Empty => Ok(None),
            Value::Ref(id) => Ok(Some(HeapRef::new(self.heap, id))),
            Value::Atom(atom) => Err(Error::invalid_argument(format!(
                "field '{field}' holds a {} atom, not a link",
                atom.kind_name()
            ))
            .with_operation("heap_ref::link")
            .with_context("field", field)),
        }
    }
}

impl Handle for HeapRef<'_> {
    fn identity(&self) -> usize {
        self.id.as_u32() as usize
    }

    fn type_name(&self) -> String {
        self.heap
            .get(self.id)
            .map_or_else(|| "?".to_string(), |node| node.type_name.clone())
    }
}

fn accessor_error<E>(accessor: &'static str, operation: &'static str, err: E) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::accessor_failed(accessor)
        .with_operation(operation)
        .set_source(err)
}

/// Nodes built from handles, one per identity.
struct HandleArena<H> {
    heap: Heap,
    ids: HashMap<usize, NodeId>,
    pending: Vec<(H, NodeId)>,
    operation: &'static str,
}

impl<H: Handle> HandleArena<H> {
    fn new(operation: &'static str) -> Self {
        Self {
            heap: Heap::new(),
            ids: HashMap::new(),
            pending: Vec::new(),
            operation,
        }
    }

    /// Node for `handle`, created with a `value` field and empty `links` on
    /// first sight. New nodes are queued so their links get followed.
    fn intern<V, E>(
        &mut self,
        handle: H,
        links: &[&str],
        value_of: &mut impl FnMut(H) -> std::result::Result<V, E>,
    ) -> Result<NodeId>
    where
        V: Into<Value>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if let Some(&id) = self.ids.get(&handle.identity()) {
            return Ok(id);
        }
        let value: Value = value_of(handle)
            .map_err(|err| accessor_error("value", self.operation, err))?
            .into();
        if let Value::Ref(id) = value {
            return Err(Error::invalid_argument(format!(
                "'value' accessor returned node {id}; payloads must be atoms or empty"
            ))
            .with_operation(self.operation)
            .with_context("accessor", "value"));
        }

        let mut fields = vec![Field::new("value", value)];
        fields.extend(links.iter().map(|link| Field::new(*link, Value::Empty)));
        let id = self.heap.alloc(Node::record(handle.type_name(), fields));
        self.ids.insert(handle.identity(), id);
        self.pending.push((handle, id));
        Ok(id)
    }

    fn link(&mut self, from: NodeId, field: &str, to: NodeId) -> Result<()> {
        self.heap
            .set_field(from, field, Value::Ref(to))
            .map_err(|err| err.with_operation(self.operation))
    }
}

/// Draw a singly linked list starting at `head`. A node seen twice is linked
/// back to instead of being walked again.
pub fn llistviz<H, V, E>(
    head: Option<H>,
    mut value_of: impl FnMut(H) -> std::result::Result<V, E>,
    mut next_of: impl FnMut(H) -> std::result::Result<Option<H>, E>,
    prefs: &Prefs,
) -> Result<Diagram>
where
    H: Handle,
    V: Into<Value>,
    E: std::error::Error + Send + Sync + 'static,
{
    const OPERATION: &str = "viz::llistviz";
    prefs.validate()?;
    let mut arena = HandleArena::new(OPERATION);
    let root = head
        .map(|head| arena.intern(head, &["next"], &mut value_of))
        .transpose()?;
    while let Some((handle, id)) = arena.pending.pop() {
        let next = next_of(handle).map_err(|err| accessor_error("next", OPERATION, err))?;
        if let Some(next) = next {
            let next_id = arena.intern(next, &["next"], &mut value_of)?;
            arena.link(id, "next", next_id)?;
        }
    }
    tracing::debug!(nodes = arena.heap.len(), "linked list built from accessors");

    let roots: Vec<Value> = root.map(Value::from).into_iter().collect();
    let options = RenderOptions::new().with_record_layout(RecordLayout::Row);
    render(&arena.heap, prefs, &roots, &options)
}

/// Draw a binary tree top to bottom starting at `root`.
pub fn treeviz<H, V, E>(
    root: Option<H>,
    mut value_of: impl FnMut(H) -> std::result::Result<V, E>,
    mut left_of: impl FnMut(H) -> std::result::Result<Option<H>, E>,
    mut right_of: impl FnMut(H) -> std::result::Result<Option<H>, E>,
    prefs: &Prefs,
) -> Result<Diagram>
where
    H: Handle,
    V: Into<Value>,
    E: std::error::Error + Send + Sync + 'static,
{
    const OPERATION: &str = "viz::treeviz";
    const LINKS: [&str; 2] = ["left", "right"];
    prefs.validate()?;
    let mut arena = HandleArena::new(OPERATION);
    let root = root
        .map(|root| arena.intern(root, &LINKS, &mut value_of))
        .transpose()?;
    while let Some((handle, id)) = arena.pending.pop() {
        let left = left_of(handle).map_err(|err| accessor_error("left", OPERATION, err))?;
        let right = right_of(handle).map_err(|err| accessor_error("right", OPERATION, err))?;
        for (field, child) in LINKS.into_iter().zip([left, right]) {
            if let Some(child) = child {
                let child_id = arena.intern(child, &LINKS, &mut value_of)?;
                arena.link(id, field, child_id)?;
            }
        }
    }
    tracing::debug!(nodes = arena.heap.len(), "tree built from accessors");

    let roots: Vec<Value> = root.map(Value::from).into_iter().collect();
    let options = RenderOptions::new()
        .with_direction(Direction::TopBottom)
        .with_record_layout(RecordLayout::Tree);
    render(&arena.heap, prefs, &roots, &options)
}

fn describe_root<T: Describe + ?Sized>(value: &T) -> (Heap, Value) {
    let mut cx = Describer::new();
    let root = cx.value(value);
    (cx.into_heap(), root)
}

/// Draw an arbitrary object graph.
pub fn objviz<T: Describe + ?Sized>(value: &T, prefs: &Prefs) -> Result<Diagram> {
    let (heap, root) = describe_root(value);
    Visualizer::new(&heap, prefs).objviz(&[root], None)
}

/// Draw a sequence or set as one row of indexed cells.
pub fn listviz<T: Describe + ?Sized>(value: &T, prefs: &Prefs) -> Result<Diagram> {
    let (heap, root) = describe_root(value);
    Visualizer::new(&heap, prefs).listviz(&root)
}

/// Draw a list of lists, e.g. hash table buckets.
pub fn lolviz<T: Describe + ?Sized>(value: &T, prefs: &Prefs) -> Result<Diagram> {
    let (heap, root) = describe_root(value);
    Visualizer::new(&heap, prefs).lolviz(&root)
}

pub fn dictviz<T: Describe + ?Sized>(value: &T, prefs: &Prefs) -> Result<Diagram> {
    let (heap, root) = describe_root(value);
    Visualizer::new(&heap, prefs).dictviz(&root)
}

/// Draw a string as a row of indexed characters.
pub fn strviz(text: &str, prefs: &Prefs) -> Result<Diagram> {
    let mut heap = Heap::new();
    let items = text.chars().map(Value::from).collect();
    let root = heap.alloc(Node::new("str", NodeBody::Sequence { items, tuple: false }));
    Visualizer::new(&heap, prefs).listviz(&root.into())
}

pub fn matrixviz(matrix: &Matrix, prefs: &Prefs) -> Result<Diagram> {
    let mut heap = Heap::new();
    let root = heap.alloc(Node::matrix(matrix.clone()));
    Visualizer::new(&heap, prefs).objviz(&[root.into()], None)
}

/// Renders nodes of a heap the caller built.
pub struct Visualizer<'h> {
    heap: &'h Heap,
    prefs: &'h Prefs,
}

impl<'h> Visualizer<'h> {
    pub fn new(heap: &'h Heap, prefs: &'h Prefs) -> Self {
        Self { heap, prefs }
    }

    fn draw(
        &self,
        roots: &[Value],
        options: &RenderOptions,
        operation: &'static str,
    ) -> Result<Diagram> {
        self.prefs
            .validate()
            .and_then(|()| render(self.heap, self.prefs, roots, options))
            .map_err(|err| err.with_operation(operation))
    }

    /// The node behind `root`, if its body is what `operation` accepts.
    fn expect_node(
        &self,
        root: &Value,
        operation: &'static str,
        expected: &str,
        accepts: fn(&NodeBody) -> bool,
    ) -> Result<&'h Node> {
        let mismatch = |found: &str| {
            Error::invalid_argument(format!("expected a {expected}, got {found}"))
                .with_operation(operation)
        };
        let id = match root {
            Value::Ref(id) => *id,
            Value::Atom(atom) => return Err(mismatch(atom.kind_name())),
            Value::Empty => return Err(mismatch("nothing")),
        };
        let node = self
            .heap
            .node(id)
            .map_err(|err| err.with_operation(operation))?;
        if !accepts(&node.body) {
            return Err(mismatch(&format!("'{}'", node.type_name)));
        }
        Ok(node)
    }

    /// Any object graph. `varnames` limits which frame bindings are shown.
    pub fn objviz(&self, roots: &[Value], varnames: Option<&[&str]>) -> Result<Diagram> {
        let mut options = RenderOptions::new();
        if let Some(names) = varnames {
            options = options.with_varnames(names);
        }
        self.draw(roots, &options, "viz::objviz")
    }

    /// A mapping root is drawn as by [`Visualizer::dictviz`].
    pub fn listviz(&self, root: &Value) -> Result<Diagram> {
        let node = self.expect_node(root, "viz::listviz", "sequence, set or mapping", |body| {
            matches!(
                body,
                NodeBody::Sequence { .. } | NodeBody::Set(_) | NodeBody::Mapping(_)
            )
        })?;
        if matches!(node.body, NodeBody::Mapping(_)) {
            return self.dictviz(root);
        }
        let options = RenderOptions::new().with_assoc(true).with_row_root(true);
        self.draw(std::slice::from_ref(root), &options, "viz::listviz")
    }

    /// Outer sequence as a column of buckets; a sequence holding no nested
    /// collections is drawn like [`Visualizer::listviz`].
    pub fn lolviz(&self, root: &Value) -> Result<Diagram> {
        let node = self.expect_node(root, "viz::lolviz", "sequence or set", |body| {
            matches!(body, NodeBody::Sequence { .. } | NodeBody::Set(_))
        })?;
        let nested = match &node.body {
            NodeBody::Sequence { items, .. } | NodeBody::Set(items) => {
                items.iter().filter_map(Value::as_ref_id).any(|id| {
                    matches!(
                        self.heap.get(id).map(|n| &n.body),
                        Some(NodeBody::Sequence { .. })
                    )
                })
            }
            _ => false,
        };
        if !nested {
            return self.listviz(root);
        }
        let options = RenderOptions::new().with_assoc(true);
        self.draw(std::slice::from_ref(root), &options, "viz::lolviz")
    }

    pub fn dictviz(&self, root: &Value) -> Result<Diagram> {
        self.expect_node(root, "viz::dictviz", "mapping", |body| {
            matches!(body, NodeBody::Mapping(_))
        })?;
        let options = RenderOptions::new().with_assoc(true);
        self.draw(std::slice::from_ref(root), &options, "viz::dictviz")
    }

    /// Call-stack view: `frame` and its callers up to the global frame,
    /// stacked outermost first.
    pub fn callsviz(&self, frame: NodeId, varnames: Option<&[&str]>) -> Result<Diagram> {
        self.expect_node(&Value::Ref(frame), "viz::callsviz", "frame", |body| {
            matches!(body, NodeBody::Frame(_))
        })?;
        let mut options = RenderOptions::new();
        if let Some(names) = varnames {
            options = options.with_varnames(names);
        }
        self.draw(&[Value::Ref(frame)], &options, "viz::callsviz")
    }
}
