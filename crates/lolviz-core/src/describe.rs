//! The `Describe` capability: how a live Rust value presents itself as nodes.
//!
//! There is no runtime reflection to discover structure, so a value tells the
//! [`Describer`] what it is. Identity is taken from the value's address plus
//! its concrete type: describing the same `Rc` allocation twice yields the
//! same [`NodeId`], and re-entering a node that is still being built (a
//! cycle) returns its id instead of recursing.
//!
//! The memo holds addresses, so every value handed to a [`Describer<'a>`]
//! must live for `'a`: a temporary dropped mid-describe could otherwise hand
//! its address to a later, unrelated value.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::marker::PhantomData;
use std::mem;
use std::rc::Rc;
use std::sync::Arc;

use crate::format::plain_atom;
use crate::model::{Atom, Field, Frame, Heap, Matrix, Node, NodeBody, NodeId, Value};

/// A value that can be drawn.
pub trait Describe {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value;
}

/// Strip module paths from a type name: `alloc::vec::Vec<i32>` becomes `Vec`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Builds a [`Heap`] from values implementing [`Describe`].
#[derive(Debug, Default)]
pub struct Describer<'a> {
    heap: Heap,
    seen: HashMap<(usize, &'static str), NodeId>,
    values: PhantomData<&'a ()>,
}

impl<'a> Describer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn into_heap(self) -> Heap {
        self.heap
    }

    /// Describe a child value.
    pub fn value<T: Describe + ?Sized>(&mut self, value: &'a T) -> Value {
        value.describe(self)
    }

    /// The node for `value`, built by `build` on first sight only.
    pub fn node<T: ?Sized>(
        &mut self,
        value: &'a T,
        type_name: impl Into<String>,
        build: impl FnOnce(&mut Self) -> NodeBody,
    ) -> Value {
        let key = (
            value as *const T as *const () as usize,
            std::any::type_name::<T>(),
        );
        if let Some(&id) = self.seen.get(&key) {
            return Value::Ref(id);
        }
        // Registered before building so that cycles resolve to this id.
        let id = self
            .heap
            .alloc(Node::new(type_name, NodeBody::Record(Vec::new())));
        self.seen.insert(key, id);
        let body = build(self);
        if let Ok(node) = self.heap.node_mut(id) {
            node.body = body;
        }
        Value::Ref(id)
    }

    /// A record node with named fields.
    pub fn record<T: ?Sized>(
        &mut self,
        value: &'a T,
        type_name: impl Into<String>,
        fields: impl FnOnce(&mut RecordScope<'_, 'a>),
    ) -> Value {
        self.node(value, type_name, |cx| {
            let mut scope = RecordScope {
                cx,
                fields: Vec::new(),
            };
            fields(&mut scope);
            NodeBody::Record(scope.fields)
        })
    }

    /// Allocate a node with no identity memo (synthesised structure such as
    /// chain links built from accessors).
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.heap.alloc(node)
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// Describe through a shorter borrow, such as a `RefCell` guard. The
    /// guarded value sits inside a container borrowed for `'a`, so its
    /// address stays put for the rest of the describe.
    fn borrowed<'b>(&mut self, describe: impl FnOnce(&mut Describer<'b>) -> Value) -> Value {
        let mut inner = Describer {
            heap: mem::take(&mut self.heap),
            seen: mem::take(&mut self.seen),
            values: PhantomData,
        };
        let value = describe(&mut inner);
        self.heap = inner.heap;
        self.seen = inner.seen;
        value
    }

    /// The top-level scope frame; the caller-link walk stops here.
    pub fn global_frame(&mut self, locals: impl FnOnce(&mut FrameScope<'_, 'a>)) -> NodeId {
        self.build_frame("globals", None, true, locals)
    }

    /// A call frame whose caller is `caller`.
    pub fn frame(
        &mut self,
        name: impl Into<String>,
        caller: Option<NodeId>,
        bindings: impl FnOnce(&mut FrameScope<'_, 'a>),
    ) -> NodeId {
        self.build_frame(name, caller, false, bindings)
    }

    fn build_frame(
        &mut self,
        name: impl Into<String>,
        caller: Option<NodeId>,
        global: bool,
        bindings: impl FnOnce(&mut FrameScope<'_, 'a>),
    ) -> NodeId {
        let mut scope = FrameScope {
            cx: self,
            args: Vec::new(),
            locals: Vec::new(),
        };
        bindings(&mut scope);
        let FrameScope { args, locals, .. } = scope;
        self.heap.alloc(Node::frame(Frame {
            name: name.into(),
            args,
            locals,
            caller,
            global,
        }))
    }
}

/// Collects the fields of a record under construction.
pub struct RecordScope<'s, 'a> {
    cx: &'s mut Describer<'a>,
    fields: Vec<Field>,
}

impl<'a> RecordScope<'_, 'a> {
    pub fn field<V: Describe + ?Sized>(&mut self, name: &str, value: &'a V) -> &mut Self {
        let value = value.describe(self.cx);
        self.fields.push(Field::new(name, value));
        self
    }
}

/// Collects the arguments and locals of a frame under construction.
pub struct FrameScope<'s, 'a> {
    cx: &'s mut Describer<'a>,
    args: Vec<Field>,
    locals: Vec<Field>,
}

impl<'a> FrameScope<'_, 'a> {
    pub fn arg<V: Describe + ?Sized>(&mut self, name: &str, value: &'a V) -> &mut Self {
        let value = value.describe(self.cx);
        self.args.push(Field::new(name, value));
        self
    }

    pub fn local<V: Describe + ?Sized>(&mut self, name: &str, value: &'a V) -> &mut Self {
        let value = value.describe(self.cx);
        self.locals.push(Field::new(name, value));
        self
    }
}

// Atoms ----------------------------------------------------------------------

macro_rules! describe_atom {
    ($($ty:ty),*) => {
        $(
            impl Describe for $ty {
                fn describe<'a>(&'a self, _cx: &mut Describer<'a>) -> Value {
                    Value::Atom(Atom::from(*self))
                }
            }
        )*
    };
}

describe_atom!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char
);

impl Describe for str {
    fn describe<'a>(&'a self, _cx: &mut Describer<'a>) -> Value {
        Value::Atom(Atom::Str(self.to_string()))
    }
}

impl Describe for String {
    fn describe<'a>(&'a self, _cx: &mut Describer<'a>) -> Value {
        Value::Atom(Atom::Str(self.clone()))
    }
}

impl Describe for () {
    fn describe<'a>(&'a self, _cx: &mut Describer<'a>) -> Value {
        Value::Empty
    }
}

impl Describe for Atom {
    fn describe<'a>(&'a self, _cx: &mut Describer<'a>) -> Value {
        Value::Atom(self.clone())
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        match self {
            Some(value) => value.describe(cx),
            None => Value::Empty,
        }
    }
}

// Pointers -------------------------------------------------------------------

impl<T: Describe + ?Sized> Describe for &T {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        (**self).describe(cx)
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        (**self).describe(cx)
    }
}

impl<T: Describe + ?Sized> Describe for Rc<T> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        (**self).describe(cx)
    }
}

impl<T: Describe + ?Sized> Describe for Arc<T> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        (**self).describe(cx)
    }
}

impl<T: Describe + ?Sized> Describe for RefCell<T> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        match self.try_borrow() {
            Ok(inner) => cx.borrowed(|cx| (*inner).describe(cx)),
            Err(_) => cx.node(self, "RefCell", |_| {
                NodeBody::Opaque("<mutably borrowed>".to_string())
            }),
        }
    }
}

impl<T: Describe + ?Sized> Describe for Cell<&T> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        self.get().describe(cx)
    }
}

impl<T: Describe + ?Sized> Describe for Cell<Option<&T>> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        match self.get() {
            Some(value) => value.describe(cx),
            None => Value::Empty,
        }
    }
}

// Collections ----------------------------------------------------------------

fn sequence<'a, T: Describe + 'a>(
    cx: &mut Describer<'a>,
    items: impl Iterator<Item = &'a T>,
    tuple: bool,
) -> NodeBody {
    let items = items.map(|item| item.describe(cx)).collect();
    NodeBody::Sequence { items, tuple }
}

impl<T: Describe> Describe for [T] {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "list", |cx| sequence(cx, self.iter(), false))
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "array", |cx| sequence(cx, self.iter(), false))
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "list", |cx| sequence(cx, self.iter(), false))
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "deque", |cx| sequence(cx, self.iter(), false))
    }
}

impl<A: Describe, B: Describe> Describe for (A, B) {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "tuple", |cx| {
            let items = vec![self.0.describe(cx), self.1.describe(cx)];
            NodeBody::Sequence { items, tuple: true }
        })
    }
}

impl<A: Describe, B: Describe, C: Describe> Describe for (A, B, C) {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "tuple", |cx| {
            let items = vec![
                self.0.describe(cx),
                self.1.describe(cx),
                self.2.describe(cx),
            ];
            NodeBody::Sequence { items, tuple: true }
        })
    }
}

/// Mapping keys render as labels. A key that describes to a node is shown by
/// its type name.
fn key_atom<'a, K: Describe + ?Sized>(cx: &mut Describer<'a>, key: &'a K) -> Atom {
    match key.describe(cx) {
        Value::Atom(atom) => atom,
        Value::Empty => Atom::Str("None".to_string()),
        Value::Ref(id) => Atom::Str(
            cx.heap()
                .get(id)
                .map_or_else(|| "?".to_string(), |n| n.type_name.clone()),
        ),
    }
}

fn mapping<'a, K, V>(
    cx: &mut Describer<'a>,
    pairs: impl Iterator<Item = (&'a K, &'a V)>,
    sort: bool,
) -> NodeBody
where
    K: Describe + 'a,
    V: Describe + 'a,
{
    let mut described: Vec<(Atom, Value)> = pairs
        .map(|(k, v)| (key_atom(cx, k), v.describe(cx)))
        .collect();
    if sort {
        described.sort_by_key(|(k, _)| plain_atom(k));
    }
    NodeBody::Mapping(described)
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "dict", |cx| mapping(cx, self.iter(), false))
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "dict", |cx| mapping(cx, self.iter(), true))
    }
}

fn set_body<'a, T: Describe + 'a>(
    cx: &mut Describer<'a>,
    items: impl Iterator<Item = &'a T>,
    sort: bool,
) -> NodeBody {
    let mut items: Vec<Value> = items.map(|item| item.describe(cx)).collect();
    if sort {
        items.sort_by_key(|v| match v {
            Value::Atom(atom) => (0, plain_atom(atom)),
            Value::Empty => (1, String::new()),
            Value::Ref(id) => (2, format!("{:010}", id.as_u32())),
        });
    }
    NodeBody::Set(items)
}

impl<T: Describe> Describe for BTreeSet<T> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "set", |cx| set_body(cx, self.iter(), false))
    }
}

impl<T: Describe, S> Describe for HashSet<T, S> {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "set", |cx| set_body(cx, self.iter(), true))
    }
}

impl Describe for Matrix {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.node(self, "matrix", |_| NodeBody::Matrix(self.clone()))
    }
}
