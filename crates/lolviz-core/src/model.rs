//! The object-graph model every renderer consumes.
//!
//! A [`Heap`] is an arena of [`Node`]s addressed by [`NodeId`]. Identity is the
//! id, never structural equality: two nodes with equal contents are still two
//! nodes, and a node referenced from many slots is one node.

use std::fmt;

use lolviz_error::{Error, Result};

/// Arena handle of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A primitive value. Atoms are inlined into their parent's label and never
/// become nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
}

impl Atom {
    /// Short kind name, shown when an atom is rendered on its own.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Atom::Bool(_) => "bool",
            Atom::Int(_) => "int",
            Atom::Float(_) => "float",
            Atom::Char(_) => "char",
            Atom::Str(_) => "str",
        }
    }
}

macro_rules! atom_from {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for Atom {
                fn from(value: $ty) -> Self {
                    Atom::$variant(value.into())
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Atom(Atom::from(value))
                }
            }
        )*
    };
}

atom_from!(Int: i8, i16, i32, i64, u8, u16, u32);
atom_from!(Float: f32, f64);
atom_from!(Bool: bool);
atom_from!(Char: char);
atom_from!(Str: &str, String);

impl From<u64> for Atom {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Atom::Str(value.to_string()), Atom::Int)
    }
}

impl From<usize> for Atom {
    fn from(value: usize) -> Self {
        Atom::from(value as u64)
    }
}

impl From<isize> for Atom {
    fn from(value: isize) -> Self {
        Atom::Int(value as i64)
    }
}

/// Contents of one slot of a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Atom(Atom),
    Ref(NodeId),
}

impl Value {
    pub fn as_ref_id(&self) -> Option<NodeId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

impl From<Atom> for Value {
    fn from(atom: Atom) -> Self {
        Value::Atom(atom)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Ref(id)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Empty, Into::into)
    }
}

/// A named slot of a record or frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A call-stack activation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub name: String,
    pub args: Vec<Field>,
    pub locals: Vec<Field>,
    /// The calling frame. Not followed past a `global` frame.
    pub caller: Option<NodeId>,
    /// Marks the top (module/global) scope.
    pub global: bool,
}

/// Fixed-size numeric grid, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(Error::invalid_argument(format!(
                "{rows}x{cols} matrix needs {} values, got {}",
                rows.saturating_mul(cols),
                data.len()
            ))
            .with_operation("matrix::new"));
        }
        Ok(Self { rows, cols, data })
    }

    /// One row per inner vector; ragged input is rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != cols) {
            return Err(Error::invalid_argument(format!(
                "row {bad} has {} columns, expected {cols}",
                rows[bad].len()
            ))
            .with_operation("matrix::from_rows"));
        }
        let n = rows.len();
        Self::new(n, cols, rows.into_iter().flatten().collect())
    }

    /// A `1 x n` matrix.
    pub fn vector(data: Vec<f64>) -> Self {
        Self {
            rows: 1,
            cols: data.len(),
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_vector(&self) -> bool {
        self.rows == 1
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Sequence { items: Vec<Value>, tuple: bool },
    Set(Vec<Value>),
    Mapping(Vec<(Atom, Value)>),
    Record(Vec<Field>),
    Frame(Frame),
    Matrix(Matrix),
    /// A value that could not be described further; `text` is a best-effort
    /// rendering of it.
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub type_name: String,
    pub body: NodeBody,
}

impl Node {
    pub fn new(type_name: impl Into<String>, body: NodeBody) -> Self {
        Self {
            type_name: type_name.into(),
            body,
        }
    }

    pub fn list(items: Vec<Value>) -> Self {
        Self::new("list", NodeBody::Sequence { items, tuple: false })
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Self::new("tuple", NodeBody::Sequence { items, tuple: true })
    }

    pub fn set(items: Vec<Value>) -> Self {
        Self::new("set", NodeBody::Set(items))
    }

    pub fn mapping(pairs: Vec<(Atom, Value)>) -> Self {
        Self::new("dict", NodeBody::Mapping(pairs))
    }

    pub fn record(type_name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(type_name, NodeBody::Record(fields))
    }

    pub fn frame(frame: Frame) -> Self {
        Self::new("frame", NodeBody::Frame(frame))
    }

    pub fn matrix(matrix: Matrix) -> Self {
        Self::new("matrix", NodeBody::Matrix(matrix))
    }

    pub fn opaque(type_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(type_name, NodeBody::Opaque(text.into()))
    }

    /// Value of the named record or frame field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        let fields: &[Field] = match &self.body {
            NodeBody::Record(fields) => fields,
            NodeBody::Frame(frame) => {
                return frame
                    .args
                    .iter()
                    .chain(frame.locals.iter())
                    .find(|f| f.name == name)
                    .map(|f| &f.value);
            }
            _ => return None,
        };
        fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// Arena owning every node of one object graph.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    nodes: Vec<Node>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Like [`Heap::get`] but a dangling id is an error.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id)
            .ok_or_else(|| Error::invalid_node_ref(id.to_string()).with_operation("heap::node"))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| Error::invalid_node_ref(id.to_string()).with_operation("heap::node_mut"))
    }

    /// Replace the body of an already allocated node. Used to close cycles:
    /// allocate first, fill in once the children exist.
    pub fn set_body(&mut self, id: NodeId, body: NodeBody) -> Result<()> {
        self.node_mut(id)?.body = body;
        Ok(())
    }

    /// Set a record or frame-local field, appending it if absent.
    pub fn set_field(&mut self, id: NodeId, name: &str, value: Value) -> Result<()> {
        let node = self.node_mut(id)?;
        let fields = match &mut node.body {
            NodeBody::Record(fields) => fields,
            NodeBody::Frame(frame) => {
                if let Some(arg) = frame.args.iter_mut().find(|f| f.name == name) {
                    arg.value = value;
                    return Ok(());
                }
                &mut frame.locals
            }
            _ => {
                return Err(Error::invalid_argument(format!(
                    "node {id} of type '{}' has no named fields",
                    node.type_name
                ))
                .with_operation("heap::set_field"));
            }
        };
        match fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.value = value,
            None => fields.push(Field::new(name, value)),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }
}
