//! JSON input documents.
//!
//! Plain JSON maps onto the model directly (`null` is empty, scalars are
//! atoms, arrays are lists, objects are mappings). A few `$`-prefixed keys
//! describe everything else:
//!
//! | form                                   | node                  |
//! |----------------------------------------|-----------------------|
//! | `{"$type": "Node", "value": 1, ...}`   | record of type `Node` |
//! | `{"$set": [...]}`                      | set                   |
//! | `{"$tuple": [...]}`                    | tuple                 |
//! | `{"$matrix": [[1, 2], [3, 4]]}`        | numeric matrix        |
//! | `{"$frame": "f", "args": {..}, "locals": {..}, "caller": .., "$global": false}` | call frame |
//!
//! Any node may carry `"$id": "name"`, and `{"$ref": "name"}` points at it,
//! which is how shared and cyclic structure is written. Loading runs in two
//! passes: the first reserves a node for every JSON value that will become
//! one and registers ids, the second fills in bodies, so a `$ref` may appear
//! before the node it names.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use lolviz_core::{Atom, Error, Field, Frame, Heap, Matrix, Node, NodeId, Result, Value};
use serde_json::{Map, Value as Json};

const ID: &str = "$id";
const REF: &str = "$ref";
const TYPE: &str = "$type";
const SET: &str = "$set";
const TUPLE: &str = "$tuple";
const MATRIX: &str = "$matrix";
const FRAME: &str = "$frame";
const GLOBAL: &str = "$global";

/// A loaded object graph.
#[derive(Debug)]
pub struct Document {
    pub heap: Heap,
    pub root: Value,
    ids: HashMap<String, NodeId>,
}

impl Document {
    /// Node registered under `$id: name`.
    pub fn id(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }
}

pub fn load_str(text: &str) -> Result<Document> {
    let json: Json = serde_json::from_str(text).map_err(|err| {
        Error::invalid_format(format!("input is not valid JSON: {err}"))
            .with_operation("input::load_str")
            .set_source(err)
    })?;
    load_json(&json)
}

pub fn load_path(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| {
        Error::from(err)
            .with_operation("input::load_path")
            .with_context("path", path.display().to_string())
    })?;
    load_str(&text).map_err(|err| err.with_context("path", path.display().to_string()))
}

pub fn load_json(json: &Json) -> Result<Document> {
    let mut loader = Loader::default();
    loader.reserve(json)?;
    let root = loader.build(json)?;
    tracing::debug!(nodes = loader.heap.len(), ids = loader.ids.len(), "input loaded");
    Ok(Document {
        heap: loader.heap,
        root,
        ids: loader.ids,
    })
}

fn malformed(message: impl Into<String>) -> Error {
    Error::invalid_format(message).with_operation("input::load")
}

/// What one JSON value stands for.
enum Form<'j> {
    Empty,
    Atom(Atom),
    Ref(&'j str),
    List(&'j [Json]),
    Set(&'j [Json]),
    Tuple(&'j [Json]),
    Matrix(&'j [Json]),
    Record {
        type_name: &'j str,
        fields: Vec<(&'j String, &'j Json)>,
    },
    Mapping(Vec<(&'j String, &'j Json)>),
    Frame {
        name: &'j str,
        args: Vec<(&'j String, &'j Json)>,
        locals: Vec<(&'j String, &'j Json)>,
        caller: Option<&'j Json>,
        global: bool,
    },
}

impl<'j> Form<'j> {
    fn is_node(&self) -> bool {
        !matches!(self, Form::Empty | Form::Atom(_) | Form::Ref(_))
    }

    /// JSON values nested inside this one that are loaded as slot values.
    fn children(&self) -> Vec<&'j Json> {
        match self {
            Form::Empty | Form::Atom(_) | Form::Ref(_) | Form::Matrix(_) => Vec::new(),
            Form::List(items) | Form::Set(items) | Form::Tuple(items) => items.iter().collect(),
            Form::Record { fields, .. } | Form::Mapping(fields) => {
                fields.iter().map(|(_, v)| *v).collect()
            }
            Form::Frame {
                args,
                locals,
                caller,
                ..
            } => args
                .iter()
                .chain(locals.iter())
                .map(|(_, v)| *v)
                .chain(caller.iter().copied())
                .collect(),
        }
    }
}

fn number(n: &serde_json::Number) -> Atom {
    match n.as_i64() {
        Some(i) => Atom::Int(i),
        None => Atom::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn array_under<'j>(object: &'j Map<String, Json>, key: &str) -> Result<&'j [Json]> {
    match object.get(key) {
        Some(Json::Array(items)) => Ok(items),
        _ => Err(malformed(format!("'{key}' must hold an array")).with_context("key", key)),
    }
}

fn bindings<'j>(object: &'j Map<String, Json>, key: &str) -> Result<Vec<(&'j String, &'j Json)>> {
    match object.get(key) {
        None | Some(Json::Null) => Ok(Vec::new()),
        Some(Json::Object(map)) => Ok(map.iter().collect()),
        Some(_) => Err(malformed(format!("frame '{key}' must be an object"))),
    }
}

fn plain_fields(object: &Map<String, Json>) -> Vec<(&String, &Json)> {
    object.iter().filter(|(k, _)| !k.starts_with('$')).collect()
}

fn parse(json: &Json) -> Result<(Form<'_>, Option<&str>)> {
    let object = match json {
        Json::Null => return Ok((Form::Empty, None)),
        Json::Bool(b) => return Ok((Form::Atom(Atom::Bool(*b)), None)),
        Json::Number(n) => return Ok((Form::Atom(number(n)), None)),
        Json::String(s) => return Ok((Form::Atom(Atom::Str(s.clone())), None)),
        Json::Array(items) => return Ok((Form::List(items), None)),
        Json::Object(object) => object,
    };

    let id = match object.get(ID) {
        None => None,
        Some(Json::String(id)) => Some(id.as_str()),
        Some(_) => return Err(malformed("'$id' must be a string")),
    };

    let form = if let Some(target) = object.get(REF) {
        let Json::String(target) = target else {
            return Err(malformed("'$ref' must be a string"));
        };
        if object.len() != 1 {
            return Err(malformed(format!(
                "reference to '{target}' must not carry other keys"
            )));
        }
        Form::Ref(target)
    } else if let Some(type_name) = object.get(TYPE) {
        let Json::String(type_name) = type_name else {
            return Err(malformed("'$type' must be a string"));
        };
        Form::Record {
            type_name,
            fields: plain_fields(object),
        }
    } else if object.contains_key(SET) {
        Form::Set(array_under(object, SET)?)
    } else if object.contains_key(TUPLE) {
        Form::Tuple(array_under(object, TUPLE)?)
    } else if object.contains_key(MATRIX) {
        Form::Matrix(array_under(object, MATRIX)?)
    } else if let Some(name) = object.get(FRAME) {
        let Json::String(name) = name else {
            return Err(malformed("'$frame' must be a string"));
        };
        let global = match object.get(GLOBAL) {
            None => false,
            Some(Json::Bool(global)) => *global,
            Some(_) => return Err(malformed("'$global' must be a boolean")),
        };
        Form::Frame {
            name,
            args: bindings(object, "args")?,
            locals: bindings(object, "locals")?,
            caller: object.get("caller"),
            global,
        }
    } else {
        if let Some(key) = object.keys().find(|k| k.starts_with('$') && k.as_str() != ID) {
            return Err(malformed(format!("unknown key '{key}'")).with_context("key", key.clone()));
        }
        Form::Mapping(plain_fields(object))
    };
    Ok((form, id))
}

fn matrix(rows: &[Json]) -> Result<Matrix> {
    let rows = rows
        .iter()
        .map(|row| match row {
            Json::Array(cells) => cells
                .iter()
                .map(|cell| {
                    cell.as_f64()
                        .ok_or_else(|| malformed(format!("matrix cell {cell} is not a number")))
                })
                .collect::<Result<Vec<f64>>>(),
            _ => Err(malformed("matrix rows must be arrays")),
        })
        .collect::<Result<Vec<_>>>()?;
    Matrix::from_rows(rows).map_err(|err| malformed(err.message().to_string()))
}

#[derive(Default)]
struct Loader {
    heap: Heap,
    ids: HashMap<String, NodeId>,
    /// Reserved node per JSON value, keyed by address.
    reserved: HashMap<usize, NodeId>,
    frames: HashSet<NodeId>,
}

fn address(json: &Json) -> usize {
    std::ptr::from_ref(json) as usize
}

impl Loader {
    fn reserve(&mut self, json: &Json) -> Result<()> {
        let (form, id) = parse(json)?;
        if form.is_node() {
            let node = self.heap.alloc(Node::opaque("?", ""));
            self.reserved.insert(address(json), node);
            if matches!(form, Form::Frame { .. }) {
                self.frames.insert(node);
            }
            if let Some(id) = id
                && self.ids.insert(id.to_string(), node).is_some()
            {
                return Err(malformed(format!("duplicate '$id' \"{id}\"")).with_context("id", id));
            }
        } else if id.is_some() {
            return Err(malformed("'$id' is only allowed on nodes"));
        }
        for child in form.children() {
            self.reserve(child)?;
        }
        Ok(())
    }

    fn build(&mut self, json: &Json) -> Result<Value> {
        let (form, _) = parse(json)?;
        let node = match form {
            Form::Empty => return Ok(Value::Empty),
            Form::Atom(atom) => return Ok(Value::Atom(atom)),
            Form::Ref(name) => {
                return self.ids.get(name).copied().map(Value::Ref).ok_or_else(|| {
                    malformed(format!("'$ref' to unknown id \"{name}\"")).with_context("id", name)
                });
            }
            Form::List(items) => Node::list(self.build_all(items)?),
            Form::Set(items) => Node::set(self.build_all(items)?),
            Form::Tuple(items) => Node::tuple(self.build_all(items)?),
            Form::Matrix(rows) => Node::matrix(matrix(rows)?),
            Form::Record { type_name, fields } => {
                Node::record(type_name, self.build_fields(&fields)?)
            }
            Form::Mapping(pairs) => {
                let mut out = Vec::with_capacity(pairs.len());
                for (key, value) in pairs {
                    out.push((Atom::Str(key.clone()), self.build(value)?));
                }
                Node::mapping(out)
            }
            Form::Frame {
                name,
                args,
                locals,
                caller,
                global,
            } => {
                let caller = match caller.map(|c| self.build(c)).transpose()? {
                    None | Some(Value::Empty) => None,
                    Some(Value::Ref(id)) if self.frames.contains(&id) => Some(id),
                    Some(_) => {
                        return Err(malformed(format!("caller of frame '{name}' is not a frame")));
                    }
                };
                Node::frame(Frame {
                    name: name.to_string(),
                    args: self.build_fields(&args)?,
                    locals: self.build_fields(&locals)?,
                    caller,
                    global,
                })
            }
        };
        let id = self
            .reserved
            .get(&address(json))
            .copied()
            .ok_or_else(|| Error::unexpected("node was not reserved").with_operation("input::load"))?;
        *self.heap.node_mut(id)? = node;
        Ok(Value::Ref(id))
    }

    fn build_all(&mut self, items: &[Json]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.build(item)).collect()
    }

    fn build_fields(&mut self, fields: &[(&String, &Json)]) -> Result<Vec<Field>> {
        fields
            .iter()
            .map(|(name, value)| Ok(Field::new(name.as_str(), self.build(value)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lolviz_core::{ErrorKind, NodeBody};
    use pretty_assertions::assert_eq;

    fn root_node(doc: &Document) -> &Node {
        doc.heap.node(doc.root.as_ref_id().unwrap()).unwrap()
    }

    #[test]
    fn test_plain_json() {
        let doc = load_str(r#"[1, 2.5, "x", true, null, {"a": 1}]"#).unwrap();
        let NodeBody::Sequence { items, tuple } = &root_node(&doc).body else {
            panic!("expected a list");
        };
        assert!(!tuple);
        assert_eq!(items[0], Value::from(1));
        assert_eq!(items[1], Value::from(2.5));
        assert_eq!(items[2], Value::from("x"));
        assert_eq!(items[3], Value::from(true));
        assert_eq!(items[4], Value::Empty);
        let map = doc.heap.node(items[5].as_ref_id().unwrap()).unwrap();
        assert_eq!(map.body, NodeBody::Mapping(vec![(Atom::Str("a".into()), Value::from(1))]));
    }

    #[test]
    fn test_forward_ref_and_cycle() {
        let doc = load_str(
            r#"{"$type": "Node", "$id": "x", "value": 1,
                "next": {"$type": "Node", "value": 2, "next": {"$ref": "x"}}}"#,
        )
        .unwrap();
        let x = doc.id("x").unwrap();
        assert_eq!(doc.root, Value::Ref(x));
        let y = root_node(&doc).field("next").unwrap().as_ref_id().unwrap();
        assert_eq!(doc.heap.node(y).unwrap().field("next"), Some(&Value::Ref(x)));
        assert_eq!(doc.heap.len(), 2);

        let doc = load_str(r#"[{"$ref": "later"}, {"$set": [1], "$id": "later"}]"#).unwrap();
        let later = doc.id("later").unwrap();
        assert_eq!(doc.heap.node(later).unwrap().type_name, "set");
    }

    #[test]
    fn test_special_forms() {
        let doc = load_str(r#"{"$tuple": ["b", 230]}"#).unwrap();
        assert_eq!(root_node(&doc).body, NodeBody::Sequence {
            items: vec!["b".into(), 230.into()],
            tuple: true,
        });

        let doc = load_str(r#"{"$matrix": [[1, 2], [3, 4]]}"#).unwrap();
        let NodeBody::Matrix(m) = &root_node(&doc).body else {
            panic!("expected a matrix");
        };
        assert_eq!(m.get(1, 1), Some(4.0));
    }

    #[test]
    fn test_frames() {
        let doc = load_str(
            r#"{"$frame": "f", "args": {"n": 2},
                "caller": {"$frame": "globals", "$global": true, "locals": {"xs": [1]}}}"#,
        )
        .unwrap();
        let NodeBody::Frame(frame) = &root_node(&doc).body else {
            panic!("expected a frame");
        };
        assert_eq!(frame.name, "f");
        assert_eq!(frame.args, vec![Field::new("n", 2)]);
        let caller = doc.heap.node(frame.caller.unwrap()).unwrap();
        assert!(matches!(&caller.body, NodeBody::Frame(f) if f.global));
    }

    #[test]
    fn test_malformed_documents() {
        for text in [
            r#"{"$ref": "nope"}"#,
            r#"[{"$set": [], "$id": "a"}, {"$set": [], "$id": "a"}]"#,
            r#"{"$matrix": [[1], [2, 3]]}"#,
            r#"{"$set": 3}"#,
            r#"{"$bogus": 1}"#,
            r#"{"$frame": "f", "caller": 3}"#,
            r#"[1, "#,
        ] {
            let err = load_str(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidFormat, "{text}");
        }
    }
}
