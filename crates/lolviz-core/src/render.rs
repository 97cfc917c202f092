//! DOT emission for a reachable object graph.
//!
//! One render call walks the roots once, classifies every node, and writes
//! each node exactly once: frames inside the `stack` cluster (outermost
//! first), chain members inside their `chain{k}` cluster, everything else at
//! the top level. Edges follow, in node then slot order.

use std::collections::{HashMap, HashSet};

use lolviz_dot::{Attr, Cell, Compass, Diagram, DotBuilder, Endpoint, Table, escape_html, font};
use lolviz_error::Result;
use strum_macros::{Display, EnumString};

use crate::classify::{Shape, Subject, classify, fits_row};
use crate::cluster::find_chains;
use crate::format::{ELLIPSIS, atom_html, atom_text, format_float, pair_html, truncate};
use crate::model::{Atom, Heap, Matrix, Node, NodeBody, NodeId, Value};
use crate::prefs::Prefs;
use crate::walk::{Edge, Resolved, Slot, SlotLabel, Walker, visible_indices};

pub const YELLOW: &str = "#fefecd";
pub const GREEN: &str = "#cfe2d4";
pub const BLUE: &str = "#D9E6F5";
pub const GREY: &str = "#444443";

const INDEX_POINT_SIZE: u32 = 9;
const VALUE_POINT_SIZE: u32 = 11;

/// Graph `rankdir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum Direction {
    #[default]
    #[strum(serialize = "LR")]
    LeftRight,
    #[strum(serialize = "TB")]
    TopBottom,
}

/// How record nodes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordLayout {
    /// One `name | value` row per field.
    #[default]
    Table,
    /// Field names over values, side by side (linked-list cells).
    Row,
    /// First field on top, the remaining fields as ports below (tree nodes).
    Tree,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    pub direction: Direction,
    pub show_assoc: bool,
    pub record_layout: RecordLayout,
    /// Draw the first root horizontally even when it holds references.
    pub row_root: bool,
    /// Frame bindings to show; `None` shows all.
    pub varnames: Option<Vec<String>>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_assoc(mut self, show_assoc: bool) -> Self {
        self.show_assoc = show_assoc;
        self
    }

    pub fn with_record_layout(mut self, layout: RecordLayout) -> Self {
        self.record_layout = layout;
        self
    }

    pub fn with_row_root(mut self, row_root: bool) -> Self {
        self.row_root = row_root;
        self
    }

    pub fn with_varnames<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.varnames = Some(names.iter().map(|n| n.as_ref().to_string()).collect());
        self
    }
}

pub fn node_id(id: NodeId) -> String {
    format!("node{id}")
}

fn port_name(port: usize) -> String {
    format!("f{port}")
}

fn leaf_attrs(text: &str) -> Vec<Attr> {
    vec![
        Attr::bare("shape", "none"),
        Attr::quoted("margin", "0.03"),
        Attr::html("label", font(&escape_html(text), Some(GREY), Some(INDEX_POINT_SIZE))),
    ]
}

fn table_attrs(table: &Table) -> Vec<Attr> {
    vec![
        Attr::bare("shape", "none"),
        Attr::quoted("margin", "0"),
        Attr::quoted("fontname", "Helvetica"),
        Attr::quoted("fontcolor", GREY),
        Attr::html("label", table.render()),
    ]
}

fn small(markup: &str) -> Cell {
    Cell::markup(font(markup, Some(GREY), Some(INDEX_POINT_SIZE)))
}

fn index_cell(label: &str, bgcolor: &str) -> Cell {
    small(&escape_html(label))
        .bgcolor(bgcolor)
        .attr("border", "0")
}

fn opaque_table(type_name: &str, text: &str, prefs: &Prefs) -> Table {
    let mut table = Table::new();
    table.row(vec![index_cell(type_name, YELLOW)]);
    table.row(vec![
        Cell::text(&truncate(text, prefs.max_str_len)).bgcolor(YELLOW),
    ]);
    table
}

/// Render `roots` and everything reachable from them.
pub fn render(
    heap: &Heap,
    prefs: &Prefs,
    roots: &[Value],
    options: &RenderOptions,
) -> Result<Diagram> {
    let mut walker = Walker::new(heap, prefs).with_assoc(options.show_assoc);
    if let Some(names) = &options.varnames {
        walker = walker.with_names(names.as_slice());
    }
    let renderer = Renderer {
        walker: &walker,
        options,
    };
    renderer.run(roots)
}

struct Renderer<'r> {
    walker: &'r Walker<'r>,
    options: &'r RenderOptions,
}

impl Renderer<'_> {
    fn run(&self, roots: &[Value]) -> Result<Diagram> {
        let heap = self.walker.heap();
        let reachable = self.walker.reachable(roots)?;
        let edges = self.walker.edges(&reachable)?;
        let chains = find_chains(heap, &reachable, &edges)?;

        let mut shapes: HashMap<NodeId, Shape> = HashMap::with_capacity(reachable.len());
        for &id in &reachable {
            let node = heap.node(id)?;
            shapes.insert(id, classify(self.walker, Subject::Node(node)));
        }
        if self.options.row_root
            && let Some(root) = roots.first().and_then(Value::as_ref_id)
            && shapes.get(&root) == Some(&Shape::VerticalList)
            && fits_row(self.walker, heap.node(root)?)
        {
            shapes.insert(root, Shape::FlatRow);
        }

        let mut dot = DotBuilder::new("G");
        dot.attr(Attr::bare("rankdir", self.options.direction.to_string()))
            .attr(Attr::bare("nodesep", ".05"))
            .attr(Attr::bare("ranksep", ".3"))
            .node_defaults(&[
                Attr::quoted("penwidth", "0.5"),
                Attr::bare("shape", "box"),
                Attr::bare("width", ".1"),
                Attr::bare("height", ".1"),
            ])
            .blank();

        for (i, root) in roots.iter().enumerate() {
            if let Value::Atom(atom) = root {
                dot.node(&format!("leaf{i}"), &self.atom_leaf(atom));
            }
        }

        let mut frames: Vec<NodeId> = reachable
            .iter()
            .copied()
            .filter(|id| shapes.get(id) == Some(&Shape::Frame))
            .collect();
        frames.reverse();
        let mut clustered: HashSet<NodeId> = frames.iter().copied().collect();
        clustered.extend(chains.iter().flat_map(|chain| chain.members.iter().copied()));

        for &id in &reachable {
            if !clustered.contains(&id) {
                self.emit_node(&mut dot, id, &shapes)?;
            }
        }
        if !frames.is_empty() {
            dot.start_cluster("stack", &[Attr::bare("style", "invis")]);
            for &id in &frames {
                self.emit_node(&mut dot, id, &shapes)?;
            }
            dot.end_cluster();
        }
        for (k, chain) in chains.iter().enumerate() {
            dot.start_cluster(&format!("chain{k}"), &[Attr::bare("style", "invis")]);
            for &id in &chain.members {
                self.emit_node(&mut dot, id, &shapes)?;
            }
            dot.end_cluster();
        }

        dot.blank();
        for edge in &edges {
            self.emit_edge(&mut dot, edge, &shapes);
        }

        tracing::debug!(
            nodes = reachable.len(),
            edges = edges.len(),
            chains = chains.len(),
            frames = frames.len(),
            "rendered diagram"
        );
        Ok(Diagram::new(dot.build()))
    }

    fn atom_leaf(&self, atom: &Atom) -> Vec<Attr> {
        let prefs = self.walker.prefs();
        match classify(self.walker, Subject::Atom(atom)) {
            Shape::Bool => leaf_attrs(&atom_text(atom, prefs)),
            _ => table_attrs(&opaque_table(atom.kind_name(), &atom_text(atom, prefs), prefs)),
        }
    }

    fn emit_node(
        &self,
        dot: &mut DotBuilder,
        id: NodeId,
        shapes: &HashMap<NodeId, Shape>,
    ) -> Result<()> {
        let node = self.walker.heap().node(id)?;
        let shape = shapes.get(&id).copied().unwrap_or(Shape::Opaque);
        let attrs = match shape {
            Shape::EmptyList => leaf_attrs("empty list"),
            Shape::EmptySet => leaf_attrs("empty set"),
            _ => table_attrs(&self.table(node, shape)),
        };
        dot.node(&node_id(id), &attrs);
        Ok(())
    }

    fn emit_edge(&self, dot: &mut DotBuilder, edge: &Edge, shapes: &HashMap<NodeId, Shape>) {
        let from = Endpoint::node(node_id(edge.source)).port(port_name(edge.port));
        let style = [
            Attr::quoted("penwidth", "0.5"),
            Attr::quoted("color", GREY),
            Attr::bare("arrowsize", ".4"),
        ];
        if shapes.get(&edge.source) == Some(&Shape::FlatRow) {
            let to = Endpoint::node(node_id(edge.target)).compass(Compass::W);
            dot.edge(&from.compass(Compass::S), &to, &style);
        } else {
            let mut attrs = vec![
                Attr::bare("dir", "both"),
                Attr::bare("tailclip", "false"),
                Attr::bare("arrowtail", "dot"),
            ];
            attrs.extend(style);
            dot.edge(
                &from.compass(Compass::C),
                &Endpoint::node(node_id(edge.target)),
                &attrs,
            );
        }
    }

    fn table(&self, node: &Node, shape: Shape) -> Table {
        let prefs = self.walker.prefs();
        match (&node.body, shape) {
            (NodeBody::Frame(frame), _) => self.frame_table(&frame.name, node),
            (NodeBody::Mapping(_), _) => self.mapping_table(node),
            (NodeBody::Matrix(matrix), _) => self.matrix_table(matrix),
            (NodeBody::Sequence { .. }, Shape::FlatRow) => self.row_table(node, true),
            (NodeBody::Set(_), Shape::FlatRow) => self.row_table(node, false),
            (NodeBody::Sequence { .. }, _) => self.column_table(node, true),
            (NodeBody::Set(_), _) => self.column_table(node, false),
            (NodeBody::Record(_), _) => self.record_table(node),
            (NodeBody::Opaque(text), _) => opaque_table(&node.type_name, text, prefs),
        }
    }

    fn value_cell(&self, slot: &Slot<'_>, bgcolor: &str) -> Cell {
        let prefs = self.walker.prefs();
        match slot {
            Slot::Item { port, value, .. } => {
                let markup = match self.walker.resolve(value) {
                    Resolved::Atom(atom) => font(&atom_html(atom, prefs), None, Some(VALUE_POINT_SIZE)),
                    Resolved::Pair(key, val) => {
                        font(&pair_html(key, val, prefs), None, Some(VALUE_POINT_SIZE))
                    }
                    Resolved::Blank | Resolved::Ref(_) => String::new(),
                };
                Cell::markup(markup).port(port_name(*port)).bgcolor(bgcolor)
            }
            Slot::Elided => Cell::text(ELLIPSIS).bgcolor(bgcolor),
        }
    }

    fn label_cell(slot: &Slot<'_>, bgcolor: &str) -> Cell {
        match slot {
            Slot::Item { label, .. } => index_cell(&label.field_name(), bgcolor),
            Slot::Elided => index_cell("", bgcolor),
        }
    }

    fn row_table(&self, node: &Node, indexed: bool) -> Table {
        let slots = self.walker.slots(node);
        let mut table = Table::new();
        if indexed {
            table.row(
                slots
                    .iter()
                    .map(|slot| Self::label_cell(slot, YELLOW))
                    .collect(),
            );
        }
        table.row(slots.iter().map(|slot| self.value_cell(slot, YELLOW)).collect());
        table
    }

    fn column_table(&self, node: &Node, indexed: bool) -> Table {
        let mut table = Table::new();
        for slot in self.walker.slots(node) {
            let mut cells = Vec::with_capacity(2);
            if indexed {
                cells.push(Self::label_cell(&slot, YELLOW));
            }
            cells.push(self.value_cell(&slot, YELLOW));
            table.row(cells);
        }
        table
    }

    fn mapping_table(&self, node: &Node) -> Table {
        let prefs = self.walker.prefs();
        let mut table = Table::new();
        for slot in self.walker.slots(node) {
            let key = match slot {
                Slot::Item {
                    label: SlotLabel::Key(key),
                    ..
                } => format!("{}&rarr;", atom_html(key, prefs)),
                _ => String::new(),
            };
            table.row(vec![
                Cell::markup(font(&key, None, Some(VALUE_POINT_SIZE)))
                    .bgcolor(YELLOW)
                    .attr("align", "right"),
                self.value_cell(&slot, YELLOW),
            ]);
        }
        if table.row_count() == 0 {
            table.row(vec![Cell::markup("").bgcolor(YELLOW)]);
        }
        table
    }

    fn record_table(&self, node: &Node) -> Table {
        let slots = self.walker.slots(node);
        let mut table = Table::new();
        if slots.is_empty() {
            table.row(vec![index_cell(&node.type_name, YELLOW)]);
            return table;
        }
        match self.options.record_layout {
            RecordLayout::Table => {
                for slot in &slots {
                    table.row(vec![
                        Self::label_cell(slot, YELLOW).attr("align", "right"),
                        self.value_cell(slot, YELLOW),
                    ]);
                }
            }
            RecordLayout::Row => {
                table.row(slots.iter().map(|slot| Self::label_cell(slot, YELLOW)).collect());
                table.row(slots.iter().map(|slot| self.value_cell(slot, YELLOW)).collect());
            }
            RecordLayout::Tree => {
                let (top, rest) = slots.split_at(1);
                let span = rest.len().max(1).to_string();
                table.row(vec![self.value_cell(&top[0], YELLOW).attr("colspan", span)]);
                if !rest.is_empty() {
                    table.row(rest.iter().map(|slot| self.value_cell(slot, YELLOW)).collect());
                }
            }
        }
        table
    }

    fn frame_table(&self, name: &str, node: &Node) -> Table {
        let mut table = Table::new();
        table.row(vec![
            Cell::markup(font(&escape_html(name), None, Some(VALUE_POINT_SIZE)))
                .bgcolor(GREEN)
                .attr("colspan", "2")
                .attr("border", "0"),
        ]);
        for slot in self.walker.slots(node) {
            table.row(vec![
                Self::label_cell(&slot, GREEN).attr("align", "right"),
                self.value_cell(&slot, GREEN),
            ]);
        }
        table
    }

    fn matrix_table(&self, matrix: &Matrix) -> Table {
        let prefs = self.walker.prefs();
        let mut table = Table::new();
        if matrix.rows() == 0 || matrix.cols() == 0 {
            table.row(vec![Cell::markup("").bgcolor(BLUE)]);
            return table;
        }
        let cols = visible_indices(matrix.cols(), prefs.max_list_elems);
        for row in visible_indices(matrix.rows(), prefs.max_list_elems) {
            let cells: Vec<Cell> = cols
                .iter()
                .map(|col| match (row, col) {
                    (Some(r), Some(c)) => {
                        let text = matrix
                            .get(r, *c)
                            .map(|v| format_float(v, prefs.float_precision))
                            .unwrap_or_default();
                        Cell::text(&text).bgcolor(BLUE)
                    }
                    _ => Cell::text(ELLIPSIS).bgcolor(BLUE),
                })
                .collect();
            table.row(cells);
        }
        table
    }
}
