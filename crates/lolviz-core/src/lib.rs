pub mod classify;
pub mod cluster;
pub mod describe;
pub mod format;
pub mod model;
pub mod prefs;
pub mod render;
pub mod viz;
pub mod walk;

pub use classify::{PRECEDENCE, Shape, Subject, classify};
pub use cluster::{Chain, find_chains};
pub use describe::{Describe, Describer, FrameScope, RecordScope, short_type_name};
pub use lolviz_dot::{Diagram, LayoutEngine, OutputFormat};
pub use lolviz_error::{Error, ErrorKind, Result};
pub use model::{Atom, Field, Frame, Heap, Matrix, Node, NodeBody, NodeId, Value};
pub use prefs::Prefs;
pub use render::{Direction, RecordLayout, RenderOptions, render};
pub use viz::{
    Handle, HeapRef, Visualizer, dictviz, listviz, llistviz, lolviz, matrixviz, objviz, strviz,
    treeviz,
};
pub use walk::{Edge, Walker};
