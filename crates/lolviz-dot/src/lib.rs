//! Emission layer for producing DOT output.
//!
//! Everything lolviz writes in the graph-description language goes through the
//! builders here, so escaping is applied in one place rather than at every
//! call site.
//!
//! # Module Structure
//!
//! - [`dot`]: DOT statements (graph/node/edge/cluster) and attribute lists
//! - [`html`]: HTML-like label markup (tables, fonts) and text escaping
//! - [`engine`]: the external layout engine collaborator
//! - [`diagram`]: the finished diagram handed back to callers

pub mod diagram;
pub mod dot;
pub mod engine;
pub mod html;

pub use diagram::Diagram;
pub use dot::{Attr, Compass, DotBuilder, Endpoint};
pub use engine::{LayoutEngine, OutputFormat};
pub use html::{Cell, Table, escape_html, font};
