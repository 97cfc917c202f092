//! Layout grouping for homogeneous linked structures.
//!
//! Records of one type that each point at no more than one other record of
//! the same type look like a linked list and are kept together in an
//! invisible cluster. If any node of the type has two same-type links the
//! type is treated as a tree and left alone. The chain follows the field that
//! carries the most same-type links, whatever order the walk met them in.
//! Grouping never changes which nodes or edges are drawn.

use std::collections::{HashMap, HashSet};

use lolviz_error::Result;

use crate::model::{Heap, NodeBody, NodeId};
use crate::walk::Edge;

/// Nodes of one record type linked through the same field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub type_name: String,
    pub field: String,
    /// Members in reachable order.
    pub members: Vec<NodeId>,
}

fn record_type(heap: &Heap, id: NodeId) -> Result<Option<&str>> {
    let node = heap.node(id)?;
    Ok(match node.body {
        NodeBody::Record(_) => Some(node.type_name.as_str()),
        _ => None,
    })
}

/// The link field carrying the most same-type edges; ties go to the field
/// seen first.
fn dominant_field(links: &[&Edge]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for edge in links {
        match counts.iter_mut().find(|(field, _)| *field == edge.field) {
            Some((_, count)) => *count += 1,
            None => counts.push((edge.field.as_str(), 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (field, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((field, count));
        }
    }
    best.map(|(field, _)| field.to_string())
}

pub fn find_chains(heap: &Heap, reachable: &[NodeId], edges: &[Edge]) -> Result<Vec<Chain>> {
    // Same-type edges, grouped by type in first-seen order.
    let mut types: Vec<&str> = Vec::new();
    let mut links: HashMap<&str, Vec<&Edge>> = HashMap::new();
    for edge in edges {
        let Some(source_type) = record_type(heap, edge.source)? else {
            continue;
        };
        if record_type(heap, edge.target)? != Some(source_type) {
            continue;
        }
        if !links.contains_key(source_type) {
            types.push(source_type);
        }
        links.entry(source_type).or_default().push(edge);
    }

    let position: HashMap<NodeId, usize> = reachable
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();

    let mut chains = Vec::new();
    for type_name in types {
        let type_links = &links[type_name];
        let mut per_node: HashMap<NodeId, usize> = HashMap::new();
        for edge in type_links {
            *per_node.entry(edge.source).or_default() += 1;
        }
        let max_links = per_node.values().copied().max().unwrap_or(0);
        if max_links != 1 {
            tracing::debug!(type_name, max_links, "not a chain, skipping cluster");
            continue;
        }

        let Some(field) = dominant_field(type_links) else {
            continue;
        };
        let mut seen = HashSet::new();
        let mut members: Vec<NodeId> = type_links
            .iter()
            .filter(|edge| edge.field == field)
            .flat_map(|edge| [edge.source, edge.target])
            .filter(|id| seen.insert(*id))
            .collect();
        members.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
        if members.len() < 2 {
            continue;
        }

        tracing::debug!(type_name, %field, members = members.len(), "chain cluster");
        chains.push(Chain {
            type_name: type_name.to_string(),
            field,
            members,
        });
    }
    Ok(chains)
}
