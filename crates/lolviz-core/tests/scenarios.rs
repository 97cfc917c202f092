use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use lolviz_core::{
    Describe, Describer, ErrorKind, Field, Heap, Node, Prefs, Value, Visualizer, dictviz,
    listviz, lolviz, objviz, strviz,
};
use pretty_assertions::assert_eq;

/// Node statements (`node3 [...]`), not edges.
fn node_definitions(dot: &str) -> Vec<&str> {
    dot.lines()
        .map(str::trim)
        .filter(|line| {
            line.strip_prefix("node")
                .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
                && !line.contains(" -> ")
        })
        .collect()
}

fn edges(dot: &str) -> Vec<&str> {
    dot.lines()
        .map(str::trim)
        .filter(|line| line.contains(" -> "))
        .collect()
}

#[test]
fn flat_list_is_one_row() {
    let dot = listviz(&vec![3, 9, 10], &Prefs::default()).unwrap().into_source();
    assert_eq!(node_definitions(&dot).len(), 1);
    for (i, v) in [(0, 3), (1, 9), (2, 10)] {
        assert!(dot.contains(&format!("point-size=\"9\">{i}</font>")), "{dot}");
        assert!(
            dot.contains(&format!("<td port=\"f{i}\" bgcolor=\"#fefecd\"><font point-size=\"11\">{v}</font></td>")),
            "{dot}"
        );
    }
    assert!(edges(&dot).is_empty());
    assert!(dot.contains("rankdir=LR;"));
}

#[test]
fn nested_buckets() {
    let table: Vec<Vec<(&str, i32)>> = vec![vec![], vec![], vec![("b", 230)]];
    let dot = lolviz(&table, &Prefs::default()).unwrap().into_source();

    // outer column plus three buckets; the pair is inlined
    assert_eq!(node_definitions(&dot).len(), 4, "{dot}");
    assert_eq!(dot.matches("empty list").count(), 2);
    assert!(dot.contains("'b'&rarr;230"));

    let edges = edges(&dot);
    assert_eq!(edges.len(), 3);
    assert!(edges[2].starts_with("node0:f2:c -> node3 [dir=both"), "{edges:?}");
}

#[test]
fn mapping_of_atoms() {
    let mut map = BTreeMap::new();
    map.insert("a", 999);
    map.insert("b", 1);
    let dot = dictviz(&map, &Prefs::default()).unwrap().into_source();
    assert_eq!(node_definitions(&dot).len(), 1);
    assert!(dot.contains("'a'&rarr;"));
    assert!(dot.contains(">999</font>"));
    assert!(dot.contains("'b'&rarr;"));
    assert!(edges(&dot).is_empty());

    let listed = listviz(&map, &Prefs::default()).unwrap().into_source();
    assert_eq!(listed, dot);
}

#[test]
fn mutual_reference_renders_each_node_once() {
    let mut heap = Heap::new();
    let x = heap.alloc(Node::record("Node", vec![Field::new("next", Value::Empty)]));
    let y = heap.alloc(Node::record("Node", vec![Field::new("next", x)]));
    heap.set_field(x, "next", y.into()).unwrap();

    let prefs = Prefs::default();
    let dot = Visualizer::new(&heap, &prefs)
        .objviz(&[x.into()], None)
        .unwrap()
        .into_source();
    assert_eq!(node_definitions(&dot).len(), 2);
    assert_eq!(
        edges(&dot),
        vec![
            "node0:f0:c -> node1 [dir=both, tailclip=false, arrowtail=dot, penwidth=\"0.5\", color=\"#444443\", arrowsize=.4];",
            "node1:f0:c -> node0 [dir=both, tailclip=false, arrowtail=dot, penwidth=\"0.5\", color=\"#444443\", arrowsize=.4];",
        ]
    );
}

struct Link {
    value: i32,
    next: RefCell<Option<Rc<Link>>>,
}

impl Describe for Link {
    fn describe<'a>(&'a self, cx: &mut Describer<'a>) -> Value {
        cx.record(self, "Link", |r| {
            r.field("value", &self.value).field("next", &self.next);
        })
    }
}

#[test]
fn self_loop_terminates() {
    let node = Rc::new(Link {
        value: 1,
        next: RefCell::new(None),
    });
    *node.next.borrow_mut() = Some(node.clone());

    let dot = objviz(&node, &Prefs::default()).unwrap().into_source();
    assert_eq!(node_definitions(&dot).len(), 1);
    let edges = edges(&dot);
    assert_eq!(edges.len(), 1);
    assert!(edges[0].starts_with("node0:f1:c -> node0 "));

    *node.next.borrow_mut() = None;
}

#[test]
fn shared_reference_is_one_node() {
    let shared = Rc::new(vec![1, 2]);
    let outer = vec![shared.clone(), shared.clone()];
    let dot = objviz(&outer, &Prefs::default()).unwrap().into_source();
    assert_eq!(node_definitions(&dot).len(), 2);
    let edges = edges(&dot);
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| e.contains("-> node1 ")));
}

#[test]
fn five_links_share_a_cluster() {
    let mut head: Option<Rc<Link>> = None;
    for value in (0..5).rev() {
        head = Some(Rc::new(Link {
            value,
            next: RefCell::new(head.take()),
        }));
    }
    let dot = objviz(&head, &Prefs::default()).unwrap().into_source();
    assert!(dot.contains("subgraph cluster_chain0 {"));
    assert!(!dot.contains("cluster_chain1"));
    assert_eq!(node_definitions(&dot).len(), 5);
    assert_eq!(edges(&dot).len(), 4);
}

/// Statements inside `subgraph cluster_{name} { ... }`.
fn cluster_body<'d>(dot: &'d str, name: &str) -> Vec<&'d str> {
    let header = format!("subgraph cluster_{name} {{");
    dot.lines()
        .map(str::trim)
        .skip_while(|line| *line != header)
        .skip(1)
        .take_while(|line| *line != "}")
        .collect()
}

#[test]
fn chain_cluster_ignores_a_different_field() {
    let mut heap = Heap::new();
    let links: Vec<_> = (0..5)
        .map(|i| heap.alloc(Node::record("Node", vec![Field::new("value", i)])))
        .collect();
    for pair in links.windows(2) {
        heap.set_field(pair[0], "next", pair[1].into()).unwrap();
    }
    let extra = heap.alloc(Node::record(
        "Node",
        vec![Field::new("value", 5), Field::new("prev", links[0])],
    ));

    let prefs = Prefs::default();
    let visualizer = Visualizer::new(&heap, &prefs);
    let orders: [Vec<Value>; 3] = [
        vec![extra.into()],
        vec![links[0].into(), extra.into()],
        vec![extra.into(), links[4].into(), links[0].into()],
    ];
    for roots in orders {
        let dot = visualizer.objviz(&roots, None).unwrap().into_source();
        assert!(!dot.contains("cluster_chain1"), "{dot}");
        let body = cluster_body(&dot, "chain0");
        for id in &links {
            assert!(
                body.iter().any(|line| line.starts_with(&format!("node{id} ["))),
                "{dot}"
            );
        }
        assert!(!body.iter().any(|line| line.starts_with(&format!("node{extra} ["))));
        assert_eq!(edges(&dot).len(), 5);
    }
}

#[test]
fn empty_list_and_bool_are_literal_leaves() {
    let dot = objviz(&Vec::<i32>::new(), &Prefs::default())
        .unwrap()
        .into_source();
    assert!(dot.contains(">empty list</font>"));
    assert!(!dot.contains("<table"));

    let dot = objviz(&true, &Prefs::default()).unwrap().into_source();
    assert!(dot.contains("leaf0 [shape=none"));
    assert!(dot.contains(">true</font>"));
    assert!(!dot.contains("<table"));
}

#[test]
fn long_strings_are_truncated() {
    let prefs = Prefs::default().with_max_str_len(5);
    let dot = listviz(&vec!["abcdefghijkl", "abcde"], &prefs)
        .unwrap()
        .into_source();
    assert!(dot.contains("'abcde...'"));
    assert!(dot.contains(">'abcde'</font>"));
}

#[test]
fn long_lists_are_elided() {
    let values: Vec<i32> = (0..20).collect();
    let prefs = Prefs::default().with_max_list_elems(5);
    let dot = listviz(&values, &prefs).unwrap().into_source();
    assert!(dot.contains(">3</font>"));
    assert!(dot.contains(">...</td>"));
    assert!(dot.contains(">19</font>"));
    assert!(!dot.contains(">10</font>"));
}

#[test]
fn call_stack_with_name_filter() {
    let data = vec![1, 2, 3];
    let secret = vec![9];
    let mut cx = Describer::new();
    let globals = cx.global_frame(|f| {
        f.local("data", &data);
    });
    let call = cx.frame("work", Some(globals), |f| {
        f.arg("xs", &data).local("secret", &secret);
    });
    let heap = cx.into_heap();
    let prefs = Prefs::default();
    let visualizer = Visualizer::new(&heap, &prefs);

    let dot = visualizer.callsviz(call, None).unwrap().into_source();
    assert!(dot.contains("subgraph cluster_stack {"));
    assert!(dot.contains(">secret</font>"));
    // the shared list is one node with an edge from each frame
    assert_eq!(edges(&dot).len(), 3);

    let dot = visualizer
        .callsviz(call, Some(&["xs", "data"]))
        .unwrap()
        .into_source();
    assert!(!dot.contains("secret"));
    assert!(!dot.contains(">9</font>"));
    assert_eq!(edges(&dot).len(), 2);
}

#[test]
fn string_as_characters() {
    let dot = strviz("hi", &Prefs::default()).unwrap().into_source();
    assert!(dot.contains(">'h'</font>"));
    assert!(dot.contains(">'i'</font>"));
}

#[test]
fn wrong_shape_is_invalid_argument() {
    let err = dictviz(&vec![1], &Prefs::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.operation(), "viz::dictviz");

    let err = listviz(&3, &Prefs::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn invalid_prefs_are_rejected() {
    let prefs = Prefs::default().with_max_list_elems(1);
    let err = objviz(&vec![1], &prefs).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}
