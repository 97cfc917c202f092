use std::fs;
use std::path::PathBuf;

use lolviz_cli::{LolvizOptions, Mode, PrefsOptions, render_image, run_main};
use lolviz_core::{Diagram, ErrorKind, LayoutEngine};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write_input(dir: &TempDir, name: &str, json: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, json).unwrap();
    path
}

fn options(input: PathBuf, mode: Mode) -> LolvizOptions {
    LolvizOptions {
        input,
        mode,
        ..Default::default()
    }
}

fn edge_count(dot: &str) -> usize {
    dot.lines().filter(|line| line.contains(" -> ")).count()
}

#[test]
fn obj_mode_draws_shared_nodes_once() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "shared.json",
        r#"[{"$id": "s", "$tuple": [1, 2]}, {"$ref": "s"}]"#,
    );
    let dot = run_main(&options(input, Mode::Obj)).unwrap().into_source();
    assert!(dot.starts_with("digraph G {"));
    assert_eq!(edge_count(&dot), 2);
}

#[test]
fn list_mode() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "list.json", "[3, 9, 10]");
    let dot = run_main(&options(input, Mode::List)).unwrap().into_source();
    assert!(dot.contains(">10</font>"));
    assert_eq!(edge_count(&dot), 0);
}

#[test]
fn dict_mode_rejects_a_list() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "list.json", "[1]");
    let err = run_main(&options(input, Mode::Dict)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn str_mode_needs_a_string() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "str.json", r#""hi""#);
    let dot = run_main(&options(input, Mode::Str)).unwrap().into_source();
    assert!(dot.contains(">'h'</font>"));

    let input = write_input(&dir, "num.json", "42");
    let err = run_main(&options(input, Mode::Str)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.context_value("mode"), Some("str"));
}

#[test]
fn chain_mode_follows_next() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "chain.json",
        r#"{"$type": "Cell", "value": "a", "next":
             {"$type": "Cell", "value": "b", "next":
               {"$type": "Cell", "value": "c", "next": null}}}"#,
    );
    let dot = run_main(&options(input, Mode::Chain)).unwrap().into_source();
    assert!(dot.contains("subgraph cluster_chain0 {"));
    assert_eq!(edge_count(&dot), 2);
}

#[test]
fn tree_mode_is_top_to_bottom() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "tree.json",
        r#"{"$type": "T", "value": 1,
             "left": {"$type": "T", "value": 2, "left": null, "right": null},
             "right": {"$type": "T", "value": 3, "left": null, "right": null}}"#,
    );
    let dot = run_main(&options(input, Mode::Tree)).unwrap().into_source();
    assert!(dot.contains("rankdir=TB;"));
    assert_eq!(edge_count(&dot), 2);
}

#[test]
fn calls_mode_with_varnames() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "calls.json",
        r#"{"$frame": "work", "args": {"n": 2}, "locals": {"secret": 7},
             "caller": {"$frame": "globals", "$global": true, "locals": {"n": 2}}}"#,
    );
    let mut opts = options(input, Mode::Calls);
    let dot = run_main(&opts).unwrap().into_source();
    assert!(dot.contains("subgraph cluster_stack {"));
    assert!(dot.contains(">secret</font>"));

    opts.varnames = Some(vec!["n".to_string()]);
    let dot = run_main(&opts).unwrap().into_source();
    assert!(!dot.contains("secret"));
}

#[test]
fn prefs_from_config_and_flags() {
    let dir = TempDir::new().unwrap();
    let config = write_input(&dir, "prefs.toml", "max_str_len = 3\n");
    let input = write_input(&dir, "words.json", r#"["abcdef"]"#);

    let mut opts = options(input, Mode::List);
    opts.prefs = PrefsOptions::new().with_config(&config);
    let dot = run_main(&opts).unwrap().into_source();
    assert!(dot.contains("'abc...'"));

    opts.prefs = opts.prefs.with_max_list_elems(1);
    let err = run_main(&opts).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
}

#[test]
fn bad_input_files() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "broken.json", "[1, 2");
    let err = run_main(&options(input, Mode::Obj)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    assert!(err.context_value("path").is_some());

    let err = run_main(&options(dir.path().join("missing.json"), Mode::Obj)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FileNotFound);
}

#[test]
fn missing_engine_gets_a_hint() {
    let dir = TempDir::new().unwrap();
    let engine = LayoutEngine::new("lolviz-no-such-layout-engine");
    let err = render_image(
        &Diagram::new("digraph G {}\n"),
        &engine,
        &dir.path().join("out.png"),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LayoutEngineMissing);
    assert!(err.kind().is_backend());
    assert!(
        err.context_value("hint")
            .is_some_and(|hint| hint.contains("lolviz-no-such-layout-engine"))
    );
}
