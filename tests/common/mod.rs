#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use wfsynth::api::recipe_dto::RecipeDto;
use wfsynth::api::topology_dto::TopologyDto;
use wfsynth::domain::recipe::recipe::Recipe;
use wfsynth::domain::topology::Topology;

/// A -> B, A -> C, B -> D with one category per node.
pub fn four_task_topology() -> Topology {
    topology(json!({ "name": "Four-abc", "tasks": [
        { "id": "A", "category": "a", "children": ["B", "C"] },
        { "id": "B", "category": "b", "parents": ["A"], "children": ["D"] },
        { "id": "C", "category": "c", "parents": ["A"] },
        { "id": "D", "category": "d", "parents": ["B"] }
    ] }))
}

/// Two roots feeding a merge step that fans out to three leaves.
pub fn montage_like_topology() -> Topology {
    topology(json!({ "name": "Montage-xyz", "tasks": [
        { "id": "1", "category": "mProject", "children": ["3"] },
        { "id": "2", "category": "mProject", "children": ["3"] },
        { "id": "3", "category": "mAdd", "parents": ["1", "2"], "children": ["4", "5", "6"] },
        { "id": "4", "category": "mViewer", "parents": ["3"] },
        { "id": "5", "category": "mViewer", "parents": ["3"] },
        { "id": "6", "category": "mJPEG", "parents": ["3"] }
    ] }))
}

pub fn topology(value: Value) -> Topology {
    let dto: TopologyDto = serde_json::from_value(value).unwrap();
    Topology::try_from(dto).unwrap()
}

/// One runtime range and one `.dat` input and output per category.
pub fn recipe(categories: &[&str]) -> Recipe {
    let tasks: serde_json::Map<String, Value> = categories
        .iter()
        .map(|category| {
            let entry = json!({
                "runtime": { "distribution": { "name": "norm", "params": [0.5, 0.1] }, "min": 1.0, "max": 30.0 },
                "input": { ".dat": { "min": 100, "max": 1000 } },
                "output": { ".dat": { "min": 10, "max": 50 }, ".log": { "min": 1, "max": 1 } }
            });
            (category.to_string(), entry)
        })
        .collect();

    let dto: RecipeDto = serde_json::from_value(Value::Object(tasks)).unwrap();
    Recipe::try_from(dto).unwrap()
}

/// Writes a benchmark document whose tasks are given as raw JSON.
pub fn write_document(dir: &Path, tasks: Vec<Value>) -> PathBuf {
    let path = dir.join("benchmark.json");
    let document = json!({
        "name": "Shell-Benchmark",
        "schemaVersion": "1.3",
        "workflow": { "makespan": 0, "tasks": tasks }
    });
    fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
    path
}

/// A task running `script` with `/bin/sh`. `extra` is appended after the script.
pub fn shell_task(name: &str, script: &str, extra: &[&str], inputs: &[&str], outputs: &[&str]) -> Value {
    let mut arguments = vec!["-c".to_string(), script.to_string()];
    arguments.extend(extra.iter().map(|a| a.to_string()));

    let files: Vec<Value> = inputs
        .iter()
        .map(|name| json!({ "name": name, "size": 1, "link": "input" }))
        .chain(outputs.iter().map(|name| json!({ "name": name, "size": 1, "link": "output" })))
        .collect();

    json!({
        "name": name,
        "command": { "program": "/bin/sh", "arguments": arguments },
        "files": files
    })
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> =
        fs::read_dir(dir).unwrap().map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect();
    names.sort();
    names
}
