use std::collections::{BTreeSet, HashSet};

use crate::domain::file::{File, FileLink};
use crate::domain::id::TaskName;

/// Program invocation recorded for a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    pub program: String,
    pub arguments: Vec<String>,
}

/// A compute task of the synthetic workflow.
///
/// Files are only added through [`Task::add_file`], which keeps the per-link extension sets and the name set in
/// step with the manifest. Those sets drive the duplicate-extension check of the task builder.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: TaskName,
    /// Numeric part of the name, zero padded.
    pub id: String,
    pub category: String,
    /// Seconds.
    pub runtime: f64,
    pub command: Command,

    files: Vec<File>,
    file_names: HashSet<String>,
    input_extensions: BTreeSet<String>,
    output_extensions: BTreeSet<String>,
}

impl Task {
    pub fn new(name: TaskName, id: impl Into<String>, category: impl Into<String>, runtime: f64) -> Self {
        Task {
            name,
            id: id.into(),
            category: category.into(),
            runtime,
            command: Command::default(),
            files: Vec::new(),
            file_names: HashSet::new(),
            input_extensions: BTreeSet::new(),
            output_extensions: BTreeSet::new(),
        }
    }

    /// Adds `file` unless a file with the same name is already in the manifest.
    pub fn add_file(&mut self, file: File) -> bool {
        if !self.file_names.insert(file.name.clone()) {
            return false;
        }

        let extension = file.extension().to_string();
        match file.link {
            FileLink::Input => self.input_extensions.insert(extension),
            FileLink::Output => self.output_extensions.insert(extension),
        };
        self.files.push(file);
        true
    }

    pub fn has_extension(&self, link: FileLink, extension: &str) -> bool {
        match link {
            FileLink::Input => self.input_extensions.contains(extension),
            FileLink::Output => self.output_extensions.contains(extension),
        }
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn files_by_link(&self, link: FileLink) -> impl Iterator<Item = &File> {
        self.files.iter().filter(move |f| f.link == link)
    }

    pub fn input_files(&self) -> impl Iterator<Item = &File> {
        self.files_by_link(FileLink::Input)
    }

    pub fn output_files(&self) -> impl Iterator<Item = &File> {
        self.files_by_link(FileLink::Output)
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
        self.file_names.clear();
        self.input_extensions.clear();
        self.output_extensions.clear();
    }
}
