use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::api::topology_dto::TopologyDto;
use crate::domain::id::NodeId;
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

#[derive(Debug, Clone, PartialEq)]
pub struct TopologyNode {
    pub id: NodeId,
    pub category: String,
    pub parents: Vec<NodeId>,
    pub children: Vec<NodeId>,
}

/// DAG template: node ids, categories and parent/child sets.
///
/// Parent and child lists are symmetric after construction. Acyclicity is not checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub name: String,
    pub nodes: Vec<TopologyNode>,
}

/// Narrow interface to whatever produces workflow templates.
pub trait TopologyProvider {
    fn topology(&self, num_tasks: usize) -> Result<Topology>;
}

/// A template stored as a JSON file.
#[derive(Debug, Clone)]
pub struct TopologyFile {
    pub path: PathBuf,
}

impl TopologyFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TopologyFile { path: path.into() }
    }
}

impl TopologyProvider for TopologyFile {
    fn topology(&self, num_tasks: usize) -> Result<Topology> {
        let dto: TopologyDto = parse_json_file(&self.path)?;
        let topology = Topology::try_from(dto)?;

        if topology.len() != num_tasks {
            log::warn!(
                "Template '{}' has {} tasks, {} were requested. Using the template as is.",
                self.path.display(),
                topology.len(),
                num_tasks
            );
        }
        Ok(topology)
    }
}

impl TopologyProvider for Topology {
    fn topology(&self, _num_tasks: usize) -> Result<Topology> {
        Ok(self.clone())
    }
}

impl Topology {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.nodes.iter().map(|n| n.category.as_str()).collect()
    }

    /// Node indices with every parent visited before its children. Ties keep template order.
    ///
    /// Nodes on a cycle can never be released; they are appended in template order.
    pub fn dependency_order(&self) -> Vec<usize> {
        let position: HashMap<&NodeId, usize> = self.nodes.iter().enumerate().map(|(i, n)| (&n.id, i)).collect();
        let mut missing_parents: Vec<usize> = self.nodes.iter().map(|n| n.parents.len()).collect();
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        loop {
            let ready: Vec<usize> = (0..self.nodes.len()).filter(|&i| !visited[i] && missing_parents[i] == 0).collect();
            if ready.is_empty() {
                break;
            }

            for i in ready {
                visited[i] = true;
                order.push(i);
                for child in &self.nodes[i].children {
                    if let Some(&c) = position.get(child) {
                        missing_parents[c] -= 1;
                    }
                }
            }
        }

        if order.len() < self.nodes.len() {
            log::warn!(
                "Template '{}' contains a cycle; {} tasks are built without inherited inputs.",
                self.name,
                self.nodes.len() - order.len()
            );
            order.extend((0..self.nodes.len()).filter(|&i| !visited[i]));
        }
        order
    }
}

impl TryFrom<TopologyDto> for Topology {
    type Error = Error;

    fn try_from(dto: TopologyDto) -> Result<Self> {
        let mut position: HashMap<String, usize> = HashMap::new();
        for (i, node) in dto.tasks.iter().enumerate() {
            if position.insert(node.id.clone(), i).is_some() {
                return Err(Error::ModelConstructionError(format!("Duplicate node id '{}' in template", node.id)));
            }
        }

        let mut parents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); dto.tasks.len()];
        let mut children: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); dto.tasks.len()];

        let lookup = |id: &str, referenced_by: &str| {
            position.get(id).copied().ok_or_else(|| {
                Error::ModelConstructionError(format!("Node '{}' references unknown node '{}'", referenced_by, id))
            })
        };

        for (i, node) in dto.tasks.iter().enumerate() {
            for parent in &node.parents {
                let p = lookup(parent, &node.id)?;
                parents[i].insert(p);
                children[p].insert(i);
            }
            for child in &node.children {
                let c = lookup(child, &node.id)?;
                children[i].insert(c);
                parents[c].insert(i);
            }
        }

        let ids: Vec<NodeId> = dto.tasks.iter().map(|n| NodeId::new(n.id.clone())).collect();
        let nodes = dto
            .tasks
            .into_iter()
            .enumerate()
            .map(|(i, node)| TopologyNode {
                id: ids[i].clone(),
                category: node.category,
                parents: parents[i].iter().map(|&p| ids[p].clone()).collect(),
                children: children[i].iter().map(|&c| ids[c].clone()).collect(),
            })
            .collect();

        Ok(Topology { name: dto.name, nodes })
    }
}
