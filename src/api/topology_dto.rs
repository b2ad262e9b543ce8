use serde::{Deserialize, Serialize};

/// The DAG template handed over by the external topology provider.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TopologyDto {
    pub name: String,
    pub tasks: Vec<TopologyNodeDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TopologyNodeDto {
    pub id: String,
    pub category: String,

    #[serde(default)]
    pub parents: Vec<String>,

    #[serde(default)]
    pub children: Vec<String>,
}
