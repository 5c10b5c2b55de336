// src/dag/graph.rs

use std::collections::HashMap;
use std::fmt;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::build::artifact::ArtifactSource;
use crate::errors::{ClusterlabError, Result};

/// Dense index of an artifact in the orchestrator's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId(pub usize);

impl ArtifactId {
    pub fn index(self) -> usize {
        self.0
    }

    fn node(self) -> NodeIndex {
        NodeIndex::new(self.0)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dependency graph over a fixed artifact list.
///
/// Node `i` is the artifact at position `i` of the list the graph was built
/// from. Edge direction: dependency -> dependent.
#[derive(Debug, Clone)]
pub struct ArtifactGraph {
    graph: DiGraph<ArtifactId, ()>,
    names: Vec<String>,
}

impl ArtifactGraph {
    /// Build the graph from artifacts whose dependencies are given by name.
    ///
    /// Duplicate artifact names and unknown dependency names are rejected.
    pub fn new(artifacts: &[ArtifactSource]) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(artifacts.len(), artifacts.len());
        let mut by_name: HashMap<&str, ArtifactId> = HashMap::new();

        for (idx, artifact) in artifacts.iter().enumerate() {
            let id = ArtifactId(idx);
            if by_name.insert(artifact.name(), id).is_some() {
                return Err(ClusterlabError::ConfigError(format!(
                    "artifact '{}' is defined more than once",
                    artifact.name()
                )));
            }
            let node = graph.add_node(id);
            debug_assert_eq!(node, id.node());
        }

        for (idx, artifact) in artifacts.iter().enumerate() {
            for dep in artifact.dependencies() {
                let dep_id = by_name.get(dep.as_str()).copied().ok_or_else(|| {
                    ClusterlabError::ConfigError(format!(
                        "artifact '{}' has unknown dependency '{}'",
                        artifact.name(),
                        dep
                    ))
                })?;
                graph.update_edge(dep_id.node(), ArtifactId(idx).node(), ());
            }
        }

        Ok(Self {
            graph,
            names: artifacts.iter().map(|a| a.name().to_string()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ArtifactId> + '_ {
        (0..self.names.len()).map(ArtifactId)
    }

    pub fn name(&self, id: ArtifactId) -> &str {
        &self.names[id.index()]
    }

    pub fn id_of(&self, name: &str) -> Option<ArtifactId> {
        self.names.iter().position(|n| n == name).map(ArtifactId)
    }

    /// Artifacts `id` is configured against.
    pub fn dependencies_of(&self, id: ArtifactId) -> Vec<ArtifactId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Artifacts configured against `id`.
    pub fn dependents_of(&self, id: ArtifactId) -> Vec<ArtifactId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: ArtifactId, dir: Direction) -> Vec<ArtifactId> {
        let mut out: Vec<ArtifactId> = self
            .graph
            .neighbors_directed(id.node(), dir)
            .map(|n| self.graph[n])
            .collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, deps: &[&str]) -> ArtifactSource {
        ArtifactSource::new(name, format!("http://mirror/{name}-1.0.tar.bz2"))
            .with_dependencies(deps.iter().copied())
    }

    #[test]
    fn edges_point_from_dependency_to_dependent() {
        let graph = ArtifactGraph::new(&[
            artifact("apache", &["apr", "apr-util"]),
            artifact("apr", &[]),
            artifact("apr-util", &["apr"]),
        ])
        .unwrap();

        let apr = graph.id_of("apr").unwrap();
        let apache = graph.id_of("apache").unwrap();

        assert_eq!(graph.dependencies_of(apache).len(), 2);
        assert_eq!(graph.dependencies_of(apr), vec![]);
        assert_eq!(graph.dependents_of(apr).len(), 2);
    }

    #[test]
    fn unknown_dependency_is_a_config_error() {
        let err = ArtifactGraph::new(&[artifact("apache", &["apr"])]).unwrap_err();
        assert!(matches!(err, ClusterlabError::ConfigError(msg) if msg.contains("'apr'")));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ArtifactGraph::new(&[artifact("apr", &[]), artifact("apr", &[])]).unwrap_err();
        assert!(matches!(err, ClusterlabError::ConfigError(_)));
    }
}
