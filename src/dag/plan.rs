// src/dag/plan.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::dag::graph::{ArtifactGraph, ArtifactId};

/// Result of planning a build with Kahn's algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Artifacts in an order where every dependency comes first.
    pub order: Vec<ArtifactId>,
    /// Artifacts that can never become buildable: members of a cycle and
    /// everything that depends on one, in id order.
    pub unresolved: Vec<ArtifactId>,
}

impl BuildPlan {
    /// Topologically sort `graph`.
    ///
    /// Ties are broken by id, so for a given artifact list the order is
    /// deterministic: among artifacts that are buildable at the same time, the
    /// one listed first goes first.
    pub fn new(graph: &ArtifactGraph) -> Self {
        let mut in_degree: Vec<usize> = graph
            .ids()
            .map(|id| graph.dependencies_of(id).len())
            .collect();

        let mut queue: VecDeque<ArtifactId> =
            graph.ids().filter(|id| in_degree[id.index()] == 0).collect();
        let mut order = Vec::with_capacity(graph.len());

        while let Some(id) = queue.pop_front() {
            order.push(id);
            for dependent in graph.dependents_of(id) {
                let degree = &mut in_degree[dependent.index()];
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        let unresolved: Vec<ArtifactId> = graph
            .ids()
            .filter(|id| in_degree[id.index()] > 0)
            .collect();

        debug!(
            ordered = order.len(),
            unresolved = unresolved.len(),
            "computed build plan"
        );

        Self { order, unresolved }
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::artifact::ArtifactSource;

    fn graph(spec: &[(&str, &[&str])]) -> ArtifactGraph {
        let artifacts: Vec<ArtifactSource> = spec
            .iter()
            .map(|(name, deps)| {
                ArtifactSource::new(*name, format!("http://m/{name}.tar.gz"))
                    .with_dependencies(deps.iter().copied())
            })
            .collect();
        ArtifactGraph::new(&artifacts).unwrap()
    }

    fn names(g: &ArtifactGraph, ids: &[ArtifactId]) -> Vec<String> {
        ids.iter().map(|id| g.name(*id).to_string()).collect()
    }

    #[test]
    fn apache_stack_orders_dependencies_first() {
        let g = graph(&[
            ("apache", &["apr", "apr-util"]),
            ("apr", &[]),
            ("apr-util", &["apr"]),
        ]);
        let plan = BuildPlan::new(&g);

        assert!(plan.is_complete());
        assert_eq!(names(&g, &plan.order), vec!["apr", "apr-util", "apache"]);
    }

    #[test]
    fn cycle_and_its_downstream_are_unresolved() {
        let g = graph(&[
            ("a", &["b"]),
            ("b", &["a"]),
            ("c", &["a"]),
            ("d", &[]),
        ]);
        let plan = BuildPlan::new(&g);

        assert!(!plan.is_complete());
        assert_eq!(names(&g, &plan.order), vec!["d"]);
        assert_eq!(names(&g, &plan.unresolved), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_graph_has_empty_plan() {
        let plan = BuildPlan::new(&graph(&[]));
        assert!(plan.order.is_empty());
        assert!(plan.is_complete());
    }
}
