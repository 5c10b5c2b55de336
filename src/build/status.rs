// src/build/status.rs

use std::fmt;

use crate::dag::ArtifactId;

/// Build status of a single artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    /// Not built yet.
    Pending,
    /// Steps are currently running.
    Building,
    /// Installed; terminal.
    Ready,
    /// A build step failed; terminal.
    Failed,
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactStatus::Pending => "pending",
            ArtifactStatus::Building => "building",
            ArtifactStatus::Ready => "ready",
            ArtifactStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Artifact id → status. Only forward transitions are allowed:
/// `Pending → Building → {Ready, Failed}`.
#[derive(Debug, Clone)]
pub struct StatusTable {
    statuses: Vec<ArtifactStatus>,
}

impl StatusTable {
    pub fn new(len: usize) -> Self {
        Self {
            statuses: vec![ArtifactStatus::Pending; len],
        }
    }

    pub fn get(&self, id: ArtifactId) -> ArtifactStatus {
        self.statuses[id.index()]
    }

    pub fn mark_building(&mut self, id: ArtifactId) {
        self.transition(id, ArtifactStatus::Pending, ArtifactStatus::Building);
    }

    pub fn mark_ready(&mut self, id: ArtifactId) {
        self.transition(id, ArtifactStatus::Building, ArtifactStatus::Ready);
    }

    pub fn mark_failed(&mut self, id: ArtifactId) {
        self.transition(id, ArtifactStatus::Building, ArtifactStatus::Failed);
    }

    pub fn all_ready(&self) -> bool {
        self.statuses.iter().all(|s| *s == ArtifactStatus::Ready)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactId, ArtifactStatus)> + '_ {
        self.statuses
            .iter()
            .enumerate()
            .map(|(idx, s)| (ArtifactId(idx), *s))
    }

    fn transition(&mut self, id: ArtifactId, from: ArtifactStatus, to: ArtifactStatus) {
        let slot = &mut self.statuses[id.index()];
        assert_eq!(
            *slot, from,
            "artifact {id}: illegal status transition {slot} -> {to}"
        );
        *slot = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_forward_transitions() {
        let mut table = StatusTable::new(2);
        let a = ArtifactId(0);

        table.mark_building(a);
        assert_eq!(table.get(a), ArtifactStatus::Building);
        table.mark_ready(a);
        assert_eq!(table.get(a), ArtifactStatus::Ready);
        assert!(!table.all_ready());
    }

    #[test]
    #[should_panic(expected = "illegal status transition")]
    fn ready_is_reached_only_once() {
        let mut table = StatusTable::new(1);
        table.mark_building(ArtifactId(0));
        table.mark_ready(ArtifactId(0));
        table.mark_ready(ArtifactId(0));
    }
}
