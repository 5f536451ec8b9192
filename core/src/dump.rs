use crate::engine::Snapshot;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::fmt;

const DELIMITER: &str = "-----";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub doc_id: DocId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub leader: DocId,
    pub title: String,
    pub members: Vec<Member>,
}

/// Textual listing of every cluster: a delimiter line, `(Leader) <title>`,
/// then `<id>. <title>` per member. Unassigned followers come last.
pub struct ClusterReport<'a> {
    snapshot: &'a Snapshot,
}

impl<'a> ClusterReport<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self { Self { snapshot } }

    fn title(&self, doc: DocId) -> &str { self.snapshot.title(doc).unwrap_or_default() }

    fn member(&self, doc: DocId) -> Member {
        Member { doc_id: doc, title: self.title(doc).to_string() }
    }

    pub fn summaries(&self) -> Vec<ClusterSummary> {
        self.snapshot
            .clusters()
            .iter()
            .map(|(leader, members)| ClusterSummary {
                leader,
                title: self.title(leader).to_string(),
                members: members.iter().map(|&d| self.member(d)).collect(),
            })
            .collect()
    }

    pub fn unassigned(&self) -> Vec<Member> {
        self.snapshot.clusters().unassigned().iter().map(|&d| self.member(d)).collect()
    }
}

impl fmt::Display for ClusterReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (leader, members) in self.snapshot.clusters().iter() {
            writeln!(f, "{DELIMITER}")?;
            writeln!(f, "(Leader) {}", self.title(leader))?;
            for &doc in members {
                writeln!(f, "{}. {}", doc, self.title(doc))?;
            }
        }
        let unassigned = self.snapshot.clusters().unassigned();
        if !unassigned.is_empty() {
            writeln!(f, "{DELIMITER}")?;
            writeln!(f, "(Unassigned)")?;
            for &doc in unassigned {
                writeln!(f, "{}. {}", doc, self.title(doc))?;
            }
        }
        Ok(())
    }
}
