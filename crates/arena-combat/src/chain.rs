//! Combo chain graph.
//!
//! For every move, the ordered list of moves it may cancel into and the input
//! category that selects each one. The first edge matching an input wins.

use arena_common::DataError;
use serde::{Deserialize, Serialize};

use crate::input::InputCategory;
use crate::moves::{MoveId, MoveTable};

/// One legal transition out of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEdge {
    /// Input that selects this edge.
    pub input: InputCategory,
    /// Destination move.
    pub to: MoveId,
}

impl ChainEdge {
    /// Create an edge.
    #[must_use]
    pub const fn new(input: InputCategory, to: MoveId) -> Self {
        Self { input, to }
    }
}

/// Serialized form of one source move's edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEntry {
    /// Source move.
    pub from: MoveId,
    /// Edges in priority order.
    #[serde(default)]
    pub edges: Vec<ChainEdge>,
}

/// Adjacency table of legal cancels, indexed by source move.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboChainGraph {
    edges: Vec<Vec<ChainEdge>>,
}

impl Default for ComboChainGraph {
    fn default() -> Self {
        Self::standard()
    }
}

impl ComboChainGraph {
    /// Graph with no edges.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            edges: vec![Vec::new(); MoveId::COUNT],
        }
    }

    /// Add an edge after any existing edges of the source.
    #[must_use]
    pub fn with_edge(mut self, from: MoveId, input: InputCategory, to: MoveId) -> Self {
        self.edges[from.index()].push(ChainEdge::new(input, to));
        self
    }

    /// Edges out of a move, in priority order.
    #[must_use]
    pub fn edges(&self, from: MoveId) -> &[ChainEdge] {
        &self.edges[from.index()]
    }

    /// Next move for an input, if any edge matches.
    #[must_use]
    pub fn next(&self, from: MoveId, input: InputCategory) -> Option<MoveId> {
        self.edges(from)
            .iter()
            .find(|edge| edge.input == input)
            .map(|edge| edge.to)
    }

    /// Whether `to` is reachable from `from` in a single cancel.
    #[must_use]
    pub fn can_chain(&self, from: MoveId, to: MoveId) -> bool {
        self.edges(from).iter().any(|edge| edge.to == to)
    }

    /// Check the airborne rule against a move table: aerial sources may
    /// only lead to aerial moves or a slam.
    pub fn validate(&self, table: &MoveTable) -> Result<(), DataError> {
        for from in MoveId::ALL {
            if !table.get(from).is_aerial() {
                continue;
            }
            for edge in self.edges(from) {
                if !table.get(edge.to).is_aerial() {
                    return Err(DataError::IllegalChain {
                        from: from.to_string(),
                        to: edge.to.to_string(),
                        reason: "airborne chains must stay airborne or end in a slam".into(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Build from serialized entries. Sources may appear at most once.
    pub fn from_entries(entries: Vec<ChainEntry>, table: &MoveTable) -> Result<Self, DataError> {
        let mut graph = Self::empty();
        let mut seen = [false; MoveId::COUNT];
        for entry in entries {
            let slot = &mut seen[entry.from.index()];
            if *slot {
                return Err(DataError::DuplicateMove(entry.from.to_string()));
            }
            *slot = true;
            graph.edges[entry.from.index()] = entry.edges;
        }
        graph.validate(table)?;
        Ok(graph)
    }

    /// Parse and validate a graph from RON (a list of [`ChainEntry`]).
    pub fn from_ron(text: &str, table: &MoveTable) -> Result<Self, DataError> {
        let entries: Vec<ChainEntry> = ron::from_str(text)?;
        Self::from_entries(entries, table)
    }

    /// Serializable entries for every source with at least one edge.
    #[must_use]
    pub fn entries(&self) -> Vec<ChainEntry> {
        MoveId::ALL
            .iter()
            .filter(|id| !self.edges(**id).is_empty())
            .map(|id| ChainEntry {
                from: *id,
                edges: self.edges(*id).to_vec(),
            })
            .collect()
    }

    /// The built-in chain graph.
    #[must_use]
    pub fn standard() -> Self {
        use InputCategory as I;
        use MoveId as M;

        Self::empty()
            .with_edge(M::Light1, I::Light, M::Light2)
            .with_edge(M::Light1, I::Heavy, M::Heavy1)
            .with_edge(M::Light1, I::Launcher, M::Launcher)
            .with_edge(M::Light1, I::Special, M::Special)
            .with_edge(M::Light1, I::Dodge, M::Dodge)
            .with_edge(M::Light2, I::Light, M::Light3)
            .with_edge(M::Light2, I::Heavy, M::Heavy1)
            .with_edge(M::Light2, I::Launcher, M::Launcher)
            .with_edge(M::Light2, I::Special, M::Special)
            .with_edge(M::Light2, I::Dodge, M::Dodge)
            .with_edge(M::Light3, I::Light, M::Light4)
            .with_edge(M::Light3, I::Heavy, M::Heavy2)
            .with_edge(M::Light3, I::Launcher, M::Launcher)
            .with_edge(M::Light3, I::Special, M::Special)
            .with_edge(M::Light3, I::Dodge, M::Dodge)
            .with_edge(M::Light4, I::Light, M::Light5)
            .with_edge(M::Light4, I::Heavy, M::Heavy2)
            .with_edge(M::Light4, I::Special, M::Special)
            .with_edge(M::Light4, I::Ultimate, M::Ultimate)
            .with_edge(M::Light4, I::Dodge, M::Dodge)
            .with_edge(M::Light5, I::Special, M::Special)
            .with_edge(M::Light5, I::Ultimate, M::Ultimate)
            .with_edge(M::Light5, I::Dodge, M::Dodge)
            .with_edge(M::Heavy1, I::Heavy, M::Heavy2)
            .with_edge(M::Heavy1, I::Launcher, M::Launcher)
            .with_edge(M::Heavy1, I::Special, M::Special)
            .with_edge(M::Heavy1, I::Dodge, M::Dodge)
            .with_edge(M::Heavy2, I::Special, M::Special)
            .with_edge(M::Heavy2, I::Ultimate, M::Ultimate)
            .with_edge(M::Heavy2, I::Dodge, M::Dodge)
            .with_edge(M::Launcher, I::Jump, M::AirLight1)
            .with_edge(M::Launcher, I::Special, M::Special)
            .with_edge(M::AirLight1, I::Light, M::AirLight2)
            .with_edge(M::AirLight1, I::Heavy, M::AirHeavy)
            .with_edge(M::AirLight2, I::Light, M::AirLight3)
            .with_edge(M::AirLight2, I::Heavy, M::AirHeavy)
            .with_edge(M::AirLight3, I::Heavy, M::Slam)
            .with_edge(M::AirHeavy, I::Heavy, M::Slam)
            .with_edge(M::Special, I::Ultimate, M::Ultimate)
            .with_edge(M::Dodge, I::Light, M::Light1)
            .with_edge(M::Dodge, I::Heavy, M::Heavy1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_string_reaches_light5() {
        let graph = ComboChainGraph::standard();
        let mut current = MoveId::Light1;
        for expected in [MoveId::Light2, MoveId::Light3, MoveId::Light4, MoveId::Light5] {
            current = graph.next(current, InputCategory::Light).expect("chain");
            assert_eq!(current, expected);
        }
        assert_eq!(graph.next(MoveId::Light5, InputCategory::Light), None);
    }

    #[test]
    fn test_launcher_jump_cancels_into_air() {
        let graph = ComboChainGraph::standard();
        assert_eq!(
            graph.next(MoveId::Launcher, InputCategory::Jump),
            Some(MoveId::AirLight1)
        );
    }

    #[test]
    fn test_slam_is_terminal() {
        let graph = ComboChainGraph::standard();
        assert!(graph.edges(MoveId::Slam).is_empty());
        assert!(graph.can_chain(MoveId::AirHeavy, MoveId::Slam));
    }

    #[test]
    fn test_standard_graph_is_valid() {
        let graph = ComboChainGraph::standard();
        assert!(graph.validate(&MoveTable::standard()).is_ok());
    }

    #[test]
    fn test_aerial_to_grounded_rejected() {
        let graph =
            ComboChainGraph::empty().with_edge(MoveId::AirLight1, InputCategory::Light, MoveId::Light2);
        let err = graph.validate(&MoveTable::standard());
        assert!(matches!(err, Err(DataError::IllegalChain { .. })));
    }

    #[test]
    fn test_ron_reload_matches() {
        let table = MoveTable::standard();
        let graph = ComboChainGraph::standard();
        let text = ron::ser::to_string(&graph.entries()).expect("serialize");
        let loaded = ComboChainGraph::from_ron(&text, &table).expect("parse");
        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let table = MoveTable::standard();
        let text = "[(from: Light1, edges: []), (from: Light1, edges: [])]";
        let err = ComboChainGraph::from_ron(text, &table);
        assert!(matches!(err, Err(DataError::DuplicateMove(_))));
    }
}
