//! Tree-shaped hereditary descriptors.
//!
//! A genome is an arena of nodes whose children are indices into the same arena, so the
//! default self-looping genome (`children == [root, root]`) needs no shared ownership.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Behavioural tag expressed by a genome node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum CellType {
    /// Feeds on food particles it overlaps.
    Phagocyte,
    /// Propels itself along its facing direction.
    #[default]
    Flagellocyte,
}

/// Cyan, magenta, yellow and white pigment channels, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Pigments {
    pub cyan: f64,
    pub magenta: f64,
    pub yellow: f64,
    pub white: f64,
}

impl Pigments {
    /// Construct pigments, clamping every channel into `[0, 1]`.
    #[must_use]
    pub fn new(cyan: f64, magenta: f64, yellow: f64, white: f64) -> Self {
        Self {
            cyan: cyan.clamp(0.0, 1.0),
            magenta: magenta.clamp(0.0, 1.0),
            yellow: yellow.clamp(0.0, 1.0),
            white: white.clamp(0.0, 1.0),
        }
    }

    /// One channel in `[0, 0.5]`, one in `[0, 1]`, two empty, shuffled across the slots.
    pub fn random(rng: &mut dyn RngCore) -> Self {
        let mut channels = [
            (rng.random::<f64>() / 2.0 * 100.0).round() / 100.0,
            (rng.random::<f64>() * 100.0).round() / 100.0,
            0.0,
            0.0,
        ];
        for idx in 0..channels.len() {
            let other = rng.random_range(0..channels.len());
            channels.swap(idx, other);
        }
        let [cyan, magenta, yellow, white] = channels;
        Self::new(cyan, magenta, yellow, white)
    }

    #[must_use]
    pub fn as_array(&self) -> [f64; 4] {
        [self.cyan, self.magenta, self.yellow, self.white]
    }
}

/// Phenotype parameters of one genome node plus the indices of its two children.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenomeNode {
    pub cell_type: CellType,
    pub pigments: Pigments,
    pub hardness: f64,
    /// Mass above which a cell carrying this node splits.
    pub split_mass: f64,
    pub split_angle: f64,
    /// Facing of each child relative to the split direction.
    pub child_angles: [f64; 2],
    pub stick_on_split: bool,
    /// Whether each child inherits the parent's connections.
    pub keep_connections: [bool; 2],
    pub nutrition_priority: f64,
    pub flagellum_force: f64,
    pub(crate) children: [usize; 2],
}

impl Default for GenomeNode {
    fn default() -> Self {
        Self {
            cell_type: CellType::default(),
            pigments: Pigments::default(),
            hardness: 0.0,
            split_mass: 0.0,
            split_angle: 0.0,
            child_angles: [0.0; 2],
            stick_on_split: false,
            keep_connections: [false; 2],
            nutrition_priority: 0.0,
            flagellum_force: 8.0,
            children: [0; 2],
        }
    }
}

impl GenomeNode {
    /// Arena indices of the two child nodes.
    #[must_use]
    pub const fn children(&self) -> [usize; 2] {
        self.children
    }
}

/// Errors raised when assembling a genome arena by hand.
#[derive(Debug, Error, PartialEq)]
pub enum GenomeError {
    #[error("genome arena is empty")]
    Empty,
    #[error("node {node} points at child {child}, but the arena only has {len} nodes")]
    DanglingChild { node: usize, child: usize, len: usize },
    #[error("root index {root} is out of range for {len} nodes")]
    InvalidRoot { root: usize, len: usize },
}

/// Rooted binary genome tree (possibly cyclic) stored as an arena.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "GenomeArena")]
pub struct Genome {
    nodes: Vec<GenomeNode>,
    root: usize,
}

/// Unchecked wire form of [`Genome`].
#[derive(Deserialize)]
struct GenomeArena {
    nodes: Vec<GenomeNode>,
    root: usize,
}

impl TryFrom<GenomeArena> for Genome {
    type Error = GenomeError;

    fn try_from(arena: GenomeArena) -> Result<Self, Self::Error> {
        let links: Vec<[usize; 2]> = arena.nodes.iter().map(|node| node.children).collect();
        Genome::from_nodes(arena.nodes, &links, arena.root)
    }
}

impl Default for Genome {
    fn default() -> Self {
        Self::null()
    }
}

impl Genome {
    /// Single-node genome whose children both refer back to itself.
    #[must_use]
    pub fn from_node(mut node: GenomeNode) -> Self {
        node.children = [0, 0];
        Self {
            nodes: vec![node],
            root: 0,
        }
    }

    /// Self-looping genome with every parameter at its default.
    #[must_use]
    pub fn null() -> Self {
        Self::from_node(GenomeNode::default())
    }

    /// Self-looping flagellocyte genome with random pigments.
    pub fn sample(rng: &mut dyn RngCore) -> Self {
        Self::from_node(GenomeNode {
            cell_type: CellType::Flagellocyte,
            pigments: Pigments::random(rng),
            hardness: 0.6,
            split_mass: 350.0,
            keep_connections: [true, true],
            nutrition_priority: 1.0,
            ..GenomeNode::default()
        })
    }

    /// Assemble a genome from explicit nodes; child indices of each node are given by
    /// `links[i]`.
    pub fn from_nodes(
        nodes: Vec<GenomeNode>,
        links: &[[usize; 2]],
        root: usize,
    ) -> Result<Self, GenomeError> {
        if nodes.is_empty() {
            return Err(GenomeError::Empty);
        }
        let len = nodes.len();
        if root >= len {
            return Err(GenomeError::InvalidRoot { root, len });
        }
        let mut genome = Self { nodes, root };
        for (node, children) in links.iter().enumerate().take(len) {
            genome.set_children(node, *children)?;
        }
        Ok(genome)
    }

    /// Append a detached node (its children point at itself) and return its index.
    pub fn push_node(&mut self, mut node: GenomeNode) -> usize {
        let idx = self.nodes.len();
        node.children = [idx, idx];
        self.nodes.push(node);
        idx
    }

    /// Re-point both children of `node`.
    pub fn set_children(&mut self, node: usize, children: [usize; 2]) -> Result<(), GenomeError> {
        let len = self.nodes.len();
        for child in children {
            if child >= len {
                return Err(GenomeError::DanglingChild { node, child, len });
            }
        }
        let entry = self.nodes.get_mut(node).ok_or(GenomeError::DanglingChild {
            node,
            child: node,
            len,
        })?;
        entry.children = children;
        Ok(())
    }

    #[must_use]
    pub fn root(&self) -> &GenomeNode {
        &self.nodes[self.root]
    }

    pub fn root_mut(&mut self) -> &mut GenomeNode {
        &mut self.nodes[self.root]
    }

    #[must_use]
    pub const fn root_index(&self) -> usize {
        self.root
    }

    #[must_use]
    pub fn node(&self, idx: usize) -> Option<&GenomeNode> {
        self.nodes.get(idx)
    }

    pub fn node_mut(&mut self, idx: usize) -> Option<&mut GenomeNode> {
        self.nodes.get_mut(idx)
    }

    /// Number of nodes stored in the arena, reachable or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indices of every node reachable from the root, root first, each listed once.
    #[must_use]
    pub fn reachable(&self) -> Vec<usize> {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        seen[self.root] = true;
        while let Some(idx) = stack.pop() {
            order.push(idx);
            for child in self.nodes[idx].children {
                if !seen[child] {
                    seen[child] = true;
                    stack.push(child);
                }
            }
        }
        order
    }

    /// Independent deep copy of the sub-genome rooted at child `slot` (0 or 1) of the root.
    ///
    /// Nodes shared by several paths, including cycles back to already copied nodes,
    /// are copied exactly once. Unreachable nodes are dropped.
    #[must_use]
    pub fn subtree(&self, slot: usize) -> Genome {
        self.copy_from(self.root().children[slot.min(1)])
    }

    /// Deep copy of the whole reachable genome.
    #[must_use]
    pub fn deep_copy(&self) -> Genome {
        self.copy_from(self.root)
    }

    fn copy_from(&self, start: usize) -> Genome {
        let mut copies: HashMap<usize, usize> = HashMap::new();
        let mut nodes = Vec::new();
        let mut pending = vec![start];
        copies.insert(start, 0);
        nodes.push(self.nodes[start].clone());

        while let Some(original) = pending.pop() {
            let copy = copies[&original];
            let mut children = self.nodes[original].children;
            for child in &mut children {
                let mapped = match copies.get(child) {
                    Some(&existing) => existing,
                    None => {
                        let fresh = nodes.len();
                        nodes.push(self.nodes[*child].clone());
                        copies.insert(*child, fresh);
                        pending.push(*child);
                        fresh
                    }
                };
                *child = mapped;
            }
            nodes[copy].children = children;
        }

        Genome { nodes, root: 0 }
    }
}

/// Extension point run over both child genomes after every split.
pub trait RadiationHook: Send + Sync {
    fn irradiate(&self, genome: &mut Genome, radiation: f64, rng: &mut dyn RngCore);
}

/// Radiation hook that leaves genomes untouched.
#[derive(Debug, Default)]
pub struct NoRadiation;

impl RadiationHook for NoRadiation {
    fn irradiate(&self, _genome: &mut Genome, _radiation: f64, _rng: &mut dyn RngCore) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    fn two_level() -> Genome {
        let mut genome = Genome::from_node(GenomeNode {
            split_mass: 100.0,
            ..GenomeNode::default()
        });
        let left = genome.push_node(GenomeNode {
            cell_type: CellType::Phagocyte,
            split_mass: 200.0,
            ..GenomeNode::default()
        });
        let right = genome.push_node(GenomeNode {
            split_mass: 300.0,
            ..GenomeNode::default()
        });
        genome.set_children(0, [left, right]).expect("root links");
        genome.set_children(left, [0, right]).expect("left links");
        genome
    }

    #[test]
    fn fresh_genome_loops_onto_itself() {
        let genome = Genome::null();
        assert_eq!(genome.root().children(), [0, 0]);
        assert_eq!(genome.reachable(), vec![0]);
        assert_eq!(genome.root().flagellum_force, 8.0);
    }

    #[test]
    fn deep_copy_of_self_loop_is_independent() {
        let mut rng = SmallRng::seed_from_u64(3);
        let original = Genome::sample(&mut rng);
        let mut copy = original.subtree(0);
        assert_eq!(copy.len(), 1);
        assert_eq!(copy.root().children(), [0, 0]);
        assert_eq!(copy.root(), original.root());

        copy.root_mut().hardness = 0.1;
        copy.root_mut().split_mass = 1.0;
        assert_eq!(original.root().hardness, 0.6);
        assert_eq!(original.root().split_mass, 350.0);
    }

    #[test]
    fn subtree_copies_shared_nodes_once() {
        let genome = two_level();
        let left = genome.subtree(0);
        // left -> [root, right], root -> [left, right]: three distinct nodes.
        assert_eq!(left.len(), 3);
        assert_eq!(left.root().cell_type, CellType::Phagocyte);
        let [to_root, to_right] = left.root().children();
        let root_copy = left.node(to_root).expect("root copy");
        assert_eq!(root_copy.split_mass, 100.0);
        assert_eq!(root_copy.children(), [0, to_right]);
        assert_eq!(left.node(to_right).expect("right").split_mass, 300.0);

        let right = genome.subtree(1);
        assert_eq!(right.len(), 1);
        assert_eq!(right.root().split_mass, 300.0);
    }

    #[test]
    fn reachable_skips_orphans() {
        let mut genome = two_level();
        genome.push_node(GenomeNode::default());
        assert_eq!(genome.len(), 4);
        let mut reachable = genome.reachable();
        reachable.sort_unstable();
        assert_eq!(reachable, vec![0, 1, 2]);
        assert_eq!(genome.deep_copy().len(), 3);
    }

    #[test]
    fn hand_built_genomes_are_validated() {
        let nodes = vec![GenomeNode::default(), GenomeNode::default()];
        assert_eq!(
            Genome::from_nodes(nodes.clone(), &[[0, 1], [1, 5]], 0),
            Err(GenomeError::DanglingChild {
                node: 1,
                child: 5,
                len: 2
            })
        );
        assert_eq!(
            Genome::from_nodes(Vec::new(), &[], 0),
            Err(GenomeError::Empty)
        );
        let genome = Genome::from_nodes(nodes, &[[1, 1], [0, 0]], 0).expect("genome");
        assert_eq!(genome.root().children(), [1, 1]);
    }

    #[test]
    fn deserialization_rejects_out_of_range_indices() {
        let genome = two_level();
        let json = serde_json::to_value(&genome).expect("serialize");
        let parsed: Genome = serde_json::from_value(json.clone()).expect("valid genome");
        assert_eq!(parsed, genome);

        let mut bad_root = json.clone();
        bad_root["root"] = serde_json::json!(3);
        assert!(serde_json::from_value::<Genome>(bad_root).is_err());

        let mut bad_child = json.clone();
        bad_child["nodes"][1]["children"] = serde_json::json!([0, 9]);
        let err = serde_json::from_value::<Genome>(bad_child).expect_err("dangling child");
        assert!(err.to_string().contains("child 9"));

        let mut empty = json;
        empty["nodes"] = serde_json::json!([]);
        assert!(serde_json::from_value::<Genome>(empty).is_err());
    }

    #[test]
    fn random_pigments_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..64 {
            let pigments = Pigments::random(&mut rng);
            let channels = pigments.as_array();
            assert!(channels.iter().all(|c| (0.0..=1.0).contains(c)));
            assert!(channels.iter().filter(|&&c| c == 0.0).count() >= 2);
        }
    }
}
