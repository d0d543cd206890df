//! Shortest-path overlay: an ephemeral weighted graph over the finished grid
//! and a uniform-cost search between two cells.
//!
//! Wall cells model cliff traversal: they carry at most a single upward edge
//! to the cell north of them, and can only be entered through a breach at
//! least three wall cells wide. The graph is built per query and discarded.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::world::{feature, Dir, World};

pub const BASE_COST: f64 = 1.0;
pub const TERRACE_PENALTY: f64 = 2.0;
pub const WALL_PENALTY: f64 = 4.0;

struct Node {
    neighbours: [u32; 4],
    num: u8,
}

impl Node {
    fn neighbours(&self) -> &[u32] {
        &self.neighbours[..self.num as usize]
    }
}

pub struct PathGraph<'a> {
    world: &'a World,
    nodes: Vec<Node>,
}

impl<'a> PathGraph<'a> {
    pub fn new(world: &'a World) -> Self {
        let nodes = (0..world.cell_count())
            .map(|idx| build_node(world, idx))
            .collect();
        Self { world, nodes }
    }

    /// Edge cost between two adjacent cells: base step cost, the height
    /// delta, and penalties for crossing terraces or climbing a wall.
    fn cost(&self, from: usize, to: usize) -> f64 {
        let a = &self.world.cells()[from];
        let b = &self.world.cells()[to];
        let mut cost = BASE_COST + (a.height - b.height).abs();
        if a.terrace != b.terrace {
            cost += TERRACE_PENALTY;
        }
        if b.is_wall {
            cost += WALL_PENALTY;
        }
        cost
    }
}

fn traversable(world: &World, idx: usize) -> bool {
    let cell = &world.cells()[idx];
    !cell.is_river
        && !cell.is_river_bank()
        && !cell.has_feature(feature::TREE)
        && !cell.has_feature(feature::ROCK)
}

fn build_node(world: &World, idx: usize) -> Node {
    let mut node = Node {
        neighbours: [0; 4],
        num: 0,
    };
    let cell = &world.cells()[idx];

    if cell.is_wall {
        // A wall is traversed vertically: its only exit is the cell above.
        if let Some(north) = world.neighbour(idx, Dir::North) {
            if traversable(world, north) {
                node.neighbours[0] = north as u32;
                node.num = 1;
            }
        }
        return node;
    }

    for dir in Dir::ALL {
        let Some(nidx) = world.neighbour(idx, dir) else {
            continue;
        };
        if !traversable(world, nidx) {
            continue;
        }
        let neighbour = &world.cells()[nidx];
        // Terraces may only be crossed heading north.
        if neighbour.terrace != cell.terrace && dir != Dir::North {
            continue;
        }
        // Walls are only enterable through a breach at least 3 cells wide.
        if neighbour.is_wall && !wall_breach(world, nidx) {
            continue;
        }
        node.neighbours[node.num as usize] = nidx as u32;
        node.num += 1;
    }
    node
}

fn wall_breach(world: &World, idx: usize) -> bool {
    let west = world.neighbour(idx, Dir::West);
    let east = world.neighbour(idx, Dir::East);
    match (west, east) {
        (Some(w), Some(e)) => world.cells()[w].is_wall && world.cells()[e].is_wall,
        _ => false,
    }
}

// ── Uniform-cost search ───────────────────────────────────────────────────────

struct Candidate {
    cost: f64,
    node: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, the frontier needs min-cost.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

pub struct PathResult {
    /// Cells on the path, start to goal inclusive.
    pub cells: Vec<(usize, usize)>,
    pub cost: f64,
}

/// Find the cheapest path between two cells and mark it on the grid.
///
/// Returns `None` when the frontier exhausts without reaching the goal (or
/// either endpoint is out of bounds); nothing is marked in that case.
pub fn generate_path(
    world: &mut World,
    start: (usize, usize),
    goal: (usize, usize),
) -> Option<PathResult> {
    let (width, height) = (world.width(), world.height());
    if start.0 >= width || start.1 >= height || goal.0 >= width || goal.1 >= height {
        return None;
    }
    let start_idx = world.idx(start.0, start.1);
    let goal_idx = world.idx(goal.0, goal.1);

    let (cells, cost) = {
        let graph = PathGraph::new(world);
        search(&graph, start_idx, goal_idx)?
    };

    for &(x, y) in &cells {
        world.cell_mut(x, y).add_feature(feature::PATH);
    }
    Some(PathResult { cells, cost })
}

fn search(graph: &PathGraph<'_>, start: usize, goal: usize) -> Option<(Vec<(usize, usize)>, f64)> {
    let n = graph.nodes.len();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev = vec![u32::MAX; n];
    let mut frontier = BinaryHeap::new();

    dist[start] = 0.0;
    frontier.push(Candidate {
        cost: 0.0,
        node: start as u32,
    });

    while let Some(Candidate { cost, node }) = frontier.pop() {
        let node = node as usize;
        if node == goal {
            return Some((reconstruct(graph, &prev, start, goal), cost));
        }
        if cost > dist[node] {
            continue; // stale entry
        }
        for &next in graph.nodes[node].neighbours() {
            let next = next as usize;
            let next_cost = cost + graph.cost(node, next);
            if next_cost < dist[next] {
                dist[next] = next_cost;
                prev[next] = node as u32;
                frontier.push(Candidate {
                    cost: next_cost,
                    node: next as u32,
                });
            }
        }
    }
    None
}

fn reconstruct(
    graph: &PathGraph<'_>,
    prev: &[u32],
    start: usize,
    goal: usize,
) -> Vec<(usize, usize)> {
    let width = graph.world.width();
    let mut cells = Vec::new();
    let mut at = goal;
    loop {
        cells.push((at % width, at / width));
        if at == start {
            break;
        }
        at = prev[at] as usize;
    }
    cells.reverse();
    cells
}
