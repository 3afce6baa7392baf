//! Grid pathfinding
//!
//! Two searches over the same map. The single-cell search runs on a petgraph
//! `DiGraph` of walkable cells built once at load time (unit edge weights, so
//! astar with a Manhattan heuristic returns the BFS-shortest path). The
//! footprint-aware search is an informed best-first loop over anchor
//! coordinates whose frontier is kept ordered by f-cost in a `SortedVec`;
//! improving a frontier node removes and re-inserts it (decrease-key) instead
//! of stacking duplicates.
//!
//! Neither search considers other vehicles. A returned path can still be
//! blocked transiently; the movement resolver re-checks every step per tick.

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use sorted_vec::SortedVec;
use std::collections::{HashMap, HashSet};

use super::grid::Grid;
use super::types::{Direction, Footprint, Position, MAX_PATH_STEPS};

/// An ordered sequence of grid coordinates from start to goal inclusive,
/// consumed through a cursor
#[derive(Debug, Clone)]
pub struct Path {
    steps: Vec<Position>,
    cursor: usize,
}

impl Path {
    fn new(steps: Vec<Position>) -> Self {
        // Step 0 is the start cell itself; the first move is step 1
        Self { steps, cursor: 1 }
    }

    pub fn steps(&self) -> &[Position] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn start(&self) -> Option<Position> {
        self.steps.first().copied()
    }

    pub fn goal(&self) -> Option<Position> {
        self.steps.last().copied()
    }

    /// The next cell to move onto, if any remain
    pub fn next_step(&self) -> Option<Position> {
        self.steps.get(self.cursor).copied()
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// Cells not yet consumed, for path-overlay rendering
    pub fn remaining(&self) -> &[Position] {
        &self.steps[self.cursor.min(self.steps.len())..]
    }
}

/// Single-cell navigation graph over the walkable tiles of a grid
pub struct NavGraph {
    graph: DiGraph<Position, u32>,
    cell_to_node: HashMap<Position, NodeIndex>,
}

impl NavGraph {
    /// Build the 4-connected graph of walkable cells
    pub fn new(grid: &Grid) -> Self {
        let mut graph = DiGraph::new();
        let mut cell_to_node = HashMap::new();

        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let pos = Position::new(x, y);
                if grid.is_walkable(pos) {
                    let node = graph.add_node(pos);
                    cell_to_node.insert(pos, node);
                }
            }
        }

        for (&pos, &node) in &cell_to_node {
            for dir in [
                Direction::East,
                Direction::West,
                Direction::North,
                Direction::South,
            ] {
                let (dx, dy) = dir.delta();
                if let Some(&neighbor) = cell_to_node.get(&pos.offset(dx, dy)) {
                    graph.add_edge(node, neighbor, 1);
                }
            }
        }

        Self {
            graph,
            cell_to_node,
        }
    }

    /// Shortest single-cell path from `start` to `goal`.
    ///
    /// Both cells must be in bounds and walkable. Returns `None` when no
    /// route exists or the route would exceed [`MAX_PATH_STEPS`].
    pub fn find_path(&self, start: Position, goal: Position) -> Option<Path> {
        let start_node = *self.cell_to_node.get(&start)?;
        let goal_node = *self.cell_to_node.get(&goal)?;

        if start == goal {
            return Some(Path::new(vec![start]));
        }

        let (_, node_path) = astar(
            &self.graph,
            start_node,
            |node| node == goal_node,
            |edge| *edge.weight(),
            |node| self.graph[node].manhattan(&goal),
        )?;

        if node_path.len() > MAX_PATH_STEPS {
            return None;
        }

        let steps = node_path.iter().map(|&n| self.graph[n]).collect();
        Some(Path::new(steps))
    }
}

/// Frontier entry ordered by f-cost, tie-broken by coordinate so removal by
/// value is exact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct FrontierEntry {
    f_cost: u32,
    pos: Position,
}

/// Shortest path for a `width x height` occupant anchored at its top-left
/// corner.
///
/// A move is legal only when the entire footprint at the destination anchor
/// lies on walkable tiles; start and goal anchors must each fit as well.
/// Other vehicles are ignored here by design.
pub fn find_path_with_footprint(
    grid: &Grid,
    start: Position,
    goal: Position,
    footprint: Footprint,
) -> Option<Path> {
    if !grid.footprint_fits(start, footprint) || !grid.footprint_fits(goal, footprint) {
        return None;
    }
    if start == goal {
        return Some(Path::new(vec![start]));
    }

    let mut g_cost: HashMap<Position, u32> = HashMap::new();
    let mut open_f: HashMap<Position, u32> = HashMap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut closed: HashSet<Position> = HashSet::new();
    let mut frontier: SortedVec<FrontierEntry> = SortedVec::new();

    g_cost.insert(start, 0);
    open_f.insert(start, start.manhattan(&goal));
    frontier.insert(FrontierEntry {
        f_cost: start.manhattan(&goal),
        pos: start,
    });

    while !frontier.is_empty() {
        let current = frontier.remove_index(0);
        open_f.remove(&current.pos);

        if current.pos == goal {
            return reconstruct(&came_from, start, goal);
        }
        closed.insert(current.pos);

        let current_g = g_cost[&current.pos];
        for dir in [
            Direction::East,
            Direction::West,
            Direction::North,
            Direction::South,
        ] {
            let (dx, dy) = dir.delta();
            let next = current.pos.offset(dx, dy);

            if closed.contains(&next) || !grid.footprint_fits(next, footprint) {
                continue;
            }

            let tentative = current_g + 1;
            if g_cost.get(&next).is_some_and(|&known| known <= tentative) {
                continue;
            }

            g_cost.insert(next, tentative);
            came_from.insert(next, current.pos);
            let f_cost = tentative + next.manhattan(&goal);

            // Decrease-key: drop the stale frontier entry before re-inserting
            if let Some(old_f) = open_f.insert(next, f_cost) {
                frontier.remove_item(&FrontierEntry {
                    f_cost: old_f,
                    pos: next,
                });
            }
            frontier.insert(FrontierEntry { f_cost, pos: next });
        }
    }

    None
}

fn reconstruct(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Option<Path> {
    let mut steps = vec![goal];
    let mut current = goal;
    while current != start {
        current = *came_from.get(&current)?;
        if steps.len() >= MAX_PATH_STEPS {
            return None;
        }
        steps.push(current);
    }
    steps.reverse();
    Some(Path::new(steps))
}
