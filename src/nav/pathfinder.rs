// A* search over the navigation graph, Euclidean edge cost and heuristic

use super::graph::NavGraph;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Open-set entry. Ordered so the max-heap pops the lowest estimated total
/// cost first, and among equal costs the entry discovered first.
#[derive(Debug, Clone, Copy)]
struct State {
    cost: f32,
    seq: u64,
    node: usize,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

fn reconstruct_path(came_from: &HashMap<usize, usize>, mut current: usize) -> Vec<usize> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        current = prev;
        path.push(current);
    }
    path.reverse();
    path
}

/// Shortest path from `start` to `goal` as vertex indices, both ends included.
/// Returns `None` if either index is out of range or the goal is unreachable.
pub fn find_path(graph: &NavGraph, start: usize, goal: usize) -> Option<Vec<usize>> {
    let goal_pos = graph.vertex(goal)?.position;
    graph.vertex(start)?;

    let heuristic = |idx: usize| {
        graph
            .vertex(idx)
            .map_or(f32::INFINITY, |v| v.position.distance(goal_pos))
    };

    let mut seq = 0_u64;
    let mut open_set = BinaryHeap::new();
    open_set.push(State {
        cost: heuristic(start),
        seq,
        node: start,
    });

    let mut came_from: HashMap<usize, usize> = HashMap::new();
    let mut g_score: HashMap<usize, f32> = HashMap::new();
    g_score.insert(start, 0.0);

    while let Some(State { node: current, .. }) = open_set.pop() {
        if current == goal {
            let path = reconstruct_path(&came_from, current);
            crate::debug_nav!(
                "Path {} -> {}: {} waypoints, cost {:.2}",
                start,
                goal,
                path.len(),
                g_score.get(&goal).copied().unwrap_or_default()
            );
            return Some(path);
        }

        let Some(vertex) = graph.vertex(current) else {
            continue;
        };
        let current_g = g_score.get(&current).copied().unwrap_or(f32::INFINITY);

        for &neighbour in &vertex.neighbours {
            let Some(next) = graph.vertex(neighbour) else {
                continue;
            };
            let tentative = current_g + vertex.position.distance(next.position);
            if tentative < g_score.get(&neighbour).copied().unwrap_or(f32::INFINITY) {
                came_from.insert(neighbour, current);
                g_score.insert(neighbour, tentative);
                seq += 1;
                open_set.push(State {
                    cost: tentative + heuristic(neighbour),
                    seq,
                    node: neighbour,
                });
            }
        }
    }

    crate::debug_nav!("No path from {} to {}", start, goal);
    None
}
