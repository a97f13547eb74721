//! Shortest-path search (C7): A* over the route graph with an admissible
//! heuristic. Hand-rolled rather than pulled from a general graph library,
//! so deadline checks and deterministic tie-breaking stay explicit.

use crate::error::PlanError;
use crate::geo::distance_nm;
use crate::graph::RouteGraph;
use crate::model::Deadline;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Reference speed (knots) for the admissible heuristic. Must be ≥ the
/// realistic maximum boat speed across the polar and wind range so that
/// `h` never overestimates remaining time.
pub const DEFAULT_V_REF_KTS: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoredVertex {
    f_score: f64,
    vertex: usize,
}

impl Eq for ScoredVertex {}

impl Ord for ScoredVertex {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap; ties broken by vertex index for
        // deterministic, reproducible output.
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for ScoredVertex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of a search: either a connected vertex path, or `None` if the
/// open set was exhausted without reaching the goal.
pub fn search(
    graph: &RouteGraph,
    start: usize,
    goal: usize,
    v_ref_kts: f64,
    deadline: &Deadline,
) -> Result<Option<Vec<usize>>, PlanError> {
    if start == goal {
        return Ok(Some(vec![start]));
    }

    let n = graph.len();
    let mut g_score = vec![f64::INFINITY; n];
    let mut came_from = vec![usize::MAX; n];
    let mut open = BinaryHeap::new();

    g_score[start] = 0.0;
    let h_start = heuristic(graph, start, goal, v_ref_kts);
    open.push(ScoredVertex {
        f_score: h_start,
        vertex: start,
    });

    let mut visited = vec![false; n];

    while let Some(ScoredVertex { vertex: current, .. }) = open.pop() {
        if deadline.expired() {
            return Err(PlanError::Timeout);
        }
        if current == goal {
            return Ok(Some(reconstruct_path(&came_from, start, goal)));
        }
        if visited[current] {
            continue;
        }
        visited[current] = true;

        for edge in &graph.adjacency[current] {
            if visited[edge.to] {
                continue;
            }
            let tentative_g = g_score[current] + edge.time_hours;
            if tentative_g < g_score[edge.to] {
                g_score[edge.to] = tentative_g;
                came_from[edge.to] = current;
                let f = tentative_g + heuristic(graph, edge.to, goal, v_ref_kts);
                open.push(ScoredVertex {
                    f_score: f,
                    vertex: edge.to,
                });
            }
        }
    }

    Ok(None)
}

fn heuristic(graph: &RouteGraph, n: usize, goal: usize, v_ref_kts: f64) -> f64 {
    distance_nm(graph.vertices[n], graph.vertices[goal]) / v_ref_kts
}

fn reconstruct_path(came_from: &[usize], start: usize, goal: usize) -> Vec<usize> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        current = came_from[current];
        path.push(current);
    }
    path.reverse();
    path
}

/// Nearest graph vertex (great-circle) to `point`.
pub fn nearest_vertex(graph: &RouteGraph, point: crate::geo::GeoPoint) -> usize {
    graph
        .vertices
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            distance_nm(**a, point)
                .partial_cmp(&distance_nm(**b, point))
                .unwrap()
        })
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
