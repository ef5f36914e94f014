//! A* pathfinding over the terrain cost field
//!
//! 8-directional movement with a Chebyshev heuristic, which is
//! admissible since every cell costs at least 1.0 and diagonal steps
//! count the same as straight ones.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::{AHashMap, AHashSet};

use crate::battle::terrain::TerrainField;
use crate::core::types::Cell;

/// Node in the A* open set
#[derive(Debug, Clone)]
struct PathNode {
    cell: Cell,
    f_cost: f32, // g_cost + heuristic
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .partial_cmp(&self.f_cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Outcome of a path query
///
/// `steps` excludes the start cell; empty means either "already there"
/// (`arrived`) or "unreachable" (`!arrived`).
#[derive(Debug, Clone, Default)]
pub struct PathResult {
    pub steps: Vec<Cell>,
    pub arrived: bool,
}

impl PathResult {
    fn unreachable() -> Self {
        Self::default()
    }
}

/// Find a path from `start` to `goal`.
///
/// `blocked` holds cells transiently non-traversable for this query
/// (typically cells under living units other than the caller). The
/// goal cell itself is exempt from blocking so a unit can always plan
/// an engagement route toward an occupied cell's neighborhood. The set
/// is borrowed, never mutated - nothing to clean up on any exit path.
pub fn find_path(
    terrain: &TerrainField,
    start: Cell,
    goal: Cell,
    blocked: &AHashSet<Cell>,
) -> PathResult {
    if start == goal {
        return PathResult {
            steps: Vec::new(),
            arrived: true,
        };
    }
    if !terrain.is_passable(goal) {
        return PathResult::unreachable();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<Cell, Cell> = AHashMap::new();
    let mut g_scores: AHashMap<Cell, f32> = AHashMap::new();

    g_scores.insert(start, 0.0);
    open_set.push(PathNode {
        cell: start,
        f_cost: start.chebyshev_distance(&goal) as f32,
    });

    while let Some(current) = open_set.pop() {
        if current.cell == goal {
            return PathResult {
                steps: reconstruct_path(&came_from, current.cell, start),
                arrived: false,
            };
        }

        let current_g = *g_scores.get(&current.cell).unwrap_or(&f32::INFINITY);

        for neighbor in current.cell.neighbors8() {
            if !terrain.is_passable(neighbor) {
                continue;
            }
            if neighbor != goal && blocked.contains(&neighbor) {
                continue;
            }

            let tentative_g = current_g + terrain.cost_at(neighbor);
            let neighbor_g = *g_scores.get(&neighbor).unwrap_or(&f32::INFINITY);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.cell);
                g_scores.insert(neighbor, tentative_g);

                let f_cost = tentative_g + neighbor.chebyshev_distance(&goal) as f32;
                open_set.push(PathNode {
                    cell: neighbor,
                    f_cost,
                });
            }
        }
    }

    PathResult::unreachable()
}

/// Walk the came_from chain back to (but excluding) the start cell
fn reconstruct_path(came_from: &AHashMap<Cell, Cell>, mut current: Cell, start: Cell) -> Vec<Cell> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::terrain::IMPASSABLE_COST;

    fn no_blocks() -> AHashSet<Cell> {
        AHashSet::new()
    }

    #[test]
    fn test_straight_line() {
        let terrain = TerrainField::open(10, 10).unwrap();
        let result = find_path(&terrain, Cell::new(0, 0), Cell::new(5, 0), &no_blocks());
        assert!(!result.arrived);
        assert_eq!(result.steps.len(), 5);
        assert_eq!(result.steps.last(), Some(&Cell::new(5, 0)));
        // Start excluded
        assert!(!result.steps.contains(&Cell::new(0, 0)));
    }

    #[test]
    fn test_diagonal_counts_as_one_step() {
        let terrain = TerrainField::open(10, 10).unwrap();
        let result = find_path(&terrain, Cell::new(0, 0), Cell::new(4, 4), &no_blocks());
        assert_eq!(result.steps.len(), 4);
    }

    #[test]
    fn test_already_at_goal() {
        let terrain = TerrainField::open(10, 10).unwrap();
        let result = find_path(&terrain, Cell::new(3, 3), Cell::new(3, 3), &no_blocks());
        assert!(result.arrived);
        assert!(result.steps.is_empty());
    }

    #[test]
    fn test_impassable_goal_empty_path() {
        let mut costs = vec![1.0; 100];
        costs[5] = IMPASSABLE_COST; // (5, 0)
        let terrain = TerrainField::from_costs(10, 10, &costs).unwrap();
        let result = find_path(&terrain, Cell::new(0, 0), Cell::new(5, 0), &no_blocks());
        assert!(!result.arrived);
        assert!(result.steps.is_empty());
    }

    #[test]
    fn test_out_of_bounds_goal_empty_path() {
        let terrain = TerrainField::open(10, 10).unwrap();
        let result = find_path(&terrain, Cell::new(0, 0), Cell::new(50, 50), &no_blocks());
        assert!(!result.arrived);
        assert!(result.steps.is_empty());
    }

    #[test]
    fn test_routes_around_terrain_wall() {
        // Vertical impassable wall at x = 2 with a gap at y = 9
        let mut costs = vec![1.0; 100];
        for y in 0..9 {
            costs[y * 10 + 2] = IMPASSABLE_COST;
        }
        let terrain = TerrainField::from_costs(10, 10, &costs).unwrap();
        let result = find_path(&terrain, Cell::new(0, 0), Cell::new(5, 0), &no_blocks());
        assert!(!result.steps.is_empty());
        for step in &result.steps {
            assert!(terrain.is_passable(*step));
        }
    }

    #[test]
    fn test_dynamic_obstacles_block() {
        let terrain = TerrainField::open(3, 1).unwrap();
        // Single corridor fully plugged by an occupant
        let blocked: AHashSet<Cell> = [Cell::new(1, 0)].into_iter().collect();
        let result = find_path(&terrain, Cell::new(0, 0), Cell::new(2, 0), &blocked);
        assert!(result.steps.is_empty());
    }

    #[test]
    fn test_dynamic_obstacles_routed_around() {
        let terrain = TerrainField::open(10, 10).unwrap();
        let blocked: AHashSet<Cell> = [Cell::new(2, 0)].into_iter().collect();
        let result = find_path(&terrain, Cell::new(0, 0), Cell::new(5, 0), &blocked);
        assert!(!result.steps.is_empty());
        assert!(!result.steps.contains(&Cell::new(2, 0)));
    }

    #[test]
    fn test_goal_exempt_from_blocking() {
        let terrain = TerrainField::open(10, 10).unwrap();
        // Enemy stands on the goal; we must still be able to plan to it
        let blocked: AHashSet<Cell> = [Cell::new(5, 0)].into_iter().collect();
        let result = find_path(&terrain, Cell::new(0, 0), Cell::new(5, 0), &blocked);
        assert_eq!(result.steps.last(), Some(&Cell::new(5, 0)));
    }

    #[test]
    fn test_prefers_cheap_terrain() {
        // Row y=0 is mud (cost 4), row y=1 is plain; the detour wins
        let mut costs = vec![1.0; 30];
        for x in 1..9 {
            costs[x] = 4.0;
        }
        let terrain = TerrainField::from_costs(10, 3, &costs).unwrap();
        let result = find_path(&terrain, Cell::new(0, 0), Cell::new(9, 0), &no_blocks());
        assert!(!result.steps.is_empty());
        assert!(result.steps.iter().any(|c| c.y == 1));
    }
}
