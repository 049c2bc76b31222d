//! Generic best-first (A*) search over an implicit graph.
//!
//! States are small immutable records; the caller supplies successor
//! generation, the heuristic and the goal test. Frontier entries with equal
//! priority pop in insertion order, so a given input always yields the same
//! path.

use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::hash::Hash;

/// One outgoing edge: the state it leads to, its label and its cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge<S, E> {
    pub to: S,
    pub label: E,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<S, E> {
    /// Edge labels from the start state to `goal`, in order.
    pub labels: Vec<E>,
    pub goal: S,
    pub cost: f64,
    pub expanded: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFailure {
    /// Every reachable state was expanded without meeting the goal.
    Exhausted { expanded: usize },
    /// The expansion budget ran out first.
    BudgetExceeded { expanded: usize },
}

struct FrontierEntry<S> {
    priority: OrderedFloat<f64>,
    sequence: u64,
    state: S,
}

impl<S> PartialEq for FrontierEntry<S> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl<S> Eq for FrontierEntry<S> {}

impl<S> PartialOrd for FrontierEntry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for FrontierEntry<S> {
    // BinaryHeap is a max-heap: lowest priority, then earliest sequence, wins.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Runs A* from `start`.
///
/// `successors` appends the outgoing edges of a state to the provided buffer.
/// `heuristic` must never overestimate the remaining cost. At most
/// `max_expansions` states are expanded.
pub fn astar<S, E, FS, FH, FG>(
    start: S,
    mut successors: FS,
    mut heuristic: FH,
    mut is_goal: FG,
    max_expansions: usize,
) -> Result<SearchOutcome<S, E>, SearchFailure>
where
    S: Copy + Eq + Hash,
    E: Copy,
    FS: FnMut(&S, &mut Vec<Edge<S, E>>),
    FH: FnMut(&S) -> f64,
    FG: FnMut(&S) -> bool,
{
    let mut frontier = BinaryHeap::new();
    let mut best_cost: HashMap<S, f64> = HashMap::new();
    let mut came_from: HashMap<S, (S, E)> = HashMap::new();
    let mut closed: HashSet<S> = HashSet::new();
    let mut edges = Vec::new();
    let mut sequence = 0u64;
    let mut expanded = 0usize;

    best_cost.insert(start, 0.0);
    frontier.push(FrontierEntry { priority: OrderedFloat(heuristic(&start)), sequence, state: start });

    while let Some(FrontierEntry { state, .. }) = frontier.pop() {
        if !closed.insert(state) {
            continue;
        }
        let cost = best_cost.get(&state).copied().unwrap_or(f64::INFINITY);
        if is_goal(&state) {
            return Ok(SearchOutcome { labels: unwind(&came_from, start, state), goal: state, cost, expanded });
        }
        if expanded >= max_expansions {
            return Err(SearchFailure::BudgetExceeded { expanded });
        }
        expanded += 1;

        edges.clear();
        successors(&state, &mut edges);
        for edge in edges.drain(..) {
            if closed.contains(&edge.to) {
                continue;
            }
            let tentative = cost + edge.cost;
            let improved = match best_cost.entry(edge.to) {
                Entry::Occupied(mut known) if tentative < *known.get() => {
                    known.insert(tentative);
                    true
                }
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(tentative);
                    true
                }
            };
            if improved {
                came_from.insert(edge.to, (state, edge.label));
                sequence += 1;
                frontier.push(FrontierEntry {
                    priority: OrderedFloat(tentative + heuristic(&edge.to)),
                    sequence,
                    state: edge.to,
                });
            }
        }
    }

    Err(SearchFailure::Exhausted { expanded })
}

fn unwind<S, E>(came_from: &HashMap<S, (S, E)>, start: S, goal: S) -> Vec<E>
where
    S: Copy + Eq + Hash,
    E: Copy,
{
    let mut labels = Vec::new();
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some((parent, label)) => {
                labels.push(*label);
                current = *parent;
            }
            None => break,
        }
    }
    labels.reverse();
    labels
}
