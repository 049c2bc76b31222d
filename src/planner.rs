use bevy::log::trace;
use bevy::math::IVec2;
use std::collections::{HashSet, VecDeque};

use crate::config::PlannerConfig;
use crate::grid::Bounds;
use crate::heading::{octile_distance, Heading};
use crate::perception::Action;
use crate::search::{astar, Edge, SearchFailure};
use crate::terrain::Terrain;
use crate::world_model::WorldModel;

/// Above this many goal cells the heuristic measures the distance to the
/// candidates' bounding rectangle instead of scanning every candidate per
/// pushed state.
const HEURISTIC_CANDIDATE_LIMIT: usize = 256;

/// A search node: where the ant would stand and which way it would face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanState {
    pub position: IVec2,
    pub heading: Heading,
}

impl PlanState {
    pub fn of(world: &WorldModel) -> Self {
        Self { position: world.position(), heading: world.heading() }
    }

    pub fn after(self, action: Action) -> Self {
        match action {
            Action::MoveForward => Self { position: self.position + self.heading.delta(), ..self },
            Action::TurnLeft => Self { heading: self.heading.rotate_left(), ..self },
            Action::TurnRight => Self { heading: self.heading.rotate_right(), ..self },
            _ => self,
        }
    }
}

/// What a plan is trying to reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Goal {
    NearestTerrain(Terrain),
    NearestUnknown,
    /// The Unknown cell farthest from the ant, to push the map outward.
    FarthestUnknown,
    Cell(IVec2),
}

impl Goal {
    /// Whether `cell` currently satisfies the goal.
    pub fn accepts(&self, world: &WorldModel, cell: IVec2) -> bool {
        match *self {
            Goal::NearestTerrain(terrain) => world.in_bounds(cell) && world.terrain_at(cell) == terrain,
            Goal::NearestUnknown | Goal::FarthestUnknown => {
                world.in_bounds(cell) && world.terrain_at(cell) == Terrain::Unknown
            }
            Goal::Cell(target) => cell == target,
        }
    }

    /// Every cell the search may stop at, in row-major order.
    pub fn candidates(&self, world: &WorldModel, from: IVec2) -> Vec<IVec2> {
        match *self {
            Goal::NearestTerrain(terrain) => {
                world.cells().filter(|(_, t)| *t == terrain).map(|(cell, _)| cell).collect()
            }
            Goal::NearestUnknown => {
                world.cells().filter(|(_, t)| *t == Terrain::Unknown).map(|(cell, _)| cell).collect()
            }
            Goal::FarthestUnknown => {
                let mut best: Option<(IVec2, f64)> = None;
                for (cell, terrain) in world.cells() {
                    if terrain != Terrain::Unknown {
                        continue;
                    }
                    let distance = octile_distance(from, cell);
                    if best.map_or(true, |(_, d)| distance > d) {
                        best = Some((cell, distance));
                    }
                }
                best.map(|(cell, _)| vec![cell]).unwrap_or_default()
            }
            Goal::Cell(target) => vec![target],
        }
    }
}

/// An action sequence toward a goal, consumed one step per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    goal: Goal,
    target: IVec2,
    steps: VecDeque<Action>,
    cursor: PlanState,
    cost: f64,
}

impl Plan {
    pub fn goal(&self) -> Goal {
        self.goal
    }

    pub fn target(&self) -> IVec2 {
        self.target
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = Action> + '_ {
        self.steps.iter().copied()
    }

    pub fn peek(&self) -> Option<Action> {
        self.steps.front().copied()
    }

    /// Pops the next step and advances the state the plan expects next.
    pub fn advance(&mut self) -> Option<Action> {
        let action = self.steps.pop_front()?;
        self.cursor = self.cursor.after(action);
        Some(action)
    }

    /// A plan stays usable while the ant is where the plan expects, the
    /// target still satisfies the goal and the next step is not blocked.
    pub fn is_valid(&self, world: &WorldModel) -> bool {
        let Some(next) = self.peek() else {
            return false;
        };
        if self.cursor != PlanState::of(world) || !self.goal.accepts(world, self.target) {
            return false;
        }
        match next {
            Action::MoveForward => world.can_execute(Action::MoveForward),
            _ => true,
        }
    }
}

/// Heading-aware A* over an ant's world model.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    config: PlannerConfig,
}

impl PathPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Lower bound on the cost of moving between two cells, ignoring turns.
    /// Never decreases as either axis distance grows.
    pub fn distance_estimate(&self, a: IVec2, b: IVec2) -> f64 {
        let d = (a - b).abs();
        let (low, high) = if d.x < d.y { (d.x, d.y) } else { (d.y, d.x) };
        let cardinal = self.config.cardinal_cost;
        let diagonal = self.config.diagonal_cost.min(2.0 * cardinal);
        if diagonal < cardinal {
            // Diagonal zig-zags can stand in for cardinal runs.
            high as f64 * diagonal
        } else {
            (high - low) as f64 * cardinal + low as f64 * diagonal
        }
    }

    fn move_cost(&self, heading: Heading) -> f64 {
        if heading.is_diagonal() {
            self.config.diagonal_cost
        } else {
            self.config.cardinal_cost
        }
    }

    /// Plans from `start` to the closest cell satisfying `goal`. `None` means
    /// no reachable cell qualifies (or the expansion budget ran out).
    pub fn plan(&self, world: &WorldModel, start: PlanState, goal: Goal) -> Option<Plan> {
        let candidates = goal.candidates(world, start.position);
        if candidates.is_empty() {
            trace!(?goal, "no candidate cells");
            return None;
        }
        let goals: HashSet<IVec2> = candidates.iter().copied().collect();
        let spread = candidates[1..].iter().fold(Bounds::point(candidates[0]), |area, cell| area.including(*cell));
        let scan_candidates = candidates.len() <= HEURISTIC_CANDIDATE_LIMIT;

        let successors = |state: &PlanState, out: &mut Vec<Edge<PlanState, Action>>| {
            out.push(Edge { to: state.after(Action::TurnLeft), label: Action::TurnLeft, cost: self.config.turn_cost });
            out.push(Edge { to: state.after(Action::TurnRight), label: Action::TurnRight, cost: self.config.turn_cost });
            let next = state.after(Action::MoveForward);
            if self.can_enter(world, next.position, &goals) {
                out.push(Edge { to: next, label: Action::MoveForward, cost: self.move_cost(state.heading) });
            }
        };
        let heuristic = |state: &PlanState| {
            if !scan_candidates {
                let nearest = state.position.clamp(spread.min, spread.max);
                return self.distance_estimate(state.position, nearest);
            }
            candidates
                .iter()
                .map(|cell| self.distance_estimate(state.position, *cell))
                .fold(f64::INFINITY, f64::min)
        };
        let is_goal = |state: &PlanState| goals.contains(&state.position);

        match astar(start, successors, heuristic, is_goal, self.config.max_expansions) {
            Ok(outcome) => {
                trace!(?goal, steps = outcome.labels.len(), expanded = outcome.expanded, "plan found");
                Some(Plan {
                    goal,
                    target: outcome.goal.position,
                    steps: outcome.labels.into(),
                    cursor: start,
                    cost: outcome.cost,
                })
            }
            Err(SearchFailure::Exhausted { expanded }) => {
                trace!(?goal, expanded, "frontier exhausted");
                None
            }
            Err(SearchFailure::BudgetExceeded { expanded }) => {
                trace!(?goal, expanded, "expansion budget exceeded");
                None
            }
        }
    }

    fn can_enter(&self, world: &WorldModel, cell: IVec2, goals: &HashSet<IVec2>) -> bool {
        if !world.in_bounds(cell) {
            return false;
        }
        match world.terrain_at(cell) {
            Terrain::Wall => false,
            Terrain::Unknown => self.config.unknown_passable || goals.contains(&cell),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::{AntId, Perception};

    /// Builds a model whose known rectangle is `rows`, with the ant standing
    /// on the cell marked `A` (recorded as Empty). Legend: `.` empty, `#`
    /// wall, `F` food, `C` colony, `?` unknown.
    fn model_from(rows: &[&str], heading: Heading) -> WorldModel {
        let mut ant = IVec2::ZERO;
        for (y, row) in rows.iter().enumerate() {
            if let Some(x) = row.find('A') {
                ant = IVec2::new(x as i32, y as i32);
            }
        }
        let mut perception = Perception::new(AntId(0), heading);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let terrain = match ch {
                    '#' => Terrain::Wall,
                    'F' => Terrain::Food,
                    'C' => Terrain::Colony,
                    '?' => Terrain::Unknown,
                    _ => Terrain::Empty,
                };
                perception.visible_cells.insert(IVec2::new(x as i32, y as i32) - ant, terrain);
            }
        }
        let mut model = WorldModel::new(heading);
        model.integrate(&perception);
        model
    }

    fn moves(plan: &Plan) -> usize {
        plan.steps().filter(|a| *a == Action::MoveForward).count()
    }

    #[test]
    fn plans_diagonal_to_corner_colony() {
        let model = model_from(&["C....", ".....", "..A..", ".....", "....."], Heading::North);
        assert_eq!(model.ant_index(), IVec2::new(2, 2));

        let planner = PathPlanner::new(PlannerConfig::default());
        let plan = planner.plan(&model, PlanState::of(&model), Goal::NearestTerrain(Terrain::Colony)).unwrap();

        let expected_len = (2.0 * std::f64::consts::SQRT_2).ceil() as usize;
        assert_eq!(plan.len(), expected_len);
        assert_eq!(plan.peek(), Some(Action::TurnLeft));
        assert_eq!(plan.steps().collect::<Vec<_>>(), vec![Action::TurnLeft, Action::MoveForward, Action::MoveForward]);
        assert_eq!(plan.target(), model.position() + IVec2::new(-2, -2));
    }

    #[test]
    fn aligned_paths_use_the_minimum_number_of_moves() {
        let model = model_from(&["A.......", "........", "........", "........"], Heading::East);
        let planner = PathPlanner::new(PlannerConfig::default());
        let start = PlanState::of(&model);

        let east = planner.plan(&model, start, Goal::Cell(start.position + IVec2::new(7, 0))).unwrap();
        assert_eq!(moves(&east), 7);
        assert_eq!(east.len(), 7);

        let mut facing_se = start;
        facing_se.heading = Heading::SouthEast;
        let diagonal = planner.plan(&model, facing_se, Goal::Cell(start.position + IVec2::new(3, 3))).unwrap();
        assert_eq!(moves(&diagonal), 3);
        assert_eq!(diagonal.len(), 3);

        let mixed = planner.plan(&model, facing_se, Goal::Cell(start.position + IVec2::new(6, 2))).unwrap();
        // Minimum octile route: two diagonal and four cardinal moves.
        assert_eq!(moves(&mixed), 6);
    }

    #[test]
    fn enclosed_goal_terminates_without_a_plan() {
        let model = model_from(&["A....", ".###.", ".#F#.", ".###.", "....."], Heading::South);
        let planner = PathPlanner::new(PlannerConfig::default());
        assert!(planner.plan(&model, PlanState::of(&model), Goal::NearestTerrain(Terrain::Food)).is_none());
    }

    #[test]
    fn walls_force_a_detour() {
        let model = model_from(&["A#.", ".#.", "..."], Heading::East);
        let planner = PathPlanner::new(PlannerConfig::default());
        let target = model.position() + IVec2::new(2, 0);
        let plan = planner.plan(&model, PlanState::of(&model), Goal::Cell(target)).unwrap();

        let mut state = PlanState::of(&model);
        for action in plan.steps() {
            state = state.after(action);
            assert_ne!(model.terrain_at(state.position), Terrain::Wall);
        }
        assert_eq!(state.position, target);
    }

    #[test]
    fn unknown_cells_can_be_excluded() {
        let model = model_from(&["A?F"], Heading::East);
        let open = PathPlanner::new(PlannerConfig::default());
        assert_eq!(open.plan(&model, PlanState::of(&model), Goal::NearestTerrain(Terrain::Food)).map(|p| p.len()), Some(2));

        let strict = PathPlanner::new(PlannerConfig { unknown_passable: false, ..PlannerConfig::default() });
        assert!(strict.plan(&model, PlanState::of(&model), Goal::NearestTerrain(Terrain::Food)).is_none());
        // An Unknown cell is still enterable when it is the goal itself.
        assert!(strict.plan(&model, PlanState::of(&model), Goal::NearestUnknown).is_some());
    }

    #[test]
    fn farthest_unknown_picks_the_most_distant_cell() {
        let model = model_from(&["?...", "....", "..A.", "...?"], Heading::North);
        let candidates = Goal::FarthestUnknown.candidates(&model, model.position());
        assert_eq!(candidates, vec![model.position() + IVec2::new(-2, -2)]);
    }

    #[test]
    fn plans_are_reproducible() {
        let model = model_from(&["?..?", ".A..", "....", "?..?"], Heading::North);
        let planner = PathPlanner::new(PlannerConfig::default());
        let first = planner.plan(&model, PlanState::of(&model), Goal::NearestUnknown);
        assert!(first.is_some());
        for _ in 0..5 {
            assert_eq!(planner.plan(&model, PlanState::of(&model), Goal::NearestUnknown), first);
        }
    }

    #[test]
    fn budget_exhaustion_returns_none() {
        let model = model_from(&["A.........", "..........", "..........", ".........F"], Heading::West);
        let planner = PathPlanner::new(PlannerConfig { max_expansions: 3, ..PlannerConfig::default() });
        assert!(planner.plan(&model, PlanState::of(&model), Goal::NearestTerrain(Terrain::Food)).is_none());
    }

    #[test]
    fn large_goal_sets_still_guide_the_search() {
        // 400 food cells, far more than get scanned per state.
        let rows: Vec<String> = (0..20)
            .map(|y| {
                let lead = if y == 10 { "A" } else { "." };
                format!("{lead}{}{}", ".".repeat(39), "F".repeat(20))
            })
            .collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let model = model_from(&rows, Heading::East);
        let planner = PathPlanner::new(PlannerConfig { max_expansions: 500, ..PlannerConfig::default() });

        let plan = planner.plan(&model, PlanState::of(&model), Goal::NearestTerrain(Terrain::Food)).unwrap();
        assert_eq!(plan.len(), 40);
        assert_eq!(moves(&plan), 40);
        assert_eq!(plan.target(), model.position() + IVec2::new(40, 0));
    }

    #[test]
    fn estimate_stays_below_cheap_diagonal_routes() {
        let planner = PathPlanner::new(PlannerConfig { diagonal_cost: 0.5, ..PlannerConfig::default() });
        // Two diagonal moves cover (2, 0) for 1.0.
        assert!(planner.distance_estimate(IVec2::ZERO, IVec2::new(2, 0)) <= 1.0);
        assert_eq!(planner.distance_estimate(IVec2::ZERO, IVec2::new(3, 1)), 1.5);
    }

    #[test]
    fn plan_invalidates_when_the_ant_diverges() {
        let mut model = model_from(&["A..", "...", "..F"], Heading::SouthEast);
        let planner = PathPlanner::new(PlannerConfig::default());
        let mut plan = planner.plan(&model, PlanState::of(&model), Goal::NearestTerrain(Terrain::Food)).unwrap();
        assert!(plan.is_valid(&model));

        let step = plan.advance().unwrap();
        model.apply(step);
        assert!(plan.is_valid(&model));

        // The ant turned on its own; the plan no longer matches.
        model.apply(Action::TurnLeft);
        assert!(!plan.is_valid(&model));
    }
}
