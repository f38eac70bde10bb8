use std::collections::{HashMap, HashSet};
use std::fs;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use crate::common::Cost;

/// A cell of the city, as `(row, column)`.
pub type Position = (usize, usize);

/// Time step -> position occupied by a dynamic obstacle at that step.
pub type Schedule = HashMap<usize, Position>;

/// The four axis-aligned unit moves. The declaration order is the order in
/// which `GridCity::get_actions` yields them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Right,
    Left,
    Down,
    Up,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Right, Action::Left, Action::Down, Action::Up];

    /// `(row, column)` offset of the move.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Right => (0, 1),
            Action::Left => (0, -1),
            Action::Down => (1, 0),
            Action::Up => (-1, 0),
        }
    }
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("map has no cells")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("map has no start cell 'S'")]
    MissingStart,

    #[error("map has no goal cell 'G'")]
    MissingGoal,

    #[error("second '{marker}' cell at {position:?}, first one at {first:?}")]
    DuplicateMarker {
        marker: char,
        first: Position,
        position: Position,
    },

    #[error("cell {position:?} has terrain cost 0, costs must be positive")]
    ZeroCost { position: Position },

    #[error("row {row}: malformed schedule entry {entry:?}, expected `t,r,c`")]
    MalformedSchedule { row: usize, entry: String },

    #[error("row {row}: a schedule needs exactly one 'D' cell in its row, found {found}")]
    ScheduleOwner { row: usize, found: usize },

    #[error("dynamic obstacle {origin:?} lists time step {time_step} twice")]
    DuplicateTimeStep { origin: Position, time_step: usize },

    #[error("position {position:?} is outside the {height}x{width} grid")]
    OutOfBounds {
        position: Position,
        height: usize,
        width: usize,
    },

    #[error("cannot place an obstacle on the {marker} cell {position:?}")]
    ReservedCell {
        marker: &'static str,
        position: Position,
    },
}

/// The delivery city: terrain, static obstacles, and the time-indexed
/// schedules of dynamic obstacles.
///
/// Start and goal are never static obstacles and every stored position lies
/// inside the grid. The only mutation after loading is
/// [`GridCity::add_static_obstacle`].
#[derive(Debug, Clone)]
pub struct GridCity {
    height: usize,
    width: usize,
    static_obstacles: HashSet<Position>,
    terrain_costs: HashMap<Position, usize>,
    dynamic_obstacles: HashMap<Position, Schedule>,
    start: Position,
    goal: Position,
}

impl GridCity {
    /// An obstacle-free city with uniform cost 1.
    pub fn new(
        height: usize,
        width: usize,
        start: Position,
        goal: Position,
    ) -> Result<Self, MapError> {
        if height == 0 || width == 0 {
            return Err(MapError::Empty);
        }

        let city = GridCity {
            height,
            width,
            static_obstacles: HashSet::new(),
            terrain_costs: HashMap::new(),
            dynamic_obstacles: HashMap::new(),
            start,
            goal,
        };
        city.check_bounds(start)?;
        city.check_bounds(goal)?;
        Ok(city)
    }

    pub fn from_file(path: &str) -> Result<Self, MapError> {
        let text = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_string(),
            source,
        })?;
        text.parse()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        position.0 < self.height && position.1 < self.width
    }

    pub fn is_static_obstacle(&self, position: Position) -> bool {
        self.static_obstacles.contains(&position)
    }

    pub fn is_passable(&self, position: Position) -> bool {
        self.in_bounds(position) && !self.is_static_obstacle(position)
    }

    /// Base traversal cost of a cell, ignoring dynamic obstacles.
    pub fn terrain_cost(&self, position: Position) -> usize {
        self.terrain_costs.get(&position).copied().unwrap_or(1)
    }

    pub fn is_occupied_at(&self, position: Position, time_step: usize) -> bool {
        self.dynamic_obstacles
            .values()
            .any(|schedule| schedule.get(&time_step) == Some(&position))
    }

    pub fn dynamic_obstacles(&self) -> &HashMap<Position, Schedule> {
        &self.dynamic_obstacles
    }

    /// Moves that stay inside the grid and off static obstacles, in
    /// [`Action::ALL`] order.
    pub fn get_actions(&self, state: Position) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|&action| {
                self.step(state, action)
                    .is_some_and(|next| !self.is_static_obstacle(next))
            })
            .collect()
    }

    /// Applies `action` to `state`. Only meaningful for actions returned by
    /// [`GridCity::get_actions`] for the same state.
    pub fn get_result(&self, state: Position, action: Action) -> Position {
        let (dr, dc) = action.delta();
        (
            state.0.wrapping_add_signed(dr),
            state.1.wrapping_add_signed(dc),
        )
    }

    /// Cost of entering `state`. With `Some(time_step)` a dynamic obstacle
    /// scheduled on `state` at exactly that step makes the move infinitely
    /// expensive; `None` looks at the terrain only.
    pub fn get_cost(&self, state: Position, time_step: Option<usize>) -> Cost {
        match time_step {
            Some(time_step) if self.is_occupied_at(state, time_step) => Cost::Infinite,
            _ => Cost::Finite(self.terrain_cost(state)),
        }
    }

    pub fn is_goal(&self, state: Position) -> bool {
        state == self.goal
    }

    /// Turns a free cell into a permanent obstacle, simulating an environment
    /// change between planning calls.
    pub fn add_static_obstacle(&mut self, position: Position) -> Result<(), MapError> {
        self.check_bounds(position)?;
        if position == self.start {
            return Err(MapError::ReservedCell {
                marker: "start",
                position,
            });
        }
        if position == self.goal {
            return Err(MapError::ReservedCell {
                marker: "goal",
                position,
            });
        }

        debug!("static obstacle added at {position:?}");
        self.static_obstacles.insert(position);
        Ok(())
    }

    /// Sets the terrain cost of a cell. Costs must be positive.
    pub fn set_terrain_cost(&mut self, position: Position, cost: usize) -> Result<(), MapError> {
        self.check_bounds(position)?;
        if cost == 0 {
            return Err(MapError::ZeroCost { position });
        }
        self.terrain_costs.insert(position, cost);
        Ok(())
    }

    fn step(&self, state: Position, action: Action) -> Option<Position> {
        let (dr, dc) = action.delta();
        let next = (
            state.0.checked_add_signed(dr)?,
            state.1.checked_add_signed(dc)?,
        );
        self.in_bounds(next).then_some(next)
    }

    fn check_bounds(&self, position: Position) -> Result<(), MapError> {
        if self.in_bounds(position) {
            Ok(())
        } else {
            Err(MapError::OutOfBounds {
                position,
                height: self.height,
                width: self.width,
            })
        }
    }
}

/// Parses the textual map format.
///
/// Each non-blank line is a row of cells: `#` static obstacle, `1`-`9`
/// terrain cost, `S` start, `G` goal, `D` dynamic obstacle origin, anything
/// else a free cell of cost 1. A row holding a `D` may end with
/// `:t,r,c;t,r,c...`, the obstacle's position at each listed time step. In a
/// row without a `D`, `:` is an ordinary free cell.
impl FromStr for GridCity {
    type Err = MapError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut static_obstacles = HashSet::new();
        let mut terrain_costs = HashMap::new();
        let mut dynamic_obstacles = HashMap::new();
        let mut start = None;
        let mut goal = None;
        let mut width = None;
        let mut height = 0;

        let rows = text.lines().map(str::trim_end).filter(|line| !line.is_empty());
        for (row, line) in rows.enumerate() {
            // `:` opens a schedule only after a `D`; elsewhere it is a plain cell.
            let (cells, schedule) = match line.split_once(':') {
                Some((cells, schedule)) if cells.contains('D') => (cells, Some(schedule)),
                _ => (line, None),
            };

            let found = cells.chars().count();
            let expected = *width.get_or_insert(found);
            if found != expected {
                return Err(MapError::RaggedRow {
                    row,
                    expected,
                    found,
                });
            }

            let mut origins = Vec::new();
            for (col, cell) in cells.chars().enumerate() {
                let position = (row, col);
                match cell {
                    '#' => {
                        static_obstacles.insert(position);
                    }
                    '0' => return Err(MapError::ZeroCost { position }),
                    '1'..='9' => {
                        terrain_costs.insert(position, (cell as u8 - b'0') as usize);
                    }
                    'S' => {
                        place_marker(&mut start, 'S', position)?;
                        terrain_costs.insert(position, 1);
                    }
                    'G' => {
                        place_marker(&mut goal, 'G', position)?;
                        terrain_costs.insert(position, 1);
                    }
                    'D' => {
                        origins.push(position);
                        terrain_costs.insert(position, 1);
                    }
                    _ => {
                        terrain_costs.insert(position, 1);
                    }
                }
            }

            match (schedule, origins.as_slice()) {
                (Some(schedule), &[origin]) => {
                    dynamic_obstacles.insert(origin, parse_schedule(row, origin, schedule)?);
                }
                (Some(_), origins) => {
                    return Err(MapError::ScheduleOwner {
                        row,
                        found: origins.len(),
                    })
                }
                (None, origins) => {
                    for &origin in origins {
                        warn!("dynamic obstacle at {origin:?} has no schedule");
                        dynamic_obstacles.insert(origin, Schedule::new());
                    }
                }
            }

            height = row + 1;
        }

        let width = width.filter(|&width| width > 0).ok_or(MapError::Empty)?;
        let start = start.ok_or(MapError::MissingStart)?;
        let goal = goal.ok_or(MapError::MissingGoal)?;

        let city = GridCity {
            height,
            width,
            static_obstacles,
            terrain_costs,
            dynamic_obstacles,
            start,
            goal,
        };
        for schedule in city.dynamic_obstacles.values() {
            for &position in schedule.values() {
                city.check_bounds(position)?;
            }
        }

        debug!(
            "loaded {}x{} city, {} static obstacles, {} dynamic obstacles",
            city.height,
            city.width,
            city.static_obstacles.len(),
            city.dynamic_obstacles.len()
        );
        Ok(city)
    }
}

fn place_marker(
    slot: &mut Option<Position>,
    marker: char,
    position: Position,
) -> Result<(), MapError> {
    if let Some(first) = *slot {
        return Err(MapError::DuplicateMarker {
            marker,
            first,
            position,
        });
    }
    *slot = Some(position);
    Ok(())
}

fn parse_schedule(row: usize, origin: Position, text: &str) -> Result<Schedule, MapError> {
    let mut schedule = Schedule::new();

    for entry in text.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        let malformed = || MapError::MalformedSchedule {
            row,
            entry: entry.to_string(),
        };

        let fields = entry
            .split(',')
            .map(|field| field.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;
        let &[time_step, r, c] = fields.as_slice() else {
            return Err(malformed());
        };

        if schedule.insert(time_step, (r, c)).is_some() {
            return Err(MapError::DuplicateTimeStep { origin, time_step });
        }
    }

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_map() {
        let city = GridCity::from_file("map_file/test/detour.map").unwrap();

        assert_eq!(city.height(), 3);
        assert_eq!(city.width(), 3);
        assert_eq!(city.start(), (0, 0));
        assert_eq!(city.goal(), (2, 0));

        assert!(city.is_static_obstacle((1, 0)));
        assert!(city.is_passable((1, 1)));
        assert_eq!(city.terrain_cost((1, 1)), 9);
        assert_eq!(city.terrain_cost((0, 1)), 1);
    }

    #[test]
    fn test_actions_follow_fixed_order() {
        let city: GridCity = "S..\n.#.\n..G".parse().unwrap();

        assert_eq!(city.get_actions((0, 0)), vec![Action::Right, Action::Down]);
        assert_eq!(city.get_actions((0, 1)), vec![Action::Right, Action::Left]);
        assert_eq!(
            city.get_actions((2, 1)),
            vec![Action::Right, Action::Left]
        );
        assert_eq!(city.get_result((2, 1), Action::Left), (2, 0));
    }

    #[test]
    fn test_dynamic_obstacle_cost() {
        let city = GridCity::from_file("map_file/test/dynamic.map").unwrap();

        assert_eq!(city.dynamic_obstacles().len(), 1);
        assert_eq!(city.dynamic_obstacles()[&(2, 0)][&2], (0, 2));

        assert_eq!(city.get_cost((0, 2), Some(2)), Cost::Infinite);
        assert_eq!(city.get_cost((0, 2), Some(1)), Cost::Finite(1));
        assert_eq!(city.get_cost((0, 2), None), Cost::Finite(1));
        // The origin cell itself is ordinary ground.
        assert_eq!(city.get_cost((2, 0), Some(0)), Cost::Finite(1));
    }

    #[test]
    fn test_schedule_with_several_entries() {
        let city: GridCity = "S..\n...\nD.G:0,1,1; 1,1,2;3,0,2;".parse().unwrap();

        let schedule = &city.dynamic_obstacles()[&(2, 0)];
        assert_eq!(schedule.len(), 3);
        assert!(city.is_occupied_at((1, 2), 1));
        assert!(!city.is_occupied_at((1, 2), 2));
    }

    #[test]
    fn test_unscheduled_dynamic_obstacle_is_free() {
        let city: GridCity = "SD.\n..G".parse().unwrap();

        assert!(city.dynamic_obstacles()[&(0, 1)].is_empty());
        assert_eq!(city.get_cost((0, 1), Some(0)), Cost::Finite(1));
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let city: GridCity = "S.\r\n\r\n.G\r\n".parse().unwrap();

        assert_eq!(city.height(), 2);
        assert_eq!(city.goal(), (1, 1));
    }

    #[test]
    fn test_load_errors() {
        let cases = [
            ("", "Empty"),
            ("S..\n..\n..G", "RaggedRow"),
            ("...\n..G", "MissingStart"),
            ("S..\n...", "MissingGoal"),
            ("S.S\n..G", "DuplicateMarker"),
            ("S0.\n..G", "ZeroCost"),
            ("S.D:1,2\n..G", "MalformedSchedule"),
            ("S.D:a,1,1\n..G", "MalformedSchedule"),
            ("SDD:1,1,1\n..G", "ScheduleOwner"),
            ("S.D:1,1,1;1,0,1\n..G", "DuplicateTimeStep"),
            ("S.D:1,5,5\n..G", "OutOfBounds"),
        ];

        for (text, expected) in cases {
            let err = text.parse::<GridCity>().unwrap_err();
            assert!(
                format!("{err:?}").starts_with(expected),
                "{text:?} gave {err:?}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_colon_without_dynamic_obstacle_is_a_cell() {
        let city: GridCity = "S:.\n..G".parse().unwrap();

        assert_eq!((city.height(), city.width()), (2, 3));
        assert!(city.dynamic_obstacles().is_empty());
        assert!(city.is_passable((0, 1)));
        assert_eq!(city.get_cost((0, 1), None), Cost::Finite(1));
        assert_eq!(city.goal(), (1, 2));
    }

    #[test]
    fn test_missing_file() {
        let err = GridCity::from_file("map_file/test/does_not_exist.map").unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }

    #[test]
    fn test_add_static_obstacle() {
        let mut city = GridCity::from_file("map_file/test/open.map").unwrap();

        city.add_static_obstacle((1, 1)).unwrap();
        assert!(!city.is_passable((1, 1)));
        assert_eq!(city.get_actions((0, 1)), vec![Action::Right, Action::Left]);

        assert!(matches!(
            city.add_static_obstacle((0, 0)),
            Err(MapError::ReservedCell { marker: "start", .. })
        ));
        assert!(matches!(
            city.add_static_obstacle((2, 2)),
            Err(MapError::ReservedCell { marker: "goal", .. })
        ));
        assert!(matches!(
            city.add_static_obstacle((3, 0)),
            Err(MapError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_programmatic_city() {
        let mut city = GridCity::new(2, 3, (0, 0), (1, 2)).unwrap();
        city.set_terrain_cost((0, 1), 4).unwrap();

        assert_eq!(city.get_cost((0, 1), Some(7)), Cost::Finite(4));
        assert!(GridCity::new(2, 3, (0, 0), (2, 0)).is_err());
        assert!(city.set_terrain_cost((0, 1), 0).is_err());
    }
}
