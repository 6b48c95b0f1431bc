use crate::error::Rejection;
use crate::find::{MapStorage, MapTrait, Mark, NodeReference};
use std::{fmt::Display, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Free,
    Blocked,
}

impl Cell {
    pub fn toggled(self) -> Self {
        match self {
            Cell::Free => Cell::Blocked,
            Cell::Blocked => Cell::Free,
        }
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Cell::Free => ".",
                Cell::Blocked => "X",
            }
        )
    }
}

impl TryFrom<char> for Cell {
    type Error = anyhow::Error;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '.' | '1' => Ok(Cell::Free),
            'X' | 'x' | '#' | '0' => Ok(Cell::Blocked),
            _ => Err(anyhow!("Invalid cell: {:?}", c)),
        }
    }
}

/// The two moves the rat is allowed to make, in the order they are explored
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Down, Direction::Right];

    /// Move one cell from `point` in this direction. Does not check the upper bound.
    pub fn step(self, point: Point) -> Point {
        match self {
            Direction::Down => Point {
                row: point.row + 1,
                col: point.col,
            },
            Direction::Right => Point {
                row: point.row,
                col: point.col + 1,
            },
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::Down => "down",
                Direction::Right => "right",
            }
        )
    }
}

impl FromStr for Direction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "down" => Ok(Direction::Down),
            "right" => Ok(Direction::Right),
            _ => Err(anyhow::anyhow!("Invalid direction: {}", s)),
        }
    }
}

/// A square grid of free and blocked cells. The rat starts in the top left corner and
/// looks for the bottom right one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct GridMap {
    size: usize,
    cells: Vec<Vec<Cell>>,
}

impl GridMap {
    /// Create a maze of `size` x `size` free cells
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![vec![Cell::Free; size]; size],
        }
    }

    /// Build a maze from its rows, which must form a non-empty square
    pub fn from_rows(cells: Vec<Vec<Cell>>) -> Result<Self, anyhow::Error> {
        let size = cells.len();
        if size == 0 {
            return Err(anyhow!("A maze needs at least one cell"));
        }
        if let Some((index, row)) = cells.iter().enumerate().find(|(_, r)| r.len() != size) {
            return Err(anyhow!(
                "Maze is not square: row {} has {} cells, expected {}",
                index,
                row.len(),
                size
            ));
        }

        Ok(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, point: Point) -> Option<Cell> {
        self.cells.get(point.row)?.get(point.col).copied()
    }

    /// Set a cell, edits outside of the maze are ignored
    pub fn set(&mut self, point: Point, cell: Cell) {
        if let Some(c) = self
            .cells
            .get_mut(point.row)
            .and_then(|r| r.get_mut(point.col))
        {
            *c = cell;
        }
    }

    /// Flip a cell between free and blocked, edits outside of the maze are ignored
    pub fn toggle(&mut self, point: Point) {
        if let Some(cell) = self.get(point) {
            self.set(point, cell.toggled());
        }
    }

    pub fn obstacle_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| **c == Cell::Blocked)
            .count()
    }

    pub fn has_obstacle(&self) -> bool {
        self.cells.iter().flatten().any(|c| *c == Cell::Blocked)
    }

    /// Checks the maze before handing it to a search. A blocked start is reported
    /// before a missing obstacle.
    pub fn validate(&self) -> Result<(), Rejection> {
        if self.get(self.start()) != Some(Cell::Free) {
            return Err(Rejection::InvalidStart);
        }
        if !self.has_obstacle() {
            return Err(Rejection::NoObstacles);
        }
        Ok(())
    }

    pub fn resize(&mut self, size: usize) {
        // create container for holding new cells, anything new is free
        let mut new_cells = vec![vec![Cell::Free; size]; size];

        for row in 0..self.size.min(size) {
            for col in 0..self.size.min(size) {
                new_cells[row][col] = self.cells[row][col];
            }
        }

        self.size = size;
        self.cells = new_cells;
    }

    /// Scales the maze by the given factor, i.e. to make it twice as large, pass 2.
    /// Interpolates the cells by repeating the existing cells in the new grid.
    pub fn scale_up(&mut self, factor: usize) {
        let size = self.size * factor;
        let mut new_cells = vec![vec![Cell::Free; size]; size];

        for row in 0..self.size {
            for col in 0..self.size {
                for r in 0..factor {
                    for c in 0..factor {
                        new_cells[row * factor + r][col * factor + c] = self.cells[row][col];
                    }
                }
            }
        }

        self.size = size;
        self.cells = new_cells;
    }
}

impl TryFrom<Vec<Vec<Cell>>> for GridMap {
    type Error = anyhow::Error;

    fn try_from(cells: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        Self::from_rows(cells)
    }
}

impl From<GridMap> for Vec<Vec<Cell>> {
    fn from(map: GridMap) -> Self {
        map.cells
    }
}

impl FromStr for GridMap {
    type Err = anyhow::Error;

    /// One line per row, whitespace between cells is ignored so both `..X` and `1 1 0`
    /// are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cells = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                line.chars()
                    .filter(|c| !c.is_whitespace())
                    .map(Cell::try_from)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_rows(cells)
    }
}

impl Display for GridMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.cells {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            write!(f, "\n")?;
        }

        Ok(())
    }
}

/// A MapStorage that uses a square grid of cells (a vec in a vec)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellStorage<T>(Vec<Vec<T>>);

impl<T: Copy> CellStorage<T> {
    /// Iterate over every cell in row major order
    pub fn iter(&self) -> impl Iterator<Item = (Point, T)> + '_ {
        self.0.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, value)| (Point { row, col }, *value))
        })
    }
}

impl CellStorage<bool> {
    pub fn count(&self) -> usize {
        self.0.iter().flatten().filter(|v| **v).count()
    }
}

impl<T: Copy + 'static> MapStorage<T> for CellStorage<T> {
    type Reference = Point;

    fn is_valid(&self, node: Self::Reference) -> bool {
        node.row < self.0.len() && node.col < self.0[node.row].len()
    }

    fn get(&self, node: Self::Reference) -> T {
        self.0[node.row][node.col]
    }

    fn get_mut(&mut self, node: Self::Reference) -> &mut T {
        &mut self.0[node.row][node.col]
    }
}

impl<T: Display> Display for CellStorage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in &self.0 {
            for cell in row {
                write!(f, "{}", cell)?;
            }
            write!(f, "\n")?;
        }

        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl NodeReference for Point {}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl FromStr for Point {
    type Err = anyhow::Error;

    /// Parses `row,col`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("Invalid point, expected `row,col`: {}", s))?;

        Ok(Point {
            row: row.trim().parse()?,
            col: col.trim().parse()?,
        })
    }
}

impl MapTrait for GridMap {
    type Reference = Point;
    type Storage<T: Default + Copy + 'static> = CellStorage<T>;

    fn is_valid(&self, node: Self::Reference) -> bool {
        node.row < self.size && node.col < self.size
    }

    fn is_free(&self, node: Self::Reference) -> bool {
        self.get(node) == Some(Cell::Free)
    }

    fn start(&self) -> Self::Reference {
        Point { row: 0, col: 0 }
    }

    fn goal(&self) -> Self::Reference {
        let last = self.size.saturating_sub(1);
        Point {
            row: last,
            col: last,
        }
    }

    fn successors_of(&self, node: Self::Reference) -> impl Iterator<Item = Self::Reference> {
        // only points inside the map, blocked ones are left to the search
        let size = self.size;
        Direction::ALL
            .into_iter()
            .map(move |direction| direction.step(node))
            .filter(move |p| p.row < size && p.col < size)
    }

    fn create_storage<T: Default + Copy + 'static>(&self) -> Self::Storage<T> {
        CellStorage(vec![vec![Default::default(); self.size]; self.size])
    }

    fn create_marks(&self) -> Self::Storage<Mark> {
        CellStorage(
            self.cells
                .iter()
                .map(|row| row.iter().map(|c| Mark::from(*c)).collect())
                .collect(),
        )
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn create_basic_map() -> GridMap {
        "..X.\n\
         X...\n\
         ..X.\n\
         .X..\n"
            .parse()
            .unwrap()
    }

    #[test]
    fn test_parse_map() {
        let map = create_basic_map();

        assert_eq!(map.size(), 4);
        assert_eq!(map.obstacle_count(), 4);
        assert_eq!(map.get(Point { row: 0, col: 2 }), Some(Cell::Blocked));
        assert_eq!(map.get(Point { row: 3, col: 3 }), Some(Cell::Free));
        assert_eq!(map.get(Point { row: 4, col: 0 }), None);

        // the format printed by the original console output is accepted too
        let numeric: GridMap = "1 1 0 1\n0 1 1 1\n1 1 0 1\n1 0 1 1\n".parse().unwrap();
        assert_eq!(numeric, map);

        // displaying and parsing again gives the same maze
        assert_eq!(map.to_string().parse::<GridMap>().unwrap(), map);
    }

    #[test]
    fn test_parse_invalid_map() {
        assert!("".parse::<GridMap>().is_err());
        assert!("..\n.".parse::<GridMap>().is_err());
        assert!("...\n...".parse::<GridMap>().is_err());
        assert!(".?\n..".parse::<GridMap>().is_err());
    }

    #[test]
    fn test_edits_out_of_range_are_ignored() {
        let mut map = create_basic_map();
        let before = map.clone();

        map.toggle(Point { row: 4, col: 1 });
        map.set(Point { row: 0, col: 17 }, Cell::Blocked);
        assert_eq!(map, before);

        map.toggle(Point { row: 0, col: 2 });
        assert_eq!(map.get(Point { row: 0, col: 2 }), Some(Cell::Free));
        map.toggle(Point { row: 0, col: 2 });
        assert_eq!(map, before);
    }

    #[test]
    fn test_validate() {
        let mut map = GridMap::new(3);
        assert_eq!(map.validate(), Err(Rejection::NoObstacles));

        map.set(Point { row: 0, col: 0 }, Cell::Blocked);
        // a blocked start is reported first, even though there is an obstacle now
        assert_eq!(map.validate(), Err(Rejection::InvalidStart));

        map.toggle(Point { row: 0, col: 0 });
        map.toggle(Point { row: 1, col: 1 });
        assert_eq!(map.validate(), Ok(()));
    }

    #[test]
    fn test_successors_in_fixed_order() {
        let map = GridMap::new(3);

        assert_eq!(
            map.successors_of(Point { row: 0, col: 0 }).collect::<Vec<_>>(),
            vec![Point { row: 1, col: 0 }, Point { row: 0, col: 1 }]
        );
        assert_eq!(
            map.successors_of(Point { row: 2, col: 1 }).collect::<Vec<_>>(),
            vec![Point { row: 2, col: 2 }]
        );
        assert_eq!(map.successors_of(Point { row: 2, col: 2 }).count(), 0);
    }

    #[test]
    fn test_resize_and_scale() {
        let mut map = create_basic_map();

        map.resize(2);
        assert_eq!(map.to_string(), "..\nX.\n");

        map.resize(3);
        assert_eq!(map.to_string(), "...\nX..\n...\n");

        map.resize(2);
        map.scale_up(2);
        assert_eq!(map.size(), 4);
        assert_eq!(map.to_string(), "....\n....\nXX..\nXX..\n");
    }

    #[test]
    fn test_marks_follow_cells() {
        let map = create_basic_map();
        let marks = map.create_marks();

        assert_eq!(marks.get(Point { row: 1, col: 0 }), Mark::Blocked);
        assert_eq!(marks.get(Point { row: 1, col: 1 }), Mark::Free);
        assert!(!marks.iter().any(|(_, m)| m == Mark::OnPath));
    }

    #[test]
    fn test_json() {
        let map: GridMap = serde_json::from_str(r#"[["Free","Blocked"],["Free","Free"]]"#).unwrap();
        assert_eq!(map.to_string(), ".X\n..\n");
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"[["Free","Blocked"],["Free","Free"]]"#
        );

        assert!(serde_json::from_str::<GridMap>(r#"[["Free","Blocked"]]"#).is_err());
    }

    #[test]
    fn test_parse_point_and_direction() {
        assert_eq!(
            " 3, 4".parse::<Point>().unwrap(),
            Point { row: 3, col: 4 }
        );
        assert!("3".parse::<Point>().is_err());
        assert_eq!("down".parse::<Direction>().unwrap(), Direction::Down);
        assert_eq!(Direction::Right.to_string(), "right");
        assert!("up".parse::<Direction>().is_err());
    }
}
