//! Dense grids, coordinates and action labels shared by the solvers.
//!
//! Two coordinate conventions coexist. The exact solver addresses cells as
//! [`RowCol`] with row 0 at the top, while the array based solvers use [`Xy`] with
//! y 0 at the bottom. Every [`Grid`] carries its [`Convention`] so that grids coming
//! from different solvers are only compared after an explicit
//! [`reoriented`](Grid::reoriented) call.

use std::{
    fmt,
    ops::{Index, IndexMut},
};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, VariantArray};

/// Orientation of the vertical axis of a [`Grid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    /// Line 0 is the top of the world, cells are addressed as [`RowCol`]
    TopDown,
    /// Line 0 is the bottom of the world, cells are addressed as [`Xy`]
    BottomUp,
}

/// A cell addressed by row and column, row 0 at the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowCol {
    pub row: usize,
    pub col: usize,
}

impl RowCol {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Convert to the bottom-up convention of a grid with `height` rows
    pub fn to_xy(self, height: usize) -> Xy {
        Xy::new(self.col, height - 1 - self.row)
    }
}

/// A cell addressed by horizontal and vertical position, y 0 at the bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Xy {
    pub x: usize,
    pub y: usize,
}

impl Xy {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Convert to the top-down convention of a grid with `height` rows
    pub fn to_row_col(self, height: usize) -> RowCol {
        RowCol::new(height - 1 - self.y, self.x)
    }
}

impl fmt::Display for Xy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What occupies a cell of the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tile {
    /// An ordinary cell, entering or leaving it costs the step reward
    Open,
    /// An absorbing cell with a fixed reward
    Terminal(f64),
    /// Not a state, moves into it are voided
    Wall,
}

impl Tile {
    pub fn is_wall(&self) -> bool {
        matches!(self, Tile::Wall)
    }

    pub fn terminal_reward(&self) -> Option<f64> {
        match *self {
            Tile::Terminal(reward) => Some(reward),
            _ => None,
        }
    }
}

/// Compass directions used by the exact solver, in clockwise order
#[derive(EnumIter, VariantArray, Display, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Compass {
    #[strum(serialize = "^")]
    North,
    #[strum(serialize = ">")]
    East,
    #[strum(serialize = "v")]
    South,
    #[strum(serialize = "<")]
    West,
}

impl Compass {
    /// Unit offset as `(d_row, d_col)` in the top-down convention
    pub fn offset(self) -> (isize, isize) {
        match self {
            Compass::North => (-1, 0),
            Compass::East => (0, 1),
            Compass::South => (1, 0),
            Compass::West => (0, -1),
        }
    }

    /// Rotate by a number of quarter turns, positive is clockwise
    pub fn turned(self, quarter_turns: isize) -> Self {
        let n = Self::VARIANTS.len() as isize;
        let i = (self as isize + quarter_turns).rem_euclid(n);
        Self::VARIANTS[i as usize]
    }
}

/// Actions of the exact solver's environment
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum GridAction {
    Move(Compass),
    /// The only action available in a terminal cell
    Exit,
}

impl fmt::Display for GridAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridAction::Move(dir) => write!(f, "{dir}"),
            GridAction::Exit => write!(f, "exit"),
        }
    }
}

/// Direction labels used by the array based solvers, in tie-breaking order
#[derive(EnumIter, VariantArray, Display, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Heading {
    #[strum(serialize = "U")]
    Up,
    #[strum(serialize = "D")]
    Down,
    #[strum(serialize = "L")]
    Left,
    #[strum(serialize = "R")]
    Right,
}

impl Heading {
    /// Unit offset as `(dx, dy)` in the bottom-up convention
    pub fn offset(self) -> (isize, isize) {
        match self {
            Heading::Up => (0, 1),
            Heading::Down => (0, -1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
        }
    }

    /// The heading's slip distribution: itself with `p`, each perpendicular heading
    /// with `(1 - p) / 2`
    pub fn slips(self, p: f64) -> [(Heading, f64); 3] {
        let side = (1.0 - p) / 2.0;
        match self {
            Heading::Up | Heading::Down => {
                [(self, p), (Heading::Left, side), (Heading::Right, side)]
            }
            Heading::Left | Heading::Right => {
                [(self, p), (Heading::Up, side), (Heading::Down, side)]
            }
        }
    }
}

impl From<Compass> for Heading {
    fn from(dir: Compass) -> Self {
        match dir {
            Compass::North => Heading::Up,
            Compass::East => Heading::Right,
            Compass::South => Heading::Down,
            Compass::West => Heading::Left,
        }
    }
}

impl From<Heading> for Compass {
    fn from(heading: Heading) -> Self {
        match heading {
            Heading::Up => Compass::North,
            Heading::Right => Compass::East,
            Heading::Down => Compass::South,
            Heading::Left => Compass::West,
        }
    }
}

/// A cell of a policy grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolicyCell<A> {
    /// The greedy action for an open cell
    Move(A),
    /// A terminal cell and its fixed reward
    Terminal(f64),
    Wall,
    /// An open cell that no sweep has visited yet
    Unset,
}

impl<A: fmt::Display> fmt::Display for PolicyCell<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyCell::Move(action) => write!(f, "{action}"),
            PolicyCell::Terminal(reward) if *reward > 0.0 => write!(f, "$"),
            PolicyCell::Terminal(_) => write!(f, "!"),
            PolicyCell::Wall => write!(f, "W"),
            PolicyCell::Unset => write!(f, " "),
        }
    }
}

/// A dense, row-major grid tagged with its vertical [`Convention`]
///
/// Storage is addressed by `(line, col)` where `line` is the row for
/// [`Convention::TopDown`] and `y` for [`Convention::BottomUp`]. The [`Index`]
/// impls for [`RowCol`] and [`Xy`] translate either coordinate type to the
/// right line, so callers never need to know the storage order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    convention: Convention,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// A grid with every cell set to `value`
    pub fn filled(width: usize, height: usize, convention: Convention, value: T) -> Self {
        Self {
            width,
            height,
            convention,
            cells: vec![value; width * height],
        }
    }

    /// A copy of this grid stored in another convention
    ///
    /// Only the vertical axis is flipped; columns keep their order.
    pub fn reoriented(&self, convention: Convention) -> Self {
        if convention == self.convention {
            return self.clone();
        }
        Self::from_fn(self.width, self.height, convention, |line, col| {
            self.get(self.height - 1 - line, col).clone()
        })
    }
}

impl<T> Grid<T> {
    /// Build a grid from a function of `(line, col)`
    pub fn from_fn(
        width: usize,
        height: usize,
        convention: Convention,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for line in 0..height {
            for col in 0..width {
                cells.push(f(line, col));
            }
        }
        Self {
            width,
            height,
            convention,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    /// Cell at storage position `(line, col)`
    pub fn get(&self, line: usize, col: usize) -> &T {
        &self.cells[line * self.width + col]
    }

    pub fn get_mut(&mut self, line: usize, col: usize) -> &mut T {
        &mut self.cells[line * self.width + col]
    }

    /// Iterate over `((line, col), cell)` in storage order
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i / width, i % width), cell))
    }

    /// All cells in storage order
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Apply `f` to every cell, keeping shape and convention
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            convention: self.convention,
            cells: self.cells.iter().map(f).collect(),
        }
    }

    /// Whether `(x, y)` with signed components falls inside the grid
    pub fn contains(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Storage lines ordered from the top of the world to the bottom
    fn lines_top_first(&self) -> Vec<usize> {
        match self.convention {
            Convention::TopDown => (0..self.height).collect(),
            Convention::BottomUp => (0..self.height).rev().collect(),
        }
    }

    fn line_of_row(&self, row: usize) -> usize {
        match self.convention {
            Convention::TopDown => row,
            Convention::BottomUp => self.height - 1 - row,
        }
    }

    fn line_of_y(&self, y: usize) -> usize {
        match self.convention {
            Convention::TopDown => self.height - 1 - y,
            Convention::BottomUp => y,
        }
    }

    fn render(
        &self,
        f: &mut fmt::Formatter<'_>,
        cell_width: usize,
        mut write_cell: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
    ) -> fmt::Result {
        let divide = "-".repeat((cell_width + 3) * self.width);
        for line in self.lines_top_first() {
            for col in 0..self.width {
                write!(f, " ")?;
                write_cell(f, self.get(line, col))?;
                write!(f, " |")?;
            }
            writeln!(f)?;
            writeln!(f, "{divide}")?;
        }
        Ok(())
    }
}

impl<T> Index<RowCol> for Grid<T> {
    type Output = T;

    fn index(&self, index: RowCol) -> &Self::Output {
        self.get(self.line_of_row(index.row), index.col)
    }
}

impl<T> IndexMut<RowCol> for Grid<T> {
    fn index_mut(&mut self, index: RowCol) -> &mut Self::Output {
        let line = self.line_of_row(index.row);
        self.get_mut(line, index.col)
    }
}

impl<T> Index<Xy> for Grid<T> {
    type Output = T;

    fn index(&self, index: Xy) -> &Self::Output {
        self.get(self.line_of_y(index.y), index.x)
    }
}

impl<T> IndexMut<Xy> for Grid<T> {
    fn index_mut(&mut self, index: Xy) -> &mut Self::Output {
        let line = self.line_of_y(index.y);
        self.get_mut(line, index.x)
    }
}

/// Values print with a sign and two decimals, the top of the world first
impl fmt::Display for Grid<f64> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 5, |f, value| write!(f, "{value:+5.2}"))
    }
}

/// Policies print one glyph per cell, the top of the world first
impl<A: fmt::Display> fmt::Display for Grid<PolicyCell<A>> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 1, |f, cell| write!(f, "{cell}"))
    }
}
