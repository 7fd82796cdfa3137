//! Runs the three solvers on one instance and lines their value grids up.
//!
//! Every grid is brought to the bottom-up [`Convention`] before any arithmetic, so
//! the exact solver's top-down output is flipped vertically first. Differences are
//! always taken in the same direction: exact minus model-based, exact minus
//! model-free and model-based minus model-free.

use log::info;
use rand::Rng;

use crate::{
    algo::{ModelBasedSolver, QLearningAgent, QLearningConfig, ValueIteration},
    decay::{self, Decay},
    error::{Error, Result},
    grid::{Compass, Convention, Grid, Heading, PolicyCell, Xy},
    gym::{GridWalk, GridWorld},
    instance::Instance,
    util::mean,
};

/// The three pairwise differences for one cell or one aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Differences {
    pub exact_vs_model_based: f64,
    pub exact_vs_model_free: f64,
    pub model_based_vs_model_free: f64,
}

/// Differences at one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellDiff {
    /// Bottom-up coordinates of the cell
    pub cell: Xy,
    pub diff: Differences,
}

impl CellDiff {
    /// Canonical label of the cell, `"(x, y)"` with y counted from the bottom
    pub fn label(&self) -> String {
        self.cell.to_string()
    }
}

/// Result of comparing the value grids of the three solvers
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Per-cell differences in bottom-up storage order
    pub cells: Vec<CellDiff>,
    /// Signed mean of each difference over all cells
    pub mean: Differences,
    /// Mean absolute value of each difference over all cells
    pub mean_abs: Differences,
}

/// Compare three value grids cell by cell
///
/// Grids may come in either convention. Walls are expected to hold zero in every grid.
///
/// **Errors** if the grids do not share one shape
pub fn compare(
    exact: &Grid<f64>,
    model_based: &Grid<f64>,
    model_free: &Grid<f64>,
) -> Result<Comparison> {
    for other in [model_based, model_free] {
        if other.shape() != exact.shape() {
            return Err(Error::ShapeMismatch {
                expected: exact.shape(),
                got: other.shape(),
            });
        }
    }

    let exact = exact.reoriented(Convention::BottomUp);
    let model_based = model_based.reoriented(Convention::BottomUp);
    let model_free = model_free.reoriented(Convention::BottomUp);

    let cells: Vec<CellDiff> = exact
        .iter()
        .map(|((y, x), &e)| {
            let cell = Xy::new(x, y);
            let (b, f) = (model_based[cell], model_free[cell]);
            CellDiff {
                cell,
                diff: Differences {
                    exact_vs_model_based: e - b,
                    exact_vs_model_free: e - f,
                    model_based_vs_model_free: b - f,
                },
            }
        })
        .collect();

    Ok(Comparison {
        mean: summarize(&cells, |d| d),
        mean_abs: summarize(&cells, f64::abs),
        cells,
    })
}

fn summarize(cells: &[CellDiff], norm: fn(f64) -> f64) -> Differences {
    let column = |pick: &dyn Fn(&Differences) -> f64| {
        let values: Vec<f64> = cells.iter().map(|c| norm(pick(&c.diff))).collect();
        mean(&values)
    };
    Differences {
        exact_vs_model_based: column(&|d: &Differences| d.exact_vs_model_based),
        exact_vs_model_free: column(&|d: &Differences| d.exact_vs_model_free),
        model_based_vs_model_free: column(&|d: &Differences| d.model_based_vs_model_free),
    }
}

/// Value and policy grids produced by each solver
#[derive(Debug, Clone)]
pub struct SolverGrids {
    /// Top-down, as produced by the exact solver
    pub exact_values: Grid<f64>,
    pub exact_policy: Grid<PolicyCell<Compass>>,
    /// Bottom-up
    pub model_based_values: Grid<f64>,
    pub model_based_policy: Grid<PolicyCell<Heading>>,
    /// Bottom-up
    pub model_free_values: Grid<f64>,
    pub model_free_policy: Grid<PolicyCell<Heading>>,
}

/// Runs every solver on an instance with its own budgets and compares the results
///
/// The random number generator is shared by every model-free run, so running a
/// catalog through one comparator is reproducible from a single seed.
pub struct Comparator<R: Rng, D: Decay + Clone = decay::Constant> {
    rng: R,
    learner: QLearningConfig<D>,
}

impl<R: Rng> Comparator<R> {
    /// A comparator with the default learner configuration
    pub fn new(rng: R) -> Self {
        Self::with_learner(rng, QLearningConfig::default())
    }
}

impl<R: Rng, D: Decay + Clone> Comparator<R, D> {
    /// A comparator with custom exploration and learning rate
    ///
    /// The discount of `learner` is replaced by each instance's discount.
    pub fn with_learner(rng: R, learner: QLearningConfig<D>) -> Self {
        Self { rng, learner }
    }

    /// Solve `instance` three ways and compare the value grids
    pub fn run(&mut self, instance: &Instance) -> Result<(SolverGrids, Comparison)> {
        instance.validate()?;
        info!(
            "comparing solvers on {} ({}x{}, slip {}, step reward {})",
            display_name(instance),
            instance.width,
            instance.height,
            instance.slip,
            instance.step_reward
        );

        let world = GridWorld::from_instance(instance)?;
        let vi = ValueIteration::for_instance(instance);
        let values = vi.solve(&world);
        let exact_values = world.value_grid(&values);
        let exact_policy = world.policy_grid(&vi.policy(&world, &values));

        let mut solver = ModelBasedSolver::from_instance(instance)?;
        solver.value_iteration(instance.sweeps);

        let mut walk = GridWalk::from_instance(instance)?;
        let config = QLearningConfig {
            gamma: instance.discount,
            ..self.learner.clone()
        };
        let mut agent = QLearningAgent::new(&walk, config, &mut self.rng);
        agent.train(&mut walk, instance.episodes);
        let model_free_values = walk.value_grid(&agent);
        let model_free_policy = walk.policy_grid(&agent);

        let comparison = compare(&exact_values, solver.values(), &model_free_values)?;
        info!(
            "{}: mean |d| exact/based {:.4}, exact/free {:.4}, based/free {:.4}",
            display_name(instance),
            comparison.mean_abs.exact_vs_model_based,
            comparison.mean_abs.exact_vs_model_free,
            comparison.mean_abs.model_based_vs_model_free
        );

        let grids = SolverGrids {
            exact_values,
            exact_policy,
            model_based_values: solver.values().clone(),
            model_based_policy: solver.policy().clone(),
            model_free_values,
            model_free_policy,
        };
        Ok((grids, comparison))
    }
}

fn display_name(instance: &Instance) -> &str {
    if instance.name.is_empty() {
        "unnamed instance"
    } else {
        &instance.name
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::grid::RowCol;

    #[test]
    fn top_down_grids_are_flipped() {
        // exact: top row 1 2, bottom row 3 4
        let exact = Grid::from_fn(2, 2, Convention::TopDown, |row, col| (row * 2 + col + 1) as f64);
        // same world stored bottom-up
        let same = Grid::from_fn(2, 2, Convention::BottomUp, |y, x| ((1 - y) * 2 + x + 1) as f64);
        let zeros = Grid::filled(2, 2, Convention::BottomUp, 0.0);

        let comparison = compare(&exact, &same, &zeros).unwrap();
        assert!(comparison.cells.iter().all(|c| c.diff.exact_vs_model_based == 0.0));

        let top_left = comparison
            .cells
            .iter()
            .find(|c| c.label() == "(0, 1)")
            .unwrap();
        assert_eq!(top_left.diff.exact_vs_model_free, 1.0);
        assert_eq!(top_left.diff.model_based_vs_model_free, 1.0);
        assert_eq!(comparison.cells[0].label(), "(0, 0)");
        assert_eq!(
            comparison.cells[0].diff.exact_vs_model_free,
            3.0,
            "Bottom-left of the exact grid"
        );
    }

    #[test]
    fn signed_and_absolute_means() {
        let exact = Grid::filled(2, 1, Convention::BottomUp, 0.0);
        let mut model_based = exact.clone();
        model_based[Xy::new(0, 0)] = 1.0;
        model_based[Xy::new(1, 0)] = -1.0;
        let model_free = Grid::filled(2, 1, Convention::BottomUp, 0.5);

        let comparison = compare(&exact, &model_based, &model_free).unwrap();
        assert_eq!(comparison.mean.exact_vs_model_based, 0.0, "Signed errors cancel");
        assert_eq!(comparison.mean_abs.exact_vs_model_based, 1.0);
        assert_eq!(comparison.mean.exact_vs_model_free, -0.5);
        assert_eq!(comparison.mean.model_based_vs_model_free, -0.5);
        assert_eq!(comparison.mean_abs.model_based_vs_model_free, 1.0);
    }

    #[test]
    fn shapes_must_match() {
        let a = Grid::filled(3, 2, Convention::TopDown, 0.0);
        let b = Grid::filled(2, 3, Convention::BottomUp, 0.0);
        let err = compare(&a, &a, &b).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: (3, 2),
                got: (2, 3)
            }
        ));
    }

    #[test]
    fn run_classic_instance() {
        let instance = Instance::classic(-0.04).with_name("classic");
        let mut comparator = Comparator::new(StdRng::seed_from_u64(7));
        let (grids, comparison) = comparator.run(&instance).unwrap();

        assert_eq!(comparison.cells.len(), 12);
        assert!(comparison.mean_abs.exact_vs_model_based < 1e-9);
        assert!(comparison.mean_abs.exact_vs_model_free < 0.3);

        assert_eq!(grids.exact_values.convention(), Convention::TopDown);
        assert_eq!(grids.exact_values[RowCol::new(0, 3)], 1.0);
        assert_eq!(grids.model_based_values[Xy::new(3, 2)], 1.0);
        assert_eq!(grids.model_free_policy[Xy::new(1, 1)], PolicyCell::Wall);
        assert_eq!(grids.exact_policy[RowCol::new(1, 1)], PolicyCell::Wall);

        let wall = comparison.cells.iter().find(|c| c.label() == "(1, 1)").unwrap();
        assert_eq!(wall.diff, Differences::default(), "Walls are zero everywhere");
    }

    #[test]
    fn run_rejects_invalid_instances() {
        let instance = Instance::classic(-0.04).with_discount(0.0);
        let mut comparator = Comparator::new(StdRng::seed_from_u64(7));
        assert!(matches!(comparator.run(&instance), Err(Error::InvalidDiscount(_))));

        let no_exit = Instance::new(2, 1, vec![], 0.8, -0.04).with_budget(10, 1);
        assert!(matches!(
            comparator.run(&no_exit),
            Err(Error::NoReachableTerminal { .. })
        ));
    }
}
