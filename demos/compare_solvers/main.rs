use std::{error::Error, path::Path};

use gridmdp::{compare::Comparator, fixtures, report};
use rand::{rngs::StdRng, SeedableRng};

const SEED: u64 = 0;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let out = Path::new("demos/compare_solvers/out");
    fixtures::write_all(out.join("fixtures"))?;

    let mut comparator = Comparator::new(StdRng::seed_from_u64(SEED));
    let mut rows = Vec::new();
    for instance in fixtures::standard_instances() {
        let (grids, comparison) = comparator.run(&instance)?;

        println!("---------------------- {} ----------------------", instance.name);
        println!(
            "W={} | H={} | p={} | r={}\n",
            instance.width, instance.height, instance.slip, instance.step_reward
        );
        println!("value iteration:\n{}", grids.exact_values);
        println!("model-based:\n{}", grids.model_based_values);
        println!("model-free:\n{}", grids.model_free_values);
        println!("model-free policy:\n{}", grids.model_free_policy);

        let (mean, abs) = (comparison.mean, comparison.mean_abs);
        println!(
            "average(d(MDP, MBRL)) = {:+.4} (|d| {:.4})",
            mean.exact_vs_model_based, abs.exact_vs_model_based
        );
        println!(
            "average(d(MDP, MFRL)) = {:+.4} (|d| {:.4})",
            mean.exact_vs_model_free, abs.exact_vs_model_free
        );
        println!(
            "average(d(MBRL, MFRL)) = {:+.4} (|d| {:.4})\n",
            mean.model_based_vs_model_free, abs.model_based_vs_model_free
        );

        rows.extend(report::rows(&instance.name, &comparison));
    }

    report::write_csv_file(out.join("results.csv"), &rows)?;
    Ok(())
}
