use std::error::Error;

use gridmdp::{
    algo::{ModelBasedSolver, QLearningAgent, QLearningConfig, ValueIteration},
    gym::{GridWalk, GridWorld},
    instance::Instance,
};
use rand::{rngs::StdRng, SeedableRng};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let instance = Instance::classic(-0.04).with_discount(0.9);

    let world = GridWorld::from_instance(&instance)?;
    let vi = ValueIteration::for_instance(&instance);
    let values = vi.solve(&world);
    println!("value iteration:\n{}", world.value_grid(&values));
    println!("{}", world.policy_grid(&vi.policy(&world, &values)));

    let mut solver = ModelBasedSolver::from_instance(&instance)?;
    solver.value_iteration(instance.sweeps);
    println!("model-based:\n{}", solver.values());
    println!("{}", solver.policy());

    let mut walk = GridWalk::from_instance(&instance)?;
    let config = QLearningConfig {
        gamma: instance.discount,
        ..Default::default()
    };
    let mut agent = QLearningAgent::new(&walk, config, StdRng::seed_from_u64(42));
    agent.train(&mut walk, instance.episodes);
    println!("q-learning:\n{}", walk.value_grid(&agent));
    println!("{}", walk.policy_grid(&agent));

    Ok(())
}
