//! The benchmark catalog: fifteen layouts, each solved under one or more step rewards.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::info;

use crate::{
    error::{Error, Result},
    instance::{CellSpec, Instance},
};

struct Layout {
    width: usize,
    height: usize,
    cells: Vec<(i64, i64, f64)>,
    slip: f64,
    step_rewards: &'static [f64],
}

impl Layout {
    fn new(
        width: usize,
        height: usize,
        cells: &[(i64, i64, f64)],
        slip: f64,
        step_rewards: &'static [f64],
    ) -> Self {
        Self {
            width,
            height,
            cells: cells.to_vec(),
            slip,
            step_rewards,
        }
    }
}

fn cliff() -> Vec<(i64, i64, f64)> {
    let mut cells: Vec<_> = (1..11).map(|x| (x, 0, -100.0)).collect();
    cells.push((11, 0, 1.0));
    cells
}

const CORNERS: [(i64, i64, f64); 4] = [(4, 0, -10.0), (0, 4, -10.0), (1, 1, 1.0), (3, 3, 2.0)];
const DIAGONAL: [(i64, i64, f64); 4] = [(2, 2, -2.0), (4, 4, -1.0), (1, 1, 1.0), (3, 3, 2.0)];
const QUADRANTS: [(i64, i64, f64); 4] = [(1, 1, -4.0), (1, 5, -6.0), (5, 1, 1.0), (5, 5, 4.0)];

fn layouts() -> Vec<Layout> {
    let walled: Vec<_> = [(3, 1, 0.0), (3, 5, 0.0)]
        .into_iter()
        .chain(QUADRANTS)
        .collect();
    vec![
        Layout::new(4, 3, &[(1, 1, 0.0), (3, 2, 1.0), (3, 1, -1.0)], 0.8, &[-0.04, 0.04, -1.0]),
        Layout::new(12, 4, &cliff(), 1.0, &[-1.0]),
        Layout::new(12, 6, &cliff(), 0.9, &[-1.0]),
        Layout::new(5, 5, &CORNERS, 0.9, &[-0.5]),
        Layout::new(5, 5, &DIAGONAL, 0.9, &[-0.25]),
        Layout::new(7, 7, &QUADRANTS, 0.8, &[-0.5]),
        Layout::new(7, 7, &walled, 0.8, &[-0.25]),
        Layout::new(6, 6, &DIAGONAL, 0.9, &[-0.1, -0.3, -0.5]),
        Layout::new(8, 8, &QUADRANTS, 0.8, &[-0.2, -0.4, -0.6]),
        Layout::new(10, 5, &CORNERS, 0.9, &[-0.2, -0.4, -0.6]),
        Layout::new(8, 6, &QUADRANTS, 0.8, &[-0.1, -0.3, -0.5]),
        Layout::new(6, 8, &DIAGONAL, 0.9, &[-0.2, -0.4, -0.6]),
        Layout::new(7, 10, &QUADRANTS, 0.8, &[-0.1, -0.3, -0.5]),
        Layout::new(5, 12, &CORNERS, 0.9, &[-0.2, -0.4, -0.6]),
        Layout::new(6, 6, &DIAGONAL, 0.9, &[-0.2, -0.3, -0.4]),
    ]
}

/// Every catalog instance, named `t{layout}_r{step_reward}` with layouts numbered from 1
pub fn standard_instances() -> Vec<Instance> {
    layouts()
        .into_iter()
        .enumerate()
        .flat_map(|(i, layout)| {
            let rewards = layout.step_rewards;
            rewards.iter().map(move |&reward| {
                let cells = layout
                    .cells
                    .iter()
                    .map(|&(x, y, r)| CellSpec::new(x, y, r))
                    .collect();
                Instance::new(layout.width, layout.height, cells, layout.slip, reward)
                    .with_name(format!("t{}_r{reward}", i + 1))
            })
        })
        .collect()
}

/// Write one `<name>.json` fixture per catalog instance into `dir`, creating it if needed
///
/// **Returns** the paths written
pub fn write_all(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::io(format!("create {}", dir.display()), e))?;

    let mut written = Vec::new();
    for instance in standard_instances() {
        let path = dir.join(format!("{}.json", instance.name));
        instance.save(&path)?;
        written.push(path);
    }
    info!("wrote {} fixtures to {}", written.len(), dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_is_complete_and_valid() {
        let instances = standard_instances();
        assert_eq!(instances.len(), 33);
        for instance in &instances {
            instance
                .validate()
                .unwrap_or_else(|e| panic!("{} is invalid: {e}", instance.name));
        }
        let names: HashSet<_> = instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names.len(), 33, "Names are unique");
    }

    #[test]
    fn names_follow_layout_and_reward() {
        let instances = standard_instances();
        assert_eq!(instances[0].name, "t1_r-0.04");
        assert_eq!(instances[1].name, "t1_r0.04");
        assert_eq!(instances[2].name, "t1_r-1");
        assert_eq!(instances[3].name, "t2_r-1");
        assert_eq!(instances[30].name, "t15_r-0.2");
        assert_eq!(instances[32].name, "t15_r-0.4");
        assert_eq!(instances[0], Instance::classic(-0.04).with_name("t1_r-0.04"));
    }

    #[test]
    fn cliff_layout() {
        let instances = standard_instances();
        let cliff = &instances[3];
        assert_eq!((cliff.width, cliff.height, cliff.slip), (12, 4, 1.0));
        assert_eq!(cliff.cells.len(), 11);
        assert!(cliff.cells.iter().all(|c| c.y == 0 && !c.is_wall()));
    }

    #[test]
    fn fixtures_round_trip_through_disk() {
        let dir = std::env::temp_dir().join(format!("gridmdp-fixtures-{}", std::process::id()));
        let written = write_all(&dir).unwrap();
        assert_eq!(written.len(), 33);

        let loaded = Instance::load(&written[6]).unwrap();
        assert_eq!(loaded, standard_instances()[6]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
