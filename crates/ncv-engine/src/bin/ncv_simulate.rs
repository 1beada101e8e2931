use anyhow::Context;
use ncv_data::{simulate, write_csv};
use ncv_engine::init_tracing;
use ncv_types::ExperimentConfig;

const DEFAULT_ROWS: usize = 5000;
const DEFAULT_GRID_SIZE: usize = 100;
const NOISE_SD: f64 = 1.0;
const SEED: u64 = 2019;

fn env_usize(key: &str, default: usize) -> anyhow::Result<usize> {
    match std::env::var(key) {
        Ok(v) => v.parse().with_context(|| format!("{key} must be a positive integer, got '{v}'")),
        Err(_) => Ok(default),
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ExperimentConfig::from_env()?;
    let rows = env_usize("NCV_SIM_ROWS", DEFAULT_ROWS)?;
    let grid_size = env_usize("NCV_SIM_GRID_SIZE", DEFAULT_GRID_SIZE)?;

    let dataset = simulate::friedman1(rows, NOISE_SD, SEED)?;
    write_csv(&simulate::dataset_to_table(&dataset), &config.data_path)?;

    write_csv(
        &simulate::elastic_net_table(grid_size, SEED)?,
        &config.elastic_net_grid_path,
    )?;
    write_csv(
        &simulate::random_forest_table(grid_size, simulate::FRIEDMAN_FEATURES, SEED)?,
        &config.random_forest_grid_path,
    )?;
    tracing::info!("Simulated {} rows and {} candidates per grid", rows, grid_size);
    Ok(())
}
