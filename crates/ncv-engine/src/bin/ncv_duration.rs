use ncv_engine::{build_reporter, init_tracing, run_experiment};
use ncv_types::ExperimentConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ExperimentConfig::from_env()?;
    tracing::info!(
        "Experiment '{}': data {}, grids {} and {}",
        config.experiment_name,
        config.data_path.display(),
        config.elastic_net_grid_path.display(),
        config.random_forest_grid_path.display()
    );

    let reporter = build_reporter(&config.report)?;
    let report = run_experiment(&config, &reporter).await?;

    println!("{}", ncv_report::compose_message(&report));
    Ok(())
}
