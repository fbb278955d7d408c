use anyhow::Context;
use mvsearch::{
    evaluate, min_var_portfolio, search_max_return_given_variance,
    search_min_variance_given_fixed_weight, search_min_variance_given_return, CovarianceMatrix,
    ExpectedReturns, MarketInputs, SearchConfig, WeightVector,
};
use std::env;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Four uncorrelated assets, the textbook exercise setup.
const VARIANCES: [f64; 4] = [0.0225, 0.04, 0.09, 0.0625];
const EXPECTED_RETURNS: [f64; 4] = [0.06, 0.08, 0.12, 0.10];

fn load_config() -> anyhow::Result<SearchConfig> {
    let mut config = match env::var("MVSEARCH_CONFIG") {
        Ok(json) => SearchConfig::from_json_str(&json)?,
        Err(_) => SearchConfig::default(),
    };
    if let Ok(seed) = env::var("MVSEARCH_SEED") {
        config.seed = Some(seed.parse().context("MVSEARCH_SEED must be a u64")?);
    }
    if let Ok(trials) = env::var("MVSEARCH_TRIALS") {
        config.trials = trials
            .parse()
            .context("MVSEARCH_TRIALS must be a positive integer")?;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let covariance = CovarianceMatrix::from_variances(&VARIANCES);
    let expected_returns = ExpectedReturns::new(EXPECTED_RETURNS.to_vec());
    let market = MarketInputs::new(expected_returns.clone(), covariance.clone())?;
    let mut rng = config.rng();

    info!(trials = config.trials, seed = ?config.seed, "Starting experiment");
    let start = Instant::now();

    let analytic = WeightVector::from(min_var_portfolio(covariance.as_matrix())?);
    let analytic_stats = evaluate(&analytic, &market)?;
    println!(
        "→ analytic minimum variance: weights = {:.4?}, return = {:.4}, variance = {:.6}",
        analytic.to_vec(),
        analytic_stats.expected_return,
        analytic_stats.variance
    );

    let fixed = search_min_variance_given_fixed_weight(0.4, 3, &covariance, &config, &mut rng)?;
    println!("→ fixed weight 0.4:\n{}", serde_json::to_string_pretty(&fixed)?);

    match search_min_variance_given_return(0.09, &expected_returns, &covariance, &config, &mut rng)
    {
        Ok(result) => println!(
            "→ target return 0.09:\n{}",
            serde_json::to_string_pretty(&result)?
        ),
        Err(e) => eprintln!("target return search failed: {e}"),
    }

    match search_max_return_given_variance(0.03, &expected_returns, &covariance, &config, &mut rng)
    {
        Ok(result) => println!(
            "→ target variance 0.03:\n{}",
            serde_json::to_string_pretty(&result)?
        ),
        Err(e) => eprintln!("target variance search failed: {e}"),
    }

    info!("Total experiment time: {:.2?}", start.elapsed());
    Ok(())
}
