// Trains an FFM on a small synthetic click log and prints a few scores.
use anyhow::Result;
use fmrec::ffm::{FfmConfig, FfmModel};
use fmrec::{DiscreteSpace, Sample};
use ndarray::array;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const USERS: usize = 6;
const ITEMS: usize = 8;
const WEEKDAYS: usize = 7;

/// Users click on items sharing their parity, more often at the weekend.
fn click_log(count: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<Sample<f32>> {
    (0..count)
        .map(|_| {
            let user = rng.random_range(0..USERS);
            let item = rng.random_range(0..ITEMS);
            let weekday = rng.random_range(0..WEEKDAYS);
            let mut probability = if user % 2 == item % 2 { 0.7 } else { 0.1 };
            if weekday >= 5 {
                probability += 0.2;
            }
            let mark = if rng.random::<f32>() < probability { 1.0 } else { 0.0 };
            Sample::new(
                array![user, USERS + item, USERS + ITEMS + weekday],
                mark,
            )
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("fmrec=info".parse()?)
                .add_directive("ffm=info".parse()?),
        )
        .init();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2024);
    let samples = click_log(2_000, &mut rng);

    let space = DiscreteSpace::from_cardinalities(vec![USERS, ITEMS, WEEKDAYS]);
    let config = FfmConfig::default()
        .with_number_of_factors(4)
        .with_number_of_epoches(30)
        .with_learn_rate(0.02)
        .with_early_stop(true)
        .with_seed(7);
    let mut model = FfmModel::prepare(config, &space)?;
    let report = model.practice(&samples)?;
    info!(
        epochs = report.epochs_run(),
        converged = report.converged(),
        loss = ?report.final_loss(),
        "training done"
    );

    let fields = model.fields();
    for (user, item, weekday) in [(0, 0, 6), (0, 1, 6), (3, 5, 1), (3, 4, 1)] {
        let features = array![
            fields.flatten(0, user)?,
            fields.flatten(1, item)?,
            fields.flatten(2, weekday)?
        ];
        let score = model.predict(features.view())?;
        println!("user {user} item {item} weekday {weekday}: {score:.3}");
    }
    Ok(())
}
