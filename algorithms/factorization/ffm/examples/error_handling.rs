//! Example demonstrating error handling with the FFM model.
//!
//! Setup problems are reported before any parameter is allocated, and malformed
//! samples are rejected before training mutates anything.

use ffm::{FfmConfig, FfmError, FfmModel};
use fmrec_helpers::{DiscreteSpace, Sample};
use ndarray::array;

fn main() {
    println!("FFM Error Handling Examples");
    println!("===========================");

    let space = DiscreteSpace::from_cardinalities(vec![2, 3]);

    // Example 1: Invalid hyperparameters
    println!("\n1. Handling zero latent factors:");
    let config = FfmConfig::<f64>::default().with_number_of_factors(0);
    match FfmModel::prepare(config, &space) {
        Ok(_) => println!("   Model prepared"),
        Err(e @ FfmError::InvalidModelConfiguration(_)) => {
            println!("   ✓ Caught expected error: {}", e)
        }
        Err(e) => println!("   ✗ Unexpected error: {}", e),
    }

    // Example 2: Cardinalities that do not match the declared feature count
    println!("\n2. Handling a malformed feature space:");
    let bad_space = DiscreteSpace::new(6, vec![2, 3]);
    match FfmModel::<f64>::prepare(FfmConfig::default(), &bad_space) {
        Ok(_) => println!("   Model prepared"),
        Err(e) => println!("   ✓ Caught expected error: {}", e),
    }

    // Example 3: Out-of-range feature id in the training data
    println!("\n3. Handling an out-of-range feature id:");
    let config = FfmConfig::<f64>::default().with_number_of_epoches(5).with_seed(42);
    match FfmModel::prepare(config, &space) {
        Ok(mut model) => {
            let samples = vec![
                Sample::new(array![0, 3], 1.0),
                Sample::new(array![1, 9], 0.0),
            ];
            match model.practice(&samples) {
                Ok(report) => println!("   Trained for {} epochs", report.epochs_run()),
                Err(e @ FfmError::InvalidFeatureId { .. }) => {
                    println!("   ✓ Caught expected error: {}", e)
                }
                Err(e) => println!("   ✗ Unexpected error: {}", e),
            }

            // The model is untouched and still usable.
            match model.predict(array![0, 3].view()) {
                Ok(score) => println!("   ✓ Prediction still works: {:.4}", score),
                Err(e) => println!("   ✗ Prediction failed: {}", e),
            }
        }
        Err(e) => println!("   ✗ Failed to prepare model: {}", e),
    }

    // Example 4: Error propagation in a function
    println!("\n4. Error propagation in functions:");

    fn train_and_score() -> Result<f64, FfmError> {
        let space = DiscreteSpace::from_cardinalities(vec![2, 2]);
        let config = FfmConfig::default().with_number_of_epoches(20).with_seed(7);
        let mut model = FfmModel::prepare(config, &space)?;
        model.practice(&[
            Sample::new(array![0, 2], 1.0),
            Sample::new(array![1, 3], 0.0),
        ])?;
        model.predict(array![0, 2].view())
    }

    match train_and_score() {
        Ok(score) => println!("   ✓ Score: {:.4}", score),
        Err(e) => println!("   ✗ Training failed: {}", e),
    }

    println!("\n5. Error types and their meanings:");
    println!("   - InvalidFeatureId: a feature id lies outside [0, number_of_features)");
    println!("   - InvalidModelConfiguration: hyperparameters, feature space or sample width are inconsistent");

    println!("\nAll examples completed successfully!");
}
