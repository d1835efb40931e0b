/// Squared-error cost between an output vector and its training target.
pub struct SquaredError;

impl SquaredError {
    /// Cost of one sample: `sum((predicted - expected)²)`.
    ///
    /// Not divided by the output count; batch averaging happens over samples.
    pub fn cost(predicted: &[f32], expected: &[f32]) -> f32 {
        assert_eq!(
            predicted.len(),
            expected.len(),
            "prediction and target lengths differ"
        );
        predicted.iter().zip(expected.iter())
            .map(|(a, y)| {
                let diff = a - y;
                diff * diff
            })
            .sum()
    }

    /// Per-output gradient ∂cost/∂a: `2 * (a - y)`
    pub fn derivative(predicted: f32, expected: f32) -> f32 {
        2.0 * (predicted - expected)
    }
}

/// Target vector with 1 at `label` and 0 elsewhere.
///
/// # Panics
/// Panics if `label >= len`.
pub fn one_hot(label: usize, len: usize) -> Vec<f32> {
    assert!(
        label < len,
        "label {} out of range for {} outputs",
        label,
        len
    );
    let mut target = vec![0.0; len];
    target[label] = 1.0;
    target
}
