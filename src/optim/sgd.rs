pub struct Sgd {
    pub learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Sgd {
        Sgd { learning_rate }
    }

    /// Turns per-layer gradients into the corrections `Network::apply_update`
    /// adds: `-learning_rate * gradient`.
    pub fn correction(&self, gradients: &[Vec<f32>]) -> Vec<Vec<f32>> {
        gradients.iter()
            .map(|layer| layer.iter().map(|g| -self.learning_rate * g).collect())
            .collect()
    }
}
