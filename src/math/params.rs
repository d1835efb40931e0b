use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::ops::Index;

/// Weights and biases of one layer in a single contiguous buffer.
///
/// The buffer is a sequence of per-neuron blocks of stride `inputs + 1`:
/// the `inputs` weights of neuron `i` followed by its bias. Weight `j` of a
/// block scales input `j`.
///
/// ```text
/// [ w(0,0) .. w(0,n-1) b(0) | w(1,0) .. w(1,n-1) b(1) | ... ]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    inputs: usize,
    neurons: usize,
    data: Vec<f32>,
}

/// Read-only view of one neuron's block.
#[derive(Debug, Clone, Copy)]
pub struct Neuron<'a> {
    pub weights: &'a [f32],
    pub bias: f32,
}

impl Parameters {
    /// Number of values needed for `neurons` neurons of `inputs` inputs each.
    pub fn len_for(inputs: usize, neurons: usize) -> usize {
        (inputs + 1) * neurons
    }

    pub fn zeros(inputs: usize, neurons: usize) -> Parameters {
        Parameters {
            inputs,
            neurons,
            data: vec![0.0; Parameters::len_for(inputs, neurons)],
        }
    }

    /// Every entry drawn from N(0, 1).
    pub fn standard_normal<R: Rng + ?Sized>(inputs: usize, neurons: usize, rng: &mut R) -> Parameters {
        let data = (0..Parameters::len_for(inputs, neurons))
            .map(|_| StandardNormal.sample(rng))
            .collect();
        Parameters { inputs, neurons, data }
    }

    /// Wraps an existing flat buffer laid out in per-neuron blocks.
    ///
    /// # Panics
    /// Panics if `data.len() != (inputs + 1) * neurons`.
    pub fn from_data(inputs: usize, neurons: usize, data: Vec<f32>) -> Parameters {
        assert_eq!(
            data.len(),
            Parameters::len_for(inputs, neurons),
            "parameter buffer does not match {}x{} layout",
            inputs,
            neurons
        );
        Parameters { inputs, neurons, data }
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn stride(&self) -> usize {
        self.inputs + 1
    }

    fn offset(&self, neuron: usize) -> usize {
        assert!(
            neuron < self.neurons,
            "neuron index {} out of range for {} neurons",
            neuron,
            self.neurons
        );
        neuron * self.stride()
    }

    /// Flat index of weight `input` of `neuron`.
    pub fn weight_index(&self, neuron: usize, input: usize) -> usize {
        assert!(
            input < self.inputs,
            "input index {} out of range for {} inputs",
            input,
            self.inputs
        );
        self.offset(neuron) + input
    }

    /// Flat index of the bias of `neuron`.
    pub fn bias_index(&self, neuron: usize) -> usize {
        self.offset(neuron) + self.inputs
    }

    pub fn weight(&self, neuron: usize, input: usize) -> f32 {
        self.data[self.weight_index(neuron, input)]
    }

    pub fn bias(&self, neuron: usize) -> f32 {
        self.data[self.bias_index(neuron)]
    }

    pub fn neuron(&self, neuron: usize) -> Neuron<'_> {
        let start = self.offset(neuron);
        let block = &self.data[start..start + self.stride()];
        Neuron {
            weights: &block[..self.inputs],
            bias: block[self.inputs],
        }
    }

    /// Mutable block of `neuron`: weights followed by the bias.
    pub fn neuron_mut(&mut self, neuron: usize) -> &mut [f32] {
        let start = self.offset(neuron);
        let stride = self.stride();
        &mut self.data[start..start + stride]
    }

    pub fn neurons(&self) -> impl Iterator<Item = Neuron<'_>> {
        let inputs = self.inputs;
        self.data.chunks_exact(self.stride()).map(move |block| Neuron {
            weights: &block[..inputs],
            bias: block[inputs],
        })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn fill(&mut self, value: f32) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Elementwise `self[i] += other[i]`.
    ///
    /// # Panics
    /// Panics if the lengths differ.
    pub fn add_assign(&mut self, other: &[f32]) {
        assert_eq!(
            self.data.len(),
            other.len(),
            "correction length {} does not match {} parameters",
            other.len(),
            self.data.len()
        );
        for (p, c) in self.data.iter_mut().zip(other.iter()) {
            *p += c;
        }
    }
}

impl Index<usize> for Parameters {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.data[index]
    }
}
