/// A labeled training example, as handed over by a dataset loader.
///
/// The network only reads two views of it: the normalized input vector and
/// the class index used to build the one-hot target.
pub trait LabeledSample {
    fn input(&self) -> &[f32];
    fn label(&self) -> usize;
}

/// Owned input vector plus class label.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub input: Vec<f32>,
    pub label: usize,
}

impl Sample {
    pub fn new(input: Vec<f32>, label: usize) -> Sample {
        Sample { input, label }
    }
}

impl LabeledSample for Sample {
    fn input(&self) -> &[f32] {
        &self.input
    }

    fn label(&self) -> usize {
        self.label
    }
}

impl<S: LabeledSample + ?Sized> LabeledSample for &S {
    fn input(&self) -> &[f32] {
        (**self).input()
    }

    fn label(&self) -> usize {
        (**self).label()
    }
}
