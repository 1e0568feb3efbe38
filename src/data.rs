use ndarray_rand::rand::{seq::index::sample, Rng};
use serde::{Deserialize, Serialize};

/// One training pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub inputs: Vec<f64>,
    pub targets: Vec<f64>,
}

impl Example {
    pub fn new(inputs: Vec<f64>, targets: Vec<f64>) -> Self {
        Self { inputs, targets }
    }
}

/// Ordered list of examples used for epoch training.
///
/// Vector lengths are only checked against the network when training.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    examples: Vec<Example>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_example(&mut self, inputs: Vec<f64>, targets: Vec<f64>) {
        self.examples.push(Example::new(inputs, targets));
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn example(&self, index: usize) -> Option<&Example> {
        self.examples.get(index)
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Example> {
        self.examples.iter()
    }
}

impl From<Vec<(Vec<f64>, Vec<f64>)>> for DataSet {
    fn from(pairs: Vec<(Vec<f64>, Vec<f64>)>) -> Self {
        pairs
            .into_iter()
            .map(|(inputs, targets)| Example::new(inputs, targets))
            .collect()
    }
}

impl FromIterator<Example> for DataSet {
    fn from_iter<I: IntoIterator<Item = Example>>(iter: I) -> Self {
        Self {
            examples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a Example;
    type IntoIter = std::slice::Iter<'a, Example>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sampler produces the order in which examples are visited in an epoch.
pub enum Sampler<R> {
    Sequential(usize),
    Random(usize, R),
}

impl<R: Rng> Sampler<R> {
    pub fn new(size: usize, shuffle: bool, rng: R) -> Self {
        if shuffle {
            Self::Random(size, rng)
        } else {
            Self::Sequential(size)
        }
    }

    pub fn sample(&mut self) -> Vec<usize> {
        match self {
            Self::Sequential(size) => (0..*size).collect(),
            Self::Random(size, rng) => sample(rng, *size, *size).into_vec(),
        }
    }
}
