use ndarray::ArrayView1;

/// Position of a neuron inside a [`Graph`](crate::graph::Graph).
///
/// The bias neuron of layer `l` feeds layer `l` and is addressed by its own
/// variant rather than by an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NeuronId {
    Unit { layer: usize, index: usize },
    Bias { layer: usize },
}

impl NeuronId {
    pub fn unit(layer: usize, index: usize) -> Self {
        Self::Unit { layer, index }
    }

    pub fn bias(layer: usize) -> Self {
        Self::Bias { layer }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeuronKind {
    Regular,
    /// Constant output of `1.0`, no incoming edges.
    Bias,
}

/// A single computation unit.
///
/// Identity is the name only: two neurons are equal iff their names are.
#[derive(Debug, Clone)]
pub struct Neuron {
    name: String,
    kind: NeuronKind,
    net_value: f64,
    output_value: f64,
}

impl PartialEq for Neuron {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Neuron {}

impl Neuron {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NeuronKind::Regular,
            net_value: 0.0,
            output_value: 0.0,
        }
    }

    pub fn bias(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NeuronKind::Bias,
            net_value: 0.0,
            output_value: 1.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NeuronKind {
        self.kind
    }

    pub fn is_bias(&self) -> bool {
        self.kind == NeuronKind::Bias
    }

    pub fn net_value(&self) -> f64 {
        self.net_value
    }

    pub fn output_value(&self) -> f64 {
        self.output_value
    }

    /// Sets the output directly. Used for input neurons, which are never activated.
    /// Bias neurons keep their constant output.
    pub fn set_output_value(&mut self, value: f64) {
        if !self.is_bias() {
            self.output_value = value;
        }
    }

    /// Weighted sum of the predecessor outputs; `inputs[i]` travels along
    /// the edge with weight `weights[i]`.
    pub fn compute_net_value(&mut self, inputs: ArrayView1<f64>, weights: ArrayView1<f64>) -> f64 {
        self.net_value = inputs.dot(&weights);
        self.net_value
    }

    /// Stores the output computed from `net_value` by the layer's transfer function.
    pub(crate) fn activate(&mut self, output: f64) -> f64 {
        self.output_value = output;
        self.output_value
    }
}
