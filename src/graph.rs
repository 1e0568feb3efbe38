use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut2};

use crate::error::{Error, Result};
use crate::layer::Layer;
use crate::neuron::{Neuron, NeuronId};

/// Directed, weighted, strictly layered graph of neurons.
///
/// Edges only run from layer `l - 1` (plus the bias neuron of layer `l`) to
/// layer `l`. They are stored per layer as a dense matrix of shape
/// `(previous.len() + 1, layer.len())`; row `i` is the predecessor, column
/// `j` the successor and the last row belongs to the bias neuron.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    layers: Vec<Layer>,
    weights: Vec<Array2<f64>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, number: usize) -> Option<&Layer> {
        self.layers.get(number)
    }

    pub fn first(&self) -> Option<&Layer> {
        self.layers.first()
    }

    pub fn last(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn contains_layer(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.name() == name)
    }

    /// Appends `layer` and wires it fully to the current last layer, every
    /// edge (bias edges included) starting at the layer's initial weight.
    ///
    /// On error the graph is left untouched.
    pub fn push(&mut self, layer: Layer) -> Result<()> {
        let invalid = |reason| Error::InvalidLayer {
            name: layer.name().to_string(),
            reason,
        };

        if self.contains_layer(layer.name()) {
            return Err(Error::DuplicateLayerName(layer.name().to_string()));
        }
        if layer.is_empty() {
            return Err(invalid("a layer needs at least one neuron"));
        }
        match self.layers.last() {
            None if !layer.is_input() => {
                return Err(invalid("the first layer must be an input layer"))
            }
            Some(_) if layer.is_input() => {
                return Err(invalid("the network already has an input layer"))
            }
            Some(last) if last.is_output() => {
                return Err(invalid("the network is already closed by an output layer"))
            }
            _ => {}
        }

        let rows = self.layers.last().map_or(0, |previous| previous.len() + 1);
        self.weights
            .push(Array2::from_elem((rows, layer.len()), layer.initial_weight()));
        self.layers.push(layer);
        Ok(())
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        match id {
            NeuronId::Unit { layer, index } => self.layers.get(layer)?.neuron(index),
            NeuronId::Bias { layer } => self.layers.get(layer)?.bias(),
        }
    }

    /// Neurons with an edge into `id`, in weight-row order (bias last).
    pub fn predecessors(&self, id: NeuronId) -> Vec<NeuronId> {
        match id {
            NeuronId::Unit { layer, index } if layer > 0 && self.has_unit(layer, index) => {
                (0..self.layers[layer - 1].len())
                    .map(|i| NeuronId::unit(layer - 1, i))
                    .chain(std::iter::once(NeuronId::bias(layer)))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    /// Neurons reached by an edge out of `id`.
    pub fn successors(&self, id: NeuronId) -> Vec<NeuronId> {
        let target = match id {
            NeuronId::Unit { layer, index } if self.has_unit(layer, index) => layer + 1,
            NeuronId::Bias { layer } if self.neuron(id).is_some() => layer,
            _ => return Vec::new(),
        };
        match self.layers.get(target) {
            Some(next) => (0..next.len()).map(|j| NeuronId::unit(target, j)).collect(),
            None => Vec::new(),
        }
    }

    fn has_unit(&self, layer: usize, index: usize) -> bool {
        self.layers.get(layer).map_or(false, |l| index < l.len())
    }

    /// Locates the matrix entry of the edge `from -> to`, if that edge exists.
    fn edge(&self, from: NeuronId, to: NeuronId) -> Option<(usize, usize, usize)> {
        let (layer, column) = match to {
            NeuronId::Unit { layer, index } if layer > 0 && self.has_unit(layer, index) => {
                (layer, index)
            }
            _ => return None,
        };
        let row = match from {
            NeuronId::Unit {
                layer: from_layer,
                index,
            } if from_layer + 1 == layer && self.has_unit(from_layer, index) => index,
            NeuronId::Bias { layer: bias_layer } if bias_layer == layer => {
                self.layers[layer - 1].len()
            }
            _ => return None,
        };
        Some((layer, row, column))
    }

    pub fn weight(&self, from: NeuronId, to: NeuronId) -> Option<f64> {
        let (layer, row, column) = self.edge(from, to)?;
        Some(self.weights[layer][[row, column]])
    }

    /// Overwrites the weight of an existing edge. Returns `false` if there is
    /// no edge `from -> to`.
    pub fn set_weight(&mut self, from: NeuronId, to: NeuronId, weight: f64) -> bool {
        match self.edge(from, to) {
            Some((layer, row, column)) => {
                self.weights[layer][[row, column]] = weight;
                true
            }
            None => false,
        }
    }

    /// Incoming weights of every neuron of `layer`; empty for the input layer.
    pub fn incoming_weights(&self, layer: usize) -> Option<ArrayView2<f64>> {
        self.weights.get(layer).map(|w| w.view())
    }

    pub(crate) fn incoming_weights_mut(&mut self, layer: usize) -> Option<ArrayViewMut2<f64>> {
        self.weights.get_mut(layer).map(|w| w.view_mut())
    }

    /// Outputs of `layer` followed by the output of the bias neuron of the
    /// next layer, i.e. the values travelling along the next layer's edges.
    pub(crate) fn outputs_feeding(&self, layer: usize) -> Array1<f64> {
        let bias = self
            .layers
            .get(layer + 1)
            .and_then(Layer::bias)
            .map_or(1.0, Neuron::output_value);
        self.layers[layer]
            .outputs()
            .iter()
            .copied()
            .chain(std::iter::once(bias))
            .collect()
    }

    /// Assigns the input vector as outputs of the input layer.
    pub(crate) fn set_inputs(&mut self, values: ArrayView1<f64>) -> Result<()> {
        let input = self.layers.first_mut().ok_or(Error::EmptyTopology)?;
        if values.len() != input.len() {
            return Err(Error::DimensionMismatch {
                what: "input vector",
                expected: input.len(),
                actual: values.len(),
            });
        }
        input.set_outputs(values);
        Ok(())
    }

    /// Runs the forward pass of `layer` (which must not be the input layer).
    pub(crate) fn forward_pass(&mut self, layer: usize) {
        let (before, after) = self.layers.split_at_mut(layer);
        if let (Some(previous), Some(current)) = (before.last(), after.first_mut()) {
            current.forward_pass(previous.outputs().view(), self.weights[layer].view());
        }
    }
}

/// Graphs are equal when their layers are and every edge weight is identical.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.layers == other.layers && self.weights == other.weights
    }
}
