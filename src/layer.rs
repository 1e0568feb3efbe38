use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::activation::TransferFunction;
use crate::loss::LossFunction;
use crate::neuron::Neuron;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Input,
    Hidden,
    Output,
}

/// An ordered group of neurons sharing one transfer function.
///
/// Neuron order is the order of the input vector (input layer) and of the
/// predicted vector (output layer).
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    number: usize,
    kind: LayerKind,
    neurons: Vec<Neuron>,
    bias: Option<Neuron>,
    transfer: Option<TransferFunction>,
    loss: Option<LossFunction>,
    initial_weight: f64,
}

fn neurons(number: usize, name: &str, size: usize) -> Vec<Neuron> {
    (0..size)
        .map(|index| Neuron::new(format!("{}_{}_{}", number, name, index)))
        .collect()
}

impl Layer {
    pub fn input(number: usize, name: &str, size: usize) -> Self {
        Self {
            name: name.to_string(),
            number,
            kind: LayerKind::Input,
            neurons: neurons(number, name, size),
            bias: None,
            transfer: None,
            loss: None,
            initial_weight: 0.0,
        }
    }

    pub fn hidden(
        number: usize,
        name: &str,
        size: usize,
        initial_weight: f64,
        transfer: TransferFunction,
    ) -> Self {
        Self {
            name: name.to_string(),
            number,
            kind: LayerKind::Hidden,
            neurons: neurons(number, name, size),
            bias: Some(Neuron::bias(format!("{}_Bias_{}", number, name))),
            transfer: Some(transfer),
            loss: None,
            initial_weight,
        }
    }

    pub fn output(
        number: usize,
        name: &str,
        size: usize,
        initial_weight: f64,
        transfer: TransferFunction,
        loss: LossFunction,
    ) -> Self {
        Self {
            kind: LayerKind::Output,
            loss: Some(loss),
            ..Self::hidden(number, name, size, initial_weight, transfer)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the layer in the network, `0` for the input layer.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn is_input(&self) -> bool {
        self.kind == LayerKind::Input
    }

    pub fn is_output(&self) -> bool {
        self.kind == LayerKind::Output
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn neuron(&self, index: usize) -> Option<&Neuron> {
        self.neurons.get(index)
    }

    /// The bias neuron feeding this layer. `None` for the input layer.
    pub fn bias(&self) -> Option<&Neuron> {
        self.bias.as_ref()
    }

    pub fn transfer(&self) -> Option<TransferFunction> {
        self.transfer
    }

    pub fn loss(&self) -> Option<LossFunction> {
        self.loss
    }

    /// Weight every incoming edge got when the layer was appended.
    pub fn initial_weight(&self) -> f64 {
        self.initial_weight
    }

    /// Current outputs in neuron order.
    pub fn outputs(&self) -> Array1<f64> {
        self.neurons.iter().map(Neuron::output_value).collect()
    }

    /// Assigns values directly as outputs, without any activation.
    pub(crate) fn set_outputs(&mut self, values: ArrayView1<f64>) {
        for (neuron, &value) in self.neurons.iter_mut().zip(values.iter()) {
            neuron.set_output_value(value);
        }
    }

    /// Computes net values and activations of every neuron.
    ///
    /// `previous` are the outputs of the preceding layer and `weights` has
    /// shape `(previous.len() + 1, self.len())`: column `j` holds the incoming
    /// weights of neuron `j` and the last row holds the bias edges.
    pub fn forward_pass(&mut self, previous: ArrayView1<f64>, weights: ArrayView2<f64>) {
        let transfer = match self.transfer {
            Some(transfer) => transfer,
            None => return,
        };
        let bias_output = self.bias.as_ref().map_or(1.0, Neuron::output_value);
        let inputs: Array1<f64> = previous
            .iter()
            .copied()
            .chain(std::iter::once(bias_output))
            .collect();

        if transfer == TransferFunction::Softmax {
            // The normalizer needs every net value of the layer first.
            let nets: Array1<f64> = self
                .neurons
                .iter_mut()
                .zip(weights.columns())
                .map(|(neuron, column)| neuron.compute_net_value(inputs.view(), column))
                .collect();
            let outputs = transfer.compute_layer(nets.view());
            for (neuron, &output) in self.neurons.iter_mut().zip(outputs.iter()) {
                neuron.activate(output);
            }
        } else {
            for (neuron, column) in self.neurons.iter_mut().zip(weights.columns()) {
                let net = neuron.compute_net_value(inputs.view(), column);
                neuron.activate(transfer.compute(net));
            }
        }
    }
}

/// Layers are equal when their names, kinds and neurons (by name) match.
impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.transfer == other.transfer
            && self.loss == other.loss
            && self.neurons == other.neurons
    }
}
