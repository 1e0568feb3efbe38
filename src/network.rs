use ndarray::{s, Array1, ArrayView1, ArrayView2, Zip};
use ndarray_rand::rand::{thread_rng, Rng};
use tracing::{debug, info, trace, warn};

use crate::activation::TransferFunction;
use crate::data::{DataSet, Sampler};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::init::WeightInit;
use crate::layer::Layer;
use crate::loss::LossFunction;
use crate::neuron::NeuronId;
use crate::optimizer::GradientDescent;
use crate::training::{Convergence, EpochStats, TrainingPolicy, TrainingReport};

pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Per-neuron backpropagation state, one array per layer.
///
/// Values are only meaningful right after a backward pass and are
/// overwritten by the next one.
#[derive(Debug, Clone, Default)]
struct Scratch {
    /// `dE/dOut` of every neuron.
    error_signals: Vec<Array1<f64>>,
    /// `dE/dNet` of every neuron.
    error_deltas: Vec<Array1<f64>>,
}

impl Scratch {
    fn push_layer(&mut self, size: usize) {
        self.error_signals.push(Array1::zeros(size));
        self.error_deltas.push(Array1::zeros(size));
    }
}

/// Feed-forward neural network.
///
/// Built by appending an input layer, any number of hidden layers and one
/// output layer. After that only edge weights and per-neuron values change.
/// A network is not meant to be shared between threads while training.
#[derive(Debug, Clone)]
pub struct Network {
    graph: Graph,
    learning_rate: f64,
    weight_init: WeightInit,
    scratch: Scratch,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

/// Networks are equal when topology, every edge weight, learning rate and
/// initialization strategy match. Transient neuron values are ignored.
impl PartialEq for Network {
    fn eq(&self, other: &Self) -> bool {
        self.graph == other.graph
            && self.learning_rate == other.learning_rate
            && self.weight_init == other.weight_init
    }
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            learning_rate: DEFAULT_LEARNING_RATE,
            weight_init: WeightInit::Default,
            scratch: Scratch::default(),
        }
    }

    pub fn with_learning_rate(self, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            ..self
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) {
        self.learning_rate = learning_rate;
    }

    pub fn weight_init(&self) -> WeightInit {
        self.weight_init
    }

    pub(crate) fn set_weight_init(&mut self, weight_init: WeightInit) {
        self.weight_init = weight_init;
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn layers(&self) -> &[Layer] {
        self.graph.layers()
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers().iter().find(|layer| layer.name() == name)
    }

    pub fn input_layer(&self) -> Option<&Layer> {
        self.graph.first()
    }

    /// The last layer, if it is an output layer.
    pub fn output_layer(&self) -> Option<&Layer> {
        self.graph.last().filter(|layer| layer.is_output())
    }

    /// `true` if the output layer has exactly one neuron.
    pub fn is_single_output(&self) -> bool {
        self.output_layer().map_or(false, |layer| layer.len() == 1)
    }

    fn push_layer(&mut self, layer: Layer) -> Result<&mut Self> {
        let name = layer.name().to_string();
        let size = layer.len();
        let transfer = layer.transfer();
        self.graph.push(layer)?;
        self.scratch.push_layer(size);
        debug!(layer = %name, size, ?transfer, "appended layer");
        Ok(self)
    }

    pub fn input(&mut self, size: usize, name: &str) -> Result<&mut Self> {
        let layer = Layer::input(self.graph.len(), name, size);
        self.push_layer(layer)
    }

    pub fn hidden(
        &mut self,
        size: usize,
        name: &str,
        initial_weight: f64,
        transfer: TransferFunction,
    ) -> Result<&mut Self> {
        let layer = Layer::hidden(self.graph.len(), name, size, initial_weight, transfer);
        self.push_layer(layer)
    }

    pub fn output(
        &mut self,
        size: usize,
        name: &str,
        initial_weight: f64,
        transfer: TransferFunction,
        loss: LossFunction,
    ) -> Result<&mut Self> {
        let layer = Layer::output(self.graph.len(), name, size, initial_weight, transfer, loss);
        self.push_layer(layer)
    }

    /// Sets every weight with `strategy`, drawing random weights from the thread RNG.
    pub fn initialize(&mut self, strategy: WeightInit) -> &mut Self {
        self.initialize_with_rng(strategy, &mut thread_rng())
    }

    pub fn initialize_with_rng<R>(&mut self, strategy: WeightInit, rng: &mut R) -> &mut Self
    where
        R: Rng + ?Sized,
    {
        self.weight_init = strategy;
        for l in 0..self.graph.len() {
            if let Some(weights) = self.graph.incoming_weights_mut(l) {
                strategy.apply(weights, rng);
            }
        }
        debug!(?strategy, "initialized weights");
        self
    }

    pub fn weight(&self, from: NeuronId, to: NeuronId) -> Option<f64> {
        self.graph.weight(from, to)
    }

    pub fn set_weight(&mut self, from: NeuronId, to: NeuronId, weight: f64) -> bool {
        self.graph.set_weight(from, to, weight)
    }

    /// Incoming weights of a layer, shaped `(previous.len() + 1, layer.len())`
    /// with the bias edges in the last row.
    pub fn incoming_weights(&self, layer: usize) -> Option<ArrayView2<f64>> {
        self.graph.incoming_weights(layer)
    }

    pub fn set_incoming_weights(&mut self, layer: usize, weights: ArrayView2<f64>) -> Result<()> {
        let mut current = self
            .graph
            .incoming_weights_mut(layer)
            .ok_or(Error::NoSuchLayer(layer))?;
        if current.dim() != weights.dim() {
            return Err(Error::DimensionMismatch {
                what: "weight matrix",
                expected: current.len(),
                actual: weights.len(),
            });
        }
        current.assign(&weights);
        Ok(())
    }

    /// `dE/dNet` of every neuron of `layer` as left by the last backward pass.
    pub fn error_deltas(&self, layer: usize) -> Option<ArrayView1<f64>> {
        self.scratch.error_deltas.get(layer).map(|d| d.view())
    }

    fn forward(&mut self, inputs: ArrayView1<f64>) -> Result<()> {
        self.graph.set_inputs(inputs)?;
        for l in 1..self.graph.len() {
            self.graph.forward_pass(l);
        }
        Ok(())
    }

    /// Runs the forward pass and returns the outputs of the last layer.
    pub fn predict(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        self.forward(ArrayView1::from(inputs))?;
        Ok(self
            .graph
            .last()
            .map(|layer| layer.outputs().to_vec())
            .unwrap_or_default())
    }

    fn loss_function(&self) -> Result<LossFunction> {
        let last = self.graph.last().ok_or(Error::EmptyTopology)?;
        last.loss().ok_or(Error::MissingOutputLayer)
    }

    fn check_targets(&self, targets: &[f64]) -> Result<()> {
        let expected = self.graph.last().map_or(0, Layer::len);
        if targets.len() != expected {
            return Err(Error::DimensionMismatch {
                what: "target vector",
                expected,
                actual: targets.len(),
            });
        }
        Ok(())
    }

    fn check_inputs(&self, inputs: &[f64]) -> Result<()> {
        let expected = self.graph.first().map_or(0, Layer::len);
        if inputs.len() != expected {
            return Err(Error::DimensionMismatch {
                what: "input vector",
                expected,
                actual: inputs.len(),
            });
        }
        Ok(())
    }

    /// Loss of the current prediction for `inputs` against `targets`, without training.
    pub fn loss(&mut self, inputs: &[f64], targets: &[f64]) -> Result<f64> {
        let loss = self.loss_function()?;
        self.check_targets(targets)?;
        let outputs = self.predict(inputs)?;
        Ok(loss.total(ArrayView1::from(targets), ArrayView1::from(&outputs)))
    }

    /// Average loss per example over a data set, without training.
    pub fn evaluate(&mut self, data: &DataSet) -> Result<f64> {
        let mut stats = EpochStats::default();
        for example in data {
            let loss = self.loss(&example.inputs, &example.targets)?;
            stats.record(loss, 0.0, example.targets.len());
        }
        Ok(stats.average_loss())
    }

    /// Trains on one example: a forward pass followed by one backward pass.
    ///
    /// Returns the loss of the prediction made before the weights were updated.
    pub fn train(&mut self, inputs: &[f64], targets: &[f64]) -> Result<f64> {
        let (loss, _) = self.train_example(inputs, targets)?;
        Ok(loss)
    }

    /// Returns the loss and the sum of `|dLoss/dOutput|` over the output neurons.
    fn train_example(&mut self, inputs: &[f64], targets: &[f64]) -> Result<(f64, f64)> {
        let loss = self.loss_function()?;
        self.check_targets(targets)?;
        self.forward(ArrayView1::from(inputs))?;

        let targets = ArrayView1::from(targets);
        let value = {
            let outputs = self.graph.last().map(Layer::outputs).unwrap_or_default();
            loss.total(targets, outputs.view())
        };
        self.back_propagate(loss, targets);
        let gradient = self
            .scratch
            .error_signals
            .last()
            .map_or(0.0, |signals| signals.iter().map(|g| g.abs()).sum());
        Ok((value, gradient))
    }

    /// Propagates the error from the output layer back to the first hidden
    /// layer. Each layer's incoming weights are updated before the layer in
    /// front of it is processed, so its error signal reads updated weights.
    fn back_propagate(&mut self, loss: LossFunction, targets: ArrayView1<f64>) {
        let optimizer = GradientDescent::new(self.learning_rate);
        let last = self.graph.len() - 1;

        for l in (1..=last).rev() {
            let layer = &self.graph.layers()[l];
            let transfer = match layer.transfer() {
                Some(transfer) => transfer,
                None => continue,
            };
            let outputs = layer.outputs();

            let signals = if l == last {
                Zip::from(&targets)
                    .and(&outputs)
                    .map_collect(|&t, &y| loss.derivative(t, y))
            } else {
                // Rows of the next layer's weights, minus its bias row.
                match self.graph.incoming_weights(l + 1) {
                    Some(outgoing) => outgoing
                        .slice(s![..layer.len(), ..])
                        .dot(&self.scratch.error_deltas[l + 1]),
                    None => Array1::zeros(layer.len()),
                }
            };
            let deltas = Zip::from(&outputs)
                .and(&signals)
                .map_collect(|&out, &signal| transfer.derivative(out) * signal);

            let inputs = self.graph.outputs_feeding(l - 1);
            if let Some(weights) = self.graph.incoming_weights_mut(l) {
                optimizer.update(weights, inputs.view(), deltas.view());
            }
            self.scratch.error_signals[l] = signals;
            self.scratch.error_deltas[l] = deltas;
        }
    }

    /// Trains over a data set in epochs until `policy` says to stop.
    ///
    /// Every example is checked against the layer sizes before any weight
    /// changes. Shuffled epochs draw their order from the thread RNG.
    pub fn train_dataset(
        &mut self,
        data: &DataSet,
        policy: &TrainingPolicy,
    ) -> Result<TrainingReport> {
        self.train_dataset_with_rng(data, policy, &mut thread_rng())
    }

    /// Same as [`Network::train_dataset`], with shuffled epochs drawn from `rng`.
    pub fn train_dataset_with_rng<R>(
        &mut self,
        data: &DataSet,
        policy: &TrainingPolicy,
        rng: &mut R,
    ) -> Result<TrainingReport>
    where
        R: Rng + ?Sized,
    {
        self.loss_function()?;
        for example in data {
            self.check_inputs(&example.inputs)?;
            self.check_targets(&example.targets)?;
        }

        let mut report = TrainingReport {
            epochs: 0,
            average_loss: 0.0,
            average_gradient: 0.0,
            converged: false,
        };
        if data.is_empty() {
            warn!("nothing to train on");
            return Ok(report);
        }

        let mut sampler = Sampler::new(data.len(), policy.shuffle, rng);
        let mut convergence = Convergence::new(*policy);

        while report.epochs < policy.max_epochs {
            let mut stats = EpochStats::default();
            for index in sampler.sample() {
                let example = &data.examples()[index];
                let (loss, gradient) = self.train_example(&example.inputs, &example.targets)?;
                stats.record(loss, gradient, example.targets.len());
            }

            report.epochs += 1;
            report.average_loss = stats.average_loss();
            report.average_gradient = stats.average_gradient();
            trace!(
                epoch = report.epochs,
                loss = report.average_loss,
                gradient = report.average_gradient,
                "finished epoch"
            );
            if convergence.observe(report.average_gradient) {
                report.converged = true;
                break;
            }
        }

        if !report.converged {
            warn!(epochs = report.epochs, "stopped at the epoch limit without converging");
        }
        info!(
            epochs = report.epochs,
            converged = report.converged,
            loss = report.average_loss,
            "training finished"
        );
        Ok(report)
    }
}
