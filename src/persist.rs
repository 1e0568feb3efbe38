//! Binary network artifacts.
//!
//! The format is private to this crate: a bincode-encoded, versioned record of
//! the layer list, every edge weight, the learning rate and the weight
//! initialization strategy. Transient neuron values are not stored.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::activation::TransferFunction;
use crate::error::{Error, Result};
use crate::init::WeightInit;
use crate::layer::{Layer, LayerKind};
use crate::loss::LossFunction;
use crate::network::Network;

const MAGIC: [u8; 4] = *b"NGRF";
const FORMAT_VERSION: u32 = 1;

/// Largest layer size accepted without weights that confirm it, which only
/// happens for a network made of a lone input layer.
const MAX_UNCONNECTED_LAYER_SIZE: usize = 1 << 20;

/// File extension of saved networks.
pub const ARTIFACT_EXTENSION: &str = "ann";

#[derive(Debug, Serialize, Deserialize)]
enum LayerSpec {
    Input {
        name: String,
        size: usize,
    },
    Hidden {
        name: String,
        size: usize,
        initial_weight: f64,
        transfer: TransferFunction,
    },
    Output {
        name: String,
        size: usize,
        initial_weight: f64,
        transfer: TransferFunction,
        loss: LossFunction,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Artifact {
    magic: [u8; 4],
    version: u32,
    learning_rate: f64,
    weight_init: WeightInit,
    layers: Vec<LayerSpec>,
    /// Row-major incoming weights per layer.
    weights: Vec<Vec<f64>>,
}

impl LayerSpec {
    fn size(&self) -> usize {
        match self {
            Self::Input { size, .. } | Self::Hidden { size, .. } | Self::Output { size, .. } => {
                *size
            }
        }
    }
}

fn layer_spec(layer: &Layer) -> Result<LayerSpec> {
    let name = layer.name().to_string();
    let size = layer.len();
    let spec = match (layer.kind(), layer.transfer(), layer.loss()) {
        (LayerKind::Input, _, _) => LayerSpec::Input { name, size },
        (LayerKind::Hidden, Some(transfer), _) => LayerSpec::Hidden {
            name,
            size,
            initial_weight: layer.initial_weight(),
            transfer,
        },
        (LayerKind::Output, Some(transfer), Some(loss)) => LayerSpec::Output {
            name,
            size,
            initial_weight: layer.initial_weight(),
            transfer,
            loss,
        },
        _ => return Err(Error::CorruptArtifact(format!("layer `{}` is incomplete", name))),
    };
    Ok(spec)
}

impl Artifact {
    fn capture(network: &Network) -> Result<Self> {
        let layers = network
            .layers()
            .iter()
            .map(layer_spec)
            .collect::<Result<Vec<_>>>()?;
        let weights = (0..layers.len())
            .map(|l| {
                network
                    .incoming_weights(l)
                    .map(|w| w.iter().copied().collect::<Vec<f64>>())
                    .unwrap_or_default()
            })
            .collect();
        Ok(Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            learning_rate: network.learning_rate(),
            weight_init: network.weight_init(),
            layers,
            weights,
        })
    }

    fn restore(self) -> Result<Network> {
        if self.magic != MAGIC {
            return Err(Error::CorruptArtifact("not a network artifact".to_string()));
        }
        if self.version != FORMAT_VERSION {
            return Err(Error::CorruptArtifact(format!(
                "unsupported format version {}",
                self.version
            )));
        }
        if self.weights.len() != self.layers.len() {
            return Err(Error::CorruptArtifact(format!(
                "{} weight matrices for {} layers",
                self.weights.len(),
                self.layers.len()
            )));
        }

        self.check_sizes()?;

        let mut network = Network::new().with_learning_rate(self.learning_rate);
        network.set_weight_init(self.weight_init);
        // Rebuilding goes through the same checks as a hand-built network,
        // so a malformed topology surfaces as an error here.
        for spec in self.layers {
            let appended = match spec {
                LayerSpec::Input { name, size } => network.input(size, &name),
                LayerSpec::Hidden {
                    name,
                    size,
                    initial_weight,
                    transfer,
                } => network.hidden(size, &name, initial_weight, transfer),
                LayerSpec::Output {
                    name,
                    size,
                    initial_weight,
                    transfer,
                    loss,
                } => network.output(size, &name, initial_weight, transfer, loss),
            };
            appended.map_err(|err| Error::CorruptArtifact(err.to_string()))?;
        }

        for (l, values) in self.weights.into_iter().enumerate() {
            let shape = network
                .incoming_weights(l)
                .map(|w| w.dim())
                .unwrap_or_default();
            let weights = Array2::from_shape_vec(shape, values)
                .map_err(|err| Error::CorruptArtifact(format!("layer {}: {}", l, err)))?;
            network.set_incoming_weights(l, weights.view())?;
        }
        Ok(network)
    }

    /// Checks every layer size against the stored weight counts before any
    /// layer is allocated. Each count is `(previous + 1) * size`, so a size
    /// that passes is bounded by data that was actually decoded.
    fn check_sizes(&self) -> Result<()> {
        let corrupt = |l: usize, reason: &str| {
            Error::CorruptArtifact(format!("layer {}: {}", l, reason))
        };
        if let [lone] = self.layers.as_slice() {
            if lone.size() > MAX_UNCONNECTED_LAYER_SIZE {
                return Err(corrupt(0, "size is out of range"));
            }
        }

        let mut previous: Option<usize> = None;
        for (l, (spec, weights)) in self.layers.iter().zip(&self.weights).enumerate() {
            let size = spec.size();
            if size == 0 {
                return Err(corrupt(l, "layer is empty"));
            }
            let expected = match previous {
                None => Some(0),
                Some(previous) => previous
                    .checked_add(1)
                    .and_then(|rows| rows.checked_mul(size)),
            };
            if expected != Some(weights.len()) {
                return Err(corrupt(l, "weight count does not match the layer sizes"));
            }
            previous = Some(size);
        }
        Ok(())
    }
}

impl Network {
    /// Encodes the network into the artifact format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&Artifact::capture(self)?)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let artifact: Artifact = bincode::deserialize(bytes)?;
        artifact.restore()
    }

    /// Writes the artifact to `path`.
    ///
    /// The bytes go to a temporary file in the same directory which then
    /// replaces `path`, so an existing file is never left half written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|err| Error::Io(err.error))?;
        info!(path = %path.display(), layers = self.layers().len(), "saved network");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let network = Self::from_bytes(&bytes)?;
        debug!(path = %path.display(), layers = network.layers().len(), "loaded network");
        Ok(network)
    }

    /// File name built from the layer sizes, e.g. `net-18-15-9.ann`.
    pub fn artifact_file_name(&self) -> String {
        let sizes = self
            .layers()
            .iter()
            .map(|layer| layer.len().to_string())
            .collect::<Vec<_>>();
        if sizes.is_empty() {
            format!("net.{}", ARTIFACT_EXTENSION)
        } else {
            format!("net-{}.{}", sizes.join("-"), ARTIFACT_EXTENSION)
        }
    }

    /// Saves under [`Network::artifact_file_name`] inside `dir` and returns the path.
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.artifact_file_name());
        self.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray_rand::rand::{rngs::StdRng, SeedableRng};

    fn network() -> Network {
        let mut network = Network::new().with_learning_rate(0.2);
        network
            .input(3, "I")
            .unwrap()
            .hidden(4, "H", 0.1, TransferFunction::LeakyRelu)
            .unwrap()
            .output(
                2,
                "O",
                0.1,
                TransferFunction::Softmax,
                LossFunction::CrossEntropy,
            )
            .unwrap();
        network.initialize_with_rng(WeightInit::Random, &mut StdRng::seed_from_u64(11));
        network
    }

    #[test]
    fn bytes_round_trip() {
        let mut network = network();
        let mut restored = Network::from_bytes(&network.to_bytes().unwrap()).unwrap();
        assert_eq!(network, restored);
        assert_eq!(WeightInit::Random, restored.weight_init());
        assert_eq!(0.2, restored.learning_rate());

        let x = [0.5, -0.25, 1.0];
        assert_eq!(network.predict(&x).unwrap(), restored.predict(&x).unwrap());
    }

    #[test]
    fn garbage_is_corrupt() {
        assert!(matches!(
            Network::from_bytes(b"definitely not a network"),
            Err(Error::CorruptArtifact(_))
        ));
        assert!(matches!(
            Network::from_bytes(&[]),
            Err(Error::CorruptArtifact(_))
        ));
    }

    #[test]
    fn truncated_artifact_is_corrupt() {
        let bytes = network().to_bytes().unwrap();
        assert!(matches!(
            Network::from_bytes(&bytes[..bytes.len() - 8]),
            Err(Error::CorruptArtifact(_))
        ));
    }

    #[test]
    fn mismatched_weights_are_corrupt() {
        let mut artifact = Artifact::capture(&network()).unwrap();
        artifact.weights[1].pop();
        assert!(matches!(artifact.restore(), Err(Error::CorruptArtifact(_))));

        let mut artifact = Artifact::capture(&network()).unwrap();
        artifact.magic = *b"NGRX";
        assert!(matches!(artifact.restore(), Err(Error::CorruptArtifact(_))));
    }

    fn hidden(size: usize) -> LayerSpec {
        LayerSpec::Hidden {
            name: "H".to_string(),
            size,
            initial_weight: 0.1,
            transfer: TransferFunction::Sigmoid,
        }
    }

    #[test]
    fn huge_layer_size_is_corrupt() {
        let artifact = Artifact {
            magic: MAGIC,
            version: FORMAT_VERSION,
            learning_rate: 0.1,
            weight_init: WeightInit::Default,
            layers: vec![
                LayerSpec::Input {
                    name: "I".to_string(),
                    size: 2,
                },
                hidden(usize::MAX / 2),
            ],
            weights: vec![vec![], vec![]],
        };
        let bytes = bincode::serialize(&artifact).unwrap();
        assert!(matches!(
            Network::from_bytes(&bytes),
            Err(Error::CorruptArtifact(_))
        ));

        // (usize::MAX / 2 + 1) * 4 overflows.
        let mut artifact = Artifact::capture(&network()).unwrap();
        artifact.layers[0] = LayerSpec::Input {
            name: "I".to_string(),
            size: usize::MAX / 2,
        };
        assert!(matches!(artifact.restore(), Err(Error::CorruptArtifact(_))));

        let lone = Artifact {
            magic: MAGIC,
            version: FORMAT_VERSION,
            learning_rate: 0.1,
            weight_init: WeightInit::Default,
            layers: vec![LayerSpec::Input {
                name: "I".to_string(),
                size: usize::MAX,
            }],
            weights: vec![vec![]],
        };
        assert!(matches!(lone.restore(), Err(Error::CorruptArtifact(_))));
    }

    #[test]
    fn zero_sized_successor_is_corrupt() {
        let mut artifact = Artifact::capture(&network()).unwrap();
        artifact.layers[0] = LayerSpec::Input {
            name: "I".to_string(),
            size: usize::MAX / 2,
        };
        artifact.layers[1] = hidden(0);
        artifact.weights[1].clear();
        assert!(matches!(artifact.restore(), Err(Error::CorruptArtifact(_))));
    }

    #[test]
    fn input_only_network_round_trips() {
        let mut network = Network::new();
        network.input(4, "I").unwrap();
        assert_eq!(network, Network::from_bytes(&network.to_bytes().unwrap()).unwrap());
    }

    #[test]
    fn file_name_from_sizes() {
        assert_eq!("net-3-4-2.ann", network().artifact_file_name());
        assert_eq!("net.ann", Network::new().artifact_file_name());
    }
}
