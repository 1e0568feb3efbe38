use std::fs;

use ndarray_rand::rand::{rngs::StdRng, SeedableRng};
use neurograph::{Error, LossFunction, Network, TransferFunction, WeightInit};
use tempfile::tempdir;

fn trained_network() -> Network {
    let mut network = Network::new().with_learning_rate(0.1);
    network
        .input(9, "I")
        .unwrap()
        .hidden(6, "H", 0.1, TransferFunction::Sigmoid)
        .unwrap()
        .output(
            9,
            "O",
            0.1,
            TransferFunction::Softmax,
            LossFunction::CrossEntropy,
        )
        .unwrap();
    network.initialize_with_rng(WeightInit::Random, &mut StdRng::seed_from_u64(2024));

    let board = [1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0];
    let mut target = vec![0.0; 9];
    target[2] = 1.0;
    for _ in 0..20 {
        network.train(&board, &target).unwrap();
    }
    network
}

fn samples() -> Vec<[f64; 9]> {
    vec![
        [0.0; 9],
        [1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0],
        [-1.0, 1.0, -1.0, 1.0, 0.0, 0.0, 1.0, 0.0, -1.0],
        [0.01, 0.01, 1.0, 0.01, -1.0, 0.01, 0.01, 0.01, 0.01],
    ]
}

#[test]
fn save_then_load_predicts_the_same() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.ann");

    let mut network = trained_network();
    network.save(&path).unwrap();
    let mut loaded = Network::load(&path).unwrap();

    assert_eq!(network, loaded);
    for x in samples() {
        assert_eq!(network.predict(&x).unwrap(), loaded.predict(&x).unwrap());
    }
}

#[test]
fn save_to_dir_uses_layer_sizes() {
    let dir = tempdir().unwrap();
    let network = trained_network();
    let path = network.save_to_dir(dir.path()).unwrap();
    assert_eq!(Some("net-9-6-9.ann"), path.file_name().and_then(|n| n.to_str()));
    assert_eq!(network, Network::load(&path).unwrap());
}

#[test]
fn failed_save_keeps_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.ann");
    let network = trained_network();
    network.save(&path).unwrap();
    let original = fs::read(&path).unwrap();

    // Saving into a directory that does not exist fails without touching `path`.
    let missing = dir.path().join("missing").join("model.ann");
    assert!(matches!(network.save(&missing), Err(Error::Io(_))));
    assert_eq!(original, fs::read(&path).unwrap());
}

#[test]
fn overwrite_replaces_the_artifact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.ann");
    let mut first = trained_network();
    first.save(&path).unwrap();

    first.train(&[0.0; 9], &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
    first.save(&path).unwrap();
    assert_eq!(first, Network::load(&path).unwrap());
}

#[test]
fn load_errors() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        Network::load(dir.path().join("absent.ann")),
        Err(Error::Io(_))
    ));

    let garbage = dir.path().join("garbage.ann");
    fs::write(&garbage, b"\x00\x01\x02 not a network").unwrap();
    assert!(matches!(
        Network::load(&garbage),
        Err(Error::CorruptArtifact(_))
    ));
}
