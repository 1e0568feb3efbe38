use approx::assert_abs_diff_eq;
use ndarray::arr2;
use neurograph::{
    DataSet, LossFunction, Network, TrainingPolicy, TransferFunction, WeightInit,
};

fn xor() -> DataSet {
    DataSet::from(vec![
        (vec![0.0, 0.0], vec![0.0]),
        (vec![0.0, 1.0], vec![1.0]),
        (vec![1.0, 0.0], vec![1.0]),
        (vec![1.0, 1.0], vec![0.0]),
    ])
}

// 2-2-1 sigmoid network. The starting weights are fixed so that the run is
// reproducible and does not start in the symmetric local minimum.
fn xor_network() -> Network {
    let mut network = Network::new().with_learning_rate(1.0);
    network
        .input(2, "I")
        .unwrap()
        .hidden(2, "H", 0.0, TransferFunction::Sigmoid)
        .unwrap()
        .output(
            1,
            "O",
            0.0,
            TransferFunction::Sigmoid,
            LossFunction::MeanSquaredError,
        )
        .unwrap();
    network
        .set_incoming_weights(1, arr2(&[[-0.75, -0.7], [0.81, 0.61], [-0.71, 0.65]]).view())
        .unwrap();
    network
        .set_incoming_weights(2, arr2(&[[0.96], [0.31], [-0.3]]).view())
        .unwrap();
    network
}

#[test]
fn learns_xor() {
    let mut network = xor_network();
    let data = xor();
    let policy = TrainingPolicy::default().max_epochs(5000);
    let report = network.train_dataset(&data, &policy).unwrap();
    assert!(report.epochs <= 5000);

    for example in data.iter() {
        let output = network.predict(&example.inputs).unwrap();
        assert_abs_diff_eq!(example.targets[0], output[0], epsilon = 0.1);
    }
}

#[test]
fn xor_stops_early_under_a_loose_tolerance() {
    let mut network = xor_network();
    let policy = TrainingPolicy::default()
        .max_epochs(5000)
        .tolerance(0.1)
        .patience(3);
    let report = network.train_dataset(&xor(), &policy).unwrap();
    assert!(report.converged);
    assert!(report.epochs < 5000);
    assert!(report.average_gradient < 0.1);
}

#[test]
fn single_step_reduces_loss() {
    let mut network = Network::new().with_learning_rate(0.5);
    network
        .input(1, "I")
        .unwrap()
        .output(
            1,
            "O",
            0.5,
            TransferFunction::Sigmoid,
            LossFunction::MeanSquaredError,
        )
        .unwrap();

    let error = |network: &mut Network| (1.0 - network.predict(&[1.0]).unwrap()[0]).powi(2);
    let before = error(&mut network);
    network.train(&[1.0], &[1.0]).unwrap();
    let after = error(&mut network);
    assert!(after < before, "{} should be below {}", after, before);
}

#[test]
fn softmax_classifier_separates_two_classes() {
    let mut network = Network::new().with_learning_rate(0.5);
    network
        .input(2, "I")
        .unwrap()
        .hidden(3, "H", 0.0, TransferFunction::Sigmoid)
        .unwrap()
        .output(
            2,
            "O",
            0.0,
            TransferFunction::Softmax,
            LossFunction::CrossEntropy,
        )
        .unwrap();
    network
        .set_incoming_weights(
            1,
            arr2(&[[0.2, -0.3, 0.4], [-0.1, 0.5, 0.3], [0.1, 0.1, -0.2]]).view(),
        )
        .unwrap();
    network
        .set_incoming_weights(
            2,
            arr2(&[[0.3, -0.2], [-0.4, 0.1], [0.2, 0.5], [0.1, -0.1]]).view(),
        )
        .unwrap();

    let data = DataSet::from(vec![
        (vec![1.0, 0.0], vec![1.0, 0.0]),
        (vec![0.0, 1.0], vec![0.0, 1.0]),
    ]);
    let before = network.evaluate(&data).unwrap();
    let policy = TrainingPolicy::default().max_epochs(300).tolerance(0.0);
    let report = network.train_dataset(&data, &policy).unwrap();
    assert_eq!(300, report.epochs);
    let after = network.evaluate(&data).unwrap();
    assert!(after < 0.2 && after < before);

    let first = network.predict(&[1.0, 0.0]).unwrap();
    let second = network.predict(&[0.0, 1.0]).unwrap();
    assert!(first[0] > first[1]);
    assert!(second[1] > second[0]);
    assert_abs_diff_eq!(1.0, first.iter().sum::<f64>(), epsilon = 1e-12);
}

#[test]
fn random_initialization_keeps_predictions_finite() {
    let mut network = Network::new();
    network
        .input(9, "I")
        .unwrap()
        .hidden(12, "H1", 0.1, TransferFunction::Relu)
        .unwrap()
        .hidden(12, "H2", 0.1, TransferFunction::Tanh)
        .unwrap()
        .output(
            9,
            "O",
            0.1,
            TransferFunction::Softmax,
            LossFunction::CrossEntropy,
        )
        .unwrap();
    network.initialize(WeightInit::Random);

    let board = [1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0];
    let mut target = vec![0.0; 9];
    target[8] = 1.0;
    for _ in 0..50 {
        network.train(&board, &target).unwrap();
    }
    let outputs = network.predict(&board).unwrap();
    assert!(outputs.iter().all(|v| v.is_finite()));
    assert_abs_diff_eq!(1.0, outputs.iter().sum::<f64>(), epsilon = 1e-9);
}
