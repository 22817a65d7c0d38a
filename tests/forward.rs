//! End-to-end forward pass tests against hand-computed scores.
//!
//! The fixture model has identity weights everywhere, `eps = [0.5]`, and
//! running statistics that make its batch norm the identity map, so every
//! score below can be derived on paper from the fixture graphs.

mod common;

use ginfer::batch::GraphBatch;
use ginfer::data::{load_dataset_path, Dataset};
use ginfer::model::{GinConfig, GinModel, Pooling};
use ginfer::predict::PredictionOutput;
use ginfer::testing::assert_scores_eq_eps;

use common::{tiny_dataset_path, tiny_model_path};

const TOLERANCE: f32 = 1e-4;

fn load() -> (GinModel, Dataset) {
    // The fixture was trained (notionally) with a learnable epsilon.
    let config = GinConfig {
        learn_eps: true,
        ..GinConfig::default()
    };
    let model = GinModel::from_path(tiny_model_path(), config).expect("load model");
    let dataset = load_dataset_path(tiny_dataset_path(), false).expect("load dataset");
    (model, dataset)
}

fn with_config(config: GinConfig) -> GinModel {
    GinModel::from_path(tiny_model_path(), config).expect("load model")
}

fn forward(model: &GinModel, dataset: &Dataset) -> PredictionOutput {
    let batch = GraphBatch::new(&dataset.graphs, model.input_dim(), model.config())
        .expect("build batch");
    model.forward(&batch).expect("forward")
}

#[test]
fn sum_pooling_scores() {
    // Path graph: aggregation gives rows [1,0], [1,1], [1,0]; the eps
    // residual adds 1.5 * h0. Layer-0 readout pools the one-hot input to
    // [2, 1], layer-1 pools to [6, 2.5]; heads are identity, so the
    // summed scores are [8, 3.5]. Pair graph: [3.5, 3.5] by the same
    // arithmetic.
    let (model, dataset) = load();
    let out = forward(&model, &dataset);

    let expected = PredictionOutput::new(vec![8.0, 3.5, 3.5, 3.5], 2, 2);
    assert_scores_eq_eps(&out, &expected, TOLERANCE, "sum/sum scores");
}

#[test]
fn self_loops_replace_the_eps_residual() {
    // Without a learned epsilon the self term rides the adjacency
    // diagonal instead: path rows become [2,0], [2,1], [1,1] and the
    // pair's rows [1,1], [1,1].
    let model = with_config(GinConfig::default());
    let dataset = load_dataset_path(tiny_dataset_path(), false).unwrap();
    let out = forward(&model, &dataset);

    let expected = PredictionOutput::new(vec![7.0, 3.0, 3.0, 3.0], 2, 2);
    assert_scores_eq_eps(&out, &expected, TOLERANCE, "self-loop scores");
}

#[test]
fn max_neighbor_pooling() {
    // Max aggregation over {neighbors, self} for the path graph:
    // [1,0], [1,1], [1,1]. Layer-1 pools to [3, 2], layer-0 to [2, 1].
    let model = with_config(GinConfig {
        neighbor_pooling: Pooling::Max,
        ..GinConfig::default()
    });
    let dataset = load_dataset_path(tiny_dataset_path(), false).unwrap();

    let path = &dataset.graphs[..1];
    let batch = GraphBatch::new(path, model.input_dim(), model.config()).unwrap();
    let out = model.forward(&batch).unwrap();

    let expected = PredictionOutput::new(vec![5.0, 3.0], 1, 2);
    assert_scores_eq_eps(&out, &expected, TOLERANCE, "max pooling scores");
}

#[test]
fn average_neighbor_pooling() {
    // Neighbor sums divided by degree [1, 2, 1], then the eps residual:
    // [2.5,0], [2,0.5], [1,1.5]. Layer-1 pools to [5.5, 2].
    let model = with_config(GinConfig {
        neighbor_pooling: Pooling::Average,
        learn_eps: true,
        ..GinConfig::default()
    });
    let dataset = load_dataset_path(tiny_dataset_path(), false).unwrap();

    let path = &dataset.graphs[..1];
    let batch = GraphBatch::new(path, model.input_dim(), model.config()).unwrap();
    let out = model.forward(&batch).unwrap();

    let expected = PredictionOutput::new(vec![7.5, 3.0], 1, 2);
    assert_scores_eq_eps(&out, &expected, TOLERANCE, "average pooling scores");
}

#[test]
fn average_graph_pooling_divides_by_node_count() {
    // Same node representations as the sum/sum case, each pooled sum
    // divided by 3 nodes: [2/3, 1/3] + [2, 5/6].
    let model = with_config(GinConfig {
        graph_pooling: Pooling::Average,
        learn_eps: true,
        ..GinConfig::default()
    });
    let dataset = load_dataset_path(tiny_dataset_path(), false).unwrap();

    let path = &dataset.graphs[..1];
    let batch = GraphBatch::new(path, model.input_dim(), model.config()).unwrap();
    let out = model.forward(&batch).unwrap();

    let expected = PredictionOutput::new(vec![8.0 / 3.0, 7.0 / 6.0], 1, 2);
    assert_scores_eq_eps(&out, &expected, TOLERANCE, "average graph pooling scores");
}

#[test]
fn predict_classifies_in_input_order() {
    let (model, dataset) = load();
    // Path graph scores [8, 3.5] -> class 0; pair graph ties at
    // [3.5, 3.5] and resolves to class 0.
    let classes = model.predict(&dataset.graphs, 32).unwrap();
    assert_eq!(classes, vec![0, 0]);
}

#[test]
fn par_predict_matches_predict() {
    let (model, dataset) = load();
    for batch_size in [1, 2, 5] {
        let sequential = model.predict(&dataset.graphs, batch_size).unwrap();
        let parallel = model.par_predict(&dataset.graphs, batch_size).unwrap();
        assert_eq!(sequential, parallel, "batch size {batch_size}");
    }
}

#[test]
fn evaluate_reports_accuracy() {
    let (model, dataset) = load();
    // Labels are [0, 1] but both graphs classify as 0.
    let accuracy = model.evaluate(&dataset.graphs, 2).unwrap();
    assert!((accuracy - 0.5).abs() < 1e-6);
}

#[test]
fn forward_is_deterministic() {
    let (model, dataset) = load();
    let a = forward(&model, &dataset);
    let b = forward(&model, &dataset);
    assert_eq!(a.as_slice(), b.as_slice());
}
