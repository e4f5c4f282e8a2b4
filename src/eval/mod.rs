pub mod distributor;
pub mod evaluator;
pub mod segmentation;
pub mod selector;
