use burn::prelude::*;
use burn::tensor::TensorData;

use crate::error::TrainingError;

/// Stack equal-length rows into a `[rows, dim]` tensor.
pub fn encode_rows<B: Backend>(rows: &[&[f32]], device: &B::Device) -> Tensor<B, 2> {
    let dim = rows.first().map_or(0, |r| r.len());
    let mut flat = Vec::with_capacity(rows.len() * dim);
    for row in rows {
        assert_eq!(row.len(), dim, "embedding rows must share one dimension");
        flat.extend_from_slice(row);
    }
    Tensor::<B, 1>::from_data(TensorData::from(flat.as_slice()), device)
        .reshape([rows.len() as i32, dim as i32])
}

/// Repeat one user state `n` times as a `[n, dim]` tensor.
pub fn encode_repeated<B: Backend>(state: &[f32], n: usize, device: &B::Device) -> Tensor<B, 2> {
    let mut flat = Vec::with_capacity(n * state.len());
    for _ in 0..n {
        flat.extend_from_slice(state);
    }
    Tensor::<B, 1>::from_data(TensorData::from(flat.as_slice()), device)
        .reshape([n as i32, state.len() as i32])
}

/// Encode scalars as a `[n, 1]` column.
pub fn encode_column<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 1>::from_data(TensorData::from(values), device)
        .reshape([values.len() as i32, 1])
}

/// Pull tensor contents back to the host.
pub fn tensor_to_vec<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
) -> Result<Vec<f32>, TrainingError> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| TrainingError::Tensor(format!("{e:?}")))
}
