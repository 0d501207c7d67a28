//! Conversions between observations and numeric backends.
//! Each backend sits behind its own feature flag; the environment itself always
//! returns plain `[f32; OBS_DIM]` arrays.

#[cfg(feature = "ndarray")]
pub mod ndarray_impl {
    use ndarray::{Array1, Array2};

    use crate::core::{GymError, Result};
    use crate::envs::cityflow::{Observation, LANE_COUNT, OBS_DIM};

    /// Flat 16-element view of an observation.
    pub fn observation_to_ndarray(obs: &Observation) -> Array1<f32> {
        Array1::from_vec(obs.to_vec())
    }

    /// Observation reshaped to one row per lane: `[vehicles, waiting]`.
    pub fn observation_to_lane_matrix(obs: &Observation) -> Array2<f32> {
        Array2::from_shape_fn((LANE_COUNT, 2), |(lane, col)| obs[2 * lane + col])
    }

    pub fn observation_from_ndarray(arr: &Array1<f32>) -> Result<Observation> {
        arr.to_vec().try_into().map_err(|v: Vec<f32>| {
            GymError::InvalidObservation(format!("expected {OBS_DIM} values, got {}", v.len()))
        })
    }

}

#[cfg(feature = "nalgebra")]
pub mod nalgebra_impl {
    use nalgebra::SVector;

    use crate::envs::cityflow::{Observation, OBS_DIM};

    pub fn observation_to_nalgebra(obs: &Observation) -> SVector<f32, OBS_DIM> {
        SVector::<f32, OBS_DIM>::from_row_slice(obs)
    }

    pub fn observation_from_nalgebra(v: &SVector<f32, OBS_DIM>) -> Observation {
        let mut out = [0.0f32; OBS_DIM];
        out.copy_from_slice(v.as_slice());
        out
    }

}
