// ============================================================
// Layer 5 — Residual Connection
// ============================================================
// y = T(x) + x
//
// The sum is only defined when T preserves the shape of its
// input; anything else is reported as a DimensionMismatch
// instead of being broadcast.

use burn::prelude::*;

use crate::domain::error::ModelError;

/// Apply `transform` to `x` and add `x` back onto the result.
pub fn residual<B, const D: usize, F>(x: Tensor<B, D>, transform: F) -> Result<Tensor<B, D>, ModelError>
where
    B: Backend,
    F: FnOnce(Tensor<B, D>) -> Tensor<B, D>,
{
    let input_dims = x.dims();
    let out        = transform(x.clone());
    let out_dims   = out.dims();

    if out_dims != input_dims {
        return Err(ModelError::DimensionMismatch {
            context:  "residual connection",
            expected: input_dims.to_vec(),
            actual:   out_dims.to_vec(),
        });
    }

    Ok(out + x)
}
