//! QR decomposition by modified Gram-Schmidt.
//!
//! Columns of the input are processed left to right. Each one is copied,
//! has its components along the already finished columns of `Q` projected
//! out, and is then normalised into the next column of `Q`. The projection
//! coefficients land above the diagonal of `R` and the residual norms on it.

use crate::error::{LResult, LinalgError};
use crate::matrix::Matrix;
use crate::storage::Storage;
use crate::vector::Vector;

/// `Q` (`n_row x n_col`, orthonormal columns) and `R` (`n_col x n_col`,
/// upper triangular) with `Q * R == M`.
#[derive(Debug)]
#[must_use = "a decomposition must be released with `free`"]
pub struct QrDecomp {
    q: Matrix,
    r: Matrix,
}

impl QrDecomp {
    pub fn q(&self) -> &Matrix {
        &self.q
    }

    pub fn r(&self) -> &Matrix {
        &self.r
    }

    pub fn into_parts(self) -> (Matrix, Matrix) {
        (self.q, self.r)
    }

    /// Releases both factors.
    pub fn free(self, storage: &mut Storage) -> LResult<()> {
        let q = self.q.free(storage);
        let r = self.r.free(storage);
        q.and(r)
    }
}

pub fn qr_decomposition(storage: &mut Storage, m: &Matrix) -> LResult<QrDecomp> {
    let q = Matrix::new(storage, m.n_row(), m.n_col())?;
    let r = Matrix::zeros(storage, m.n_col(), m.n_col())?;
    match gram_schmidt(storage, m, &q, &r) {
        Ok(()) => Ok(QrDecomp { q, r }),
        Err(e) => {
            q.free(storage)?;
            r.free(storage)?;
            Err(e)
        }
    }
}

fn gram_schmidt(storage: &mut Storage, m: &Matrix, q: &Matrix, r: &Matrix) -> LResult<()> {
    for i in 0..m.n_col() {
        let column = m.column_copy(storage, i)?;
        let res = orthogonalize(storage, q, r, &column, i);
        column.free(storage)?;
        res?;
    }
    Ok(())
}

fn orthogonalize(
    storage: &mut Storage,
    q: &Matrix,
    r: &Matrix,
    column: &Vector,
    i: usize,
) -> LResult<()> {
    let scale = column.norm(storage)?;
    for j in 0..i {
        let unit = q.column_copy(storage, j)?;
        let res = unit.dot_product(storage, column).and_then(|dot| {
            unit.scalar_multiply_into(storage, dot)?;
            column.subtract_into(storage, &unit)?;
            r.set(storage, j, i, dot)
        });
        unit.free(storage)?;
        res?;
    }

    let norm = column.norm(storage)?;
    if norm == 0.0 || norm <= storage.config().rank_tolerance * scale {
        log::warn!(
            "column {} is linearly dependent (residual {}, original {})",
            i,
            norm,
            scale
        );
        return Err(LinalgError::Degenerate {
            column: Some(i),
            norm,
        });
    }
    r.set(storage, i, i, norm)?;
    column.normalize_into(storage).map_err(|e| match e {
        LinalgError::Degenerate { norm, .. } => LinalgError::Degenerate {
            column: Some(i),
            norm,
        },
        e => e,
    })?;
    q.copy_vector_into_column(storage, column, i)
}
