use crate::error::LResult;
use crate::matrix::Matrix;
use crate::qr::{qr_decomposition, QrDecomp};
use crate::storage::Storage;

/// A backend able to run the heavy kernels. Implementations must return
/// ordinary owned matrices living in the caller's `Storage`.
pub trait Accelerator {
    fn name(&self) -> &'static str;

    fn multiply(&self, storage: &mut Storage, left: &Matrix, right: &Matrix) -> LResult<Matrix>;

    fn qr(&self, storage: &mut Storage, m: &Matrix) -> LResult<QrDecomp>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CpuAccelerator;

impl Accelerator for CpuAccelerator {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn multiply(&self, storage: &mut Storage, left: &Matrix, right: &Matrix) -> LResult<Matrix> {
        left.multiply(storage, right)
    }

    fn qr(&self, storage: &mut Storage, m: &Matrix) -> LResult<QrDecomp> {
        qr_decomposition(storage, m)
    }
}
