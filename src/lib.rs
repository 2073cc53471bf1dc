//! Dense `f64` matrices and vectors over a reference-counted storage arena,
//! with a modified Gram-Schmidt QR decomposition.
//!
//! ```
//! use lineal::{mat, qr_decomposition, Storage};
//!
//! let mut s = Storage::new();
//! let m = mat!(&mut s; [1.0, 1.0], [0.0, 1.0], [1.0, 0.0]).unwrap();
//! let qr = qr_decomposition(&mut s, &m).unwrap();
//! let back = qr.q().multiply(&mut s, qr.r()).unwrap();
//! assert!(back.equal(&s, &m, 1e-12).unwrap());
//!
//! back.free(&mut s).unwrap();
//! qr.free(&mut s).unwrap();
//! m.free(&mut s).unwrap();
//! ```

mod config;
mod device;
mod error;
mod macros;
mod matrix;
mod qr;
mod shape;
mod storage;
mod vector;

pub use config::Config;
pub use device::{Accelerator, CpuAccelerator};
pub use error::{LResult, LinalgError, ObjectKind};
pub use matrix::{Matrix, MatrixDisplay};
pub use qr::{qr_decomposition, QrDecomp};
pub use shape::{Axis, Dim};
pub use storage::{
    report_fatal, BufferId, FatalKind, Handle, Init, LinalgObj, Ownership, Storage,
};
pub use vector::{Vector, VectorDisplay};
