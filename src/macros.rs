/// Builds a [`Matrix`](crate::Matrix) from rows: `mat!(&mut storage; [1.0, 2.0], [3.0, 4.0])`.
#[macro_export]
macro_rules! mat {
    ($s:expr; $([$($x:expr),* $(,)*]),+ $(,)*) => {{
        let rows: &[&[f64]] = &[$(&[$($x as f64),*][..]),+];
        $crate::Matrix::from_rows($s, rows)
    }};
}

/// Builds a [`Vector`](crate::Vector): `vector!(&mut storage; 1.0, 2.0)`.
#[macro_export]
macro_rules! vector {
    ($s:expr; $($x:expr),* $(,)*) => {{
        $crate::Vector::from_slice($s, &[$($x as f64),*])
    }};
}
