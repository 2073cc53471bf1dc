use lineal::{mat, qr_decomposition, vector, LinalgError, LinalgObj, Matrix, Storage};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random(s: &mut Storage, rng: &mut fastrand::Rng, n_row: usize, n_col: usize) -> Matrix {
    let data: Vec<f64> = (0..n_row * n_col).map(|_| rng.f64() * 2.0 - 1.0).collect();
    Matrix::from_array(s, &data, n_row, n_col).unwrap()
}

#[test]
fn multiply_is_associative() {
    init();
    let mut s = Storage::new();
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..10 {
        let (m, n, p, q) = (
            rng.usize(1..6),
            rng.usize(1..6),
            rng.usize(1..6),
            rng.usize(1..6),
        );
        let a = random(&mut s, &mut rng, m, n);
        let b = random(&mut s, &mut rng, n, p);
        let c = random(&mut s, &mut rng, p, q);
        let ab = a.multiply(&mut s, &b).unwrap();
        let ab_c = ab.multiply(&mut s, &c).unwrap();
        let bc = b.multiply(&mut s, &c).unwrap();
        let a_bc = a.multiply(&mut s, &bc).unwrap();
        assert!(ab_c.equal(&s, &a_bc, 1e-12).unwrap());
        for x in [a, b, c, ab, ab_c, bc, a_bc] {
            x.free(&mut s).unwrap();
        }
    }
    assert_eq!(s.live_buffers(), 0);
}

#[test]
fn multiply_by_identity_is_exact() {
    init();
    let mut s = Storage::new();
    let mut rng = fastrand::Rng::with_seed(11);
    for n in 1..6 {
        let m = random(&mut s, &mut rng, n, n);
        let id = Matrix::identity(&mut s, n).unwrap();
        let p = m.multiply(&mut s, &id).unwrap();
        assert!(p.equal(&s, &m, 0.0).unwrap());
        for x in [m, id, p] {
            x.free(&mut s).unwrap();
        }
    }
}

#[test]
fn double_transpose_is_exact() {
    init();
    let mut s = Storage::new();
    let mut rng = fastrand::Rng::with_seed(3);
    for _ in 0..10 {
        let (n_row, n_col) = (rng.usize(1..7), rng.usize(1..7));
        let m = random(&mut s, &mut rng, n_row, n_col);
        let t = m.transpose(&mut s).unwrap();
        let tt = t.transpose(&mut s).unwrap();
        assert!(tt.equal(&s, &m, 0.0).unwrap());
        for x in [m, t, tt] {
            x.free(&mut s).unwrap();
        }
    }
}

#[test]
fn qr_reconstructs_full_rank_input() {
    init();
    let mut s = Storage::new();
    let mut rng = fastrand::Rng::with_seed(42);
    for _ in 0..10 {
        let n_col = rng.usize(1..5);
        let n_row = n_col + rng.usize(0..3);
        let m = random(&mut s, &mut rng, n_row, n_col);
        let qr = qr_decomposition(&mut s, &m).unwrap();

        let back = qr.q().multiply(&mut s, qr.r()).unwrap();
        assert!(back.equal(&s, &m, 1e-9).unwrap());

        let qt = qr.q().transpose(&mut s).unwrap();
        let qtq = qt.multiply(&mut s, qr.q()).unwrap();
        let id = Matrix::identity(&mut s, n_col).unwrap();
        assert!(qtq.equal(&s, &id, 1e-9).unwrap());

        assert!(qr.r().is_upper_triangular(&s).unwrap());

        for x in [back, qt, qtq, id, m] {
            x.free(&mut s).unwrap();
        }
        qr.free(&mut s).unwrap();
    }
    assert_eq!(s.live_buffers(), 0);
}

#[test]
fn qr_of_example_matrix() {
    init();
    let mut s = Storage::new();
    let m = Matrix::from_array(&mut s, &[1.0, 1.0, 0.0, 1.0, 1.0, 0.0], 3, 2).unwrap();
    let qr = qr_decomposition(&mut s, &m).unwrap();
    let r = qr.r();
    assert!((r.get(&s, 0, 0).unwrap() - 2f64.sqrt()).abs() < 1e-12);
    assert!((r.get(&s, 1, 1).unwrap() - 1.5f64.sqrt()).abs() < 1e-12);

    let q0 = qr.q().column_copy(&mut s, 0).unwrap();
    let m1 = m.column_copy(&mut s, 1).unwrap();
    let dot = q0.dot_product(&s, &m1).unwrap();
    assert!((r.get(&s, 0, 1).unwrap() - dot).abs() < 1e-12);

    q0.free(&mut s).unwrap();
    m1.free(&mut s).unwrap();
    qr.free(&mut s).unwrap();
    m.free(&mut s).unwrap();
}

#[test]
fn freeing_owner_with_live_view_is_reported() {
    init();
    let mut s = Storage::new();
    let m = mat!(&mut s; [1, 2, 3], [4, 5, 6]).unwrap();
    let row = m.row_view(&mut s, 1).unwrap();
    assert_eq!(m.ref_count(&s).unwrap(), 1);
    assert_eq!(
        m.free(&mut s),
        Err(LinalgError::OwnershipViolation { live_views: 1 })
    );
    assert_eq!(row.to_vec(&s).unwrap(), vec![4.0, 5.0, 6.0]);
    row.free(&mut s).unwrap();
}

#[test]
fn freeing_view_then_owner_succeeds() {
    init();
    let mut s = Storage::new();
    let m = mat!(&mut s; [1, 2], [3, 4]).unwrap();
    let r0 = m.row_view(&mut s, 0).unwrap();
    let r1 = m.row_view(&mut s, 1).unwrap();
    assert_eq!(m.ref_count(&s).unwrap(), 2);
    r0.free(&mut s).unwrap();
    r1.free(&mut s).unwrap();
    assert_eq!(m.ref_count(&s).unwrap(), 0);
    m.free(&mut s).unwrap();
    assert_eq!(s.live_buffers(), 0);
}

#[test]
fn identity_from_array() {
    init();
    let mut s = Storage::new();
    let m = Matrix::from_array(
        &mut s,
        &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        3,
        3,
    )
    .unwrap();
    let id = Matrix::identity(&mut s, 3).unwrap();
    assert!(m.equal(&s, &id, 1e-9).unwrap());
    m.free(&mut s).unwrap();
    id.free(&mut s).unwrap();
}

#[test]
fn row_view_matches_vector_literal() {
    init();
    let mut s = Storage::new();
    let m = mat!(&mut s; [1, 2, 3], [4, 5, 6]).unwrap();
    let expected = vector!(&mut s; 4, 5, 6).unwrap();
    let row = m.row_view(&mut s, 1).unwrap();
    assert!(row.equal(&s, &expected, 0.0).unwrap());

    let x = vector!(&mut s; 1.0, 0.0, -1.0,).unwrap();
    let y = m.vector_multiply(&mut s, &x).unwrap();
    assert_eq!(y.to_vec(&s).unwrap(), vec![-2.0, -2.0]);

    for v in [row, expected, x, y] {
        v.free(&mut s).unwrap();
    }
    m.free(&mut s).unwrap();
    assert_eq!(s.live_buffers(), 0);
}
