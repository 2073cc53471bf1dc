use lineal::{mat, vector, Accelerator, CpuAccelerator, LResult, LinalgObj, Storage};

fn main() -> LResult<()> {
    env_logger::init();
    let mut s = Storage::new();
    let dev = CpuAccelerator;

    let m = mat!(&mut s;
        [12.0, -51.0, 4.0],
        [6.0, 167.0, -68.0],
        [-4.0, 24.0, -41.0],
    )?;
    println!("M =");
    m.print(&mut s)?;

    let (q, r) = dev.qr(&mut s, &m)?.into_parts();
    println!("Q =\n{}", q.display(&s));
    println!("R =\n{}", r.display(&s));

    let back = dev.multiply(&mut s, &q, &r)?;
    println!("Q * R == M: {}", back.equal(&s, &m, 1e-9)?);

    let x = vector!(&mut s; 1, 0, -1)?;
    let y = m.vector_multiply(&mut s, &x)?;
    println!("M * {} = {}", x.display(&s), y.display(&s));
    x.free(&mut s)?;
    y.free(&mut s)?;

    let row = m.row_view(&mut s, 0)?;
    println!("row 0 = {} (refs on M: {})", row.display(&s), m.ref_count(&s)?);
    if let Err(e) = m.free(&mut s) {
        log::error!("{}", e);
    }
    row.free(&mut s)?;

    for x in [q, r, back] {
        x.free(&mut s)?;
    }
    Ok(())
}
