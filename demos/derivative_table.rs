//! Prints derivatives of the reference functions three ways.
//!
//! For each sample point the table shows the function value, the traced
//! (automatic) derivative, a central finite difference and the closed
//! form, followed by a batched run over the same points.
//!
//! Run with `RUST_LOG=debug` to see trace and batch logging.

use adjoint::prelude::*;

type Function = fn(&Tracked<f64>) -> Result<Tracked<f64>>;

fn square(x: &Tracked<f64>) -> Result<Tracked<f64>> {
    x.powi(2)
}

fn cube(x: &Tracked<f64>) -> Result<Tracked<f64>> {
    x.powi(3)
}

fn decaying_wave(x: &Tracked<f64>) -> Result<Tracked<f64>> {
    let decay = x.mul_scalar(-2.0)?.exp()?;
    let wave = x.mul_scalar(3.0)?.sin()?.mul_scalar(3.0)?;
    decay.add(&wave)
}

fn main() -> Result<()> {
    env_logger::init();

    let functions: [(&str, Function, fn(f64) -> f64); 3] = [
        ("x^2", square, |x| 2.0 * x),
        ("x^3", cube, |x| 3.0 * x * x),
        ("exp(-2x) + 3 sin(3x)", decaying_wave, |x| {
            -2.0 * (-2.0 * x).exp() + 9.0 * (3.0 * x).cos()
        }),
    ];
    let points = [-2.0, -1.0, -0.5, 0.0, 0.5, 1.0, 2.0];
    let fd_config = FiniteDifferenceConfig::default();

    for (name, f, closed_form) in functions {
        println!("f(x) = {}", name);
        println!(
            "{:>6} {:>14} {:>14} {:>14} {:>14}",
            "x", "f(x)", "autodiff", "finite diff", "closed form"
        );
        for &x in &points {
            let (value, grad) = value_and_gradient(f, x)?;
            let numerical = try_central_difference(|t| evaluate(f, t), x, &fd_config)?;
            println!(
                "{:>6.2} {:>14.6} {:>14.6} {:>14.6} {:>14.6}",
                x,
                value,
                grad,
                numerical,
                closed_form(x)
            );
        }

        let batch = batch_gradient(f, &points).into_values()?;
        println!("batched: {:?}\n", batch);
    }

    Ok(())
}
