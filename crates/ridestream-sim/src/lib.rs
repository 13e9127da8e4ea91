pub mod catalog;
pub mod clock;
pub mod console;
pub mod distance;
pub mod generator;
pub mod runner;
pub mod sampling;
pub mod surge;
pub mod weather;

pub use catalog::*;
pub use clock::*;
pub use distance::*;
pub use generator::*;
pub use runner::*;
pub use sampling::*;
pub use surge::*;
pub use weather::*;

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
