pub mod baseline;

pub use baseline::{fit_polynomial, polynomial_trend, remove_baseline};
