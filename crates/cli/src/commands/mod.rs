pub mod lint;
pub mod mapping;
pub mod run;

pub use lint::*;
pub use mapping::*;
pub use run::*;
