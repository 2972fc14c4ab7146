pub mod extra_ops;
pub mod hydrology;
pub mod soil;

pub use extra_ops::ExtraOpsTable;
pub use hydrology::{HruDaily, HydrologyProvider, HydrologyTable};
pub use soil::mean_awc;
