pub mod decision;
pub mod field_unit;
pub mod operation;
pub mod policy;

pub use decision::*;
pub use field_unit::*;
pub use operation::*;
pub use policy::*;
