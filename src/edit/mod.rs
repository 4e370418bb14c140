mod generator;
mod name;

pub use generator::{generate, generate_all, EditPlan, IdentificationEdit};
pub use name::synthesize;
