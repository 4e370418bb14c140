pub mod candidate;
pub mod span;

pub use candidate::{
    ComponentCandidate, DeclarationKind, ExistingIdentification, ForwardRefVariant,
    IdentificationValue, PropertyAssignment, IDENTIFICATION_PROPERTY,
};
pub use span::{LineIndex, TextRange};
