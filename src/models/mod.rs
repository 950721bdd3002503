//! Core data models for VNDB queries and the records they return.

mod character;
mod filter;
mod query;
mod response;

pub use character::{
    Appearance, CharacterRecord, CreditCharacter, CreditStaff, PhysicalAttributes, VaCredit,
    VnCreditRecord, VnTitle, CHARACTER_FIELDS, UNRECORDED, VA_FIELDS,
};
pub use filter::{Combinator, FilterExpr, FilterValue, Operator};
pub use query::{QueryRequest, DEFAULT_RESULTS_LIMIT};
pub use response::{ResponsePage, Stats};
