//! Resource records.

mod person;
mod product;

pub use person::{NewPerson, Person, PersonView};
pub use product::{NewProduct, Product};
