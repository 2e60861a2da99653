pub mod paging;
pub mod translation;

pub use paging::{Page, Paging};
