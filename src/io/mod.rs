pub mod export;
pub mod statement_xml;

pub use export::*;
pub use statement_xml::*;
