pub mod contact;
pub mod pdf;

pub use contact::infer_contact_info;
pub use pdf::{extract_pdf, ExtractedDocument, PositionedFragment};
