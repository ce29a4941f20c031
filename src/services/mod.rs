pub mod llm;
pub mod pdf_processor;
pub mod prompt;

pub use llm::{build_model, AnalysisModel};
pub use pdf_processor::{ExtractionResult, PdfProcessor};
pub use prompt::PromptPayload;
