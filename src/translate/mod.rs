pub mod batcher;
pub mod fallback;

pub use batcher::{TranslationBatcher, BATCH_SIZE, TRANSLATION_SYSTEM_PROMPT};
pub use fallback::{fallback_narrative, FIX_PROMPT_PREAMBLE};
