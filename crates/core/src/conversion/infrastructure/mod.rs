pub mod assemblyai_converter;
pub mod converter_registry;
pub mod deepgram_converter;
pub mod nemo_converter;
pub mod rev_ai_converter;
pub mod whisper_converter;

#[cfg(test)]
pub(crate) mod fixtures;
