pub mod llm_client;

pub use llm_client::{
    Credential, LlmClient, LlmClientConfig, LlmClientFactory, LlmSampler, OpenAiClientFactory,
};
