use super::ProviderDescriptor;

pub(super) const DESCRIPTOR: ProviderDescriptor =
    ProviderDescriptor::passthrough("https://api.groq.com/openai/v1");
