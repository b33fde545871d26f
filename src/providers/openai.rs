use super::ProviderDescriptor;

pub(super) const DESCRIPTOR: ProviderDescriptor =
    ProviderDescriptor::passthrough("https://api.openai.com/v1");
