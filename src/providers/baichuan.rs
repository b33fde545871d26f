use super::ProviderDescriptor;

pub(super) const DESCRIPTOR: ProviderDescriptor =
    ProviderDescriptor::passthrough("https://api.baichuan-ai.com/v1");
