use super::ProviderDescriptor;

pub(super) const DESCRIPTOR: ProviderDescriptor =
    ProviderDescriptor::passthrough("https://api.lingyiwanwu.com/v1");
