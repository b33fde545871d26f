use super::ProviderDescriptor;

pub(super) const DESCRIPTOR: ProviderDescriptor =
    ProviderDescriptor::passthrough("https://api.moonshot.cn/v1");
