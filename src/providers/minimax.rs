use super::ProviderDescriptor;

/// MiniMax speaks the unified protocol but serves completions on a
/// non-default path.
pub(super) const DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    base_url: "https://api.minimax.chat/v1",
    chat_path: "/text/chatcompletion_v2",
    delimiter: "\n\n",
    path_builder: None,
    header_transform: None,
    body_transform: None,
    response_transform: None,
};
