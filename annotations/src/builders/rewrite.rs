use super::BackendData;
use crate::keys;

/// Path rewrite target, resolved per path.
pub(super) fn build(data: &mut BackendData) {
    let mut groups = data
        .mapper
        .get_backend_config_str(&data.backend, keys::REWRITE_TARGET);
    for group in &mut groups {
        if group
            .config
            .contains(|c: char| c.is_whitespace() || c == '"' || c == '\'')
        {
            tracing::warn!(
                "rewrite-target does not allow white spaces or single/double quotes on backend '{}': {}",
                data.backend,
                group.config
            );
            group.config.clear();
        }
    }
    data.backend.rewrite_url = groups;
}
