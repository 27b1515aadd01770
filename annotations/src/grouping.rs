//! Partitions the paths of a backend by their resolved configuration.

use crate::types::{BackendConfig, BackendPath, BackendPaths};

/// Groups `paths` by the value `resolve` computes for each of them.
///
/// Every path lands in exactly one group, paths sharing an equal value share a
/// group, and groups are ordered by the first path (in `BackendPaths` order)
/// resolving to their value.
pub fn group_paths<T, F>(paths: &BackendPaths, mut resolve: F) -> Vec<BackendConfig<T>>
where
    T: PartialEq,
    F: FnMut(&BackendPath) -> T,
{
    let mut groups: Vec<BackendConfig<T>> = Vec::new();
    for path in paths.iter() {
        let config = resolve(path);
        match groups.iter_mut().find(|group| group.config == config) {
            Some(group) => group.paths.add(path.clone()),
            None => groups.push(BackendConfig {
                paths: BackendPaths::new([path.clone()]),
                config,
            }),
        }
    }
    groups
}
