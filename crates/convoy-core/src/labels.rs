//! Hierarchical, override-aware label merging.
//!
//! Labels layer from broad to specific: project defaults sit below an app's
//! own labels, which sit below anything a caller supplies for a single
//! operation. Merging never drops an entry; a colliding key always resolves
//! to the most specific (rightmost) value.

use std::collections::HashMap;

/// Merge `scope` with `overrides` applied left-to-right.
///
/// `scope` is the lowest-precedence layer. Every entry of every override set
/// is kept, overwriting any colliding key from a lower layer.
pub fn merge(
    scope: &HashMap<String, String>,
    overrides: &[&HashMap<String, String>],
) -> HashMap<String, String> {
    let mut merged = scope.clone();
    for set in overrides {
        for (key, value) in set.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_override_wins_on_collision() {
        let scope = labels(&[("env", "staging"), ("team", "infra")]);
        let overrides = labels(&[("env", "prod")]);

        let merged = merge(&scope, &[&overrides]);
        assert_eq!(merged, labels(&[("env", "prod"), ("team", "infra")]));
    }

    #[test]
    fn test_no_overrides_returns_scope_unchanged() {
        let scope = labels(&[("env", "staging"), ("team", "infra")]);
        assert_eq!(merge(&scope, &[]), scope);
    }

    #[test]
    fn test_new_key_is_added_without_disturbing_others() {
        let scope = labels(&[("env", "staging")]);
        let overrides = labels(&[("region", "eu-west-1")]);

        let merged = merge(&scope, &[&overrides]);
        assert_eq!(
            merged,
            labels(&[("env", "staging"), ("region", "eu-west-1")])
        );
    }

    #[test]
    fn test_rightmost_set_wins_across_layers() {
        let scope = labels(&[("env", "dev")]);
        let app = labels(&[("env", "staging"), ("tier", "web")]);
        let caller = labels(&[("env", "prod")]);

        let merged = merge(&scope, &[&app, &caller]);
        assert_eq!(merged, labels(&[("env", "prod"), ("tier", "web")]));
    }
}
