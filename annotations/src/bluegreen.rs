//! Blue/green canary weights.
//!
//! A balance expression such as `v=1=50,v=2=25` assigns a weight to every
//! group of endpoints whose pod carries the given label. In `deploy` mode the
//! weight is shared by all endpoints of the group, in `pod` mode every
//! endpoint gets the full weight.

use crate::cache::{Labels, PodStore};
use crate::errors::BalanceError;
use crate::metrics_defs::{BLUE_GREEN_ENDPOINT_REMOVED, BLUE_GREEN_EXPRESSION_REJECTED, counter};
use crate::source::{self, Source};
use crate::types::Endpoint;

/// Highest weight assigned to an endpoint.
pub const MAX_WEIGHT: u32 = 256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BalanceMode {
    /// Every endpoint of a group receives the group weight.
    Pod,
    /// The group weight is split between the endpoints of the group.
    #[default]
    Deploy,
}

impl BalanceMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pod" => Some(BalanceMode::Pod),
            "deploy" | "" => Some(BalanceMode::Deploy),
            _ => None,
        }
    }
}

/// One `label=value=weight` entry of a balance expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceGroup {
    pub label: String,
    pub value: String,
    pub weight: i64,
}

impl BalanceGroup {
    fn matches(&self, endpoint_labels: &Labels) -> bool {
        endpoint_labels.get(&self.label) == Some(&self.value)
    }
}

/// Parses every entry of `balance`, failing on the first malformed one.
pub fn parse_balance(balance: &str) -> Result<Vec<BalanceGroup>, BalanceError> {
    balance
        .split(',')
        .map(|entry| {
            let fields: Vec<&str> = entry.split('=').collect();
            match fields.as_slice() {
                [label, value, weight] => Ok(BalanceGroup {
                    label: label.to_string(),
                    value: value.to_string(),
                    weight: weight.parse()?,
                }),
                _ => Err(BalanceError::InvalidFormat(entry.to_string())),
            }
        })
        .collect()
}

fn clamp_weight(weight: i64, source: &str) -> u32 {
    if weight < 0 {
        tracing::warn!("invalid weight '{weight}' on {source}, using '0' instead");
        return 0;
    }
    if weight > 255 {
        tracing::warn!("invalid weight '{weight}' on {source}, using '{MAX_WEIGHT}' instead");
        return MAX_WEIGHT;
    }
    // 0..=255
    weight as u32
}

/// Applies the balance expression to the endpoint weights.
///
/// Endpoints already disabled (weight 0) are left out. Endpoints whose pod
/// cannot be resolved, or that match no group, are disabled. A rejected
/// expression leaves every weight untouched.
pub fn apply_balance(
    endpoints: &mut [Endpoint],
    balance: &str,
    mode: &str,
    pods: &dyn PodStore,
    source: Option<&Source>,
) {
    if balance.is_empty() {
        return;
    }
    let source = source::describe(source);
    let source = source.as_str();

    let groups = match parse_balance(balance) {
        Ok(groups) => groups,
        Err(err) => {
            reject(&err, source);
            return;
        }
    };
    let weights: Vec<u32> = groups
        .iter()
        .map(|group| clamp_weight(group.weight, source))
        .collect();

    let mode = BalanceMode::parse(mode).unwrap_or_else(|| {
        tracing::warn!("unsupported blue/green mode '{mode}' on {source}, falling back to 'deploy'");
        BalanceMode::Deploy
    });

    let membership: Vec<Option<usize>> = endpoints
        .iter()
        .map(|endpoint| resolve_group(endpoint, &groups, pods, source))
        .collect();

    let mut sizes = vec![0usize; groups.len()];
    for group in membership.iter().flatten() {
        sizes[*group] += 1;
    }
    for (group, size) in groups.iter().zip(&sizes) {
        if *size == 0 {
            tracing::debug!(
                "blue/green balance label '{}={}' on {} does not reference any endpoint",
                group.label,
                group.value,
                source
            );
        }
    }

    let final_weights = match mode {
        BalanceMode::Pod => weights,
        BalanceMode::Deploy => {
            let shares: Vec<(u32, usize)> = weights.into_iter().zip(sizes).collect();
            match deploy_weights(&shares) {
                Ok(weights) => weights,
                Err(err) => {
                    reject(&err, source);
                    return;
                }
            }
        }
    };

    for (endpoint, group) in endpoints.iter_mut().zip(membership) {
        if endpoint.weight == 0 {
            continue;
        }
        endpoint.weight = group.map_or(0, |group| final_weights[group]);
    }
}

fn reject(err: &BalanceError, source: &str) {
    tracing::error!("blue/green config on {source} has an {err}");
    counter!(BLUE_GREEN_EXPRESSION_REJECTED).increment(1);
}

/// Index of the first group matching the pod behind `endpoint`.
///
/// Endpoints that are already disabled never join a group. An endpoint whose
/// pod cannot be resolved is reported and joins no group either.
fn resolve_group(
    endpoint: &Endpoint,
    groups: &[BalanceGroup],
    pods: &dyn PodStore,
    source: &str,
) -> Option<usize> {
    if endpoint.weight == 0 {
        return None;
    }
    let labels = match &endpoint.target_ref {
        None => {
            removed(endpoint, source, "endpoint does not reference a pod");
            return None;
        }
        Some(target_ref) => match pods.pod_labels(target_ref) {
            Ok(labels) => labels,
            Err(err) => {
                removed(endpoint, source, &err.to_string());
                return None;
            }
        },
    };
    groups.iter().position(|group| group.matches(labels))
}

fn removed(endpoint: &Endpoint, source: &str, reason: &str) {
    tracing::warn!(
        "endpoint '{}' on {} was removed from balance: {}",
        endpoint.address(),
        source,
        reason
    );
    counter!(BLUE_GREEN_ENDPOINT_REMOVED).increment(1);
}

/// Per endpoint weights of each `(group weight, group size)` pair.
///
/// Shares are brought to the least common multiple of the group sizes,
/// reduced by their greatest common divisor and, when needed, rescaled so the
/// highest one is `MAX_WEIGHT`. A group with a non zero weight never drops to
/// zero on rescale.
pub fn deploy_weights(groups: &[(u32, usize)]) -> Result<Vec<u32>, BalanceError> {
    let denominator = groups
        .iter()
        .filter(|(_, size)| *size > 0)
        .try_fold(1u128, |acc, (_, size)| lcm(acc, *size as u128))
        .ok_or(BalanceError::Overflow)?;

    let mut numerators = groups
        .iter()
        .map(|&(weight, size)| {
            if size == 0 {
                return Some(0);
            }
            u128::from(weight).checked_mul(denominator / size as u128)
        })
        .collect::<Option<Vec<u128>>>()
        .ok_or(BalanceError::Overflow)?;

    let divisor = numerators.iter().fold(0, |acc, &n| gcd(acc, n));
    if divisor > 0 {
        for numerator in &mut numerators {
            *numerator /= divisor;
        }
    }

    let max = numerators.iter().copied().max().unwrap_or(0);
    let limit = u128::from(MAX_WEIGHT);
    if max > limit {
        for numerator in &mut numerators {
            if *numerator > 0 {
                let scaled = numerator.checked_mul(limit).ok_or(BalanceError::Overflow)? / max;
                *numerator = scaled.max(1);
            }
        }
    }

    numerators
        .into_iter()
        .map(|n| u32::try_from(n).map_err(|_| BalanceError::Overflow))
        .collect()
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u128, b: u128) -> Option<u128> {
    (a / gcd(a, b)).checked_mul(b)
}
