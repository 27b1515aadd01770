use super::{BackendData, describe, rejected};
use crate::keys;
use crate::types::{Cookie, CookieStrategy};

const DEFAULT_COOKIE_NAME: &str = "INGRESSCOOKIE";

/// Cookie based session affinity.
pub(super) fn build(data: &mut BackendData) {
    let affinity = data.mapper.get_str(keys::AFFINITY);
    if affinity.value.is_empty() {
        return;
    }
    if affinity.value != "cookie" {
        tracing::error!(
            "unsupported affinity type on {}: {}",
            describe(&affinity),
            affinity.value
        );
        rejected("affinity");
        return;
    }

    let name = match data.mapper.get_str_value(keys::SESSION_COOKIE_NAME) {
        "" => DEFAULT_COOKIE_NAME,
        name => name,
    };

    let declared = data.mapper.get_str(keys::SESSION_COOKIE_STRATEGY);
    let strategy = match declared.value {
        "" => CookieStrategy::Insert,
        value => CookieStrategy::parse(value).unwrap_or_else(|| {
            tracing::warn!(
                "invalid affinity cookie strategy '{}' on {}, using 'insert' instead",
                value,
                describe(&declared)
            );
            CookieStrategy::Insert
        }),
    };

    data.backend.cookie = Some(Cookie {
        name: name.to_string(),
        strategy,
        dynamic: data.mapper.get_bool_value(keys::SESSION_COOKIE_DYNAMIC),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{capture_logs, ingress, single_path_data};

    fn run(annotations: &[(&str, &str)]) -> (Option<Cookie>, Vec<String>) {
        let mut data = single_path_data(&ingress("ing1"), &[], annotations);
        let ((), logs) = capture_logs(|| build(&mut data));
        (data.backend.cookie, logs)
    }

    fn cookie(name: &str, strategy: CookieStrategy, dynamic: bool) -> Option<Cookie> {
        Some(Cookie {
            name: name.to_string(),
            strategy,
            dynamic,
        })
    }

    #[test]
    fn test_disabled() {
        let (result, logs) = run(&[]);
        assert_eq!(result, None);
        assert!(logs.is_empty());
    }

    #[test]
    fn test_unsupported_type() {
        let (result, logs) = run(&[(keys::AFFINITY, "no")]);
        assert_eq!(result, None);
        assert_eq!(
            logs,
            vec!["ERROR unsupported affinity type on ingress 'default/ing1': no"]
        );
    }

    #[test]
    fn test_cookie() {
        let cases: &[(&[(&str, &str)], Option<Cookie>)] = &[
            (
                &[(keys::AFFINITY, "cookie")],
                cookie("INGRESSCOOKIE", CookieStrategy::Insert, false),
            ),
            (
                &[(keys::AFFINITY, "cookie"), (keys::SESSION_COOKIE_NAME, "ing")],
                cookie("ing", CookieStrategy::Insert, false),
            ),
            (
                &[
                    (keys::AFFINITY, "cookie"),
                    (keys::SESSION_COOKIE_STRATEGY, "rewrite"),
                ],
                cookie("INGRESSCOOKIE", CookieStrategy::Rewrite, false),
            ),
            (
                &[
                    (keys::AFFINITY, "cookie"),
                    (keys::SESSION_COOKIE_STRATEGY, "prefix"),
                    (keys::SESSION_COOKIE_DYNAMIC, "true"),
                ],
                cookie("INGRESSCOOKIE", CookieStrategy::Prefix, true),
            ),
            (
                &[
                    (keys::AFFINITY, "cookie"),
                    (keys::SESSION_COOKIE_DYNAMIC, "false"),
                ],
                cookie("INGRESSCOOKIE", CookieStrategy::Insert, false),
            ),
        ];

        for (i, (annotations, expected)) in cases.iter().enumerate() {
            let (result, logs) = run(annotations);
            assert_eq!(&result, expected, "case {i}");
            assert!(logs.is_empty(), "case {i}: {logs:?}");
        }
    }

    #[test]
    fn test_invalid_dynamic() {
        let (result, logs) = run(&[
            (keys::AFFINITY, "cookie"),
            (keys::SESSION_COOKIE_DYNAMIC, "yes"),
        ]);
        assert_eq!(result, cookie("INGRESSCOOKIE", CookieStrategy::Insert, false));
        assert_eq!(
            logs,
            vec!["WARN ignoring invalid bool expression on ingress 'default/ing1': yes"]
        );
    }

    #[test]
    fn test_invalid_strategy() {
        let (result, logs) = run(&[
            (keys::AFFINITY, "cookie"),
            (keys::SESSION_COOKIE_STRATEGY, "err"),
        ]);
        assert_eq!(result, cookie("INGRESSCOOKIE", CookieStrategy::Insert, false));
        assert_eq!(
            logs,
            vec![
                "WARN invalid affinity cookie strategy 'err' on ingress 'default/ing1', using 'insert' instead"
            ]
        );
    }
}
