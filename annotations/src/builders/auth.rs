use super::{BackendData, describe, rejected};
use crate::cache::SecretStore;
use crate::keys;
use crate::types::{AuthHttp, User, Userlist};
use indexmap::IndexMap;
use std::fmt;

/// Key of the secret holding the `user:password` lines.
const AUTH_FILE: &str = "auth";

/// HTTP basic authentication.
///
/// The userlist is named after the secret and registered once in
/// `userlists`; the backend only references it.
pub(super) fn build(
    data: &mut BackendData,
    secrets: &dyn SecretStore,
    userlists: &mut IndexMap<String, Userlist>,
) {
    let auth_type = data.mapper.get_str(keys::AUTH_TYPE);
    if auth_type.value.is_empty() {
        return;
    }
    let source = describe(&auth_type);
    if auth_type.value != "basic" {
        tracing::error!("unsupported authentication type on {source}: {}", auth_type.value);
        rejected("auth-http");
        return;
    }

    let secret = data.mapper.get_str(keys::AUTH_SECRET);
    if secret.value.is_empty() {
        tracing::error!("missing secret name on basic authentication on {source}");
        rejected("auth-http");
        return;
    }
    let namespace = secret
        .source
        .map_or(data.backend.id.namespace.as_str(), |source| source.namespace.as_str());
    let secret_name = qualified_name(namespace, secret.value);
    let userlist_name = secret_name.replace('/', "_");

    if !userlists.contains_key(&userlist_name) {
        let content = match secrets.secret_content(&secret_name, AUTH_FILE) {
            Ok(content) => content,
            Err(err) => {
                tracing::error!("error reading basic authentication on {source}: {err}");
                rejected("auth-http");
                return;
            }
        };
        let users = parse_users(&String::from_utf8_lossy(content), |err| {
            tracing::warn!(
                "ignoring malformed usr/passwd on secret '{secret_name}', declared on {source}: {err}"
            );
        });
        if users.is_empty() {
            tracing::warn!("userlist on {source} for basic authentication is empty");
        }
        userlists.insert(
            userlist_name.clone(),
            Userlist {
                name: userlist_name.clone(),
                users,
            },
        );
    }

    let realm = data.mapper.get_str(keys::AUTH_REALM);
    let realm = if realm.value.contains('"') {
        tracing::warn!("ignoring auth-realm with quotes on {}", describe(&realm));
        None
    } else if realm.value.is_empty() {
        None
    } else {
        Some(realm.value.to_string())
    };

    data.backend.auth_http = Some(AuthHttp {
        userlist: userlist_name,
        realm,
    });
}

/// Secret names without a namespace live in the namespace of the resource
/// declaring them.
fn qualified_name(namespace: &str, name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("{namespace}/{name}")
    }
}

/// Why a `user:password` line was skipped.
#[derive(Debug, PartialEq)]
enum LineError {
    MissingUsername { line: usize },
    MissingPassword { user: String, line: usize },
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::MissingUsername { line } => write!(f, "missing username line {line}"),
            LineError::MissingPassword { user, line } => {
                write!(f, "missing password of user '{user}' line {line}")
            }
        }
    }
}

/// Parses `user:encrypted` and `user::plain` lines, skipping blank ones.
///
/// Line numbers start at 1 and count blank lines.
fn parse_users(content: &str, mut skipped: impl FnMut(LineError)) -> Vec<User> {
    let mut users = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let number = index + 1;
        let (name, passwd) = line.split_once(':').unwrap_or((line, ""));
        let (passwd, encrypted) = match passwd.strip_prefix(':') {
            Some(plain) => (plain, false),
            None => (passwd, true),
        };
        if name.is_empty() {
            skipped(LineError::MissingUsername { line: number });
            continue;
        }
        if passwd.is_empty() {
            skipped(LineError::MissingPassword {
                user: name.to_string(),
                line: number,
            });
            continue;
        }
        users.push(User {
            name: name.to_string(),
            passwd: passwd.to_string(),
            encrypted,
        });
    }
    users
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::source::Source;
    use crate::testutils::{capture_logs, ingress, single_path_data};

    fn basic(secret: &str) -> Vec<(&'static str, &str)> {
        vec![(keys::AUTH_TYPE, "basic"), (keys::AUTH_SECRET, secret)]
    }

    fn run(
        source: &Source,
        annotations: &[(&str, &str)],
        cache: &MemoryCache,
    ) -> (Option<AuthHttp>, Vec<Userlist>, Vec<String>) {
        let mut data = single_path_data(source, &[], annotations);
        let mut userlists = IndexMap::new();
        let ((), logs) = capture_logs(|| build(&mut data, cache, &mut userlists));
        (
            data.backend.auth_http,
            userlists.into_values().collect(),
            logs,
        )
    }

    fn user(name: &str, passwd: &str, encrypted: bool) -> User {
        User {
            name: name.to_string(),
            passwd: passwd.to_string(),
            encrypted,
        }
    }

    #[test]
    fn test_disabled() {
        let (auth, userlists, logs) = run(&ingress("ing1"), &[], &MemoryCache::new());
        assert!(auth.is_none());
        assert!(userlists.is_empty());
        assert!(logs.is_empty());
    }

    #[test]
    fn test_rejected() {
        let mut cache = MemoryCache::new();
        cache.add_secret("default/other", "xx", "");

        let cases: &[(&[(&str, &str)], &str)] = &[
            (
                &[(keys::AUTH_TYPE, "fail")],
                "ERROR unsupported authentication type on ingress 'default/ing1': fail",
            ),
            (
                &[(keys::AUTH_TYPE, "basic")],
                "ERROR missing secret name on basic authentication on ingress 'default/ing1'",
            ),
            (
                &[(keys::AUTH_TYPE, "basic"), (keys::AUTH_SECRET, "mypwd")],
                "ERROR error reading basic authentication on ingress 'default/ing1': secret not found: 'default/mypwd'",
            ),
            (
                &[(keys::AUTH_TYPE, "basic"), (keys::AUTH_SECRET, "other")],
                "ERROR error reading basic authentication on ingress 'default/ing1': secret 'default/other' does not have file/key 'auth'",
            ),
        ];

        for (annotations, expected) in cases {
            let (auth, userlists, logs) = run(&ingress("ing1"), annotations, &cache);
            assert!(auth.is_none());
            assert!(userlists.is_empty());
            assert_eq!(logs, vec![*expected]);
        }
    }

    #[test]
    fn test_realm_with_quotes() {
        let mut cache = MemoryCache::new();
        cache.add_secret("default/mypwd", "auth", "usr1::clear1");
        let mut annotations = basic("mypwd");
        annotations.push((keys::AUTH_REALM, r#""a name""#));

        let (auth, userlists, logs) = run(&ingress("ing1"), &annotations, &cache);
        assert_eq!(
            auth,
            Some(AuthHttp {
                userlist: "default_mypwd".to_string(),
                realm: None,
            })
        );
        assert_eq!(
            userlists,
            vec![Userlist {
                name: "default_mypwd".to_string(),
                users: vec![user("usr1", "clear1", false)],
            }]
        );
        assert_eq!(
            logs,
            vec!["WARN ignoring auth-realm with quotes on ingress 'default/ing1'"]
        );
    }

    #[test]
    fn test_realm() {
        let mut cache = MemoryCache::new();
        cache.add_secret("default/mypwd", "auth", "usr1::clear1");
        let mut annotations = basic("mypwd");
        annotations.push((keys::AUTH_REALM, "a name"));

        let (auth, _, logs) = run(&ingress("ing1"), &annotations, &cache);
        assert_eq!(auth.unwrap().realm.as_deref(), Some("a name"));
        assert!(logs.is_empty());
    }

    #[test]
    fn test_empty_userlist() {
        let mut cache = MemoryCache::new();
        cache.add_secret("ns1/mypwd", "auth", "");

        let (auth, userlists, logs) = run(
            &Source::new("ingress", "ns1", "i1"),
            &basic("mypwd"),
            &cache,
        );
        assert_eq!(auth.unwrap().userlist, "ns1_mypwd");
        assert_eq!(
            userlists,
            vec![Userlist {
                name: "ns1_mypwd".to_string(),
                users: Vec::new(),
            }]
        );
        assert_eq!(
            logs,
            vec!["WARN userlist on ingress 'ns1/i1' for basic authentication is empty"]
        );
    }

    #[test]
    fn test_qualified_secret_name() {
        let mut cache = MemoryCache::new();
        cache.add_secret("auth/shared", "auth", "usr1:encpwd1");

        let (auth, userlists, logs) = run(&ingress("ing1"), &basic("auth/shared"), &cache);
        assert_eq!(auth.unwrap().userlist, "auth_shared");
        assert_eq!(userlists[0].users, vec![user("usr1", "encpwd1", true)]);
        assert!(logs.is_empty());
    }

    #[test]
    fn test_malformed_lines() {
        let prefix = "WARN ignoring malformed usr/passwd on secret 'default/basicpwd', declared on ingress 'default/ing1'";
        let cases: Vec<(&str, Vec<User>, Vec<&str>)> = vec![
            ("fail", vec![], vec!["missing password of user 'fail' line 1"]),
            (
                "\nusr1::clearpwd1\nnopwd",
                vec![user("usr1", "clearpwd1", false)],
                vec!["missing password of user 'nopwd' line 3"],
            ),
            (
                "\nusrnopwd1:\nusrnopwd2::\n:encpwd3\n::clearpwd4",
                vec![],
                vec![
                    "missing password of user 'usrnopwd1' line 2",
                    "missing password of user 'usrnopwd2' line 3",
                    "missing username line 4",
                    "missing username line 5",
                ],
            ),
        ];

        for (i, (content, users, reasons)) in cases.into_iter().enumerate() {
            let mut cache = MemoryCache::new();
            cache.add_secret("default/basicpwd", "auth", content);

            let (_, userlists, logs) = run(&ingress("ing1"), &basic("basicpwd"), &cache);
            let mut expected: Vec<String> = reasons
                .iter()
                .map(|reason| format!("{prefix}: {reason}"))
                .collect();
            if users.is_empty() {
                expected.push(
                    "WARN userlist on ingress 'default/ing1' for basic authentication is empty"
                        .to_string(),
                );
            }
            assert_eq!(userlists[0].users, users, "case {i}");
            assert_eq!(logs, expected, "case {i}");
        }
    }

    #[test]
    fn test_users() {
        let mut cache = MemoryCache::new();
        cache.add_secret("default/basicpwd", "auth", "\nusr1:encpwd1\nusr2::clearpwd2");

        let (_, userlists, logs) = run(&ingress("ing1"), &basic("basicpwd"), &cache);
        assert_eq!(
            userlists,
            vec![Userlist {
                name: "default_basicpwd".to_string(),
                users: vec![
                    user("usr1", "encpwd1", true),
                    user("usr2", "clearpwd2", false),
                ],
            }]
        );
        assert!(logs.is_empty());
    }

    #[test]
    fn test_parse_users() {
        let mut skipped = Vec::new();
        let users = parse_users("usr1:a:b\n  \nusr2::p:q", |err| skipped.push(err));
        assert_eq!(
            users,
            vec![user("usr1", "a:b", true), user("usr2", "p:q", false)]
        );
        assert!(skipped.is_empty());

        parse_users("::x", |err| skipped.push(err));
        assert_eq!(skipped, vec![LineError::MissingUsername { line: 1 }]);
    }
}
