use std::fmt;

/// Identity of the resource that declared an annotation.
///
/// Only used for attribution in log messages, rendered as
/// `ingress 'default/ing1'`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Source {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl Source {
    pub fn new<K, N, M>(kind: K, namespace: N, name: M) -> Self
    where
        K: Into<String>,
        N: Into<String>,
        M: Into<String>,
    {
        Source {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}/{}'", self.kind, self.namespace, self.name)
    }
}

/// Renders an optional source; values coming from defaults have none.
pub(crate) fn describe(source: Option<&Source>) -> String {
    match source {
        Some(source) => source.to_string(),
        None => "global config".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let source = Source::new("ingress", "default", "ing1");
        assert_eq!(source.to_string(), "ingress 'default/ing1'");
        assert_eq!(describe(Some(&source)), "ingress 'default/ing1'");
        assert_eq!(describe(None), "global config");
    }
}
