use fepu08_stacks::environment::CONTEXT_KEY;
use std::collections::BTreeMap;

/// Values passed with `--context key=value`
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Context(BTreeMap<String, String>);

/// Parse a single `key=value` argument
pub(crate) fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected key=value, got \"{raw}\""))?;

    if key.is_empty() {
        return Err(format!("Empty context key in \"{raw}\""));
    }

    Ok((key.to_string(), value.to_string()))
}

impl Context {
    pub(crate) fn new(pairs: &[(String, String)]) -> Self {
        let mut values = BTreeMap::new();

        for (key, value) in pairs {
            if key != CONTEXT_KEY {
                log::warn!("Ignoring unknown context key {key}");
                continue;
            }

            // The last occurrence wins
            values.insert(key.clone(), value.clone());
        }

        Context(values)
    }

    pub(crate) fn environment(&self) -> Option<&str> {
        self.0.get(CONTEXT_KEY).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("env=staging"),
            Ok(("env".to_string(), "staging".to_string()))
        );

        // Only the first "=" separates
        assert_eq!(
            parse_pair("env=a=b"),
            Ok(("env".to_string(), "a=b".to_string()))
        );

        assert!(parse_pair("staging").is_err());
        assert!(parse_pair("=staging").is_err());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let context = Context::new(&[
            ("region".into(), "eu-west-1".into()),
            ("env".into(), "dev".into()),
            ("env".into(), "prod".into()),
        ]);

        assert_eq!(context.environment(), Some("prod"));
        assert_eq!(context.0.len(), 1);
    }
}
