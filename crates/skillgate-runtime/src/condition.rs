//! Step conditions.
//!
//! A step may carry a guard of the form `key == "value"`.  The guard is
//! parsed once into a [`Condition`] and evaluated against the caller's
//! parameters.  Anything that does not parse as an equality is treated as
//! always true.

use skillgate_skills::Parameters;

const EQUALS: &str = " == ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Always,
    /// Case-insensitive equality against a caller parameter.
    Equals { key: String, value: String },
}

impl Condition {
    pub fn parse(expr: &str) -> Self {
        let mut parts = expr.split(EQUALS);
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Self::Always;
        };

        let key = key.trim();
        if key.is_empty() {
            return Self::Always;
        }

        Self::Equals {
            key: key.to_owned(),
            value: value.trim().trim_matches(['"', '\'']).to_owned(),
        }
    }

    /// Whether the step should run.  A missing parameter counts as a pass.
    pub fn evaluate(&self, params: &Parameters) -> bool {
        match self {
            Self::Always => true,
            Self::Equals { key, value } => params
                .get(key)
                .is_none_or(|actual| actual.to_string().to_lowercase() == value.to_lowercase()),
        }
    }
}

impl From<Option<&str>> for Condition {
    fn from(expr: Option<&str>) -> Self {
        expr.map_or(Self::Always, Self::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillgate_skills::ParamValue;

    fn params(pairs: &[(&str, ParamValue)]) -> Parameters {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn parses_equality() {
        assert_eq!(
            Condition::parse(r#"action == "create""#),
            Condition::Equals {
                key: "action".into(),
                value: "create".into()
            }
        );
        assert_eq!(
            Condition::parse("mode == 'fast'"),
            Condition::Equals {
                key: "mode".into(),
                value: "fast".into()
            }
        );
    }

    #[test]
    fn unparseable_is_always() {
        assert_eq!(Condition::parse("action"), Condition::Always);
        assert_eq!(Condition::parse("a == b == c"), Condition::Always);
        assert_eq!(Condition::parse(r#" == "x""#), Condition::Always);
        assert_eq!(Condition::from(None), Condition::Always);
    }

    #[test]
    fn evaluates_case_insensitively() {
        let condition = Condition::parse(r#"action == "Create""#);
        assert!(condition.evaluate(&params(&[("action", "CREATE".into())])));
        assert!(!condition.evaluate(&params(&[("action", "delete".into())])));
    }

    #[test]
    fn missing_key_passes() {
        let condition = Condition::parse(r#"action == "create""#);
        assert!(condition.evaluate(&Parameters::new()));
    }

    #[test]
    fn non_string_values_compare_by_rendering() {
        assert!(Condition::parse("urgent == true").evaluate(&params(&[("urgent", true.into())])));
        assert!(Condition::parse(r#"count == "3""#).evaluate(&params(&[("count", 3i64.into())])));
        assert!(!Condition::parse("count == 4").evaluate(&params(&[("count", 3i64.into())])));
    }
}
