//! Declarative route classification shared by the guard and its configuration

use serde::{Deserialize, Serialize};

/// Access class of a navigated path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// No credential required
    Public,
    /// Requires the admin role claim
    Admin,
    /// Requires a valid credential
    Protected,
}

impl RouteClass {
    /// Order in which rules are consulted; the first class with a match wins
    const PRECEDENCE: [Self; 3] = [Self::Public, Self::Admin, Self::Protected];
}

/// One `{prefix, class}` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    pub prefix: String,
    pub class: RouteClass,
}

impl RouteRule {
    pub fn new(prefix: impl Into<String>, class: RouteClass) -> Self {
        Self {
            prefix: prefix.into(),
            class,
        }
    }
}

/// Prefix table classifying every path into exactly one [`RouteClass`].
///
/// Matching is plain string-prefix. Paths matched by no rule are
/// [`RouteClass::Protected`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Classify a path
    pub fn classify(&self, path: &str) -> RouteClass {
        RouteClass::PRECEDENCE
            .into_iter()
            .find(|class| self.prefixes(*class).any(|prefix| path.starts_with(prefix)))
            .unwrap_or(RouteClass::Protected)
    }

    /// Prefixes registered for one class, in table order
    pub fn prefixes(&self, class: RouteClass) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(move |rule| rule.class == class)
            .map(|rule| rule.prefix.as_str())
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            RouteRule::new("/auth/login", RouteClass::Public),
            RouteRule::new("/auth/register", RouteClass::Public),
            RouteRule::new("/unauthorized", RouteClass::Public),
            RouteRule::new("/admin", RouteClass::Admin),
            RouteRule::new("/campaigns", RouteClass::Protected),
            RouteRule::new("/profile", RouteClass::Protected),
            RouteRule::new("/wallet", RouteClass::Protected),
            RouteRule::new("/notifications", RouteClass::Protected),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classification() {
        let table = RouteTable::default();
        assert_eq!(table.classify("/auth/login"), RouteClass::Public);
        assert_eq!(table.classify("/auth/register/confirm"), RouteClass::Public);
        assert_eq!(table.classify("/unauthorized"), RouteClass::Public);
        assert_eq!(table.classify("/admin"), RouteClass::Admin);
        assert_eq!(table.classify("/admin/users"), RouteClass::Admin);
        assert_eq!(table.classify("/campaigns/5"), RouteClass::Protected);
        assert_eq!(table.classify("/"), RouteClass::Protected);
        assert_eq!(table.classify("/somewhere/else"), RouteClass::Protected);
    }

    #[test]
    fn test_public_takes_precedence_over_admin() {
        let table = RouteTable::new(vec![
            RouteRule::new("/admin", RouteClass::Admin),
            RouteRule::new("/admin/login", RouteClass::Public),
        ]);
        assert_eq!(table.classify("/admin/login"), RouteClass::Public);
        assert_eq!(table.classify("/admin/stats"), RouteClass::Admin);
    }

    #[test]
    fn test_table_deserializes_from_rule_list() {
        let table: RouteTable = serde_json::from_str(
            r#"[{"prefix": "/docs", "class": "public"}, {"prefix": "/ops", "class": "admin"}]"#,
        )
        .unwrap();
        assert_eq!(table.classify("/docs/intro"), RouteClass::Public);
        assert_eq!(table.classify("/ops"), RouteClass::Admin);
        assert_eq!(table.prefixes(RouteClass::Protected).count(), 0);
    }
}
