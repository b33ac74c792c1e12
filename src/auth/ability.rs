/*!
 * # Ability Map
 *
 * Translates stored permission keys such as `products:update` into
 * `(Action, Subject)` pairs, and answers `can(action, subject)` for a
 * principal built from those keys.
 */

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Implies every other action
    Manage,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Subject {
    Product,
    Order,
    Customer,
    Role,
    Permission,
    User,
    TaxRule,
    Plan,
    SiteSetting,
    Complaint,
    ReturnRequest,
    RefundRequest,
    Review,
    DeliveryTracking,
    Invoice,
    /// Matches every subject
    #[strum(serialize = "all")]
    #[serde(rename = "all")]
    All,
}

impl Subject {
    /// Plural resource segment used in permission keys
    pub fn resource(&self) -> &'static str {
        match self {
            Subject::Product => "products",
            Subject::Order => "orders",
            Subject::Customer => "customers",
            Subject::Role => "roles",
            Subject::Permission => "permissions",
            Subject::User => "users",
            Subject::TaxRule => "tax-rules",
            Subject::Plan => "plans",
            Subject::SiteSetting => "site-settings",
            Subject::Complaint => "complaints",
            Subject::ReturnRequest => "returns",
            Subject::RefundRequest => "refunds",
            Subject::Review => "reviews",
            Subject::DeliveryTracking => "delivery-tracking",
            Subject::Invoice => "invoices",
            Subject::All => "all",
        }
    }
}

/// Builds the permission key for a pair, e.g. `tax-rules:update`
pub fn permission_key(action: Action, subject: Subject) -> String {
    format!("{}:{}", subject.resource(), action)
}

lazy_static! {
    /// Every recognised permission key and the capability it grants
    pub static ref ABILITY_MAP: HashMap<String, (Action, Subject)> = {
        use strum::IntoEnumIterator;

        let mut map = HashMap::new();
        for subject in Subject::iter() {
            for action in Action::iter() {
                map.insert(permission_key(action, subject), (action, subject));
            }
        }
        // Legacy spelling kept by older dashboards
        map.insert("admin".to_string(), (Action::Manage, Subject::All));
        map
    };
}

/// Looks up a key; `None` for keys the map does not know
pub fn lookup(key: &str) -> Option<(Action, Subject)> {
    ABILITY_MAP.get(key.trim()).copied()
}

/// True when `key` is a recognised permission key
pub fn is_known_key(key: &str) -> bool {
    lookup(key).is_some()
}

/// Capabilities resolved from a set of permission keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ability {
    rules: Vec<(Action, Subject)>,
}

impl Ability {
    /// Resolves keys through the ability map; unknown keys are skipped
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for key in keys {
            match lookup(key.as_ref()) {
                Some(rule) if !rules.contains(&rule) => rules.push(rule),
                Some(_) => {}
                None => warn!(permission = key.as_ref(), "ignoring unknown permission key"),
            }
        }
        Self { rules }
    }

    pub fn can(&self, action: Action, subject: Subject) -> bool {
        self.rules.iter().any(|(rule_action, rule_subject)| {
            (*rule_action == Action::Manage || *rule_action == action)
                && (*rule_subject == Subject::All || *rule_subject == subject)
        })
    }

    pub fn rules(&self) -> &[(Action, Subject)] {
        &self.rules
    }

    /// Rules rendered as `{action, subject}` pairs for API responses
    pub fn describe(&self) -> Vec<serde_json::Value> {
        self.rules
            .iter()
            .map(|(action, subject)| {
                serde_json::json!({ "action": action, "subject": subject })
            })
            .collect()
    }
}

impl FromStr for Ability {
    type Err = std::convert::Infallible;

    /// Parses a comma-separated key list
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Ability::from_keys(
            s.split(',').map(str::trim).filter(|k| !k.is_empty()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("products:read", Action::Read, Subject::Product)]
    #[case("tax-rules:update", Action::Update, Subject::TaxRule)]
    #[case("delivery-tracking:manage", Action::Manage, Subject::DeliveryTracking)]
    #[case("all:manage", Action::Manage, Subject::All)]
    #[case("admin", Action::Manage, Subject::All)]
    fn known_keys_resolve(#[case] key: &str, #[case] action: Action, #[case] subject: Subject) {
        assert_eq!(lookup(key), Some((action, subject)));
    }

    #[test]
    fn unknown_keys_grant_nothing() {
        let ability = Ability::from_keys(["products:fly", "warehouses:read", ""]);
        assert!(ability.rules().is_empty());
        assert!(!ability.can(Action::Read, Subject::Product));
    }

    #[test]
    fn manage_implies_every_action_on_its_subject() {
        let ability = Ability::from_keys(["orders:manage"]);
        for action in [Action::Read, Action::Create, Action::Update, Action::Delete] {
            assert!(ability.can(action, Subject::Order));
        }
        assert!(!ability.can(Action::Read, Subject::Product));
    }

    #[test]
    fn all_subject_matches_everything() {
        let ability = Ability::from_keys(["all:read"]);
        assert!(ability.can(Action::Read, Subject::Plan));
        assert!(ability.can(Action::Read, Subject::Invoice));
        assert!(!ability.can(Action::Delete, Subject::Plan));
    }

    #[test]
    fn duplicate_keys_collapse() {
        let ability: Ability = "reviews:read, reviews:read,reviews:delete".parse().unwrap();
        assert_eq!(ability.rules().len(), 2);
    }

    #[test]
    fn permission_key_round_trips_through_map() {
        let key = permission_key(Action::Create, Subject::RefundRequest);
        assert_eq!(key, "refunds:create");
        assert!(is_known_key(&key));
    }
}
