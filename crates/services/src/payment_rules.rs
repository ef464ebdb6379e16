use std::collections::HashMap;

use exam_core::model::{ApplicableObject, EntityStatus, PaymentRule, RuleId};
use exam_core::Clock;
use uuid::Uuid;

use crate::error::CatalogError;

/// Write model for a payment rule.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRuleForm {
    pub code: String,
    pub display_name: String,
    pub applicable_to: Vec<ApplicableObject>,
    pub param_placeholder: String,
    pub description: String,
    pub status: EntityStatus,
    pub order: u32,
}

/// In-memory store for the payment rule catalog.
pub struct PaymentRuleCatalog {
    clock: Clock,
    rules: HashMap<RuleId, PaymentRule>,
    order: Vec<RuleId>,
}

impl PaymentRuleCatalog {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            rules: HashMap::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn rule(&self, id: &RuleId) -> Option<&PaymentRule> {
        self.rules.get(id)
    }

    /// Looks a rule up by its stable code (`T001`, …).
    #[must_use]
    pub fn rule_by_code(&self, code: &str) -> Option<&PaymentRule> {
        self.rules.values().find(|rule| rule.code == code)
    }

    /// All rules sorted by `order`.
    #[must_use]
    pub fn rules(&self) -> Vec<&PaymentRule> {
        let mut rules: Vec<&PaymentRule> = self
            .order
            .iter()
            .filter_map(|id| self.rules.get(id))
            .collect();
        rules.sort_by_key(|rule| rule.order);
        rules
    }

    /// Active rules applicable to the given object kind, sorted by `order`.
    #[must_use]
    pub fn active_rules_for(&self, object: ApplicableObject) -> Vec<&PaymentRule> {
        let mut rules: Vec<&PaymentRule> = self
            .rules
            .values()
            .filter(|rule| rule.status.is_active() && rule.applies_to(object))
            .collect();
        rules.sort_by_key(|rule| rule.order);
        rules
    }

    /// Adds a rule; codes are expected unique but left to the operator.
    pub fn add_rule(&mut self, form: PaymentRuleForm) -> PaymentRule {
        let rule = PaymentRule {
            id: RuleId::new(format!("rule-{}", Uuid::new_v4())),
            code: form.code,
            display_name: form.display_name,
            applicable_to: form.applicable_to,
            param_placeholder: form.param_placeholder,
            description: form.description,
            status: form.status,
            order: form.order,
            created_at: self.clock.now(),
        };
        self.order.push(rule.id.clone());
        self.rules.insert(rule.id.clone(), rule.clone());
        rule
    }

    /// Flips a rule's status.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn toggle_rule_status(&mut self, id: &RuleId) -> Result<(), CatalogError> {
        let rule = self
            .rules
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "rule" })?;
        rule.status = rule.status.toggled();
        Ok(())
    }

    /// Sets a rule's order value.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    pub fn set_rule_order(&mut self, id: &RuleId, order: u32) -> Result<(), CatalogError> {
        let rule = self
            .rules
            .get_mut(id)
            .ok_or(CatalogError::NotFound { entity: "rule" })?;
        rule.order = order;
        Ok(())
    }

    /// Applies a batch of order updates; the first unknown id aborts.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` when an id is unknown; updates
    /// applied before the failing entry stay applied.
    pub fn batch_set_rule_orders(
        &mut self,
        updates: &[(RuleId, u32)],
    ) -> Result<(), CatalogError> {
        for (id, order) in updates {
            self.set_rule_order(id, *order)?;
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
