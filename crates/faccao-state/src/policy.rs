//! # Transition Policy
//!
//! Reads the transition table for a given status and answers three
//! questions for the order-detail screen: can the order move on, who is it
//! waiting on, and which buttons should be shown.
//!
//! Evaluation is pure. The same status always yields the same
//! [`TransitionResponse`]; nothing is cached or stored. Authorization
//! ([`TransitionPolicy::authorize`]) reads the same table, so what the
//! screen offers and what the write path accepts cannot drift apart.
//!
//! The policy assumes it is fed a freshly read status. Serializing the
//! actual mutation against concurrent writers is the caller's job.

use faccao_core::Party;
use serde::Serialize;

use crate::error::TransitionError;
use crate::review::QualityReview;
use crate::status::OrderStatus;
use crate::table::{
    Actor, DerivedActionKind, DerivedActionRule, TransitionRule, DERIVED_ACTIONS,
    TRANSITION_TABLE, WAITING_LABELS,
};

/// Label used when a status has no row in the waiting table.
const NO_TRANSITIONS_LABEL: &str = "no transitions available";

/// One button the front-end may render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransition {
    /// Destination status.
    pub next_status: OrderStatus,
    /// Button text.
    pub label: &'static str,
    /// Longer explanation.
    pub description: &'static str,
    /// Who may trigger it.
    pub initiated_by: Actor,
    /// Must be explicitly confirmed.
    pub requires_confirmation: bool,
    /// Needs a free-text justification.
    pub requires_notes: bool,
    /// Needs a quality-review record.
    pub requires_review: bool,
    /// Whether the viewer may trigger it. Absent for viewer-less evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_to_viewer: Option<bool>,
}

impl From<&TransitionRule> for AvailableTransition {
    fn from(rule: &TransitionRule) -> Self {
        Self {
            next_status: rule.to,
            label: rule.label,
            description: rule.description,
            initiated_by: rule.initiated_by,
            requires_confirmation: rule.requires_confirmation,
            requires_notes: rule.requires_notes,
            requires_review: rule.requires_review,
            available_to_viewer: None,
        }
    }
}

/// An entity-creating action offered alongside the status transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedAction {
    /// What gets created.
    pub kind: DerivedActionKind,
    /// Button text.
    pub label: &'static str,
    /// Longer explanation.
    pub description: &'static str,
    /// Who may trigger it.
    pub initiated_by: Actor,
    /// Needs a free-text justification.
    pub requires_notes: bool,
    /// Whether the viewer may trigger it. Absent for viewer-less evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_to_viewer: Option<bool>,
}

impl From<&DerivedActionRule> for DerivedAction {
    fn from(rule: &DerivedActionRule) -> Self {
        Self {
            kind: rule.kind,
            label: rule.label,
            description: rule.description,
            initiated_by: rule.initiated_by,
            requires_notes: rule.requires_notes,
            available_to_viewer: None,
        }
    }
}

/// Read-only view of where an order stands. Recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    /// The status that was evaluated, as persisted.
    pub current_status: String,
    /// True iff the order has a non-cancelling way forward.
    pub can_advance: bool,
    /// The party whose action moves the order on; `None` when terminal or
    /// waiting on an automatic process.
    pub waiting_for: Option<Party>,
    /// What is being waited on, in words.
    pub waiting_label: String,
    /// Reachable statuses in table order.
    pub transitions: Vec<AvailableTransition>,
    /// Actions that create a linked order instead of moving this one.
    pub derived_actions: Vec<DerivedAction>,
    /// Whether the viewer is the party being waited on. Absent for
    /// viewer-less evaluation. A viewer may still hold a cancellation (see
    /// [`AvailableTransition::available_to_viewer`]) without being waited on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_can_act: Option<bool>,
}

impl TransitionResponse {
    fn closed(current_status: impl Into<String>, waiting_label: &str) -> Self {
        Self {
            current_status: current_status.into(),
            can_advance: false,
            waiting_for: None,
            waiting_label: waiting_label.to_string(),
            transitions: Vec::new(),
            derived_actions: Vec::new(),
            viewer_can_act: None,
        }
    }

    fn for_viewer(mut self, viewer: Party) -> Self {
        let actor = Actor::from(viewer);
        for t in &mut self.transitions {
            t.available_to_viewer = Some(t.initiated_by == actor);
        }
        for a in &mut self.derived_actions {
            a.available_to_viewer = Some(a.initiated_by == actor);
        }
        self.viewer_can_act = Some(self.waiting_for == Some(viewer));
        self
    }
}

/// What the actor sends along with a transition request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionRequest {
    /// The actor explicitly confirmed the move.
    pub confirmed: bool,
    /// Free-text justification.
    pub notes: Option<String>,
    /// Quality-review record, for review submissions.
    pub review: Option<QualityReview>,
}

impl TransitionRequest {
    fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

/// Evaluator over a transition table.
#[derive(Debug, Clone, Copy)]
pub struct TransitionPolicy {
    rules: &'static [TransitionRule],
    derived: &'static [DerivedActionRule],
    waiting: &'static [(OrderStatus, &'static str)],
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl TransitionPolicy {
    /// Policy over the platform's order lifecycle table.
    pub fn standard() -> Self {
        Self::new(TRANSITION_TABLE, DERIVED_ACTIONS, WAITING_LABELS)
    }

    /// Policy over arbitrary tables.
    pub const fn new(
        rules: &'static [TransitionRule],
        derived: &'static [DerivedActionRule],
        waiting: &'static [(OrderStatus, &'static str)],
    ) -> Self {
        Self {
            rules,
            derived,
            waiting,
        }
    }

    /// Rules leaving `status`, in table order.
    pub fn rules_from(&self, status: OrderStatus) -> impl Iterator<Item = &'static TransitionRule> {
        let rules = self.rules;
        rules.iter().filter(move |r| r.from == status)
    }

    /// The rule for one edge, if the table has it.
    pub fn rule(&self, from: OrderStatus, to: OrderStatus) -> Option<&'static TransitionRule> {
        let rules = self.rules;
        rules.iter().find(|r| r.from == from && r.to == to)
    }

    /// Derived actions offered from `status`, in table order.
    pub fn derived_actions_from(
        &self,
        status: OrderStatus,
    ) -> impl Iterator<Item = &'static DerivedActionRule> {
        let derived = self.derived;
        derived.iter().filter(move |a| a.from == status)
    }

    fn waiting_label(&self, status: OrderStatus) -> &'static str {
        self.waiting
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, label)| *label)
            .unwrap_or(NO_TRANSITIONS_LABEL)
    }

    /// Evaluate `status` without a viewer.
    pub fn evaluate(&self, status: OrderStatus) -> TransitionResponse {
        let label = self.waiting_label(status);
        if status.is_terminal() {
            return TransitionResponse::closed(status.as_str(), label);
        }

        let rules: Vec<&TransitionRule> = self.rules_from(status).collect();
        if rules.is_empty() {
            tracing::warn!(
                status = status.as_str(),
                "status has no outgoing rules; treating as terminal"
            );
            return TransitionResponse::closed(status.as_str(), NO_TRANSITIONS_LABEL);
        }

        let waiting_actor = rules
            .iter()
            .find(|r| !r.is_cancellation())
            .map(|r| r.initiated_by);

        TransitionResponse {
            current_status: status.as_str().to_string(),
            can_advance: waiting_actor.is_some(),
            waiting_for: waiting_actor.and_then(|a| a.party()),
            waiting_label: label.to_string(),
            transitions: rules.into_iter().map(AvailableTransition::from).collect(),
            derived_actions: self
                .derived_actions_from(status)
                .map(DerivedAction::from)
                .collect(),
            viewer_can_act: None,
        }
    }

    /// Evaluate `status` as seen by `viewer`.
    pub fn evaluate_for(&self, status: OrderStatus, viewer: Party) -> TransitionResponse {
        self.evaluate(status).for_viewer(viewer)
    }

    /// Evaluate a persisted status tag.
    ///
    /// An unrecognized tag is a data-integrity problem, not a user error: it
    /// is logged and answered with an empty, non-advancing response.
    pub fn evaluate_raw(&self, status: &str, viewer: Option<Party>) -> TransitionResponse {
        match OrderStatus::from_name(status) {
            Some(s) => match viewer {
                Some(v) => self.evaluate_for(s, v),
                None => self.evaluate(s),
            },
            None => {
                tracing::warn!(status, "unknown order status in persisted data");
                let response = TransitionResponse::closed(status, NO_TRANSITIONS_LABEL);
                match viewer {
                    Some(v) => response.for_viewer(v),
                    None => response,
                }
            }
        }
    }

    /// Check a requested move against the table.
    ///
    /// Returns the matching rule so the caller can apply its side effects
    /// (for example, storing the review record).
    ///
    /// # Errors
    ///
    /// One [`TransitionError`] per unmet requirement, checked in order:
    /// terminal source, unknown edge, wrong actor, confirmation, notes,
    /// review presence.
    pub fn authorize(
        &self,
        current: OrderStatus,
        target: OrderStatus,
        actor: Actor,
        request: &TransitionRequest,
    ) -> Result<&'static TransitionRule, TransitionError> {
        if current.is_terminal() {
            return Err(TransitionError::Terminal(current));
        }
        let rule = self
            .rule(current, target)
            .ok_or(TransitionError::NotAllowed {
                from: current,
                to: target,
            })?;
        if rule.initiated_by != actor {
            return Err(TransitionError::WrongActor {
                from: current,
                to: target,
                actor,
                expected: rule.initiated_by,
            });
        }
        if rule.requires_confirmation && !request.confirmed {
            return Err(TransitionError::ConfirmationRequired {
                from: current,
                to: target,
            });
        }
        if rule.requires_notes && !request.has_notes() {
            return Err(TransitionError::NotesRequired {
                from: current,
                to: target,
            });
        }
        if rule.requires_review && request.review.is_none() {
            return Err(TransitionError::ReviewRequired {
                from: current,
                to: target,
            });
        }
        Ok(rule)
    }

    /// Check a requested derived action against the table.
    ///
    /// # Errors
    ///
    /// [`TransitionError::DerivedActionUnavailable`] when the action is not
    /// offered from `current` to `actor`;
    /// [`TransitionError::DerivedActionNotesRequired`] when notes are blank.
    pub fn authorize_derived(
        &self,
        current: OrderStatus,
        kind: DerivedActionKind,
        actor: Actor,
        notes: Option<&str>,
    ) -> Result<&'static DerivedActionRule, TransitionError> {
        let rule = self
            .derived_actions_from(current)
            .find(|a| a.kind == kind && a.initiated_by == actor)
            .ok_or(TransitionError::DerivedActionUnavailable {
                from: current,
                kind,
                actor,
            })?;
        if rule.requires_notes && notes.map_or(true, |n| n.trim().is_empty()) {
            return Err(TransitionError::DerivedActionNotesRequired { kind });
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TransitionPolicy {
        TransitionPolicy::standard()
    }

    fn review() -> QualityReview {
        QualityReview {
            approved: 90,
            rejected: 8,
            second_quality: 2,
            notes: None,
        }
    }

    // ── Evaluation ───────────────────────────────────────────────────

    #[test]
    fn every_status_evaluates() {
        for status in OrderStatus::ALL {
            let r = policy().evaluate(status);
            assert_eq!(r.current_status, status.as_str());
            let expected: Vec<OrderStatus> = policy().rules_from(status).map(|r| r.to).collect();
            let got: Vec<OrderStatus> = r.transitions.iter().map(|t| t.next_status).collect();
            assert_eq!(got, expected, "{status}");
        }
    }

    #[test]
    fn terminal_statuses_are_closed() {
        for status in [OrderStatus::Completed, OrderStatus::Declined, OrderStatus::Cancelled] {
            let r = policy().evaluate(status);
            assert!(!r.can_advance);
            assert_eq!(r.waiting_for, None);
            assert!(r.transitions.is_empty());
            assert!(r.derived_actions.is_empty());
        }
    }

    #[test]
    fn created_waits_on_supplier() {
        let r = policy().evaluate(OrderStatus::Created);
        assert!(r.can_advance);
        assert_eq!(r.waiting_for, Some(Party::Supplier));
        assert_eq!(r.waiting_label, "awaiting supplier response");
        assert_eq!(r.transitions.len(), 4);
    }

    #[test]
    fn delivered_waits_on_system() {
        let r = policy().evaluate(OrderStatus::Delivered);
        assert!(r.can_advance);
        assert_eq!(r.waiting_for, None);
        assert_eq!(r.waiting_label, "awaiting automatic settlement");
        assert_eq!(r.transitions[0].initiated_by, Actor::System);
    }

    #[test]
    fn evaluation_is_idempotent() {
        for status in OrderStatus::ALL {
            assert_eq!(policy().evaluate(status), policy().evaluate(status));
            assert_eq!(
                policy().evaluate_for(status, Party::Brand),
                policy().evaluate_for(status, Party::Brand)
            );
        }
    }

    #[test]
    fn production_to_review_scenario() {
        let before = policy().evaluate_for(OrderStatus::InProduction, Party::Brand);
        assert_eq!(before.waiting_for, Some(Party::Supplier));
        let submit = before
            .transitions
            .iter()
            .find(|t| t.next_status == OrderStatus::QualityReview)
            .unwrap();
        assert!(submit.requires_review);
        assert_eq!(submit.available_to_viewer, Some(false));
        assert_eq!(before.viewer_can_act, Some(false));

        let after = policy().evaluate_for(OrderStatus::QualityReview, Party::Brand);
        assert_eq!(after.waiting_for, Some(Party::Brand));
        assert_eq!(after.viewer_can_act, Some(true));
        assert_eq!(after.derived_actions.len(), 1);
        assert_eq!(after.derived_actions[0].kind, DerivedActionKind::ReworkOrder);
    }

    #[test]
    fn brand_can_cancel_while_waiting_on_supplier() {
        let r = policy().evaluate_for(OrderStatus::Created, Party::Brand);
        assert_eq!(r.waiting_for, Some(Party::Supplier));
        assert_eq!(r.viewer_can_act, Some(false));
        let cancel = r
            .transitions
            .iter()
            .find(|t| t.next_status == OrderStatus::Cancelled)
            .unwrap();
        assert_eq!(cancel.available_to_viewer, Some(true));
    }

    #[test]
    fn unknown_raw_status_is_empty_not_error() {
        let r = policy().evaluate_raw("LEGACY_STATUS", Some(Party::Brand));
        assert!(!r.can_advance);
        assert!(r.transitions.is_empty());
        assert_eq!(r.waiting_for, None);
        assert_eq!(r.current_status, "LEGACY_STATUS");
        assert_eq!(r.viewer_can_act, Some(false));
    }

    #[test]
    fn unknown_raw_status_without_viewer() {
        let r = policy().evaluate_raw("SOMETHING_ELSE", None);
        assert_eq!(r.current_status, "SOMETHING_ELSE");
        assert!(!r.can_advance);
        assert!(r.transitions.is_empty());
        assert!(r.derived_actions.is_empty());
        assert_eq!(r.waiting_for, None);
        assert_eq!(r.waiting_label, NO_TRANSITIONS_LABEL);
        assert_eq!(r.viewer_can_act, None);
    }

    #[test]
    fn viewer_can_act_only_when_waited_on() {
        for status in OrderStatus::ALL {
            for viewer in [Party::Brand, Party::Supplier] {
                let r = policy().evaluate_for(status, viewer);
                assert_eq!(
                    r.viewer_can_act,
                    Some(r.waiting_for == Some(viewer)),
                    "{status} as {viewer:?}"
                );
            }
        }
        let settling = policy().evaluate_for(OrderStatus::Delivered, Party::Brand);
        assert_eq!(settling.viewer_can_act, Some(false));
    }

    #[test]
    fn rule_lookup_matches_table() {
        let p = policy();
        assert!(p.rule(OrderStatus::Created, OrderStatus::Accepted).is_some());
        assert!(p.rule(OrderStatus::Created, OrderStatus::InProduction).is_none());
        assert!(p.rule(OrderStatus::Completed, OrderStatus::Created).is_none());
        assert_eq!(p.derived_actions_from(OrderStatus::QualityReview).count(), 1);
        assert_eq!(p.derived_actions_from(OrderStatus::Created).count(), 0);
    }

    #[test]
    fn known_raw_status_matches_typed() {
        assert_eq!(
            policy().evaluate_raw("IN_PRODUCTION", None),
            policy().evaluate(OrderStatus::InProduction)
        );
    }

    fn leak(rules: Vec<TransitionRule>) -> &'static [TransitionRule] {
        Box::leak(rules.into_boxed_slice())
    }

    #[test]
    fn status_missing_from_table_is_closed() {
        let partial = TransitionPolicy::new(leak(vec![TRANSITION_TABLE[0]]), &[], &[]);
        let r = partial.evaluate(OrderStatus::InProduction);
        assert!(!r.can_advance);
        assert!(r.transitions.is_empty());
        assert_eq!(r.waiting_label, NO_TRANSITIONS_LABEL);
    }

    #[test]
    fn cancellation_alone_does_not_advance() {
        let cancel = TRANSITION_TABLE[3];
        assert!(cancel.is_cancellation());
        let p = TransitionPolicy::new(leak(vec![cancel]), &[], WAITING_LABELS);
        let r = p.evaluate(OrderStatus::Created);
        assert!(!r.can_advance);
        assert_eq!(r.waiting_for, None);
        assert_eq!(r.transitions.len(), 1);
    }

    #[test]
    fn response_serializes_camel_case() {
        let json = serde_json::to_value(policy().evaluate(OrderStatus::InProduction)).unwrap();
        assert_eq!(json["canAdvance"], true);
        assert_eq!(json["waitingFor"], "SUPPLIER");
        assert_eq!(json["transitions"][0]["nextStatus"], "QUALITY_REVIEW");
        assert_eq!(json["transitions"][0]["requiresReview"], true);
        assert!(json.get("viewerCanAct").is_none());

        let closed = serde_json::to_value(policy().evaluate(OrderStatus::Completed)).unwrap();
        assert!(closed["waitingFor"].is_null());
    }

    // ── Authorization ────────────────────────────────────────────────

    #[test]
    fn authorize_happy_path() {
        let req = TransitionRequest {
            confirmed: true,
            ..Default::default()
        };
        let rule = policy()
            .authorize(OrderStatus::Created, OrderStatus::Accepted, Actor::Supplier, &req)
            .unwrap();
        assert_eq!(rule.to, OrderStatus::Accepted);
    }

    #[test]
    fn authorize_rejects_unknown_edge() {
        let err = policy()
            .authorize(
                OrderStatus::Created,
                OrderStatus::InProduction,
                Actor::Supplier,
                &TransitionRequest::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TransitionError::NotAllowed { .. }));
    }

    #[test]
    fn authorize_rejects_wrong_actor() {
        let req = TransitionRequest {
            confirmed: true,
            ..Default::default()
        };
        let err = policy()
            .authorize(OrderStatus::Created, OrderStatus::Accepted, Actor::Brand, &req)
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::WrongActor {
                from: OrderStatus::Created,
                to: OrderStatus::Accepted,
                actor: Actor::Brand,
                expected: Actor::Supplier,
            }
        );
    }

    #[test]
    fn authorize_requires_confirmation() {
        let err = policy()
            .authorize(
                OrderStatus::Created,
                OrderStatus::Accepted,
                Actor::Supplier,
                &TransitionRequest::default(),
            )
            .unwrap_err();
        assert!(matches!(err, TransitionError::ConfirmationRequired { .. }));
    }

    #[test]
    fn authorize_requires_non_blank_notes() {
        let req = TransitionRequest {
            confirmed: true,
            notes: Some("   ".to_string()),
            review: None,
        };
        let err = policy()
            .authorize(OrderStatus::Created, OrderStatus::Declined, Actor::Supplier, &req)
            .unwrap_err();
        assert!(matches!(err, TransitionError::NotesRequired { .. }));
    }

    #[test]
    fn authorize_requires_review() {
        let mut req = TransitionRequest {
            confirmed: true,
            ..Default::default()
        };
        let err = policy()
            .authorize(OrderStatus::InProduction, OrderStatus::QualityReview, Actor::Supplier, &req)
            .unwrap_err();
        assert!(matches!(err, TransitionError::ReviewRequired { .. }));

        req.review = Some(review());
        assert!(policy()
            .authorize(OrderStatus::InProduction, OrderStatus::QualityReview, Actor::Supplier, &req)
            .is_ok());
    }

    #[test]
    fn authorize_rejects_terminal_source() {
        let err = policy()
            .authorize(
                OrderStatus::Completed,
                OrderStatus::Cancelled,
                Actor::Brand,
                &TransitionRequest::default(),
            )
            .unwrap_err();
        assert_eq!(err, TransitionError::Terminal(OrderStatus::Completed));
    }

    #[test]
    fn system_settles_delivered_orders() {
        assert!(policy()
            .authorize(
                OrderStatus::Delivered,
                OrderStatus::Completed,
                Actor::System,
                &TransitionRequest::default(),
            )
            .is_ok());
        assert!(policy()
            .authorize(
                OrderStatus::Delivered,
                OrderStatus::Completed,
                Actor::Brand,
                &TransitionRequest::default(),
            )
            .is_err());
    }

    #[test]
    fn authorize_derived_rework() {
        assert!(policy()
            .authorize_derived(
                OrderStatus::QualityReview,
                DerivedActionKind::ReworkOrder,
                Actor::Brand,
                Some("seams open"),
            )
            .is_ok());
        assert_eq!(
            policy()
                .authorize_derived(
                    OrderStatus::QualityReview,
                    DerivedActionKind::ReworkOrder,
                    Actor::Brand,
                    None,
                )
                .unwrap_err(),
            TransitionError::DerivedActionNotesRequired {
                kind: DerivedActionKind::ReworkOrder
            }
        );
        assert!(matches!(
            policy()
                .authorize_derived(
                    OrderStatus::InProduction,
                    DerivedActionKind::ReworkOrder,
                    Actor::Brand,
                    Some("x"),
                )
                .unwrap_err(),
            TransitionError::DerivedActionUnavailable { .. }
        ));
        assert!(policy()
            .authorize_derived(
                OrderStatus::QualityReview,
                DerivedActionKind::ReworkOrder,
                Actor::Supplier,
                Some("x"),
            )
            .is_err());
    }
}
