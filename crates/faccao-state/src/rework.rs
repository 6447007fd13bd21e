//! # Rework Derivation
//!
//! Rejected pieces are re-sewn under a new child order linked to the parent.
//! The parent keeps its status. It only counts how many pieces have already
//! gone to rework, so the rejected batch cannot be reworked twice.

use chrono::Utc;

use crate::error::TransitionError;
use crate::order::{Order, OrderDraft};
use crate::policy::TransitionPolicy;
use crate::table::{Actor, DerivedActionKind};

/// Build the draft for a rework order of `parent`.
///
/// `available` is the rejected count from the parent's quality review (or
/// the whole order when no review was stored) minus the pieces already
/// reworked. `quantity` defaults to `available` and must lie in
/// `1..=available`. The parent is not modified; see [`reserve_rework`].
///
/// # Errors
///
/// Whatever [`TransitionPolicy::authorize_derived`] rejects, or
/// [`TransitionError::ReworkQuantity`].
pub fn derive_rework(
    parent: &Order,
    policy: &TransitionPolicy,
    actor: Actor,
    quantity: Option<u32>,
    notes: Option<&str>,
) -> Result<OrderDraft, TransitionError> {
    policy.authorize_derived(parent.status, DerivedActionKind::ReworkOrder, actor, notes)?;

    let available = parent
        .review
        .as_ref()
        .map_or(parent.quantity, |r| r.rejected)
        .saturating_sub(parent.reworked_quantity);
    let requested = quantity.unwrap_or(available);
    if requested == 0 || requested > available {
        return Err(TransitionError::ReworkQuantity {
            requested,
            available,
        });
    }

    tracing::info!(
        parent_order_id = %parent.id,
        quantity = requested,
        "rework derived"
    );

    Ok(OrderDraft {
        brand_id: parent.brand_id,
        supplier_id: parent.supplier_id,
        reference: format!("{} (rework)", parent.reference),
        quantity: requested,
        unit_price_cents: parent.unit_price_cents,
        parent_order_id: Some(parent.id),
        notes: notes.map(str::to_string),
    })
}

/// Derive a rework draft and count its pieces against `parent`.
///
/// Callers serialize this with other writers of the parent (the API runs it
/// under the store lock), so concurrent requests cannot both claim the same
/// pieces.
///
/// # Errors
///
/// As [`derive_rework`]. The parent is unchanged on error.
pub fn reserve_rework(
    parent: &mut Order,
    policy: &TransitionPolicy,
    actor: Actor,
    quantity: Option<u32>,
    notes: Option<&str>,
) -> Result<OrderDraft, TransitionError> {
    let draft = derive_rework(parent, policy, actor, quantity, notes)?;
    parent.reworked_quantity = parent.reworked_quantity.saturating_add(draft.quantity);
    parent.updated_at = Utc::now();
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::TransitionRequest;
    use crate::review::QualityReview;
    use crate::status::OrderStatus;
    use faccao_core::CompanyId;

    fn confirmed() -> TransitionRequest {
        TransitionRequest {
            confirmed: true,
            ..Default::default()
        }
    }

    fn under_review(rejected: u32) -> Order {
        let p = TransitionPolicy::standard();
        let mut o = Order::open(OrderDraft {
            brand_id: CompanyId::new(),
            supplier_id: CompanyId::new(),
            reference: "FW25-COAT-002".to_string(),
            quantity: 50,
            unit_price_cents: 4_200,
            parent_order_id: None,
            notes: None,
        })
        .unwrap();
        o.transition(&p, OrderStatus::Accepted, Actor::Supplier, confirmed()).unwrap();
        o.transition(&p, OrderStatus::MaterialsInTransit, Actor::Brand, confirmed()).unwrap();
        o.transition(&p, OrderStatus::InProduction, Actor::Supplier, confirmed()).unwrap();
        o.transition(
            &p,
            OrderStatus::QualityReview,
            Actor::Supplier,
            TransitionRequest {
                confirmed: true,
                notes: None,
                review: Some(QualityReview {
                    approved: 50 - rejected,
                    rejected,
                    second_quality: 0,
                    notes: None,
                }),
            },
        )
        .unwrap();
        o
    }

    #[test]
    fn defaults_to_rejected_count() {
        let parent = under_review(6);
        let draft = derive_rework(
            &parent,
            &TransitionPolicy::standard(),
            Actor::Brand,
            None,
            Some("loose hems on the left sleeve"),
        )
        .unwrap();
        assert_eq!(draft.quantity, 6);
        assert_eq!(draft.parent_order_id, Some(parent.id));
        assert_eq!(draft.brand_id, parent.brand_id);
        assert_eq!(draft.supplier_id, parent.supplier_id);
        assert_eq!(draft.unit_price_cents, parent.unit_price_cents);
    }

    #[test]
    fn parent_status_is_untouched() {
        let parent = under_review(6);
        let before = parent.transitions.len();
        let p = TransitionPolicy::standard();
        derive_rework(&parent, &p, Actor::Brand, Some(3), Some("hems")).unwrap();
        assert_eq!(parent.status, OrderStatus::QualityReview);
        assert_eq!(parent.transitions.len(), before);
        assert_eq!(parent.reworked_quantity, 0);
    }

    #[test]
    fn supplier_cannot_request_rework() {
        let parent = under_review(6);
        let p = TransitionPolicy::standard();
        let err = derive_rework(&parent, &p, Actor::Supplier, None, Some("x")).unwrap_err();
        assert!(matches!(err, TransitionError::DerivedActionUnavailable { .. }));
    }

    #[test]
    fn notes_are_mandatory() {
        let parent = under_review(6);
        let p = TransitionPolicy::standard();
        let err = derive_rework(&parent, &p, Actor::Brand, None, Some("  ")).unwrap_err();
        assert_eq!(
            err,
            TransitionError::DerivedActionNotesRequired {
                kind: DerivedActionKind::ReworkOrder
            }
        );
    }

    #[test]
    fn quantity_bounds() {
        let parent = under_review(6);
        let p = TransitionPolicy::standard();
        assert_eq!(
            derive_rework(&parent, &p, Actor::Brand, Some(7), Some("x")).unwrap_err(),
            TransitionError::ReworkQuantity { requested: 7, available: 6 }
        );
        assert!(derive_rework(&parent, &p, Actor::Brand, Some(0), Some("x")).is_err());
        assert!(derive_rework(&parent, &p, Actor::Brand, Some(6), Some("x")).is_ok());
    }

    #[test]
    fn nothing_rejected_means_nothing_to_rework() {
        let parent = under_review(0);
        let p = TransitionPolicy::standard();
        let err = derive_rework(&parent, &p, Actor::Brand, None, Some("x")).unwrap_err();
        assert_eq!(err, TransitionError::ReworkQuantity { requested: 0, available: 0 });
    }

    #[test]
    fn unavailable_outside_review() {
        let mut parent = under_review(6);
        parent.status = OrderStatus::Approved;
        let p = TransitionPolicy::standard();
        assert!(derive_rework(&parent, &p, Actor::Brand, None, Some("x")).is_err());
    }

    #[test]
    fn reserved_pieces_bound_later_requests() {
        let mut parent = under_review(6);
        let p = TransitionPolicy::standard();

        let first = reserve_rework(&mut parent, &p, Actor::Brand, Some(4), Some("hems")).unwrap();
        assert_eq!(first.quantity, 4);
        assert_eq!(parent.reworked_quantity, 4);
        assert_eq!(parent.status, OrderStatus::QualityReview);

        let err = reserve_rework(&mut parent, &p, Actor::Brand, Some(3), Some("more")).unwrap_err();
        assert_eq!(err, TransitionError::ReworkQuantity { requested: 3, available: 2 });
        assert_eq!(parent.reworked_quantity, 4);

        let rest = reserve_rework(&mut parent, &p, Actor::Brand, None, Some("rest")).unwrap();
        assert_eq!(rest.quantity, 2);
        assert_eq!(parent.reworked_quantity, 6);

        let err = reserve_rework(&mut parent, &p, Actor::Brand, None, Some("again")).unwrap_err();
        assert_eq!(err, TransitionError::ReworkQuantity { requested: 0, available: 0 });
    }

    #[test]
    fn repeated_requests_never_exceed_rejected() {
        let mut parent = under_review(6);
        let p = TransitionPolicy::standard();
        let total: u32 = (0..5)
            .filter_map(|_| reserve_rework(&mut parent, &p, Actor::Brand, Some(2), Some("x")).ok())
            .map(|d| d.quantity)
            .sum();
        assert_eq!(total, 6);
        assert_eq!(parent.reworked_quantity, 6);
    }

    #[test]
    fn reworked_quantity_defaults_when_absent() {
        let parent = under_review(6);
        let mut json = serde_json::to_value(&parent).unwrap();
        json.as_object_mut().unwrap().remove("reworked_quantity");
        let restored: Order = serde_json::from_value(json).unwrap();
        assert_eq!(restored.reworked_quantity, 0);
    }
}
