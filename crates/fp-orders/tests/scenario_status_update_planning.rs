use fp_orders::*;
use fp_schemas::{OrderStatus, PaymentStatus};

fn state(status: OrderStatus, pay: PaymentStatus) -> CurrentState {
    CurrentState {
        status,
        payment_status: pay,
    }
}

#[test]
fn scenario_admin_status_change_appends_default_note() {
    let req = StatusUpdateRequest {
        status: Some(OrderStatus::Printing),
        ..Default::default()
    };
    let plan = plan_admin_update(state(OrderStatus::PaymentConfirmed, PaymentStatus::Completed), &req);

    assert_eq!(plan.status, Some(OrderStatus::Printing));
    assert_eq!(plan.history.len(), 1);
    assert_eq!(plan.history[0].notes.as_deref(), Some(NOTE_ADMIN_STATUS));
    assert!(!plan.non_forward);
    assert!(!plan.set_delivered_at);
}

#[test]
fn scenario_admin_same_status_is_noop() {
    let req = StatusUpdateRequest {
        status: Some(OrderStatus::Printing),
        payment_status: Some(PaymentStatus::Completed),
        ..Default::default()
    };
    let plan = plan_admin_update(state(OrderStatus::Printing, PaymentStatus::Completed), &req);
    assert!(plan.is_noop());
    assert!(plan.history.is_empty());
}

#[test]
fn scenario_admin_payment_completion_auto_advances_pending() {
    let req = StatusUpdateRequest {
        payment_status: Some(PaymentStatus::Completed),
        ..Default::default()
    };
    let plan = plan_admin_update(state(OrderStatus::Pending, PaymentStatus::Pending), &req);

    assert_eq!(plan.payment_status, Some(PaymentStatus::Completed));
    assert_eq!(plan.status, Some(OrderStatus::PaymentConfirmed));
    assert!(plan.set_paid_at);
    assert_eq!(plan.history.len(), 1);
    assert_eq!(plan.history[0].notes.as_deref(), Some(NOTE_ADMIN_PAYMENT));
}

#[test]
fn scenario_admin_payment_completion_does_not_override_explicit_status() {
    let req = StatusUpdateRequest {
        status: Some(OrderStatus::Printing),
        payment_status: Some(PaymentStatus::Completed),
        note: Some("paid at counter".to_string()),
        ..Default::default()
    };
    let plan = plan_admin_update(state(OrderStatus::Pending, PaymentStatus::Pending), &req);

    assert_eq!(plan.status, Some(OrderStatus::Printing));
    assert_eq!(plan.history.len(), 1);
    assert_eq!(plan.history[0].notes.as_deref(), Some("paid at counter"));
}

#[test]
fn scenario_admin_may_move_backwards_but_it_is_flagged() {
    let req = StatusUpdateRequest {
        status: Some(OrderStatus::Printing),
        ..Default::default()
    };
    let plan = plan_admin_update(state(OrderStatus::Delivered, PaymentStatus::Completed), &req);
    assert_eq!(plan.status, Some(OrderStatus::Printing));
    assert!(plan.non_forward);

    let deliver = StatusUpdateRequest {
        status: Some(OrderStatus::Delivered),
        ..Default::default()
    };
    let plan = plan_admin_update(state(OrderStatus::OutForDelivery, PaymentStatus::Completed), &deliver);
    assert!(plan.set_delivered_at);
    assert!(!plan.non_forward);
}

#[test]
fn scenario_owner_payment_flow_confirms_pending_order() {
    let req = StatusUpdateRequest {
        status: Some(OrderStatus::PaymentConfirmed),
        payment_status: Some(PaymentStatus::Completed),
        payment_id: Some("  UPI123456  ".to_string()),
        note: Some(NOTE_CUSTOMER_PAYMENT.to_string()),
    };
    let plan = plan_owner_update(state(OrderStatus::Pending, PaymentStatus::Pending), &req).unwrap();

    assert_eq!(plan.status, Some(OrderStatus::PaymentConfirmed));
    assert_eq!(plan.payment_status, Some(PaymentStatus::Completed));
    assert_eq!(plan.payment_id.as_deref(), Some("UPI123456"));
    assert!(plan.set_paid_at);
    assert_eq!(plan.history.len(), 1);
    assert_eq!(plan.history[0].notes.as_deref(), Some(NOTE_CUSTOMER_PAYMENT));
}

#[test]
fn scenario_owner_status_without_note_records_no_note() {
    let req = StatusUpdateRequest {
        status: Some(OrderStatus::PaymentConfirmed),
        payment_status: Some(PaymentStatus::Completed),
        note: Some("   ".to_string()),
        ..Default::default()
    };
    let plan = plan_owner_update(state(OrderStatus::Pending, PaymentStatus::Pending), &req).unwrap();
    assert_eq!(plan.history.len(), 1);
    assert_eq!(plan.history[0].status, OrderStatus::PaymentConfirmed);
    assert_eq!(plan.history[0].notes, None);

    // Payment alone still auto-advances with its own note.
    let pay_only = StatusUpdateRequest {
        payment_status: Some(PaymentStatus::Completed),
        ..Default::default()
    };
    let plan = plan_owner_update(state(OrderStatus::Pending, PaymentStatus::Pending), &pay_only).unwrap();
    assert_eq!(plan.history[0].notes.as_deref(), Some(NOTE_CUSTOMER_PAYMENT));
}

#[test]
fn scenario_owner_cannot_set_other_statuses() {
    let req = StatusUpdateRequest {
        status: Some(OrderStatus::Delivered),
        ..Default::default()
    };
    let err = plan_owner_update(state(OrderStatus::Pending, PaymentStatus::Pending), &req).unwrap_err();
    assert_eq!(err.to_string(), "Unauthorized to update status");
}

#[test]
fn scenario_owner_never_regresses_a_later_stage() {
    let req = StatusUpdateRequest {
        status: Some(OrderStatus::PaymentConfirmed),
        ..Default::default()
    };
    let plan = plan_owner_update(state(OrderStatus::Printing, PaymentStatus::Completed), &req).unwrap();
    assert!(plan.is_noop());
}

#[test]
fn scenario_update_request_accepts_notes_alias() {
    let req: StatusUpdateRequest =
        serde_json::from_str(r#"{"status":"CANCELLED","notes":"customer asked"}"#).unwrap();
    assert_eq!(req.status, Some(OrderStatus::Cancelled));
    assert_eq!(req.note.as_deref(), Some("customer asked"));
}
