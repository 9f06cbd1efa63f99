use fp_schemas::{OrderStatus, PaymentStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NOTE_ORDER_PLACED: &str = "Order placed successfully";
pub const NOTE_ADMIN_STATUS: &str = "Status updated by admin";
pub const NOTE_ADMIN_PAYMENT: &str = "Payment confirmed by admin";
pub const NOTE_CUSTOMER_PAYMENT: &str = "Payment confirmed by customer";

/// Body of a status / payment update, from either the admin panel or the
/// customer's payment page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    /// UPI transaction reference.
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default, alias = "notes")]
    pub note: Option<String>,
}

/// The fields of the order row the planner looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentState {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryDraft {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

/// What to write for one update: the changed columns plus the history rows
/// to append, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_id: Option<String>,
    pub set_paid_at: bool,
    pub set_delivered_at: bool,
    pub history: Vec<HistoryDraft>,
    /// The status change does not move forward through the pipeline. It is
    /// still applied.
    pub non_forward: bool,
}

impl UpdatePlan {
    pub fn is_noop(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none() && self.payment_id.is_none()
    }

    fn set_status(&mut self, current: OrderStatus, to: OrderStatus, notes: Option<String>) {
        self.status = Some(to);
        self.set_delivered_at = to == OrderStatus::Delivered;
        self.non_forward = !current.is_forward_move(to);
        self.history.push(HistoryDraft { status: to, notes });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpdateRefusal {
    #[error("Unauthorized to update status")]
    StatusNotAllowed { requested: OrderStatus },
}

fn non_empty(note: &Option<String>) -> Option<String> {
    note.as_ref()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

/// Apply the payment half of a request on top of any status change already
/// in `plan`.
fn plan_payment(
    plan: &mut UpdatePlan,
    current: CurrentState,
    req: &StatusUpdateRequest,
    auto_note: &str,
) {
    let Some(pay) = req.payment_status else {
        return;
    };
    if pay == current.payment_status {
        return;
    }

    plan.payment_status = Some(pay);
    if pay != PaymentStatus::Completed {
        return;
    }

    plan.set_paid_at = true;
    if let Some(id) = non_empty(&req.payment_id) {
        plan.payment_id = Some(id);
    }

    // Completing payment on a PENDING order advances it, unless the same
    // request already moved the status somewhere else.
    if current.status == OrderStatus::Pending && plan.status.is_none() {
        plan.set_status(
            current.status,
            OrderStatus::PaymentConfirmed,
            Some(auto_note.to_string()),
        );
    }
}

/// Admin update: any status may be set.
///
/// - A status different from the current one is applied and logged; the note
///   defaults to "Status updated by admin".
/// - A payment status different from the current one is applied. COMPLETED
///   stamps `paid_at` and auto-advances a PENDING order to PAYMENT_CONFIRMED.
/// - Requests that change nothing produce an empty plan.
pub fn plan_admin_update(current: CurrentState, req: &StatusUpdateRequest) -> UpdatePlan {
    let mut plan = UpdatePlan::default();

    if let Some(to) = req.status {
        if to != current.status {
            let notes = non_empty(&req.note).unwrap_or_else(|| NOTE_ADMIN_STATUS.to_string());
            plan.set_status(current.status, to, Some(notes));
        }
    }

    plan_payment(&mut plan, current, req, NOTE_ADMIN_PAYMENT);
    plan
}

/// Customer update from the payment page.
///
/// The only status a customer may request is PAYMENT_CONFIRMED, and it only
/// takes effect on a PENDING order; later stages are never regressed. An
/// explicit status keeps the caller's note as-is, possibly none.
pub fn plan_owner_update(
    current: CurrentState,
    req: &StatusUpdateRequest,
) -> Result<UpdatePlan, UpdateRefusal> {
    let mut plan = UpdatePlan::default();

    if let Some(to) = req.status {
        if to != OrderStatus::PaymentConfirmed {
            return Err(UpdateRefusal::StatusNotAllowed { requested: to });
        }
        if current.status == OrderStatus::Pending {
            plan.set_status(current.status, to, non_empty(&req.note));
        }
    }

    plan_payment(&mut plan, current, req, NOTE_CUSTOMER_PAYMENT);
    Ok(plan)
}
