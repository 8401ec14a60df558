use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Approved => "Approved",
            OrderStatus::Rejected => "Rejected",
            OrderStatus::Paid => "Paid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(OrderStatus::Pending),
            "Approved" => Some(OrderStatus::Approved),
            "Rejected" => Some(OrderStatus::Rejected),
            "Paid" => Some(OrderStatus::Paid),
            _ => None,
        }
    }

    /// Terminal statuses accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Paid)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderAction {
    Approve,
    Reject,
    Pay,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Approve => "approve",
            OrderAction::Reject => "reject",
            OrderAction::Pay => "pay",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub action: OrderAction,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} an order in status {}", self.action.as_str(), self.from)
    }
}

/// The order state machine. `Pending` may be approved or rejected by an
/// admin; an approved order may be marked paid once the external payment
/// completes. No transition skips a state and none reverses.
pub fn apply(from: OrderStatus, action: OrderAction) -> Result<OrderStatus, InvalidTransition> {
    match (from, action) {
        (OrderStatus::Pending, OrderAction::Approve) => Ok(OrderStatus::Approved),
        (OrderStatus::Pending, OrderAction::Reject) => Ok(OrderStatus::Rejected),
        (OrderStatus::Approved, OrderAction::Pay) => Ok(OrderStatus::Paid),
        _ => Err(InvalidTransition { from, action }),
    }
}
