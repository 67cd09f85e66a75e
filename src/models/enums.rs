use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl OrderStatus {
    /// Every status an order may be moved to
    pub const ALL: [OrderStatus; 2] = [OrderStatus::InProgress, OrderStatus::Completed];

    /// Status assigned to every newly created order
    pub fn initial() -> Self {
        OrderStatus::InProgress
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::InProgress => "in progress",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    // Matching is exact: "Completed" or " completed" are not valid statuses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            _ => Err(format!("Invalid order status: {}", s)),
        }
    }
}
