pub mod stripe;

use crate::models::statuses::PaymentStatus;

/// Fixed mapping from gateway-reported intent states to our payment status.
/// Unknown states are rejected rather than defaulted.
pub fn map_gateway_status(gateway_status: &str) -> Option<PaymentStatus> {
    match gateway_status {
        "requires_payment_method"
        | "requires_confirmation"
        | "requires_action"
        | "processing"
        | "requires_capture" => Some(PaymentStatus::Pending),
        "succeeded" => Some(PaymentStatus::Completed),
        "canceled" | "failed" => Some(PaymentStatus::Failed),
        "refunded" => Some(PaymentStatus::Refunded),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_intent_states_to_payment_status() {
        assert_eq!(map_gateway_status("succeeded"), Some(PaymentStatus::Completed));
        assert_eq!(map_gateway_status("processing"), Some(PaymentStatus::Pending));
        assert_eq!(
            map_gateway_status("requires_capture"),
            Some(PaymentStatus::Pending)
        );
        assert_eq!(map_gateway_status("canceled"), Some(PaymentStatus::Failed));
        assert_eq!(map_gateway_status("refunded"), Some(PaymentStatus::Refunded));
        assert_eq!(map_gateway_status("mystery"), None);
    }

    #[test]
    fn internal_status_names_are_not_gateway_states() {
        assert_eq!(map_gateway_status("pending"), None);
        assert_eq!(map_gateway_status("completed"), None);
    }
}
