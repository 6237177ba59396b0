// Static payment-method catalog. Not fetched from the server; the backend
// validates the id again on submission.

/// A top-up payment channel. `requires_redirect` decides whether the UI
/// sends the user to a checkout URL or renders in-place QR/instructions;
/// polling behavior is the same either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentMethod {
    pub id: &'static str,
    pub display_name: &'static str,
    pub requires_redirect: bool,
    pub description: &'static str,
}

pub const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod {
        id: "ID_OVO",
        display_name: "OVO",
        requires_redirect: false,
        description: "Push notification to the OVO app on the registered phone number",
    },
    PaymentMethod {
        id: "ID_DANA",
        display_name: "DANA",
        requires_redirect: true,
        description: "Checkout via the DANA payment page",
    },
    PaymentMethod {
        id: "ID_LINKAJA",
        display_name: "LinkAja",
        requires_redirect: true,
        description: "Checkout via the LinkAja payment page",
    },
    PaymentMethod {
        id: "ID_SHOPEEPAY",
        display_name: "ShopeePay",
        requires_redirect: true,
        description: "Checkout via the ShopeePay app",
    },
    PaymentMethod {
        id: "QRIS",
        display_name: "QRIS",
        requires_redirect: false,
        description: "Scan the QR code with any QRIS-enabled banking or e-wallet app",
    },
];

pub fn find_method(id: &str) -> Option<&'static PaymentMethod> {
    PAYMENT_METHODS.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_methods_resolve() {
        let ovo = find_method("ID_OVO").unwrap();
        assert!(!ovo.requires_redirect);
        let dana = find_method("ID_DANA").unwrap();
        assert!(dana.requires_redirect);
    }

    #[test]
    fn unknown_method_is_none() {
        assert!(find_method("ID_GOPAY").is_none());
        assert!(find_method("").is_none());
    }

    #[test]
    fn ids_are_unique() {
        for (i, a) in PAYMENT_METHODS.iter().enumerate() {
            for b in &PAYMENT_METHODS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }
}
