use std::env;

/// Payee details baked into generated payment links. Payment execution
/// itself happens in the customer's UPI app; this service only hands out
/// the deep link and later records completion.
#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub vpa: String,
    pub payee_name: String,
}

impl PaymentConfig {
    pub fn from_env() -> Self {
        PaymentConfig {
            vpa: env::var("UPI_VPA").unwrap_or_else(|_| "payments@roomstay".to_string()),
            payee_name: env::var("UPI_PAYEE_NAME").unwrap_or_else(|_| "Roomstay Hotels".to_string()),
        }
    }
}

pub fn payment_link(config: &PaymentConfig, order_id: &str, amount: f64) -> String {
    let reference = order_reference(order_id);
    format!(
        "upi://pay?pa={}&pn={}&am={:.2}&cu=INR&tn={}",
        config.vpa,
        encode(&config.payee_name),
        amount,
        reference
    )
}

pub fn receipt_url(order_id: &str) -> String {
    format!("/api/order/{order_id}/receipt")
}

/// Short human-readable reference carried in the link's note field.
pub fn order_reference(order_id: &str) -> String {
    let short: String = order_id.chars().filter(|c| *c != '-').take(8).collect();
    format!("roomstay-{short}")
}

fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_') {
            out.push(c);
        } else {
            for byte in c.to_string().as_bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
    }
    out
}
