//! # Utilities Module
//!
//! Helper functions shared across the backend service: mock address and
//! order-id generation for the demo swap path, plus amount formatting.

use rand::Rng;

/// Generate a mock deposit address for the given asset.
///
/// CipherVault never touches a real chain; deposit addresses only need to
/// look plausible for the asset's address format.
///
/// ## Examples
///
/// ```rust,ignore
/// let addr = mock_deposit_address("BTC"); // "bc1q3f9a..."
/// let addr = mock_deposit_address("ETH"); // "0x7cf1b2..."
/// ```
pub fn mock_deposit_address(asset: &str) -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill(&mut bytes);
    let body = hex::encode(bytes);

    match asset.to_uppercase().as_str() {
        "BTC" => format!("bc1q{}", &body[..38]),
        "LTC" => format!("ltc1q{}", &body[..38]),
        "ETH" | "USDT" | "USDC" | "BNB" | "AVAX" => format!("0x{}", body),
        "XMR" => {
            let mut extra = [0u8; 27];
            rand::thread_rng().fill(&mut extra);
            format!("4{}{}", body, hex::encode(extra))
        }
        // Generic fallback for assets without a recognizable format
        _ => format!("cv1{}", body),
    }
}

/// Generate a local order id for mock shifts.
///
/// Real provider ids are opaque strings; mock ids carry a `cv-` prefix so
/// they are recognizable in logs.
pub fn mock_order_id() -> String {
    let mut bytes = [0u8; 6];
    rand::thread_rng().fill(&mut bytes);
    format!("cv-{}", hex::encode(bytes))
}

/// Format a decimal asset amount for logs and messages.
///
/// ## Examples
///
/// ```rust,ignore
/// assert_eq!(format_amount(0.5, "BTC"), "0.5000 BTC");
/// ```
pub fn format_amount(amount: f64, asset: &str) -> String {
    format!("{:.4} {}", amount, asset.to_uppercase())
}
